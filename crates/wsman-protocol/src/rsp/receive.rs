use std::borrow::Cow;

use psrp_xml::{
    XmlError,
    builder::Element,
    parser::{Node, XmlDeserialize, XmlVisitor},
};

use crate::cores::{
    Tag, TagName, TagValue, Text,
    attribute::{self, Attribute},
    tag_name::{CommandState, DesiredStream, ExitCode, Stream},
};

#[derive(Debug, Clone, typed_builder::TypedBuilder)]
pub struct ReceiveValue<'a> {
    #[builder(setter(into))]
    pub desired_streams: Vec<Tag<'a, Text<'a>, DesiredStream>>,
}

impl<'a> TagValue<'a> for ReceiveValue<'a> {
    fn append_to_element(self, mut element: Element<'a>) -> Element<'a> {
        for desired_stream in self.desired_streams {
            element = element.add_child(desired_stream.into_element());
        }
        element
    }
}

pub struct ReceiveValueVisitor<'a> {
    desired_streams: Vec<Tag<'a, Text<'a>, DesiredStream>>,
}

impl<'a> XmlVisitor<'a> for ReceiveValueVisitor<'a> {
    type Value = ReceiveValue<'a>;

    fn visit_node(&mut self, node: Node<'a, 'a>) -> Result<(), XmlError> {
        self.visit_children(node.children())
    }

    fn visit_children(
        &mut self,
        children: impl Iterator<Item = Node<'a, 'a>>,
    ) -> Result<(), XmlError> {
        for child in children.filter(|c| c.is_element()) {
            if child.tag_name().name() == DesiredStream::TAG_NAME {
                self.desired_streams.push(Tag::from_node(child)?);
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Self::Value, XmlError> {
        if self.desired_streams.is_empty() {
            return Err(XmlError::InvalidXml(
                "Missing DesiredStream element".into(),
            ));
        }

        Ok(ReceiveValue {
            desired_streams: self.desired_streams,
        })
    }
}

impl<'a> XmlDeserialize<'a> for ReceiveValue<'a> {
    type Visitor = ReceiveValueVisitor<'a>;

    fn visitor() -> Self::Visitor {
        ReceiveValueVisitor {
            desired_streams: Vec::new(),
        }
    }
}

/// `<rsp:Stream>` element in a `ReceiveResponse`.
#[derive(Debug, Clone, typed_builder::TypedBuilder)]
pub struct StreamValue<'a> {
    #[builder(setter(into))]
    pub name: Cow<'a, str>,
    #[builder(default, setter(into, strip_option))]
    pub command_id: Option<Cow<'a, str>>,
    #[builder(default, setter(into, strip_option))]
    pub end: Option<bool>,
    #[builder(default, setter(into, strip_option))]
    pub unit: Option<Cow<'a, str>>,
    #[builder(default, setter(into, strip_option))]
    pub end_unit: Option<bool>,
    #[builder(setter(into))]
    pub content: Text<'a>,
}

/// `<rsp:CommandState>` element in a `ReceiveResponse`.
#[derive(Debug, Clone, typed_builder::TypedBuilder)]
pub struct CommandStateValue<'a> {
    #[builder(setter(into))]
    pub command_id: Cow<'a, str>,
    #[builder(setter(into))]
    pub state: Cow<'a, str>,
    #[builder(default, setter(into, strip_option))]
    pub exit_code: Option<Tag<'a, Text<'a>, ExitCode>>,
}

/// `<rsp:ReceiveResponse>`: one or more `Stream` elements plus an optional
/// terminal `CommandState` once the command has finished.
#[derive(Debug, Clone, typed_builder::TypedBuilder)]
pub struct ReceiveResponseValue<'a> {
    #[builder(default, setter(into, strip_option))]
    pub sequence_id: Option<u64>,
    #[builder(setter(into))]
    pub streams: Vec<Tag<'a, StreamValue<'a>, Stream>>,
    #[builder(default, setter(into, strip_option))]
    pub command_state: Option<Tag<'a, CommandStateValue<'a>, CommandState>>,
}

impl<'a> TagValue<'a> for StreamValue<'a> {
    fn append_to_element(self, mut element: Element<'a>) -> Element<'a> {
        element = element.add_attribute(Attribute::Name(self.name).into());

        if let Some(command_id) = self.command_id {
            let command_id = uuid::Uuid::parse_str(&command_id).unwrap_or_else(|_| uuid::Uuid::nil());
            element = element.add_attribute(Attribute::CommandId(command_id).into());
        }
        if let Some(end) = self.end {
            element = element.add_attribute(Attribute::End(end).into());
        }
        if let Some(unit) = self.unit {
            element = element.add_attribute(Attribute::Unit(unit).into());
        }
        if let Some(end_unit) = self.end_unit {
            element = element.add_attribute(Attribute::EndUnit(end_unit).into());
        }

        element.set_text(self.content)
    }
}

impl<'a> TagValue<'a> for CommandStateValue<'a> {
    fn append_to_element(self, mut element: Element<'a>) -> Element<'a> {
        element = element.add_attribute(Attribute::State(self.state).into());

        if let Some(exit_code) = self.exit_code {
            element = exit_code.append_to_element(element);
        }

        element
    }
}

impl<'a> TagValue<'a> for ReceiveResponseValue<'a> {
    fn append_to_element(self, mut element: Element<'a>) -> Element<'a> {
        if let Some(sequence_id) = self.sequence_id {
            element = element.add_attribute(Attribute::SequenceID(sequence_id).into());
        }

        for stream in self.streams {
            element = element.add_child(stream.into_element());
        }

        if let Some(command_state) = self.command_state {
            element = element.add_child(command_state.into_element());
        }

        element
    }
}

pub struct StreamValueVisitor<'a> {
    name: Option<Cow<'a, str>>,
    command_id: Option<Cow<'a, str>>,
    end: Option<bool>,
    unit: Option<Cow<'a, str>>,
    end_unit: Option<bool>,
    content: Option<Text<'a>>,
}

impl<'a> XmlVisitor<'a> for StreamValueVisitor<'a> {
    type Value = StreamValue<'a>;

    fn visit_node(&mut self, node: Node<'a, 'a>) -> Result<(), XmlError> {
        for attr in node.attributes() {
            match attribute::Attribute::from_name_and_value(attr.name(), attr.value())? {
                Some(Attribute::Name(name)) => self.name = Some(name),
                Some(Attribute::CommandId(command_id)) => {
                    self.command_id = Some(Cow::Owned(command_id.to_string()))
                }
                Some(Attribute::End(end)) => self.end = Some(end),
                Some(Attribute::Unit(unit)) => self.unit = Some(unit),
                Some(Attribute::EndUnit(end_unit)) => self.end_unit = Some(end_unit),
                _ => {}
            }
        }

        self.content = Some(Text::from(node.text().unwrap_or("").to_string()));

        Ok(())
    }

    fn visit_children(
        &mut self,
        _children: impl Iterator<Item = Node<'a, 'a>>,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    fn finish(self) -> Result<Self::Value, XmlError> {
        Ok(StreamValue {
            name: self
                .name
                .ok_or_else(|| XmlError::InvalidXml("Missing Name attribute".into()))?,
            command_id: self.command_id,
            end: self.end,
            unit: self.unit,
            end_unit: self.end_unit,
            content: self
                .content
                .ok_or_else(|| XmlError::InvalidXml("Missing stream content".into()))?,
        })
    }
}

impl<'a> XmlDeserialize<'a> for StreamValue<'a> {
    type Visitor = StreamValueVisitor<'a>;

    fn visitor() -> Self::Visitor {
        StreamValueVisitor {
            name: None,
            command_id: None,
            end: None,
            unit: None,
            end_unit: None,
            content: None,
        }
    }
}

pub struct CommandStateValueVisitor<'a> {
    command_id: Option<Cow<'a, str>>,
    state: Option<Cow<'a, str>>,
    exit_code: Option<Tag<'a, Text<'a>, ExitCode>>,
}

impl<'a> XmlVisitor<'a> for CommandStateValueVisitor<'a> {
    type Value = CommandStateValue<'a>;

    fn visit_node(&mut self, node: Node<'a, 'a>) -> Result<(), XmlError> {
        for attr in node.attributes() {
            match attribute::Attribute::from_name_and_value(attr.name(), attr.value())? {
                Some(Attribute::CommandId(command_id)) => {
                    self.command_id = Some(Cow::Owned(command_id.to_string()))
                }
                Some(Attribute::State(state)) => self.state = Some(state),
                _ => {}
            }
        }

        for child in node.children().filter(|c| c.is_element()) {
            if child.tag_name().name() == ExitCode::TAG_NAME {
                self.exit_code = Some(Tag::from_node(child)?);
            }
        }

        Ok(())
    }

    fn visit_children(
        &mut self,
        _children: impl Iterator<Item = Node<'a, 'a>>,
    ) -> Result<(), XmlError> {
        Ok(())
    }

    fn finish(self) -> Result<Self::Value, XmlError> {
        Ok(CommandStateValue {
            command_id: self
                .command_id
                .ok_or_else(|| XmlError::InvalidXml("Missing CommandId attribute".into()))?,
            state: self
                .state
                .ok_or_else(|| XmlError::InvalidXml("Missing State attribute".into()))?,
            exit_code: self.exit_code,
        })
    }
}

impl<'a> XmlDeserialize<'a> for CommandStateValue<'a> {
    type Visitor = CommandStateValueVisitor<'a>;

    fn visitor() -> Self::Visitor {
        CommandStateValueVisitor {
            command_id: None,
            state: None,
            exit_code: None,
        }
    }
}

pub struct ReceiveResponseValueVisitor<'a> {
    sequence_id: Option<u64>,
    streams: Vec<Tag<'a, StreamValue<'a>, Stream>>,
    command_state: Option<Tag<'a, CommandStateValue<'a>, CommandState>>,
}

impl<'a> XmlVisitor<'a> for ReceiveResponseValueVisitor<'a> {
    type Value = ReceiveResponseValue<'a>;

    fn visit_node(&mut self, node: Node<'a, 'a>) -> Result<(), XmlError> {
        for attr in node.attributes() {
            if let Some(Attribute::SequenceID(seq_id)) =
                attribute::Attribute::from_name_and_value(attr.name(), attr.value())?
            {
                self.sequence_id = Some(seq_id);
            }
        }

        self.visit_children(node.children().filter(|c| c.is_element()))
    }

    fn visit_children(
        &mut self,
        children: impl Iterator<Item = Node<'a, 'a>>,
    ) -> Result<(), XmlError> {
        for child in children {
            match child.tag_name().name() {
                name if name == Stream::TAG_NAME => {
                    self.streams.push(Tag::from_node(child)?);
                }
                name if name == CommandState::TAG_NAME => {
                    self.command_state = Some(Tag::from_node(child)?);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Self::Value, XmlError> {
        if self.streams.is_empty() {
            return Err(XmlError::InvalidXml(
                "ReceiveResponse must have at least one Stream element".into(),
            ));
        }

        Ok(ReceiveResponseValue {
            sequence_id: self.sequence_id,
            streams: self.streams,
            command_state: self.command_state,
        })
    }
}

impl<'a> XmlDeserialize<'a> for ReceiveResponseValue<'a> {
    type Visitor = ReceiveResponseValueVisitor<'a>;

    fn visitor() -> Self::Visitor {
        ReceiveResponseValueVisitor {
            sequence_id: None,
            streams: Vec::new(),
            command_state: None,
        }
    }
}
