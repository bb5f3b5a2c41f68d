use psrp_xml::{
    XmlError,
    builder::Element,
    parser::{Node, XmlDeserialize, XmlVisitor},
};

use crate::cores::{
    Tag, TagName, TagValue, Text,
    tag_name::SignalCode,
};

/// Signal code requesting pipeline termination.
pub const SIGNAL_CODE_TERMINATE: &str =
    "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/signal/Terminate";

/// Signal code requesting Ctrl+C.
pub const SIGNAL_CODE_CTRL_C: &str =
    "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/signal/ctrl_c";

/// Body of a `<rsp:Signal>` request. The target pipeline is identified by the
/// `CommandId` attribute on the enclosing tag, not by this value.
#[derive(Debug, Clone, typed_builder::TypedBuilder)]
pub struct SignalValue<'a> {
    #[builder(setter(into))]
    pub code: Tag<'a, Text<'a>, SignalCode>,
}

impl<'a> TagValue<'a> for SignalValue<'a> {
    fn append_to_element(self, element: Element<'a>) -> Element<'a> {
        element.add_child(self.code.into_element())
    }
}

pub struct SignalValueVisitor<'a> {
    code: Option<Tag<'a, Text<'a>, SignalCode>>,
}

impl<'a> XmlVisitor<'a> for SignalValueVisitor<'a> {
    type Value = SignalValue<'a>;

    fn visit_node(&mut self, node: Node<'a, 'a>) -> Result<(), XmlError> {
        self.visit_children(node.children())
    }

    fn visit_children(
        &mut self,
        children: impl Iterator<Item = Node<'a, 'a>>,
    ) -> Result<(), XmlError> {
        for child in children.filter(|c| c.is_element()) {
            if child.tag_name().name() == SignalCode::TAG_NAME {
                self.code = Some(Tag::from_node(child)?);
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Self::Value, XmlError> {
        Ok(SignalValue {
            code: self
                .code
                .ok_or_else(|| XmlError::InvalidXml("Missing Code element".into()))?,
        })
    }
}

impl<'a> XmlDeserialize<'a> for SignalValue<'a> {
    type Visitor = SignalValueVisitor<'a>;

    fn visitor() -> Self::Visitor {
        SignalValueVisitor { code: None }
    }
}
