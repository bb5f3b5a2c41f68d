use psrp_xml::{
    builder::Element,
    parser::{Node, XmlDeserialize, XmlVisitor},
};

use crate::cores::{
    Tag, TagName, TagValue, Text,
    namespace::{DMTF_WSMAN_NAMESPACE, WS_ENUMERATION_NAMESPACE},
    tag_name::{
        Address, EndOfSequence, EnumerationContext, Items, ReferenceParameters, ResourceCreated,
        ResourceURI, SelectorSet,
    },
};
use crate::ws_management::SelectorSetValue;

/// Body of a WS-Enumeration `Enumerate` request.
#[derive(Debug, Clone)]
pub struct EnumerateValue<'a> {
    pub optimize_enumeration: Option<bool>,
    pub max_elements: Option<u32>,
    pub filter: Option<Text<'a>>,
}

impl<'a> EnumerateValue<'a> {
    pub fn new() -> Self {
        Self {
            optimize_enumeration: None,
            max_elements: None,
            filter: None,
        }
    }

    pub fn with_optimization(mut self, optimize: bool) -> Self {
        self.optimize_enumeration = Some(optimize);
        self
    }

    pub fn with_max_elements(mut self, max: u32) -> Self {
        self.max_elements = Some(max);
        self
    }

    pub fn with_filter(mut self, filter: Text<'a>) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl<'a> Default for EnumerateValue<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TagValue<'a> for EnumerateValue<'a> {
    fn append_to_element(self, mut element: Element<'a>) -> Element<'a> {
        if self.optimize_enumeration.unwrap_or(false) {
            element = element.add_child(
                Element::new("OptimizeEnumeration").set_namespace(WS_ENUMERATION_NAMESPACE),
            );
        }

        if let Some(max) = self.max_elements {
            element = element.add_child(
                Element::new("MaxElements")
                    .set_namespace(WS_ENUMERATION_NAMESPACE)
                    .set_text_owned(max.to_string()),
            );
        }

        if let Some(filter) = self.filter {
            element = element.add_child(
                Element::new("Filter")
                    .set_namespace(DMTF_WSMAN_NAMESPACE)
                    .set_text(filter),
            );
        }

        element
    }
}

/// Body of a WS-Enumeration `Pull` request.
#[derive(Debug, Clone)]
pub struct PullValue<'a> {
    pub enumeration_context: Text<'a>,
    pub max_elements: Option<u32>,
}

impl<'a> PullValue<'a> {
    pub fn new(enumeration_context: Text<'a>) -> Self {
        Self {
            enumeration_context,
            max_elements: None,
        }
    }

    pub fn with_max_elements(mut self, max: u32) -> Self {
        self.max_elements = Some(max);
        self
    }
}

impl<'a> TagValue<'a> for PullValue<'a> {
    fn append_to_element(self, mut element: Element<'a>) -> Element<'a> {
        let context_elem = Element::new("EnumerationContext")
            .set_namespace(WS_ENUMERATION_NAMESPACE)
            .set_text(self.enumeration_context);

        element = element.add_child(context_elem);

        if let Some(max) = self.max_elements {
            let max_elem = Element::new("MaxElements")
                .set_namespace(WS_ENUMERATION_NAMESPACE)
                .set_text_owned(max.to_string());

            element = element.add_child(max_elem);
        }

        element
    }
}

/// Body of a WS-Enumeration `Release` request.
#[derive(Debug, Clone)]
pub struct ReleaseValue<'a> {
    pub enumeration_context: Text<'a>,
}

impl<'a> ReleaseValue<'a> {
    pub fn new(enumeration_context: Text<'a>) -> Self {
        Self {
            enumeration_context,
        }
    }
}

impl<'a> TagValue<'a> for ReleaseValue<'a> {
    fn append_to_element(self, element: Element<'a>) -> Element<'a> {
        let context_elem = Element::new("EnumerationContext")
            .set_namespace(WS_ENUMERATION_NAMESPACE)
            .set_text(self.enumeration_context);

        element.add_child(context_elem)
    }
}

/// Body of a WS-Enumeration `GetStatus` request.
#[derive(Debug, Clone)]
pub struct GetStatusValue<'a> {
    pub enumeration_context: Text<'a>,
}

impl<'a> GetStatusValue<'a> {
    pub fn new(enumeration_context: Text<'a>) -> Self {
        Self {
            enumeration_context,
        }
    }
}

impl<'a> TagValue<'a> for GetStatusValue<'a> {
    fn append_to_element(self, element: Element<'a>) -> Element<'a> {
        let context_elem = Element::new("EnumerationContext")
            .set_namespace(WS_ENUMERATION_NAMESPACE)
            .set_text(self.enumeration_context);

        element.add_child(context_elem)
    }
}

/// `<a:ReferenceParameters>` inside a WS-Transfer `ResourceCreated` response.
#[derive(Debug, Clone)]
pub struct ReferenceParametersValue<'a> {
    pub resource_uri: Tag<'a, Text<'a>, ResourceURI>,
    pub selector_set: Tag<'a, SelectorSetValue, SelectorSet>,
}

impl<'a> TagValue<'a> for ReferenceParametersValue<'a> {
    fn append_to_element(self, element: Element<'a>) -> Element<'a> {
        element
            .add_child(self.resource_uri.into_element())
            .add_child(self.selector_set.into_element())
    }
}

pub struct ReferenceParametersValueVisitor<'a> {
    resource_uri: Option<Tag<'a, Text<'a>, ResourceURI>>,
    selector_set: Option<Tag<'a, SelectorSetValue, SelectorSet>>,
}

impl<'a> XmlVisitor<'a> for ReferenceParametersValueVisitor<'a> {
    type Value = ReferenceParametersValue<'a>;

    fn visit_node(&mut self, node: Node<'a, 'a>) -> Result<(), psrp_xml::XmlError> {
        self.visit_children(node.children())
    }

    fn visit_children(
        &mut self,
        children: impl Iterator<Item = Node<'a, 'a>>,
    ) -> Result<(), psrp_xml::XmlError> {
        for child in children.filter(|c| c.is_element()) {
            match child.tag_name().name() {
                name if name == ResourceURI::TAG_NAME => {
                    self.resource_uri = Some(Tag::from_node(child)?);
                }
                name if name == SelectorSet::TAG_NAME => {
                    self.selector_set = Some(Tag::from_node(child)?);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Self::Value, psrp_xml::XmlError> {
        Ok(ReferenceParametersValue {
            resource_uri: self.resource_uri.ok_or_else(|| {
                psrp_xml::XmlError::InvalidXml("Missing ResourceURI in ReferenceParameters".into())
            })?,
            selector_set: self.selector_set.ok_or_else(|| {
                psrp_xml::XmlError::InvalidXml("Missing SelectorSet in ReferenceParameters".into())
            })?,
        })
    }
}

impl<'a> XmlDeserialize<'a> for ReferenceParametersValue<'a> {
    type Visitor = ReferenceParametersValueVisitor<'a>;

    fn visitor() -> Self::Visitor {
        ReferenceParametersValueVisitor {
            resource_uri: None,
            selector_set: None,
        }
    }
}

/// Body of a WS-Transfer `ResourceCreated` response: the shell's address plus
/// the selector set (`ShellId`) needed to address it in future requests.
#[derive(Debug, Clone)]
pub struct ResourceCreatedValue<'a> {
    pub address: Tag<'a, Text<'a>, Address>,
    pub reference_parameters: Tag<'a, ReferenceParametersValue<'a>, ReferenceParameters>,
}

impl<'a> TagValue<'a> for ResourceCreatedValue<'a> {
    fn append_to_element(self, element: Element<'a>) -> Element<'a> {
        element
            .add_child(self.address.into_element())
            .add_child(self.reference_parameters.into_element())
    }
}

pub struct ResourceCreatedValueVisitor<'a> {
    address: Option<Tag<'a, Text<'a>, Address>>,
    reference_parameters: Option<Tag<'a, ReferenceParametersValue<'a>, ReferenceParameters>>,
}

impl<'a> XmlVisitor<'a> for ResourceCreatedValueVisitor<'a> {
    type Value = ResourceCreatedValue<'a>;

    fn visit_node(&mut self, node: Node<'a, 'a>) -> Result<(), psrp_xml::XmlError> {
        self.visit_children(node.children())
    }

    fn visit_children(
        &mut self,
        children: impl Iterator<Item = Node<'a, 'a>>,
    ) -> Result<(), psrp_xml::XmlError> {
        for child in children.filter(|c| c.is_element()) {
            match child.tag_name().name() {
                name if name == Address::TAG_NAME => {
                    self.address = Some(Tag::from_node(child)?);
                }
                name if name == ReferenceParameters::TAG_NAME => {
                    self.reference_parameters = Some(Tag::from_node(child)?);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Self::Value, psrp_xml::XmlError> {
        Ok(ResourceCreatedValue {
            address: self.address.ok_or_else(|| {
                psrp_xml::XmlError::InvalidXml("Missing Address in ResourceCreated".into())
            })?,
            reference_parameters: self.reference_parameters.ok_or_else(|| {
                psrp_xml::XmlError::InvalidXml(
                    "Missing ReferenceParameters in ResourceCreated".into(),
                )
            })?,
        })
    }
}

impl<'a> XmlDeserialize<'a> for ResourceCreatedValue<'a> {
    type Visitor = ResourceCreatedValueVisitor<'a>;

    fn visitor() -> Self::Visitor {
        ResourceCreatedValueVisitor {
            address: None,
            reference_parameters: None,
        }
    }
}

/// Body of a WS-Enumeration `Enumerate` response: an enumeration context to
/// `Pull` against, the enumerated shells (each shaped like a `ResourceCreated`
/// item: address + reference parameters carrying the `ShellId` selector), and
/// whether the sequence already ended.
#[derive(Debug, Clone)]
pub struct EnumerateResponseValue<'a> {
    pub enumeration_context: Option<Tag<'a, Text<'a>, EnumerationContext>>,
    pub items: Vec<Tag<'a, ResourceCreatedValue<'a>, ResourceCreated>>,
    pub end_of_sequence: bool,
}

impl<'a> TagValue<'a> for EnumerateResponseValue<'a> {
    fn append_to_element(self, mut element: Element<'a>) -> Element<'a> {
        if let Some(context) = self.enumeration_context {
            element = element.add_child(context.into_element());
        }

        let mut items_elem = Element::new(Items::TAG_NAME);
        if let Some(ns) = Items::NAMESPACE {
            items_elem = items_elem.set_namespace(ns);
        }
        for item in self.items {
            items_elem = items_elem.add_child(item.into_element());
        }
        element = element.add_child(items_elem);

        if self.end_of_sequence {
            let mut eos_elem = Element::new(EndOfSequence::TAG_NAME);
            if let Some(ns) = EndOfSequence::NAMESPACE {
                eos_elem = eos_elem.set_namespace(ns);
            }
            element = element.add_child(eos_elem);
        }

        element
    }
}

pub struct EnumerateResponseValueVisitor<'a> {
    enumeration_context: Option<Tag<'a, Text<'a>, EnumerationContext>>,
    items: Vec<Tag<'a, ResourceCreatedValue<'a>, ResourceCreated>>,
    end_of_sequence: bool,
}

impl<'a> XmlVisitor<'a> for EnumerateResponseValueVisitor<'a> {
    type Value = EnumerateResponseValue<'a>;

    fn visit_node(&mut self, node: Node<'a, 'a>) -> Result<(), psrp_xml::XmlError> {
        self.visit_children(node.children())
    }

    fn visit_children(
        &mut self,
        children: impl Iterator<Item = Node<'a, 'a>>,
    ) -> Result<(), psrp_xml::XmlError> {
        for child in children.filter(|c| c.is_element()) {
            match child.tag_name().name() {
                name if name == EnumerationContext::TAG_NAME => {
                    self.enumeration_context = Some(Tag::from_node(child)?);
                }
                name if name == Items::TAG_NAME => {
                    for item in child.children().filter(|c| c.is_element()) {
                        if item.tag_name().name() == ResourceCreated::TAG_NAME {
                            self.items.push(Tag::from_node(item)?);
                        }
                    }
                }
                name if name == EndOfSequence::TAG_NAME => {
                    self.end_of_sequence = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Self::Value, psrp_xml::XmlError> {
        Ok(EnumerateResponseValue {
            enumeration_context: self.enumeration_context,
            items: self.items,
            end_of_sequence: self.end_of_sequence,
        })
    }
}

impl<'a> XmlDeserialize<'a> for EnumerateResponseValue<'a> {
    type Visitor = EnumerateResponseValueVisitor<'a>;

    fn visitor() -> Self::Visitor {
        EnumerateResponseValueVisitor {
            enumeration_context: None,
            items: Vec::new(),
            end_of_sequence: false,
        }
    }
}

/// Body of a WS-Enumeration `Pull` response. Same shape as `Enumerate`'s,
/// minus the (optional, carried-over) enumeration context only when the
/// sequence has ended.
#[derive(Debug, Clone)]
pub struct PullResponseValue<'a> {
    pub enumeration_context: Option<Tag<'a, Text<'a>, EnumerationContext>>,
    pub items: Vec<Tag<'a, ResourceCreatedValue<'a>, ResourceCreated>>,
    pub end_of_sequence: bool,
}

impl<'a> TagValue<'a> for PullResponseValue<'a> {
    fn append_to_element(self, mut element: Element<'a>) -> Element<'a> {
        if let Some(context) = self.enumeration_context {
            element = element.add_child(context.into_element());
        }

        let mut items_elem = Element::new(Items::TAG_NAME);
        if let Some(ns) = Items::NAMESPACE {
            items_elem = items_elem.set_namespace(ns);
        }
        for item in self.items {
            items_elem = items_elem.add_child(item.into_element());
        }
        element = element.add_child(items_elem);

        if self.end_of_sequence {
            let mut eos_elem = Element::new(EndOfSequence::TAG_NAME);
            if let Some(ns) = EndOfSequence::NAMESPACE {
                eos_elem = eos_elem.set_namespace(ns);
            }
            element = element.add_child(eos_elem);
        }

        element
    }
}

pub struct PullResponseValueVisitor<'a> {
    enumeration_context: Option<Tag<'a, Text<'a>, EnumerationContext>>,
    items: Vec<Tag<'a, ResourceCreatedValue<'a>, ResourceCreated>>,
    end_of_sequence: bool,
}

impl<'a> XmlVisitor<'a> for PullResponseValueVisitor<'a> {
    type Value = PullResponseValue<'a>;

    fn visit_node(&mut self, node: Node<'a, 'a>) -> Result<(), psrp_xml::XmlError> {
        self.visit_children(node.children())
    }

    fn visit_children(
        &mut self,
        children: impl Iterator<Item = Node<'a, 'a>>,
    ) -> Result<(), psrp_xml::XmlError> {
        for child in children.filter(|c| c.is_element()) {
            match child.tag_name().name() {
                name if name == EnumerationContext::TAG_NAME => {
                    self.enumeration_context = Some(Tag::from_node(child)?);
                }
                name if name == Items::TAG_NAME => {
                    for item in child.children().filter(|c| c.is_element()) {
                        if item.tag_name().name() == ResourceCreated::TAG_NAME {
                            self.items.push(Tag::from_node(item)?);
                        }
                    }
                }
                name if name == EndOfSequence::TAG_NAME => {
                    self.end_of_sequence = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Self::Value, psrp_xml::XmlError> {
        Ok(PullResponseValue {
            enumeration_context: self.enumeration_context,
            items: self.items,
            end_of_sequence: self.end_of_sequence,
        })
    }
}

impl<'a> XmlDeserialize<'a> for PullResponseValue<'a> {
    type Visitor = PullResponseValueVisitor<'a>;

    fn visitor() -> Self::Visitor {
        PullResponseValueVisitor {
            enumeration_context: None,
            items: Vec::new(),
            end_of_sequence: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_created_value_deserialize() {
        let xml = r#"
            <x:ResourceCreated
                xmlns:x="http://schemas.xmlsoap.org/ws/2004/09/transfer"
                xmlns:a="http://schemas.xmlsoap.org/ws/2004/08/addressing"
                xmlns:w="http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd"
            >
    <a:Address>
        http://10.10.0.3:5985/wsman?PSVersion=7.4.10
        </a:Address>
    <a:ReferenceParameters>
        <w:ResourceURI>
            http://schemas.microsoft.com/powershell/Microsoft.PowerShell
            </w:ResourceURI>
        <w:SelectorSet>
            <w:Selector
                Name="ShellId">
                2D6534D0-6B12-40E3-B773-CBA26459CFA8
                </w:Selector>
            </w:SelectorSet>
        </a:ReferenceParameters>
    </x:ResourceCreated>
        "#;

        let document = psrp_xml::parser::parse(xml).unwrap();
        let root = document.root_element();
        let tag: Tag<'_, ResourceCreatedValue, ResourceCreated> = Tag::from_node(root).unwrap();
        let value = tag.value;

        assert_eq!(
            value.address.value,
            "http://10.10.0.3:5985/wsman?PSVersion=7.4.10".into()
        );
        assert_eq!(
            value
                .reference_parameters
                .as_ref()
                .resource_uri
                .as_ref()
                .as_ref(),
            "http://schemas.microsoft.com/powershell/Microsoft.PowerShell"
        );
    }
}
