use crate::cores::*;
use ironposh_macros::{SimpleTagValue, SimpleXmlDeserialize};

// SOAP Fault structures for handling SOAP error responses

#[derive(Debug, Clone, typed_builder::TypedBuilder, SimpleTagValue, SimpleXmlDeserialize)]
pub struct SoapFaultValue<'a> {
    #[builder(default, setter(into, strip_option))]
    pub code: Option<Tag<'a, SoapFaultCodeValue<'a>, Code>>,
    #[builder(default, setter(into, strip_option))]
    pub reason: Option<Tag<'a, SoapFaultReasonValue<'a>, Reason>>,
    #[builder(default, setter(into, strip_option))]
    pub detail: Option<Tag<'a, ReadOnlyUnParsed<'a>, Detail>>,
}

#[derive(Debug, Clone, typed_builder::TypedBuilder, SimpleTagValue, SimpleXmlDeserialize)]
pub struct SoapFaultCodeValue<'a> {
    #[builder(default, setter(into, strip_option))]
    pub value: Option<Tag<'a, Text<'a>, SoapValue>>,
    #[builder(default, setter(into, strip_option))]
    pub subcode: Option<Tag<'a, SoapFaultSubcodeValue<'a>, Subcode>>,
}

#[derive(Debug, Clone, typed_builder::TypedBuilder, SimpleTagValue, SimpleXmlDeserialize)]
pub struct SoapFaultSubcodeValue<'a> {
    #[builder(default, setter(into, strip_option))]
    pub value: Option<Tag<'a, Text<'a>, SoapValue>>,
}

#[derive(Debug, Clone, typed_builder::TypedBuilder, SimpleTagValue, SimpleXmlDeserialize)]
pub struct SoapFaultReasonValue<'a> {
    #[builder(default, setter(into, strip_option))]
    pub text: Option<Tag<'a, Text<'a>, SoapText>>,
}

impl<'a> SoapFaultValue<'a> {
    /// Human-readable `soap:Reason/soap:Text`, if the fault carried one.
    pub fn reason_text(&self) -> Option<&str> {
        self.reason
            .as_ref()
            .and_then(|reason| reason.as_ref().text.as_ref())
            .map(|text| text.as_ref().as_ref())
    }

    /// `soap:Code/soap:Subcode/soap:Value`, if present (e.g. `wsman:SchemaValidationError`).
    pub fn subcode_text(&self) -> Option<&str> {
        self.code
            .as_ref()
            .and_then(|code| code.as_ref().subcode.as_ref())
            .and_then(|subcode| subcode.as_ref().value.as_ref())
            .map(|value| value.as_ref().as_ref())
    }
}
