use crate::MessageType;
use crate::ps_value::{
    ComplexObject, ComplexObjectContent, Container, PsObjectWithType, PsPrimitiveValue,
    PsProperty, PsType, PsValue,
};
use std::collections::BTreeMap;

/// A host method invocation the server asks the client's `PSHost` (not a
/// pipeline-scoped host) to perform — e.g. `$Host.UI.WriteLine`, prompts for
/// credentials. [MS-PSRP §2.2.2.10].
#[derive(Debug, Clone, PartialEq, Eq, typed_builder::TypedBuilder)]
pub struct RunspacePoolHostCall {
    pub call_id: i64,
    pub method_id: i32,
    pub method_name: String,
    #[builder(default)]
    pub parameters: Vec<PsValue>,
}

impl PsObjectWithType for RunspacePoolHostCall {
    fn message_type(&self) -> MessageType {
        MessageType::RunspacepoolHostCall
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(ComplexObject::from(self.clone()))
    }
}

impl From<RunspacePoolHostCall> for ComplexObject {
    fn from(value: RunspacePoolHostCall) -> Self {
        let mut extended_properties = BTreeMap::new();

        extended_properties.insert(
            "ci".to_string(),
            PsProperty {
                name: "ci".to_string(),
                value: PsValue::Primitive(PsPrimitiveValue::I64(value.call_id)),
            },
        );

        let method_id_obj = ComplexObject {
            type_def: Some(PsType::remote_host_method_id()),
            to_string: Some(value.method_name),
            content: ComplexObjectContent::ExtendedPrimitive(PsPrimitiveValue::I32(
                value.method_id,
            )),
            ..Default::default()
        };
        extended_properties.insert(
            "mi".to_string(),
            PsProperty {
                name: "mi".to_string(),
                value: PsValue::Object(method_id_obj),
            },
        );

        let parameters_obj = ComplexObject {
            type_def: Some(PsType::array_list()),
            content: ComplexObjectContent::Container(Container::List(value.parameters)),
            ..Default::default()
        };
        extended_properties.insert(
            "mp".to_string(),
            PsProperty {
                name: "mp".to_string(),
                value: PsValue::Object(parameters_obj),
            },
        );

        Self {
            extended_properties,
            ..Default::default()
        }
    }
}

impl TryFrom<ComplexObject> for RunspacePoolHostCall {
    type Error = crate::PowerShellRemotingError;

    fn try_from(value: ComplexObject) -> Result<Self, Self::Error> {
        let ci = value.extended_properties.get("ci").ok_or_else(|| {
            Self::Error::InvalidMessage("missing call ID (ci) property".to_string())
        })?;
        let PsValue::Primitive(PsPrimitiveValue::I64(call_id)) = &ci.value else {
            return Err(Self::Error::InvalidMessage(
                "call ID (ci) is not an I64".to_string(),
            ));
        };

        let mi = value.extended_properties.get("mi").ok_or_else(|| {
            Self::Error::InvalidMessage("missing method identifier (mi) property".to_string())
        })?;
        let PsValue::Object(mi_obj) = &mi.value else {
            return Err(Self::Error::InvalidMessage(
                "method identifier (mi) is not an object".to_string(),
            ));
        };
        let ComplexObjectContent::ExtendedPrimitive(PsPrimitiveValue::I32(method_id)) =
            &mi_obj.content
        else {
            return Err(Self::Error::InvalidMessage(
                "method identifier content is not an I32".to_string(),
            ));
        };
        let method_name = mi_obj.to_string.clone().unwrap_or_default();

        let parameters = match value.extended_properties.get("mp").map(|p| &p.value) {
            Some(PsValue::Object(mp_obj)) => match &mp_obj.content {
                ComplexObjectContent::Container(Container::List(params)) => params.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        Ok(Self {
            call_id: *call_id,
            method_id: *method_id,
            method_name,
            parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_parameters() {
        let original = RunspacePoolHostCall::builder()
            .call_id(7)
            .method_id(1)
            .method_name("WriteLine".to_string())
            .parameters(vec![PsValue::Primitive(PsPrimitiveValue::Str(
                "hi".to_string(),
            ))])
            .build();

        let restored = RunspacePoolHostCall::try_from(ComplexObject::from(original.clone())).unwrap();
        assert_eq!(original, restored);
    }
}
