use crate::MessageType;
use crate::ps_value::{
    ComplexObject, ComplexObjectContent, PsObjectWithType, PsPrimitiveValue, PsProperty, PsType,
    PsValue,
};
use std::collections::BTreeMap;

/// The client's reply to a [`super::runspace_pool_host_call::RunspacePoolHostCall`],
/// [MS-PSRP §2.2.2.11]. Carries at most one of a return value or an exception.
#[derive(Debug, Clone, PartialEq, Eq, typed_builder::TypedBuilder)]
pub struct RunspacePoolHostResponse {
    pub call_id: i64,
    pub method_id: i32,
    pub method_name: String,
    #[builder(default, setter(strip_option))]
    pub method_result: Option<PsValue>,
    #[builder(default, setter(strip_option))]
    pub method_exception: Option<PsValue>,
}

impl PsObjectWithType for RunspacePoolHostResponse {
    fn message_type(&self) -> MessageType {
        MessageType::RunspacepoolHostResponse
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(ComplexObject::from(self.clone()))
    }
}

impl From<RunspacePoolHostResponse> for ComplexObject {
    fn from(value: RunspacePoolHostResponse) -> Self {
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

        if let Some(result) = value.method_result {
            extended_properties.insert(
                "mr".to_string(),
                PsProperty {
                    name: "mr".to_string(),
                    value: result,
                },
            );
        }

        if let Some(exception) = value.method_exception {
            extended_properties.insert(
                "me".to_string(),
                PsProperty {
                    name: "me".to_string(),
                    value: exception,
                },
            );
        }

        Self {
            extended_properties,
            ..Default::default()
        }
    }
}

impl TryFrom<ComplexObject> for RunspacePoolHostResponse {
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

        let method_result = value
            .extended_properties
            .get("mr")
            .map(|prop| prop.value.clone());
        let method_exception = value
            .extended_properties
            .get("me")
            .map(|prop| prop.value.clone());

        Ok(Self {
            call_id: *call_id,
            method_id: *method_id,
            method_name,
            method_result,
            method_exception,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_result() {
        let original = RunspacePoolHostResponse::builder()
            .call_id(1)
            .method_id(11)
            .method_name("ReadLine".to_string())
            .method_result(PsValue::Primitive(PsPrimitiveValue::Str(
                "Alice".to_string(),
            )))
            .build();

        let restored =
            RunspacePoolHostResponse::try_from(ComplexObject::from(original.clone())).unwrap();
        assert_eq!(original, restored);
    }
}
