use crate::MessageType;
use crate::ps_value::{
    ComplexObject, ComplexObjectContent, Container, PsObjectWithType, PsPrimitiveValue, PsProperty,
    PsType, PsValue,
};
use std::collections::BTreeMap;

/// Server-to-client message exchanging application-specific state once the
/// runspace pool negotiation completes, [MS-PSRP §2.2.2.16]. Carries either a
/// primitive dictionary (conventionally holding `PSVersionTable`) or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplicationPrivateData {
    pub data: Option<BTreeMap<String, PsValue>>,
}

impl ApplicationPrivateData {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PsObjectWithType for ApplicationPrivateData {
    fn message_type(&self) -> MessageType {
        MessageType::ApplicationPrivateData
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(ComplexObject::from(self.clone()))
    }
}

impl From<ApplicationPrivateData> for ComplexObject {
    fn from(app_data: ApplicationPrivateData) -> Self {
        let mut extended_properties = BTreeMap::new();

        let application_private_data_value = match app_data.data {
            Some(data) => {
                let ps_dict: BTreeMap<PsValue, PsValue> = data
                    .into_iter()
                    .map(|(k, v)| (PsValue::Primitive(PsPrimitiveValue::Str(k)), v))
                    .collect();

                PsValue::Object(ComplexObject {
                    type_def: Some(PsType::ps_primitive_dictionary()),
                    content: ComplexObjectContent::Container(Container::Dictionary(ps_dict)),
                    ..Default::default()
                })
            }
            None => PsValue::Primitive(PsPrimitiveValue::Nil),
        };

        extended_properties.insert(
            "ApplicationPrivateData".to_string(),
            PsProperty {
                name: "ApplicationPrivateData".to_string(),
                value: application_private_data_value,
            },
        );

        Self {
            extended_properties,
            ..Default::default()
        }
    }
}

impl TryFrom<ComplexObject> for ApplicationPrivateData {
    type Error = crate::PowerShellRemotingError;

    fn try_from(value: ComplexObject) -> Result<Self, Self::Error> {
        let app_data_property = value
            .extended_properties
            .get("ApplicationPrivateData")
            .ok_or_else(|| {
                Self::Error::InvalidMessage("missing ApplicationPrivateData property".to_string())
            })?;

        let data = if let PsValue::Primitive(PsPrimitiveValue::Nil) = &app_data_property.value {
            None
        } else {
            let PsValue::Object(obj) = &app_data_property.value else {
                return Err(Self::Error::InvalidMessage(
                    "ApplicationPrivateData property has invalid type".to_string(),
                ));
            };

            let ComplexObjectContent::Container(Container::Dictionary(dict)) = &obj.content
            else {
                return Err(Self::Error::InvalidMessage(
                    "ApplicationPrivateData is not a dictionary".to_string(),
                ));
            };

            let mut result = BTreeMap::new();
            for (key, value) in dict {
                let PsValue::Primitive(PsPrimitiveValue::Str(key_str)) = key else {
                    return Err(Self::Error::InvalidMessage(
                        "dictionary key is not a string".to_string(),
                    ));
                };
                result.insert(key_str.clone(), value.clone());
            }

            Some(result)
        };

        Ok(Self { data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_empty() {
        let original = ApplicationPrivateData::new();
        let restored = ApplicationPrivateData::try_from(ComplexObject::from(original.clone())).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn roundtrip_with_data() {
        let mut data = BTreeMap::new();
        data.insert(
            "PSVersion".to_string(),
            PsValue::Primitive(PsPrimitiveValue::Version("2.0".to_string())),
        );
        let original = ApplicationPrivateData { data: Some(data) };
        let restored = ApplicationPrivateData::try_from(ComplexObject::from(original.clone())).unwrap();
        assert_eq!(original, restored);
    }
}
