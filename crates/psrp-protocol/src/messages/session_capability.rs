use crate::MessageType;
use crate::ps_value::{ComplexObject, ComplexObjectContent, PsObjectWithType, PsProperty, PsValue};
use std::collections::BTreeMap;

/// Sent by both sides at the start of the runspace pool negotiation,
/// [MS-PSRP §2.2.2.1]. Carries the protocol, PowerShell, and serialization
/// versions each side supports; the lower of the two protocol versions wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCapability {
    pub protocol_version: String,
    pub ps_version: String,
    pub serialization_version: String,
    /// `TimeZone` is a serialized `.NET` `TimeZone` object; PSRP clients
    /// rarely need to act on it, so it is kept as an opaque byte blob.
    pub time_zone: Option<Vec<u8>>,
}

impl PsObjectWithType for SessionCapability {
    fn message_type(&self) -> MessageType {
        MessageType::SessionCapability
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(ComplexObject::from(self.clone()))
    }
}

impl From<SessionCapability> for ComplexObject {
    fn from(value: SessionCapability) -> Self {
        let mut extended_properties = BTreeMap::new();
        extended_properties.insert(
            "protocolversion".to_string(),
            PsProperty {
                name: "protocolversion".to_string(),
                value: PsValue::Primitive(
                    crate::ps_value::PsPrimitiveValue::Version(value.protocol_version),
                ),
            },
        );
        extended_properties.insert(
            "PSVersion".to_string(),
            PsProperty {
                name: "PSVersion".to_string(),
                value: PsValue::Primitive(crate::ps_value::PsPrimitiveValue::Version(
                    value.ps_version,
                )),
            },
        );
        extended_properties.insert(
            "SerializationVersion".to_string(),
            PsProperty {
                name: "SerializationVersion".to_string(),
                value: PsValue::Primitive(crate::ps_value::PsPrimitiveValue::Version(
                    value.serialization_version,
                )),
            },
        );
        if let Some(time_zone) = value.time_zone {
            extended_properties.insert(
                "TimeZone".to_string(),
                PsProperty {
                    name: "TimeZone".to_string(),
                    value: PsValue::Primitive(crate::ps_value::PsPrimitiveValue::Bytes(time_zone)),
                },
            );
        }

        Self {
            type_def: None,
            to_string: None,
            content: ComplexObjectContent::Standard,
            adapted_properties: BTreeMap::new(),
            extended_properties,
        }
    }
}

impl TryFrom<ComplexObject> for SessionCapability {
    type Error = crate::PowerShellRemotingError;

    fn try_from(value: ComplexObject) -> Result<Self, Self::Error> {
        fn version(
            value: &ComplexObject,
            name: &str,
        ) -> Result<String, crate::PowerShellRemotingError> {
            match value.extended_properties.get(name).map(|p| &p.value) {
                Some(PsValue::Primitive(crate::ps_value::PsPrimitiveValue::Version(v))) => {
                    Ok(v.clone())
                }
                Some(PsValue::Primitive(crate::ps_value::PsPrimitiveValue::Str(v))) => {
                    Ok(v.clone())
                }
                _ => Err(crate::PowerShellRemotingError::InvalidMessage(format!(
                    "missing or non-version property: {name}"
                ))),
            }
        }

        let time_zone = match value.extended_properties.get("TimeZone").map(|p| &p.value) {
            Some(PsValue::Primitive(crate::ps_value::PsPrimitiveValue::Bytes(b))) => {
                Some(b.clone())
            }
            _ => None,
        };

        Ok(Self {
            protocol_version: version(&value, "protocolversion")?,
            ps_version: version(&value, "PSVersion")?,
            serialization_version: version(&value, "SerializationVersion")?,
            time_zone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let original = SessionCapability {
            protocol_version: "2.3".to_string(),
            ps_version: "2.0".to_string(),
            serialization_version: "1.1.0.1".to_string(),
            time_zone: None,
        };

        let restored = SessionCapability::try_from(ComplexObject::from(original.clone())).unwrap();
        assert_eq!(original, restored);
    }
}
