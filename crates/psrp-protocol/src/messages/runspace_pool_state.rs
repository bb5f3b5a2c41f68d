use crate::MessageType;
use crate::ps_value::{
    ComplexObject, ComplexObjectContent, PsObjectWithType, PsPrimitiveValue, PsProperty, PsValue,
};
use std::collections::BTreeMap;

/// The ten states of [MS-PSRP §2.2.2.4]'s runspace pool state diagram, as
/// carried on the wire. See `RunspacePoolState` (in the client-core crate)
/// for the richer state the pool actually tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunspacePoolStateValue {
    BeforeOpen = 0,
    Opening = 1,
    Opened = 2,
    Closed = 3,
    Closing = 4,
    Broken = 5,
    NegotiationSent = 6,
    NegotiationSucceeded = 7,
    Connecting = 8,
    Disconnected = 9,
}

impl RunspacePoolStateValue {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for RunspacePoolStateValue {
    type Error = crate::PowerShellRemotingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::BeforeOpen),
            1 => Ok(Self::Opening),
            2 => Ok(Self::Opened),
            3 => Ok(Self::Closed),
            4 => Ok(Self::Closing),
            5 => Ok(Self::Broken),
            6 => Ok(Self::NegotiationSent),
            7 => Ok(Self::NegotiationSucceeded),
            8 => Ok(Self::Connecting),
            9 => Ok(Self::Disconnected),
            _ => Err(crate::PowerShellRemotingError::InvalidMessage(format!(
                "invalid RunspacePoolState value: {value}"
            ))),
        }
    }
}

/// Server → client notification that the runspace pool's state changed,
/// [MS-PSRP §2.2.2.4]. Carries an error record when the new state is `Broken`.
#[derive(Debug, Clone, PartialEq, Eq, typed_builder::TypedBuilder)]
pub struct RunspacePoolStateMessage {
    pub runspace_state: RunspacePoolStateValue,
    #[builder(default, setter(strip_option))]
    pub exception_as_error_record: Option<PsValue>,
}

impl PsObjectWithType for RunspacePoolStateMessage {
    fn message_type(&self) -> MessageType {
        MessageType::RunspacepoolState
    }

    fn to_ps_object(&self) -> PsValue {
        PsValue::Object(ComplexObject::from(self.clone()))
    }
}

impl From<RunspacePoolStateMessage> for ComplexObject {
    fn from(value: RunspacePoolStateMessage) -> Self {
        let mut extended_properties = BTreeMap::new();
        extended_properties.insert(
            "RunspaceState".to_string(),
            PsProperty {
                name: "RunspaceState".to_string(),
                value: PsValue::Primitive(PsPrimitiveValue::I32(value.runspace_state.as_i32())),
            },
        );
        if let Some(exception) = value.exception_as_error_record {
            extended_properties.insert(
                "ExceptionAsErrorRecord".to_string(),
                PsProperty {
                    name: "ExceptionAsErrorRecord".to_string(),
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

impl TryFrom<ComplexObject> for RunspacePoolStateMessage {
    type Error = crate::PowerShellRemotingError;

    fn try_from(value: ComplexObject) -> Result<Self, Self::Error> {
        let state_prop = value
            .extended_properties
            .get("RunspaceState")
            .ok_or_else(|| {
                Self::Error::InvalidMessage("missing RunspaceState property".to_string())
            })?;

        let runspace_state = match &state_prop.value {
            PsValue::Primitive(PsPrimitiveValue::I32(state)) => {
                RunspacePoolStateValue::try_from(*state)?
            }
            other => {
                return Err(Self::Error::InvalidMessage(format!(
                    "RunspaceState property is not an I32, got {other:?}"
                )));
            }
        };

        let exception_as_error_record = value
            .extended_properties
            .get("ExceptionAsErrorRecord")
            .map(|prop| prop.value.clone());

        Ok(Self {
            runspace_state,
            exception_as_error_record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_opened() {
        let state = RunspacePoolStateMessage::builder()
            .runspace_state(RunspacePoolStateValue::Opened)
            .build();

        let restored = RunspacePoolStateMessage::try_from(ComplexObject::from(state.clone())).unwrap();
        assert_eq!(state, restored);
    }

    #[test]
    fn roundtrip_broken_with_exception() {
        let exception = PsValue::Primitive(PsPrimitiveValue::Str("failed".to_string()));
        let state = RunspacePoolStateMessage::builder()
            .runspace_state(RunspacePoolStateValue::Broken)
            .exception_as_error_record(exception)
            .build();

        let restored = RunspacePoolStateMessage::try_from(ComplexObject::from(state.clone())).unwrap();
        assert_eq!(state, restored);
    }

    #[test]
    fn wire_value_matches_spec() {
        assert_eq!(RunspacePoolStateValue::NegotiationSent.as_i32(), 6);
        assert_eq!(MessageType::RunspacepoolState.value(), 0x0002_1005);
    }
}
