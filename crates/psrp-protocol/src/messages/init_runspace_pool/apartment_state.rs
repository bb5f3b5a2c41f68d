use crate::ps_value::{ComplexObject, ComplexObjectContent, PsEnums, PsType};
use std::{borrow::Cow, collections::BTreeMap};

/// `System.Threading.ApartmentState`, carried in `InitRunspacePool` and
/// `CreatePipeline` host negotiation, [MS-PSRP §2.2.3.1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApartmentState {
    STA = 0,
    MTA = 1,
    Unknown = 2,
}

impl From<ApartmentState> for ComplexObject {
    fn from(state: ApartmentState) -> Self {
        let type_def = PsType {
            type_names: vec![
                Cow::Borrowed("System.Threading.ApartmentState"),
                Cow::Borrowed("System.Enum"),
                Cow::Borrowed("System.ValueType"),
                Cow::Borrowed("System.Object"),
            ],
        };

        let to_string = match state {
            ApartmentState::STA => "STA".to_string(),
            ApartmentState::MTA => "MTA".to_string(),
            ApartmentState::Unknown => "Unknown".to_string(),
        };

        ComplexObject {
            type_def: Some(type_def),
            to_string: Some(to_string),
            content: ComplexObjectContent::PsEnums(PsEnums { value: state as i32 }),
            adapted_properties: BTreeMap::new(),
            extended_properties: BTreeMap::new(),
        }
    }
}

impl TryFrom<ComplexObject> for ApartmentState {
    type Error = crate::PowerShellRemotingError;

    fn try_from(value: ComplexObject) -> Result<Self, Self::Error> {
        match value.content {
            ComplexObjectContent::PsEnums(PsEnums { value }) => match value {
                0 => Ok(ApartmentState::STA),
                1 => Ok(ApartmentState::MTA),
                2 => Ok(ApartmentState::Unknown),
                _ => Err(Self::Error::InvalidMessage(format!(
                    "Invalid ApartmentState value: {value}"
                ))),
            },
            _ => Err(Self::Error::InvalidMessage(
                "ApartmentState must be an enum".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_unknown() {
        let obj = ComplexObject::from(ApartmentState::Unknown);
        assert_eq!(obj.to_string.as_deref(), Some("Unknown"));
        assert_eq!(ApartmentState::try_from(obj).unwrap(), ApartmentState::Unknown);
    }
}
