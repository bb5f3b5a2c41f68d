use crate::ps_value::{ComplexObject, ComplexObjectContent, PsEnums, PsType};
use std::{borrow::Cow, collections::BTreeMap};

/// `System.Management.Automation.Runspaces.PSThreadOptions`, controlling how
/// the server schedules pipeline execution threads, [MS-PSRP §2.2.3.1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PSThreadOptions {
    Default = 0,
    UseNewThread = 1,
    ReuseThread = 2,
    UseCurrentThread = 3,
}

impl From<PSThreadOptions> for ComplexObject {
    fn from(option: PSThreadOptions) -> Self {
        let type_def = PsType {
            type_names: vec![
                Cow::Borrowed("System.Management.Automation.Runspaces.PSThreadOptions"),
                Cow::Borrowed("System.Enum"),
                Cow::Borrowed("System.ValueType"),
                Cow::Borrowed("System.Object"),
            ],
        };

        let to_string = match option {
            PSThreadOptions::Default => "Default".to_string(),
            PSThreadOptions::UseNewThread => "UseNewThread".to_string(),
            PSThreadOptions::ReuseThread => "ReuseThread".to_string(),
            PSThreadOptions::UseCurrentThread => "UseCurrentThread".to_string(),
        };

        ComplexObject {
            type_def: Some(type_def),
            to_string: Some(to_string),
            content: ComplexObjectContent::PsEnums(PsEnums {
                value: option as i32,
            }),
            adapted_properties: BTreeMap::new(),
            extended_properties: BTreeMap::new(),
        }
    }
}

impl TryFrom<ComplexObject> for PSThreadOptions {
    type Error = crate::PowerShellRemotingError;

    fn try_from(value: ComplexObject) -> Result<Self, Self::Error> {
        match value.content {
            ComplexObjectContent::PsEnums(PsEnums { value }) => match value {
                0 => Ok(PSThreadOptions::Default),
                1 => Ok(PSThreadOptions::UseNewThread),
                2 => Ok(PSThreadOptions::ReuseThread),
                3 => Ok(PSThreadOptions::UseCurrentThread),
                _ => Err(Self::Error::InvalidMessage(format!(
                    "Invalid PSThreadOptions value: {value}"
                ))),
            },
            _ => Err(Self::Error::InvalidMessage(
                "PSThreadOptions must be an enum".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_reuse_thread() {
        let obj = ComplexObject::from(PSThreadOptions::ReuseThread);
        assert_eq!(obj.to_string.as_deref(), Some("ReuseThread"));
        assert_eq!(
            PSThreadOptions::try_from(obj).unwrap(),
            PSThreadOptions::ReuseThread
        );
    }
}
