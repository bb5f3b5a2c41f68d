/// Who a PSRP message is addressed to — carried verbatim in every message
/// header. See [MS-PSRP §2.2.1].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Client = 0x0000_0001,
    Server = 0x0000_0002,
}

impl TryFrom<u32> for Destination {
    type Error = crate::PowerShellRemotingError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0x0000_0001 => Ok(Destination::Client),
            0x0000_0002 => Ok(Destination::Server),
            _ => Err(crate::PowerShellRemotingError::InvalidMessage(format!(
                "unknown Destination value: 0x{value:08x}"
            ))),
        }
    }
}
