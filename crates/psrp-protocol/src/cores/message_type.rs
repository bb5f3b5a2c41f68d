/// The PSRP message type enumeration, [MS-PSRP §2.2.1] / §2.2.4 — 31 values
/// that identify what a `PowerShellRemotingMessage`'s CLIXML payload is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    SessionCapability,
    InitRunspacepool,
    PublicKey,
    EncryptedSessionKey,
    PublicKeyRequest,
    ConnectRunspacepool,
    SetMaxRunspaces,
    SetMinRunspaces,
    RunspaceAvailability,
    RunspacepoolState,
    CreatePipeline,
    GetAvailableRunspaces,
    UserEvent,
    ApplicationPrivateData,
    GetCommandMetadata,
    RunspacepoolInitData,
    ResetRunspaceState,
    RunspacepoolHostCall,
    RunspacepoolHostResponse,
    PipelineInput,
    EndOfPipelineInput,
    PipelineOutput,
    ErrorRecord,
    PipelineState,
    DebugRecord,
    VerboseRecord,
    WarningRecord,
    ProgressRecord,
    InformationRecord,
    PipelineHostCall,
    PipelineHostResponse,
}

impl MessageType {
    pub fn value(self) -> u32 {
        match self {
            MessageType::SessionCapability => 0x0001_0002,
            MessageType::InitRunspacepool => 0x0001_0004,
            MessageType::PublicKey => 0x0001_0005,
            MessageType::EncryptedSessionKey => 0x0001_0006,
            MessageType::PublicKeyRequest => 0x0001_0007,
            MessageType::ConnectRunspacepool => 0x0001_0008,
            MessageType::SetMaxRunspaces => 0x0002_1002,
            MessageType::SetMinRunspaces => 0x0002_1003,
            MessageType::RunspaceAvailability => 0x0002_1004,
            MessageType::RunspacepoolState => 0x0002_1005,
            MessageType::CreatePipeline => 0x0002_1006,
            MessageType::GetAvailableRunspaces => 0x0002_1007,
            MessageType::UserEvent => 0x0002_1008,
            MessageType::ApplicationPrivateData => 0x0002_1009,
            MessageType::GetCommandMetadata => 0x0002_100A,
            MessageType::RunspacepoolInitData => 0x0002_100B,
            MessageType::ResetRunspaceState => 0x0002_100C,
            MessageType::RunspacepoolHostCall => 0x0002_1100,
            MessageType::RunspacepoolHostResponse => 0x0002_1101,
            MessageType::PipelineInput => 0x0004_1002,
            MessageType::EndOfPipelineInput => 0x0004_1003,
            MessageType::PipelineOutput => 0x0004_1004,
            MessageType::ErrorRecord => 0x0004_1005,
            MessageType::PipelineState => 0x0004_1006,
            MessageType::DebugRecord => 0x0004_1007,
            MessageType::VerboseRecord => 0x0004_1008,
            MessageType::WarningRecord => 0x0004_1009,
            MessageType::ProgressRecord => 0x0004_1010,
            MessageType::InformationRecord => 0x0004_1011,
            MessageType::PipelineHostCall => 0x0004_1100,
            MessageType::PipelineHostResponse => 0x0004_1101,
        }
    }
}

impl TryFrom<u32> for MessageType {
    type Error = crate::PowerShellRemotingError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0x0001_0002 => Ok(MessageType::SessionCapability),
            0x0001_0004 => Ok(MessageType::InitRunspacepool),
            0x0001_0005 => Ok(MessageType::PublicKey),
            0x0001_0006 => Ok(MessageType::EncryptedSessionKey),
            0x0001_0007 => Ok(MessageType::PublicKeyRequest),
            0x0001_0008 => Ok(MessageType::ConnectRunspacepool),
            0x0002_1002 => Ok(MessageType::SetMaxRunspaces),
            0x0002_1003 => Ok(MessageType::SetMinRunspaces),
            0x0002_1004 => Ok(MessageType::RunspaceAvailability),
            0x0002_1005 => Ok(MessageType::RunspacepoolState),
            0x0002_1006 => Ok(MessageType::CreatePipeline),
            0x0002_1007 => Ok(MessageType::GetAvailableRunspaces),
            0x0002_1008 => Ok(MessageType::UserEvent),
            0x0002_1009 => Ok(MessageType::ApplicationPrivateData),
            0x0002_100A => Ok(MessageType::GetCommandMetadata),
            0x0002_100B => Ok(MessageType::RunspacepoolInitData),
            0x0002_100C => Ok(MessageType::ResetRunspaceState),
            0x0002_1100 => Ok(MessageType::RunspacepoolHostCall),
            0x0002_1101 => Ok(MessageType::RunspacepoolHostResponse),
            0x0004_1002 => Ok(MessageType::PipelineInput),
            0x0004_1003 => Ok(MessageType::EndOfPipelineInput),
            0x0004_1004 => Ok(MessageType::PipelineOutput),
            0x0004_1005 => Ok(MessageType::ErrorRecord),
            0x0004_1006 => Ok(MessageType::PipelineState),
            0x0004_1007 => Ok(MessageType::DebugRecord),
            0x0004_1008 => Ok(MessageType::VerboseRecord),
            0x0004_1009 => Ok(MessageType::WarningRecord),
            0x0004_1010 => Ok(MessageType::ProgressRecord),
            0x0004_1011 => Ok(MessageType::InformationRecord),
            0x0004_1100 => Ok(MessageType::PipelineHostCall),
            0x0004_1101 => Ok(MessageType::PipelineHostResponse),
            _ => Err(crate::PowerShellRemotingError::InvalidMessage(format!(
                "unknown MessageType value: 0x{value:08x}"
            ))),
        }
    }
}
