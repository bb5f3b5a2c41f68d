use crate::MessageType;
use crate::ps_value::{PsObjectWithType, PsValue};

/// One object written to a running pipeline's input stream, [MS-PSRP §2.2.2.18].
/// Unlike most PSRP messages this one has no fixed property shape — the
/// payload is whatever `PsValue` the caller piped in, serialized as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineInput {
    pub data: PsValue,
}

impl PipelineInput {
    pub fn new(data: PsValue) -> Self {
        Self { data }
    }
}

impl PsObjectWithType for PipelineInput {
    fn message_type(&self) -> MessageType {
        MessageType::PipelineInput
    }

    fn to_ps_object(&self) -> PsValue {
        self.data.clone()
    }
}

impl From<PsValue> for PipelineInput {
    fn from(data: PsValue) -> Self {
        Self::new(data)
    }
}
