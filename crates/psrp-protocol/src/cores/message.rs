use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use uuid::Uuid;

use crate::ps_value::{DeserializationContext, PsObjectWithType, PsValue, PsXmlDeserialize};

use super::{Destination, MessageType};

/// One PSRP message: the 44-byte destination/type/RPID/PID header described
/// in [MS-PSRP §2.2.1], followed by a CLIXML payload.
#[derive(Debug, Clone)]
pub struct PowerShellRemotingMessage {
    pub destination: Destination,
    pub message_type: MessageType,
    /// Runspace Pool ID.
    pub rpid: Uuid,
    /// Pipeline ID; absent (all-zero on the wire) for runspace-pool-level messages.
    pub pid: Option<Uuid>,
    /// The CLIXML payload, UTF-8 encoded, BOM stripped if present.
    pub data: Vec<u8>,
}

impl PowerShellRemotingMessage {
    pub fn parse<T>(cursor: &mut std::io::Cursor<T>) -> Result<Self, crate::PowerShellRemotingError>
    where
        T: AsRef<[u8]>,
    {
        let destination = cursor.read_u32::<LittleEndian>()?;
        let message_type = cursor
            .read_u32::<LittleEndian>()
            .map(MessageType::try_from)??;

        let mut rpid_bytes = [0u8; 16];
        cursor.read_exact(&mut rpid_bytes)?;

        let mut pid_bytes = [0u8; 16];
        cursor.read_exact(&mut pid_bytes)?;

        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest)?;

        // Strip a UTF-8 BOM if the sender included one; CLIXML payloads are
        // plain UTF-8 text but some implementations prefix it.
        if rest.starts_with(&[0xEF, 0xBB, 0xBF]) {
            rest.drain(..3);
        }

        Ok(Self {
            destination: Destination::try_from(destination)?,
            message_type,
            rpid: Uuid::from_bytes(rpid_bytes),
            pid: (!pid_bytes.iter().all(|&b| b == 0)).then(|| Uuid::from_bytes(pid_bytes)),
            data: rest,
        })
    }

    pub fn new(
        destination: Destination,
        message_type: MessageType,
        rpid: Uuid,
        pid: Option<Uuid>,
        data: &PsValue,
    ) -> Result<Self, crate::PowerShellRemotingError> {
        Ok(Self {
            destination,
            message_type,
            rpid,
            pid,
            data: data
                .to_element_as_root()?
                .to_xml_string()
                .map_err(psrp_xml::XmlError::BuilderError)?
                .into_bytes(),
        })
    }

    pub fn from_ps_message(
        message: &dyn PsObjectWithType,
        rpid: Uuid,
        pid: Option<Uuid>,
    ) -> Result<Self, crate::PowerShellRemotingError> {
        let message_type = message.message_type();
        let data = message.to_ps_object();
        Self::new(Destination::Client, message_type, rpid, pid, &data)
    }

    /// Parses this message's CLIXML payload into a [`PsValue`].
    pub fn parse_ps_message(&self) -> Result<PsValue, crate::PowerShellRemotingError> {
        let text = std::str::from_utf8(&self.data)?;
        let document = psrp_xml::parser::parse(text)?;
        let root = document.root_element();
        let mut context = DeserializationContext::new();
        PsValue::from_node_with_context(root, &mut context)
            .map_err(crate::PowerShellRemotingError::XmlError)
    }

    pub fn pack(self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(44 + self.data.len());
        buffer
            .write_u32::<LittleEndian>(self.destination as u32)
            .expect("writing to a Vec never fails");
        buffer
            .write_u32::<LittleEndian>(self.message_type.value())
            .expect("writing to a Vec never fails");
        buffer.extend_from_slice(self.rpid.as_bytes());
        buffer.extend_from_slice(self.pid.unwrap_or(Uuid::nil()).as_bytes());
        buffer.extend_from_slice(&self.data);
        buffer
    }
}
