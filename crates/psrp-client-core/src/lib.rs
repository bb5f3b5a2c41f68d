use std::borrow::Cow;

pub mod connector;
pub mod credentials;
pub mod host;
pub mod pipeline;
pub mod powershell;
pub mod psrp_record;
pub mod runspace;
pub mod runspace_pool;

pub use connector::config::{Authentication, KerberosConfig, SspiAuthConfig};
pub use credentials::ClientAuthIdentity;

#[derive(Debug, thiserror::Error)]
pub enum PwshCoreError {
    #[error("Connector error: {0}")]
    ConnectorError(String),

    #[error("Runspace error: {0}")]
    RunspaceError(String),

    #[error("Hyper error: {0}")]
    IOError(std::io::Error),

    #[error("Hyper error: {0}")]
    HyperError(#[from] hyper::http::Error),

    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error("Invalid operation: {0}")]
    InvalidOperation(&'static str),

    #[error("Something unlikely happened: {0}")]
    UnlikelyToHappen(&'static str),

    #[error("Protocol error: {0}")]
    PowerShellRemotingError(#[from] psrp_protocol::PowerShellRemotingError),

    #[error("XML parsing error: {0}")]
    XmlParsingError(#[from] psrp_xml::XmlError),

    #[error("Invalid response: {0}")]
    InvalidResponse(Cow<'static, str>),

    #[error("Host error: {0}")]
    HostError(#[from] crate::host::HostError),

    #[error("SSPI error: {0}")]
    SspiError(#[from] sspi::Error),

    #[error("SSPI username error: {0}")]
    UsernameError(&'static str),

    #[error("Authentication error: {0}")]
    Auth(&'static str),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("WS-Management error: {0}")]
    WsmanError(#[from] wsman_protocol::WsmanError),

    #[error("XML builder error: {0}")]
    XmlBuilderError(#[from] psrp_xml::builder::XmlBuilderError),

    #[error("Invalid server address: {0}")]
    InvalidServerAddress(&'static str),
}
