pub mod cores;
mod macros;
pub mod rsp;
pub mod soap;
#[cfg(test)]
mod test_macro;
pub mod ws_addressing;
pub mod ws_management;

#[derive(Debug, thiserror::Error)]
pub enum WsmanError {
    #[error("XML error: {0}")]
    XmlError(#[from] psrp_xml::XmlError),

    #[error("SOAP fault: {0}")]
    SoapFault(String),

    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
}
