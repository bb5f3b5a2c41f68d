use crate::cores::namespace::*;
use crate::{define_custom_tagname, define_tagname};

pub trait TagName {
    const TAG_NAME: &'static str;
    const NAMESPACE: Option<&'static str>;

    fn tag_name(&self) -> &'static str {
        Self::TAG_NAME
    }

    fn namespace(&self) -> Option<&'static str> {
        Self::NAMESPACE
    }
}

// ==========================
// PowerShell Remoting Shell
// ==========================
define_tagname!(ShellId, Some(PWSH_NAMESPACE));
define_tagname!(Name, Some(PWSH_NAMESPACE));
define_tagname!(ResourceUri, Some(PWSH_NAMESPACE));
define_tagname!(Owner, Some(PWSH_NAMESPACE));
define_tagname!(ClientIP, Some(PWSH_NAMESPACE));
define_tagname!(ProcessId, Some(PWSH_NAMESPACE));
define_tagname!(IdleTimeOut, Some(PWSH_NAMESPACE));
define_tagname!(InputStreams, Some(PWSH_NAMESPACE));
define_tagname!(OutputStreams, Some(PWSH_NAMESPACE));
define_tagname!(MaxIdleTimeOut, Some(PWSH_NAMESPACE));
define_tagname!(Locale, Some(PWSH_NAMESPACE));
define_tagname!(DataLocale, Some(PWSH_NAMESPACE));
define_tagname!(CompressionMode, Some(PWSH_NAMESPACE));
define_tagname!(ProfileLoaded, Some(PWSH_NAMESPACE));
define_tagname!(Encoding, Some(PWSH_NAMESPACE));
define_tagname!(BufferMode, Some(PWSH_NAMESPACE));
define_tagname!(State, Some(PWSH_NAMESPACE));
define_tagname!(ShellRunTime, Some(PWSH_NAMESPACE));
define_tagname!(ShellInactivity, Some(PWSH_NAMESPACE));
define_custom_tagname!(CreationXml, "creationXml", None);

// PowerShell Remoting Operations
define_tagname!(Shell, Some(PWSH_NAMESPACE));
define_tagname!(Command, Some(PWSH_NAMESPACE));
define_tagname!(CommandLine, Some(PWSH_NAMESPACE));
define_tagname!(CommandResponse, Some(PWSH_NAMESPACE));
define_tagname!(CommandId, Some(PWSH_NAMESPACE));
define_tagname!(Receive, Some(PWSH_NAMESPACE));
define_tagname!(ReceiveResponse, Some(PWSH_NAMESPACE));
define_tagname!(Send, Some(PWSH_NAMESPACE));
define_tagname!(Signal, Some(PWSH_NAMESPACE));
define_tagname!(SignalResponse, Some(PWSH_NAMESPACE));
define_tagname!(DesiredStream, Some(PWSH_NAMESPACE));
define_tagname!(Stream, Some(PWSH_NAMESPACE));
define_tagname!(CommandState, Some(PWSH_NAMESPACE));
define_tagname!(ExitCode, Some(PWSH_NAMESPACE));
define_tagname!(Arguments, Some(PWSH_NAMESPACE));
define_custom_tagname!(SignalCode, "Code", Some(PWSH_NAMESPACE));
define_tagname!(Disconnect, Some(PWSH_NAMESPACE));
define_tagname!(DisconnectResponse, Some(PWSH_NAMESPACE));
define_tagname!(Reconnect, Some(PWSH_NAMESPACE));
define_tagname!(ReconnectResponse, Some(PWSH_NAMESPACE));
define_tagname!(Connect, Some(PWSH_NAMESPACE));
define_tagname!(ConnectResponse, Some(PWSH_NAMESPACE));

// WS-Enumeration (response-side, shared with WS-Management Enumerate/Pull above)
define_tagname!(EnumerationContext, Some(WS_ENUMERATION_NAMESPACE));
define_tagname!(Items, Some(MS_WSMAN_NAMESPACE));
define_tagname!(EndOfSequence, Some(WS_ENUMERATION_NAMESPACE));
define_tagname!(EnumerateResponse, Some(WS_ENUMERATION_NAMESPACE));
define_tagname!(PullResponse, Some(WS_ENUMERATION_NAMESPACE));

// ====================
// WS-Addressing (WSA)
// ====================
define_tagname!(Action, Some(WSA_NAMESPACE));
define_tagname!(To, Some(WSA_NAMESPACE));
define_tagname!(MessageID, Some(WSA_NAMESPACE));
define_tagname!(RelatesTo, Some(WSA_NAMESPACE));
define_tagname!(ReplyTo, Some(WSA_NAMESPACE));
define_tagname!(FaultTo, Some(WSA_NAMESPACE));
define_tagname!(From, Some(WSA_NAMESPACE));
define_tagname!(Address, Some(WSA_NAMESPACE));
define_tagname!(ReferenceParameters, Some(WSA_NAMESPACE));

// =============
// SOAP (Envelope)
// =============
define_tagname!(Envelope, Some(SOAP_NAMESPACE));
define_tagname!(Header, Some(SOAP_NAMESPACE));
define_tagname!(Body, Some(SOAP_NAMESPACE));
define_tagname!(Fault, Some(SOAP_NAMESPACE));
define_tagname!(Code, Some(SOAP_NAMESPACE));
define_tagname!(Subcode, Some(SOAP_NAMESPACE));
define_tagname!(Reason, Some(SOAP_NAMESPACE));
define_tagname!(Detail, Some(SOAP_NAMESPACE));
define_custom_tagname!(SoapValue, "Value", Some(SOAP_NAMESPACE));
define_custom_tagname!(SoapText, "Text", Some(SOAP_NAMESPACE));

// ===========================
// WS-Management (WSMAN)
// ===========================
define_tagname!(Identify, Some(MS_WSMAN_NAMESPACE));
define_tagname!(Get, Some(MS_WSMAN_NAMESPACE));
define_tagname!(Put, Some(MS_WSMAN_NAMESPACE));
define_tagname!(Create, Some(MS_WSMAN_NAMESPACE));
define_tagname!(Delete, Some(MS_WSMAN_NAMESPACE));
define_tagname!(Enumerate, Some(MS_WSMAN_NAMESPACE));
define_tagname!(Pull, Some(MS_WSMAN_NAMESPACE));
define_tagname!(Release, Some(MS_WSMAN_NAMESPACE));
define_tagname!(GetStatus, Some(MS_WSMAN_NAMESPACE));

// WS-Transfer
define_tagname!(ResourceCreated, Some(WS_TRANSFER_NAMESPACE));

// WSMAN Headers
define_tagname!(ResourceURI, Some(MS_WSMAN_NAMESPACE));
define_tagname!(OperationTimeout, Some(MS_WSMAN_NAMESPACE));
define_tagname!(MaxEnvelopeSize, Some(MS_WSMAN_NAMESPACE));
define_tagname!(SequenceId, Some(MS_WSMAN_NAMESPACE));
define_tagname!(OperationID, Some(MS_WSMAN_NAMESPACE));
define_tagname!(FragmentTransfer, Some(MS_WSMAN_NAMESPACE));
define_tagname!(SelectorSet, Some(MS_WSMAN_NAMESPACE));
define_tagname!(Selector, Some(MS_WSMAN_NAMESPACE));
define_tagname!(SessionId, Some(MS_WSMAN_NAMESPACE));
define_tagname!(CompressionType, Some(MS_WSMAN_NAMESPACE));
define_tagname!(OptionSet, Some(MS_WSMAN_NAMESPACE));
define_custom_tagname!(OptionTagName, "Option", Some(MS_WSMAN_NAMESPACE));
