use crate::{
    cores::*,
    rsp::{
        commandline::CommandLineValue,
        receive::{ReceiveResponseValue, ReceiveValue},
        rsp::ShellValue,
        send::SendValue,
        signal::SignalValue,
    },
    soap::fault::SoapFaultValue,
    ws_management::body::{
        EnumerateResponseValue, EnumerateValue, GetStatusValue, PullResponseValue, PullValue,
        ReleaseValue, ResourceCreatedValue,
    },
};

#[derive(
    Debug,
    Clone,
    typed_builder::TypedBuilder,
    ironposh_macros::SimpleTagValue,
    ironposh_macros::SimpleXmlDeserialize,
)]
pub struct SoapBody<'a> {
    /// WS-Management operations
    #[builder(default, setter(into, strip_option))]
    pub identify: Option<Tag<'a, Empty, Identify>>,
    #[builder(default, setter(into, strip_option))]
    pub get: Option<Tag<'a, Text<'a>, Get>>,
    #[builder(default, setter(into, strip_option))]
    pub put: Option<Tag<'a, Text<'a>, Put>>,
    #[builder(default, setter(into, strip_option))]
    pub create: Option<Tag<'a, Text<'a>, Create>>,
    #[builder(default, setter(into, strip_option))]
    pub delete: Option<Tag<'a, Text<'a>, Delete>>,
    #[builder(default, setter(into, strip_option))]
    pub enumerate: Option<Tag<'a, EnumerateValue<'a>, Enumerate>>,
    #[builder(default, setter(into, strip_option))]
    pub pull: Option<Tag<'a, PullValue<'a>, Pull>>,
    #[builder(default, setter(into, strip_option))]
    pub release: Option<Tag<'a, ReleaseValue<'a>, Release>>,
    #[builder(default, setter(into, strip_option))]
    pub get_status: Option<Tag<'a, GetStatusValue<'a>, GetStatus>>,

    /// WS-Transfer operations
    #[builder(default, setter(into, strip_option))]
    pub resource_created: Option<Tag<'a, ResourceCreatedValue<'a>, ResourceCreated>>,

    /// PowerShell Remoting operations
    #[builder(default, setter(into, strip_option))]
    pub shell: Option<Tag<'a, ShellValue<'a>, Shell>>,
    #[builder(default, setter(into, strip_option))]
    pub command_line: Option<Tag<'a, CommandLineValue, CommandLine>>,
    #[builder(default, setter(into, strip_option))]
    pub receive: Option<Tag<'a, ReceiveValue<'a>, Receive>>,
    #[builder(default, setter(into, strip_option))]
    pub receive_response: Option<Tag<'a, ReceiveResponseValue<'a>, ReceiveResponse>>,
    #[builder(default, setter(into, strip_option))]
    pub command_response: Option<Tag<'a, Tag<'a, WsUuid, CommandId>, CommandResponse>>,
    #[builder(default, setter(into, strip_option))]
    pub send: Option<Tag<'a, SendValue<'a>, Send>>,
    #[builder(default, setter(into, strip_option))]
    pub signal: Option<Tag<'a, SignalValue<'a>, Signal>>,
    #[builder(default, setter(into, strip_option))]
    pub signal_response: Option<Tag<'a, Empty, SignalResponse>>,
    #[builder(default, setter(into, strip_option))]
    pub disconnect: Option<Tag<'a, Empty, Disconnect>>,
    #[builder(default, setter(into, strip_option))]
    pub disconnect_response: Option<Tag<'a, Empty, DisconnectResponse>>,
    #[builder(default, setter(into, strip_option))]
    pub reconnect: Option<Tag<'a, Empty, Reconnect>>,
    #[builder(default, setter(into, strip_option))]
    pub reconnect_response: Option<Tag<'a, Empty, ReconnectResponse>>,
    #[builder(default, setter(into, strip_option))]
    pub connect: Option<Tag<'a, Empty, Connect>>,
    #[builder(default, setter(into, strip_option))]
    pub connect_response: Option<Tag<'a, Empty, ConnectResponse>>,
    #[builder(default, setter(into, strip_option))]
    pub enumerate_response: Option<Tag<'a, EnumerateResponseValue<'a>, EnumerateResponse>>,
    #[builder(default, setter(into, strip_option))]
    pub pull_response: Option<Tag<'a, PullResponseValue<'a>, PullResponse>>,

    /// SOAP Fault, present instead of an operation-specific body on error responses.
    #[builder(default, setter(into, strip_option))]
    pub fault: Option<Tag<'a, SoapFaultValue<'a>, Fault>>,
}
