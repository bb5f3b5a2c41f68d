use base64::Engine;
use uuid::Uuid;
use wsman_protocol::{
    cores::{Attribute, Tag, Time},
    rsp::{
        commandline::CommandLineValue,
        receive::ReceiveValue,
        rsp::ShellValue,
        signal::{SIGNAL_CODE_TERMINATE, SignalValue},
    },
    soap::{SoapEnvelope, body::SoapBody},
    ws_management::{self, OptionSetValue, SelectorSetValue, WsMan},
};
use psrp_xml::builder::Element;

use crate::{PwshCoreError, runspace_pool::DesiredStream};

/// One `<rsp:Stream>` element from a `ReceiveResponse`, with its content
/// already base64-decoded so it can be handed straight to a `Defragmenter`.
#[derive(Debug, Clone)]
pub struct Stream {
    name: String,
    command_id: Option<Uuid>,
    value: Vec<u8>,
}

impl Stream {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command_id(&self) -> Option<&Uuid> {
        self.command_id.as_ref()
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

/// Terminal `<rsp:CommandState>` carried alongside the last `Stream`s of a pipeline.
#[derive(Debug, Clone)]
pub struct CommandStateInfo {
    pub command_id: Uuid,
    state: String,
}

const COMMAND_STATE_DONE: &str =
    "http://schemas.microsoft.com/wbem/wsman/1/windows/shell/CommandState/Done";

impl CommandStateInfo {
    pub fn is_done(&self) -> bool {
        self.state == COMMAND_STATE_DONE
    }
}

#[derive(Debug, Clone, typed_builder::TypedBuilder)]
pub struct WinRunspace {
    #[builder(default = "stdin pr".to_string())]
    input_streams: String,
    #[builder(default = "stdout".to_string())]
    output_streams: String,
    #[builder(default, setter(strip_option))]
    idle_time_out: Option<f64>,
    #[builder(default, setter(strip_option))]
    name: Option<String>,

    #[builder(default = "http://schemas.microsoft.com/powershell/Microsoft.PowerShell".to_string())]
    resource_uri: String,

    #[builder(default = uuid::Uuid::new_v4())]
    id: uuid::Uuid,

    #[builder(default)]
    no_profile: Option<bool>,

    #[builder(default)]
    codepage: Option<u32>,

    #[builder(default)]
    shell_id: Option<String>,
    #[builder(default)]
    owner: Option<String>,
    #[builder(default)]
    client_ip: Option<String>,
    #[builder(default)]
    shell_run_time: Option<String>,
    #[builder(default)]
    shell_inactivity: Option<String>,

    #[builder(default)]
    selector_set: SelectorSetValue,

    #[builder(default)]
    opened: bool,

    /// Pipeline a `Signal` was last sent for, so the (content-free)
    /// `SignalResponse` can be correlated back to it.
    #[builder(default)]
    pending_signal: Option<Uuid>,
}

impl WinRunspace {
    pub fn open<'a>(
        &'a self,
        connection: &'a WsMan,
        option_set: Option<OptionSetValue>,
        open_content: &'a str,
    ) -> impl Into<Element<'a>> {
        let shell = Tag::from_name(wsman_protocol::cores::tag_name::Shell)
            .with_attribute(Attribute::ShellId(self.id.to_string().into()))
            .with_attribute(Attribute::Name(
                self.name.as_deref().unwrap_or("Runspace1").into(),
            ))
            .with_declaration(wsman_protocol::cores::Namespace::WsmanShell);

        let shell_value = ShellValue::builder()
            .input_streams(self.input_streams.as_ref())
            .output_streams(self.output_streams.as_ref())
            .idle_time_out_opt(self.idle_time_out.map(Time).map(Tag::new))
            .creation_xml(
                Tag::new(open_content)
                    .with_declaration(wsman_protocol::cores::Namespace::PowerShellRemoting),
            )
            .build();

        let shell = shell.with_value(shell_value);

        let mut option_set = option_set.unwrap_or_default();

        if let Some(profile) = self.no_profile {
            option_set = option_set.add_option("WINRS_NOPROFILE", profile.to_string());
        }

        if let Some(codepage) = self.codepage {
            option_set = option_set.add_option("WINRS_CODEPAGE", codepage.to_string());
        }

        connection.invoke(
            ws_management::WsAction::Create,
            None,
            SoapBody::builder().shell(shell).build(),
            Some(option_set),
            None,
        )
    }

    pub(crate) fn fire_receive<'a>(
        &'a self,
        connection: &'a WsMan,
        desired_streams: Vec<DesiredStream>,
    ) -> impl Into<Element<'a>> {
        let desired_streams = desired_streams
            .into_iter()
            .map(|desired_stream| {
                let tag = Tag::new(desired_stream.name().to_string())
                    .with_name(wsman_protocol::cores::tag_name::DesiredStream);

                if let Some(command_id) = desired_stream.command_id() {
                    tag.with_attribute(Attribute::CommandId(*command_id))
                } else {
                    tag
                }
            })
            .collect();

        let receive = ReceiveValue::builder()
            .desired_streams(desired_streams)
            .build();

        let receive_tag = Tag::from_name(wsman_protocol::cores::tag_name::Receive)
            .with_value(receive)
            .with_declaration(wsman_protocol::cores::Namespace::WsmanShell);

        let option_set =
            OptionSetValue::default().add_option("WSMAN_CMDSHELL_OPTION_KEEPALIVE", true.to_string());

        let selector_set = self
            .shell_id
            .as_ref()
            .map(|shell_id| SelectorSetValue::new().add_selector("ShellId", shell_id));

        connection.invoke(
            ws_management::WsAction::ShellReceive,
            Some(&self.resource_uri),
            SoapBody::builder().receive(receive_tag).build(),
            Some(option_set),
            selector_set,
        )
    }

    pub(crate) fn accept_receive_response<'a>(
        soap_envelope: &SoapEnvelope<'a>,
    ) -> Result<(Vec<Stream>, Option<CommandStateInfo>), PwshCoreError> {
        let receive_response = soap_envelope
            .body
            .as_ref()
            .receive_response
            .as_ref()
            .ok_or(PwshCoreError::InvalidResponse(
                "No ReceiveResponse found in response".into(),
            ))?;

        let streams = receive_response
            .as_ref()
            .streams
            .iter()
            .map(|stream| {
                let stream = stream.as_ref();
                let content: &str = stream.content.as_ref();
                let value = base64::engine::general_purpose::STANDARD
                    .decode(content)
                    .map_err(|_| {
                        PwshCoreError::InvalidResponse("Failed to decode stream content".into())
                    })?;

                let command_id = stream
                    .command_id
                    .as_ref()
                    .map(|id| Uuid::parse_str(id))
                    .transpose()
                    .map_err(|_| {
                        PwshCoreError::InvalidResponse("Invalid CommandId on stream".into())
                    })?;

                Ok(Stream {
                    name: stream.name.to_string(),
                    command_id,
                    value,
                })
            })
            .collect::<Result<Vec<_>, PwshCoreError>>()?;

        let command_state = receive_response
            .as_ref()
            .command_state
            .as_ref()
            .map(|command_state| {
                let command_state = command_state.as_ref();
                let command_id = Uuid::parse_str(command_state.command_id.as_ref())
                    .map_err(|_| {
                        PwshCoreError::InvalidResponse("Invalid CommandId on CommandState".into())
                    })?;

                Ok::<_, PwshCoreError>(CommandStateInfo {
                    command_id,
                    state: command_state.state.to_string(),
                })
            })
            .transpose()?;

        Ok((streams, command_state))
    }

    pub(crate) fn accept_create_response<'a>(
        &mut self,
        soap_envelope: &SoapEnvelope<'a>,
    ) -> Result<(), PwshCoreError> {
        let shell = soap_envelope.body.as_ref().shell.as_ref().ok_or(
            PwshCoreError::InvalidResponse("No shell found in response".into()),
        )?;

        let shell_id = shell.as_ref().shell_id.as_ref().map(|id| id.clone_value());
        let resource_uri = &shell.as_ref().resource_uri;
        let owner = &shell.as_ref().owner;
        let client_ip = &shell.as_ref().client_ip;
        let idle_time_out = &shell.as_ref().idle_time_out;
        let output_streams = &shell.as_ref().output_streams;
        let shell_run_time = &shell.as_ref().shell_run_time;
        let shell_inactivity = &shell.as_ref().shell_inactivity;

        self.shell_id = shell_id.map(|s| s.as_ref().to_string());
        self.owner = owner.as_ref().map(|o| o.as_ref().as_ref().to_string());
        self.client_ip = client_ip.as_ref().map(|c| c.as_ref().as_ref().to_string());
        self.idle_time_out = idle_time_out.as_ref().map(|t| t.as_ref().0);
        self.output_streams = output_streams
            .as_ref()
            .map(|o| o.as_ref().as_ref().to_string())
            .unwrap_or_else(|| "stdout".to_string());

        self.resource_uri = resource_uri
            .as_ref()
            .map(|r| r.as_ref().as_ref().to_string())
            .unwrap_or_else(|| self.resource_uri.clone());

        self.shell_run_time = shell_run_time
            .as_ref()
            .map(|t| t.as_ref().as_ref().to_string());

        self.shell_inactivity = shell_inactivity
            .as_ref()
            .map(|t| t.as_ref().as_ref().to_string());

        let resource_created = soap_envelope.body.as_ref().resource_created.as_ref().ok_or(
            PwshCoreError::InvalidResponse("No ResourceCreated found in response".into()),
        )?;

        let reference_parameters = resource_created.as_ref().reference_parameters.as_ref();
        let selector_set = &reference_parameters.selector_set;

        self.selector_set = selector_set.as_ref().clone();

        self.opened = true;

        Ok(())
    }

    pub(crate) fn create_pipeline_request<'a>(
        &'a self,
        connection: &'a WsMan,
        command_id: uuid::Uuid,
        arguments: Vec<String>,
        executable: Option<String>,
        no_shell: Option<bool>,
    ) -> impl Into<Element<'a>> {
        let command_line = CommandLineValue {
            command: executable,
            arguments,
        };

        connection.invoke(
            ws_management::WsAction::Command,
            Some(self.resource_uri.as_ref()),
            SoapBody::builder()
                .command_line(
                    Tag::new(command_line)
                        .with_attribute(Attribute::CommandId(command_id)),
                )
                .build(),
            Some(OptionSetValue::default().add_option(
                "WINRS_SKIP_CMD_SHELL",
                no_shell.unwrap_or_default().to_string(),
            )),
            self.selector_set.clone().into(),
        )
    }

    pub(crate) fn accept_commannd_response<'a>(
        &mut self,
        soap_envelope: &SoapEnvelope<'a>,
    ) -> Result<Uuid, PwshCoreError> {
        let command_response = soap_envelope
            .body
            .as_ref()
            .command_response
            .as_ref()
            .ok_or(PwshCoreError::InvalidResponse(
                "No CommandResponse found in response".into(),
            ))?;

        let command_id: &wsman_protocol::cores::WsUuid = command_response.as_ref().as_ref();

        Ok(*command_id.as_ref())
    }

    pub(crate) fn terminal_pipeline_signal<'a>(
        &'a mut self,
        connection: &'a WsMan,
        pipeline_id: Uuid,
    ) -> Result<impl Into<Element<'a>>, PwshCoreError> {
        self.pending_signal = Some(pipeline_id);

        let signal_value = SignalValue::builder()
            .code(Tag::new(SIGNAL_CODE_TERMINATE))
            .build();

        let signal_tag = Tag::from_name(wsman_protocol::cores::tag_name::Signal)
            .with_attribute(Attribute::CommandId(pipeline_id))
            .with_value(signal_value)
            .with_declaration(wsman_protocol::cores::Namespace::WsmanShell);

        let selector_set = self
            .shell_id
            .as_ref()
            .map(|shell_id| SelectorSetValue::new().add_selector("ShellId", shell_id));

        Ok(connection.invoke(
            ws_management::WsAction::Signal,
            Some(self.resource_uri.as_ref()),
            SoapBody::builder().signal(signal_tag).build(),
            None,
            selector_set,
        ))
    }

    pub(crate) fn accept_signal_response<'a>(
        &mut self,
        soap_envelope: &SoapEnvelope<'a>,
    ) -> Result<Option<Uuid>, PwshCoreError> {
        if soap_envelope.body.as_ref().signal_response.is_none() {
            return Ok(None);
        }

        Ok(self.pending_signal.take())
    }

    pub(crate) fn disconnect<'a>(
        &'a self,
        connection: &'a WsMan,
        idle_timeout: Option<Time>,
    ) -> impl Into<Element<'a>> {
        let disconnect_tag = Tag::from_name(wsman_protocol::cores::tag_name::Disconnect)
            .with_value(wsman_protocol::cores::Empty)
            .with_declaration(wsman_protocol::cores::Namespace::WsmanShell);

        let option_set = idle_timeout
            .map(|t| OptionSetValue::default().add_option("IdleTimeOut", format!("PT{:.3}S", t.0)));

        let selector_set = self
            .shell_id
            .as_ref()
            .map(|shell_id| SelectorSetValue::new().add_selector("ShellId", shell_id));

        connection.invoke(
            ws_management::WsAction::Disconnect,
            Some(self.resource_uri.as_ref()),
            SoapBody::builder().disconnect(disconnect_tag).build(),
            option_set,
            selector_set,
        )
    }

    pub(crate) fn accept_disconnect_response<'a>(
        soap_envelope: &SoapEnvelope<'a>,
    ) -> Result<(), PwshCoreError> {
        soap_envelope
            .body
            .as_ref()
            .disconnect_response
            .as_ref()
            .ok_or(PwshCoreError::InvalidResponse(
                "No DisconnectResponse found in response".into(),
            ))?;

        Ok(())
    }

    pub(crate) fn reconnect<'a>(&'a self, connection: &'a WsMan) -> impl Into<Element<'a>> {
        let reconnect_tag = Tag::from_name(wsman_protocol::cores::tag_name::Reconnect)
            .with_value(wsman_protocol::cores::Empty)
            .with_declaration(wsman_protocol::cores::Namespace::WsmanShell);

        let selector_set = self
            .shell_id
            .as_ref()
            .map(|shell_id| SelectorSetValue::new().add_selector("ShellId", shell_id));

        connection.invoke(
            ws_management::WsAction::Reconnect,
            Some(self.resource_uri.as_ref()),
            SoapBody::builder().reconnect(reconnect_tag).build(),
            None,
            selector_set,
        )
    }

    pub(crate) fn accept_reconnect_response<'a>(
        soap_envelope: &SoapEnvelope<'a>,
    ) -> Result<(), PwshCoreError> {
        soap_envelope
            .body
            .as_ref()
            .reconnect_response
            .as_ref()
            .ok_or(PwshCoreError::InvalidResponse(
                "No ReconnectResponse found in response".into(),
            ))?;

        Ok(())
    }

    pub(crate) fn connect<'a>(&'a self, connection: &'a WsMan) -> impl Into<Element<'a>> {
        let connect_tag = Tag::from_name(wsman_protocol::cores::tag_name::Connect)
            .with_value(wsman_protocol::cores::Empty)
            .with_declaration(wsman_protocol::cores::Namespace::WsmanShell);

        let selector_set = self
            .shell_id
            .as_ref()
            .map(|shell_id| SelectorSetValue::new().add_selector("ShellId", shell_id));

        connection.invoke(
            ws_management::WsAction::Connect,
            Some(self.resource_uri.as_ref()),
            SoapBody::builder().connect(connect_tag).build(),
            None,
            selector_set,
        )
    }

    pub(crate) fn accept_connect_response<'a>(
        &mut self,
        soap_envelope: &SoapEnvelope<'a>,
    ) -> Result<(), PwshCoreError> {
        soap_envelope
            .body
            .as_ref()
            .connect_response
            .as_ref()
            .ok_or(PwshCoreError::InvalidResponse(
                "No ConnectResponse found in response".into(),
            ))?;

        self.opened = true;

        Ok(())
    }

    pub(crate) fn send_data_request<'a>(
        &'a self,
        connection: &'a WsMan,
        command_id: Option<Uuid>,
        arguments: &'a [String],
    ) -> Result<impl Into<Element<'a>>, PwshCoreError> {
        let streams = arguments
            .iter()
            .map(|argument| Tag::new(argument.as_str()).with_name(wsman_protocol::cores::tag_name::Stream))
            .collect();

        let send_value = wsman_protocol::rsp::send::SendValue::builder()
            .streams(streams)
            .build();

        let mut send_tag_holder = Tag::from_name(wsman_protocol::cores::tag_name::Send)
            .with_declaration(wsman_protocol::cores::Namespace::WsmanShell);

        if let Some(command_id) = command_id {
            send_tag_holder = send_tag_holder.with_attribute(Attribute::CommandId(command_id));
        }

        let send_tag = send_tag_holder.with_value(send_value);

        let selector_set = self
            .shell_id
            .as_ref()
            .map(|shell_id| SelectorSetValue::new().add_selector("ShellId", shell_id));

        Ok(connection.invoke(
            ws_management::WsAction::ShellSend,
            Some(self.resource_uri.as_ref()),
            SoapBody::builder().send(send_tag).build(),
            None,
            selector_set,
        ))
    }
}
