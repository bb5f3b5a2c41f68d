use std::sync::Arc;

use psrp_protocol::HostInfo;
use psrp_xml::parser::XmlDeserialize;
use tracing::{debug, instrument};
use wsman_protocol::{
    cores::{Tag, Text},
    soap::{SoapEnvelope, body::SoapBody},
    ws_management::{self, EnumerateValue, PullValue, WsMan},
};

use crate::PwshCoreError;

use super::{creator::RunspacePoolCreator, enums::RunspacePoolState, pool::RunspacePool};

/// One shell surfaced by `Enumerate`/`Pull`, not yet adopted as a `RunspacePool`.
#[derive(Debug, Clone)]
pub struct DiscoveredRunspacePool {
    pub shell_id: String,
    pub resource_uri: String,
}

impl DiscoveredRunspacePool {
    /// Builds a `Disconnected` pool bound to this shell, ready for `RunspacePool::connect`.
    pub fn into_runspace_pool(self, connection: Arc<WsMan>, host_info: HostInfo) -> RunspacePool {
        let mut pool = RunspacePoolCreator::builder()
            .state(RunspacePoolState::Disconnected)
            .host_info(host_info)
            .build()
            .into_runspace_pool(connection);

        pool.shell = crate::runspace::win_rs::WinRunspace::builder()
            .id(pool.id)
            .shell_id(self.shell_id)
            .resource_uri(self.resource_uri)
            .opened(true)
            .build();

        pool
    }
}

struct EnumeratedPage {
    shells: Vec<DiscoveredRunspacePool>,
    enumeration_context: Option<String>,
    end_of_sequence: bool,
}

fn resource_uri(connection: &WsMan) -> &str {
    connection.resource_uri()
}

fn items_to_pools(
    items: Vec<Tag<'_, wsman_protocol::ws_management::ResourceCreatedValue<'_>, wsman_protocol::cores::tag_name::ResourceCreated>>,
) -> Vec<DiscoveredRunspacePool> {
    items
        .into_iter()
        .filter_map(|item| {
            let resource_created = item.value;
            let reference_parameters = resource_created.reference_parameters.value;
            let shell_id = reference_parameters.selector_set.as_ref().get("ShellId")?.clone();
            let resource_uri = reference_parameters.resource_uri.as_ref().as_ref().to_string();
            Some(DiscoveredRunspacePool {
                shell_id,
                resource_uri,
            })
        })
        .collect()
}

/// Builds an `Enumerate` request scoped to the PowerShell resource URI (no `ShellId`
/// selector): the first step of reconstructing `RunspacePool`s left open by another
/// client after that client disconnected.
#[instrument(skip(connection))]
pub fn enumerate_request(connection: &WsMan) -> Result<String, PwshCoreError> {
    let enumerate_tag = Tag::from_name(wsman_protocol::cores::tag_name::Enumerate)
        .with_value(EnumerateValue::new());

    let envelope = connection.invoke(
        ws_management::WsAction::Enumerate,
        Some(resource_uri(connection)),
        SoapBody::builder().enumerate(enumerate_tag).build(),
        None,
        None,
    );

    Ok(envelope.into().to_xml_string()?)
}

/// Builds a `Pull` request continuing a previous `Enumerate`/`Pull` via its
/// `enumeration_context`.
#[instrument(skip(connection))]
pub fn pull_request(connection: &WsMan, enumeration_context: &str) -> Result<String, PwshCoreError> {
    let pull_tag = Tag::from_name(wsman_protocol::cores::tag_name::Pull)
        .with_value(PullValue::new(Text::from(enumeration_context.to_owned())));

    let envelope = connection.invoke(
        ws_management::WsAction::Pull,
        Some(resource_uri(connection)),
        SoapBody::builder().pull(pull_tag).build(),
        None,
        None,
    );

    Ok(envelope.into().to_xml_string()?)
}

fn parse_envelope(body_string: &str) -> Result<SoapEnvelope<'_>, PwshCoreError> {
    let parsed = psrp_xml::parser::parse(body_string)?;
    SoapEnvelope::from_node(parsed.root_element()).map_err(PwshCoreError::XmlParsingError)
}

fn accept_enumerate_page(body_string: &str) -> Result<EnumeratedPage, PwshCoreError> {
    let soap_envelope = parse_envelope(body_string)?;

    if let Some(enumerate_response) = soap_envelope.body.as_ref().enumerate_response.as_ref() {
        let enumerate_response = enumerate_response.as_ref();
        return Ok(EnumeratedPage {
            shells: items_to_pools(enumerate_response.items.clone()),
            enumeration_context: enumerate_response
                .enumeration_context
                .as_ref()
                .map(|c| c.as_ref().as_ref().to_string()),
            end_of_sequence: enumerate_response.end_of_sequence,
        });
    }

    if let Some(pull_response) = soap_envelope.body.as_ref().pull_response.as_ref() {
        let pull_response = pull_response.as_ref();
        return Ok(EnumeratedPage {
            shells: items_to_pools(pull_response.items.clone()),
            enumeration_context: pull_response
                .enumeration_context
                .as_ref()
                .map(|c| c.as_ref().as_ref().to_string()),
            end_of_sequence: pull_response.end_of_sequence,
        });
    }

    Err(PwshCoreError::InvalidResponse(
        "Expected EnumerateResponse or PullResponse in response".into(),
    ))
}

/// Walks a full `Enumerate`/`Pull` sequence to completion using the caller-supplied
/// `send` callback (which must post the XML and return the raw SOAP response body),
/// returning every shell advertised under the PowerShell resource URI as a
/// `Disconnected` `RunspacePool`.
///
/// `send` is synchronous by design: this crate has no transport of its own, callers
/// drive the actual network I/O (see `RunspacePool::open`/`ExpectShellCreated` for the
/// same split between request building and response acceptance).
pub fn get_runspace_pools(
    connection: Arc<WsMan>,
    host_info: HostInfo,
    mut send: impl FnMut(String) -> Result<String, PwshCoreError>,
) -> Result<Vec<RunspacePool>, PwshCoreError> {
    let mut discovered = Vec::new();

    let request = enumerate_request(&connection)?;
    let response = send(request)?;
    let mut page = accept_enumerate_page(&response)?;
    discovered.append(&mut page.shells);

    while !page.end_of_sequence {
        let Some(context) = page.enumeration_context.clone() else {
            break;
        };

        let request = pull_request(&connection, &context)?;
        let response = send(request)?;
        page = accept_enumerate_page(&response)?;
        discovered.append(&mut page.shells);
    }

    debug!(target: "discovery", shell_count = discovered.len(), "enumerated runspace pool shells");

    Ok(discovered
        .into_iter()
        .map(|shell| shell.into_runspace_pool(connection.clone(), host_info.clone()))
        .collect())
}
