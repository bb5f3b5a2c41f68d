use psrp_xml::parser::XmlDeserialize;
use tracing::{debug, error, instrument, warn};
use wsman_protocol::soap::SoapEnvelope;

use crate::PwshCoreError;

use super::pool::RunspacePool;

/// Held by the caller between posting the `wsman:Create` request built by
/// `RunspacePool::open` and receiving its `ResourceCreated` response.
pub struct ExpectShellCreated {
    pub(crate) runspace_pool: RunspacePool,
}

/// Result of handing a `Create` response to `ExpectShellCreated::accept`.
pub enum CreateOutcome {
    /// The shell was created; the pool is ready for `fire_receive`.
    Created(RunspacePool),
    /// The server rejected negotiation at the offered `protocolversion`. `request` is a
    /// freshly built `Create` envelope at the next entry of `PROTOCOL_VERSION_FALLBACK` —
    /// post it and feed the response back into `expect`.
    Retry {
        request: String,
        expect: ExpectShellCreated,
    },
}

fn is_negotiation_fault(fault: &wsman_protocol::soap::fault::SoapFaultValue<'_>) -> bool {
    let haystack = [fault.reason_text(), fault.subcode_text()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    haystack.contains("negotiat") || haystack.contains("protocolversion") || haystack.contains("version")
}

impl ExpectShellCreated {
    #[instrument(skip(self, body_string), fields(envelope_length = body_string.len()))]
    pub fn accept(mut self, body_string: String) -> Result<CreateOutcome, PwshCoreError> {
        debug!(target: "soap", "parsing SOAP envelope");

        let parsed = psrp_xml::parser::parse(&body_string).map_err(|e| {
            error!(target: "xml", error = %e, xml = %body_string, "failed to parse XML");
            e
        })?;

        let soap_envelope = SoapEnvelope::from_node(parsed.root_element()).map_err(|e| {
            error!(target: "soap", error = %e, "failed to parse SOAP envelope");
            PwshCoreError::XmlParsingError(e)
        })?;

        if let Some(fault) = soap_envelope.body.as_ref().fault.as_ref() {
            let fault = fault.as_ref();

            if is_negotiation_fault(fault) {
                if let Some(request) = self.runspace_pool.retry_create_with_fallback() {
                    return Ok(CreateOutcome::Retry {
                        request: request?,
                        expect: self,
                    });
                }

                warn!(
                    target: "negotiation",
                    reason = ?fault.reason_text(),
                    "exhausted protocol version fallback ladder"
                );
            }

            return Err(PwshCoreError::InvalidResponse(
                format!(
                    "shell creation rejected: {}",
                    fault.reason_text().unwrap_or("no reason given")
                )
                .into(),
            ));
        }

        self.runspace_pool
            .shell
            .accept_create_response(&soap_envelope)?;

        Ok(CreateOutcome::Created(self.runspace_pool))
    }
}
