use sspi::{Kerberos, KerberosConfig as SspiKerberosConfig, Negotiate, NegotiateConfig, Ntlm};
use tracing::{debug, instrument};

use crate::PwshCoreError;
use crate::connector::{
    authenticator::{ActionReqired, SecContextMaybeInit, SspiAuthenticator, SspiConfig, SspiContext, Token},
    config::{KerberosConfig, SspiAuthConfig},
    conntion_pool::ConnectionPool,
    encryption::EncryptionProvider,
    http::{HttpBody, HttpBuilder, HttpRequest, HttpResponse},
};

/// Owns the negotiated SSPI security context for whichever mechanism was selected.
#[derive(Debug)]
pub enum AuthContext {
    Ntlm(SspiContext<Ntlm>),
    Kerberos(SspiContext<Kerberos>),
    Negotiate(SspiContext<Negotiate>),
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub sspi_config: SspiAuthConfig,
    pub require_encryption: bool,
}

fn to_sspi_kerberos_config(config: &KerberosConfig) -> SspiKerberosConfig {
    SspiKerberosConfig {
        kdc_url: config.kdc_url.clone(),
        client_computer_name: config.client_computer_name.clone(),
    }
}

fn build_context(sspi_config: SspiAuthConfig, target: String) -> Result<AuthContext, PwshCoreError> {
    let config = SspiConfig::new(target.clone());

    match sspi_config {
        SspiAuthConfig::NTLM { identity } => {
            Ok(AuthContext::Ntlm(SspiContext::new_ntlm(identity, config)?))
        }
        SspiAuthConfig::Kerberos {
            identity,
            kerberos_config,
        } => Ok(AuthContext::Kerberos(SspiContext::new_kerberos(
            identity,
            to_sspi_kerberos_config(&kerberos_config),
            config,
        )?)),
        SspiAuthConfig::Negotiate {
            identity,
            kerberos_config,
        } => {
            let hostname = target.strip_prefix("HTTP/").unwrap_or(&target).to_owned();
            let negotiate_config = match kerberos_config {
                Some(kc) => {
                    NegotiateConfig::from_kerberos_config(to_sspi_kerberos_config(&kc), hostname)
                }
                None => NegotiateConfig::from_protocol_config(
                    Box::new(sspi::ntlm::NtlmConfig::default()),
                    hostname,
                ),
            };
            Ok(AuthContext::Negotiate(SspiContext::new_negotiate(
                identity,
                negotiate_config,
                config,
            )?))
        }
    }
}

/// Everything the connector needs once the handshake completes.
#[derive(Debug)]
pub struct Authenticated {
    pub decryptor: EncryptionProvider,
    pub http_builder: HttpBuilder,
    pub connection_pool: ConnectionPool,
}

/// Drives one SSPI handshake to completion, one HTTP round trip per `step`.
///
/// Unlike the rest of this crate's request/response-staged types, this one owns its
/// `HttpBuilder`/`ConnectionPool` rather than handing them back through `Connector` —
/// the caller is expected to drive it directly until it yields `Authenticated`, then pass
/// that (plus the last token, if any) to `Connector::authenticate`.
#[derive(Debug)]
pub struct AuthSequence {
    context: AuthContext,
    http_builder: HttpBuilder,
    connection_pool: ConnectionPool,
    require_encryption: bool,
}

pub enum AuthSequenceStepResult {
    SendBackAndContinue {
        sequence: Box<AuthSequence>,
        request: HttpRequest,
    },
    Done(Authenticated),
}

impl AuthSequence {
    pub fn new(
        config: AuthConfig,
        http_builder: HttpBuilder,
        connection_pool: ConnectionPool,
    ) -> Result<Self, PwshCoreError> {
        let target = http_builder.server.to_string();
        let context = build_context(config.sspi_config, target)?;

        Ok(Self {
            context,
            http_builder,
            connection_pool,
            require_encryption: config.require_encryption,
        })
    }

    /// Consumes `self`: the next round trip (if any) is threaded back out via
    /// `SendBackAndContinue::sequence` rather than kept behind `&mut self`.
    #[instrument(skip(self, server_response))]
    pub fn step(
        mut self,
        server_response: Option<&HttpResponse>,
    ) -> Result<AuthSequenceStepResult, PwshCoreError> {
        let require_encryption = self.require_encryption;

        let action = match &mut self.context {
            AuthContext::Ntlm(ctx) => Self::drive(server_response, ctx, require_encryption)?,
            AuthContext::Kerberos(ctx) => Self::drive(server_response, ctx, require_encryption)?,
            AuthContext::Negotiate(ctx) => Self::drive(server_response, ctx, require_encryption)?,
        };

        match action {
            ActionReqired::TryInitSecContextAgain { token } => {
                self.http_builder.with_auth_header(token.into_header());
                let request = self.http_builder.post("/wsman", HttpBody::Text(String::new()));
                Ok(AuthSequenceStepResult::SendBackAndContinue {
                    sequence: Box::new(self),
                    request,
                })
            }
            ActionReqired::Done { token } => {
                if let Some(token) = token {
                    self.http_builder.with_auth_header(token.into_header());
                }

                debug!("SSPI handshake completed");

                let AuthSequence {
                    context,
                    http_builder,
                    connection_pool,
                    ..
                } = self;

                Ok(AuthSequenceStepResult::Done(Authenticated {
                    decryptor: EncryptionProvider::new(context, require_encryption),
                    http_builder,
                    connection_pool,
                }))
            }
        }
    }

    fn drive<P>(
        server_response: Option<&HttpResponse>,
        context: &mut SspiContext<P>,
        require_encryption: bool,
    ) -> Result<ActionReqired, PwshCoreError>
    where
        P: sspi::Sspi + sspi::SspiImpl,
        <P as sspi::SspiImpl>::CredentialsHandle: std::fmt::Debug,
    {
        let mut builder_holder = None;
        let maybe_init = SspiAuthenticator::try_init_sec_context(
            server_response,
            context,
            &mut builder_holder,
            require_encryption,
        )?;

        let init = match maybe_init {
            SecContextMaybeInit::Initialized(init) => init,
            SecContextMaybeInit::RunGenerator { .. } => {
                // Only Kerberos against a KDC the OS hasn't already cached for us suspends
                // here; this crate has no synchronous KDC transport wired in yet.
                todo!("resolve SSPI generator suspension via a KDC network round trip")
            }
        };

        SspiAuthenticator::process_initialized_sec_context(context, &init)
    }
}

impl Token {
    fn into_header(self) -> String {
        self.0
    }
}
