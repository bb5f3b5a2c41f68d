// pub struct AuthContext

/*
    Ok, let's think about the API, and how people will use it.


    let winrm_session = WinRMSession::new(...);

    match winrm_session.step()? {
        WinRMSessionStep::newConnectRequested(connector) => {
            loop {
                match connector.step()? {
                    ConnectorStepResult::SendBack(http_request) => {
                        let response = client.send_request(http_request, KeepAlive::NotNecessary)?;
                        connector.receive_response(response)?;
                    }
                    ConnectorStepResult::SendBackError(e) => {
                        anyhow::bail!("Connection failed: {}", e);
                    }
                    ConnectorStepResult::Done(active_session) => {
                        break Ok(active_session);
                    }
                }

            }
        }
    }

*/

use std::collections::HashMap;

use crate::PwshCoreError;
use crate::connector::auth_sequence::AuthContext;
use crate::connector::encryption::EncryptionProvider;
use crate::connector::http::{HttpBody, HttpBuilder, HttpRequest, HttpResponseTargeted};

/// Marks that the physical connection a response arrived on already completed the SSPI
/// handshake, so NTLM/Kerberos-authenticated persistent connections don't get re-challenged.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedHttpChannel {
    pub connection_id: ConnectionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    id: u32,
}

impl ConnectionId {
    // Private New, disallow external creation
    fn new(id: u32) -> Self {
        Self { id }
    }

    pub fn inner(&self) -> u32 {
        self.id
    }
}

#[derive(Debug)]
pub struct ConnectionContext {
    state: ConnectionState,
    auth: AuthContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    PreAuth,
    Idle,
    Pending,
    Closed,
}

/// What a caller should do with a message `ConnectionPool::send` produced: a ready-to-post
/// request, pinned to whichever physical connection it should travel over.
#[derive(Debug)]
pub struct TrySend {
    pub connection_id: ConnectionId,
    pub request: HttpRequest,
}

#[derive(Debug, Default)]
pub struct ConnectionPool {
    connections: HashMap<ConnectionId, ConnectionState>,
    http_builder: Option<HttpBuilder>,
    encryption_provider: Option<EncryptionProvider>,
}

impl ConnectionPool {
    /// Equips the pool with the means to actually build and seal requests, once the
    /// handshake that produced them has completed.
    pub(crate) fn attach(
        &mut self,
        http_builder: HttpBuilder,
        encryption_provider: Option<EncryptionProvider>,
    ) {
        self.http_builder = Some(http_builder);
        self.encryption_provider = encryption_provider;
    }

    /// Encrypts (if a handshake negotiated it) and posts `xml` to an idle or new connection.
    pub fn send(&mut self, xml: &str) -> Result<TrySend, PwshCoreError> {
        let body = match &mut self.encryption_provider {
            Some(provider) => provider.encrypt(xml.to_owned())?,
            None => HttpBody::Xml(xml.to_owned()),
        };

        let http_builder = self.http_builder.as_mut().ok_or(PwshCoreError::InvalidState(
            "ConnectionPool has no HttpBuilder attached yet",
        ))?;
        let request = http_builder.post("/wsman", body);
        let connection_id = self.get_idle_or_new_connection();

        Ok(TrySend {
            connection_id,
            request,
        })
    }

    /// Marks the originating connection idle and decrypts the response body, if necessary.
    pub fn accept(&mut self, response: HttpResponseTargeted) -> Result<String, PwshCoreError> {
        let (response, connection_id) = response.into_parts();
        self.mark_connection_idle(&connection_id);

        match &mut self.encryption_provider {
            Some(provider) => provider.decrypt(response.body),
            None => Ok(response.body.as_str()?.to_owned()),
        }
    }

    pub fn get_idle_or_new_connection(&mut self) -> ConnectionId {
        let available_conn_id = self.connections.iter().find_map(|(conn_id, state)| {
            if matches!(state, ConnectionState::Idle) {
                Some(conn_id.id)
            } else {
                None
            }
        });

        if let Some(id) = available_conn_id {
            let conn_id = ConnectionId::new(id);
            self.connections
                .get_mut(&conn_id)
                .map(|s| *s = ConnectionState::Pending);
            return conn_id;
        }

        let new_id = ConnectionId {
            id: self.connections.len() as u32 + 1,
        };
        let to_return = ConnectionId::new(new_id.id);
        self.connections.insert(new_id, ConnectionState::Pending);

        to_return
    }

    pub fn mark_connection_idle(&mut self, conn_id: &ConnectionId) {
        if let Some(state) = self.connections.get_mut(conn_id) {
            *state = ConnectionState::Idle;
        }
    }

    pub fn mark_connection_closed(&mut self, conn_id: &ConnectionId) {
        if let Some(state) = self.connections.get_mut(conn_id) {
            *state = ConnectionState::Closed;
        }
    }
}
