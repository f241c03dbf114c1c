//! Per-connection handshake state.
//!
//! 每个连接的握手状态。

use crate::crypto::keys::MasterSecret;
use crate::error::{HandshakeError, Result};
use crate::identity::Identity;
use crate::protocol::message::{ClientHello, Random, ServerHello};

/// Mutable, single-use state for one handshake.
///
/// Owned by the [`HandshakeClient`](super::client::HandshakeClient) and
/// dropped as soon as the handshake reaches a terminal state, which wipes the
/// master secret.
#[derive(Debug, Default)]
pub(crate) struct HandshakeSession {
    /// The host hello, which also carries the host certificate and random.
    pub server_hello: Option<ServerHello>,
    pub client_hello: Option<ClientHello>,
    pub client_random: Option<Random>,
    /// Present only between the identity request and its provisioning.
    pub master_secret: Option<MasterSecret>,
    pub identity: Option<Identity>,
    pub requested_new_identity: bool,
}

impl HandshakeSession {
    pub fn server_hello(&self, context: &'static str) -> Result<&ServerHello> {
        self.server_hello
            .as_ref()
            .ok_or(HandshakeError::UnsolicitedMessage(context))
    }

    pub fn client_random(&self, context: &'static str) -> Result<Random> {
        self.client_random
            .ok_or(HandshakeError::UnsolicitedMessage(context))
    }
}
