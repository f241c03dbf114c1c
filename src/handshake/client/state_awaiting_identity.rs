use super::{HandshakeClient, Outcome};
use crate::crypto::keys::derive_master_secret;
use crate::error::Result;
use crate::handshake::session::HandshakeSession;
use crate::protocol::message::{HandshakeMessage, NewIdentityRequest, PREMASTER_SECRET_LENGTH};
use crate::protocol::state::ClientState;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::info;
use zeroize::Zeroizing;

impl HandshakeClient<'_> {
    /// Asks the host for a new identity.
    ///
    /// A random premaster secret is wrapped under the host certificate, and
    /// the master secret derived from it is kept to unseal the reply.
    pub(super) fn request_identity(&mut self, session: &mut HandshakeSession) -> Result<Outcome> {
        info!("No existing identity, requesting one");
        let server_hello = session.server_hello("identity request")?;
        let client_random = session.client_random("identity request")?;

        let mut premaster_secret = Zeroizing::new([0u8; PREMASTER_SECRET_LENGTH]);
        OsRng.fill_bytes(&mut premaster_secret[..]);

        let encrypted_premaster_secret = server_hello.certificate.encrypt(&premaster_secret[..])?;
        let master_secret =
            derive_master_secret(&premaster_secret[..], &client_random, &server_hello.random)?;

        session.master_secret = Some(master_secret);
        session.requested_new_identity = true;
        self.enter(ClientState::AwaitingProvisioning);

        Ok(Outcome::Send(HandshakeMessage::NewIdentityRequest(
            NewIdentityRequest {
                encrypted_premaster_secret,
                random: client_random,
            },
        )))
    }
}
