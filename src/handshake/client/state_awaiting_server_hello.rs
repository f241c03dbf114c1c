use super::{HandshakeClient, Outcome};
use crate::error::{HandshakeError, Result};
use crate::handshake::session::HandshakeSession;
use crate::protocol::message::{RANDOM_LENGTH, ServerHello};
use crate::protocol::state::ClientState;
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::{debug, info};

impl HandshakeClient<'_> {
    /// Handles the host's hello: trusts its self-signed certificate, picks the
    /// client random, then either reuses a stored identity or requests one.
    ///
    /// This is the only point where that choice is made.
    ///
    /// 处理主机的问候：信任其自签名证书，选取客户端随机数，
    /// 然后复用已存储的身份或请求新身份。这是唯一做出该选择的地方。
    pub(super) fn process_server_hello(
        &mut self,
        session: &mut HandshakeSession,
        hello: ServerHello,
    ) -> Result<Outcome> {
        if self.state != ClientState::AwaitingServerHello || session.server_hello.is_some() {
            return Err(HandshakeError::DuplicateHello);
        }
        info!(host = hello.certificate.id(), "Received server hello");

        if !hello.certificate.verify_self_signed() {
            return Err(HandshakeError::UntrustedHostCertificate);
        }

        let mut client_random = [0u8; RANDOM_LENGTH];
        OsRng.fill_bytes(&mut client_random);
        session.client_random = Some(client_random);

        let stored = self.identity_store.get_identity(&hello.certificate);
        session.server_hello = Some(hello);

        match stored {
            Some(identity) => {
                debug!("found stored identity for host");
                session.identity = Some(identity);
                self.send_certificate(session)
            }
            None => {
                self.enter(ClientState::AwaitingIdentity);
                self.request_identity(session)
            }
        }
    }
}
