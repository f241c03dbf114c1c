use super::{Authenticated, HandshakeClient, Outcome};
use crate::error::{HandshakeError, Result};
use crate::handshake::session::HandshakeSession;
use crate::protocol::message::{ClientHello, HandshakeMessage, HandshakeVerification};
use crate::protocol::state::ClientState;
use crate::protocol::transcript::signature_data;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

const CONTEXT: &str = "server verification";

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

impl HandshakeClient<'_> {
    /// Builds the client hello, signs `serverHello || clientHello` with the
    /// identity's private key and sends both.
    pub(super) fn send_certificate(&mut self, session: &mut HandshakeSession) -> Result<Outcome> {
        info!("Sending client certificate");
        let server_hello = session.server_hello("client hello")?;
        let client_random = session.client_random("client hello")?;
        let identity = session
            .identity
            .as_ref()
            .ok_or(HandshakeError::UnsolicitedMessage("client hello"))?;

        let client_hello = ClientHello {
            random: client_random,
            certificate: identity.public_certificate().clone(),
            timestamp: unix_millis(),
        };
        let data = signature_data(server_hello, &client_hello)?;
        let signature = identity.private_certificate().sign(&data)?;

        session.client_hello = Some(client_hello.clone());
        self.enter(ClientState::AwaitingVerification);

        Ok(Outcome::Send(HandshakeMessage::ClientHello {
            hello: client_hello,
            verification: HandshakeVerification { signature },
        }))
    }

    /// Checks the host's signature over the same hellos the client signed.
    ///
    /// 校验主机对客户端所签名的相同问候消息的签名。
    pub(super) fn process_handshake_verification(
        &mut self,
        session: &mut HandshakeSession,
        verification: HandshakeVerification,
    ) -> Result<Outcome> {
        info!("Received server verification");
        let (Some(server_hello), Some(client_hello)) =
            (session.server_hello.as_ref(), session.client_hello.as_ref())
        else {
            return Err(HandshakeError::UnsolicitedMessage(CONTEXT));
        };
        if self.state != ClientState::AwaitingVerification {
            return Err(HandshakeError::UnsolicitedMessage(CONTEXT));
        }

        let data = signature_data(server_hello, client_hello)?;
        if !server_hello.certificate.verify(&data, &verification.signature) {
            return Err(HandshakeError::SignatureVerificationFailure);
        }

        let identity = session
            .identity
            .take()
            .ok_or(HandshakeError::UnsolicitedMessage(CONTEXT))?;
        let host_certificate = server_hello.certificate.clone();

        self.enter(ClientState::Authenticated);
        info!("Authenticated with server, requesting server info");

        Ok(Outcome::Authenticated(Authenticated {
            host_certificate,
            identity,
            ready_request: HandshakeMessage::ServerInfoRequest,
        }))
    }
}
