//! Implements the client side of the identity handshake state machine.
//! 实现身份握手状态机的客户端。

use crate::config::HandshakeConfig;
use crate::crypto::certificate::PublicCertificate;
use crate::error::{AUTHENTICATION_FAILURE, HandshakeError, Result};
use crate::handshake::session::HandshakeSession;
use crate::identity::{Identity, IdentityStore, IdentitySync};
use crate::protocol::message::HandshakeMessage;
use crate::protocol::state::ClientState;
use std::time::Instant;
use tracing::{debug, error};

mod builder;
mod state_awaiting_identity;
mod state_awaiting_provisioning;
mod state_awaiting_server_hello;
mod state_awaiting_verification;

pub use builder::HandshakeClientBuilder;

/// The client-side handshake state machine.
///
/// Messages are fed in one at a time through [`HandshakeClient::handle`].
/// Each accepted message yields either one message to send back or the
/// final [`Authenticated`] result. Any error aborts the handshake for good:
/// session secrets are dropped and every later call returns
/// [`HandshakeError::SessionTerminated`].
///
/// 客户端握手状态机。
///
/// 通过 [`HandshakeClient::handle`] 逐条输入消息。每条被接受的消息
/// 要么产生一条待发送的回复，要么产生最终的 [`Authenticated`] 结果。
/// 任何错误都会永久中止握手：会话密钥被丢弃，之后的每次调用都返回
/// [`HandshakeError::SessionTerminated`]。
pub struct HandshakeClient<'a> {
    state: ClientState,
    /// `None` once the handshake is terminal.
    session: Option<HandshakeSession>,
    identity_store: &'a dyn IdentityStore,
    identity_sync: Option<&'a dyn IdentitySync>,
    config: HandshakeConfig,
    /// When the current state was entered, for the per-state timeout.
    state_entered_at: Instant,
}

/// What the caller should do after a message was accepted.
#[derive(Debug)]
pub enum Outcome {
    /// Send this message to the host and keep feeding replies.
    Send(HandshakeMessage),
    /// The host is verified. Hand the connection to the next protocol layer.
    Authenticated(Authenticated),
}

/// Terminal success of a handshake.
#[derive(Debug)]
pub struct Authenticated {
    /// The verified host certificate.
    pub host_certificate: PublicCertificate,
    /// The identity the client authenticated with.
    pub identity: Identity,
    /// The first post-handshake request, to be sent to the host.
    pub ready_request: HandshakeMessage,
}

impl<'a> HandshakeClient<'a> {
    /// Creates a new `HandshakeClientBuilder` to construct a `HandshakeClient`.
    ///
    /// 创建一个新的 `HandshakeClientBuilder` 以构造 `HandshakeClient`。
    pub fn builder() -> HandshakeClientBuilder<'a> {
        HandshakeClientBuilder::new()
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// A short status line suitable for a "joining server" screen.
    pub fn current_activity(&self) -> &'static str {
        match self.state {
            ClientState::Authenticated => "Requesting server info",
            ClientState::Aborted => AUTHENTICATION_FAILURE,
            _ => "Authenticating with server",
        }
    }

    /// Processes one message from the host.
    ///
    /// 处理来自主机的一条消息。
    pub fn handle(&mut self, message: HandshakeMessage) -> Result<Outcome> {
        let Some(mut session) = self.session.take() else {
            return Err(HandshakeError::SessionTerminated);
        };

        let result = match message {
            HandshakeMessage::ServerHello(hello) => self.process_server_hello(&mut session, hello),
            HandshakeMessage::ProvisionIdentity(provision) => {
                self.process_new_identity(&mut session, provision)
            }
            HandshakeMessage::HandshakeVerification(verification) => {
                self.process_handshake_verification(&mut session, verification)
            }
            other => Err(HandshakeError::UnsolicitedMessage(other.kind())),
        };

        match result {
            Ok(Outcome::Send(reply)) => {
                self.session = Some(session);
                Ok(Outcome::Send(reply))
            }
            // Authenticated: the session goes out of scope here.
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                self.abort(&error);
                Err(error)
            }
        }
    }

    /// Decodes a raw frame and processes it. Undecodable frames abort the
    /// handshake.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Result<Outcome> {
        if self.state.is_terminal() {
            return Err(HandshakeError::SessionTerminated);
        }
        match HandshakeMessage::decode(frame) {
            Ok(message) => self.handle(message),
            Err(decode_error) => {
                debug!(%decode_error, len = frame.len(), "failed to decode handshake frame");
                let error = HandshakeError::MalformedMessage("undecodable frame");
                self.abort(&error);
                Err(error)
            }
        }
    }

    /// The instant at which the current state times out, if still running.
    pub fn deadline(&self) -> Option<Instant> {
        if self.state.is_terminal() {
            return None;
        }
        self.state_entered_at
            .checked_add(self.config.state_timeout())
    }

    /// Aborts with [`HandshakeError::Timeout`] if `now` is past the deadline.
    pub fn poll_timeout(&mut self, now: Instant) -> Result<()> {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                let error = HandshakeError::Timeout(self.state);
                self.abort(&error);
                Err(error)
            }
            _ => Ok(()),
        }
    }

    /// Tells the client its channel went away. Aborts unless already terminal.
    pub fn channel_closed(&mut self) {
        if !self.state.is_terminal() {
            self.abort(&HandshakeError::ChannelClosed);
        }
    }

    fn enter(&mut self, state: ClientState) {
        debug!(from = ?self.state, to = ?state, "handshake state transition");
        self.state = state;
        self.state_entered_at = Instant::now();
    }

    fn abort(&mut self, error: &HandshakeError) {
        error!(state = ?self.state, %error, "cancelling authentication");
        self.session = None;
        self.state = ClientState::Aborted;
    }
}
