//! Defines the states of the client handshake state machine.
//!
//! 定义客户端握手状态机的各个状态。

/// Where a client handshake currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// Channel open; waiting for the host's hello.
    AwaitingServerHello,
    /// Host certificate trusted but no stored identity; a new one must be
    /// requested. Transient: the request is emitted in the same step.
    AwaitingIdentity,
    /// A new identity was requested; waiting for the host to provision it.
    AwaitingProvisioning,
    /// Client hello and signature sent; waiting for the host's signature.
    AwaitingVerification,
    /// Both sides verified. Terminal.
    Authenticated,
    /// Failed or cancelled. Terminal.
    Aborted,
}

impl ClientState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ClientState::Authenticated | ClientState::Aborted)
    }
}
