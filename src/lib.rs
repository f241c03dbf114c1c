//! Client side of a mutual-authentication handshake with trust-on-first-use
//! host certificates and host-provisioned client identities.
//!
//! 客户端双向认证握手：主机证书首次使用即信任，客户端身份由主机下发。

pub mod config;
pub mod crypto;
pub mod error;
pub mod handshake;
pub mod identity;
pub mod protocol;

pub use config::HandshakeConfig;
pub use error::{HandshakeError, Result};
pub use handshake::client::{Authenticated, HandshakeClient, HandshakeClientBuilder, Outcome};
pub use handshake::driver::{ChannelError, MessageChannel, Received, run_client};
pub use identity::{
    FileIdentityStore, Identity, IdentityStore, IdentitySync, MemoryIdentityStore, SyncStatus,
};
pub use protocol::message::HandshakeMessage;
pub use protocol::state::ClientState;
