use super::HandshakeClient;
use crate::config::HandshakeConfig;
use crate::error::{HandshakeError, Result};
use crate::handshake::session::HandshakeSession;
use crate::identity::{IdentityStore, IdentitySync};
use crate::protocol::state::ClientState;
use std::time::Instant;

/// A builder for creating a `HandshakeClient`.
///
/// The identity store is required; the sync service and configuration are
/// optional.
///
/// 用于创建 `HandshakeClient` 的构建器。
///
/// 身份存储是必需的；同步服务和配置是可选的。
#[derive(Default)]
pub struct HandshakeClientBuilder<'a> {
    identity_store: Option<&'a dyn IdentityStore>,
    identity_sync: Option<&'a dyn IdentitySync>,
    config: Option<HandshakeConfig>,
}

impl<'a> HandshakeClientBuilder<'a> {
    /// Creates a new `HandshakeClientBuilder`.
    pub fn new() -> Self {
        Self {
            identity_store: None,
            identity_sync: None,
            config: None,
        }
    }

    /// Sets the store used to look up and persist identities.
    ///
    /// 设置用于查找和持久化身份的存储。
    pub fn identity_store(mut self, store: &'a dyn IdentityStore) -> Self {
        self.identity_store = Some(store);
        self
    }

    /// Sets the remote service that mirrors newly provisioned identities.
    ///
    /// 设置镜像新下发身份的远程服务。
    pub fn identity_sync(mut self, sync: &'a dyn IdentitySync) -> Self {
        self.identity_sync = Some(sync);
        self
    }

    pub fn config(mut self, config: HandshakeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the `HandshakeClient`, ready for the host's hello.
    ///
    /// Returns an error if the identity store is missing.
    ///
    /// 构建 `HandshakeClient`。
    ///
    /// 如果缺少身份存储，则返回错误。
    pub fn build(self) -> Result<HandshakeClient<'a>> {
        let identity_store = self
            .identity_store
            .ok_or(HandshakeError::BuilderMissingField("identity_store"))?;

        Ok(HandshakeClient {
            state: ClientState::AwaitingServerHello,
            session: Some(HandshakeSession::default()),
            identity_store,
            identity_sync: self.identity_sync,
            config: self.config.unwrap_or_default(),
            state_entered_at: Instant::now(),
        })
    }
}
