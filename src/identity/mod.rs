//! Client identities and the per-host store that remembers them.
//!
//! Identities are keyed by the host's public certificate rather than its
//! address: one host may be reachable over several network paths, but it is
//! identified by its key.
//!
//! 客户端身份以及按主机记录身份的存储。身份以主机公共证书而非地址为键。

mod file;
mod sync;

pub use file::FileIdentityStore;
pub use sync::{IdentitySync, SyncError, SyncStatus};

use crate::crypto::CryptoError;
use crate::crypto::certificate::{CertificatePair, PrivateCertificate, PublicCertificate};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A client's key pair for one specific host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    public_certificate: PublicCertificate,
    private_certificate: PrivateCertificate,
}

impl Identity {
    pub fn new(public_certificate: PublicCertificate, private_certificate: PrivateCertificate) -> Self {
        Self {
            public_certificate,
            private_certificate,
        }
    }

    pub fn public_certificate(&self) -> &PublicCertificate {
        &self.public_certificate
    }

    pub fn private_certificate(&self) -> &PrivateCertificate {
        &self.private_certificate
    }
}

impl From<CertificatePair> for Identity {
    fn from(pair: CertificatePair) -> Self {
        Identity::new(pair.public, pair.private)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("identity store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("identity store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored key material is invalid: {0}")]
    InvalidKey(#[from] CryptoError),
}

/// Maps host certificates to previously provisioned identities.
///
/// Implementations are shared between concurrent handshakes. A lookup must
/// never observe a partially written identity; concurrent inserts for the
/// same host may race, last write wins.
///
/// 将主机证书映射到已下发的身份。实现会在并发握手间共享：
/// 查找绝不能观察到写入一半的身份；对同一主机的并发插入以最后一次写入为准。
pub trait IdentityStore: Send + Sync {
    /// Returns the identity provisioned by `host`, if any.
    fn get_identity(&self, host: &PublicCertificate) -> Option<Identity>;

    /// Records `identity` for `host`, returning the entry it replaced.
    fn add_identity(&self, host: &PublicCertificate, identity: Identity) -> Option<Identity>;

    /// Forgets the identity recorded for `host`.
    fn remove_identity(&self, host: &PublicCertificate) -> Option<Identity>;

    /// Makes every recorded identity durable.
    fn save(&self) -> Result<(), StoreError>;

    /// Records `identity` and saves. If saving fails the previous entry for
    /// `host` is restored, so no later lookup returns an identity that never
    /// reached durable storage.
    ///
    /// 记录身份并保存；保存失败时恢复该主机原有条目。
    fn persist_identity(&self, host: &PublicCertificate, identity: Identity) -> Result<(), StoreError> {
        let previous = self.add_identity(host, identity);
        if let Err(error) = self.save() {
            match previous {
                Some(previous) => {
                    self.add_identity(host, previous);
                }
                None => {
                    self.remove_identity(host);
                }
            }
            return Err(error);
        }
        Ok(())
    }
}

/// A volatile [`IdentityStore`]; `save` is a no-op.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    identities: RwLock<HashMap<PublicCertificate, Identity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.identities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.read().is_empty()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn get_identity(&self, host: &PublicCertificate) -> Option<Identity> {
        self.identities.read().get(host).cloned()
    }

    fn add_identity(&self, host: &PublicCertificate, identity: Identity) -> Option<Identity> {
        self.identities.write().insert(host.clone(), identity)
    }

    fn remove_identity(&self, host: &PublicCertificate) -> Option<Identity> {
        self.identities.write().remove(host)
    }

    fn save(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
