use super::Identity;
use crate::crypto::certificate::PublicCertificate;
use thiserror::Error;

/// Session state of the remote identity sync service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    LoggedOut,
    Working,
    LoggedIn,
}

#[derive(Debug, Error)]
#[error("identity sync failed: {0}")]
pub struct SyncError(pub String);

/// A remote service that mirrors locally provisioned identities.
///
/// The handshake only calls [`IdentitySync::put_identity`] while the service
/// reports [`SyncStatus::LoggedIn`], and never fails because of it.
pub trait IdentitySync: Send + Sync {
    fn status(&self) -> SyncStatus;

    fn put_identity(&self, host: &PublicCertificate, identity: &Identity) -> Result<(), SyncError>;
}
