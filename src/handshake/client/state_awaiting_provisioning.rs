use super::{HandshakeClient, Outcome};
use crate::crypto::certificate::{PrivateCertificate, PublicCertificate};
use crate::crypto::keys::derive_symmetric_key;
use crate::crypto::symmetric;
use crate::error::{HandshakeError, Result};
use crate::handshake::session::HandshakeSession;
use crate::identity::{Identity, SyncStatus};
use crate::protocol::message::{CertificateBundle, ProvisionIdentity};
use crate::protocol::state::ClientState;
use tracing::{debug, info, warn};

const CONTEXT: &str = "identity provisioning";

impl HandshakeClient<'_> {
    /// Unseals a provisioned identity, checks it was issued by the host,
    /// persists it, then sends the client hello.
    ///
    /// 解封下发的身份，检查其由主机签发，持久化后发送客户端问候。
    pub(super) fn process_new_identity(
        &mut self,
        session: &mut HandshakeSession,
        provision: ProvisionIdentity,
    ) -> Result<Outcome> {
        info!("Received identity from server");
        if !session.requested_new_identity || self.state != ClientState::AwaitingProvisioning {
            return Err(HandshakeError::UnsolicitedMessage(CONTEXT));
        }

        let server_hello = session
            .server_hello
            .as_ref()
            .ok_or(HandshakeError::UnsolicitedMessage(CONTEXT))?;
        let client_random = session
            .client_random
            .ok_or(HandshakeError::UnsolicitedMessage(CONTEXT))?;
        // The master secret has no use past this point.
        let master_secret = session
            .master_secret
            .take()
            .ok_or(HandshakeError::UnsolicitedMessage(CONTEXT))?;

        let key = derive_symmetric_key(&master_secret, &client_random, &server_hello.random)?;
        drop(master_secret);
        let plaintext = symmetric::open(&key, &provision.encrypted_certificate_bundle)?;

        let bundle = CertificateBundle::decode(&plaintext)
            .map_err(|e| HandshakeError::MalformedCertificateBundle(e.to_string()))?;

        let host = &server_hello.certificate;
        if !bundle.public_certificate.verify_signed_by(host) {
            return Err(HandshakeError::CertificateChainFailure);
        }

        let public = bundle.public_certificate.clone();
        let private = PrivateCertificate::from_components(
            public.modulus(),
            public.exponent(),
            &bundle.private_exponent,
        )
        .map_err(|e| HandshakeError::MalformedCertificateBundle(e.to_string()))?;
        let identity = Identity::new(public, private);

        self.identity_store.persist_identity(host, identity.clone())?;
        self.upload_identity(host, &identity);

        session.identity = Some(identity);
        self.send_certificate(session)
    }

    /// Mirrors a new identity to the sync service. Failures are logged only.
    fn upload_identity(&self, host: &PublicCertificate, identity: &Identity) {
        if !self.config.upload_provisioned_identities {
            return;
        }
        let Some(sync) = self.identity_sync else {
            return;
        };
        if sync.status() != SyncStatus::LoggedIn {
            debug!("identity sync not logged in, skipping upload");
            return;
        }
        if let Err(error) = sync.put_identity(host, identity) {
            warn!(%error, "failed to upload provisioned identity");
        }
    }
}
