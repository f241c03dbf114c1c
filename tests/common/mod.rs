//! A minimal in-test host that honours the host side of the handshake
//! contract using the crate's own primitives.
#![allow(dead_code)]

use identity_handshake::crypto::certificate::{CertificatePair, PrivateCertificate, PublicCertificate};
use identity_handshake::crypto::keys::{derive_master_secret, derive_symmetric_key};
use identity_handshake::crypto::symmetric;
use identity_handshake::protocol::message::{
    CertificateBundle, ClientHello, HandshakeMessage, HandshakeVerification, NewIdentityRequest,
    ProvisionIdentity, RANDOM_LENGTH, ServerHello,
};
use identity_handshake::protocol::transcript::signature_data;
use identity_handshake::{
    ChannelError, Identity, IdentityStore, IdentitySync, MemoryIdentityStore, MessageChannel,
    Received, SyncStatus,
};
use identity_handshake::identity::{StoreError, SyncError};
use parking_lot::Mutex;
use rand::RngCore;
use rand::rngs::OsRng;
use std::collections::VecDeque;
use std::sync::OnceLock;
use std::time::Instant;

pub const KEY_BITS: usize = 1024;

pub fn host_pair() -> &'static CertificatePair {
    static PAIR: OnceLock<CertificatePair> = OnceLock::new();
    PAIR.get_or_init(|| CertificatePair::generate_self_signed(KEY_BITS).unwrap())
}

pub fn rogue_pair() -> &'static CertificatePair {
    static PAIR: OnceLock<CertificatePair> = OnceLock::new();
    PAIR.get_or_init(|| CertificatePair::generate_self_signed(KEY_BITS).unwrap())
}

/// A client identity previously issued by [`host_pair`].
pub fn returning_identity() -> Identity {
    static PAIR: OnceLock<CertificatePair> = OnceLock::new();
    PAIR.get_or_init(|| CertificatePair::generate_signed_by(&host_pair().private, KEY_BITS).unwrap())
        .clone()
        .into()
}

/// Host's certificate with one bit of its signature flipped.
pub fn untrusted_certificate() -> PublicCertificate {
    let cert = &host_pair().public;
    let mut signature = cert.signature().to_vec();
    signature[10] ^= 0x04;
    PublicCertificate::new(
        cert.id().to_owned(),
        cert.modulus().to_vec(),
        cert.exponent().to_vec(),
        signature,
    )
}

pub struct TestHost {
    pair: &'static CertificatePair,
    hello: ServerHello,
}

impl TestHost {
    pub fn new(pair: &'static CertificatePair) -> Self {
        let mut random = [0u8; RANDOM_LENGTH];
        OsRng.fill_bytes(&mut random);
        Self {
            pair,
            hello: ServerHello {
                random,
                certificate: pair.public.clone(),
            },
        }
    }

    pub fn with_certificate(certificate: PublicCertificate) -> Self {
        let mut host = Self::new(host_pair());
        host.hello.certificate = certificate;
        host
    }

    pub fn hello(&self) -> HandshakeMessage {
        HandshakeMessage::ServerHello(self.hello.clone())
    }

    /// Seals arbitrary bytes under the key derived from `request`.
    pub fn seal_for(&self, request: &NewIdentityRequest, plaintext: &[u8]) -> HandshakeMessage {
        let premaster = self
            .pair
            .private
            .decrypt(&request.encrypted_premaster_secret)
            .unwrap();
        let master = derive_master_secret(&premaster, &request.random, &self.hello.random).unwrap();
        let key = derive_symmetric_key(&master, &request.random, &self.hello.random).unwrap();
        HandshakeMessage::ProvisionIdentity(ProvisionIdentity {
            encrypted_certificate_bundle: symmetric::seal(&key, plaintext).unwrap(),
        })
    }

    /// Issues a new identity signed by `signer`.
    pub fn provision_signed_by(
        &self,
        request: &NewIdentityRequest,
        signer: &PrivateCertificate,
    ) -> (HandshakeMessage, PublicCertificate) {
        let issued = CertificatePair::generate_signed_by(signer, KEY_BITS).unwrap();
        let bundle = CertificateBundle {
            public_certificate: issued.public.clone(),
            private_exponent: issued.private.private_exponent().to_vec(),
        };
        (self.seal_for(request, &bundle.encode().unwrap()), issued.public)
    }

    pub fn provision(&self, request: &NewIdentityRequest) -> (HandshakeMessage, PublicCertificate) {
        self.provision_signed_by(request, &self.pair.private)
    }

    /// The host's acceptance check for a client hello.
    pub fn verify_client(&self, hello: &ClientHello, verification: &HandshakeVerification) -> bool {
        let data = signature_data(&self.hello, hello).unwrap();
        hello.certificate.verify_signed_by(&self.pair.public)
            && hello.certificate.verify(&data, &verification.signature)
    }

    pub fn verification_signed_by(
        &self,
        hello: &ClientHello,
        signer: &PrivateCertificate,
    ) -> HandshakeMessage {
        let data = signature_data(&self.hello, hello).unwrap();
        HandshakeMessage::HandshakeVerification(HandshakeVerification {
            signature: signer.sign(&data).unwrap(),
        })
    }

    pub fn verification(&self, hello: &ClientHello) -> HandshakeMessage {
        self.verification_signed_by(hello, &self.pair.private)
    }
}

/// A channel wired straight to a [`TestHost`].
pub struct LoopbackChannel {
    host: TestHost,
    inbox: VecDeque<HandshakeMessage>,
    pub sent: Vec<HandshakeMessage>,
    pub closed: bool,
    /// When the inbox is empty, report a timeout instead of a hang-up.
    pub silent: bool,
}

impl LoopbackChannel {
    pub fn new(host: TestHost) -> Self {
        let hello = host.hello();
        Self {
            host,
            inbox: VecDeque::from([hello]),
            sent: Vec::new(),
            closed: false,
            silent: false,
        }
    }

    pub fn silent(host: TestHost) -> Self {
        Self {
            host,
            inbox: VecDeque::new(),
            sent: Vec::new(),
            closed: false,
            silent: true,
        }
    }
}

impl MessageChannel for LoopbackChannel {
    fn recv(&mut self, _deadline: Option<Instant>) -> Received {
        match self.inbox.pop_front() {
            Some(message) => Received::Message(message),
            None if self.silent => Received::TimedOut,
            None => Received::Closed,
        }
    }

    fn send(&mut self, message: HandshakeMessage) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        match &message {
            HandshakeMessage::NewIdentityRequest(request) => {
                let (provision, _) = self.host.provision(request);
                self.inbox.push_back(provision);
            }
            HandshakeMessage::ClientHello {
                hello,
                verification,
            } => {
                if self.host.verify_client(hello, verification) {
                    self.inbox.push_back(self.host.verification(hello));
                }
            }
            _ => {}
        }
        self.sent.push(message);
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// An [`IdentitySync`] that records uploads.
pub struct RecordingSync {
    pub status: SyncStatus,
    pub fail: bool,
    pub uploads: Mutex<Vec<PublicCertificate>>,
}

impl RecordingSync {
    pub fn new(status: SyncStatus) -> Self {
        Self {
            status,
            fail: false,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(SyncStatus::LoggedIn)
        }
    }
}

impl IdentitySync for RecordingSync {
    fn status(&self) -> SyncStatus {
        self.status
    }

    fn put_identity(&self, _host: &PublicCertificate, identity: &Identity) -> Result<(), SyncError> {
        self.uploads.lock().push(identity.public_certificate().clone());
        if self.fail {
            return Err(SyncError("service unavailable".into()));
        }
        Ok(())
    }
}

/// An [`IdentityStore`] whose `save` always fails, as on a full disk.
#[derive(Default)]
pub struct UnwritableStore {
    pub inner: MemoryIdentityStore,
}

impl IdentityStore for UnwritableStore {
    fn get_identity(&self, host: &PublicCertificate) -> Option<Identity> {
        self.inner.get_identity(host)
    }

    fn add_identity(&self, host: &PublicCertificate, identity: Identity) -> Option<Identity> {
        self.inner.add_identity(host, identity)
    }

    fn remove_identity(&self, host: &PublicCertificate) -> Option<Identity> {
        self.inner.remove_identity(host)
    }

    fn save(&self) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::other("no space left on device")))
    }
}
