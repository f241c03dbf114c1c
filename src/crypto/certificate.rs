//! RSA identity certificates.
//!
//! A [`PublicCertificate`] is a public key plus a signature binding it to an
//! issuer. Hosts present self-signed certificates; client identities carry a
//! signature from the host that provisioned them. A [`PrivateCertificate`] is
//! the matching private key.
//!
//! RSA 身份证书。公共证书是一个公钥加上将其绑定到签发者的签名。
//! 主机出示自签名证书；客户端身份证书由为其下发身份的主机签名。

use super::CryptoError;
use crate::error::BincodeError;
use rand::RngCore;
use rand::rngs::OsRng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

const CERTIFICATE_ID_LENGTH: usize = 16;

/// The public half of an identity, immutable once constructed.
///
/// Equality and hashing cover every field, so a certificate can key the
/// identity store directly.
///
/// 身份的公开部分，构造后不可变。相等性与哈希覆盖所有字段，
/// 因此证书可以直接作为身份存储的键。
#[derive(
    Clone, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct PublicCertificate {
    id: String,
    #[serde(with = "hex::serde")]
    modulus: Vec<u8>,
    #[serde(with = "hex::serde")]
    exponent: Vec<u8>,
    #[serde(with = "hex::serde")]
    signature: Vec<u8>,
}

impl PublicCertificate {
    /// Assembles a certificate from its wire components. No validation is
    /// performed here; callers check signatures explicitly.
    pub fn new(id: String, modulus: Vec<u8>, exponent: Vec<u8>, signature: Vec<u8>) -> Self {
        Self {
            id,
            modulus,
            exponent,
            signature,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Big-endian modulus.
    pub fn modulus(&self) -> &[u8] {
        &self.modulus
    }

    /// Big-endian public exponent.
    pub fn exponent(&self) -> &[u8] {
        &self.exponent
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Bytes covered by the certificate's signature: `(id, modulus, exponent)`.
    pub fn signed_content(&self) -> Result<Vec<u8>, CryptoError> {
        signed_content(&self.id, &self.modulus, &self.exponent)
    }

    /// Stable SHA-256 fingerprint over every field, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            self.id.as_bytes(),
            &self.modulus,
            &self.exponent,
            &self.signature,
        ] {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field);
        }
        hex::encode(hasher.finalize())
    }

    fn public_key(&self) -> Result<RsaPublicKey, CryptoError> {
        RsaPublicKey::new(
            BigUint::from_bytes_be(&self.modulus),
            BigUint::from_bytes_be(&self.exponent),
        )
        .map_err(Into::into)
    }

    /// Checks `signature` over `data` against this certificate's key.
    ///
    /// Malformed keys or signatures simply fail verification.
    ///
    /// 使用此证书的公钥校验 `data` 上的 `signature`。格式错误的密钥或签名只会导致校验失败。
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let Ok(key) = self.public_key() else {
            return false;
        };
        let digest = Sha256::digest(data);
        key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
            .is_ok()
    }

    /// True iff the embedded signature validates under this certificate's own key.
    pub fn verify_self_signed(&self) -> bool {
        self.verify_signed_by(self)
    }

    /// True iff the embedded signature validates under `issuer`'s key.
    pub fn verify_signed_by(&self, issuer: &PublicCertificate) -> bool {
        match self.signed_content() {
            Ok(content) => issuer.verify(&content, &self.signature),
            Err(_) => false,
        }
    }

    /// Wraps a short secret under this certificate's key (PKCS#1 v1.5).
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = self.public_key()?;
        key.encrypt(&mut OsRng, Pkcs1v15Encrypt, data)
            .map_err(Into::into)
    }
}

impl fmt::Debug for PublicCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicCertificate")
            .field("id", &self.id)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

fn signed_content(id: &str, modulus: &[u8], exponent: &[u8]) -> Result<Vec<u8>, CryptoError> {
    bincode::encode_to_vec((id, modulus, exponent), bincode::config::standard())
        .map_err(|e| CryptoError::Encoding(BincodeError::from(e)))
}

/// The private half of an identity.
///
/// The underlying key is zeroized on drop.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PrivateCertificateRecord", into = "PrivateCertificateRecord")]
pub struct PrivateCertificate {
    key: RsaPrivateKey,
}

impl PrivateCertificate {
    /// Rebuilds a private key from its modulus and exponents.
    ///
    /// The prime factors are recovered from `(n, e, d)`, which also checks
    /// that the private exponent really belongs to the modulus.
    ///
    /// 由模数和指数重建私钥。素因子从 `(n, e, d)` 中恢复，
    /// 这同时校验了私钥指数确实属于该模数。
    pub fn from_components(
        modulus: &[u8],
        public_exponent: &[u8],
        private_exponent: &[u8],
    ) -> Result<Self, CryptoError> {
        let key = RsaPrivateKey::from_components(
            BigUint::from_bytes_be(modulus),
            BigUint::from_bytes_be(public_exponent),
            BigUint::from_bytes_be(private_exponent),
            Vec::new(),
        )?;
        Ok(Self { key })
    }

    pub fn modulus(&self) -> Vec<u8> {
        self.key.n().to_bytes_be()
    }

    pub fn public_exponent(&self) -> Vec<u8> {
        self.key.e().to_bytes_be()
    }

    pub fn private_exponent(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.key.d().to_bytes_be())
    }

    /// Signs `data` with RSASSA-PKCS1-v1_5 over SHA-256.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let digest = Sha256::digest(data);
        self.key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(Into::into)
    }

    /// Reverses [`PublicCertificate::encrypt`].
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        self.key
            .decrypt(Pkcs1v15Encrypt, ciphertext)
            .map(Zeroizing::new)
            .map_err(Into::into)
    }
}

impl fmt::Debug for PrivateCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateCertificate(..)")
    }
}

/// Serialized form of a private certificate.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct PrivateCertificateRecord {
    #[serde(with = "hex::serde")]
    modulus: Vec<u8>,
    #[serde(with = "hex::serde")]
    public_exponent: Vec<u8>,
    #[serde(with = "hex::serde")]
    private_exponent: Vec<u8>,
}

impl From<PrivateCertificate> for PrivateCertificateRecord {
    fn from(certificate: PrivateCertificate) -> Self {
        Self {
            modulus: certificate.modulus(),
            public_exponent: certificate.public_exponent(),
            private_exponent: certificate.private_exponent().to_vec(),
        }
    }
}

impl TryFrom<PrivateCertificateRecord> for PrivateCertificate {
    type Error = CryptoError;

    fn try_from(record: PrivateCertificateRecord) -> Result<Self, Self::Error> {
        PrivateCertificate::from_components(
            &record.modulus,
            &record.public_exponent,
            &record.private_exponent,
        )
    }
}

/// A freshly generated public/private certificate pair.
#[derive(Debug, Clone)]
pub struct CertificatePair {
    pub public: PublicCertificate,
    pub private: PrivateCertificate,
}

impl CertificatePair {
    /// Generates a key pair whose certificate is signed by its own key.
    ///
    /// 生成一个由自身私钥签名证书的密钥对。
    pub fn generate_self_signed(bits: usize) -> Result<Self, CryptoError> {
        let private = PrivateCertificate {
            key: RsaPrivateKey::new(&mut OsRng, bits)?,
        };
        let signer = private.clone();
        Self::issue(private, &signer)
    }

    /// Generates a key pair whose certificate is signed by `signer`.
    ///
    /// 生成一个由 `signer` 签名证书的密钥对。
    pub fn generate_signed_by(
        signer: &PrivateCertificate,
        bits: usize,
    ) -> Result<Self, CryptoError> {
        let private = PrivateCertificate {
            key: RsaPrivateKey::new(&mut OsRng, bits)?,
        };
        Self::issue(private, signer)
    }

    fn issue(private: PrivateCertificate, signer: &PrivateCertificate) -> Result<Self, CryptoError> {
        let mut id_bytes = [0u8; CERTIFICATE_ID_LENGTH];
        OsRng.fill_bytes(&mut id_bytes);
        let id = hex::encode(id_bytes);
        let modulus = private.modulus();
        let exponent = private.public_exponent();

        let content = signed_content(&id, &modulus, &exponent)?;
        let signature = signer.sign(&content)?;

        Ok(Self {
            public: PublicCertificate::new(id, modulus, exponent, signature),
            private,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    const TEST_BITS: usize = 1024;

    fn root() -> &'static CertificatePair {
        static ROOT: OnceLock<CertificatePair> = OnceLock::new();
        ROOT.get_or_init(|| CertificatePair::generate_self_signed(TEST_BITS).unwrap())
    }

    fn flip_bit(bytes: &[u8], bit: usize) -> Vec<u8> {
        let mut out = bytes.to_vec();
        out[bit / 8] ^= 1 << (bit % 8);
        out
    }

    #[test]
    fn self_signed_certificate_verifies() {
        assert!(root().public.verify_self_signed());
    }

    #[test]
    fn corrupted_signature_fails_self_verification() {
        let cert = &root().public;
        let bits = cert.signature().len() * 8;
        for bit in [0, 7, bits / 2, bits - 1] {
            let forged = PublicCertificate::new(
                cert.id().to_owned(),
                cert.modulus().to_vec(),
                cert.exponent().to_vec(),
                flip_bit(cert.signature(), bit),
            );
            assert!(!forged.verify_self_signed(), "bit {bit} of signature");
        }
    }

    #[test]
    fn corrupted_payload_fails_self_verification() {
        let cert = &root().public;
        let bits = cert.modulus().len() * 8;
        for bit in [3, bits / 2, bits - 8] {
            let forged = PublicCertificate::new(
                cert.id().to_owned(),
                flip_bit(cert.modulus(), bit),
                cert.exponent().to_vec(),
                cert.signature().to_vec(),
            );
            assert!(!forged.verify_self_signed(), "bit {bit} of modulus");
        }

        let renamed = PublicCertificate::new(
            format!("{}0", cert.id()),
            cert.modulus().to_vec(),
            cert.exponent().to_vec(),
            cert.signature().to_vec(),
        );
        assert!(!renamed.verify_self_signed());
    }

    #[test]
    fn issued_certificate_chains_to_signer_only() {
        let child = CertificatePair::generate_signed_by(&root().private, TEST_BITS).unwrap();
        assert!(child.public.verify_signed_by(&root().public));
        assert!(!child.public.verify_self_signed());
        assert!(!root().public.verify_signed_by(&child.public));
    }

    #[test]
    fn sign_and_verify_arbitrary_data() {
        let signature = root().private.sign(b"hello world").unwrap();
        assert!(root().public.verify(b"hello world", &signature));
        assert!(!root().public.verify(b"hello world!", &signature));
    }

    #[test]
    fn encrypted_secret_only_opens_with_matching_key() {
        let ciphertext = root().public.encrypt(&[7u8; 32]).unwrap();
        assert_eq!(root().private.decrypt(&ciphertext).unwrap().as_slice(), &[7u8; 32]);
    }

    #[test]
    fn private_certificate_rebuilds_from_exponent() {
        let pair = root();
        let rebuilt = PrivateCertificate::from_components(
            pair.public.modulus(),
            pair.public.exponent(),
            &pair.private.private_exponent(),
        )
        .unwrap();
        let signature = rebuilt.sign(b"payload").unwrap();
        assert!(pair.public.verify(b"payload", &signature));
    }

    #[test]
    fn private_certificate_rejects_foreign_exponent() {
        let other = CertificatePair::generate_self_signed(TEST_BITS).unwrap();
        let result = PrivateCertificate::from_components(
            root().public.modulus(),
            root().public.exponent(),
            &other.private.private_exponent(),
        );
        assert!(result.is_err());
    }
}
