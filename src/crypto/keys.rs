//! Derivation of the session master secret and the symmetric key that
//! protects a provisioned identity.
//!
//! Both derivations are HKDF-SHA256 and bind the premaster secret to both
//! parties' randoms, so two sessions with different nonces never share a key
//! even if the premaster secret repeats.
//!
//! 会话主密钥以及保护所下发身份的对称密钥的派生。
//! 两种派生都使用 HKDF-SHA256，并将预主密钥与双方的随机数绑定，
//! 因此即使预主密钥重复，随机数不同的两个会话也不会共享密钥。

use super::CryptoError;
use crate::protocol::message::{RANDOM_LENGTH, Random};
use hkdf::Hkdf;
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const MASTER_SECRET_LENGTH: usize = 48;
pub const SYMMETRIC_KEY_LENGTH: usize = 32;

const MASTER_SECRET_LABEL: &[u8] = b"identity-handshake master secret";
const KEY_EXPANSION_LABEL: &[u8] = b"identity-handshake key expansion";

/// The session key-derivation root. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterSecret([u8; MASTER_SECRET_LENGTH]);

impl MasterSecret {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret(..)")
    }
}

/// AES-256 key for the provisioning bundle. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_LENGTH]);

impl SymmetricKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

fn expand<const N: usize>(
    ikm: &[u8],
    first: &Random,
    second: &Random,
    info: &[u8],
) -> Result<[u8; N], CryptoError> {
    let mut salt = [0u8; 2 * RANDOM_LENGTH];
    salt[..first.len()].copy_from_slice(first);
    salt[first.len()..].copy_from_slice(second);

    let hk = Hkdf::<Sha256>::new(Some(&salt), ikm);
    let mut okm = [0u8; N];
    hk.expand(info, &mut okm)
        .map_err(|_| CryptoError::InvalidKeyLength)?;
    Ok(okm)
}

/// Derives the master secret from `(premaster, client random, server random)`.
///
/// 由 `(预主密钥, 客户端随机数, 服务器随机数)` 派生主密钥。
pub fn derive_master_secret(
    premaster_secret: &[u8],
    client_random: &Random,
    server_random: &Random,
) -> Result<MasterSecret, CryptoError> {
    expand::<MASTER_SECRET_LENGTH>(
        premaster_secret,
        client_random,
        server_random,
        MASTER_SECRET_LABEL,
    )
    .map(MasterSecret)
}

/// Derives the bundle encryption key from the master secret and both randoms.
///
/// The randoms are mixed in server-first order so this salt never equals the
/// master secret's.
pub fn derive_symmetric_key(
    master_secret: &MasterSecret,
    client_random: &Random,
    server_random: &Random,
) -> Result<SymmetricKey, CryptoError> {
    expand::<SYMMETRIC_KEY_LENGTH>(
        master_secret.as_bytes(),
        server_random,
        client_random,
        KEY_EXPANSION_LABEL,
    )
    .map(SymmetricKey)
}
