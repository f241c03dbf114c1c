//! Cryptographic building blocks used by the handshake: RSA identity
//! certificates, HKDF-based secret derivation and the AEAD layer that
//! protects provisioned key material in transit.
//!
//! 握手使用的密码学构件：RSA 身份证书、基于 HKDF 的密钥派生，
//! 以及在传输中保护所下发密钥材料的 AEAD 层。

pub mod certificate;
pub mod keys;
pub mod symmetric;

use crate::error::BincodeError;
use thiserror::Error;

/// Failure of any asymmetric or symmetric primitive.
///
/// None of these are recoverable inside a handshake.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("RSA operation failed: {0}")]
    Rsa(#[from] rsa::Error),

    #[error("symmetric encryption or decryption failed")]
    Symmetric,

    #[error("sealed payload is too short")]
    Truncated,

    #[error("derived key has an invalid length")]
    InvalidKeyLength,

    #[error("certificate encoding failed: {0}")]
    Encoding(#[from] BincodeError),
}
