use thiserror::Error;

use crate::crypto::CryptoError;
use crate::identity::StoreError;
use crate::protocol::state::ClientState;

/// The only failure text ever surfaced to users or peers.
pub const AUTHENTICATION_FAILURE: &str = "Authentication failure";

/// An error related to `bincode` serialization or deserialization.
///
/// This is a wrapper around `bincode`'s own error types to provide a more
/// consistent error handling experience within this crate.
///
/// 与 `bincode` 序列化或反序列化相关的错误。
///
/// 这是对 `bincode` 自身错误类型的包装，以便在此 crate 中提供更一致的错误处理体验。
#[derive(Error, Debug)]
pub enum BincodeError {
    /// An error occurred during serialization (encoding).
    ///
    /// 在序列化（编码）过程中发生错误。
    #[error("Encode error: {0}")]
    Enc(#[source] Box<bincode::error::EncodeError>),
    /// An error occurred during deserialization (decoding).
    ///
    /// 在反序列化（解码）过程中发生错误。
    #[error("Decode error: {0}")]
    Dec(#[source] Box<bincode::error::DecodeError>),
}

impl From<bincode::error::EncodeError> for BincodeError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BincodeError::Enc(Box::from(err))
    }
}

impl From<bincode::error::DecodeError> for BincodeError {
    fn from(err: bincode::error::DecodeError) -> Self {
        BincodeError::Dec(Box::from(err))
    }
}

/// Every way a client handshake can end without authenticating.
///
/// All variants are terminal for the session that produced them.
///
/// 客户端握手未能完成认证的所有方式。所有变体对产生它的会话而言都是终止性的。
#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("host certificate is not validly self-signed")]
    UntrustedHostCertificate,

    #[error("received more than one server hello")]
    DuplicateHello,

    #[error("received {0} without requesting it")]
    UnsolicitedMessage(&'static str),

    #[error("cryptographic operation failed: {0}")]
    CryptoFailure(#[from] CryptoError),

    #[error("provisioned certificate bundle is malformed: {0}")]
    MalformedCertificateBundle(String),

    #[error("provisioned certificate is not signed by the host")]
    CertificateChainFailure,

    #[error("host failed handshake verification")]
    SignatureVerificationFailure,

    #[error("malformed handshake message: {0}")]
    MalformedMessage(&'static str),

    #[error("failed to persist provisioned identity: {0}")]
    IdentityStore(#[from] StoreError),

    #[error("timed out in state {0:?}")]
    Timeout(ClientState),

    #[error("channel closed before authentication completed")]
    ChannelClosed,

    #[error("handshake has already terminated")]
    SessionTerminated,

    #[error("serialization or deserialization failed: {0}")]
    Serialization(#[from] BincodeError),

    #[error("builder is missing required field `{0}`")]
    BuilderMissingField(&'static str),
}

impl HandshakeError {
    /// The message to show the user. Detailed kinds stay in local logs so a
    /// remote peer never learns which check failed.
    pub fn public_message(&self) -> &'static str {
        AUTHENTICATION_FAILURE
    }
}

pub type Result<T> = std::result::Result<T, HandshakeError>;
