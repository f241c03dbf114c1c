//! Messages exchanged during the identity handshake, and their wire codec.
//!
//! 身份握手期间交换的消息及其线路编解码。

use crate::crypto::certificate::PublicCertificate;
use crate::error::BincodeError;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Length of the client and server hello randoms.
pub const RANDOM_LENGTH: usize = 32;
/// Length of the premaster secret wrapped under the host's key.
pub const PREMASTER_SECRET_LENGTH: usize = 32;

pub type Random = [u8; RANDOM_LENGTH];

/// Host -> Client: opens the handshake with the host's nonce and certificate.
#[derive(Serialize, Deserialize, bincode::Encode, bincode::Decode, Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    pub random: Random,
    pub certificate: PublicCertificate,
}

/// Client -> Host: the client's nonce, identity certificate and send time
/// (milliseconds since the Unix epoch).
#[derive(Serialize, Deserialize, bincode::Encode, bincode::Decode, Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub random: Random,
    pub certificate: PublicCertificate,
    pub timestamp: i64,
}

/// Client -> Host: asks the host to issue a new identity.
#[derive(Serialize, Deserialize, bincode::Encode, bincode::Decode, Debug, Clone, PartialEq, Eq)]
pub struct NewIdentityRequest {
    /// The premaster secret, encrypted under the host certificate.
    pub encrypted_premaster_secret: Vec<u8>,
    pub random: Random,
}

/// Host -> Client: a new identity, sealed under the derived symmetric key.
#[derive(Serialize, Deserialize, bincode::Encode, bincode::Decode, Debug, Clone, PartialEq, Eq)]
pub struct ProvisionIdentity {
    pub encrypted_certificate_bundle: Vec<u8>,
}

/// Either side: a signature over `serverHello || clientHello`.
#[derive(Serialize, Deserialize, bincode::Encode, bincode::Decode, Debug, Clone, PartialEq, Eq)]
pub struct HandshakeVerification {
    pub signature: Vec<u8>,
}

/// The plaintext inside [`ProvisionIdentity`].
///
/// The private exponent is wiped when the bundle is dropped.
#[derive(bincode::Encode, bincode::Decode)]
pub struct CertificateBundle {
    pub public_certificate: PublicCertificate,
    pub private_exponent: Vec<u8>,
}

impl CertificateBundle {
    pub fn encode(&self) -> Result<Vec<u8>, BincodeError> {
        bincode::encode_to_vec(self, bincode::config::standard()).map_err(Into::into)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, BincodeError> {
        decode_exact(bytes)
    }
}

impl Drop for CertificateBundle {
    fn drop(&mut self) {
        self.private_exponent.zeroize();
    }
}

/// Defines the messages exchanged during the handshake protocol.
///
/// 定义握手协议中交换的消息。
#[derive(Serialize, Deserialize, bincode::Encode, bincode::Decode, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeMessage {
    /// Host -> Client, exactly once.
    ServerHello(ServerHello),

    /// Client -> Host: the client hello together with the client's signature
    /// over `serverHello || clientHello`.
    ClientHello {
        hello: ClientHello,
        verification: HandshakeVerification,
    },

    /// Client -> Host, at most once per session.
    NewIdentityRequest(NewIdentityRequest),

    /// Host -> Client, only in answer to a [`NewIdentityRequest`].
    ProvisionIdentity(ProvisionIdentity),

    /// Host -> Client: the host's signature over `serverHello || clientHello`.
    HandshakeVerification(HandshakeVerification),

    /// Client -> Host: first request after authentication succeeds.
    ServerInfoRequest,
}

impl HandshakeMessage {
    /// Short human-readable name used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            HandshakeMessage::ServerHello(_) => "server hello",
            HandshakeMessage::ClientHello { .. } => "client hello",
            HandshakeMessage::NewIdentityRequest(_) => "new identity request",
            HandshakeMessage::ProvisionIdentity(_) => "identity provisioning",
            HandshakeMessage::HandshakeVerification(_) => "server verification",
            HandshakeMessage::ServerInfoRequest => "server info request",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, BincodeError> {
        bincode::encode_to_vec(self, bincode::config::standard()).map_err(Into::into)
    }

    /// Decodes one message, rejecting trailing bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, BincodeError> {
        decode_exact(bytes)
    }
}

fn decode_exact<T: bincode::Decode<()>>(bytes: &[u8]) -> Result<T, BincodeError> {
    let (value, read) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
    if read != bytes.len() {
        return Err(bincode::error::DecodeError::Other("trailing bytes after message").into());
    }
    Ok(value)
}

/// Encodes a hello for inclusion in the signed transcript.
pub(crate) fn encode_hello<T: bincode::Encode>(hello: &T) -> Result<Vec<u8>, BincodeError> {
    bincode::encode_to_vec(hello, bincode::config::standard()).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn certificate() -> PublicCertificate {
        PublicCertificate::new("00ff".into(), vec![1, 2, 3], vec![1, 0, 1], vec![9; 8])
    }

    #[test]
    fn message_survives_the_wire() {
        let message = HandshakeMessage::ClientHello {
            hello: ClientHello {
                random: [5; RANDOM_LENGTH],
                certificate: certificate(),
                timestamp: 1_700_000_000_000,
            },
            verification: HandshakeVerification {
                signature: vec![1, 2, 3],
            },
        };
        let bytes = message.encode().unwrap();
        assert_eq!(HandshakeMessage::decode(&bytes).unwrap(), message);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = HandshakeMessage::ServerInfoRequest.encode().unwrap();
        bytes.push(0);
        assert!(HandshakeMessage::decode(&bytes).is_err());
    }

    #[test]
    fn truncated_bundle_is_rejected() {
        let bundle = CertificateBundle {
            public_certificate: certificate(),
            private_exponent: vec![42; 16],
        };
        let bytes = bundle.encode().unwrap();
        assert!(CertificateBundle::decode(&bytes[..bytes.len() - 4]).is_err());
    }
}
