//! The byte string both parties sign to prove they saw the same hellos.
//!
//! 双方签名的字节串，用于证明双方看到了相同的问候消息。

use crate::error::BincodeError;
use crate::protocol::message::{ClientHello, ServerHello, encode_hello};

/// Returns `encode(serverHello) || encode(clientHello)`.
///
/// Both hellos must be final before this is called: any later change would
/// invalidate signatures already produced over them.
pub fn signature_data(
    server_hello: &ServerHello,
    client_hello: &ClientHello,
) -> Result<Vec<u8>, BincodeError> {
    let mut data = encode_hello(server_hello)?;
    data.extend_from_slice(&encode_hello(client_hello)?);
    Ok(data)
}
