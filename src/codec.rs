use bytes::Bytes;
use prost::Message;
use rpcrouter_lite::{DataTransformer, LengthDelimited, TransformError};
use thiserror::Error;

/// Errors that can occur while turning a response payload back into a message.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("protobuf decode error")]
    Decode(#[from] prost::DecodeError),
}

/// Encode and frame a request the way the application's transformer expects.
pub fn encode_request<M: Message>(msg: &M) -> Result<Bytes, TransformError> {
    LengthDelimited.serialize(Bytes::from(msg.encode_to_vec()))
}

/// Unframe and decode a response.
pub fn decode_response<M: Message + Default>(payload: Bytes) -> Result<M, CodecError> {
    let payload = LengthDelimited.deserialize(payload)?;
    Ok(M::decode(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::User;

    #[test]
    fn test_request_response_framing() {
        let user = User {
            id: 7,
            name: "linus".to_string(),
        };
        let framed = encode_request(&user).unwrap();
        assert_eq!(framed[0] as usize, framed.len() - 1);
        let decoded: User = decode_response(framed).unwrap();
        assert_eq!(decoded, user);
    }

    #[test]
    fn test_unframed_response_rejected() {
        let result: Result<User, _> = decode_response(Bytes::from_static(&[9]));
        assert!(matches!(result, Err(CodecError::Transform(_))));
        // an empty message encodes to zero bytes, which is not a valid frame either
        let raw = Bytes::from(User::default().encode_to_vec());
        assert!(decode_response::<User>(raw).is_err());
    }
}
