use bytes::{Bytes, BytesMut};

use crate::error::TransformError;

/// Applied to payloads on their way in and out of a procedure.
///
/// `deserialize` runs on the request before it is decoded, `serialize` on
/// each encoded response.
pub trait DataTransformer: Send + Sync {
    fn serialize(&self, payload: Bytes) -> Result<Bytes, TransformError>;

    fn deserialize(&self, payload: Bytes) -> Result<Bytes, TransformError>;
}

/// Leaves payloads untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTransformer;

impl DataTransformer for DefaultTransformer {
    fn serialize(&self, payload: Bytes) -> Result<Bytes, TransformError> {
        Ok(payload)
    }

    fn deserialize(&self, payload: Bytes) -> Result<Bytes, TransformError> {
        Ok(payload)
    }
}

/// Frames every payload with a protobuf varint length prefix.
#[derive(Debug, Default, Clone, Copy)]
pub struct LengthDelimited;

impl DataTransformer for LengthDelimited {
    fn serialize(&self, payload: Bytes) -> Result<Bytes, TransformError> {
        let mut buf =
            BytesMut::with_capacity(prost::length_delimiter_len(payload.len()) + payload.len());
        prost::encode_length_delimiter(payload.len(), &mut buf)
            .map_err(|e| TransformError::new(e.to_string()))?;
        buf.extend_from_slice(&payload);
        Ok(buf.freeze())
    }

    fn deserialize(&self, mut payload: Bytes) -> Result<Bytes, TransformError> {
        let len = prost::decode_length_delimiter(&mut payload)
            .map_err(|e| TransformError::new(e.to_string()))?;
        if len != payload.len() {
            return Err(TransformError::new(format!(
                "length prefix {len} does not match payload of {} bytes",
                payload.len()
            )));
        }
        Ok(payload)
    }
}
