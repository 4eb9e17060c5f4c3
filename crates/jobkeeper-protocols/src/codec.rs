//! Storage codec.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Converts values to and from their storage representation.
pub trait Codec: Send + Sync {
    /// Codec name, used in diagnostics.
    fn name(&self) -> &str;

    /// Encode a value.
    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>, StoreError>;

    /// Decode a value. `type_hint` names the expected type for error
    /// reporting and for codecs that need it.
    fn decode(&self, bytes: &[u8], type_hint: &str) -> Result<serde_json::Value, StoreError>;
}

/// Encode any serializable value through a codec.
pub fn encode_as<T: Serialize>(codec: &dyn Codec, value: &T) -> Result<Vec<u8>, StoreError> {
    let value = serde_json::to_value(value)?;
    codec.encode(&value)
}

/// Decode a typed value through a codec.
pub fn decode_as<T: DeserializeOwned>(
    codec: &dyn Codec,
    bytes: &[u8],
    type_hint: &str,
) -> Result<T, StoreError> {
    let value = codec.decode(bytes, type_hint)?;
    Ok(serde_json::from_value(value)?)
}
