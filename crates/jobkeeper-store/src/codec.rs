//! JSON codec.

use jobkeeper_protocols::{Codec, StoreError};

/// Codec storing values as JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-print encoded documents.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Codec for JsonCodec {
    fn name(&self) -> &str {
        "json"
    }

    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>, StoreError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8], type_hint: &str) -> Result<serde_json::Value, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupted {
            path: type_hint.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobkeeper_protocols::codec::{decode_as, encode_as};
    use jobkeeper_protocols::Job;

    #[test]
    fn test_encode_compact_and_pretty() {
        let value = serde_json::json!({"a": 1});
        let compact = JsonCodec::new().encode(&value).unwrap();
        let pretty = JsonCodec::pretty().encode(&value).unwrap();
        assert_eq!(compact, b"{\"a\":1}");
        assert!(pretty.len() > compact.len());
    }

    #[test]
    fn test_decode_garbage() {
        let err = JsonCodec::new().decode(b"{not json", "job").unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { ref path, .. } if path == "job"));
    }

    #[test]
    fn test_typed_helpers() {
        let codec = JsonCodec::new();
        let job = Job::new("log", vec![serde_json::json!("message")]);
        let bytes = encode_as(&codec, &job).unwrap();
        let decoded: Job = decode_as(&codec, &bytes, "job").unwrap();
        assert_eq!(decoded, job);
    }
}
