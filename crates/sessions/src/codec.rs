//! Session payload encoding.

use std::collections::HashMap;

use serde_json::Value;

use ks_domain::error::{Error, Result};

/// A session's attribute map.
pub type SessionValues = HashMap<String, Value>;

/// Encodes the attribute map into the stored string and back.
///
/// Injected into the registry at construction; [`JsonCodec`] is the default.
pub trait SessionCodec: Send + Sync {
    fn encode(&self, values: &SessionValues) -> Result<String>;
    fn decode(&self, raw: &str) -> Result<SessionValues>;
}

/// serde_json codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl SessionCodec for JsonCodec {
    fn encode(&self, values: &SessionValues) -> Result<String> {
        serde_json::to_string(values).map_err(|e| Error::Codec(format!("encoding session: {e}")))
    }

    fn decode(&self, raw: &str) -> Result<SessionValues> {
        serde_json::from_str(raw).map_err(|e| Error::Codec(format!("decoding session: {e}")))
    }
}

/// Stored form of `values`.  An empty map is stored as an empty string
/// without consulting the codec.
pub(crate) fn encode_record(codec: &dyn SessionCodec, values: &SessionValues) -> Result<String> {
    if values.is_empty() {
        return Ok(String::new());
    }
    codec.encode(values)
}

/// Inverse of [`encode_record`]: an empty string is an empty map.
pub(crate) fn decode_record(codec: &dyn SessionCodec, raw: &str) -> Result<SessionValues> {
    if raw.is_empty() {
        return Ok(SessionValues::new());
    }
    codec.decode(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Refusing;

    impl SessionCodec for Refusing {
        fn encode(&self, _: &SessionValues) -> Result<String> {
            Err(Error::Codec("refused".into()))
        }
        fn decode(&self, _: &str) -> Result<SessionValues> {
            Err(Error::Codec("refused".into()))
        }
    }

    #[test]
    fn empty_map_skips_codec() {
        assert_eq!(encode_record(&Refusing, &SessionValues::new()).unwrap(), "");
        assert!(decode_record(&Refusing, "").unwrap().is_empty());
    }

    #[test]
    fn json_preserves_heterogeneous_values() {
        let mut values = SessionValues::new();
        values.insert("name".into(), json!("ada"));
        values.insert("visits".into(), json!(3));
        values.insert("admin".into(), json!(false));
        values.insert("prefs".into(), json!({"theme": "dark", "tags": [1, 2]}));

        let raw = encode_record(&JsonCodec, &values).unwrap();
        assert_eq!(decode_record(&JsonCodec, &raw).unwrap(), values);
    }

    #[test]
    fn non_object_payload_is_a_codec_error() {
        for raw in ["[1,2]", "null", "{not json"] {
            let err = decode_record(&JsonCodec, raw).unwrap_err();
            assert!(matches!(err, Error::Codec(_)), "{raw}");
        }
    }
}
