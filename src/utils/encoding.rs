//! Base64 helpers shared by request models and the CLI
//! Author: kartik4091
//! Created: 2025-06-04

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{Error, Result};

pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes standard Base64, ignoring surrounding whitespace. Failures are
/// wrapped by `kind`, so each caller keeps its own error class.
pub fn decode(text: &str, what: &str, kind: fn(String) -> Error) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| kind(format!("{} is not valid Base64: {}", what, e)))
}

/// `#[serde(with = "...")]` adapter: byte buffers travel as Base64 strings.
pub mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.trim()).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    }

    #[test]
    fn test_serde_adapter() {
        let json = serde_json::to_string(&Wrapper { data: b"%PDF".to_vec() }).unwrap();
        assert_eq!(json, r#"{"data":"JVBERg=="}"#);
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data, b"%PDF");
        assert!(serde_json::from_str::<Wrapper>(r#"{"data":"@@"}"#).is_err());
    }

    #[test]
    fn test_decode_reports_field() {
        let err = decode("###", "Private key", Error::Signing).unwrap_err();
        assert!(matches!(err, Error::Signing(_)));
        assert!(err.to_string().contains("Private key"));
        assert_eq!(decode(" AAE= \n", "x", Error::Encoding).unwrap(), vec![0, 1]);
    }
}
