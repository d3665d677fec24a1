//! Content fingerprinting.
//!
//! A request's cache identity is derived from exactly two inputs: the raw
//! image bytes and the metadata record. The image is hashed as-is; the
//! metadata is canonicalized first (see [`canonical_json`]) so that key order
//! carries no meaning. The two component digests, image first, are then
//! concatenated and hashed once more into the final [`Fingerprint`]. Identical
//! inputs always produce the same fingerprint within and across process runs.

mod canonical;

pub use canonical::canonical_json;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-addressed cache key: lowercase-hex SHA-256, 64 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Fingerprint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Component digests retained for audit and debugging. Lookup never uses
/// these; the combined [`Fingerprint`] is the only key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDigest {
    /// SHA-256 of the raw image bytes.
    pub image: String,
    /// SHA-256 of the canonical metadata serialization.
    pub metadata: String,
}

/// Everything the hasher derives for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDigest {
    pub fingerprint: Fingerprint,
    pub input: InputDigest,
}

/// Derives the fingerprint and component digests for `(image_bytes, metadata)`.
///
/// Total over its domain except for metadata that cannot be represented as a
/// JSON document (e.g. maps with non-string keys), which fails with
/// [`Error::Serialization`](crate::Error::Serialization).
pub fn derive<M: Serialize>(image_bytes: &[u8], metadata: &M) -> crate::Result<RequestDigest> {
    let doc = serde_json::to_value(metadata)?;
    let image = sha256_hex(image_bytes);
    let metadata = sha256_hex(canonical_json(&doc).as_bytes());
    let combined = sha256_hex(format!("{image}{metadata}").as_bytes());
    Ok(RequestDigest {
        fingerprint: Fingerprint(combined),
        input: InputDigest { image, metadata },
    })
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn identical_inputs_yield_identical_fingerprints() {
        let meta = json!({ "title": "Earphone cover", "tags": ["audio", "cover"] });
        let a = derive(b"png bytes", &meta).unwrap();
        let b = derive(b"png bytes", &meta).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.input, b.input);
    }

    #[test]
    fn key_order_does_not_matter() {
        let a = derive(b"img", &json!({ "a": 1, "b": 2 })).unwrap();
        let b = derive(b"img", &json!({ "b": 2, "a": 1 })).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn nested_key_order_does_not_matter() {
        let a = derive(b"img", &json!({ "camera": { "angle": "top", "lens": 35 } })).unwrap();
        let b = derive(b"img", &json!({ "camera": { "lens": 35, "angle": "top" } })).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn image_bytes_are_significant() {
        let meta = json!({ "title": "x" });
        let a = derive(b"img-one", &meta).unwrap();
        let b = derive(b"img-two", &meta).unwrap();
        assert_ne!(a.fingerprint, b.fingerprint);
        assert_ne!(a.input.image, b.input.image);
        assert_eq!(a.input.metadata, b.input.metadata);
    }

    #[test]
    fn metadata_values_are_significant() {
        let a = derive(b"img", &json!({ "title": "x" })).unwrap();
        let b = derive(b"img", &json!({ "title": "y" })).unwrap();
        assert_ne!(a.fingerprint, b.fingerprint);
        assert_eq!(a.input.image, b.input.image);
    }

    #[test]
    fn fingerprint_is_lowercase_hex_sha256() {
        let d = derive(b"img", &json!({})).unwrap();
        assert_eq!(d.fingerprint.as_str().len(), 64);
        assert!(d
            .fingerprint
            .as_str()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn non_json_metadata_fails_with_serialization_error() {
        let mut meta: HashMap<(u8, u8), &str> = HashMap::new();
        meta.insert((1, 2), "tuple keys cannot become JSON");
        let err = derive(b"img", &meta).unwrap_err();
        assert_eq!(err.kind(), "serialization_error");
    }
}
