//! # Vertex Digest
//!
//! `VertexId` names one build step by the SHA-256 digest of its definition.
//! The text form is `sha256:<64 hex chars>`.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::errors::DigestError;

/// Algorithm prefix used in the text form.
pub const ALGORITHM: &str = "sha256";

/// Content-addressed identifier of a build vertex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct VertexId([u8; 32]);

impl VertexId {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Digest arbitrary content into an identifier.
    #[must_use]
    pub fn of(content: impl AsRef<[u8]>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_ref());
        Self(hasher.finalize().into())
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex encoding without the algorithm prefix.
    #[must_use]
    pub fn encoded(&self) -> String {
        hex::encode(self.0)
    }

    /// First twelve hex characters, for compact display.
    #[must_use]
    pub fn short(&self) -> String {
        let mut encoded = self.encoded();
        encoded.truncate(12);
        encoded
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", ALGORITHM, self.encoded())
    }
}

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VertexId({})", self.short())
    }
}

impl FromStr for VertexId {
    type Err = DigestError;

    /// Accepts both `sha256:<hex>` and bare `<hex>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = match s.split_once(':') {
            Some((alg, rest)) if alg == ALGORITHM => rest,
            Some((alg, _)) => return Err(DigestError::UnsupportedAlgorithm(alg.to_string())),
            None => s,
        };

        let bytes = hex::decode(encoded).map_err(|e| DigestError::InvalidEncoding(e.to_string()))?;
        let len = bytes.len();
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| DigestError::InvalidLength(len))?;
        Ok(Self(bytes))
    }
}

impl Serialize for VertexId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for VertexId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_has_algorithm_prefix() {
        let id = VertexId::of("RUN make");
        let text = id.to_string();
        assert!(text.starts_with("sha256:"));
        assert_eq!(text.len(), "sha256:".len() + 64);
    }

    #[test]
    fn test_parse_prefixed_and_bare() {
        let id = VertexId::of("COPY . .");
        let prefixed: VertexId = id.to_string().parse().unwrap();
        let bare: VertexId = id.encoded().parse().unwrap();
        assert_eq!(prefixed, id);
        assert_eq!(bare, id);
    }

    #[test]
    fn test_parse_rejects_other_algorithms() {
        let err = "sha512:abcd".parse::<VertexId>().unwrap_err();
        assert_eq!(err, DigestError::UnsupportedAlgorithm("sha512".into()));
    }

    #[test]
    fn test_parse_rejects_short_digest() {
        let err = "sha256:abcd".parse::<VertexId>().unwrap_err();
        assert_eq!(err, DigestError::InvalidLength(2));
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let err = "sha256:zz".parse::<VertexId>().unwrap_err();
        assert!(matches!(err, DigestError::InvalidEncoding(_)));
    }

    #[test]
    fn test_same_content_same_id() {
        assert_eq!(VertexId::of("a"), VertexId::of("a"));
        assert_ne!(VertexId::of("a"), VertexId::of("b"));
    }

    #[test]
    fn test_short_is_twelve_chars() {
        assert_eq!(VertexId::of("x").short().len(), 12);
    }

    #[test]
    fn test_serde_as_string() {
        let id = VertexId::of("RUN true");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: VertexId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
