//! Tracked files, change records and their identifiers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::lines::LineDelta;

/// Stable identifier of a tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prefix(CompactString);

impl Prefix {
    /// Create a prefix from a string.
    pub fn new(value: impl Into<CompactString>) -> Self {
        Self(value.into())
    }

    /// Get the prefix as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Prefix {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of a single change record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(CompactString);

impl ChangeId {
    /// Create a change id from a string.
    pub fn new(value: impl Into<CompactString>) -> Self {
        Self(value.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChangeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// BLAKE3 digest of a file's content at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Error returned when parsing a hex digest fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid content hash: {0}")]
pub struct ParseHashError(String);

impl FromStr for ContentHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 || !s.is_ascii() {
            return Err(ParseHashError(s.to_string()));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseHashError(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        hex.parse().map_err(serde::de::Error::custom)
    }
}

/// A file registered for change tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFile {
    /// Path at registration time.
    #[serde(rename = "file")]
    pub path: PathBuf,
    /// Content fingerprint at registration time.
    pub hash: ContentHash,
}

impl TrackedFile {
    /// Create a new tracked file entry.
    pub fn new(path: impl Into<PathBuf>, hash: ContentHash) -> Self {
        Self {
            path: path.into(),
            hash,
        }
    }
}

/// One recorded change to one tracked file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Prefix of the file this change belongs to.
    #[serde(rename = "file")]
    pub owner: Prefix,
    /// Caller supplied annotation.
    pub description: String,
    /// When the change was recorded.
    #[serde(rename = "time")]
    pub timestamp: DateTime<Utc>,
    /// Lines edited by this change.
    #[serde(rename = "base", with = "encoded_delta")]
    pub payload: LineDelta,
}

impl ChangeRecord {
    /// Create a record stamped with the current time.
    pub fn new(owner: Prefix, description: impl Into<String>, payload: LineDelta) -> Self {
        Self {
            owner,
            description: description.into(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Check if this record belongs to `prefix`.
    pub fn belongs_to(&self, prefix: &Prefix) -> bool {
        &self.owner == prefix
    }
}

/// Payloads are stored as base64 of their JSON encoding.
mod encoded_delta {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::lines::LineDelta;

    pub fn serialize<S: Serializer>(delta: &LineDelta, serializer: S) -> Result<S::Ok, S::Error> {
        let json = serde_json::to_vec(delta).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&STANDARD.encode(json))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LineDelta, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let json = STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)?;
        serde_json::from_slice(&json).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_hex_roundtrip() {
        let hash = ContentHash::new([0xab; 32]);
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(hex.parse::<ContentHash>().unwrap(), hash);
    }

    #[test]
    fn test_content_hash_rejects_garbage() {
        assert!("xyz".parse::<ContentHash>().is_err());
        assert!("zz".repeat(32).parse::<ContentHash>().is_err());
    }

    #[test]
    fn test_change_record_wire_format() {
        let mut payload = LineDelta::new();
        payload.set(2, "BETA");
        let record = ChangeRecord::new(Prefix::from("p8211abc"), "fix", payload.clone());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["file"], "p8211abc");
        assert_eq!(value["description"], "fix");
        assert!(value["time"].is_string());

        // "base" is base64 of {"2":"BETA"}
        assert_eq!(value["base"], "eyIyIjoiQkVUQSJ9");

        let back: ChangeRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.payload, payload);
        assert!(back.belongs_to(&Prefix::from("p8211abc")));
    }

    #[test]
    fn test_change_record_rejects_bad_base64() {
        let json = r#"{"file":"a","description":"d","time":"2024-01-01T00:00:00Z","base":"!!"}"#;
        assert!(serde_json::from_str::<ChangeRecord>(json).is_err());
    }
}
