/**
 * Document Snapshots
 *
 * A snapshot is the opaque serialized form of a session's full replicated
 * document state. Only the client's document store interprets the bytes;
 * every other component stores and returns them byte-exact.
 *
 * On the JSON wire a snapshot is a standard base64 string. An empty string
 * is an empty snapshot.
 */
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::shared::SharedError;

/// Opaque, byte-exact document blob
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    /// Create an empty snapshot
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Wrap raw bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse the base64 wire form
    pub fn from_base64(encoded: &str) -> Result<Self, SharedError> {
        Ok(Self(STANDARD.decode(encoded.trim())?))
    }

    /// Base64 wire form
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<u8>> for Snapshot {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Snapshot::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}
