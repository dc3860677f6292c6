//! Document identifier: a MongoDB ObjectId, exchanged with clients as 24 lower-case hex
//! characters rather than the `{"$oid": ...}` extended-JSON form.

use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(ObjectId);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected 24 hex characters, got {0:?}")]
pub struct ParseIdError(pub String);

impl DocumentId {
    /// Generate a fresh id.
    pub fn new() -> Self {
        DocumentId(ObjectId::new())
    }

    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        DocumentId(ObjectId::from_bytes(bytes))
    }

    pub const fn bytes(&self) -> [u8; 12] {
        self.0.bytes()
    }

    /// Parse the external hex form. Upper-case digits are accepted.
    pub fn parse_str(s: &str) -> Result<Self, ParseIdError> {
        ObjectId::parse_str(s)
            .map(DocumentId)
            .map_err(|_| ParseIdError(s.to_string()))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    /// Creation time encoded in the id.
    pub fn timestamp(&self) -> DateTime {
        self.0.timestamp()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for DocumentId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl From<ObjectId> for DocumentId {
    fn from(oid: ObjectId) -> Self {
        DocumentId(oid)
    }
}

impl From<DocumentId> for ObjectId {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DocumentId::parse_str(&s)
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&s), &"24 hex characters"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let id = DocumentId::new();
        let hex = id.to_hex();
        assert_eq!(hex.len(), 24);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(DocumentId::parse_str(&hex).unwrap(), id);
        assert_eq!(id.to_string(), hex);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(DocumentId::parse_str("not-an-id").is_err());
        assert!(DocumentId::parse_str("zzzzzzzzzzzzzzzzzzzzzzzz").is_err());
        assert!(DocumentId::parse_str("65a1b2c3d4e5f60718293a4").is_err());
        assert!("65A1B2C3D4E5F60718293A4B".parse::<DocumentId>().is_ok());
    }

    #[test]
    fn ids_are_unique_and_ordered_within_a_second() {
        let a = DocumentId::new();
        let b = DocumentId::new();
        assert_ne!(a, b);
        assert!(a.timestamp() <= b.timestamp());
    }

    #[test]
    fn converts_to_object_id() {
        let id = DocumentId::new();
        let oid: ObjectId = id.into();
        assert_eq!(oid.to_hex(), id.to_hex());
        assert_eq!(DocumentId::from(oid), id);
        assert_eq!(DocumentId::from_bytes(oid.bytes()), id);
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = DocumentId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap();
        assert_eq!(serde_json::to_value(id).unwrap(), serde_json::json!("65a1b2c3d4e5f60718293a4b"));
    }

    #[test]
    fn malformed_hex_is_an_invalid_value() {
        let err = serde_json::from_str::<DocumentId>("\"xyz\"").unwrap_err();
        assert!(err.to_string().starts_with("invalid value"), "{err}");
    }
}
