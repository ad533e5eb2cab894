use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned by a typed accessor when the captured payload does not
/// match that variant's shape, or when nothing has been captured yet.
#[derive(Debug, Error)]
pub enum UnionDecodeError {
    #[error("no union value has been set")]
    Empty,

    #[error("payload does not match this variant: {0}")]
    Mismatch(#[from] serde_json::Error),
}

/// A union of three or more branches.
///
/// Decoding captures the payload unresolved; typed accessors decode a
/// variant lazily on demand. Encoding serializes the captured payload
/// verbatim, so a value set through `from_variant` round-trips with no
/// added tagging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawUnion {
    raw: Option<serde_json::Value>,
}

impl RawUnion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lazily decode the captured payload as one variant.
    pub fn as_variant<T: DeserializeOwned>(&self) -> Result<T, UnionDecodeError> {
        let raw = self.raw.as_ref().ok_or(UnionDecodeError::Empty)?;
        Ok(serde_json::from_value(raw.clone())?)
    }

    /// Set the payload from one variant value. Exactly one variant is
    /// held at a time; a later call replaces the earlier payload.
    pub fn from_variant<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(RawUnion {
            raw: Some(serde_json::to_value(value)?),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_none()
    }

    pub fn raw(&self) -> Option<&serde_json::Value> {
        self.raw.as_ref()
    }
}
