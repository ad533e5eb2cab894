use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A two-branch union value.
///
/// Decoding tries branch `A` first and falls back to `B`, following the
/// declaration order of the source union. Encoding serializes whichever
/// branch is populated, with no added tagging.
#[derive(Debug, Clone, PartialEq)]
pub enum Either<A, B> {
    A(A),
    B(B),
}

impl<A, B> Either<A, B> {
    pub fn as_a(&self) -> Option<&A> {
        match self {
            Either::A(a) => Some(a),
            Either::B(_) => None,
        }
    }

    pub fn as_b(&self) -> Option<&B> {
        match self {
            Either::A(_) => None,
            Either::B(b) => Some(b),
        }
    }

    pub fn is_a(&self) -> bool {
        matches!(self, Either::A(_))
    }
}

impl<A: Serialize, B: Serialize> Serialize for Either<A, B> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Either::A(a) => a.serialize(serializer),
            Either::B(b) => b.serialize(serializer),
        }
    }
}

impl<'de, A, B> Deserialize<'de> for Either<A, B>
where
    A: DeserializeOwned,
    B: DeserializeOwned,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if let Ok(a) = serde_json::from_value::<A>(raw.clone()) {
            return Ok(Either::A(a));
        }
        if let Ok(b) = serde_json::from_value::<B>(raw) {
            return Ok(Either::B(b));
        }
        Err(serde::de::Error::custom(
            "failed to decode as either branch A or branch B",
        ))
    }
}
