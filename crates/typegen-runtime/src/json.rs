use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonCombineError {
    #[error("cannot combine {0} non-null branches of mixed/unsupported kinds")]
    MixedKinds(usize),

    #[error("additional properties did not decode: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Deep-merge `patch` into `base`. Objects merge key by key with the
/// patch winning; arrays and scalars are replaced wholesale.
pub fn json_merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(&key) {
                    Some(existing) => json_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

/// Combine the serialized parts of a multi-branch value into one payload.
/// Null branches are dropped; all-object parts deep-merge, all-array
/// parts concatenate, and a single surviving part passes through. Any
/// other mix is an error.
pub fn coalesce_or_merge(parts: &[Value]) -> Result<Value, JsonCombineError> {
    let non_null: Vec<&Value> = parts.iter().filter(|p| !p.is_null()).collect();
    match non_null.as_slice() {
        [] => Ok(Value::Null),
        [single] => Ok((*single).clone()),
        many if many.iter().all(|p| p.is_object()) => {
            let mut merged = Value::Object(Map::new());
            for part in many {
                json_merge(&mut merged, (*part).clone());
            }
            Ok(merged)
        }
        many if many.iter().all(|p| p.is_array()) => {
            let mut items = Vec::new();
            for part in many {
                if let Value::Array(a) = part {
                    items.extend(a.iter().cloned());
                }
            }
            Ok(Value::Array(items))
        }
        many => Err(JsonCombineError::MixedKinds(many.len())),
    }
}

/// Split a decoded JSON object into the keys a matched union variant
/// consumed and the typed leftovers. Re-flattening the variant and the
/// returned map yields the original object with no key loss and no
/// duplication.
pub fn capture_additional_properties<T: DeserializeOwned>(
    object: &Map<String, Value>,
    consumed: &[&str],
) -> Result<IndexMap<String, T>, JsonCombineError> {
    let mut extras = IndexMap::new();
    for (key, value) in object {
        if consumed.contains(&key.as_str()) {
            continue;
        }
        extras.insert(key.clone(), serde_json::from_value(value.clone())?);
    }
    Ok(extras)
}
