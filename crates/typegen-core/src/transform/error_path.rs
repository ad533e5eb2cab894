use indexmap::IndexMap;

use crate::ir::{ResolvedSchema, TypeDefinition, TypeShape};
use crate::transform::type_tracker::TypeTracker;

/// Fallback message used whenever an error path cannot be compiled or a
/// step fails at runtime (nil field, empty array).
pub const UNKNOWN_ERROR: &str = "unknown error";

/// One step of a compiled error-message access chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessStep {
    /// Generated field name to access.
    pub field: String,
    /// Nullable non-array field: the renderer emits a nil check that
    /// returns the fallback, then dereferences.
    pub deref: bool,
    /// Array field: the renderer emits an emptiness check that returns
    /// the fallback, then takes the first element.
    pub first_element: bool,
}

/// The compiled form of one type's error-path mapping. Malformed or
/// unresolvable configuration degrades to the fallback; it never fails
/// generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorAccess {
    Chain(Vec<AccessStep>),
    Unknown,
}

/// Compile the configured error path for `def` (for example
/// `data[].message[]`) into a field access chain. `mappings` is the
/// type-name-to-path configuration; named property types are resolved
/// through the tracker.
pub fn compile_error_path(
    def: &TypeDefinition,
    mappings: &IndexMap<String, String>,
    tracker: &TypeTracker,
) -> ErrorAccess {
    let Some(path) = mappings.get(&def.name).filter(|p| !p.is_empty()) else {
        return ErrorAccess::Unknown;
    };

    let mut schema = def.schema.clone();
    let mut steps = Vec::new();

    for segment in parse_error_path(path) {
        let Some(prop) = schema
            .properties()
            .iter()
            .find(|p| p.json_name == segment.property)
        else {
            return ErrorAccess::Unknown;
        };

        let is_array = matches!(prop.schema.shape, TypeShape::Array(_));
        steps.push(AccessStep {
            field: prop.name.pascal_case.clone(),
            deref: prop.constraints.nullable && !is_array,
            first_element: segment.first_element,
        });

        let mut next = prop.schema.clone();
        if segment.first_element {
            if let TypeShape::Array(item) = next.shape {
                next = *item;
            }
        }
        next = follow_named(next, tracker);
        schema = next;
    }

    if steps.is_empty() {
        return ErrorAccess::Unknown;
    }
    ErrorAccess::Chain(steps)
}

/// A reference to a named type carries no properties of its own; keep
/// following until a structural schema (or a dead end) is reached.
fn follow_named(schema: ResolvedSchema, tracker: &TypeTracker) -> ResolvedSchema {
    let mut current = schema;
    while let Some(name) = current.ref_name().map(str::to_string) {
        match tracker.lookup_by_name(&name) {
            Some(def) => current = def.schema.clone(),
            None => break,
        }
    }
    current
}

struct PathSegment {
    property: String,
    first_element: bool,
}

/// Parse `data[].message[]` into property segments; a `[]` suffix marks
/// first-element array access.
fn parse_error_path(path: &str) -> Vec<PathSegment> {
    path.split('.')
        .map(|part| {
            let first_element = part.ends_with("[]");
            PathSegment {
                property: part.trim_end_matches("[]").to_string(),
                first_element,
            }
        })
        .collect()
}
