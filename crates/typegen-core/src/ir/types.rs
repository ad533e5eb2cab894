use std::fmt;

use indexmap::IndexMap;

use super::schemas::ResolvedSchema;
use crate::transform::error_path::ErrorAccess;

/// A name with multiple casing variants pre-computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedName {
    pub original: String,
    pub pascal_case: String,
    pub snake_case: String,
    pub screaming_snake: String,
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Where in the OpenAPI document a type definition originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecLocation {
    Path,
    Query,
    Header,
    Body,
    Response,
    Schema,
    Union,
}

impl SpecLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecLocation::Path => "path",
            SpecLocation::Query => "query",
            SpecLocation::Header => "header",
            SpecLocation::Body => "body",
            SpecLocation::Response => "response",
            SpecLocation::Schema => "schema",
            SpecLocation::Union => "union",
        }
    }
}

/// One named type produced by a generation run.
///
/// `name` is the identifier-safe generated name; `json_name` is the
/// original name from the document, which can differ when the original
/// contains characters invalid in an identifier. Immutable once
/// registered with the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    pub json_name: String,
    pub schema: ResolvedSchema,
    pub spec_location: SpecLocation,
    pub needs_marshaler: bool,
    pub has_sensitive_data: bool,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>, json_name: impl Into<String>) -> Self {
        TypeDefinition {
            name: name.into(),
            json_name: json_name.into(),
            schema: ResolvedSchema::default(),
            spec_location: SpecLocation::Schema,
            needs_marshaler: false,
            has_sensitive_data: false,
        }
    }

    pub fn with_schema(mut self, schema: ResolvedSchema) -> Self {
        self.needs_marshaler = schema.needs_marshaler();
        self.schema = schema;
        self
    }

    pub fn at(mut self, location: SpecLocation) -> Self {
        self.spec_location = location;
        self
    }

    pub fn is_alias(&self) -> bool {
        self.schema.define_via_alias
    }

    pub fn is_optional(&self) -> bool {
        !self.schema.constraints.required
    }
}

/// Everything one generation run hands to the (external) renderer:
/// the tracker's definitions in registration order.
#[derive(Debug, Clone, Default)]
pub struct TypeCollection {
    pub definitions: Vec<TypeDefinition>,
    pub parameters: Vec<super::ParameterDefinition>,
    pub bodies: Vec<super::RequestBodyDefinition>,
    /// Compiled error-message access chains, keyed by type name, for the
    /// types named in the configured error mapping.
    pub error_accesses: IndexMap<String, ErrorAccess>,
}
