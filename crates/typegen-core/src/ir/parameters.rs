use super::schemas::ResolvedSchema;
use super::types::NormalizedName;
use crate::parse::parameter::ParameterLocation;

/// One resolved HTTP parameter. Owns a resolved schema; never mutated
/// after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDefinition {
    /// Original parameter name as it appears on the wire.
    pub param_name: String,
    pub name: NormalizedName,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: ResolvedSchema,
}

impl ParameterDefinition {
    /// Optional parameters are held through indirection unless the
    /// resolved schema already provides one (arrays, maps).
    pub fn indirect_optional(&self) -> bool {
        !self.required
            && !matches!(
                self.schema.shape,
                super::TypeShape::Array(_) | super::TypeShape::Map(_)
            )
    }
}

/// One request body variant for an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBodyDefinition {
    /// Generated type name for the body (already collision-resolved).
    pub type_name: String,
    pub required: bool,
    pub schema: ResolvedSchema,
    /// Content-type-derived tag, e.g. "JSON" for application/json.
    pub name_tag: String,
    pub content_type: String,
    /// Whether this is the default (JSON) body for its operation.
    pub default: bool,
}

impl RequestBodyDefinition {
    pub fn is_json(&self) -> bool {
        media_type_is_json(&self.content_type)
    }

    /// Method-name suffix for non-default bodies, e.g. `WithTextBody`.
    pub fn suffix(&self) -> String {
        if self.default {
            String::new()
        } else {
            format!("With{}Body", self.name_tag)
        }
    }
}

/// Matches `application/json` and `application/*+json` media types.
pub fn media_type_is_json(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or("").trim();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}
