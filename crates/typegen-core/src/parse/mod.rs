pub mod components;
pub mod media_type;
pub mod operation;
pub mod parameter;
pub mod request_body;
pub mod response;
pub mod schema;
pub mod spec;

use crate::error::ParseError;
use spec::OpenApiSpec;

/// Parse an OpenAPI document from YAML.
pub fn from_yaml(input: &str) -> Result<OpenApiSpec, ParseError> {
    let spec: OpenApiSpec = serde_yaml_ng::from_str(input)?;
    validate_version(&spec)?;
    Ok(spec)
}

/// Parse an OpenAPI document from JSON.
pub fn from_json(input: &str) -> Result<OpenApiSpec, ParseError> {
    let spec: OpenApiSpec = serde_json::from_str(input)?;
    validate_version(&spec)?;
    Ok(spec)
}

fn validate_version(spec: &OpenApiSpec) -> Result<(), ParseError> {
    if !spec.openapi.starts_with("3.") {
        return Err(ParseError::UnsupportedVersion(spec.openapi.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_swagger_2() {
        let err = from_yaml("openapi: \"2.0\"\ninfo:\n  title: T\n  version: \"1\"\n");
        assert!(matches!(err, Err(ParseError::UnsupportedVersion(v)) if v == "2.0"));
    }

    #[test]
    fn parses_minimal_document() {
        let spec = from_yaml("openapi: 3.0.3\ninfo:\n  title: T\n  version: \"1\"\n").unwrap();
        assert_eq!(spec.info.title, "T");
        assert!(spec.paths.is_empty());
    }
}
