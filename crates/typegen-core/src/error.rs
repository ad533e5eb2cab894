use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

/// Errors raised while resolving schemas into type definitions. Every
/// variant that points at a schema carries the accumulated name-hint path
/// so the caller can report where in the document resolution failed.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("reference target not found: {0}")]
    RefTargetNotFound(String),

    #[error("invalid reference format: {0}")]
    InvalidRefFormat(String),

    #[error("error resolving {path}: {source}")]
    Context {
        path: String,
        #[source]
        source: Box<ResolveError>,
    },
}

impl ResolveError {
    /// Wrap an error with the schema path it occurred under.
    pub fn at(self, path: &[String]) -> ResolveError {
        ResolveError::Context {
            path: path.join("."),
            source: Box::new(self),
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("invalid configuration: {0}")]
    Config(String),
}
