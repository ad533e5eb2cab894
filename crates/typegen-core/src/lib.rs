pub mod config;
pub mod error;
pub mod ir;
pub mod parse;
pub mod transform;

use config::Configuration;
use error::GenerateError;
use ir::TypeCollection;
use parse::spec::OpenApiSpec;
use indexmap::IndexMap;
use transform::operations::resolve_operations;
use transform::{compile_error_path, SchemaResolver};

/// Trait for renderers that turn a resolved type collection into source
/// text. Rendering is external to this crate; the core only produces the
/// collection.
pub trait Renderer {
    type Error: std::error::Error;
    fn render(&self, types: &TypeCollection) -> Result<String, Self::Error>;
}

/// Run one full generation pass: filter the document, resolve component
/// schemas and operations, and hand back the renderer-facing collection.
pub fn generate(
    mut spec: OpenApiSpec,
    config: &Configuration,
) -> Result<TypeCollection, GenerateError> {
    config.validate()?;

    transform::filter_document(&mut spec, &config.filter);

    let components = spec.components.clone().unwrap_or_default();
    let mut resolver = SchemaResolver::new(&components)
        .with_naming(config.naming_mode())
        .with_excluded_schemas(config.output_options.exclude_schemas.iter().cloned());

    resolver.resolve_components()?;
    let operations = resolve_operations(
        &mut resolver,
        &spec,
        &config.output_options.response_type_suffix,
    )?;

    let tracker = resolver.into_tracker();
    let mut error_accesses = IndexMap::new();
    for name in config.error_mapping.keys() {
        if let Some(def) = tracker.lookup_by_name(name) {
            error_accesses.insert(
                name.clone(),
                compile_error_path(def, &config.error_mapping, &tracker),
            );
        }
    }

    let mut collection = tracker.into_collection();
    collection.parameters = operations.parameters;
    collection.bodies = operations.bodies;
    collection.error_accesses = error_accesses;
    Ok(collection)
}
