use log::debug;

use crate::config::FilterConfig;
use crate::parse::operation::{Operation, METHODS};
use crate::parse::schema::{Schema, SchemaOrRef};
use crate::parse::spec::OpenApiSpec;

/// Apply include/exclude rules to a document before resolution.
///
/// Empty rule lists are no-ops. Operations are dropped by path, tag and
/// operation id; schema properties by per-schema lists (required
/// properties always survive); schema extensions by key. Example values
/// are stripped everywhere so they never leak into generated output.
pub fn filter_document(spec: &mut OpenApiSpec, cfg: &FilterConfig) {
    filter_operations(spec, cfg);
    filter_component_schemas(spec, cfg);
}

fn filter_operations(spec: &mut OpenApiSpec, cfg: &FilterConfig) {
    spec.paths.retain(|path, _| {
        if !cfg.include.paths.is_empty() && !cfg.include.paths.contains(path) {
            debug!("filtering out path {path}: not in include list");
            return false;
        }
        if cfg.exclude.paths.contains(path) {
            debug!("filtering out path {path}: excluded");
            return false;
        }
        true
    });

    for path_item in spec.paths.values_mut() {
        for method in METHODS {
            let Some(op) = path_item.operation(method) else {
                continue;
            };
            if should_remove_operation(op, cfg) {
                path_item.set_operation(method, None);
            } else if let Some(op) = path_item.operation_mut(method) {
                strip_operation_examples(op);
            }
        }
    }
}

fn should_remove_operation(op: &Operation, cfg: &FilterConfig) -> bool {
    if op.tags.iter().any(|t| cfg.exclude.tags.contains(t)) {
        return true;
    }
    if !cfg.include.tags.is_empty()
        && !op.tags.iter().any(|t| cfg.include.tags.contains(t))
    {
        return true;
    }

    let op_id = op.operation_id.as_deref().unwrap_or_default();
    if cfg.exclude.operation_ids.iter().any(|id| id == op_id) {
        return true;
    }
    if !cfg.include.operation_ids.is_empty()
        && !cfg.include.operation_ids.iter().any(|id| id == op_id)
    {
        return true;
    }
    false
}

fn strip_operation_examples(op: &mut Operation) {
    if let Some(crate::parse::request_body::RequestBodyOrRef::RequestBody(body)) =
        op.request_body.as_mut()
    {
        for content in body.content.values_mut() {
            content.example = None;
            content.examples.clear();
        }
    }
    for response in op.responses.values_mut() {
        if let crate::parse::response::ResponseOrRef::Response(response) = response {
            for content in response.content.values_mut() {
                content.example = None;
                content.examples.clear();
            }
        }
    }
    for param in &mut op.parameters {
        if let crate::parse::parameter::ParameterOrRef::Parameter(param) = param {
            param.example = None;
        }
    }
}

fn filter_component_schemas(spec: &mut OpenApiSpec, cfg: &FilterConfig) {
    let Some(components) = spec.components.as_mut() else {
        return;
    };

    for (schema_name, node) in components.schemas.iter_mut() {
        let SchemaOrRef::Schema(schema) = node else {
            continue;
        };

        schema.example = None;

        filter_schema_extensions(schema, cfg);

        let include = cfg.include.schema_properties.get(schema_name);
        let exclude = cfg.exclude.schema_properties.get(schema_name);
        if include.is_none() && exclude.is_none() {
            continue;
        }

        let required = schema.required.clone();
        schema.properties.retain(|prop_name, _| {
            // Required properties are never filtered out.
            if required.contains(prop_name) {
                return true;
            }
            if let Some(include) = include {
                if !include.contains(prop_name) {
                    debug!("filtering out {schema_name}.{prop_name}: not included");
                    return false;
                }
            }
            if let Some(exclude) = exclude {
                if exclude.contains(prop_name) {
                    debug!("filtering out {schema_name}.{prop_name}: excluded");
                    return false;
                }
            }
            true
        });
    }
}

fn filter_schema_extensions(schema: &mut Schema, cfg: &FilterConfig) {
    if cfg.include.extensions.is_empty() && cfg.exclude.extensions.is_empty() {
        return;
    }
    let include = &cfg.include.extensions;
    let exclude = &cfg.exclude.extensions;
    schema.extensions.retain(|key, _| {
        if !include.is_empty() {
            return include.contains(key);
        }
        !exclude.contains(key)
    });
}
