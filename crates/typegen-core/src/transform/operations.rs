use log::debug;

use crate::error::ResolveError;
use crate::ir::{
    media_type_is_json, ParameterDefinition, RequestBodyDefinition, ResolvedSchema,
    SpecLocation, TypeDefinition, TypeShape,
};
use crate::parse::operation::Operation;
use crate::parse::parameter::{Parameter, ParameterOrRef};
use crate::parse::request_body::{RequestBody, RequestBodyOrRef};
use crate::parse::response::ResponseOrRef;
use crate::parse::spec::OpenApiSpec;
use crate::transform::name_normalizer::{normalize_name, type_name};
use crate::transform::schema_resolver::SchemaResolver;

const PARAMETER_REF_PREFIX: &str = "#/components/parameters/";
const REQUEST_BODY_REF_PREFIX: &str = "#/components/requestBodies/";

const DEFAULT_RESPONSE_SUFFIX: &str = "Response";

/// Resolved operation-level output for one generation run.
#[derive(Debug, Default)]
pub struct OperationOutput {
    pub parameters: Vec<ParameterDefinition>,
    pub bodies: Vec<RequestBodyDefinition>,
}

/// Walk every operation in the document, resolving parameters, request
/// bodies and JSON responses into definitions. Body and response types
/// are registered with the tracker; name collisions resolve via the
/// content-type-derived suffix first, then the numeric fallback.
pub fn resolve_operations(
    resolver: &mut SchemaResolver<'_>,
    spec: &OpenApiSpec,
    response_type_suffix: &str,
) -> Result<OperationOutput, ResolveError> {
    let suffix = if response_type_suffix.is_empty() {
        DEFAULT_RESPONSE_SUFFIX
    } else {
        response_type_suffix
    };

    let mut out = OperationOutput::default();
    for (path, item) in &spec.paths {
        for (method, op) in item.operations() {
            let op_name = operation_type_name(resolver, op, method, path);
            debug!("resolving operation {op_name}");

            for param in item.parameters.iter().chain(&op.parameters) {
                if let Some(pd) = resolve_parameter(resolver, param, &op_name)? {
                    out.parameters.push(pd);
                }
            }
            if let Some(body) = &op.request_body {
                if let Some(bd) = resolve_request_body(resolver, body, &op_name)? {
                    out.bodies.push(bd);
                }
            }
            resolve_responses(resolver, op, &op_name, suffix)?;
        }
    }
    Ok(out)
}

fn operation_type_name(
    resolver: &SchemaResolver<'_>,
    op: &Operation,
    method: &str,
    path: &str,
) -> String {
    match &op.operation_id {
        Some(id) if !id.is_empty() => type_name(id, &resolver.naming),
        _ => {
            let base = format!("{method} {path}");
            type_name(&base, &resolver.naming)
        }
    }
}

fn resolve_parameter(
    resolver: &mut SchemaResolver<'_>,
    node: &ParameterOrRef,
    op_name: &str,
) -> Result<Option<ParameterDefinition>, ResolveError> {
    let param: &Parameter = match node {
        ParameterOrRef::Parameter(p) => p,
        ParameterOrRef::Ref { ref_path } => {
            let name = ref_path
                .strip_prefix(PARAMETER_REF_PREFIX)
                .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.clone()))?;
            match resolver.components.parameters.get(name) {
                Some(ParameterOrRef::Parameter(p)) => p,
                _ => return Err(ResolveError::RefTargetNotFound(ref_path.clone())),
            }
        }
    };

    let Some(schema_node) = &param.schema else {
        // Content-typed parameters are out of scope for typed models.
        return Ok(None);
    };

    let path = vec![op_name.to_string(), param.name.clone()];
    let schema = resolver
        .resolve_node(schema_node, &path)
        .map_err(|e| e.at(&path))?;
    let schema = resolver.promote_inline(schema, &path)?;

    Ok(Some(ParameterDefinition {
        param_name: param.name.clone(),
        name: normalize_name(&param.name),
        location: param.location,
        required: param.required,
        schema,
    }))
}

fn resolve_request_body(
    resolver: &mut SchemaResolver<'_>,
    node: &RequestBodyOrRef,
    op_name: &str,
) -> Result<Option<RequestBodyDefinition>, ResolveError> {
    let body: &RequestBody = match node {
        RequestBodyOrRef::RequestBody(b) => b,
        RequestBodyOrRef::Ref { ref_path } => {
            let name = ref_path
                .strip_prefix(REQUEST_BODY_REF_PREFIX)
                .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.clone()))?;
            match resolver.components.request_bodies.get(name) {
                Some(RequestBodyOrRef::RequestBody(b)) => b,
                _ => return Err(ResolveError::RefTargetNotFound(ref_path.clone())),
            }
        }
    };

    // Prefer application/json; otherwise take the last declared content
    // type we know how to tag.
    let mut target = None;
    for content_type in body.content.keys() {
        if content_type == "application/json" {
            target = Some(content_type.clone());
            break;
        }
        target = Some(content_type.clone());
    }
    let Some(content_type) = target else {
        return Ok(None);
    };
    let Some(tag) = content_type_tag(&content_type) else {
        return Ok(None);
    };
    let default = content_type == "application/json";

    let base = format!("{op_name}Body");
    let path = vec![base.clone()];
    let schema = match body.content[&content_type].schema.as_ref() {
        Some(node) => resolver.resolve_node(node, &path).map_err(|e| e.at(&path))?,
        None => ResolvedSchema::default(),
    };

    // Bare references reuse the referenced type; anything else gets its
    // own body type so callers have something to marshal.
    let type_name = if let Some(name) = schema.ref_name() {
        name.to_string()
    } else {
        let name = resolver
            .tracker
            .generate_unique_name_with_suffixes(&base, &[tag.as_str()]);
        let def = TypeDefinition::new(name.clone(), "")
            .with_schema(schema.clone())
            .at(SpecLocation::Body);
        resolver.tracker.register(def, "");
        name
    };

    Ok(Some(RequestBodyDefinition {
        type_name,
        required: body.required,
        schema,
        name_tag: tag,
        content_type,
        default,
    }))
}

fn resolve_responses(
    resolver: &mut SchemaResolver<'_>,
    op: &Operation,
    op_name: &str,
    suffix: &str,
) -> Result<(), ResolveError> {
    for (code, response) in &op.responses {
        let ResponseOrRef::Response(response) = response else {
            continue;
        };
        for (content_type, media) in &response.content {
            if !media_type_is_json(content_type) {
                continue;
            }
            let Some(node) = &media.schema else {
                continue;
            };
            let base = format!("{op_name}{suffix}");
            let path = vec![base.clone()];
            let schema = resolver.resolve_node(node, &path).map_err(|e| e.at(&path))?;

            // Responses that are plain references need no wrapper type.
            if matches!(schema.shape, TypeShape::Named(_)) {
                continue;
            }

            let name = resolver
                .tracker
                .generate_unique_name_with_suffixes(&base, &[code.as_str()]);
            let def = TypeDefinition::new(name, code)
                .with_schema(schema)
                .at(SpecLocation::Response);
            resolver.tracker.register(def, "");
        }
    }
    Ok(())
}

/// Content-type-derived name tag, or `None` for media types with no
/// typed representation.
fn content_type_tag(content_type: &str) -> Option<String> {
    if content_type == "application/json" {
        return Some("JSON".to_string());
    }
    if media_type_is_json(content_type) {
        return Some(type_name(content_type, &crate::transform::NamingMode::Default));
    }
    if content_type.starts_with("multipart/") {
        return Some("Multipart".to_string());
    }
    match content_type {
        "application/x-www-form-urlencoded" => Some("Formdata".to_string()),
        "text/plain" => Some("Text".to_string()),
        _ => None,
    }
}
