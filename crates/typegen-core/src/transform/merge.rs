use log::debug;

use crate::parse::components::Components;
use crate::parse::operation::{Operation, METHODS};
use crate::parse::response::ResponseOrRef;
use crate::parse::schema::{Schema, SchemaOrRef};
use crate::parse::spec::OpenApiSpec;

/// Extension marking a merged schema that should collapse back into a
/// reference to a base-document component.
pub const EXT_SRC_MERGE_REF: &str = "x-src-merge-ref";

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Merge `overlay` into `base`, in place.
///
/// New paths and operations are added; colliding operations merge
/// parameters, request-body content and responses. Colliding component
/// schemas deep-merge. After merging, schemas tagged with
/// `x-src-merge-ref` collapse to a reference when the target component
/// exists.
pub fn merge_documents(base: &mut OpenApiSpec, overlay: &OpenApiSpec) {
    merge_operations(base, overlay);

    if let Some(overlay_components) = &overlay.components {
        let components = base.components.get_or_insert_with(Components::default);
        for (name, node) in &overlay_components.schemas {
            match components.schemas.get_mut(name) {
                None => {
                    debug!("merge: adding schema {name}");
                    components.schemas.insert(name.clone(), node.clone());
                }
                Some(current) => {
                    debug!("merge: merging schema {name}");
                    merge_schema_node(current, node);
                }
            }
        }
    }

    collapse_merge_refs(base);
}

fn merge_operations(base: &mut OpenApiSpec, overlay: &OpenApiSpec) {
    for (path, overlay_item) in &overlay.paths {
        let Some(current) = base.paths.get_mut(path) else {
            base.paths.insert(path.clone(), overlay_item.clone());
            continue;
        };

        for method in METHODS {
            let Some(overlay_op) = overlay_item.operation(method) else {
                continue;
            };
            match current.operation_mut(method) {
                None => current.set_operation(method, Some(overlay_op.clone())),
                Some(current_op) => merge_operation(current_op, overlay_op),
            }
        }
    }
}

fn merge_operation(current: &mut Operation, overlay: &Operation) {
    current.parameters.extend(overlay.parameters.iter().cloned());

    if let Some(crate::parse::request_body::RequestBodyOrRef::RequestBody(overlay_body)) =
        &overlay.request_body
    {
        match &mut current.request_body {
            None => current.request_body = overlay.request_body.clone(),
            Some(crate::parse::request_body::RequestBodyOrRef::RequestBody(current_body)) => {
                for (content_type, content) in &overlay_body.content {
                    match current_body.content.get_mut(content_type) {
                        None => {
                            current_body
                                .content
                                .insert(content_type.clone(), content.clone());
                        }
                        Some(current_content) => {
                            merge_media_schemas(
                                &mut current_content.schema,
                                &content.schema,
                            );
                        }
                    }
                }
            }
            Some(crate::parse::request_body::RequestBodyOrRef::Ref { .. }) => {}
        }
    }

    for (code, response) in &overlay.responses {
        match current.responses.get_mut(code) {
            None => {
                current.responses.insert(code.clone(), response.clone());
            }
            Some(ResponseOrRef::Response(current_response)) => {
                if let ResponseOrRef::Response(overlay_response) = response {
                    for (header, value) in &overlay_response.headers {
                        current_response
                            .headers
                            .insert(header.clone(), value.clone());
                    }
                    for (content_type, content) in &overlay_response.content {
                        match current_response.content.get_mut(content_type) {
                            None => {
                                current_response
                                    .content
                                    .insert(content_type.clone(), content.clone());
                            }
                            Some(current_content) => merge_media_schemas(
                                &mut current_content.schema,
                                &content.schema,
                            ),
                        }
                    }
                }
            }
            Some(ResponseOrRef::Ref { .. }) => {}
        }
    }
}

fn merge_media_schemas(current: &mut Option<SchemaOrRef>, overlay: &Option<SchemaOrRef>) {
    match (current.as_mut(), overlay) {
        (Some(current), Some(overlay)) => merge_schema_node(current, overlay),
        (None, Some(overlay)) => *current = Some(overlay.clone()),
        _ => {}
    }
}

/// Deep-merge an overlay schema node into the current one.
///
/// A reference on the current side is left alone; a reference on the
/// overlay side replaces the current schema wholesale. Properties merge
/// recursively, items merge, enum values and composition lists append,
/// `required` and numeric bounds overwrite, extensions overlay.
fn merge_schema_node(current: &mut SchemaOrRef, overlay: &SchemaOrRef) {
    let SchemaOrRef::Schema(current_schema) = current else {
        return;
    };
    let overlay_schema = match overlay {
        SchemaOrRef::Ref { .. } => {
            *current = overlay.clone();
            return;
        }
        SchemaOrRef::Schema(s) => s,
    };
    merge_schemas(current_schema, overlay_schema);
}

fn merge_schemas(current: &mut Schema, overlay: &Schema) {
    for (name, node) in &overlay.properties {
        match current.properties.get_mut(name) {
            None => {
                current.properties.insert(name.clone(), node.clone());
            }
            Some(existing) => merge_schema_node(existing, node),
        }
    }

    match (&mut current.items, &overlay.items) {
        (None, Some(items)) => current.items = Some(items.clone()),
        (Some(current_items), Some(overlay_items)) => {
            merge_schema_node(current_items, overlay_items);
        }
        _ => {}
    }

    if !current.enum_values.is_empty() {
        current.enum_values.extend(overlay.enum_values.iter().cloned());
    }

    current.all_of.extend(overlay.all_of.iter().cloned());
    current.any_of.extend(overlay.any_of.iter().cloned());
    current.one_of.extend(overlay.one_of.iter().cloned());

    if overlay.not.is_some() {
        current.not = overlay.not.clone();
    }

    for (key, value) in &overlay.extensions {
        current.extensions.insert(key.clone(), value.clone());
    }

    if !overlay.required.is_empty() {
        current.required = overlay.required.clone();
    }
    if overlay.minimum.is_some() {
        current.minimum = overlay.minimum;
    }
    if overlay.maximum.is_some() {
        current.maximum = overlay.maximum;
    }
    if overlay.exclusive_minimum.is_some() {
        current.exclusive_minimum = overlay.exclusive_minimum;
    }
    if overlay.exclusive_maximum.is_some() {
        current.exclusive_maximum = overlay.exclusive_maximum;
    }
}

/// Collapse every schema carrying `x-src-merge-ref` into a reference to
/// the named component, when that component exists in the merged set.
fn collapse_merge_refs(spec: &mut OpenApiSpec) {
    let Some(components) = spec.components.as_mut() else {
        return;
    };
    let known: Vec<String> = components.schemas.keys().cloned().collect();
    for node in components.schemas.values_mut() {
        collapse_node(node, &known);
    }
}

fn collapse_node(node: &mut SchemaOrRef, known: &[String]) {
    let SchemaOrRef::Schema(schema) = node else {
        return;
    };

    for prop in schema.properties.values_mut() {
        collapse_node(prop, known);
    }
    if let Some(items) = schema.items.as_mut() {
        collapse_node(items, known);
    }

    let Some(target) = schema
        .extension(EXT_SRC_MERGE_REF)
        .and_then(|v| v.as_str())
        .map(str::to_string)
    else {
        return;
    };
    let Some(name) = target.strip_prefix(SCHEMA_REF_PREFIX) else {
        return;
    };
    if name.is_empty() || !known.iter().any(|k| k == name) {
        return;
    }

    debug!("collapsing {EXT_SRC_MERGE_REF} into reference to {name}");
    *node = SchemaOrRef::Ref { ref_path: target };
}
