use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::error::ResolveError;
use crate::ir::{
    Property, ResolvedSchema, ScalarKind, SpecLocation, TypeDefinition, TypeShape,
};
use crate::parse::components::Components;
use crate::parse::schema::{
    AdditionalProperties, Schema, SchemaOrRef, SchemaType,
};
use crate::transform::constraints::{resolve_constraints, ConstraintsContext};
use crate::transform::name_normalizer::{
    enum_constant_name, join_path, normalize_name, type_name, NamingMode,
};
use crate::transform::type_tracker::TypeTracker;
use crate::ir::{EnumDef, EnumValue};

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// The recursive schema walker for one generation run.
///
/// Owns the type tracker for the duration of the run. Cycles are broken
/// by recording in-progress ref paths with their pre-assigned type names;
/// re-entering one returns an indirect named reference instead of
/// recursing.
pub struct SchemaResolver<'a> {
    pub(super) components: &'a Components,
    pub(super) tracker: TypeTracker,
    pub(super) naming: NamingMode,
    exclude_schemas: HashSet<String>,
    in_progress: HashMap<String, String>,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(components: &'a Components) -> Self {
        SchemaResolver {
            components,
            tracker: TypeTracker::new(),
            naming: NamingMode::Default,
            exclude_schemas: HashSet::new(),
            in_progress: HashMap::new(),
        }
    }

    pub fn with_naming(mut self, naming: NamingMode) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_excluded_schemas<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_schemas = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn tracker(&self) -> &TypeTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut TypeTracker {
        &mut self.tracker
    }

    pub fn into_tracker(self) -> TypeTracker {
        self.tracker
    }

    /// Resolve every named component schema, in declaration order.
    /// Schemas listed in the exclusion set are skipped entirely; forward
    /// and backward references between the remaining schemas both work
    /// because referenced schemas are resolved on first encounter.
    pub fn resolve_components(&mut self) -> Result<(), ResolveError> {
        let names: Vec<String> = self.components.schemas.keys().cloned().collect();
        for name in names {
            if self.exclude_schemas.contains(&name) {
                debug!("skipping excluded schema {name}");
                continue;
            }
            let ref_path = format!("{SCHEMA_REF_PREFIX}{name}");
            if self.tracker.lookup_by_ref(&ref_path).is_none() {
                self.resolve_named(&name)?;
            }
        }
        Ok(())
    }

    /// Resolve a reference or inline schema into a type descriptor.
    /// `path` is the accumulated name-hint stack used to synthesize names
    /// for anonymous schemas.
    pub fn resolve_node(
        &mut self,
        node: &SchemaOrRef,
        path: &[String],
    ) -> Result<ResolvedSchema, ResolveError> {
        match node {
            SchemaOrRef::Ref { ref_path } => self.resolve_ref(ref_path),
            SchemaOrRef::Schema(schema) => self.resolve_schema(schema, path),
        }
    }

    /// True when the node is a reference whose target is currently being
    /// resolved higher up the call stack. Such an occurrence closes a
    /// cycle and must be held through indirection.
    pub(super) fn closes_cycle(&self, node: &SchemaOrRef) -> bool {
        node.as_ref_path()
            .is_some_and(|p| self.in_progress.contains_key(p))
    }

    fn resolve_ref(&mut self, ref_path: &str) -> Result<ResolvedSchema, ResolveError> {
        let name = ref_path
            .strip_prefix(SCHEMA_REF_PREFIX)
            .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;

        if self.exclude_schemas.contains(name) {
            warn!("reference to excluded schema {name}, resolving as untyped");
            return Ok(ResolvedSchema::default());
        }

        // Cycle edge: the target is already on the resolution stack.
        if let Some(assigned) = self.in_progress.get(ref_path) {
            debug!("cycle edge at {ref_path}, using indirect reference");
            return Ok(ResolvedSchema::named(assigned.clone()));
        }

        if let Some(existing) = self.tracker.lookup_by_ref(ref_path) {
            return Ok(ResolvedSchema::named(existing.to_string()));
        }

        let registered = self.resolve_named(name)?;
        Ok(ResolvedSchema::named(registered))
    }

    /// Resolve one named component schema and register it, returning the
    /// generated type name.
    fn resolve_named(&mut self, name: &str) -> Result<String, ResolveError> {
        let node = self
            .components
            .schemas
            .get(name)
            .cloned()
            .ok_or_else(|| {
                ResolveError::RefTargetNotFound(format!("{SCHEMA_REF_PREFIX}{name}"))
            })?;

        let ref_path = format!("{SCHEMA_REF_PREFIX}{name}");
        let base = type_name(name, &self.naming);
        let assigned = self.tracker.generate_unique_name(&base);

        // Pre-assign the name so re-entrant references resolve to it, and
        // reserve it so schemas resolved mid-recursion cannot claim it.
        self.tracker.reserve(&assigned);
        self.in_progress.insert(ref_path.clone(), assigned.clone());
        let path = vec![name.to_string()];
        let resolved = self
            .resolve_node(&node, &path)
            .map_err(|e| e.at(&path))?;
        self.in_progress.remove(&ref_path);

        let sensitive = resolved.properties().iter().any(|p| p.sensitive);
        let def = TypeDefinition::new(assigned.clone(), name)
            .with_schema(resolved)
            .at(SpecLocation::Schema);
        let def = TypeDefinition {
            has_sensitive_data: sensitive,
            ..def
        };
        self.tracker.register(def, &ref_path);
        Ok(assigned)
    }

    fn resolve_schema(
        &mut self,
        schema: &Schema,
        path: &[String],
    ) -> Result<ResolvedSchema, ResolveError> {
        if !schema.one_of.is_empty() || !schema.any_of.is_empty() {
            return self.synthesize_union(schema, path);
        }
        if !schema.all_of.is_empty() {
            return self.synthesize_all_of(schema, path);
        }
        if !schema.enum_values.is_empty() {
            return self.resolve_enum(schema, path);
        }

        let primary = schema.schema_type.as_ref().and_then(|t| t.primary());

        let mut resolved = match primary {
            Some(SchemaType::Object) | None if !schema.properties.is_empty() => {
                self.resolve_object(schema, path)?
            }
            Some(SchemaType::Object) | None => {
                // Objects with no declared properties: a typed map when
                // additionalProperties carries a schema, otherwise untyped.
                match self.resolve_additional(schema, path)? {
                    Some(value) => ResolvedSchema {
                        shape: TypeShape::Map(Box::new(value)),
                        define_via_alias: true,
                        ..Default::default()
                    },
                    None if primary.is_some() => ResolvedSchema {
                        shape: TypeShape::Map(Box::new(ResolvedSchema::default())),
                        define_via_alias: true,
                        ..Default::default()
                    },
                    None => ResolvedSchema::default(),
                }
            }
            Some(SchemaType::Array) => {
                let items = match &schema.items {
                    Some(items) => {
                        let mut item_path = path.to_vec();
                        item_path.push("Item".to_string());
                        self.resolve_node(items, &item_path)?
                    }
                    None => ResolvedSchema::default(),
                };
                ResolvedSchema {
                    shape: TypeShape::Array(Box::new(items)),
                    define_via_alias: true,
                    ..Default::default()
                }
            }
            Some(SchemaType::String) => {
                ResolvedSchema::scalar(string_kind(schema.format.as_deref()))
            }
            Some(SchemaType::Integer) => ResolvedSchema::scalar(ScalarKind::Integer),
            Some(SchemaType::Number) => ResolvedSchema::scalar(ScalarKind::Number),
            Some(SchemaType::Boolean) => ResolvedSchema::scalar(ScalarKind::Boolean),
            Some(SchemaType::Null) => ResolvedSchema::default(),
        };

        resolved.description = schema.description.clone();
        Ok(resolved)
    }

    fn resolve_object(
        &mut self,
        schema: &Schema,
        path: &[String],
    ) -> Result<ResolvedSchema, ResolveError> {
        let properties = self.resolve_properties(schema, path, &schema.required)?;
        let additional = self.resolve_additional(schema, path)?;

        Ok(ResolvedSchema {
            shape: TypeShape::Object(properties),
            additional_properties: additional.map(Box::new),
            description: schema.description.clone(),
            ..Default::default()
        })
    }

    /// Resolve an object schema's declared properties, in declaration
    /// order. `required` is the effective required-name list, which can be
    /// wider than `schema.required` when allOf members merge.
    pub(super) fn resolve_properties(
        &mut self,
        schema: &Schema,
        path: &[String],
        required: &[String],
    ) -> Result<Vec<Property>, ResolveError> {
        let mut properties = Vec::with_capacity(schema.properties.len());
        for (prop_name, prop_node) in &schema.properties {
            let mut prop_path = path.to_vec();
            prop_path.push(prop_name.clone());

            let indirect = self.closes_cycle(prop_node);
            let resolved = self
                .resolve_node(prop_node, &prop_path)
                .map_err(|e| e.at(&prop_path))?;
            let resolved = self.promote_inline(resolved, &prop_path)?;

            let prop_schema = prop_node.as_schema();
            let ctx = ConstraintsContext {
                name: prop_name,
                has_nil_type: prop_schema.is_some_and(Schema::has_nil_type),
                required: required.iter().any(|r| r == prop_name),
            };
            let constraints = match prop_schema {
                Some(s) => resolve_constraints(s, ctx),
                None => resolve_constraints(&Schema::default(), ctx),
            };

            let sensitive = prop_schema
                .and_then(|s| s.extension("x-sensitive"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false);

            properties.push(Property {
                name: normalize_name(prop_name),
                json_name: prop_name.clone(),
                schema: resolved,
                constraints,
                embedded: false,
                sensitive,
                indirect,
            });
        }
        Ok(properties)
    }

    pub(super) fn resolve_additional(
        &mut self,
        schema: &Schema,
        path: &[String],
    ) -> Result<Option<ResolvedSchema>, ResolveError> {
        match &schema.additional_properties {
            Some(AdditionalProperties::Bool(true)) => Ok(Some(ResolvedSchema::default())),
            Some(AdditionalProperties::Bool(false)) | None => Ok(None),
            Some(AdditionalProperties::Schema(node)) => {
                let mut ap_path = path.to_vec();
                ap_path.push("AdditionalProperties".to_string());
                Ok(Some(self.resolve_node(node, &ap_path)?))
            }
        }
    }

    /// Enums and unions synthesized under a property position get
    /// promoted to their own named definition; the property then refers
    /// to it by name. Plain objects stay inline.
    pub(super) fn promote_inline(
        &mut self,
        resolved: ResolvedSchema,
        path: &[String],
    ) -> Result<ResolvedSchema, ResolveError> {
        if !matches!(resolved.shape, TypeShape::Enum(_)) {
            return Ok(resolved);
        }
        let base = join_path(path);
        let name = self.tracker.generate_unique_name(&base);
        let json_name = path.last().cloned().unwrap_or_default();
        let def = TypeDefinition::new(name.clone(), json_name)
            .with_schema(resolved)
            .at(SpecLocation::Schema);
        self.tracker.register(def, "");
        Ok(ResolvedSchema::named(name))
    }

    /// The base kind follows the literal values, not the declared type: a
    /// schema declared integer with string literals resolves to string.
    fn resolve_enum(
        &mut self,
        schema: &Schema,
        _path: &[String],
    ) -> Result<ResolvedSchema, ResolveError> {
        let base = if schema.enum_values.iter().all(|v| v.is_i64() || v.is_u64()) {
            ScalarKind::Integer
        } else if schema.enum_values.iter().all(|v| v.is_number()) {
            ScalarKind::Number
        } else if schema.enum_values.iter().all(|v| v.is_boolean()) {
            ScalarKind::Boolean
        } else {
            if schema
                .schema_type
                .as_ref()
                .is_some_and(|t| !t.contains(SchemaType::String))
            {
                warn!("enum literals disagree with declared type, following literals");
            }
            ScalarKind::String
        };

        let mut used: HashSet<String> = HashSet::new();
        let mut values = Vec::with_capacity(schema.enum_values.len());
        for literal in &schema.enum_values {
            let base_name = enum_constant_name(literal);
            let mut candidate = base_name.clone();
            let mut i = 0usize;
            while !used.insert(candidate.clone()) {
                candidate = format!("{base_name}{i}");
                i += 1;
            }
            values.push(EnumValue {
                name: candidate,
                literal: literal.clone(),
            });
        }

        Ok(ResolvedSchema {
            shape: TypeShape::Enum(EnumDef { base, values }),
            description: schema.description.clone(),
            ..Default::default()
        })
    }
}

fn string_kind(format: Option<&str>) -> ScalarKind {
    match format {
        Some("date-time") | Some("date") => ScalarKind::DateTime,
        Some("binary") | Some("byte") => ScalarKind::Binary,
        _ => ScalarKind::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::schema::TypeSet;
    use indexmap::IndexMap;
    use serde_json::json;

    fn components_from_yaml(yaml: &str) -> Components {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn scalar_formats() {
        let components = Components::default();
        let mut resolver = SchemaResolver::new(&components);
        let schema = Schema {
            schema_type: Some(TypeSet::Single(SchemaType::String)),
            format: Some("date-time".to_string()),
            ..Default::default()
        };
        let res = resolver
            .resolve_node(&SchemaOrRef::Schema(Box::new(schema)), &[])
            .unwrap();
        assert_eq!(res.shape, TypeShape::Scalar(ScalarKind::DateTime));
        assert!(res.define_via_alias);
    }

    #[test]
    fn object_properties_keep_declaration_order() {
        let components = components_from_yaml(
            r#"
schemas:
  User:
    type: object
    required: [id]
    properties:
      id:
        type: integer
      name:
        type: string
      createdAt:
        type: string
        format: date-time
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let def = resolver.tracker().lookup_by_name("User").unwrap();
        let props = def.schema.properties();
        let names: Vec<&str> = props.iter().map(|p| p.json_name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "createdAt"]);
        assert!(props[0].constraints.required);
        assert!(!props[1].constraints.required);
        assert!(props[1].constraints.nullable);
        assert_eq!(
            props[2].schema.shape,
            TypeShape::Scalar(ScalarKind::DateTime)
        );
    }

    #[test]
    fn reference_between_schemas() {
        let components = components_from_yaml(
            r#"
schemas:
  Pet:
    type: object
    properties:
      owner:
        $ref: '#/components/schemas/Owner'
  Owner:
    type: object
    properties:
      name:
        type: string
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        assert_eq!(resolver.tracker().len(), 2);
        let pet = resolver.tracker().lookup_by_name("Pet").unwrap();
        let owner_prop = &pet.schema.properties()[0];
        assert_eq!(owner_prop.schema.ref_name(), Some("Owner"));
        assert!(!owner_prop.indirect);
    }

    #[test]
    fn self_referential_schema_terminates_with_indirection() {
        // A boolean expression tree: NOT holds the expression itself.
        let components = components_from_yaml(
            r#"
schemas:
  Expression:
    type: object
    properties:
      operator:
        type: string
      not:
        $ref: '#/components/schemas/Expression'
      operands:
        type: array
        items:
          $ref: '#/components/schemas/Expression'
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        assert_eq!(resolver.tracker().len(), 1);
        let def = resolver.tracker().lookup_by_name("Expression").unwrap();
        let props = def.schema.properties();

        let not_prop = props.iter().find(|p| p.json_name == "not").unwrap();
        assert_eq!(not_prop.schema.ref_name(), Some("Expression"));
        assert!(not_prop.indirect);

        let operands = props.iter().find(|p| p.json_name == "operands").unwrap();
        match &operands.schema.shape {
            TypeShape::Array(item) => assert_eq!(item.ref_name(), Some("Expression")),
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn mutually_referential_schemas_terminate() {
        let components = components_from_yaml(
            r#"
schemas:
  Node:
    type: object
    properties:
      edge:
        $ref: '#/components/schemas/Edge'
  Edge:
    type: object
    properties:
      target:
        $ref: '#/components/schemas/Node'
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();
        assert_eq!(resolver.tracker().len(), 2);

        // The back edge (resolved while Node was still in progress) is
        // the indirect one.
        let edge = resolver.tracker().lookup_by_name("Edge").unwrap();
        assert!(edge.schema.properties()[0].indirect);
    }

    #[test]
    fn enum_follows_literal_values_over_declared_type() {
        let components = components_from_yaml(
            r#"
schemas:
  OrderDirection:
    type: integer
    enum: [asc, desc]
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let def = resolver.tracker().lookup_by_name("OrderDirection").unwrap();
        match &def.schema.shape {
            TypeShape::Enum(e) => {
                assert_eq!(e.base, ScalarKind::String);
                assert_eq!(e.values[0].name, "Asc");
                assert_eq!(e.values[0].literal, json!("asc"));
                assert_eq!(e.values[1].name, "Desc");
            }
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn integer_enum_constants_get_prefixed_names() {
        let components = components_from_yaml(
            r#"
schemas:
  StatusCode:
    type: integer
    enum: [200, 404]
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let def = resolver.tracker().lookup_by_name("StatusCode").unwrap();
        match &def.schema.shape {
            TypeShape::Enum(e) => {
                assert_eq!(e.base, ScalarKind::Integer);
                assert_eq!(e.values[0].name, "N200");
                assert_eq!(e.values[1].name, "N404");
            }
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn inline_property_enum_is_promoted() {
        let components = components_from_yaml(
            r#"
schemas:
  Query:
    type: object
    properties:
      direction:
        type: string
        enum: [asc, desc]
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let prop = &resolver
            .tracker()
            .lookup_by_name("Query")
            .unwrap()
            .schema
            .properties()[0];
        assert_eq!(prop.schema.ref_name(), Some("QueryDirection"));
        assert!(resolver.tracker().exists("QueryDirection"));
    }

    #[test]
    fn additional_properties_map() {
        let components = components_from_yaml(
            r#"
schemas:
  Labels:
    type: object
    additionalProperties:
      type: string
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let def = resolver.tracker().lookup_by_name("Labels").unwrap();
        match &def.schema.shape {
            TypeShape::Map(v) => assert_eq!(v.shape, TypeShape::Scalar(ScalarKind::String)),
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn sensitive_property_marks_definition() {
        let components = components_from_yaml(
            r#"
schemas:
  Account:
    type: object
    properties:
      ssn:
        type: string
        x-sensitive: true
      name:
        type: string
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let def = resolver.tracker().lookup_by_name("Account").unwrap();
        assert!(def.has_sensitive_data);
        assert!(def.schema.properties()[0].sensitive);
        assert!(!def.schema.properties()[1].sensitive);
    }

    #[test]
    fn excluded_schema_is_skipped() {
        let components = components_from_yaml(
            r#"
schemas:
  Internal:
    type: object
    properties:
      secret:
        type: string
  Public:
    type: object
    properties:
      internal:
        $ref: '#/components/schemas/Internal'
"#,
        );
        let mut resolver =
            SchemaResolver::new(&components).with_excluded_schemas(["Internal"]);
        resolver.resolve_components().unwrap();

        assert!(!resolver.tracker().exists("Internal"));
        let public = resolver.tracker().lookup_by_name("Public").unwrap();
        assert_eq!(public.schema.properties()[0].schema.shape, TypeShape::Any);
    }

    #[test]
    fn missing_ref_target_errors_with_path() {
        let components = components_from_yaml(
            r#"
schemas:
  Broken:
    type: object
    properties:
      other:
        $ref: '#/components/schemas/DoesNotExist'
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        let err = resolver.resolve_components().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Broken.other"), "unexpected error: {msg}");
    }

    #[test]
    fn invalid_ref_format_errors() {
        let components = Components::default();
        let mut resolver = SchemaResolver::new(&components);
        let err = resolver
            .resolve_node(
                &SchemaOrRef::Ref {
                    ref_path: "http://elsewhere/schema.json".to_string(),
                },
                &[],
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidRefFormat(_)));
    }

    #[test]
    fn colliding_component_names_stay_unique() {
        let mut schemas: IndexMap<String, SchemaOrRef> = IndexMap::new();
        schemas.insert(
            "user".to_string(),
            SchemaOrRef::Schema(Box::new(Schema {
                schema_type: Some(TypeSet::Single(SchemaType::Object)),
                ..Default::default()
            })),
        );
        schemas.insert(
            "User".to_string(),
            SchemaOrRef::Schema(Box::new(Schema {
                schema_type: Some(TypeSet::Single(SchemaType::Object)),
                ..Default::default()
            })),
        );
        let components = Components {
            schemas,
            ..Default::default()
        };
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        assert!(resolver.tracker().exists("User"));
        assert!(resolver.tracker().exists("User0"));
        assert_eq!(
            resolver.tracker().lookup_by_ref("#/components/schemas/User"),
            Some("User0")
        );
    }

    #[test]
    fn colliding_names_stay_unique_across_a_cross_reference() {
        // "user" references "User" while its own name is still only
        // pre-assigned; the referent must not be handed the same name.
        let components = components_from_yaml(
            r#"
schemas:
  user:
    type: object
    properties:
      account:
        $ref: '#/components/schemas/User'
  User:
    type: object
    properties:
      id:
        type: string
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        assert_eq!(resolver.tracker().len(), 2);
        assert_eq!(
            resolver.tracker().lookup_by_ref("#/components/schemas/user"),
            Some("User")
        );
        assert_eq!(
            resolver.tracker().lookup_by_ref("#/components/schemas/User"),
            Some("User0")
        );

        let user = resolver.tracker().lookup_by_name("User").unwrap();
        assert_eq!(user.json_name, "user");
        assert_eq!(
            user.schema.properties()[0].schema.ref_name(),
            Some("User0")
        );
    }
}
