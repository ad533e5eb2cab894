use log::debug;

use crate::error::ResolveError;
use crate::ir::{
    DiscriminatorInfo, Property, ResolvedSchema, SpecLocation, TypeDefinition, TypeShape,
    UnionDescriptor, UnionElement, UnionEncoding,
};
use crate::parse::schema::{Schema, SchemaOrRef};
use crate::transform::name_normalizer::{join_path, normalize_name};
use crate::transform::schema_resolver::SchemaResolver;

/// Union holder fields carry this JSON name so renderers know to route
/// the value through the generated marshaler instead of a plain field.
pub const UNION_FIELD_JSON_NAME: &str = "-";

impl SchemaResolver<'_> {
    /// Synthesize a oneOf/anyOf schema: a named union type is registered
    /// for the branches, and the returned descriptor is a holder object
    /// with a single pass-through field referencing it. anyOf combined
    /// with additionalProperties also captures the leftover-key map on
    /// the holder.
    pub(super) fn synthesize_union(
        &mut self,
        schema: &Schema,
        path: &[String],
    ) -> Result<ResolvedSchema, ResolveError> {
        let (members, suffix) = if !schema.one_of.is_empty() {
            (&schema.one_of, "OneOf")
        } else {
            (&schema.any_of, "AnyOf")
        };

        let base = format!("{}{suffix}", join_path(path));
        let union_name = self.tracker.generate_unique_name(&base);
        // Members are resolved before the union type itself registers;
        // hold the name so none of them can take it.
        self.tracker.reserve(&union_name);

        let mut elements = Vec::with_capacity(members.len());
        for (i, member) in members.iter().enumerate() {
            let mut member_path = path.to_vec();
            member_path.push(format!("{suffix}{i}"));
            let resolved = self
                .resolve_node(member, &member_path)
                .map_err(|e| e.at(&member_path))?;

            let element = match (&resolved.shape, resolved.primitive_name()) {
                (TypeShape::Named(name), _) => UnionElement::Named(name.clone()),
                (_, Some(primitive)) => UnionElement::Primitive(primitive.to_string()),
                _ => {
                    // Inline compound member: promote it to its own named
                    // definition so the union can refer to it.
                    let inline_name =
                        self.tracker.generate_unique_name(&join_path(&member_path));
                    let def = TypeDefinition::new(inline_name.clone(), "")
                        .with_schema(resolved)
                        .at(SpecLocation::Union);
                    self.tracker.register(def, "");
                    UnionElement::Named(inline_name)
                }
            };
            elements.push(element);
        }

        let encoding = match elements.len() {
            1 => UnionEncoding::Passthrough,
            2 => UnionEncoding::Either,
            _ => UnionEncoding::RawDispatch,
        };
        debug!(
            "union {union_name}: {} branches, {encoding:?} encoding",
            elements.len()
        );

        let discriminator = schema.discriminator.as_ref().map(|d| DiscriminatorInfo {
            property_name: d.property_name.clone(),
            mapping: d
                .mapping
                .iter()
                .map(|(value, target)| {
                    let resolved = self
                        .tracker
                        .lookup_by_ref(target)
                        .map(str::to_string)
                        .unwrap_or_else(|| target.clone());
                    (value.clone(), resolved)
                })
                .collect(),
        });

        let union_schema = ResolvedSchema {
            shape: TypeShape::Union(UnionDescriptor {
                elements,
                encoding,
                discriminator,
            }),
            ..Default::default()
        };
        let def = TypeDefinition::new(union_name.clone(), "")
            .with_schema(union_schema)
            .at(SpecLocation::Union);
        self.tracker.register(def, "");

        // anyOf alongside additionalProperties: the holder keeps both the
        // matched variant and the leftover keys.
        let additional = if !schema.any_of.is_empty() {
            self.resolve_additional(schema, path)?
        } else {
            None
        };

        let holder_field = Property {
            name: normalize_name(&union_name),
            json_name: UNION_FIELD_JSON_NAME.to_string(),
            schema: ResolvedSchema::named(union_name),
            constraints: Default::default(),
            embedded: false,
            sensitive: false,
            indirect: true,
        };

        Ok(ResolvedSchema {
            shape: TypeShape::Object(vec![holder_field]),
            additional_properties: additional.map(Box::new),
            description: schema.description.clone(),
            ..Default::default()
        })
    }

    /// Merge an allOf composition into one flattened struct.
    ///
    /// Metadata-only members contribute no type of their own; bare
    /// reference members are embedded; members with properties contribute
    /// fields in order. Field-name collisions across members are kept as
    /// distinct fields with an `AllOf{i}` suffix on the later one, never
    /// dropped.
    pub(super) fn synthesize_all_of(
        &mut self,
        schema: &Schema,
        path: &[String],
    ) -> Result<ResolvedSchema, ResolveError> {
        // Degenerate form: a single reference member with no sibling
        // properties collapses to a plain alias of the referent.
        if schema.all_of.len() == 1 && schema.properties.is_empty() {
            if let SchemaOrRef::Ref { .. } = &schema.all_of[0] {
                let mut resolved = self.resolve_node(&schema.all_of[0], path)?;
                resolved.description = schema.description.clone();
                return Ok(resolved);
            }
        }

        let mut properties: Vec<Property> = Vec::new();
        let mut description = schema.description.clone();

        for (i, member) in schema.all_of.iter().enumerate() {
            match member {
                SchemaOrRef::Ref { .. } => {
                    let indirect = self.closes_cycle(member);
                    let resolved = self.resolve_node(member, path)?;
                    let name = resolved
                        .ref_name()
                        .unwrap_or_default()
                        .to_string();
                    properties.push(Property {
                        name: normalize_name(&name),
                        json_name: String::new(),
                        schema: resolved,
                        constraints: Default::default(),
                        embedded: true,
                        sensitive: false,
                        indirect,
                    });
                }
                SchemaOrRef::Schema(member_schema) => {
                    if member_schema.is_metadata_only() {
                        // Annotation-only member: fold its description into
                        // the parent, produce no type.
                        if description.is_none() {
                            description = member_schema.description.clone();
                        }
                        continue;
                    }
                    if !member_schema.all_of.is_empty() {
                        let nested = self.synthesize_all_of(member_schema, path)?;
                        self.splice_member_properties(&mut properties, nested.properties(), i);
                        continue;
                    }
                    // Member-local required list plus the parent's applies
                    // to the member's own properties.
                    let mut required = member_schema.required.clone();
                    required.extend(schema.required.iter().cloned());
                    let member_props =
                        self.resolve_properties(member_schema, path, &required)?;
                    self.splice_member_properties(&mut properties, &member_props, i);
                }
            }
        }

        // Sibling properties declared next to the allOf list merge last.
        if !schema.properties.is_empty() {
            let sibling = self.resolve_properties(schema, path, &schema.required)?;
            let index = schema.all_of.len();
            self.splice_member_properties(&mut properties, &sibling, index);
        }

        Ok(ResolvedSchema {
            shape: TypeShape::Object(properties),
            description,
            ..Default::default()
        })
    }

    fn splice_member_properties(
        &self,
        merged: &mut Vec<Property>,
        incoming: &[Property],
        member_index: usize,
    ) {
        for prop in incoming {
            let mut prop = prop.clone();
            if merged.iter().any(|p| p.name.pascal_case == prop.name.pascal_case) {
                let disambiguated =
                    format!("{}AllOf{member_index}", prop.name.original);
                debug!(
                    "allOf field collision on {}, renaming to {disambiguated}",
                    prop.json_name
                );
                prop.name = normalize_name(&disambiguated);
            }
            merged.push(prop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::components::Components;
    use crate::transform::schema_resolver::SchemaResolver;

    fn components_from_yaml(yaml: &str) -> Components {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    fn union_of(def_schema: &ResolvedSchema) -> &UnionDescriptor {
        match &def_schema.shape {
            TypeShape::Union(u) => u,
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn one_of_single_element_is_passthrough() {
        let components = components_from_yaml(
            r#"
schemas:
  User:
    type: object
    properties:
      name:
        type: string
  Result:
    oneOf:
      - $ref: '#/components/schemas/User'
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let holder = resolver.tracker().lookup_by_name("Result").unwrap();
        let props = holder.schema.properties();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].json_name, UNION_FIELD_JSON_NAME);
        assert_eq!(props[0].schema.ref_name(), Some("ResultOneOf"));
        assert!(holder.needs_marshaler);

        let union = resolver.tracker().lookup_by_name("ResultOneOf").unwrap();
        assert_eq!(union.spec_location, SpecLocation::Union);
        let u = union_of(&union.schema);
        assert_eq!(u.encoding, UnionEncoding::Passthrough);
        assert_eq!(u.elements, vec![UnionElement::Named("User".to_string())]);
    }

    #[test]
    fn one_of_two_elements_is_either() {
        let components = components_from_yaml(
            r#"
schemas:
  User:
    type: object
    properties:
      name:
        type: string
  Result:
    oneOf:
      - $ref: '#/components/schemas/User'
      - type: string
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let union = resolver.tracker().lookup_by_name("ResultOneOf").unwrap();
        let u = union_of(&union.schema);
        assert_eq!(u.encoding, UnionEncoding::Either);
        assert_eq!(
            u.elements,
            vec![
                UnionElement::Named("User".to_string()),
                UnionElement::Primitive("string".to_string()),
            ]
        );
    }

    #[test]
    fn one_of_three_elements_is_raw_dispatch() {
        let components = components_from_yaml(
            r#"
schemas:
  User:
    type: object
    properties:
      name:
        type: string
  Error:
    type: object
    properties:
      message:
        type: string
  Result:
    oneOf:
      - $ref: '#/components/schemas/User'
      - $ref: '#/components/schemas/Error'
      - type: string
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let union = resolver.tracker().lookup_by_name("ResultOneOf").unwrap();
        let u = union_of(&union.schema);
        assert_eq!(u.encoding, UnionEncoding::RawDispatch);
        let names: Vec<&str> = u.elements.iter().map(|e| e.type_name()).collect();
        assert_eq!(names, vec!["User", "Error", "string"]);
    }

    #[test]
    fn inline_union_member_is_promoted() {
        let components = components_from_yaml(
            r#"
schemas:
  Result:
    oneOf:
      - type: object
        properties:
          code:
            type: integer
      - type: string
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let union = resolver.tracker().lookup_by_name("ResultOneOf").unwrap();
        let u = union_of(&union.schema);
        assert_eq!(
            u.elements[0],
            UnionElement::Named("ResultOneOf0".to_string())
        );
        assert!(resolver.tracker().exists("ResultOneOf0"));
    }

    #[test]
    fn discriminator_mapping_resolves_type_names() {
        let components = components_from_yaml(
            r#"
schemas:
  Cat:
    type: object
    properties:
      kind:
        type: string
  Dog:
    type: object
    properties:
      kind:
        type: string
  Pet:
    oneOf:
      - $ref: '#/components/schemas/Cat'
      - $ref: '#/components/schemas/Dog'
    discriminator:
      propertyName: kind
      mapping:
        cat: '#/components/schemas/Cat'
        dog: '#/components/schemas/Dog'
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let union = resolver.tracker().lookup_by_name("PetOneOf").unwrap();
        let u = union_of(&union.schema);
        let d = u.discriminator.as_ref().unwrap();
        assert_eq!(d.property_name, "kind");
        assert_eq!(
            d.mapping,
            vec![
                ("cat".to_string(), "Cat".to_string()),
                ("dog".to_string(), "Dog".to_string()),
            ]
        );
    }

    #[test]
    fn any_of_with_additional_properties_captures_both() {
        let components = components_from_yaml(
            r#"
schemas:
  Email:
    type: object
    properties:
      email:
        type: string
  Sms:
    type: object
    properties:
      phone:
        type: string
  Push:
    type: object
    properties:
      device:
        type: string
  Notification:
    anyOf:
      - $ref: '#/components/schemas/Email'
      - $ref: '#/components/schemas/Sms'
      - $ref: '#/components/schemas/Push'
    additionalProperties:
      type: string
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let holder = resolver.tracker().lookup_by_name("Notification").unwrap();
        assert!(holder.needs_marshaler);
        assert!(holder.schema.additional_properties.is_some());
        assert_eq!(
            holder.schema.properties()[0].schema.ref_name(),
            Some("NotificationAnyOf")
        );

        let union = resolver
            .tracker()
            .lookup_by_name("NotificationAnyOf")
            .unwrap();
        assert_eq!(union_of(&union.schema).encoding, UnionEncoding::RawDispatch);
    }

    #[test]
    fn all_of_metadata_only_member_is_elided() {
        let components = components_from_yaml(
            r#"
schemas:
  CollaborationItem:
    allOf:
      - type: object
        properties:
          id:
            type: string
      - description: annotation only
        x-internal: true
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        // Exactly the composed type, nothing for the annotation member.
        assert_eq!(resolver.tracker().len(), 1);
        let def = resolver
            .tracker()
            .lookup_by_name("CollaborationItem")
            .unwrap();
        assert_eq!(def.schema.properties().len(), 1);
        assert_eq!(def.schema.properties()[0].json_name, "id");
    }

    #[test]
    fn all_of_bare_ref_member_is_embedded() {
        let components = components_from_yaml(
            r#"
schemas:
  Base:
    type: object
    properties:
      id:
        type: string
  Extended:
    allOf:
      - $ref: '#/components/schemas/Base'
      - type: object
        properties:
          extra:
            type: string
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let def = resolver.tracker().lookup_by_name("Extended").unwrap();
        let props = def.schema.properties();
        assert_eq!(props.len(), 2);
        assert!(props[0].embedded);
        assert_eq!(props[0].schema.ref_name(), Some("Base"));
        assert!(!props[1].embedded);
        assert_eq!(props[1].json_name, "extra");
    }

    #[test]
    fn all_of_single_ref_collapses_to_alias() {
        let components = components_from_yaml(
            r#"
schemas:
  Base:
    type: object
    properties:
      id:
        type: string
  Alias:
    allOf:
      - $ref: '#/components/schemas/Base'
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let def = resolver.tracker().lookup_by_name("Alias").unwrap();
        assert_eq!(def.schema.ref_name(), Some("Base"));
        assert!(def.is_alias());
    }

    #[test]
    fn all_of_field_collision_is_disambiguated() {
        let components = components_from_yaml(
            r#"
schemas:
  Merged:
    allOf:
      - type: object
        properties:
          status:
            type: string
      - type: object
        properties:
          status:
            type: integer
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let def = resolver.tracker().lookup_by_name("Merged").unwrap();
        let props = def.schema.properties();
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].name.pascal_case, "Status");
        assert_eq!(props[1].name.pascal_case, "StatusAllOf1");
        // JSON names are preserved on both.
        assert_eq!(props[0].json_name, "status");
        assert_eq!(props[1].json_name, "status");
    }

    #[test]
    fn nested_all_of_is_flattened() {
        let components = components_from_yaml(
            r#"
schemas:
  Deep:
    allOf:
      - allOf:
          - type: object
            properties:
              inner:
                type: string
      - type: object
        properties:
          outer:
            type: string
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let def = resolver.tracker().lookup_by_name("Deep").unwrap();
        let names: Vec<&str> = def
            .schema
            .properties()
            .iter()
            .map(|p| p.json_name.as_str())
            .collect();
        assert_eq!(names, vec!["inner", "outer"]);
    }

    #[test]
    fn parent_required_applies_to_member_properties() {
        let components = components_from_yaml(
            r#"
schemas:
  Combined:
    required: [id]
    allOf:
      - type: object
        properties:
          id:
            type: string
          note:
            type: string
"#,
        );
        let mut resolver = SchemaResolver::new(&components);
        resolver.resolve_components().unwrap();

        let def = resolver.tracker().lookup_by_name("Combined").unwrap();
        let props = def.schema.properties();
        assert!(props[0].constraints.required);
        assert!(!props[1].constraints.required);
    }
}
