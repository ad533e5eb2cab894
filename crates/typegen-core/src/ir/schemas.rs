use serde_json::Value;

use super::types::NormalizedName;
use crate::transform::Constraints;

/// The resolved type descriptor attached to every definition, property
/// and parameter. This is the semantic output of the schema resolver;
/// the rendering layer turns it into source text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedSchema {
    pub shape: TypeShape,
    pub constraints: Constraints,
    pub description: Option<String>,
    /// Captured `additionalProperties` value type, when the object is
    /// open. `None` means additional keys are not modeled.
    pub additional_properties: Option<Box<ResolvedSchema>>,
    /// Whether the definition can be emitted as a plain alias
    /// (`type Foo = Bar`) rather than a struct wrapper.
    pub define_via_alias: bool,
}

impl ResolvedSchema {
    pub fn scalar(kind: ScalarKind) -> Self {
        ResolvedSchema {
            shape: TypeShape::Scalar(kind),
            define_via_alias: true,
            ..Default::default()
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        ResolvedSchema {
            shape: TypeShape::Named(name.into()),
            define_via_alias: true,
            ..Default::default()
        }
    }

    /// The referenced type name, when this schema is a bare reference.
    pub fn ref_name(&self) -> Option<&str> {
        match &self.shape {
            TypeShape::Named(name) => Some(name),
            _ => None,
        }
    }

    pub fn properties(&self) -> &[Property] {
        match &self.shape {
            TypeShape::Object(props) => props,
            _ => &[],
        }
    }

    /// Union types and open objects with a union holder need generated
    /// marshal/unmarshal code instead of plain derive.
    pub fn needs_marshaler(&self) -> bool {
        match &self.shape {
            TypeShape::Union(_) => true,
            TypeShape::Object(props) => {
                self.additional_properties.is_some()
                    || props.iter().any(|p| p.json_name == "-")
            }
            _ => false,
        }
    }

    /// A short primitive spelling for union element bookkeeping, when the
    /// shape is a plain scalar.
    pub fn primitive_name(&self) -> Option<&'static str> {
        match &self.shape {
            TypeShape::Scalar(k) => Some(k.primitive_name()),
            _ => None,
        }
    }
}

/// The structural kind of a resolved schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TypeShape {
    /// No usable type information; renders as a dynamic value.
    #[default]
    Any,
    Scalar(ScalarKind),
    /// Reference to another named type definition.
    Named(String),
    Array(Box<ResolvedSchema>),
    /// Open object with only additional properties: string key to T.
    Map(Box<ResolvedSchema>),
    Object(Vec<Property>),
    Enum(EnumDef),
    Union(UnionDescriptor),
}

/// Primitive scalar kinds, after format resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Integer,
    Number,
    Boolean,
    DateTime,
    Binary,
}

impl ScalarKind {
    pub fn primitive_name(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Number => "number",
            ScalarKind::Boolean => "boolean",
            ScalarKind::DateTime => "date-time",
            ScalarKind::Binary => "binary",
        }
    }
}

/// One field of an object type, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: NormalizedName,
    pub json_name: String,
    pub schema: ResolvedSchema,
    pub constraints: Constraints,
    /// Bare `allOf` reference member folded into the struct as an
    /// embedded field rather than a named one.
    pub embedded: bool,
    /// Marked via the `x-sensitive` extension; propagates to the owning
    /// definition's `has_sensitive_data`.
    pub sensitive: bool,
    /// Set when this property closes a reference cycle and must be held
    /// through indirection (pointer/option) rather than inline.
    pub indirect: bool,
}

/// A resolved enum: base representation plus named constants.
///
/// The base kind follows the literal values, not the declared `type`:
/// a schema declared `integer` with string literals resolves to string.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub base: ScalarKind,
    pub values: Vec<EnumValue>,
}

/// One enum constant: the generated identifier and its literal.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub name: String,
    pub literal: Value,
}

/// How a union's JSON encode/decode is generated, decided purely by
/// branch cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionEncoding {
    /// Single element: marker type wrapping one optional reference.
    Passthrough,
    /// Two elements: try-A-then-B binary container.
    Either,
    /// Three or more: raw capture with lazy per-variant accessors.
    RawDispatch,
}

/// One branch of a oneOf/anyOf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnionElement {
    /// Reference to a named type definition.
    Named(String),
    /// Inline primitive, identified by its scalar spelling.
    Primitive(String),
}

impl UnionElement {
    pub fn type_name(&self) -> &str {
        match self {
            UnionElement::Named(n) => n,
            UnionElement::Primitive(p) => p,
        }
    }
}

/// A synthesized oneOf/anyOf union type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDescriptor {
    pub elements: Vec<UnionElement>,
    pub encoding: UnionEncoding,
    pub discriminator: Option<DiscriminatorInfo>,
}

/// Discriminator metadata carried through for renderers that tag
/// serialized branches.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatorInfo {
    pub property_name: String,
    /// Discriminator value to resolved type name.
    pub mapping: Vec<(String, String)>,
}
