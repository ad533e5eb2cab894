use crate::parse::schema::{ExclusiveBound, Schema, SchemaType};

/// Context a property is resolved in: the property name (for required
/// lookup against the parent), whether a sibling `"null"` type entry was
/// seen, and a required override for call sites that already know.
#[derive(Debug, Clone, Default)]
pub struct ConstraintsContext<'a> {
    pub name: &'a str,
    pub has_nil_type: bool,
    pub required: bool,
}

/// Normalized validation constraints derived from a schema node.
/// Equality is structural.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Constraints {
    pub required: bool,
    pub nullable: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_items: Option<u64>,
    pub validation_tags: Vec<String>,
}

/// Derive constraints for one schema occurrence.
///
/// Required wins over optionality-implied nullability: a required field
/// is only nullable when the schema says so explicitly (or a sibling
/// null type is present). An optional field defaults to nullable.
pub fn resolve_constraints(schema: &Schema, ctx: ConstraintsContext<'_>) -> Constraints {
    let is_int = schema
        .schema_type
        .as_ref()
        .is_some_and(|t| t.contains(SchemaType::Integer));
    let is_float = schema
        .schema_type
        .as_ref()
        .is_some_and(|t| t.contains(SchemaType::Number));

    let required =
        ctx.required || (!ctx.name.is_empty() && schema.required.iter().any(|r| r == ctx.name));

    let nullable = if !required || ctx.has_nil_type {
        true
    } else {
        schema.nullable.unwrap_or(false)
    };

    let mut tags: Vec<String> = Vec::new();
    if required {
        tags.push("required".to_string());
    } else if nullable {
        tags.push("omitempty".to_string());
    }

    let mut min = None;
    if let Some(stated) = schema.minimum {
        let (tag, value) = match schema.exclusive_minimum {
            Some(ExclusiveBound::Flag(true)) => ("gt", stated),
            Some(ExclusiveBound::Value(v)) => ("gt", v),
            _ => ("gte", stated),
        };
        min = Some(value);
        if is_int {
            tags.push(format!("{tag}={}", value as i64));
        } else if is_float {
            tags.push(format!("{tag}={value}"));
        }
    }

    let mut max = None;
    if let Some(stated) = schema.maximum {
        let (tag, value) = match schema.exclusive_maximum {
            Some(ExclusiveBound::Flag(true)) => ("lt", stated),
            Some(ExclusiveBound::Value(v)) => ("lt", v),
            _ => ("lte", stated),
        };
        max = Some(value);
        if is_int {
            tags.push(format!("{tag}={}", value as i64));
        } else if is_float {
            tags.push(format!("{tag}={value}"));
        }
    }

    if let Some(n) = schema.min_length {
        tags.push(format!("min={n}"));
    }
    if let Some(n) = schema.max_length {
        tags.push(format!("max={n}"));
    }

    // A no-op constraint is not worth tagging.
    if tags.len() == 1 && tags[0] == "omitempty" {
        tags.clear();
    }

    tags.sort_by(|a, b| tag_priority(a).cmp(&tag_priority(b)).then(a.cmp(b)));

    Constraints {
        required,
        nullable,
        read_only: schema.read_only.unwrap_or(false),
        write_only: schema.write_only.unwrap_or(false),
        min_length: schema.min_length,
        max_length: schema.max_length,
        min,
        max,
        min_items: schema.min_items,
        validation_tags: tags,
    }
}

fn tag_priority(tag: &str) -> u8 {
    match tag {
        "required" => 0,
        "omitempty" => 1,
        _ => 2,
    }
}
