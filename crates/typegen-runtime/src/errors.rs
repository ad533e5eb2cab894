use std::fmt;

use serde::Serialize;

/// One validation failure on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} {}", self.field, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A collection of validation failures, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(ValidationError::new(field, message));
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Fold another check's outcome into the collection, prefixing field
    /// names with `prefix` unless already carried.
    pub fn extend_prefixed(&mut self, prefix: &str, other: ValidationErrors) {
        for mut error in other.0 {
            if !prefix.is_empty() && !error.field.is_empty() {
                if !error.field.starts_with(&format!("{prefix}.")) && error.field != prefix {
                    error.field = format!("{prefix}.{}", error.field);
                }
            } else if !prefix.is_empty() {
                error.field = prefix.to_string();
            }
            self.0.push(error);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// `Ok(())` when no failure was recorded, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.0.iter().map(ValidationError::to_string).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

impl std::error::Error for ValidationErrors {}

/// Check a required field is present.
pub fn check_required<T>(field: &str, value: Option<&T>) -> Option<ValidationError> {
    match value {
        Some(_) => None,
        None => Some(ValidationError::new(field, "is required")),
    }
}

/// Check an array's minimum element count, reporting both the limit and
/// the observed count.
pub fn check_min_items(field: &str, min: usize, len: usize) -> Option<ValidationError> {
    if len < min {
        Some(ValidationError::new(
            field,
            format!("Array must have at least {min} items, got {len}"),
        ))
    } else {
        None
    }
}

/// Check a value is one of the declared enum literals. Everything not
/// enumerated is rejected, including same-shaped values.
pub fn check_enum<T: PartialEq + fmt::Display>(
    field: &str,
    value: &T,
    allowed: &[T],
) -> Option<ValidationError> {
    if allowed.contains(value) {
        None
    } else {
        Some(ValidationError::new(
            field,
            format!("must be one of the declared values, got {value}"),
        ))
    }
}

/// Human-readable message for one constraint tag, matching the tag
/// vocabulary emitted by the generator (`gt=5`, `min=2`, ...).
pub fn tag_message(tag: &str, param: &str) -> String {
    match tag {
        "required" => "is required".to_string(),
        "gt" => format!("must be greater than {param}"),
        "gte" => format!("must be greater than or equal to {param}"),
        "lt" => format!("must be less than {param}"),
        "lte" => format!("must be less than or equal to {param}"),
        "min" => format!("length must be greater than or equal to {param}"),
        "max" => format!("length must be less than or equal to {param}"),
        other => format!("is not valid ({other})"),
    }
}
