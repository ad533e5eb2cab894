use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::GenerateError;
use crate::transform::NamingMode;

/// Code generation customizations, loaded from YAML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Package to generate the code under.
    #[serde(rename = "package")]
    pub package_name: String,

    /// Which output categories to generate.
    pub generate: GenerateOptions,

    #[serde(rename = "output-options")]
    pub output_options: OutputOptions,

    /// Include/exclude rules applied to the document before resolution.
    pub filter: FilterConfig,

    /// Type name to error-message path (`data[].message[]`), compiled
    /// into field access chains for error reporting in generated clients.
    #[serde(rename = "error-mapping")]
    pub error_mapping: IndexMap<String, String>,
}

impl Configuration {
    pub fn from_yaml(input: &str) -> Result<Self, GenerateError> {
        let config: Configuration = serde_yaml_ng::from_str(input)
            .map_err(|e| GenerateError::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.package_name.is_empty() {
            return Err(GenerateError::Config(
                "package name must be specified".to_string(),
            ));
        }
        if !self.output_options.additional_initialisms.is_empty()
            && self.output_options.name_normalizer != NameNormalizerFunction::WithInitialisms
        {
            return Err(GenerateError::Config(
                "additional-initialisms requires name-normalizer: with-initialisms".to_string(),
            ));
        }
        Ok(())
    }

    /// Set reasonable defaults for unset fields.
    pub fn update_defaults(mut self) -> Self {
        if self.generate == GenerateOptions::default() {
            self.generate = GenerateOptions {
                models: true,
                client: false,
            };
        }
        self
    }

    pub fn naming_mode(&self) -> NamingMode {
        match self.output_options.name_normalizer {
            NameNormalizerFunction::Default => NamingMode::Default,
            NameNormalizerFunction::WithInitialisms => NamingMode::WithInitialisms(
                self.output_options.additional_initialisms.clone(),
            ),
        }
    }
}

/// Which supported output categories to generate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GenerateOptions {
    pub models: bool,
    pub client: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Schemas excluded from generation entirely. Ignored when empty.
    #[serde(rename = "exclude-schemas")]
    pub exclude_schemas: Vec<String>,

    /// Suffix used for response type names.
    #[serde(rename = "response-type-suffix")]
    pub response_type_suffix: String,

    #[serde(rename = "name-normalizer")]
    pub name_normalizer: NameNormalizerFunction,

    /// Extra initialisms for the with-initialisms normalizer.
    #[serde(rename = "additional-initialisms")]
    pub additional_initialisms: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameNormalizerFunction {
    #[default]
    Default,
    WithInitialisms,
}

/// Include/exclude rules for pre-resolution document filtering. Empty
/// lists are no-ops.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub include: FilterParams,
    pub exclude: FilterParams,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub tags: Vec<String>,
    #[serde(rename = "operation-ids")]
    pub operation_ids: Vec<String>,
    pub paths: Vec<String>,
    /// Per-schema property name lists; required properties are never
    /// filtered out.
    #[serde(rename = "schema-properties")]
    pub schema_properties: IndexMap<String, Vec<String>>,
    /// Extension keys (`x-*`) on schema extension maps.
    pub extensions: Vec<String>,
}
