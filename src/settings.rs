//! TOML settings file for the command line.
//!
//! ```toml
//! schema_version = "draft-07"
//! preset = "plain-json"
//! with = ["nullable-fields-by-default", "forbidden-additional-properties-by-default"]
//! without = ["schema-version-indicator"]
//! annotations = true
//! definition_path = "components/schemas"
//! ```
//!
//! Every key is optional. Command-line flags are merged on top of the file
//! with [`GeneratorSettings::merge`].

use std::path::Path;

use serde::Deserialize;

use crate::config::ConfigBuilder;
use crate::error::CatalogError;
use crate::keyword::{SchemaKeyword, SchemaVersion};
use crate::loader::read_file;
use crate::modules::AnnotationModule;
use crate::options::{GeneratorOption, OptionPreset};

/// Generator settings as read from a settings file or the command line.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSettings {
    pub schema_version: Option<SchemaVersion>,
    pub preset: Option<OptionPreset>,
    pub with: Vec<GeneratorOption>,
    pub without: Vec<GeneratorOption>,
    /// Read schema attributes from catalog annotations.
    pub annotations: bool,
    /// Where multi-type definitions will be placed, e.g. `components/schemas`.
    pub definition_path: Option<String>,
}

impl GeneratorSettings {
    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::FileNotFound` or `CatalogError::ReadError` if
    /// the file cannot be read, `CatalogError::InvalidToml` if it isn't valid.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = read_file(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidToml` for syntax errors, unknown keys
    /// and unknown option names.
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        toml::from_str(content).map_err(|source| CatalogError::InvalidToml { source })
    }

    /// Apply `overrides` on top of these settings.
    ///
    /// Scalar values in `overrides` replace ours; option lists are appended,
    /// so a later `without` still beats an earlier `with`.
    pub fn merge(&mut self, overrides: GeneratorSettings) {
        if overrides.schema_version.is_some() {
            self.schema_version = overrides.schema_version;
        }
        if overrides.preset.is_some() {
            self.preset = overrides.preset;
        }
        for option in overrides.with {
            self.without.retain(|o| *o != option);
            self.with.push(option);
        }
        for option in overrides.without {
            self.with.retain(|o| *o != option);
            self.without.push(option);
        }
        self.annotations |= overrides.annotations;
        if overrides.definition_path.is_some() {
            self.definition_path = overrides.definition_path;
        }
    }

    pub fn version(&self) -> SchemaVersion {
        self.schema_version.unwrap_or_default()
    }

    /// The configured definition path, or the version's definitions keyword.
    pub fn definition_path(&self) -> String {
        match &self.definition_path {
            Some(path) => path.trim_matches('/').to_string(),
            None => self.version().keyword(SchemaKeyword::Definitions).to_string(),
        }
    }

    /// A configuration builder reflecting these settings.
    pub fn config_builder(&self) -> ConfigBuilder {
        let mut builder = ConfigBuilder::new(self.version(), self.preset.unwrap_or_default());
        for option in &self.with {
            builder.with(*option);
        }
        for option in &self.without {
            builder.without(*option);
        }
        if self.annotations {
            builder.with_module(AnnotationModule);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_full_settings() {
        let settings = GeneratorSettings::from_toml_str(
            r#"
            schema_version = "draft-07"
            preset = "java-object"
            with = ["nullable-fields-by-default"]
            without = ["schema-version-indicator"]
            annotations = true
            definition_path = "/components/schemas/"
            "#,
        )
        .unwrap();
        assert_eq!(settings.version(), SchemaVersion::Draft7);
        assert_eq!(settings.preset, Some(OptionPreset::JavaObject));
        assert_eq!(settings.with, vec![GeneratorOption::NullableFieldsByDefault]);
        assert!(settings.annotations);
        assert_eq!(settings.definition_path(), "components/schemas");

        let config = settings.config_builder().build();
        assert!(config.is_enabled(GeneratorOption::NullableFieldsByDefault));
        assert!(!config.should_include_schema_version_indicator());
    }

    #[test]
    fn empty_settings_use_defaults() {
        let settings = GeneratorSettings::from_toml_str("").unwrap();
        assert_eq!(settings, GeneratorSettings::default());
        assert_eq!(settings.version(), SchemaVersion::Draft2020_12);
        assert_eq!(settings.definition_path(), "$defs");
    }

    #[test]
    fn unknown_option_is_rejected() {
        let err = GeneratorSettings::from_toml_str(r#"with = ["everything"]"#).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidToml { .. }));
        assert_eq!(err.exit_code(), 2);

        let err = GeneratorSettings::from_toml_str("colour = true").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidToml { .. }));
    }

    #[test]
    fn command_line_overrides_file() {
        let mut settings = GeneratorSettings {
            schema_version: Some(SchemaVersion::Draft6),
            with: vec![GeneratorOption::StrictTypeInfo],
            ..Default::default()
        };
        settings.merge(GeneratorSettings {
            schema_version: Some(SchemaVersion::Draft2019_09),
            without: vec![GeneratorOption::StrictTypeInfo],
            ..Default::default()
        });
        assert_eq!(settings.version(), SchemaVersion::Draft2019_09);
        assert!(settings.with.is_empty());
        assert_eq!(settings.without, vec![GeneratorOption::StrictTypeInfo]);
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "preset = \"full-documentation\"").unwrap();
        let settings = GeneratorSettings::load(file.path()).unwrap();
        assert_eq!(settings.preset, Some(OptionPreset::FullDocumentation));

        let err = GeneratorSettings::load(Path::new("/no/such/settings.toml")).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
