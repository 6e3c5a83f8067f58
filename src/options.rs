//! Generator options and presets.
//!
//! Options are plain flags. Some of them override others; that precedence
//! is applied exactly once, in [`OptionSet::resolve`], so the rest of the
//! crate only ever asks "is this option on?".

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Individual generator flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorOption {
    /// Write `$schema` into the root document.
    SchemaVersionIndicator,
    /// Fixed schemas for date/time, `UUID`, `URI` and similar types.
    AdditionalFixedTypes,
    SimplifiedEnums,
    /// Enums as `{type: string, enum: [...]}`; overrides `SimplifiedEnums`.
    FlattenedEnums,
    SimplifiedOptionals,
    /// `Optional<T>` as nullable `T`; overrides `SimplifiedOptionals`.
    FlattenedOptionals,
    FlattenedSuppliers,
    ValuesFromConstantFields,
    PublicStaticFields,
    PublicNonStaticFields,
    NonPublicStaticFields,
    NonPublicNonStaticFieldsWithGetters,
    NonPublicNonStaticFieldsWithoutGetters,
    TransientFields,
    StaticMethods,
    VoidMethods,
    GetterMethods,
    NonStaticNonVoidNonGetterMethods,
    NullableFieldsByDefault,
    NullableMethodReturnValuesByDefault,
    NullableArrayItemsAllowed,
    FieldsDerivedFromArgumentFreeMethods,
    MapValuesAsAdditionalProperties,
    EnumKeywordForSingleValues,
    ForbiddenAdditionalPropertiesByDefault,
    /// Every referenced type gets a shared definition.
    DefinitionsForAllObjects,
    /// The root document becomes a pointer to the main type's definition.
    DefinitionForMainSchema,
    /// Self-references to the main type point at `#` instead of a definition.
    MainSchemaRootPointer,
    /// Never create shared definitions; circular types fail.
    InlineAllSchemas,
    /// Restrict definition keys to `[a-zA-Z0-9.\-_]`.
    PlainDefinitionKeys,
    AllOfCleanupAtTheEnd,
    DuplicateMemberAttributeCleanupAtTheEnd,
    StrictTypeInfo,
}

impl GeneratorOption {
    pub const ALL: &'static [GeneratorOption] = &[
        GeneratorOption::SchemaVersionIndicator,
        GeneratorOption::AdditionalFixedTypes,
        GeneratorOption::SimplifiedEnums,
        GeneratorOption::FlattenedEnums,
        GeneratorOption::SimplifiedOptionals,
        GeneratorOption::FlattenedOptionals,
        GeneratorOption::FlattenedSuppliers,
        GeneratorOption::ValuesFromConstantFields,
        GeneratorOption::PublicStaticFields,
        GeneratorOption::PublicNonStaticFields,
        GeneratorOption::NonPublicStaticFields,
        GeneratorOption::NonPublicNonStaticFieldsWithGetters,
        GeneratorOption::NonPublicNonStaticFieldsWithoutGetters,
        GeneratorOption::TransientFields,
        GeneratorOption::StaticMethods,
        GeneratorOption::VoidMethods,
        GeneratorOption::GetterMethods,
        GeneratorOption::NonStaticNonVoidNonGetterMethods,
        GeneratorOption::NullableFieldsByDefault,
        GeneratorOption::NullableMethodReturnValuesByDefault,
        GeneratorOption::NullableArrayItemsAllowed,
        GeneratorOption::FieldsDerivedFromArgumentFreeMethods,
        GeneratorOption::MapValuesAsAdditionalProperties,
        GeneratorOption::EnumKeywordForSingleValues,
        GeneratorOption::ForbiddenAdditionalPropertiesByDefault,
        GeneratorOption::DefinitionsForAllObjects,
        GeneratorOption::DefinitionForMainSchema,
        GeneratorOption::MainSchemaRootPointer,
        GeneratorOption::InlineAllSchemas,
        GeneratorOption::PlainDefinitionKeys,
        GeneratorOption::AllOfCleanupAtTheEnd,
        GeneratorOption::DuplicateMemberAttributeCleanupAtTheEnd,
        GeneratorOption::StrictTypeInfo,
    ];

    /// Options that are switched off whenever this one is on.
    pub fn overridden_options(&self) -> &'static [GeneratorOption] {
        match self {
            GeneratorOption::FlattenedEnums => &[GeneratorOption::SimplifiedEnums],
            GeneratorOption::FlattenedOptionals => &[GeneratorOption::SimplifiedOptionals],
            GeneratorOption::InlineAllSchemas => &[
                GeneratorOption::DefinitionsForAllObjects,
                GeneratorOption::DefinitionForMainSchema,
                GeneratorOption::MainSchemaRootPointer,
            ],
            GeneratorOption::DefinitionForMainSchema => &[GeneratorOption::MainSchemaRootPointer],
            _ => &[],
        }
    }

    /// Kebab-case name as used on the command line and in settings files.
    pub fn name(&self) -> String {
        let mut out = String::new();
        for (i, c) in format!("{self:?}").chars().enumerate() {
            if c.is_uppercase() {
                if i > 0 {
                    out.push('-');
                }
                out.extend(c.to_lowercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for GeneratorOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for GeneratorOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        GeneratorOption::ALL
            .iter()
            .copied()
            .find(|option| option.name() == wanted)
            .ok_or_else(|| format!("unknown option \"{s}\""))
    }
}

/// Named default selections of options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionPreset {
    /// Everything a type exposes, documented as thoroughly as possible.
    FullDocumentation,
    /// The shape of the type's JSON representation.
    #[default]
    PlainJson,
    /// Public API surface of an object, including methods.
    JavaObject,
}

impl OptionPreset {
    pub fn enabled_by_default(&self) -> &'static [GeneratorOption] {
        use GeneratorOption::*;
        match self {
            OptionPreset::FullDocumentation => &[
                ValuesFromConstantFields,
                PublicStaticFields,
                PublicNonStaticFields,
                NonPublicStaticFields,
                NonPublicNonStaticFieldsWithGetters,
                NonPublicNonStaticFieldsWithoutGetters,
                TransientFields,
                StaticMethods,
                VoidMethods,
                GetterMethods,
                NonStaticNonVoidNonGetterMethods,
                SimplifiedEnums,
                SimplifiedOptionals,
                DefinitionsForAllObjects,
                NullableFieldsByDefault,
                NullableMethodReturnValuesByDefault,
                AllOfCleanupAtTheEnd,
            ],
            OptionPreset::PlainJson => &[
                SchemaVersionIndicator,
                AdditionalFixedTypes,
                FlattenedEnums,
                FlattenedOptionals,
                FlattenedSuppliers,
                ValuesFromConstantFields,
                PublicNonStaticFields,
                NonPublicNonStaticFieldsWithGetters,
                NonPublicNonStaticFieldsWithoutGetters,
                AllOfCleanupAtTheEnd,
            ],
            OptionPreset::JavaObject => &[
                ValuesFromConstantFields,
                PublicStaticFields,
                PublicNonStaticFields,
                StaticMethods,
                VoidMethods,
                GetterMethods,
                NonStaticNonVoidNonGetterMethods,
                SimplifiedEnums,
                SimplifiedOptionals,
                AllOfCleanupAtTheEnd,
            ],
        }
    }
}

impl FromStr for OptionPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "full-documentation" => Ok(OptionPreset::FullDocumentation),
            "plain-json" => Ok(OptionPreset::PlainJson),
            "java-object" => Ok(OptionPreset::JavaObject),
            other => Err(format!(
                "unknown preset \"{other}\": expected full-documentation, plain-json or java-object"
            )),
        }
    }
}

/// The effective set of enabled options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    enabled: BTreeSet<GeneratorOption>,
}

impl OptionSet {
    /// Combine a preset with explicit choices and apply override precedence.
    ///
    /// Explicit choices beat the preset; an explicit `without` beats an
    /// explicit `with`. Afterwards every option overridden by an enabled,
    /// not itself overridden, option is switched off.
    pub fn resolve(
        preset: OptionPreset,
        with: &[GeneratorOption],
        without: &[GeneratorOption],
    ) -> Self {
        let mut enabled: BTreeSet<GeneratorOption> =
            preset.enabled_by_default().iter().copied().collect();
        enabled.extend(with.iter().copied());
        for option in without {
            enabled.remove(option);
        }
        let overridden = overridden_by(&enabled, GeneratorOption::overridden_options);
        for option in &overridden {
            enabled.remove(option);
        }
        Self { enabled }
    }

    pub fn is_enabled(&self, option: GeneratorOption) -> bool {
        self.enabled.contains(&option)
    }

    pub fn iter(&self) -> impl Iterator<Item = GeneratorOption> + '_ {
        self.enabled.iter().copied()
    }
}

/// Options switched off by `enabled`, where an option that is itself
/// switched off overrides nothing.
fn overridden_by(
    enabled: &BTreeSet<GeneratorOption>,
    overrides: impl Fn(&GeneratorOption) -> &'static [GeneratorOption],
) -> BTreeSet<GeneratorOption> {
    let mut overridden = BTreeSet::new();
    // the override relation is acyclic, so this settles
    loop {
        let next: BTreeSet<GeneratorOption> = enabled
            .iter()
            .filter(|option| !overridden.contains(*option))
            .flat_map(|option| overrides(option).iter().copied())
            .collect();
        if next == overridden {
            return overridden;
        }
        overridden = next;
    }
}
