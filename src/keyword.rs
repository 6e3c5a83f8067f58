//! Version-indexed JSON Schema vocabulary.
//!
//! Every keyword the generator writes is looked up here, so that the literal
//! strings follow the targeted draft (`definitions` vs. `$defs` and so on).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Targeted JSON Schema draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchemaVersion {
    #[serde(rename = "draft-06")]
    Draft6,
    #[serde(rename = "draft-07")]
    Draft7,
    #[serde(rename = "draft-2019-09")]
    Draft2019_09,
    #[default]
    #[serde(rename = "draft-2020-12")]
    Draft2020_12,
}

impl SchemaVersion {
    /// The `$schema` URI identifying this draft.
    pub fn identifier(&self) -> &'static str {
        match self {
            SchemaVersion::Draft6 => "http://json-schema.org/draft-06/schema#",
            SchemaVersion::Draft7 => "http://json-schema.org/draft-07/schema#",
            SchemaVersion::Draft2019_09 => "https://json-schema.org/draft/2019-09/schema",
            SchemaVersion::Draft2020_12 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    /// Drafts before 2019-09 ignore every sibling of a `$ref`.
    pub fn is_ref_exclusive(&self) -> bool {
        matches!(self, SchemaVersion::Draft6 | SchemaVersion::Draft7)
    }

    /// Returns the literal string for `keyword` in this draft.
    pub fn keyword(&self, keyword: SchemaKeyword) -> &'static str {
        keyword.for_version(*self)
    }

    /// Pointer prefix for entries of the definitions container, e.g. `#/$defs/`.
    pub fn definitions_prefix(&self) -> String {
        format!("#/{}/", self.keyword(SchemaKeyword::Definitions))
    }

    fn cli_name(&self) -> &'static str {
        match self {
            SchemaVersion::Draft6 => "draft-06",
            SchemaVersion::Draft7 => "draft-07",
            SchemaVersion::Draft2019_09 => "draft-2019-09",
            SchemaVersion::Draft2020_12 => "draft-2020-12",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft-06" | "draft6" | "6" => Ok(SchemaVersion::Draft6),
            "draft-07" | "draft7" | "7" => Ok(SchemaVersion::Draft7),
            "draft-2019-09" | "2019-09" => Ok(SchemaVersion::Draft2019_09),
            "draft-2020-12" | "2020-12" => Ok(SchemaVersion::Draft2020_12),
            other => Err(format!(
                "unknown schema version \"{other}\": expected draft-06, draft-07, draft-2019-09 or draft-2020-12"
            )),
        }
    }
}

/// Values of the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchemaType {
    Null,
    Array,
    Object,
    Boolean,
    String,
    Integer,
    Number,
}

impl SchemaType {
    pub const ALL: [SchemaType; 7] = [
        SchemaType::Null,
        SchemaType::Array,
        SchemaType::Object,
        SchemaType::Boolean,
        SchemaType::String,
        SchemaType::Integer,
        SchemaType::Number,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Null => "null",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
            SchemaType::Boolean => "boolean",
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

/// What a keyword's value holds, so that sub-schemas can be walked generically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagContent {
    /// A single sub-schema.
    Schema,
    /// An array of sub-schemas.
    ArrayOfSchemas,
    /// An object whose values are sub-schemas.
    NamedSchemas,
    /// Anything else.
    NonSchema,
}

/// Logical schema keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKeyword {
    Schema,
    Id,
    Anchor,
    Definitions,
    Ref,
    RefMain,
    Type,
    Properties,
    UnevaluatedProperties,
    Items,
    PrefixItems,
    UnevaluatedItems,
    Required,
    DependentSchemas,
    DependentRequired,
    AdditionalProperties,
    PatternProperties,
    MinProperties,
    MaxProperties,
    AllOf,
    AnyOf,
    OneOf,
    Not,
    Title,
    Description,
    Const,
    Enum,
    Default,
    ReadOnly,
    WriteOnly,
    MinLength,
    MaxLength,
    Format,
    Pattern,
    Minimum,
    ExclusiveMinimum,
    Maximum,
    ExclusiveMaximum,
    MultipleOf,
    MinItems,
    MaxItems,
    UniqueItems,
    If,
    Then,
    Else,
}

const OBJECT: &[SchemaType] = &[SchemaType::Object];
const ARRAY: &[SchemaType] = &[SchemaType::Array];
const STRING: &[SchemaType] = &[SchemaType::String];
const NUMERIC: &[SchemaType] = &[SchemaType::Integer, SchemaType::Number];

impl SchemaKeyword {
    /// All keywords in declaration order; reverse lookups prefer earlier entries.
    pub const ALL: &'static [SchemaKeyword] = &[
        SchemaKeyword::Schema,
        SchemaKeyword::Id,
        SchemaKeyword::Anchor,
        SchemaKeyword::Definitions,
        SchemaKeyword::Ref,
        SchemaKeyword::RefMain,
        SchemaKeyword::Type,
        SchemaKeyword::Properties,
        SchemaKeyword::UnevaluatedProperties,
        SchemaKeyword::Items,
        SchemaKeyword::PrefixItems,
        SchemaKeyword::UnevaluatedItems,
        SchemaKeyword::Required,
        SchemaKeyword::DependentSchemas,
        SchemaKeyword::DependentRequired,
        SchemaKeyword::AdditionalProperties,
        SchemaKeyword::PatternProperties,
        SchemaKeyword::MinProperties,
        SchemaKeyword::MaxProperties,
        SchemaKeyword::AllOf,
        SchemaKeyword::AnyOf,
        SchemaKeyword::OneOf,
        SchemaKeyword::Not,
        SchemaKeyword::Title,
        SchemaKeyword::Description,
        SchemaKeyword::Const,
        SchemaKeyword::Enum,
        SchemaKeyword::Default,
        SchemaKeyword::ReadOnly,
        SchemaKeyword::WriteOnly,
        SchemaKeyword::MinLength,
        SchemaKeyword::MaxLength,
        SchemaKeyword::Format,
        SchemaKeyword::Pattern,
        SchemaKeyword::Minimum,
        SchemaKeyword::ExclusiveMinimum,
        SchemaKeyword::Maximum,
        SchemaKeyword::ExclusiveMaximum,
        SchemaKeyword::MultipleOf,
        SchemaKeyword::MinItems,
        SchemaKeyword::MaxItems,
        SchemaKeyword::UniqueItems,
        SchemaKeyword::If,
        SchemaKeyword::Then,
        SchemaKeyword::Else,
    ];

    /// Returns the literal keyword string in the given draft.
    pub fn for_version(&self, version: SchemaVersion) -> &'static str {
        let legacy = version.is_ref_exclusive();
        match self {
            SchemaKeyword::Schema => "$schema",
            SchemaKeyword::Id => "$id",
            SchemaKeyword::Anchor => "$anchor",
            SchemaKeyword::Definitions if legacy => "definitions",
            SchemaKeyword::Definitions => "$defs",
            SchemaKeyword::Ref => "$ref",
            SchemaKeyword::RefMain => "#",
            SchemaKeyword::Type => "type",
            SchemaKeyword::Properties => "properties",
            SchemaKeyword::UnevaluatedProperties => "unevaluatedProperties",
            SchemaKeyword::Items => "items",
            SchemaKeyword::PrefixItems if legacy => "items",
            SchemaKeyword::PrefixItems => "prefixItems",
            SchemaKeyword::UnevaluatedItems => "unevaluatedItems",
            SchemaKeyword::Required => "required",
            SchemaKeyword::DependentSchemas if legacy => "dependencies",
            SchemaKeyword::DependentSchemas => "dependentSchemas",
            SchemaKeyword::DependentRequired if legacy => "dependencies",
            SchemaKeyword::DependentRequired => "dependentRequired",
            SchemaKeyword::AdditionalProperties => "additionalProperties",
            SchemaKeyword::PatternProperties => "patternProperties",
            SchemaKeyword::MinProperties => "minProperties",
            SchemaKeyword::MaxProperties => "maxProperties",
            SchemaKeyword::AllOf => "allOf",
            SchemaKeyword::AnyOf => "anyOf",
            SchemaKeyword::OneOf => "oneOf",
            SchemaKeyword::Not => "not",
            SchemaKeyword::Title => "title",
            SchemaKeyword::Description => "description",
            SchemaKeyword::Const => "const",
            SchemaKeyword::Enum => "enum",
            SchemaKeyword::Default => "default",
            SchemaKeyword::ReadOnly => "readOnly",
            SchemaKeyword::WriteOnly => "writeOnly",
            SchemaKeyword::MinLength => "minLength",
            SchemaKeyword::MaxLength => "maxLength",
            SchemaKeyword::Format => "format",
            SchemaKeyword::Pattern => "pattern",
            SchemaKeyword::Minimum => "minimum",
            SchemaKeyword::ExclusiveMinimum => "exclusiveMinimum",
            SchemaKeyword::Maximum => "maximum",
            SchemaKeyword::ExclusiveMaximum => "exclusiveMaximum",
            SchemaKeyword::MultipleOf => "multipleOf",
            SchemaKeyword::MinItems => "minItems",
            SchemaKeyword::MaxItems => "maxItems",
            SchemaKeyword::UniqueItems => "uniqueItems",
            SchemaKeyword::If => "if",
            SchemaKeyword::Then => "then",
            SchemaKeyword::Else => "else",
        }
    }

    /// Types a schema is implicitly restricted to when it carries this keyword.
    pub fn implied_types(&self) -> &'static [SchemaType] {
        match self {
            SchemaKeyword::Properties
            | SchemaKeyword::UnevaluatedProperties
            | SchemaKeyword::Required
            | SchemaKeyword::DependentSchemas
            | SchemaKeyword::DependentRequired
            | SchemaKeyword::AdditionalProperties
            | SchemaKeyword::PatternProperties
            | SchemaKeyword::MinProperties
            | SchemaKeyword::MaxProperties => OBJECT,
            SchemaKeyword::Items
            | SchemaKeyword::PrefixItems
            | SchemaKeyword::UnevaluatedItems
            | SchemaKeyword::MinItems
            | SchemaKeyword::MaxItems
            | SchemaKeyword::UniqueItems => ARRAY,
            SchemaKeyword::MinLength
            | SchemaKeyword::MaxLength
            | SchemaKeyword::Format
            | SchemaKeyword::Pattern => STRING,
            SchemaKeyword::Minimum
            | SchemaKeyword::ExclusiveMinimum
            | SchemaKeyword::Maximum
            | SchemaKeyword::ExclusiveMaximum
            | SchemaKeyword::MultipleOf => NUMERIC,
            _ => &[],
        }
    }

    /// What kind of value this keyword holds.
    pub fn contents(&self) -> &'static [TagContent] {
        match self {
            SchemaKeyword::Definitions
            | SchemaKeyword::Properties
            | SchemaKeyword::PatternProperties
            | SchemaKeyword::DependentSchemas => &[TagContent::NamedSchemas],
            SchemaKeyword::Items => &[TagContent::Schema, TagContent::ArrayOfSchemas],
            SchemaKeyword::PrefixItems
            | SchemaKeyword::AllOf
            | SchemaKeyword::AnyOf
            | SchemaKeyword::OneOf => &[TagContent::ArrayOfSchemas],
            SchemaKeyword::UnevaluatedProperties
            | SchemaKeyword::UnevaluatedItems
            | SchemaKeyword::AdditionalProperties
            | SchemaKeyword::Not
            | SchemaKeyword::If
            | SchemaKeyword::Then
            | SchemaKeyword::Else => &[TagContent::Schema],
            _ => &[TagContent::NonSchema],
        }
    }

    /// Reverse lookup of a literal keyword string in the given draft.
    ///
    /// When two keywords share a literal (e.g. `dependencies` in draft 7),
    /// the one declared first wins.
    pub fn for_tag(tag: &str, version: SchemaVersion) -> Option<SchemaKeyword> {
        Self::ALL
            .iter()
            .copied()
            .filter(|k| *k != SchemaKeyword::RefMain)
            .find(|k| k.for_version(version) == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_keyword_depends_on_version() {
        assert_eq!(
            SchemaVersion::Draft7.keyword(SchemaKeyword::Definitions),
            "definitions"
        );
        assert_eq!(
            SchemaVersion::Draft2019_09.keyword(SchemaKeyword::Definitions),
            "$defs"
        );
        assert_eq!(SchemaVersion::Draft6.definitions_prefix(), "#/definitions/");
        assert_eq!(SchemaVersion::Draft2020_12.definitions_prefix(), "#/$defs/");
    }

    #[test]
    fn prefix_items_fall_back_to_items() {
        assert_eq!(SchemaKeyword::PrefixItems.for_version(SchemaVersion::Draft7), "items");
        assert_eq!(
            SchemaKeyword::PrefixItems.for_version(SchemaVersion::Draft2020_12),
            "prefixItems"
        );
    }

    #[test]
    fn reverse_lookup_prefers_first_declared() {
        assert_eq!(
            SchemaKeyword::for_tag("dependencies", SchemaVersion::Draft7),
            Some(SchemaKeyword::DependentSchemas)
        );
        assert_eq!(
            SchemaKeyword::for_tag("items", SchemaVersion::Draft7),
            Some(SchemaKeyword::Items)
        );
        assert_eq!(SchemaKeyword::for_tag("dependencies", SchemaVersion::Draft2020_12), None);
        assert_eq!(SchemaKeyword::for_tag("#", SchemaVersion::Draft2020_12), None);
    }

    #[test]
    fn implied_types() {
        assert_eq!(SchemaKeyword::MinLength.implied_types(), &[SchemaType::String]);
        assert_eq!(
            SchemaKeyword::Maximum.implied_types(),
            &[SchemaType::Integer, SchemaType::Number]
        );
        assert!(SchemaKeyword::Title.implied_types().is_empty());
    }

    #[test]
    fn version_from_str() {
        assert_eq!("draft-07".parse::<SchemaVersion>(), Ok(SchemaVersion::Draft7));
        assert_eq!("2020-12".parse::<SchemaVersion>(), Ok(SchemaVersion::Draft2020_12));
        assert!("draft-04".parse::<SchemaVersion>().is_err());
        assert_eq!(SchemaVersion::Draft2019_09.to_string(), "draft-2019-09");
    }

    #[test]
    fn schema_type_parse() {
        assert_eq!(SchemaType::parse("integer"), Some(SchemaType::Integer));
        assert_eq!(SchemaType::parse("float"), None);
    }
}
