//! Generator configuration.
//!
//! [`ConfigBuilder`] accumulates options, modules and resolver chains;
//! [`ConfigBuilder::build`] freezes them into a [`GeneratorConfig`] that a
//! generator uses unchanged for every run. Resolver chains are ordered and
//! the first resolver returning `Some` wins.

use std::cmp::Ordering;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::context::GenerationContext;
use crate::error::GenerateError;
use crate::keyword::{SchemaKeyword, SchemaVersion};
use crate::modules;
use crate::naming::DefinitionNamingStrategy;
use crate::node::NodeId;
use crate::options::{GeneratorOption, OptionPreset, OptionSet};
use crate::scope::{MemberScope, TypeScope};
use crate::types::ResolvedType;

/// First-match resolver for a single attribute.
pub type Resolver<S, T> = Box<dyn Fn(&S) -> Option<T>>;

/// Predicate over a scope.
pub type Check<S> = Box<dyn Fn(&S) -> bool>;

/// Supplies a complete schema for a scope, bypassing standard generation.
pub type CustomDefinitionFn<S> =
    Box<dyn Fn(&S, &mut GenerationContext<'_>) -> Result<Option<CustomDefinition>, GenerateError>>;

/// Adjusts a finished schema node for a scope.
pub type AttributeOverrideFn<S> =
    Box<dyn Fn(NodeId, &S, &mut GenerationContext<'_>) -> Result<(), GenerateError>>;

/// Lists the subtypes to describe instead of a type itself.
pub type SubtypeResolverFn =
    Box<dyn Fn(&TypeScope, &GenerationContext<'_>) -> Option<Vec<ResolvedType>>>;

/// Orders the properties of an object schema.
pub type PropertySorter = Box<dyn Fn(&MemberScope, &MemberScope) -> Ordering>;

/// How a custom definition takes part in reference resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefinitionType {
    /// Treated like a generated definition: shared or inlined by reference count.
    #[default]
    Standard,
    /// Always written in place.
    Inline,
    /// Always extracted into a shared definition.
    AlwaysRef,
}

/// Schema supplied by a custom definition provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomDefinition {
    node: NodeId,
    definition_type: DefinitionType,
    include_attributes: bool,
}

impl CustomDefinition {
    /// A standard definition; attributes are still collected.
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            definition_type: DefinitionType::Standard,
            include_attributes: true,
        }
    }

    /// A definition written in place wherever it is used.
    pub fn inline(node: NodeId) -> Self {
        Self::new(node).with_definition_type(DefinitionType::Inline)
    }

    pub fn with_definition_type(mut self, definition_type: DefinitionType) -> Self {
        self.definition_type = definition_type;
        self
    }

    /// Skip the attribute resolvers for this definition.
    pub fn without_attributes(mut self) -> Self {
        self.include_attributes = false;
        self
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn definition_type(&self) -> DefinitionType {
        self.definition_type
    }

    pub fn is_meant_to_be_inline(&self) -> bool {
        self.definition_type == DefinitionType::Inline
    }

    pub fn should_include_attributes(&self) -> bool {
        self.include_attributes
    }
}

/// Value of the `additionalProperties` keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdditionalProperties {
    /// `additionalProperties: false`
    Forbidden,
    /// Keyword omitted.
    Unrestricted,
    /// Additional property values must match this type.
    Schema(ResolvedType),
}

/// Reset hook for configuration components carrying per-run state.
pub trait StatefulConfig {
    /// Called once after every completed top-level generation.
    fn reset_after_schema_generation_finished(&self);
}

/// A reusable bundle of configuration.
pub trait Module {
    fn apply_to_config_builder(&self, builder: &mut ConfigBuilder);
}

macro_rules! resolver_chains {
    ($($field:ident: $value:ty => $with:ident, $resolve:ident;)*) => {
        /// Attribute resolver chains, keyed by schema keyword.
        struct AttributeChains<S> {
            $($field: Vec<Resolver<S, $value>>,)*
        }

        impl<S> Default for AttributeChains<S> {
            fn default() -> Self {
                Self { $($field: Vec::new(),)* }
            }
        }

        impl<S> ConfigPart<S> {
            $(
                pub fn $with(&mut self, resolver: impl Fn(&S) -> Option<$value> + 'static) -> &mut Self {
                    self.attributes.$field.push(Box::new(resolver));
                    self
                }

                pub fn $resolve(&self, scope: &S) -> Option<$value> {
                    first_match(&self.attributes.$field, scope)
                }
            )*
        }
    };
}

resolver_chains! {
    ids: String => with_id_resolver, resolve_id;
    anchors: String => with_anchor_resolver, resolve_anchor;
    titles: String => with_title_resolver, resolve_title;
    descriptions: String => with_description_resolver, resolve_description;
    defaults: Value => with_default_resolver, resolve_default;
    enums: Vec<Value> => with_enum_resolver, resolve_enum;
    additional_properties: AdditionalProperties => with_additional_properties_resolver, resolve_additional_properties;
    pattern_properties: IndexMap<String, ResolvedType> => with_pattern_properties_resolver, resolve_pattern_properties;
    string_min_lengths: u64 => with_string_min_length_resolver, resolve_string_min_length;
    string_max_lengths: u64 => with_string_max_length_resolver, resolve_string_max_length;
    string_formats: String => with_string_format_resolver, resolve_string_format;
    string_patterns: String => with_string_pattern_resolver, resolve_string_pattern;
    number_inclusive_minimums: Number => with_number_inclusive_minimum_resolver, resolve_number_inclusive_minimum;
    number_exclusive_minimums: Number => with_number_exclusive_minimum_resolver, resolve_number_exclusive_minimum;
    number_inclusive_maximums: Number => with_number_inclusive_maximum_resolver, resolve_number_inclusive_maximum;
    number_exclusive_maximums: Number => with_number_exclusive_maximum_resolver, resolve_number_exclusive_maximum;
    number_multiple_ofs: Number => with_number_multiple_of_resolver, resolve_number_multiple_of;
    array_min_items: u64 => with_array_min_items_resolver, resolve_array_min_items;
    array_max_items: u64 => with_array_max_items_resolver, resolve_array_max_items;
    array_unique_items: bool => with_array_unique_items_resolver, resolve_array_unique_items;
}

fn first_match<S, T>(resolvers: &[Resolver<S, T>], scope: &S) -> Option<T> {
    resolvers.iter().find_map(|resolver| resolver(scope))
}

/// Configuration for one kind of scope (fields, methods or types).
///
/// Member checks (ignore, required, nullable, read/write-only, overrides)
/// are consulted for fields and methods only; `$id`/`$anchor` for types only.
pub struct ConfigPart<S> {
    ignore_checks: Vec<Check<S>>,
    required_checks: Vec<Check<S>>,
    nullable_checks: Vec<Resolver<S, bool>>,
    read_only_checks: Vec<Check<S>>,
    write_only_checks: Vec<Check<S>>,
    target_type_overrides: Vec<Resolver<S, Vec<ResolvedType>>>,
    property_name_overrides: Vec<Resolver<S, String>>,
    pub(crate) custom_definition_providers: Vec<CustomDefinitionFn<S>>,
    pub(crate) attribute_overrides: Vec<AttributeOverrideFn<S>>,
    attributes: AttributeChains<S>,
}

impl<S> Default for ConfigPart<S> {
    fn default() -> Self {
        Self {
            ignore_checks: Vec::new(),
            required_checks: Vec::new(),
            nullable_checks: Vec::new(),
            read_only_checks: Vec::new(),
            write_only_checks: Vec::new(),
            target_type_overrides: Vec::new(),
            property_name_overrides: Vec::new(),
            custom_definition_providers: Vec::new(),
            attribute_overrides: Vec::new(),
            attributes: AttributeChains::default(),
        }
    }
}

impl<S> ConfigPart<S> {
    pub fn with_ignore_check(&mut self, check: impl Fn(&S) -> bool + 'static) -> &mut Self {
        self.ignore_checks.push(Box::new(check));
        self
    }

    pub fn with_required_check(&mut self, check: impl Fn(&S) -> bool + 'static) -> &mut Self {
        self.required_checks.push(Box::new(check));
        self
    }

    /// Nullability resolver; `None` means "no opinion".
    pub fn with_nullable_check(&mut self, check: impl Fn(&S) -> Option<bool> + 'static) -> &mut Self {
        self.nullable_checks.push(Box::new(check));
        self
    }

    pub fn with_read_only_check(&mut self, check: impl Fn(&S) -> bool + 'static) -> &mut Self {
        self.read_only_checks.push(Box::new(check));
        self
    }

    pub fn with_write_only_check(&mut self, check: impl Fn(&S) -> bool + 'static) -> &mut Self {
        self.write_only_checks.push(Box::new(check));
        self
    }

    /// Replace the declared type with one or more alternatives.
    pub fn with_target_type_overrides_resolver(
        &mut self,
        resolver: impl Fn(&S) -> Option<Vec<ResolvedType>> + 'static,
    ) -> &mut Self {
        self.target_type_overrides.push(Box::new(resolver));
        self
    }

    pub fn with_property_name_override_resolver(
        &mut self,
        resolver: impl Fn(&S) -> Option<String> + 'static,
    ) -> &mut Self {
        self.property_name_overrides.push(Box::new(resolver));
        self
    }

    pub fn with_custom_definition_provider(
        &mut self,
        provider: impl Fn(&S, &mut GenerationContext<'_>) -> Result<Option<CustomDefinition>, GenerateError>
            + 'static,
    ) -> &mut Self {
        self.custom_definition_providers.push(Box::new(provider));
        self
    }

    pub fn with_attribute_override(
        &mut self,
        apply: impl Fn(NodeId, &S, &mut GenerationContext<'_>) -> Result<(), GenerateError> + 'static,
    ) -> &mut Self {
        self.attribute_overrides.push(Box::new(apply));
        self
    }

    pub fn should_ignore(&self, scope: &S) -> bool {
        self.ignore_checks.iter().any(|check| check(scope))
    }

    pub fn is_required(&self, scope: &S) -> bool {
        self.required_checks.iter().any(|check| check(scope))
    }

    /// `Some(true)` if any nullable check says so, `Some(false)` if all
    /// checks with an opinion deny it, `None` without any opinion.
    pub fn is_nullable(&self, scope: &S) -> Option<bool> {
        let mut result = None;
        for check in &self.nullable_checks {
            match check(scope) {
                Some(true) => return Some(true),
                Some(false) => result = Some(false),
                None => {}
            }
        }
        result
    }

    pub fn is_read_only(&self, scope: &S) -> bool {
        self.read_only_checks.iter().any(|check| check(scope))
    }

    pub fn is_write_only(&self, scope: &S) -> bool {
        self.write_only_checks.iter().any(|check| check(scope))
    }

    pub fn resolve_target_type_overrides(&self, scope: &S) -> Option<Vec<ResolvedType>> {
        first_match(&self.target_type_overrides, scope)
    }

    pub fn resolve_property_name_override(&self, scope: &S) -> Option<String> {
        first_match(&self.property_name_overrides, scope)
    }
}

/// Mutable configuration, finalized by [`ConfigBuilder::build`].
pub struct ConfigBuilder {
    version: SchemaVersion,
    preset: OptionPreset,
    with: Vec<GeneratorOption>,
    without: Vec<GeneratorOption>,
    fields: ConfigPart<MemberScope>,
    methods: ConfigPart<MemberScope>,
    types: ConfigPart<TypeScope>,
    subtype_resolvers: Vec<SubtypeResolverFn>,
    naming_strategy: Option<Box<dyn DefinitionNamingStrategy>>,
    property_sorter: Option<PropertySorter>,
    stateful: Vec<Rc<dyn StatefulConfig>>,
}

impl ConfigBuilder {
    pub fn new(version: SchemaVersion, preset: OptionPreset) -> Self {
        Self {
            version,
            preset,
            with: Vec::new(),
            without: Vec::new(),
            fields: ConfigPart::default(),
            methods: ConfigPart::default(),
            types: ConfigPart::default(),
            subtype_resolvers: Vec::new(),
            naming_strategy: None,
            property_sorter: None,
            stateful: Vec::new(),
        }
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Enable an option regardless of the preset.
    pub fn with(&mut self, option: GeneratorOption) -> &mut Self {
        self.without.retain(|o| *o != option);
        self.with.push(option);
        self
    }

    /// Disable an option regardless of the preset.
    pub fn without(&mut self, option: GeneratorOption) -> &mut Self {
        self.with.retain(|o| *o != option);
        self.without.push(option);
        self
    }

    /// The options as they would be resolved right now.
    pub fn options(&self) -> OptionSet {
        OptionSet::resolve(self.preset, &self.with, &self.without)
    }

    /// Apply a module immediately; its resolvers rank before option modules.
    pub fn with_module(&mut self, module: impl Module) -> &mut Self {
        module.apply_to_config_builder(self);
        self
    }

    pub fn for_fields(&mut self) -> &mut ConfigPart<MemberScope> {
        &mut self.fields
    }

    pub fn for_methods(&mut self) -> &mut ConfigPart<MemberScope> {
        &mut self.methods
    }

    pub fn for_types(&mut self) -> &mut ConfigPart<TypeScope> {
        &mut self.types
    }

    pub fn with_subtype_resolver(
        &mut self,
        resolver: impl Fn(&TypeScope, &GenerationContext<'_>) -> Option<Vec<ResolvedType>> + 'static,
    ) -> &mut Self {
        self.subtype_resolvers.push(Box::new(resolver));
        self
    }

    pub fn with_definition_naming_strategy(
        &mut self,
        strategy: impl DefinitionNamingStrategy + 'static,
    ) -> &mut Self {
        self.naming_strategy = Some(Box::new(strategy));
        self
    }

    pub fn with_property_sorter(
        &mut self,
        sorter: impl Fn(&MemberScope, &MemberScope) -> Ordering + 'static,
    ) -> &mut Self {
        self.property_sorter = Some(Box::new(sorter));
        self
    }

    /// Register a component to be reset after every generation.
    pub fn with_stateful(&mut self, component: Rc<dyn StatefulConfig>) -> &mut Self {
        self.stateful.push(component);
        self
    }

    /// Resolve options, apply their modules and freeze the configuration.
    pub fn build(mut self) -> GeneratorConfig {
        let options = self.options();
        modules::apply_option_modules(&mut self, &options);
        GeneratorConfig {
            version: self.version,
            options,
            fields: self.fields,
            methods: self.methods,
            types: self.types,
            subtype_resolvers: self.subtype_resolvers,
            naming_strategy: self.naming_strategy,
            property_sorter: self.property_sorter,
            stateful: self.stateful,
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new(SchemaVersion::default(), OptionPreset::default())
    }
}

/// Immutable configuration snapshot.
pub struct GeneratorConfig {
    version: SchemaVersion,
    options: OptionSet,
    fields: ConfigPart<MemberScope>,
    methods: ConfigPart<MemberScope>,
    types: ConfigPart<TypeScope>,
    subtype_resolvers: Vec<SubtypeResolverFn>,
    naming_strategy: Option<Box<dyn DefinitionNamingStrategy>>,
    property_sorter: Option<PropertySorter>,
    stateful: Vec<Rc<dyn StatefulConfig>>,
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("version", &self.version)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl GeneratorConfig {
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Literal string of a keyword in the configured draft.
    pub fn keyword(&self, keyword: SchemaKeyword) -> &'static str {
        keyword.for_version(self.version)
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn is_enabled(&self, option: GeneratorOption) -> bool {
        self.options.is_enabled(option)
    }

    pub fn for_fields(&self) -> &ConfigPart<MemberScope> {
        &self.fields
    }

    pub fn for_methods(&self) -> &ConfigPart<MemberScope> {
        &self.methods
    }

    /// The field or method part matching the member's kind.
    pub fn for_member(&self, member: &MemberScope) -> &ConfigPart<MemberScope> {
        if member.is_field() {
            &self.fields
        } else {
            &self.methods
        }
    }

    pub fn for_types(&self) -> &ConfigPart<TypeScope> {
        &self.types
    }

    pub fn naming_strategy(&self) -> Option<&dyn DefinitionNamingStrategy> {
        self.naming_strategy.as_deref()
    }

    pub fn should_include_schema_version_indicator(&self) -> bool {
        self.is_enabled(GeneratorOption::SchemaVersionIndicator)
    }

    pub fn should_create_definitions_for_all_objects(&self) -> bool {
        self.is_enabled(GeneratorOption::DefinitionsForAllObjects)
    }

    pub fn should_create_definition_for_main_schema(&self) -> bool {
        self.is_enabled(GeneratorOption::DefinitionForMainSchema)
    }

    pub fn should_point_to_root_for_main_schema(&self) -> bool {
        self.is_enabled(GeneratorOption::MainSchemaRootPointer)
    }

    pub fn should_inline_all_schemas(&self) -> bool {
        self.is_enabled(GeneratorOption::InlineAllSchemas)
    }

    pub fn should_use_plain_definition_keys(&self) -> bool {
        self.is_enabled(GeneratorOption::PlainDefinitionKeys)
    }

    pub fn should_derive_fields_from_argument_free_methods(&self) -> bool {
        self.is_enabled(GeneratorOption::FieldsDerivedFromArgumentFreeMethods)
    }

    pub fn should_represent_single_allowed_value_as_const(&self) -> bool {
        !self.is_enabled(GeneratorOption::EnumKeywordForSingleValues)
    }

    pub fn should_allow_nullable_array_items(&self) -> bool {
        self.is_enabled(GeneratorOption::NullableArrayItemsAllowed)
    }

    pub fn should_clean_up_all_of(&self) -> bool {
        self.is_enabled(GeneratorOption::AllOfCleanupAtTheEnd)
    }

    pub fn should_clean_up_duplicate_member_attributes(&self) -> bool {
        self.is_enabled(GeneratorOption::DuplicateMemberAttributeCleanupAtTheEnd)
    }

    pub fn should_include_strict_type_info(&self) -> bool {
        self.is_enabled(GeneratorOption::StrictTypeInfo)
    }

    /// Whether a member may be null when no nullable check has an opinion.
    pub fn is_nullable_by_default(&self, member: &MemberScope) -> bool {
        if member.is_field() {
            self.is_enabled(GeneratorOption::NullableFieldsByDefault)
        } else {
            self.is_enabled(GeneratorOption::NullableMethodReturnValuesByDefault)
        }
    }

    /// Subtypes to describe instead of `scope` itself; empty for none.
    pub fn resolve_subtypes(&self, scope: &TypeScope, context: &GenerationContext<'_>) -> Vec<ResolvedType> {
        self.subtype_resolvers
            .iter()
            .find_map(|resolver| resolver(scope, context))
            .unwrap_or_default()
    }

    /// Ordering of two properties: the custom sorter, or fields before
    /// methods and then alphabetically.
    pub fn sort_properties(&self, first: &MemberScope, second: &MemberScope) -> Ordering {
        match &self.property_sorter {
            Some(sorter) => sorter(first, second),
            None => {
                let first_name = first.schema_property_name();
                let second_name = second.schema_property_name();
                first_name
                    .ends_with(')')
                    .cmp(&second_name.ends_with(')'))
                    .then_with(|| first_name.cmp(&second_name))
            }
        }
    }

    /// Invoke every registered reset hook.
    pub fn reset_after_schema_generation_finished(&self) {
        for component in &self.stateful {
            component.reset_after_schema_generation_finished();
        }
    }
}
