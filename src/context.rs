//! The traversal half of definition/reference resolution.
//!
//! [`GenerationContext`] walks a type and everything reachable from it,
//! producing exactly one body per [`DefinitionKey`]. A body is registered
//! before it is filled, so a type that refers to itself finds its own
//! in-progress body and stops there. Every place that points at a registered
//! body is recorded as a reference site; whether a site ends up as an inline
//! copy or a `$ref` is only decided later by [`crate::builder::SchemaBuilder`].

use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::attributes;
use crate::config::{CustomDefinition, DefinitionType, GeneratorConfig};
use crate::error::GenerateError;
use crate::keyword::{SchemaKeyword, SchemaType};
use crate::node::{NodeId, SchemaArena, Slot};
use crate::scope::{MemberScope, TypeScope};
use crate::type_context::TypeContext;
use crate::types::ResolvedType;

/// Position of a custom definition provider in its configuration chain.
///
/// Passing a provider's id as "ignored" skips it and every provider before
/// it, which lets a provider delegate to the standard generation for the
/// type it is currently handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(pub(crate) usize);

/// Identity of one generated sub-schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefinitionKey {
    ty: ResolvedType,
    ignored_provider: Option<ProviderId>,
}

impl DefinitionKey {
    pub fn new(ty: ResolvedType, ignored_provider: Option<ProviderId>) -> Self {
        Self {
            ty,
            ignored_provider,
        }
    }

    pub fn ty(&self) -> &ResolvedType {
        &self.ty
    }

    pub fn ignored_provider(&self) -> Option<ProviderId> {
        self.ignored_provider
    }
}

/// Mutable state of one generation run.
pub struct GenerationContext<'a> {
    config: &'a GeneratorConfig,
    type_context: Rc<TypeContext>,
    pub(crate) arena: SchemaArena,
    pub(crate) definitions: IndexMap<DefinitionKey, NodeId>,
    references: HashMap<DefinitionKey, Vec<NodeId>>,
    nullable_references: HashMap<DefinitionKey, Vec<NodeId>>,
    never_inline: HashSet<DefinitionKey>,
    inline_stack: Vec<ResolvedType>,
    current_provider: Option<ProviderId>,
}

impl<'a> GenerationContext<'a> {
    pub fn new(config: &'a GeneratorConfig, type_context: Rc<TypeContext>) -> Self {
        Self {
            config,
            type_context,
            arena: SchemaArena::new(),
            definitions: IndexMap::new(),
            references: HashMap::new(),
            nullable_references: HashMap::new(),
            never_inline: HashSet::new(),
            inline_stack: Vec::new(),
            current_provider: None,
        }
    }

    pub fn config(&self) -> &'a GeneratorConfig {
        self.config
    }

    pub fn type_context(&self) -> &TypeContext {
        &self.type_context
    }

    /// Literal string of a keyword in the configured draft.
    pub fn keyword(&self, keyword: SchemaKeyword) -> &'static str {
        self.config.keyword(keyword)
    }

    pub fn arena(&self) -> &SchemaArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut SchemaArena {
        &mut self.arena
    }

    /// Allocate a node holding the entries of a JSON object.
    pub fn node_from_value(&mut self, value: &Value) -> NodeId {
        self.arena.node_from_value(value)
    }

    /// Scope of `ty` sharing this run's type context.
    pub fn type_scope(&self, ty: ResolvedType) -> TypeScope {
        TypeScope::new(ty, Rc::clone(&self.type_context))
    }

    /// The custom definition provider currently being invoked, if any.
    pub fn current_provider(&self) -> Option<ProviderId> {
        self.current_provider
    }

    // --- Definition registry ---

    pub fn contains_definition(&self, key: &DefinitionKey) -> bool {
        self.definitions.contains_key(key)
    }

    pub fn definition(&self, key: &DefinitionKey) -> Option<NodeId> {
        self.definitions.get(key).copied()
    }

    /// Keys in the order they were first encountered.
    pub fn defined_keys(&self) -> impl Iterator<Item = &DefinitionKey> {
        self.definitions.keys()
    }

    pub fn references(&self, key: &DefinitionKey) -> &[NodeId] {
        self.references.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn nullable_references(&self, key: &DefinitionKey) -> &[NodeId] {
        self.nullable_references
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether a custom definition demanded that this key is always extracted.
    pub fn should_never_inline(&self, key: &DefinitionKey) -> bool {
        self.never_inline.contains(key)
    }

    fn put_definition(&mut self, key: DefinitionKey, node: NodeId) {
        debug!(definition = %key.ty, "registering definition");
        self.definitions.insert(key, node);
    }

    /// Record `site` as a place that must point at the definition of `key`.
    pub fn add_reference(&mut self, key: DefinitionKey, site: NodeId, nullable: bool) {
        trace!(definition = %key.ty, nullable, "adding reference");
        let sites = if nullable {
            &mut self.nullable_references
        } else {
            &mut self.references
        };
        sites.entry(key).or_default().push(site);
    }

    // --- Entry points ---

    /// Traverse the main type of a schema and return its key.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::CircularInline` when all schemas must be
    /// inlined but the type refers to itself; provider errors pass through.
    pub fn parse_type(&mut self, ty: &ResolvedType) -> Result<DefinitionKey, GenerateError> {
        let scope = self.type_scope(ty.clone());
        self.inline_stack.push(ty.clone());
        let result = self.traverse_generic_type(&scope, None, None, false, false, None);
        self.inline_stack.pop();
        result?;
        Ok(DefinitionKey::new(ty.clone(), None))
    }

    /// A complete schema of `ty`, never a reference.
    ///
    /// # Errors
    ///
    /// Propagates traversal and provider errors.
    pub fn create_definition(&mut self, ty: &ResolvedType) -> Result<NodeId, GenerateError> {
        self.create_standard_definition(ty, None)
    }

    /// A node that will hold either the schema of `ty` or a reference to it.
    ///
    /// # Errors
    ///
    /// Propagates traversal and provider errors.
    pub fn create_definition_reference(&mut self, ty: &ResolvedType) -> Result<NodeId, GenerateError> {
        self.create_standard_definition_reference(ty, None)
    }

    /// Like [`Self::create_definition`], skipping custom definition providers
    /// up to and including `ignored`.
    ///
    /// # Errors
    ///
    /// Propagates traversal and provider errors.
    pub fn create_standard_definition(
        &mut self,
        ty: &ResolvedType,
        ignored: Option<ProviderId>,
    ) -> Result<NodeId, GenerateError> {
        let node = self.arena.create_node();
        let scope = self.type_scope(ty.clone());
        self.traverse_generic_type(&scope, None, Some(node), false, true, ignored)?;
        Ok(node)
    }

    /// Like [`Self::create_definition_reference`], skipping custom definition
    /// providers up to and including `ignored`.
    ///
    /// # Errors
    ///
    /// Propagates traversal and provider errors.
    pub fn create_standard_definition_reference(
        &mut self,
        ty: &ResolvedType,
        ignored: Option<ProviderId>,
    ) -> Result<NodeId, GenerateError> {
        let node = self.arena.create_node();
        let scope = self.type_scope(ty.clone());
        self.traverse_generic_type(&scope, None, Some(node), false, false, ignored)?;
        Ok(node)
    }

    /// Standard member schema, skipping member providers up to and including
    /// `ignored`.
    ///
    /// # Errors
    ///
    /// Propagates traversal and provider errors.
    pub fn create_standard_member_definition(
        &mut self,
        member: &MemberScope,
        ignored: Option<ProviderId>,
    ) -> Result<Slot, GenerateError> {
        self.create_member_schema(member, false, true, ignored)
    }

    /// Standard member schema, possibly a reference, skipping member
    /// providers up to and including `ignored`.
    ///
    /// # Errors
    ///
    /// Propagates traversal and provider errors.
    pub fn create_standard_member_definition_reference(
        &mut self,
        member: &MemberScope,
        ignored: Option<ProviderId>,
    ) -> Result<Slot, GenerateError> {
        self.create_member_schema(member, false, false, ignored)
    }

    // --- Type traversal ---

    fn traverse_generic_type(
        &mut self,
        scope: &TypeScope,
        member: Option<&MemberScope>,
        target: Option<NodeId>,
        nullable: bool,
        force_inline: bool,
        ignored: Option<ProviderId>,
    ) -> Result<(), GenerateError> {
        let config = self.config;
        let ty = scope.ty().clone();
        let key = DefinitionKey::new(ty.clone(), ignored);
        let is_container = scope.is_container_type();
        let inline_all = target.is_some() && !force_inline && config.should_inline_all_schemas();

        if inline_all && !is_container && self.inline_stack.contains(&ty) {
            return Err(GenerateError::CircularInline {
                type_name: ty.description(),
            });
        }
        if !force_inline && self.definitions.contains_key(&key) {
            if let Some(site) = target {
                self.add_reference(key, site, nullable);
            }
            return Ok(());
        }

        let custom = self.custom_type_definition(scope, &key, ignored)?;
        let inline_by_policy = inline_all && !self.never_inline.contains(&key);

        let definition;
        let include_type_attributes;
        match custom {
            Some(custom) if custom.is_meant_to_be_inline() || force_inline || inline_by_policy => {
                include_type_attributes = custom.should_include_attributes();
                definition = match target {
                    Some(site) => {
                        debug!(definition = %ty, "applying custom inline definition");
                        self.arena.set_all(site, custom.node());
                        site
                    }
                    None => {
                        debug!(definition = %ty, "storing custom inline definition of main type");
                        self.put_definition(key, custom.node());
                        custom.node()
                    }
                };
                if nullable {
                    self.make_nullable(definition);
                }
            }
            custom => {
                let direct = force_inline || inline_by_policy || (is_container && custom.is_none());
                definition = match target {
                    Some(site) if direct => site,
                    _ => {
                        let node = self.arena.create_node();
                        self.put_definition(key.clone(), node);
                        if let Some(site) = target {
                            self.add_reference(key, site, nullable);
                        }
                        node
                    }
                };
                let track = inline_by_policy && !is_container;
                if track {
                    self.inline_stack.push(ty.clone());
                }
                let filled = self.fill_definition(scope, member, definition, custom, is_container, nullable);
                if track {
                    self.inline_stack.pop();
                }
                include_type_attributes = filled?;
                if nullable && direct && !is_container && target.is_some() {
                    self.make_nullable(definition);
                }
            }
        }

        if include_type_attributes {
            let allowed = self.allowed_schema_types(definition);
            let type_attributes = attributes::collect_type_attributes(scope, self, &allowed)?;
            self.arena.merge_missing(definition, type_attributes);
        }
        for apply in &config.for_types().attribute_overrides {
            apply(definition, scope, self)?;
        }
        Ok(())
    }

    /// Populate a definition body; returns whether type attributes apply.
    fn fill_definition(
        &mut self,
        scope: &TypeScope,
        member: Option<&MemberScope>,
        definition: NodeId,
        custom: Option<CustomDefinition>,
        is_container: bool,
        nullable: bool,
    ) -> Result<bool, GenerateError> {
        if let Some(custom) = custom {
            debug!(definition = %scope.ty(), "applying custom definition");
            self.arena.set_all(definition, custom.node());
            return Ok(custom.should_include_attributes());
        }
        if is_container {
            self.generate_array_definition(scope, member, definition, nullable)?;
            return Ok(true);
        }
        let has_subtypes = self.add_subtype_references(scope, definition)?;
        Ok(!has_subtypes)
    }

    fn custom_type_definition(
        &mut self,
        scope: &TypeScope,
        key: &DefinitionKey,
        ignored: Option<ProviderId>,
    ) -> Result<Option<CustomDefinition>, GenerateError> {
        let config = self.config;
        let start = ignored.map_or(0, |provider| provider.0 + 1);
        let previous = self.current_provider;
        let mut found = None;
        for (index, provider) in config
            .for_types()
            .custom_definition_providers
            .iter()
            .enumerate()
            .skip(start)
        {
            self.current_provider = Some(ProviderId(index));
            let result = provider(scope, self);
            self.current_provider = previous;
            if let Some(definition) = result? {
                found = Some(definition);
                break;
            }
        }
        if let Some(definition) = &found {
            if definition.definition_type() == DefinitionType::AlwaysRef {
                self.never_inline.insert(key.clone());
            }
        }
        Ok(found)
    }

    fn custom_member_definition(
        &mut self,
        member: &MemberScope,
        ignored: Option<ProviderId>,
    ) -> Result<Option<CustomDefinition>, GenerateError> {
        let config = self.config;
        let start = ignored.map_or(0, |provider| provider.0 + 1);
        let previous = self.current_provider;
        for (index, provider) in config
            .for_member(member)
            .custom_definition_providers
            .iter()
            .enumerate()
            .skip(start)
        {
            self.current_provider = Some(ProviderId(index));
            let result = provider(member, self);
            self.current_provider = previous;
            if let Some(definition) = result? {
                return Ok(Some(definition));
            }
        }
        Ok(None)
    }

    /// `allOf` (single subtype) or `anyOf` over the subtype definitions.
    ///
    /// Falls back to an object definition when there are no subtypes.
    fn add_subtype_references(&mut self, scope: &TypeScope, definition: NodeId) -> Result<bool, GenerateError> {
        let subtypes: Vec<ResolvedType> = self
            .config
            .resolve_subtypes(scope, self)
            .into_iter()
            .filter(|subtype| subtype != scope.ty())
            .collect();
        if subtypes.is_empty() {
            self.generate_object_definition(scope, definition)?;
            return Ok(false);
        }
        debug!(definition = %scope.ty(), count = subtypes.len(), "referencing subtypes");
        let keyword = if subtypes.len() == 1 {
            SchemaKeyword::AllOf
        } else {
            SchemaKeyword::AnyOf
        };
        let mut branches = Vec::with_capacity(subtypes.len());
        for subtype in subtypes {
            let node = self.arena.create_node();
            let subtype_scope = self.type_scope(subtype);
            self.traverse_generic_type(&subtype_scope, None, Some(node), false, false, None)?;
            branches.push(Slot::Node(node));
        }
        self.arena
            .insert(definition, self.keyword(keyword), Slot::Array(branches));
        Ok(true)
    }

    fn generate_array_definition(
        &mut self,
        scope: &TypeScope,
        member: Option<&MemberScope>,
        definition: NodeId,
        nullable: bool,
    ) -> Result<(), GenerateError> {
        let type_keyword = self.keyword(SchemaKeyword::Type);
        let array = SchemaType::Array.as_str();
        if nullable {
            self.arena.insert(
                definition,
                type_keyword,
                Value::from(vec![array, SchemaType::Null.as_str()]),
            );
        } else {
            self.arena.insert(definition, type_keyword, array);
        }
        let items_keyword = self.keyword(SchemaKeyword::Items);
        match member.filter(|member| !member.is_fake_container_item()) {
            Some(member) => {
                let item = member.as_fake_container_item_scope();
                let items = self.populate_member_schema(&item)?;
                self.arena.insert(definition, items_keyword, items);
            }
            None => {
                let items = self.arena.create_node();
                self.arena.insert(definition, items_keyword, items);
                let item_type = scope.container_item_type().unwrap_or_else(ResolvedType::object);
                let item_scope = self.type_scope(item_type);
                self.traverse_generic_type(&item_scope, None, Some(items), false, false, None)?;
            }
        }
        Ok(())
    }

    fn generate_object_definition(&mut self, scope: &TypeScope, definition: NodeId) -> Result<(), GenerateError> {
        let config = self.config;
        self.arena.insert(
            definition,
            self.keyword(SchemaKeyword::Type),
            SchemaType::Object.as_str(),
        );

        let (properties, required) = self.collect_object_properties(scope);
        if properties.is_empty() {
            return Ok(());
        }
        let mut sorted: Vec<MemberScope> = properties.into_values().collect();
        sorted.sort_by(|first, second| config.sort_properties(first, second));

        let mut entries = IndexMap::new();
        let mut required_names = Vec::new();
        for property in &sorted {
            let name = property.schema_property_name();
            let schema = self.populate_member_schema(property)?;
            if required.contains(&name) {
                required_names.push(Value::String(name.clone()));
            }
            entries.insert(name, schema);
        }
        self.arena.insert(
            definition,
            self.keyword(SchemaKeyword::Properties),
            Slot::Object(entries),
        );
        if !required_names.is_empty() {
            self.arena.insert(
                definition,
                self.keyword(SchemaKeyword::Required),
                Value::Array(required_names),
            );
        }
        Ok(())
    }

    /// Included members by property name; the first member per name wins.
    fn collect_object_properties(&self, scope: &TypeScope) -> (IndexMap<String, MemberScope>, BTreeSet<String>) {
        let config = self.config;
        let owner = scope.ty();
        debug!(definition = %owner, "collecting fields and methods");
        let members = self.type_context.members(owner);
        let strip_getter_prefix = config.should_derive_fields_from_argument_free_methods();

        let fields = (0..members.fields.len()).map(|index| {
            MemberScope::field(
                owner.clone(),
                Rc::clone(&members),
                index,
                Rc::clone(&self.type_context),
            )
        });
        let methods = (0..members.methods.len()).map(|index| {
            MemberScope::method(
                owner.clone(),
                Rc::clone(&members),
                index,
                strip_getter_prefix,
                Rc::clone(&self.type_context),
            )
        });

        let mut properties = IndexMap::new();
        let mut required = BTreeSet::new();
        for member in fields.chain(methods) {
            let part = config.for_member(&member);
            if part.should_ignore(&member) {
                continue;
            }
            let renamed = match part.resolve_property_name_override(&member) {
                Some(name) => member.with_overridden_name(name),
                None => member.clone(),
            };
            let name = renamed.schema_property_name();
            if part.is_required(&member) {
                required.insert(name.clone());
            }
            if properties.contains_key(&name) {
                debug!(
                    declaring_type = ?member.declaring_type().map(ResolvedType::description),
                    member = member.declared_name(),
                    "ignoring overridden member"
                );
                continue;
            }
            properties.insert(name, renamed);
        }
        (properties, required)
    }

    // --- Member schemas ---

    /// Schema of a property: one or more alternatives for its type.
    fn populate_member_schema(&mut self, member: &MemberScope) -> Result<Slot, GenerateError> {
        let config = self.config;
        let mut overrides = config.for_member(member).resolve_target_type_overrides(member);
        if overrides.is_none() && !member.is_void() {
            if let Some(type_scope) = member.type_scope() {
                let subtypes = config.resolve_subtypes(&type_scope, self);
                if !subtypes.is_empty() {
                    overrides = Some(subtypes);
                }
            }
        }
        let options: Vec<MemberScope> = match overrides {
            Some(types) if !types.is_empty() => types
                .into_iter()
                .map(|ty| member.with_overridden_type(ty))
                .collect(),
            _ => vec![member.clone()],
        };
        let nullable = self.is_member_nullable(member);
        if let [single] = options.as_slice() {
            return self.create_member_schema(single, nullable, false, None);
        }

        let mut branches = Vec::with_capacity(options.len() + 1);
        if nullable {
            branches.push(Slot::Node(self.null_schema()));
        }
        for option in &options {
            branches.push(self.create_member_schema(option, false, false, None)?);
        }
        let node = self.arena.create_node();
        self.arena
            .insert(node, self.keyword(SchemaKeyword::AnyOf), Slot::Array(branches));
        Ok(Slot::Node(node))
    }

    fn is_member_nullable(&self, member: &MemberScope) -> bool {
        if member.is_enum_constant() {
            return false;
        }
        if member.is_fake_container_item() && !self.config.should_allow_nullable_array_items() {
            return false;
        }
        self.config
            .for_member(member)
            .is_nullable(member)
            .unwrap_or_else(|| self.config.is_nullable_by_default(member))
    }

    fn create_member_schema(
        &mut self,
        member: &MemberScope,
        nullable: bool,
        force_inline: bool,
        ignored: Option<ProviderId>,
    ) -> Result<Slot, GenerateError> {
        let Some(type_scope) = member.type_scope() else {
            return Ok(Slot::Value(Value::Bool(false)));
        };
        let target = self.arena.create_node();
        let member_attributes = attributes::collect_member_attributes(member, self)?;

        if let Some(custom) = self.custom_member_definition(member, ignored)? {
            self.arena.set_all(target, custom.node());
            if custom.should_include_attributes() {
                self.arena.merge_missing(target, member_attributes);
                let allowed = self.allowed_schema_types(target);
                let type_attributes = attributes::collect_type_attributes(&type_scope, self, &allowed)?;
                self.arena.merge_missing(target, type_attributes);
            }
            if nullable {
                self.make_nullable(target);
            }
            return Ok(Slot::Node(target));
        }

        let reference_container = if self.arena.is_empty(member_attributes) {
            target
        } else if member.is_container_type() {
            self.arena.merge_missing(target, member_attributes);
            target
        } else {
            // keeps contextual attributes apart from a potential "$ref"
            let container = self.arena.create_node();
            self.arena.insert(
                target,
                self.keyword(SchemaKeyword::AllOf),
                Slot::Array(vec![Slot::Node(container), Slot::Node(member_attributes)]),
            );
            container
        };
        self.traverse_generic_type(
            &type_scope,
            Some(member),
            Some(reference_container),
            nullable,
            force_inline,
            None,
        )?;
        Ok(Slot::Node(target))
    }

    // --- Nullable transform ---

    fn null_schema(&mut self) -> NodeId {
        let node = self.arena.create_node();
        self.arena
            .insert(node, self.keyword(SchemaKeyword::Type), SchemaType::Null.as_str());
        node
    }

    /// Let the schema in `node` additionally accept `null`.
    ///
    /// A plain `type` gains a `"null"` entry; references and compositions
    /// are wrapped as `oneOf: [{type: null}, original]`. Applying the
    /// transform twice has the same effect as applying it once.
    pub fn make_nullable(&mut self, node: NodeId) {
        let null_type = SchemaType::Null.as_str();
        let one_of = self.keyword(SchemaKeyword::OneOf);
        let composite = [
            SchemaKeyword::Ref,
            SchemaKeyword::AllOf,
            SchemaKeyword::AnyOf,
            SchemaKeyword::OneOf,
            SchemaKeyword::Const,
            SchemaKeyword::Enum,
        ];
        if composite
            .iter()
            .any(|keyword| self.arena.contains_key(node, self.keyword(*keyword)))
        {
            if self.is_nullable_wrapper(node, one_of) {
                return;
            }
            let original = self.arena.create_node();
            self.arena.set_all(original, node);
            self.arena.take_entries(node);
            let null_branch = self.null_schema();
            self.arena.insert(
                node,
                one_of,
                Slot::Array(vec![Slot::Node(null_branch), Slot::Node(original)]),
            );
            return;
        }

        let type_keyword = self.keyword(SchemaKeyword::Type);
        match self.arena.get(node, type_keyword) {
            Some(Slot::Value(Value::String(single))) if single != null_type => {
                let types = Value::from(vec![single.as_str(), null_type]);
                self.arena.insert(node, type_keyword, types);
            }
            Some(Slot::Value(Value::Array(types)))
                if !types.iter().any(|ty| ty.as_str() == Some(null_type)) =>
            {
                let mut types = types.clone();
                types.push(Value::from(null_type));
                self.arena.insert(node, type_keyword, Value::Array(types));
            }
            // without "type", null is allowed already
            _ => {}
        }
    }

    fn is_nullable_wrapper(&self, node: NodeId, one_of: &str) -> bool {
        let null_schema = serde_json::json!({ self.keyword(SchemaKeyword::Type): SchemaType::Null.as_str() });
        self.arena.len(node) == 1
            && matches!(
                self.arena.get(node, one_of),
                Some(Slot::Array(branches))
                    if branches.iter().any(|branch| self.arena.slot_equals(branch, &null_schema))
            )
    }

    /// Values of the `type` keyword in a node, empty when absent.
    fn allowed_schema_types(&self, node: NodeId) -> HashSet<String> {
        match self.arena.get(node, self.keyword(SchemaKeyword::Type)) {
            Some(Slot::Value(Value::String(single))) => HashSet::from([single.clone()]),
            Some(Slot::Value(Value::Array(types))) => types
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => HashSet::new(),
        }
    }
}
