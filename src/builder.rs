//! The finalization half of definition/reference resolution.
//!
//! Once traversal is complete, [`SchemaBuilder`] decides for every
//! [`DefinitionKey`] whether its body is copied into each reference site or
//! extracted into the definitions container, names the extracted ones and
//! rewrites all reference sites accordingly.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::cleanup::SchemaCleaner;
use crate::config::GeneratorConfig;
use crate::context::{DefinitionKey, GenerationContext};
use crate::error::GenerateError;
use crate::keyword::SchemaKeyword;
use crate::naming::{CleanNamingStrategy, DefaultNamingStrategy, DefinitionNamingStrategy};
use crate::node::{NodeId, Slot};
use crate::type_context::TypeContext;
use crate::types::ResolvedType;

/// Handle of a schema requested from a multi-type [`SchemaBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaReference(usize);

/// Output of a multi-type [`SchemaBuilder`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct MultiTypeSchemas {
    /// Shared definitions, to be placed under the path given to
    /// [`SchemaBuilder::collect_definitions`].
    pub definitions: Map<String, Value>,
    /// One schema per requested type, in request order.
    pub references: Vec<Value>,
}

impl MultiTypeSchemas {
    /// The schema for a handle returned by [`SchemaBuilder::create_schema_reference`].
    pub fn reference(&self, handle: SchemaReference) -> Option<&Value> {
        self.references.get(handle.0)
    }
}

/// Finalization decisions for one key.
struct DefinitionPlan {
    key: DefinitionKey,
    shared: bool,
    nullable_shared: bool,
    name: String,
    nullable_name: Option<String>,
}

impl DefinitionPlan {
    fn needs_name(&self) -> bool {
        self.shared || self.nullable_shared
    }
}

/// Assembles schemas from a [`GenerationContext`].
///
/// A builder either produces one complete document for a single type, or
/// collects several types into one definitions map for embedding into a
/// larger document:
///
/// ```
/// use std::rc::Rc;
/// use schemagen::{load_catalog_str, ConfigBuilder, SchemaBuilder, TypeContext};
///
/// let catalog = load_catalog_str(r#"{"types":[
///     { "name": "Item", "fields": [{ "name": "id", "type": "String" }] },
///     { "name": "Order", "fields": [{ "name": "items", "type": "List<Item>" }] }
/// ]}"#).unwrap();
/// let types = Rc::new(TypeContext::new(catalog));
/// let config = ConfigBuilder::default().build();
///
/// let mut builder = SchemaBuilder::new(&config, Rc::clone(&types));
/// let order = builder.create_schema_reference(&types.resolve("Order").unwrap()).unwrap();
/// let item = builder.create_schema_reference(&types.resolve("Item").unwrap()).unwrap();
/// let schemas = builder.collect_definitions("components/schemas").unwrap();
///
/// assert!(schemas.definitions.contains_key("Item"));
/// assert_eq!(
///     schemas.reference(item).unwrap()["$ref"],
///     "#/components/schemas/Item"
/// );
/// assert_eq!(schemas.reference(order).unwrap()["type"], "object");
/// ```
pub struct SchemaBuilder<'a> {
    config: &'a GeneratorConfig,
    context: GenerationContext<'a>,
    schema_references: Vec<NodeId>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(config: &'a GeneratorConfig, type_context: Rc<TypeContext>) -> Self {
        Self {
            config,
            context: GenerationContext::new(config, type_context),
            schema_references: Vec::new(),
        }
    }

    /// Generate the complete schema document for `ty`.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::CircularInline` when all schemas must be
    /// inlined but `ty` refers to itself, `DuplicateDefinitionNames` when the
    /// naming strategy cannot tell definitions apart, and passes provider
    /// errors through unchanged.
    pub(crate) fn create_schema_for_single_type(mut self, ty: &ResolvedType) -> Result<Value, GenerateError> {
        let config = self.config;
        let main_key = self.context.parse_type(ty)?;

        let root = self.context.arena_mut().create_node();
        if config.should_include_schema_version_indicator() {
            let tag = config.keyword(SchemaKeyword::Schema);
            self.context
                .arena_mut()
                .insert(root, tag, config.version().identifier());
        }
        if config.should_create_definition_for_main_schema() {
            self.context.add_reference(main_key.clone(), root, false);
        }

        let prefix = config.version().definitions_prefix();
        let definitions = self.build_definitions_and_resolve_references(&prefix, Some(&main_key))?;

        if !config.should_create_definition_for_main_schema() {
            if let Some(main) = self.context.definition(&main_key) {
                self.context.arena_mut().set_all(root, main);
            }
        }
        if !definitions.is_empty() {
            let tag = config.keyword(SchemaKeyword::Definitions);
            let entries: IndexMap<String, Slot> = definitions
                .into_iter()
                .map(|(name, node)| (name, Slot::Node(node)))
                .collect();
            self.context.arena_mut().insert(root, tag, Slot::Object(entries));
        }

        let mut schema = self.context.arena().materialize(root)?;
        SchemaCleaner::new(config).clean_up_document(&mut schema);
        config.reset_after_schema_generation_finished();
        Ok(schema)
    }

    /// Request a schema for `ty`; it is resolved by [`Self::collect_definitions`].
    ///
    /// # Errors
    ///
    /// Propagates traversal and provider errors.
    pub fn create_schema_reference(&mut self, ty: &ResolvedType) -> Result<SchemaReference, GenerateError> {
        let node = self.context.create_definition_reference(ty)?;
        self.schema_references.push(node);
        self.config.reset_after_schema_generation_finished();
        Ok(SchemaReference(self.schema_references.len() - 1))
    }

    /// Finalize every requested schema, pointing shared definitions at
    /// `#/<definition_path>/`.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::DuplicateDefinitionNames` when the naming
    /// strategy cannot tell definitions apart.
    pub fn collect_definitions(mut self, definition_path: &str) -> Result<MultiTypeSchemas, GenerateError> {
        let prefix = format!("#/{}/", definition_path.trim_matches('/'));
        let definitions = self.build_definitions_and_resolve_references(&prefix, None)?;

        let arena = self.context.arena();
        let mut schemas = MultiTypeSchemas::default();
        for (name, node) in definitions {
            schemas.definitions.insert(name, arena.materialize(node)?);
        }
        for node in &self.schema_references {
            schemas.references.push(arena.materialize(*node)?);
        }
        SchemaCleaner::new(self.config).clean_up_definitions(
            &mut schemas.definitions,
            &mut schemas.references,
            &prefix,
        );
        self.config.reset_after_schema_generation_finished();
        Ok(schemas)
    }

    // --- Finalization ---

    /// Decide the fate of every definition and rewrite its reference sites.
    ///
    /// Returns the extracted definitions ordered by name.
    fn build_definitions_and_resolve_references(
        &mut self,
        prefix: &str,
        main_key: Option<&DefinitionKey>,
    ) -> Result<BTreeMap<String, NodeId>, GenerateError> {
        let keys: Vec<DefinitionKey> = self.context.defined_keys().cloned().collect();
        let mut plans: Vec<DefinitionPlan> = keys
            .into_iter()
            .map(|key| {
                let shared = self.should_produce_definition(&key, main_key);
                let nullable_count = self.context.nullable_references(&key).len();
                let nullable_shared = nullable_count > 0 && self.needs_nullable_definition(&key, nullable_count);
                DefinitionPlan {
                    key,
                    shared,
                    nullable_shared,
                    name: String::new(),
                    nullable_name: None,
                }
            })
            .collect();
        self.assign_names(&mut plans, main_key)?;

        let mut definitions = BTreeMap::new();
        for plan in &plans {
            self.update_references(plan, main_key, prefix, &mut definitions);
        }
        Ok(definitions)
    }

    fn should_produce_definition(&self, key: &DefinitionKey, main_key: Option<&DefinitionKey>) -> bool {
        let references = self.context.references(key).len();
        let nullable_references = self.context.nullable_references(key).len();
        if main_key == Some(key) {
            return references + nullable_references > 0;
        }
        if self.context.should_never_inline(key) {
            return true;
        }
        if self.config.should_inline_all_schemas() {
            return false;
        }
        references > 0
            && (self.config.should_create_definitions_for_all_objects() || references + nullable_references >= 2)
    }

    fn needs_nullable_definition(&self, key: &DefinitionKey, nullable_references: usize) -> bool {
        if self.context.should_never_inline(key) {
            return true;
        }
        if self.config.should_inline_all_schemas() {
            return false;
        }
        self.config.should_create_definitions_for_all_objects() || nullable_references > 1
    }

    /// Whether the main type's definition takes an entry in the definitions
    /// container rather than being addressed as `#`.
    fn main_occupies_slot(&self) -> bool {
        self.config.should_create_definition_for_main_schema() || !self.config.should_point_to_root_for_main_schema()
    }

    fn assign_names(&self, plans: &mut [DefinitionPlan], main_key: Option<&DefinitionKey>) -> Result<(), GenerateError> {
        let default_strategy = DefaultNamingStrategy;
        let inner: &dyn DefinitionNamingStrategy = self.config.naming_strategy().unwrap_or(&default_strategy);
        let naming = CleanNamingStrategy::new(inner, self.config.should_use_plain_definition_keys());
        let main_occupies_slot = self.main_occupies_slot();
        let is_main = |key: &DefinitionKey| main_key == Some(key);

        let mut groups: BTreeMap<String, IndexMap<DefinitionKey, String>> = BTreeMap::new();
        for plan in plans.iter().filter(|plan| plan.needs_name()) {
            let name = naming.definition_name_for_key(&plan.key, &self.context);
            groups
                .entry(name.clone())
                .or_default()
                .insert(plan.key.clone(), name);
        }

        let mut names: HashMap<DefinitionKey, String> = HashMap::new();
        for (base_name, mut group) in groups {
            let distinct = group.len() == 1
                || (group.len() == 2 && !main_occupies_slot && group.keys().any(|key| is_main(key)));
            if !distinct {
                debug!(name = %base_name, count = group.len(), "resolving definition name collision");
                let size = group.len();
                naming.adjust_duplicate_names(&mut group, &self.context);
                if group.len() != size {
                    return Err(GenerateError::DuplicateDefinitionNames {
                        names: vec![base_name],
                    });
                }
            }
            names.extend(group);
        }

        let mut occupied: Vec<String> = Vec::new();
        for plan in plans.iter_mut() {
            let Some(name) = names.remove(&plan.key) else {
                continue;
            };
            if plan.shared && (main_occupies_slot || !is_main(&plan.key)) {
                occupied.push(name.clone());
            }
            if plan.nullable_shared {
                let nullable_name = naming.adjust_nullable_name(&plan.key, &name, &self.context);
                occupied.push(nullable_name.clone());
                plan.nullable_name = Some(nullable_name);
            }
            plan.name = name;
        }

        occupied.sort();
        let mut duplicates: Vec<String> = occupied
            .windows(2)
            .filter(|pair| pair[0] == pair[1])
            .map(|pair| pair[0].clone())
            .collect();
        duplicates.dedup();
        if !duplicates.is_empty() {
            return Err(GenerateError::DuplicateDefinitionNames { names: duplicates });
        }
        Ok(())
    }

    fn update_references(
        &mut self,
        plan: &DefinitionPlan,
        main_key: Option<&DefinitionKey>,
        prefix: &str,
        definitions: &mut BTreeMap<String, NodeId>,
    ) {
        let Some(definition) = self.context.definition(&plan.key) else {
            return;
        };
        let ref_tag = self.context.keyword(SchemaKeyword::Ref);
        let sites = self.context.references(&plan.key).to_vec();

        let pointer = if plan.shared {
            let pointer = if main_key == Some(&plan.key) && !self.main_occupies_slot() {
                "#".to_string()
            } else {
                definitions.insert(plan.name.clone(), definition);
                format!("{prefix}{}", plan.name)
            };
            debug!(definition = %plan.key.ty(), %pointer, references = sites.len(), "sharing definition");
            for site in sites {
                self.context.arena_mut().insert(site, ref_tag, pointer.as_str());
            }
            Some(pointer)
        } else {
            debug!(definition = %plan.key.ty(), references = sites.len(), "inlining definition");
            for site in sites {
                self.context.arena_mut().merge_missing(site, definition);
            }
            None
        };

        let nullable_sites = self.context.nullable_references(&plan.key).to_vec();
        if nullable_sites.is_empty() {
            return;
        }
        let variant = match &pointer {
            Some(pointer) => {
                let node = self.context.arena_mut().create_node();
                self.context.arena_mut().insert(node, ref_tag, pointer.as_str());
                node
            }
            None => self.context.arena_mut().copy_node(definition),
        };
        self.context.make_nullable(variant);

        match &plan.nullable_name {
            Some(nullable_name) => {
                debug!(definition = %plan.key.ty(), name = %nullable_name, "sharing nullable definition");
                definitions.insert(nullable_name.clone(), variant);
                let pointer = format!("{prefix}{nullable_name}");
                for site in nullable_sites {
                    self.context.arena_mut().insert(site, ref_tag, pointer.as_str());
                }
            }
            None => {
                for site in nullable_sites {
                    self.context.arena_mut().merge_missing(site, variant);
                }
            }
        }
    }
}
