//! Final cleanup passes over generated documents.
//!
//! Passes run on materialized JSON, after every reference has been resolved:
//!
//! 1. `allOf` parts without conflicting keywords are merged into their parent.
//! 2. `anyOf` parts that only hold another `anyOf` are spliced into the outer list.
//! 3. Member attributes repeating those of the referenced definition are dropped.
//! 4. A `type` implied by the present keywords is added where it is missing.
//!
//! Passes 1, 3 and 4 are optional.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::config::GeneratorConfig;
use crate::keyword::{SchemaKeyword, SchemaType, SchemaVersion, TagContent};

type SchemaMap = Map<String, Value>;

/// Applies the configured cleanup passes.
#[derive(Debug)]
pub struct SchemaCleaner<'a> {
    config: &'a GeneratorConfig,
    version: SchemaVersion,
}

impl<'a> SchemaCleaner<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self {
            config,
            version: config.version(),
        }
    }

    fn tag(&self, keyword: SchemaKeyword) -> &'static str {
        self.config.keyword(keyword)
    }

    /// Clean up a complete document carrying its own definitions container.
    pub fn clean_up_document(&self, document: &mut Value) {
        let prefix = self.version.definitions_prefix();
        self.clean_up(&mut [document], &prefix);
    }

    /// Clean up a bare definitions map together with the schemas referring
    /// into it, where `prefix` is the pointer prefix of the map's entries.
    pub fn clean_up_definitions(&self, definitions: &mut SchemaMap, references: &mut [Value], prefix: &str) {
        let defs_tag = self.tag(SchemaKeyword::Definitions);
        let mut container = Value::Object(Map::from_iter([(
            defs_tag.to_string(),
            Value::Object(std::mem::take(definitions)),
        )]));
        let mut schemas: Vec<&mut Value> = Vec::with_capacity(references.len() + 1);
        schemas.push(&mut container);
        schemas.extend(references.iter_mut());
        self.clean_up(&mut schemas, prefix);

        if let Value::Object(mut container) = container {
            if let Some(Value::Object(cleaned)) = container.remove(defs_tag) {
                *definitions = cleaned;
            }
        }
    }

    /// `schemas[0]` holds the definitions container.
    fn clean_up(&self, schemas: &mut [&mut Value], prefix: &str) {
        if self.config.should_clean_up_all_of() {
            for schema in schemas.iter_mut() {
                self.walk(schema, &mut |node: &mut SchemaMap| self.merge_all_of_parts(node));
            }
        }
        for schema in schemas.iter_mut() {
            self.walk(schema, &mut |node: &mut SchemaMap| self.flatten_any_of_parts(node));
        }
        if self.config.should_clean_up_duplicate_member_attributes() {
            let definitions = schemas
                .first()
                .and_then(|schema| schema.get(self.tag(SchemaKeyword::Definitions)))
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            for schema in schemas.iter_mut() {
                self.walk(schema, &mut |node: &mut SchemaMap| {
                    self.remove_redundant_member_attributes(node, &definitions, prefix)
                });
            }
        }
        if self.config.should_include_strict_type_info() {
            for schema in schemas.iter_mut() {
                self.walk(schema, &mut |node: &mut SchemaMap| self.add_strict_type_info(node));
                self.walk(schema, &mut |node: &mut SchemaMap| self.flatten_any_of_parts(node));
            }
        }
    }

    /// Visit every schema object, sub-schemas before the schema containing them.
    fn walk(&self, schema: &mut Value, action: &mut dyn FnMut(&mut SchemaMap)) {
        let Value::Object(node) = schema else {
            return;
        };
        for (tag, value) in node.iter_mut() {
            let Some(keyword) = SchemaKeyword::for_tag(tag, self.version) else {
                continue;
            };
            let contents = keyword.contents();
            if value.is_object() && contents.contains(&TagContent::Schema) {
                self.walk(value, action);
                continue;
            }
            match value {
                Value::Object(named) if contents.contains(&TagContent::NamedSchemas) => {
                    for sub_schema in named.values_mut() {
                        self.walk(sub_schema, action);
                    }
                }
                Value::Array(items) if contents.contains(&TagContent::ArrayOfSchemas) => {
                    for sub_schema in items {
                        self.walk(sub_schema, action);
                    }
                }
                _ => {}
            }
        }
        action(node);
    }

    // --- allOf ---

    fn merge_all_of_parts(&self, node: &mut SchemaMap) {
        let all_of = self.tag(SchemaKeyword::AllOf);
        let Some(Value::Array(parts)) = node.get(all_of) else {
            return;
        };
        let main = Value::Object(node.clone());
        let mut all_parts: Vec<&Value> = vec![&main];
        all_parts.extend(parts.iter());

        let Some(merged) = self.merge_schemas(&all_parts, true) else {
            return;
        };
        debug!(parts = all_parts.len() - 1, "merged allOf parts");
        node.remove(all_of);
        node.extend(merged);
    }

    /// Merge several schemas into one; `None` when they conflict.
    ///
    /// With `with_main`, `parts[0]` is the schema holding the `allOf` being
    /// merged and its own `allOf` value is left out.
    fn merge_schemas(&self, parts: &[&Value], with_main: bool) -> Option<SchemaMap> {
        let mut fields: IndexMap<&str, Vec<&Value>> = IndexMap::new();
        for part in parts {
            match part {
                Value::Bool(true) => {}
                Value::Object(map) => {
                    for (tag, value) in map {
                        fields.entry(tag.as_str()).or_default().push(value);
                    }
                }
                _ => return None,
            }
        }

        let ref_tag = self.tag(SchemaKeyword::Ref);
        if self.version.is_ref_exclusive() && fields.contains_key(ref_tag) {
            let main_size = match (with_main, parts.first()) {
                (true, Some(Value::Object(main))) => main.len(),
                _ => 0,
            };
            if (!with_main && parts.len() > 1) || main_size > 1 || parts.len() > 2 {
                trace!("allOf with a $ref next to other keywords is kept");
                return None;
            }
        }
        if fields.contains_key(self.tag(SchemaKeyword::If)) {
            return None;
        }

        let all_of = self.tag(SchemaKeyword::AllOf);
        let mut merged = SchemaMap::new();
        for (tag, values) in &fields {
            let values = if with_main && *tag == all_of {
                &values[1..]
            } else {
                &values[..]
            };
            match values {
                [] => continue,
                [single] => {
                    merged.insert(tag.to_string(), (*single).clone());
                }
                _ => {
                    let keyword = SchemaKeyword::for_tag(tag, self.version)?;
                    merged.insert(tag.to_string(), self.merge_values(keyword, values)?);
                }
            }
        }
        Some(merged)
    }

    fn merge_values(&self, keyword: SchemaKeyword, values: &[&Value]) -> Option<Value> {
        match keyword {
            SchemaKeyword::AllOf | SchemaKeyword::Required => union_of_arrays(values),
            SchemaKeyword::Properties => merge_named(values),
            SchemaKeyword::DependentRequired => merge_dependent_required(values),
            SchemaKeyword::DependentSchemas => {
                if self.version.is_ref_exclusive() {
                    // "dependencies" holds either property lists or schemas
                    merge_dependent_required(values).or_else(|| merge_named(values))
                } else {
                    merge_named(values)
                }
            }
            SchemaKeyword::Items
            | SchemaKeyword::UnevaluatedItems
            | SchemaKeyword::AdditionalProperties
            | SchemaKeyword::UnevaluatedProperties => self.merge_schemas(values, false).map(Value::Object),
            SchemaKeyword::Type => intersect_types(values),
            SchemaKeyword::MaxItems
            | SchemaKeyword::MaxProperties
            | SchemaKeyword::Maximum
            | SchemaKeyword::ExclusiveMaximum
            | SchemaKeyword::MaxLength => pick_number(values, |candidate, current| candidate < current),
            SchemaKeyword::MinItems
            | SchemaKeyword::MinProperties
            | SchemaKeyword::Minimum
            | SchemaKeyword::ExclusiveMinimum
            | SchemaKeyword::MinLength => pick_number(values, |candidate, current| candidate > current),
            _ => values
                .iter()
                .all(|value| *value == values[0])
                .then(|| values[0].clone()),
        }
    }

    // --- anyOf ---

    fn flatten_any_of_parts(&self, node: &mut SchemaMap) {
        let any_of = self.tag(SchemaKeyword::AnyOf);
        let Some(Value::Array(parts)) = node.get_mut(any_of) else {
            return;
        };
        let nested = |part: &Value| {
            matches!(part, Value::Object(map) if map.len() == 1 && matches!(map.get(any_of), Some(Value::Array(_))))
        };
        if !parts.iter().any(nested) {
            return;
        }
        let mut flattened = Vec::with_capacity(parts.len());
        for part in parts.drain(..) {
            match part {
                Value::Object(mut inner) if inner.len() == 1 => match inner.remove(any_of) {
                    Some(Value::Array(nested_parts)) => flattened.extend(nested_parts),
                    Some(other) => {
                        inner.insert(any_of.to_string(), other);
                        flattened.push(Value::Object(inner));
                    }
                    None => flattened.push(Value::Object(inner)),
                },
                other => flattened.push(other),
            }
        }
        *parts = flattened;
    }

    // --- Member attributes ---

    fn remove_redundant_member_attributes(&self, node: &mut SchemaMap, definitions: &SchemaMap, prefix: &str) {
        let ref_tag = self.tag(SchemaKeyword::Ref);
        let conditional = [
            self.tag(SchemaKeyword::If),
            self.tag(SchemaKeyword::Then),
            self.tag(SchemaKeyword::Else),
        ];
        let Some(Value::Object(properties)) = node.get_mut(self.tag(SchemaKeyword::Properties)) else {
            return;
        };
        for member in properties.values_mut() {
            let Value::Object(member) = member else {
                continue;
            };
            let Some(Value::Object(definition)) = member
                .get(ref_tag)
                .and_then(Value::as_str)
                .and_then(|pointer| pointer.strip_prefix(prefix))
                .and_then(|name| definitions.get(name))
            else {
                continue;
            };
            let conditional_equal = conditional
                .iter()
                .all(|tag| member.get(*tag) == definition.get(*tag));
            member.retain(|tag, value| {
                if tag == ref_tag || (conditional.contains(&tag.as_str()) && !conditional_equal) {
                    return true;
                }
                definition.get(tag) != Some(&*value)
            });
        }
    }

    // --- Strict type info ---

    fn add_strict_type_info(&self, node: &mut SchemaMap) {
        let type_tag = self.tag(SchemaKeyword::Type);
        if node.contains_key(type_tag) {
            return;
        }
        let mut types: BTreeSet<SchemaType> = node
            .keys()
            .filter_map(|tag| SchemaKeyword::for_tag(tag, self.version))
            .flat_map(|keyword| keyword.implied_types().iter().copied())
            .collect();
        if types.is_empty() {
            return;
        }
        let allows_null = node.get(self.tag(SchemaKeyword::Const)) == Some(&Value::Null)
            || matches!(
                node.get(self.tag(SchemaKeyword::Enum)),
                Some(Value::Array(values)) if values.contains(&Value::Null)
            );
        if allows_null {
            types.insert(SchemaType::Null);
        }
        let mut names: Vec<Value> = types.iter().map(|ty| Value::from(ty.as_str())).collect();
        let value = if names.len() == 1 {
            names.remove(0)
        } else {
            Value::Array(names)
        };
        node.insert(type_tag.to_string(), value);
    }
}

/// Concatenate arrays, keeping the first occurrence of each value.
fn union_of_arrays(values: &[&Value]) -> Option<Value> {
    let mut union: Vec<Value> = Vec::new();
    for value in values {
        for item in value.as_array()? {
            if !union.contains(item) {
                union.push(item.clone());
            }
        }
    }
    Some(Value::Array(union))
}

/// Merge objects whose shared keys must hold equal values.
fn merge_named(values: &[&Value]) -> Option<Value> {
    let mut merged = SchemaMap::new();
    for value in values {
        for (name, schema) in value.as_object()? {
            match merged.get(name) {
                Some(existing) if existing != schema => return None,
                Some(_) => {}
                None => {
                    merged.insert(name.clone(), schema.clone());
                }
            }
        }
    }
    Some(Value::Object(merged))
}

fn merge_dependent_required(values: &[&Value]) -> Option<Value> {
    let mut merged: IndexMap<&str, Vec<&Value>> = IndexMap::new();
    for value in values {
        for (lead, dependents) in value.as_object()? {
            if !dependents.is_array() {
                return None;
            }
            merged.entry(lead.as_str()).or_default().push(dependents);
        }
    }
    let mut result = SchemaMap::new();
    for (lead, dependents) in merged {
        result.insert(lead.to_string(), union_of_arrays(&dependents)?);
    }
    Some(Value::Object(result))
}

fn intersect_types(values: &[&Value]) -> Option<Value> {
    let as_list = |value: &Value| -> Option<Vec<String>> {
        match value {
            Value::String(single) => Some(vec![single.clone()]),
            Value::Array(types) => types
                .iter()
                .map(|ty| ty.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    };
    let mut common = as_list(values.first().copied()?)?;
    for value in values.iter().skip(1).copied() {
        let other = as_list(value)?;
        common.retain(|ty| other.contains(ty));
    }
    match common.len() {
        0 => None,
        1 => common.pop().map(Value::String),
        _ => Some(Value::Array(common.into_iter().map(Value::String).collect())),
    }
}

/// The number `prefer` keeps over all others.
fn pick_number(values: &[&Value], prefer: fn(f64, f64) -> bool) -> Option<Value> {
    let mut picked: Option<(&Value, f64)> = None;
    for value in values.iter().copied() {
        let number = value.as_f64()?;
        match picked {
            Some((_, current)) if !prefer(number, current) => {}
            _ => picked = Some((value, number)),
        }
    }
    picked.map(|(value, _)| value.clone())
}
