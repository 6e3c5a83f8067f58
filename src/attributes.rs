//! Attribute collection for members and types.
//!
//! Attributes are gathered into a fresh node; callers merge that node into a
//! schema body with [`crate::node::SchemaArena::merge_missing`] so that
//! nothing already present in the body is overwritten.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::config::{AdditionalProperties, ConfigPart};
use crate::context::GenerationContext;
use crate::error::GenerateError;
use crate::keyword::{SchemaKeyword, SchemaType};
use crate::node::{NodeId, Slot};
use crate::scope::{MemberScope, TypeScope};
use crate::types::ResolvedType;

/// Attributes of a field or method, including instance attribute overrides.
///
/// # Errors
///
/// Propagates errors from referenced definitions and attribute overrides.
pub fn collect_member_attributes(
    member: &MemberScope,
    context: &mut GenerationContext<'_>,
) -> Result<NodeId, GenerateError> {
    let part = context.config().for_member(member);
    let node = context.arena_mut().create_node();

    set_string(context, node, SchemaKeyword::Title, part.resolve_title(member));
    set_string(context, node, SchemaKeyword::Description, part.resolve_description(member));
    set_value(context, node, SchemaKeyword::Default, part.resolve_default(member));
    set_enum(context, node, part.resolve_enum(member));
    if part.is_read_only(member) {
        set_value(context, node, SchemaKeyword::ReadOnly, Some(Value::Bool(true)));
    }
    if part.is_write_only(member) {
        set_value(context, node, SchemaKeyword::WriteOnly, Some(Value::Bool(true)));
    }
    set_additional_properties(context, node, part.resolve_additional_properties(member))?;
    set_pattern_properties(context, node, part.resolve_pattern_properties(member))?;
    set_string_constraints(context, node, part, member);
    set_number_constraints(context, node, part, member);
    set_array_constraints(context, node, part, member);

    for apply in &part.attribute_overrides {
        apply(node, member, context)?;
    }
    Ok(node)
}

/// Attributes of a type; constraint groups only apply when `allowed_types`
/// is empty or contains a type they are meaningful for.
///
/// # Errors
///
/// Propagates errors from referenced definitions.
pub fn collect_type_attributes(
    scope: &TypeScope,
    context: &mut GenerationContext<'_>,
    allowed_types: &HashSet<String>,
) -> Result<NodeId, GenerateError> {
    let part = context.config().for_types();
    let node = context.arena_mut().create_node();
    let allows = |types: &[SchemaType]| {
        allowed_types.is_empty() || types.iter().any(|ty| allowed_types.contains(ty.as_str()))
    };

    set_string(context, node, SchemaKeyword::Id, part.resolve_id(scope));
    set_string(context, node, SchemaKeyword::Anchor, part.resolve_anchor(scope));
    set_string(context, node, SchemaKeyword::Title, part.resolve_title(scope));
    set_string(context, node, SchemaKeyword::Description, part.resolve_description(scope));
    set_value(context, node, SchemaKeyword::Default, part.resolve_default(scope));
    set_enum(context, node, part.resolve_enum(scope));
    if allows(&[SchemaType::Object]) {
        set_additional_properties(context, node, part.resolve_additional_properties(scope))?;
        set_pattern_properties(context, node, part.resolve_pattern_properties(scope))?;
    }
    if allows(&[SchemaType::String]) {
        set_string_constraints(context, node, part, scope);
    }
    if allows(&[SchemaType::Integer, SchemaType::Number]) {
        set_number_constraints(context, node, part, scope);
    }
    if allows(&[SchemaType::Array]) {
        set_array_constraints(context, node, part, scope);
    }
    Ok(node)
}

fn set_value(context: &mut GenerationContext<'_>, node: NodeId, keyword: SchemaKeyword, value: Option<Value>) {
    if let Some(value) = value {
        let tag = context.keyword(keyword);
        context.arena_mut().insert(node, tag, value);
    }
}

fn set_string(context: &mut GenerationContext<'_>, node: NodeId, keyword: SchemaKeyword, value: Option<String>) {
    set_value(context, node, keyword, value.map(Value::String));
}

fn set_number(context: &mut GenerationContext<'_>, node: NodeId, keyword: SchemaKeyword, value: Option<Number>) {
    set_value(context, node, keyword, value.map(Value::Number));
}

fn set_count(context: &mut GenerationContext<'_>, node: NodeId, keyword: SchemaKeyword, value: Option<u64>) {
    set_value(context, node, keyword, value.map(Value::from));
}

/// `const` for a single allowed value (unless configured otherwise), else `enum`.
///
/// Only scalar values and `null` are allowed values.
fn set_enum(context: &mut GenerationContext<'_>, node: NodeId, values: Option<Vec<Value>>) {
    let Some(values) = values else {
        return;
    };
    let mut values: Vec<Value> = values
        .into_iter()
        .filter(|value| !value.is_array() && !value.is_object())
        .collect();
    if values.len() == 1 && context.config().should_represent_single_allowed_value_as_const() {
        set_value(context, node, SchemaKeyword::Const, values.pop());
    } else if !values.is_empty() {
        set_value(context, node, SchemaKeyword::Enum, Some(Value::Array(values)));
    }
}

fn set_additional_properties(
    context: &mut GenerationContext<'_>,
    node: NodeId,
    additional: Option<AdditionalProperties>,
) -> Result<(), GenerateError> {
    let tag = context.keyword(SchemaKeyword::AdditionalProperties);
    match additional {
        Some(AdditionalProperties::Forbidden) => {
            context.arena_mut().insert(node, tag, false);
        }
        Some(AdditionalProperties::Schema(ty)) if !ty.is_object() => {
            let schema = context.create_definition_reference(&ty)?;
            context.arena_mut().insert(node, tag, schema);
        }
        _ => {}
    }
    Ok(())
}

fn set_pattern_properties(
    context: &mut GenerationContext<'_>,
    node: NodeId,
    patterns: Option<IndexMap<String, ResolvedType>>,
) -> Result<(), GenerateError> {
    let Some(patterns) = patterns.filter(|patterns| !patterns.is_empty()) else {
        return Ok(());
    };
    let mut entries = IndexMap::new();
    for (pattern, ty) in patterns {
        let schema = context.create_definition_reference(&ty)?;
        entries.insert(pattern, Slot::Node(schema));
    }
    let tag = context.keyword(SchemaKeyword::PatternProperties);
    context.arena_mut().insert(node, tag, Slot::Object(entries));
    Ok(())
}

fn set_string_constraints<S>(context: &mut GenerationContext<'_>, node: NodeId, part: &ConfigPart<S>, scope: &S) {
    set_count(context, node, SchemaKeyword::MinLength, part.resolve_string_min_length(scope));
    set_count(context, node, SchemaKeyword::MaxLength, part.resolve_string_max_length(scope));
    set_string(context, node, SchemaKeyword::Format, part.resolve_string_format(scope));
    set_string(context, node, SchemaKeyword::Pattern, part.resolve_string_pattern(scope));
}

fn set_number_constraints<S>(context: &mut GenerationContext<'_>, node: NodeId, part: &ConfigPart<S>, scope: &S) {
    set_number(context, node, SchemaKeyword::Minimum, part.resolve_number_inclusive_minimum(scope));
    set_number(context, node, SchemaKeyword::ExclusiveMinimum, part.resolve_number_exclusive_minimum(scope));
    set_number(context, node, SchemaKeyword::Maximum, part.resolve_number_inclusive_maximum(scope));
    set_number(context, node, SchemaKeyword::ExclusiveMaximum, part.resolve_number_exclusive_maximum(scope));
    set_number(context, node, SchemaKeyword::MultipleOf, part.resolve_number_multiple_of(scope));
}

fn set_array_constraints<S>(context: &mut GenerationContext<'_>, node: NodeId, part: &ConfigPart<S>, scope: &S) {
    set_count(context, node, SchemaKeyword::MinItems, part.resolve_array_min_items(scope));
    set_count(context, node, SchemaKeyword::MaxItems, part.resolve_array_max_items(scope));
    set_value(
        context,
        node,
        SchemaKeyword::UniqueItems,
        part.resolve_array_unique_items(scope).map(Value::Bool),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use serde_json::json;

    use crate::config::ConfigBuilder;
    use crate::keyword::SchemaVersion;
    use crate::loader::load_catalog_str;
    use crate::options::{GeneratorOption, OptionPreset};
    use crate::type_context::TypeContext;

    const CATALOG: &str = r#"{"types":[
        { "name": "Account", "fields": [{ "name": "owner", "type": "String" }] }
    ]}"#;

    fn owner_field(context: &Rc<TypeContext>) -> MemberScope {
        let account = context.resolve("Account").unwrap();
        let members = context.members(&account);
        MemberScope::field(account, members, 0, Rc::clone(context))
    }

    #[test]
    fn member_attributes_in_keyword_order() {
        let mut builder = ConfigBuilder::new(SchemaVersion::Draft2020_12, OptionPreset::PlainJson);
        builder
            .for_fields()
            .with_description_resolver(|_| Some("who owns it".into()))
            .with_title_resolver(|_| Some("Owner".into()))
            .with_enum_resolver(|_| Some(vec![json!("alice"), json!({ "nested": true })]))
            .with_string_min_length_resolver(|_| Some(1))
            .with_read_only_check(|_| true);
        let config = builder.build();
        let types = Rc::new(TypeContext::new(load_catalog_str(CATALOG).unwrap()));
        let mut context = GenerationContext::new(&config, Rc::clone(&types));

        let node = collect_member_attributes(&owner_field(&types), &mut context).unwrap();
        let value = context.arena().materialize(node).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "Owner",
                "description": "who owns it",
                "const": "alice",
                "readOnly": true,
                "minLength": 1
            })
        );
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["title", "description", "const", "readOnly", "minLength"]);
    }

    #[test]
    fn single_value_as_enum_when_configured() {
        let mut builder = ConfigBuilder::new(SchemaVersion::Draft2020_12, OptionPreset::PlainJson);
        builder
            .with(GeneratorOption::EnumKeywordForSingleValues)
            .for_fields()
            .with_enum_resolver(|_| Some(vec![json!(1)]));
        let config = builder.build();
        let types = Rc::new(TypeContext::new(load_catalog_str(CATALOG).unwrap()));
        let mut context = GenerationContext::new(&config, Rc::clone(&types));

        let node = collect_member_attributes(&owner_field(&types), &mut context).unwrap();
        assert_eq!(
            context.arena().materialize(node).unwrap(),
            json!({ "enum": [1] })
        );
    }

    #[test]
    fn type_constraints_follow_allowed_types() {
        let mut builder = ConfigBuilder::new(SchemaVersion::Draft2020_12, OptionPreset::PlainJson);
        builder
            .for_types()
            .with_string_format_resolver(|_| Some("email".into()))
            .with_number_inclusive_minimum_resolver(|_| Some(Number::from(0)))
            .with_additional_properties_resolver(|_| Some(AdditionalProperties::Forbidden));
        let config = builder.build();
        let types = Rc::new(TypeContext::new(load_catalog_str(CATALOG).unwrap()));
        let mut context = GenerationContext::new(&config, Rc::clone(&types));
        let scope = context.type_scope(ResolvedType::simple("String"));

        let allowed = HashSet::from(["string".to_string()]);
        let node = collect_type_attributes(&scope, &mut context, &allowed).unwrap();
        assert_eq!(
            context.arena().materialize(node).unwrap(),
            json!({ "format": "email" })
        );

        let node = collect_type_attributes(&scope, &mut context, &HashSet::new()).unwrap();
        assert_eq!(
            context.arena().materialize(node).unwrap(),
            json!({ "additionalProperties": false, "format": "email", "minimum": 0 })
        );
    }
}
