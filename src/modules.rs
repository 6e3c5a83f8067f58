//! Built-in configuration modules.
//!
//! Every generator option that changes how types are described is backed by
//! a small set of resolvers registered here. [`apply_option_modules`] runs
//! during [`ConfigBuilder::build`], after all caller-supplied configuration,
//! so caller resolvers always rank first.

use serde_json::{Number, Value};

use crate::config::{AdditionalProperties, ConfigBuilder, ConfigPart, CustomDefinition, Module};
use crate::context::GenerationContext;
use crate::keyword::{SchemaKeyword, SchemaType};
use crate::node::NodeId;
use crate::options::{GeneratorOption, OptionSet};
use crate::scope::{MemberScope, TypeScope};
use crate::types::ResolvedType;

const OPTIONAL_TYPE: &str = "Optional";
const SUPPLIER_TYPE: &str = "Supplier";
const MAP_TYPE: &str = "Map";

/// `Optional` methods kept by simplified optionals.
const OPTIONAL_METHODS: &[&str] = &["get", "orElse", "isPresent"];

/// Register the resolvers of every enabled option.
///
/// Registration follows option declaration order, which decides precedence
/// between modules contributing to the same resolver chain.
pub(crate) fn apply_option_modules(builder: &mut ConfigBuilder, options: &OptionSet) {
    use GeneratorOption::*;

    apply_simple_types(builder, options.is_enabled(AdditionalFixedTypes));
    if options.is_enabled(FlattenedEnums) {
        apply_enums(builder, true);
    } else if options.is_enabled(SimplifiedEnums) {
        apply_enums(builder, false);
    }
    if options.is_enabled(SimplifiedOptionals) {
        apply_simplified_optionals(builder);
    }
    if options.is_enabled(FlattenedOptionals) {
        apply_flattened_wrapper(builder, OPTIONAL_TYPE, true);
    }
    if options.is_enabled(FlattenedSuppliers) {
        apply_flattened_wrapper(builder, SUPPLIER_TYPE, false);
    }
    if options.is_enabled(ValuesFromConstantFields) {
        apply_constant_values(builder);
    }
    apply_field_exclusions(builder, options);
    apply_method_exclusions(builder, options);
    if options.is_enabled(MapValuesAsAdditionalProperties) {
        apply_map_values(builder);
    }
    if options.is_enabled(ForbiddenAdditionalPropertiesByDefault) {
        apply_forbidden_additional_properties(builder);
    }
    apply_declared_subtypes(builder);
}

// --- Simple types ---

/// JSON type and `format` of a type with a fixed schema.
///
/// `Object` maps to `(None, None)`, the empty schema.
fn fixed_schema(
    erased_name: &str,
    additional_types: bool,
) -> Option<(Option<SchemaType>, Option<&'static str>)> {
    let fixed = match erased_name {
        "Object" => (None, None),
        "String" | "CharSequence" | "Character" | "char" | "Byte" | "byte" => {
            (Some(SchemaType::String), None)
        }
        "Boolean" | "boolean" => (Some(SchemaType::Boolean), None),
        "Integer" | "int" => (Some(SchemaType::Integer), Some("int32")),
        "Long" | "long" => (Some(SchemaType::Integer), Some("int64")),
        "Short" | "short" => (Some(SchemaType::Integer), None),
        "Double" | "double" => (Some(SchemaType::Number), Some("double")),
        "Float" | "float" => (Some(SchemaType::Number), Some("float")),
        "Void" => (Some(SchemaType::Null), None),
        _ if !additional_types => return None,
        "LocalDate" => (Some(SchemaType::String), Some("date")),
        "LocalDateTime" | "LocalTime" | "ZonedDateTime" | "OffsetDateTime" | "OffsetTime"
        | "Instant" | "Date" => (Some(SchemaType::String), Some("date-time")),
        "UUID" => (Some(SchemaType::String), Some("uuid")),
        "URI" => (Some(SchemaType::String), Some("uri")),
        "ZoneId" => (Some(SchemaType::String), None),
        "BigInteger" => (Some(SchemaType::Integer), None),
        "BigDecimal" | "Number" => (Some(SchemaType::Number), None),
        _ => return None,
    };
    Some(fixed)
}

fn apply_simple_types(builder: &mut ConfigBuilder, additional_types: bool) {
    builder
        .for_types()
        .with_custom_definition_provider(move |scope, context| {
            let ty = scope.ty();
            if ty.is_array() || !ty.type_parameters().is_empty() {
                return Ok(None);
            }
            let Some((schema_type, format)) = fixed_schema(ty.erased_name(), additional_types) else {
                return Ok(None);
            };
            let node = context.arena_mut().create_node();
            if let Some(schema_type) = schema_type {
                insert(context, node, SchemaKeyword::Type, Value::from(schema_type.as_str()));
            }
            if let Some(format) = format {
                insert(context, node, SchemaKeyword::Format, Value::from(format));
            }
            Ok(Some(CustomDefinition::inline(node)))
        })
        // an empty schema already allows anything
        .with_additional_properties_resolver(|scope: &TypeScope| {
            scope.ty().is_object().then_some(AdditionalProperties::Unrestricted)
        });

    for part in [MemberPart::Fields, MemberPart::Methods] {
        part.of(builder).with_nullable_check(|member| {
            let primitive = member
                .ty()
                .is_some_and(|ty| member.context().is_primitive(ty));
            primitive.then_some(false)
        });
    }
}

#[derive(Clone, Copy)]
enum MemberPart {
    Fields,
    Methods,
}

impl MemberPart {
    fn of(self, builder: &mut ConfigBuilder) -> &mut ConfigPart<MemberScope> {
        match self {
            MemberPart::Fields => builder.for_fields(),
            MemberPart::Methods => builder.for_methods(),
        }
    }
}

fn insert(context: &mut GenerationContext<'_>, node: NodeId, keyword: SchemaKeyword, value: Value) {
    let tag = context.keyword(keyword);
    context.arena_mut().insert(node, tag, value);
}

// --- Enums ---

/// Enum types as a list of their constant names, typed as strings when
/// `typed` is set.
fn apply_enums(builder: &mut ConfigBuilder, typed: bool) {
    builder
        .for_types()
        .with_custom_definition_provider(move |scope, context| {
            let Some(constants) = scope.enum_constants() else {
                return Ok(None);
            };
            let node = context.arena_mut().create_node();
            if typed {
                insert(context, node, SchemaKeyword::Type, Value::from(SchemaType::String.as_str()));
            }
            let values = constants.into_iter().map(Value::String).collect();
            insert(context, node, SchemaKeyword::Enum, Value::Array(values));
            Ok(Some(CustomDefinition::new(node)))
        });
}

// --- Wrapper types ---

fn is_wrapper(ty: Option<&ResolvedType>, erased_name: &str) -> bool {
    ty.is_some_and(|ty| !ty.is_array() && ty.erased_name() == erased_name)
}

fn apply_simplified_optionals(builder: &mut ConfigBuilder) {
    builder
        .for_fields()
        .with_ignore_check(|field| is_wrapper(field.declaring_type(), OPTIONAL_TYPE));
    builder.for_methods().with_ignore_check(|method| {
        is_wrapper(method.declaring_type(), OPTIONAL_TYPE)
            && !OPTIONAL_METHODS.contains(&method.declared_name())
    });
}

/// Members of the wrapper type are described by the wrapped type instead;
/// with `nullable` set they also accept `null`.
fn apply_flattened_wrapper(builder: &mut ConfigBuilder, erased_name: &'static str, nullable: bool) {
    for part in [MemberPart::Fields, MemberPart::Methods] {
        let part = part.of(builder);
        part.with_target_type_overrides_resolver(move |member| {
            let ty = member.ty().filter(|ty| is_wrapper(Some(*ty), erased_name))?;
            let wrapped = ty
                .type_parameters()
                .first()
                .cloned()
                .unwrap_or_else(ResolvedType::object);
            Some(vec![wrapped])
        });
        if nullable {
            part.with_nullable_check(move |member| {
                let wrapped = is_wrapper(member.declared_type(), erased_name)
                    || (member.is_fake_container_item() && is_wrapper(member.ty(), erased_name));
                wrapped.then_some(true)
            });
        }
    }
}

// --- Constant values ---

fn apply_constant_values(builder: &mut ConfigBuilder) {
    let constant = |field: &MemberScope| -> Option<Value> {
        if field.is_fake_container_item() || field.is_enum_constant() {
            return None;
        }
        field.constant_value().cloned()
    };
    builder
        .for_fields()
        .with_enum_resolver(move |field| constant(field).map(|value| vec![value]))
        .with_nullable_check(move |field| constant(field).map(|value| value.is_null()));
}

// --- Member exclusion ---

fn apply_field_exclusions(builder: &mut ConfigBuilder, options: &OptionSet) {
    use GeneratorOption::*;

    let fields = builder.for_fields();
    if !options.is_enabled(PublicStaticFields) {
        fields.with_ignore_check(|field| field.is_static() && field.is_public());
    }
    if !options.is_enabled(NonPublicStaticFields) {
        fields.with_ignore_check(|field| field.is_static() && !field.is_public());
    }
    if !options.is_enabled(PublicNonStaticFields) {
        fields.with_ignore_check(|field| !field.is_static() && field.is_public());
    }
    if !options.is_enabled(NonPublicNonStaticFieldsWithGetters) {
        fields.with_ignore_check(|field| {
            !field.is_static() && !field.is_public() && field.has_getter()
        });
    }
    if !options.is_enabled(NonPublicNonStaticFieldsWithoutGetters) {
        fields.with_ignore_check(|field| {
            !field.is_static() && !field.is_public() && !field.has_getter()
        });
    }
    if !options.is_enabled(TransientFields) {
        fields.with_ignore_check(MemberScope::is_transient);
    }
}

fn apply_method_exclusions(builder: &mut ConfigBuilder, options: &OptionSet) {
    use GeneratorOption::*;

    let methods = builder.for_methods();
    if !options.is_enabled(StaticMethods) {
        methods.with_ignore_check(MemberScope::is_static);
    }
    if !options.is_enabled(VoidMethods) {
        methods.with_ignore_check(MemberScope::is_void);
    }
    if !options.is_enabled(GetterMethods) {
        methods.with_ignore_check(|method| !method.is_static() && method.is_getter());
    }
    if !options.is_enabled(NonStaticNonVoidNonGetterMethods) {
        methods.with_ignore_check(|method| {
            !method.is_static() && !method.is_void() && !method.is_getter()
        });
    }
}

// --- Additional properties ---

fn apply_map_values(builder: &mut ConfigBuilder) {
    builder
        .for_types()
        .with_additional_properties_resolver(|scope: &TypeScope| {
            if !scope.is_instance_of(MAP_TYPE) {
                return None;
            }
            match scope.type_parameter_for(MAP_TYPE, 1) {
                Some(values) if !values.is_object() => Some(AdditionalProperties::Schema(values)),
                _ => Some(AdditionalProperties::Unrestricted),
            }
        });
}

fn apply_forbidden_additional_properties(builder: &mut ConfigBuilder) {
    builder
        .for_types()
        .with_additional_properties_resolver(|scope: &TypeScope| {
            let open = scope.is_container_type() || scope.is_instance_of(MAP_TYPE);
            (!open).then_some(AdditionalProperties::Forbidden)
        });
}

// --- Subtypes ---

/// Subtypes declared in the type graph, parameterized against the supertype.
fn apply_declared_subtypes(builder: &mut ConfigBuilder) {
    builder.with_subtype_resolver(|scope, _context| {
        let introspector = scope.context().introspector();
        let subtypes: Vec<ResolvedType> = introspector
            .declared_subtypes(scope.ty())
            .iter()
            .filter_map(|name| introspector.resolve_subtype(scope.ty(), name))
            .collect();
        (!subtypes.is_empty()).then_some(subtypes)
    });
}

// --- Annotations ---

/// Reads schema attributes from annotations in the type graph.
///
/// Member annotations are looked up on the member first and then on its
/// paired field or getter. Supported annotations and their values:
///
/// | Annotation | Values | Effect |
/// |------------|--------|--------|
/// | `Title`, `Description` | `value` | `title`, `description` (members and types) |
/// | `Nullable` / `NotNull` | | nullable / not nullable |
/// | `Required` | | listed in the parent's `required` |
/// | `ReadOnly`, `WriteOnly` | | `readOnly`, `writeOnly` |
/// | `PropertyName` | `value` | property name override |
/// | `Pattern` | `value` | `pattern` |
/// | `Size` | `min`, `max` | `minLength`/`maxLength`, or `minItems`/`maxItems` on containers |
/// | `Min`, `Max` | `value` | `minimum`, `maximum` |
/// | `Default` | `value` | `default` |
/// | `Format` | `value` | `format` |
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationModule;

impl Module for AnnotationModule {
    fn apply_to_config_builder(&self, builder: &mut ConfigBuilder) {
        apply_member_annotations(builder.for_fields());
        apply_member_annotations(builder.for_methods());
        builder
            .for_types()
            .with_title_resolver(|scope: &TypeScope| type_string(scope, "Title"))
            .with_description_resolver(|scope: &TypeScope| type_string(scope, "Description"));
    }
}

fn apply_member_annotations(part: &mut ConfigPart<MemberScope>) {
    part.with_title_resolver(|member| member_string(member, "Title", "value"))
        .with_description_resolver(|member| member_string(member, "Description", "value"))
        .with_nullable_check(|member| {
            if has_annotation(member, "Nullable") {
                Some(true)
            } else if has_annotation(member, "NotNull") {
                Some(false)
            } else {
                None
            }
        })
        .with_required_check(|member| has_annotation(member, "Required"))
        .with_read_only_check(|member| has_annotation(member, "ReadOnly"))
        .with_write_only_check(|member| has_annotation(member, "WriteOnly"))
        .with_property_name_override_resolver(|member| member_string(member, "PropertyName", "value"))
        .with_default_resolver(|member| member_value(member, "Default", "value"))
        .with_string_format_resolver(|member| member_string(member, "Format", "value"))
        .with_string_pattern_resolver(|member| {
            scalar(member).and_then(|member| member_string(member, "Pattern", "value"))
        })
        .with_string_min_length_resolver(|member| scalar(member).and_then(|m| member_count(m, "min")))
        .with_string_max_length_resolver(|member| scalar(member).and_then(|m| member_count(m, "max")))
        .with_array_min_items_resolver(|member| container(member).and_then(|m| member_count(m, "min")))
        .with_array_max_items_resolver(|member| container(member).and_then(|m| member_count(m, "max")))
        .with_number_inclusive_minimum_resolver(|member| member_number(member, "Min"))
        .with_number_inclusive_maximum_resolver(|member| member_number(member, "Max"));
}

fn scalar(member: &MemberScope) -> Option<&MemberScope> {
    (!member.is_container_type()).then_some(member)
}

fn container(member: &MemberScope) -> Option<&MemberScope> {
    member.is_container_type().then_some(member)
}

fn has_annotation(member: &MemberScope, name: &str) -> bool {
    member.annotation_considering_field_and_getter(name).is_some()
}

fn member_value(member: &MemberScope, name: &str, key: &str) -> Option<Value> {
    member
        .annotation_considering_field_and_getter(name)
        .and_then(|annotation| annotation.value(key).cloned())
}

fn member_string(member: &MemberScope, name: &str, key: &str) -> Option<String> {
    match member_value(member, name, key)? {
        Value::String(value) => Some(value),
        _ => None,
    }
}

fn member_count(member: &MemberScope, key: &str) -> Option<u64> {
    member_value(member, "Size", key).and_then(|value| value.as_u64())
}

fn member_number(member: &MemberScope, name: &str) -> Option<Number> {
    match member_value(member, name, "value")? {
        Value::Number(number) => Some(number),
        _ => None,
    }
}

fn type_string(scope: &TypeScope, name: &str) -> Option<String> {
    scope
        .annotation(name)
        .and_then(|annotation| annotation.str_value("value").map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use serde_json::json;

    use crate::builder::SchemaBuilder;
    use crate::keyword::SchemaVersion;
    use crate::loader::load_catalog_str;
    use crate::options::OptionPreset;
    use crate::type_context::TypeContext;

    const CATALOG: &str = r#"{"types":[
        { "name": "Color", "kind": "enum", "enum_constants": ["RED", "GREEN"] },
        { "name": "Sample", "fields": [
            { "name": "count", "type": "int" },
            { "name": "ratio", "type": "Double" },
            { "name": "when", "type": "LocalDate" },
            { "name": "id", "type": "UUID" },
            { "name": "color", "type": "Color" },
            { "name": "maybe", "type": "Optional<String>" },
            { "name": "lazy", "type": "Supplier<Long>" },
            { "name": "scores", "type": "Map<String, Integer>" },
            { "name": "anything", "type": "Object" },
            { "name": "cache", "type": "String", "transient": true },
            { "name": "VERSION", "type": "String", "visibility": "public",
              "static": true, "final": true, "constant": "1.0" }
        ]},
        { "name": "Bean",
          "annotations": [{ "name": "Title", "values": { "value": "A bean" } }],
          "fields": [
            { "name": "name", "type": "String", "annotations": [
                { "name": "Size", "values": { "min": 1, "max": 20 } },
                { "name": "Pattern", "values": { "value": "^[a-z]+$" } },
                { "name": "Required" }
            ]},
            { "name": "tags", "type": "List<String>", "annotations": [
                { "name": "Size", "values": { "max": 3 } }
            ]},
            { "name": "age", "type": "Integer" }
          ],
          "methods": [
            { "name": "getAge", "returns": "Integer", "visibility": "public", "annotations": [
                { "name": "Min", "values": { "value": 0 } },
                { "name": "Description", "values": { "value": "Age in years" } },
                { "name": "Nullable" }
            ]}
          ]
        },
        { "name": "Badge",
          "fields": [{ "name": "name", "type": "String" }],
          "methods": [
            { "name": "getName", "returns": "String", "visibility": "public", "annotations": [
                { "name": "PropertyName", "values": { "value": "label" } }
            ]}
          ]
        },
        { "name": "Shape", "subtypes": ["Circle", "Square"] },
        { "name": "Circle", "supertypes": ["Shape"], "fields": [{ "name": "radius", "type": "double" }] },
        { "name": "Square", "supertypes": ["Shape"], "fields": [{ "name": "side", "type": "double" }] }
    ]}"#;

    fn generate(builder: ConfigBuilder, type_name: &str) -> Value {
        let config = builder.build();
        let types = Rc::new(TypeContext::new(load_catalog_str(CATALOG).unwrap()));
        let ty = types.resolve(type_name).unwrap();
        SchemaBuilder::new(&config, types)
            .create_schema_for_single_type(&ty)
            .unwrap()
    }

    fn plain_json() -> ConfigBuilder {
        let mut builder = ConfigBuilder::new(SchemaVersion::Draft2020_12, OptionPreset::PlainJson);
        builder.without(GeneratorOption::SchemaVersionIndicator);
        builder
    }

    #[test]
    fn fixed_schemas_for_scalars() {
        assert_eq!(fixed_schema("int", false), Some((Some(SchemaType::Integer), Some("int32"))));
        assert_eq!(fixed_schema("Object", false), Some((None, None)));
        assert_eq!(fixed_schema("UUID", false), None);
        assert_eq!(fixed_schema("UUID", true), Some((Some(SchemaType::String), Some("uuid"))));
        assert_eq!(fixed_schema("Sample", true), None);
    }

    #[test]
    fn plain_json_preset_modules() {
        let schema = generate(plain_json(), "Sample");
        let properties = &schema["properties"];
        assert_eq!(properties["count"], json!({ "type": "integer", "format": "int32" }));
        assert_eq!(properties["ratio"], json!({ "type": "number", "format": "double" }));
        assert_eq!(properties["when"], json!({ "type": "string", "format": "date" }));
        assert_eq!(properties["color"], json!({ "type": "string", "enum": ["RED", "GREEN"] }));
        assert_eq!(properties["maybe"], json!({ "type": ["string", "null"] }));
        assert_eq!(properties["lazy"], json!({ "type": "integer", "format": "int64" }));
        assert_eq!(properties["anything"], json!({}));
        assert!(properties.get("cache").is_none());
        // public static fields are not part of plain JSON
        assert!(properties.get("VERSION").is_none());
    }

    #[test]
    fn constant_fields_become_const() {
        let mut builder = plain_json();
        builder.with(GeneratorOption::PublicStaticFields);
        let schema = generate(builder, "Sample");
        assert_eq!(schema["properties"]["VERSION"]["const"], json!("1.0"));
    }

    #[test]
    fn transient_fields_when_enabled() {
        let mut builder = plain_json();
        builder.with(GeneratorOption::TransientFields);
        let schema = generate(builder, "Sample");
        assert_eq!(schema["properties"]["cache"], json!({ "type": "string" }));
    }

    #[test]
    fn map_values_and_forbidden_additional_properties() {
        let mut builder = plain_json();
        builder
            .with(GeneratorOption::MapValuesAsAdditionalProperties)
            .with(GeneratorOption::ForbiddenAdditionalPropertiesByDefault);
        let schema = generate(builder, "Sample");
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(
            schema["properties"]["scores"],
            json!({
                "type": "object",
                "additionalProperties": { "type": "integer", "format": "int32" }
            })
        );
        assert_eq!(schema["properties"]["anything"], json!({}));
    }

    #[test]
    fn declared_subtypes_become_any_of() {
        let schema = generate(plain_json(), "Shape");
        let branches = schema["anyOf"].as_array().unwrap();
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0]["properties"]["radius"]["type"], json!("number"));
        assert_eq!(branches[1]["properties"]["side"]["type"], json!("number"));
    }

    #[test]
    fn annotations_drive_attributes() {
        let mut builder = plain_json();
        builder.with_module(AnnotationModule);
        let schema = generate(builder, "Bean");
        assert_eq!(schema["title"], json!("A bean"));
        assert_eq!(
            schema["properties"]["name"],
            json!({ "type": "string", "minLength": 1, "maxLength": 20, "pattern": "^[a-z]+$" })
        );
        assert_eq!(schema["properties"]["tags"]["maxItems"], json!(3));
        assert!(schema["properties"]["tags"].get("maxLength").is_none());
        // annotations on the getter apply to the paired field
        let age = &schema["properties"]["age"];
        assert_eq!(age["minimum"], json!(0));
        assert_eq!(age["description"], json!("Age in years"));
        assert_eq!(age["type"], json!(["integer", "null"]));
        assert_eq!(schema["required"], json!(["name"]));
    }

    #[test]
    fn renamed_getter_keeps_plain_property_name() {
        let mut builder = plain_json();
        builder
            .with(GeneratorOption::GetterMethods)
            .with(GeneratorOption::FieldsDerivedFromArgumentFreeMethods);
        builder.with_module(AnnotationModule);
        let schema = generate(builder, "Badge");
        let properties = schema["properties"].as_object().unwrap();
        assert_eq!(properties.get("label"), Some(&json!({ "type": "string" })));
        assert!(!properties.contains_key("label()"));
    }

    #[test]
    fn caller_resolvers_rank_before_option_modules() {
        let mut builder = plain_json();
        builder
            .for_fields()
            .with_target_type_overrides_resolver(|field| {
                (field.declared_name() == "maybe").then(|| vec![ResolvedType::simple("Boolean")])
            });
        let schema = generate(builder, "Sample");
        assert_eq!(schema["properties"]["maybe"], json!({ "type": ["boolean", "null"] }));
    }
}
