//! Integration tests for schema generation.

use std::rc::Rc;

use schemagen::{
    load_catalog_str, AnnotationModule, ConfigBuilder, GenerateError, GenerationContext,
    GeneratorOption, OptionPreset, SchemaGenerator, SchemaVersion, TypeContext,
};
use serde_json::{json, Value};

const CATALOG: &str = r#"{"types":[
    { "name": "Pair", "fields": [
        { "name": "a", "type": "String" },
        { "name": "b", "type": "Pair" }
    ]},
    { "name": "Address", "fields": [
        { "name": "street", "type": "String" },
        { "name": "city", "type": "String" }
    ]},
    { "name": "Person", "fields": [
        { "name": "home", "type": "Address" },
        { "name": "work", "type": "Address" }
    ]},
    { "name": "Resident", "fields": [{ "name": "home", "type": "Address" }] },
    { "name": "Holder", "fields": [
        { "name": "raw", "type": "Integer" },
        { "name": "maybe", "type": "Optional<Integer>" }
    ]},
    { "name": "Order", "fields": [
        { "name": "billing", "type": "Address", "annotations": [
            { "name": "Description", "values": { "value": "Billing address" } }
        ]},
        { "name": "shipping", "type": "Address" },
        { "name": "pickup", "type": "Optional<Address>" }
    ]},
    { "name": "com.a.Item", "fields": [{ "name": "sku", "type": "String" }] },
    { "name": "com.b.Item", "fields": [{ "name": "code", "type": "long" }] },
    { "name": "Cart", "fields": [
        { "name": "a", "type": "com.a.Item" },
        { "name": "b", "type": "com.b.Item" },
        { "name": "c", "type": "com.a.Item" },
        { "name": "d", "type": "com.b.Item" }
    ]},
    { "name": "Box", "type_parameters": ["T"], "subtypes": ["StringBox", "AnyBox"] },
    { "name": "StringBox", "supertypes": ["Box<String>"], "fields": [{ "name": "text", "type": "String" }] },
    { "name": "AnyBox", "type_parameters": ["T"], "supertypes": ["Box<T>"], "fields": [{ "name": "value", "type": "T" }] },
    { "name": "Crate", "fields": [
        { "name": "numbers", "type": "Box<Integer>" },
        { "name": "words", "type": "Box<String>" }
    ]},
    { "name": "Shelf", "fields": [
        { "name": "left", "type": "AnyBox<String>" },
        { "name": "right", "type": "AnyBox<String>" }
    ]}
]}"#;

fn builder() -> ConfigBuilder {
    let mut builder = ConfigBuilder::new(SchemaVersion::Draft2020_12, OptionPreset::PlainJson);
    builder.without(GeneratorOption::SchemaVersionIndicator);
    builder
}

fn generator(builder: ConfigBuilder) -> SchemaGenerator {
    SchemaGenerator::new(builder.build(), load_catalog_str(CATALOG).unwrap())
}

fn generate(builder: ConfigBuilder, type_expr: &str) -> Value {
    generator(builder).generate_schema_for(type_expr).unwrap()
}

fn with_options(options: &[GeneratorOption]) -> ConfigBuilder {
    let mut builder = builder();
    for option in options {
        builder.with(*option);
    }
    builder
}

// === End-to-End Scenarios ===

mod scenarios {
    use super::*;

    #[test]
    fn self_referential_type() {
        let pair_body = json!({
            "type": "object",
            "properties": {
                "a": { "type": "string" },
                "b": { "$ref": "#/$defs/Pair" }
            }
        });
        let mut expected = pair_body.clone();
        expected["$defs"] = json!({ "Pair": pair_body });

        assert_eq!(generate(builder(), "Pair"), expected);
    }

    #[test]
    fn sibling_fields_share_a_definition() {
        let schema = generate(builder(), "Person");
        assert_eq!(schema["properties"]["home"], json!({ "$ref": "#/$defs/Address" }));
        assert_eq!(schema["properties"]["work"], json!({ "$ref": "#/$defs/Address" }));
        let definitions = schema["$defs"].as_object().unwrap();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions["Address"]["properties"]["city"], json!({ "type": "string" }));
    }

    #[test]
    fn flattened_optional_matches_nullable_field() {
        let mut builder = builder();
        builder.for_fields().with_nullable_check(|field| {
            (field.declared_name() == "raw").then_some(true)
        });
        let schema = generate(builder, "Holder");
        let expected = json!({ "type": ["integer", "null"], "format": "int32" });
        assert_eq!(schema["properties"]["raw"], expected);
        assert_eq!(schema["properties"]["maybe"], expected);
    }

    #[test]
    fn nullable_reference_is_wrapped() {
        let schema = generate(builder(), "Order");
        assert_eq!(schema["properties"]["shipping"], json!({ "$ref": "#/$defs/Address" }));
        assert_eq!(
            schema["properties"]["pickup"],
            json!({ "oneOf": [{ "type": "null" }, { "$ref": "#/$defs/Address" }] })
        );
    }
}

// === Inline vs. Shared ===

mod inlining {
    use super::*;

    #[test]
    fn single_reference_is_inlined() {
        let schema = generate(builder(), "Resident");
        assert!(schema.get("$defs").is_none());
        assert_eq!(schema["properties"]["home"]["properties"]["street"], json!({ "type": "string" }));
    }

    #[test]
    fn definitions_for_all_objects() {
        let schema = generate(with_options(&[GeneratorOption::DefinitionsForAllObjects]), "Resident");
        assert_eq!(schema["properties"]["home"], json!({ "$ref": "#/$defs/Address" }));
        assert!(schema["$defs"]["Address"].is_object());
    }

    #[test]
    fn inline_all_schemas() {
        let schema = generate(with_options(&[GeneratorOption::InlineAllSchemas]), "Person");
        assert!(schema.get("$defs").is_none());
        assert_eq!(schema["properties"]["home"], schema["properties"]["work"]);
        assert_eq!(schema["properties"]["home"]["type"], json!("object"));
    }

    #[test]
    fn inline_all_schemas_rejects_cycles() {
        let err = generator(with_options(&[GeneratorOption::InlineAllSchemas]))
            .generate_schema_for("Pair")
            .unwrap_err();
        assert!(matches!(err, GenerateError::CircularInline { ref type_name } if type_name == "Pair"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn root_pointer_for_self_references() {
        let schema = generate(with_options(&[GeneratorOption::MainSchemaRootPointer]), "Pair");
        assert_eq!(schema["properties"]["b"], json!({ "$ref": "#" }));
        assert!(schema.get("$defs").is_none());
    }

    #[test]
    fn definition_for_main_schema() {
        let schema = generate(with_options(&[GeneratorOption::DefinitionForMainSchema]), "Resident");
        assert_eq!(schema["$ref"], json!("#/$defs/Resident"));
        assert_eq!(
            schema["$defs"]["Resident"]["properties"]["home"]["properties"]["city"],
            json!({ "type": "string" })
        );
    }

    #[test]
    fn nullable_sites_get_nullable_definition() {
        let schema = generate(with_options(&[GeneratorOption::NullableFieldsByDefault]), "Person");
        assert_eq!(schema["properties"]["home"], json!({ "$ref": "#/$defs/Address-nullable" }));
        assert_eq!(schema["properties"]["work"], json!({ "$ref": "#/$defs/Address-nullable" }));
        assert_eq!(schema["$defs"]["Address-nullable"]["type"], json!(["object", "null"]));
    }
}

// === Naming ===

mod naming {
    use super::*;

    #[test]
    fn colliding_names_get_suffixes() {
        let schema = generate(builder(), "Cart");
        assert_eq!(schema["properties"]["a"], json!({ "$ref": "#/$defs/Item-1" }));
        assert_eq!(schema["properties"]["b"], json!({ "$ref": "#/$defs/Item-2" }));
        assert_eq!(schema["properties"]["c"], json!({ "$ref": "#/$defs/Item-1" }));
        assert!(schema["$defs"]["Item-1"]["properties"].get("sku").is_some());
        assert!(schema["$defs"]["Item-2"]["properties"].get("code").is_some());
    }

    #[test]
    fn collision_resolution_is_deterministic() {
        let generator = generator(builder());
        let first = generator.generate_schema_for("Cart").unwrap();
        for _ in 0..3 {
            assert_eq!(generator.generate_schema_for("Cart").unwrap(), first);
        }
    }

    #[test]
    fn generic_names_are_uri_safe() {
        let schema = generate(builder(), "Shelf");
        assert_eq!(schema["properties"]["left"], json!({ "$ref": "#/$defs/AnyBox(String)" }));
        assert!(schema["$defs"]["AnyBox(String)"].is_object());
    }

    #[test]
    fn plain_definition_keys() {
        let schema = generate(with_options(&[GeneratorOption::PlainDefinitionKeys]), "Shelf");
        assert_eq!(schema["properties"]["right"], json!({ "$ref": "#/$defs/AnyBox_String_" }));
    }
}

// === Subtypes ===

mod subtypes {
    use super::*;

    #[test]
    fn incompatible_subtypes_are_skipped() {
        let schema = generate(builder(), "Crate");
        // only AnyBox can hold integers
        assert_eq!(
            schema["properties"]["numbers"],
            json!({
                "type": "object",
                "properties": { "value": { "type": "integer", "format": "int32" } }
            })
        );
        let words = schema["properties"]["words"]["anyOf"].as_array().unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0]["properties"]["text"], json!({ "type": "string" }));
        assert_eq!(words[1]["properties"]["value"], json!({ "type": "string" }));
    }
}

// === Schema Versions and Cleanup ===

mod versions {
    use super::*;

    #[test]
    fn attributes_merge_next_to_reference() {
        let mut builder = builder();
        builder.with_module(AnnotationModule);
        let schema = generate(builder, "Order");
        assert_eq!(
            schema["properties"]["billing"],
            json!({ "$ref": "#/$defs/Address", "description": "Billing address" })
        );
    }

    #[test]
    fn draft7_keeps_reference_apart_from_attributes() {
        let mut builder = ConfigBuilder::new(SchemaVersion::Draft7, OptionPreset::PlainJson);
        builder.with_module(AnnotationModule);
        let schema = generate(builder, "Order");
        assert_eq!(schema["$schema"], json!("http://json-schema.org/draft-07/schema#"));
        assert_eq!(
            schema["properties"]["billing"],
            json!({
                "allOf": [
                    { "$ref": "#/definitions/Address" },
                    { "description": "Billing address" }
                ]
            })
        );
        assert!(schema["definitions"]["Address"].is_object());
    }

    #[test]
    fn without_all_of_cleanup() {
        let mut builder = builder();
        builder
            .with_module(AnnotationModule)
            .without(GeneratorOption::AllOfCleanupAtTheEnd);
        let schema = generate(builder, "Order");
        assert_eq!(
            schema["properties"]["billing"]["allOf"][1],
            json!({ "description": "Billing address" })
        );
    }

    #[test]
    fn strict_type_info() {
        let schema = generate(with_options(&[GeneratorOption::StrictTypeInfo]), "Order");
        let pickup = &schema["properties"]["pickup"];
        assert_eq!(pickup["oneOf"][0], json!({ "type": "null" }));
        assert!(pickup.get("type").is_none());
    }
}

// === Nullable Transform ===

mod nullable {
    use super::*;

    fn transform_twice(schema: Value) -> (Value, Value) {
        let config = builder().build();
        let types = Rc::new(TypeContext::new(load_catalog_str(CATALOG).unwrap()));
        let mut context = GenerationContext::new(&config, types);
        let node = context.node_from_value(&schema);
        context.make_nullable(node);
        let once = context.arena().materialize(node).unwrap();
        context.make_nullable(node);
        let twice = context.arena().materialize(node).unwrap();
        (once, twice)
    }

    #[test]
    fn type_list_gains_null_once() {
        let (once, twice) = transform_twice(json!({ "type": "string", "minLength": 1 }));
        assert_eq!(once, json!({ "type": ["string", "null"], "minLength": 1 }));
        assert_eq!(once, twice);
    }

    #[test]
    fn reference_is_wrapped_once() {
        let (once, twice) = transform_twice(json!({ "$ref": "#/$defs/Address" }));
        assert_eq!(
            once,
            json!({ "oneOf": [{ "type": "null" }, { "$ref": "#/$defs/Address" }] })
        );
        assert_eq!(once, twice);
    }

    #[test]
    fn untyped_schema_is_left_alone() {
        let (once, twice) = transform_twice(json!({ "description": "anything" }));
        assert_eq!(once, json!({ "description": "anything" }));
        assert_eq!(once, twice);
    }
}

// === Multi-Type Builder ===

mod multi_type {
    use super::*;

    #[test]
    fn collects_definitions_for_embedding() {
        let generator = generator(builder());
        let mut schemas = generator.builder();
        let person = schemas
            .create_schema_reference(&generator.resolve_type("Person").unwrap())
            .unwrap();
        let address = schemas
            .create_schema_reference(&generator.resolve_type("Address").unwrap())
            .unwrap();
        let result = schemas.collect_definitions("components/schemas").unwrap();

        assert_eq!(
            result.reference(address).unwrap(),
            &json!({ "$ref": "#/components/schemas/Address" })
        );
        let person = result.reference(person).unwrap();
        assert_eq!(
            person["properties"]["home"],
            json!({ "$ref": "#/components/schemas/Address" })
        );
        assert_eq!(result.definitions.len(), 1);
        assert!(result.definitions.contains_key("Address"));
    }

    #[test]
    fn serializes_definitions_and_references() {
        let generator = generator(builder());
        let mut schemas = generator.builder();
        schemas
            .create_schema_reference(&generator.resolve_type("Resident").unwrap())
            .unwrap();
        let result = schemas.collect_definitions("/definitions/").unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["definitions"], json!({}));
        assert_eq!(value["references"][0]["type"], json!("object"));
    }
}
