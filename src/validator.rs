//! Payload validation against generated schemas.

use serde_json::Value;

use crate::error::{SchemaError, ValidateError};
use crate::generator::SchemaGenerator;

/// Generate the schema for a type expression and validate a payload against it.
///
/// # Errors
///
/// Returns `ValidateError::Generate` if the type cannot be resolved or its
/// schema cannot be generated, or `ValidateError::Invalid` if the payload
/// doesn't match the schema.
pub fn validate(
    generator: &SchemaGenerator,
    type_expression: &str,
    payload: &Value,
) -> Result<(), ValidateError> {
    let schema = generator.generate_schema_for(type_expression)?;
    validate_against_schema(&schema, payload)
}

/// Validate a payload against an already generated schema.
///
/// Use this when you've already generated the schema and want to validate
/// multiple payloads against it.
///
/// # Errors
///
/// Returns `ValidateError::InvalidSchema` if the schema is not usable, or
/// `ValidateError::Invalid` with every violation found in the payload.
pub fn validate_against_schema(schema: &Value, payload: &Value) -> Result<(), ValidateError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ValidateError::InvalidSchema {
        message: e.to_string(),
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(payload)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::loader::load_catalog_str;
    use serde_json::json;

    fn generator() -> SchemaGenerator {
        let catalog = load_catalog_str(
            r#"{"types":[
                { "name": "Person", "fields": [
                    { "name": "name", "type": "String" },
                    { "name": "age", "type": "int" },
                    { "name": "friends", "type": "List<Person>" }
                ]}
            ]}"#,
        )
        .unwrap();
        SchemaGenerator::new(ConfigBuilder::default().build(), catalog)
    }

    #[test]
    fn validate_valid_payload() {
        let payload = json!({
            "name": "Ada",
            "age": 36,
            "friends": [{ "name": "Charles", "age": 45, "friends": [] }]
        });
        assert!(validate(&generator(), "Person", &payload).is_ok());
    }

    #[test]
    fn validate_wrong_type() {
        let payload = json!({ "name": 123 });
        let result = validate(&generator(), "Person", &payload);
        assert!(matches!(result, Err(ValidateError::Invalid { .. })));
    }

    #[test]
    fn validate_follows_recursive_references() {
        let payload = json!({ "friends": [{ "age": "old" }] });
        match validate(&generator(), "Person", &payload) {
            Err(ValidateError::Invalid { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].path, "/friends/0/age");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validate_unknown_type() {
        let result = validate(&generator(), "Nobody", &json!({}));
        assert!(matches!(result, Err(ValidateError::Generate(_))));
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "age": { "type": "number" }
            },
            "required": ["name", "age"]
        });
        match validate_against_schema(&schema, &json!({})) {
            Err(ValidateError::Invalid { errors }) => {
                assert_eq!(errors.len(), 2);
            }
            _ => panic!("expected validation error with 2 errors"),
        }
    }

    #[test]
    fn invalid_schema_is_reported() {
        let schema = json!({ "type": 12 });
        let result = validate_against_schema(&schema, &json!({}));
        assert!(matches!(result, Err(ValidateError::InvalidSchema { .. })));
    }
}
