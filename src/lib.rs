//! JSON Schema generation from reflective type graphs.
//!
//! A type graph (classes, interfaces, enums and their fields and methods) is
//! described through the [`TypeIntrospector`] port; [`TypeCatalog`] is a
//! ready-made implementation read from a JSON document. The generator walks
//! that graph from a main type and produces a JSON Schema document in which
//! every type used more than once is extracted into a shared definition and
//! referenced with `$ref`.
//!
//! # Example
//!
//! ```
//! use schemagen::{load_catalog_str, ConfigBuilder, GeneratorOption, SchemaGenerator};
//! use serde_json::json;
//!
//! let catalog = load_catalog_str(r#"{"types":[
//!     { "name": "Person", "fields": [
//!         { "name": "name", "type": "String" },
//!         { "name": "parent", "type": "Person" }
//!     ]}
//! ]}"#).unwrap();
//!
//! let mut builder = ConfigBuilder::default();
//! builder.without(GeneratorOption::SchemaVersionIndicator);
//! let generator = SchemaGenerator::new(builder.build(), catalog);
//!
//! let schema = generator.generate_schema_for("Person").unwrap();
//! assert_eq!(schema["properties"]["parent"], json!({ "$ref": "#/$defs/Person" }));
//! assert_eq!(schema["$defs"]["Person"]["properties"]["name"], json!({ "type": "string" }));
//! ```
//!
//! # Definition Rules
//!
//! | Situation | Result |
//! |-----------|--------|
//! | Type referenced once | Body copied into the referencing schema |
//! | Type referenced twice or more | Shared definition, `$ref` at every site |
//! | `DefinitionsForAllObjects` | Shared definition for every referenced type |
//! | `InlineAllSchemas` | No definitions; circular types fail |
//! | Nullable references | Separate `<name>-nullable` definition when shared |
//!
//! # Catalog Format
//!
//! ```json
//! { "types": [
//!     { "name": "Box", "type_parameters": ["T"],
//!       "fields": [{ "name": "content", "type": "T" }] },
//!     { "name": "Shelf", "fields": [{ "name": "boxes", "type": "List<Box<String>>" }] }
//! ] }
//! ```

mod attributes;
mod builder;
mod catalog;
mod cleanup;
mod config;
mod context;
mod error;
mod generator;
mod introspect;
mod keyword;
mod loader;
mod modules;
mod naming;
mod node;
mod options;
mod scope;
mod settings;
mod type_context;
mod types;
mod validator;

pub use attributes::{collect_member_attributes, collect_type_attributes};
pub use builder::{MultiTypeSchemas, SchemaBuilder, SchemaReference};
pub use catalog::{CatalogDocument, FieldDecl, MethodDecl, TypeCatalog, TypeDecl, TypeKind};
pub use cleanup::SchemaCleaner;
pub use config::{
    AdditionalProperties, ConfigBuilder, ConfigPart, CustomDefinition, DefinitionType,
    GeneratorConfig, Module, StatefulConfig,
};
pub use context::{DefinitionKey, GenerationContext, ProviderId};
pub use error::{CatalogError, GenerateError, SchemaError, ValidateError};
pub use generator::SchemaGenerator;
pub use introspect::{Annotation, FieldInfo, MethodInfo, TypeIntrospector, TypeMembers, Visibility};
pub use keyword::{SchemaKeyword, SchemaType, SchemaVersion, TagContent};
pub use loader::{load_catalog, load_catalog_str, load_json};
pub use modules::AnnotationModule;
pub use naming::{
    ensure_plain_definition_key, ensure_uri_compatible_definition_key, DefaultNamingStrategy,
    DefinitionNamingStrategy,
};
pub use node::{NodeId, SchemaArena, Slot};
pub use options::{GeneratorOption, OptionPreset, OptionSet};
pub use scope::{MemberKind, MemberScope, TypeScope};
pub use settings::GeneratorSettings;
pub use type_context::TypeContext;
pub use types::{ResolvedType, TypeExpr};
pub use validator::{validate, validate_against_schema};
