//! The generator facade.

use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, info};

use crate::builder::SchemaBuilder;
use crate::config::GeneratorConfig;
use crate::error::GenerateError;
use crate::introspect::TypeIntrospector;
use crate::type_context::TypeContext;
use crate::types::ResolvedType;

/// Generates JSON Schema documents from a type graph.
///
/// The generator keeps its [`TypeContext`] between calls, so member lists
/// and getter pairings are computed once per type no matter how many
/// schemas are generated.
///
/// ```
/// use schemagen::{load_catalog_str, ConfigBuilder, SchemaGenerator};
///
/// let catalog = load_catalog_str(r#"{"types":[
///     { "name": "Point", "fields": [
///         { "name": "x", "type": "int" },
///         { "name": "y", "type": "int" }
///     ]}
/// ]}"#).unwrap();
/// let generator = SchemaGenerator::new(ConfigBuilder::default().build(), catalog);
///
/// let schema = generator.generate_schema_for("Point").unwrap();
/// assert_eq!(schema["properties"]["x"]["type"], "integer");
/// ```
#[derive(Debug)]
pub struct SchemaGenerator {
    config: GeneratorConfig,
    type_context: Rc<TypeContext>,
}

impl SchemaGenerator {
    pub fn new(config: GeneratorConfig, introspector: impl TypeIntrospector + 'static) -> Self {
        Self::with_type_context(config, Rc::new(TypeContext::new(introspector)))
    }

    /// Create a generator sharing an existing type context.
    pub fn with_type_context(config: GeneratorConfig, type_context: Rc<TypeContext>) -> Self {
        Self { config, type_context }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn type_context(&self) -> &Rc<TypeContext> {
        &self.type_context
    }

    /// Resolve a type expression such as `List<Item>`.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::InvalidTypeExpression` or `UnknownType`.
    pub fn resolve_type(&self, expression: &str) -> Result<ResolvedType, GenerateError> {
        self.type_context.resolve(expression)
    }

    /// Generate the complete schema document for `ty`.
    ///
    /// # Errors
    ///
    /// See [`SchemaBuilder`]: circular types under forced inlining, naming
    /// collisions and errors raised by custom providers.
    pub fn generate_schema(&self, ty: &ResolvedType) -> Result<Value, GenerateError> {
        info!(main_type = %ty, version = ?self.config.version(), "generating schema");
        let schema = SchemaBuilder::new(&self.config, Rc::clone(&self.type_context))
            .create_schema_for_single_type(ty)?;
        debug!(main_type = %ty, "schema generated");
        Ok(schema)
    }

    /// Resolve a type expression and generate its schema document.
    ///
    /// # Errors
    ///
    /// Returns resolution errors as well as everything [`Self::generate_schema`] returns.
    pub fn generate_schema_for(&self, expression: &str) -> Result<Value, GenerateError> {
        let ty = self.resolve_type(expression)?;
        self.generate_schema(&ty)
    }

    /// A builder for collecting several types into one set of definitions.
    pub fn builder(&self) -> SchemaBuilder<'_> {
        SchemaBuilder::new(&self.config, Rc::clone(&self.type_context))
    }
}
