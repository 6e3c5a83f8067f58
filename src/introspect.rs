//! The type graph port.
//!
//! The generator never inspects types directly; everything it knows about a
//! type comes through [`TypeIntrospector`]. [`crate::TypeCatalog`] is the
//! bundled implementation backed by a static JSON description.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GenerateError;
use crate::types::ResolvedType;

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

/// Annotation attached to a type or member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default)]
    pub values: Map<String, Value>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Map::new(),
        }
    }

    /// Add an annotation value (builder style).
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn u64_value(&self, key: &str) -> Option<u64> {
        self.values.get(key).and_then(Value::as_u64)
    }
}

/// A field with its type parameters already substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: ResolvedType,
    pub declaring_type: ResolvedType,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_transient: bool,
    /// Compile-time constant value; `Some(Value::Null)` is a constant null.
    pub constant: Option<Value>,
    pub annotations: Vec<Annotation>,
}

/// A method with its type parameters already substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub name: String,
    /// `None` for methods without a return value.
    pub return_type: Option<ResolvedType>,
    pub arguments: Vec<ResolvedType>,
    pub declaring_type: ResolvedType,
    pub visibility: Visibility,
    pub is_static: bool,
    pub annotations: Vec<Annotation>,
}

impl MethodInfo {
    pub fn is_void(&self) -> bool {
        self.return_type.is_none()
    }
}

/// Fields and methods of a type including inherited ones, most specific first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeMembers {
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
}

/// Read-only access to a resolved type graph.
pub trait TypeIntrospector {
    /// Resolve a type expression such as `Box<String>`.
    ///
    /// # Errors
    ///
    /// Returns `GenerateError::InvalidTypeExpression` for syntax errors and
    /// `GenerateError::UnknownType` for names the graph does not know.
    fn resolve(&self, expression: &str) -> Result<ResolvedType, GenerateError>;

    /// Direct supertypes with type parameters bound.
    fn supertypes(&self, ty: &ResolvedType) -> Vec<ResolvedType>;

    /// All fields and methods, own declarations first.
    fn members(&self, ty: &ResolvedType) -> TypeMembers;

    /// Annotations declared on the type itself.
    fn type_annotations(&self, ty: &ResolvedType) -> Vec<Annotation>;

    /// Constant names if the type is an enumeration.
    fn enum_constants(&self, ty: &ResolvedType) -> Option<Vec<String>>;

    /// Names of the declared direct subtypes.
    fn declared_subtypes(&self, ty: &ResolvedType) -> Vec<String>;

    /// Parameterize `subtype` so that it extends the given `supertype`.
    ///
    /// Returns `None` when the subtype cannot be reconciled with the
    /// supertype's type parameters.
    fn resolve_subtype(&self, supertype: &ResolvedType, subtype: &str) -> Option<ResolvedType>;

    /// Primitive types can never hold null.
    fn is_primitive(&self, ty: &ResolvedType) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn annotation_values() {
        let annotation = Annotation::new("Size").with_value("min", 1).with_value("label", "x");
        assert_eq!(annotation.u64_value("min"), Some(1));
        assert_eq!(annotation.str_value("label"), Some("x"));
        assert_eq!(annotation.value("max"), None);
    }

    #[test]
    fn annotation_deserializes_without_values() {
        let annotation: Annotation = serde_json::from_value(json!({ "name": "Nullable" })).unwrap();
        assert_eq!(annotation, Annotation::new("Nullable"));
    }
}
