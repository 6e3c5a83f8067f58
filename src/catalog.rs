//! Static type graph loaded from JSON.
//!
//! A catalog describes classes, interfaces, enums and primitives together
//! with their generic parameters, supertypes, fields, methods and
//! annotations. Common library types are always available.
//!
//! ```json
//! {
//!   "types": [
//!     {
//!       "name": "com.example.Pair",
//!       "fields": [
//!         { "name": "a", "type": "String" },
//!         { "name": "b", "type": "com.example.Pair" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::{CatalogError, GenerateError};
use crate::introspect::{
    Annotation, FieldInfo, MethodInfo, TypeIntrospector, TypeMembers, Visibility,
};
use crate::types::{simple_name_of, ResolvedType, TypeExpr, OBJECT_TYPE};

/// Kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
    Primitive,
}

/// A type declaration as written in a catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub supertypes: Vec<TypeExpr>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub enum_constants: Vec<String>,
    #[serde(default)]
    pub subtypes: Vec<String>,
}

impl TypeDecl {
    fn new(name: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            type_parameters: Vec::new(),
            supertypes: Vec::new(),
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            enum_constants: Vec::new(),
            subtypes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default = "private_visibility")]
    pub visibility: Visibility,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, rename = "final")]
    pub is_final: bool,
    #[serde(default, rename = "transient")]
    pub is_transient: bool,
    #[serde(default, deserialize_with = "present_value")]
    pub constant: Option<Value>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    /// Absent (or `void`) for methods without a return value.
    #[serde(default)]
    pub returns: Option<TypeExpr>,
    #[serde(default)]
    pub arguments: Vec<TypeExpr>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

fn private_visibility() -> Visibility {
    Visibility::Private
}

// Distinguishes `"constant": null` from an absent key.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Top-level shape of a catalog file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

const VOID_KEYWORD: &str = "void";

/// In-memory type graph implementing [`TypeIntrospector`].
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    types: IndexMap<String, TypeDecl>,
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeCatalog {
    /// A catalog containing only the standard library types.
    pub fn new() -> Self {
        let mut types = IndexMap::new();
        for decl in standard_types() {
            types.insert(decl.name.clone(), decl);
        }
        Self { types }
    }

    /// Build a catalog from a parsed document and check that every
    /// referenced type exists.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateType` or `CatalogError::UnknownType`.
    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for decl in document.types {
            catalog.add(decl)?;
        }
        catalog.check_references()?;
        Ok(catalog)
    }

    /// Add a declaration.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateType` if the name is already taken.
    pub fn add(&mut self, decl: TypeDecl) -> Result<(), CatalogError> {
        if self.types.contains_key(&decl.name) {
            return Err(CatalogError::DuplicateType { name: decl.name });
        }
        self.types.insert(decl.name.clone(), decl);
        Ok(())
    }

    /// Look a declaration up by full name, or by simple name when unambiguous.
    pub fn declaration(&self, name: &str) -> Option<&TypeDecl> {
        if let Some(decl) = self.types.get(name) {
            return Some(decl);
        }
        let mut matches = self
            .types
            .values()
            .filter(|decl| simple_name_of(&decl.name) == name);
        match (matches.next(), matches.next()) {
            (Some(decl), None) => Some(decl),
            _ => None,
        }
    }

    fn check_references(&self) -> Result<(), CatalogError> {
        for decl in self.types.values() {
            let vars: HashSet<&str> = decl.type_parameters.iter().map(String::as_str).collect();
            let check = |expr: &TypeExpr, context: String| -> Result<(), CatalogError> {
                for name in expr.names() {
                    if !vars.contains(name)
                        && name != VOID_KEYWORD
                        && self.declaration(name).is_none()
                    {
                        return Err(CatalogError::UnknownType {
                            context,
                            name: name.to_string(),
                        });
                    }
                }
                Ok(())
            };
            for supertype in &decl.supertypes {
                check(supertype, format!("supertype of {}", decl.name))?;
            }
            for field in &decl.fields {
                check(&field.ty, format!("field {}.{}", decl.name, field.name))?;
            }
            for method in &decl.methods {
                let context = format!("method {}.{}", decl.name, method.name);
                if let Some(returns) = &method.returns {
                    check(returns, context.clone())?;
                }
                for argument in &method.arguments {
                    check(argument, context.clone())?;
                }
            }
            for subtype in &decl.subtypes {
                if self.declaration(subtype).is_none() {
                    return Err(CatalogError::UnknownType {
                        context: format!("subtype of {}", decl.name),
                        name: subtype.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn decl_of(&self, ty: &ResolvedType) -> Option<&TypeDecl> {
        if ty.is_array() {
            return None;
        }
        self.types.get(ty.erased_name())
    }

    fn instantiate(
        &self,
        expr: &TypeExpr,
        bindings: &HashMap<&str, ResolvedType>,
    ) -> Result<ResolvedType, GenerateError> {
        match expr {
            TypeExpr::Array(component) => {
                Ok(ResolvedType::array_of(self.instantiate(component, bindings)?))
            }
            TypeExpr::Named { name, arguments } => {
                if arguments.is_empty() {
                    if let Some(bound) = bindings.get(name.as_str()) {
                        return Ok(bound.clone());
                    }
                }
                let decl = self
                    .declaration(name)
                    .ok_or_else(|| GenerateError::UnknownType { name: name.clone() })?;
                if arguments.len() > decl.type_parameters.len() {
                    return Err(GenerateError::InvalidTypeExpression {
                        expression: expr.to_string(),
                        message: format!(
                            "{} takes {} type parameter(s)",
                            decl.name,
                            decl.type_parameters.len()
                        ),
                    });
                }
                let mut parameters = arguments
                    .iter()
                    .map(|argument| self.instantiate(argument, bindings))
                    .collect::<Result<Vec<_>, _>>()?;
                // raw usage of a generic type
                parameters.resize(decl.type_parameters.len(), ResolvedType::object());
                Ok(ResolvedType::new(decl.name.clone(), parameters))
            }
        }
    }

    fn bindings<'d>(decl: &'d TypeDecl, ty: &ResolvedType) -> HashMap<&'d str, ResolvedType> {
        decl.type_parameters
            .iter()
            .map(String::as_str)
            .zip(ty.type_parameters().iter().cloned())
            .collect()
    }

    fn collect_members(
        &self,
        ty: &ResolvedType,
        members: &mut TypeMembers,
        visited: &mut HashSet<String>,
    ) {
        if !visited.insert(ty.erased_name().to_string()) {
            return;
        }
        let Some(decl) = self.decl_of(ty) else {
            return;
        };
        let bindings = Self::bindings(decl, ty);
        for field in &decl.fields {
            match self.instantiate(&field.ty, &bindings) {
                Ok(field_type) => members.fields.push(FieldInfo {
                    name: field.name.clone(),
                    ty: field_type,
                    declaring_type: ty.clone(),
                    visibility: field.visibility,
                    is_static: field.is_static,
                    is_final: field.is_final,
                    is_transient: field.is_transient,
                    constant: field.constant.clone(),
                    annotations: field.annotations.clone(),
                }),
                Err(e) => debug!("skipping field {}.{}: {}", decl.name, field.name, e),
            }
        }
        for method in &decl.methods {
            match self.instantiate_method(method, ty, &bindings) {
                Ok(info) => {
                    let overridden = members
                        .methods
                        .iter()
                        .any(|m| m.name == info.name && m.arguments == info.arguments);
                    if !overridden {
                        members.methods.push(info);
                    }
                }
                Err(e) => debug!("skipping method {}.{}: {}", decl.name, method.name, e),
            }
        }
        for supertype in self.supertypes(ty) {
            self.collect_members(&supertype, members, visited);
        }
    }

    fn instantiate_method(
        &self,
        method: &MethodDecl,
        declaring_type: &ResolvedType,
        bindings: &HashMap<&str, ResolvedType>,
    ) -> Result<MethodInfo, GenerateError> {
        let return_type = match &method.returns {
            Some(TypeExpr::Named { name, arguments }) if name == VOID_KEYWORD && arguments.is_empty() => {
                None
            }
            Some(expr) => Some(self.instantiate(expr, bindings)?),
            None => None,
        };
        let arguments = method
            .arguments
            .iter()
            .map(|argument| self.instantiate(argument, bindings))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MethodInfo {
            name: method.name.clone(),
            return_type,
            arguments,
            declaring_type: declaring_type.clone(),
            visibility: method.visibility,
            is_static: method.is_static,
            annotations: method.annotations.clone(),
        })
    }

    /// Express the supertype named `target` in terms of the type variables
    /// of the type `expr` starts from.
    fn supertype_path(&self, expr: &TypeExpr, target: &str, depth: usize) -> Option<TypeExpr> {
        let TypeExpr::Named { name, arguments } = expr else {
            return None;
        };
        let decl = self.declaration(name)?;
        if decl.name == target {
            return Some(expr.clone());
        }
        if depth > 32 {
            return None;
        }
        let substitution: HashMap<&str, &TypeExpr> = decl
            .type_parameters
            .iter()
            .map(String::as_str)
            .zip(arguments.iter())
            .collect();
        decl.supertypes.iter().find_map(|supertype| {
            let substituted = substitute(supertype, &substitution);
            self.supertype_path(&substituted, target, depth + 1)
        })
    }

    fn unify(
        &self,
        expr: &TypeExpr,
        actual: &ResolvedType,
        variables: &HashSet<&str>,
        bindings: &mut HashMap<String, ResolvedType>,
    ) -> bool {
        match expr {
            TypeExpr::Array(component) => actual
                .component_type()
                .is_some_and(|actual_component| {
                    self.unify(component, actual_component, variables, bindings)
                }),
            TypeExpr::Named { name, arguments } => {
                if arguments.is_empty() && variables.contains(name.as_str()) {
                    return match bindings.get(name) {
                        Some(bound) => bound == actual,
                        None => {
                            bindings.insert(name.clone(), actual.clone());
                            true
                        }
                    };
                }
                let Some(decl) = self.declaration(name) else {
                    return false;
                };
                if actual.is_array() || decl.name != actual.erased_name() {
                    return false;
                }
                if arguments.is_empty() {
                    return true;
                }
                arguments.len() == actual.type_parameters().len()
                    && arguments
                        .iter()
                        .zip(actual.type_parameters())
                        .all(|(argument, parameter)| {
                            self.unify(argument, parameter, variables, bindings)
                        })
            }
        }
    }
}

fn substitute(expr: &TypeExpr, substitution: &HashMap<&str, &TypeExpr>) -> TypeExpr {
    match expr {
        TypeExpr::Array(component) => TypeExpr::Array(Box::new(substitute(component, substitution))),
        TypeExpr::Named { name, arguments } => {
            if arguments.is_empty() {
                if let Some(replacement) = substitution.get(name.as_str()) {
                    return (*replacement).clone();
                }
            }
            TypeExpr::Named {
                name: name.clone(),
                arguments: arguments.iter().map(|a| substitute(a, substitution)).collect(),
            }
        }
    }
}

impl TypeIntrospector for TypeCatalog {
    fn resolve(&self, expression: &str) -> Result<ResolvedType, GenerateError> {
        let expr = TypeExpr::parse(expression).map_err(|message| {
            GenerateError::InvalidTypeExpression {
                expression: expression.to_string(),
                message,
            }
        })?;
        self.instantiate(&expr, &HashMap::new())
    }

    fn supertypes(&self, ty: &ResolvedType) -> Vec<ResolvedType> {
        if ty.is_array() {
            return vec![ResolvedType::object()];
        }
        let Some(decl) = self.decl_of(ty) else {
            return Vec::new();
        };
        let bindings = Self::bindings(decl, ty);
        decl.supertypes
            .iter()
            .filter_map(|supertype| self.instantiate(supertype, &bindings).ok())
            .collect()
    }

    fn members(&self, ty: &ResolvedType) -> TypeMembers {
        let mut members = TypeMembers::default();
        self.collect_members(ty, &mut members, &mut HashSet::new());
        members
    }

    fn type_annotations(&self, ty: &ResolvedType) -> Vec<Annotation> {
        self.decl_of(ty)
            .map(|decl| decl.annotations.clone())
            .unwrap_or_default()
    }

    fn enum_constants(&self, ty: &ResolvedType) -> Option<Vec<String>> {
        self.decl_of(ty)
            .filter(|decl| decl.kind == TypeKind::Enum)
            .map(|decl| decl.enum_constants.clone())
    }

    fn declared_subtypes(&self, ty: &ResolvedType) -> Vec<String> {
        self.decl_of(ty)
            .map(|decl| decl.subtypes.clone())
            .unwrap_or_default()
    }

    fn resolve_subtype(&self, supertype: &ResolvedType, subtype: &str) -> Option<ResolvedType> {
        let decl = self.declaration(subtype)?;
        let start = TypeExpr::Named {
            name: decl.name.clone(),
            arguments: decl
                .type_parameters
                .iter()
                .map(|variable| TypeExpr::Named {
                    name: variable.clone(),
                    arguments: Vec::new(),
                })
                .collect(),
        };
        let path = self.supertype_path(&start, supertype.erased_name(), 0)?;
        let variables: HashSet<&str> = decl.type_parameters.iter().map(String::as_str).collect();
        let mut bindings = HashMap::new();
        if !self.unify(&path, supertype, &variables, &mut bindings) {
            debug!(
                "{} is incompatible with {}",
                decl.name,
                supertype.description()
            );
            return None;
        }
        let parameters = decl
            .type_parameters
            .iter()
            .map(|variable| {
                bindings
                    .get(variable)
                    .cloned()
                    .unwrap_or_else(ResolvedType::object)
            })
            .collect();
        Some(ResolvedType::new(decl.name.clone(), parameters))
    }

    fn is_primitive(&self, ty: &ResolvedType) -> bool {
        self.decl_of(ty)
            .is_some_and(|decl| decl.kind == TypeKind::Primitive)
    }
}

// --- Standard library types ---

fn expr(text: &str) -> TypeExpr {
    // Only called with the literals below, which always parse.
    TypeExpr::parse(text).unwrap_or(TypeExpr::Named {
        name: OBJECT_TYPE.to_string(),
        arguments: Vec::new(),
    })
}

fn declare(name: &str, kind: TypeKind, parameters: &[&str], supertypes: &[&str]) -> TypeDecl {
    let mut decl = TypeDecl::new(name, kind);
    decl.type_parameters = parameters.iter().map(|p| p.to_string()).collect();
    decl.supertypes = supertypes.iter().map(|s| expr(s)).collect();
    decl
}

fn public_method(name: &str, returns: &str, arguments: &[&str]) -> MethodDecl {
    MethodDecl {
        name: name.to_string(),
        returns: Some(expr(returns)),
        arguments: arguments.iter().map(|a| expr(a)).collect(),
        visibility: Visibility::Public,
        is_static: false,
        annotations: Vec::new(),
    }
}

fn standard_types() -> Vec<TypeDecl> {
    use TypeKind::{Class, Interface, Primitive};

    let mut types = vec![declare(OBJECT_TYPE, Class, &[], &[])];
    for primitive in ["boolean", "byte", "char", "short", "int", "long", "float", "double"] {
        types.push(declare(primitive, Primitive, &[], &[]));
    }
    types.push(declare("CharSequence", Interface, &[], &[]));
    types.push(declare("String", Class, &[], &["CharSequence"]));
    types.push(declare("Character", Class, &[], &[OBJECT_TYPE]));
    types.push(declare("Boolean", Class, &[], &[OBJECT_TYPE]));
    types.push(declare("Number", Class, &[], &[OBJECT_TYPE]));
    for boxed in [
        "Byte",
        "Short",
        "Integer",
        "Long",
        "Float",
        "Double",
        "BigInteger",
        "BigDecimal",
    ] {
        types.push(declare(boxed, Class, &[], &["Number"]));
    }
    for scalar in [
        "LocalDate",
        "LocalDateTime",
        "LocalTime",
        "ZonedDateTime",
        "OffsetDateTime",
        "OffsetTime",
        "Instant",
        "Date",
        "UUID",
        "URI",
        "ZoneId",
        "Void",
    ] {
        types.push(declare(scalar, Class, &[], &[OBJECT_TYPE]));
    }
    types.push(declare("Iterable", Interface, &["T"], &[]));
    types.push(declare("Collection", Interface, &["E"], &["Iterable<E>"]));
    types.push(declare("List", Interface, &["E"], &["Collection<E>"]));
    types.push(declare("Set", Interface, &["E"], &["Collection<E>"]));
    types.push(declare("ArrayList", Class, &["E"], &["List<E>"]));
    types.push(declare("HashSet", Class, &["E"], &["Set<E>"]));
    types.push(declare("Map", Interface, &["K", "V"], &[]));
    types.push(declare("HashMap", Class, &["K", "V"], &["Map<K, V>"]));

    let mut optional = declare("Optional", Class, &["T"], &[OBJECT_TYPE]);
    optional.fields.push(FieldDecl {
        name: "value".to_string(),
        ty: expr("T"),
        visibility: Visibility::Private,
        is_static: false,
        is_final: true,
        is_transient: false,
        constant: None,
        annotations: Vec::new(),
    });
    optional.methods = vec![
        public_method("get", "T", &[]),
        public_method("isPresent", "boolean", &[]),
        public_method("isEmpty", "boolean", &[]),
        public_method("orElse", "T", &["T"]),
    ];
    types.push(optional);

    let mut supplier = declare("Supplier", Interface, &["T"], &[]);
    supplier.methods.push(public_method("get", "T", &[]));
    types.push(supplier);
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog(document: Value) -> TypeCatalog {
        let document: CatalogDocument = serde_json::from_value(document).unwrap();
        TypeCatalog::from_document(document).unwrap()
    }

    #[test]
    fn resolves_simple_names_and_raw_generics() {
        let catalog = catalog(json!({
            "types": [{ "name": "com.example.Pair" }]
        }));
        let pair = catalog.resolve("Pair").unwrap();
        assert_eq!(pair.erased_name(), "com.example.Pair");

        let raw_list = catalog.resolve("List").unwrap();
        assert_eq!(raw_list.type_parameters(), &[ResolvedType::object()]);
    }

    #[test]
    fn unknown_types_are_rejected() {
        let document: CatalogDocument = serde_json::from_value(json!({
            "types": [{ "name": "A", "fields": [{ "name": "b", "type": "Missing" }] }]
        }))
        .unwrap();
        let err = TypeCatalog::from_document(document).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownType { ref name, .. } if name == "Missing"));

        assert!(matches!(
            TypeCatalog::new().resolve("Nope"),
            Err(GenerateError::UnknownType { .. })
        ));
    }

    #[test]
    fn duplicate_declarations_are_rejected() {
        let document: CatalogDocument = serde_json::from_value(json!({
            "types": [{ "name": "String" }]
        }))
        .unwrap();
        assert!(matches!(
            TypeCatalog::from_document(document),
            Err(CatalogError::DuplicateType { .. })
        ));
    }

    #[test]
    fn members_substitute_type_variables_through_hierarchy() {
        let catalog = catalog(json!({
            "types": [
                {
                    "name": "Base",
                    "type_parameters": ["T"],
                    "fields": [{ "name": "value", "type": "T" }]
                },
                {
                    "name": "Named",
                    "supertypes": ["Base<List<String>>"],
                    "fields": [{ "name": "name", "type": "String" }],
                    "methods": [{ "name": "getName", "returns": "String" }]
                }
            ]
        }));
        let named = catalog.resolve("Named").unwrap();
        let members = catalog.members(&named);
        let names: Vec<&str> = members.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "value"]);
        assert_eq!(members.fields[1].ty.simple_description(), "List<String>");
        assert_eq!(members.fields[1].declaring_type.erased_name(), "Base");
        assert_eq!(members.fields[0].visibility, Visibility::Private);
        assert_eq!(members.methods[0].visibility, Visibility::Public);
    }

    #[test]
    fn constant_null_is_distinguished_from_absent() {
        let catalog = catalog(json!({
            "types": [{
                "name": "Constants",
                "fields": [
                    { "name": "NONE", "type": "String", "static": true, "final": true, "constant": null },
                    { "name": "plain", "type": "String" }
                ]
            }]
        }));
        let members = catalog.members(&catalog.resolve("Constants").unwrap());
        assert_eq!(members.fields[0].constant, Some(Value::Null));
        assert_eq!(members.fields[1].constant, None);
    }

    #[test]
    fn void_methods_have_no_return_type() {
        let catalog = catalog(json!({
            "types": [{
                "name": "Service",
                "methods": [
                    { "name": "reset" },
                    { "name": "clear", "returns": "void" }
                ]
            }]
        }));
        let members = catalog.members(&catalog.resolve("Service").unwrap());
        assert!(members.methods.iter().all(MethodInfo::is_void));
    }

    #[test]
    fn subtype_resolution_binds_parameters() {
        let catalog = catalog(json!({
            "types": [
                { "name": "Shape", "type_parameters": ["T"], "subtypes": ["Circle", "Labelled", "Square"] },
                { "name": "Circle", "supertypes": ["Shape<Double>"] },
                { "name": "Square", "supertypes": ["Shape<Integer>"] },
                { "name": "Labelled", "type_parameters": ["L"], "supertypes": ["Shape<L>"] }
            ]
        }));
        let shape = catalog.resolve("Shape<Double>").unwrap();
        assert_eq!(
            catalog.resolve_subtype(&shape, "Circle"),
            Some(ResolvedType::simple("Circle"))
        );
        assert_eq!(catalog.resolve_subtype(&shape, "Square"), None);
        assert_eq!(
            catalog.resolve_subtype(&shape, "Labelled"),
            Some(ResolvedType::new("Labelled", vec![ResolvedType::simple("Double")]))
        );
    }

    #[test]
    fn standard_collections_are_known() {
        let catalog = TypeCatalog::new();
        let list = catalog.resolve("ArrayList<String>").unwrap();
        let supertypes = catalog.supertypes(&list);
        assert_eq!(supertypes, vec![catalog.resolve("List<String>").unwrap()]);
        assert!(catalog.is_primitive(&catalog.resolve("int").unwrap()));
        assert!(!catalog.is_primitive(&catalog.resolve("Integer").unwrap()));
    }
}
