//! Hierarchy queries and memoized member lookups over a [`TypeIntrospector`].

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::error::GenerateError;
use crate::introspect::{Annotation, TypeIntrospector, TypeMembers, Visibility};
use crate::types::ResolvedType;

/// Erased name of the interface every collection type implements.
pub const COLLECTION_TYPE: &str = "Collection";

/// Shared type utilities with per-instance caches.
///
/// A long-lived generator keeps one context across calls, so member lists
/// and getter pairings are only computed once per type.
pub struct TypeContext {
    introspector: Box<dyn TypeIntrospector>,
    members: RefCell<HashMap<ResolvedType, Rc<TypeMembers>>>,
    field_getters: RefCell<HashMap<(ResolvedType, usize), Option<usize>>>,
    getter_fields: RefCell<HashMap<(ResolvedType, usize), Option<usize>>>,
}

impl std::fmt::Debug for TypeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeContext")
            .field("cached_types", &self.members.borrow().len())
            .finish()
    }
}

impl TypeContext {
    pub fn new(introspector: impl TypeIntrospector + 'static) -> Self {
        Self {
            introspector: Box::new(introspector),
            members: RefCell::new(HashMap::new()),
            field_getters: RefCell::new(HashMap::new()),
            getter_fields: RefCell::new(HashMap::new()),
        }
    }

    pub fn introspector(&self) -> &dyn TypeIntrospector {
        self.introspector.as_ref()
    }

    /// Resolve a type expression through the underlying type graph.
    ///
    /// # Errors
    ///
    /// Propagates the introspector's resolution error.
    pub fn resolve(&self, expression: &str) -> Result<ResolvedType, GenerateError> {
        self.introspector.resolve(expression)
    }

    /// All members of `ty`, computed once.
    pub fn members(&self, ty: &ResolvedType) -> Rc<TypeMembers> {
        if let Some(members) = self.members.borrow().get(ty) {
            return Rc::clone(members);
        }
        let members = Rc::new(self.introspector.members(ty));
        self.members
            .borrow_mut()
            .insert(ty.clone(), Rc::clone(&members));
        members
    }

    /// Whether `ty` is, extends or implements the type with the given erased name.
    pub fn is_instance_of(&self, ty: &ResolvedType, erased_name: &str) -> bool {
        self.find_supertype(ty, erased_name).is_some()
    }

    /// Find the parameterization of a supertype by erased name.
    pub fn find_supertype(&self, ty: &ResolvedType, erased_name: &str) -> Option<ResolvedType> {
        let mut queue = VecDeque::from([ty.clone()]);
        let mut visited = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if current.erased_name() == erased_name {
                return Some(current);
            }
            if visited.insert(current.clone()) {
                queue.extend(self.introspector.supertypes(&current));
            }
        }
        None
    }

    /// The type argument at `index` with which `ty` parameterizes the named supertype.
    pub fn type_parameter_for(
        &self,
        ty: &ResolvedType,
        erased_supertype: &str,
        index: usize,
    ) -> Option<ResolvedType> {
        self.find_supertype(ty, erased_supertype)
            .and_then(|supertype| supertype.type_parameters().get(index).cloned())
    }

    /// Arrays and collections are containers; their schema is an array.
    pub fn is_container_type(&self, ty: &ResolvedType) -> bool {
        ty.is_array() || self.is_instance_of(ty, COLLECTION_TYPE)
    }

    /// Element type of a container, `None` for non-containers.
    pub fn container_item_type(&self, ty: &ResolvedType) -> Option<ResolvedType> {
        if let Some(component) = ty.component_type() {
            return Some(component.clone());
        }
        if self.is_container_type(ty) {
            return Some(
                self.type_parameter_for(ty, COLLECTION_TYPE, 0)
                    .unwrap_or_else(ResolvedType::object),
            );
        }
        None
    }

    /// Annotation on the type or, failing that, on the nearest supertype.
    pub fn type_annotation(&self, ty: &ResolvedType, name: &str) -> Option<Annotation> {
        let mut queue = VecDeque::from([ty.clone()]);
        let mut visited = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(found) = self
                .introspector
                .type_annotations(&current)
                .into_iter()
                .find(|a| a.name == name)
            {
                return Some(found);
            }
            queue.extend(self.introspector.supertypes(&current));
        }
        None
    }

    pub fn is_primitive(&self, ty: &ResolvedType) -> bool {
        self.introspector.is_primitive(ty)
    }

    /// Index of the getter method paired with the field at `field_index`.
    pub(crate) fn getter_for_field(
        &self,
        owner: &ResolvedType,
        members: &TypeMembers,
        field_index: usize,
    ) -> Option<usize> {
        let key = (owner.clone(), field_index);
        if let Some(cached) = self.field_getters.borrow().get(&key) {
            return *cached;
        }
        let found = members.fields.get(field_index).and_then(|field| {
            let candidates = getter_names(&field.name);
            members.methods.iter().position(|method| {
                method.arguments.is_empty()
                    && method.visibility == Visibility::Public
                    && candidates.iter().any(|candidate| *candidate == method.name)
            })
        });
        self.field_getters.borrow_mut().insert(key, found);
        found
    }

    /// Index of the field paired with the getter method at `method_index`.
    pub(crate) fn field_for_getter(
        &self,
        owner: &ResolvedType,
        members: &TypeMembers,
        method_index: usize,
    ) -> Option<usize> {
        let key = (owner.clone(), method_index);
        if let Some(cached) = self.getter_fields.borrow().get(&key) {
            return *cached;
        }
        let found = members.methods.get(method_index).and_then(|method| {
            if !method.arguments.is_empty()
                || method.is_void()
                || method.visibility != Visibility::Public
            {
                return None;
            }
            let field_name = field_name_for_getter(&method.name)?;
            members.fields.iter().position(|field| field.name == field_name)
        });
        self.getter_fields.borrow_mut().insert(key, found);
        found
    }
}

/// Conventional accessor names for a field.
///
/// A field whose second character is uppercase (`xCoordinate`) keeps its
/// first character as is (`getxCoordinate`) in addition to the usual form.
pub(crate) fn getter_names(field_name: &str) -> Vec<String> {
    let mut chars = field_name.chars();
    let Some(first) = chars.next() else {
        return Vec::new();
    };
    let capitalized: String = first.to_uppercase().chain(chars).collect();
    let mut names = vec![format!("get{capitalized}"), format!("is{capitalized}")];
    if second_char_is_uppercase(field_name) {
        names.push(format!("get{field_name}"));
        names.push(format!("is{field_name}"));
    }
    names
}

/// Field name implied by a getter name, e.g. `getName` -> `name`.
pub(crate) fn field_name_for_getter(method_name: &str) -> Option<String> {
    let remainder = method_name
        .strip_prefix("get")
        .or_else(|| method_name.strip_prefix("is"))?;
    let mut chars = remainder.chars();
    let first = chars.next()?;
    if first.is_uppercase() {
        Some(first.to_lowercase().chain(chars).collect())
    } else if second_char_is_uppercase(remainder) {
        Some(remainder.to_string())
    } else {
        None
    }
}

fn second_char_is_uppercase(name: &str) -> bool {
    name.chars().nth(1).is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_catalog_str;

    fn context(catalog: &str) -> TypeContext {
        TypeContext::new(load_catalog_str(catalog).unwrap())
    }

    #[test]
    fn getter_name_candidates() {
        assert_eq!(getter_names("name"), vec!["getName", "isName"]);
        assert_eq!(
            getter_names("xCoordinate"),
            vec!["getXCoordinate", "isXCoordinate", "getxCoordinate", "isxCoordinate"]
        );
    }

    #[test]
    fn field_names_from_getters() {
        assert_eq!(field_name_for_getter("getName"), Some("name".to_string()));
        assert_eq!(field_name_for_getter("isActive"), Some("active".to_string()));
        assert_eq!(
            field_name_for_getter("getxCoordinate"),
            Some("xCoordinate".to_string())
        );
        assert_eq!(field_name_for_getter("getter"), None);
        assert_eq!(field_name_for_getter("get"), None);
        assert_eq!(field_name_for_getter("compute"), None);
    }

    #[test]
    fn container_detection() {
        let ctx = context(r#"{"types":[]}"#);
        let list = ctx.resolve("ArrayList<Integer>").unwrap();
        assert!(ctx.is_container_type(&list));
        assert_eq!(
            ctx.container_item_type(&list),
            Some(ResolvedType::simple("Integer"))
        );

        let array = ctx.resolve("String[]").unwrap();
        assert_eq!(
            ctx.container_item_type(&array),
            Some(ResolvedType::simple("String"))
        );

        let map = ctx.resolve("Map<String, Integer>").unwrap();
        assert!(!ctx.is_container_type(&map));
        assert_eq!(ctx.container_item_type(&map), None);
    }

    #[test]
    fn type_parameter_through_hierarchy() {
        let ctx = context(r#"{"types":[]}"#);
        let map = ctx.resolve("HashMap<String, Long>").unwrap();
        assert_eq!(
            ctx.type_parameter_for(&map, "Map", 1),
            Some(ResolvedType::simple("Long"))
        );
    }

    #[test]
    fn getter_pairing_is_memoized_per_owner() {
        let ctx = context(
            r#"{"types":[{
                "name": "Point",
                "fields": [{ "name": "xCoordinate", "type": "int" }, { "name": "label", "type": "String" }],
                "methods": [
                    { "name": "getxCoordinate", "returns": "int" },
                    { "name": "getLabel", "returns": "String", "visibility": "private" }
                ]
            }]}"#,
        );
        let point = ctx.resolve("Point").unwrap();
        let members = ctx.members(&point);
        assert_eq!(ctx.getter_for_field(&point, &members, 0), Some(0));
        assert_eq!(ctx.getter_for_field(&point, &members, 1), None);
        assert_eq!(ctx.field_for_getter(&point, &members, 0), Some(0));
        assert_eq!(ctx.field_for_getter(&point, &members, 1), None);
        assert!(Rc::ptr_eq(&members, &ctx.members(&point)));
    }

    #[test]
    fn type_annotation_considers_supertypes() {
        let ctx = context(
            r#"{"types":[
                { "name": "Base", "annotations": [{ "name": "Title", "values": { "value": "Base" } }] },
                { "name": "Child", "supertypes": ["Base"] }
            ]}"#,
        );
        let child = ctx.resolve("Child").unwrap();
        let title = ctx.type_annotation(&child, "Title").unwrap();
        assert_eq!(title.str_value("value"), Some("Base"));
        assert!(ctx.type_annotation(&child, "Description").is_none());
    }
}
