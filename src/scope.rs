//! Type and member scopes handed to configuration callbacks.
//!
//! A [`MemberScope`] covers both fields and methods; only name derivation and
//! the field/getter pairing differ between the two kinds.

use std::rc::Rc;

use serde_json::Value;

use crate::introspect::{Annotation, FieldInfo, MethodInfo, TypeMembers, Visibility};
use crate::type_context::{field_name_for_getter, TypeContext};
use crate::types::ResolvedType;

/// A type under consideration.
#[derive(Clone)]
pub struct TypeScope {
    ty: ResolvedType,
    context: Rc<TypeContext>,
}

impl std::fmt::Debug for TypeScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeScope({})", self.ty)
    }
}

impl TypeScope {
    pub fn new(ty: ResolvedType, context: Rc<TypeContext>) -> Self {
        Self { ty, context }
    }

    pub fn ty(&self) -> &ResolvedType {
        &self.ty
    }

    pub fn context(&self) -> &TypeContext {
        &self.context
    }

    pub fn simple_type_description(&self) -> String {
        self.ty.simple_description()
    }

    pub fn full_type_description(&self) -> String {
        self.ty.description()
    }

    pub fn is_container_type(&self) -> bool {
        self.context.is_container_type(&self.ty)
    }

    pub fn container_item_type(&self) -> Option<ResolvedType> {
        self.context.container_item_type(&self.ty)
    }

    pub fn is_instance_of(&self, erased_name: &str) -> bool {
        self.context.is_instance_of(&self.ty, erased_name)
    }

    pub fn type_parameter_for(&self, erased_supertype: &str, index: usize) -> Option<ResolvedType> {
        self.context.type_parameter_for(&self.ty, erased_supertype, index)
    }

    /// Annotation on the type or one of its supertypes.
    pub fn annotation(&self, name: &str) -> Option<Annotation> {
        self.context.type_annotation(&self.ty, name)
    }

    pub fn enum_constants(&self) -> Option<Vec<String>> {
        self.context.introspector().enum_constants(&self.ty)
    }

    pub fn is_primitive(&self) -> bool {
        self.context.is_primitive(&self.ty)
    }
}

/// Whether a member is backed by a field or a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Method,
}

/// A field or method of the type whose properties are being collected.
#[derive(Clone)]
pub struct MemberScope {
    owner: ResolvedType,
    members: Rc<TypeMembers>,
    kind: MemberKind,
    index: usize,
    overridden_type: Option<ResolvedType>,
    overridden_name: Option<String>,
    fake_container_item: bool,
    strip_getter_prefix: bool,
    context: Rc<TypeContext>,
}

impl std::fmt::Debug for MemberScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberScope")
            .field("owner", &self.owner.description())
            .field("kind", &self.kind)
            .field("name", &self.declared_name())
            .field("overridden_type", &self.overridden_type)
            .field("overridden_name", &self.overridden_name)
            .field("fake_container_item", &self.fake_container_item)
            .finish()
    }
}

impl MemberScope {
    /// Scope for the field at `index` of `members`.
    pub fn field(
        owner: ResolvedType,
        members: Rc<TypeMembers>,
        index: usize,
        context: Rc<TypeContext>,
    ) -> Self {
        Self::create(owner, members, MemberKind::Field, index, false, context)
    }

    /// Scope for the method at `index` of `members`.
    ///
    /// With `strip_getter_prefix`, argument-free methods are named like the
    /// field they would expose (`getName()` becomes `name`).
    pub fn method(
        owner: ResolvedType,
        members: Rc<TypeMembers>,
        index: usize,
        strip_getter_prefix: bool,
        context: Rc<TypeContext>,
    ) -> Self {
        Self::create(
            owner,
            members,
            MemberKind::Method,
            index,
            strip_getter_prefix,
            context,
        )
    }

    fn create(
        owner: ResolvedType,
        members: Rc<TypeMembers>,
        kind: MemberKind,
        index: usize,
        strip_getter_prefix: bool,
        context: Rc<TypeContext>,
    ) -> Self {
        Self {
            owner,
            members,
            kind,
            index,
            overridden_type: None,
            overridden_name: None,
            fake_container_item: false,
            strip_getter_prefix,
            context,
        }
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    pub fn is_field(&self) -> bool {
        self.kind == MemberKind::Field
    }

    pub fn is_method(&self) -> bool {
        self.kind == MemberKind::Method
    }

    pub fn field_info(&self) -> Option<&FieldInfo> {
        match self.kind {
            MemberKind::Field => self.members.fields.get(self.index),
            MemberKind::Method => None,
        }
    }

    pub fn method_info(&self) -> Option<&MethodInfo> {
        match self.kind {
            MemberKind::Method => self.members.methods.get(self.index),
            MemberKind::Field => None,
        }
    }

    /// The type whose properties are being collected.
    pub fn owner(&self) -> &ResolvedType {
        &self.owner
    }

    pub fn context(&self) -> &TypeContext {
        &self.context
    }

    /// Name as declared.
    pub fn declared_name(&self) -> &str {
        match (self.field_info(), self.method_info()) {
            (Some(field), _) => &field.name,
            (_, Some(method)) => &method.name,
            _ => "",
        }
    }

    /// Declared type; `None` for methods without a return value.
    pub fn declared_type(&self) -> Option<&ResolvedType> {
        match (self.field_info(), self.method_info()) {
            (Some(field), _) => Some(&field.ty),
            (_, Some(method)) => method.return_type.as_ref(),
            _ => None,
        }
    }

    /// Effective type: the override if present, else the declared type.
    pub fn ty(&self) -> Option<&ResolvedType> {
        self.overridden_type.as_ref().or_else(|| self.declared_type())
    }

    /// Scope of the effective type.
    pub fn type_scope(&self) -> Option<TypeScope> {
        self.ty()
            .map(|ty| TypeScope::new(ty.clone(), Rc::clone(&self.context)))
    }

    pub fn declaring_type(&self) -> Option<&ResolvedType> {
        match (self.field_info(), self.method_info()) {
            (Some(field), _) => Some(&field.declaring_type),
            (_, Some(method)) => Some(&method.declaring_type),
            _ => None,
        }
    }

    pub fn visibility(&self) -> Visibility {
        match (self.field_info(), self.method_info()) {
            (Some(field), _) => field.visibility,
            (_, Some(method)) => method.visibility,
            _ => Visibility::Private,
        }
    }

    pub fn is_public(&self) -> bool {
        self.visibility() == Visibility::Public
    }

    pub fn is_static(&self) -> bool {
        match (self.field_info(), self.method_info()) {
            (Some(field), _) => field.is_static,
            (_, Some(method)) => method.is_static,
            _ => false,
        }
    }

    pub fn is_final(&self) -> bool {
        self.field_info().is_some_and(|field| field.is_final)
    }

    pub fn is_transient(&self) -> bool {
        self.field_info().is_some_and(|field| field.is_transient)
    }

    /// Constant value of a static final field.
    pub fn constant_value(&self) -> Option<&Value> {
        self.field_info()
            .filter(|field| field.is_static && field.is_final)
            .and_then(|field| field.constant.as_ref())
    }

    /// Whether this field is one of its declaring enum's constants.
    pub fn is_enum_constant(&self) -> bool {
        let Some(field) = self.field_info() else {
            return false;
        };
        field.is_static
            && self
                .context
                .introspector()
                .enum_constants(&field.declaring_type)
                .is_some_and(|constants| constants.contains(&field.name))
    }

    pub fn argument_types(&self) -> &[ResolvedType] {
        self.method_info()
            .map(|method| method.arguments.as_slice())
            .unwrap_or_default()
    }

    pub fn argument_count(&self) -> usize {
        self.argument_types().len()
    }

    pub fn is_void(&self) -> bool {
        self.method_info().is_some_and(MethodInfo::is_void)
    }

    // --- Field/getter pairing ---

    /// The public, argument-free getter paired with this field.
    pub fn find_getter(&self) -> Option<MemberScope> {
        if !self.is_field() {
            return None;
        }
        let index = self
            .context
            .getter_for_field(&self.owner, &self.members, self.index)?;
        Some(Self::method(
            self.owner.clone(),
            Rc::clone(&self.members),
            index,
            self.strip_getter_prefix,
            Rc::clone(&self.context),
        ))
    }

    pub fn has_getter(&self) -> bool {
        self.find_getter().is_some()
    }

    /// The field exposed by this getter method.
    pub fn find_getter_field(&self) -> Option<MemberScope> {
        if !self.is_method() {
            return None;
        }
        let index = self
            .context
            .field_for_getter(&self.owner, &self.members, self.index)?;
        Some(Self::field(
            self.owner.clone(),
            Rc::clone(&self.members),
            index,
            Rc::clone(&self.context),
        ))
    }

    pub fn is_getter(&self) -> bool {
        self.find_getter_field().is_some()
    }

    // --- Annotations ---

    /// Annotation on the member itself.
    ///
    /// Synthetic container item scopes carry no member annotations.
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        if self.fake_container_item {
            return None;
        }
        let annotations = match (self.field_info(), self.method_info()) {
            (Some(field), _) => &field.annotations,
            (_, Some(method)) => &method.annotations,
            _ => return None,
        };
        annotations.iter().find(|a| a.name == name)
    }

    /// Annotation on the member or on its paired field/getter.
    pub fn annotation_considering_field_and_getter(&self, name: &str) -> Option<Annotation> {
        if let Some(found) = self.annotation(name) {
            return Some(found.clone());
        }
        if self.fake_container_item {
            return None;
        }
        let paired = match self.kind {
            MemberKind::Field => self.find_getter(),
            MemberKind::Method => self.find_getter_field(),
        };
        paired.and_then(|member| member.annotation(name).cloned())
    }

    // --- Overrides ---

    pub fn overridden_type(&self) -> Option<&ResolvedType> {
        self.overridden_type.as_ref()
    }

    pub fn overridden_name(&self) -> Option<&str> {
        self.overridden_name.as_deref()
    }

    /// Copy of this scope with a different effective type.
    pub fn with_overridden_type(&self, ty: ResolvedType) -> Self {
        let mut scope = self.clone();
        scope.overridden_type = Some(ty);
        scope
    }

    /// Copy of this scope with a different property name.
    pub fn with_overridden_name(&self, name: impl Into<String>) -> Self {
        let mut scope = self.clone();
        scope.overridden_name = Some(name.into());
        scope
    }

    /// Synthetic scope standing for one item of this member's container type.
    pub fn as_fake_container_item_scope(&self) -> Self {
        let item = self
            .ty()
            .and_then(|ty| self.context.container_item_type(ty))
            .unwrap_or_else(ResolvedType::object);
        self.fake_item(item)
    }

    /// Synthetic scope for a type argument of a generic member type, e.g. the
    /// values of a `Map` (`erased_supertype = "Map"`, `index = 1`).
    pub fn as_fake_container_item_scope_for(&self, erased_supertype: &str, index: usize) -> Self {
        let item = self
            .ty()
            .and_then(|ty| self.context.type_parameter_for(ty, erased_supertype, index))
            .unwrap_or_else(ResolvedType::object);
        self.fake_item(item)
    }

    fn fake_item(&self, item: ResolvedType) -> Self {
        let mut scope = self.with_overridden_type(item);
        scope.fake_container_item = true;
        scope
    }

    pub fn is_fake_container_item(&self) -> bool {
        self.fake_container_item
    }

    pub fn is_container_type(&self) -> bool {
        self.ty()
            .is_some_and(|ty| self.context.is_container_type(ty))
    }

    pub fn container_item_type(&self) -> Option<ResolvedType> {
        self.ty().and_then(|ty| self.context.container_item_type(ty))
    }

    /// Key of this member inside its parent's `properties`.
    pub fn schema_property_name(&self) -> String {
        let base = self
            .overridden_name
            .clone()
            .unwrap_or_else(|| self.declared_name().to_string());
        if self.is_field() {
            return base;
        }
        if self.argument_count() > 0 {
            let arguments: Vec<String> = self
                .argument_types()
                .iter()
                .map(ResolvedType::simple_description)
                .collect();
            return format!("{}({})", base, arguments.join(", "));
        }
        if self.strip_getter_prefix {
            if self.overridden_name.is_some() {
                return base;
            }
            if let Some(derived) = field_name_for_getter(&base) {
                return derived;
            }
        }
        format!("{base}()")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_catalog_str;

    const CATALOG: &str = r#"{"types":[
        {
            "name": "Person",
            "fields": [
                { "name": "name", "type": "String",
                  "annotations": [{ "name": "Description", "values": { "value": "full name" } }] },
                { "name": "tags", "type": "List<String>" },
                { "name": "MAX", "type": "int", "static": true, "final": true, "constant": 3 }
            ],
            "methods": [
                { "name": "getName", "returns": "String",
                  "annotations": [{ "name": "Title", "values": { "value": "Name" } }] },
                { "name": "rename", "returns": "Person", "arguments": ["String", "int"] },
                { "name": "size", "returns": "int" },
                { "name": "reset" }
            ]
        }
    ]}"#;

    fn person() -> (ResolvedType, Rc<TypeMembers>, Rc<TypeContext>) {
        let context = Rc::new(TypeContext::new(load_catalog_str(CATALOG).unwrap()));
        let person = context.resolve("Person").unwrap();
        let members = context.members(&person);
        (person, members, context)
    }

    fn field(index: usize) -> MemberScope {
        let (owner, members, context) = person();
        MemberScope::field(owner, members, index, context)
    }

    fn method(index: usize, strip: bool) -> MemberScope {
        let (owner, members, context) = person();
        MemberScope::method(owner, members, index, strip, context)
    }

    #[test]
    fn field_and_getter_pair_up() {
        let name = field(0);
        let getter = name.find_getter().unwrap();
        assert_eq!(getter.declared_name(), "getName");
        assert!(getter.is_getter());
        assert_eq!(getter.find_getter_field().unwrap().declared_name(), "name");
        assert!(!field(1).has_getter());
    }

    #[test]
    fn annotations_consider_paired_member() {
        let name = field(0);
        assert!(name.annotation("Title").is_none());
        let title = name.annotation_considering_field_and_getter("Title").unwrap();
        assert_eq!(title.str_value("value"), Some("Name"));

        let getter = method(0, false);
        let description = getter
            .annotation_considering_field_and_getter("Description")
            .unwrap();
        assert_eq!(description.str_value("value"), Some("full name"));
    }

    #[test]
    fn property_names() {
        assert_eq!(field(0).schema_property_name(), "name");
        assert_eq!(method(0, false).schema_property_name(), "getName()");
        assert_eq!(method(0, true).schema_property_name(), "name");
        assert_eq!(method(1, true).schema_property_name(), "rename(String, int)");
        assert_eq!(method(2, true).schema_property_name(), "size()");
        assert_eq!(
            method(0, true).with_overridden_name("label").schema_property_name(),
            "label"
        );
    }

    #[test]
    fn overrides_and_fake_container_items() {
        let tags = field(1);
        assert!(tags.is_container_type());
        let item = tags.as_fake_container_item_scope();
        assert!(item.is_fake_container_item());
        assert_eq!(item.ty(), Some(&ResolvedType::simple("String")));
        assert_eq!(item.declared_type(), tags.declared_type());

        let overridden = field(0).with_overridden_type(ResolvedType::simple("Integer"));
        assert_eq!(overridden.ty(), Some(&ResolvedType::simple("Integer")));
        assert!(overridden.annotation("Description").is_some());
        assert!(item.annotation("Description").is_none());
    }

    #[test]
    fn constants_and_void_methods() {
        assert_eq!(field(2).constant_value(), Some(&Value::from(3)));
        assert!(field(0).constant_value().is_none());
        assert!(method(3, false).is_void());
        assert!(method(3, false).ty().is_none());
        assert_eq!(method(1, false).argument_count(), 2);
    }
}
