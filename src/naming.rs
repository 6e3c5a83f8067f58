//! Definition naming.
//!
//! A [`DefinitionNamingStrategy`] turns definition keys into names for the
//! definitions container. Whatever it returns is sanitized afterwards, so
//! the names are always safe to use in a `$ref` pointer.

use indexmap::IndexMap;

use crate::context::{DefinitionKey, GenerationContext};

/// Names shared definitions.
pub trait DefinitionNamingStrategy {
    /// Base name for a definition; may collide with other keys.
    fn definition_name_for_key(&self, key: &DefinitionKey, context: &GenerationContext<'_>) -> String;

    /// Make the names of keys sharing a base name distinct.
    ///
    /// The default appends `-1`, `-2`, ... in the given order.
    fn adjust_duplicate_names(&self, names: &mut IndexMap<DefinitionKey, String>, _context: &GenerationContext<'_>) {
        for (index, name) in names.values_mut().enumerate() {
            *name = format!("{}-{}", name, index + 1);
        }
    }

    /// Name of the definition allowing `null` in addition to `name`.
    fn adjust_nullable_name(&self, _key: &DefinitionKey, name: &str, _context: &GenerationContext<'_>) -> String {
        format!("{name}-nullable")
    }
}

/// Names definitions after the type's simple description, e.g. `Box<String>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNamingStrategy;

impl DefinitionNamingStrategy for DefaultNamingStrategy {
    fn definition_name_for_key(&self, key: &DefinitionKey, _context: &GenerationContext<'_>) -> String {
        key.ty().simple_description()
    }
}

/// Applies a sanitizer to every name another strategy produces.
pub(crate) struct CleanNamingStrategy<'s> {
    inner: &'s dyn DefinitionNamingStrategy,
    sanitize: fn(&str) -> String,
}

impl<'s> CleanNamingStrategy<'s> {
    /// `plain` restricts names to `[a-zA-Z0-9.-_]`; otherwise they are URI-safe.
    pub(crate) fn new(inner: &'s dyn DefinitionNamingStrategy, plain: bool) -> Self {
        Self {
            inner,
            sanitize: if plain {
                ensure_plain_definition_key
            } else {
                ensure_uri_compatible_definition_key
            },
        }
    }
}

impl DefinitionNamingStrategy for CleanNamingStrategy<'_> {
    fn definition_name_for_key(&self, key: &DefinitionKey, context: &GenerationContext<'_>) -> String {
        (self.sanitize)(&self.inner.definition_name_for_key(key, context))
    }

    fn adjust_duplicate_names(&self, names: &mut IndexMap<DefinitionKey, String>, context: &GenerationContext<'_>) {
        self.inner.adjust_duplicate_names(names, context);
        for name in names.values_mut() {
            *name = (self.sanitize)(name);
        }
    }

    fn adjust_nullable_name(&self, key: &DefinitionKey, name: &str, context: &GenerationContext<'_>) -> String {
        (self.sanitize)(&self.inner.adjust_nullable_name(key, name, context))
    }
}

/// Replace or strip characters that are not allowed unescaped in a URI fragment.
pub fn ensure_uri_compatible_definition_key(name: &str) -> String {
    name.replace("[]", "*")
        .chars()
        .filter_map(|c| match c {
            '<' => Some('('),
            '>' => Some(')'),
            c if c.is_ascii_alphanumeric() || ".-_$*(),".contains(c) => Some(c),
            _ => None,
        })
        .collect()
}

/// Restrict a name to `[a-zA-Z0-9.-_]`.
pub fn ensure_plain_definition_key(name: &str) -> String {
    name.replace('$', "-")
        .replace("[]", "...")
        .chars()
        .filter_map(|c| match c {
            '<' | '>' => Some('_'),
            ',' => Some('.'),
            c if c.is_ascii_alphanumeric() || ".-_".contains(c) => Some(c),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_compatible_keys() {
        assert_eq!(
            ensure_uri_compatible_definition_key("Map<String, List<Item>>"),
            "Map(String,List(Item))"
        );
        assert_eq!(ensure_uri_compatible_definition_key("Item[]"), "Item*");
        assert_eq!(ensure_uri_compatible_definition_key("Outer$Inner"), "Outer$Inner");
        assert_eq!(ensure_uri_compatible_definition_key("a#b/c"), "abc");
    }

    #[test]
    fn plain_keys() {
        assert_eq!(
            ensure_plain_definition_key("Map<String, List<Item>>"),
            "Map_String.List_Item__"
        );
        assert_eq!(ensure_plain_definition_key("Item[]"), "Item...");
        assert_eq!(ensure_plain_definition_key("Outer$Inner"), "Outer-Inner");
        for name in ["Box<String>[]", "Pair(1)", "x y"] {
            let key = ensure_plain_definition_key(name);
            assert!(key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || ".-_".contains(c)));
        }
    }
}
