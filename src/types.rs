//! Core type representations.
//!
//! [`ResolvedType`] is a fully parameterized type as seen by the generator;
//! [`TypeExpr`] is the unresolved textual form used in catalogs, which may
//! still mention type variables.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Name of the universal supertype.
pub const OBJECT_TYPE: &str = "Object";

/// A concrete type with all of its type parameters bound.
///
/// Two resolved types are the same entity when erased name, parameters and
/// array component all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedType {
    name: String,
    type_parameters: Vec<ResolvedType>,
    component: Option<Box<ResolvedType>>,
}

impl ResolvedType {
    /// Create a (possibly generic) named type.
    pub fn new(name: impl Into<String>, type_parameters: Vec<ResolvedType>) -> Self {
        Self {
            name: name.into(),
            type_parameters,
            component: None,
        }
    }

    /// Create a type without type parameters.
    pub fn simple(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Create an array type over the given component type.
    pub fn array_of(component: ResolvedType) -> Self {
        Self {
            name: format!("{}[]", component.name),
            type_parameters: Vec::new(),
            component: Some(Box::new(component)),
        }
    }

    /// The universal supertype.
    pub fn object() -> Self {
        Self::simple(OBJECT_TYPE)
    }

    /// Erased name, e.g. `com.example.Box` for `com.example.Box<String>`.
    pub fn erased_name(&self) -> &str {
        &self.name
    }

    pub fn type_parameters(&self) -> &[ResolvedType] {
        &self.type_parameters
    }

    /// Component type if this is an array.
    pub fn component_type(&self) -> Option<&ResolvedType> {
        self.component.as_deref()
    }

    pub fn is_array(&self) -> bool {
        self.component.is_some()
    }

    pub fn is_object(&self) -> bool {
        self.component.is_none() && self.name == OBJECT_TYPE
    }

    /// Name without its namespace.
    pub fn simple_name(&self) -> &str {
        simple_name_of(&self.name)
    }

    /// Full description, e.g. `com.example.Box<com.example.Item>`.
    pub fn description(&self) -> String {
        self.describe(false)
    }

    /// Short description, e.g. `Box<Item>`; used for default definition names.
    pub fn simple_description(&self) -> String {
        self.describe(true)
    }

    fn describe(&self, simple: bool) -> String {
        if let Some(component) = &self.component {
            return format!("{}[]", component.describe(simple));
        }
        let mut out = String::from(if simple {
            self.simple_name()
        } else {
            self.name.as_str()
        });
        if !self.type_parameters.is_empty() {
            let params: Vec<String> = self
                .type_parameters
                .iter()
                .map(|p| p.describe(simple))
                .collect();
            out.push('<');
            out.push_str(&params.join(", "));
            out.push('>');
        }
        out
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Strip the namespace from a dotted type name.
pub fn simple_name_of(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Unresolved type expression, e.g. `Map<String, List<T>>[]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum TypeExpr {
    Named { name: String, arguments: Vec<TypeExpr> },
    Array(Box<TypeExpr>),
}

impl TypeExpr {
    /// Parse a type expression.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first syntax problem.
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut parser = Parser {
            chars: input.chars().collect(),
            pos: 0,
        };
        let expr = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.pos != parser.chars.len() {
            return Err(format!("unexpected '{}' at offset {}", parser.chars[parser.pos], parser.pos));
        }
        Ok(expr)
    }

    /// Every type name mentioned anywhere in this expression.
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeExpr::Named { name, arguments } => {
                out.push(name);
                for argument in arguments {
                    argument.collect_names(out);
                }
            }
            TypeExpr::Array(component) => component.collect_names(out),
        }
    }
}

impl TryFrom<String> for TypeExpr {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TypeExpr::parse(&value)
    }
}

impl FromStr for TypeExpr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeExpr::parse(s)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named { name, arguments } if arguments.is_empty() => f.write_str(name),
            TypeExpr::Named { name, arguments } => {
                let args: Vec<String> = arguments.iter().map(ToString::to_string).collect();
                write!(f, "{}<{}>", name, args.join(", "))
            }
            TypeExpr::Array(component) => write!(f, "{}[]", component),
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn parse_type(&mut self) -> Result<TypeExpr, String> {
        self.skip_whitespace();
        let name = self.parse_name()?;
        self.skip_whitespace();
        let mut arguments = Vec::new();
        if self.peek() == Some('<') {
            self.pos += 1;
            loop {
                arguments.push(self.parse_type()?);
                self.skip_whitespace();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    Some(c) => return Err(format!("expected ',' or '>' but found '{c}'")),
                    None => return Err("unterminated type argument list".to_string()),
                }
            }
        }
        let mut expr = TypeExpr::Named { name, arguments };
        loop {
            self.skip_whitespace();
            if self.peek() == Some('[') && self.chars.get(self.pos + 1) == Some(&']') {
                self.pos += 2;
                expr = TypeExpr::Array(Box::new(expr));
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_name(&mut self) -> Result<String, String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '$') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if start == self.pos {
            return match self.peek() {
                Some(c) => Err(format!("expected type name but found '{c}'")),
                None => Err("expected type name".to_string()),
            };
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, arguments: Vec<TypeExpr>) -> TypeExpr {
        TypeExpr::Named {
            name: name.to_string(),
            arguments,
        }
    }

    #[test]
    fn parse_plain_name() {
        assert_eq!(TypeExpr::parse("com.example.Pair"), Ok(named("com.example.Pair", vec![])));
    }

    #[test]
    fn parse_nested_generics_and_arrays() {
        let expr = TypeExpr::parse("Map<String, List<T>>[]").unwrap();
        assert_eq!(
            expr,
            TypeExpr::Array(Box::new(named(
                "Map",
                vec![named("String", vec![]), named("List", vec![named("T", vec![])])]
            )))
        );
        assert_eq!(expr.to_string(), "Map<String, List<T>>[]");
        assert_eq!(expr.names(), vec!["Map", "String", "List", "T"]);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(TypeExpr::parse("").is_err());
        assert!(TypeExpr::parse("List<String").is_err());
        assert!(TypeExpr::parse("List<>").is_err());
        assert!(TypeExpr::parse("A B").is_err());
    }

    #[test]
    fn descriptions() {
        let ty = ResolvedType::new(
            "com.example.Box",
            vec![ResolvedType::simple("java.lang.String"), ResolvedType::simple("Integer")],
        );
        assert_eq!(ty.simple_description(), "Box<String, Integer>");
        assert_eq!(ty.description(), "com.example.Box<java.lang.String, Integer>");

        let array = ResolvedType::array_of(ty);
        assert_eq!(array.simple_description(), "Box<String, Integer>[]");
        assert!(array.is_array());
    }

    #[test]
    fn identity_includes_parameters() {
        let a = ResolvedType::new("Box", vec![ResolvedType::simple("String")]);
        let b = ResolvedType::new("Box", vec![ResolvedType::simple("Integer")]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
