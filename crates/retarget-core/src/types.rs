//! Advisory types used to pick overlay rules.
//!
//! Types never reject a program. They only decide which rule key is tried
//! first: a value of type `list[int]` looks for `list[int].append`, then
//! `list[number].append`, and so on down its generalization chain until
//! `any.append`.

use std::fmt;

/// Universal type; every generalization chain ends here.
pub const ANY: &str = "any";
/// Result type of anything no rule could resolve.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    /// Primitive or user-defined name: `int`, `str`, `Point`, `list`.
    Named(String),
    /// `list[T]`
    List(Box<Type>),
    /// `dict[K, V]`
    Dict(Box<Type>, Box<Type>),
    /// `module[name]`
    Module(String),
}

impl Default for Type {
    fn default() -> Self {
        Type::unknown()
    }
}

impl Type {
    pub fn named(name: impl Into<String>) -> Self {
        Type::Named(name.into())
    }

    pub fn any() -> Self {
        Type::named(ANY)
    }

    pub fn unknown() -> Self {
        Type::named(UNKNOWN)
    }

    pub fn list(element: Type) -> Self {
        Type::List(Box::new(element))
    }

    pub fn dict(key: Type, value: Type) -> Self {
        Type::Dict(Box::new(key), Box::new(value))
    }

    pub fn module(name: impl Into<String>) -> Self {
        Type::Module(name.into())
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Named(n) if n == ANY)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Named(n) if n == UNKNOWN)
    }

    /// Next more general type, or `None` for `any`.
    ///
    /// Scalars: `bool -> int -> number -> any`, `float -> number`, every
    /// other name goes straight to `any`. Composites generalize their
    /// innermost parameters first, then drop them: `list[int] ->
    /// list[number] -> list[any] -> list -> any`. Dicts generalize the
    /// value before the key.
    pub fn generalize(&self) -> Option<Type> {
        match self {
            Type::Named(name) => match name.as_str() {
                ANY => None,
                "bool" => Some(Type::named("int")),
                "int" | "float" => Some(Type::named("number")),
                _ => Some(Type::any()),
            },
            Type::List(element) => match element.generalize() {
                Some(element) => Some(Type::list(element)),
                None => Some(Type::named("list")),
            },
            Type::Dict(key, value) => {
                if let Some(value) = value.generalize() {
                    Some(Type::dict((**key).clone(), value))
                } else if let Some(key) = key.generalize() {
                    Some(Type::dict(key, (**value).clone()))
                } else {
                    Some(Type::named("dict"))
                }
            }
            Type::Module(_) => Some(Type::named("module")),
        }
    }

    /// The type itself followed by every generalization, ending at `any`.
    pub fn generalization_chain(&self) -> Vec<Type> {
        let mut chain = vec![self.clone()];
        while let Some(next) = chain.last().and_then(Type::generalize) {
            chain.push(next);
        }
        chain
    }

    /// Strictly decreases with every `generalize` step.
    pub fn specificity(&self) -> u32 {
        match self {
            Type::Named(name) => match name.as_str() {
                ANY => 0,
                "bool" => 3,
                "int" | "float" => 2,
                _ => 1,
            },
            Type::List(element) => 2 + element.specificity(),
            Type::Dict(key, value) => 2 + key.specificity() + value.specificity(),
            Type::Module(_) => 2,
        }
    }

    /// Element type produced by indexing: list items, dict values, characters.
    pub fn element_type(&self) -> Type {
        match self {
            Type::List(element) => (**element).clone(),
            Type::Dict(_, value) => (**value).clone(),
            Type::Named(name) if name == "str" => self.clone(),
            _ => Type::unknown(),
        }
    }

    /// Key type: dict keys, list positions.
    pub fn key_type(&self) -> Type {
        match self {
            Type::Dict(key, _) => (**key).clone(),
            Type::List(_) => Type::named("int"),
            Type::Named(name) if name == "str" || name == "list" => Type::named("int"),
            _ => Type::unknown(),
        }
    }

    /// Type bound by `for x in <self>`: dicts iterate their keys.
    pub fn iteration_type(&self) -> Type {
        match self {
            Type::Dict(key, _) => (**key).clone(),
            _ => self.element_type(),
        }
    }

    /// Inverse of `Display`.
    pub fn parse(text: &str) -> Result<Type, TypeSyntaxError> {
        let text = text.trim();
        let Some((head, inner)) = split_brackets(text, '[', ']')? else {
            return parse_name(text).map(Type::named);
        };
        match head {
            "list" => Ok(Type::list(Type::parse(inner)?)),
            "dict" => {
                let [key, value] = split_pair(inner)?;
                Ok(Type::dict(Type::parse(key)?, Type::parse(value)?))
            }
            "module" => Ok(Type::module(parse_name(inner)?)),
            other => Err(TypeSyntaxError(format!("`{}` takes no parameters", other))),
        }
    }

    /// Least common type of a set of values, for literal collections.
    pub fn unify<'a>(types: impl IntoIterator<Item = &'a Type>) -> Type {
        let mut types = types.into_iter();
        let Some(first) = types.next() else {
            return Type::any();
        };
        let mut chain = first.generalization_chain();
        for ty in types {
            let other = ty.generalization_chain();
            chain.retain(|t| other.contains(t));
        }
        chain.into_iter().next().unwrap_or_else(Type::any)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named(name) => f.write_str(name),
            Type::List(element) => write!(f, "list[{}]", element),
            Type::Dict(key, value) => write!(f, "dict[{}, {}]", key, value),
            Type::Module(name) => write!(f, "module[{}]", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TypeSyntaxError(String);

/// Where a `TypeExpr` gets the types of the values a rule was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand<'a> {
    /// A named part: `$obj`, `$left`.
    Part(&'a str),
    /// A positional argument: `$0`.
    Arg(usize),
}

/// Declarative result type of an overlay rule.
///
/// Grammar: a fixed type (`int`, `list[str]`), `$name`, `$N`,
/// `element(e)`, `key(e)`, `list[e]`, `dict[e, e]` or `module[name]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Fixed(Type),
    Part(String),
    Arg(usize),
    Element(Box<TypeExpr>),
    Key(Box<TypeExpr>),
    List(Box<TypeExpr>),
    Dict(Box<TypeExpr>, Box<TypeExpr>),
}

impl TypeExpr {
    pub fn parse(text: &str) -> Result<TypeExpr, TypeSyntaxError> {
        let text = text.trim();
        if let Some(reference) = text.strip_prefix('$') {
            if !reference.is_empty() && reference.chars().all(|c| c.is_ascii_digit()) {
                let index = reference
                    .parse()
                    .map_err(|_| TypeSyntaxError(format!("bad argument index `{}`", reference)))?;
                return Ok(TypeExpr::Arg(index));
            }
            return parse_name(reference).map(|name| TypeExpr::Part(name.to_string()));
        }

        let is_call = text.find(['(', '[']).is_some_and(|i| text[i..].starts_with('('));
        if is_call && let Some((head, inner)) = split_brackets(text, '(', ')')? {
            return match head {
                "element" => Ok(TypeExpr::Element(Box::new(TypeExpr::parse(inner)?))),
                "key" => Ok(TypeExpr::Key(Box::new(TypeExpr::parse(inner)?))),
                other => Err(TypeSyntaxError(format!("unknown type function `{}`", other))),
            };
        }

        match split_brackets(text, '[', ']')? {
            Some(("list", inner)) => Ok(TypeExpr::List(Box::new(TypeExpr::parse(inner)?))),
            Some(("dict", inner)) => {
                let [key, value] = split_pair(inner)?;
                Ok(TypeExpr::Dict(
                    Box::new(TypeExpr::parse(key)?),
                    Box::new(TypeExpr::parse(value)?),
                ))
            }
            _ => Type::parse(text).map(TypeExpr::Fixed),
        }
    }

    /// Evaluate against the operands of one rule application.
    ///
    /// Operands that are not bound evaluate to `unknown`.
    pub fn eval<F>(&self, lookup: &F) -> Type
    where
        F: Fn(Operand<'_>) -> Option<Type>,
    {
        match self {
            TypeExpr::Fixed(ty) => ty.clone(),
            TypeExpr::Part(name) => lookup(Operand::Part(name)).unwrap_or_default(),
            TypeExpr::Arg(index) => lookup(Operand::Arg(*index)).unwrap_or_default(),
            TypeExpr::Element(inner) => inner.eval(lookup).element_type(),
            TypeExpr::Key(inner) => inner.eval(lookup).key_type(),
            TypeExpr::List(inner) => Type::list(inner.eval(lookup)),
            TypeExpr::Dict(key, value) => Type::dict(key.eval(lookup), value.eval(lookup)),
        }
    }
}

/// `head<open>inner<close>` with the closer at the very end.
fn split_brackets(
    text: &str,
    open: char,
    close: char,
) -> Result<Option<(&str, &str)>, TypeSyntaxError> {
    let Some(start) = text.find(open) else {
        return Ok(None);
    };
    if !text.ends_with(close) {
        return Err(TypeSyntaxError(format!("unbalanced `{}` in `{}`", open, text)));
    }
    let head = text[..start].trim();
    let inner = &text[start + 1..text.len() - 1];
    Ok(Some((head, inner)))
}

/// Split `a, b` at the top-level comma.
fn split_pair(text: &str) -> Result<[&str; 2], TypeSyntaxError> {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ',' if depth == 0 => return Ok([&text[..i], &text[i + 1..]]),
            _ => {}
        }
    }
    Err(TypeSyntaxError(format!("expected two parameters in `{}`", text)))
}

fn parse_name(text: &str) -> Result<&str, TypeSyntaxError> {
    let text = text.trim();
    let mut chars = text.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(text)
    } else {
        Err(TypeSyntaxError(format!("`{}` is not a type name", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(text: &str) -> Type {
        Type::parse(text).unwrap()
    }

    fn chain(text: &str) -> Vec<String> {
        ty(text)
            .generalization_chain()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_scalar_chains() {
        assert_eq!(chain("bool"), ["bool", "int", "number", "any"]);
        assert_eq!(chain("float"), ["float", "number", "any"]);
        assert_eq!(chain("str"), ["str", "any"]);
        assert_eq!(chain("unknown"), ["unknown", "any"]);
        assert_eq!(chain("any"), ["any"]);
    }

    #[test]
    fn test_composite_chains() {
        assert_eq!(
            chain("list[int]"),
            ["list[int]", "list[number]", "list[any]", "list", "any"]
        );
        assert_eq!(
            chain("dict[str, int]"),
            [
                "dict[str, int]",
                "dict[str, number]",
                "dict[str, any]",
                "dict[any, any]",
                "dict",
                "any"
            ]
        );
        assert_eq!(chain("module[math]"), ["module[math]", "module", "any"]);
    }

    #[test]
    fn test_chains_strictly_shrink() {
        for text in [
            "bool",
            "list[list[bool]]",
            "dict[bool, list[float]]",
            "module[os.path]",
            "Point",
        ] {
            let chain = ty(text).generalization_chain();
            assert!(chain.last().unwrap().is_any(), "{} does not end at any", text);
            for pair in chain.windows(2) {
                assert!(
                    pair[0].specificity() > pair[1].specificity(),
                    "{} -> {} does not shrink",
                    pair[0],
                    pair[1]
                );
                assert_ne!(pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn test_parse_display_inverse() {
        for text in ["int", "list[str]", "dict[str, list[int]]", "module[math]"] {
            assert_eq!(ty(text).to_string(), text);
        }
        assert!(Type::parse("list[int").is_err());
        assert!(Type::parse("int[str]").is_err());
        assert!(Type::parse("9lives").is_err());
    }

    #[test]
    fn test_unify() {
        assert_eq!(Type::unify(&[ty("int"), ty("int")]), ty("int"));
        assert_eq!(Type::unify(&[ty("int"), ty("float")]), ty("number"));
        assert_eq!(Type::unify(&[ty("int"), ty("str")]), Type::any());
        assert_eq!(Type::unify(std::iter::empty()), Type::any());
    }

    #[test]
    fn test_type_expr_eval() {
        let lookup = |operand: Operand<'_>| match operand {
            Operand::Part("obj") => Some(ty("dict[str, list[int]]")),
            Operand::Arg(0) => Some(ty("float")),
            _ => None,
        };
        let eval = |text: &str| TypeExpr::parse(text).unwrap().eval(&lookup);

        assert_eq!(eval("int"), ty("int"));
        assert_eq!(eval("$0"), ty("float"));
        assert_eq!(eval("element($obj)"), ty("list[int]"));
        assert_eq!(eval("element(element($obj))"), ty("int"));
        assert_eq!(eval("list[key($obj)]"), ty("list[str]"));
        assert_eq!(eval("dict[$0, str]"), ty("dict[float, str]"));
        assert_eq!(eval("$missing"), Type::unknown());
        assert_eq!(eval("module[math]"), ty("module[math]"));
    }

    #[test]
    fn test_type_expr_errors() {
        assert!(TypeExpr::parse("elementt($obj)").is_err());
        assert!(TypeExpr::parse("$").is_err());
        assert!(TypeExpr::parse("dict[int]").is_err());
        assert!(TypeExpr::parse("list[$obj").is_err());
    }
}
