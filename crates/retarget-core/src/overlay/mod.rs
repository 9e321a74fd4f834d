//! Overlay catalogs: per-target templates, operator spellings, type names and
//! rules.
//!
//! An overlay is built once from YAML documents (built-in defaults first,
//! user documents after) and is read-only while generating.
//!
//! ```yaml
//! templates:
//!   call: "{{func}}({{args}})"
//! operators:
//!   and: "&&"
//! types:
//!   str: string
//! print: {code: call, alt_name: console.log}
//! len: "{{obj}}.length"
//! str.upper: {alt_name: toUpperCase, type: str}
//! any.in.list: {template: "{{right}}.includes({{left}})", type: bool}
//! input: null
//! ```

mod builder;
mod rule;

pub use builder::OverlayBuilder;
pub use rule::{Rule, SideEffect};

use crate::error::{ConfigError, RenderError};
use crate::render::{Renderer, Template, Values};
use crate::types::Type;
use retarget_syntax::Operator;
use std::collections::HashMap;

/// Shared result-type rules, merged under every built-in target.
pub(crate) const COMMON: &str = include_str!("../../overlays/common.yaml");

/// Built-in targets and their documents.
pub(crate) const BUILTIN: &[(&str, &str)] = &[
    ("python", include_str!("../../overlays/python.yaml")),
    ("javascript", include_str!("../../overlays/javascript.yaml")),
    ("lua", include_str!("../../overlays/lua.yaml")),
];

/// The merged, validated catalog for one target language.
#[derive(Debug, Clone)]
pub struct Overlay {
    target: String,
    templates: HashMap<String, Template>,
    operators: HashMap<String, String>,
    types: HashMap<String, String>,
    rules: HashMap<String, Rule>,
}

impl Overlay {
    /// Built-in overlay for `target`.
    pub fn builtin(target: &str) -> Result<Overlay, ConfigError> {
        OverlayBuilder::for_target(target)?.build()
    }

    /// Names of the built-in targets.
    pub fn targets() -> impl Iterator<Item = &'static str> {
        BUILTIN.iter().map(|(name, _)| *name)
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn rule(&self, key: &str) -> Option<&Rule> {
        self.rules.get(key)
    }

    pub fn has_template(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Target spelling of an operator; defaults to its source symbol.
    pub fn operator(&self, op: Operator) -> &str {
        self.operators
            .get(op.symbol())
            .map_or(op.symbol(), String::as_str)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Renderer for Overlay {
    fn render(&self, template: &str, values: &Values) -> Result<String, RenderError> {
        let compiled = self
            .templates
            .get(template)
            .ok_or_else(|| RenderError::UnknownTemplate(template.to_string()))?;
        let text = compiled.render(values);
        Ok(text.trim_end_matches('\n').to_string())
    }

    fn type_name(&self, ty: &Type) -> String {
        let key = ty.to_string();
        self.types.get(&key).cloned().unwrap_or(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Value;

    #[test]
    fn test_builtins_load() {
        for target in Overlay::targets() {
            let overlay = Overlay::builtin(target).unwrap();
            assert_eq!(overlay.target(), target);
            assert!(overlay.has_template("program"), "{} lacks program", target);
        }
    }

    #[test]
    fn test_unknown_target() {
        let err = Overlay::builtin("cobol").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTarget { .. }));
        assert!(err.to_string().contains("javascript"));
    }

    #[test]
    fn test_operator_spelling() {
        let js = Overlay::builtin("javascript").unwrap();
        assert_eq!(js.operator(Operator::And), "&&");
        assert_eq!(js.operator(Operator::Add), "+");
        let lua = Overlay::builtin("lua").unwrap();
        assert_eq!(lua.operator(Operator::NotEq), "~=");
    }

    #[test]
    fn test_type_names() {
        let js = Overlay::builtin("javascript").unwrap();
        assert_eq!(js.type_name(&Type::named("str")), "string");
        assert_eq!(js.type_name(&Type::named("Point")), "Point");
    }

    #[test]
    fn test_render_trims_trailing_newlines() {
        let overlay = OverlayBuilder::new("test")
            .merge_str("templates:\n  line: \"{{x}}\\n\\n\"\n")
            .unwrap()
            .build()
            .unwrap();
        let values: Values = [("x".to_string(), Value::Text("a".into()))].into();
        assert_eq!(overlay.render("line", &values).unwrap(), "a");
        assert!(matches!(
            overlay.render("nope", &values),
            Err(RenderError::UnknownTemplate(_))
        ));
    }
}
