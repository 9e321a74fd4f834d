//! Merging overlay documents and validating the result.

use super::rule::{RawRule, Rule, SideEffect};
use super::{BUILTIN, COMMON, Overlay};
use crate::error::ConfigError;
use crate::render::Template;
use crate::types::TypeExpr;
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};

const TEMPLATES: &str = "templates";
const OPERATORS: &str = "operators";
const TYPES: &str = "types";

/// Accumulates overlay documents; `build` validates and compiles them.
#[derive(Debug, Clone)]
pub struct OverlayBuilder {
    target: String,
    templates: BTreeMap<String, String>,
    operators: BTreeMap<String, String>,
    types: BTreeMap<String, String>,
    rules: BTreeMap<String, RawRule>,
}

impl OverlayBuilder {
    /// Empty builder.
    pub fn new(target: impl Into<String>) -> Self {
        OverlayBuilder {
            target: target.into(),
            templates: BTreeMap::new(),
            operators: BTreeMap::new(),
            types: BTreeMap::new(),
            rules: BTreeMap::new(),
        }
    }

    /// Builder pre-loaded with the built-in documents for `target`.
    pub fn for_target(target: &str) -> Result<Self, ConfigError> {
        let (_, document) = BUILTIN
            .iter()
            .find(|(name, _)| *name == target)
            .ok_or_else(|| ConfigError::UnknownTarget {
                name: target.to_string(),
                available: Overlay::targets().collect::<Vec<_>>().join(", "),
            })?;
        OverlayBuilder::new(target)
            .merge_str(COMMON)?
            .merge_str(document)
    }

    /// Merge one YAML document over what is already loaded.
    pub fn merge_str(self, yaml: &str) -> Result<Self, ConfigError> {
        let document: Value = serde_yaml::from_str(yaml)?;
        self.merge_value(document)
    }

    pub fn merge_value(mut self, document: Value) -> Result<Self, ConfigError> {
        let entries = match document {
            Value::Mapping(entries) => entries,
            // an empty file
            Value::Null => return Ok(self),
            _ => return Err(ConfigError::NotAMapping),
        };

        for (key, value) in entries {
            let key = key_string(&key)?;
            match key.as_str() {
                TEMPLATES => merge_table(&mut self.templates, TEMPLATES, value)?,
                OPERATORS => merge_table(&mut self.operators, OPERATORS, value)?,
                TYPES => merge_table(&mut self.types, TYPES, value)?,
                _ => self.merge_rule(key.clone(), value)?,
            }
        }
        Ok(self)
    }

    fn merge_rule(&mut self, key: String, value: Value) -> Result<(), ConfigError> {
        let rule = match value {
            Value::Null => {
                self.rules.remove(&key);
                return Ok(());
            }
            Value::String(template) => RawRule {
                template: Some(template),
                ..Default::default()
            },
            Value::Mapping(_) => {
                serde_yaml::from_value(value).map_err(|err| ConfigError::Rule {
                    key: key.clone(),
                    reason: err.to_string(),
                })?
            }
            _ => {
                return Err(ConfigError::Rule {
                    key,
                    reason: "expected a template string, a mapping or null".into(),
                });
            }
        };
        self.rules.entry(key).or_default().merge(rule);
        Ok(())
    }

    /// Validate every entry and compile templates.
    pub fn build(self) -> Result<Overlay, ConfigError> {
        let mut templates = HashMap::new();
        for (id, source) in &self.templates {
            templates.insert(id.clone(), compile(id, source)?);
        }

        let mut rules = HashMap::new();
        for (key, raw) in self.rules {
            let template = match (&raw.template, &raw.code) {
                (Some(source), _) => {
                    // inline templates live next to the catalog under `@key`
                    let id = format!("@{}", key);
                    templates.insert(id.clone(), compile(&id, source)?);
                    Some(id)
                }
                (None, Some(code)) if !self.templates.contains_key(code) => {
                    return Err(ConfigError::UnknownTemplate {
                        key,
                        template: code.clone(),
                    });
                }
                (None, code) => code.clone(),
            };

            let ty = raw
                .ty
                .as_deref()
                .map(|expr| {
                    TypeExpr::parse(expr).map_err(|err| ConfigError::TypeExpr {
                        key: key.clone(),
                        expr: expr.to_string(),
                        reason: err.to_string(),
                    })
                })
                .transpose()?;

            let side_effects = match &raw.side_effect {
                Some(text) => SideEffect::parse_list(&key, text)?,
                None => Vec::new(),
            };

            rules.insert(
                key,
                Rule {
                    template,
                    ty,
                    alt_name: raw.alt_name,
                    args: raw.args.unwrap_or_default(),
                    side_effects,
                },
            );
        }

        tracing::debug!(
            target_language = %self.target,
            templates = templates.len(),
            rules = rules.len(),
            "overlay built"
        );

        Ok(Overlay {
            target: self.target,
            templates,
            operators: self.operators.into_iter().collect(),
            types: self.types.into_iter().collect(),
            rules,
        })
    }
}

fn compile(id: &str, source: &str) -> Result<Template, ConfigError> {
    Template::parse(source).map_err(|err| ConfigError::Template {
        id: id.to_string(),
        reason: err.to_string(),
    })
}

fn key_string(key: &Value) -> Result<String, ConfigError> {
    match key {
        Value::String(key) => Ok(key.clone()),
        // `1.+.1`-style keys never parse as numbers, but plain numbers might
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        _ => Err(ConfigError::Rule {
            key: format!("{:?}", key),
            reason: "keys must be strings".into(),
        }),
    }
}

/// Merge a `name -> text` table; null values remove entries.
fn merge_table(
    table: &mut BTreeMap<String, String>,
    section: &str,
    value: Value,
) -> Result<(), ConfigError> {
    let entries = match value {
        Value::Mapping(entries) => entries,
        Value::Null => return Ok(()),
        _ => {
            return Err(ConfigError::Rule {
                key: section.to_string(),
                reason: "expected a mapping".into(),
            });
        }
    };
    for (key, value) in entries {
        let key = key_string(&key)?;
        match value {
            Value::Null => {
                table.remove(&key);
            }
            Value::String(text) => {
                table.insert(key, text);
            }
            _ => {
                return Err(ConfigError::Rule {
                    key: format!("{}.{}", section, key),
                    reason: "expected a string or null".into(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(yaml: &str) -> Result<Overlay, ConfigError> {
        OverlayBuilder::new("test").merge_str(yaml)?.build()
    }

    #[test]
    fn test_rule_shapes() {
        let overlay = build(
            r#"
templates:
  call: "{{func}}({{args}})"
print: {code: call, alt_name: console.log, rettype: none}
len: "{{obj}}.length"
"#,
        )
        .unwrap();

        let print = overlay.rule("print").unwrap();
        assert_eq!(print.template.as_deref(), Some("call"));
        assert_eq!(print.alt_name.as_deref(), Some("console.log"));
        assert!(print.ty.is_some());

        let len = overlay.rule("len").unwrap();
        assert_eq!(len.template.as_deref(), Some("@len"));
        assert!(overlay.has_template("@len"));
    }

    #[test]
    fn test_later_documents_merge_fields() {
        let overlay = OverlayBuilder::new("test")
            .merge_str("len: {type: int}\nabs: {type: $0}")
            .unwrap()
            .merge_str("len: {alt_name: size}\nabs: null")
            .unwrap()
            .build()
            .unwrap();

        let len = overlay.rule("len").unwrap();
        assert_eq!(len.alt_name.as_deref(), Some("size"));
        assert!(len.ty.is_some());
        assert!(overlay.rule("abs").is_none());
    }

    #[test]
    fn test_template_tombstone() {
        let overlay = OverlayBuilder::new("test")
            .merge_str("templates: {a: x, b: y}")
            .unwrap()
            .merge_str("templates: {a: null}")
            .unwrap()
            .build()
            .unwrap();
        assert!(!overlay.has_template("a"));
        assert!(overlay.has_template("b"));
    }

    #[test]
    fn test_validation_names_key() {
        let cases = [
            ("len: {type: \"element(\"}", "`len`"),
            ("len: {side_effect: \"eval(x)\"}", "`len`"),
            ("len: {code: nowhere}", "`len`"),
            ("len: {cod: call}", "`len`"),
            ("len: 3", "`len`"),
            ("templates: {call: \"{{#if x}}\"}", "`call`"),
        ];
        for (yaml, needle) in cases {
            let err = build(yaml).unwrap_err();
            assert!(err.to_string().contains(needle), "{}: {}", yaml, err);
        }
    }

    #[test]
    fn test_not_a_mapping() {
        assert!(matches!(build("- a\n- b"), Err(ConfigError::NotAMapping)));
        assert!(matches!(build("a: [b"), Err(ConfigError::Yaml(_))));
    }
}
