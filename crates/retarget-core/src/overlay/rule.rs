//! Overlay rules: raw (as merged from YAML) and validated.

use crate::error::ConfigError;
use crate::types::TypeExpr;
use serde::Deserialize;

/// A rule as written in an overlay document. Every field is optional so a
/// later document can override single fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawRule {
    /// Id of a catalog template.
    pub code: Option<String>,
    /// Inline template text.
    pub template: Option<String>,
    #[serde(rename = "type", alias = "rettype")]
    pub ty: Option<String>,
    pub alt_name: Option<String>,
    pub args: Option<Vec<String>>,
    pub side_effect: Option<String>,
}

impl RawRule {
    /// Field-level merge: fields set in `other` win.
    pub fn merge(&mut self, other: RawRule) {
        if other.template.is_some() {
            // an inline template replaces a template reference and vice versa
            self.code = None;
        }
        if other.code.is_some() {
            self.template = None;
        }
        let RawRule {
            code,
            template,
            ty,
            alt_name,
            args,
            side_effect,
        } = other;
        self.code = code.or(self.code.take());
        self.template = template.or(self.template.take());
        self.ty = ty.or(self.ty.take());
        self.alt_name = alt_name.or(self.alt_name.take());
        self.args = args.or(self.args.take());
        self.side_effect = side_effect.or(self.side_effect.take());
    }
}

/// Named operations a rule may run when it matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// Mark a target built-in (import, helper) as needed.
    Use(String),
    /// Allocate a temp variable from this base name, bound to the part `temp`.
    Temp(String),
}

impl SideEffect {
    /// Parse `use(math); temp(tmp)`.
    pub fn parse_list(key: &str, text: &str) -> Result<Vec<SideEffect>, ConfigError> {
        text.split(';')
            .map(str::trim)
            .filter(|action| !action.is_empty())
            .map(|action| {
                let invalid = || ConfigError::SideEffect {
                    key: key.to_string(),
                    action: action.to_string(),
                };
                let (name, rest) = action.split_once('(').ok_or_else(invalid)?;
                let argument = rest.strip_suffix(')').ok_or_else(invalid)?.trim();
                let argument = argument.trim_matches(|c| c == '"' || c == '\'');
                let valid_argument = !argument.is_empty()
                    && argument
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                if !valid_argument {
                    return Err(invalid());
                }
                match name.trim() {
                    "use" => Ok(SideEffect::Use(argument.to_string())),
                    "temp" => Ok(SideEffect::Temp(argument.to_string())),
                    _ => Err(invalid()),
                }
            })
            .collect()
    }
}

/// A validated rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Template id; `None` means the construct's default template.
    pub template: Option<String>,
    /// Result type; `None` keeps the construct's default type.
    pub ty: Option<TypeExpr>,
    pub alt_name: Option<String>,
    /// Part names bound to positional arguments, in order.
    pub args: Vec<String>,
    pub side_effects: Vec<SideEffect>,
}
