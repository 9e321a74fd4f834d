//! Renderer adapter: turns template ids plus values into text.

mod template;

pub use template::{Template, TemplateError};

use crate::error::RenderError;
use crate::types::Type;
use std::collections::BTreeMap;

/// Named values visible to one template instantiation.
pub type Values = BTreeMap<String, Value>;

/// A value a template can print, test or descend into.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Bool(bool),
    List(Vec<Value>),
    /// A rendered child: its text plus the fields it was rendered from.
    Node { text: String, fields: Values },
}

impl Default for Value {
    fn default() -> Self {
        Value::Text(String::new())
    }
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Text(text) | Value::Node { text, .. } => !text.is_empty(),
            Value::Bool(flag) => *flag,
            Value::List(items) => !items.is_empty(),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Value::Text(text) | Value::Node { text, .. } => text.clone(),
            Value::Bool(flag) => flag.to_string(),
            Value::List(_) => self.join(", "),
        }
    }

    /// List items joined by `separator`, skipping items that render empty.
    pub fn join(&self, separator: &str) -> String {
        match self {
            Value::List(items) => items
                .iter()
                .map(Value::to_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(separator),
            other => other.to_text(),
        }
    }
}

/// Produces target text for a template id.
///
/// The engine only ever talks to this trait; the overlay implements it.
pub trait Renderer {
    /// Instantiate `template` with `values`.
    fn render(&self, template: &str, values: &Values) -> Result<String, RenderError>;

    /// Target spelling of a type (for `$type` fields).
    fn type_name(&self, ty: &Type) -> String;
}
