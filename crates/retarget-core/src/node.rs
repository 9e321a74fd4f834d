//! Code nodes: the result of visiting one tree node.

use crate::error::RenderError;
use crate::render::{Renderer, Value, Values};
use crate::scope::{SymbolRef, SymbolTable};
use crate::types::Type;
use retarget_syntax::{Access, NodeKind};
use std::collections::BTreeMap;

/// One renderable fragment.
///
/// A node without a template is the placeholder for a construct that was
/// dropped; it renders to nothing and is skipped in blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeNode {
    pub kind: Option<NodeKind>,
    pub template: Option<String>,
    pub parts: BTreeMap<String, Part>,
    pub ty: Type,
    pub access: Option<Access>,
    pub owner: Option<SymbolRef>,
    pub line: u32,
}

/// A named child of a code node.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Node(CodeNode),
    List(Vec<CodeNode>),
    Text(String),
    Bool(bool),
}

impl From<CodeNode> for Part {
    fn from(node: CodeNode) -> Self {
        Part::Node(node)
    }
}

impl From<Vec<CodeNode>> for Part {
    fn from(nodes: Vec<CodeNode>) -> Self {
        Part::List(nodes)
    }
}

impl From<String> for Part {
    fn from(text: String) -> Self {
        Part::Text(text)
    }
}

impl From<&str> for Part {
    fn from(text: &str) -> Self {
        Part::Text(text.to_string())
    }
}

impl From<bool> for Part {
    fn from(flag: bool) -> Self {
        Part::Bool(flag)
    }
}

impl CodeNode {
    pub fn new(kind: NodeKind, template: impl Into<String>, ty: Type, line: u32) -> Self {
        CodeNode {
            kind: Some(kind),
            template: Some(template.into()),
            ty,
            line,
            ..Default::default()
        }
    }

    /// Placeholder for a dropped construct.
    pub fn empty() -> Self {
        CodeNode::default()
    }

    pub fn is_empty(&self) -> bool {
        self.template.is_none()
    }

    pub fn with(mut self, name: &str, part: impl Into<Part>) -> Self {
        self.parts.insert(name.to_string(), part.into());
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    pub fn with_owner(mut self, owner: SymbolRef) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.get(name)
    }

    /// A `Node` part, if present.
    pub fn child(&self, name: &str) -> Option<&CodeNode> {
        match self.parts.get(name) {
            Some(Part::Node(node)) => Some(node),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.parts.get(name), Some(Part::Bool(true)))
    }

    /// Render to target text. Placeholders render to an empty string.
    pub fn render(&self, renderer: &dyn Renderer, symbols: &SymbolTable) -> Result<String, RenderError> {
        match self.render_value(renderer, symbols)? {
            Value::Node { text, .. } => Ok(text),
            _ => Ok(String::new()),
        }
    }

    /// Render children first, then this node's template over their values.
    pub fn render_value(
        &self,
        renderer: &dyn Renderer,
        symbols: &SymbolTable,
    ) -> Result<Value, RenderError> {
        let Some(template) = &self.template else {
            return Ok(Value::Node {
                text: String::new(),
                fields: Values::new(),
            });
        };

        let mut fields = Values::new();
        for (name, part) in &self.parts {
            let value = match part {
                Part::Node(node) => node.render_value(renderer, symbols)?,
                Part::List(nodes) => Value::List(
                    nodes
                        .iter()
                        .filter(|node| !node.is_empty())
                        .map(|node| node.render_value(renderer, symbols))
                        .collect::<Result<_, _>>()?,
                ),
                Part::Text(text) => Value::Text(text.clone()),
                Part::Bool(flag) => Value::Bool(*flag),
            };
            fields.insert(name.clone(), value);
        }

        fields.insert("$type".into(), Value::Text(renderer.type_name(&self.ty)));
        let mutable = self.owner.as_ref().is_some_and(|owner| symbols.is_mutable(owner));
        fields.insert("$mutable".into(), Value::Bool(mutable));
        fields.insert("$line".into(), Value::Text(self.line.to_string()));

        let text = renderer
            .render(template, &fields)
            .map_err(|err| match err {
                RenderError::UnknownTemplate(template) => RenderError::MissingTemplate {
                    kind: self
                        .kind
                        .map_or_else(|| "unknown".to_string(), |kind| kind.to_string()),
                    template,
                    line: self.line,
                },
                other => other,
            })?;

        Ok(Value::Node { text, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::NamespacePath;

    /// Renders `template(field=value, ...)` so tests can see the tree shape.
    struct Echo;

    impl Renderer for Echo {
        fn render(&self, template: &str, values: &Values) -> Result<String, RenderError> {
            if template == "missing" {
                return Err(RenderError::UnknownTemplate(template.into()));
            }
            let fields: Vec<String> = values
                .iter()
                .filter(|(name, _)| !name.starts_with('$'))
                .map(|(name, value)| format!("{}={}", name, value.to_text()))
                .collect();
            Ok(format!("{}({})", template, fields.join(" ")))
        }

        fn type_name(&self, ty: &Type) -> String {
            ty.to_string()
        }
    }

    #[test]
    fn test_children_render_first() {
        let leaf = CodeNode::new(NodeKind::Constant, "int", Type::named("int"), 1).with("value", "1");
        let node = CodeNode::new(NodeKind::List, "list", Type::unknown(), 1)
            .with("elts", vec![leaf.clone(), CodeNode::empty(), leaf]);
        let text = node.render(&Echo, &SymbolTable::new()).unwrap();
        assert_eq!(text, "list(elts=int(value=1), int(value=1))");
    }

    #[test]
    fn test_placeholder_renders_nothing() {
        assert!(CodeNode::empty().is_empty());
        assert_eq!(CodeNode::empty().render(&Echo, &SymbolTable::new()).unwrap(), "");
    }

    #[test]
    fn test_computed_fields() {
        let mut symbols = SymbolTable::new();
        let root = NamespacePath::root();
        let (x, _) = symbols.declare_or_update(&root, "x", Type::named("int"));
        symbols.declare_or_update(&root, "x", Type::named("int"));

        let node = CodeNode::new(NodeKind::Name, "name", Type::named("int"), 7).with_owner(x);
        let Value::Node { fields, .. } = node.render_value(&Echo, &symbols).unwrap() else {
            panic!("expected node value");
        };
        assert_eq!(fields["$mutable"], Value::Bool(true));
        assert_eq!(fields["$type"], Value::Text("int".into()));
        assert_eq!(fields["$line"], Value::Text("7".into()));
    }

    #[test]
    fn test_missing_template_names_node() {
        let node = CodeNode::new(NodeKind::Continue, "missing", Type::unknown(), 4);
        let err = node.render(&Echo, &SymbolTable::new()).unwrap_err();
        assert!(matches!(
            err,
            RenderError::MissingTemplate { ref kind, ref template, line: 4 }
                if kind == "Continue" && template == "missing"
        ));
    }
}
