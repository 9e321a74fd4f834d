//! Tree visitor and the built-in node handlers.

pub mod expr;
mod resolve;
pub mod stmt;

use crate::dispatch::DispatchRegistry;
use crate::node::CodeNode;
use crate::overlay::Overlay;
use crate::state::RunState;
use crate::types::Type;
use retarget_syntax::Node;

/// Context threaded through every handler of one generation pass.
pub struct Visitor<'a> {
    overlay: &'a Overlay,
    registry: &'a DispatchRegistry,
    state: &'a mut RunState,
    /// Type assigned by the enclosing store (assignment, loop target).
    store_type: Option<Type>,
    /// Nesting of `if`/`while`/`for` bodies inside the current scope.
    depth: usize,
    /// Names first stored inside a nested block of the current top-level
    /// statement; declared just ahead of it.
    hoisted: Vec<String>,
}

impl<'a> Visitor<'a> {
    pub fn new(
        overlay: &'a Overlay,
        registry: &'a DispatchRegistry,
        state: &'a mut RunState,
    ) -> Self {
        Visitor {
            overlay,
            registry,
            state,
            store_type: None,
            depth: 0,
            hoisted: Vec::new(),
        }
    }

    pub fn overlay(&self) -> &'a Overlay {
        self.overlay
    }

    pub fn state(&self) -> &RunState {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut RunState {
        &mut *self.state
    }

    pub fn visit(&mut self, node: &Node) -> CodeNode {
        let registry = self.registry;
        registry.dispatch(self, node)
    }

    /// Visit an assignment target, declaring or updating what it names.
    pub fn visit_store(&mut self, target: &Node, ty: Type) -> CodeNode {
        let previous = self.store_type.replace(ty);
        let code = self.visit(target);
        self.store_type = previous;
        code
    }

    /// Visit the body of a nested `if`/`while`/`for` block, dropping
    /// placeholders.
    pub fn visit_block(&mut self, body: &[Node]) -> Vec<CodeNode> {
        self.depth += 1;
        let codes = body
            .iter()
            .map(|node| self.visit(node))
            .filter(|code| !code.is_empty())
            .collect();
        self.depth -= 1;
        codes
    }

    /// Visit the body of a program, function or class.
    ///
    /// A name first stored inside a nested block would be block-scoped in
    /// targets with `local`/`let`, so it is declared by a `declare` node
    /// placed before the top-level statement that contains the block.
    pub fn visit_scope(&mut self, body: &[Node]) -> Vec<CodeNode> {
        let depth = std::mem::replace(&mut self.depth, 0);
        let outer = std::mem::take(&mut self.hoisted);

        let mut codes = Vec::with_capacity(body.len());
        for node in body {
            let code = self.visit(node);
            if !self.hoisted.is_empty() {
                let names = std::mem::take(&mut self.hoisted);
                codes.push(
                    CodeNode::new(node.kind(), "declare", Type::named("none"), node.line)
                        .with("names", names.join(", ")),
                );
            }
            if !code.is_empty() {
                codes.push(code);
            }
        }

        self.depth = depth;
        self.hoisted = outer;
        codes
    }

    /// Queue `name` for declaration ahead of the enclosing top-level
    /// statement. `false` at scope level, or when the target declares
    /// nothing (no `declare` template).
    pub(crate) fn hoist(&mut self, name: &str) -> bool {
        if self.depth == 0 || !self.overlay.has_template("declare") {
            return false;
        }
        self.hoisted.push(name.to_string());
        true
    }

    fn take_store_type(&mut self) -> Type {
        self.store_type.take().unwrap_or_default()
    }
}

/// Code node for `node` with the given template and type.
fn code(node: &Node, template: &str, ty: Type) -> CodeNode {
    CodeNode::new(node.kind(), template, ty, node.line)
}
