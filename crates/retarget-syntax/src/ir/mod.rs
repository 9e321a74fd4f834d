//! Normalized syntax tree.
//!
//! Every front end lowers its surface syntax into this tree. Nodes carry a
//! `kind` tag and named child fields; the engine never looks at surface
//! syntax directly.
//!
//! The serialized form (JSON) is the `json` dialect:
//!
//! ```json
//! {"body": [{"kind": "Expr", "line": 1, "value":
//!     {"kind": "BinOp", "op": "+",
//!      "left": {"kind": "Constant", "value": 1},
//!      "right": {"kind": "Constant", "value": 2}}}]}
//! ```

mod structure_eq;

pub use structure_eq::StructureEq;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A whole source file: the ordered top-level statements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub body: Vec<Node>,
}

impl Program {
    pub fn new(body: Vec<Node>) -> Self {
        Self { body }
    }
}

/// One tree node: its source line and its kind-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub line: u32,
    #[serde(flatten)]
    pub data: NodeData,
}

/// Load or store access of a name, attribute or subscript.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    #[default]
    Load,
    Store,
}

/// Constant values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Node payloads, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NodeData {
    // Statements
    Expr {
        value: Box<Node>,
    },
    Assign {
        target: Box<Node>,
        value: Box<Node>,
    },
    AugAssign {
        target: Box<Node>,
        op: Operator,
        value: Box<Node>,
    },
    If {
        test: Box<Node>,
        body: Vec<Node>,
        #[serde(default)]
        orelse: Vec<Node>,
    },
    While {
        test: Box<Node>,
        body: Vec<Node>,
    },
    For {
        target: Box<Node>,
        iter: Box<Node>,
        body: Vec<Node>,
    },
    FunctionDef {
        name: String,
        args: Vec<String>,
        body: Vec<Node>,
    },
    ClassDef {
        name: String,
        body: Vec<Node>,
    },
    Return {
        #[serde(default)]
        value: Option<Box<Node>>,
    },
    Pass,
    Break,
    Continue,
    Import {
        names: Vec<String>,
    },

    // Expressions
    BinOp {
        left: Box<Node>,
        op: Operator,
        right: Box<Node>,
    },
    UnaryOp {
        op: Operator,
        operand: Box<Node>,
    },
    BoolOp {
        op: Operator,
        values: Vec<Node>,
    },
    Compare {
        left: Box<Node>,
        ops: Vec<Operator>,
        comparators: Vec<Node>,
    },
    Call {
        func: Box<Node>,
        #[serde(default)]
        args: Vec<Node>,
    },
    Attribute {
        value: Box<Node>,
        attr: String,
        #[serde(default)]
        ctx: Access,
    },
    Subscript {
        value: Box<Node>,
        slice: Box<Node>,
        #[serde(default)]
        ctx: Access,
    },
    Slice {
        #[serde(default)]
        lower: Option<Box<Node>>,
        #[serde(default)]
        upper: Option<Box<Node>>,
        #[serde(default)]
        step: Option<Box<Node>>,
    },
    Name {
        id: String,
        #[serde(default)]
        ctx: Access,
    },
    Constant {
        value: Literal,
    },
    List {
        elts: Vec<Node>,
    },
    Tuple {
        elts: Vec<Node>,
    },
    Dict {
        keys: Vec<Node>,
        values: Vec<Node>,
    },
    IfExp {
        test: Box<Node>,
        body: Box<Node>,
        orelse: Box<Node>,
    },
    Lambda {
        args: Vec<String>,
        body: Box<Node>,
    },

    /// Surface construct the front end could not normalize.
    Unsupported {
        syntax: String,
    },
}

/// Discriminant of [`NodeData`], used as the dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Expr,
    Assign,
    AugAssign,
    If,
    While,
    For,
    FunctionDef,
    ClassDef,
    Return,
    Pass,
    Break,
    Continue,
    Import,
    BinOp,
    UnaryOp,
    BoolOp,
    Compare,
    Call,
    Attribute,
    Subscript,
    Slice,
    Name,
    Constant,
    List,
    Tuple,
    Dict,
    IfExp,
    Lambda,
    Unsupported,
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Expr { .. } => NodeKind::Expr,
            NodeData::Assign { .. } => NodeKind::Assign,
            NodeData::AugAssign { .. } => NodeKind::AugAssign,
            NodeData::If { .. } => NodeKind::If,
            NodeData::While { .. } => NodeKind::While,
            NodeData::For { .. } => NodeKind::For,
            NodeData::FunctionDef { .. } => NodeKind::FunctionDef,
            NodeData::ClassDef { .. } => NodeKind::ClassDef,
            NodeData::Return { .. } => NodeKind::Return,
            NodeData::Pass => NodeKind::Pass,
            NodeData::Break => NodeKind::Break,
            NodeData::Continue => NodeKind::Continue,
            NodeData::Import { .. } => NodeKind::Import,
            NodeData::BinOp { .. } => NodeKind::BinOp,
            NodeData::UnaryOp { .. } => NodeKind::UnaryOp,
            NodeData::BoolOp { .. } => NodeKind::BoolOp,
            NodeData::Compare { .. } => NodeKind::Compare,
            NodeData::Call { .. } => NodeKind::Call,
            NodeData::Attribute { .. } => NodeKind::Attribute,
            NodeData::Subscript { .. } => NodeKind::Subscript,
            NodeData::Slice { .. } => NodeKind::Slice,
            NodeData::Name { .. } => NodeKind::Name,
            NodeData::Constant { .. } => NodeKind::Constant,
            NodeData::List { .. } => NodeKind::List,
            NodeData::Tuple { .. } => NodeKind::Tuple,
            NodeData::Dict { .. } => NodeKind::Dict,
            NodeData::IfExp { .. } => NodeKind::IfExp,
            NodeData::Lambda { .. } => NodeKind::Lambda,
            NodeData::Unsupported { .. } => NodeKind::Unsupported,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Source operators, serialized by their canonical symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mult,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "**")]
    Pow,
    #[serde(rename = "<<")]
    LShift,
    #[serde(rename = ">>")]
    RShift,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "//")]
    FloorDiv,
    #[serde(rename = "@")]
    MatMult,
    #[serde(rename = "~")]
    Invert,
    #[serde(rename = "not")]
    Not,
    #[serde(rename = "u+")]
    UAdd,
    #[serde(rename = "u-")]
    USub,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtE,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtE,
    #[serde(rename = "is")]
    Is,
    #[serde(rename = "is_not")]
    IsNot,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
    #[serde(rename = "and")]
    And,
    #[serde(rename = "or")]
    Or,
}

impl Operator {
    /// Symbol used in overlay keys (`int.+.int`) and `operators` tables.
    ///
    /// Unary plus and minus share the binary spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add | Operator::UAdd => "+",
            Operator::Sub | Operator::USub => "-",
            Operator::Mult => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Pow => "**",
            Operator::LShift => "<<",
            Operator::RShift => ">>",
            Operator::BitOr => "|",
            Operator::BitXor => "^",
            Operator::BitAnd => "&",
            Operator::FloorDiv => "//",
            Operator::MatMult => "@",
            Operator::Invert => "~",
            Operator::Not => "not",
            Operator::Eq => "==",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::LtE => "<=",
            Operator::Gt => ">",
            Operator::GtE => ">=",
            Operator::Is => "is",
            Operator::IsNot => "is_not",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::And => "and",
            Operator::Or => "or",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// Builders, mostly for tests and programmatic trees.
impl Node {
    pub fn new(data: NodeData) -> Self {
        Self { line: 0, data }
    }

    /// Set the source line.
    pub fn at(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn name(id: impl Into<String>) -> Self {
        Self::new(NodeData::Name {
            id: id.into(),
            ctx: Access::Load,
        })
    }

    pub fn store(id: impl Into<String>) -> Self {
        Self::new(NodeData::Name {
            id: id.into(),
            ctx: Access::Store,
        })
    }

    pub fn constant(value: Literal) -> Self {
        Self::new(NodeData::Constant { value })
    }

    pub fn int(value: i64) -> Self {
        Self::constant(Literal::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Self::constant(Literal::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::constant(Literal::Str(value.into()))
    }

    pub fn bool(value: bool) -> Self {
        Self::constant(Literal::Bool(value))
    }

    pub fn none() -> Self {
        Self::constant(Literal::None)
    }

    pub fn bin_op(left: Node, op: Operator, right: Node) -> Self {
        Self::new(NodeData::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    pub fn unary(op: Operator, operand: Node) -> Self {
        Self::new(NodeData::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn bool_op(op: Operator, values: Vec<Node>) -> Self {
        Self::new(NodeData::BoolOp { op, values })
    }

    pub fn compare(left: Node, ops: Vec<Operator>, comparators: Vec<Node>) -> Self {
        Self::new(NodeData::Compare {
            left: Box::new(left),
            ops,
            comparators,
        })
    }

    pub fn call(func: Node, args: Vec<Node>) -> Self {
        Self::new(NodeData::Call {
            func: Box::new(func),
            args,
        })
    }

    pub fn attribute(value: Node, attr: impl Into<String>) -> Self {
        Self::new(NodeData::Attribute {
            value: Box::new(value),
            attr: attr.into(),
            ctx: Access::Load,
        })
    }

    pub fn subscript(value: Node, slice: Node) -> Self {
        Self::new(NodeData::Subscript {
            value: Box::new(value),
            slice: Box::new(slice),
            ctx: Access::Load,
        })
    }

    pub fn list(elts: Vec<Node>) -> Self {
        Self::new(NodeData::List { elts })
    }

    pub fn expr(value: Node) -> Self {
        Self::new(NodeData::Expr {
            value: Box::new(value),
        })
    }

    pub fn assign(target: Node, value: Node) -> Self {
        Self::new(NodeData::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    pub fn if_stmt(test: Node, body: Vec<Node>, orelse: Vec<Node>) -> Self {
        Self::new(NodeData::If {
            test: Box::new(test),
            body,
            orelse,
        })
    }

    pub fn function(name: impl Into<String>, args: Vec<String>, body: Vec<Node>) -> Self {
        Self::new(NodeData::FunctionDef {
            name: name.into(),
            args,
            body,
        })
    }

    pub fn return_stmt(value: Option<Node>) -> Self {
        Self::new(NodeData::Return {
            value: value.map(Box::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let json = r#"{"body": [{"kind": "Expr", "line": 3, "value":
            {"kind": "BinOp", "op": "+",
             "left": {"kind": "Constant", "value": 1},
             "right": {"kind": "Name", "id": "x"}}}]}"#;
        let program: Program = serde_json::from_str(json).unwrap();
        assert_eq!(program.body.len(), 1);
        assert_eq!(program.body[0].line, 3);
        assert_eq!(
            program.body[0],
            Node::expr(Node::bin_op(Node::int(1), Operator::Add, Node::name("x"))).at(3)
        );
    }

    #[test]
    fn test_literal_variants() {
        let values: Vec<Literal> =
            serde_json::from_str(r#"[null, true, 7, 2.5, "hi"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Literal::None,
                Literal::Bool(true),
                Literal::Int(7),
                Literal::Float(2.5),
                Literal::Str("hi".into()),
            ]
        );
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(Operator::IsNot.symbol(), "is_not");
        assert_eq!(Operator::USub.symbol(), "-");
        let op: Operator = serde_json::from_str("\"//\"").unwrap();
        assert_eq!(op, Operator::FloorDiv);
    }

    #[test]
    fn test_kind_matches_tag() {
        let node = Node::call(Node::name("f"), vec![]);
        assert_eq!(node.kind(), NodeKind::Call);
        assert_eq!(node.kind().to_string(), "Call");
    }
}
