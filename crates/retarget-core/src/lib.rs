//! Translation engine for retarget.
//!
//! Walks a [`retarget_syntax::Program`] and produces source text in a target
//! language. Nothing about the target's grammar lives in this crate: every
//! spelling comes from an [`Overlay`], a catalog of templates and rules loaded
//! from YAML.
//!
//! # Architecture
//!
//! ```text
//! Program ──> Visitor ──> CodeNode tree ──> Overlay (Renderer) ──> text
//!               │  ▲
//!   Dispatch ───┘  └── types, scopes, rules
//! ```
//!
//! Each tree node is dispatched by kind to a handler. Handlers consult the
//! [`SymbolTable`] for locals and the overlay for operator, attribute and
//! function rules; rule lookup walks the operand types' generalization chains
//! (`bool -> int -> number -> any`) so one rule can serve many types.
//!
//! # Example
//!
//! ```ignore
//! use retarget_core::{Mode, Overlay, Transpiler};
//!
//! let mut transpiler = Transpiler::new(Overlay::builtin("javascript")?);
//! let js = transpiler.generate("print(1 + 2)", "python", Mode::Standalone)?;
//! assert_eq!(js, "console.log((1 + 2));");
//! ```

pub mod dispatch;
pub mod driver;
pub mod error;
pub mod node;
pub mod overlay;
pub mod render;
pub mod scope;
pub mod state;
pub mod types;
pub mod visit;

pub use dispatch::{DispatchRegistry, Handler, RegistryBuilder};
pub use driver::{Mode, Transpiler};
pub use error::{ConfigError, GenerateError, RenderError};
pub use node::{CodeNode, Part};
pub use overlay::{Overlay, OverlayBuilder, Rule, SideEffect};
pub use render::{Renderer, Template, Value, Values};
pub use scope::{NamespacePath, ScopeKind, Symbol, SymbolRef, SymbolTable};
pub use state::RunState;
pub use types::{Type, TypeExpr};
pub use visit::Visitor;
