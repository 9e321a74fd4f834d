//! Normalized syntax trees for retarget.
//!
//! `retarget-syntax` turns source text into a [`Program`]: a tree of
//! [`Node`]s tagged with a [`NodeKind`] and carrying named child fields.
//! The translation engine in `retarget-core` only ever sees this tree.
//!
//! # Architecture
//!
//! ```text
//! Source dialects          Tree
//! ───────────────     ─────────────
//! python (tree-sitter) ─┐
//!                       ├─> Program
//! json (serialized)    ─┘    (ir/)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use retarget_syntax::reader_for_dialect;
//!
//! let reader = reader_for_dialect("python").unwrap();
//! let program = reader.read("x = 1 + 2")?;
//! ```

pub mod input;
pub mod ir;
pub mod registry;
pub mod traits;

// Re-exports: tree types
pub use ir::{Access, Literal, Node, NodeData, NodeKind, Operator, Program, StructureEq};

// Re-exports: Traits
pub use traits::{ReadError, Reader};

// Re-exports: Registry
pub use registry::{reader_for_dialect, reader_for_extension, readers};

// Re-exports: Built-in readers
pub use input::read_json;
#[cfg(feature = "read-python")]
pub use input::read_python;
