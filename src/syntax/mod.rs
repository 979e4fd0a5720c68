//! Syntax tree definitions
//!
//! The checker consumes already-parsed expression trees; this module defines
//! the node types and their canonical source rendering. Rendering is used as
//! the fallback for diagnostic snippets when the original source text is not
//! available.

pub mod ast;

pub use ast::{BinaryOp, Expr, LitKind, NodeId, TypeExpr, UnaryOp};
