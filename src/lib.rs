//! Tycho — static semantic analysis for a Go-flavoured language
//!
//! Tycho is the expression type-checking and constant-evaluation engine of an
//! interpreter/checker: given an already-parsed expression tree and a lexical
//! environment it assigns a type (or tuple of types) to every expression,
//! validates every operation against the language's static semantics, folds
//! constants with exact arbitrary-precision arithmetic, and reports structured
//! diagnostics whose wording and ordering track the reference compiler closely
//! enough to serve as a conformance oracle.

pub mod checker;
pub mod constant;
pub mod diagnostics;
pub mod env;
pub mod syntax;
pub mod types;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::checker::{check_expr, Checked, CheckedKind, Checker, Ctx};
    pub use crate::diagnostics::{Diagnostic, DiagnosticBag, DiagnosticKind, Severity, Span};
    pub use crate::env::{Binding, Env};
    pub use crate::syntax::ast::*;
    pub use crate::types::{ConstKind, ExprType, Type};
}
