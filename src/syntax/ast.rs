//! Abstract Syntax Tree definitions for expressions
//!
//! All AST nodes include:
//! - Unique node ID
//! - Source span
//! - Node-specific data

use crate::diagnostics::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for AST nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Generate a new unique node ID
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind of basic literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LitKind {
    /// Integer literal (decimal, 0x, 0o/0 octal, 0b)
    Int,
    /// Floating-point literal
    Float,
    /// Imaginary literal (`3i`, `2.5i`)
    Imag,
    /// Rune literal (`'a'`, `'\n'`, `'é'`)
    Rune,
    /// String literal, including quotes
    String,
}

/// Expression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expr {
    /// Basic literal; `text` is the literal exactly as written
    BasicLit {
        id: NodeId,
        span: Span,
        kind: LitKind,
        text: String,
    },
    /// Identifier
    Ident {
        id: NodeId,
        span: Span,
        name: String,
    },
    /// Parenthesized expression
    Paren {
        id: NodeId,
        span: Span,
        inner: Box<Expr>,
    },
    /// Unary operation
    Unary {
        id: NodeId,
        span: Span,
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Binary operation
    Binary {
        id: NodeId,
        span: Span,
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Call or conversion; `ellipsis` marks `f(xs...)`
    Call {
        id: NodeId,
        span: Span,
        fun: Box<Expr>,
        args: Vec<Expr>,
        ellipsis: bool,
    },
    /// Composite literal; `ty` is absent for nested elided-type literals
    Composite {
        id: NodeId,
        span: Span,
        ty: Option<TypeExpr>,
        elts: Vec<Expr>,
    },
    /// `key: value` element inside a composite literal
    KeyValue {
        id: NodeId,
        span: Span,
        key: Box<Expr>,
        value: Box<Expr>,
    },
    /// Index operation `x[i]`
    Index {
        id: NodeId,
        span: Span,
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// Field or method selection `x.f`
    Selector {
        id: NodeId,
        span: Span,
        base: Box<Expr>,
        field: String,
    },
    /// Pointer indirection `*x` (also a pointer type when `x` is a type)
    Star {
        id: NodeId,
        span: Span,
        operand: Box<Expr>,
    },
    /// Type assertion `x.(T)`
    TypeAssert {
        id: NodeId,
        span: Span,
        base: Box<Expr>,
        ty: TypeExpr,
    },
    /// A type written in expression position (conversion target, builtin arg)
    TypeLit {
        id: NodeId,
        span: Span,
        ty: TypeExpr,
    },
}

impl Expr {
    /// Source span of this node
    pub fn span(&self) -> &Span {
        match self {
            Expr::BasicLit { span, .. }
            | Expr::Ident { span, .. }
            | Expr::Paren { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Call { span, .. }
            | Expr::Composite { span, .. }
            | Expr::KeyValue { span, .. }
            | Expr::Index { span, .. }
            | Expr::Selector { span, .. }
            | Expr::Star { span, .. }
            | Expr::TypeAssert { span, .. }
            | Expr::TypeLit { span, .. } => span,
        }
    }

    /// Node ID
    pub fn id(&self) -> NodeId {
        match self {
            Expr::BasicLit { id, .. }
            | Expr::Ident { id, .. }
            | Expr::Paren { id, .. }
            | Expr::Unary { id, .. }
            | Expr::Binary { id, .. }
            | Expr::Call { id, .. }
            | Expr::Composite { id, .. }
            | Expr::KeyValue { id, .. }
            | Expr::Index { id, .. }
            | Expr::Selector { id, .. }
            | Expr::Star { id, .. }
            | Expr::TypeAssert { id, .. }
            | Expr::TypeLit { id, .. } => *id,
        }
    }

    /// Peel parentheses down to the underlying expression
    pub fn strip_parens(&self) -> &Expr {
        let mut e = self;
        while let Expr::Paren { inner, .. } = e {
            e = inner;
        }
        e
    }
}

/// Type expression as written in source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TypeExpr {
    /// Named type (e.g., `int`, `MyStruct`)
    Named {
        id: NodeId,
        span: Span,
        name: String,
    },
    /// Slice type `[]T`
    Slice {
        id: NodeId,
        span: Span,
        elem: Box<TypeExpr>,
    },
    /// Array type `[N]T`; the length is an expression checked for constness
    Array {
        id: NodeId,
        span: Span,
        len: Box<Expr>,
        elem: Box<TypeExpr>,
    },
    /// Map type `map[K]V`
    Map {
        id: NodeId,
        span: Span,
        key: Box<TypeExpr>,
        elem: Box<TypeExpr>,
    },
    /// Pointer type `*T`
    Ptr {
        id: NodeId,
        span: Span,
        elem: Box<TypeExpr>,
    },
    /// Channel type `chan T`
    Chan {
        id: NodeId,
        span: Span,
        elem: Box<TypeExpr>,
    },
    /// Function type `func(params) results`
    Func {
        id: NodeId,
        span: Span,
        params: Vec<TypeExpr>,
        results: Vec<TypeExpr>,
        variadic: bool,
    },
}

impl TypeExpr {
    pub fn span(&self) -> &Span {
        match self {
            TypeExpr::Named { span, .. }
            | TypeExpr::Slice { span, .. }
            | TypeExpr::Array { span, .. }
            | TypeExpr::Map { span, .. }
            | TypeExpr::Ptr { span, .. }
            | TypeExpr::Chan { span, .. }
            | TypeExpr::Func { span, .. } => span,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `+x`
    Pos,
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `^x` (bitwise complement)
    BitNot,
    /// `&x`
    Addr,
    /// `<-x`
    Recv,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Pos => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "^",
            UnaryOp::Addr => "&",
            UnaryOp::Recv => "<-",
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,

    // Bitwise
    And,
    Or,
    Xor,
    AndNot,
    Shl,
    Shr,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    LAnd,
    LOr,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::AndNot => "&^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::LAnd => "&&",
            BinaryOp::LOr => "||",
        }
    }

    /// True for `==`, `!=`, `<`, `<=`, `>`, `>=`
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// True for `<<` and `>>`
    pub fn is_shift(&self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::BasicLit { text, .. } => write!(f, "{}", text),
            Expr::Ident { name, .. } => write!(f, "{}", name),
            Expr::Paren { inner, .. } => write!(f, "({})", inner),
            Expr::Unary { op, operand, .. } => write!(f, "{}{}", op.symbol(), operand),
            Expr::Binary { op, lhs, rhs, .. } => {
                write!(f, "{} {} {}", lhs, op.symbol(), rhs)
            }
            Expr::Call {
                fun,
                args,
                ellipsis,
                ..
            } => {
                write!(f, "{}(", fun)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                if *ellipsis {
                    write!(f, "...")?;
                }
                write!(f, ")")
            }
            Expr::Composite { ty, elts, .. } => {
                if let Some(ty) = ty {
                    write!(f, "{}", ty)?;
                }
                write!(f, "{{")?;
                for (i, elt) in elts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", elt)?;
                }
                write!(f, "}}")
            }
            Expr::KeyValue { key, value, .. } => write!(f, "{}: {}", key, value),
            Expr::Index { base, index, .. } => write!(f, "{}[{}]", base, index),
            Expr::Selector { base, field, .. } => write!(f, "{}.{}", base, field),
            Expr::Star { operand, .. } => write!(f, "*{}", operand),
            Expr::TypeAssert { base, ty, .. } => write!(f, "{}.({})", base, ty),
            Expr::TypeLit { ty, .. } => write!(f, "{}", ty),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named { name, .. } => write!(f, "{}", name),
            TypeExpr::Slice { elem, .. } => write!(f, "[]{}", elem),
            TypeExpr::Array { len, elem, .. } => write!(f, "[{}]{}", len, elem),
            TypeExpr::Map { key, elem, .. } => write!(f, "map[{}]{}", key, elem),
            TypeExpr::Ptr { elem, .. } => write!(f, "*{}", elem),
            TypeExpr::Chan { elem, .. } => write!(f, "chan {}", elem),
            TypeExpr::Func {
                params,
                results,
                variadic,
                ..
            } => {
                write!(f, "func(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if *variadic && i == params.len() - 1 {
                        write!(f, "...")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ")")?;
                match results.len() {
                    0 => Ok(()),
                    1 => write!(f, " {}", results[0]),
                    _ => {
                        write!(f, " (")?;
                        for (i, r) in results.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", r)?;
                        }
                        write!(f, ")")
                    }
                }
            }
        }
    }
}
