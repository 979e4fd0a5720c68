//! Expression type checking
//!
//! The checker walks an expression tree and produces a parallel `Checked`
//! tree: every node carries the types it evaluates to (possibly none, for
//! void calls, or several, for multi-valued calls), and constants are folded
//! exactly as checking proceeds. The input tree is never mutated.
//!
//! Diagnostics accumulate in source order in a `DiagnosticBag`; most are
//! non-fatal, and checking continues with a placeholder (`CheckedKind::
//! Unchecked`, an empty type list) wherever a subexpression could not be
//! given a type.

use thiserror::Error;

use crate::constant::{convert_const_to_typed, ConstValue, TypedValue};
use crate::diagnostics::{Diagnostic, DiagnosticBag, DiagnosticKind, Span};
use crate::env::{Binding, Env};
use crate::syntax::ast::{BinaryOp, Expr, TypeExpr, UnaryOp};
use crate::types::{ConstKind, ExprType, Type};

mod binary;
mod builtin;
mod call;
mod composite;
#[cfg(test)]
mod tests;

pub use builtin::Builtin;

/// Checking context: the original source text, when available, is used to
/// quote expressions in diagnostics. Without it, nodes are re-rendered from
/// the tree.
#[derive(Debug, Clone, Default)]
pub struct Ctx {
    pub input: Option<String>,
}

impl Ctx {
    pub fn with_input(input: impl Into<String>) -> Self {
        Ctx {
            input: Some(input.into()),
        }
    }
}

/// The folded value attached to a checked expression
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Still untyped; carries the exact value
    Untyped(ConstValue),
    /// Committed to a concrete type
    Typed(Type, TypedValue),
}

/// Node-specific data of a checked expression
#[derive(Debug, Clone, PartialEq)]
pub enum CheckedKind {
    Lit,
    Ident(String),
    Paren(Box<Checked>),
    Unary {
        op: UnaryOp,
        operand: Box<Checked>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Checked>,
        rhs: Box<Checked>,
    },
    Call(Box<CallInfo>),
    Composite(CompositeInfo),
    KeyValue {
        key: Box<Checked>,
        value: Box<Checked>,
    },
    Index {
        base: Box<Checked>,
        index: Box<Checked>,
    },
    Selector {
        base: Box<Checked>,
        field: String,
    },
    Star(Box<Checked>),
    TypeAssert {
        base: Box<Checked>,
        asserted: Type,
    },
    /// A type written in expression position
    Type(Type),
    /// Placeholder for a subexpression that could not be checked
    Unchecked,
}

/// Checked form of a call or conversion
#[derive(Debug, Clone, PartialEq)]
pub struct CallInfo {
    pub fun: Checked,
    pub args: Vec<Checked>,
    pub builtin: Option<Builtin>,
    pub is_conversion: bool,
    pub ellipsis: bool,
    /// f(g()) where g is multi-valued
    pub spread: bool,
}

/// Checked form of a composite literal
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeInfo {
    pub ty: Option<Type>,
    pub elts: Vec<Checked>,
}

/// A checked expression node
#[derive(Debug, Clone, PartialEq)]
pub struct Checked {
    pub span: Span,
    /// Types this expression evaluates to. Empty for void calls and for
    /// placeholder nodes; more than one for multi-valued calls.
    pub types: Vec<ExprType>,
    pub constant: Option<Constant>,
    pub kind: CheckedKind,
}

impl Checked {
    pub fn unchecked(span: Span) -> Checked {
        Checked {
            span,
            types: vec![],
            constant: None,
            kind: CheckedKind::Unchecked,
        }
    }

    pub fn of(span: Span, ty: ExprType, kind: CheckedKind) -> Checked {
        Checked {
            span,
            types: vec![ty],
            constant: None,
            kind,
        }
    }

    pub fn with_constant(mut self, constant: Constant) -> Checked {
        self.constant = Some(constant);
        self
    }

    /// The single type of this expression, if it has exactly one
    pub fn single_type(&self) -> Option<&ExprType> {
        match self.types.as_slice() {
            [t] => Some(t),
            _ => None,
        }
    }

    pub fn is_const(&self) -> bool {
        self.constant.is_some()
    }

    /// The exact value when this is an untyped constant
    pub fn untyped_value(&self) -> Option<&ConstValue> {
        match &self.constant {
            Some(Constant::Untyped(v)) => Some(v),
            _ => None,
        }
    }

    fn failed(&self) -> bool {
        matches!(self.kind, CheckedKind::Unchecked)
    }
}

/// Returned by the strict entry point when checking produced errors
#[derive(Debug, Error)]
#[error("expression has {} error(s); first: {}", diagnostics.len(), diagnostics.first().map(|d| d.message.as_str()).unwrap_or(""))]
pub struct CheckFailure {
    pub diagnostics: Vec<Diagnostic>,
}

/// Check a single expression against an environment.
///
/// Always returns a checked tree; inspect the bag for errors.
pub fn check_expr(expr: &Expr, env: &Env, ctx: &Ctx) -> (Checked, DiagnosticBag) {
    let mut checker = Checker::new(env, ctx);
    let checked = checker.check(expr);
    (checked, checker.into_diagnostics())
}

/// Check an expression, failing if any diagnostics were produced
pub fn check_expr_strict(expr: &Expr, env: &Env, ctx: &Ctx) -> Result<Checked, CheckFailure> {
    let (checked, diags) = check_expr(expr, env, ctx);
    if diags.is_empty() {
        Ok(checked)
    } else {
        Err(CheckFailure {
            diagnostics: diags.take(),
        })
    }
}

/// The expression checker
pub struct Checker<'a> {
    env: &'a Env,
    ctx: &'a Ctx,
    diags: DiagnosticBag,
}

impl<'a> Checker<'a> {
    pub fn new(env: &'a Env, ctx: &'a Ctx) -> Self {
        Checker {
            env,
            ctx,
            diags: DiagnosticBag::new(),
        }
    }

    pub fn diagnostics(&self) -> &DiagnosticBag {
        &self.diags
    }

    pub fn into_diagnostics(self) -> DiagnosticBag {
        self.diags
    }

    pub(crate) fn emit(&mut self, kind: DiagnosticKind, span: &Span) {
        self.diags.push(Diagnostic::new(kind, span.clone()));
    }

    /// Quote an expression for a diagnostic: the original source text when
    /// the context carries it, otherwise the canonical rendering.
    pub(crate) fn snippet(&self, expr: &Expr) -> String {
        if let Some(input) = &self.ctx.input {
            if expr.span().end > expr.span().start && expr.span().end <= input.len() {
                return input[expr.span().start..expr.span().end].to_string();
            }
        }
        expr.to_string()
    }

    pub(crate) fn probe(&self) -> usize {
        self.diags.len()
    }

    pub(crate) fn erred_since(&self, mark: usize) -> bool {
        self.diags.len() > mark
    }

    /// Run `f` with an empty bag and return what it produced alongside the
    /// captured diagnostics, restoring the outer bag afterwards.
    pub(crate) fn capture<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> T,
    ) -> (T, Vec<Diagnostic>) {
        let saved = std::mem::take(&mut self.diags);
        let result = f(self);
        let captured = std::mem::replace(&mut self.diags, saved);
        (result, captured.take())
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    pub fn check(&mut self, expr: &Expr) -> Checked {
        match expr {
            Expr::BasicLit { span, kind, text, .. } => self.check_lit(span, *kind, text),
            Expr::Ident { span, name, .. } => self.check_ident(span, name),
            Expr::Paren { span, inner, .. } => {
                let c = self.check(inner);
                Checked {
                    span: span.clone(),
                    types: c.types.clone(),
                    constant: c.constant.clone(),
                    kind: CheckedKind::Paren(Box::new(c)),
                }
            }
            Expr::Unary { span, op, operand, .. } => self.check_unary(expr, span, *op, operand),
            Expr::Binary { span, op, lhs, rhs, .. } => {
                self.check_binary(expr, span, *op, lhs, rhs)
            }
            Expr::Call { .. } => self.check_call(expr),
            Expr::Composite { .. } => self.check_composite_lit(expr, None),
            Expr::KeyValue { span, key, value, .. } => {
                // Only valid inside a composite literal; the literal checkers
                // handle the keyed cases before dispatching here.
                let k = self.check(key);
                let v = self.check(value);
                Checked {
                    span: span.clone(),
                    types: vec![],
                    constant: None,
                    kind: CheckedKind::KeyValue {
                        key: Box::new(k),
                        value: Box::new(v),
                    },
                }
            }
            Expr::Index { span, base, index, .. } => self.check_index(span, base, index),
            Expr::Selector { span, base, field, .. } => {
                self.check_selector(expr, span, base, field)
            }
            Expr::Star { span, operand, .. } => self.check_star(expr, span, operand),
            Expr::TypeAssert { span, base, ty, .. } => {
                self.check_type_assert(expr, span, base, ty)
            }
            Expr::TypeLit { span, ty, .. } => {
                let resolved = self.check_type_expr(ty);
                self.emit(
                    DiagnosticKind::TypeUsedAsExpression { name: ty.to_string() },
                    span,
                );
                match resolved {
                    Some(t) => Checked {
                        span: span.clone(),
                        types: vec![],
                        constant: None,
                        kind: CheckedKind::Type(t),
                    },
                    None => Checked::unchecked(span.clone()),
                }
            }
        }
    }

    fn check_lit(&mut self, span: &Span, kind: crate::syntax::LitKind, text: &str) -> Checked {
        match ConstValue::from_literal(kind, text) {
            Some((ck, value)) => Checked::of(span.clone(), ExprType::Const(ck), CheckedKind::Lit)
                .with_constant(Constant::Untyped(value)),
            None => {
                self.emit(
                    DiagnosticKind::BadLiteral { text: text.to_string() },
                    span,
                );
                Checked::unchecked(span.clone())
            }
        }
    }

    fn check_ident(&mut self, span: &Span, name: &str) -> Checked {
        if let Some(binding) = self.env.lookup(name) {
            return match binding {
                Binding::Var(t) => Checked::of(
                    span.clone(),
                    ExprType::Concrete(t.clone()),
                    CheckedKind::Ident(name.to_string()),
                ),
                Binding::Const(kind, value) => Checked::of(
                    span.clone(),
                    ExprType::Const(*kind),
                    CheckedKind::Ident(name.to_string()),
                )
                .with_constant(Constant::Untyped(value.clone())),
                Binding::TypeName(t) => {
                    let t = t.clone();
                    self.emit(
                        DiagnosticKind::TypeUsedAsExpression { name: name.to_string() },
                        span,
                    );
                    Checked {
                        span: span.clone(),
                        types: vec![],
                        constant: None,
                        kind: CheckedKind::Type(t),
                    }
                }
            };
        }
        match name {
            "true" | "false" => Checked::of(
                span.clone(),
                ExprType::Const(ConstKind::Bool),
                CheckedKind::Ident(name.to_string()),
            )
            .with_constant(Constant::Untyped(ConstValue::Bool(name == "true"))),
            "nil" => Checked::of(
                span.clone(),
                ExprType::Const(ConstKind::Nil),
                CheckedKind::Ident(name.to_string()),
            )
            .with_constant(Constant::Untyped(ConstValue::Nil)),
            _ if Builtin::from_name(name).is_some() => {
                self.emit(
                    DiagnosticKind::BuiltinNotCalled { name: name.to_string() },
                    span,
                );
                Checked::unchecked(span.clone())
            }
            _ if Type::builtin(name).is_some() => {
                let t = Type::builtin(name).unwrap_or(Type::Int);
                self.emit(
                    DiagnosticKind::TypeUsedAsExpression { name: name.to_string() },
                    span,
                );
                Checked {
                    span: span.clone(),
                    types: vec![],
                    constant: None,
                    kind: CheckedKind::Type(t),
                }
            }
            _ => {
                self.emit(
                    DiagnosticKind::Undefined { name: name.to_string() },
                    span,
                );
                Checked::unchecked(span.clone())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Single-value contexts
    // -----------------------------------------------------------------------

    /// Require `checked` to have exactly one type. Emits the gc wording for
    /// void values and multi-valued calls; silent when the subexpression
    /// already failed.
    pub(crate) fn expect_single_type(
        &mut self,
        checked: &Checked,
        expr: &Expr,
    ) -> Option<ExprType> {
        if checked.failed() {
            return None;
        }
        match checked.types.len() {
            1 => Some(checked.types[0].clone()),
            0 => {
                self.emit(
                    DiagnosticKind::MissingValue { expr: self.snippet(expr) },
                    expr.span(),
                );
                None
            }
            _ => {
                self.emit(
                    DiagnosticKind::MultiInSingleContext { expr: self.snippet(expr) },
                    expr.span(),
                );
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Types in expression position
    // -----------------------------------------------------------------------

    /// Does this expression syntactically denote a type?
    pub(crate) fn expr_is_type(&self, expr: &Expr) -> bool {
        match expr {
            Expr::TypeLit { .. } => true,
            Expr::Paren { inner, .. } => self.expr_is_type(inner),
            Expr::Star { operand, .. } => self.expr_is_type(operand),
            Expr::Ident { name, .. } => match self.env.lookup(name) {
                Some(Binding::TypeName(_)) => true,
                Some(_) => false,
                None => Type::builtin(name).is_some(),
            },
            _ => false,
        }
    }

    /// Resolve an expression in type position, emitting diagnostics on
    /// failure.
    pub(crate) fn resolve_type(&mut self, expr: &Expr) -> Option<Type> {
        match expr {
            Expr::TypeLit { ty, .. } => self.check_type_expr(ty),
            Expr::Paren { inner, .. } => self.resolve_type(inner),
            Expr::Star { operand, .. } => {
                let inner = self.resolve_type(operand)?;
                Some(Type::Ptr(Box::new(inner)))
            }
            Expr::Ident { name, span, .. } => match self.env.lookup_type(name) {
                Some(t) => Some(t),
                None => {
                    if self.env.lookup(name).is_some() {
                        self.emit(
                            DiagnosticKind::BuiltinNonTypeArg { expr: self.snippet(expr) },
                            span,
                        );
                    } else {
                        self.emit(
                            DiagnosticKind::Undefined { name: name.to_string() },
                            span,
                        );
                    }
                    None
                }
            },
            _ => {
                self.emit(
                    DiagnosticKind::BuiltinNonTypeArg { expr: self.snippet(expr) },
                    expr.span(),
                );
                None
            }
        }
    }

    /// Resolve a written type expression to a `Type`
    pub(crate) fn check_type_expr(&mut self, te: &TypeExpr) -> Option<Type> {
        match te {
            TypeExpr::Named { name, span, .. } => match self.env.lookup_type(name) {
                Some(t) => Some(t),
                None => {
                    if self.env.lookup(name).is_some() {
                        self.emit(
                            DiagnosticKind::BuiltinNonTypeArg { expr: name.to_string() },
                            span,
                        );
                    } else {
                        self.emit(
                            DiagnosticKind::Undefined { name: name.to_string() },
                            span,
                        );
                    }
                    None
                }
            },
            TypeExpr::Slice { elem, .. } => {
                Some(Type::Slice(Box::new(self.check_type_expr(elem)?)))
            }
            TypeExpr::Array { len, elem, .. } => {
                let n = self.check_array_bound(len);
                let elem = self.check_type_expr(elem)?;
                Some(Type::Array {
                    len: n?,
                    elem: Box::new(elem),
                })
            }
            TypeExpr::Map { key, elem, .. } => {
                let key = self.check_type_expr(key)?;
                let elem = self.check_type_expr(elem)?;
                Some(Type::Map {
                    key: Box::new(key),
                    elem: Box::new(elem),
                })
            }
            TypeExpr::Ptr { elem, .. } => Some(Type::Ptr(Box::new(self.check_type_expr(elem)?))),
            TypeExpr::Chan { elem, .. } => Some(Type::Chan(Box::new(self.check_type_expr(elem)?))),
            TypeExpr::Func {
                params,
                results,
                variadic,
                ..
            } => {
                let mut ps = Vec::with_capacity(params.len());
                for p in params {
                    ps.push(self.check_type_expr(p)?);
                }
                let mut rs = Vec::with_capacity(results.len());
                for r in results {
                    rs.push(self.check_type_expr(r)?);
                }
                Some(Type::Func(crate::types::FuncType {
                    params: ps,
                    results: rs,
                    variadic: *variadic,
                }))
            }
        }
    }

    /// An array bound must be a non-negative integer constant
    fn check_array_bound(&mut self, len: &Expr) -> Option<usize> {
        let checked = self.check(len);
        let snippet = self.snippet(len);
        match checked.untyped_value().and_then(|v| v.as_number()) {
            Some(n) if n.kind.is_integral() || n.is_integer() => {
                let (v, _) = n.to_bigint();
                match usize::try_from(v) {
                    Ok(u) => Some(u),
                    Err(_) => {
                        self.emit(
                            DiagnosticKind::BadArrayBound { expr: snippet, negative: true },
                            len.span(),
                        );
                        None
                    }
                }
            }
            _ => {
                if !checked.failed() {
                    self.emit(
                        DiagnosticKind::BadArrayBound { expr: snippet, negative: false },
                        len.span(),
                    );
                }
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Assignability with captured diagnostics
    // -----------------------------------------------------------------------

    /// Check `expr` and test assignability to `to`.
    ///
    /// On success the returned diagnostics are the non-fatal ones (constant
    /// truncation and overflow) and should be kept. On failure they describe
    /// why, with a bad-constant-conversion first when the operand was an
    /// untyped constant; callers decide what survives.
    pub(crate) fn check_assignable_to(
        &mut self,
        expr: &Expr,
        to: &Type,
    ) -> (Checked, bool, Vec<Diagnostic>) {
        let (checked, mut captured) = self.capture(|c| c.check(expr));
        let ty = {
            let (t, mut more) = self.capture(|c| c.expect_single_type(&checked, expr));
            captured.append(&mut more);
            t
        };
        let Some(ty) = ty else {
            return (checked, false, captured);
        };
        match &ty {
            ExprType::Const(_) => {
                let value = match checked.untyped_value() {
                    Some(v) => v.clone(),
                    None => return (checked, false, captured),
                };
                let snippet = self.snippet(expr);
                let (tv, conv) = convert_const_to_typed(&value, to, false, &snippet, expr.span());
                let ok = tv.is_some();
                captured.extend(conv);
                let checked = match tv {
                    Some(v) => {
                        let mut c = checked;
                        c.constant = Some(Constant::Typed(to.clone(), v));
                        c
                    }
                    None => checked,
                };
                (checked, ok, captured)
            }
            ExprType::Concrete(t) => {
                let ok = t.assignable_to(to);
                (checked, ok, captured)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Unary, index, selector, star, type assertion
    // -----------------------------------------------------------------------

    fn check_unary(&mut self, expr: &Expr, span: &Span, op: UnaryOp, operand: &Expr) -> Checked {
        let mark = self.probe();
        let inner = self.check(operand);
        if self.erred_since(mark) && !inner.is_const() {
            return Checked::unchecked(span.clone());
        }
        let Some(ty) = self.expect_single_type(&inner, operand) else {
            return Checked::unchecked(span.clone());
        };

        let invalid = |c: &mut Self, xor_const: bool| {
            c.emit(
                DiagnosticKind::InvalidUnaryOp {
                    op: op.symbol().to_string(),
                    ty: ty.clone(),
                    xor_const,
                },
                span,
            );
            Checked::unchecked(span.clone())
        };

        match &ty {
            ExprType::Const(kind) => {
                let value = inner.untyped_value().cloned();
                match (op, &value) {
                    (UnaryOp::Pos, Some(ConstValue::Number(_))) => Checked::of(
                        span.clone(),
                        ty.clone(),
                        CheckedKind::Unary { op, operand: Box::new(inner.clone()) },
                    )
                    .with_constant(Constant::Untyped(value.unwrap_or(ConstValue::Nil))),
                    (UnaryOp::Neg, Some(ConstValue::Number(n))) => {
                        let folded = n.neg();
                        Checked::of(
                            span.clone(),
                            ty.clone(),
                            CheckedKind::Unary { op, operand: Box::new(inner.clone()) },
                        )
                        .with_constant(Constant::Untyped(ConstValue::Number(folded)))
                    }
                    (UnaryOp::Not, Some(ConstValue::Bool(b))) => Checked::of(
                        span.clone(),
                        ty.clone(),
                        CheckedKind::Unary { op, operand: Box::new(inner.clone()) },
                    )
                    .with_constant(Constant::Untyped(ConstValue::Bool(!b))),
                    (UnaryOp::BitNot, Some(ConstValue::Number(n))) => match n.bitnot() {
                        Ok(folded) => Checked::of(
                            span.clone(),
                            ty.clone(),
                            CheckedKind::Unary { op, operand: Box::new(inner.clone()) },
                        )
                        .with_constant(Constant::Untyped(ConstValue::Number(folded))),
                        Err(_) => invalid(self, true),
                    },
                    _ => invalid(self, op == UnaryOp::BitNot && kind.is_numeric()),
                }
            }
            ExprType::Concrete(t) => match op {
                UnaryOp::Pos | UnaryOp::Neg if t.is_numeric() => Checked::of(
                    span.clone(),
                    ty.clone(),
                    CheckedKind::Unary { op, operand: Box::new(inner) },
                ),
                UnaryOp::Not if *t == Type::Bool => Checked::of(
                    span.clone(),
                    ty.clone(),
                    CheckedKind::Unary { op, operand: Box::new(inner) },
                ),
                UnaryOp::BitNot if t.is_integer() => Checked::of(
                    span.clone(),
                    ty.clone(),
                    CheckedKind::Unary { op, operand: Box::new(inner) },
                ),
                UnaryOp::Recv => match t {
                    Type::Chan(elem) => Checked::of(
                        span.clone(),
                        ExprType::Concrete((**elem).clone()),
                        CheckedKind::Unary { op, operand: Box::new(inner) },
                    ),
                    _ => {
                        self.emit(
                            DiagnosticKind::InvalidRecvFrom {
                                expr: self.snippet(operand),
                                ty: ty.clone(),
                            },
                            span,
                        );
                        Checked::unchecked(span.clone())
                    }
                },
                UnaryOp::Addr => {
                    if addressable(operand) {
                        Checked::of(
                            span.clone(),
                            ExprType::Concrete(Type::Ptr(Box::new(t.clone()))),
                            CheckedKind::Unary { op, operand: Box::new(inner) },
                        )
                    } else {
                        self.emit(
                            DiagnosticKind::InvalidAddressOf { expr: self.snippet(operand) },
                            span,
                        );
                        Checked::unchecked(span.clone())
                    }
                }
                _ => invalid(self, false),
            },
        }
    }

    fn check_index(&mut self, span: &Span, base: &Expr, index: &Expr) -> Checked {
        let b = self.check(base);
        let Some(bt) = self.expect_single_type(&b, base) else {
            // Still check the index for its own errors
            let _ = self.check(index);
            return Checked::unchecked(span.clone());
        };
        let i = self.check(index);
        let it = self.expect_single_type(&i, index);

        let mk = |b: Checked, i: Checked, elem: ExprType| {
            Checked::of(
                span.clone(),
                elem,
                CheckedKind::Index { base: Box::new(b), index: Box::new(i) },
            )
        };

        match &bt {
            ExprType::Concrete(Type::Map { key, elem }) => {
                if let Some(it) = it {
                    let ok = match &it {
                        ExprType::Const(_) => {
                            if let Some(v) = i.untyped_value() {
                                let snippet = self.snippet(index);
                                let (tv, conv) =
                                    convert_const_to_typed(v, key, false, &snippet, index.span());
                                if tv.is_some() {
                                    // Keep non-fatal truncation/overflow notes
                                    for d in conv {
                                        self.diags.push(d);
                                    }
                                    true
                                } else {
                                    false
                                }
                            } else {
                                false
                            }
                        }
                        ExprType::Concrete(t) => t.assignable_to(key),
                    };
                    if !ok {
                        self.emit(
                            DiagnosticKind::BadMapIndex {
                                index: self.snippet(index),
                                ty: it,
                                key_type: (**key).clone(),
                            },
                            index.span(),
                        );
                    }
                }
                mk(b, i, ExprType::Concrete((**elem).clone()))
            }
            ExprType::Concrete(Type::Array { len, elem }) => {
                self.check_int_index(index, &i, it, false, Some(*len));
                mk(b, i, ExprType::Concrete((**elem).clone()))
            }
            ExprType::Concrete(Type::Slice(elem)) => {
                self.check_int_index(index, &i, it, false, None);
                mk(b, i, ExprType::Concrete((**elem).clone()))
            }
            ExprType::Concrete(Type::String) | ExprType::Const(ConstKind::String) => {
                let len = b.untyped_value().and_then(|v| match v {
                    ConstValue::String(s) => Some(s.len()),
                    _ => None,
                });
                self.check_int_index(index, &i, it, true, len);
                mk(b, i, ExprType::Concrete(Type::Uint8))
            }
            _ => {
                self.emit(
                    DiagnosticKind::InvalidIndexOperation {
                        expr: self.snippet(base),
                        ty: bt.clone(),
                    },
                    span,
                );
                Checked::unchecked(span.clone())
            }
        }
    }

    /// Validate an array/slice/string index expression
    fn check_int_index(
        &mut self,
        index: &Expr,
        checked: &Checked,
        it: Option<ExprType>,
        on_string: bool,
        length: Option<usize>,
    ) {
        let Some(it) = it else { return };
        let integer = match &it {
            ExprType::Const(k) => {
                k.is_numeric()
                    && checked
                        .untyped_value()
                        .and_then(|v| v.as_number())
                        .map(|n| n.is_integer())
                        .unwrap_or(false)
            }
            ExprType::Concrete(t) => t.is_integer(),
        };
        if !integer {
            self.emit(
                DiagnosticKind::NonIntegerIndex { index: self.snippet(index), on_string },
                index.span(),
            );
            return;
        }
        // Constant indices are bounds checked when the length is known
        if let (Some(n), Some(len)) = (
            checked.untyped_value().and_then(|v| v.as_number()),
            length,
        ) {
            let (v, _) = n.to_bigint();
            let value = num_traits::ToPrimitive::to_i64(&v).unwrap_or(i64::MAX);
            if value < 0 || value >= len as i64 {
                self.emit(
                    DiagnosticKind::IndexOutOfBounds {
                        index: self.snippet(index),
                        on_string,
                        length: len,
                        value,
                    },
                    index.span(),
                );
            }
        }
    }

    fn check_selector(&mut self, expr: &Expr, span: &Span, base: &Expr, field: &str) -> Checked {
        let mark = self.probe();
        let b = self.check(base);
        if self.erred_since(mark) {
            return Checked::unchecked(span.clone());
        }
        let Some(bt) = self.expect_single_type(&b, base) else {
            return Checked::unchecked(span.clone());
        };

        let target = match &bt {
            ExprType::Concrete(Type::Ptr(inner)) => Some((**inner).clone()),
            ExprType::Concrete(t) => Some(t.clone()),
            ExprType::Const(_) => None,
        };
        if let Some(t) = &target {
            if let Type::Struct(s) = t {
                if let Some(f) = s.fields.iter().find(|f| f.name == field) {
                    return Checked::of(
                        span.clone(),
                        ExprType::Concrete(f.ty.clone()),
                        CheckedKind::Selector { base: Box::new(b), field: field.to_string() },
                    );
                }
            }
            if let Some(m) = t.methods().iter().find(|m| m.name == field) {
                return Checked::of(
                    span.clone(),
                    ExprType::Concrete(Type::Func(m.sig.clone())),
                    CheckedKind::Selector { base: Box::new(b), field: field.to_string() },
                );
            }
        }
        self.emit(
            DiagnosticKind::UndefinedFieldOrMethod {
                expr: self.snippet(expr),
                ty: bt,
                field: field.to_string(),
            },
            span,
        );
        Checked::unchecked(span.clone())
    }

    fn check_star(&mut self, expr: &Expr, span: &Span, operand: &Expr) -> Checked {
        // `*T` in expression position is a type, not an indirection
        if self.expr_is_type(operand) {
            let resolved = self.resolve_type(operand).map(|t| Type::Ptr(Box::new(t)));
            self.emit(
                DiagnosticKind::TypeUsedAsExpression { name: self.snippet(expr) },
                span,
            );
            return match resolved {
                Some(t) => Checked {
                    span: span.clone(),
                    types: vec![],
                    constant: None,
                    kind: CheckedKind::Type(t),
                },
                None => Checked::unchecked(span.clone()),
            };
        }
        let mark = self.probe();
        let inner = self.check(operand);
        if self.erred_since(mark) && !inner.is_const() {
            return Checked::unchecked(span.clone());
        }
        let Some(ty) = self.expect_single_type(&inner, operand) else {
            return Checked::unchecked(span.clone());
        };
        match &ty {
            ExprType::Concrete(Type::Ptr(elem)) => Checked::of(
                span.clone(),
                ExprType::Concrete((**elem).clone()),
                CheckedKind::Star(Box::new(inner)),
            ),
            _ => {
                self.emit(
                    DiagnosticKind::InvalidIndirect { expr: self.snippet(operand), ty },
                    span,
                );
                Checked::unchecked(span.clone())
            }
        }
    }

    fn check_type_assert(
        &mut self,
        expr: &Expr,
        span: &Span,
        base: &Expr,
        ty: &TypeExpr,
    ) -> Checked {
        let mark = self.probe();
        let b = self.check(base);
        if self.erred_since(mark) {
            return Checked::unchecked(span.clone());
        }
        let Some(bt) = self.expect_single_type(&b, base) else {
            return Checked::unchecked(span.clone());
        };
        let Some(asserted) = self.check_type_expr(ty) else {
            return Checked::unchecked(span.clone());
        };
        match &bt {
            ExprType::Concrete(Type::Interface(iface)) => {
                if !iface.methods.is_empty() && !matches!(asserted, Type::Interface(_)) {
                    if let Err(missing) = asserted.implements(iface) {
                        self.emit(
                            DiagnosticKind::ImpossibleTypeAssert {
                                from: asserted.clone(),
                                to: Type::Interface(iface.clone()),
                                missing,
                            },
                            span,
                        );
                    }
                }
                Checked::of(
                    span.clone(),
                    ExprType::Concrete(asserted.clone()),
                    CheckedKind::TypeAssert { base: Box::new(b), asserted },
                )
            }
            _ => {
                self.emit(
                    DiagnosticKind::InvalidTypeAssert { expr: self.snippet(expr), ty: bt },
                    span,
                );
                Checked::unchecked(span.clone())
            }
        }
    }
}

/// Addressable expressions: variables, indirections, and element accesses
fn addressable(expr: &Expr) -> bool {
    match expr.strip_parens() {
        Expr::Ident { .. } | Expr::Star { .. } | Expr::Composite { .. } => true,
        Expr::Index { base, .. } => addressable(base),
        Expr::Selector { base, .. } => addressable(base),
        _ => false,
    }
}

/// Does the expression contain a function call or channel receive? Constant
/// folding of `len`/`cap` over arrays is inhibited when it does, since the
/// operand must still be evaluated.
pub(crate) fn has_call_or_recv(expr: &Expr) -> bool {
    match expr {
        Expr::Call { .. } => true,
        Expr::Unary { op: UnaryOp::Recv, .. } => true,
        Expr::Unary { operand, .. } => has_call_or_recv(operand),
        Expr::Paren { inner, .. } => has_call_or_recv(inner),
        Expr::Binary { lhs, rhs, .. } => has_call_or_recv(lhs) || has_call_or_recv(rhs),
        Expr::Index { base, index, .. } => has_call_or_recv(base) || has_call_or_recv(index),
        Expr::Selector { base, .. } => has_call_or_recv(base),
        Expr::Star { operand, .. } => has_call_or_recv(operand),
        Expr::TypeAssert { base, .. } => has_call_or_recv(base),
        Expr::Composite { elts, .. } => elts.iter().any(has_call_or_recv),
        Expr::KeyValue { key, value, .. } => has_call_or_recv(key) || has_call_or_recv(value),
        Expr::BasicLit { .. } | Expr::Ident { .. } | Expr::TypeLit { .. } => false,
    }
}
