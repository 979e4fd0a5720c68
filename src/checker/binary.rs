//! Binary expression checking and constant folding

use std::cmp::Ordering;

use crate::constant::{convert_const_to_typed, ArithError, ConstNumber, ConstValue};
use crate::diagnostics::{DiagnosticKind, Span};
use crate::syntax::ast::{BinaryOp, Expr};
use crate::types::{ConstKind, ExprType, Type};

use super::{Checked, CheckedKind, Checker, Constant};

impl Checker<'_> {
    pub(crate) fn check_binary(
        &mut self,
        expr: &Expr,
        span: &Span,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Checked {
        let l = self.check(lhs);
        let r = self.check(rhs);
        let lt = self.expect_single_type(&l, lhs);
        let rt = self.expect_single_type(&r, rhs);
        let (Some(lt), Some(rt)) = (lt, rt) else {
            return Checked::unchecked(span.clone());
        };

        match (&lt, &rt) {
            (ExprType::Const(_), ExprType::Const(_)) => {
                self.binary_consts(span, op, lhs, rhs, &l, &r, &lt, &rt)
            }
            (ExprType::Const(_), ExprType::Concrete(t)) => {
                let t = t.clone();
                self.binary_mixed(span, op, lhs, rhs, &l, &r, &lt, &rt, &t, true)
            }
            (ExprType::Concrete(t), ExprType::Const(_)) => {
                let t = t.clone();
                self.binary_mixed(span, op, lhs, rhs, &l, &r, &lt, &rt, &t, false)
            }
            (ExprType::Concrete(tx), ExprType::Concrete(ty)) => {
                self.binary_typed(expr, span, op, lhs, rhs, &l, &r, tx.clone(), ty.clone())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn binary_consts(
        &mut self,
        span: &Span,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        l: &Checked,
        r: &Checked,
        lt: &ExprType,
        rt: &ExprType,
    ) -> Checked {
        let (Some(lv), Some(rv)) = (l.untyped_value(), r.untyped_value()) else {
            return Checked::unchecked(span.clone());
        };
        let mk = |ty: ExprType, value: ConstValue| {
            Checked::of(
                span.clone(),
                ty,
                CheckedKind::Binary {
                    op,
                    lhs: Box::new(l.clone()),
                    rhs: Box::new(r.clone()),
                },
            )
            .with_constant(Constant::Untyped(value))
        };
        let illegal = |c: &mut Self| {
            c.emit(
                DiagnosticKind::InvalidBinaryOp {
                    x: c.snippet(lhs),
                    op: op.symbol().to_string(),
                    y: c.snippet(rhs),
                    xt: lt.clone(),
                    yt: rt.clone(),
                    const_operands: true,
                    float_rem: false,
                    undefined_on: None,
                },
                span,
            );
            Checked::unchecked(span.clone())
        };
        let undefined = |c: &mut Self, on: &str| {
            c.emit(
                DiagnosticKind::InvalidBinaryOp {
                    x: c.snippet(lhs),
                    op: op.symbol().to_string(),
                    y: c.snippet(rhs),
                    xt: lt.clone(),
                    yt: rt.clone(),
                    const_operands: false,
                    float_rem: false,
                    undefined_on: Some(on.to_string()),
                },
                span,
            );
            Checked::unchecked(span.clone())
        };

        match (lv, rv) {
            (ConstValue::Number(a), ConstValue::Number(b)) => {
                if op.is_comparison() {
                    return match self.compare_numbers(op, a, b) {
                        Some(result) => {
                            mk(ExprType::Const(ConstKind::Bool), ConstValue::Bool(result))
                        }
                        None => illegal(self),
                    };
                }
                if op.is_shift() {
                    return match a.shift(b, op == BinaryOp::Shl) {
                        Ok(folded) => {
                            mk(ExprType::Const(folded.kind), ConstValue::Number(folded))
                        }
                        Err(_) => illegal(self),
                    };
                }
                let folded = match op {
                    BinaryOp::Add => Ok(a.add(b)),
                    BinaryOp::Sub => Ok(a.sub(b)),
                    BinaryOp::Mul => Ok(a.mul(b)),
                    BinaryOp::Div => a.div(b),
                    BinaryOp::Rem => a.rem(b),
                    BinaryOp::And => a.bitand(b),
                    BinaryOp::Or => a.bitor(b),
                    BinaryOp::Xor => a.bitxor(b),
                    BinaryOp::AndNot => a.bitandnot(b),
                    _ => return illegal(self),
                };
                match folded {
                    Ok(n) => mk(ExprType::Const(n.kind), ConstValue::Number(n)),
                    Err(ArithError::DivideByZero) => {
                        self.emit(DiagnosticKind::DivideByZero, span);
                        let kind = a.kind.promote(b.kind).unwrap_or(a.kind);
                        Checked::of(
                            span.clone(),
                            ExprType::Const(kind),
                            CheckedKind::Binary {
                                op,
                                lhs: Box::new(l.clone()),
                                rhs: Box::new(r.clone()),
                            },
                        )
                    }
                    Err(ArithError::FloatRem) => {
                        self.emit(
                            DiagnosticKind::InvalidBinaryOp {
                                x: self.snippet(lhs),
                                op: op.symbol().to_string(),
                                y: self.snippet(rhs),
                                xt: lt.clone(),
                                yt: rt.clone(),
                                const_operands: false,
                                float_rem: true,
                                undefined_on: None,
                            },
                            span,
                        );
                        Checked::unchecked(span.clone())
                    }
                    Err(_) => illegal(self),
                }
            }
            (ConstValue::String(a), ConstValue::String(b)) => match op {
                BinaryOp::Add => mk(
                    ExprType::Const(ConstKind::String),
                    ConstValue::String(format!("{}{}", a, b)),
                ),
                _ if op.is_comparison() => {
                    let result = match op {
                        BinaryOp::Eq => a == b,
                        BinaryOp::Ne => a != b,
                        BinaryOp::Lt => a < b,
                        BinaryOp::Le => a <= b,
                        BinaryOp::Gt => a > b,
                        BinaryOp::Ge => a >= b,
                        _ => unreachable!(),
                    };
                    mk(ExprType::Const(ConstKind::Bool), ConstValue::Bool(result))
                }
                _ => undefined(self, "string"),
            },
            (ConstValue::Bool(a), ConstValue::Bool(b)) => match op {
                BinaryOp::LAnd => mk(ExprType::Const(ConstKind::Bool), ConstValue::Bool(*a && *b)),
                BinaryOp::LOr => mk(ExprType::Const(ConstKind::Bool), ConstValue::Bool(*a || *b)),
                BinaryOp::Eq => mk(ExprType::Const(ConstKind::Bool), ConstValue::Bool(a == b)),
                BinaryOp::Ne => mk(ExprType::Const(ConstKind::Bool), ConstValue::Bool(a != b)),
                _ => undefined(self, "bool"),
            },
            (ConstValue::Nil, ConstValue::Nil) => undefined(self, "nil"),
            _ => {
                // Kinds that cannot be promoted to a common kind: report a
                // failed conversion for each operand
                for (e, t) in [(lhs, lt), (rhs, rt)] {
                    self.emit(
                        DiagnosticKind::BadConstConversion {
                            expr: self.snippet(e),
                            from: t.clone(),
                            to: ExprType::Const(ConstKind::Int),
                        },
                        e.span(),
                    );
                }
                Checked::unchecked(span.clone())
            }
        }
    }

    fn compare_numbers(&self, op: BinaryOp, a: &ConstNumber, b: &ConstNumber) -> Option<bool> {
        match op {
            BinaryOp::Eq | BinaryOp::Ne => {
                let eq = a.re == b.re && a.im == b.im;
                Some(if op == BinaryOp::Eq { eq } else { !eq })
            }
            _ => {
                let ord = a.compare(b)?;
                Some(match op {
                    BinaryOp::Lt => ord == Ordering::Less,
                    BinaryOp::Le => ord != Ordering::Greater,
                    BinaryOp::Gt => ord == Ordering::Greater,
                    BinaryOp::Ge => ord != Ordering::Less,
                    _ => return None,
                })
            }
        }
    }

    /// One constant operand, one typed: the constant assumes the typed
    /// operand's type, then the operator is judged on that type.
    #[allow(clippy::too_many_arguments)]
    fn binary_mixed(
        &mut self,
        span: &Span,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        l: &Checked,
        r: &Checked,
        lt: &ExprType,
        rt: &ExprType,
        t: &Type,
        const_on_left: bool,
    ) -> Checked {
        let (const_expr, const_checked) = if const_on_left { (lhs, l) } else { (rhs, r) };
        let Some(value) = const_checked.untyped_value() else {
            return Checked::unchecked(span.clone());
        };
        let snippet = self.snippet(const_expr);
        let (tv, conv) = convert_const_to_typed(value, t, false, &snippet, const_expr.span());
        let converted = tv.is_some();
        for d in conv {
            self.diags.push(d);
        }
        if !converted {
            self.emit(
                DiagnosticKind::InvalidBinaryOp {
                    x: self.snippet(lhs),
                    op: op.symbol().to_string(),
                    y: self.snippet(rhs),
                    xt: lt.clone(),
                    yt: rt.clone(),
                    const_operands: false,
                    float_rem: false,
                    undefined_on: None,
                },
                span,
            );
            return Checked::unchecked(span.clone());
        }
        if !is_op_defined_on(op, t) {
            self.emit(
                DiagnosticKind::InvalidBinaryOp {
                    x: self.snippet(lhs),
                    op: op.symbol().to_string(),
                    y: self.snippet(rhs),
                    xt: lt.clone(),
                    yt: rt.clone(),
                    const_operands: false,
                    float_rem: false,
                    undefined_on: Some(operand_type_word(t)),
                },
                span,
            );
            return Checked::unchecked(span.clone());
        }
        let result = if op.is_comparison() {
            Type::Bool
        } else {
            t.clone()
        };
        Checked::of(
            span.clone(),
            ExprType::Concrete(result),
            CheckedKind::Binary {
                op,
                lhs: Box::new(l.clone()),
                rhs: Box::new(r.clone()),
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn binary_typed(
        &mut self,
        _expr: &Expr,
        span: &Span,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        l: &Checked,
        r: &Checked,
        tx: Type,
        ty: Type,
    ) -> Checked {
        let mk = |result: Type| {
            Checked::of(
                span.clone(),
                ExprType::Concrete(result),
                CheckedKind::Binary {
                    op,
                    lhs: Box::new(l.clone()),
                    rhs: Box::new(r.clone()),
                },
            )
        };
        // Shift counts may have a different integer type than the operand
        if op.is_shift() && tx.is_integer() && ty.is_integer() {
            return mk(tx);
        }
        if tx == ty {
            if is_op_defined_on(op, &tx) {
                let result = if op.is_comparison() { Type::Bool } else { tx };
                return mk(result);
            }
            self.emit(
                DiagnosticKind::InvalidBinaryOp {
                    x: self.snippet(lhs),
                    op: op.symbol().to_string(),
                    y: self.snippet(rhs),
                    xt: ExprType::Concrete(tx.clone()),
                    yt: ExprType::Concrete(ty),
                    const_operands: false,
                    float_rem: false,
                    undefined_on: Some(operand_type_word(&tx)),
                },
                span,
            );
            return Checked::unchecked(span.clone());
        }
        self.emit(
            DiagnosticKind::InvalidBinaryOp {
                x: self.snippet(lhs),
                op: op.symbol().to_string(),
                y: self.snippet(rhs),
                xt: ExprType::Concrete(tx),
                yt: ExprType::Concrete(ty),
                const_operands: false,
                float_rem: false,
                undefined_on: None,
            },
            span,
        );
        Checked::unchecked(span.clone())
    }
}

/// Is the operator defined on this (identical left and right) type?
fn is_op_defined_on(op: BinaryOp, t: &Type) -> bool {
    match op {
        BinaryOp::Add => t.is_numeric() || *t == Type::String,
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => t.is_numeric(),
        BinaryOp::Rem
        | BinaryOp::And
        | BinaryOp::Or
        | BinaryOp::Xor
        | BinaryOp::AndNot
        | BinaryOp::Shl
        | BinaryOp::Shr => t.is_integer(),
        BinaryOp::LAnd | BinaryOp::LOr => *t == Type::Bool,
        BinaryOp::Eq | BinaryOp::Ne => !matches!(t, Type::Slice(_) | Type::Map { .. } | Type::Func(_)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            (t.is_numeric() && !t.is_complex()) || *t == Type::String
        }
    }
}

/// The generic word used for composite operand types in messages
fn operand_type_word(t: &Type) -> String {
    match t {
        Type::Array { .. } => "array".to_string(),
        Type::Slice(_) => "slice".to_string(),
        Type::Interface(_) => "interface".to_string(),
        Type::Ptr(_) => "pointer".to_string(),
        Type::Struct(_) => "struct".to_string(),
        Type::Map { .. } => "map".to_string(),
        _ => t.to_string(),
    }
}
