//! Builtin call checking
//!
//! Builtins are dispatched before the ordinary call path because `new` and
//! `make` take a type as their first syntactic argument. Each checker keeps
//! visiting arguments past the point where the call is already known to be
//! wrong, so independent errors in later arguments are still reported.

use crate::constant::{convert_const_to_typed, ConstValue, TypedValue};
use crate::diagnostics::{DiagnosticKind, Span};
use crate::syntax::ast::Expr;
use crate::types::{ConstKind, ExprType, Type};

use super::{has_call_or_recv, CallInfo, Checked, CheckedKind, Checker, Constant};

/// The predeclared builtin functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Complex,
    Real,
    Imag,
    New,
    Make,
    Len,
    Cap,
    Append,
    Copy,
    Delete,
    Panic,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Builtin> {
        Some(match name {
            "complex" => Builtin::Complex,
            "real" => Builtin::Real,
            "imag" => Builtin::Imag,
            "new" => Builtin::New,
            "make" => Builtin::Make,
            "len" => Builtin::Len,
            "cap" => Builtin::Cap,
            "append" => Builtin::Append,
            "copy" => Builtin::Copy,
            "delete" => Builtin::Delete,
            "panic" => Builtin::Panic,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Complex => "complex",
            Builtin::Real => "real",
            Builtin::Imag => "imag",
            Builtin::New => "new",
            Builtin::Make => "make",
            Builtin::Len => "len",
            Builtin::Cap => "cap",
            Builtin::Append => "append",
            Builtin::Copy => "copy",
            Builtin::Delete => "delete",
            Builtin::Panic => "panic",
        }
    }
}

impl std::fmt::Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn byte_slice() -> Type {
    Type::Slice(Box::new(Type::Uint8))
}

fn typed_float(c: &Checked) -> Option<f64> {
    match &c.constant {
        Some(Constant::Typed(_, TypedValue::Float(f))) => Some(*f),
        _ => None,
    }
}

impl Checker<'_> {
    pub(crate) fn check_builtin_call(&mut self, builtin: Builtin, expr: &Expr) -> Checked {
        let Expr::Call {
            span,
            fun,
            args,
            ellipsis,
            ..
        } = expr
        else {
            return Checked::unchecked(expr.span().clone());
        };
        let fun_span = fun.span().clone();
        match builtin {
            Builtin::Complex => self.check_complex(expr, span, &fun_span, args, *ellipsis),
            Builtin::Real | Builtin::Imag => {
                self.check_real_imag(builtin, expr, span, &fun_span, args, *ellipsis)
            }
            Builtin::New => self.check_new(expr, span, &fun_span, args, *ellipsis),
            Builtin::Make => self.check_make(expr, span, &fun_span, args, *ellipsis),
            Builtin::Len | Builtin::Cap => {
                self.check_len_cap(builtin, expr, span, &fun_span, args, *ellipsis)
            }
            Builtin::Append => self.check_append(expr, span, &fun_span, args, *ellipsis),
            Builtin::Copy => self.check_copy(expr, span, &fun_span, args, *ellipsis),
            Builtin::Delete => self.check_delete(expr, span, &fun_span, args, *ellipsis),
            Builtin::Panic => self.check_panic(expr, span, &fun_span, args, *ellipsis),
        }
    }

    fn builtin_node(
        &self,
        span: &Span,
        fun_span: &Span,
        builtin: Builtin,
        args: Vec<Checked>,
        types: Vec<ExprType>,
        constant: Option<Constant>,
        ellipsis: bool,
    ) -> Checked {
        Checked {
            span: span.clone(),
            types,
            constant,
            kind: CheckedKind::Call(Box::new(CallInfo {
                fun: Checked {
                    span: fun_span.clone(),
                    types: vec![],
                    constant: None,
                    kind: CheckedKind::Ident(builtin.name().to_string()),
                },
                args,
                builtin: Some(builtin),
                is_conversion: false,
                ellipsis,
                spread: false,
            })),
        }
    }

    /// Check arguments from `from` onward for their own errors without
    /// imposing any type requirement on them.
    fn fake_check_args(&mut self, args: &[Expr], from: usize) -> Vec<Checked> {
        args.iter()
            .enumerate()
            .map(|(i, a)| {
                if i >= from {
                    self.check(a)
                } else {
                    Checked::unchecked(a.span().clone())
                }
            })
            .collect()
    }

    fn builtin_arity(&mut self, builtin: Builtin, span: &Span, args: &[Expr], call: &str) {
        let first_arg = args.first().map(|a| self.snippet(a));
        self.emit(
            DiagnosticKind::BuiltinWrongNumberOfArgs {
                builtin: builtin.name().to_string(),
                num_args: args.len(),
                first_arg,
                call: call.to_string(),
            },
            span,
        );
    }

    fn builtin_ellipsis(&mut self, builtin: Builtin, span: &Span, ellipsis: bool) {
        if ellipsis {
            self.emit(
                DiagnosticKind::BuiltinInvalidEllipsis {
                    builtin: builtin.name().to_string(),
                },
                span,
            );
        }
    }

    fn builtin_wrong_arg(
        &mut self,
        builtin: Builtin,
        arg: &Expr,
        arg_type: &ExprType,
        expected: Option<Type>,
        call: &str,
    ) {
        self.emit(
            DiagnosticKind::BuiltinWrongArgType {
                builtin: builtin.name().to_string(),
                arg: self.snippet(arg),
                arg_type: arg_type.clone(),
                expected,
                call: call.to_string(),
            },
            arg.span(),
        );
    }

    /// Promote an untyped constant argument to `to`, keeping any truncation
    /// and overflow diagnostics.
    fn promote_builtin_const(&mut self, arg: &Expr, c: &Checked, to: &Type) -> Option<TypedValue> {
        let value = c.untyped_value()?.clone();
        let snippet = self.snippet(arg);
        let (tv, conv) = convert_const_to_typed(&value, to, false, &snippet, arg.span());
        for d in conv {
            self.diags.push(d);
        }
        tv
    }

    // -----------------------------------------------------------------------
    // complex, real, imag
    // -----------------------------------------------------------------------

    fn check_complex(
        &mut self,
        expr: &Expr,
        span: &Span,
        fun_span: &Span,
        args: &[Expr],
        ellipsis: bool,
    ) -> Checked {
        let b = Builtin::Complex;
        self.builtin_ellipsis(b, span, ellipsis);
        let call = self.snippet(expr);
        if args.len() != 2 {
            let checked = self.fake_check_args(args, 0);
            self.builtin_arity(b, span, args, &call);
            return self.builtin_node(span, fun_span, b, checked, vec![], None, ellipsis);
        }
        let x = self.check(&args[0]);
        let y = self.check(&args[1]);
        let xt = self.expect_single_type(&x, &args[0]);
        let yt = self.expect_single_type(&y, &args[1]);
        let (Some(xt), Some(yt)) = (xt, yt) else {
            return self.builtin_node(span, fun_span, b, vec![x, y], vec![], None, ellipsis);
        };

        let mut types = vec![];
        let mut constant = None;
        let mut mismatch = true;
        match (&xt, &yt) {
            (ExprType::Const(xk), ExprType::Const(yk)) => {
                if xk.is_numeric() && yk.is_numeric() {
                    types = vec![ExprType::Concrete(Type::Complex128)];
                    let xv = self.promote_builtin_const(&args[0], &x, &Type::Float64);
                    let yv = self.promote_builtin_const(&args[1], &y, &Type::Float64);
                    if let (Some(TypedValue::Float(re)), Some(TypedValue::Float(im))) = (xv, yv) {
                        constant = Some(Constant::Typed(
                            Type::Complex128,
                            TypedValue::Complex(re, im),
                        ));
                    }
                    mismatch = false;
                }
            }
            (ExprType::Const(xk), ExprType::Concrete(ct)) => {
                if ct.is_numeric() {
                    let tv = self.promote_builtin_const(&args[0], &x, ct);
                    if tv.is_none() && *xk == ConstKind::Nil {
                        // No mismatched-types error for nils
                        mismatch = false;
                    } else if let Some(TypedValue::Float(re)) = tv {
                        match ct {
                            Type::Float32 => {
                                types = vec![ExprType::Concrete(Type::Complex64)];
                                if let Some(im) = typed_float(&y) {
                                    constant = Some(Constant::Typed(
                                        Type::Complex64,
                                        TypedValue::Complex(re as f32 as f64, im as f32 as f64),
                                    ));
                                }
                                mismatch = false;
                            }
                            Type::Float64 => {
                                types = vec![ExprType::Concrete(Type::Complex128)];
                                if let Some(im) = typed_float(&y) {
                                    constant = Some(Constant::Typed(
                                        Type::Complex128,
                                        TypedValue::Complex(re, im),
                                    ));
                                }
                                mismatch = false;
                            }
                            _ => {}
                        }
                    }
                } else if *xk == ConstKind::Nil && ct.is_nillable() {
                    self.builtin_wrong_arg(b, &args[1], &yt, None, &call);
                    mismatch = false;
                }
            }
            (ExprType::Concrete(ct), ExprType::Const(yk)) => {
                if ct.is_numeric() {
                    let tv = self.promote_builtin_const(&args[1], &y, ct);
                    if tv.is_none() && *yk == ConstKind::Nil {
                        mismatch = false;
                    } else if let Some(TypedValue::Float(im)) = tv {
                        match ct {
                            Type::Float32 => {
                                types = vec![ExprType::Concrete(Type::Complex64)];
                                if let Some(re) = typed_float(&x) {
                                    constant = Some(Constant::Typed(
                                        Type::Complex64,
                                        TypedValue::Complex(re as f32 as f64, im as f32 as f64),
                                    ));
                                }
                                mismatch = false;
                            }
                            Type::Float64 => {
                                types = vec![ExprType::Concrete(Type::Complex128)];
                                if let Some(re) = typed_float(&x) {
                                    constant = Some(Constant::Typed(
                                        Type::Complex128,
                                        TypedValue::Complex(re, im),
                                    ));
                                }
                                mismatch = false;
                            }
                            _ => {}
                        }
                    }
                } else if *yk == ConstKind::Nil && ct.is_nillable() {
                    self.builtin_wrong_arg(b, &args[0], &xt, None, &call);
                    mismatch = false;
                }
            }
            (ExprType::Concrete(ct), ExprType::Concrete(dt)) if ct == dt => match ct {
                Type::Float32 => {
                    types = vec![ExprType::Concrete(Type::Complex64)];
                    if let (Some(re), Some(im)) = (typed_float(&x), typed_float(&y)) {
                        constant = Some(Constant::Typed(
                            Type::Complex64,
                            TypedValue::Complex(re as f32 as f64, im as f32 as f64),
                        ));
                    }
                    mismatch = false;
                }
                Type::Float64 => {
                    types = vec![ExprType::Concrete(Type::Complex128)];
                    if let (Some(re), Some(im)) = (typed_float(&x), typed_float(&y)) {
                        constant =
                            Some(Constant::Typed(Type::Complex128, TypedValue::Complex(re, im)));
                    }
                    mismatch = false;
                }
                _ => {}
            },
            _ => {}
        }
        if mismatch {
            if xt == yt {
                self.builtin_wrong_arg(b, &args[0], &xt, None, &call);
            } else {
                self.emit(
                    DiagnosticKind::BuiltinMismatchedArgs {
                        x: xt,
                        y: yt,
                        call: call.clone(),
                    },
                    span,
                );
            }
        }
        self.builtin_node(span, fun_span, b, vec![x, y], types, constant, ellipsis)
    }

    fn check_real_imag(
        &mut self,
        builtin: Builtin,
        expr: &Expr,
        span: &Span,
        fun_span: &Span,
        args: &[Expr],
        ellipsis: bool,
    ) -> Checked {
        let is_real = builtin == Builtin::Real;
        let mark = self.probe();
        self.builtin_ellipsis(builtin, span, ellipsis);
        let call = self.snippet(expr);
        if args.len() != 1 {
            let checked = self.fake_check_args(args, 0);
            self.builtin_arity(builtin, span, args, &call);
            return self.builtin_node(span, fun_span, builtin, checked, vec![], None, ellipsis);
        }
        let x = self.check(&args[0]);
        if self.erred_since(mark) && !x.is_const() {
            return self.builtin_node(span, fun_span, builtin, vec![x], vec![], None, ellipsis);
        }
        let Some(xt) = self.expect_single_type(&x, &args[0]) else {
            return self.builtin_node(span, fun_span, builtin, vec![x], vec![], None, ellipsis);
        };
        if matches!(xt, ExprType::Const(ConstKind::Nil)) {
            self.emit(DiagnosticKind::UntypedNil, args[0].span());
            return self.builtin_node(span, fun_span, builtin, vec![x], vec![], None, ellipsis);
        }

        let pick = |re: f64, im: f64| if is_real { re } else { im };
        match &xt {
            ExprType::Const(ConstKind::Complex) => {
                if let Some(ConstValue::Number(n)) = x.untyped_value() {
                    let (re, im) = n.to_complex();
                    let constant =
                        Some(Constant::Typed(Type::Float64, TypedValue::Float(pick(re, im))));
                    return self.builtin_node(
                        span,
                        fun_span,
                        builtin,
                        vec![x],
                        vec![ExprType::Concrete(Type::Float64)],
                        constant,
                        ellipsis,
                    );
                }
            }
            ExprType::Concrete(Type::Complex128) => {
                let constant = match &x.constant {
                    Some(Constant::Typed(_, TypedValue::Complex(re, im))) => Some(
                        Constant::Typed(Type::Float64, TypedValue::Float(pick(*re, *im))),
                    ),
                    _ => None,
                };
                return self.builtin_node(
                    span,
                    fun_span,
                    builtin,
                    vec![x],
                    vec![ExprType::Concrete(Type::Float64)],
                    constant,
                    ellipsis,
                );
            }
            ExprType::Concrete(Type::Complex64) => {
                let constant = match &x.constant {
                    Some(Constant::Typed(_, TypedValue::Complex(re, im))) => Some(
                        Constant::Typed(Type::Float32, TypedValue::Float(pick(*re, *im))),
                    ),
                    _ => None,
                };
                return self.builtin_node(
                    span,
                    fun_span,
                    builtin,
                    vec![x],
                    vec![ExprType::Concrete(Type::Float32)],
                    constant,
                    ellipsis,
                );
            }
            _ => {}
        }
        self.builtin_wrong_arg(builtin, &args[0], &xt, None, &call);
        self.builtin_node(span, fun_span, builtin, vec![x], vec![], None, ellipsis)
    }

    // -----------------------------------------------------------------------
    // new, make
    // -----------------------------------------------------------------------

    fn check_new(
        &mut self,
        expr: &Expr,
        span: &Span,
        fun_span: &Span,
        args: &[Expr],
        ellipsis: bool,
    ) -> Checked {
        let b = Builtin::New;
        self.builtin_ellipsis(b, span, ellipsis);
        let call = self.snippet(expr);
        if args.is_empty() {
            self.builtin_arity(b, span, args, &call);
            return self.builtin_node(span, fun_span, b, vec![], vec![], None, ellipsis);
        }
        if !self.expr_is_type(&args[0]) {
            let mark = self.probe();
            let x = self.check(&args[0]);
            let clean = !self.erred_since(mark);
            let mut checked = self.fake_check_args(args, 1);
            checked[0] = x;
            if clean {
                self.emit(
                    DiagnosticKind::BuiltinNonTypeArg {
                        expr: self.snippet(&args[0]),
                    },
                    args[0].span(),
                );
            }
            return self.builtin_node(span, fun_span, b, checked, vec![], None, ellipsis);
        }
        // Type-resolution errors are dropped when the arity is wrong anyway
        let (of, terrs) = self.capture(|c| c.resolve_type(&args[0]));
        if args.len() != 1 {
            let checked = self.fake_check_args(args, 1);
            self.builtin_arity(b, span, args, &call);
            return self.builtin_node(span, fun_span, b, checked, vec![], None, ellipsis);
        }
        if !terrs.is_empty() {
            for d in terrs {
                self.diags.push(d);
            }
            return self.builtin_node(span, fun_span, b, vec![], vec![], None, ellipsis);
        }
        let types = match &of {
            Some(t) => vec![ExprType::Concrete(Type::Ptr(Box::new(t.clone())))],
            None => vec![],
        };
        let arg0 = match of {
            Some(t) => Checked {
                span: args[0].span().clone(),
                types: vec![],
                constant: None,
                kind: CheckedKind::Type(t),
            },
            None => Checked::unchecked(args[0].span().clone()),
        };
        self.builtin_node(span, fun_span, b, vec![arg0], types, None, ellipsis)
    }

    fn check_make(
        &mut self,
        expr: &Expr,
        span: &Span,
        fun_span: &Span,
        args: &[Expr],
        ellipsis: bool,
    ) -> Checked {
        let b = Builtin::Make;
        let call = self.snippet(expr);
        if args.is_empty() {
            self.builtin_arity(b, span, args, &call);
            return self.builtin_node(span, fun_span, b, vec![], vec![], None, ellipsis);
        }
        if !self.expr_is_type(&args[0]) {
            let checked = self.fake_check_args(args, 0);
            self.emit(
                DiagnosticKind::BuiltinNonTypeArg {
                    expr: self.snippet(&args[0]),
                },
                args[0].span(),
            );
            return self.builtin_node(span, fun_span, b, checked, vec![], None, ellipsis);
        }
        let (of, terrs) = self.capture(|c| c.resolve_type(&args[0]));
        let Some(of) = of else {
            for d in terrs {
                self.diags.push(d);
            }
            let checked = self.fake_check_args(args, 1);
            return self.builtin_node(span, fun_span, b, checked, vec![], None, ellipsis);
        };
        for d in terrs {
            self.diags.push(d);
        }
        let types = vec![ExprType::Concrete(of.clone())];
        let mut checked = vec![Checked {
            span: args[0].span().clone(),
            types: vec![],
            constant: None,
            kind: CheckedKind::Type(of.clone()),
        }];

        let mut skip_ordering = false;
        let narg = match &of {
            Type::Slice(_) => {
                if args.len() == 1 {
                    self.builtin_arity(b, span, args, &call);
                }
                3
            }
            Type::Map { .. } | Type::Chan(_) => {
                skip_ordering = true;
                2
            }
            _ => {
                self.emit(DiagnosticKind::MakeBadType { of: of.clone() }, args[0].span());
                for c in self.fake_check_args(args, 1).into_iter().skip(1) {
                    checked.push(c);
                }
                return self.builtin_node(span, fun_span, b, checked, types, None, ellipsis);
            }
        };

        let mut sizes = [None::<i64>; 3];
        let mut i = 1;
        while i < narg && i < args.len() {
            let (c, value, ok) = self.check_make_size(&args[i]);
            if !ok {
                skip_ordering = true;
                self.emit(
                    DiagnosticKind::MakeNonIntegerArg {
                        which: i,
                        arg: self.snippet(&args[i]),
                    },
                    args[i].span(),
                );
            }
            sizes[i] = value;
            checked.push(c);
            i += 1;
        }
        if args.len() > narg {
            for c in self.fake_check_args(args, narg).into_iter().skip(narg) {
                checked.push(c);
            }
            self.builtin_arity(b, span, args, &call);
        } else if !skip_ordering {
            // Ordering is only judged when both sizes are known constants
            if let (Some(len), Some(cap)) = (sizes[1], sizes[2]) {
                if len > cap {
                    self.emit(
                        DiagnosticKind::MakeLenGtrThanCap {
                            length: len,
                            capacity: cap,
                            call: call.clone(),
                        },
                        span,
                    );
                }
            }
        }
        self.builtin_node(span, fun_span, b, checked, types, None, ellipsis)
    }

    /// Check one `make` size argument. `ok` is false when the argument is
    /// not integral at all; a known constant value is returned when folding
    /// produced one.
    fn check_make_size(&mut self, arg: &Expr) -> (Checked, Option<i64>, bool) {
        let c = self.check(arg);
        let Some(ty) = self.expect_single_type(&c, arg) else {
            return (c, None, true);
        };
        match &ty {
            ExprType::Const(_) => {
                let Some(value) = c.untyped_value().cloned() else {
                    return (c, None, false);
                };
                let snippet = self.snippet(arg);
                let (tv, conv) = convert_const_to_typed(&value, &Type::Int, false, &snippet, arg.span());
                match tv {
                    Some(TypedValue::Int(v)) => {
                        for d in conv {
                            self.diags.push(d);
                        }
                        (c, Some(v), true)
                    }
                    _ => (c, None, false),
                }
            }
            ExprType::Concrete(t) => {
                if t.is_integer() {
                    let value = match &c.constant {
                        Some(Constant::Typed(_, TypedValue::Int(v))) => Some(*v),
                        Some(Constant::Typed(_, TypedValue::Uint(v))) => i64::try_from(*v).ok(),
                        _ => None,
                    };
                    (c, value, true)
                } else {
                    (c, None, false)
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // len, cap
    // -----------------------------------------------------------------------

    fn check_len_cap(
        &mut self,
        builtin: Builtin,
        expr: &Expr,
        span: &Span,
        fun_span: &Span,
        args: &[Expr],
        ellipsis: bool,
    ) -> Checked {
        let is_len = builtin == Builtin::Len;
        let types = vec![ExprType::Concrete(Type::Int)];
        let mark = self.probe();
        self.builtin_ellipsis(builtin, span, ellipsis);
        let call = self.snippet(expr);
        if args.len() != 1 {
            let checked = self.fake_check_args(args, 0);
            self.builtin_arity(builtin, span, args, &call);
            return self.builtin_node(span, fun_span, builtin, checked, types, None, ellipsis);
        }
        let x = self.check(&args[0]);
        if self.erred_since(mark) && !x.is_const() {
            return self.builtin_node(span, fun_span, builtin, vec![x], types, None, ellipsis);
        }
        let Some(xt) = self.expect_single_type(&x, &args[0]) else {
            return self.builtin_node(span, fun_span, builtin, vec![x], types, None, ellipsis);
        };
        if matches!(xt, ExprType::Const(ConstKind::Nil)) {
            self.emit(DiagnosticKind::UntypedNil, args[0].span());
            return self.builtin_node(span, fun_span, builtin, vec![x], types, None, ellipsis);
        }

        let mut constant = None;
        let array_len = match &xt {
            ExprType::Concrete(Type::Array { len, .. }) => Some(*len),
            ExprType::Concrete(Type::Ptr(inner)) => match &**inner {
                Type::Array { len, .. } => Some(*len),
                _ => None,
            },
            _ => None,
        };
        match &xt {
            ExprType::Concrete(Type::Chan(_)) | ExprType::Concrete(Type::Slice(_)) => {}
            ExprType::Concrete(Type::Map { .. }) => {
                if !is_len {
                    self.builtin_wrong_arg(builtin, &args[0], &xt, None, &call);
                }
            }
            ExprType::Concrete(Type::Array { .. }) | ExprType::Concrete(Type::Ptr(_)) => {
                // len/cap of a pointer is only valid for pointer-to-array,
                // where it behaves as for the array itself
                if let Some(n) = array_len {
                    if !has_call_or_recv(&args[0]) {
                        constant =
                            Some(Constant::Typed(Type::Int, TypedValue::Int(n as i64)));
                    }
                }
            }
            ExprType::Concrete(Type::String) | ExprType::Const(ConstKind::String) => {
                if !is_len {
                    self.builtin_wrong_arg(builtin, &args[0], &xt, None, &call);
                } else {
                    let folded = match (&x.constant, x.untyped_value()) {
                        (_, Some(ConstValue::String(s))) => Some(s.len() as i64),
                        (Some(Constant::Typed(_, TypedValue::String(s))), _) => {
                            Some(s.len() as i64)
                        }
                        _ => None,
                    };
                    if let Some(n) = folded {
                        constant = Some(Constant::Typed(Type::Int, TypedValue::Int(n)));
                    }
                }
            }
            _ => {
                self.builtin_wrong_arg(builtin, &args[0], &xt, None, &call);
            }
        }
        self.builtin_node(span, fun_span, builtin, vec![x], types, constant, ellipsis)
    }

    // -----------------------------------------------------------------------
    // append, copy, delete, panic
    // -----------------------------------------------------------------------

    fn check_append(
        &mut self,
        expr: &Expr,
        span: &Span,
        fun_span: &Span,
        args: &[Expr],
        ellipsis: bool,
    ) -> Checked {
        let b = Builtin::Append;
        let call = self.snippet(expr);
        if args.is_empty() {
            self.builtin_arity(b, span, args, &call);
            return self.builtin_node(span, fun_span, b, vec![], vec![], None, ellipsis);
        }
        let mark = self.probe();
        let slice = self.check(&args[0]);
        let mut slice_t: Option<ExprType> = None;
        if !self.erred_since(mark) || slice.is_const() {
            let Some(st) = self.expect_single_type(&slice, &args[0]) else {
                let mut checked = self.fake_check_args(args, 1);
                checked[0] = slice;
                return self.builtin_node(span, fun_span, b, checked, vec![], None, ellipsis);
            };
            slice_t = Some(st);
        }
        let elem_t = match &slice_t {
            Some(ExprType::Concrete(Type::Slice(elem))) => Some((**elem).clone()),
            _ => None,
        };
        // The result type follows the first argument even when it is not a
        // slice; the not-a-slice diagnostic stands on its own
        let types = match &slice_t {
            Some(ExprType::Concrete(t)) => vec![ExprType::Concrete(t.clone())],
            _ => vec![],
        };
        let mut checked = vec![slice];

        if ellipsis {
            if args.len() == 1 {
                self.emit(DiagnosticKind::AppendFirstArgNotVariadic, args[0].span());
                return self.builtin_node(span, fun_span, b, checked, types, None, ellipsis);
            }
            if args.len() != 2 {
                for c in self.fake_check_args(args, 1).into_iter().skip(1) {
                    checked.push(c);
                }
                self.builtin_arity(b, span, args, &call);
                return self.builtin_node(span, fun_span, b, checked, types, None, ellipsis);
            }
            let mark1 = self.probe();
            let arg1 = self.check(&args[1]);
            if self.erred_since(mark1) && !arg1.is_const() {
                checked.push(arg1);
                return self.builtin_node(span, fun_span, b, checked, types, None, ellipsis);
            }
            if let Some(arg1_t) = self.expect_single_type(&arg1, &args[1]) {
                match &elem_t {
                    Some(_) => {
                        let st = match &slice_t {
                            Some(ExprType::Concrete(t)) => t.clone(),
                            _ => Type::Int,
                        };
                        let string_into_bytes = st == byte_slice()
                            && matches!(
                                arg1_t,
                                ExprType::Concrete(Type::String) | ExprType::Const(ConstKind::String)
                            );
                        let same = matches!(&arg1_t, ExprType::Concrete(t) if *t == st);
                        if !same && !string_into_bytes {
                            self.builtin_wrong_arg(b, &args[1], &arg1_t, Some(st), &call);
                        }
                    }
                    None => {
                        if let Some(st) = &slice_t {
                            self.emit(
                                DiagnosticKind::AppendFirstArgNotSlice { ty: st.clone() },
                                args[0].span(),
                            );
                        }
                    }
                }
            }
            checked.push(arg1);
            return self.builtin_node(span, fun_span, b, checked, types, None, ellipsis);
        }

        // Element form: single-value checks first, then per-element typing
        let mut skip = vec![false; args.len()];
        let mut rest: Vec<(Checked, Option<ExprType>)> = Vec::new();
        for (i, arg) in args.iter().enumerate().skip(1) {
            let mark_i = self.probe();
            let c = self.check(arg);
            if self.erred_since(mark_i) && !c.is_const() {
                skip[i] = true;
                rest.push((c, None));
                continue;
            }
            let t = self.expect_single_type(&c, arg);
            if t.is_none() {
                skip[i] = true;
            }
            rest.push((c, t));
        }
        match &elem_t {
            Some(elem) => {
                for (i, (c, t)) in rest.iter().enumerate() {
                    let arg = &args[i + 1];
                    if skip[i + 1] {
                        continue;
                    }
                    let Some(t) = t else { continue };
                    match t {
                        ExprType::Const(_) => {
                            if let Some(value) = c.untyped_value() {
                                let value = value.clone();
                                let snippet = self.snippet(arg);
                                let (tv, conv) = convert_const_to_typed(
                                    &value,
                                    elem,
                                    false,
                                    &snippet,
                                    arg.span(),
                                );
                                if tv.is_some() {
                                    for d in conv {
                                        self.diags.push(d);
                                    }
                                } else {
                                    self.builtin_wrong_arg(
                                        b,
                                        arg,
                                        t,
                                        Some(elem.clone()),
                                        &call,
                                    );
                                }
                            }
                        }
                        ExprType::Concrete(ct) => {
                            if ct != elem {
                                self.builtin_wrong_arg(b, arg, t, Some(elem.clone()), &call);
                            }
                        }
                    }
                }
            }
            None => {
                if let Some(st) = &slice_t {
                    self.emit(
                        DiagnosticKind::AppendFirstArgNotSlice { ty: st.clone() },
                        args[0].span(),
                    );
                }
            }
        }
        for (c, _) in rest {
            checked.push(c);
        }
        self.builtin_node(span, fun_span, b, checked, types, None, ellipsis)
    }

    fn check_copy(
        &mut self,
        expr: &Expr,
        span: &Span,
        fun_span: &Span,
        args: &[Expr],
        ellipsis: bool,
    ) -> Checked {
        let b = Builtin::Copy;
        let types = vec![ExprType::Concrete(Type::Int)];
        self.builtin_ellipsis(b, span, ellipsis);
        let call = self.snippet(expr);
        if args.len() != 2 {
            let checked = self.fake_check_args(args, 0);
            self.builtin_arity(b, span, args, &call);
            return self.builtin_node(span, fun_span, b, checked, types, None, ellipsis);
        }
        let mut side = |c: &mut Self, arg: &Expr| -> (Checked, Option<ExprType>) {
            let mark = c.probe();
            let x = c.check(arg);
            if c.erred_since(mark) && !x.is_const() {
                return (x, None);
            }
            let t = c.expect_single_type(&x, arg);
            (x, t)
        };
        let (x, xt) = side(self, &args[0]);
        let (y, yt) = side(self, &args[1]);
        if let (Some(xt), Some(yt)) = (&xt, &yt) {
            if matches!(xt, ExprType::Const(ConstKind::Nil)) {
                self.emit(DiagnosticKind::UntypedNil, args[0].span());
            }
            if matches!(yt, ExprType::Const(ConstKind::Nil)) {
                self.emit(DiagnosticKind::UntypedNil, args[1].span());
            }
            let x_elem = match xt {
                ExprType::Concrete(Type::Slice(e)) => Some((**e).clone()),
                _ => None,
            };
            let y_string = matches!(
                yt,
                ExprType::Concrete(Type::String) | ExprType::Const(ConstKind::String)
            );
            let y_elem = match yt {
                ExprType::Concrete(Type::Slice(e)) => Some((**e).clone()),
                _ => None,
            };
            if x_elem.is_none() || (y_elem.is_none() && !y_string) {
                self.emit(
                    DiagnosticKind::CopyArgsMustBeSlices {
                        x: xt.clone(),
                        y: yt.clone(),
                    },
                    span,
                );
            } else if y_string {
                let xt_concrete = match xt {
                    ExprType::Concrete(t) => t.clone(),
                    ExprType::Const(_) => Type::String,
                };
                if xt_concrete != byte_slice() {
                    self.emit(
                        DiagnosticKind::CopyArgsHaveDifferentEltTypes {
                            x: xt_concrete,
                            y: Type::String,
                        },
                        span,
                    );
                }
            } else if x_elem != y_elem {
                let concrete = |t: &ExprType| match t {
                    ExprType::Concrete(t) => t.clone(),
                    ExprType::Const(_) => Type::String,
                };
                self.emit(
                    DiagnosticKind::CopyArgsHaveDifferentEltTypes {
                        x: concrete(xt),
                        y: concrete(yt),
                    },
                    span,
                );
            }
        }
        self.builtin_node(span, fun_span, b, vec![x, y], types, None, ellipsis)
    }

    fn check_delete(
        &mut self,
        expr: &Expr,
        span: &Span,
        fun_span: &Span,
        args: &[Expr],
        ellipsis: bool,
    ) -> Checked {
        let b = Builtin::Delete;
        self.builtin_ellipsis(b, span, ellipsis);
        let call = self.snippet(expr);
        if args.len() != 2 {
            let checked = self.fake_check_args(args, 0);
            self.builtin_arity(b, span, args, &call);
            return self.builtin_node(span, fun_span, b, checked, vec![], None, ellipsis);
        }
        let mark = self.probe();
        let m = self.check(&args[0]);
        let map_t = if !self.erred_since(mark) || m.is_const() {
            self.expect_single_type(&m, &args[0])
        } else {
            None
        };
        let mark1 = self.probe();
        let key = self.check(&args[1]);
        let key_t = if !self.erred_since(mark1) || key.is_const() {
            self.expect_single_type(&key, &args[1])
        } else {
            None
        };

        if let Some(map_t) = &map_t {
            match map_t {
                ExprType::Concrete(Type::Map { key: kt, .. }) => {
                    if let Some(key_t) = &key_t {
                        let ok = match key_t {
                            ExprType::Const(_) => {
                                if let Some(value) = key.untyped_value() {
                                    let value = value.clone();
                                    let snippet = self.snippet(&args[1]);
                                    let (tv, conv) = convert_const_to_typed(
                                        &value,
                                        kt,
                                        false,
                                        &snippet,
                                        args[1].span(),
                                    );
                                    if tv.is_some() {
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
                            ExprType::Concrete(t) => t.assignable_to(kt),
                        };
                        if !ok {
                            self.builtin_wrong_arg(
                                b,
                                &args[1],
                                key_t,
                                Some((**kt).clone()),
                                &call,
                            );
                        }
                    }
                }
                _ => {
                    self.emit(
                        DiagnosticKind::DeleteFirstArgNotMap { ty: map_t.clone() },
                        args[0].span(),
                    );
                }
            }
        }
        self.builtin_node(span, fun_span, b, vec![m, key], vec![], None, ellipsis)
    }

    fn check_panic(
        &mut self,
        expr: &Expr,
        span: &Span,
        fun_span: &Span,
        args: &[Expr],
        ellipsis: bool,
    ) -> Checked {
        let b = Builtin::Panic;
        let mark = self.probe();
        self.builtin_ellipsis(b, span, ellipsis);
        let call = self.snippet(expr);
        if args.len() != 1 {
            let checked = self.fake_check_args(args, 0);
            self.builtin_arity(b, span, args, &call);
            return self.builtin_node(span, fun_span, b, checked, vec![], None, ellipsis);
        }
        let x = self.check(&args[0]);
        if !self.erred_since(mark) || x.is_const() {
            let _ = self.expect_single_type(&x, &args[0]);
        }
        self.builtin_node(span, fun_span, b, vec![x], vec![], None, ellipsis)
    }
}
