//! Call and conversion checking
//!
//! A call expression is one of three things: a builtin call (dispatched
//! before argument checking, since `new` and `make` take types as
//! arguments), a type conversion, or an ordinary function call. Argument
//! shape errors are judged after argument type errors, matching the
//! reference compiler's output order.

use crate::constant::convert_const_to_typed;
use crate::diagnostics::{DiagnosticKind, Span};
use crate::syntax::ast::Expr;
use crate::types::{ConstKind, ExprType, FuncType, Type};

use super::{Builtin, CallInfo, Checked, CheckedKind, Checker, Constant};

impl Checker<'_> {
    pub(crate) fn check_call(&mut self, expr: &Expr) -> Checked {
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

        // Builtins are named by unshadowed identifiers in call position
        if let Expr::Ident { name, .. } = &**fun {
            if self.env.lookup(name).is_none() {
                if let Some(builtin) = Builtin::from_name(name) {
                    return self.check_builtin_call(builtin, expr);
                }
            }
        }

        let checked_args: Vec<Checked> = args.iter().map(|a| self.check(a)).collect();

        if self.expr_is_type(fun) {
            match self.resolve_type(fun) {
                Some(to) => self.check_conversion(span, fun, args, checked_args, to, *ellipsis),
                None => Checked::unchecked(span.clone()),
            }
        } else {
            self.check_fun_call(span, fun, args, checked_args, *ellipsis)
        }
    }

    // -----------------------------------------------------------------------
    // Conversions
    // -----------------------------------------------------------------------

    fn check_conversion(
        &mut self,
        span: &Span,
        fun: &Expr,
        args: &[Expr],
        checked_args: Vec<Checked>,
        to: Type,
        ellipsis: bool,
    ) -> Checked {
        let mut result = Checked {
            span: span.clone(),
            types: vec![ExprType::Concrete(to.clone())],
            constant: None,
            kind: CheckedKind::Call(Box::new(CallInfo {
                fun: Checked {
                    span: fun.span().clone(),
                    types: vec![],
                    constant: None,
                    kind: CheckedKind::Type(to.clone()),
                },
                args: checked_args.clone(),
                builtin: None,
                is_conversion: true,
                ellipsis,
                spread: false,
            })),
        };

        if args.len() != 1 {
            self.emit(
                DiagnosticKind::WrongNumberOfArgs {
                    num_args: args.len(),
                    conversion: Some(to),
                    fun: self.snippet(fun),
                    not_enough: args.is_empty(),
                },
                span,
            );
            return result;
        }

        let arg = &args[0];
        let checked = &checked_args[0];
        let Some(from) = self.expect_single_type(checked, arg) else {
            return result;
        };

        match &from {
            ExprType::Const(kind) => {
                let Some(value) = checked.untyped_value() else {
                    return result;
                };
                let snippet = self.snippet(arg);
                let (tv, conv) = convert_const_to_typed(value, &to, true, &snippet, arg.span());
                let failed =
                    matches!(conv.first().map(|d| &d.kind), Some(DiagnosticKind::BadConstConversion { .. }));
                for d in conv {
                    self.diags.push(d);
                }
                if *kind != ConstKind::Nil {
                    // A failed constant conversion produces both messages
                    if failed {
                        self.emit(
                            DiagnosticKind::BadConversion {
                                expr: snippet,
                                from: kind.default_promotion().unwrap_or(Type::Int),
                                to: to.clone(),
                            },
                            arg.span(),
                        );
                    } else if let Some(tv) = tv {
                        result.constant = Some(Constant::Typed(to, tv));
                    }
                }
                result
            }
            ExprType::Concrete(from_t) => {
                if !from_t.convertible_to(&to) {
                    self.emit(
                        DiagnosticKind::BadConversion {
                            expr: self.snippet(arg),
                            from: from_t.clone(),
                            to,
                        },
                        arg.span(),
                    );
                }
                result
            }
        }
    }

    // -----------------------------------------------------------------------
    // Ordinary calls
    // -----------------------------------------------------------------------

    fn check_fun_call(
        &mut self,
        span: &Span,
        fun: &Expr,
        args: &[Expr],
        checked_args: Vec<Checked>,
        ellipsis: bool,
    ) -> Checked {
        let mark = self.probe();
        let f = self.check(fun);
        if self.erred_since(mark) && !f.is_const() {
            return Checked::unchecked(span.clone());
        }
        let Some(ftype) = self.expect_single_type(&f, fun) else {
            return Checked::unchecked(span.clone());
        };
        if matches!(ftype, ExprType::Const(ConstKind::Nil)) {
            self.emit(DiagnosticKind::UntypedNil, fun.span());
            return Checked::unchecked(span.clone());
        }
        let sig = match &ftype {
            ExprType::Concrete(Type::Func(sig)) => sig.clone(),
            _ => {
                self.emit(
                    DiagnosticKind::CallNonFuncType {
                        fun: self.snippet(fun),
                        ty: ftype,
                    },
                    fun.span(),
                );
                return Checked::unchecked(span.clone());
            }
        };

        let num_in = sig.params.len();
        let fun_snippet = self.snippet(fun);
        let results: Vec<ExprType> = sig
            .results
            .iter()
            .cloned()
            .map(ExprType::Concrete)
            .collect();

        // f(g()) spreading a multi-valued call across the parameters
        let spread = args.len() == 1
            && checked_args[0].types.len() > 1
            && matches!(args[0].strip_parens(), Expr::Call { .. });

        let mk = |args: Vec<Checked>, spread: bool| Checked {
            span: span.clone(),
            types: results.clone(),
            constant: None,
            kind: CheckedKind::Call(Box::new(CallInfo {
                fun: f.clone(),
                args,
                builtin: None,
                is_conversion: false,
                ellipsis,
                spread,
            })),
        };

        if args.is_empty() {
            if !(num_in == 0 || (sig.variadic && num_in == 1)) {
                self.emit(
                    DiagnosticKind::WrongNumberOfArgs {
                        num_args: 0,
                        conversion: None,
                        fun: fun_snippet,
                        not_enough: true,
                    },
                    span,
                );
            }
            return mk(checked_args, false);
        }

        if spread {
            let arg0_types = checked_args[0].types.clone();
            let n = arg0_types.len();
            let mut i = 0;
            while i < n && i < num_in.saturating_sub(1) {
                self.check_spread_arg(&args[0], &arg0_types[i], &sig.params[i], &fun_snippet, i);
                i += 1;
            }
            let last = if !sig.variadic {
                if n != num_in {
                    self.emit(
                        DiagnosticKind::WrongNumberOfArgs {
                            num_args: n,
                            conversion: None,
                            fun: fun_snippet,
                            not_enough: n < num_in,
                        },
                        span,
                    );
                    return mk(checked_args, true);
                }
                sig.params[num_in - 1].clone()
            } else {
                if n < num_in.saturating_sub(1) {
                    self.emit(
                        DiagnosticKind::WrongNumberOfArgs {
                            num_args: n,
                            conversion: None,
                            fun: fun_snippet,
                            not_enough: true,
                        },
                        span,
                    );
                    return mk(checked_args, true);
                }
                variadic_elem(&sig)
            };
            while i < n {
                self.check_spread_arg(&args[0], &arg0_types[i], &last, &fun_snippet, i);
                i += 1;
            }
            return mk(checked_args, true);
        }

        // Single-value requirement first, then types, arity last
        let mut skip = vec![false; args.len()];
        let mut arg_types: Vec<Option<ExprType>> = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let t = self.expect_single_type(&checked_args[i], arg);
            if t.is_none() {
                skip[i] = true;
            }
            arg_types.push(t);
        }

        let mut i = 0;
        while i < args.len() && i < num_in.saturating_sub(1) {
            if !skip[i] {
                self.check_call_arg(
                    &args[i],
                    &checked_args[i],
                    arg_types[i].as_ref(),
                    &sig.params[i],
                    &fun_snippet,
                    i,
                );
            }
            i += 1;
        }

        let last_t = if !sig.variadic || ellipsis {
            if args.len() != num_in {
                self.emit(
                    DiagnosticKind::WrongNumberOfArgs {
                        num_args: args.len(),
                        conversion: None,
                        fun: fun_snippet,
                        not_enough: args.len() < num_in,
                    },
                    span,
                );
                return mk(checked_args, false);
            }
            sig.params[num_in - 1].clone()
        } else {
            if args.len() < num_in.saturating_sub(1) {
                self.emit(
                    DiagnosticKind::WrongNumberOfArgs {
                        num_args: args.len(),
                        conversion: None,
                        fun: fun_snippet,
                        not_enough: true,
                    },
                    span,
                );
                return mk(checked_args, false);
            } else if args.len() == num_in.saturating_sub(1) {
                // Variadic call with the variadic slot empty
                return mk(checked_args, false);
            }
            variadic_elem(&sig)
        };

        while i < args.len() {
            if !skip[i] {
                self.check_call_arg(
                    &args[i],
                    &checked_args[i],
                    arg_types[i].as_ref(),
                    &last_t,
                    &fun_snippet,
                    i,
                );
            }
            i += 1;
        }

        if !sig.variadic && ellipsis {
            self.emit(
                DiagnosticKind::InvalidEllipsis { fun: fun_snippet.clone() },
                span,
            );
        }

        mk(checked_args, false)
    }

    fn check_spread_arg(
        &mut self,
        arg0: &Expr,
        actual: &ExprType,
        expected: &Type,
        fun_snippet: &str,
        pos: usize,
    ) {
        let ok = match actual {
            ExprType::Concrete(t) => t.assignable_to(expected),
            ExprType::Const(_) => false,
        };
        if !ok {
            self.emit(
                DiagnosticKind::WrongArgType {
                    arg: self.snippet(arg0),
                    actual: actual.clone(),
                    expected: expected.clone(),
                    fun: fun_snippet.to_string(),
                    arg_pos: pos,
                    spread: true,
                },
                arg0.span(),
            );
        }
    }

    fn check_call_arg(
        &mut self,
        arg: &Expr,
        checked: &Checked,
        ty: Option<&ExprType>,
        expected: &Type,
        fun_snippet: &str,
        pos: usize,
    ) {
        let Some(ty) = ty else { return };
        match ty {
            ExprType::Const(_) => {
                let Some(value) = checked.untyped_value() else {
                    return;
                };
                let value = value.clone();
                let snippet = self.snippet(arg);
                let (tv, conv) =
                    convert_const_to_typed(&value, expected, false, &snippet, arg.span());
                if tv.is_some() {
                    for d in conv {
                        self.diags.push(d);
                    }
                } else {
                    self.emit(
                        DiagnosticKind::WrongArgType {
                            arg: snippet,
                            actual: ty.clone(),
                            expected: expected.clone(),
                            fun: fun_snippet.to_string(),
                            arg_pos: pos,
                            spread: false,
                        },
                        arg.span(),
                    );
                }
            }
            ExprType::Concrete(t) => {
                if !t.assignable_to(expected) {
                    self.emit(
                        DiagnosticKind::WrongArgType {
                            arg: self.snippet(arg),
                            actual: ty.clone(),
                            expected: expected.clone(),
                            fun: fun_snippet.to_string(),
                            arg_pos: pos,
                            spread: false,
                        },
                        arg.span(),
                    );
                }
            }
        }
    }

}

fn variadic_elem(sig: &FuncType) -> Type {
    match sig.params.last() {
        Some(Type::Slice(elem)) => (**elem).clone(),
        Some(other) => other.clone(),
        None => Type::Int,
    }
}
