//! Composite-literal checking
//!
//! The literal's type comes from its explicit prefix or from the enclosing
//! literal's element type, so nested literals may elide their types. Each of
//! the three container shapes (map, array/slice, struct) has its own keying
//! regime; value-site failures deliberately reproduce the reference
//! compiler's diagnostic suppression quirks.

use std::collections::HashSet;

use num_traits::ToPrimitive;

use crate::constant::{convert_const_to_typed, ConstValue, TypedValue};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Span};
use crate::syntax::ast::Expr;
use crate::types::{ConstKind, ExprType, StructType, Type};

use super::{Checked, CheckedKind, Checker, CompositeInfo, Constant};

impl Checker<'_> {
    pub(crate) fn check_composite_lit(&mut self, expr: &Expr, hint: Option<&Type>) -> Checked {
        let Expr::Composite { span, ty, elts, .. } = expr else {
            return Checked::unchecked(expr.span().clone());
        };
        let t = match ty {
            Some(te) => match self.check_type_expr(te) {
                Some(t) => t,
                None => return Checked::unchecked(span.clone()),
            },
            None => match hint {
                Some(t) => t.clone(),
                None => {
                    self.emit(DiagnosticKind::MissingCompositeLitType, span);
                    return Checked::unchecked(span.clone());
                }
            },
        };
        match t.clone() {
            Type::Map { key, elem } => self.check_map_lit(span, elts, t, &key, &elem),
            Type::Array { len, elem } => self.check_array_lit(span, elts, t, &elem, Some(len)),
            Type::Slice(elem) => self.check_array_lit(span, elts, t, &elem, None),
            Type::Struct(s) => self.check_struct_lit(span, elts, t, &s),
            other => {
                self.emit(DiagnosticKind::InvalidCompositeLitType { ty: other }, span);
                let checked = elts.iter().map(|e| self.check(e)).collect();
                self.composite_node(span, t, checked)
            }
        }
    }

    fn composite_node(&self, span: &Span, t: Type, elts: Vec<Checked>) -> Checked {
        Checked {
            span: span.clone(),
            types: vec![ExprType::Concrete(t.clone())],
            constant: None,
            kind: CheckedKind::Composite(CompositeInfo { ty: Some(t), elts }),
        }
    }

    // -----------------------------------------------------------------------
    // Maps
    // -----------------------------------------------------------------------

    fn check_map_lit(
        &mut self,
        span: &Span,
        elts: &[Expr],
        t: Type,
        key_t: &Type,
        elem_t: &Type,
    ) -> Checked {
        // Duplicate interface{} keys are not reported; gc bug, golang issue 7214
        let mut seen: Option<HashSet<String>> = if matches!(key_t, Type::Interface(_)) {
            None
        } else {
            Some(HashSet::with_capacity(elts.len()))
        };
        let mut checked = Vec::with_capacity(elts.len());

        for elt in elts {
            let Expr::KeyValue { key, value, span: kv_span, .. } = elt else {
                let c = self.check(elt);
                self.emit(DiagnosticKind::MissingMapKey, elt.span());
                checked.push(c);
                continue;
            };
            let (k, ok, captured) = self.check_assignable_to(key, key_t);
            if ok {
                for d in captured {
                    self.diags.push(d);
                }
            } else if let Some(kt) = k.single_type() {
                self.emit(
                    DiagnosticKind::BadMapKey {
                        key: self.snippet(key),
                        ty: kt.clone(),
                        key_type: key_t.clone(),
                    },
                    key.span(),
                );
            } else {
                for d in captured {
                    self.diags.push(d);
                }
            }

            if let Some(seen) = seen.as_mut() {
                if let Some(repr) = k.constant.as_ref().and_then(const_key_repr) {
                    if !seen.insert(repr) {
                        self.emit(
                            DiagnosticKind::DuplicateMapKey { key: self.snippet(key) },
                            key.span(),
                        );
                    }
                }
            }

            let v = self.check_map_value(value, elem_t);
            checked.push(Checked {
                span: kv_span.clone(),
                types: vec![],
                constant: None,
                kind: CheckedKind::KeyValue {
                    key: Box::new(k),
                    value: Box::new(v),
                },
            });
        }
        self.composite_node(span, t, checked)
    }

    fn check_map_value(&mut self, expr: &Expr, elem_t: &Type) -> Checked {
        self.check_container_value(expr, elem_t, true)
    }

    fn check_array_value(&mut self, expr: &Expr, elem_t: &Type) -> Checked {
        self.check_container_value(expr, elem_t, false)
    }

    /// Shared value path for map and array/slice literals, including the
    /// reference compiler's suppression of non-string, non-nil constant
    /// conversion messages.
    fn check_container_value(&mut self, expr: &Expr, elem_t: &Type, in_map: bool) -> Checked {
        if composite_elem(elem_t) && matches!(expr, Expr::Composite { .. }) {
            return self.check_composite_lit(expr, Some(elem_t));
        }
        let (c, ok, captured) = self.check_assignable_to(expr, elem_t);
        if ok {
            for d in captured {
                self.diags.push(d);
            }
            return c;
        }
        match captured.first().map(|d| &d.kind) {
            Some(DiagnosticKind::BadConstConversion { from, .. })
                if *from == ExprType::Const(ConstKind::Nil) =>
            {
                // The nil conversion error stands alone
                for d in captured {
                    self.diags.push(d);
                }
                return c;
            }
            Some(DiagnosticKind::BadConstConversion { from, .. })
                if *from != ExprType::Const(ConstKind::String) =>
            {
                // Suppressed; only the container-value error is shown
            }
            _ => {
                for d in captured {
                    self.diags.push(d);
                }
            }
        }
        if let Some(ty) = c.single_type() {
            let kind = if in_map {
                DiagnosticKind::BadMapValue {
                    value: self.snippet(expr),
                    ty: ty.clone(),
                    elem: elem_t.clone(),
                }
            } else {
                DiagnosticKind::BadArrayValue {
                    value: self.snippet(expr),
                    ty: ty.clone(),
                    elem: elem_t.clone(),
                }
            };
            self.emit(kind, expr.span());
        }
        c
    }

    // -----------------------------------------------------------------------
    // Arrays and slices
    // -----------------------------------------------------------------------

    fn check_array_lit(
        &mut self,
        span: &Span,
        elts: &[Expr],
        t: Type,
        elem_t: &Type,
        length: Option<usize>,
    ) -> Checked {
        let mut max_index: i64 = -1;
        let mut cur_index: i64 = 0;
        let mut out_of_bounds = false;
        let mut used: HashSet<i64> = HashSet::with_capacity(elts.len());
        let mut checked = Vec::with_capacity(elts.len());

        for elt in elts {
            let (value_expr, key_part) = match elt {
                Expr::KeyValue { key, value, span: kv_span, .. } => {
                    (&**value, Some((&**key, kv_span)))
                }
                _ => (elt, None),
            };
            let mut bad_key = false;
            let mut k_checked = None;
            if let Some((key, _)) = key_part {
                let (k, index, kept) = self.check_array_index(key);
                k_checked = Some(k);
                match index {
                    Some(i) => cur_index = i,
                    None => {
                        // Only undefined-identifier errors survive from a bad key
                        for d in kept {
                            self.diags.push(d);
                        }
                        self.emit(DiagnosticKind::BadArrayKey, key.span());
                        // Exclude this element from index bookkeeping
                        cur_index -= 1;
                        bad_key = true;
                    }
                }
            }
            if !bad_key {
                if max_index < cur_index {
                    max_index = cur_index;
                }
                if let Some(len) = length {
                    if !out_of_bounds && cur_index >= len as i64 {
                        out_of_bounds = true;
                        self.emit(
                            DiagnosticKind::ArrayKeyOutOfBounds {
                                index: cur_index,
                                length: len,
                            },
                            elt.span(),
                        );
                    }
                }
                if !used.insert(cur_index) {
                    let at = key_part.map(|(k, _)| k.span()).unwrap_or_else(|| elt.span());
                    self.emit(DiagnosticKind::DuplicateArrayKey { index: cur_index }, at);
                }
            }

            let v = self.check_array_value(value_expr, elem_t);
            match (k_checked, key_part) {
                (Some(k), Some((_, kv_span))) => checked.push(Checked {
                    span: kv_span.clone(),
                    types: vec![],
                    constant: None,
                    kind: CheckedKind::KeyValue {
                        key: Box::new(k),
                        value: Box::new(v),
                    },
                }),
                _ => checked.push(v),
            }
            cur_index += 1;
        }
        self.composite_node(span, t, checked)
    }

    /// An array literal key must be a non-negative integer constant. Returns
    /// the sub-diagnostics for the caller to filter.
    fn check_array_index(&mut self, key: &Expr) -> (Checked, Option<i64>, Vec<Diagnostic>) {
        let (c, captured) = self.capture(|ch| ch.check(key));
        let value = match &c.constant {
            Some(Constant::Untyped(ConstValue::Number(n))) if n.is_integer() => {
                let (v, _) = n.to_bigint();
                v.to_i64()
            }
            Some(Constant::Typed(t, tv)) if t.is_integer() => match tv {
                TypedValue::Int(v) => Some(*v),
                TypedValue::Uint(v) => i64::try_from(*v).ok(),
                _ => None,
            },
            _ => None,
        };
        let index = value.filter(|v| *v >= 0);
        if index.is_some() && captured.is_empty() {
            (c, index, vec![])
        } else {
            let kept = captured
                .into_iter()
                .filter(|d| matches!(d.kind, DiagnosticKind::Undefined { .. }))
                .collect();
            (c, None, kept)
        }
    }

    // -----------------------------------------------------------------------
    // Structs
    // -----------------------------------------------------------------------

    fn check_struct_lit(
        &mut self,
        span: &Span,
        elts: &[Expr],
        t: Type,
        s: &StructType,
    ) -> Checked {
        // An empty literal takes every field's zero value and is always valid
        if elts.is_empty() {
            return self.composite_node(span, t, vec![]);
        }
        let keys_present = elts
            .iter()
            .any(|e| matches!(e, Expr::KeyValue { .. }));
        let mut checked = Vec::with_capacity(elts.len());

        if keys_present {
            let mut seen: HashSet<String> = HashSet::with_capacity(elts.len());
            let mut mixed = false;
            for elt in elts {
                let Expr::KeyValue { key, value, span: kv_span, .. } = elt else {
                    if !mixed {
                        // Reported once for the whole literal
                        mixed = true;
                        self.emit(DiagnosticKind::MixedStructValues, elt.span());
                    }
                    checked.push(Checked::unchecked(elt.span().clone()));
                    continue;
                };
                let Expr::Ident { name, .. } = &**key else {
                    self.emit(
                        DiagnosticKind::InvalidStructField { key: self.snippet(key) },
                        key.span(),
                    );
                    checked.push(Checked::unchecked(elt.span().clone()));
                    continue;
                };
                let Some(field) = s.fields.iter().find(|f| f.name == *name) else {
                    self.emit(
                        DiagnosticKind::UnknownStructField {
                            struct_type: t.clone(),
                            field: name.clone(),
                        },
                        key.span(),
                    );
                    checked.push(Checked::unchecked(elt.span().clone()));
                    continue;
                };
                if !seen.insert(name.clone()) {
                    self.emit(
                        DiagnosticKind::DuplicateStructField { field: name.clone() },
                        key.span(),
                    );
                }
                let field_ty = field.ty.clone();
                let v = self.check_struct_field(value, &field_ty);
                checked.push(Checked {
                    span: kv_span.clone(),
                    types: vec![],
                    constant: None,
                    kind: CheckedKind::KeyValue {
                        key: Box::new(Checked::of(
                            key.span().clone(),
                            ExprType::Concrete(field_ty),
                            CheckedKind::Ident(name.clone()),
                        )),
                        value: Box::new(v),
                    },
                });
            }
        } else {
            let num_fields = s.fields.len();
            let mut i = 0;
            while i < num_fields && i < elts.len() {
                let field_ty = s.fields[i].ty.clone();
                checked.push(self.check_struct_field(&elts[i], &field_ty));
                i += 1;
            }
            if num_fields != elts.len() {
                self.emit(
                    DiagnosticKind::WrongNumberOfStructValues {
                        actual: elts.len(),
                        expected: num_fields,
                    },
                    span,
                );
            }
            // Surplus values are still checked for their own errors
            while i < elts.len() {
                checked.push(self.check(&elts[i]));
                i += 1;
            }
        }
        self.composite_node(span, t, checked)
    }

    fn check_struct_field(&mut self, expr: &Expr, field_ty: &Type) -> Checked {
        let (c, ok, captured) = self.check_assignable_to(expr, field_ty);
        if ok {
            for d in captured {
                self.diags.push(d);
            }
        } else if let Some(ty) = c.single_type() {
            // Replaces whatever the assignability check produced
            self.emit(
                DiagnosticKind::BadStructValue {
                    value: self.snippet(expr),
                    ty: ty.clone(),
                    field_type: field_ty.clone(),
                },
                expr.span(),
            );
        } else {
            for d in captured {
                self.diags.push(d);
            }
        }
        c
    }
}

/// Element types whose literal values may elide their own type prefix
fn composite_elem(t: &Type) -> bool {
    matches!(
        t,
        Type::Array { .. } | Type::Slice(_) | Type::Map { .. } | Type::Struct(_)
    )
}

/// Rendered identity of a constant map key after default promotion. Two keys
/// collide only when both their promoted type and value agree, mirroring
/// interface boxing in the reference implementation.
fn const_key_repr(constant: &Constant) -> Option<String> {
    match constant {
        Constant::Typed(t, tv) => Some(format!("{}|{:?}", t, tv)),
        Constant::Untyped(v) => {
            let kind = v.kind();
            if kind == ConstKind::Nil {
                return Some("nil".to_string());
            }
            let to = kind.default_promotion()?;
            let span = Span::file("");
            let (tv, _) = convert_const_to_typed(v, &to, false, "", &span);
            tv.map(|tv| format!("{}|{:?}", to, tv))
        }
    }
}
