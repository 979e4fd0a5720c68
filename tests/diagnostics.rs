//! End-to-end tests of the public API surface
//!
//! These exercise checking through the prelude, the JSON wire format of
//! diagnostics, and serde round-trips of the syntax tree.

use pretty_assertions::assert_eq;
use tycho::prelude::*;

fn sp() -> Span {
    Span::file("input.go")
}

fn ident(name: &str) -> Expr {
    Expr::Ident {
        id: NodeId::new(),
        span: sp(),
        name: name.to_string(),
    }
}

fn int(text: &str) -> Expr {
    Expr::BasicLit {
        id: NodeId::new(),
        span: sp(),
        kind: LitKind::Int,
        text: text.to_string(),
    }
}

#[test]
fn check_reports_structured_diagnostics() {
    let expr = Expr::Binary {
        id: NodeId::new(),
        span: sp(),
        op: BinaryOp::Add,
        lhs: Box::new(ident("missing")),
        rhs: Box::new(int("1")),
    };
    let (checked, bag) = check_expr(&expr, &Env::new(), &Ctx::default());
    assert!(checked.types.is_empty());
    assert_eq!(bag.error_count(), 1);

    let parsed: serde_json::Value = serde_json::from_str(&bag.to_json()).unwrap();
    assert_eq!(parsed[0]["code"], "E1408");
    assert_eq!(parsed[0]["message"], "undefined: missing");
    assert_eq!(parsed[0]["severity"], "error");

    let text = bag.format_text();
    assert!(text.starts_with("error[E1408]: undefined: missing"));
    assert!(text.contains("input.go"));
}

#[test]
fn diagnostics_round_trip_through_serde() {
    let (_, bag) = check_expr(&ident("missing"), &Env::new(), &Ctx::default());
    let diags = bag.take();
    let json = serde_json::to_string(&diags).unwrap();
    let back: Vec<Diagnostic> = serde_json::from_str(&json).unwrap();
    assert_eq!(diags, back);
}

#[test]
fn syntax_tree_round_trips_through_serde() {
    let expr = Expr::Call {
        id: NodeId::new(),
        span: sp(),
        fun: Box::new(ident("f")),
        args: vec![int("1"), ident("x")],
        ellipsis: false,
    };
    let before = serde_json::to_value(&expr).unwrap();
    assert_eq!(before["type"], "Call");

    let back: Expr = serde_json::from_value(before.clone()).unwrap();
    let after = serde_json::to_value(&back).unwrap();
    assert_eq!(before, after);
}

#[test]
fn checking_is_pure() {
    // The same expression checked twice against the same environment
    // produces identical output
    let mut env = Env::new();
    env.define_var("x", Type::Int);
    let expr = Expr::Binary {
        id: NodeId::new(),
        span: sp(),
        op: BinaryOp::Mul,
        lhs: Box::new(ident("x")),
        rhs: Box::new(int("3")),
    };
    let ctx = Ctx::default();
    let (a, bag_a) = check_expr(&expr, &env, &ctx);
    let (b, bag_b) = check_expr(&expr, &env, &ctx);
    assert_eq!(a, b);
    assert_eq!(bag_a, bag_b);
}
