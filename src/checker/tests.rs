use num_bigint::BigInt;
use pretty_assertions::assert_eq;

use crate::constant::{ConstNumber, ConstValue, TypedValue};
use crate::diagnostics::{Diagnostic, Span};
use crate::env::Env;
use crate::syntax::ast::{BinaryOp, Expr, LitKind, NodeId, TypeExpr, UnaryOp};
use crate::types::{
    ConstKind, ExprType, Field, FuncType, InterfaceType, Method, StructType, Type,
};

use super::{check_expr, check_expr_strict, Checked, CheckedKind, Constant, Ctx};

// ---------------------------------------------------------------------------
// Expression builders
// ---------------------------------------------------------------------------

fn sp() -> Span {
    Span::file("test")
}

fn lit(kind: LitKind, text: &str) -> Expr {
    Expr::BasicLit {
        id: NodeId::new(),
        span: sp(),
        kind,
        text: text.to_string(),
    }
}

fn int(text: &str) -> Expr {
    lit(LitKind::Int, text)
}

fn float(text: &str) -> Expr {
    lit(LitKind::Float, text)
}

fn imag(text: &str) -> Expr {
    lit(LitKind::Imag, text)
}

fn rune(text: &str) -> Expr {
    lit(LitKind::Rune, text)
}

fn string_lit(inner: &str) -> Expr {
    lit(LitKind::String, &format!("\"{}\"", inner))
}

fn ident(name: &str) -> Expr {
    Expr::Ident {
        id: NodeId::new(),
        span: sp(),
        name: name.to_string(),
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        id: NodeId::new(),
        span: sp(),
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        id: NodeId::new(),
        span: sp(),
        op,
        operand: Box::new(operand),
    }
}

fn call(fun: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call {
        id: NodeId::new(),
        span: sp(),
        fun: Box::new(fun),
        args,
        ellipsis: false,
    }
}

fn vcall(fun: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call {
        id: NodeId::new(),
        span: sp(),
        fun: Box::new(fun),
        args,
        ellipsis: true,
    }
}

fn kv(key: Expr, value: Expr) -> Expr {
    Expr::KeyValue {
        id: NodeId::new(),
        span: sp(),
        key: Box::new(key),
        value: Box::new(value),
    }
}

fn composite(ty: Option<TypeExpr>, elts: Vec<Expr>) -> Expr {
    Expr::Composite {
        id: NodeId::new(),
        span: sp(),
        ty,
        elts,
    }
}

fn index(base: Expr, idx: Expr) -> Expr {
    Expr::Index {
        id: NodeId::new(),
        span: sp(),
        base: Box::new(base),
        index: Box::new(idx),
    }
}

fn selector(base: Expr, field: &str) -> Expr {
    Expr::Selector {
        id: NodeId::new(),
        span: sp(),
        base: Box::new(base),
        field: field.to_string(),
    }
}

fn star(operand: Expr) -> Expr {
    Expr::Star {
        id: NodeId::new(),
        span: sp(),
        operand: Box::new(operand),
    }
}

fn assert_to(base: Expr, ty: TypeExpr) -> Expr {
    Expr::TypeAssert {
        id: NodeId::new(),
        span: sp(),
        base: Box::new(base),
        ty,
    }
}

fn named(name: &str) -> TypeExpr {
    TypeExpr::Named {
        id: NodeId::new(),
        span: sp(),
        name: name.to_string(),
    }
}

fn slice_of(elem: TypeExpr) -> TypeExpr {
    TypeExpr::Slice {
        id: NodeId::new(),
        span: sp(),
        elem: Box::new(elem),
    }
}

fn array_of(len: Expr, elem: TypeExpr) -> TypeExpr {
    TypeExpr::Array {
        id: NodeId::new(),
        span: sp(),
        len: Box::new(len),
        elem: Box::new(elem),
    }
}

fn map_of(key: TypeExpr, elem: TypeExpr) -> TypeExpr {
    TypeExpr::Map {
        id: NodeId::new(),
        span: sp(),
        key: Box::new(key),
        elem: Box::new(elem),
    }
}

fn tylit(ty: TypeExpr) -> Expr {
    Expr::TypeLit {
        id: NodeId::new(),
        span: sp(),
        ty,
    }
}

// ---------------------------------------------------------------------------
// Checking helpers
// ---------------------------------------------------------------------------

fn check_in(env: &Env, expr: &Expr) -> (Checked, Vec<Diagnostic>) {
    let (checked, bag) = check_expr(expr, env, &Ctx::default());
    (checked, bag.take())
}

fn check(expr: &Expr) -> (Checked, Vec<Diagnostic>) {
    check_in(&Env::new(), expr)
}

fn codes(diags: &[Diagnostic]) -> Vec<&str> {
    diags.iter().map(|d| d.code.as_str()).collect()
}

fn messages(diags: &[Diagnostic]) -> Vec<&str> {
    diags.iter().map(|d| d.message.as_str()).collect()
}

fn folded_int(checked: &Checked) -> Option<BigInt> {
    checked
        .untyped_value()
        .and_then(|v| v.as_number())
        .map(|n| n.to_bigint().0)
}

fn base_env() -> Env {
    let mut env = Env::new();
    env.define_var("n", Type::Int);
    env.define_var("s", Type::String);
    env.define_var("xs", Type::Slice(Box::new(Type::Int)));
    env.define_var("bs", Type::Slice(Box::new(Type::Uint8)));
    env.define_var(
        "m",
        Type::Map {
            key: Box::new(Type::String),
            elem: Box::new(Type::Int),
        },
    );
    env
}

fn func(params: Vec<Type>, results: Vec<Type>, variadic: bool) -> Type {
    Type::Func(FuncType {
        params,
        results,
        variadic,
    })
}

fn point() -> Type {
    Type::Struct(StructType {
        name: Some("Point".to_string()),
        fields: vec![
            Field {
                name: "x".to_string(),
                ty: Type::Int,
            },
            Field {
                name: "y".to_string(),
                ty: Type::Int,
            },
        ],
        methods: vec![],
    })
}

fn stringer() -> InterfaceType {
    InterfaceType {
        name: Some("Stringer".to_string()),
        methods: vec![Method {
            name: "String".to_string(),
            sig: FuncType {
                params: vec![],
                results: vec![Type::String],
                variadic: false,
            },
        }],
    }
}

// ---------------------------------------------------------------------------
// Literals and folding
// ---------------------------------------------------------------------------

#[test]
fn test_int_literal() {
    let (c, diags) = check(&int("42"));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Const(ConstKind::Int)]);
    assert_eq!(folded_int(&c), Some(BigInt::from(42)));
}

#[test]
fn test_bad_literal() {
    let (c, diags) = check(&int("0x"));
    assert_eq!(codes(&diags), vec!["E1409"]);
    assert_eq!(messages(&diags), vec!["Bad literal 0x"]);
    assert!(c.types.is_empty());
}

#[test]
fn test_exact_float_addition() {
    // 0.1 + 0.2 == 0.3 holds for exact rationals
    let e = binary(
        BinaryOp::Eq,
        binary(BinaryOp::Add, float("0.1"), float("0.2")),
        float("0.3"),
    );
    let (c, diags) = check(&e);
    assert!(diags.is_empty());
    assert_eq!(c.constant, Some(Constant::Untyped(ConstValue::Bool(true))));
}

#[test]
fn test_shift_folding() {
    let (c, diags) = check(&binary(BinaryOp::Shl, int("1"), int("4")));
    assert!(diags.is_empty());
    assert_eq!(folded_int(&c), Some(BigInt::from(16)));
}

#[test]
fn test_string_concat_folding() {
    let (c, diags) = check(&binary(BinaryOp::Add, string_lit("foo"), string_lit("bar")));
    assert!(diags.is_empty());
    assert_eq!(
        c.untyped_value(),
        Some(&ConstValue::String("foobar".to_string()))
    );
}

#[test]
fn test_rune_arithmetic_keeps_rune_kind() {
    let (c, diags) = check(&binary(BinaryOp::Add, rune("'a'"), int("1")));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Const(ConstKind::Rune)]);
    assert_eq!(folded_int(&c), Some(BigInt::from(98)));
}

#[test]
fn test_division_by_zero() {
    let (c, diags) = check(&binary(BinaryOp::Div, int("1"), int("0")));
    assert_eq!(codes(&diags), vec!["E1402"]);
    assert_eq!(messages(&diags), vec!["division by zero"]);
    // The result keeps the promoted kind but carries no value
    assert_eq!(c.types, vec![ExprType::Const(ConstKind::Int)]);
    assert_eq!(c.constant, None);
}

#[test]
fn test_float_rem_is_illegal() {
    let (_, diags) = check(&binary(BinaryOp::Rem, float("1.5"), int("1")));
    assert_eq!(codes(&diags), vec!["E1211"]);
    assert_eq!(
        messages(&diags),
        vec!["illegal constant expression: floating-point % operation"]
    );
}

#[test]
fn test_mismatched_const_kinds() {
    let (_, diags) = check(&binary(BinaryOp::Add, int("1"), string_lit("a")));
    assert_eq!(codes(&diags), vec!["E1301", "E1301"]);
    assert_eq!(
        messages(&diags),
        vec![
            "cannot convert 1 to type int",
            "cannot convert \"a\" to type int"
        ]
    );
}

#[test]
fn test_complex_ordering_is_illegal() {
    let (_, diags) = check(&binary(BinaryOp::Lt, imag("1i"), imag("2i")));
    assert_eq!(codes(&diags), vec!["E1211"]);
}

#[test]
fn test_complex_equality_folds() {
    let (c, diags) = check(&binary(BinaryOp::Eq, imag("2i"), imag("2i")));
    assert!(diags.is_empty());
    assert_eq!(c.constant, Some(Constant::Untyped(ConstValue::Bool(true))));
}

#[test]
fn test_mixed_const_and_typed_operand() {
    let env = base_env();
    let (c, diags) = check_in(&env, &binary(BinaryOp::Add, ident("n"), int("1")));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Int)]);

    let (c, diags) = check_in(&env, &binary(BinaryOp::Lt, ident("n"), int("1")));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Bool)]);
}

#[test]
fn test_mixed_operand_conversion_failure() {
    let env = base_env();
    let (_, diags) = check_in(&env, &binary(BinaryOp::Add, ident("s"), int("1")));
    assert_eq!(codes(&diags), vec!["E1301", "E1211"]);
}

#[test]
fn test_typed_operands_mismatched() {
    let env = base_env();
    let (_, diags) = check_in(&env, &binary(BinaryOp::Add, ident("n"), ident("s")));
    assert_eq!(codes(&diags), vec!["E1211"]);
    assert_eq!(
        messages(&diags),
        vec!["invalid operation: n + s (mismatched types int and string)"]
    );
}

#[test]
fn test_operator_not_defined_on_operand() {
    let env = base_env();
    let (_, diags) = check_in(&env, &binary(BinaryOp::Sub, ident("s"), ident("s")));
    assert_eq!(codes(&diags), vec!["E1211"]);
    assert_eq!(
        messages(&diags),
        vec!["invalid operation: s - s (operator - not defined on string)"]
    );
}

// ---------------------------------------------------------------------------
// Unary operations
// ---------------------------------------------------------------------------

#[test]
fn test_unary_folding() {
    let (c, diags) = check(&unary(UnaryOp::Neg, int("5")));
    assert!(diags.is_empty());
    assert_eq!(folded_int(&c), Some(BigInt::from(-5)));

    let (c, diags) = check(&unary(UnaryOp::Not, ident("true")));
    assert!(diags.is_empty());
    assert_eq!(c.constant, Some(Constant::Untyped(ConstValue::Bool(false))));

    let (c, diags) = check(&unary(UnaryOp::BitNot, int("2")));
    assert!(diags.is_empty());
    assert_eq!(folded_int(&c), Some(BigInt::from(-3)));
}

#[test]
fn test_invalid_unary_op() {
    let (_, diags) = check(&unary(UnaryOp::Not, int("1")));
    assert_eq!(codes(&diags), vec!["E1212"]);
    assert_eq!(messages(&diags), vec!["invalid operation: ! untyped number"]);
}

#[test]
fn test_bitnot_of_float_constant() {
    let (_, diags) = check(&unary(UnaryOp::BitNot, float("1.5")));
    assert_eq!(codes(&diags), vec!["E1212"]);
    assert_eq!(
        messages(&diags),
        vec!["illegal constant expression ^ untyped number"]
    );
}

#[test]
fn test_address_of() {
    let env = base_env();
    let (c, diags) = check_in(&env, &unary(UnaryOp::Addr, ident("n")));
    assert!(diags.is_empty());
    assert_eq!(
        c.types,
        vec![ExprType::Concrete(Type::Ptr(Box::new(Type::Int)))]
    );

    let (_, diags) = check_in(&env, &unary(UnaryOp::Addr, int("1")));
    assert_eq!(codes(&diags), vec!["E1224"]);
    assert_eq!(messages(&diags), vec!["cannot take the address of 1"]);
}

#[test]
fn test_receive() {
    let mut env = base_env();
    env.define_var("ch", Type::Chan(Box::new(Type::Int)));
    let (c, diags) = check_in(&env, &unary(UnaryOp::Recv, ident("ch")));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Int)]);

    let (_, diags) = check_in(&env, &unary(UnaryOp::Recv, ident("n")));
    assert_eq!(codes(&diags), vec!["E1223"]);
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

#[test]
fn test_undefined_identifier() {
    let (_, diags) = check(&ident("foo"));
    assert_eq!(codes(&diags), vec!["E1408"]);
    assert_eq!(messages(&diags), vec!["undefined: foo"]);
}

#[test]
fn test_nil_identifier() {
    let (c, diags) = check(&ident("nil"));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Const(ConstKind::Nil)]);
    assert_eq!(c.untyped_value(), Some(&ConstValue::Nil));
}

#[test]
fn test_builtin_not_called() {
    let (_, diags) = check(&ident("len"));
    assert_eq!(codes(&diags), vec!["E1413"]);
    assert_eq!(
        messages(&diags),
        vec!["use of builtin len not in function call"]
    );
}

#[test]
fn test_type_used_as_expression() {
    let (c, diags) = check(&ident("int"));
    assert_eq!(codes(&diags), vec!["E1228"]);
    assert_eq!(messages(&diags), vec!["type int is not an expression"]);
    assert_eq!(c.kind, CheckedKind::Type(Type::Int));
}

#[test]
fn test_declared_constant_folds() {
    let mut env = Env::new();
    env.define_const(
        "k",
        ConstKind::Int,
        ConstValue::Number(ConstNumber::from_int(7)),
    );
    let (c, diags) = check_in(&env, &binary(BinaryOp::Add, ident("k"), int("1")));
    assert!(diags.is_empty());
    assert_eq!(folded_int(&c), Some(BigInt::from(8)));
}

// ---------------------------------------------------------------------------
// Single-value contexts
// ---------------------------------------------------------------------------

#[test]
fn test_multi_value_in_single_context() {
    let mut env = base_env();
    env.define_var("g2", func(vec![], vec![Type::Int, Type::Int], false));
    let e = binary(BinaryOp::Add, call(ident("g2"), vec![]), int("1"));
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1110"]);
    assert_eq!(
        messages(&diags),
        vec!["multiple-value g2() in single-value context"]
    );
}

#[test]
fn test_void_call_used_as_value() {
    let mut env = base_env();
    env.define_var("fv", func(vec![], vec![], false));
    let e = binary(BinaryOp::Add, call(ident("fv"), vec![]), int("1"));
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1109"]);
    assert_eq!(messages(&diags), vec!["fv() used as value"]);
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

#[test]
fn test_string_conversion_folds() {
    let (c, diags) = check(&call(ident("string"), vec![int("65")]));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::String)]);
    assert_eq!(
        c.constant,
        Some(Constant::Typed(
            Type::String,
            TypedValue::String("A".to_string())
        ))
    );
}

#[test]
fn test_conversion_truncates_float() {
    let (c, diags) = check(&call(ident("int"), vec![float("1.5")]));
    assert_eq!(codes(&diags), vec!["E1302"]);
    assert_eq!(messages(&diags), vec!["constant 1.5 truncated to integer"]);
    assert_eq!(
        c.constant,
        Some(Constant::Typed(Type::Int, TypedValue::Int(1)))
    );
}

#[test]
fn test_failed_constant_conversion_reports_both() {
    let (_, diags) = check(&call(ident("int"), vec![string_lit("x")]));
    assert_eq!(codes(&diags), vec!["E1301", "E1213"]);
    assert_eq!(
        messages(&diags),
        vec![
            "cannot convert \"x\" to type int",
            "cannot convert \"x\" (type string) to type int"
        ]
    );
}

#[test]
fn test_nil_conversion_reports_once() {
    let (_, diags) = check(&call(ident("int"), vec![ident("nil")]));
    assert_eq!(codes(&diags), vec!["E1301"]);
    assert_eq!(messages(&diags), vec!["cannot convert nil to type int"]);
}

#[test]
fn test_conversion_arity() {
    let (_, diags) = check(&call(ident("int"), vec![int("1"), int("2")]));
    assert_eq!(codes(&diags), vec!["E1101"]);
    assert_eq!(
        messages(&diags),
        vec!["too many arguments to conversion to int"]
    );

    let (_, diags) = check(&call(ident("int"), vec![]));
    assert_eq!(
        messages(&diags),
        vec!["missing argument to conversion to int"]
    );
}

#[test]
fn test_typed_conversion() {
    let mut env = base_env();
    env.define_var("f32", Type::Float32);
    env.define_var("b", Type::Bool);

    let (c, diags) = check_in(&env, &call(ident("int"), vec![ident("f32")]));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Int)]);

    let (_, diags) = check_in(&env, &call(ident("int"), vec![ident("b")]));
    assert_eq!(codes(&diags), vec!["E1213"]);
    assert_eq!(
        messages(&diags),
        vec!["cannot convert b (type bool) to type int"]
    );
}

// ---------------------------------------------------------------------------
// Ordinary calls
// ---------------------------------------------------------------------------

#[test]
fn test_call_ok() {
    let mut env = base_env();
    env.define_var("f", func(vec![Type::Int, Type::String], vec![Type::Bool], false));
    let e = call(ident("f"), vec![int("1"), string_lit("s")]);
    let (c, diags) = check_in(&env, &e);
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Bool)]);
}

#[test]
fn test_call_wrong_arg_type() {
    let mut env = base_env();
    env.define_var("f", func(vec![Type::Int, Type::String], vec![Type::Bool], false));
    let e = call(ident("f"), vec![int("1"), int("2")]);
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1201"]);
    assert_eq!(
        messages(&diags),
        vec!["cannot use 2 (type int) as type string in function argument"]
    );
}

#[test]
fn test_call_arg_errors_precede_arity() {
    let mut env = base_env();
    env.define_var("g", func(vec![Type::Int, Type::Int], vec![], false));
    let e = call(ident("g"), vec![string_lit("a")]);
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1201", "E1101"]);
    assert_eq!(diags[1].message, "not enough arguments in call to g");
}

#[test]
fn test_call_too_many_args() {
    let mut env = base_env();
    env.define_var("g", func(vec![Type::Int], vec![], false));
    let e = call(ident("g"), vec![int("1"), int("2")]);
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1101"]);
    assert_eq!(messages(&diags), vec!["too many arguments in call to g"]);
}

#[test]
fn test_ellipsis_on_non_variadic() {
    let mut env = base_env();
    env.define_var("f", func(vec![Type::Int, Type::Int], vec![], false));
    let e = vcall(ident("f"), vec![int("1"), int("2")]);
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1106"]);
    assert_eq!(messages(&diags), vec!["invalid use of ... in call to f"]);
}

#[test]
fn test_variadic_calls() {
    let mut env = base_env();
    env.define_var(
        "v",
        func(
            vec![Type::String, Type::Slice(Box::new(Type::Int))],
            vec![],
            true,
        ),
    );

    // The variadic slot may be empty
    let (_, diags) = check_in(&env, &call(ident("v"), vec![string_lit("a")]));
    assert!(diags.is_empty());

    // Extra arguments check against the element type
    let e = call(ident("v"), vec![string_lit("a"), int("1"), int("2")]);
    let (_, diags) = check_in(&env, &e);
    assert!(diags.is_empty());

    let e = call(ident("v"), vec![string_lit("a"), string_lit("b")]);
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1201"]);

    // Spreading a slice into the variadic slot
    let e = vcall(ident("v"), vec![string_lit("a"), ident("xs")]);
    let (_, diags) = check_in(&env, &e);
    assert!(diags.is_empty());
}

#[test]
fn test_spread_call() {
    let mut env = base_env();
    env.define_var("g2", func(vec![], vec![Type::Int, Type::Int], false));
    env.define_var("f2", func(vec![Type::Int, Type::Int], vec![Type::Bool], false));
    let e = call(ident("f2"), vec![call(ident("g2"), vec![])]);
    let (c, diags) = check_in(&env, &e);
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Bool)]);
    match &c.kind {
        CheckedKind::Call(info) => assert!(info.spread),
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn test_spread_call_type_mismatch() {
    let mut env = base_env();
    env.define_var("g2", func(vec![], vec![Type::Int, Type::Int], false));
    env.define_var("f3", func(vec![Type::Int, Type::String], vec![], false));
    let e = call(ident("f3"), vec![call(ident("g2"), vec![])]);
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1201"]);
    assert_eq!(
        messages(&diags),
        vec!["cannot use int as type string in argument to f3"]
    );
}

#[test]
fn test_call_non_function() {
    let env = base_env();
    let (_, diags) = check_in(&env, &call(ident("n"), vec![]));
    assert_eq!(codes(&diags), vec!["E1407"]);
    assert_eq!(
        messages(&diags),
        vec!["cannot call non-function n (type int)"]
    );
}

#[test]
fn test_call_of_nil() {
    let (_, diags) = check(&call(ident("nil"), vec![]));
    assert_eq!(codes(&diags), vec!["E1304"]);
    assert_eq!(messages(&diags), vec!["use of untyped nil"]);
}

#[test]
fn test_call_of_undefined() {
    let (c, diags) = check(&call(ident("zzz"), vec![int("1")]));
    assert_eq!(codes(&diags), vec!["E1408"]);
    assert!(c.types.is_empty());
}

// ---------------------------------------------------------------------------
// Builtins: complex, real, imag
// ---------------------------------------------------------------------------

#[test]
fn test_complex_folds() {
    let (c, diags) = check(&call(ident("complex"), vec![int("1"), int("2")]));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Complex128)]);
    assert_eq!(
        c.constant,
        Some(Constant::Typed(
            Type::Complex128,
            TypedValue::Complex(1.0, 2.0)
        ))
    );
}

#[test]
fn test_complex_arity_messages() {
    let (_, diags) = check(&call(ident("complex"), vec![int("1")]));
    assert_eq!(codes(&diags), vec!["E1102"]);
    assert_eq!(
        messages(&diags),
        vec!["missing argument to complex - complex(1, <N>)"]
    );

    let (_, diags) = check(&call(ident("complex"), vec![]));
    assert_eq!(
        messages(&diags),
        vec!["missing argument to complex - complex(<N>, <N>)"]
    );
}

#[test]
fn test_complex_mismatched_args() {
    let e = call(ident("complex"), vec![int("1"), string_lit("a")]);
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1203"]);
    assert_eq!(
        messages(&diags),
        vec!["invalid operation: complex(1, \"a\") (mismatched types untyped number and untyped string)"]
    );
}

#[test]
fn test_complex_non_numeric_args() {
    let e = call(ident("complex"), vec![string_lit("a"), string_lit("b")]);
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1202"]);
    assert_eq!(
        messages(&diags),
        vec!["invalid operation: complex(\"a\", \"b\") (arguments have type untyped string, expected floating-point)"]
    );
}

#[test]
fn test_real_imag_fold() {
    let (c, diags) = check(&call(ident("real"), vec![imag("2i")]));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Float64)]);
    assert_eq!(
        c.constant,
        Some(Constant::Typed(Type::Float64, TypedValue::Float(0.0)))
    );

    let (c, diags) = check(&call(ident("imag"), vec![imag("2i")]));
    assert!(diags.is_empty());
    assert_eq!(
        c.constant,
        Some(Constant::Typed(Type::Float64, TypedValue::Float(2.0)))
    );
}

#[test]
fn test_real_of_folded_complex() {
    let e = call(
        ident("real"),
        vec![call(ident("complex"), vec![int("3"), int("4")])],
    );
    let (c, diags) = check(&e);
    assert!(diags.is_empty());
    assert_eq!(
        c.constant,
        Some(Constant::Typed(Type::Float64, TypedValue::Float(3.0)))
    );
}

#[test]
fn test_real_of_non_complex() {
    let env = base_env();
    let (_, diags) = check_in(&env, &call(ident("real"), vec![ident("s")]));
    assert_eq!(codes(&diags), vec!["E1202"]);
    assert_eq!(
        messages(&diags),
        vec!["invalid operation: real(s) (arguments have type string, expected floating-point)"]
    );
}

// ---------------------------------------------------------------------------
// Builtins: new, make
// ---------------------------------------------------------------------------

#[test]
fn test_new() {
    let (c, diags) = check(&call(ident("new"), vec![ident("int")]));
    assert!(diags.is_empty());
    assert_eq!(
        c.types,
        vec![ExprType::Concrete(Type::Ptr(Box::new(Type::Int)))]
    );
}

#[test]
fn test_new_non_type_arg() {
    let (_, diags) = check(&call(ident("new"), vec![int("5")]));
    assert_eq!(codes(&diags), vec!["E1204"]);
    assert_eq!(messages(&diags), vec!["5 is not a type"]);
}

#[test]
fn test_new_arity() {
    let (_, diags) = check(&call(ident("new"), vec![]));
    assert_eq!(messages(&diags), vec!["missing argument to new"]);

    let (_, diags) = check(&call(ident("new"), vec![ident("int"), int("5")]));
    assert_eq!(codes(&diags), vec!["E1102"]);
    assert_eq!(messages(&diags), vec!["too many arguments to new(int)"]);
}

#[test]
fn test_make_slice() {
    let e = call(
        ident("make"),
        vec![tylit(slice_of(named("int"))), int("2"), int("4")],
    );
    let (c, diags) = check(&e);
    assert!(diags.is_empty());
    assert_eq!(
        c.types,
        vec![ExprType::Concrete(Type::Slice(Box::new(Type::Int)))]
    );
}

#[test]
fn test_make_too_few_args() {
    let e = call(ident("make"), vec![tylit(slice_of(named("int")))]);
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1102"]);
    assert_eq!(
        messages(&diags),
        vec!["too few arguments to make: make([]int)"]
    );
}

#[test]
fn test_make_len_larger_than_cap() {
    let e = call(
        ident("make"),
        vec![tylit(slice_of(named("int"))), int("2"), int("1")],
    );
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1220"]);
    assert_eq!(
        messages(&diags),
        vec!["len larger than cap in make([]int, 2, 1)"]
    );
}

#[test]
fn test_make_ordering_needs_both_constants() {
    // Only a length: nothing to compare against
    let e = call(ident("make"), vec![tylit(slice_of(named("int"))), int("2")]);
    let (_, diags) = check(&e);
    assert!(diags.is_empty());
}

#[test]
fn test_make_bad_type() {
    let (_, diags) = check(&call(ident("make"), vec![ident("int"), int("1")]));
    assert_eq!(codes(&diags), vec!["E1214"]);
    assert_eq!(messages(&diags), vec!["cannot make type int"]);
}

#[test]
fn test_make_non_integer_size() {
    let e = call(
        ident("make"),
        vec![tylit(slice_of(named("int"))), string_lit("a")],
    );
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1215"]);
    assert_eq!(
        messages(&diags),
        vec!["make: non-integer len argument \"a\""]
    );
}

#[test]
fn test_make_map() {
    let e = call(
        ident("make"),
        vec![tylit(map_of(named("string"), named("int")))],
    );
    let (c, diags) = check(&e);
    assert!(diags.is_empty());
    assert_eq!(
        c.types,
        vec![ExprType::Concrete(Type::Map {
            key: Box::new(Type::String),
            elem: Box::new(Type::Int),
        })]
    );
}

// ---------------------------------------------------------------------------
// Builtins: len, cap
// ---------------------------------------------------------------------------

#[test]
fn test_len_of_string_constant_folds() {
    let (c, diags) = check(&call(ident("len"), vec![string_lit("abc")]));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Int)]);
    assert_eq!(
        c.constant,
        Some(Constant::Typed(Type::Int, TypedValue::Int(3)))
    );
}

#[test]
fn test_len_of_array_folds() {
    let mut env = base_env();
    env.define_var(
        "a4",
        Type::Array {
            len: 4,
            elem: Box::new(Type::Int),
        },
    );
    env.define_var(
        "pa",
        Type::Ptr(Box::new(Type::Array {
            len: 3,
            elem: Box::new(Type::Int),
        })),
    );

    let (c, diags) = check_in(&env, &call(ident("len"), vec![ident("a4")]));
    assert!(diags.is_empty());
    assert_eq!(
        c.constant,
        Some(Constant::Typed(Type::Int, TypedValue::Int(4)))
    );

    let (c, diags) = check_in(&env, &call(ident("cap"), vec![ident("pa")]));
    assert!(diags.is_empty());
    assert_eq!(
        c.constant,
        Some(Constant::Typed(Type::Int, TypedValue::Int(3)))
    );
}

#[test]
fn test_len_of_array_with_call_does_not_fold() {
    let mut env = base_env();
    env.define_var(
        "fa",
        func(
            vec![],
            vec![Type::Array {
                len: 5,
                elem: Box::new(Type::Int),
            }],
            false,
        ),
    );
    let e = call(ident("len"), vec![call(ident("fa"), vec![])]);
    let (c, diags) = check_in(&env, &e);
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Int)]);
    assert_eq!(c.constant, None);
}

#[test]
fn test_cap_of_map_invalid() {
    let env = base_env();
    let (_, diags) = check_in(&env, &call(ident("cap"), vec![ident("m")]));
    assert_eq!(codes(&diags), vec!["E1202"]);
    assert_eq!(
        messages(&diags),
        vec!["invalid argument m (type map[string]int) for cap"]
    );
}

#[test]
fn test_len_of_nil_and_number() {
    let (_, diags) = check(&call(ident("len"), vec![ident("nil")]));
    assert_eq!(codes(&diags), vec!["E1304"]);

    let (_, diags) = check(&call(ident("len"), vec![int("1")]));
    assert_eq!(codes(&diags), vec!["E1202"]);
    assert_eq!(messages(&diags), vec!["invalid argument 1 (type int) for len"]);
}

#[test]
fn test_len_ellipsis() {
    let env = base_env();
    let (_, diags) = check_in(&env, &vcall(ident("len"), vec![ident("xs")]));
    assert_eq!(codes(&diags), vec!["E1107"]);
    assert_eq!(messages(&diags), vec!["invalid use of ... with builtin len"]);
}

// ---------------------------------------------------------------------------
// Builtins: append, copy, delete, panic
// ---------------------------------------------------------------------------

#[test]
fn test_append_ok() {
    let env = base_env();
    let e = call(ident("append"), vec![ident("xs"), int("1"), int("2")]);
    let (c, diags) = check_in(&env, &e);
    assert!(diags.is_empty());
    assert_eq!(
        c.types,
        vec![ExprType::Concrete(Type::Slice(Box::new(Type::Int)))]
    );
}

#[test]
fn test_append_wrong_element() {
    let env = base_env();
    let e = call(ident("append"), vec![ident("xs"), string_lit("a")]);
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1202"]);
    assert_eq!(
        messages(&diags),
        vec!["cannot use \"a\" (type string) as type int in append"]
    );
}

#[test]
fn test_append_first_arg_nil() {
    let (_, diags) = check(&call(ident("append"), vec![ident("nil"), int("1")]));
    assert_eq!(codes(&diags), vec!["E1216"]);
    assert_eq!(
        messages(&diags),
        vec!["first argument to append must be typed slice; have untyped nil"]
    );
}

#[test]
fn test_append_string_into_byte_slice() {
    let env = base_env();
    let (c, diags) = check_in(&env, &vcall(ident("append"), vec![ident("bs"), ident("s")]));
    assert!(diags.is_empty());
    assert_eq!(
        c.types,
        vec![ExprType::Concrete(Type::Slice(Box::new(Type::Uint8)))]
    );

    // ...but not into a slice of any other element type
    let (_, diags) = check_in(&env, &vcall(ident("append"), vec![ident("xs"), ident("s")]));
    assert_eq!(codes(&diags), vec!["E1202"]);
    assert_eq!(
        messages(&diags),
        vec!["cannot use s (type string) as type []int in append"]
    );
}

#[test]
fn test_append_spread_single_arg() {
    let env = base_env();
    let (_, diags) = check_in(&env, &vcall(ident("append"), vec![ident("xs")]));
    assert_eq!(codes(&diags), vec!["E1108"]);
    assert_eq!(
        messages(&diags),
        vec!["cannot use ... on first argument to append"]
    );
}

#[test]
fn test_append_no_args() {
    let (_, diags) = check(&call(ident("append"), vec![]));
    assert_eq!(codes(&diags), vec!["E1102"]);
    assert_eq!(messages(&diags), vec!["missing arguments to append"]);
}

#[test]
fn test_copy() {
    let mut env = base_env();
    env.define_var("ys", Type::Slice(Box::new(Type::Int)));

    let (c, diags) = check_in(&env, &call(ident("copy"), vec![ident("xs"), ident("ys")]));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Int)]);

    // A string source needs a []byte destination
    let (c, diags) = check_in(&env, &call(ident("copy"), vec![ident("bs"), ident("s")]));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Int)]);

    let (_, diags) = check_in(&env, &call(ident("copy"), vec![ident("xs"), ident("s")]));
    assert_eq!(codes(&diags), vec!["E1218"]);
    assert_eq!(
        messages(&diags),
        vec!["arguments to copy have different element types: []int and string"]
    );
}

#[test]
fn test_copy_non_slice_args() {
    let env = base_env();
    let (_, diags) = check_in(&env, &call(ident("copy"), vec![ident("n"), ident("xs")]));
    assert_eq!(codes(&diags), vec!["E1217"]);
    assert_eq!(
        messages(&diags),
        vec!["first argument to copy should be slice; have int"]
    );

    let (_, diags) = check_in(&env, &call(ident("copy"), vec![ident("xs"), ident("n")]));
    assert_eq!(
        messages(&diags),
        vec!["second argument to copy should be slice or string; have int"]
    );
}

#[test]
fn test_delete() {
    let env = base_env();
    let e = call(ident("delete"), vec![ident("m"), string_lit("k")]);
    let (c, diags) = check_in(&env, &e);
    assert!(diags.is_empty());
    assert!(c.types.is_empty());
}

#[test]
fn test_delete_first_arg_not_map() {
    let env = base_env();
    let (_, diags) = check_in(&env, &call(ident("delete"), vec![ident("xs"), int("1")]));
    assert_eq!(codes(&diags), vec!["E1219"]);
    assert_eq!(
        messages(&diags),
        vec!["first argument to delete must be map; have []int"]
    );
}

#[test]
fn test_delete_key_checked_against_key_type() {
    let env = base_env();
    let (_, diags) = check_in(&env, &call(ident("delete"), vec![ident("m"), int("1")]));
    assert_eq!(codes(&diags), vec!["E1202"]);
    assert_eq!(
        messages(&diags),
        vec!["cannot use 1 (type int) as type string in delete"]
    );
}

#[test]
fn test_delete_arity_messages() {
    let env = base_env();
    let (_, diags) = check_in(&env, &call(ident("delete"), vec![ident("m")]));
    assert_eq!(
        messages(&diags),
        vec!["missing second (key) argument to delete"]
    );

    let (_, diags) = check_in(&env, &call(ident("delete"), vec![]));
    assert_eq!(messages(&diags), vec!["missing arguments to delete"]);
}

#[test]
fn test_panic() {
    let (c, diags) = check(&call(ident("panic"), vec![int("1")]));
    assert!(diags.is_empty());
    assert!(c.types.is_empty());

    let (_, diags) = check(&call(ident("panic"), vec![]));
    assert_eq!(messages(&diags), vec!["missing argument to panic: panic()"]);
}

// ---------------------------------------------------------------------------
// Composite literals: slices and arrays
// ---------------------------------------------------------------------------

#[test]
fn test_slice_literal_ok() {
    let e = composite(Some(slice_of(named("int"))), vec![int("1"), int("2")]);
    let (c, diags) = check(&e);
    assert!(diags.is_empty());
    assert_eq!(
        c.types,
        vec![ExprType::Concrete(Type::Slice(Box::new(Type::Int)))]
    );
}

#[test]
fn test_slice_literal_nil_element() {
    // The nil conversion error stands alone; no array-element error follows
    let e = composite(Some(slice_of(named("int"))), vec![ident("nil")]);
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1301"]);
    assert_eq!(messages(&diags), vec!["cannot convert nil to type int"]);
}

#[test]
fn test_slice_literal_numeric_mismatch_suppressed() {
    // A non-string constant's conversion error is replaced by the element error
    let e = composite(Some(slice_of(named("string"))), vec![int("1")]);
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1207"]);
    assert_eq!(
        messages(&diags),
        vec!["cannot use 1 (type int) as type string in array element"]
    );
}

#[test]
fn test_slice_literal_string_mismatch_reports_both() {
    let e = composite(Some(slice_of(named("int"))), vec![string_lit("a")]);
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1301", "E1207"]);
}

#[test]
fn test_array_key_out_of_bounds() {
    let e = composite(
        Some(array_of(int("2"), named("int"))),
        vec![kv(int("5"), int("1"))],
    );
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1403"]);
    // The reference compiler prints one past the offending index
    assert_eq!(messages(&diags), vec!["array index 6 out of bounds [0:2]"]);
}

#[test]
fn test_array_overflow_reported_once() {
    let e = composite(
        Some(array_of(int("3"), named("int"))),
        vec![int("1"), int("2"), int("3"), int("4"), int("5")],
    );
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1403"]);
    assert_eq!(messages(&diags), vec!["array index 4 out of bounds [0:3]"]);
}

#[test]
fn test_duplicate_array_index() {
    let e = composite(
        Some(slice_of(named("int"))),
        vec![kv(int("1"), int("10")), kv(int("1"), int("20"))],
    );
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1306"]);
    assert_eq!(messages(&diags), vec!["duplicate index in array literal: 1"]);
}

#[test]
fn test_bad_array_key() {
    let e = composite(
        Some(slice_of(named("int"))),
        vec![kv(string_lit("a"), int("1"))],
    );
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1404"]);
    assert_eq!(
        messages(&diags),
        vec!["array index must be non-negative integer constant"]
    );
}

#[test]
fn test_bad_array_key_keeps_undefined_error() {
    let e = composite(
        Some(slice_of(named("int"))),
        vec![kv(ident("zzz"), int("1"))],
    );
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1408", "E1404"]);
}

#[test]
fn test_nested_elided_literals() {
    let e = composite(
        Some(slice_of(slice_of(named("int")))),
        vec![
            composite(None, vec![int("1")]),
            composite(None, vec![int("2")]),
        ],
    );
    let (_, diags) = check(&e);
    assert!(diags.is_empty());
}

#[test]
fn test_missing_composite_lit_type() {
    let (_, diags) = check(&composite(None, vec![int("1")]));
    assert_eq!(codes(&diags), vec!["E1410"]);
    assert_eq!(messages(&diags), vec!["missing type in composite literal"]);
}

#[test]
fn test_invalid_composite_lit_type() {
    let (_, diags) = check(&composite(Some(named("int")), vec![int("1")]));
    assert_eq!(codes(&diags), vec!["E1411"]);
    assert_eq!(
        messages(&diags),
        vec!["invalid type for composite literal: int"]
    );
}

// ---------------------------------------------------------------------------
// Composite literals: maps
// ---------------------------------------------------------------------------

#[test]
fn test_map_literal_ok() {
    let e = composite(
        Some(map_of(named("string"), named("int"))),
        vec![
            kv(string_lit("a"), int("1")),
            kv(string_lit("b"), int("2")),
        ],
    );
    let (_, diags) = check(&e);
    assert!(diags.is_empty());
}

#[test]
fn test_duplicate_map_key() {
    let e = composite(
        Some(map_of(named("string"), named("int"))),
        vec![
            kv(string_lit("a"), int("1")),
            kv(string_lit("a"), int("2")),
        ],
    );
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1305"]);
    assert_eq!(messages(&diags), vec!["duplicate key \"a\" in map literal"]);
}

#[test]
fn test_duplicate_map_key_after_conversion() {
    // 'a' converts to the key type int as 97, colliding with the literal 97
    let e = composite(
        Some(map_of(named("int"), named("string"))),
        vec![
            kv(int("97"), string_lit("x")),
            kv(rune("'a'"), string_lit("y")),
        ],
    );
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1305"]);
}

#[test]
fn test_interface_keyed_map_skips_duplicate_check() {
    let mut env = Env::new();
    env.define_type(
        "any",
        Type::Interface(InterfaceType {
            name: None,
            methods: vec![],
        }),
    );
    let e = composite(
        Some(map_of(named("any"), named("int"))),
        vec![kv(int("1"), int("10")), kv(int("1"), int("20"))],
    );
    let (_, diags) = check_in(&env, &e);
    assert!(diags.is_empty());
}

#[test]
fn test_missing_map_key() {
    let e = composite(Some(map_of(named("string"), named("int"))), vec![int("1")]);
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1104"]);
    assert_eq!(messages(&diags), vec!["missing key in map literal"]);
}

#[test]
fn test_bad_map_key() {
    let e = composite(
        Some(map_of(named("string"), named("int"))),
        vec![kv(int("1"), int("2"))],
    );
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1205"]);
    assert_eq!(
        messages(&diags),
        vec!["cannot use 1 (type int) as type string in map key"]
    );
}

#[test]
fn test_bad_map_value() {
    let e = composite(
        Some(map_of(named("string"), named("int"))),
        vec![kv(string_lit("a"), ident("true"))],
    );
    let (_, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1206"]);
    assert_eq!(
        messages(&diags),
        vec!["cannot use true (type bool) as type int in map value"]
    );
}

// ---------------------------------------------------------------------------
// Composite literals: structs
// ---------------------------------------------------------------------------

#[test]
fn test_struct_literal_forms() {
    let mut env = Env::new();
    env.define_type("Point", point());

    // Empty literal is always valid
    let (_, diags) = check_in(&env, &composite(Some(named("Point")), vec![]));
    assert!(diags.is_empty());

    // Positional
    let e = composite(Some(named("Point")), vec![int("1"), int("2")]);
    let (c, diags) = check_in(&env, &e);
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(point())]);

    // Keyed
    let e = composite(
        Some(named("Point")),
        vec![kv(ident("x"), int("1")), kv(ident("y"), int("2"))],
    );
    let (_, diags) = check_in(&env, &e);
    assert!(diags.is_empty());
}

#[test]
fn test_struct_literal_wrong_count() {
    let mut env = Env::new();
    env.define_type("Point", point());
    let e = composite(Some(named("Point")), vec![int("1")]);
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1103"]);
    assert_eq!(messages(&diags), vec!["too few values in struct initializer"]);
}

#[test]
fn test_struct_literal_surplus_values_still_checked() {
    let mut env = Env::new();
    env.define_type("Point", point());
    let e = composite(
        Some(named("Point")),
        vec![int("1"), int("2"), ident("zzz")],
    );
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1103", "E1408"]);
    assert_eq!(diags[0].message, "too many values in struct initializer");
}

#[test]
fn test_struct_literal_duplicate_field() {
    let mut env = Env::new();
    env.define_type("Point", point());
    let e = composite(
        Some(named("Point")),
        vec![kv(ident("x"), int("1")), kv(ident("x"), int("2"))],
    );
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1307"]);
    assert_eq!(
        messages(&diags),
        vec!["duplicate field name in struct literal: x"]
    );
}

#[test]
fn test_struct_literal_unknown_field() {
    let mut env = Env::new();
    env.define_type("Point", point());
    let e = composite(Some(named("Point")), vec![kv(ident("z"), int("1"))]);
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1405"]);
    assert_eq!(
        messages(&diags),
        vec!["unknown Point field 'z' in struct literal"]
    );
}

#[test]
fn test_struct_literal_mixed_reported_once() {
    let mut env = Env::new();
    env.define_type("Point", point());
    let e = composite(
        Some(named("Point")),
        vec![kv(ident("x"), int("1")), int("2"), int("3")],
    );
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1105"]);
    assert_eq!(
        messages(&diags),
        vec!["mixture of field:value and value initializers"]
    );
}

#[test]
fn test_struct_literal_bad_value() {
    let mut env = Env::new();
    env.define_type("Point", point());
    let e = composite(Some(named("Point")), vec![kv(ident("x"), string_lit("a"))]);
    let (_, diags) = check_in(&env, &e);
    assert_eq!(codes(&diags), vec!["E1208"]);
    assert_eq!(
        messages(&diags),
        vec!["cannot use \"a\" (type string) as type int in field value"]
    );
}

// ---------------------------------------------------------------------------
// Index, selector, star, type assertion
// ---------------------------------------------------------------------------

#[test]
fn test_string_index_bounds() {
    let (_, diags) = check(&index(string_lit("abc"), int("5")));
    assert_eq!(codes(&diags), vec!["E1401"]);
    assert_eq!(
        messages(&diags),
        vec!["invalid string index 5 (out of bounds for 3-byte string)"]
    );

    let (_, diags) = check(&index(string_lit("abc"), unary(UnaryOp::Neg, int("1"))));
    assert_eq!(codes(&diags), vec!["E1401"]);
    assert_eq!(
        messages(&diags),
        vec!["invalid string index -1 (index must be non negative)"]
    );
}

#[test]
fn test_string_index_type() {
    let (c, diags) = check(&index(string_lit("abc"), int("1")));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Uint8)]);
}

#[test]
fn test_non_integer_index() {
    let env = base_env();
    let (_, diags) = check_in(&env, &index(ident("xs"), float("1.5")));
    assert_eq!(codes(&diags), vec!["E1226"]);
    assert_eq!(messages(&diags), vec!["non-integer array index 1.5"]);
}

#[test]
fn test_slice_index_type() {
    let env = base_env();
    let (c, diags) = check_in(&env, &index(ident("xs"), int("0")));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Int)]);
}

#[test]
fn test_map_index() {
    let env = base_env();
    let (c, diags) = check_in(&env, &index(ident("m"), string_lit("k")));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Int)]);

    let (_, diags) = check_in(&env, &index(ident("m"), int("1")));
    assert_eq!(codes(&diags), vec!["E1225"]);
    assert_eq!(
        messages(&diags),
        vec!["cannot use 1 as type string in map index"]
    );
}

#[test]
fn test_index_of_non_indexable() {
    let env = base_env();
    let (_, diags) = check_in(&env, &index(ident("n"), int("0")));
    assert_eq!(codes(&diags), vec!["E1227"]);
    assert_eq!(messages(&diags), vec!["invalid operation: n (index of type int)"]);
}

#[test]
fn test_selector() {
    let mut env = Env::new();
    env.define_var("p", point());
    let (c, diags) = check_in(&env, &selector(ident("p"), "x"));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Int)]);

    let (_, diags) = check_in(&env, &selector(ident("p"), "z"));
    assert_eq!(codes(&diags), vec!["E1222"]);
    assert_eq!(
        messages(&diags),
        vec!["p.z undefined (type Point has no field or method z)"]
    );
}

#[test]
fn test_star() {
    let mut env = base_env();
    env.define_var("pi", Type::Ptr(Box::new(Type::Int)));
    let (c, diags) = check_in(&env, &star(ident("pi")));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::Int)]);

    let (_, diags) = check_in(&env, &star(ident("n")));
    assert_eq!(codes(&diags), vec!["E1221"]);
    assert_eq!(messages(&diags), vec!["invalid indirect of n (type int)"]);
}

#[test]
fn test_type_assertion() {
    let mut env = Env::new();
    env.define_type("Stringer", Type::Interface(stringer()));
    env.define_var("i", Type::Interface(stringer()));
    env.define_var("n", Type::Int);

    // int has no String method
    let (_, diags) = check_in(&env, &assert_to(ident("i"), named("int")));
    assert_eq!(codes(&diags), vec!["E1210"]);

    // Asserting on a non-interface value
    let (_, diags) = check_in(&env, &assert_to(ident("n"), named("int")));
    assert_eq!(codes(&diags), vec!["E1209"]);
    assert_eq!(
        messages(&diags),
        vec!["invalid type assertion: n.(int) (non-interface type int on left)"]
    );
}

#[test]
fn test_type_assertion_empty_interface() {
    let mut env = Env::new();
    env.define_var(
        "v",
        Type::Interface(InterfaceType {
            name: None,
            methods: vec![],
        }),
    );
    let (c, diags) = check_in(&env, &assert_to(ident("v"), named("string")));
    assert!(diags.is_empty());
    assert_eq!(c.types, vec![ExprType::Concrete(Type::String)]);
}

// ---------------------------------------------------------------------------
// Entry points and context
// ---------------------------------------------------------------------------

#[test]
fn test_int32_conversion_one_past_range() {
    let e = call(ident("int32"), vec![int("2147483648")]);
    let (c, diags) = check(&e);
    assert_eq!(codes(&diags), vec!["E1303"]);
    assert_eq!(
        messages(&diags),
        vec!["constant 2147483648 overflows int32"]
    );
    // The wrapped value is still produced
    assert_eq!(
        c.constant,
        Some(Constant::Typed(Type::Int32, TypedValue::Int(i32::MIN as i64)))
    );
}

#[test]
fn test_strict_entry_point() {
    let env = Env::new();
    let ctx = Ctx::default();
    assert!(check_expr_strict(&binary(BinaryOp::Add, int("1"), int("2")), &env, &ctx).is_ok());

    let err = check_expr_strict(&ident("zzz"), &env, &ctx).unwrap_err();
    assert_eq!(err.diagnostics.len(), 1);
    assert_eq!(err.diagnostics[0].code, "E1408");
}

#[test]
fn test_snippet_prefers_source_text() {
    let mut env = Env::new();
    env.define_var("f", func(vec![], vec![], false));
    let src = "f() + 1";
    let fun = Expr::Ident {
        id: NodeId::new(),
        span: Span::new("test", 0, 1, 1, 1),
        name: "f".to_string(),
    };
    let fcall = Expr::Call {
        id: NodeId::new(),
        span: Span::new("test", 0, 3, 1, 1),
        fun: Box::new(fun),
        args: vec![],
        ellipsis: false,
    };
    let expr = Expr::Binary {
        id: NodeId::new(),
        span: Span::new("test", 0, 7, 1, 1),
        op: BinaryOp::Add,
        lhs: Box::new(fcall),
        rhs: Box::new(int("1")),
    };
    let (_, bag) = check_expr(&expr, &env, &Ctx::with_input(src));
    let diags = bag.take();
    assert_eq!(messages(&diags), vec!["f() used as value"]);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

mod properties {
    use super::*;
    use crate::constant::convert_const_to_typed;
    use proptest::prelude::*;

    fn numeric_kind() -> impl Strategy<Value = ConstKind> {
        prop::sample::select(vec![
            ConstKind::Int,
            ConstKind::Rune,
            ConstKind::Float,
            ConstKind::Complex,
        ])
    }

    proptest! {
        #[test]
        fn promotion_is_symmetric(a in numeric_kind(), b in numeric_kind()) {
            prop_assert_eq!(a.promote(b), b.promote(a));
        }

        #[test]
        fn promotion_never_narrows(a in numeric_kind(), b in numeric_kind()) {
            let k = a.promote(b).unwrap();
            prop_assert_eq!(k.promote(a), Some(k));
            prop_assert_eq!(k.promote(b), Some(k));
        }

        #[test]
        fn addition_folds_exactly(a in 0u64..1_000_000_000, b in 0u64..1_000_000_000) {
            let e = binary(BinaryOp::Add, int(&a.to_string()), int(&b.to_string()));
            let (c, diags) = check(&e);
            prop_assert!(diags.is_empty());
            prop_assert_eq!(folded_int(&c), Some(BigInt::from(a + b)));
        }

        #[test]
        fn in_range_int32_conversion_is_lossless(v in any::<i32>()) {
            let value = ConstValue::Number(ConstNumber::from_int(v));
            let (tv, diags) = convert_const_to_typed(&value, &Type::Int32, false, "c", &sp());
            prop_assert!(diags.is_empty());
            prop_assert_eq!(tv, Some(TypedValue::Int(v as i64)));
        }

        #[test]
        fn string_concat_folds(a in "[a-z]{0,8}", b in "[a-z]{0,8}") {
            let e = binary(BinaryOp::Add, string_lit(&a), string_lit(&b));
            let (c, diags) = check(&e);
            prop_assert!(diags.is_empty());
            prop_assert_eq!(
                c.untyped_value(),
                Some(&ConstValue::String(format!("{}{}", a, b)))
            );
        }
    }
}
