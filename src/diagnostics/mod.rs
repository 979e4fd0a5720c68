//! Diagnostic reporting for the tycho checker
//!
//! Diagnostics are structured values: a stable error code, a source span, and
//! a kind-specific payload carrying the operand types, indices, and rendered
//! operand text needed to reconstruct the reference compiler's message without
//! re-deriving context from the syntax tree. They are accumulated in order;
//! the ordering is part of the conformance contract.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{ConstKind, ExprType, Type};

pub mod error_codes;
pub use error_codes::*;

/// A source location span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Source file path
    pub file: PathBuf,

    /// Start byte offset (0-indexed)
    pub start: usize,

    /// End byte offset (0-indexed, exclusive)
    pub end: usize,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// Start column (1-indexed)
    pub start_col: usize,
}

impl Span {
    /// Create a new span
    pub fn new(
        file: impl Into<PathBuf>,
        start: usize,
        end: usize,
        start_line: usize,
        start_col: usize,
    ) -> Self {
        Self {
            file: file.into(),
            start,
            end,
            start_line,
            start_col,
        }
    }

    /// Create a zero-width span for an entire file
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            file: path.into(),
            start: 0,
            end: 0,
            start_line: 1,
            start_col: 1,
        }
    }

    /// Merge two spans into one that covers both
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            file: self.file.clone(),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            start_line: self.start_line.min(other.start_line),
            start_col: if self.start_line <= other.start_line {
                self.start_col
            } else {
                other.start_col
            },
        }
    }
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Structured payload of a checker diagnostic.
///
/// Each variant corresponds to one reference-compiler error shape. Operand
/// expressions are carried as their rendered source text; types are carried
/// as descriptors so consumers can re-render or classify without the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DiagnosticKind {
    // ---- arity / shape ----
    WrongNumberOfArgs {
        num_args: usize,
        /// Set when the call is a type conversion
        conversion: Option<Type>,
        fun: String,
        not_enough: bool,
    },
    BuiltinWrongNumberOfArgs {
        builtin: String,
        num_args: usize,
        first_arg: Option<String>,
        call: String,
    },
    WrongNumberOfStructValues {
        actual: usize,
        expected: usize,
    },
    MissingMapKey,
    MixedStructValues,
    InvalidEllipsis {
        fun: String,
    },
    BuiltinInvalidEllipsis {
        builtin: String,
    },
    AppendFirstArgNotVariadic,
    MissingValue {
        expr: String,
    },
    MultiInSingleContext {
        expr: String,
    },

    // ---- type mismatch ----
    WrongArgType {
        arg: String,
        actual: ExprType,
        expected: Type,
        fun: String,
        arg_pos: usize,
        /// True when the argument is one position of a spread call result
        spread: bool,
    },
    BuiltinWrongArgType {
        builtin: String,
        arg: String,
        arg_type: ExprType,
        expected: Option<Type>,
        call: String,
    },
    BuiltinMismatchedArgs {
        x: ExprType,
        y: ExprType,
        call: String,
    },
    BuiltinNonTypeArg {
        expr: String,
    },
    BadMapKey {
        key: String,
        ty: ExprType,
        key_type: Type,
    },
    BadMapValue {
        value: String,
        ty: ExprType,
        elem: Type,
    },
    BadArrayValue {
        value: String,
        ty: ExprType,
        elem: Type,
    },
    BadStructValue {
        value: String,
        ty: ExprType,
        field_type: Type,
    },
    InvalidTypeAssert {
        expr: String,
        ty: ExprType,
    },
    ImpossibleTypeAssert {
        from: Type,
        to: Type,
        missing: String,
    },
    InvalidBinaryOp {
        x: String,
        op: String,
        y: String,
        xt: ExprType,
        yt: ExprType,
        /// Both operands are untyped numeric constants
        const_operands: bool,
        /// Floating-point % on constants
        float_rem: bool,
        /// Set when the types agree but the operator is not defined on them;
        /// carries the operand-type word to print
        undefined_on: Option<String>,
    },
    InvalidUnaryOp {
        op: String,
        ty: ExprType,
        /// ^ applied to an untyped numeric constant
        xor_const: bool,
    },
    BadConversion {
        expr: String,
        from: Type,
        to: Type,
    },
    MakeBadType {
        of: Type,
    },
    MakeNonIntegerArg {
        which: usize,
        arg: String,
    },
    MakeLenGtrThanCap {
        length: i64,
        capacity: i64,
        call: String,
    },
    AppendFirstArgNotSlice {
        ty: ExprType,
    },
    CopyArgsMustBeSlices {
        x: ExprType,
        y: ExprType,
    },
    CopyArgsHaveDifferentEltTypes {
        x: Type,
        y: Type,
    },
    DeleteFirstArgNotMap {
        ty: ExprType,
    },
    InvalidIndirect {
        expr: String,
        ty: ExprType,
    },
    UndefinedFieldOrMethod {
        expr: String,
        ty: ExprType,
        field: String,
    },
    InvalidRecvFrom {
        expr: String,
        ty: ExprType,
    },
    InvalidAddressOf {
        expr: String,
    },
    BadMapIndex {
        index: String,
        ty: ExprType,
        key_type: Type,
    },
    NonIntegerIndex {
        index: String,
        on_string: bool,
    },
    InvalidIndexOperation {
        expr: String,
        ty: ExprType,
    },
    TypeUsedAsExpression {
        name: String,
    },

    // ---- constant-specific ----
    BadConstConversion {
        expr: String,
        from: ExprType,
        to: ExprType,
    },
    TruncatedConstant {
        /// True when truncating to integer, false when truncating to real
        to_integer: bool,
        constant: String,
    },
    OverflowedConstant {
        constant: String,
        from: ConstKind,
        to: ExprType,
    },
    UntypedNil,
    DuplicateMapKey {
        key: String,
    },
    DuplicateArrayKey {
        index: i64,
    },
    DuplicateStructField {
        field: String,
    },

    // ---- structural ----
    IndexOutOfBounds {
        index: String,
        on_string: bool,
        length: usize,
        value: i64,
    },
    DivideByZero,
    ArrayKeyOutOfBounds {
        index: i64,
        length: usize,
    },
    BadArrayKey,
    UnknownStructField {
        struct_type: Type,
        field: String,
    },
    InvalidStructField {
        key: String,
    },
    CallNonFuncType {
        fun: String,
        ty: ExprType,
    },
    Undefined {
        name: String,
    },
    BadLiteral {
        text: String,
    },
    MissingCompositeLitType,
    InvalidCompositeLitType {
        ty: Type,
    },
    BadArrayBound {
        expr: String,
        negative: bool,
    },
    BuiltinNotCalled {
        name: String,
    },
}

impl DiagnosticKind {
    /// Stable error code for this kind
    pub fn code(&self) -> &'static str {
        use DiagnosticKind::*;
        match self {
            WrongNumberOfArgs { .. } => shape::WRONG_NUMBER_OF_ARGS,
            BuiltinWrongNumberOfArgs { .. } => shape::BUILTIN_WRONG_NUMBER_OF_ARGS,
            WrongNumberOfStructValues { .. } => shape::WRONG_NUMBER_OF_STRUCT_VALUES,
            MissingMapKey => shape::MISSING_MAP_KEY,
            MixedStructValues => shape::MIXED_STRUCT_VALUES,
            InvalidEllipsis { .. } => shape::INVALID_ELLIPSIS,
            BuiltinInvalidEllipsis { .. } => shape::BUILTIN_INVALID_ELLIPSIS,
            AppendFirstArgNotVariadic => shape::APPEND_FIRST_ARG_NOT_VARIADIC,
            MissingValue { .. } => shape::MISSING_VALUE,
            MultiInSingleContext { .. } => shape::MULTI_IN_SINGLE_CONTEXT,

            WrongArgType { .. } => mismatch::WRONG_ARG_TYPE,
            BuiltinWrongArgType { .. } => mismatch::BUILTIN_WRONG_ARG_TYPE,
            BuiltinMismatchedArgs { .. } => mismatch::BUILTIN_MISMATCHED_ARGS,
            BuiltinNonTypeArg { .. } => mismatch::BUILTIN_NON_TYPE_ARG,
            BadMapKey { .. } => mismatch::BAD_MAP_KEY,
            BadMapValue { .. } => mismatch::BAD_MAP_VALUE,
            BadArrayValue { .. } => mismatch::BAD_ARRAY_VALUE,
            BadStructValue { .. } => mismatch::BAD_STRUCT_VALUE,
            InvalidTypeAssert { .. } => mismatch::INVALID_TYPE_ASSERT,
            ImpossibleTypeAssert { .. } => mismatch::IMPOSSIBLE_TYPE_ASSERT,
            InvalidBinaryOp { .. } => mismatch::INVALID_BINARY_OP,
            InvalidUnaryOp { .. } => mismatch::INVALID_UNARY_OP,
            BadConversion { .. } => mismatch::BAD_CONVERSION,
            MakeBadType { .. } => mismatch::MAKE_BAD_TYPE,
            MakeNonIntegerArg { .. } => mismatch::MAKE_NON_INTEGER_ARG,
            MakeLenGtrThanCap { .. } => mismatch::MAKE_LEN_GTR_THAN_CAP,
            AppendFirstArgNotSlice { .. } => mismatch::APPEND_FIRST_ARG_NOT_SLICE,
            CopyArgsMustBeSlices { .. } => mismatch::COPY_ARGS_MUST_BE_SLICES,
            CopyArgsHaveDifferentEltTypes { .. } => mismatch::COPY_ARGS_DIFFERENT_ELT_TYPES,
            DeleteFirstArgNotMap { .. } => mismatch::DELETE_FIRST_ARG_NOT_MAP,
            InvalidIndirect { .. } => mismatch::INVALID_INDIRECT,
            UndefinedFieldOrMethod { .. } => mismatch::UNDEFINED_FIELD_OR_METHOD,
            InvalidRecvFrom { .. } => mismatch::INVALID_RECV_FROM,
            InvalidAddressOf { .. } => mismatch::INVALID_ADDRESS_OF,
            BadMapIndex { .. } => mismatch::BAD_MAP_INDEX,
            NonIntegerIndex { .. } => mismatch::NON_INTEGER_INDEX,
            InvalidIndexOperation { .. } => mismatch::INVALID_INDEX_OPERATION,
            TypeUsedAsExpression { .. } => mismatch::TYPE_USED_AS_EXPRESSION,

            BadConstConversion { .. } => constants::BAD_CONST_CONVERSION,
            TruncatedConstant { .. } => constants::TRUNCATED_CONSTANT,
            OverflowedConstant { .. } => constants::OVERFLOWED_CONSTANT,
            UntypedNil => constants::UNTYPED_NIL,
            DuplicateMapKey { .. } => constants::DUPLICATE_MAP_KEY,
            DuplicateArrayKey { .. } => constants::DUPLICATE_ARRAY_KEY,
            DuplicateStructField { .. } => constants::DUPLICATE_STRUCT_FIELD,

            IndexOutOfBounds { .. } => structural::INDEX_OUT_OF_BOUNDS,
            DivideByZero => structural::DIVIDE_BY_ZERO,
            ArrayKeyOutOfBounds { .. } => structural::ARRAY_KEY_OUT_OF_BOUNDS,
            BadArrayKey => structural::BAD_ARRAY_KEY,
            UnknownStructField { .. } => structural::UNKNOWN_STRUCT_FIELD,
            InvalidStructField { .. } => structural::INVALID_STRUCT_FIELD,
            CallNonFuncType { .. } => structural::CALL_NON_FUNC_TYPE,
            Undefined { .. } => structural::UNDEFINED,
            BadLiteral { .. } => structural::BAD_LITERAL,
            MissingCompositeLitType => structural::MISSING_COMPOSITE_LIT_TYPE,
            InvalidCompositeLitType { .. } => structural::INVALID_COMPOSITE_LIT_TYPE,
            BadArrayBound { .. } => structural::BAD_ARRAY_BOUND,
            BuiltinNotCalled { .. } => structural::BUILTIN_NOT_CALLED,
        }
    }

    /// Render the reference compiler's message for this diagnostic
    pub fn message(&self) -> String {
        use DiagnosticKind::*;
        match self {
            WrongNumberOfArgs {
                num_args,
                conversion,
                fun,
                not_enough,
            } => match conversion {
                Some(to) => {
                    if *num_args == 0 {
                        format!("missing argument to conversion to {}", to)
                    } else {
                        format!("too many arguments to conversion to {}", to)
                    }
                }
                None => {
                    if *not_enough {
                        format!("not enough arguments in call to {}", fun)
                    } else {
                        format!("too many arguments in call to {}", fun)
                    }
                }
            },
            BuiltinWrongNumberOfArgs {
                builtin,
                num_args,
                first_arg,
                call,
            } => builtin_arity_message(builtin, *num_args, first_arg.as_deref(), call),
            WrongNumberOfStructValues { actual, expected } => {
                if actual < expected {
                    "too few values in struct initializer".to_string()
                } else {
                    "too many values in struct initializer".to_string()
                }
            }
            MissingMapKey => "missing key in map literal".to_string(),
            MixedStructValues => "mixture of field:value and value initializers".to_string(),
            InvalidEllipsis { fun } => format!("invalid use of ... in call to {}", fun),
            BuiltinInvalidEllipsis { builtin } => {
                format!("invalid use of ... with builtin {}", builtin)
            }
            AppendFirstArgNotVariadic => "cannot use ... on first argument to append".to_string(),
            MissingValue { expr } => format!("{} used as value", expr),
            MultiInSingleContext { expr } => {
                format!("multiple-value {} in single-value context", expr)
            }

            WrongArgType {
                arg,
                actual,
                expected,
                fun,
                spread,
                ..
            } => {
                if *spread {
                    format!("cannot use {} as type {} in argument to {}", actual, expected, fun)
                } else {
                    format!(
                        "cannot use {} (type {}) as type {} in function argument",
                        arg, actual, expected
                    )
                }
            }
            BuiltinWrongArgType {
                builtin,
                arg,
                arg_type,
                expected,
                call,
            } => match builtin.as_str() {
                "complex" | "real" | "imag" => format!(
                    "invalid operation: {} (arguments have type {}, expected floating-point)",
                    call,
                    arg_type.error_type()
                ),
                "append" | "delete" => {
                    let expected = expected
                        .as_ref()
                        .map(|t| t.to_string())
                        .unwrap_or_default();
                    if matches!(arg_type, ExprType::Const(ConstKind::Nil)) {
                        format!("cannot use nil as type {} in {}", expected, builtin)
                    } else {
                        format!(
                            "cannot use {} (type {}) as type {} in {}",
                            arg, arg_type, expected, builtin
                        )
                    }
                }
                _ => format!("invalid argument {} (type {}) for {}", arg, arg_type, builtin),
            },
            BuiltinMismatchedArgs { x, y, call } => {
                let (xs, ys) = mismatched_pair(x, y);
                format!("invalid operation: {} (mismatched types {} and {})", call, xs, ys)
            }
            BuiltinNonTypeArg { expr } => format!("{} is not a type", expr),
            BadMapKey { key, ty, key_type } => {
                if matches!(ty, ExprType::Const(ConstKind::Nil)) {
                    format!("cannot use nil as type {} in map key", key_type)
                } else {
                    format!("cannot use {} (type {}) as type {} in map key", key, ty, key_type)
                }
            }
            BadMapValue { value, ty, elem } => {
                if matches!(ty, ExprType::Const(ConstKind::Nil)) {
                    format!("cannot use nil as type {} in map value", elem)
                } else {
                    format!("cannot use {} (type {}) as type {} in map value", value, ty, elem)
                }
            }
            BadArrayValue { value, ty, elem } => {
                if matches!(ty, ExprType::Const(ConstKind::Nil)) {
                    format!("cannot use nil as type {} in array element", elem)
                } else {
                    format!(
                        "cannot use {} (type {}) as type {} in array element",
                        value, ty, elem
                    )
                }
            }
            BadStructValue {
                value,
                ty,
                field_type,
            } => {
                if matches!(ty, ExprType::Const(ConstKind::Nil)) {
                    format!("cannot use nil as type {} in field value", field_type)
                } else {
                    format!(
                        "cannot use {} (type {}) as type {} in field value",
                        value, ty, field_type
                    )
                }
            }
            InvalidTypeAssert { expr, ty } => format!(
                "invalid type assertion: {} (non-interface type {} on left)",
                expr, ty
            ),
            ImpossibleTypeAssert { from, to, missing } => format!(
                "impossible type assertion:\n\t{} does not implement {} (missing {} method)",
                from, to, missing
            ),
            InvalidBinaryOp {
                x,
                op,
                y,
                xt,
                yt,
                const_operands,
                float_rem,
                undefined_on,
            } => {
                if *float_rem {
                    "illegal constant expression: floating-point % operation".to_string()
                } else if *const_operands {
                    format!(
                        "illegal constant expression: {} {} {}",
                        xt.error_type(),
                        op,
                        yt.error_type()
                    )
                } else if let Some(on) = undefined_on {
                    format!(
                        "invalid operation: {} {} {} (operator {} not defined on {})",
                        x, op, y, op, on
                    )
                } else {
                    format!(
                        "invalid operation: {} {} {} (mismatched types {} and {})",
                        x,
                        op,
                        y,
                        operand_type(xt),
                        operand_type(yt)
                    )
                }
            }
            InvalidUnaryOp { op, ty, xor_const } => {
                if *xor_const {
                    format!("illegal constant expression ^ {}", ty.error_type())
                } else {
                    format!("invalid operation: {} {}", op, ty.error_type())
                }
            }
            BadConversion { expr, from, to } => {
                format!("cannot convert {} (type {}) to type {}", expr, from, to)
            }
            MakeBadType { of } => format!("cannot make type {}", of),
            MakeNonIntegerArg { which, arg } => {
                let culprit = if *which == 1 { "len" } else { "cap" };
                format!("make: non-integer {} argument {}", culprit, arg)
            }
            MakeLenGtrThanCap { call, .. } => format!("len larger than cap in {}", call),
            AppendFirstArgNotSlice { ty } => {
                if matches!(ty, ExprType::Const(ConstKind::Nil)) {
                    "first argument to append must be typed slice; have untyped nil".to_string()
                } else {
                    format!("first argument to append must be slice; have {}", ty.error_type())
                }
            }
            CopyArgsMustBeSlices { x, y } => {
                let x_slice = matches!(x, ExprType::Concrete(Type::Slice(_)));
                let y_slice = matches!(y, ExprType::Concrete(Type::Slice(_)));
                if y_slice {
                    format!("first argument to copy should be slice; have {}", x)
                } else if x_slice {
                    format!("second argument to copy should be slice or string; have {}", y)
                } else {
                    format!("arguments to copy must be slices; have {}, {}", x, y)
                }
            }
            CopyArgsHaveDifferentEltTypes { x, y } => format!(
                "arguments to copy have different element types: {} and {}",
                x, y
            ),
            DeleteFirstArgNotMap { ty } => {
                format!("first argument to delete must be map; have {}", ty.error_type())
            }
            InvalidIndirect { expr, ty } => match ty {
                ExprType::Const(ConstKind::Nil) => "invalid indirect of nil".to_string(),
                ExprType::Const(_) => {
                    format!("invalid indirect of {} (type {})", expr, ty.error_type())
                }
                ExprType::Concrete(t) => format!("invalid indirect of {} (type {})", expr, t),
            },
            UndefinedFieldOrMethod { expr, ty, field } => format!(
                "{} undefined (type {} has no field or method {})",
                expr, ty, field
            ),
            InvalidRecvFrom { expr, ty } => format!(
                "invalid operation: <-{} (receive from non-chan type {})",
                expr, ty
            ),
            InvalidAddressOf { expr } => format!("cannot take the address of {}", expr),
            BadMapIndex { index, ty, key_type } => {
                if ty.is_const() {
                    format!("cannot use {} as type {} in map index", index, key_type)
                } else {
                    format!(
                        "cannot use {} (type {}) as type {} in map index",
                        index, ty, key_type
                    )
                }
            }
            NonIntegerIndex { index, on_string } => {
                let xname = if *on_string { "string" } else { "array" };
                format!("non-integer {} index {}", xname, index)
            }
            InvalidIndexOperation { expr, ty } => {
                format!("invalid operation: {} (index of type {})", expr, ty)
            }
            TypeUsedAsExpression { name } => format!("type {} is not an expression", name),

            BadConstConversion { expr, to, .. } => {
                format!("cannot convert {} to type {}", expr, to)
            }
            TruncatedConstant {
                to_integer,
                constant,
            } => {
                if *to_integer {
                    format!("constant {} truncated to integer", constant)
                } else {
                    format!("constant {} truncated to real", constant)
                }
            }
            OverflowedConstant { constant, to, .. } => {
                if matches!(to, ExprType::Const(ConstKind::String)) {
                    "overflow in int -> string".to_string()
                } else {
                    format!("constant {} overflows {}", constant, to)
                }
            }
            UntypedNil => "use of untyped nil".to_string(),
            DuplicateMapKey { key } => format!("duplicate key {} in map literal", key),
            DuplicateArrayKey { index } => format!("duplicate index in array literal: {}", index),
            DuplicateStructField { field } => {
                format!("duplicate field name in struct literal: {}", field)
            }

            IndexOutOfBounds {
                index,
                on_string,
                length,
                value,
            } => {
                let (xname, eltname) = if *on_string {
                    ("string", "byte")
                } else {
                    ("array", "element")
                };
                if *value < 0 {
                    format!("invalid {} index {} (index must be non negative)", xname, index)
                } else {
                    format!(
                        "invalid {} index {} (out of bounds for {}-{} {})",
                        xname, index, length, eltname, xname
                    )
                }
            }
            DivideByZero => "division by zero".to_string(),
            ArrayKeyOutOfBounds { index, length } => {
                // The reference compiler prints the one-past value here
                format!("array index {} out of bounds [0:{}]", index + 1, length)
            }
            BadArrayKey => "array index must be non-negative integer constant".to_string(),
            UnknownStructField { struct_type, field } => {
                format!("unknown {} field '{}' in struct literal", struct_type, field)
            }
            InvalidStructField { key } => {
                format!("invalid field name {} in struct initializer", key)
            }
            CallNonFuncType { fun, ty } => {
                format!("cannot call non-function {} (type {})", fun, ty)
            }
            Undefined { name } => format!("undefined: {}", name),
            BadLiteral { text } => format!("Bad literal {}", text),
            MissingCompositeLitType => "missing type in composite literal".to_string(),
            InvalidCompositeLitType { ty } => {
                format!("invalid type for composite literal: {}", ty)
            }
            BadArrayBound { expr, negative } => {
                if *negative {
                    "array bound must be non-negative".to_string()
                } else {
                    format!("non-constant array bound {}", expr)
                }
            }
            BuiltinNotCalled { name } => {
                format!("use of builtin {} not in function call", name)
            }
        }
    }
}

/// Untyped nil prints as "nil" in mismatched-type positions; other constants
/// print as their default promotion's name.
fn operand_type(t: &ExprType) -> String {
    match t {
        ExprType::Const(ConstKind::Nil) => "nil".to_string(),
        other => other.to_string(),
    }
}

fn mismatched_pair(x: &ExprType, y: &ExprType) -> (String, String) {
    match (x, y) {
        (ExprType::Const(cx), ExprType::Const(cy)) => {
            (cx.error_type().to_string(), cy.error_type().to_string())
        }
        (ExprType::Const(ConstKind::Nil), _) => ("nil".to_string(), y.to_string()),
        (_, ExprType::Const(ConstKind::Nil)) => (x.to_string(), "nil".to_string()),
        _ => (x.to_string(), y.to_string()),
    }
}

/// Per-builtin arity message, replicating the reference compiler's causes
fn builtin_arity_message(
    builtin: &str,
    num_args: usize,
    first_arg: Option<&str>,
    call: &str,
) -> String {
    let mut too_many = false;
    let mut plural = "";
    let mut cause = String::new();
    match builtin {
        "complex" => {
            if num_args == 0 {
                cause = " - complex(<N>, <N>)".to_string();
            } else {
                too_many = num_args > 2;
                cause = format!(" - complex({}, <N>)", first_arg.unwrap_or(""));
            }
        }
        "new" => {
            if num_args != 0 {
                too_many = true;
                cause = format!("({})", first_arg.unwrap_or(""));
            }
        }
        "make" => {
            if num_args == 1 {
                return format!("too few arguments to make: {}", call);
            } else if num_args != 0 {
                too_many = true;
                cause = format!(": {}", call);
            }
        }
        "copy" => {
            if num_args < 2 {
                plural = "s";
            } else {
                too_many = true;
            }
        }
        "delete" => {
            if num_args == 0 {
                plural = "s";
            } else if num_args == 1 {
                return "missing second (key) argument to delete".to_string();
            } else {
                too_many = true;
            }
        }
        "append" => return "missing arguments to append".to_string(),
        _ => {
            cause = format!(": {}", call);
            too_many = num_args != 0;
        }
    }
    if too_many {
        format!("too many arguments to {}{}", builtin, cause)
    } else {
        format!("missing argument{} to {}{}", plural, builtin, cause)
    }
}

/// A checker diagnostic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable error code (e.g., "E1301")
    pub code: String,

    /// Severity level
    pub severity: Severity,

    /// Rendered message, matching the reference compiler's wording
    pub message: String,

    /// Primary source span
    pub span: Span,

    /// Structured payload
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// Create an error diagnostic from a structured kind
    pub fn new(kind: DiagnosticKind, span: Span) -> Self {
        Self {
            code: kind.code().to_string(),
            severity: Severity::Error,
            message: kind.message(),
            span,
            kind,
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// Format as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format as human-readable string
    pub fn to_human_readable(&self) -> String {
        format!(
            "error[{}]: {}\n  --> {}:{}:{}",
            self.code,
            self.message,
            self.span.file.display(),
            self.span.start_line,
            self.span.start_col
        )
    }
}

/// An ordered collection of diagnostics.
///
/// Append-only; the push order is the traversal order and is part of the
/// conformance contract.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    /// Create a new empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    /// Count errors
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Get all diagnostics
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take all diagnostics
    pub fn take(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Merge another bag into this one, preserving order
    pub fn merge(&mut self, other: DiagnosticBag) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Get the number of diagnostics
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Check if the bag is empty
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Format all diagnostics as JSON
    pub fn to_json(&self) -> String {
        let json_array: Vec<String> = self.diagnostics.iter().map(|d| d.to_json()).collect();
        format!("[{}]", json_array.join(","))
    }

    /// Format all diagnostics as human-readable text
    pub fn format_text(&self) -> String {
        self.diagnostics
            .iter()
            .map(|d| d.to_human_readable())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Diagnostic> for DiagnosticBag {
    fn from(diagnostic: Diagnostic) -> Self {
        let mut bag = DiagnosticBag::new();
        bag.push(diagnostic);
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_json() {
        let diag = Diagnostic::new(
            DiagnosticKind::Undefined {
                name: "x".to_string(),
            },
            Span::new("test.ty", 0, 1, 1, 1),
        );
        let json = diag.to_json();
        assert!(json.contains(structural::UNDEFINED));
        assert!(json.contains("undefined: x"));
    }

    #[test]
    fn test_span_merge() {
        let span1 = Span::new("test.ty", 10, 20, 1, 10);
        let span2 = Span::new("test.ty", 15, 30, 1, 15);
        let merged = span1.merge(&span2);
        assert_eq!(merged.start, 10);
        assert_eq!(merged.end, 30);
    }

    #[test]
    fn test_untyped_nil_message() {
        let diag = Diagnostic::new(DiagnosticKind::UntypedNil, Span::file("repl"));
        assert_eq!(diag.message, "use of untyped nil");
        assert_eq!(diag.code, constants::UNTYPED_NIL);
    }

    #[test]
    fn test_builtin_arity_messages() {
        assert_eq!(
            builtin_arity_message("complex", 0, None, "complex()"),
            "missing argument to complex - complex(<N>, <N>)"
        );
        assert_eq!(
            builtin_arity_message("complex", 3, Some("1"), "complex(1, 2, 3)"),
            "too many arguments to complex - complex(1, <N>)"
        );
        assert_eq!(
            builtin_arity_message("make", 1, Some("[]int"), "make([]int)"),
            "too few arguments to make: make([]int)"
        );
        assert_eq!(
            builtin_arity_message("delete", 1, Some("m"), "delete(m)"),
            "missing second (key) argument to delete"
        );
        assert_eq!(
            builtin_arity_message("append", 0, None, "append()"),
            "missing arguments to append"
        );
        assert_eq!(
            builtin_arity_message("copy", 1, Some("s"), "copy(s)"),
            "missing arguments to copy"
        );
    }

    #[test]
    fn test_bag_order_preserved() {
        let mut bag = DiagnosticBag::new();
        bag.push(Diagnostic::new(DiagnosticKind::UntypedNil, Span::file("a")));
        bag.push(Diagnostic::new(DiagnosticKind::DivideByZero, Span::file("a")));
        assert_eq!(bag.len(), 2);
        assert_eq!(bag.diagnostics()[0].message, "use of untyped nil");
        assert_eq!(bag.diagnostics()[1].message, "division by zero");
    }
}
