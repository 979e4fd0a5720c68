//! Error code definitions and documentation

/// Arity and shape errors (E11xx)
pub mod shape {
    pub const WRONG_NUMBER_OF_ARGS: &str = "E1101";
    pub const BUILTIN_WRONG_NUMBER_OF_ARGS: &str = "E1102";
    pub const WRONG_NUMBER_OF_STRUCT_VALUES: &str = "E1103";
    pub const MISSING_MAP_KEY: &str = "E1104";
    pub const MIXED_STRUCT_VALUES: &str = "E1105";
    pub const INVALID_ELLIPSIS: &str = "E1106";
    pub const BUILTIN_INVALID_ELLIPSIS: &str = "E1107";
    pub const APPEND_FIRST_ARG_NOT_VARIADIC: &str = "E1108";
    pub const MISSING_VALUE: &str = "E1109";
    pub const MULTI_IN_SINGLE_CONTEXT: &str = "E1110";
}

/// Type mismatch errors (E12xx)
pub mod mismatch {
    pub const WRONG_ARG_TYPE: &str = "E1201";
    pub const BUILTIN_WRONG_ARG_TYPE: &str = "E1202";
    pub const BUILTIN_MISMATCHED_ARGS: &str = "E1203";
    pub const BUILTIN_NON_TYPE_ARG: &str = "E1204";
    pub const BAD_MAP_KEY: &str = "E1205";
    pub const BAD_MAP_VALUE: &str = "E1206";
    pub const BAD_ARRAY_VALUE: &str = "E1207";
    pub const BAD_STRUCT_VALUE: &str = "E1208";
    pub const INVALID_TYPE_ASSERT: &str = "E1209";
    pub const IMPOSSIBLE_TYPE_ASSERT: &str = "E1210";
    pub const INVALID_BINARY_OP: &str = "E1211";
    pub const INVALID_UNARY_OP: &str = "E1212";
    pub const BAD_CONVERSION: &str = "E1213";
    pub const MAKE_BAD_TYPE: &str = "E1214";
    pub const MAKE_NON_INTEGER_ARG: &str = "E1215";
    pub const APPEND_FIRST_ARG_NOT_SLICE: &str = "E1216";
    pub const COPY_ARGS_MUST_BE_SLICES: &str = "E1217";
    pub const COPY_ARGS_DIFFERENT_ELT_TYPES: &str = "E1218";
    pub const DELETE_FIRST_ARG_NOT_MAP: &str = "E1219";
    pub const MAKE_LEN_GTR_THAN_CAP: &str = "E1220";
    pub const INVALID_INDIRECT: &str = "E1221";
    pub const UNDEFINED_FIELD_OR_METHOD: &str = "E1222";
    pub const INVALID_RECV_FROM: &str = "E1223";
    pub const INVALID_ADDRESS_OF: &str = "E1224";
    pub const BAD_MAP_INDEX: &str = "E1225";
    pub const NON_INTEGER_INDEX: &str = "E1226";
    pub const INVALID_INDEX_OPERATION: &str = "E1227";
    pub const TYPE_USED_AS_EXPRESSION: &str = "E1228";
}

/// Constant conversion and folding errors (E13xx)
pub mod constants {
    pub const BAD_CONST_CONVERSION: &str = "E1301";
    pub const TRUNCATED_CONSTANT: &str = "E1302";
    pub const OVERFLOWED_CONSTANT: &str = "E1303";
    pub const UNTYPED_NIL: &str = "E1304";
    pub const DUPLICATE_MAP_KEY: &str = "E1305";
    pub const DUPLICATE_ARRAY_KEY: &str = "E1306";
    pub const DUPLICATE_STRUCT_FIELD: &str = "E1307";
}

/// Structural errors (E14xx)
pub mod structural {
    pub const INDEX_OUT_OF_BOUNDS: &str = "E1401";
    pub const DIVIDE_BY_ZERO: &str = "E1402";
    pub const ARRAY_KEY_OUT_OF_BOUNDS: &str = "E1403";
    pub const BAD_ARRAY_KEY: &str = "E1404";
    pub const UNKNOWN_STRUCT_FIELD: &str = "E1405";
    pub const INVALID_STRUCT_FIELD: &str = "E1406";
    pub const CALL_NON_FUNC_TYPE: &str = "E1407";
    pub const UNDEFINED: &str = "E1408";
    pub const BAD_LITERAL: &str = "E1409";
    pub const MISSING_COMPOSITE_LIT_TYPE: &str = "E1410";
    pub const INVALID_COMPOSITE_LIT_TYPE: &str = "E1411";
    pub const BAD_ARRAY_BOUND: &str = "E1412";
    pub const BUILTIN_NOT_CALLED: &str = "E1413";
}
