//! Exact constant values and arithmetic
//!
//! Untyped constants are evaluated with arbitrary-precision rationals; no
//! precision is lost until a constant is committed to a concrete type. A
//! numeric constant is a pair of rationals (real and imaginary parts) tagged
//! with its kind on the promotion ladder int < rune < float < complex.

use num_bigint::{BigInt, Sign};
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Span};
use crate::syntax::LitKind;
use crate::types::{ConstKind, ExprType, Type};

/// An exact numeric constant
#[derive(Debug, Clone, PartialEq)]
pub struct ConstNumber {
    pub re: BigRational,
    pub im: BigRational,
    /// One of Int, Rune, Float, Complex
    pub kind: ConstKind,
}

impl ConstNumber {
    pub fn from_int(v: impl Into<BigInt>) -> Self {
        ConstNumber {
            re: BigRational::from_integer(v.into()),
            im: BigRational::zero(),
            kind: ConstKind::Int,
        }
    }

    pub fn from_rune(code: u32) -> Self {
        ConstNumber {
            re: BigRational::from_integer(BigInt::from(code)),
            im: BigRational::zero(),
            kind: ConstKind::Rune,
        }
    }

    pub fn from_rational(re: BigRational) -> Self {
        ConstNumber {
            re,
            im: BigRational::zero(),
            kind: ConstKind::Float,
        }
    }

    pub fn from_imag(im: BigRational) -> Self {
        ConstNumber {
            re: BigRational::zero(),
            im,
            kind: ConstKind::Complex,
        }
    }

    /// Re-tag with a (possibly wider) kind
    pub fn with_kind(mut self, kind: ConstKind) -> Self {
        self.kind = kind;
        self
    }

    /// True when the value is a real integer
    pub fn is_integer(&self) -> bool {
        self.re.is_integer() && self.im.is_zero()
    }

    /// Truncate toward zero to an arbitrary-precision integer, reporting
    /// whether the real part carried a fractional component.
    pub fn to_bigint(&self) -> (BigInt, bool) {
        let truncated = !self.re.is_integer();
        (self.re.to_integer(), truncated)
    }

    /// Convert to an integer of the given width, two's-complement wrapping on
    /// overflow. Returns (wrapped value, truncated, overflowed).
    pub fn to_int(&self, bits: u32, signed: bool) -> (BigInt, bool, bool) {
        let (v, truncated) = self.to_bigint();
        let (wrapped, overflowed) = wrap_int(&v, bits, signed);
        (wrapped, truncated, overflowed)
    }

    /// Real part as f64; reports whether a nonzero imaginary part was dropped
    pub fn to_f64(&self) -> (f64, bool) {
        let truncated = !self.im.is_zero();
        (self.re.to_f64().unwrap_or(f64::NAN), truncated)
    }

    pub fn to_complex(&self) -> (f64, f64) {
        (
            self.re.to_f64().unwrap_or(f64::NAN),
            self.im.to_f64().unwrap_or(f64::NAN),
        )
    }
}

/// Wrap an integer into an n-bit two's-complement (or unsigned) range
fn wrap_int(v: &BigInt, bits: u32, signed: bool) -> (BigInt, bool) {
    let modulus: BigInt = BigInt::one() << bits;
    let (lo, hi) = if signed {
        let half: BigInt = BigInt::one() << (bits - 1);
        (-half.clone(), half - 1)
    } else {
        (BigInt::zero(), modulus.clone() - 1)
    };
    if *v >= lo && *v <= hi {
        return (v.clone(), false);
    }
    let mut r = v % &modulus;
    if r.sign() == Sign::Minus {
        r += &modulus;
    }
    if signed && r >= (BigInt::one() << (bits - 1)) {
        r -= &modulus;
    }
    (r, true)
}

fn rational_str(r: &BigRational) -> String {
    if r.is_integer() {
        r.to_integer().to_string()
    } else {
        // Inexact rendering is fine for messages; the value itself stays exact
        format!("{}", r.to_f64().unwrap_or(f64::NAN))
    }
}

impl fmt::Display for ConstNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im.is_zero() && self.kind != ConstKind::Complex {
            write!(f, "{}", rational_str(&self.re))
        } else {
            write!(f, "({}+{}i)", rational_str(&self.re), rational_str(&self.im))
        }
    }
}

/// The value of an untyped constant
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    String(String),
    Number(ConstNumber),
    Nil,
}

impl ConstValue {
    /// The kind classifying this value
    pub fn kind(&self) -> ConstKind {
        match self {
            ConstValue::Bool(_) => ConstKind::Bool,
            ConstValue::String(_) => ConstKind::String,
            ConstValue::Number(n) => n.kind,
            ConstValue::Nil => ConstKind::Nil,
        }
    }

    pub fn as_number(&self) -> Option<&ConstNumber> {
        match self {
            ConstValue::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Parse a source literal into a constant. `text` is the literal exactly
    /// as written, including quotes for runes and strings.
    pub fn from_literal(kind: LitKind, text: &str) -> Option<(ConstKind, ConstValue)> {
        match kind {
            LitKind::Int => {
                let v = parse_int_literal(text)?;
                Some((ConstKind::Int, ConstValue::Number(ConstNumber::from_int(v))))
            }
            LitKind::Float => {
                let r = parse_float_literal(text)?;
                Some((
                    ConstKind::Float,
                    ConstValue::Number(ConstNumber::from_rational(r)),
                ))
            }
            LitKind::Imag => {
                let body = text.strip_suffix('i')?;
                let r = parse_int_literal(body)
                    .map(BigRational::from_integer)
                    .or_else(|| parse_float_literal(body))?;
                Some((
                    ConstKind::Complex,
                    ConstValue::Number(ConstNumber::from_imag(r)),
                ))
            }
            LitKind::Rune => {
                let code = parse_rune_literal(text)?;
                Some((
                    ConstKind::Rune,
                    ConstValue::Number(ConstNumber::from_rune(code)),
                ))
            }
            LitKind::String => {
                let s = parse_string_literal(text)?;
                Some((ConstKind::String, ConstValue::String(s)))
            }
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::String(s) => write!(f, "{:?}", s),
            ConstValue::Number(n) => write!(f, "{}", n),
            ConstValue::Nil => write!(f, "nil"),
        }
    }
}

/// The value of a constant after commitment to a concrete type
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(f64, f64),
    String(String),
    Bytes(Vec<u8>),
    Nil,
}

// ---------------------------------------------------------------------------
// Literal parsing
// ---------------------------------------------------------------------------

fn parse_int_literal(text: &str) -> Option<BigInt> {
    let t = text.as_bytes();
    if t.is_empty() {
        return None;
    }
    let (radix, digits) = if text.len() > 2 && t[0] == b'0' {
        match t[1] {
            b'x' | b'X' => (16, &text[2..]),
            b'o' | b'O' => (8, &text[2..]),
            b'b' | b'B' => (2, &text[2..]),
            _ => (8, &text[1..]),
        }
    } else if text.len() > 1 && t[0] == b'0' {
        (8, &text[1..])
    } else {
        (10, text)
    };
    BigInt::parse_bytes(digits.as_bytes(), radix)
}

fn pow10(exp: u32) -> BigInt {
    let mut r = BigInt::one();
    let ten = BigInt::from(10);
    for _ in 0..exp {
        r *= &ten;
    }
    r
}

/// Parse a decimal floating literal exactly: `12.345e-6` becomes the rational
/// 12345 / 10^3 * 10^-6.
fn parse_float_literal(text: &str) -> Option<BigRational> {
    let (mantissa, exp_str) = match text.find(['e', 'E']) {
        Some(i) => (&text[..i], Some(&text[i + 1..])),
        None => (text, None),
    };
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(i) => (&mantissa[..i], &mantissa[i + 1..]),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let digits = format!("{}{}", int_part, frac_part);
    let digits = if digits.is_empty() { "0".into() } else { digits };
    let numer = BigInt::parse_bytes(digits.as_bytes(), 10)?;
    let mut value = BigRational::new(numer, pow10(frac_part.len() as u32));
    if let Some(e) = exp_str {
        let exp: i32 = e.parse().ok()?;
        let scale = BigRational::from_integer(pow10(exp.unsigned_abs()));
        if exp >= 0 {
            value *= scale;
        } else {
            value /= scale;
        }
    }
    Some(value)
}

/// Decode one escape sequence starting after the backslash. Returns the code
/// point and the number of bytes consumed.
fn decode_escape(rest: &[u8], in_string: bool) -> Option<(u32, usize)> {
    let c = *rest.first()?;
    let simple = match c {
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'f' => Some(0x0C),
        b'n' => Some(b'\n' as u32),
        b'r' => Some(b'\r' as u32),
        b't' => Some(b'\t' as u32),
        b'v' => Some(0x0B),
        b'\\' => Some(b'\\' as u32),
        b'\'' if !in_string => Some(b'\'' as u32),
        b'"' if in_string => Some(b'"' as u32),
        _ => None,
    };
    if let Some(v) = simple {
        return Some((v, 1));
    }
    let hex = |n: usize| -> Option<u32> {
        let s = std::str::from_utf8(rest.get(1..1 + n)?).ok()?;
        u32::from_str_radix(s, 16).ok()
    };
    match c {
        b'x' => Some((hex(2)?, 3)),
        b'u' => Some((hex(4)?, 5)),
        b'U' => Some((hex(8)?, 9)),
        b'0'..=b'7' => {
            let s = std::str::from_utf8(rest.get(0..3)?).ok()?;
            let v = u32::from_str_radix(s, 8).ok()?;
            if v > 255 {
                return None;
            }
            Some((v, 3))
        }
        _ => None,
    }
}

fn parse_rune_literal(text: &str) -> Option<u32> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let bytes = inner.as_bytes();
    if bytes.first() == Some(&b'\\') {
        let (code, consumed) = decode_escape(&bytes[1..], false)?;
        if consumed + 1 != bytes.len() {
            return None;
        }
        Some(code)
    } else {
        let mut chars = inner.chars();
        let c = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        Some(c as u32)
    }
}

fn parse_string_literal(text: &str) -> Option<String> {
    if let Some(raw) = text.strip_prefix('`') {
        return raw.strip_suffix('`').map(|s| s.to_string());
    }
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let bytes = inner.as_bytes();
    let mut out = String::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let (code, consumed) = decode_escape(&bytes[i + 1..], true)?;
            out.push(char::from_u32(code)?);
            i += 1 + consumed;
        } else {
            // Advance by whole characters
            let s = &inner[i..];
            let c = s.chars().next()?;
            out.push(c);
            i += c.len_utf8();
        }
    }
    Some(out)
}

// ---------------------------------------------------------------------------
// Promotion
// ---------------------------------------------------------------------------

/// Promote two numeric constants to their common kind
pub fn promote_numbers(a: &ConstNumber, b: &ConstNumber) -> (ConstNumber, ConstNumber, ConstKind) {
    let kind = a.kind.promote(b.kind).unwrap_or(a.kind);
    (
        a.clone().with_kind(kind),
        b.clone().with_kind(kind),
        kind,
    )
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

/// Failures during exact constant folding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithError {
    DivideByZero,
    /// `%` applied to non-integer constants
    FloatRem,
    /// Bitwise operation on non-integer constants
    NonIntegerBitwise,
    /// Shift count is negative or fractional
    BadShiftCount,
}

impl ConstNumber {
    pub fn add(&self, rhs: &ConstNumber) -> ConstNumber {
        let (a, b, kind) = promote_numbers(self, rhs);
        ConstNumber {
            re: a.re + b.re,
            im: a.im + b.im,
            kind,
        }
    }

    pub fn sub(&self, rhs: &ConstNumber) -> ConstNumber {
        let (a, b, kind) = promote_numbers(self, rhs);
        ConstNumber {
            re: a.re - b.re,
            im: a.im - b.im,
            kind,
        }
    }

    pub fn mul(&self, rhs: &ConstNumber) -> ConstNumber {
        let (a, b, kind) = promote_numbers(self, rhs);
        ConstNumber {
            re: &a.re * &b.re - &a.im * &b.im,
            im: &a.re * &b.im + &a.im * &b.re,
            kind,
        }
    }

    pub fn div(&self, rhs: &ConstNumber) -> Result<ConstNumber, ArithError> {
        let (a, b, kind) = promote_numbers(self, rhs);
        let denom = &b.re * &b.re + &b.im * &b.im;
        if denom.is_zero() {
            return Err(ArithError::DivideByZero);
        }
        let re = (&a.re * &b.re + &a.im * &b.im) / &denom;
        let im = (&a.im * &b.re - &a.re * &b.im) / &denom;
        if kind.is_integral() {
            // Integer constants divide with truncation
            let q = re.to_integer();
            return Ok(ConstNumber {
                re: BigRational::from_integer(q),
                im: BigRational::zero(),
                kind,
            });
        }
        Ok(ConstNumber { re, im, kind })
    }

    pub fn rem(&self, rhs: &ConstNumber) -> Result<ConstNumber, ArithError> {
        let (a, b, kind) = promote_numbers(self, rhs);
        if !kind.is_integral() {
            return Err(ArithError::FloatRem);
        }
        let (bv, _) = b.to_bigint();
        if bv.is_zero() {
            return Err(ArithError::DivideByZero);
        }
        let (av, _) = a.to_bigint();
        // Truncated division remainder, sign follows the dividend
        let r = &av - (&av / &bv) * &bv;
        Ok(ConstNumber {
            re: BigRational::from_integer(r),
            im: BigRational::zero(),
            kind,
        })
    }

    fn bit_op(
        &self,
        rhs: &ConstNumber,
        f: impl Fn(&BigInt, &BigInt) -> BigInt,
    ) -> Result<ConstNumber, ArithError> {
        let (a, b, kind) = promote_numbers(self, rhs);
        if !kind.is_integral() || !a.is_integer() || !b.is_integer() {
            return Err(ArithError::NonIntegerBitwise);
        }
        let (av, _) = a.to_bigint();
        let (bv, _) = b.to_bigint();
        Ok(ConstNumber {
            re: BigRational::from_integer(f(&av, &bv)),
            im: BigRational::zero(),
            kind,
        })
    }

    pub fn bitand(&self, rhs: &ConstNumber) -> Result<ConstNumber, ArithError> {
        self.bit_op(rhs, |a, b| a & b)
    }

    pub fn bitor(&self, rhs: &ConstNumber) -> Result<ConstNumber, ArithError> {
        self.bit_op(rhs, |a, b| a | b)
    }

    pub fn bitxor(&self, rhs: &ConstNumber) -> Result<ConstNumber, ArithError> {
        self.bit_op(rhs, |a, b| a ^ b)
    }

    pub fn bitandnot(&self, rhs: &ConstNumber) -> Result<ConstNumber, ArithError> {
        self.bit_op(rhs, |a, b| a & &!b)
    }

    pub fn shift(&self, count: &ConstNumber, left: bool) -> Result<ConstNumber, ArithError> {
        if !self.kind.is_integral() || !self.is_integer() {
            return Err(ArithError::NonIntegerBitwise);
        }
        if !count.is_integer() {
            return Err(ArithError::BadShiftCount);
        }
        let (n, _) = count.to_bigint();
        if n.sign() == Sign::Minus {
            return Err(ArithError::BadShiftCount);
        }
        let n = n.to_u64().ok_or(ArithError::BadShiftCount)? as usize;
        let (v, _) = self.to_bigint();
        let r = if left { v << n } else { v >> n };
        Ok(ConstNumber {
            re: BigRational::from_integer(r),
            im: BigRational::zero(),
            kind: self.kind,
        })
    }

    pub fn neg(&self) -> ConstNumber {
        ConstNumber {
            re: -self.re.clone(),
            im: -self.im.clone(),
            kind: self.kind,
        }
    }

    /// Bitwise complement `^x`, defined as `-(x+1)` on untyped integers
    pub fn bitnot(&self) -> Result<ConstNumber, ArithError> {
        if !self.kind.is_integral() || !self.is_integer() {
            return Err(ArithError::NonIntegerBitwise);
        }
        let (v, _) = self.to_bigint();
        Ok(ConstNumber {
            re: BigRational::from_integer(-(v + BigInt::one())),
            im: BigRational::zero(),
            kind: self.kind,
        })
    }

    /// Ordering comparison on real constants; None for complex operands
    pub fn compare(&self, rhs: &ConstNumber) -> Option<std::cmp::Ordering> {
        let (a, b, kind) = promote_numbers(self, rhs);
        if kind == ConstKind::Complex && (!a.im.is_zero() || !b.im.is_zero()) {
            return None;
        }
        a.re.partial_cmp(&b.re)
    }
}

// ---------------------------------------------------------------------------
// Commitment to a concrete type
// ---------------------------------------------------------------------------

/// Convert an untyped constant to the concrete type `to`.
///
/// Casts (`T(c)`) are permissive where implicit commitment is not: an
/// integer constant casts to string (yielding the code point's character),
/// and a string casts to `[]byte`. Most failures are non-fatal: diagnostics
/// are produced but a best-effort value is still returned so checking can
/// continue. A `None` value means the conversion failed outright.
pub fn convert_const_to_typed(
    value: &ConstValue,
    to: &Type,
    is_cast: bool,
    snippet: &str,
    span: &Span,
) -> (Option<TypedValue>, Vec<Diagnostic>) {
    let mut diags = Vec::new();
    let bad = |diags: &mut Vec<Diagnostic>| {
        diags.push(Diagnostic::new(
            DiagnosticKind::BadConstConversion {
                expr: snippet.to_string(),
                from: ExprType::Const(value.kind()),
                to: ExprType::Concrete(to.clone()),
            },
            span.clone(),
        ));
    };

    if let Some((bits, signed)) = to.int_bits() {
        let n = match value.as_number() {
            Some(n) => n,
            None => {
                bad(&mut diags);
                return (None, diags);
            }
        };
        let (v, truncated, overflowed) = n.to_int(bits, signed);
        if truncated {
            diags.push(Diagnostic::new(
                DiagnosticKind::TruncatedConstant {
                    to_integer: true,
                    constant: n.to_string(),
                },
                span.clone(),
            ));
        }
        if overflowed {
            diags.push(Diagnostic::new(
                DiagnosticKind::OverflowedConstant {
                    constant: n.to_string(),
                    from: n.kind,
                    to: ExprType::Concrete(to.clone()),
                },
                span.clone(),
            ));
        }
        if !n.im.is_zero() {
            diags.push(Diagnostic::new(
                DiagnosticKind::TruncatedConstant {
                    to_integer: false,
                    constant: n.to_string(),
                },
                span.clone(),
            ));
        }
        let tv = if signed {
            TypedValue::Int(v.to_i64().unwrap_or(0))
        } else {
            TypedValue::Uint(v.to_u64().unwrap_or(0))
        };
        return (Some(tv), diags);
    }

    match to {
        Type::Float32 | Type::Float64 => match value.as_number() {
            Some(n) => {
                let (f, truncated) = n.to_f64();
                if truncated {
                    diags.push(Diagnostic::new(
                        DiagnosticKind::TruncatedConstant {
                            to_integer: false,
                            constant: n.to_string(),
                        },
                        span.clone(),
                    ));
                }
                let f = if *to == Type::Float32 { f as f32 as f64 } else { f };
                (Some(TypedValue::Float(f)), diags)
            }
            None => {
                bad(&mut diags);
                (None, diags)
            }
        },
        Type::Complex64 | Type::Complex128 => match value.as_number() {
            Some(n) => {
                let (re, im) = n.to_complex();
                (Some(TypedValue::Complex(re, im)), diags)
            }
            None => {
                bad(&mut diags);
                (None, diags)
            }
        },
        Type::Bool => match value {
            ConstValue::Bool(b) => (Some(TypedValue::Bool(*b)), diags),
            _ => {
                bad(&mut diags);
                (None, diags)
            }
        },
        Type::String => match value {
            ConstValue::String(s) => (Some(TypedValue::String(s.clone())), diags),
            ConstValue::Number(n) if n.kind.is_integral() && is_cast => {
                // string(65) == "A"; the source must fit in 32 bits
                let (v, _, _) = n.to_int(64, true);
                match v.to_i32() {
                    Some(code) => {
                        let c = u32::try_from(code)
                            .ok()
                            .and_then(char::from_u32)
                            .unwrap_or('\u{FFFD}');
                        (Some(TypedValue::String(c.to_string())), diags)
                    }
                    None => {
                        diags.push(Diagnostic::new(
                            DiagnosticKind::OverflowedConstant {
                                constant: n.to_string(),
                                from: n.kind,
                                to: ExprType::Const(ConstKind::String),
                            },
                            span.clone(),
                        ));
                        (None, diags)
                    }
                }
            }
            _ => {
                bad(&mut diags);
                (None, diags)
            }
        },
        Type::Slice(elem) if **elem == Type::Uint8 => match value {
            ConstValue::String(s) if is_cast => {
                (Some(TypedValue::Bytes(s.as_bytes().to_vec())), diags)
            }
            ConstValue::Nil => (Some(TypedValue::Nil), diags),
            _ => {
                bad(&mut diags);
                (None, diags)
            }
        },
        t if t.is_empty_interface() => match value {
            ConstValue::Nil => (Some(TypedValue::Nil), diags),
            // Box at the constant's default type
            _ => match value.kind().default_promotion() {
                Some(def) => convert_const_to_typed(value, &def, is_cast, snippet, span),
                None => {
                    bad(&mut diags);
                    (None, diags)
                }
            },
        },
        t if t.is_nillable() => match value {
            ConstValue::Nil => (Some(TypedValue::Nil), diags),
            _ => {
                bad(&mut diags);
                (None, diags)
            }
        },
        _ => {
            bad(&mut diags);
            (None, diags)
        }
    }
}
