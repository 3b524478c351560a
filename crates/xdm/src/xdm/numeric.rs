//! Numeric value hierarchy: `xs:integer ⊂ xs:decimal`, plus `xs:float` and `xs:double`.
//!
//! Arithmetic follows XPath type promotion: operands are unified to the wider
//! of the two kinds (integer → decimal → float → double) before the operation
//! runs. Comparisons widen the same way, never narrowing the wider side.

use crate::engine::runtime::{ConversionResult, Error, ErrorCode, ValidationFailure};
use crate::util::whitespace::trim_xml_whitespace;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits kept by decimal division.
pub const DECIMAL_DIVIDE_PRECISION: u32 = 18;

/// Maximum significant digits an `xs:decimal` can carry.
pub const MAX_DECIMAL_DIGITS: usize = 28;

// 2^127; i128 holds [-2^127, 2^127)
const I128_BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumKind {
    Integer,
    Decimal,
    Float,
    Double,
}

/// An `xs:decimal` value. Trailing fractional zeros are stripped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DecimalValue(Decimal);

impl DecimalValue {
    pub const ZERO: DecimalValue = DecimalValue(Decimal::ZERO);
    pub const ONE: DecimalValue = DecimalValue(Decimal::ONE);

    pub fn new(d: Decimal) -> Self {
        Self(strip_trailing_zeros(d))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Parses the `xs:decimal` lexical space: optional sign, digits with at
    /// most one point, surrounding XML whitespace allowed.
    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        parse_decimal_lexical(lexical).map(Self)
    }

    pub fn from_f64(x: f64) -> ConversionResult<Self> {
        if !x.is_finite() {
            return Err(ValidationFailure::new(
                ErrorCode::FOCA0002,
                format!("cannot convert {} to xs:decimal", format_double(x)),
            ));
        }
        Decimal::from_f64(x).map(Self::new).ok_or_else(|| {
            ValidationFailure::new(ErrorCode::FOCA0001, "value too large for xs:decimal")
        })
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    pub fn is_whole_number(&self) -> bool {
        self.0.scale() == 0 || self.0.fract().is_zero()
    }

    /// The value as an `xs:integer`, truncating any fraction.
    pub fn to_integer(&self) -> ConversionResult<i128> {
        self.0.trunc().to_i128().ok_or_else(|| {
            ValidationFailure::new(ErrorCode::FOCA0003, "value too large for xs:integer")
        })
    }
}

impl From<i64> for DecimalValue {
    fn from(i: i64) -> Self {
        Self(Decimal::from(i))
    }
}

impl TryFrom<i128> for DecimalValue {
    type Error = ValidationFailure;

    /// Fails with `FOCA0001` beyond the 96-bit decimal mantissa.
    fn try_from(i: i128) -> Result<Self, Self::Error> {
        Decimal::try_from_i128_with_scale(i, 0)
            .map(Self)
            .map_err(|_| ValidationFailure::new(ErrorCode::FOCA0001, "value too large for xs:decimal"))
    }
}

impl From<Decimal> for DecimalValue {
    fn from(d: Decimal) -> Self {
        Self::new(d)
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&decimal_to_string(self.0))
    }
}

/// Removes trailing fractional zeros by working on the mantissa directly, so
/// the scale always reflects the significant digits.
pub fn strip_trailing_zeros(d: Decimal) -> Decimal {
    let mut mantissa = d.mantissa();
    if mantissa == 0 {
        return Decimal::ZERO;
    }
    let mut scale = d.scale();
    while scale > 0 && mantissa % 10 == 0 {
        mantissa /= 10;
        scale -= 1;
    }
    Decimal::try_from_i128_with_scale(mantissa, scale).unwrap_or(d)
}

/// Canonical `xs:decimal` form: no exponent, no trailing fractional zeros,
/// no point for whole numbers.
pub fn decimal_to_string(d: Decimal) -> String {
    let d = strip_trailing_zeros(d);
    let mantissa = d.mantissa();
    let scale = d.scale() as usize;
    let digits = mantissa.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + 3);
    if mantissa < 0 {
        out.push('-');
    }
    if scale == 0 {
        out.push_str(&digits);
    } else if digits.len() > scale {
        let (int, frac) = digits.split_at(digits.len() - scale);
        out.push_str(int);
        out.push('.');
        out.push_str(frac);
    } else {
        out.push_str("0.");
        out.extend(core::iter::repeat_n('0', scale - digits.len()));
        out.push_str(&digits);
    }
    out
}

fn parse_decimal_lexical(lexical: &str) -> ConversionResult<Decimal> {
    let bad = || ValidationFailure::invalid(format!("cannot convert string \"{lexical}\" to xs:decimal"));
    let s = trim_xml_whitespace(lexical);
    let (negative, body) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut int_digits = String::new();
    let mut frac_digits = String::new();
    let mut seen_point = false;
    let mut seen_digit = false;
    for ch in body.chars() {
        match ch {
            '0'..='9' => {
                seen_digit = true;
                if seen_point {
                    frac_digits.push(ch);
                } else if !(int_digits.is_empty() && ch == '0') {
                    int_digits.push(ch);
                }
            }
            '.' if !seen_point => seen_point = true,
            _ => return Err(bad()),
        }
    }
    if !seen_digit {
        return Err(bad());
    }
    let frac_digits = frac_digits.trim_end_matches('0');
    if int_digits.len() + frac_digits.len() > MAX_DECIMAL_DIGITS {
        return Err(ValidationFailure::new(
            ErrorCode::FOCA0006,
            format!("too many digits in xs:decimal \"{lexical}\""),
        ));
    }
    let mut mantissa: i128 = 0;
    for b in int_digits.bytes().chain(frac_digits.bytes()) {
        mantissa = mantissa * 10 + i128::from(b - b'0');
    }
    if negative {
        mantissa = -mantissa;
    }
    let scale = u32::try_from(frac_digits.len()).map_err(|_| bad())?;
    Decimal::try_from_i128_with_scale(mantissa, scale).map_err(|_| {
        ValidationFailure::new(ErrorCode::FOCA0006, format!("too many digits in xs:decimal \"{lexical}\""))
    })
}

/// Parses the `xs:integer` lexical space.
pub fn parse_integer(lexical: &str) -> ConversionResult<i128> {
    let s = trim_xml_whitespace(lexical);
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationFailure::invalid(format!(
            "cannot convert string \"{lexical}\" to xs:integer"
        )));
    }
    let s = s.strip_prefix('+').unwrap_or(s);
    s.parse::<i128>().map_err(|_| {
        ValidationFailure::new(ErrorCode::FOCA0003, format!("value too large for xs:integer: {lexical}"))
    })
}

/// Parses the `xs:double` lexical space, including `INF`, `-INF`, `+INF` and `NaN`.
pub fn parse_double(lexical: &str) -> ConversionResult<f64> {
    let s = trim_xml_whitespace(lexical);
    match s {
        "INF" | "+INF" => return Ok(f64::INFINITY),
        "-INF" => return Ok(f64::NEG_INFINITY),
        "NaN" => return Ok(f64::NAN),
        _ => {}
    }
    if !is_float_lexical(s) {
        return Err(ValidationFailure::invalid(format!(
            "cannot convert string \"{lexical}\" to xs:double"
        )));
    }
    s.parse::<f64>()
        .map_err(|_| ValidationFailure::invalid(format!("cannot convert string \"{lexical}\" to xs:double")))
}

pub fn parse_float(lexical: &str) -> ConversionResult<f32> {
    let s = trim_xml_whitespace(lexical);
    match s {
        "INF" | "+INF" => return Ok(f32::INFINITY),
        "-INF" => return Ok(f32::NEG_INFINITY),
        "NaN" => return Ok(f32::NAN),
        _ => {}
    }
    if !is_float_lexical(s) {
        return Err(ValidationFailure::invalid(format!(
            "cannot convert string \"{lexical}\" to xs:float"
        )));
    }
    s.parse::<f32>()
        .map_err(|_| ValidationFailure::invalid(format!("cannot convert string \"{lexical}\" to xs:float")))
}

// (+|-)? ([0-9]+ (. [0-9]*)? | . [0-9]+) ([Ee] (+|-)? [0-9]+)?
fn is_float_lexical(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let mut mantissa_digits = 0;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
        mantissa_digits += 1;
    }
    if i < b.len() && b[i] == b'.' {
        i += 1;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return false;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        i += 1;
        if matches!(b.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    i == b.len()
}

/// Dispatches on lexical shape: an exponent selects `xs:double`, a point
/// selects `xs:decimal`, anything else `xs:integer`.
///
/// A malformed double yields `NaN`; a malformed integer or decimal yields a
/// validation failure. Callers that need to tell the two apart must inspect
/// the result kind.
pub fn parse_number(lexical: &str) -> ConversionResult<NumericValue> {
    let s = trim_xml_whitespace(lexical);
    if s.contains(['e', 'E']) {
        Ok(NumericValue::Double(parse_double(s).unwrap_or(f64::NAN)))
    } else if s.contains('.') {
        DecimalValue::parse(s).map(NumericValue::Decimal)
    } else {
        parse_integer(s).map(NumericValue::Integer)
    }
}

/// `xs:double` canonical form.
///
/// Magnitudes in `[1e-6, 1e6)` render as plain decimals (whole numbers without
/// a point); everything else uses a mantissa with at least one fractional
/// digit and an upper-case `E` exponent, e.g. `1.0E6`.
pub fn format_double(x: f64) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let a = x.abs();
    if (1e-6..1e6).contains(&a) {
        format!("{x}")
    } else {
        exponent_form(&format!("{x:e}"))
    }
}

/// `xs:float` canonical form, same shape rules as [`format_double`].
pub fn format_float(x: f32) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let a = x.abs();
    if (1e-6..1e6).contains(&a) {
        format!("{x}")
    } else {
        exponent_form(&format!("{x:e}"))
    }
}

// "1e6" -> "1.0E6", "-1.5e-7" -> "-1.5E-7"
fn exponent_form(rust_exp: &str) -> String {
    let (mantissa, exp) = rust_exp.split_once('e').unwrap_or((rust_exp, "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exp}")
    } else {
        format!("{mantissa}.0E{exp}")
    }
}

/// A numeric atomic value of any of the four primitive numeric kinds.
#[derive(Debug, Clone, Copy)]
pub enum NumericValue {
    Integer(i128),
    Decimal(DecimalValue),
    Float(f32),
    Double(f64),
}

fn overflow() -> Error {
    Error::from_code(ErrorCode::FOAR0002, "numeric overflow")
}

fn division_by_zero() -> Error {
    Error::from_code(ErrorCode::FOAR0001, "division by zero")
}

impl NumericValue {
    pub fn kind(&self) -> NumKind {
        match self {
            NumericValue::Integer(_) => NumKind::Integer,
            NumericValue::Decimal(_) => NumKind::Decimal,
            NumericValue::Float(_) => NumKind::Float,
            NumericValue::Double(_) => NumKind::Double,
        }
    }

    pub fn from_f64(x: f64) -> Self {
        NumericValue::Double(x)
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            #[allow(clippy::cast_precision_loss)]
            NumericValue::Integer(i) => *i as f64,
            NumericValue::Decimal(d) => d.to_f64(),
            NumericValue::Float(f) => f64::from(*f),
            NumericValue::Double(d) => *d,
        }
    }

    /// Narrowing to float always goes through double so that comparison and
    /// hashing agree on the rounded value.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_f32(&self) -> f32 {
        match self {
            NumericValue::Float(f) => *f,
            other => other.to_f64() as f32,
        }
    }

    fn to_decimal(self) -> Option<Decimal> {
        match self {
            NumericValue::Integer(i) => Decimal::try_from_i128_with_scale(i, 0).ok(),
            NumericValue::Decimal(d) => Some(d.value()),
            NumericValue::Float(_) | NumericValue::Double(_) => None,
        }
    }

    /// Re-expresses this value at the requested (wider) kind. An integer
    /// beyond the decimal range stays an integer; callers treat the kind
    /// mismatch as overflow.
    fn widen(self, kind: NumKind) -> Self {
        match kind {
            NumKind::Integer => self,
            NumKind::Decimal => match self {
                NumericValue::Integer(i) => DecimalValue::try_from(i).map_or(self, NumericValue::Decimal),
                other => other,
            },
            NumKind::Float => NumericValue::Float(self.to_f32()),
            NumKind::Double => NumericValue::Double(self.to_f64()),
        }
    }

    fn unify(self, other: Self) -> (Self, Self) {
        let kind = self.kind().max(other.kind());
        (self.widen(kind), other.widen(kind))
    }

    pub fn is_nan(&self) -> bool {
        match self {
            NumericValue::Float(f) => f.is_nan(),
            NumericValue::Double(d) => d.is_nan(),
            _ => false,
        }
    }

    pub fn is_whole_number(&self) -> bool {
        match self {
            NumericValue::Integer(_) => true,
            NumericValue::Decimal(d) => d.is_whole_number(),
            NumericValue::Float(f) => f.is_finite() && f.fract() == 0.0,
            NumericValue::Double(d) => d.is_finite() && d.fract() == 0.0,
        }
    }

    /// XPath effective boolean value: false for zero and NaN.
    pub fn effective_boolean_value(&self) -> bool {
        match self {
            NumericValue::Integer(i) => *i != 0,
            NumericValue::Decimal(d) => !d.value().is_zero(),
            NumericValue::Float(f) => !(f.is_nan() || *f == 0.0),
            NumericValue::Double(d) => !(d.is_nan() || *d == 0.0),
        }
    }

    pub fn negate(&self) -> Result<Self, Error> {
        Ok(match self {
            NumericValue::Integer(i) => NumericValue::Integer(i.checked_neg().ok_or_else(overflow)?),
            NumericValue::Decimal(d) => NumericValue::Decimal(DecimalValue::new(-d.value())),
            NumericValue::Float(f) => NumericValue::Float(-f),
            NumericValue::Double(d) => NumericValue::Double(-d),
        })
    }

    pub fn abs(&self) -> Result<Self, Error> {
        Ok(match self {
            NumericValue::Integer(i) => NumericValue::Integer(i.checked_abs().ok_or_else(overflow)?),
            NumericValue::Decimal(d) => NumericValue::Decimal(DecimalValue::new(d.value().abs())),
            NumericValue::Float(f) => NumericValue::Float(f.abs()),
            NumericValue::Double(d) => NumericValue::Double(d.abs()),
        })
    }

    pub fn floor(&self) -> Self {
        match self {
            NumericValue::Integer(_) => *self,
            NumericValue::Decimal(d) => NumericValue::Decimal(DecimalValue::new(d.value().floor())),
            NumericValue::Float(f) => NumericValue::Float(f.floor()),
            NumericValue::Double(d) => NumericValue::Double(d.floor()),
        }
    }

    pub fn ceiling(&self) -> Self {
        match self {
            NumericValue::Integer(_) => *self,
            NumericValue::Decimal(d) => NumericValue::Decimal(DecimalValue::new(d.value().ceil())),
            NumericValue::Float(f) => NumericValue::Float(f.ceil()),
            NumericValue::Double(d) => NumericValue::Double(d.ceil()),
        }
    }

    /// `fn:round`: halves round towards positive infinity. For doubles and
    /// floats a result of zero from a negative input is negative zero.
    #[allow(clippy::cast_possible_truncation)]
    pub fn round(&self) -> Result<Self, Error> {
        Ok(match self {
            NumericValue::Integer(_) => *self,
            NumericValue::Decimal(d) => {
                let half = Decimal::new(5, 1);
                let shifted = d.value().checked_add(half).ok_or_else(overflow)?;
                NumericValue::Decimal(DecimalValue::new(shifted.floor()))
            }
            NumericValue::Float(f) => NumericValue::Float(round_half_up_f64(f64::from(*f)) as f32),
            NumericValue::Double(d) => NumericValue::Double(round_half_up_f64(*d)),
        })
    }

    /// `fn:round-half-to-even` with a (possibly negative) precision.
    #[allow(clippy::cast_possible_truncation)]
    pub fn round_half_to_even(&self, scale: i32) -> Result<Self, Error> {
        Ok(match self {
            NumericValue::Integer(i) => {
                if scale >= 0 {
                    *self
                } else {
                    NumericValue::Integer(round_integer_half_even(*i, scale.unsigned_abs())?)
                }
            }
            NumericValue::Decimal(d) => {
                NumericValue::Decimal(DecimalValue::new(round_decimal_half_even(d.value(), scale)?))
            }
            NumericValue::Float(f) => {
                NumericValue::Float(round_half_even_f64(f64::from(*f), scale) as f32)
            }
            NumericValue::Double(d) => NumericValue::Double(round_half_even_f64(*d, scale)),
        })
    }

    /// Sign as a value of the same kind; NaN stays NaN.
    pub fn signum(&self) -> Self {
        match self {
            NumericValue::Integer(i) => NumericValue::Integer(i.signum()),
            NumericValue::Decimal(d) => {
                let v = d.value();
                let s = if v.is_zero() {
                    0
                } else if v.is_sign_negative() {
                    -1
                } else {
                    1
                };
                NumericValue::Decimal(DecimalValue::from(s))
            }
            NumericValue::Float(f) => NumericValue::Float(if f.is_nan() || *f == 0.0 { *f } else { f.signum() }),
            NumericValue::Double(d) => NumericValue::Double(if d.is_nan() || *d == 0.0 { *d } else { d.signum() }),
        }
    }

    /// Numeric comparison after promotion. `None` when either side is NaN.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match self.unify(*other) {
            (NumericValue::Integer(a), NumericValue::Integer(b)) => Some(a.cmp(&b)),
            // integers left unwidened lie outside the decimal range
            (NumericValue::Integer(a), NumericValue::Decimal(_)) => Some(a.cmp(&0)),
            (NumericValue::Decimal(_), NumericValue::Integer(b)) => Some(0.cmp(&b)),
            (NumericValue::Decimal(a), NumericValue::Decimal(b)) => Some(a.cmp(&b)),
            (NumericValue::Float(a), NumericValue::Float(b)) => a.partial_cmp(&b),
            (NumericValue::Double(a), NumericValue::Double(b)) => a.partial_cmp(&b),
            _ => None,
        }
    }

    pub fn add(&self, other: &Self) -> Result<Self, Error> {
        Ok(match self.unify(*other) {
            (NumericValue::Integer(a), NumericValue::Integer(b)) => {
                NumericValue::Integer(a.checked_add(b).ok_or_else(overflow)?)
            }
            (NumericValue::Decimal(a), NumericValue::Decimal(b)) => NumericValue::Decimal(DecimalValue::new(
                a.value().checked_add(b.value()).ok_or_else(overflow)?,
            )),
            (NumericValue::Float(a), NumericValue::Float(b)) => NumericValue::Float(a + b),
            (NumericValue::Double(a), NumericValue::Double(b)) => NumericValue::Double(a + b),
            _ => return Err(overflow()),
        })
    }

    pub fn subtract(&self, other: &Self) -> Result<Self, Error> {
        self.add(&other.negate()?)
    }

    pub fn multiply(&self, other: &Self) -> Result<Self, Error> {
        Ok(match self.unify(*other) {
            (NumericValue::Integer(a), NumericValue::Integer(b)) => {
                NumericValue::Integer(a.checked_mul(b).ok_or_else(overflow)?)
            }
            (NumericValue::Decimal(a), NumericValue::Decimal(b)) => NumericValue::Decimal(DecimalValue::new(
                a.value().checked_mul(b.value()).ok_or_else(overflow)?,
            )),
            (NumericValue::Float(a), NumericValue::Float(b)) => NumericValue::Float(a * b),
            (NumericValue::Double(a), NumericValue::Double(b)) => NumericValue::Double(a * b),
            _ => return Err(overflow()),
        })
    }

    /// `op:numeric-divide`. Integer operands produce a decimal.
    pub fn divide(&self, other: &Self) -> Result<Self, Error> {
        let (a, b) = self.unify(*other);
        match (a, b) {
            (NumericValue::Float(a), NumericValue::Float(b)) => Ok(NumericValue::Float(a / b)),
            (NumericValue::Double(a), NumericValue::Double(b)) => Ok(NumericValue::Double(a / b)),
            _ => {
                let (Some(a), Some(b)) = (a.to_decimal(), b.to_decimal()) else {
                    return Err(overflow());
                };
                if b.is_zero() {
                    return Err(division_by_zero());
                }
                let q = a.checked_div(b).ok_or_else(overflow)?;
                Ok(NumericValue::Decimal(DecimalValue::new(q.round_dp_with_strategy(
                    DECIMAL_DIVIDE_PRECISION,
                    RoundingStrategy::MidpointNearestEven,
                ))))
            }
        }
    }

    /// `op:numeric-integer-divide`, truncating towards zero.
    pub fn integer_divide(&self, other: &Self) -> Result<Self, Error> {
        match self.unify(*other) {
            (NumericValue::Integer(a), NumericValue::Integer(b)) => {
                if b == 0 {
                    return Err(division_by_zero());
                }
                Ok(NumericValue::Integer(a.checked_div(b).ok_or_else(overflow)?))
            }
            (NumericValue::Decimal(a), NumericValue::Decimal(b)) => {
                if b.value().is_zero() {
                    return Err(division_by_zero());
                }
                let q = a.value().checked_div(b.value()).ok_or_else(overflow)?;
                Ok(NumericValue::Integer(q.trunc().to_i128().ok_or_else(overflow)?))
            }
            (a, b) => {
                let (x, y) = (a.to_f64(), b.to_f64());
                if y == 0.0 {
                    return Err(division_by_zero());
                }
                if !x.is_finite() || y.is_nan() {
                    return Err(Error::from_code(
                        ErrorCode::FOAR0002,
                        "integer division of a non-finite value",
                    ));
                }
                let q = (x / y).trunc();
                if (-I128_BOUND..I128_BOUND).contains(&q) {
                    #[allow(clippy::cast_possible_truncation)]
                    Ok(NumericValue::Integer(q as i128))
                } else {
                    Err(overflow())
                }
            }
        }
    }

    /// `op:numeric-mod`; the result takes the sign of the dividend.
    pub fn modulo(&self, other: &Self) -> Result<Self, Error> {
        Ok(match self.unify(*other) {
            (NumericValue::Integer(a), NumericValue::Integer(b)) => {
                if b == 0 {
                    return Err(division_by_zero());
                }
                NumericValue::Integer(a.checked_rem(b).unwrap_or(0))
            }
            (NumericValue::Decimal(a), NumericValue::Decimal(b)) => {
                if b.value().is_zero() {
                    return Err(division_by_zero());
                }
                NumericValue::Decimal(DecimalValue::new(
                    a.value().checked_rem(b.value()).ok_or_else(overflow)?,
                ))
            }
            (NumericValue::Float(a), NumericValue::Float(b)) => NumericValue::Float(a % b),
            (NumericValue::Double(a), NumericValue::Double(b)) => NumericValue::Double(a % b),
            _ => return Err(overflow()),
        })
    }

    /// Conversion to `xs:integer`, truncating towards zero.
    pub fn to_integer(&self) -> ConversionResult<i128> {
        match self {
            NumericValue::Integer(i) => Ok(*i),
            NumericValue::Decimal(d) => d.to_integer(),
            NumericValue::Float(_) | NumericValue::Double(_) => {
                let x = self.to_f64();
                if !x.is_finite() {
                    return Err(ValidationFailure::new(
                        ErrorCode::FOCA0002,
                        format!("cannot convert {} to xs:integer", format_double(x)),
                    ));
                }
                let t = x.trunc();
                if !(-I128_BOUND..I128_BOUND).contains(&t) {
                    return Err(ValidationFailure::new(ErrorCode::FOCA0003, "value too large for xs:integer"));
                }
                #[allow(clippy::cast_possible_truncation)]
                Ok(t as i128)
            }
        }
    }

    pub fn to_decimal_value(&self) -> ConversionResult<DecimalValue> {
        match self {
            NumericValue::Integer(i) => DecimalValue::try_from(*i),
            NumericValue::Decimal(d) => Ok(*d),
            NumericValue::Float(f) => DecimalValue::from_f64(f64::from(*f)),
            NumericValue::Double(d) => DecimalValue::from_f64(*d),
        }
    }
}

impl PartialEq for NumericValue {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

/// Numerically equal values (across kinds) hash identically: every equality
/// test is decided at float precision or finer, so hashing the value rounded
/// to float keeps the two contracts consistent.
impl Hash for NumericValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let f = self.to_f32();
        let bits = if f.is_nan() {
            f32::NAN.to_bits()
        } else if f == 0.0 {
            0
        } else {
            f.to_bits()
        };
        bits.hash(state);
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericValue::Integer(i) => write!(f, "{i}"),
            NumericValue::Decimal(d) => write!(f, "{d}"),
            NumericValue::Float(x) => f.write_str(&format_float(*x)),
            NumericValue::Double(x) => f.write_str(&format_double(*x)),
        }
    }
}

impl From<i64> for NumericValue {
    fn from(i: i64) -> Self {
        NumericValue::Integer(i128::from(i))
    }
}

impl From<i128> for NumericValue {
    fn from(i: i128) -> Self {
        NumericValue::Integer(i)
    }
}

impl From<f64> for NumericValue {
    fn from(d: f64) -> Self {
        NumericValue::Double(d)
    }
}

impl From<DecimalValue> for NumericValue {
    fn from(d: DecimalValue) -> Self {
        NumericValue::Decimal(d)
    }
}

/// Rounds to a multiple of `10^shift`, halves to the even multiple.
fn round_integer_half_even(i: i128, shift: u32) -> Result<i128, Error> {
    if shift > 38 {
        return Ok(0);
    }
    let factor = 10_i128.pow(shift);
    let (q, r) = (i / factor, i % factor);
    let twice = r.unsigned_abs() * 2;
    let away = twice > factor.unsigned_abs() || (twice == factor.unsigned_abs() && q % 2 != 0);
    let q = if away { q + i.signum() } else { q };
    q.checked_mul(factor).ok_or_else(overflow)
}

fn round_half_up_f64(x: f64) -> f64 {
    if !x.is_finite() || x == 0.0 {
        return x;
    }
    let floor = x.floor();
    let r = if x - floor >= 0.5 { floor + 1.0 } else { floor };
    if r == 0.0 && x < 0.0 { -0.0 } else { r }
}

fn round_half_even_f64(x: f64, scale: i32) -> f64 {
    if !x.is_finite() || x == 0.0 {
        return x;
    }
    let factor = 10f64.powi(scale.saturating_add(1));
    let mut d = (x * factor).abs();
    if !factor.is_finite() || factor == 0.0 || !d.is_finite() {
        return x;
    }
    let rem = d % 10.0;
    if rem > 5.0 {
        d += 10.0 - rem;
    } else if rem < 5.0 {
        d -= rem;
    } else if d % 20.0 == 15.0 {
        d += 5.0;
    } else {
        d -= 5.0;
    }
    d /= factor;
    if x < 0.0 { -d } else { d }
}

fn round_decimal_half_even(d: Decimal, scale: i32) -> Result<Decimal, Error> {
    if scale >= 0 {
        let dp = u32::try_from(scale).unwrap_or(u32::MAX);
        if dp >= d.scale() {
            return Ok(d);
        }
        return Ok(d.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven));
    }
    let shift = scale.unsigned_abs();
    if shift > 28 {
        return Ok(Decimal::ZERO);
    }
    let factor = Decimal::from_i128_with_scale(10i128.pow(shift), 0);
    let q = d.checked_div(factor).ok_or_else(overflow)?;
    q.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .checked_mul(factor)
        .ok_or_else(overflow)
}
