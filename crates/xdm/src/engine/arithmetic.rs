//! Arithmetic and value comparison over atomic operands.
//!
//! `xs:untypedAtomic` operands are promoted to `xs:double` for arithmetic and
//! compared as strings. Calendar operands without a timezone resolve against
//! the implicit timezone passed in by the caller.

use crate::engine::runtime::{Error, ErrorCode};
use crate::xdm::XdmAtomicValue;
use crate::xdm::numeric::NumericValue;
use crate::xdm::temporal::{CalendarValue, TimezoneOffset};
use core::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    IntegerDivide,
    Modulo,
}

impl ArithmeticOp {
    fn symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "div",
            ArithmeticOp::IntegerDivide => "idiv",
            ArithmeticOp::Modulo => "mod",
        }
    }
}

fn numeric_operand(v: &XdmAtomicValue) -> Option<NumericValue> {
    match v {
        XdmAtomicValue::UntypedAtomic(u) => Some(NumericValue::Double(u.as_double())),
        other => other.as_numeric(),
    }
}

fn unsupported(op: ArithmeticOp, a: &XdmAtomicValue, b: &XdmAtomicValue) -> Error {
    Error::type_error(format!(
        "operator '{}' is not defined for {} and {}",
        op.symbol(),
        a.type_of(),
        b.type_of()
    ))
}

/// Applies `op` to two atomic operands.
pub fn apply(
    op: ArithmeticOp,
    a: &XdmAtomicValue,
    b: &XdmAtomicValue,
    implicit: Option<TimezoneOffset>,
) -> Result<XdmAtomicValue, Error> {
    use XdmAtomicValue as A;

    if let (Some(x), Some(y)) = (numeric_operand(a), numeric_operand(b)) {
        let r = match op {
            ArithmeticOp::Add => x.add(&y),
            ArithmeticOp::Subtract => x.subtract(&y),
            ArithmeticOp::Multiply => x.multiply(&y),
            ArithmeticOp::Divide => x.divide(&y),
            ArithmeticOp::IntegerDivide => x.integer_divide(&y),
            ArithmeticOp::Modulo => x.modulo(&y),
        }?;
        return Ok(A::from(r));
    }

    match (op, a, b) {
        (ArithmeticOp::Add, A::YearMonthDuration(x), A::YearMonthDuration(y)) => Ok(A::YearMonthDuration(x.add(y)?)),
        (ArithmeticOp::Subtract, A::YearMonthDuration(x), A::YearMonthDuration(y)) => {
            Ok(A::YearMonthDuration(x.subtract(y)?))
        }
        (ArithmeticOp::Add, A::DayTimeDuration(x), A::DayTimeDuration(y)) => Ok(A::DayTimeDuration(x.add(y)?)),
        (ArithmeticOp::Subtract, A::DayTimeDuration(x), A::DayTimeDuration(y)) => {
            Ok(A::DayTimeDuration(x.subtract(y)?))
        }
        (ArithmeticOp::Divide, A::YearMonthDuration(x), A::YearMonthDuration(y)) => Ok(A::Decimal(x.divide_by(y)?)),
        (ArithmeticOp::Divide, A::DayTimeDuration(x), A::DayTimeDuration(y)) => Ok(A::Decimal(x.divide_by(y)?)),

        (ArithmeticOp::Multiply, A::YearMonthDuration(d), n) | (ArithmeticOp::Multiply, n, A::YearMonthDuration(d)) => {
            let f = numeric_operand(n).ok_or_else(|| unsupported(op, a, b))?;
            Ok(A::YearMonthDuration(d.multiply(f.to_f64())?))
        }
        (ArithmeticOp::Multiply, A::DayTimeDuration(d), n) | (ArithmeticOp::Multiply, n, A::DayTimeDuration(d)) => {
            let f = numeric_operand(n).ok_or_else(|| unsupported(op, a, b))?;
            Ok(A::DayTimeDuration(d.multiply(f.to_f64())?))
        }
        (ArithmeticOp::Divide, A::YearMonthDuration(d), n) => {
            let f = numeric_operand(n).ok_or_else(|| unsupported(op, a, b))?;
            Ok(A::YearMonthDuration(d.divide(f.to_f64())?))
        }
        (ArithmeticOp::Divide, A::DayTimeDuration(d), n) => {
            let f = numeric_operand(n).ok_or_else(|| unsupported(op, a, b))?;
            Ok(A::DayTimeDuration(d.divide(f.to_f64())?))
        }

        (ArithmeticOp::Add | ArithmeticOp::Subtract, _, _) => calendar_arithmetic(op, a, b, implicit),
        _ => Err(unsupported(op, a, b)),
    }
}

fn calendar_arithmetic(
    op: ArithmeticOp,
    a: &XdmAtomicValue,
    b: &XdmAtomicValue,
    implicit: Option<TimezoneOffset>,
) -> Result<XdmAtomicValue, Error> {
    use XdmAtomicValue as A;

    // Subtraction of a duration is addition of its negation.
    let (cal, dur) = match (op, a, b) {
        (ArithmeticOp::Subtract, A::Date(x), A::Date(y)) => return Ok(A::DayTimeDuration(x.subtract(y, implicit)?)),
        (ArithmeticOp::Subtract, A::DateTime(x), A::DateTime(y)) => {
            return Ok(A::DayTimeDuration(x.subtract(y, implicit)?));
        }
        (ArithmeticOp::Subtract, A::Time(x), A::Time(y)) => return Ok(A::DayTimeDuration(x.subtract(y, implicit)?)),
        (ArithmeticOp::Add, A::YearMonthDuration(_) | A::DayTimeDuration(_), _) => (b, a.clone()),
        (ArithmeticOp::Add, _, _) => (a, b.clone()),
        (ArithmeticOp::Subtract, _, A::YearMonthDuration(d)) => (a, A::YearMonthDuration(d.negate())),
        (ArithmeticOp::Subtract, _, A::DayTimeDuration(d)) => (a, A::DayTimeDuration(d.negate())),
        _ => return Err(unsupported(op, a, b)),
    };

    match (cal, &dur) {
        (A::Date(c), A::YearMonthDuration(d)) => Ok(A::Date(c.add_year_month(d)?)),
        (A::Date(c), A::DayTimeDuration(d)) => Ok(A::Date(c.add_day_time(d)?)),
        (A::DateTime(c), A::YearMonthDuration(d)) => Ok(A::DateTime(c.add_year_month(d)?)),
        (A::DateTime(c), A::DayTimeDuration(d)) => Ok(A::DateTime(c.add_day_time(d)?)),
        (A::Time(c), A::DayTimeDuration(d)) => Ok(A::Time(c.add_day_time(d)?)),
        _ => Err(unsupported(op, a, b)),
    }
}

fn incomparable(a: &XdmAtomicValue, b: &XdmAtomicValue) -> Error {
    Error::type_error(format!("cannot compare {} with {}", a.type_of(), b.type_of()))
}

/// Value comparison (`eq`, `lt`, ...). `Ok(None)` means unordered, which only
/// happens when a `NaN` is involved.
///
/// Types with identity but no order (`xs:QName`, `xs:duration`, the partial
/// Gregorian types) fail with `XPTY0004`; use [`value_equal`] for them.
pub fn value_compare(
    a: &XdmAtomicValue,
    b: &XdmAtomicValue,
    implicit: Option<TimezoneOffset>,
) -> Result<Option<Ordering>, Error> {
    use XdmAtomicValue as A;

    if let (Some(x), Some(y)) = (a.as_numeric(), b.as_numeric()) {
        return Ok(x.compare(&y));
    }
    let ordering = match (a, b) {
        (A::Boolean(x), A::Boolean(y)) => x.cmp(y),
        (A::String(_) | A::AnyUri(_) | A::UntypedAtomic(_), A::String(_) | A::AnyUri(_) | A::UntypedAtomic(_)) => {
            string_of(a).cmp(string_of(b))
        }
        (A::Date(x), A::Date(y)) => x.compare(y, implicit)?,
        (A::Time(x), A::Time(y)) => x.compare(y, implicit)?,
        (A::DateTime(x), A::DateTime(y)) => x.compare(y, implicit)?,
        (A::YearMonthDuration(x), A::YearMonthDuration(y)) => x.cmp(y),
        (A::DayTimeDuration(x), A::DayTimeDuration(y)) => x.cmp(y),
        (A::HexBinary(x), A::HexBinary(y)) => x.octets().cmp(y.octets()),
        (A::Base64Binary(x), A::Base64Binary(y)) => x.octets().cmp(y.octets()),
        _ => return Err(incomparable(a, b)),
    };
    Ok(Some(ordering))
}

/// Value equality. Mixing a timezoned and a timezone-less calendar value
/// needs `implicit`; without it the comparison fails with `XPDY0002`.
pub fn value_equal(a: &XdmAtomicValue, b: &XdmAtomicValue, implicit: Option<TimezoneOffset>) -> Result<bool, Error> {
    use XdmAtomicValue as A;

    match (a, b) {
        (A::QName(x), A::QName(y)) => Ok(x == y),
        (A::GYear(x), A::GYear(y)) => Ok(x.compare(y, implicit)? == Ordering::Equal),
        (A::GYearMonth(x), A::GYearMonth(y)) => Ok(x.compare(y, implicit)? == Ordering::Equal),
        (A::GMonth(x), A::GMonth(y)) => Ok(x.compare(y, implicit)? == Ordering::Equal),
        (A::GMonthDay(x), A::GMonthDay(y)) => Ok(x.compare(y, implicit)? == Ordering::Equal),
        (A::GDay(x), A::GDay(y)) => Ok(x.compare(y, implicit)? == Ordering::Equal),
        (
            A::Duration(_) | A::YearMonthDuration(_) | A::DayTimeDuration(_),
            A::Duration(_) | A::YearMonthDuration(_) | A::DayTimeDuration(_),
        ) => Ok(duration_of(a) == duration_of(b)),
        _ => Ok(value_compare(a, b, implicit)? == Some(Ordering::Equal)),
    }
}

fn string_of(v: &XdmAtomicValue) -> &str {
    match v {
        XdmAtomicValue::String(s) | XdmAtomicValue::AnyUri(s) => s,
        XdmAtomicValue::UntypedAtomic(u) => u.as_str(),
        _ => "",
    }
}

fn duration_of(v: &XdmAtomicValue) -> Option<crate::xdm::duration::DurationValue> {
    match v {
        XdmAtomicValue::Duration(d) => Some(*d),
        XdmAtomicValue::YearMonthDuration(d) => Some(d.as_duration()),
        XdmAtomicValue::DayTimeDuration(d) => Some(d.as_duration()),
        _ => None,
    }
}

/// Unary minus.
pub fn negate(v: &XdmAtomicValue) -> Result<XdmAtomicValue, Error> {
    match v {
        XdmAtomicValue::YearMonthDuration(d) => Ok(XdmAtomicValue::YearMonthDuration(d.negate())),
        XdmAtomicValue::DayTimeDuration(d) => Ok(XdmAtomicValue::DayTimeDuration(d.negate())),
        other => match numeric_operand(other) {
            Some(n) => Ok(XdmAtomicValue::from(n.negate()?)),
            None => Err(Error::from_code(
                ErrorCode::XPTY0004,
                format!("unary minus is not defined for {}", other.type_of()),
            )),
        },
    }
}
