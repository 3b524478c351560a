//! Conversion between built-in atomic types.
//!
//! [`XdmAtomicValue::convert`] is the single entry point. Every path returns a
//! [`ConversionResult`]; nothing here panics on bad input.

use crate::engine::runtime::{ConversionResult, ErrorCode, ValidationFailure};
use crate::util::whitespace::{collapse_xml_whitespace, trim_xml_whitespace};
use crate::xdm::binary::{Base64BinaryValue, HexBinaryValue};
use crate::xdm::duration::{DayTimeDurationValue, DurationValue, YearMonthDurationValue};
use crate::xdm::numeric::{DecimalValue, NumericValue, parse_double, parse_float, parse_integer};
use crate::xdm::temporal::{
    CalendarValue, DateTimeValue, DateValue, GDayValue, GMonthDayValue, GMonthValue, GYearMonthValue, GYearValue,
    TimeValue,
};
use crate::xdm::{AtomicType, XdmAtomicValue};
use std::sync::OnceLock;

// Relative anyURI references are checked by resolving against this base.
const URI_CHECK_BASE: &str = "http://uri-check.invalid/";

static URI_BASE: OnceLock<Result<url::Url, url::ParseError>> = OnceLock::new();

/// Casts `value` to `target` (free-function form of [`XdmAtomicValue::convert`]).
pub fn cast_atomic(value: &XdmAtomicValue, target: AtomicType, validate: bool) -> ConversionResult {
    value.convert(target, validate)
}

fn not_castable(from: AtomicType, to: AtomicType) -> ValidationFailure {
    ValidationFailure::type_mismatch(format!("cannot convert {from} to {to}"))
}

/// Parses the lexical forms `true`, `false`, `1` and `0`, surrounding
/// whitespace allowed.
pub fn parse_boolean(lexical: &str) -> ConversionResult<bool> {
    match trim_xml_whitespace(lexical) {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ValidationFailure::invalid(format!("invalid xs:boolean \"{other}\""))),
    }
}

/// Whitespace-collapses an `xs:anyURI` lexical form and, when `validate` is
/// set, checks that it is a usable URI reference.
pub fn parse_any_uri(lexical: &str, validate: bool) -> ConversionResult<String> {
    let collapsed = collapse_xml_whitespace(lexical);
    if validate && !collapsed.is_empty() {
        let base = URI_BASE
            .get_or_init(|| url::Url::parse(URI_CHECK_BASE))
            .as_ref()
            .map_err(|e| ValidationFailure::new(ErrorCode::Unknown, format!("invalid URI base: {e}")))?;
        base.join(&collapsed)
            .map_err(|e| ValidationFailure::invalid(format!("invalid xs:anyURI \"{collapsed}\": {e}")))?;
    }
    Ok(collapsed)
}

/// Builds a value of type `target` from its lexical form.
pub fn convert_from_string(lexical: &str, target: AtomicType, validate: bool) -> ConversionResult {
    use AtomicType as T;
    use XdmAtomicValue as A;
    Ok(match target {
        T::String | T::AnyAtomic => A::String(lexical.to_string()),
        T::UntypedAtomic => XdmAtomicValue::untyped(lexical),
        T::AnyUri => A::AnyUri(parse_any_uri(lexical, validate)?),
        T::Boolean => A::Boolean(parse_boolean(lexical)?),
        T::Integer => A::Integer(parse_integer(lexical)?),
        T::Decimal => A::Decimal(DecimalValue::parse(lexical)?),
        T::Float => A::Float(parse_float(lexical)?),
        T::Double | T::Numeric => A::Double(parse_double(lexical)?),
        T::Date => A::Date(DateValue::parse(lexical)?),
        T::Time => A::Time(TimeValue::parse(lexical)?),
        T::DateTime => A::DateTime(DateTimeValue::parse(lexical)?),
        T::GYear => A::GYear(GYearValue::parse(lexical)?),
        T::GYearMonth => A::GYearMonth(GYearMonthValue::parse(lexical)?),
        T::GMonth => A::GMonth(GMonthValue::parse(lexical)?),
        T::GMonthDay => A::GMonthDay(GMonthDayValue::parse(lexical)?),
        T::GDay => A::GDay(GDayValue::parse(lexical)?),
        T::Duration => A::Duration(DurationValue::parse(lexical)?),
        T::YearMonthDuration => A::YearMonthDuration(YearMonthDurationValue::parse(lexical)?),
        T::DayTimeDuration => A::DayTimeDuration(DayTimeDurationValue::parse(lexical)?),
        T::HexBinary => A::HexBinary(HexBinaryValue::parse(lexical)?),
        T::Base64Binary => A::Base64Binary(Base64BinaryValue::parse(lexical)?),
        // Needs a namespace context; see QNameValue::from_lexical.
        T::QName => {
            return Err(ValidationFailure::type_mismatch(
                "xs:QName can only be built from a string with a namespace resolver",
            ));
        }
    })
}

impl XdmAtomicValue {
    /// Converts to `target`.
    ///
    /// `validate` enables checks that are otherwise left to the caller; at
    /// present only `xs:anyURI` syntax depends on it. Incompatible source and
    /// target types fail with `XPTY0004`, malformed lexical forms with
    /// `FORG0001`, and numeric domain problems with `FOCA000x`.
    pub fn convert(&self, target: AtomicType, validate: bool) -> ConversionResult {
        use AtomicType as T;
        use XdmAtomicValue as A;

        let source = self.type_of();
        if target == source || target == T::AnyAtomic {
            return Ok(self.clone());
        }
        match target {
            T::String => return Ok(A::String(self.string_value())),
            T::UntypedAtomic => return Ok(XdmAtomicValue::untyped(self.string_value())),
            _ => {}
        }
        match self {
            A::String(s) => return convert_from_string(s, target, validate),
            A::UntypedAtomic(u) => return convert_from_string(u.as_str(), target, validate),
            A::AnyUri(_) => return Err(not_castable(source, target)),
            _ => {}
        }

        if let Some(n) = self.as_numeric() {
            return convert_numeric(n, source, target);
        }

        match (self, target) {
            (A::Boolean(b), _) => convert_boolean(*b, target),

            (A::DateTime(dt), T::Date) => Ok(A::Date(dt.date())),
            (A::DateTime(dt), T::Time) => Ok(A::Time(dt.time())),
            (A::Date(d), T::DateTime) => Ok(A::DateTime(d.to_date_time())),
            (A::DateTime(dt), T::GYear) => Ok(A::GYear(GYearValue::from(dt))),
            (A::DateTime(dt), T::GYearMonth) => Ok(A::GYearMonth(GYearMonthValue::from(dt))),
            (A::DateTime(dt), T::GMonth) => Ok(A::GMonth(GMonthValue::from(dt))),
            (A::DateTime(dt), T::GMonthDay) => Ok(A::GMonthDay(GMonthDayValue::from(dt))),
            (A::DateTime(dt), T::GDay) => Ok(A::GDay(GDayValue::from(dt))),
            (A::Date(d), T::GYear | T::GYearMonth | T::GMonth | T::GMonthDay | T::GDay) => {
                A::DateTime(d.to_date_time()).convert(target, validate)
            }

            (A::Duration(d), T::YearMonthDuration) => Ok(A::YearMonthDuration(d.to_year_month())),
            (A::Duration(d), T::DayTimeDuration) => Ok(A::DayTimeDuration(d.to_day_time())),
            (A::YearMonthDuration(d), T::Duration) => Ok(A::Duration(d.as_duration())),
            (A::YearMonthDuration(d), T::DayTimeDuration) => Ok(A::DayTimeDuration(d.as_duration().to_day_time())),
            (A::DayTimeDuration(d), T::Duration) => Ok(A::Duration(d.as_duration())),
            (A::DayTimeDuration(d), T::YearMonthDuration) => {
                Ok(A::YearMonthDuration(d.as_duration().to_year_month()))
            }

            (A::HexBinary(h), T::Base64Binary) => Ok(A::Base64Binary(Base64BinaryValue::from(h.clone()))),
            (A::Base64Binary(b), T::HexBinary) => Ok(A::HexBinary(HexBinaryValue::from(b.clone()))),

            _ => Err(not_castable(source, target)),
        }
    }
}

fn convert_boolean(b: bool, target: AtomicType) -> ConversionResult {
    use AtomicType as T;
    let bit = i64::from(b);
    Ok(match target {
        T::Integer => XdmAtomicValue::Integer(i128::from(bit)),
        T::Decimal => XdmAtomicValue::Decimal(DecimalValue::from(bit)),
        T::Float => XdmAtomicValue::Float(if b { 1.0 } else { 0.0 }),
        T::Double | T::Numeric => XdmAtomicValue::Double(if b { 1.0 } else { 0.0 }),
        _ => return Err(not_castable(T::Boolean, target)),
    })
}

fn convert_numeric(n: NumericValue, source: AtomicType, target: AtomicType) -> ConversionResult {
    use AtomicType as T;
    Ok(match target {
        T::Numeric => XdmAtomicValue::from(n),
        T::Boolean => XdmAtomicValue::Boolean(n.effective_boolean_value()),
        T::Integer => XdmAtomicValue::Integer(n.to_integer()?),
        T::Decimal => XdmAtomicValue::Decimal(n.to_decimal_value()?),
        T::Float => XdmAtomicValue::Float(n.to_f32()),
        T::Double => XdmAtomicValue::Double(n.to_f64()),
        _ => return Err(not_castable(source, target)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_lexical_forms() {
        assert!(parse_boolean(" true ").unwrap());
        assert!(!parse_boolean("0").unwrap());
        assert_eq!(parse_boolean("TRUE").unwrap_err().code(), ErrorCode::FORG0001);
        assert_eq!(parse_boolean("yes").unwrap_err().code(), ErrorCode::FORG0001);
    }

    #[test]
    fn any_uri_is_collapsed() {
        assert_eq!(parse_any_uri("  a   b ", false).unwrap(), "a b");
        assert_eq!(parse_any_uri("http://example.com/x", true).unwrap(), "http://example.com/x");
        assert!(parse_any_uri("http://[bad", true).is_err());
    }
}
