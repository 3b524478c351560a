//! `xs:duration` and its two totally ordered subtypes.
//!
//! A duration is held as a sign plus non-negative magnitudes: a month count
//! and a seconds/microseconds pair. Zero is always positive.

use crate::engine::runtime::{ConversionResult, Error, ErrorCode, ValidationFailure};
use crate::util::whitespace::trim_xml_whitespace;
use crate::xdm::numeric::{DECIMAL_DIVIDE_PRECISION, DecimalValue};
use core::cmp::Ordering;
use core::fmt;
use rust_decimal::{Decimal, RoundingStrategy};

pub const MICROS_PER_SECOND: i64 = 1_000_000;
pub const SECONDS_PER_DAY: i64 = 86_400;
pub const MICROS_PER_DAY: i64 = SECONDS_PER_DAY * MICROS_PER_SECOND;

/// Largest month count a duration may carry.
pub const MAX_MONTHS: u32 = i32::MAX as u32;
/// Largest whole-second count; keeps the total microsecond count within `i64`.
pub const MAX_SECONDS: u64 = (i64::MAX / MICROS_PER_SECOND) as u64;
/// Largest day-time magnitude in microseconds.
pub const MAX_MICROS: u128 = i64::MAX as u128;

fn duration_overflow() -> Error {
    Error::from_code(ErrorCode::FODT0002, "duration value out of range")
}

fn nan_operand() -> Error {
    Error::from_code(ErrorCode::FOCA0005, "NaN supplied as duration multiplier or divisor")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DurationValue {
    negative: bool,
    months: u32,
    seconds: u64,
    micros: u32,
}

impl DurationValue {
    pub const ZERO: DurationValue = DurationValue {
        negative: false,
        months: 0,
        seconds: 0,
        micros: 0,
    };

    /// Builds a duration from raw magnitudes.
    ///
    /// # Panics
    /// If `micros` is not below one second, `months` exceeds [`MAX_MONTHS`],
    /// or the day-time magnitude exceeds [`MAX_MICROS`].
    pub fn new(negative: bool, months: u32, seconds: u64, micros: u32) -> Self {
        assert!(micros < 1_000_000, "microsecond component must be below one second");
        assert!(months <= MAX_MONTHS, "month component out of range");
        assert!(
            u128::from(seconds) * 1_000_000 + u128::from(micros) <= MAX_MICROS,
            "seconds component out of range"
        );
        let zero = months == 0 && seconds == 0 && micros == 0;
        Self {
            negative: negative && !zero,
            months,
            seconds,
            micros,
        }
    }

    /// Builds a duration from calendar components, failing with `FODT0002`
    /// when the totals leave the representable range.
    #[allow(clippy::too_many_arguments)]
    pub fn from_components(
        negative: bool,
        years: u64,
        months: u64,
        days: u64,
        hours: u64,
        minutes: u64,
        seconds: u64,
        micros: u64,
    ) -> Result<Self, Error> {
        let total_months = u128::from(years) * 12 + u128::from(months);
        let total_micros = ((u128::from(days) * 24 + u128::from(hours)) * 60 + u128::from(minutes)) * 60
            * 1_000_000
            + u128::from(seconds) * 1_000_000
            + u128::from(micros);
        let months = u32::try_from(total_months)
            .ok()
            .filter(|m| *m <= MAX_MONTHS)
            .ok_or_else(duration_overflow)?;
        let (secs, micros) = split_magnitude(total_micros)?;
        Ok(Self::new(negative, months, secs, micros))
    }

    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        parse_duration(lexical, true, true)
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.seconds == 0 && self.micros == 0
    }

    /// Signed month count.
    pub fn total_months(&self) -> i64 {
        let m = i64::from(self.months);
        if self.negative { -m } else { m }
    }

    /// Signed length of the day-time part in microseconds.
    pub fn total_micros(&self) -> i64 {
        let m = self.magnitude_micros();
        if self.negative { -m } else { m }
    }

    // `new` keeps the magnitude within `MAX_MICROS`, so the narrowing is exact.
    #[allow(clippy::cast_possible_truncation)]
    fn magnitude_micros(&self) -> i64 {
        (u128::from(self.seconds) * 1_000_000 + u128::from(self.micros)) as i64
    }

    fn sign(&self) -> i64 {
        if self.negative { -1 } else { 1 }
    }

    pub fn years(&self) -> i64 {
        self.sign() * i64::from(self.months / 12)
    }

    pub fn months(&self) -> i64 {
        self.sign() * i64::from(self.months % 12)
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn days(&self) -> i64 {
        self.sign() * (self.seconds / 86_400) as i64
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn hours(&self) -> i64 {
        self.sign() * ((self.seconds % 86_400) / 3600) as i64
    }

    #[allow(clippy::cast_possible_wrap)]
    pub fn minutes(&self) -> i64 {
        self.sign() * ((self.seconds % 3600) / 60) as i64
    }

    /// Seconds component including the fraction, e.g. `-1.5`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn seconds(&self) -> DecimalValue {
        let whole = (self.seconds % 60) as i64 * MICROS_PER_SECOND + i64::from(self.micros);
        DecimalValue::new(Decimal::new(self.sign() * whole, 6))
    }

    pub fn microseconds(&self) -> u32 {
        self.micros
    }

    #[must_use]
    pub fn negate(&self) -> Self {
        Self::new(!self.negative, self.months, self.seconds, self.micros)
    }

    /// The year-month part, dropping days and time.
    pub fn to_year_month(&self) -> YearMonthDurationValue {
        YearMonthDurationValue(Self::new(self.negative, self.months, 0, 0))
    }

    /// The day-time part, dropping years and months.
    pub fn to_day_time(&self) -> DayTimeDurationValue {
        DayTimeDurationValue(Self::new(self.negative, 0, self.seconds, self.micros))
    }

    fn write_canonical(&self, f: &mut fmt::Formatter<'_>, zero: &str) -> fmt::Result {
        if self.is_zero() {
            return f.write_str(zero);
        }
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        let years = self.months / 12;
        let months = self.months % 12;
        if years != 0 {
            write!(f, "{years}Y")?;
        }
        if months != 0 {
            write!(f, "{months}M")?;
        }
        let days = self.seconds / 86_400;
        if days != 0 {
            write!(f, "{days}D")?;
        }
        let rest = self.seconds % 86_400;
        if rest != 0 || self.micros != 0 {
            f.write_str("T")?;
            let hours = rest / 3600;
            let minutes = (rest % 3600) / 60;
            let secs = rest % 60;
            if hours != 0 {
                write!(f, "{hours}H")?;
            }
            if minutes != 0 {
                write!(f, "{minutes}M")?;
            }
            if secs != 0 || self.micros != 0 {
                write!(f, "{secs}")?;
                if self.micros != 0 {
                    let frac = format!("{:06}", self.micros);
                    write!(f, ".{}", frac.trim_end_matches('0'))?;
                }
                f.write_str("S")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_canonical(f, "PT0S")
    }
}

/// `xs:yearMonthDuration`: a signed month count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct YearMonthDurationValue(DurationValue);

impl YearMonthDurationValue {
    pub fn from_months(months: i64) -> Result<Self, Error> {
        let magnitude = u32::try_from(months.unsigned_abs())
            .ok()
            .filter(|m| *m <= MAX_MONTHS)
            .ok_or_else(duration_overflow)?;
        Ok(Self(DurationValue::new(months < 0, magnitude, 0, 0)))
    }

    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        parse_duration(lexical, true, false).map(Self)
    }

    pub fn total_months(&self) -> i64 {
        self.0.total_months()
    }

    pub fn as_duration(&self) -> DurationValue {
        self.0
    }

    pub fn years(&self) -> i64 {
        self.0.years()
    }

    pub fn months(&self) -> i64 {
        self.0.months()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    #[must_use]
    pub fn negate(&self) -> Self {
        Self(self.0.negate())
    }

    pub fn add(&self, other: &Self) -> Result<Self, Error> {
        Self::from_months(self.total_months() + other.total_months())
    }

    pub fn subtract(&self, other: &Self) -> Result<Self, Error> {
        Self::from_months(self.total_months() - other.total_months())
    }

    /// Scales by a number; the month count rounds half towards positive infinity.
    pub fn multiply(&self, factor: f64) -> Result<Self, Error> {
        if factor.is_nan() {
            return Err(nan_operand());
        }
        #[allow(clippy::cast_precision_loss)]
        let product = self.total_months() as f64 * factor;
        Self::from_months(round_to_i64(product)?)
    }

    pub fn divide(&self, divisor: f64) -> Result<Self, Error> {
        if divisor.is_nan() {
            return Err(nan_operand());
        }
        if divisor == 0.0 {
            return Err(duration_overflow());
        }
        #[allow(clippy::cast_precision_loss)]
        let quotient = self.total_months() as f64 / divisor;
        Self::from_months(round_to_i64(quotient)?)
    }

    /// Ratio of two year-month durations.
    pub fn divide_by(&self, other: &Self) -> Result<DecimalValue, Error> {
        ratio(i128::from(self.total_months()), i128::from(other.total_months()))
    }
}

impl PartialOrd for YearMonthDurationValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for YearMonthDurationValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_months().cmp(&other.total_months())
    }
}

impl fmt::Display for YearMonthDurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.write_canonical(f, "P0M")
    }
}

impl From<YearMonthDurationValue> for DurationValue {
    fn from(d: YearMonthDurationValue) -> Self {
        d.0
    }
}

/// `xs:dayTimeDuration`: a signed microsecond count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DayTimeDurationValue(DurationValue);

impl DayTimeDurationValue {
    pub const ZERO: DayTimeDurationValue = DayTimeDurationValue(DurationValue::ZERO);

    pub fn from_micros(micros: i128) -> Result<Self, Error> {
        let (seconds, sub) = split_magnitude(micros.unsigned_abs())?;
        Ok(Self(DurationValue::new(micros < 0, 0, seconds, sub)))
    }

    pub fn from_seconds(seconds: i64) -> Result<Self, Error> {
        Self::from_micros(i128::from(seconds) * 1_000_000)
    }

    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        parse_duration(lexical, false, true).map(Self)
    }

    pub fn total_micros(&self) -> i64 {
        self.0.total_micros()
    }

    pub fn as_duration(&self) -> DurationValue {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn days(&self) -> i64 {
        self.0.days()
    }

    pub fn hours(&self) -> i64 {
        self.0.hours()
    }

    pub fn minutes(&self) -> i64 {
        self.0.minutes()
    }

    pub fn seconds(&self) -> DecimalValue {
        self.0.seconds()
    }

    #[must_use]
    pub fn negate(&self) -> Self {
        Self(self.0.negate())
    }

    pub fn add(&self, other: &Self) -> Result<Self, Error> {
        Self::from_micros(i128::from(self.total_micros()) + i128::from(other.total_micros()))
    }

    pub fn subtract(&self, other: &Self) -> Result<Self, Error> {
        Self::from_micros(i128::from(self.total_micros()) - i128::from(other.total_micros()))
    }

    /// Scales by a number, rounding to the nearest microsecond.
    pub fn multiply(&self, factor: f64) -> Result<Self, Error> {
        if factor.is_nan() {
            return Err(nan_operand());
        }
        #[allow(clippy::cast_precision_loss)]
        let product = self.total_micros() as f64 * factor;
        Self::from_micros(i128::from(round_to_i64(product)?))
    }

    pub fn divide(&self, divisor: f64) -> Result<Self, Error> {
        if divisor.is_nan() {
            return Err(nan_operand());
        }
        if divisor == 0.0 {
            return Err(duration_overflow());
        }
        #[allow(clippy::cast_precision_loss)]
        let quotient = self.total_micros() as f64 / divisor;
        Self::from_micros(i128::from(round_to_i64(quotient)?))
    }

    /// Ratio of two day-time durations.
    pub fn divide_by(&self, other: &Self) -> Result<DecimalValue, Error> {
        ratio(i128::from(self.total_micros()), i128::from(other.total_micros()))
    }
}

impl PartialOrd for DayTimeDurationValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DayTimeDurationValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_micros().cmp(&other.total_micros())
    }
}

impl fmt::Display for DayTimeDurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.write_canonical(f, "PT0S")
    }
}

impl From<DayTimeDurationValue> for DurationValue {
    fn from(d: DayTimeDurationValue) -> Self {
        d.0
    }
}

fn split_magnitude(total_micros: u128) -> Result<(u64, u32), Error> {
    if total_micros > MAX_MICROS {
        return Err(duration_overflow());
    }
    let seconds = u64::try_from(total_micros / 1_000_000).map_err(|_| duration_overflow())?;
    let micros = u32::try_from(total_micros % 1_000_000).map_err(|_| duration_overflow())?;
    Ok((seconds, micros))
}

fn ratio(a: i128, b: i128) -> Result<DecimalValue, Error> {
    if b == 0 {
        return Err(Error::from_code(ErrorCode::FOAR0001, "division by a zero-length duration"));
    }
    let (Ok(a), Ok(b)) = (Decimal::try_from_i128_with_scale(a, 0), Decimal::try_from_i128_with_scale(b, 0)) else {
        return Err(duration_overflow());
    };
    let q = a.checked_div(b).ok_or_else(duration_overflow)?;
    Ok(DecimalValue::new(
        q.round_dp_with_strategy(DECIMAL_DIVIDE_PRECISION, RoundingStrategy::MidpointNearestEven),
    ))
}

// Rounds half towards positive infinity, as fn:round does.
#[allow(clippy::cast_possible_truncation)]
fn round_to_i64(x: f64) -> Result<i64, Error> {
    let r = (x + 0.5).floor();
    if !r.is_finite() || r >= 9_223_372_036_854_775_808.0 || r < -9_223_372_036_854_775_808.0 {
        return Err(duration_overflow());
    }
    Ok(r as i64)
}

/// Scans `[-]PnYnMnDTnHnMnS` with an optional fraction on the seconds.
///
/// Every component is optional but at least one must be present, and a `T`
/// must be followed by at least one time component. `allow_ym`/`allow_dt`
/// restrict the lexical space to the year-month or day-time subtype.
fn parse_duration(lexical: &str, allow_ym: bool, allow_dt: bool) -> ConversionResult<DurationValue> {
    let bad = |why: &str| ValidationFailure::invalid(format!("invalid duration \"{lexical}\": {why}"));
    let s = trim_xml_whitespace(lexical);
    let bytes = s.as_bytes();
    let mut i = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => return Err(bad("+ sign not allowed in a duration")),
        _ => false,
    };
    if bytes.get(i) != Some(&b'P') {
        return Err(bad("must start with 'P'"));
    }
    i += 1;

    // 0 start, 1 Y, 2 M, 3 D, 4 T, 5 H, 6 M(inutes), 8 S
    let mut state = 0u8;
    let mut in_time = false;
    let mut components = 0;
    let mut time_components = 0;
    let mut has_year_month = false;
    let mut has_day_time = false;
    let (mut years, mut months, mut days, mut hours, mut minutes, mut seconds) = (0u64, 0u64, 0u64, 0u64, 0u64, 0u64);
    let mut micros = 0u64;

    while i < bytes.len() {
        if bytes[i] == b'T' {
            if in_time {
                return Err(bad("'T' appears twice"));
            }
            in_time = true;
            state = 4;
            i += 1;
            if i == bytes.len() {
                return Err(bad("'T' must be followed by time components"));
            }
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if start == i {
            return Err(bad("expected a number"));
        }
        let value: u64 = s[start..i]
            .parse()
            .map_err(|_| ValidationFailure::new(ErrorCode::FODT0002, format!("duration component too large in \"{lexical}\"")))?;
        let mut fraction = None;
        if bytes.get(i) == Some(&b'.') {
            i += 1;
            let fstart = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if fstart == i {
                return Err(bad("'.' must be followed by digits"));
            }
            fraction = Some(&s[fstart..i]);
        }
        let Some(&designator) = bytes.get(i) else {
            return Err(bad("missing component designator"));
        };
        i += 1;
        if fraction.is_some() && designator != b'S' {
            return Err(bad("only seconds may have a fractional part"));
        }
        match designator {
            b'Y' if !in_time && state < 1 => {
                years = value;
                state = 1;
            }
            b'M' if !in_time && state < 2 => {
                months = value;
                state = 2;
            }
            b'D' if !in_time && state < 3 => {
                days = value;
                state = 3;
            }
            b'H' if in_time && state < 5 => {
                hours = value;
                state = 5;
            }
            b'M' if in_time && state < 6 => {
                minutes = value;
                state = 6;
            }
            b'S' if in_time && state < 8 => {
                seconds = value;
                state = 8;
                if let Some(frac) = fraction {
                    let mut digits: String = frac.chars().take(6).collect();
                    while digits.len() < 6 {
                        digits.push('0');
                    }
                    micros = digits.parse().map_err(|_| bad("bad fraction"))?;
                }
            }
            _ => return Err(bad("component designator out of sequence")),
        }
        components += 1;
        if in_time {
            time_components += 1;
        }
        if matches!(state, 1 | 2) {
            has_year_month = true;
        } else {
            has_day_time = true;
        }
    }

    if components == 0 {
        return Err(bad("no components present"));
    }
    if in_time && time_components == 0 {
        return Err(bad("'T' must be followed by time components"));
    }
    if !allow_ym && has_year_month {
        return Err(bad("year and month components are not allowed in xs:dayTimeDuration"));
    }
    if !allow_dt && has_day_time {
        return Err(bad("day and time components are not allowed in xs:yearMonthDuration"));
    }
    DurationValue::from_components(negative, years, months, days, hours, minutes, seconds, micros)
        .map_err(|e| ValidationFailure::new(e.code, e.message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn designator_order_enforced() {
        assert!(DurationValue::parse("P1M1Y").is_err());
        assert!(DurationValue::parse("PT1S1M").is_err());
        assert!(DurationValue::parse("P1H").is_err());
    }

    #[test]
    fn fraction_is_truncated_to_micros() {
        let d = DurationValue::parse("PT1.1234567S").unwrap();
        assert_eq!(d.microseconds(), 123_456);
    }

    #[test]
    fn magnitude_is_capped_at_i64_micros() {
        assert_eq!(split_magnitude(MAX_MICROS).unwrap(), (MAX_SECONDS, 775_807));
        assert!(split_magnitude(MAX_MICROS + 1).is_err());
    }
}
