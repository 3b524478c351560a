//! Calendar values: `xs:date`, `xs:time`, `xs:dateTime` and the partial
//! Gregorian types.
//!
//! All arithmetic runs on day numbers produced by [`julian_day_number`]. Years
//! are stored proleptically with a year zero (lexical `-0001` is internal
//! year `0`); the lexical boundary applies the ±1 adjustment.

mod date;
mod date_time;
mod gregorian;
mod time;

pub use date::DateValue;
pub use date_time::DateTimeValue;
pub use gregorian::{GDayValue, GMonthDayValue, GMonthValue, GYearMonthValue, GYearValue};
pub use time::TimeValue;

use crate::engine::runtime::{ConversionResult, Error, ErrorCode, ValidationFailure};
use crate::xdm::duration::{DayTimeDurationValue, MICROS_PER_DAY, YearMonthDurationValue};
use core::cmp::Ordering;
use core::fmt;
use fancy_regex::{Captures, Regex};
use std::sync::OnceLock;

const DAYS_PER_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

// Days in one 400-year Gregorian cycle.
const DAYS_PER_ERA: i64 = 146_097;
// Day number of 0000-03-01, the first day of a March-based era.
const ERA_EPOCH_JDN: i64 = 1_721_120;

const MAX_TZ_MINUTES: i32 = 14 * 60;

/// A timezone offset in minutes east of UTC, within ±14:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimezoneOffset(i16);

impl TimezoneOffset {
    pub const UTC: TimezoneOffset = TimezoneOffset(0);

    #[allow(clippy::cast_possible_truncation)]
    pub fn from_minutes(minutes: i32) -> ConversionResult<Self> {
        if minutes.abs() > MAX_TZ_MINUTES {
            return Err(ValidationFailure::new(
                ErrorCode::FODT0001,
                format!("timezone offset {minutes} minutes is outside -14:00..+14:00"),
            ));
        }
        Ok(Self(minutes as i16))
    }

    pub fn minutes(&self) -> i32 {
        i32::from(self.0)
    }

    /// Parses `Z` or `[+-]hh:mm`.
    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        let bad = || ValidationFailure::invalid(format!("invalid timezone \"{lexical}\""));
        if lexical == "Z" {
            return Ok(Self::UTC);
        }
        let b = lexical.as_bytes();
        if b.len() != 6 || b[3] != b':' || !matches!(b[0], b'+' | b'-') {
            return Err(bad());
        }
        let hh = two_digits(&lexical[1..3]).ok_or_else(bad)?;
        let mm = two_digits(&lexical[4..6]).ok_or_else(bad)?;
        if hh > 14 || mm > 59 || (hh == 14 && mm != 0) {
            return Err(bad());
        }
        let minutes = i32::from(hh) * 60 + i32::from(mm);
        Self::from_minutes(if b[0] == b'-' { -minutes } else { minutes }).map_err(|_| bad())
    }

    pub fn as_duration(&self) -> DayTimeDurationValue {
        DayTimeDurationValue::from_micros(i128::from(self.minutes()) * 60_000_000).unwrap_or_default()
    }

    /// Converts a day-time duration to an offset; it must be a whole number
    /// of minutes within ±14:00.
    pub fn from_duration(d: &DayTimeDurationValue) -> Result<Self, Error> {
        let micros = d.total_micros();
        if micros % 60_000_000 != 0 {
            return Err(Error::from_code(ErrorCode::FODT0001, format!("timezone {d} is not a whole number of minutes")));
        }
        let minutes = i32::try_from(micros / 60_000_000)
            .map_err(|_| Error::from_code(ErrorCode::FODT0001, format!("invalid timezone {d}")))?;
        Self::from_minutes(minutes).map_err(Error::from)
    }
}

impl fmt::Display for TimezoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("Z");
        }
        let sign = if self.0 < 0 { '-' } else { '+' };
        let m = self.0.unsigned_abs();
        write!(f, "{sign}{:02}:{:02}", m / 60, m % 60)
    }
}

fn two_digits(s: &str) -> Option<u8> {
    let b = s.as_bytes();
    if b.len() == 2 && b[0].is_ascii_digit() && b[1].is_ascii_digit() {
        Some((b[0] - b'0') * 10 + (b[1] - b'0'))
    } else {
        None
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0) && !(year % 100 == 0 && year % 400 != 0)
}

/// Days in the given month (1-based) of the given internal year.
pub fn days_in_month(year: i32, month: u8) -> u8 {
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS_PER_MONTH[usize::from(month.clamp(1, 12) - 1)]
    }
}

pub fn is_valid_date(year: i32, month: u8, day: u8) -> bool {
    (1..=12).contains(&month) && day >= 1 && day <= days_in_month(year, month)
}

/// Day number of a proleptic Gregorian date.
///
/// Years are counted from March so the leap day closes the year; eras of
/// 400 years are split off with Euclidean division, which keeps every
/// intermediate value non-negative for any `i32` year.
pub fn julian_day_number(year: i32, month: u8, day: u8) -> i64 {
    let month = i64::from(month.clamp(1, 12));
    let y = i64::from(year) - i64::from(month < 3);
    let era = y.div_euclid(400);
    let year_of_era = y.rem_euclid(400);
    let month_from_march = (month + 9) % 12;
    let day_of_year = (153 * month_from_march + 2) / 5 + i64::from(day) - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    ERA_EPOCH_JDN + era * DAYS_PER_ERA + day_of_era
}

/// Inverse of [`julian_day_number`]: `(year, month, day)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn date_from_julian_day_number(jdn: i64) -> (i64, u8, u8) {
    let z = jdn - ERA_EPOCH_JDN;
    let era = z.div_euclid(DAYS_PER_ERA);
    let day_of_era = z.rem_euclid(DAYS_PER_ERA);
    let year_of_era = (day_of_era - day_of_era / 1460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    let month_from_march = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * month_from_march + 2) / 5 + 1;
    let month = if month_from_march < 10 { month_from_march + 3 } else { month_from_march - 9 };
    let year = era * 400 + year_of_era + i64::from(month < 3);
    (year, month as u8, day as u8)
}

pub fn tomorrow(year: i32, month: u8, day: u8) -> (i32, u8, u8) {
    if day < days_in_month(year, month) {
        (year, month, day + 1)
    } else if month < 12 {
        (year, month + 1, 1)
    } else {
        (year.saturating_add(1), 1, 1)
    }
}

pub fn yesterday(year: i32, month: u8, day: u8) -> (i32, u8, u8) {
    if day > 1 {
        (year, month, day - 1)
    } else if month > 1 {
        (year, month - 1, days_in_month(year, month - 1))
    } else {
        (year.saturating_sub(1), 12, 31)
    }
}

/// Adds a signed number of months, then moves the day back until the date
/// exists (Jan 31 + 1 month is Feb 28 or 29).
pub(crate) fn add_months(year: i32, month: u8, day: u8, months: i64) -> Result<(i32, u8, u8), Error> {
    let index = i64::from(year) * 12 + i64::from(month) - 1 + months;
    let y = i32::try_from(index.div_euclid(12)).map_err(|_| year_overflow())?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let m = (index.rem_euclid(12) + 1) as u8;
    let mut d = day;
    while !is_valid_date(y, m, d) {
        d -= 1;
    }
    Ok((y, m, d))
}

pub(crate) fn year_overflow() -> Error {
    Error::from_code(ErrorCode::FODT0001, "year out of range in date/time arithmetic")
}

/// Lexical year (no year zero) from the internal year.
pub(crate) fn lexical_year(internal: i32) -> i64 {
    if internal <= 0 { i64::from(internal) - 1 } else { i64::from(internal) }
}

pub(crate) fn write_year(f: &mut fmt::Formatter<'_>, internal: i32) -> fmt::Result {
    if internal <= 0 {
        write!(f, "-{:04}", -i64::from(internal) + 1)
    } else {
        write!(f, "{internal:04}")
    }
}

pub(crate) fn write_tz(f: &mut fmt::Formatter<'_>, tz: Option<TimezoneOffset>) -> fmt::Result {
    match tz {
        Some(tz) => write!(f, "{tz}"),
        None => Ok(()),
    }
}

pub(crate) fn write_fraction(f: &mut fmt::Formatter<'_>, micros: u32) -> fmt::Result {
    if micros == 0 {
        return Ok(());
    }
    let frac = format!("{micros:06}");
    write!(f, ".{}", frac.trim_end_matches('0'))
}

/// Compiles a lexical pattern once per process.
pub(crate) fn lexical_regex(
    cell: &'static OnceLock<Result<Regex, fancy_regex::Error>>,
    pattern: &str,
) -> ConversionResult<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map_err(|e| ValidationFailure::new(ErrorCode::Unknown, format!("invalid lexical pattern: {e}")))
}

pub(crate) fn match_lexical<'t>(re: &Regex, s: &'t str, type_name: &str) -> ConversionResult<Captures<'t>> {
    re.captures(s)?
        .ok_or_else(|| ValidationFailure::invalid(format!("invalid {type_name} \"{s}\"")))
}

pub(crate) fn group<'t>(caps: &Captures<'t>, i: usize) -> Option<&'t str> {
    caps.get(i).map(|m| m.as_str()).filter(|s| !s.is_empty())
}

pub(crate) fn field(caps: &Captures<'_>, i: usize) -> u8 {
    group(caps, i).and_then(two_digits).unwrap_or(0)
}

/// Parses a sign group and year digits into the internal year.
pub(crate) fn parse_year(sign: Option<&str>, digits: &str, lexical: &str) -> ConversionResult<i32> {
    let bad = |why: &str| ValidationFailure::invalid(format!("invalid year in \"{lexical}\": {why}"));
    if digits.len() > 4 && digits.starts_with('0') {
        return Err(bad("leading zeros are only allowed in four-digit years"));
    }
    let year: i64 = digits.parse().map_err(|_| bad("too large"))?;
    if year == 0 {
        return Err(bad("year 0000 is not allowed"));
    }
    let internal = if sign == Some("-") { -year + 1 } else { year };
    i32::try_from(internal).map_err(|_| bad("too large"))
}

pub(crate) fn parse_tz_group(caps: &Captures<'_>, i: usize) -> ConversionResult<Option<TimezoneOffset>> {
    group(caps, i).map(TimezoneOffset::parse).transpose()
}

/// Fraction digits after the point, truncated to microseconds.
pub(crate) fn parse_micros(frac: Option<&str>) -> u32 {
    let Some(frac) = frac else { return 0 };
    let digits = frac.trim_start_matches('.');
    let mut micros = 0u32;
    for b in digits.bytes().chain(core::iter::repeat(b'0')).take(6) {
        micros = micros * 10 + u32::from(b - b'0');
    }
    micros
}

/// Behaviour shared by every calendar type. The timezone is fixed at
/// construction; adjusting it produces a new value.
pub trait CalendarValue: Clone + fmt::Display {
    fn timezone(&self) -> Option<TimezoneOffset>;

    fn has_timezone(&self) -> bool {
        self.timezone().is_some()
    }

    fn timezone_in_minutes(&self) -> Option<i32> {
        self.timezone().map(|tz| tz.minutes())
    }

    /// The starting instant as a dateTime; partial types use reference dates.
    fn to_date_time(&self) -> DateTimeValue;

    /// Same local fields with a different (or no) timezone.
    #[must_use]
    fn with_timezone(&self, tz: Option<TimezoneOffset>) -> Self;

    /// Shifts the value into `tz`. A value without a timezone just acquires it.
    #[must_use]
    fn adjust_timezone(&self, tz: TimezoneOffset) -> Self;

    /// Removes the timezone without shifting the local fields.
    #[must_use]
    fn remove_timezone(&self) -> Self {
        self.with_timezone(None)
    }

    fn add_year_month(&self, _d: &YearMonthDurationValue) -> Result<Self, Error> {
        Err(Error::type_error(format!("cannot add a yearMonthDuration to {self}")))
    }

    fn add_day_time(&self, _d: &DayTimeDurationValue) -> Result<Self, Error> {
        Err(Error::type_error(format!("cannot add a dayTimeDuration to {self}")))
    }

    /// Elapsed time `self - other`. Values lacking a timezone take the implicit one.
    fn subtract(&self, other: &Self, _implicit: Option<TimezoneOffset>) -> Result<DayTimeDurationValue, Error> {
        Err(Error::type_error(format!("cannot subtract {other} from {self}")))
    }

    /// Chronological order of the starting instants.
    fn compare(&self, other: &Self, implicit: Option<TimezoneOffset>) -> Result<Ordering, Error> {
        instant_difference(&self.to_date_time(), &other.to_date_time(), implicit).map(|d| d.cmp(&0))
    }
}

/// Instant difference `a - b` in microseconds, resolving missing timezones
/// against `implicit`. Fails with `XPDY0002` when exactly one side has a
/// timezone and no implicit timezone is available.
pub(crate) fn instant_difference(
    a: &DateTimeValue,
    b: &DateTimeValue,
    implicit: Option<TimezoneOffset>,
) -> Result<i128, Error> {
    match (a.timezone(), b.timezone()) {
        (Some(_), Some(_)) | (None, None) => Ok(a.utc_micros_or_local() - b.utc_micros_or_local()),
        _ => {
            let tz = implicit.ok_or_else(|| {
                Error::from_code(
                    ErrorCode::XPDY0002,
                    "implicit timezone required to compare values with and without a timezone",
                )
            })?;
            Ok(a.utc_micros(tz) - b.utc_micros(tz))
        }
    }
}

pub(crate) fn split_day_micros(micros: i128) -> (i64, i64) {
    let day = i128::from(MICROS_PER_DAY);
    #[allow(clippy::cast_possible_truncation)]
    (micros.div_euclid(day) as i64, micros.rem_euclid(day) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn julian_round_trip_across_year_zero() {
        for (y, m, d) in [(2000, 1, 1), (1, 1, 1), (0, 12, 31), (-1, 3, 1), (-4713, 11, 24), (1972, 12, 31)] {
            let jdn = julian_day_number(y, m, d);
            assert_eq!(date_from_julian_day_number(jdn), (i64::from(y), m, d), "{y}-{m}-{d}");
        }
    }

    #[test]
    fn known_day_numbers() {
        assert_eq!(julian_day_number(2000, 1, 1), 2_451_545);
        assert_eq!(julian_day_number(1970, 1, 1), 2_440_588);
        assert_eq!(julian_day_number(-4713, 11, 24), 0);
        assert_eq!(date_from_julian_day_number(-1), (-4713, 11, 23));
    }

    #[test]
    fn julian_round_trip_far_from_year_zero() {
        for y in [-999_999_999, -20_001, -20_000, -12_001, -12_000, -11_999, 11_999, 12_000, 20_000, 999_999_999] {
            for (m, d) in [(1, 1), (2, 28), (3, 1), (12, 31)] {
                let jdn = julian_day_number(y, m, d);
                assert_eq!(date_from_julian_day_number(jdn), (i64::from(y), m, d), "{y}-{m}-{d}");
                assert_eq!(julian_day_number(y, 12, 31) + 1, julian_day_number(y + 1, 1, 1), "{y}");
            }
        }
    }

    #[test]
    fn consecutive_days_have_consecutive_numbers() {
        let (y, m, d) = tomorrow(0, 12, 31);
        assert_eq!((y, m, d), (1, 1, 1));
        assert_eq!(julian_day_number(1, 1, 1) - julian_day_number(0, 12, 31), 1);
        assert_eq!(yesterday(2024, 3, 1), (2024, 2, 29));
    }

    #[test]
    fn month_addition_clamps_day() {
        assert_eq!(add_months(2023, 1, 31, 1).unwrap(), (2023, 2, 28));
        assert_eq!(add_months(2024, 1, 31, 1).unwrap(), (2024, 2, 29));
        assert_eq!(add_months(2024, 1, 15, -13).unwrap(), (2022, 12, 15));
    }

    #[test]
    fn micros_are_truncated() {
        assert_eq!(parse_micros(Some(".5")), 500_000);
        assert_eq!(parse_micros(Some(".1234567")), 123_456);
        assert_eq!(parse_micros(None), 0);
    }
}
