use super::{
    CalendarValue, DateValue, TimeValue, TimezoneOffset, add_months, date_from_julian_day_number, field,
    group, instant_difference, is_valid_date, julian_day_number, lexical_regex, lexical_year, match_lexical,
    parse_micros, parse_tz_group, parse_year, split_day_micros, tomorrow, write_fraction, write_tz,
    write_year, year_overflow, yesterday,
};
use crate::engine::runtime::{ConversionResult, Error, ErrorCode, ValidationFailure};
use crate::util::whitespace::trim_xml_whitespace;
use crate::xdm::duration::{DayTimeDurationValue, YearMonthDurationValue};
use crate::xdm::numeric::DecimalValue;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use fancy_regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

static DATE_TIME_RE: OnceLock<Result<Regex, fancy_regex::Error>> = OnceLock::new();

const DATE_TIME_PATTERN: &str = r"^(-?)([0-9]{4,})-([0-9]{2})-([0-9]{2})T([0-9]{2}):([0-9]{2}):([0-9]{2})(\.[0-9]+)?(Z|[+-][0-9]{2}:[0-9]{2})?$";

/// `xs:dateTime`: local fields plus an optional timezone.
#[derive(Debug, Clone)]
pub struct DateTimeValue {
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    micros: u32,
    tz: Option<TimezoneOffset>,
}

impl DateTimeValue {
    /// Builds a dateTime from internal fields.
    ///
    /// # Panics
    /// If the fields do not describe an existing date and time of day.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        micros: u32,
        tz: Option<TimezoneOffset>,
    ) -> Self {
        assert!(is_valid_date(year, month, day), "invalid date {year}-{month}-{day}");
        assert!(hour < 24 && minute < 60 && second < 60 && micros < 1_000_000, "invalid time of day");
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            micros,
            tz,
        }
    }

    /// Parses `[-]CCYY-MM-DDThh:mm:ss[.ffffff][zzzzzz]`. `24:00:00` rolls over
    /// to midnight of the following day.
    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        let s = trim_xml_whitespace(lexical);
        let re = lexical_regex(&DATE_TIME_RE, DATE_TIME_PATTERN)?;
        let caps = match_lexical(re, s, "xs:dateTime")?;
        let year = parse_year(group(&caps, 1), group(&caps, 2).unwrap_or_default(), s)?;
        let (month, day) = (field(&caps, 3), field(&caps, 4));
        let (hour, minute, second) = (field(&caps, 5), field(&caps, 6), field(&caps, 7));
        let micros = parse_micros(group(&caps, 8));
        let tz = parse_tz_group(&caps, 9)?;
        if !is_valid_date(year, month, day) {
            return Err(ValidationFailure::invalid(format!("non-existent date in \"{s}\"")));
        }
        if hour == 24 {
            if minute != 0 || second != 0 || micros != 0 {
                return Err(ValidationFailure::invalid(format!("hour 24 requires zero minutes and seconds in \"{s}\"")));
            }
            let (y, m, d) = tomorrow(year, month, day);
            return Ok(Self::new(y, m, d, 0, 0, 0, 0, tz));
        }
        if hour > 23 || minute > 59 || second > 59 {
            return Err(ValidationFailure::invalid(format!("time fields out of range in \"{s}\"")));
        }
        Ok(Self::new(year, month, day, hour, minute, second, micros, tz))
    }

    /// Combines a date and a time (`fn:dateTime`). When both carry a
    /// timezone they must agree.
    pub fn from_date_and_time(date: &DateValue, time: &TimeValue) -> Result<Self, Error> {
        let tz = match (date.timezone(), time.timezone()) {
            (Some(a), Some(b)) if a != b => {
                return Err(Error::from_code(
                    ErrorCode::FORG0008,
                    "the date and time arguments have different timezones",
                ));
            }
            (a, b) => a.or(b),
        };
        Ok(Self::new(
            date.internal_year(),
            date.month(),
            date.day(),
            time.hour(),
            time.minute(),
            time.whole_seconds(),
            time.microsecond(),
            tz,
        ))
    }

    /// The current instant in the host's local timezone.
    pub fn now() -> Self {
        Self::from(chrono::Local::now().fixed_offset())
    }

    /// Rebuilds a dateTime from microseconds since the day-number epoch.
    pub(crate) fn from_local_micros(micros: i128, tz: Option<TimezoneOffset>) -> Result<Self, Error> {
        let (jdn, rem) = split_day_micros(micros);
        let (y, m, d) = date_from_julian_day_number(jdn);
        let year = i32::try_from(y).map_err(|_| year_overflow())?;
        let secs = rem / 1_000_000;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(Self::new(
            year,
            m,
            d,
            (secs / 3600) as u8,
            ((secs % 3600) / 60) as u8,
            (secs % 60) as u8,
            (rem % 1_000_000) as u32,
            tz,
        ))
    }

    /// Microseconds since the day-number epoch, ignoring the timezone.
    pub(crate) fn local_micros(&self) -> i128 {
        let jdn = i128::from(julian_day_number(self.year, self.month, self.day));
        let secs = i128::from(self.hour) * 3600 + i128::from(self.minute) * 60 + i128::from(self.second);
        (jdn * 86_400 + secs) * 1_000_000 + i128::from(self.micros)
    }

    /// UTC instant, using `fallback` when the value has no timezone.
    pub(crate) fn utc_micros(&self, fallback: TimezoneOffset) -> i128 {
        let tz = self.tz.unwrap_or(fallback);
        self.local_micros() - i128::from(tz.minutes()) * 60_000_000
    }

    pub(crate) fn utc_micros_or_local(&self) -> i128 {
        match self.tz {
            Some(tz) => self.utc_micros(tz),
            None => self.local_micros(),
        }
    }

    /// Lexical year: `-1` for the year before year 1.
    pub fn year(&self) -> i64 {
        lexical_year(self.year)
    }

    pub fn internal_year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn whole_seconds(&self) -> u8 {
        self.second
    }

    pub fn microsecond(&self) -> u32 {
        self.micros
    }

    /// Seconds including the fraction.
    pub fn seconds(&self) -> DecimalValue {
        DecimalValue::new(Decimal::new(i64::from(self.second) * 1_000_000 + i64::from(self.micros), 6))
    }

    pub fn timezone_duration(&self) -> Option<DayTimeDurationValue> {
        self.tz.map(|tz| tz.as_duration())
    }

    pub fn date(&self) -> DateValue {
        DateValue::new(self.year, self.month, self.day, self.tz)
    }

    pub fn time(&self) -> TimeValue {
        TimeValue::new(self.hour, self.minute, self.second, self.micros, self.tz)
    }

    /// Adjusted to UTC, or unchanged when the value has no timezone.
    #[must_use]
    pub fn normalize(&self) -> Self {
        match self.tz {
            Some(_) => self.adjust_timezone(TimezoneOffset::UTC),
            None => self.clone(),
        }
    }
}

impl CalendarValue for DateTimeValue {
    fn timezone(&self) -> Option<TimezoneOffset> {
        self.tz
    }

    fn to_date_time(&self) -> DateTimeValue {
        self.clone()
    }

    fn with_timezone(&self, tz: Option<TimezoneOffset>) -> Self {
        Self { tz, ..self.clone() }
    }

    fn adjust_timezone(&self, tz: TimezoneOffset) -> Self {
        let Some(old) = self.tz else {
            return self.with_timezone(Some(tz));
        };
        let mut minutes = i32::from(self.hour) * 60 + i32::from(self.minute) + tz.minutes() - old.minutes();
        let (mut y, mut m, mut d) = (self.year, self.month, self.day);
        // Crossing ±14:00 can move the date by two days.
        while minutes < 0 {
            minutes += 1440;
            (y, m, d) = yesterday(y, m, d);
        }
        while minutes >= 1440 {
            minutes -= 1440;
            (y, m, d) = tomorrow(y, m, d);
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Self {
            year: y,
            month: m,
            day: d,
            hour: (minutes / 60) as u8,
            minute: (minutes % 60) as u8,
            tz: Some(tz),
            ..self.clone()
        }
    }

    fn add_year_month(&self, d: &YearMonthDurationValue) -> Result<Self, Error> {
        let (year, month, day) = add_months(self.year, self.month, self.day, d.total_months())?;
        Ok(Self {
            year,
            month,
            day,
            ..self.clone()
        })
    }

    fn add_day_time(&self, d: &DayTimeDurationValue) -> Result<Self, Error> {
        Self::from_local_micros(self.local_micros() + i128::from(d.total_micros()), self.tz)
    }

    fn subtract(&self, other: &Self, implicit: Option<TimezoneOffset>) -> Result<DayTimeDurationValue, Error> {
        DayTimeDurationValue::from_micros(instant_difference(self, other, implicit)?)
    }
}

impl PartialEq for DateTimeValue {
    /// Timezoned values are equal when they denote the same instant; values
    /// without a timezone when their fields match. Mixed values are unequal.
    fn eq(&self, other: &Self) -> bool {
        self.tz.is_some() == other.tz.is_some() && self.utc_micros_or_local() == other.utc_micros_or_local()
    }
}

impl Eq for DateTimeValue {}

impl Hash for DateTimeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tz.is_some().hash(state);
        self.utc_micros_or_local().hash(state);
    }
}

impl PartialOrd for DateTimeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other, None).ok()
    }
}

impl fmt::Display for DateTimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_year(f, self.year)?;
        write!(
            f,
            "-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.month, self.day, self.hour, self.minute, self.second
        )?;
        write_fraction(f, self.micros)?;
        write_tz(f, self.tz)
    }
}

impl From<chrono::DateTime<chrono::FixedOffset>> for DateTimeValue {
    fn from(dt: chrono::DateTime<chrono::FixedOffset>) -> Self {
        use chrono::{Datelike, Timelike};
        let tz = TimezoneOffset::from_minutes(dt.offset().local_minus_utc() / 60).ok();
        #[allow(clippy::cast_possible_truncation)]
        Self {
            year: dt.year(),
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second().min(59) as u8,
            micros: (dt.nanosecond() / 1000).min(999_999),
            tz,
        }
    }
}
