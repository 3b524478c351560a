use super::{
    CalendarValue, DateTimeValue, TimezoneOffset, field, group, instant_difference, lexical_regex,
    match_lexical, parse_micros, parse_tz_group, write_fraction, write_tz,
};
use crate::engine::runtime::{ConversionResult, Error, ValidationFailure};
use crate::util::whitespace::trim_xml_whitespace;
use crate::xdm::duration::DayTimeDurationValue;
use crate::xdm::numeric::DecimalValue;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use fancy_regex::Regex;
use rust_decimal::Decimal;
use std::sync::OnceLock;

static TIME_RE: OnceLock<Result<Regex, fancy_regex::Error>> = OnceLock::new();

const TIME_PATTERN: &str = r"^([0-9]{2}):([0-9]{2}):([0-9]{2})(\.[0-9]+)?(Z|[+-][0-9]{2}:[0-9]{2})?$";

// Times are anchored to this date for comparison and arithmetic.
const REFERENCE_YEAR: i32 = 1972;
const REFERENCE_MONTH: u8 = 12;
const REFERENCE_DAY: u8 = 31;

/// `xs:time`.
#[derive(Debug, Clone)]
pub struct TimeValue {
    hour: u8,
    minute: u8,
    second: u8,
    micros: u32,
    tz: Option<TimezoneOffset>,
}

impl TimeValue {
    /// # Panics
    /// If the fields are not a valid time of day.
    pub fn new(hour: u8, minute: u8, second: u8, micros: u32, tz: Option<TimezoneOffset>) -> Self {
        assert!(hour < 24 && minute < 60 && second < 60 && micros < 1_000_000, "invalid time of day");
        Self {
            hour,
            minute,
            second,
            micros,
            tz,
        }
    }

    /// Parses `hh:mm:ss[.ffffff][zzzzzz]`; `24:00:00` becomes `00:00:00`.
    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        let s = trim_xml_whitespace(lexical);
        let re = lexical_regex(&TIME_RE, TIME_PATTERN)?;
        let caps = match_lexical(re, s, "xs:time")?;
        let (hour, minute, second) = (field(&caps, 1), field(&caps, 2), field(&caps, 3));
        let micros = parse_micros(group(&caps, 4));
        let tz = parse_tz_group(&caps, 5)?;
        if hour == 24 && minute == 0 && second == 0 && micros == 0 {
            return Ok(Self::new(0, 0, 0, 0, tz));
        }
        if hour > 23 || minute > 59 || second > 59 {
            return Err(ValidationFailure::invalid(format!("time fields out of range in \"{s}\"")));
        }
        Ok(Self::new(hour, minute, second, micros, tz))
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

    pub fn seconds(&self) -> DecimalValue {
        DecimalValue::new(Decimal::new(i64::from(self.second) * 1_000_000 + i64::from(self.micros), 6))
    }

    pub fn timezone_duration(&self) -> Option<DayTimeDurationValue> {
        self.tz.map(|tz| tz.as_duration())
    }
}

impl CalendarValue for TimeValue {
    fn timezone(&self) -> Option<TimezoneOffset> {
        self.tz
    }

    fn to_date_time(&self) -> DateTimeValue {
        DateTimeValue::new(
            REFERENCE_YEAR,
            REFERENCE_MONTH,
            REFERENCE_DAY,
            self.hour,
            self.minute,
            self.second,
            self.micros,
            self.tz,
        )
    }

    fn with_timezone(&self, tz: Option<TimezoneOffset>) -> Self {
        Self { tz, ..self.clone() }
    }

    fn adjust_timezone(&self, tz: TimezoneOffset) -> Self {
        self.to_date_time().adjust_timezone(tz).time()
    }

    /// Wraps around midnight.
    fn add_day_time(&self, d: &DayTimeDurationValue) -> Result<Self, Error> {
        Ok(self.to_date_time().add_day_time(d)?.time())
    }

    fn subtract(&self, other: &Self, implicit: Option<TimezoneOffset>) -> Result<DayTimeDurationValue, Error> {
        DayTimeDurationValue::from_micros(instant_difference(&self.to_date_time(), &other.to_date_time(), implicit)?)
    }
}

impl PartialEq for TimeValue {
    fn eq(&self, other: &Self) -> bool {
        self.to_date_time() == other.to_date_time()
    }
}

impl Eq for TimeValue {}

impl Hash for TimeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_date_time().hash(state);
    }
}

impl PartialOrd for TimeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other, None).ok()
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)?;
        write_fraction(f, self.micros)?;
        write_tz(f, self.tz)
    }
}
