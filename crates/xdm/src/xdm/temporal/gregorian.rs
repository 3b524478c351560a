//! Partial Gregorian types. None of them supports duration arithmetic; the
//! `CalendarValue` defaults reject it with a type error.

use super::{
    CalendarValue, DateTimeValue, TimezoneOffset, days_in_month, field, group, lexical_regex, lexical_year,
    match_lexical, parse_tz_group, parse_year, write_tz, write_year,
};
use crate::engine::runtime::{ConversionResult, ValidationFailure};
use crate::util::whitespace::trim_xml_whitespace;
use core::fmt;
use core::hash::{Hash, Hasher};
use fancy_regex::Regex;
use std::sync::OnceLock;

static G_YEAR_RE: OnceLock<Result<Regex, fancy_regex::Error>> = OnceLock::new();
static G_YEAR_MONTH_RE: OnceLock<Result<Regex, fancy_regex::Error>> = OnceLock::new();
static G_MONTH_RE: OnceLock<Result<Regex, fancy_regex::Error>> = OnceLock::new();
static G_MONTH_DAY_RE: OnceLock<Result<Regex, fancy_regex::Error>> = OnceLock::new();
static G_DAY_RE: OnceLock<Result<Regex, fancy_regex::Error>> = OnceLock::new();

const TZ: &str = r"(Z|[+-][0-9]{2}:[0-9]{2})?";

// Partial types without a year are anchored in this leap year.
const REFERENCE_YEAR: i32 = 1972;

fn pattern(body: &str) -> String {
    format!("^{body}{TZ}$")
}

fn out_of_range(s: &str, type_name: &str) -> ValidationFailure {
    ValidationFailure::invalid(format!("field out of range in {type_name} \"{s}\""))
}

/// `xs:gYear`.
#[derive(Debug, Clone)]
pub struct GYearValue {
    year: i32,
    tz: Option<TimezoneOffset>,
}

impl GYearValue {
    pub fn new(year: i32, tz: Option<TimezoneOffset>) -> Self {
        Self { year, tz }
    }

    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        let s = trim_xml_whitespace(lexical);
        let re = lexical_regex(&G_YEAR_RE, &pattern("(-?)([0-9]{4,})"))?;
        let caps = match_lexical(re, s, "xs:gYear")?;
        let year = parse_year(group(&caps, 1), group(&caps, 2).unwrap_or_default(), s)?;
        Ok(Self::new(year, parse_tz_group(&caps, 3)?))
    }

    pub fn year(&self) -> i64 {
        lexical_year(self.year)
    }
}

impl CalendarValue for GYearValue {
    fn timezone(&self) -> Option<TimezoneOffset> {
        self.tz
    }

    fn to_date_time(&self) -> DateTimeValue {
        DateTimeValue::new(self.year, 1, 1, 0, 0, 0, 0, self.tz)
    }

    fn with_timezone(&self, tz: Option<TimezoneOffset>) -> Self {
        Self { tz, ..self.clone() }
    }

    fn adjust_timezone(&self, tz: TimezoneOffset) -> Self {
        Self::from(&self.to_date_time().adjust_timezone(tz))
    }
}

impl From<&DateTimeValue> for GYearValue {
    fn from(dt: &DateTimeValue) -> Self {
        Self::new(dt.internal_year(), dt.timezone())
    }
}

impl fmt::Display for GYearValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_year(f, self.year)?;
        write_tz(f, self.tz)
    }
}

/// `xs:gYearMonth`.
#[derive(Debug, Clone)]
pub struct GYearMonthValue {
    year: i32,
    month: u8,
    tz: Option<TimezoneOffset>,
}

impl GYearMonthValue {
    /// # Panics
    /// If `month` is not in `1..=12`.
    pub fn new(year: i32, month: u8, tz: Option<TimezoneOffset>) -> Self {
        assert!((1..=12).contains(&month), "invalid month {month}");
        Self { year, month, tz }
    }

    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        let s = trim_xml_whitespace(lexical);
        let re = lexical_regex(&G_YEAR_MONTH_RE, &pattern("(-?)([0-9]{4,})-([0-9]{2})"))?;
        let caps = match_lexical(re, s, "xs:gYearMonth")?;
        let year = parse_year(group(&caps, 1), group(&caps, 2).unwrap_or_default(), s)?;
        let month = field(&caps, 3);
        if !(1..=12).contains(&month) {
            return Err(out_of_range(s, "xs:gYearMonth"));
        }
        Ok(Self::new(year, month, parse_tz_group(&caps, 4)?))
    }

    pub fn year(&self) -> i64 {
        lexical_year(self.year)
    }

    pub fn month(&self) -> u8 {
        self.month
    }
}

impl CalendarValue for GYearMonthValue {
    fn timezone(&self) -> Option<TimezoneOffset> {
        self.tz
    }

    fn to_date_time(&self) -> DateTimeValue {
        DateTimeValue::new(self.year, self.month, 1, 0, 0, 0, 0, self.tz)
    }

    fn with_timezone(&self, tz: Option<TimezoneOffset>) -> Self {
        Self { tz, ..self.clone() }
    }

    fn adjust_timezone(&self, tz: TimezoneOffset) -> Self {
        Self::from(&self.to_date_time().adjust_timezone(tz))
    }
}

impl From<&DateTimeValue> for GYearMonthValue {
    fn from(dt: &DateTimeValue) -> Self {
        Self::new(dt.internal_year(), dt.month(), dt.timezone())
    }
}

impl fmt::Display for GYearMonthValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_year(f, self.year)?;
        write!(f, "-{:02}", self.month)?;
        write_tz(f, self.tz)
    }
}

/// `xs:gMonth`.
#[derive(Debug, Clone)]
pub struct GMonthValue {
    month: u8,
    tz: Option<TimezoneOffset>,
}

impl GMonthValue {
    /// # Panics
    /// If `month` is not in `1..=12`.
    pub fn new(month: u8, tz: Option<TimezoneOffset>) -> Self {
        assert!((1..=12).contains(&month), "invalid month {month}");
        Self { month, tz }
    }

    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        let s = trim_xml_whitespace(lexical);
        let re = lexical_regex(&G_MONTH_RE, &pattern("--([0-9]{2})"))?;
        let caps = match_lexical(re, s, "xs:gMonth")?;
        let month = field(&caps, 1);
        if !(1..=12).contains(&month) {
            return Err(out_of_range(s, "xs:gMonth"));
        }
        Ok(Self::new(month, parse_tz_group(&caps, 2)?))
    }

    pub fn month(&self) -> u8 {
        self.month
    }
}

impl CalendarValue for GMonthValue {
    fn timezone(&self) -> Option<TimezoneOffset> {
        self.tz
    }

    fn to_date_time(&self) -> DateTimeValue {
        DateTimeValue::new(REFERENCE_YEAR, self.month, 1, 0, 0, 0, 0, self.tz)
    }

    fn with_timezone(&self, tz: Option<TimezoneOffset>) -> Self {
        Self { tz, ..self.clone() }
    }

    fn adjust_timezone(&self, tz: TimezoneOffset) -> Self {
        Self::from(&self.to_date_time().adjust_timezone(tz))
    }
}

impl From<&DateTimeValue> for GMonthValue {
    fn from(dt: &DateTimeValue) -> Self {
        Self::new(dt.month(), dt.timezone())
    }
}

impl fmt::Display for GMonthValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{:02}", self.month)?;
        write_tz(f, self.tz)
    }
}

/// `xs:gMonthDay`. February 29th is allowed.
#[derive(Debug, Clone)]
pub struct GMonthDayValue {
    month: u8,
    day: u8,
    tz: Option<TimezoneOffset>,
}

impl GMonthDayValue {
    /// # Panics
    /// If the day does not exist in the month of a leap year.
    pub fn new(month: u8, day: u8, tz: Option<TimezoneOffset>) -> Self {
        assert!(
            (1..=12).contains(&month) && day >= 1 && day <= days_in_month(REFERENCE_YEAR, month),
            "invalid month/day {month}/{day}"
        );
        Self { month, day, tz }
    }

    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        let s = trim_xml_whitespace(lexical);
        let re = lexical_regex(&G_MONTH_DAY_RE, &pattern("--([0-9]{2})-([0-9]{2})"))?;
        let caps = match_lexical(re, s, "xs:gMonthDay")?;
        let (month, day) = (field(&caps, 1), field(&caps, 2));
        if !(1..=12).contains(&month) || day < 1 || day > days_in_month(REFERENCE_YEAR, month) {
            return Err(out_of_range(s, "xs:gMonthDay"));
        }
        Ok(Self::new(month, day, parse_tz_group(&caps, 3)?))
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }
}

impl CalendarValue for GMonthDayValue {
    fn timezone(&self) -> Option<TimezoneOffset> {
        self.tz
    }

    fn to_date_time(&self) -> DateTimeValue {
        DateTimeValue::new(REFERENCE_YEAR, self.month, self.day, 0, 0, 0, 0, self.tz)
    }

    fn with_timezone(&self, tz: Option<TimezoneOffset>) -> Self {
        Self { tz, ..self.clone() }
    }

    fn adjust_timezone(&self, tz: TimezoneOffset) -> Self {
        Self::from(&self.to_date_time().adjust_timezone(tz))
    }
}

impl From<&DateTimeValue> for GMonthDayValue {
    fn from(dt: &DateTimeValue) -> Self {
        Self::new(dt.month(), dt.day(), dt.timezone())
    }
}

impl fmt::Display for GMonthDayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{:02}-{:02}", self.month, self.day)?;
        write_tz(f, self.tz)
    }
}

/// `xs:gDay`.
#[derive(Debug, Clone)]
pub struct GDayValue {
    day: u8,
    tz: Option<TimezoneOffset>,
}

impl GDayValue {
    /// # Panics
    /// If `day` is not in `1..=31`.
    pub fn new(day: u8, tz: Option<TimezoneOffset>) -> Self {
        assert!((1..=31).contains(&day), "invalid day {day}");
        Self { day, tz }
    }

    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        let s = trim_xml_whitespace(lexical);
        let re = lexical_regex(&G_DAY_RE, &pattern("---([0-9]{2})"))?;
        let caps = match_lexical(re, s, "xs:gDay")?;
        let day = field(&caps, 1);
        if !(1..=31).contains(&day) {
            return Err(out_of_range(s, "xs:gDay"));
        }
        Ok(Self::new(day, parse_tz_group(&caps, 2)?))
    }

    pub fn day(&self) -> u8 {
        self.day
    }
}

impl CalendarValue for GDayValue {
    fn timezone(&self) -> Option<TimezoneOffset> {
        self.tz
    }

    fn to_date_time(&self) -> DateTimeValue {
        DateTimeValue::new(REFERENCE_YEAR, 12, self.day, 0, 0, 0, 0, self.tz)
    }

    fn with_timezone(&self, tz: Option<TimezoneOffset>) -> Self {
        Self { tz, ..self.clone() }
    }

    fn adjust_timezone(&self, tz: TimezoneOffset) -> Self {
        Self::from(&self.to_date_time().adjust_timezone(tz))
    }
}

impl From<&DateTimeValue> for GDayValue {
    fn from(dt: &DateTimeValue) -> Self {
        Self::new(dt.day(), dt.timezone())
    }
}

impl fmt::Display for GDayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "---{:02}", self.day)?;
        write_tz(f, self.tz)
    }
}

// Equality and hashing go through the starting instant, as for full dates.
macro_rules! instant_equality {
    ($($ty:ty),*) => {$(
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.to_date_time() == other.to_date_time()
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.to_date_time().hash(state);
            }
        }
    )*};
}

instant_equality!(GYearValue, GYearMonthValue, GMonthValue, GMonthDayValue, GDayValue);
