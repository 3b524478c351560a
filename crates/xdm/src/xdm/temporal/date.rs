use super::{
    CalendarValue, DateTimeValue, TimezoneOffset, add_months, date_from_julian_day_number, field, group,
    instant_difference, is_leap_year, is_valid_date, julian_day_number, lexical_regex, lexical_year,
    match_lexical, parse_tz_group, parse_year, write_tz, write_year, year_overflow,
};
use crate::engine::runtime::{ConversionResult, Error, ValidationFailure};
use crate::util::whitespace::trim_xml_whitespace;
use crate::xdm::duration::{DayTimeDurationValue, YearMonthDurationValue};
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use fancy_regex::Regex;
use std::sync::OnceLock;

static DATE_RE: OnceLock<Result<Regex, fancy_regex::Error>> = OnceLock::new();

const DATE_PATTERN: &str = r"^(-?)([0-9]{4,})-([0-9]{2})-([0-9]{2})(Z|[+-][0-9]{2}:[0-9]{2})?$";

/// `xs:date`.
#[derive(Debug, Clone)]
pub struct DateValue {
    year: i32,
    month: u8,
    day: u8,
    tz: Option<TimezoneOffset>,
}

impl DateValue {
    /// # Panics
    /// If the fields do not describe an existing date.
    pub fn new(year: i32, month: u8, day: u8, tz: Option<TimezoneOffset>) -> Self {
        assert!(is_valid_date(year, month, day), "invalid date {year}-{month}-{day}");
        Self { year, month, day, tz }
    }

    /// Parses `[-]CCYY-MM-DD[zzzzzz]`, rejecting dates that match the
    /// pattern but do not exist (`2023-02-29`).
    pub fn parse(lexical: &str) -> ConversionResult<Self> {
        let s = trim_xml_whitespace(lexical);
        let re = lexical_regex(&DATE_RE, DATE_PATTERN)?;
        let caps = match_lexical(re, s, "xs:date")?;
        let year = parse_year(group(&caps, 1), group(&caps, 2).unwrap_or_default(), s)?;
        let (month, day) = (field(&caps, 3), field(&caps, 4));
        let tz = parse_tz_group(&caps, 5)?;
        if !is_valid_date(year, month, day) {
            return Err(ValidationFailure::invalid(format!("non-existent date \"{s}\"")));
        }
        Ok(Self::new(year, month, day, tz))
    }

    pub fn from_julian_day_number(jdn: i64, tz: Option<TimezoneOffset>) -> Result<Self, Error> {
        let (y, m, d) = date_from_julian_day_number(jdn);
        let year = i32::try_from(y).map_err(|_| year_overflow())?;
        Ok(Self::new(year, m, d, tz))
    }

    pub fn julian_day_number(&self) -> i64 {
        julian_day_number(self.year, self.month, self.day)
    }

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

    pub fn timezone_duration(&self) -> Option<DayTimeDurationValue> {
        self.tz.map(|tz| tz.as_duration())
    }

    pub fn is_leap_year(&self) -> bool {
        is_leap_year(self.year)
    }

    /// ISO day of the week, Monday = 1 through Sunday = 7.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn day_of_week(&self) -> u8 {
        (self.julian_day_number().rem_euclid(7) + 1) as u8
    }

    /// Ordinal day within the year, starting at 1.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn day_in_year(&self) -> u16 {
        (self.julian_day_number() - julian_day_number(self.year, 1, 1) + 1) as u16
    }

    /// ISO 8601 week number (weeks start on Monday; week 1 holds the first Thursday).
    pub fn week_number(&self) -> u8 {
        let ordinal = i32::from(self.day_in_year());
        let weekday = i32::from(self.day_of_week());
        let week = (ordinal - weekday + 10) / 7;
        if week < 1 {
            weeks_in_year(self.year - 1)
        } else if week > i32::from(weeks_in_year(self.year)) {
            1
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                week as u8
            }
        }
    }

    /// Adjusted so the timezone lies in `(-12:00, +12:00]`, the form used for
    /// comparing dates across timezones.
    #[must_use]
    pub fn canonical(&self) -> Self {
        match self.tz {
            Some(tz) if tz.minutes() > 720 => self.shift_tz_by(-1440),
            Some(tz) if tz.minutes() <= -720 => self.shift_tz_by(1440),
            _ => self.clone(),
        }
    }

    fn shift_tz_by(&self, delta: i32) -> Self {
        let Some(tz) = self.tz else { return self.clone() };
        match TimezoneOffset::from_minutes(tz.minutes() + delta) {
            Ok(target) => self.adjust_timezone(target),
            Err(_) => self.clone(),
        }
    }

    fn from_date_time(dt: &DateTimeValue) -> Self {
        dt.date()
    }
}

fn weeks_in_year(year: i32) -> u8 {
    let jan1 = DateValue::new(year, 1, 1, None).day_of_week();
    if jan1 == 4 || (jan1 == 3 && is_leap_year(year)) { 53 } else { 52 }
}

impl CalendarValue for DateValue {
    fn timezone(&self) -> Option<TimezoneOffset> {
        self.tz
    }

    fn to_date_time(&self) -> DateTimeValue {
        DateTimeValue::new(self.year, self.month, self.day, 0, 0, 0, 0, self.tz)
    }

    fn with_timezone(&self, tz: Option<TimezoneOffset>) -> Self {
        Self { tz, ..self.clone() }
    }

    fn adjust_timezone(&self, tz: TimezoneOffset) -> Self {
        Self::from_date_time(&self.to_date_time().adjust_timezone(tz))
    }

    fn add_year_month(&self, d: &YearMonthDurationValue) -> Result<Self, Error> {
        let (year, month, day) = add_months(self.year, self.month, self.day, d.total_months())?;
        Ok(Self::new(year, month, day, self.tz))
    }

    /// Whole days move the date; a negative partial day steps back one more.
    fn add_day_time(&self, d: &DayTimeDurationValue) -> Result<Self, Error> {
        Ok(Self::from_date_time(&self.to_date_time().add_day_time(d)?))
    }

    fn subtract(&self, other: &Self, implicit: Option<TimezoneOffset>) -> Result<DayTimeDurationValue, Error> {
        DayTimeDurationValue::from_micros(instant_difference(&self.to_date_time(), &other.to_date_time(), implicit)?)
    }
}

impl PartialEq for DateValue {
    fn eq(&self, other: &Self) -> bool {
        self.to_date_time() == other.to_date_time()
    }
}

impl Eq for DateValue {}

impl Hash for DateValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_date_time().hash(state);
    }
}

impl PartialOrd for DateValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other, None).ok()
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_year(f, self.year)?;
        write!(f, "-{:02}-{:02}", self.month, self.day)?;
        write_tz(f, self.tz)
    }
}
