use crate::consts::ERR_NS;
use crate::sequence::Value;
use crate::xdm::ExpandedName;
use crate::xdm::XdmItem;
use crate::xdm::temporal::{DateTimeValue, TimezoneOffset};
use core::fmt;
use std::sync::Arc;

/// Default nesting depth after which captured closures are materialized.
pub const DEFAULT_MAX_CLOSURE_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Arithmetic
    FOAR0001, // divide by zero
    FOAR0002, // numeric overflow / underflow
    // Casting
    FOCA0001, // value too large for decimal
    FOCA0002, // invalid lexical value / NaN or INF to integer
    FOCA0003, // value too large for integer
    FOCA0005, // NaN supplied as float/double value
    FOCA0006, // string to decimal has too many digits
    // Date/time
    FODT0001, // overflow/underflow in date/time operation
    FODT0002, // overflow/underflow in duration operation
    // General function / argument errors
    FORG0001, // invalid value for cast/constructor
    FORG0006, // invalid argument type (effective boolean value)
    FORG0008, // both arguments to fn:dateTime have a timezone and they differ
    XPTY0004, // type error
    XPDY0002, // dynamic context component absent (implicit timezone, context item)
    // Evaluation protocol: variable forced while it is already being evaluated
    XTDE0640,
    // Fallback / unknown (kept last)
    Unknown,
}

impl ErrorCode {
    pub fn local_name(&self) -> &'static str {
        match self {
            ErrorCode::FOAR0001 => "FOAR0001",
            ErrorCode::FOAR0002 => "FOAR0002",
            ErrorCode::FOCA0001 => "FOCA0001",
            ErrorCode::FOCA0002 => "FOCA0002",
            ErrorCode::FOCA0003 => "FOCA0003",
            ErrorCode::FOCA0005 => "FOCA0005",
            ErrorCode::FOCA0006 => "FOCA0006",
            ErrorCode::FODT0001 => "FODT0001",
            ErrorCode::FODT0002 => "FODT0002",
            ErrorCode::FORG0001 => "FORG0001",
            ErrorCode::FORG0006 => "FORG0006",
            ErrorCode::FORG0008 => "FORG0008",
            ErrorCode::XPTY0004 => "XPTY0004",
            ErrorCode::XPDY0002 => "XPDY0002",
            ErrorCode::XTDE0640 => "XTDE0640",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }

    /// Returns the QName for this error code in the xqt-errors namespace.
    pub fn qname(&self) -> ExpandedName {
        ExpandedName::new(Some(ERR_NS.to_string()), self.local_name())
    }

    /// `err:LOCAL` form, stable across releases.
    pub fn as_str(&self) -> String {
        format!("err:{}", self.local_name())
    }

    pub fn from_code(s: &str) -> Self {
        use ErrorCode::*;
        let local = s.strip_prefix("err:").unwrap_or(s);
        match local {
            "FOAR0001" => FOAR0001,
            "FOAR0002" => FOAR0002,
            "FOCA0001" => FOCA0001,
            "FOCA0002" => FOCA0002,
            "FOCA0003" => FOCA0003,
            "FOCA0005" => FOCA0005,
            "FOCA0006" => FOCA0006,
            "FODT0001" => FODT0001,
            "FODT0002" => FODT0002,
            "FORG0001" => FORG0001,
            "FORG0006" => FORG0006,
            "FORG0008" => FORG0008,
            "XPTY0004" => XPTY0004,
            "XPDY0002" => XPDY0002,
            "XTDE0640" => XTDE0640,
            _ => Unknown,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "err:{}", self.local_name())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>, // optional chained cause
}

impl Error {
    pub fn from_code(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            source: None,
        }
    }

    /// Compose an error with a source cause.
    #[must_use]
    pub fn with_source(
        mut self,
        source: impl Into<Option<Arc<dyn std::error::Error + Send + Sync>>>,
    ) -> Self {
        self.source = source.into();
        self
    }

    pub fn code_enum(&self) -> ErrorCode {
        self.code
    }

    pub fn code_qname(&self) -> ExpandedName {
        self.code.qname()
    }

    /// Human-readable code string (`err:LOCAL`).
    pub fn format_code(&self) -> String {
        self.code.as_str()
    }

    pub(crate) fn type_error(msg: impl Into<String>) -> Self {
        Self::from_code(ErrorCode::XPTY0004, msg)
    }

    pub(crate) fn circularity() -> Self {
        Self::from_code(
            ErrorCode::XTDE0640,
            "Attempt to access a variable while it is being evaluated",
        )
    }
}

impl From<fancy_regex::Error> for Error {
    fn from(e: fancy_regex::Error) -> Self {
        Error::from_code(ErrorCode::Unknown, "regex engine failure")
            .with_source(Some(Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>))
    }
}

/// A non-exceptional conversion failure. Returned, never thrown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ValidationFailure {
    pub code: ErrorCode,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
        }
    }

    /// Lexical or range failure (`FORG0001`).
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::FORG0001, msg)
    }

    /// Incompatible source and target types (`XPTY0004`).
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::XPTY0004, msg)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ValidationFailure> for Error {
    fn from(v: ValidationFailure) -> Self {
        Error::from_code(v.code, v.message)
    }
}

impl From<fancy_regex::Error> for ValidationFailure {
    fn from(e: fancy_regex::Error) -> Self {
        ValidationFailure::new(ErrorCode::Unknown, format!("regex engine failure: {e}"))
    }
}

/// Result of every cross-type conversion: a value or a typed validation failure.
pub type ConversionResult<T = crate::xdm::XdmAtomicValue> = Result<T, ValidationFailure>;

/// Evaluation context handed to expressions and captured by closures.
///
/// Slots hold the local variable frame by index. `Value` is cheap to clone
/// (closures and extents are reference counted), so cloning a context only
/// copies handles.
#[derive(Debug, Clone)]
pub struct DynamicContext<N> {
    pub context_item: Option<XdmItem<N>>,
    pub slots: Vec<Option<Value<N>>>,
    pub implicit_timezone: Option<TimezoneOffset>,
    pub use_system_timezone: bool,
    pub now: Option<DateTimeValue>,
    pub max_closure_depth: usize,
}

impl<N> Default for DynamicContext<N> {
    fn default() -> Self {
        Self {
            context_item: None,
            slots: Vec::new(),
            implicit_timezone: None,
            use_system_timezone: false,
            now: None,
            max_closure_depth: DEFAULT_MAX_CLOSURE_DEPTH,
        }
    }
}

impl<N> DynamicContext<N> {
    /// The implicit timezone, falling back to the host's local offset when
    /// `use_system_timezone` is set.
    pub fn implicit_timezone(&self) -> Option<TimezoneOffset> {
        if self.implicit_timezone.is_some() {
            return self.implicit_timezone;
        }
        if self.use_system_timezone {
            use chrono::Offset;
            let secs = chrono::Local::now().offset().fix().local_minus_utc();
            return TimezoneOffset::from_minutes(secs / 60).ok();
        }
        None
    }

    /// Reads a local variable slot.
    pub fn slot(&self, index: usize) -> Option<&Value<N>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn set_slot(&mut self, index: usize, value: Value<N>) {
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(value);
    }

    /// The current dateTime: the configured instant or the wall clock.
    pub fn current_date_time(&self) -> DateTimeValue {
        match &self.now {
            Some(now) => now.clone(),
            None => DateTimeValue::now(),
        }
    }
}

pub struct DynamicContextBuilder<N> {
    ctx: DynamicContext<N>,
}

impl<N> Default for DynamicContextBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> DynamicContextBuilder<N> {
    pub fn new() -> Self {
        Self {
            ctx: DynamicContext::default(),
        }
    }

    #[must_use]
    pub fn with_context_item(mut self, item: impl Into<XdmItem<N>>) -> Self {
        self.ctx.context_item = Some(item.into());
        self
    }

    #[must_use]
    pub fn with_slot(mut self, index: usize, value: Value<N>) -> Self {
        self.ctx.set_slot(index, value);
        self
    }

    /// Implicit timezone in minutes east of UTC. Offsets outside ±14:00 are
    /// rejected and leave the context without an implicit timezone.
    #[must_use]
    pub fn with_implicit_timezone(mut self, offset_minutes: i32) -> Self {
        match TimezoneOffset::from_minutes(offset_minutes) {
            Ok(tz) => self.ctx.implicit_timezone = Some(tz),
            Err(e) => {
                tracing::warn!(offset_minutes, error = %e, "ignoring out-of-range implicit timezone");
            }
        }
        self
    }

    #[must_use]
    pub fn with_system_timezone(mut self) -> Self {
        self.ctx.use_system_timezone = true;
        self
    }

    // Fixed 'now' for deterministic current-dateTime
    #[must_use]
    pub fn with_now(mut self, now: DateTimeValue) -> Self {
        self.ctx.now = Some(now);
        self
    }

    #[must_use]
    pub fn with_max_closure_depth(mut self, depth: usize) -> Self {
        self.ctx.max_closure_depth = depth.max(1);
        self
    }

    pub fn build(self) -> DynamicContext<N> {
        self.ctx
    }
}
