pub mod binary;
pub mod duration;
pub mod numeric;
pub mod qname;
pub mod temporal;

use crate::consts::XS_NS;
use crate::engine::runtime::{Error, ErrorCode};
use crate::util::whitespace::trim_xml_whitespace;
use binary::{Base64BinaryValue, HexBinaryValue};
use core::fmt;
use core::hash::{Hash, Hasher};
use duration::{DayTimeDurationValue, DurationValue, YearMonthDurationValue};
use numeric::{DecimalValue, NumericValue, format_double, format_float};
use qname::QNameValue;
use std::sync::{Arc, OnceLock};
use temporal::{
    DateTimeValue, DateValue, GDayValue, GMonthDayValue, GMonthValue, GYearMonthValue, GYearValue, TimeValue,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedName {
    pub ns_uri: Option<String>,
    pub local: String,
}

impl ExpandedName {
    pub fn new(ns_uri: Option<String>, local: impl Into<String>) -> Self {
        Self {
            ns_uri,
            local: local.into(),
        }
    }

    /// A name in the XML Schema namespace.
    pub fn xs(local: impl Into<String>) -> Self {
        Self::new(Some(XS_NS.to_string()), local)
    }
}

/// Built-in atomic types, including the abstract `xs:anyAtomicType` and the
/// `numeric` union used as a conversion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomicType {
    AnyAtomic,
    String,
    UntypedAtomic,
    AnyUri,
    Boolean,
    Numeric,
    Integer,
    Decimal,
    Float,
    Double,
    Date,
    Time,
    DateTime,
    GYear,
    GYearMonth,
    GMonth,
    GMonthDay,
    GDay,
    Duration,
    YearMonthDuration,
    DayTimeDuration,
    HexBinary,
    Base64Binary,
    QName,
}

impl AtomicType {
    pub fn local_name(&self) -> &'static str {
        match self {
            AtomicType::AnyAtomic => "anyAtomicType",
            AtomicType::String => "string",
            AtomicType::UntypedAtomic => "untypedAtomic",
            AtomicType::AnyUri => "anyURI",
            AtomicType::Boolean => "boolean",
            AtomicType::Numeric => "numeric",
            AtomicType::Integer => "integer",
            AtomicType::Decimal => "decimal",
            AtomicType::Float => "float",
            AtomicType::Double => "double",
            AtomicType::Date => "date",
            AtomicType::Time => "time",
            AtomicType::DateTime => "dateTime",
            AtomicType::GYear => "gYear",
            AtomicType::GYearMonth => "gYearMonth",
            AtomicType::GMonth => "gMonth",
            AtomicType::GMonthDay => "gMonthDay",
            AtomicType::GDay => "gDay",
            AtomicType::Duration => "duration",
            AtomicType::YearMonthDuration => "yearMonthDuration",
            AtomicType::DayTimeDuration => "dayTimeDuration",
            AtomicType::HexBinary => "hexBinary",
            AtomicType::Base64Binary => "base64Binary",
            AtomicType::QName => "QName",
        }
    }

    pub fn from_local_name(local: &str) -> Option<Self> {
        use AtomicType::*;
        Some(match local {
            "anyAtomicType" => AnyAtomic,
            "string" => String,
            "untypedAtomic" => UntypedAtomic,
            "anyURI" => AnyUri,
            "boolean" => Boolean,
            "numeric" => Numeric,
            "integer" => Integer,
            "decimal" => Decimal,
            "float" => Float,
            "double" => Double,
            "date" => Date,
            "time" => Time,
            "dateTime" => DateTime,
            "gYear" => GYear,
            "gYearMonth" => GYearMonth,
            "gMonth" => GMonth,
            "gMonthDay" => GMonthDay,
            "gDay" => GDay,
            "duration" => Duration,
            "yearMonthDuration" => YearMonthDuration,
            "dayTimeDuration" => DayTimeDuration,
            "hexBinary" => HexBinary,
            "base64Binary" => Base64Binary,
            "QName" => QName,
            _ => return None,
        })
    }

    pub fn name(&self) -> ExpandedName {
        ExpandedName::xs(self.local_name())
    }

    /// Immediate supertype in the derivation hierarchy. `numeric` is a union
    /// and sits outside it.
    pub fn supertype(&self) -> Option<AtomicType> {
        match self {
            AtomicType::AnyAtomic => None,
            AtomicType::Integer => Some(AtomicType::Decimal),
            AtomicType::YearMonthDuration | AtomicType::DayTimeDuration => Some(AtomicType::Duration),
            _ => Some(AtomicType::AnyAtomic),
        }
    }

    pub fn is_subtype_of(&self, other: AtomicType) -> bool {
        if other == AtomicType::Numeric {
            return self.is_numeric();
        }
        let mut t = Some(*self);
        while let Some(cur) = t {
            if cur == other {
                return true;
            }
            t = cur.supertype();
        }
        false
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AtomicType::Numeric | AtomicType::Integer | AtomicType::Decimal | AtomicType::Float | AtomicType::Double
        )
    }

    /// Nearest common supertype.
    pub fn common_supertype(self, other: AtomicType) -> AtomicType {
        let mut t = Some(self);
        while let Some(cur) = t {
            if other.is_subtype_of(cur) {
                return cur;
            }
            t = cur.supertype();
        }
        AtomicType::AnyAtomic
    }
}

impl fmt::Display for AtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xs:{}", self.local_name())
    }
}

/// Static item type of a sequence member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    AnyItem,
    Node,
    Atomic(AtomicType),
}

impl ItemType {
    pub fn common_supertype(self, other: ItemType) -> ItemType {
        match (self, other) {
            (a, b) if a == b => a,
            (ItemType::Atomic(a), ItemType::Atomic(b)) => ItemType::Atomic(a.common_supertype(b)),
            _ => ItemType::AnyItem,
        }
    }
}

/// `xs:untypedAtomic`. The double interpretation is computed on first use.
#[derive(Debug, Clone)]
pub struct UntypedAtomicValue {
    text: Arc<str>,
    as_double: OnceLock<f64>,
}

impl UntypedAtomicValue {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            as_double: OnceLock::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Numeric interpretation used in arithmetic and comparisons; `NaN` when
    /// the text is not a valid double.
    pub fn as_double(&self) -> f64 {
        *self
            .as_double
            .get_or_init(|| numeric::parse_double(trim_xml_whitespace(&self.text)).unwrap_or(f64::NAN))
    }
}

impl PartialEq for UntypedAtomicValue {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for UntypedAtomicValue {}

impl Hash for UntypedAtomicValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for UntypedAtomicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// An atomic value tagged with its primitive type.
#[derive(Debug, Clone)]
pub enum XdmAtomicValue {
    Boolean(bool),
    String(String),
    UntypedAtomic(UntypedAtomicValue),
    AnyUri(String),
    Integer(i128),
    Decimal(DecimalValue),
    Float(f32),
    Double(f64),
    Date(DateValue),
    Time(TimeValue),
    DateTime(DateTimeValue),
    GYear(GYearValue),
    GYearMonth(GYearMonthValue),
    GMonth(GMonthValue),
    GMonthDay(GMonthDayValue),
    GDay(GDayValue),
    Duration(DurationValue),
    YearMonthDuration(YearMonthDurationValue),
    DayTimeDuration(DayTimeDurationValue),
    HexBinary(HexBinaryValue),
    Base64Binary(Base64BinaryValue),
    QName(QNameValue),
}

/// Shared boolean constants.
pub const TRUE: XdmAtomicValue = XdmAtomicValue::Boolean(true);
pub const FALSE: XdmAtomicValue = XdmAtomicValue::Boolean(false);

impl XdmAtomicValue {
    pub fn untyped(text: impl Into<Arc<str>>) -> Self {
        XdmAtomicValue::UntypedAtomic(UntypedAtomicValue::new(text))
    }

    pub fn type_of(&self) -> AtomicType {
        match self {
            XdmAtomicValue::Boolean(_) => AtomicType::Boolean,
            XdmAtomicValue::String(_) => AtomicType::String,
            XdmAtomicValue::UntypedAtomic(_) => AtomicType::UntypedAtomic,
            XdmAtomicValue::AnyUri(_) => AtomicType::AnyUri,
            XdmAtomicValue::Integer(_) => AtomicType::Integer,
            XdmAtomicValue::Decimal(_) => AtomicType::Decimal,
            XdmAtomicValue::Float(_) => AtomicType::Float,
            XdmAtomicValue::Double(_) => AtomicType::Double,
            XdmAtomicValue::Date(_) => AtomicType::Date,
            XdmAtomicValue::Time(_) => AtomicType::Time,
            XdmAtomicValue::DateTime(_) => AtomicType::DateTime,
            XdmAtomicValue::GYear(_) => AtomicType::GYear,
            XdmAtomicValue::GYearMonth(_) => AtomicType::GYearMonth,
            XdmAtomicValue::GMonth(_) => AtomicType::GMonth,
            XdmAtomicValue::GMonthDay(_) => AtomicType::GMonthDay,
            XdmAtomicValue::GDay(_) => AtomicType::GDay,
            XdmAtomicValue::Duration(_) => AtomicType::Duration,
            XdmAtomicValue::YearMonthDuration(_) => AtomicType::YearMonthDuration,
            XdmAtomicValue::DayTimeDuration(_) => AtomicType::DayTimeDuration,
            XdmAtomicValue::HexBinary(_) => AtomicType::HexBinary,
            XdmAtomicValue::Base64Binary(_) => AtomicType::Base64Binary,
            XdmAtomicValue::QName(_) => AtomicType::QName,
        }
    }

    pub fn as_numeric(&self) -> Option<NumericValue> {
        match self {
            XdmAtomicValue::Integer(i) => Some(NumericValue::Integer(*i)),
            XdmAtomicValue::Decimal(d) => Some(NumericValue::Decimal(*d)),
            XdmAtomicValue::Float(f) => Some(NumericValue::Float(*f)),
            XdmAtomicValue::Double(d) => Some(NumericValue::Double(*d)),
            _ => None,
        }
    }

    /// Canonical lexical form.
    pub fn string_value(&self) -> String {
        self.to_string()
    }

    /// Length in Unicode code points of the string value.
    pub fn codepoint_length(&self) -> usize {
        match self {
            XdmAtomicValue::String(s) | XdmAtomicValue::AnyUri(s) => s.chars().count(),
            XdmAtomicValue::UntypedAtomic(u) => u.as_str().chars().count(),
            other => other.string_value().chars().count(),
        }
    }

    /// Effective boolean value of a single atomic value.
    pub fn effective_boolean_value(&self) -> Result<bool, Error> {
        match self {
            XdmAtomicValue::Boolean(b) => Ok(*b),
            XdmAtomicValue::String(s) | XdmAtomicValue::AnyUri(s) => Ok(!s.is_empty()),
            XdmAtomicValue::UntypedAtomic(u) => Ok(!u.as_str().is_empty()),
            other => match other.as_numeric() {
                Some(n) => Ok(n.effective_boolean_value()),
                None => Err(Error::from_code(
                    ErrorCode::FORG0006,
                    format!("effective boolean value is not defined for {}", other.type_of()),
                )),
            },
        }
    }
}

impl From<NumericValue> for XdmAtomicValue {
    fn from(n: NumericValue) -> Self {
        match n {
            NumericValue::Integer(i) => XdmAtomicValue::Integer(i),
            NumericValue::Decimal(d) => XdmAtomicValue::Decimal(d),
            NumericValue::Float(f) => XdmAtomicValue::Float(f),
            NumericValue::Double(d) => XdmAtomicValue::Double(d),
        }
    }
}

impl From<bool> for XdmAtomicValue {
    fn from(b: bool) -> Self {
        XdmAtomicValue::Boolean(b)
    }
}

impl From<i64> for XdmAtomicValue {
    fn from(i: i64) -> Self {
        XdmAtomicValue::Integer(i128::from(i))
    }
}

impl From<i128> for XdmAtomicValue {
    fn from(i: i128) -> Self {
        XdmAtomicValue::Integer(i)
    }
}

impl From<f64> for XdmAtomicValue {
    fn from(d: f64) -> Self {
        XdmAtomicValue::Double(d)
    }
}

impl From<&str> for XdmAtomicValue {
    fn from(s: &str) -> Self {
        XdmAtomicValue::String(s.to_string())
    }
}

impl From<String> for XdmAtomicValue {
    fn from(s: String) -> Self {
        XdmAtomicValue::String(s)
    }
}

/// Identity within a type: numerics compare numerically across kinds,
/// calendars by instant (or by fields when neither has a timezone). Values of
/// unrelated types are never equal.
impl PartialEq for XdmAtomicValue {
    fn eq(&self, other: &Self) -> bool {
        use XdmAtomicValue as A;
        if let (Some(a), Some(b)) = (self.as_numeric(), other.as_numeric()) {
            return a == b;
        }
        match (self, other) {
            (A::Boolean(a), A::Boolean(b)) => a == b,
            (A::String(a), A::String(b)) | (A::AnyUri(a), A::AnyUri(b)) => a == b,
            (A::UntypedAtomic(a), A::UntypedAtomic(b)) => a == b,
            (A::Date(a), A::Date(b)) => a == b,
            (A::Time(a), A::Time(b)) => a == b,
            (A::DateTime(a), A::DateTime(b)) => a == b,
            (A::GYear(a), A::GYear(b)) => a == b,
            (A::GYearMonth(a), A::GYearMonth(b)) => a == b,
            (A::GMonth(a), A::GMonth(b)) => a == b,
            (A::GMonthDay(a), A::GMonthDay(b)) => a == b,
            (A::GDay(a), A::GDay(b)) => a == b,
            (A::Duration(a), A::Duration(b)) => a == b,
            (A::YearMonthDuration(a), A::YearMonthDuration(b)) => a == b,
            (A::DayTimeDuration(a), A::DayTimeDuration(b)) => a == b,
            (A::HexBinary(a), A::HexBinary(b)) => a == b,
            (A::Base64Binary(a), A::Base64Binary(b)) => a == b,
            (A::QName(a), A::QName(b)) => a == b,
            _ => false,
        }
    }
}

impl Hash for XdmAtomicValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        use XdmAtomicValue as A;
        if let Some(n) = self.as_numeric() {
            0u8.hash(state);
            n.hash(state);
            return;
        }
        core::mem::discriminant(self).hash(state);
        match self {
            A::Boolean(b) => b.hash(state),
            A::String(s) | A::AnyUri(s) => s.hash(state),
            A::UntypedAtomic(u) => u.hash(state),
            A::Date(v) => v.hash(state),
            A::Time(v) => v.hash(state),
            A::DateTime(v) => v.hash(state),
            A::GYear(v) => v.hash(state),
            A::GYearMonth(v) => v.hash(state),
            A::GMonth(v) => v.hash(state),
            A::GMonthDay(v) => v.hash(state),
            A::GDay(v) => v.hash(state),
            A::Duration(v) => v.hash(state),
            A::YearMonthDuration(v) => v.hash(state),
            A::DayTimeDuration(v) => v.hash(state),
            A::HexBinary(v) => v.hash(state),
            A::Base64Binary(v) => v.hash(state),
            A::QName(v) => v.hash(state),
            A::Integer(_) | A::Decimal(_) | A::Float(_) | A::Double(_) => {}
        }
    }
}

impl fmt::Display for XdmAtomicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XdmAtomicValue::Boolean(b) => write!(f, "{b}"),
            XdmAtomicValue::String(s) | XdmAtomicValue::AnyUri(s) => f.write_str(s),
            XdmAtomicValue::UntypedAtomic(u) => write!(f, "{u}"),
            XdmAtomicValue::Integer(i) => write!(f, "{i}"),
            XdmAtomicValue::Decimal(d) => write!(f, "{d}"),
            XdmAtomicValue::Float(x) => f.write_str(&format_float(*x)),
            XdmAtomicValue::Double(x) => f.write_str(&format_double(*x)),
            XdmAtomicValue::Date(v) => write!(f, "{v}"),
            XdmAtomicValue::Time(v) => write!(f, "{v}"),
            XdmAtomicValue::DateTime(v) => write!(f, "{v}"),
            XdmAtomicValue::GYear(v) => write!(f, "{v}"),
            XdmAtomicValue::GYearMonth(v) => write!(f, "{v}"),
            XdmAtomicValue::GMonth(v) => write!(f, "{v}"),
            XdmAtomicValue::GMonthDay(v) => write!(f, "{v}"),
            XdmAtomicValue::GDay(v) => write!(f, "{v}"),
            XdmAtomicValue::Duration(v) => write!(f, "{v}"),
            XdmAtomicValue::YearMonthDuration(v) => write!(f, "{v}"),
            XdmAtomicValue::DayTimeDuration(v) => write!(f, "{v}"),
            XdmAtomicValue::HexBinary(v) => write!(f, "{v}"),
            XdmAtomicValue::Base64Binary(v) => write!(f, "{v}"),
            XdmAtomicValue::QName(v) => write!(f, "{v}"),
        }
    }
}

/// A sequence member: a node reference or an atomic value.
#[derive(Debug, Clone, PartialEq)]
pub enum XdmItem<N> {
    Node(N),
    Atomic(XdmAtomicValue),
}

impl<N> XdmItem<N> {
    pub fn item_type(&self) -> ItemType {
        match self {
            XdmItem::Node(_) => ItemType::Node,
            XdmItem::Atomic(a) => ItemType::Atomic(a.type_of()),
        }
    }

    pub fn as_atomic(&self) -> Option<&XdmAtomicValue> {
        match self {
            XdmItem::Atomic(a) => Some(a),
            XdmItem::Node(_) => None,
        }
    }
}

impl<N> From<XdmAtomicValue> for XdmItem<N> {
    fn from(a: XdmAtomicValue) -> Self {
        XdmItem::Atomic(a)
    }
}

impl<N> fmt::Display for XdmItem<N>
where
    N: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XdmItem::Node(n) => write!(f, "{n:?}"),
            XdmItem::Atomic(a) => write!(f, "{a}"),
        }
    }
}
