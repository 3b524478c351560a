use platynui_xdm::engine::casting::{cast_atomic, convert_from_string};
use platynui_xdm::xdm::XdmAtomicValue as A;
use platynui_xdm::xdm::numeric::DecimalValue;
use platynui_xdm::{AtomicType as T, ErrorCode};
use rstest::rstest;

fn cast(v: &A, target: T) -> A {
    v.convert(target, false).unwrap_or_else(|e| panic!("{v} as {target}: {e}"))
}

fn cast_err(v: &A, target: T) -> ErrorCode {
    v.convert(target, false).unwrap_err().code()
}

#[rstest]
#[case(T::Integer, " 42 ", "42")]
#[case(T::Decimal, "10.500", "10.5")]
#[case(T::Double, "1e6", "1.0E6")]
#[case(T::Float, "-INF", "-INF")]
#[case(T::Boolean, "1", "true")]
#[case(T::Date, "2024-02-29Z", "2024-02-29Z")]
#[case(T::Time, "13:20:00.000", "13:20:00")]
#[case(T::DateTime, "2024-01-01T00:00:00+00:00", "2024-01-01T00:00:00Z")]
#[case(T::GYearMonth, "2024-07", "2024-07")]
#[case(T::Duration, "P13M", "P1Y1M")]
#[case(T::DayTimeDuration, "PT3600S", "PT1H")]
#[case(T::HexBinary, "0aff", "0AFF")]
#[case(T::Base64Binary, "QUJD", "QUJD")]
#[case(T::AnyUri, "  http://example.com/a   b ", "http://example.com/a b")]
fn string_to_typed_value(#[case] target: T, #[case] lexical: &str, #[case] canonical: &str) {
    let v = cast(&A::from(lexical), target);
    assert_eq!(v.type_of(), target);
    assert_eq!(v.to_string(), canonical);
}

#[rstest]
#[case(T::Integer, "4.0")]
#[case(T::Boolean, "TRUE")]
#[case(T::Date, "2023-02-29")]
#[case(T::Double, "one")]
#[case(T::HexBinary, "abc")]
#[case(T::Base64Binary, "QQ===")]
#[case(T::YearMonthDuration, "P1D")]
fn bad_lexical_forms_fail_with_forg0001(#[case] target: T, #[case] lexical: &str) {
    assert_eq!(cast_err(&A::from(lexical), target), ErrorCode::FORG0001);
}

#[rstest]
fn untyped_atomic_casts_like_string() {
    let v = cast(&A::untyped(" 7 "), T::Integer);
    assert_eq!(v, A::Integer(7));
}

#[rstest]
fn string_to_numeric_union_gives_double() {
    assert_eq!(cast(&A::from("3"), T::Numeric), A::Double(3.0));
    assert_eq!(cast(&A::from("3"), T::Numeric).type_of(), T::Double);
}

#[rstest]
fn string_to_qname_needs_a_resolver() {
    assert_eq!(cast_err(&A::from("xs:string"), T::QName), ErrorCode::XPTY0004);
}

#[rstest]
#[case(A::Double(3.99), T::Integer, A::Integer(3))]
#[case(A::Double(-3.99), T::Integer, A::Integer(-3))]
#[case(A::Integer(5), T::Double, A::Double(5.0))]
#[case(A::Integer(0), T::Boolean, A::Boolean(false))]
#[case(A::Double(f64::NAN), T::Boolean, A::Boolean(false))]
#[case(A::Boolean(true), T::Decimal, A::Decimal(DecimalValue::from(1)))]
#[case(A::Boolean(true), T::Numeric, A::Double(1.0))]
fn numeric_and_boolean_conversions(#[case] v: A, #[case] target: T, #[case] expected: A) {
    let got = cast(&v, target);
    assert_eq!(got.type_of(), expected.type_of());
    assert_eq!(got, expected);
}

#[rstest]
fn float_to_decimal_keeps_the_float_value() {
    let got = cast(&A::Double(0.1), T::Decimal);
    assert_eq!(got.to_string(), "0.1");
    let got = cast(&A::Float(2.5), T::Decimal);
    assert_eq!(got.to_string(), "2.5");
}

#[rstest]
#[case(A::Double(f64::NAN), T::Integer, ErrorCode::FOCA0002)]
#[case(A::Double(f64::INFINITY), T::Decimal, ErrorCode::FOCA0002)]
#[case(A::Double(1e40), T::Integer, ErrorCode::FOCA0003)]
#[case(A::Double(1e40), T::Decimal, ErrorCode::FOCA0001)]
fn numeric_domain_failures(#[case] v: A, #[case] target: T, #[case] code: ErrorCode) {
    assert_eq!(cast_err(&v, target), code);
}

#[rstest]
#[case("10000000000000000000", "10000000000000000000")]
#[case("-9223372036854775809", "-9223372036854775809")]
#[case("+170141183460469231731687303715884105727", "170141183460469231731687303715884105727")]
fn integer_lexicals_beyond_sixty_four_bits(#[case] lexical: &str, #[case] expected: &str) {
    let v = convert_from_string(lexical, T::Integer, false).unwrap();
    assert!(matches!(v, A::Integer(_)));
    assert_eq!(v.to_string(), expected);
    assert_eq!(cast(&v, T::String), A::from(expected));
}

#[rstest]
#[case("170141183460469231731687303715884105728", T::Integer, ErrorCode::FOCA0003)]
#[case("-170141183460469231731687303715884105729", T::Integer, ErrorCode::FOCA0003)]
fn integer_lexicals_beyond_the_integer_range(#[case] lexical: &str, #[case] target: T, #[case] code: ErrorCode) {
    assert_eq!(convert_from_string(lexical, target, false).unwrap_err().code(), code);
}

#[rstest]
fn large_integers_cross_cast() {
    let big = A::Integer(10_000_000_000_000_000_000);
    assert_eq!(cast(&big, T::Decimal).to_string(), "10000000000000000000");
    assert_eq!(cast(&big, T::Double), A::Double(1e19));
    assert_eq!(cast(&A::Double(1e19), T::Integer), big);
    assert_eq!(cast_err(&A::Integer(10_i128.pow(30)), T::Decimal), ErrorCode::FOCA0001);
}

#[rstest]
fn everything_casts_to_string_canonically() {
    assert_eq!(cast(&A::Double(1_000_000.0), T::String), A::from("1.0E6"));
    assert_eq!(cast(&A::Boolean(false), T::String), A::from("false"));
    let d = cast(&A::from("-P0D"), T::DayTimeDuration);
    assert_eq!(cast(&d, T::String), A::from("PT0S"));
    assert_eq!(cast(&A::Integer(3), T::UntypedAtomic), A::untyped("3"));
}

#[rstest]
fn date_time_projections() {
    let v = cast(&A::from("2024-03-05T10:20:30-02:00"), T::DateTime);
    assert_eq!(cast(&v, T::Date).to_string(), "2024-03-05-02:00");
    assert_eq!(cast(&v, T::Time).to_string(), "10:20:30-02:00");
    assert_eq!(cast(&v, T::GYear).to_string(), "2024-02:00");
    assert_eq!(cast(&v, T::GMonthDay).to_string(), "--03-05-02:00");
    assert_eq!(cast(&v, T::GDay).to_string(), "---05-02:00");
    let d = cast(&A::from("2024-03-05"), T::Date);
    assert_eq!(cast(&d, T::DateTime).to_string(), "2024-03-05T00:00:00");
    assert_eq!(cast(&d, T::GYearMonth).to_string(), "2024-03");
}

#[rstest]
fn time_cannot_become_a_date() {
    let t = cast(&A::from("10:00:00"), T::Time);
    assert_eq!(cast_err(&t, T::Date), ErrorCode::XPTY0004);
}

#[rstest]
fn duration_subtypes_project() {
    let ym = cast(&A::from("P1Y"), T::YearMonthDuration);
    assert_eq!(cast(&ym, T::DayTimeDuration).to_string(), "PT0S");
    assert_eq!(cast(&ym, T::Duration).to_string(), "P1Y");
}

#[rstest]
fn binary_types_convert_between_each_other() {
    let hex = cast(&A::from("414243"), T::HexBinary);
    let b64 = cast(&hex, T::Base64Binary);
    assert_eq!(b64.to_string(), "QUJD");
    assert_eq!(cast(&b64, T::HexBinary), hex);
    assert_eq!(cast_err(&hex, T::Integer), ErrorCode::XPTY0004);
}

#[rstest]
fn any_uri_only_becomes_a_string() {
    let uri = cast(&A::from("urn:x"), T::AnyUri);
    assert_eq!(cast(&uri, T::String), A::from("urn:x"));
    assert_eq!(cast_err(&uri, T::Boolean), ErrorCode::XPTY0004);
}

#[rstest]
fn any_uri_validation_is_optional() {
    assert!(convert_from_string("http://[bad", T::AnyUri, false).is_ok());
    let err = convert_from_string("http://[bad", T::AnyUri, true).unwrap_err();
    assert_eq!(err.code(), ErrorCode::FORG0001);
    assert!(convert_from_string("../relative/path", T::AnyUri, true).is_ok());
}

#[rstest]
#[case(A::Boolean(true), T::Date)]
#[case(A::Integer(1), T::Duration)]
#[case(A::Integer(1), T::HexBinary)]
fn unrelated_types_are_type_errors(#[case] v: A, #[case] target: T) {
    assert_eq!(cast_atomic(&v, target, false).unwrap_err().code(), ErrorCode::XPTY0004);
}

#[rstest]
fn identity_and_any_atomic_return_the_value() {
    let v = A::Integer(9);
    assert_eq!(cast(&v, T::Integer), v);
    assert_eq!(cast(&v, T::AnyAtomic), v);
}

#[rstest]
fn type_hierarchy() {
    assert!(T::Integer.is_subtype_of(T::Decimal));
    assert!(T::Integer.is_subtype_of(T::Numeric));
    assert!(T::DayTimeDuration.is_subtype_of(T::Duration));
    assert!(!T::Double.is_subtype_of(T::Decimal));
    assert_eq!(T::Integer.common_supertype(T::Decimal), T::Decimal);
    assert_eq!(T::YearMonthDuration.common_supertype(T::DayTimeDuration), T::Duration);
    assert_eq!(T::String.common_supertype(T::Integer), T::AnyAtomic);
    assert_eq!(T::from_local_name("dateTime"), Some(T::DateTime));
    assert_eq!(T::GMonthDay.to_string(), "xs:gMonthDay");
}

#[rstest]
fn effective_boolean_values() {
    assert!(A::from("x").effective_boolean_value().unwrap());
    assert!(!A::from("").effective_boolean_value().unwrap());
    assert!(!A::Double(f64::NAN).effective_boolean_value().unwrap());
    let d = cast(&A::from("2024-01-01"), T::Date);
    assert_eq!(d.effective_boolean_value().unwrap_err().code, ErrorCode::FORG0006);
}
