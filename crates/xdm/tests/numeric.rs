use platynui_xdm::ErrorCode;
use platynui_xdm::engine::arithmetic::{ArithmeticOp, apply};
use platynui_xdm::xdm::XdmAtomicValue as A;
use platynui_xdm::xdm::numeric::{
    DecimalValue, NumKind, NumericValue, format_double, format_float, parse_double, parse_number,
};
use rstest::rstest;

fn dec(s: &str) -> NumericValue {
    NumericValue::Decimal(DecimalValue::parse(s).unwrap())
}

#[rstest]
#[case(1.0, "1")]
#[case(-0.0, "-0")]
#[case(0.0, "0")]
#[case(0.5, "0.5")]
#[case(123_456.5, "123456.5")]
#[case(1_000_000.0, "1.0E6")]
#[case(1.5e-7, "1.5E-7")]
#[case(-2.5e10, "-2.5E10")]
#[case(f64::INFINITY, "INF")]
#[case(f64::NEG_INFINITY, "-INF")]
#[case(f64::NAN, "NaN")]
fn double_canonical_form(#[case] x: f64, #[case] expected: &str) {
    assert_eq!(format_double(x), expected);
}

#[rstest]
fn float_canonical_form_matches_double_rules() {
    assert_eq!(format_float(1_000_000.0), "1.0E6");
    assert_eq!(format_float(0.25), "0.25");
    assert_eq!(format_float(f32::NAN), "NaN");
}

#[rstest]
#[case("10.500", "10.5")]
#[case("-0.0", "0")]
#[case("+007.25", "7.25")]
#[case("3", "3")]
#[case(".5", "0.5")]
fn decimal_canonical_form(#[case] lexical: &str, #[case] expected: &str) {
    assert_eq!(DecimalValue::parse(lexical).unwrap().to_string(), expected);
}

#[rstest]
fn decimal_with_too_many_digits_is_rejected() {
    let err = DecimalValue::parse("1234567890123456789012345678.9").unwrap_err();
    assert_eq!(err.code(), ErrorCode::FOCA0006);
}

#[rstest]
#[case("abc")]
#[case("1.2.3")]
#[case("")]
#[case("1e5")]
fn decimal_rejects_bad_lexical(#[case] lexical: &str) {
    assert_eq!(DecimalValue::parse(lexical).unwrap_err().code(), ErrorCode::FORG0001);
}

#[rstest]
#[case(" 1e3 ", 1000.0)]
#[case("-INF", f64::NEG_INFINITY)]
#[case(".5E1", 5.0)]
fn double_lexical_forms(#[case] lexical: &str, #[case] expected: f64) {
    assert_eq!(parse_double(lexical).unwrap(), expected);
}

#[rstest]
#[case("inf")]
#[case("1e")]
#[case("0x10")]
fn double_rejects_bad_lexical(#[case] lexical: &str) {
    assert!(parse_double(lexical).is_err());
}

#[rstest]
fn parse_number_picks_kind_from_shape() {
    assert_eq!(parse_number("42").unwrap().kind(), NumKind::Integer);
    assert_eq!(parse_number("4.2").unwrap().kind(), NumKind::Decimal);
    assert_eq!(parse_number("4.2e0").unwrap().kind(), NumKind::Double);
    assert!(parse_number("4.2eX").unwrap().is_nan());
    assert!(parse_number("4x").is_err());
}

#[rstest]
#[case(2.5, 2.0)]
#[case(3.5, 4.0)]
#[case(-2.5, -2.0)]
#[case(2.51, 3.0)]
fn round_half_to_even_double(#[case] x: f64, #[case] expected: f64) {
    let r = NumericValue::Double(x).round_half_to_even(0).unwrap();
    assert_eq!(r.to_f64(), expected);
}

#[rstest]
fn round_half_to_even_decimal_and_negative_precision() {
    assert_eq!(dec("2.5").round_half_to_even(0).unwrap().to_string(), "2");
    assert_eq!(dec("3.45").round_half_to_even(1).unwrap().to_string(), "3.4");
    let r = NumericValue::Integer(1250).round_half_to_even(-2).unwrap();
    assert_eq!(r, NumericValue::Integer(1200));
}

#[rstest]
#[case(NumericValue::Double(2.5), 3.0)]
#[case(NumericValue::Double(-2.5), -2.0)]
#[case(NumericValue::Double(-0.2), -0.0)]
fn round_goes_half_up(#[case] x: NumericValue, #[case] expected: f64) {
    let r = x.round().unwrap().to_f64();
    assert_eq!(r, expected);
    assert_eq!(r.is_sign_negative(), expected.is_sign_negative());
}

#[rstest]
#[case(NumericValue::Double(1.25))]
#[case(NumericValue::Double(-7.5))]
#[case(NumericValue::Integer(9))]
fn rounding_is_idempotent(#[case] x: NumericValue) {
    let once = x.round().unwrap();
    assert_eq!(once.round().unwrap(), once);
    let even = x.round_half_to_even(0).unwrap();
    assert_eq!(even.round_half_to_even(0).unwrap(), even);
}

#[rstest]
fn integer_modulo_by_zero_fails() {
    let err = NumericValue::Integer(5).modulo(&NumericValue::Integer(0)).unwrap_err();
    assert_eq!(err.code, ErrorCode::FOAR0001);
}

#[rstest]
fn double_modulo_by_zero_is_nan() {
    let r = NumericValue::Double(5.0).modulo(&NumericValue::Double(0.0)).unwrap();
    assert!(r.is_nan());
}

#[rstest]
fn modulo_takes_sign_of_dividend() {
    assert_eq!(
        NumericValue::Integer(-5).modulo(&NumericValue::Integer(3)).unwrap(),
        NumericValue::Integer(-2)
    );
    assert_eq!(dec("-5.5").modulo(&dec("2")).unwrap().to_string(), "-1.5");
}

#[rstest]
fn integer_division_results() {
    let q = NumericValue::Integer(1).divide(&NumericValue::Integer(3)).unwrap();
    assert_eq!(q.kind(), NumKind::Decimal);
    assert_eq!(q.to_string(), "0.333333333333333333");
    let err = NumericValue::Integer(1).divide(&NumericValue::Integer(0)).unwrap_err();
    assert_eq!(err.code, ErrorCode::FOAR0001);
    assert_eq!(
        NumericValue::Integer(7).integer_divide(&NumericValue::Integer(-2)).unwrap(),
        NumericValue::Integer(-3)
    );
}

#[rstest]
fn integer_overflow_is_reported() {
    let err = NumericValue::Integer(i128::MAX).add(&NumericValue::Integer(1)).unwrap_err();
    assert_eq!(err.code, ErrorCode::FOAR0002);
    let err = NumericValue::Integer(i128::MIN).negate().unwrap_err();
    assert_eq!(err.code, ErrorCode::FOAR0002);
    let err = NumericValue::Integer(i128::MAX / 2 + 1).multiply(&NumericValue::Integer(2)).unwrap_err();
    assert_eq!(err.code, ErrorCode::FOAR0002);
}

#[rstest]
#[case(ArithmeticOp::Multiply, 10_000_000_000, 10_000_000_000, "100000000000000000000")]
#[case(ArithmeticOp::Add, i128::from(i64::MAX), 1, "9223372036854775808")]
#[case(ArithmeticOp::Subtract, i128::from(i64::MIN), 1, "-9223372036854775809")]
#[case(ArithmeticOp::IntegerDivide, 100_000_000_000_000_000_000, 7, "14285714285714285714")]
#[case(ArithmeticOp::Modulo, 100_000_000_000_000_000_000, 7, "2")]
fn integers_beyond_sixty_four_bits(
    #[case] op: ArithmeticOp,
    #[case] a: i128,
    #[case] b: i128,
    #[case] expected: &str,
) {
    let r = apply(op, &A::Integer(a), &A::Integer(b), None).unwrap();
    assert!(matches!(r, A::Integer(_)), "{r:?}");
    assert_eq!(r.to_string(), expected);
}

#[rstest]
fn integers_beyond_the_decimal_range() {
    use core::cmp::Ordering;
    let huge = NumericValue::Integer(10_i128.pow(30));
    assert_eq!(huge.compare(&dec("1.5")), Some(Ordering::Greater));
    assert_eq!(dec("1.5").compare(&huge), Some(Ordering::Less));
    assert_eq!(huge.negate().unwrap().compare(&dec("-1.5")), Some(Ordering::Less));
    assert_eq!(huge.compare(&NumericValue::Double(1e30)), Some(Ordering::Equal));
    assert_eq!(huge.add(&dec("0.5")).unwrap_err().code, ErrorCode::FOAR0002);
    assert_eq!(huge.to_decimal_value().unwrap_err().code(), ErrorCode::FOCA0001);
    let fits = NumericValue::Integer(10_i128.pow(20));
    assert_eq!(fits.add(&dec("0.5")).unwrap().kind(), NumKind::Decimal);
}

#[rstest]
#[case(1250, -2, Some(1200))]
#[case(1350, -2, Some(1400))]
#[case(-1250, -2, Some(-1200))]
#[case(-1251, -2, Some(-1300))]
#[case(1249, -2, Some(1200))]
#[case(12_345, 2, Some(12_345))]
#[case(12_345, -40, Some(0))]
#[case(i128::MAX, -38, None)]
#[case(25_000_000_000_000_000_000_000_000_000_000_000_000, -37, Some(20_000_000_000_000_000_000_000_000_000_000_000_000))]
fn integer_round_half_to_even(#[case] value: i128, #[case] scale: i32, #[case] expected: Option<i128>) {
    let r = NumericValue::Integer(value).round_half_to_even(scale);
    match expected {
        Some(e) => assert!(matches!(r, Ok(NumericValue::Integer(x)) if x == e), "{r:?}"),
        None => assert_eq!(r.unwrap_err().code, ErrorCode::FOAR0002),
    }
}

#[rstest]
fn mixed_kinds_promote() {
    let r = NumericValue::Integer(1).add(&NumericValue::Double(0.5)).unwrap();
    assert_eq!(r.kind(), NumKind::Double);
    let r = NumericValue::Integer(1).add(&dec("0.5")).unwrap();
    assert_eq!(r.kind(), NumKind::Decimal);
    let r = NumericValue::Float(1.0).add(&NumericValue::Double(0.5)).unwrap();
    assert_eq!(r.kind(), NumKind::Double);
}

#[rstest]
fn comparison_across_kinds() {
    use core::cmp::Ordering;
    assert_eq!(NumericValue::Integer(2).compare(&dec("2.0")), Some(Ordering::Equal));
    assert_eq!(NumericValue::Integer(2).compare(&NumericValue::Double(2.5)), Some(Ordering::Less));
    assert_eq!(NumericValue::Double(f64::NAN).compare(&NumericValue::Integer(1)), None);
}

#[rstest]
fn numeric_atomic_equality_ignores_kind() {
    assert_eq!(A::Integer(3), A::Double(3.0));
    assert_eq!(A::Decimal(DecimalValue::from(3)), A::Float(3.0));
    assert_ne!(A::Double(f64::NAN), A::Double(f64::NAN));
}

#[rstest]
fn untyped_operand_is_promoted_to_double() {
    let r = apply(ArithmeticOp::Add, &A::untyped("1.5"), &A::Integer(1), None).unwrap();
    assert!(matches!(r, A::Double(x) if (x - 2.5).abs() < f64::EPSILON));
}

#[rstest]
fn string_operand_is_a_type_error() {
    let err = apply(ArithmeticOp::Add, &A::from("1"), &A::Integer(1), None).unwrap_err();
    assert_eq!(err.code, ErrorCode::XPTY0004);
}

#[rstest]
fn numeric_to_integer_conversions() {
    assert_eq!(NumericValue::Double(-3.7).to_integer().unwrap(), -3);
    assert_eq!(NumericValue::Double(f64::NAN).to_integer().unwrap_err().code(), ErrorCode::FOCA0002);
    assert_eq!(NumericValue::Double(1e30).to_integer().unwrap(), 1_000_000_000_000_000_019_884_624_838_656);
    assert_eq!(NumericValue::Double(1e40).to_integer().unwrap_err().code(), ErrorCode::FOCA0003);
}
