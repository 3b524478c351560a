use platynui_xdm::ErrorCode;
use platynui_xdm::engine::arithmetic::{ArithmeticOp, apply, negate, value_compare, value_equal};
use platynui_xdm::xdm::XdmAtomicValue as A;
use platynui_xdm::xdm::duration::{DayTimeDurationValue, DurationValue, YearMonthDurationValue};
use rstest::rstest;

fn ym(s: &str) -> YearMonthDurationValue {
    YearMonthDurationValue::parse(s).unwrap()
}

fn dt(s: &str) -> DayTimeDurationValue {
    DayTimeDurationValue::parse(s).unwrap()
}

#[rstest]
#[case("P1Y2M3DT4H5M6.7S", "P1Y2M3DT4H5M6.7S")]
#[case("P14M", "P1Y2M")]
#[case("PT36H", "P1DT12H")]
#[case("-PT90M", "-PT1H30M")]
#[case("P0D", "PT0S")]
#[case("-P0Y", "PT0S")]
#[case("PT0.000001S", "PT0.000001S")]
fn duration_canonical_form(#[case] lexical: &str, #[case] expected: &str) {
    assert_eq!(DurationValue::parse(lexical).unwrap().to_string(), expected);
}

#[rstest]
#[case("")]
#[case("P")]
#[case("PT")]
#[case("P1DT")]
#[case("+P1D")]
#[case("1Y")]
#[case("P1.5Y")]
#[case("P-1D")]
#[case("PT1H2H")]
fn malformed_durations_fail(#[case] lexical: &str) {
    assert_eq!(DurationValue::parse(lexical).unwrap_err().code(), ErrorCode::FORG0001, "{lexical:?}");
}

#[rstest]
fn subtype_lexical_spaces() {
    assert_eq!(ym("P0M").to_string(), "P0M");
    assert_eq!(ym("-P25M").to_string(), "-P2Y1M");
    assert!(YearMonthDurationValue::parse("P1D").is_err());
    assert!(DayTimeDurationValue::parse("P1M").is_err());
    assert_eq!(dt("P2D").to_string(), "P2D");
}

#[rstest]
fn fractional_seconds_truncate_to_microseconds() {
    assert_eq!(dt("PT1.9999999S").to_string(), "PT1.999999S");
    assert_eq!(dt("-PT0.0000004S").to_string(), "PT0S");
}

#[rstest]
fn components_carry_the_sign() {
    let d = DurationValue::parse("-P1Y2M3DT4H5M6.5S").unwrap();
    assert_eq!((d.years(), d.months(), d.days()), (-1, -2, -3));
    assert_eq!((d.hours(), d.minutes()), (-4, -5));
    assert_eq!(d.seconds().to_string(), "-6.5");
    assert_eq!(d.total_months(), -14);
}

#[rstest]
fn generic_duration_equality_uses_both_parts() {
    let a = A::Duration(DurationValue::parse("P1Y").unwrap());
    let b = A::YearMonthDuration(ym("P12M"));
    assert!(value_equal(&a, &b, None).unwrap());
    let c = A::DayTimeDuration(dt("PT0S"));
    let d = A::YearMonthDuration(ym("P0M"));
    assert!(value_equal(&c, &d, None).unwrap());
    let e = A::Duration(DurationValue::parse("P1M").unwrap());
    let f = A::Duration(DurationValue::parse("P30D").unwrap());
    assert!(!value_equal(&e, &f, None).unwrap());
}

#[rstest]
fn generic_duration_has_no_order_or_arithmetic() {
    let a = A::Duration(DurationValue::parse("P1D").unwrap());
    assert_eq!(value_compare(&a, &a, None).unwrap_err().code, ErrorCode::XPTY0004);
    assert_eq!(apply(ArithmeticOp::Add, &a, &a, None).unwrap_err().code, ErrorCode::XPTY0004);
    assert_eq!(negate(&a).unwrap_err().code, ErrorCode::XPTY0004);
}

#[rstest]
fn subtypes_are_totally_ordered() {
    assert!(ym("P1Y") > ym("P11M"));
    assert!(dt("-PT1S") < dt("PT0S"));
    assert!(dt("P1D") == dt("PT24H"));
}

#[rstest]
fn addition_and_subtraction() {
    assert_eq!(ym("P1Y").add(&ym("P3M")).unwrap().to_string(), "P1Y3M");
    assert_eq!(ym("P1Y").subtract(&ym("P13M")).unwrap().to_string(), "-P1M");
    assert_eq!(dt("PT1H").subtract(&dt("PT90M")).unwrap().to_string(), "-PT30M");
    let sum = dt("PT20H").add(&dt("PT5H")).unwrap();
    assert_eq!(sum.subtract(&dt("PT5H")).unwrap(), dt("PT20H"));
}

#[rstest]
#[case("P1M", 1.5, "P2M")]
#[case("-P1M", 1.5, "-P1M")]
#[case("P3M", 0.5, "P2M")]
#[case("P10M", -0.25, "-P2M")]
fn year_month_scaling_rounds_half_up(#[case] d: &str, #[case] factor: f64, #[case] expected: &str) {
    assert_eq!(ym(d).multiply(factor).unwrap().to_string(), expected);
}

#[rstest]
fn day_time_scaling() {
    assert_eq!(dt("PT1H").multiply(2.5).unwrap().to_string(), "PT2H30M");
    assert_eq!(dt("P1D").divide(4.0).unwrap().to_string(), "PT6H");
    assert_eq!(dt("PT1S").divide(3.0).unwrap().to_string(), "PT0.333333S");
}

#[rstest]
fn scaling_edge_cases() {
    assert_eq!(ym("P1M").multiply(f64::NAN).unwrap_err().code, ErrorCode::FOCA0005);
    assert_eq!(dt("PT1S").divide(f64::NAN).unwrap_err().code, ErrorCode::FOCA0005);
    assert_eq!(dt("PT1S").divide(0.0).unwrap_err().code, ErrorCode::FODT0002);
    assert_eq!(ym("P1M").multiply(f64::INFINITY).unwrap_err().code, ErrorCode::FODT0002);
}

#[rstest]
fn duration_ratios() {
    assert_eq!(ym("P3Y").divide_by(&ym("P18M")).unwrap().to_string(), "2");
    assert_eq!(dt("PT1H").divide_by(&dt("PT40M")).unwrap().to_string(), "1.5");
    assert_eq!(dt("PT1H").divide_by(&dt("PT0S")).unwrap_err().code, ErrorCode::FOAR0001);
}

#[rstest]
fn duration_times_number_in_either_order() {
    let d = A::DayTimeDuration(dt("PT10M"));
    let n = A::Integer(3);
    let left = apply(ArithmeticOp::Multiply, &d, &n, None).unwrap();
    let right = apply(ArithmeticOp::Multiply, &n, &d, None).unwrap();
    assert_eq!(left, right);
    assert_eq!(left.to_string(), "PT30M");
    let err = apply(ArithmeticOp::Divide, &n, &d, None).unwrap_err();
    assert_eq!(err.code, ErrorCode::XPTY0004);
}

#[rstest]
fn overflow_is_reported() {
    let big = YearMonthDurationValue::from_months(i64::from(i32::MAX)).unwrap();
    assert_eq!(big.add(&ym("P1M")).unwrap_err().code, ErrorCode::FODT0002);
    assert_eq!(DayTimeDurationValue::from_micros(i128::MAX).unwrap_err().code, ErrorCode::FODT0002);
    assert_eq!(
        DurationValue::parse("P99999999999999999999Y").unwrap_err().code(),
        ErrorCode::FODT0002
    );
}

#[rstest]
#[case("PT9223372036854.775807S", Some(i64::MAX))]
#[case("-PT9223372036854.775807S", Some(-i64::MAX))]
#[case("P106751991DT4H0M54.775807S", Some(i64::MAX))]
#[case("PT9223372036854.775808S", None)]
#[case("PT9223372036854.999999S", None)]
#[case("-PT9223372036855S", None)]
#[case("P106751991DT4H0M55S", None)]
fn day_time_magnitude_boundary(#[case] lexical: &str, #[case] expected: Option<i64>) {
    match expected {
        Some(micros) => {
            let d = dt(lexical);
            assert_eq!(d.total_micros(), micros);
            assert_eq!(d.to_string().trim_start_matches('-'), "P106751991DT4H54.775807S");
        }
        None => {
            assert_eq!(DayTimeDurationValue::parse(lexical).unwrap_err().code(), ErrorCode::FODT0002);
            assert_eq!(DurationValue::parse(lexical).unwrap_err().code(), ErrorCode::FODT0002);
        }
    }
}

#[rstest]
fn largest_day_time_duration_orders_and_overflows_cleanly() {
    let max = dt("PT9223372036854.775807S");
    assert!(max > dt("PT1S"));
    assert!(max.negate() < dt("-PT1S"));
    assert_eq!(max.cmp(&max), std::cmp::Ordering::Equal);
    assert_eq!(max.add(&dt("PT0.000001S")).unwrap_err().code, ErrorCode::FODT0002);
    assert_eq!(max.subtract(&max.negate()).unwrap_err().code, ErrorCode::FODT0002);
    assert_eq!(max.add(&max.negate()).unwrap().to_string(), "PT0S");
}

#[rstest]
fn negation_flips_the_sign_but_not_zero() {
    assert_eq!(dt("PT5S").negate().to_string(), "-PT5S");
    assert_eq!(dt("PT0S").negate().to_string(), "PT0S");
    assert!(!dt("PT0S").negate().is_negative());
}

#[rstest]
fn subtype_projection() {
    let d = DurationValue::parse("-P1Y2M3DT4H").unwrap();
    assert_eq!(d.to_year_month().to_string(), "-P1Y2M");
    assert_eq!(d.to_day_time().to_string(), "-P3DT4H");
    let cast = A::Duration(d).convert(platynui_xdm::AtomicType::DayTimeDuration, false).unwrap();
    assert_eq!(cast.to_string(), "-P3DT4H");
}
