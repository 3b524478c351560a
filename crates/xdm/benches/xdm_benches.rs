use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use platynui_xdm::engine::arithmetic::{ArithmeticOp, apply};
use platynui_xdm::engine::casting::convert_from_string;
use platynui_xdm::xdm::XdmAtomicValue as A;
use platynui_xdm::{
    AtomicType, Closure, DynamicContext, DynamicContextBuilder, Error, Expression, IntegerRange, XdmNode,
    XdmSequenceStream,
};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
struct BenchNode;

impl XdmNode for BenchNode {
    fn string_value(&self) -> String {
        String::new()
    }
}

#[derive(Debug)]
struct RangeExpr(i64);

impl Expression<BenchNode> for RangeExpr {
    fn iterate(&self, _ctx: &DynamicContext<BenchNode>) -> Result<XdmSequenceStream<BenchNode>, Error> {
        Ok(IntegerRange::new(1, self.0).iterate())
    }
}

fn sample_lexicals() -> Vec<(&'static str, AtomicType)> {
    vec![
        ("12345", AtomicType::Integer),
        ("-1234.5678", AtomicType::Decimal),
        ("6.02214076E23", AtomicType::Double),
        ("2024-02-29T13:45:30.125+02:00", AtomicType::DateTime),
        ("P1Y2M3DT4H5M6.789S", AtomicType::Duration),
        ("0A1B2C3D4E5F", AtomicType::HexBinary),
        ("TG9yZW0gaXBzdW0gZG9sb3I=", AtomicType::Base64Binary),
    ]
}

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("casting/from_string");
    for (lexical, target) in sample_lexicals() {
        group.bench_with_input(BenchmarkId::from_parameter(target), &lexical, |b, lexical| {
            b.iter(|| {
                let v = convert_from_string(black_box(lexical), target, false).expect("cast failure");
                black_box(v);
            })
        });
    }
    group.finish();
}

fn benchmark_canonical_output(c: &mut Criterion) {
    let values: Vec<A> = sample_lexicals()
        .into_iter()
        .map(|(l, t)| convert_from_string(l, t, false).expect("cast failure"))
        .collect();
    c.bench_function("casting/to_string", |b| {
        b.iter(|| {
            for v in &values {
                black_box(v.to_string());
            }
        })
    });
}

fn benchmark_arithmetic(c: &mut Criterion) {
    let dt = convert_from_string("2024-01-31T10:00:00Z", AtomicType::DateTime, false).expect("cast failure");
    let ym = convert_from_string("P1M", AtomicType::YearMonthDuration, false).expect("cast failure");
    let dec = convert_from_string("10.25", AtomicType::Decimal, false).expect("cast failure");
    c.bench_function("arithmetic/numeric", |b| {
        b.iter(|| {
            let mut acc = A::Integer(0);
            for i in 0..64 {
                acc = apply(ArithmeticOp::Add, &acc, black_box(&A::Integer(i)), None).expect("add");
                acc = apply(ArithmeticOp::Multiply, &acc, black_box(&dec), None).expect("mul");
                acc = apply(ArithmeticOp::Divide, &acc, black_box(&dec), None).expect("div");
            }
            black_box(acc);
        })
    });
    c.bench_function("arithmetic/date_time_plus_months", |b| {
        b.iter(|| black_box(apply(ArithmeticOp::Add, black_box(&dt), black_box(&ym), None).expect("add")))
    });
}

fn benchmark_memo_replay(c: &mut Criterion) {
    c.bench_function("closure/memo_replay", |b| {
        b.iter(|| {
            let mut ctx: DynamicContext<BenchNode> = DynamicContextBuilder::new().build();
            let v = Closure::make(Arc::new(RangeExpr(1_000)), &mut ctx, 4).expect("make");
            for _ in 0..4 {
                let n = v.iterate().expect("iterate").filter(Result::is_ok).count();
                black_box(n);
            }
        })
    });
}

criterion_group!(
    benches,
    benchmark_parsing,
    benchmark_canonical_output,
    benchmark_arithmetic,
    benchmark_memo_replay
);
criterion_main!(benches);
