use platynui_xdm::sequence::{IntegerRange, SequenceExtent, Value, XdmSequenceStream};
use platynui_xdm::xdm::numeric::DecimalValue;
use platynui_xdm::xdm::{AtomicType, ItemType, XdmAtomicValue as A, XdmItem};
use platynui_xdm::{ErrorCode, XdmNode};
use rstest::rstest;

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextNode(&'static str);

impl XdmNode for TextNode {
    fn string_value(&self) -> String {
        self.0.to_string()
    }
}

type I = XdmItem<TextNode>;

fn int(i: i64) -> I {
    I::Atomic(A::Integer(i128::from(i)))
}

fn ints(v: &[i64]) -> Vec<I> {
    v.iter().copied().map(int).collect()
}

fn collect(v: &Value<TextNode>) -> Vec<I> {
    v.iterate().unwrap().materialize().unwrap()
}

#[rstest]
fn from_items_picks_the_smallest_representation() {
    assert!(matches!(Value::<TextNode>::from_items(vec![]), Value::Empty));
    assert!(matches!(Value::from_items(ints(&[1])), Value::Item(_)));
    assert!(matches!(Value::from_items(ints(&[1, 2])), Value::Extent(_)));
}

#[rstest]
#[case(vec![int(1), int(2)], ItemType::Atomic(AtomicType::Integer))]
#[case(vec![int(1), I::Atomic(A::Double(2.0))], ItemType::Atomic(AtomicType::AnyAtomic))]
#[case(vec![int(1), I::Atomic(A::Decimal(DecimalValue::from(1_i64)))], ItemType::Atomic(AtomicType::Decimal))]
#[case(vec![int(1), I::Node(TextNode("n"))], ItemType::AnyItem)]
#[case(vec![I::Node(TextNode("a")), I::Node(TextNode("b"))], ItemType::Node)]
#[case(vec![], ItemType::AnyItem)]
fn extent_item_type(#[case] items: Vec<I>, #[case] expected: ItemType) {
    let extent = SequenceExtent::new(items);
    assert_eq!(extent.item_type(), expected);
    assert_eq!(extent.item_type(), expected);
}

#[rstest]
fn empty_value_reports_any_item() {
    assert_eq!(Value::<TextNode>::Empty.item_type(), ItemType::AnyItem);
}

#[rstest]
fn extent_subsequence_is_clamped_and_shares_items() {
    let extent = SequenceExtent::new(ints(&[1, 2, 3, 4, 5]));
    let sub = extent.subsequence(1, 3);
    assert_eq!(sub.items(), ints(&[2, 3, 4]).as_slice());
    assert_eq!(sub.item_at(0), Some(&int(2)));
    assert_eq!(sub.subsequence(2, 10).items(), ints(&[4]).as_slice());
    assert!(extent.subsequence(9, 2).is_empty());
    assert_eq!(sub.iterate().materialize().unwrap(), ints(&[2, 3, 4]));
    assert_eq!(extent.reversed().into_vec(), ints(&[5, 4, 3, 2, 1]));
    assert_eq!((&extent).into_iter().count(), 5);
}

#[rstest]
fn integer_range_is_virtual() {
    let r = IntegerRange::new(3, 7);
    assert_eq!(r.len(), 5);
    assert!(!r.is_empty());
    assert!(r.contains(7));
    assert!(!r.contains(8));
    assert_eq!(r.item_at(4), Some(7));
    assert_eq!(r.item_at(5), None);
    assert_eq!(r.subsequence(1, 2), Some(IntegerRange::new(4, 5)));
    assert_eq!(r.subsequence(4, 100), Some(IntegerRange::new(7, 7)));
    assert_eq!(r.subsequence(5, 1), None);
    assert_eq!(r.subsequence(0, 0), None);
    assert_eq!(r.iterate::<TextNode>().materialize().unwrap(), ints(&[3, 4, 5, 6, 7]));
    assert_eq!(r.reversed::<TextNode>().materialize().unwrap(), ints(&[7, 6, 5, 4, 3]));
}

#[rstest]
fn integer_range_at_the_edges() {
    let r = IntegerRange::new(i64::MAX - 1, i64::MAX);
    assert_eq!(r.iterate::<TextNode>().materialize().unwrap(), ints(&[i64::MAX - 1, i64::MAX]));
    assert_eq!(IntegerRange::new(i64::MIN, i64::MAX).len(), usize::MAX);
    let single = IntegerRange::new(-2, -2);
    assert_eq!(single.len(), 1);
    assert_eq!(single.iterate::<TextNode>().size_hint(), (1, Some(1)));
}

#[rstest]
#[should_panic(expected = "inverted")]
fn inverted_range_panics() {
    let _ = IntegerRange::new(5, 4);
}

#[rstest]
fn range_value_api() {
    let v: Value<TextNode> = IntegerRange::new(1, 4).into();
    assert_eq!(v.len().unwrap(), 4);
    assert_eq!(v.item_at(2).unwrap(), Some(int(3)));
    assert_eq!(v.item_type(), ItemType::Atomic(AtomicType::Integer));
    assert!(matches!(v.materialize().unwrap(), Value::Range(_)));
    let one: Value<TextNode> = IntegerRange::new(9, 9).into();
    assert!(matches!(one.reduce().unwrap(), Value::Item(_)));
}

#[rstest]
fn single_item_access() {
    let empty = Value::<TextNode>::Empty;
    assert_eq!(empty.as_single_item().unwrap(), None);
    let one = Value::<TextNode>::from(A::from("x"));
    assert_eq!(one.as_single_item().unwrap(), Some(I::Atomic(A::from("x"))));
    let many = Value::from(ints(&[1, 2]));
    assert_eq!(many.as_single_item().unwrap_err().code, ErrorCode::XPTY0004);
    assert_eq!(many.head().unwrap(), Some(int(1)));
    assert!(!many.is_empty().unwrap());
    assert!(empty.is_empty().unwrap());
}

#[rstest]
fn effective_boolean_value_of_sequences() {
    assert!(!Value::<TextNode>::Empty.effective_boolean_value().unwrap());
    let nodes = Value::from(vec![I::Node(TextNode("")), int(0)]);
    assert!(nodes.effective_boolean_value().unwrap());
    let zero = Value::<TextNode>::from(A::Integer(0));
    assert!(!zero.effective_boolean_value().unwrap());
    let two = Value::<TextNode>::from(ints(&[1, 2]));
    assert_eq!(two.effective_boolean_value().unwrap_err().code, ErrorCode::FORG0006);
}

#[rstest]
fn string_value_joins_with_spaces() {
    let v = Value::from(vec![I::Node(TextNode("a")), I::Atomic(A::Double(1e6)), I::Atomic(A::Boolean(true))]);
    assert_eq!(v.string_value().unwrap(), "a 1.0E6 true");
}

#[rstest]
fn process_pushes_every_item() {
    let v = Value::from(ints(&[4, 5, 6]));
    let mut out: Vec<I> = Vec::new();
    v.process(&mut out).unwrap();
    assert_eq!(out, ints(&[4, 5, 6]));
    assert_eq!(v.closure_depth(), 0);
}

#[rstest]
fn stream_clones_are_independent() {
    let mut s = XdmSequenceStream::from_vec(ints(&[1, 2, 3]));
    assert_eq!(s.next().unwrap().unwrap(), int(1));
    let rest = s.clone().materialize().unwrap();
    assert_eq!(rest, ints(&[2, 3]));
    assert_eq!(s.size_hint(), (2, Some(2)));
    assert_eq!(s.count(), 2);
    assert_eq!(XdmSequenceStream::<TextNode>::empty().size_hint(), (0, Some(0)));
}

#[rstest]
fn extent_value_round_trip() {
    let v = Value::from(ints(&[1, 2, 3]));
    assert_eq!(collect(&v), ints(&[1, 2, 3]));
    assert_eq!(v.item_at(3).unwrap(), None);
    assert_eq!(v.len().unwrap(), 3);
}
