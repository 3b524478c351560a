//! Sequences and lazily evaluated values.

pub mod closure;
mod cursor;
mod expression;
mod extent;
mod range;

pub use closure::{CapturedContext, Closure, MemoClosure, MemoPhase, SingletonClosure};
pub use cursor::{SequenceCursor, XdmItemResult, XdmSequenceStream};
pub use expression::{Cardinality, Expression, Receiver};
pub use extent::SequenceExtent;
pub use range::IntegerRange;

use crate::engine::runtime::{Error, ErrorCode};
use crate::model::XdmNode;
use crate::xdm::{AtomicType, ItemType, XdmAtomicValue, XdmItem};
use std::sync::Arc;

/// Any XDM value: a realized sequence or a deferred one.
///
/// Cloning is cheap; extents and closures are shared by reference.
#[derive(Debug, Clone)]
pub enum Value<N> {
    Empty,
    Item(XdmItem<N>),
    Extent(SequenceExtent<N>),
    Range(IntegerRange),
    Closure(Arc<Closure<N>>),
    Memo(Arc<MemoClosure<N>>),
    Singleton(Arc<SingletonClosure<N>>),
}

impl<N: XdmNode> Value<N> {
    /// Collapses zero or one items to the dedicated variants.
    pub fn from_items(mut items: Vec<XdmItem<N>>) -> Self {
        match items.len() {
            0 => Value::Empty,
            1 => items.pop().map_or(Value::Empty, Value::Item),
            _ => Value::Extent(SequenceExtent::new(items)),
        }
    }

    pub fn iterate(&self) -> Result<XdmSequenceStream<N>, Error> {
        Ok(match self {
            Value::Empty => XdmSequenceStream::empty(),
            Value::Item(item) => XdmSequenceStream::from_item(item.clone()),
            Value::Extent(e) => e.iterate(),
            Value::Range(r) => r.iterate(),
            Value::Closure(c) => c.iterate()?,
            Value::Memo(m) => MemoClosure::iterate(m),
            Value::Singleton(s) => s.iterate()?,
        })
    }

    /// Zero-based positional access.
    pub fn item_at(&self, index: usize) -> Result<Option<XdmItem<N>>, Error> {
        match self {
            Value::Empty => Ok(None),
            Value::Item(item) => Ok((index == 0).then(|| item.clone())),
            Value::Extent(e) => Ok(e.item_at(index).cloned()),
            Value::Range(r) => Ok(r.item_at(index).map(|i| XdmItem::Atomic(XdmAtomicValue::Integer(i128::from(i))))),
            Value::Memo(m) => m.item_at(index),
            Value::Singleton(s) => Ok(if index == 0 { s.item()? } else { None }),
            Value::Closure(c) => c.iterate()?.nth(index).transpose(),
        }
    }

    pub fn head(&self) -> Result<Option<XdmItem<N>>, Error> {
        self.item_at(0)
    }

    pub fn len(&self) -> Result<usize, Error> {
        match self {
            Value::Empty => Ok(0),
            Value::Item(_) => Ok(1),
            Value::Extent(e) => Ok(e.len()),
            Value::Range(r) => Ok(r.len()),
            Value::Memo(m) => m.len(),
            Value::Singleton(s) => Ok(usize::from(s.item()?.is_some())),
            Value::Closure(c) => {
                let mut n = 0usize;
                for item in c.iterate()? {
                    item?;
                    n += 1;
                }
                Ok(n)
            }
        }
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        match self {
            Value::Empty => Ok(true),
            Value::Item(_) | Value::Range(_) => Ok(false),
            Value::Extent(e) => Ok(e.is_empty()),
            _ => Ok(self.head()?.is_none()),
        }
    }

    /// Realizes deferred values. Ranges stay virtual.
    pub fn materialize(&self) -> Result<Value<N>, Error> {
        match self {
            Value::Empty | Value::Item(_) | Value::Extent(_) | Value::Range(_) => Ok(self.clone()),
            Value::Memo(m) => m.materialize(),
            Value::Singleton(s) => Ok(s.item()?.map_or(Value::Empty, Value::Item)),
            Value::Closure(c) => c.materialize(),
        }
    }

    /// Materializes and picks the simplest representation.
    pub fn reduce(&self) -> Result<Value<N>, Error> {
        match self.materialize()? {
            Value::Extent(e) if e.len() <= 1 => Ok(Value::from_items(e.into_vec())),
            Value::Range(r) if r.len() == 1 => {
                Ok(Value::Item(XdmItem::Atomic(XdmAtomicValue::Integer(i128::from(r.start())))))
            }
            other => Ok(other),
        }
    }

    /// The only item, `None` for the empty sequence, `XPTY0004` for more.
    pub fn as_single_item(&self) -> Result<Option<XdmItem<N>>, Error> {
        let mut stream = self.iterate()?;
        let first = stream.next().transpose()?;
        if first.is_some() && stream.next().transpose()?.is_some() {
            return Err(Error::from_code(
                ErrorCode::XPTY0004,
                "a sequence of more than one item is not allowed here",
            ));
        }
        Ok(first)
    }

    pub fn effective_boolean_value(&self) -> Result<bool, Error> {
        let mut stream = self.iterate()?;
        let Some(first) = stream.next().transpose()? else {
            return Ok(false);
        };
        match first {
            XdmItem::Node(_) => Ok(true),
            XdmItem::Atomic(a) => {
                if stream.next().transpose()?.is_some() {
                    return Err(Error::from_code(
                        ErrorCode::FORG0006,
                        "effective boolean value is not defined for a sequence of two or more atomic values",
                    ));
                }
                a.effective_boolean_value()
            }
        }
    }

    /// String values of the items joined with single spaces.
    pub fn string_value(&self) -> Result<String, Error> {
        let mut out = String::new();
        for (i, item) in self.iterate()?.enumerate() {
            if i > 0 {
                out.push(' ');
            }
            match item? {
                XdmItem::Node(n) => out.push_str(&n.string_value()),
                XdmItem::Atomic(a) => out.push_str(&a.string_value()),
            }
        }
        Ok(out)
    }

    /// Static type of the items; realized values report what they contain.
    pub fn item_type(&self) -> ItemType {
        match self {
            Value::Empty => ItemType::AnyItem,
            Value::Item(item) => item.item_type(),
            Value::Extent(e) => e.item_type(),
            Value::Range(_) => ItemType::Atomic(AtomicType::Integer),
            Value::Closure(c) => c.item_type(),
            Value::Memo(m) => m.item_type(),
            Value::Singleton(s) => s.item_type(),
        }
    }

    /// Pushes every item into `out`.
    pub fn process(&self, out: &mut dyn Receiver<N>) -> Result<(), Error> {
        match self {
            Value::Closure(c) => c.process(out),
            _ => {
                for item in self.iterate()? {
                    out.append(item?)?;
                }
                Ok(())
            }
        }
    }

    /// Nesting depth of deferred values; realized values are 0.
    pub fn closure_depth(&self) -> usize {
        match self {
            Value::Closure(c) => c.depth(),
            Value::Memo(m) => m.depth(),
            Value::Singleton(s) => s.depth(),
            _ => 0,
        }
    }
}

impl<N: XdmNode> From<XdmItem<N>> for Value<N> {
    fn from(item: XdmItem<N>) -> Self {
        Value::Item(item)
    }
}

impl<N: XdmNode> From<XdmAtomicValue> for Value<N> {
    fn from(a: XdmAtomicValue) -> Self {
        Value::Item(XdmItem::Atomic(a))
    }
}

impl<N: XdmNode> From<Vec<XdmItem<N>>> for Value<N> {
    fn from(items: Vec<XdmItem<N>>) -> Self {
        Value::from_items(items)
    }
}

impl<N: XdmNode> From<IntegerRange> for Value<N> {
    fn from(r: IntegerRange) -> Self {
        Value::Range(r)
    }
}
