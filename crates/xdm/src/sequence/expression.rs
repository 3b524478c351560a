use super::cursor::XdmSequenceStream;
use crate::engine::runtime::{DynamicContext, Error};
use crate::xdm::{ItemType, XdmItem};
use core::fmt;

/// Static bounds on the number of items an expression yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Empty,
    ZeroOrOne,
    ExactlyOne,
    ZeroOrMore,
    OneOrMore,
}

impl Cardinality {
    pub fn allows_many(self) -> bool {
        matches!(self, Cardinality::ZeroOrMore | Cardinality::OneOrMore)
    }

    pub fn allows_zero(self) -> bool {
        matches!(self, Cardinality::Empty | Cardinality::ZeroOrOne | Cardinality::ZeroOrMore)
    }
}

/// Push-mode sink for sequence items.
pub trait Receiver<N> {
    fn append(&mut self, item: XdmItem<N>) -> Result<(), Error>;
}

impl<N> Receiver<N> for Vec<XdmItem<N>> {
    fn append(&mut self, item: XdmItem<N>) -> Result<(), Error> {
        self.push(item);
        Ok(())
    }
}

/// A compiled expression as seen by the lazy evaluation engine.
///
/// Only `iterate` is required. The remaining methods describe what a closure
/// must capture and how it should be represented.
pub trait Expression<N>: Send + Sync + fmt::Debug {
    fn iterate(&self, ctx: &DynamicContext<N>) -> Result<XdmSequenceStream<N>, Error>;

    /// First item of the result, if any.
    fn evaluate_item(&self, ctx: &DynamicContext<N>) -> Result<Option<XdmItem<N>>, Error> {
        self.iterate(ctx)?.next().transpose()
    }

    fn process(&self, ctx: &DynamicContext<N>, out: &mut dyn Receiver<N>) -> Result<(), Error> {
        for item in self.iterate(ctx)? {
            out.append(item?)?;
        }
        Ok(())
    }

    /// Local variable slots read by the expression.
    fn slots_used(&self) -> &[usize] {
        &[]
    }

    /// Whether the result depends on `position()` or `last()`, which closures
    /// do not capture.
    fn depends_on_focus_position(&self) -> bool {
        false
    }

    fn item_type(&self) -> ItemType {
        ItemType::AnyItem
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::ZeroOrMore
    }
}
