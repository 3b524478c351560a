use crate::engine::runtime::Error;
use crate::model::XdmNode;
use crate::xdm::{XdmAtomicValue, XdmItem};
use std::sync::Arc;

pub type XdmItemResult<N> = Result<XdmItem<N>, Error>;

/// Pull-based producer of sequence items.
///
/// A cursor yields `None` once exhausted and must keep doing so. Errors are
/// reported in-band; callers decide whether to continue after one.
pub trait SequenceCursor<N>: Send {
    fn next_item(&mut self) -> Option<XdmItemResult<N>>;

    /// Bounds on the remaining number of items. `(0, Some(0))` promises that
    /// the cursor is exhausted.
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }

    fn boxed_clone(&self) -> Box<dyn SequenceCursor<N>>;
}

/// An owned, lazily evaluated sequence.
pub struct XdmSequenceStream<N> {
    cursor: Box<dyn SequenceCursor<N>>,
}

impl<N> XdmSequenceStream<N> {
    pub fn new(cursor: Box<dyn SequenceCursor<N>>) -> Self {
        Self { cursor }
    }

    pub fn cursor(self) -> Box<dyn SequenceCursor<N>> {
        self.cursor
    }

    /// Drains the stream, stopping at the first error.
    pub fn materialize(self) -> Result<Vec<XdmItem<N>>, Error> {
        self.collect()
    }
}

impl<N: XdmNode> XdmSequenceStream<N> {
    pub fn empty() -> Self {
        Self::new(Box::new(EmptyCursor))
    }

    pub fn from_item(item: XdmItem<N>) -> Self {
        Self::from_vec(vec![item])
    }

    pub fn from_vec(items: Vec<XdmItem<N>>) -> Self {
        Self::new(Box::new(SliceCursor::new(items.into(), 0, None)))
    }
}

impl<N> Iterator for XdmSequenceStream<N> {
    type Item = XdmItemResult<N>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next_item()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cursor.size_hint()
    }
}

impl<N> Clone for XdmSequenceStream<N> {
    fn clone(&self) -> Self {
        Self {
            cursor: self.cursor.boxed_clone(),
        }
    }
}

impl<N> core::fmt::Debug for XdmSequenceStream<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("XdmSequenceStream").finish_non_exhaustive()
    }
}

pub(crate) struct EmptyCursor;

impl<N: XdmNode> SequenceCursor<N> for EmptyCursor {
    fn next_item(&mut self) -> Option<XdmItemResult<N>> {
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(0))
    }

    fn boxed_clone(&self) -> Box<dyn SequenceCursor<N>> {
        Box::new(EmptyCursor)
    }
}

/// Walks a shared item buffer; clones share the buffer.
pub(crate) struct SliceCursor<N> {
    items: Arc<[XdmItem<N>]>,
    pos: usize,
    end: usize,
}

impl<N> SliceCursor<N> {
    pub(crate) fn new(items: Arc<[XdmItem<N>]>, start: usize, end: Option<usize>) -> Self {
        let end = end.unwrap_or(items.len()).min(items.len());
        Self {
            items,
            pos: start.min(end),
            end,
        }
    }
}

impl<N: XdmNode> SequenceCursor<N> for SliceCursor<N> {
    fn next_item(&mut self) -> Option<XdmItemResult<N>> {
        if self.pos >= self.end {
            return None;
        }
        let item = self.items[self.pos].clone();
        self.pos += 1;
        Some(Ok(item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end - self.pos;
        (n, Some(n))
    }

    fn boxed_clone(&self) -> Box<dyn SequenceCursor<N>> {
        Box::new(Self {
            items: Arc::clone(&self.items),
            pos: self.pos,
            end: self.end,
        })
    }
}

/// Consecutive integers, ascending or descending, both ends inclusive.
#[derive(Clone, Copy)]
pub(crate) struct RangeCursor {
    next: i64,
    last: i64,
    descending: bool,
    done: bool,
}

impl RangeCursor {
    pub(crate) fn ascending(start: i64, end: i64) -> Self {
        Self {
            next: start,
            last: end,
            descending: false,
            done: start > end,
        }
    }

    pub(crate) fn descending(start: i64, end: i64) -> Self {
        Self {
            next: end,
            last: start,
            descending: true,
            done: start > end,
        }
    }

    fn remaining(&self) -> Option<usize> {
        if self.done {
            return Some(0);
        }
        usize::try_from(self.next.abs_diff(self.last)).ok()?.checked_add(1)
    }
}

impl<N: XdmNode> SequenceCursor<N> for RangeCursor {
    fn next_item(&mut self) -> Option<XdmItemResult<N>> {
        if self.done {
            return None;
        }
        let current = self.next;
        if current == self.last {
            self.done = true;
        } else if self.descending {
            self.next -= 1;
        } else {
            self.next += 1;
        }
        Some(Ok(XdmItem::Atomic(XdmAtomicValue::Integer(i128::from(current)))))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining() {
            Some(n) => (n, Some(n)),
            None => (usize::MAX, None),
        }
    }

    fn boxed_clone(&self) -> Box<dyn SequenceCursor<N>> {
        Box::new(*self)
    }
}
