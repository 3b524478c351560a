use super::cursor::{RangeCursor, XdmSequenceStream};
use crate::model::XdmNode;

/// The integers `start..=end`, never materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerRange {
    start: i64,
    end: i64,
}

impl IntegerRange {
    /// # Panics
    /// If `start > end`; an empty range is represented by the empty sequence.
    pub fn new(start: i64, end: i64) -> Self {
        assert!(start <= end, "integer range {start} to {end} is inverted");
        Self { start, end }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Saturates at `usize::MAX` for ranges wider than the address space.
    pub fn len(&self) -> usize {
        usize::try_from(self.end.abs_diff(self.start))
            .ok()
            .and_then(|n| n.checked_add(1))
            .unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.start..=self.end).contains(&value)
    }

    pub fn item_at(&self, index: usize) -> Option<i64> {
        let offset = i64::try_from(index).ok()?;
        let value = self.start.checked_add(offset)?;
        (value <= self.end).then_some(value)
    }

    /// Up to `length` integers starting at zero-based `start`, or `None` when
    /// nothing remains.
    pub fn subsequence(&self, start: usize, length: usize) -> Option<Self> {
        if length == 0 {
            return None;
        }
        let first = self.item_at(start)?;
        let span = i64::try_from(length - 1).unwrap_or(i64::MAX);
        let last = first.saturating_add(span).min(self.end);
        Some(Self::new(first, last))
    }

    pub fn iterate<N: XdmNode>(&self) -> XdmSequenceStream<N> {
        XdmSequenceStream::new(Box::new(RangeCursor::ascending(self.start, self.end)))
    }

    /// Iterates from `end` down to `start`.
    pub fn reversed<N: XdmNode>(&self) -> XdmSequenceStream<N> {
        XdmSequenceStream::new(Box::new(RangeCursor::descending(self.start, self.end)))
    }
}
