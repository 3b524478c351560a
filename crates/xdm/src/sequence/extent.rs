use super::cursor::{SliceCursor, XdmSequenceStream};
use crate::model::XdmNode;
use crate::xdm::{ItemType, XdmItem};
use std::sync::{Arc, OnceLock};

/// A materialized sequence. Subsequences share the backing buffer.
#[derive(Debug, Clone)]
pub struct SequenceExtent<N> {
    items: Arc<[XdmItem<N>]>,
    start: usize,
    end: usize,
    item_type: Arc<OnceLock<ItemType>>,
}

impl<N: XdmNode> SequenceExtent<N> {
    pub fn new(items: Vec<XdmItem<N>>) -> Self {
        let end = items.len();
        Self::from_shared(items.into(), 0, end)
    }

    fn from_shared(items: Arc<[XdmItem<N>]>, start: usize, end: usize) -> Self {
        Self {
            items,
            start,
            end,
            item_type: Arc::new(OnceLock::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn items(&self) -> &[XdmItem<N>] {
        &self.items[self.start..self.end]
    }

    pub fn item_at(&self, index: usize) -> Option<&XdmItem<N>> {
        self.items().get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, XdmItem<N>> {
        self.items().iter()
    }

    pub fn iterate(&self) -> XdmSequenceStream<N> {
        XdmSequenceStream::new(Box::new(SliceCursor::new(
            Arc::clone(&self.items),
            self.start,
            Some(self.end),
        )))
    }

    /// Up to `length` items starting at zero-based `start`; clamped to the
    /// extent's bounds.
    #[must_use]
    pub fn subsequence(&self, start: usize, length: usize) -> Self {
        let from = self.start.saturating_add(start).min(self.end);
        let to = from.saturating_add(length).min(self.end);
        Self::from_shared(Arc::clone(&self.items), from, to)
    }

    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.items().iter().rev().cloned().collect())
    }

    /// Nearest common type of all items, computed once. The scan stops as
    /// soon as it reaches `item()`.
    pub fn item_type(&self) -> ItemType {
        *self.item_type.get_or_init(|| {
            let mut iter = self.iter();
            let Some(first) = iter.next() else {
                return ItemType::AnyItem;
            };
            let mut t = first.item_type();
            for item in iter {
                if t == ItemType::AnyItem {
                    break;
                }
                t = t.common_supertype(item.item_type());
            }
            t
        })
    }

    pub fn into_vec(self) -> Vec<XdmItem<N>> {
        self.items().to_vec()
    }
}

impl<N: XdmNode> From<Vec<XdmItem<N>>> for SequenceExtent<N> {
    fn from(items: Vec<XdmItem<N>>) -> Self {
        Self::new(items)
    }
}

impl<'a, N: XdmNode> IntoIterator for &'a SequenceExtent<N> {
    type Item = &'a XdmItem<N>;
    type IntoIter = core::slice::Iter<'a, XdmItem<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
