use super::CapturedContext;
use crate::engine::runtime::Error;
use crate::model::XdmNode;
use crate::sequence::{Expression, SequenceCursor, Value, XdmItemResult, XdmSequenceStream};
use crate::xdm::{ItemType, XdmItem};
use core::cell::RefCell;
use core::fmt;
use parking_lot::ReentrantMutex;
use std::sync::Arc;

/// Progress of a [`MemoClosure`].
///
/// `Unread` moves to `Busy` on the first read, then to `Empty` or
/// `MaybeMore`; `MaybeMore` ends in `AllRead`. `Busy` is held only while the
/// underlying expression or cursor is producing items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoPhase {
    Unread,
    Busy,
    Empty,
    MaybeMore,
    AllRead,
}

struct MemoState<N> {
    phase: MemoPhase,
    reservoir: Vec<XdmItem<N>>,
    input: Option<Box<dyn SequenceCursor<N>>>,
    source: Option<(Arc<dyn Expression<N>>, CapturedContext<N>)>,
}

/// A deferred value that buffers what it produces, so any number of readers
/// can iterate it while the expression is evaluated at most once.
///
/// All state transitions happen under one re-entrant lock. Other threads
/// wait for the lock; the forcing thread itself re-entering while `Busy`
/// means the value depends on itself and fails with `XTDE0640`.
pub struct MemoClosure<N> {
    state: ReentrantMutex<RefCell<MemoState<N>>>,
    item_type: ItemType,
    depth: usize,
}

impl<N: XdmNode> MemoClosure<N> {
    pub fn new(expression: Arc<dyn Expression<N>>, captured: CapturedContext<N>, depth: usize) -> Self {
        let item_type = expression.item_type();
        Self::with_state(
            MemoState {
                phase: MemoPhase::Unread,
                reservoir: Vec::new(),
                input: None,
                source: Some((expression, captured)),
            },
            item_type,
            depth,
        )
    }

    /// Buffers an existing cursor so it can be read repeatedly.
    pub fn from_cursor(cursor: Box<dyn SequenceCursor<N>>) -> Self {
        Self::with_state(
            MemoState {
                phase: MemoPhase::Unread,
                reservoir: Vec::new(),
                input: Some(cursor),
                source: None,
            },
            ItemType::AnyItem,
            1,
        )
    }

    fn with_state(state: MemoState<N>, item_type: ItemType, depth: usize) -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(state)),
            item_type,
            depth,
        }
    }

    pub fn phase(&self) -> MemoPhase {
        self.state.lock().borrow().phase
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Reads from the source until item `wanted` is buffered, or to the end
    /// when `wanted` is `None`.
    fn fill(&self, wanted: Option<usize>) -> Result<(), Error> {
        let guard = self.state.lock();
        let satisfied = |st: &MemoState<N>| wanted.is_some_and(|w| st.reservoir.len() > w);

        let (was_unread, input, source) = {
            let mut st = guard.borrow_mut();
            match st.phase {
                MemoPhase::Busy => {
                    tracing::warn!(depth = self.depth, "memo closure re-entered while being evaluated");
                    return Err(Error::circularity());
                }
                MemoPhase::Empty | MemoPhase::AllRead => return Ok(()),
                MemoPhase::MaybeMore if satisfied(&*st) => return Ok(()),
                MemoPhase::Unread | MemoPhase::MaybeMore => {}
            }
            let was_unread = st.phase == MemoPhase::Unread;
            st.phase = MemoPhase::Busy;
            let source = if st.input.is_none() { st.source.clone() } else { None };
            (was_unread, st.input.take(), source)
        };

        // The borrow is released before calling out: the source may read
        // this closure again and must see `Busy` rather than a borrow panic.
        let mut input = match (input, source) {
            (Some(cursor), _) => cursor,
            (None, Some((expression, captured))) => {
                tracing::debug!(depth = self.depth, "forcing memo closure");
                match expression.iterate(&captured.to_dynamic_context()) {
                    Ok(stream) => stream.cursor(),
                    Err(e) => {
                        guard.borrow_mut().phase = MemoPhase::Unread;
                        return Err(e);
                    }
                }
            }
            (None, None) => {
                let mut st = guard.borrow_mut();
                st.phase = if st.reservoir.is_empty() { MemoPhase::Empty } else { MemoPhase::AllRead };
                return Ok(());
            }
        };

        if was_unread && input.size_hint() == (0, Some(0)) {
            self.finish(&mut *guard.borrow_mut());
            return Ok(());
        }

        loop {
            if satisfied(&*guard.borrow()) {
                let mut st = guard.borrow_mut();
                st.input = Some(input);
                st.phase = MemoPhase::MaybeMore;
                return Ok(());
            }
            match input.next_item() {
                Some(Ok(item)) => guard.borrow_mut().reservoir.push(item),
                Some(Err(e)) => {
                    let mut st = guard.borrow_mut();
                    st.input = Some(input);
                    st.phase = MemoPhase::MaybeMore;
                    return Err(e);
                }
                None => {
                    self.finish(&mut *guard.borrow_mut());
                    return Ok(());
                }
            }
        }
    }

    fn finish(&self, st: &mut MemoState<N>) {
        st.phase = if st.reservoir.is_empty() { MemoPhase::Empty } else { MemoPhase::AllRead };
        st.reservoir.shrink_to_fit();
        st.input = None;
        st.source = None;
        tracing::debug!(depth = self.depth, items = st.reservoir.len(), "memo closure fully read");
    }

    /// Zero-based access; reads only as far as needed.
    pub fn item_at(&self, index: usize) -> Result<Option<XdmItem<N>>, Error> {
        self.fill(Some(index))?;
        let guard = self.state.lock();
        let st = guard.borrow();
        Ok(st.reservoir.get(index).cloned())
    }

    pub fn len(&self) -> Result<usize, Error> {
        self.fill(None)?;
        Ok(self.state.lock().borrow().reservoir.len())
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.item_at(0)?.is_none())
    }

    pub fn materialize(&self) -> Result<Value<N>, Error> {
        self.fill(None)?;
        let items = self.state.lock().borrow().reservoir.clone();
        Ok(Value::from_items(items))
    }

    /// A stream that replays buffered items, then extends the buffer.
    pub fn iterate(this: &Arc<Self>) -> XdmSequenceStream<N> {
        XdmSequenceStream::new(Box::new(ProgressiveCursor {
            memo: Arc::clone(this),
            position: 0,
            failed: false,
        }))
    }
}

impl<N> fmt::Debug for MemoClosure<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.state.lock();
        let mut s = f.debug_struct("MemoClosure");
        if let Ok(st) = guard.try_borrow() {
            s.field("phase", &st.phase).field("buffered", &st.reservoir.len());
        }
        s.field("depth", &self.depth).finish_non_exhaustive()
    }
}

struct ProgressiveCursor<N> {
    memo: Arc<MemoClosure<N>>,
    position: usize,
    failed: bool,
}

impl<N: XdmNode> SequenceCursor<N> for ProgressiveCursor<N> {
    fn next_item(&mut self) -> Option<XdmItemResult<N>> {
        if self.failed {
            return None;
        }
        match self.memo.item_at(self.position) {
            Ok(Some(item)) => {
                self.position += 1;
                Some(Ok(item))
            }
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let guard = self.memo.state.lock();
        let Ok(st) = guard.try_borrow() else {
            return (0, None);
        };
        let buffered = st.reservoir.len().saturating_sub(self.position);
        match st.phase {
            MemoPhase::Empty | MemoPhase::AllRead => (buffered, Some(buffered)),
            _ => (buffered, None),
        }
    }

    fn boxed_clone(&self) -> Box<dyn SequenceCursor<N>> {
        Box::new(Self {
            memo: Arc::clone(&self.memo),
            position: self.position,
            failed: self.failed,
        })
    }
}
