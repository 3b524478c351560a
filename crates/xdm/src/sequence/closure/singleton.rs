use super::CapturedContext;
use crate::engine::runtime::Error;
use crate::model::XdmNode;
use crate::sequence::{Expression, XdmSequenceStream};
use crate::xdm::{ItemType, XdmItem};
use core::cell::RefCell;
use core::fmt;
use parking_lot::ReentrantMutex;
use std::sync::Arc;

enum SingletonState<N> {
    Pending(CapturedContext<N>),
    Busy,
    Done(Option<XdmItem<N>>),
}

/// A deferred value of at most one item. The expression runs once; the
/// captured context is dropped as soon as the item is known.
pub struct SingletonClosure<N> {
    expression: Arc<dyn Expression<N>>,
    state: ReentrantMutex<RefCell<SingletonState<N>>>,
    depth: usize,
}

impl<N: XdmNode> SingletonClosure<N> {
    pub fn new(expression: Arc<dyn Expression<N>>, captured: CapturedContext<N>, depth: usize) -> Self {
        Self {
            expression,
            state: ReentrantMutex::new(RefCell::new(SingletonState::Pending(captured))),
            depth,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn item_type(&self) -> ItemType {
        self.expression.item_type()
    }

    pub fn is_evaluated(&self) -> bool {
        matches!(*self.state.lock().borrow(), SingletonState::Done(_))
    }

    /// The item, evaluating the expression on first use.
    pub fn item(&self) -> Result<Option<XdmItem<N>>, Error> {
        let guard = self.state.lock();
        let captured = {
            let mut st = guard.borrow_mut();
            match core::mem::replace(&mut *st, SingletonState::Busy) {
                SingletonState::Done(item) => {
                    let out = item.clone();
                    *st = SingletonState::Done(item);
                    return Ok(out);
                }
                SingletonState::Busy => {
                    tracing::warn!(depth = self.depth, "singleton closure re-entered while being evaluated");
                    return Err(Error::circularity());
                }
                SingletonState::Pending(captured) => captured,
            }
        };
        match self.expression.evaluate_item(&captured.to_dynamic_context()) {
            Ok(item) => {
                *guard.borrow_mut() = SingletonState::Done(item.clone());
                Ok(item)
            }
            Err(e) => {
                *guard.borrow_mut() = SingletonState::Pending(captured);
                Err(e)
            }
        }
    }

    pub fn iterate(&self) -> Result<XdmSequenceStream<N>, Error> {
        Ok(match self.item()? {
            Some(item) => XdmSequenceStream::from_item(item),
            None => XdmSequenceStream::empty(),
        })
    }
}

impl<N> fmt::Debug for SingletonClosure<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingletonClosure")
            .field("expression", &self.expression)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
