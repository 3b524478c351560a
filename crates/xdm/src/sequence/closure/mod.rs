//! Deferred evaluation.
//!
//! A closure pairs an expression with a snapshot of the context it needs.
//! [`Closure::make`] picks the representation: a single-read [`Closure`], a
//! buffering [`MemoClosure`] for values read more than once, or a
//! [`SingletonClosure`] for at most one item.

mod memo;
mod singleton;

pub use memo::{MemoClosure, MemoPhase};
pub use singleton::SingletonClosure;

use super::{Expression, Receiver, Value, XdmSequenceStream};
use crate::engine::runtime::{DynamicContext, Error};
use crate::model::XdmNode;
use crate::xdm::temporal::{DateTimeValue, TimezoneOffset};
use crate::xdm::{ItemType, XdmItem};
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use smallvec::SmallVec;
use std::sync::Arc;

/// The part of a [`DynamicContext`] a closure keeps alive: the slots its
/// expression reads, the context item and the timezone settings. Focus
/// position and size are deliberately absent.
#[derive(Debug, Clone)]
pub struct CapturedContext<N> {
    context_item: Option<XdmItem<N>>,
    slots: SmallVec<[(usize, Value<N>); 4]>,
    implicit_timezone: Option<TimezoneOffset>,
    use_system_timezone: bool,
    now: Option<DateTimeValue>,
    max_closure_depth: usize,
}

impl<N: XdmNode> CapturedContext<N> {
    pub fn capture(expression: &dyn Expression<N>, ctx: &DynamicContext<N>) -> Self {
        let slots = expression
            .slots_used()
            .iter()
            .filter_map(|&i| ctx.slot(i).map(|v| (i, v.clone())))
            .collect();
        Self {
            context_item: ctx.context_item.clone(),
            slots,
            implicit_timezone: ctx.implicit_timezone,
            use_system_timezone: ctx.use_system_timezone,
            now: ctx.now.clone(),
            max_closure_depth: ctx.max_closure_depth,
        }
    }

    /// Rebuilds an evaluation context holding only the captured state.
    pub fn to_dynamic_context(&self) -> DynamicContext<N> {
        let mut ctx = DynamicContext {
            context_item: self.context_item.clone(),
            implicit_timezone: self.implicit_timezone,
            use_system_timezone: self.use_system_timezone,
            now: self.now.clone(),
            max_closure_depth: self.max_closure_depth,
            ..DynamicContext::default()
        };
        for (i, v) in &self.slots {
            ctx.set_slot(*i, v.clone());
        }
        ctx
    }

    pub fn context_item(&self) -> Option<&XdmItem<N>> {
        self.context_item.as_ref()
    }
}

/// A single-pass deferred value. Reading it a second time re-evaluates the
/// expression.
pub struct Closure<N> {
    expression: Arc<dyn Expression<N>>,
    captured: CapturedContext<N>,
    depth: usize,
    read: AtomicBool,
}

impl<N: XdmNode> Closure<N> {
    pub fn new(expression: Arc<dyn Expression<N>>, captured: CapturedContext<N>, depth: usize) -> Self {
        Self {
            expression,
            captured,
            depth,
            read: AtomicBool::new(false),
        }
    }

    /// Builds the value of `expression` in `ctx` for a variable read about
    /// `ref_count` times.
    ///
    /// Expressions that depend on the focus position are evaluated now.
    /// Captured slots whose closure depth would exceed the context's limit
    /// are materialized first, and the frame is updated with the result.
    pub fn make(
        expression: Arc<dyn Expression<N>>,
        ctx: &mut DynamicContext<N>,
        ref_count: usize,
    ) -> Result<Value<N>, Error> {
        if expression.depends_on_focus_position() {
            tracing::trace!("focus-dependent expression evaluated eagerly");
            let items = expression.iterate(ctx)?.materialize()?;
            return Ok(Value::from_items(items));
        }

        let mut child_depth = 0;
        for &slot in expression.slots_used() {
            let Some(value) = ctx.slot(slot) else { continue };
            let depth = value.closure_depth();
            if depth >= ctx.max_closure_depth {
                tracing::debug!(slot, depth, "materializing deeply nested closure");
                let realized = value.materialize()?;
                ctx.set_slot(slot, realized);
            } else {
                child_depth = child_depth.max(depth);
            }
        }
        let depth = child_depth + 1;
        let captured = CapturedContext::capture(expression.as_ref(), ctx);
        let item_type = expression.item_type();

        let value = if !expression.cardinality().allows_many() {
            Value::Singleton(Arc::new(SingletonClosure::new(expression, captured, depth)))
        } else if ref_count > 1 {
            Value::Memo(Arc::new(MemoClosure::new(expression, captured, depth)))
        } else {
            Value::Closure(Arc::new(Closure::new(expression, captured, depth)))
        };
        tracing::trace!(depth, ref_count, ?item_type, "created closure");
        Ok(value)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn item_type(&self) -> ItemType {
        self.expression.item_type()
    }

    pub fn captured(&self) -> &CapturedContext<N> {
        &self.captured
    }

    fn mark_read(&self) {
        if self.read.swap(true, Ordering::AcqRel) {
            tracing::debug!(depth = self.depth, "single-read closure read again; re-evaluating");
        }
    }

    pub fn iterate(&self) -> Result<XdmSequenceStream<N>, Error> {
        self.mark_read();
        self.expression.iterate(&self.captured.to_dynamic_context())
    }

    /// Pushes the result into `out` without building an iterator.
    pub fn process(&self, out: &mut dyn Receiver<N>) -> Result<(), Error> {
        self.mark_read();
        self.expression.process(&self.captured.to_dynamic_context(), out)
    }

    pub fn materialize(&self) -> Result<Value<N>, Error> {
        Ok(Value::from_items(self.iterate()?.materialize()?))
    }
}

impl<N> fmt::Debug for Closure<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("expression", &self.expression)
            .field("depth", &self.depth)
            .field("read", &self.read.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
