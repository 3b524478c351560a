pub mod consts;
pub mod engine;
pub mod model;
pub mod sequence;
pub mod util;
pub mod xdm;

pub use engine::runtime::{
    ConversionResult, DynamicContext, DynamicContextBuilder, Error, ErrorCode, ValidationFailure,
};
pub use model::XdmNode;
pub use sequence::{
    Closure, Expression, IntegerRange, MemoClosure, SequenceCursor, SequenceExtent, SingletonClosure, Value,
    XdmSequenceStream,
};
pub use xdm::{AtomicType, ExpandedName, ItemType, XdmAtomicValue, XdmItem};
