use crate::xdm::XdmAtomicValue;

/// Node references supplied by the host tree model.
///
/// The value engine treats nodes as opaque: it only needs their string value
/// and, for atomization, their typed value.
pub trait XdmNode: Clone + Eq + core::fmt::Debug + Send + Sync + 'static {
    fn string_value(&self) -> String;

    /// Untyped by default.
    fn typed_value(&self) -> Vec<XdmAtomicValue> {
        vec![XdmAtomicValue::untyped(self.string_value())]
    }
}
