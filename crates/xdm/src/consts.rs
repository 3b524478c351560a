/// Namespace URI used for W3C-defined XPath/XQuery error codes (xqt-errors).
pub const ERR_NS: &str = "http://www.w3.org/2005/xqt-errors";

/// XML Schema namespace, home of the built-in atomic types.
pub const XS_NS: &str = "http://www.w3.org/2001/XMLSchema";
