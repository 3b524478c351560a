use crate::engine::runtime::{ConversionResult, ErrorCode, ValidationFailure};
use crate::util::names::{is_ncname, split_qname};
use crate::util::whitespace::trim_xml_whitespace;
use crate::xdm::ExpandedName;
use core::fmt;
use core::hash::{Hash, Hasher};
use string_cache::DefaultAtom;

/// `xs:QName`. The prefix is kept only for redisplay: equality and hashing
/// use the namespace URI and local name.
#[derive(Debug, Clone)]
pub struct QNameValue {
    prefix: Option<DefaultAtom>,
    ns_uri: Option<DefaultAtom>,
    local: DefaultAtom,
}

impl QNameValue {
    /// Builds a QName from its parts. An empty namespace means "no namespace";
    /// a prefix without a namespace is rejected with `FOCA0002`.
    pub fn new(prefix: Option<&str>, ns_uri: Option<&str>, local: &str) -> ConversionResult<Self> {
        if !is_ncname(local) {
            return Err(ValidationFailure::invalid(format!("\"{local}\" is not a valid local name")));
        }
        let prefix = prefix.filter(|p| !p.is_empty());
        if let Some(p) = prefix
            && !is_ncname(p)
        {
            return Err(ValidationFailure::invalid(format!("\"{p}\" is not a valid prefix")));
        }
        let ns_uri = ns_uri.filter(|u| !u.is_empty());
        if prefix.is_some() && ns_uri.is_none() {
            return Err(ValidationFailure::new(
                ErrorCode::FOCA0002,
                format!("prefix \"{}\" requires a namespace URI", prefix.unwrap_or_default()),
            ));
        }
        Ok(Self {
            prefix: prefix.map(DefaultAtom::from),
            ns_uri: ns_uri.map(DefaultAtom::from),
            local: DefaultAtom::from(local),
        })
    }

    /// Parses `prefix:local` or `local`, resolving the prefix with `resolve`.
    /// An unprefixed name takes `resolve("")`, the default namespace.
    pub fn from_lexical<F>(lexical: &str, resolve: F) -> ConversionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let s = trim_xml_whitespace(lexical);
        let (prefix, local) =
            split_qname(s).ok_or_else(|| ValidationFailure::invalid(format!("\"{s}\" is not a valid QName")))?;
        match prefix {
            Some(p) => {
                let uri = resolve(p).ok_or_else(|| {
                    ValidationFailure::new(ErrorCode::FOCA0002, format!("namespace prefix \"{p}\" is not declared"))
                })?;
                Self::new(Some(p), Some(&uri), local)
            }
            None => Self::new(None, resolve("").as_deref(), local),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.ns_uri.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// `Q{uri}local`, or just the local name outside any namespace.
    pub fn clark_name(&self) -> String {
        match &self.ns_uri {
            Some(uri) => format!("Q{{{uri}}}{}", self.local),
            None => self.local.to_string(),
        }
    }
}

impl From<&QNameValue> for ExpandedName {
    fn from(q: &QNameValue) -> Self {
        ExpandedName::new(q.namespace_uri().map(str::to_string), q.local_name())
    }
}

impl PartialEq for QNameValue {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.ns_uri == other.ns_uri
    }
}

impl Eq for QNameValue {}

impl Hash for QNameValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.local.hash(state);
        self.ns_uri.hash(state);
    }
}

impl fmt::Display for QNameValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{p}:{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}
