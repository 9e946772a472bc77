//! Identifiers observed from the runtime.
//!
//! Class names are kept in the runtime's internal form (`com/acme/App`).
//! The runtime reports declaring classes of compiled methods as type
//! signatures (`Lcom/acme/App;`); [`ClassName::from_signature`] converts
//! those so compile and load events agree on one identity.

use std::fmt;
use std::sync::Arc;

/// A class name in internal form. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassName(Arc<str>);

impl ClassName {
    pub fn new(name: impl AsRef<str>) -> Self {
        ClassName(Arc::from(name.as_ref()))
    }

    /// Builds a class name from a type signature such as `Lcom/acme/App;`.
    ///
    /// Anything that is not an object signature is kept verbatim.
    pub fn from_signature(signature: &str) -> Self {
        let inner = signature
            .strip_prefix('L')
            .and_then(|s| s.strip_suffix(';'))
            .unwrap_or(signature);
        ClassName::new(inner)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassName {
    fn from(s: &str) -> Self {
        ClassName::new(s)
    }
}

impl From<String> for ClassName {
    fn from(s: String) -> Self {
        ClassName(Arc::from(s))
    }
}

/// A method name. Only meaningful next to its [`ClassName`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodName(Arc<str>);

impl MethodName {
    pub fn new(name: impl AsRef<str>) -> Self {
        MethodName(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MethodName {
    fn from(s: &str) -> Self {
        MethodName::new(s)
    }
}

impl From<String> for MethodName {
    fn from(s: String) -> Self {
        MethodName(Arc::from(s))
    }
}

/// Dedup identity of a class/method pair.
///
/// Kept as a pair rather than a concatenated string so `("Ab", "c")` and
/// `("A", "bc")` stay distinct. `Display` renders the concatenation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    class: ClassName,
    method: MethodName,
}

impl CandidateKey {
    pub fn new(class: impl Into<ClassName>, method: impl Into<MethodName>) -> Self {
        CandidateKey { class: class.into(), method: method.into() }
    }

    pub fn class(&self) -> &ClassName {
        &self.class
    }

    pub fn method(&self) -> &MethodName {
        &self.method
    }
}

impl fmt::Display for CandidateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class, self.method)
    }
}
