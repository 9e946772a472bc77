//! Blocklist of runtime-internal class names.

use crate::names::ClassName;

/// Patterns excluded when no `exclude=` options are given.
pub const DEFAULT_PATTERNS: &[&str] = &["java", "jdk", "javax", "sun", "org/eclipse/jdt/internal"];

/// Classifies class names as infrastructure or instrumentation candidates.
///
/// A name is excluded if it contains any pattern as a substring. The set is
/// fixed at construction, so a `NameFilter` can be shared between threads
/// without locking.
#[derive(Debug, Clone)]
pub struct NameFilter {
    patterns: Box<[String]>,
}

impl NameFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = patterns
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| !p.is_empty())
            .collect();
        NameFilter { patterns }
    }

    /// Returns `false` for infrastructure classes, `true` for everything else.
    pub fn is_candidate(&self, name: &str) -> bool {
        !self.patterns.iter().any(|p| name.contains(p.as_str()))
    }

    pub fn is_candidate_class(&self, name: &ClassName) -> bool {
        self.is_candidate(name.as_str())
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for NameFilter {
    fn default() -> Self {
        NameFilter::new(DEFAULT_PATTERNS.iter().copied())
    }
}
