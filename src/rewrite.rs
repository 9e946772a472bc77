//! Interface to the external bytecode rewrite engine.
//!
//! The engine is opaque: class bytes and a correlation hint go in, and either
//! "unchanged" or new bytes plus the names of any worker classes it generated
//! come out.

use crate::classfile;
use crate::names::{ClassName, MethodName};

/// Tells the engine which compiled method caused this rewrite and where
/// generated worker files may be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationHint {
    pub class_name: ClassName,
    pub method_name: MethodName,
    pub class_path: Option<String>,
    pub library_path: Option<String>,
}

impl CorrelationHint {
    pub fn new(class_name: impl Into<ClassName>, method_name: impl Into<MethodName>) -> Self {
        CorrelationHint {
            class_name: class_name.into(),
            method_name: method_name.into(),
            class_path: None,
            library_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteResult {
    Unchanged,
    Instrumented {
        bytes: Vec<u8>,
        /// Worker classes generated alongside, by name.
        workers: Vec<ClassName>,
    },
}

/// An engine-side failure for one class. Never fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RewriteError(pub String);

pub trait RewriteEngine: Send + Sync {
    /// Rewrites `class_bytes` for the method named in `hint`.
    fn rewrite(&self, class_bytes: &[u8], hint: &CorrelationHint) -> Result<RewriteResult, RewriteError>;

    /// Structural pre-check run before [`rewrite`](Self::rewrite).
    ///
    /// Defaults to walking the class header and constant pool.
    fn accepts(&self, class_bytes: &[u8]) -> bool {
        classfile::is_structurally_valid(class_bytes)
    }
}

impl<E: RewriteEngine + ?Sized> RewriteEngine for &E {
    fn rewrite(&self, class_bytes: &[u8], hint: &CorrelationHint) -> Result<RewriteResult, RewriteError> {
        (**self).rewrite(class_bytes, hint)
    }

    fn accepts(&self, class_bytes: &[u8]) -> bool {
        (**self).accepts(class_bytes)
    }
}

impl<E: RewriteEngine + ?Sized> RewriteEngine for Box<E> {
    fn rewrite(&self, class_bytes: &[u8], hint: &CorrelationHint) -> Result<RewriteResult, RewriteError> {
        (**self).rewrite(class_bytes, hint)
    }

    fn accepts(&self, class_bytes: &[u8]) -> bool {
        (**self).accepts(class_bytes)
    }
}

impl<E: RewriteEngine + ?Sized> RewriteEngine for std::sync::Arc<E> {
    fn rewrite(&self, class_bytes: &[u8], hint: &CorrelationHint) -> Result<RewriteResult, RewriteError> {
        (**self).rewrite(class_bytes, hint)
    }

    fn accepts(&self, class_bytes: &[u8]) -> bool {
        (**self).accepts(class_bytes)
    }
}
