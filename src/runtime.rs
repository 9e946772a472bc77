//! What the core needs from the managed runtime.
//!
//! The host adapter implements [`Runtime`] on top of its JVMTI environment
//! (or a test double). Handles are opaque to the core; it only passes them
//! back to the runtime.

use std::fmt;

use thiserror::Error;

use crate::names::{ClassName, MethodName};

/// Events the core subscribes to at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A method was compiled by the JIT.
    MethodCompiled,
    /// A class is about to be loaded or retransformed.
    ClassFileLoad,
    /// The runtime finished initialising.
    SessionStart,
    /// The runtime is terminating.
    SessionEnd,
}

impl EventKind {
    pub const ALL: [EventKind; 4] =
        [EventKind::MethodCompiled, EventKind::ClassFileLoad, EventKind::SessionStart, EventKind::SessionEnd];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::MethodCompiled => "method-compiled",
            EventKind::ClassFileLoad => "class-file-load",
            EventKind::SessionStart => "session-start",
            EventKind::SessionEnd => "session-end",
        };
        f.write_str(name)
    }
}

/// A failure reported by the runtime, e.g. a JVMTI error name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuntimeError {
    message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        RuntimeError { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Resolved description of a compiled method.
#[derive(Debug, Clone)]
pub struct MethodMetadata<C> {
    /// Handle of the declaring class, used for the retransform request.
    pub class: C,
    pub class_name: ClassName,
    pub method_name: MethodName,
    pub signature: String,
}

/// The runtime collaborator.
///
/// Every method may be called from any runtime thread, some while the
/// coordination lock is held.
pub trait Runtime: Send + Sync {
    /// Class handle (`jclass` in a JVMTI host).
    type Class: Send;
    /// Method handle (`jmethodID` in a JVMTI host).
    type Method: Send;

    /// Enables delivery of `kind` events to the core.
    fn subscribe(&self, kind: EventKind) -> Result<(), RuntimeError>;

    /// Asks the runtime to push `class` through the load hook again.
    ///
    /// The hook may run before this returns, on the calling thread, as
    /// JVMTI `RetransformClasses` does; the coordinator's lock is reentrant
    /// for that case.
    fn request_retransform(&self, class: &Self::Class) -> Result<(), RuntimeError>;

    /// Resolves the declaring class, name and signature of `method`.
    fn resolve_method_metadata(&self, method: &Self::Method) -> Result<MethodMetadata<Self::Class>, RuntimeError>;

    /// Reads a runtime system property such as `java.class.path`.
    fn system_property(&self, key: &str) -> Option<String>;
}

/// Property naming the application class path.
pub const CLASS_PATH_PROPERTY: &str = "java.class.path";
/// Property naming the native library path.
pub const LIBRARY_PATH_PROPERTY: &str = "java.library.path";

impl<R: Runtime + ?Sized> Runtime for &R {
    type Class = R::Class;
    type Method = R::Method;

    fn subscribe(&self, kind: EventKind) -> Result<(), RuntimeError> {
        (**self).subscribe(kind)
    }

    fn request_retransform(&self, class: &Self::Class) -> Result<(), RuntimeError> {
        (**self).request_retransform(class)
    }

    fn resolve_method_metadata(&self, method: &Self::Method) -> Result<MethodMetadata<Self::Class>, RuntimeError> {
        (**self).resolve_method_metadata(method)
    }

    fn system_property(&self, key: &str) -> Option<String> {
        (**self).system_property(key)
    }
}

impl<R: Runtime + ?Sized> Runtime for std::sync::Arc<R> {
    type Class = R::Class;
    type Method = R::Method;

    fn subscribe(&self, kind: EventKind) -> Result<(), RuntimeError> {
        (**self).subscribe(kind)
    }

    fn request_retransform(&self, class: &Self::Class) -> Result<(), RuntimeError> {
        (**self).request_retransform(class)
    }

    fn resolve_method_metadata(&self, method: &Self::Method) -> Result<MethodMetadata<Self::Class>, RuntimeError> {
        (**self).resolve_method_metadata(method)
    }

    fn system_property(&self, key: &str) -> Option<String> {
        (**self).system_property(key)
    }
}
