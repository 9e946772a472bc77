//! Event entry points for the host adapter.
//!
//! A host (typically a JVMTI agent library) creates one [`Session`] when it
//! is loaded and forwards each runtime callback to it. The session owns the
//! [`TriggerCoordinator`] and applies the error policy: fatal errors go to
//! the fatal handler, recoverable ones are logged and the event passes
//! through.
//!
//! ```rust,ignore
//! let config = AgentConfig::from_options(options)?;
//! let session = Session::start(config, JvmtiRuntime::new(env), MyEngine::default())?;
//!
//! // ClassFileLoadHook
//! if let Some(bytes) = session.class_file_load(name, class_data) {
//!     // copy into runtime-allocated memory and set new_class_data
//! }
//! ```

use std::fmt;

use tracing::{error, warn};

use crate::config::AgentConfig;
use crate::coordinator::{CompileOutcome, LoadOutcome, TriggerCoordinator};
use crate::error::AgentError;
use crate::rewrite::RewriteEngine;
use crate::runtime::{EventKind, Runtime};
use crate::sweeper::SweepReport;

/// Exit status used when a fatal error ends the process.
pub const FATAL_EXIT_CODE: i32 = 3;

/// Called with every fatal error. The default exits the process.
pub type FatalHandler = Box<dyn Fn(&AgentError) + Send + Sync>;

/// Default fatal policy: partial instrumentation state is not safe to
/// continue from, so the process ends. The session has already logged `err`.
pub fn exit_on_fatal(_err: &AgentError) {
    std::process::exit(FATAL_EXIT_CODE);
}

/// One runtime event, for hosts that prefer a single dispatch point.
pub enum Event<'a, M> {
    SessionStart,
    MethodCompiled(&'a M),
    ClassFileLoad { name: Option<&'a str>, class_bytes: &'a [u8] },
    SessionEnd,
}

impl<M> fmt::Debug for Event<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::SessionStart => f.write_str("SessionStart"),
            Event::MethodCompiled(_) => f.write_str("MethodCompiled"),
            Event::ClassFileLoad { name, class_bytes } => f
                .debug_struct("ClassFileLoad")
                .field("name", name)
                .field("len", &class_bytes.len())
                .finish(),
            Event::SessionEnd => f.write_str("SessionEnd"),
        }
    }
}

pub struct Session<R: Runtime, E: RewriteEngine> {
    coordinator: TriggerCoordinator<R, E>,
    on_fatal: FatalHandler,
}

impl<R: Runtime, E: RewriteEngine> Session<R, E> {
    /// Validates `config` and subscribes to every event the core handles.
    ///
    /// Any failure here is a [`AgentError::Configuration`]; nothing has been
    /// processed yet, so the host should refuse to load.
    pub fn start(config: AgentConfig, runtime: R, engine: E) -> Result<Self, AgentError> {
        let coordinator = TriggerCoordinator::new(config, runtime, engine)?;
        for kind in EventKind::ALL {
            coordinator
                .runtime()
                .subscribe(kind)
                .map_err(|e| AgentError::Configuration(format!("cannot subscribe to {kind} events: {e}")))?;
        }
        Ok(Session { coordinator, on_fatal: Box::new(exit_on_fatal) })
    }

    /// Replaces the fatal handler.
    pub fn with_fatal_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&AgentError) + Send + Sync + 'static,
    {
        self.on_fatal = Box::new(handler);
        self
    }

    pub fn coordinator(&self) -> &TriggerCoordinator<R, E> {
        &self.coordinator
    }

    pub fn session_start(&self) {
        self.coordinator.on_session_start();
    }

    pub fn method_compiled(&self, method: &R::Method) -> Option<CompileOutcome> {
        match self.coordinator.on_method_compiled(method) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }

    /// Returns replacement bytes, or `None` to load the class unmodified.
    pub fn class_file_load(&self, name: Option<&str>, class_bytes: &[u8]) -> Option<Vec<u8>> {
        match self.coordinator.on_class_file_load(name, class_bytes) {
            Ok(LoadOutcome::Replaced(bytes)) => Some(bytes),
            Ok(LoadOutcome::PassThrough) => None,
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }

    pub fn session_end(&self) -> SweepReport {
        self.coordinator.on_session_end()
    }

    /// Routes `event` to its handler. Only class-file loads produce bytes.
    pub fn dispatch(&self, event: Event<'_, R::Method>) -> Option<Vec<u8>> {
        match event {
            Event::SessionStart => self.session_start(),
            Event::MethodCompiled(method) => {
                self.method_compiled(method);
            }
            Event::ClassFileLoad { name, class_bytes } => return self.class_file_load(name, class_bytes),
            Event::SessionEnd => {
                self.session_end();
            }
        }
        None
    }

    fn fail(&self, err: AgentError) {
        if err.is_fatal() {
            error!("fatal: {err}");
            (self.on_fatal)(&err);
        } else {
            warn!("{err}");
        }
    }
}
