//! # hotclass
//!
//! Decision core for JVM agents that instrument classes once the JIT shows
//! them to be hot.
//!
//! The runtime reports two kinds of events from many threads at once:
//! "method was JIT-compiled" and "class is about to load". This crate decides,
//! for every class/method pair, whether instrumentation should be triggered,
//! and guarantees it is triggered at most once:
//!
//! 1. A compiled-method event passes the [`NameFilter`] (runtime-internal
//!    classes are skipped), the [`WorkerNameLedger`] (classes the rewrite
//!    engine generated itself are skipped) and the [`SeenClassIndex`]
//!    (each pair is selected once).
//! 2. A newly selected pair causes a retransformation request for its class.
//! 3. The runtime redelivers the class through the load hook, where the
//!    external [`RewriteEngine`] rewrites it with a hint naming the method.
//! 4. At session end the [`ShutdownSweeper`] deletes generated worker files.
//!
//! The crate contains no FFI. A host adapter implements [`Runtime`] on top of
//! its JVMTI environment and forwards callbacks to a [`Session`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                Host adapter (JVMTI callbacks)            │
//! ├─────────────────────────────────────────────────────────┤
//! │   Session: event dispatch, fatal-error policy            │
//! ├─────────────────────────────────────────────────────────┤
//! │   TriggerCoordinator: state machine + coordination lock  │
//! │     NameFilter · SeenClassIndex · WorkerNameLedger       │
//! ├─────────────────────────────────────────────────────────┤
//! │   Runtime trait         RewriteEngine trait              │
//! │   ShutdownSweeper       classfile pre-check              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use hotclass::prelude::*;
//!
//! let config = AgentConfig::from_options("verbose,exclude=com/acme/generated")?;
//! let session = Session::start(config, runtime, engine)?;
//!
//! // CompiledMethodLoad
//! session.method_compiled(&method);
//!
//! // ClassFileLoadHook
//! if let Some(new_bytes) = session.class_file_load(Some("com/acme/App"), &class_data) {
//!     // hand new_bytes to the runtime
//! }
//!
//! // VMDeath
//! let report = session.session_end();
//! ```
//!
//! ## Logging
//!
//! Diagnostics are emitted through [`tracing`]. The host installs the
//! subscriber.

pub mod classfile;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod filter;
pub mod ledger;
pub mod names;
pub mod prelude;
pub mod rewrite;
pub mod runtime;
pub mod seen;
pub mod session;
pub mod sweeper;

mod registry;

pub use crate::config::AgentConfig;
pub use crate::coordinator::{CompileOutcome, CoordinatorStats, LoadOutcome, TriggerCoordinator, TriggerState};
pub use crate::error::{AgentError, Result};
pub use crate::filter::NameFilter;
pub use crate::ledger::WorkerNameLedger;
pub use crate::names::{CandidateKey, ClassName, MethodName};
pub use crate::rewrite::{CorrelationHint, RewriteEngine, RewriteError, RewriteResult};
pub use crate::runtime::{EventKind, MethodMetadata, Runtime, RuntimeError};
pub use crate::seen::SeenClassIndex;
pub use crate::session::{Event, Session};
pub use crate::sweeper::{ShutdownSweeper, SweepReport};
