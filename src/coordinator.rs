//! The two-phase trigger state machine.
//!
//! ```text
//!   compiled(C, m) ──filter──dedup──▶ retransform(C)   [Idle → CompileObserved]
//!                                          │
//!   load(C, bytes) ◀───────────────────────┘
//!        └─▶ rewrite(bytes, hint(C, m)) ─▶ new bytes    [→ LoadHandled → Idle]
//! ```
//!
//! All mutable state sits behind one lock, the coordination lock, held for
//! the whole of each event. Retransformation is requested before the lock is
//! released, so the compile decision for a class happens-before the load hook
//! it provokes. The rewrite engine runs under the lock as well, which
//! serializes rewriting across classes.
//!
//! The lock is reentrant. HotSpot delivers the load hook for a retransformed
//! class synchronously, on the thread inside `RetransformClasses`, so the
//! hook re-enters the coordinator while the compile event still holds the
//! lock. The state borrow is released around the request for that reason.
//!
//! A compile decision is correlated with its load event through a pending
//! map keyed by class name, so unrelated classes do not interfere.

use std::cell::RefCell;
use std::collections::HashMap;

use parking_lot::ReentrantMutex;
use tracing::{debug, info, trace, warn};

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::filter::NameFilter;
use crate::ledger::WorkerNameLedger;
use crate::names::{CandidateKey, ClassName};
use crate::rewrite::{CorrelationHint, RewriteEngine, RewriteResult};
use crate::runtime::{MethodMetadata, Runtime, CLASS_PATH_PROPERTY, LIBRARY_PATH_PROPERTY};
use crate::seen::SeenClassIndex;
use crate::sweeper::{ShutdownSweeper, SweepReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    /// No retransformation outstanding.
    Idle,
    /// At least one class has a retransformation request outstanding.
    CompileObserved,
    /// A load hook consumed its request. Settles to `Idle` or
    /// `CompileObserved` before the lock is released.
    LoadHandled,
    /// Session shutdown began; no new triggers are accepted.
    Draining,
}

/// What a compiled-method event led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    /// Newly selected; retransformation was requested.
    Triggered(CandidateKey),
    /// Newly selected, but retransformation is disabled by configuration.
    Recorded(CandidateKey),
    Filtered,
    WorkerArtifact,
    AlreadySeen,
    Draining,
}

/// What the load hook hands back to the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    PassThrough,
    /// Replacement class body. Ownership moves to the runtime.
    Replaced(Vec<u8>),
}

impl LoadOutcome {
    /// Replacement bytes, or `None` for a pass-through.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            LoadOutcome::PassThrough => None,
            LoadOutcome::Replaced(bytes) => Some(bytes),
        }
    }

    /// `true` if the class body was replaced.
    pub fn is_replaced(&self) -> bool {
        matches!(self, LoadOutcome::Replaced(_))
    }
}

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub compile_events: u64,
    pub filtered: u64,
    pub worker_suppressed: u64,
    pub duplicates: u64,
    pub selected: u64,
    pub retransforms_requested: u64,
    pub rejected_invalid: u64,
    pub rewrites_applied: u64,
    pub rewrites_unchanged: u64,
    pub rewrite_failures: u64,
    pub workers_registered: u64,
}

struct CoordinatorState {
    state: TriggerState,
    seen: SeenClassIndex,
    workers: WorkerNameLedger,
    pending: HashMap<ClassName, CandidateKey>,
    stats: CoordinatorStats,
}

impl CoordinatorState {
    fn transition(&mut self, next: TriggerState) {
        if self.state != next {
            trace!(from = ?self.state, to = ?next, "trigger state");
            self.state = next;
        }
    }

    fn settle(&mut self) {
        let next = if self.pending.is_empty() { TriggerState::Idle } else { TriggerState::CompileObserved };
        self.transition(next);
    }
}

/// Receives runtime events and decides what gets instrumented.
///
/// Owns the seen index, the worker ledger and the trigger state for one
/// session. Every `on_*` method is safe to call concurrently from any number
/// of runtime threads, and [`on_class_file_load`](Self::on_class_file_load)
/// may be re-entered from inside [`Runtime::request_retransform`].
pub struct TriggerCoordinator<R: Runtime, E: RewriteEngine> {
    runtime: R,
    engine: E,
    filter: NameFilter,
    config: AgentConfig,
    inner: ReentrantMutex<RefCell<CoordinatorState>>,
}

impl<R: Runtime, E: RewriteEngine> TriggerCoordinator<R, E> {
    pub fn new(config: AgentConfig, runtime: R, engine: E) -> Result<Self, AgentError> {
        config.validate()?;
        let inner = CoordinatorState {
            state: TriggerState::Idle,
            seen: SeenClassIndex::with_capacity(config.seen_capacity),
            workers: WorkerNameLedger::with_capacity(config.worker_capacity),
            pending: HashMap::new(),
            stats: CoordinatorStats::default(),
        };
        Ok(TriggerCoordinator {
            runtime,
            engine,
            filter: config.name_filter(),
            config,
            inner: ReentrantMutex::new(RefCell::new(inner)),
        })
    }

    /// The runtime collaborator this coordinator drives.
    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Configuration the coordinator was built with.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Filter built from the configured patterns.
    pub fn filter(&self) -> &NameFilter {
        &self.filter
    }

    /// Session start needs no work: a fresh coordinator is already idle.
    pub fn on_session_start(&self) {
        trace!(state = ?self.state(), "session start");
    }

    /// Handles a compiled-method notification.
    ///
    /// Errors are fatal: metadata that cannot be resolved, a refused
    /// retransformation, or a full seen index.
    pub fn on_method_compiled(&self, method: &R::Method) -> Result<CompileOutcome, AgentError> {
        let guard = self.inner.lock();
        if guard.borrow().state == TriggerState::Draining {
            return Ok(CompileOutcome::Draining);
        }
        let metadata = self.runtime.resolve_method_metadata(method).map_err(AgentError::MetadataResolution)?;
        self.select(&guard, metadata)
    }

    /// Same as [`on_method_compiled`](Self::on_method_compiled) for a host
    /// that already resolved the method.
    pub fn on_method_resolved(&self, metadata: MethodMetadata<R::Class>) -> Result<CompileOutcome, AgentError> {
        let guard = self.inner.lock();
        if guard.borrow().state == TriggerState::Draining {
            return Ok(CompileOutcome::Draining);
        }
        self.select(&guard, metadata)
    }

    /// Runs with the coordination lock held. The state borrow ends before
    /// the retransform request so a nested load hook can take it.
    fn select(
        &self,
        cell: &RefCell<CoordinatorState>,
        metadata: MethodMetadata<R::Class>,
    ) -> Result<CompileOutcome, AgentError> {
        let mut inner = cell.borrow_mut();
        inner.stats.compile_events += 1;
        let class = ClassName::from_signature(metadata.class_name.as_str());
        let method = metadata.method_name;

        if !self.filter.is_candidate_class(&class) {
            inner.stats.filtered += 1;
            if self.config.verbose_logging {
                debug!(%class, %method, "compiled method filtered");
            } else {
                trace!(%class, %method, "compiled method filtered");
            }
            return Ok(CompileOutcome::Filtered);
        }
        if inner.workers.is_worker_artifact(&class) {
            inner.stats.worker_suppressed += 1;
            debug!(%class, %method, "compiled method belongs to a generated worker");
            return Ok(CompileOutcome::WorkerArtifact);
        }

        let key = CandidateKey::new(class.clone(), method);
        if !inner.seen.record_if_absent(key.clone())? {
            inner.stats.duplicates += 1;
            trace!(%key, "already selected");
            return Ok(CompileOutcome::AlreadySeen);
        }
        inner.stats.selected += 1;

        if !self.config.enable_retransform {
            info!(%class, method = %key.method(), "selected, retransformation disabled");
            return Ok(CompileOutcome::Recorded(key));
        }

        if self.config.verbose_logging {
            info!(%class, method = %key.method(), signature = %metadata.signature, "selected for instrumentation");
        } else {
            info!(%class, method = %key.method(), "selected for instrumentation");
        }

        // Recorded before the request: the load hook may run inside it, on
        // this thread, or later on another thread waiting for this lock.
        inner.pending.insert(class, key.clone());
        inner.transition(TriggerState::CompileObserved);
        drop(inner);

        let requested = self.runtime.request_retransform(&metadata.class);

        let mut inner = cell.borrow_mut();
        if let Err(e) = requested {
            inner.pending.remove(key.class());
            inner.settle();
            return Err(AgentError::Runtime(e));
        }
        inner.stats.retransforms_requested += 1;

        Ok(CompileOutcome::Triggered(key))
    }

    /// Handles the class-file load hook for `name` (null names arrive as `None`).
    ///
    /// Rewrite engine failures are logged and produce
    /// [`LoadOutcome::PassThrough`]. The only error is a full worker ledger,
    /// which is fatal.
    pub fn on_class_file_load(&self, name: Option<&str>, class_bytes: &[u8]) -> Result<LoadOutcome, AgentError> {
        let Some(name) = name else {
            return Ok(LoadOutcome::PassThrough);
        };
        let guard = self.inner.lock();
        let mut inner = guard.borrow_mut();
        if inner.state == TriggerState::Draining {
            return Ok(LoadOutcome::PassThrough);
        }

        let class = ClassName::new(name);
        if !self.filter.is_candidate_class(&class) {
            return Ok(LoadOutcome::PassThrough);
        }
        let Some(key) = inner.pending.remove(&class) else {
            trace!(%class, "load without pending request");
            return Ok(LoadOutcome::PassThrough);
        };

        let outcome = self.rewrite_locked(&mut inner, &class, &key, class_bytes);
        inner.transition(TriggerState::LoadHandled);
        inner.settle();
        outcome
    }

    fn rewrite_locked(
        &self,
        inner: &mut CoordinatorState,
        class: &ClassName,
        key: &CandidateKey,
        class_bytes: &[u8],
    ) -> Result<LoadOutcome, AgentError> {
        if !self.engine.accepts(class_bytes) {
            inner.stats.rejected_invalid += 1;
            warn!(%class, len = class_bytes.len(), "class bytes failed structural check, not rewriting");
            return Ok(LoadOutcome::PassThrough);
        }

        let hint = CorrelationHint {
            class_name: key.class().clone(),
            method_name: key.method().clone(),
            class_path: self.runtime.system_property(CLASS_PATH_PROPERTY),
            library_path: self.runtime.system_property(LIBRARY_PATH_PROPERTY),
        };
        if self.config.verbose_logging {
            debug!(%class, ?hint, len = class_bytes.len(), "invoking rewrite engine");
        }

        match self.engine.rewrite(class_bytes, &hint) {
            Ok(RewriteResult::Unchanged) => {
                inner.stats.rewrites_unchanged += 1;
                debug!(%class, "rewrite engine left class unchanged");
                Ok(LoadOutcome::PassThrough)
            }
            Ok(RewriteResult::Instrumented { bytes, workers }) => {
                for worker in workers {
                    if inner.workers.register_if_absent(worker.clone())? {
                        inner.stats.workers_registered += 1;
                        debug!(%class, %worker, "registered generated worker");
                    }
                }
                inner.stats.rewrites_applied += 1;
                if self.config.verbose_logging {
                    info!(%class, method = %key.method(), before = class_bytes.len(), after = bytes.len(), "class rewritten");
                } else {
                    info!(%class, method = %key.method(), "class rewritten");
                }
                Ok(LoadOutcome::Replaced(bytes))
            }
            Err(e) => {
                inner.stats.rewrite_failures += 1;
                let err = AgentError::RewriteEngine { class: class.to_string(), message: e.to_string() };
                warn!("{err}");
                Ok(LoadOutcome::PassThrough)
            }
        }
    }

    /// Ends the session: stop admitting triggers, drop outstanding
    /// correlations, then delete every generated worker file.
    ///
    /// Calling it again is a no-op returning an empty report.
    pub fn on_session_end(&self) -> SweepReport {
        let (workers, stats) = {
            let guard = self.inner.lock();
            let mut inner = guard.borrow_mut();
            if inner.state == TriggerState::Draining {
                return SweepReport::default();
            }
            inner.transition(TriggerState::Draining);
            inner.pending.clear();
            (inner.workers.entries().to_vec(), inner.stats)
        };

        info!(
            selected = stats.selected,
            retransforms = stats.retransforms_requested,
            rewrites = stats.rewrites_applied,
            rewrite_failures = stats.rewrite_failures,
            workers = workers.len(),
            "session draining"
        );

        ShutdownSweeper::resolve(&self.config, &self.runtime).sweep_names(&workers)
    }

    /// Current phase of the trigger state machine.
    pub fn state(&self) -> TriggerState {
        self.inner.lock().borrow().state
    }

    /// Snapshot of the session counters.
    pub fn stats(&self) -> CoordinatorStats {
        self.inner.lock().borrow().stats
    }

    /// Every selected class/method pair, in selection order.
    pub fn seen_keys(&self) -> Vec<CandidateKey> {
        self.inner.lock().borrow().seen.entries().to_vec()
    }

    /// Worker classes registered so far, in registration order.
    pub fn worker_names(&self) -> Vec<ClassName> {
        self.inner.lock().borrow().workers.entries().to_vec()
    }

    /// Method whose selection is waiting for `class` to pass the load hook.
    pub fn pending_for(&self, class: &ClassName) -> Option<CandidateKey> {
        self.inner.lock().borrow().pending.get(class).cloned()
    }
}
