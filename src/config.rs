//! Agent configuration, resolved once when the session is created.
//!
//! The host passes the option string that followed `=` in
//! `-agentpath:libagent.so=<options>`:
//!
//! ```text
//! retransform=on,verbose,exclude=com/acme/generated,seen_capacity=5000
//! ```

use std::path::PathBuf;

use crate::error::AgentError;
use crate::filter::{NameFilter, DEFAULT_PATTERNS};
use crate::ledger::DEFAULT_WORKER_CAPACITY;
use crate::seen::DEFAULT_SEEN_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Request retransformation for newly selected methods. When off, events
    /// are still filtered and recorded but nothing is rewritten.
    pub enable_retransform: bool,
    pub verbose_logging: bool,
    pub filter_patterns: Vec<String>,
    pub seen_capacity: usize,
    pub worker_capacity: usize,
    /// Where generated worker files live. Unset means the first entry of
    /// `java.class.path`.
    pub artifact_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            enable_retransform: true,
            verbose_logging: false,
            filter_patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            seen_capacity: DEFAULT_SEEN_CAPACITY,
            worker_capacity: DEFAULT_WORKER_CAPACITY,
            artifact_dir: None,
        }
    }
}

impl AgentConfig {
    /// Parses a comma-separated agent option string.
    ///
    /// `exclude=` entries are added to the default patterns.
    pub fn from_options(options: &str) -> Result<Self, AgentError> {
        let mut config = AgentConfig::default();

        for item in options.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = match item.split_once('=') {
                Some((k, v)) => (k.trim(), Some(v.trim())),
                None => (item, None),
            };
            match key {
                "retransform" => config.enable_retransform = parse_switch(key, value)?,
                "verbose" => config.verbose_logging = parse_switch(key, value)?,
                "exclude" => match value {
                    Some(pattern) if !pattern.is_empty() => config.filter_patterns.push(pattern.to_string()),
                    _ => return Err(AgentError::Configuration("exclude needs a pattern".into())),
                },
                "seen_capacity" => config.seen_capacity = parse_capacity(key, value)?,
                "worker_capacity" => config.worker_capacity = parse_capacity(key, value)?,
                "artifact_dir" => match value {
                    Some(dir) if !dir.is_empty() => config.artifact_dir = Some(PathBuf::from(dir)),
                    _ => return Err(AgentError::Configuration("artifact_dir needs a path".into())),
                },
                other => return Err(AgentError::Configuration(format!("unknown option `{other}`"))),
            }
        }

        Ok(config)
    }

    pub fn with_retransform(mut self, enabled: bool) -> Self {
        self.enable_retransform = enabled;
        self
    }

    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    /// Replaces the filter pattern set.
    pub fn with_filter_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_seen_capacity(mut self, capacity: usize) -> Self {
        self.seen_capacity = capacity;
        self
    }

    pub fn with_worker_capacity(mut self, capacity: usize) -> Self {
        self.worker_capacity = capacity;
        self
    }

    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    pub fn name_filter(&self) -> NameFilter {
        NameFilter::new(self.filter_patterns.iter().cloned())
    }

    pub(crate) fn validate(&self) -> Result<(), AgentError> {
        if self.seen_capacity == 0 || self.worker_capacity == 0 {
            return Err(AgentError::Configuration("table capacities must be non-zero".into()));
        }
        Ok(())
    }
}

fn parse_switch(key: &str, value: Option<&str>) -> Result<bool, AgentError> {
    match value {
        None | Some("on") | Some("true") | Some("1") => Ok(true),
        Some("off") | Some("false") | Some("0") => Ok(false),
        Some(other) => Err(AgentError::Configuration(format!("{key}: expected on/off, got `{other}`"))),
    }
}

fn parse_capacity(key: &str, value: Option<&str>) -> Result<usize, AgentError> {
    let raw = value.ok_or_else(|| AgentError::Configuration(format!("{key} needs a value")))?;
    match raw.parse::<usize>() {
        Ok(0) => Err(AgentError::Configuration(format!("{key} must be non-zero"))),
        Ok(n) => Ok(n),
        Err(e) => Err(AgentError::Configuration(format!("{key}: {e}"))),
    }
}
