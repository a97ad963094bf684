//! Cooperative cancellation and progress reporting for long scans.
//!
//! Scans (statistics, sort-key extraction, condition evaluation, stratified
//! partitioning) block the calling thread and poll a [`CancellationToken`]
//! at row granularity. A cancelled scan discards its partial result.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ScanConfig;
use crate::error::{Error, Result};

/// Shared stop flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that every scan polling this token stops.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Clear a previous request so the token can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// Result of a scan that treats cancellation as an ordinary outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The scan finished and its result was published.
    Completed,
    /// The scan observed cancellation; nothing was published.
    Cancelled,
}

impl ScanOutcome {
    pub fn is_completed(self) -> bool {
        self == ScanOutcome::Completed
    }
}

/// Per-scan handle bundling the token, polling cadence and an optional
/// progress callback receiving `(completed, total)`.
pub struct ScanMonitor<'a> {
    token: CancellationToken,
    config: ScanConfig,
    progress: Option<Box<dyn FnMut(usize, usize) + 'a>>,
}

impl<'a> ScanMonitor<'a> {
    /// A monitor whose token is never cancelled by anyone else.
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    pub fn with_token(token: CancellationToken) -> Self {
        ScanMonitor {
            token,
            config: ScanConfig::default(),
            progress: None,
        }
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Install a progress callback.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(usize, usize) + 'a,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Record that `completed` of `total` units are done.
    ///
    /// Returns [`Error::Stopped`] when the token is set at a polling point.
    pub fn checkpoint(&mut self, completed: usize, total: usize) -> Result<()> {
        let check_interval = self.config.check_interval.max(1);
        if completed % check_interval == 0 && self.token.is_cancelled() {
            return Err(Error::Stopped);
        }
        let progress_interval = self.config.progress_interval;
        if progress_interval > 0 && completed % progress_interval == 0 {
            if let Some(callback) = self.progress.as_mut() {
                callback(completed, total);
            }
        }
        Ok(())
    }

    /// Report completion of a phase regardless of the progress interval.
    pub fn finish(&mut self, total: usize) {
        if let Some(callback) = self.progress.as_mut() {
            callback(total, total);
        }
    }
}

impl Default for ScanMonitor<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScanMonitor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanMonitor")
            .field("token", &self.token)
            .field("config", &self.config)
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}
