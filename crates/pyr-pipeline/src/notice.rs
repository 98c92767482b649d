//! Categorized degradation notices.
//!
//! A stage never fails because of a device problem; operators learn about
//! degradation solely through notices. Categories are distinct so "GPU not
//! attempted because unprofitable" can be told apart from "GPU not attempted
//! because unavailable".

use std::sync::Mutex;

use tracing::{error, warn};

/// Notice severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational degradation (expected conditions).
    Warning,
    /// Unexpected failure that was recovered by fallback.
    Error,
}

/// Why a stage degraded to CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeCategory {
    /// Structural policy: device use is known to be unprofitable.
    GpuUnprofitable,
    /// No usable compute context exists.
    ContextNotCreated,
    /// Device filter graph construction failed.
    ConstructionFailed,
    /// Device input preparation (allocation/upload) failed.
    InputPreparationFailed,
    /// Device execution failed after the stage committed to the device path.
    ExecutionFailed,
}

/// One emitted notice.
#[derive(Debug, Clone)]
pub struct Notice {
    /// Severity tag.
    pub severity: Severity,
    /// Degradation category.
    pub category: NoticeCategory,
    /// Human-readable message.
    pub message: String,
}

/// Fire-and-forget notice consumer.
pub trait NoticeSink: Send + Sync {
    /// Accept one notice. No acknowledgment.
    fn notify(&self, notice: Notice);
}

/// Default sink: forwards to `tracing` at the matching level.
#[derive(Debug, Default)]
pub struct TracingSink;

impl NoticeSink for TracingSink {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Warning => {
                warn!(category = ?notice.category, "{}", notice.message);
            }
            Severity::Error => {
                error!(category = ?notice.category, "{}", notice.message);
            }
        }
    }
}

/// Sink that records every notice, for assertions.
#[derive(Debug, Default)]
pub struct CollectingSink {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingSink {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far.
    pub fn all(&self) -> Vec<Notice> {
        self.notices.lock().expect("notice mutex poisoned").clone()
    }

    /// Drain the collected notices.
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().expect("notice mutex poisoned"))
    }

    /// Number of notices received.
    pub fn len(&self) -> usize {
        self.notices.lock().expect("notice mutex poisoned").len()
    }

    /// Whether no notices were received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NoticeSink for CollectingSink {
    fn notify(&self, notice: Notice) {
        self.notices.lock().expect("notice mutex poisoned").push(notice);
    }
}
