//! Logging sink abstraction for the flint engine.
//!
//! Rendering code reports progress and failures through the [`LogSink`]
//! capability instead of a concrete logger. Applications install a single
//! `tracing` subscriber and hand the GPU layer a [`TracingSink`]; tests
//! substitute a recording sink to observe what was reported.

use tracing::{error, info};

/// Message sink used by the GPU layer.
///
/// Three channels cover the severities rendering code distinguishes:
/// routine progress, recoverable errors, and failures that end the run.
/// Sinks may be shared across threads.
pub trait LogSink: Send + Sync {
    /// Report routine progress.
    fn info(&self, message: &str);

    /// Report a recoverable error.
    fn error(&self, message: &str);

    /// Report a failure the caller is not expected to recover from.
    fn fatal(&self, message: &str);
}

/// Sink that forwards every channel to the `tracing` dispatcher.
///
/// `tracing` has no level above error, so fatal messages are emitted at
/// error level with a `fatal` field set. Timestamps and formatting belong
/// to whichever subscriber the application installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        info!("{message}");
    }

    fn error(&self, message: &str) {
        error!("{message}");
    }

    fn fatal(&self, message: &str) {
        error!(fatal = true, "{message}");
    }
}
