//! Job status graph and the terminal/live report shape.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, ErrorKind};
use crate::metrics::MetricsSnapshot;
use crate::parameters::JobParameters;

/// The job lifecycle. Transitions are monotonic and follow exactly one path:
/// `Starting -> Started -> Stopping -> {Completed, Failed, Aborted}`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Listeners are being notified and resources are being opened.
    Starting,
    /// The read-process-write loop is running.
    Started,
    /// The loop has ended and resources are being closed.
    Stopping,
    /// Terminal: ran to completion with the error threshold never exceeded.
    Completed,
    /// Terminal: a fatal read error or a breached error threshold ended the run.
    Failed,
    /// Terminal: cooperative cancellation or a timeout ended the run early.
    Aborted,
}

impl JobStatus {
    /// Whether this status is one of the three terminal states.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Aborted)
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Starting,
            1 => Self::Started,
            2 => Self::Stopping,
            3 => Self::Completed,
            4 => Self::Failed,
            _ => Self::Aborted,
        }
    }

    fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Starting, Self::Started)
                | (Self::Started, Self::Stopping)
                | (Self::Stopping, Self::Completed)
                | (Self::Stopping, Self::Failed)
                | (Self::Stopping, Self::Aborted)
        )
    }
}

/// Atomic-backed holder of a [`JobStatus`], readable from a monitor without
/// locking.
#[derive(Debug)]
pub(crate) struct StatusCell(AtomicU8);

impl StatusCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(JobStatus::Starting as u8))
    }

    pub fn get(&self) -> JobStatus {
        JobStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn transition(&self, to: JobStatus) {
        let from = self.get();
        debug_assert!(
            from.can_transition_to(to),
            "illegal job status transition: {from:?} -> {to:?}"
        );
        self.0.store(to as u8, Ordering::Release);
    }
}

/// A condensed, cloneable record of an [`Error`] suitable for embedding in a
/// [`JobReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedError {
    /// The error's coarse category.
    pub kind: ReportedErrorKind,
    /// `Display` rendering of the original error.
    pub message: String,
}

/// Serializable mirror of [`ErrorKind`] (which itself carries no data worth
/// serializing beyond its discriminant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportedErrorKind {
    /// See [`ErrorKind::OpenReader`].
    OpenReader,
    /// See [`ErrorKind::OpenWriter`].
    OpenWriter,
    /// See [`ErrorKind::Read`].
    Read,
    /// See [`ErrorKind::Validation`].
    Validation,
    /// See [`ErrorKind::Processing`].
    Processing,
    /// See [`ErrorKind::Write`].
    Write,
    /// See [`ErrorKind::Close`].
    Close,
    /// See [`ErrorKind::Listener`].
    Listener,
    /// See [`ErrorKind::Threshold`].
    Threshold,
    /// See [`ErrorKind::IllegalState`].
    IllegalState,
    /// See [`ErrorKind::InvalidParameters`].
    InvalidParameters,
}

impl From<&Error> for ReportedError {
    fn from(error: &Error) -> Self {
        let kind = match error.kind() {
            ErrorKind::OpenReader => ReportedErrorKind::OpenReader,
            ErrorKind::OpenWriter => ReportedErrorKind::OpenWriter,
            ErrorKind::Read => ReportedErrorKind::Read,
            ErrorKind::Validation => ReportedErrorKind::Validation,
            ErrorKind::Processing => ReportedErrorKind::Processing,
            ErrorKind::Write => ReportedErrorKind::Write,
            ErrorKind::Close => ReportedErrorKind::Close,
            ErrorKind::Listener => ReportedErrorKind::Listener,
            ErrorKind::Threshold => ReportedErrorKind::Threshold,
            ErrorKind::IllegalState => ReportedErrorKind::IllegalState,
            ErrorKind::InvalidParameters => ReportedErrorKind::InvalidParameters,
        };
        Self { kind, message: error.to_string() }
    }
}

/// Immutable snapshot of a job: a live view while the job is running, and
/// the permanent record of it once the job reaches a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    /// Uniquely identifies this particular run of a [`crate::job::Job`].
    pub execution_id: Uuid,
    /// The parameters the job was built with.
    pub parameters: JobParameters,
    /// Counters and timestamps as of this snapshot.
    pub metrics: MetricsSnapshot,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// The most recent error recorded against this run, if any.
    pub last_error: Option<ReportedError>,
    /// Caller-supplied key/value metadata carried through unchanged.
    pub system_properties: HashMap<String, String>,
}

impl JobReport {
    /// Renders a short, human-readable summary: the kind of thing worth
    /// logging at job completion or printing from a CLI.
    pub fn to_text(&self) -> String {
        let duration = self
            .metrics
            .duration()
            .map(|d| format!("{:.3}s", d.as_secs_f64()))
            .unwrap_or_else(|| "unknown".to_string());
        let mut text = format!(
            "job '{}' [{}] status={:?} read={} written={} filtered={} errors={} duration={}",
            self.parameters.name,
            self.execution_id,
            self.status,
            self.metrics.read_count,
            self.metrics.write_count,
            self.metrics.filtered_count,
            self.metrics.error_count,
            duration,
        );
        if let Some(err) = &self.last_error {
            text.push_str(&format!(" last_error={:?}:{}", err.kind, err.message));
        }
        text
    }
}
