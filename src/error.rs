//! Error taxonomy for the engine.
//!
//! Mirrors the error-kind table of the design: one variant per external
//! contract failure site, classified via [`Error::kind`] so callers can
//! switch on category without matching every variant.

use thiserror::Error as ThisError;

/// Coarse classification of an [`Error`], matching the engine's error-kind
/// table one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reader failed to open.
    OpenReader,
    /// Writer failed to open.
    OpenWriter,
    /// Reader failed mid-stream.
    Read,
    /// A validator rejected a record.
    Validation,
    /// A processor failed on a record.
    Processing,
    /// Writer failed to flush a batch.
    Write,
    /// Reader or writer failed to close (never fatal).
    Close,
    /// A listener hook failed or panicked.
    Listener,
    /// The error threshold was exceeded.
    Threshold,
    /// A job instance was run more than once.
    IllegalState,
    /// Job parameters failed validation at build time.
    InvalidParameters,
}

/// Enum capturing every failure mode the engine can report.
///
/// Uses `thiserror` for ergonomic error handling, matching the error
/// taxonomy of the teacher crate this engine descends from: one variant per
/// failure site, with the underlying cause folded into a message string
/// since external readers/writers are not assumed to share an error type
/// with the engine.
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    /// Reader failed to open.
    #[error("failed to open reader: {0}")]
    OpenReader(String),

    /// Writer failed to open.
    #[error("failed to open writer: {0}")]
    OpenWriter(String),

    /// Reader failed mid-stream.
    #[error("failed to read record: {0}")]
    Read(String),

    /// A validator rejected a record.
    #[error("record validation failed: {0}")]
    Validation(String),

    /// A processor failed on a record.
    #[error("record processing failed: {0}")]
    Processing(String),

    /// Writer failed to flush a batch.
    #[error("failed to write batch: {0}")]
    Write(String),

    /// Reader or writer failed to close; never fatal to the run.
    #[error("failed to close resource: {0}")]
    Close(String),

    /// A listener hook failed or panicked.
    #[error("listener hook failed: {0}")]
    Listener(String),

    /// errorCount exceeded the configured threshold.
    #[error("error threshold exceeded")]
    ThresholdExceeded,

    /// The job instance has already been run once.
    #[error("job instance has already been executed")]
    AlreadyUsed,

    /// Job parameters failed validation (batch size of 0, threshold of 0, ...).
    #[error("invalid job parameters: {0}")]
    InvalidParameters(String),
}

impl Error {
    /// Classifies this error per the engine's error-kind table.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OpenReader(_) => ErrorKind::OpenReader,
            Error::OpenWriter(_) => ErrorKind::OpenWriter,
            Error::Read(_) => ErrorKind::Read,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Processing(_) => ErrorKind::Processing,
            Error::Write(_) => ErrorKind::Write,
            Error::Close(_) => ErrorKind::Close,
            Error::Listener(_) => ErrorKind::Listener,
            Error::ThresholdExceeded => ErrorKind::Threshold,
            Error::AlreadyUsed => ErrorKind::IllegalState,
            Error::InvalidParameters(_) => ErrorKind::InvalidParameters,
        }
    }
}

/// Extracts a human-readable message from a caught panic payload.
///
/// Used at the job runner boundary, which is the only layer that catches
/// unexpected panics from third-party readers, writers, processors, and
/// listeners and maps them into the engine's own error type.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_classification_is_stable() {
        assert_eq!(Error::OpenReader("x".into()).kind(), ErrorKind::OpenReader);
        assert_eq!(Error::Write("x".into()).kind(), ErrorKind::Write);
        assert_eq!(Error::ThresholdExceeded.kind(), ErrorKind::Threshold);
        assert_eq!(Error::AlreadyUsed.kind(), ErrorKind::IllegalState);
    }

    #[test]
    fn panic_message_extracts_str_and_string() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("also boom"));
        assert_eq!(panic_message(boxed.as_ref()), "also boom");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(42i32);
        assert_eq!(panic_message(boxed.as_ref()), "panicked with a non-string payload");
    }
}
