//! The unit of work flowing through a pipeline.

use std::time::SystemTime;

/// Metadata carried alongside a record's payload.
///
/// `sequence_number` is assigned by the reader and is stable for the
/// lifetime of the record as it flows through filters, validators and
/// processors; it is what listeners and error reports use to identify which
/// input a failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    /// Monotonic position of this record within the run, assigned by the
    /// reader.
    pub sequence_number: u64,
    /// Free-form origin tag (file path, partition id, ...); the engine never
    /// interprets it.
    pub source: String,
    /// When the reader produced this record.
    pub created_at: SystemTime,
}

/// A single unit of work. The payload type `T` is opaque to the engine: it
/// is never inspected, only moved between reader, pipeline stages and
/// writer.
#[derive(Debug, Clone)]
pub struct Record<T> {
    /// Engine-assigned metadata.
    pub header: RecordHeader,
    /// The caller-defined payload.
    pub payload: T,
}

impl<T> Record<T> {
    /// Builds a record with a freshly stamped `created_at`.
    pub fn new(sequence_number: u64, source: impl Into<String>, payload: T) -> Self {
        Self {
            header: RecordHeader {
                sequence_number,
                source: source.into(),
                created_at: SystemTime::now(),
            },
            payload,
        }
    }

    /// Replaces the payload, keeping the header (and thus the sequence
    /// number) intact. Used by processors that transform rather than
    /// replace a record outright.
    pub fn with_payload<U>(self, payload: U) -> Record<U> {
        Record { header: self.header, payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stamps_header_fields() {
        let r = Record::new(7, "test-source", "hello");
        assert_eq!(r.header.sequence_number, 7);
        assert_eq!(r.header.source, "test-source");
        assert_eq!(r.payload, "hello");
    }

    #[test]
    fn with_payload_preserves_header() {
        let r = Record::new(3, "src", 1i32);
        let mapped = r.with_payload("one");
        assert_eq!(mapped.header.sequence_number, 3);
        assert_eq!(mapped.payload, "one");
    }
}
