//! The external write contract.

use crate::error::Error;
use crate::record::Record;

/// Consumes a whole batch of survivors at once.
///
/// Implementors are shared references, same caveat as [`crate::reader::RecordReader`]:
/// the engine never mutates a writer directly.
pub trait RecordWriter<T>: Send + Sync {
    /// Called once before the first batch is written. The default is a
    /// no-op.
    fn open(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Writes an entire batch or fails it entirely; there is no partial
    /// success.
    fn write_records(&self, batch: &[Record<T>]) -> Result<(), Error>;

    /// Called once after the last batch, success or failure. A failure here
    /// is logged but never changes the job's terminal status. The default
    /// is a no-op.
    fn close(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// The writer installed by [`crate::builder::JobBuilder`] when none is
/// configured: accepts and discards every batch.
pub struct NoopWriter;

impl<T: Send + Sync> RecordWriter<T> for NoopWriter {
    fn write_records(&self, _batch: &[Record<T>]) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_writer_accepts_any_batch() {
        let writer = NoopWriter;
        let batch = vec![Record::new(1, "t", 1), Record::new(2, "t", 2)];
        assert!(writer.write_records(&batch).is_ok());
    }
}
