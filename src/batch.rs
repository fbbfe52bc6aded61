//! Accumulates pipeline survivors into fixed-size batches for the writer.

use crate::record::Record;

/// A bounded run of records awaiting a single write call.
///
/// Grounded on the chunk-accumulation loop of a step executor: records are
/// pushed one at a time as they survive the pipeline, and the accumulator
/// reports when it has reached capacity so the runner can flush.
pub struct BatchAccumulator<T> {
    capacity: usize,
    items: Vec<Record<T>>,
}

impl<T> BatchAccumulator<T> {
    /// Creates an empty batch with room for `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, items: Vec::with_capacity(capacity) }
    }

    /// Appends a survivor. Returns `true` once the batch has reached its
    /// configured capacity, signaling the caller to flush.
    pub fn push(&mut self, record: Record<T>) -> bool {
        self.items.push(record);
        self.items.len() >= self.capacity
    }

    /// Whether the batch currently holds no records.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of records currently accumulated.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Drains the accumulated records, leaving an empty batch behind.
    pub fn take(&mut self) -> Vec<Record<T>> {
        std::mem::take(&mut self.items)
    }

    /// Discards the accumulated records without handing them to a writer.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_reports_when_full() {
        let mut batch = BatchAccumulator::new(2);
        assert!(!batch.push(Record::new(1, "t", "a")));
        assert!(batch.push(Record::new(2, "t", "b")));
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn take_drains_and_resets() {
        let mut batch = BatchAccumulator::new(10);
        batch.push(Record::new(1, "t", 1));
        batch.push(Record::new(2, "t", 2));
        let drained = batch.take();
        assert_eq!(drained.len(), 2);
        assert!(batch.is_empty());
    }

    #[test]
    fn clear_discards_without_draining() {
        let mut batch = BatchAccumulator::new(10);
        batch.push(Record::new(1, "t", 1));
        batch.clear();
        assert!(batch.is_empty());
    }
}
