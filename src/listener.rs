//! Observation hooks and their ordered composition.
//!
//! Each listener kind gets a trait with defaulted no-op methods (so callers
//! only implement the hooks they care about) and a chain type that fires
//! "before" hooks in registration order and "after"/"exception" hooks in
//! reverse, the same nesting discipline as the job runner's other
//! before/after pairs.

use std::sync::Arc;

use crate::error::Error;
use crate::parameters::JobParameters;
use crate::record::Record;
use crate::report::JobReport;

/// Observes the whole job lifecycle.
pub trait JobListener: Send + Sync {
    /// Fired once, right after the job transitions to STARTING.
    fn before_job_start(&self, _parameters: &JobParameters) {}
    /// Fired once, right before `run` returns its report.
    fn after_job_end(&self, _report: &JobReport) {}
}

/// Observes batch boundaries: accumulation start and flush outcome.
pub trait BatchListener<T>: Send + Sync {
    /// Fired at the start of every read attempt, before the reader is asked
    /// for a record.
    fn before_batch_reading(&self) {}
    /// Fired once a batch has been assembled, before it is handed to the
    /// writer.
    fn after_batch_processing(&self, _batch: &[Record<T>]) {}
    /// Fired after a batch has been written successfully.
    fn after_batch_writing(&self, _batch: &[Record<T>]) {}
    /// Fired when writing a batch fails.
    fn on_batch_writing_exception(&self, _batch: &[Record<T>], _error: &Error) {}
}

/// Observes individual reads.
pub trait RecordReaderListener<T>: Send + Sync {
    /// Fired before each call to the reader.
    fn before_record_reading(&self) {}
    /// Fired after a record is successfully read.
    fn after_record_reading(&self, _record: &Record<T>) {}
    /// Fired when reading fails.
    fn on_record_reading_exception(&self, _error: &Error) {}
}

/// Observes a record's trip through the pipeline. Unlike the other listener
/// kinds, the "before" hook can itself transform or drop the record, and can
/// fail -- a failure here counts as a processing error just like a failing
/// validator or processor.
pub trait PipelineListener<T>: Send + Sync {
    /// Runs before the pipeline's own stages. Returning `Ok(None)` drops the
    /// record; returning `Err` reports a processing error for it.
    fn before_record_processing(&self, record: Record<T>) -> Result<Option<Record<T>>, Error> {
        Ok(Some(record))
    }
    /// Fired once a record survives the whole pipeline.
    fn after_record_processing(&self, _input: &Record<T>, _output: &Record<T>) {}
    /// Fired when the pipeline (or this listener's own `before` hook)
    /// reports an error for this record.
    fn on_record_processing_exception(&self, _input: &Record<T>, _error: &Error) {}
}

/// Observes individual writes within a batch write call.
pub trait RecordWriterListener<T>: Send + Sync {
    /// Fired before a batch is handed to the writer.
    fn before_record_writing(&self, _batch: &[Record<T>]) {}
    /// Fired after the writer accepts the batch.
    fn after_record_writing(&self, _batch: &[Record<T>]) {}
    /// Fired when the writer rejects the batch.
    fn on_record_writing_exception(&self, _batch: &[Record<T>], _error: &Error) {}
}

/// Ordered, fire-forward / unwind-backward composition of [`JobListener`]s.
#[derive(Default)]
pub struct JobListenerChain(Vec<Arc<dyn JobListener>>);

impl JobListenerChain {
    pub(crate) fn new(listeners: Vec<Arc<dyn JobListener>>) -> Self {
        Self(listeners)
    }

    pub(crate) fn before_job_start(&self, parameters: &JobParameters) {
        for listener in &self.0 {
            listener.before_job_start(parameters);
        }
    }

    pub(crate) fn after_job_end(&self, report: &JobReport) {
        for listener in self.0.iter().rev() {
            listener.after_job_end(report);
        }
    }
}

/// Ordered composition of [`BatchListener`]s.
pub struct BatchListenerChain<T>(Vec<Arc<dyn BatchListener<T>>>);

impl<T> Default for BatchListenerChain<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> BatchListenerChain<T> {
    pub(crate) fn new(listeners: Vec<Arc<dyn BatchListener<T>>>) -> Self {
        Self(listeners)
    }

    pub(crate) fn before_batch_reading(&self) {
        for listener in &self.0 {
            listener.before_batch_reading();
        }
    }

    pub(crate) fn after_batch_processing(&self, batch: &[Record<T>]) {
        for listener in self.0.iter().rev() {
            listener.after_batch_processing(batch);
        }
    }

    pub(crate) fn after_batch_writing(&self, batch: &[Record<T>]) {
        for listener in self.0.iter().rev() {
            listener.after_batch_writing(batch);
        }
    }

    pub(crate) fn on_batch_writing_exception(&self, batch: &[Record<T>], error: &Error) {
        for listener in self.0.iter().rev() {
            listener.on_batch_writing_exception(batch, error);
        }
    }
}

/// Ordered composition of [`RecordReaderListener`]s.
pub struct RecordReaderListenerChain<T>(Vec<Arc<dyn RecordReaderListener<T>>>);

impl<T> Default for RecordReaderListenerChain<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> RecordReaderListenerChain<T> {
    pub(crate) fn new(listeners: Vec<Arc<dyn RecordReaderListener<T>>>) -> Self {
        Self(listeners)
    }

    pub(crate) fn before_record_reading(&self) {
        for listener in &self.0 {
            listener.before_record_reading();
        }
    }

    pub(crate) fn after_record_reading(&self, record: &Record<T>) {
        for listener in self.0.iter().rev() {
            listener.after_record_reading(record);
        }
    }

    pub(crate) fn on_record_reading_exception(&self, error: &Error) {
        for listener in self.0.iter().rev() {
            listener.on_record_reading_exception(error);
        }
    }
}

/// Ordered composition of [`PipelineListener`]s.
pub struct PipelineListenerChain<T>(Vec<Arc<dyn PipelineListener<T>>>);

impl<T> Default for PipelineListenerChain<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> PipelineListenerChain<T> {
    pub(crate) fn new(listeners: Vec<Arc<dyn PipelineListener<T>>>) -> Self {
        Self(listeners)
    }

    /// Threads `record` through each listener's `before_record_processing`
    /// in registration order, stopping early on a drop or a failure.
    pub(crate) fn before_record_processing(
        &self,
        mut record: Record<T>,
    ) -> Result<Option<Record<T>>, Error> {
        for listener in &self.0 {
            match listener.before_record_processing(record)? {
                Some(next) => record = next,
                None => return Ok(None),
            }
        }
        Ok(Some(record))
    }

    pub(crate) fn after_record_processing(&self, input: &Record<T>, output: &Record<T>) {
        for listener in self.0.iter().rev() {
            listener.after_record_processing(input, output);
        }
    }

    pub(crate) fn on_record_processing_exception(&self, input: &Record<T>, error: &Error) {
        for listener in self.0.iter().rev() {
            listener.on_record_processing_exception(input, error);
        }
    }
}

/// Ordered composition of [`RecordWriterListener`]s.
pub struct RecordWriterListenerChain<T>(Vec<Arc<dyn RecordWriterListener<T>>>);

impl<T> Default for RecordWriterListenerChain<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> RecordWriterListenerChain<T> {
    pub(crate) fn new(listeners: Vec<Arc<dyn RecordWriterListener<T>>>) -> Self {
        Self(listeners)
    }

    pub(crate) fn before_record_writing(&self, batch: &[Record<T>]) {
        for listener in &self.0 {
            listener.before_record_writing(batch);
        }
    }

    pub(crate) fn after_record_writing(&self, batch: &[Record<T>]) {
        for listener in self.0.iter().rev() {
            listener.after_record_writing(batch);
        }
    }

    pub(crate) fn on_record_writing_exception(&self, batch: &[Record<T>], error: &Error) {
        for listener in self.0.iter().rev() {
            listener.on_record_writing_exception(batch, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<&'static str>>);

    impl JobListener for Recorder {
        fn before_job_start(&self, _parameters: &JobParameters) {
            self.0.lock().unwrap().push("before");
        }
        fn after_job_end(&self, _report: &JobReport) {
            self.0.lock().unwrap().push("after");
        }
    }

    #[test]
    fn job_listener_chain_fires_in_order() {
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let chain = JobListenerChain::new(vec![a.clone(), b.clone()]);

        chain.before_job_start(&JobParameters::default());
        assert_eq!(*a.0.lock().unwrap(), vec!["before"]);
        assert_eq!(*b.0.lock().unwrap(), vec!["before"]);
    }

    struct DropEveryOther;
    impl PipelineListener<i32> for DropEveryOther {
        fn before_record_processing(&self, record: Record<i32>) -> Result<Option<Record<i32>>, Error> {
            if record.payload % 2 == 0 {
                Ok(Some(record))
            } else {
                Ok(None)
            }
        }
    }

    #[test]
    fn pipeline_listener_chain_can_drop_a_record() {
        let chain = PipelineListenerChain::new(vec![Arc::new(DropEveryOther)]);
        assert!(chain.before_record_processing(Record::new(1, "t", 2)).unwrap().is_some());
        assert!(chain.before_record_processing(Record::new(2, "t", 3)).unwrap().is_none());
    }

    struct AlwaysFails;
    impl PipelineListener<i32> for AlwaysFails {
        fn before_record_processing(&self, _record: Record<i32>) -> Result<Option<Record<i32>>, Error> {
            Err(Error::Listener("nope".into()))
        }
    }

    #[test]
    fn pipeline_listener_chain_propagates_errors() {
        let chain = PipelineListenerChain::new(vec![Arc::new(AlwaysFails)]);
        let result = chain.before_record_processing(Record::new(1, "t", 1));
        assert!(result.is_err());
    }
}
