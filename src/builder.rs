//! Fluent construction of a [`Job`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Error;
use crate::job::Job;
use crate::listener::{
    BatchListener, BatchListenerChain, JobListener, JobListenerChain, PipelineListener,
    PipelineListenerChain, RecordReaderListener, RecordReaderListenerChain, RecordWriterListener,
    RecordWriterListenerChain,
};
use crate::monitor::{InMemoryRegistry, ManagementRegistry};
use crate::parameters::JobParameters;
use crate::pipeline::{Pipeline, RecordFilter, RecordProcessor, RecordValidator, Stage};
use crate::reader::{NoopReader, RecordReader};
use crate::writer::{NoopWriter, RecordWriter};

/// Chainable builder for a [`Job`].
///
/// Each of `filter`/`validator`/`processor` appends to the same ordered
/// stage list, in call order, so interleaving them produces a pipeline that
/// runs its stages in exactly the order they were registered.
pub struct JobBuilder<T> {
    name: Option<String>,
    batch_size: Option<usize>,
    error_threshold: Option<u64>,
    timeout: Option<Duration>,
    jmx_enabled: bool,
    reader: Option<Arc<dyn RecordReader<T>>>,
    writer: Option<Arc<dyn RecordWriter<T>>>,
    stages: Vec<Stage<T>>,
    job_listeners: Vec<Arc<dyn JobListener>>,
    batch_listeners: Vec<Arc<dyn BatchListener<T>>>,
    reader_listeners: Vec<Arc<dyn RecordReaderListener<T>>>,
    pipeline_listeners: Vec<Arc<dyn PipelineListener<T>>>,
    writer_listeners: Vec<Arc<dyn RecordWriterListener<T>>>,
    registry: Option<Arc<dyn ManagementRegistry>>,
    system_properties: HashMap<String, String>,
}

impl<T> Default for JobBuilder<T> {
    fn default() -> Self {
        Self {
            name: None,
            batch_size: None,
            error_threshold: None,
            timeout: None,
            jmx_enabled: false,
            reader: None,
            writer: None,
            stages: Vec::new(),
            job_listeners: Vec::new(),
            batch_listeners: Vec::new(),
            reader_listeners: Vec::new(),
            pipeline_listeners: Vec::new(),
            writer_listeners: Vec::new(),
            registry: None,
            system_properties: HashMap::new(),
        }
    }
}

impl<T> JobBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Starts a fresh builder with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the job's name, used in logs, reports, and management names.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets how many survivors to accumulate before flushing to the writer.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Sets the maximum `errorCount` tolerated before the run aborts as
    /// FAILED.
    pub fn error_threshold(mut self, threshold: u64) -> Self {
        self.error_threshold = Some(threshold);
        self
    }

    /// Sets a wall-clock budget for the whole run; exceeding it requests a
    /// cooperative stop, surfacing as status ABORTED.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enables registering a [`crate::monitor::Monitor`] for this job under
    /// the configured [`crate::monitor::ManagementRegistry`].
    pub fn jmx(mut self, enabled: bool) -> Self {
        self.jmx_enabled = enabled;
        self
    }

    /// Sets the reader. If never called, the job reads an immediately empty
    /// stream.
    pub fn reader(mut self, reader: impl RecordReader<T> + 'static) -> Self {
        self.reader = Some(Arc::new(reader));
        self
    }

    /// Sets the writer. If never called, the job discards every batch.
    pub fn writer(mut self, writer: impl RecordWriter<T> + 'static) -> Self {
        self.writer = Some(Arc::new(writer));
        self
    }

    /// Appends a filter stage to the pipeline.
    pub fn filter(mut self, filter: impl RecordFilter<T> + 'static) -> Self {
        self.stages.push(Stage::Filter(Box::new(filter)));
        self
    }

    /// Appends a validator stage to the pipeline.
    pub fn validator(mut self, validator: impl RecordValidator<T> + 'static) -> Self {
        self.stages.push(Stage::Validator(Box::new(validator)));
        self
    }

    /// Appends a processor stage to the pipeline.
    pub fn processor(mut self, processor: impl RecordProcessor<T> + 'static) -> Self {
        self.stages.push(Stage::Processor(Box::new(processor)));
        self
    }

    /// Registers a [`JobListener`].
    pub fn job_listener(mut self, listener: impl JobListener + 'static) -> Self {
        self.job_listeners.push(Arc::new(listener));
        self
    }

    /// Registers a [`BatchListener`].
    pub fn batch_listener(mut self, listener: impl BatchListener<T> + 'static) -> Self {
        self.batch_listeners.push(Arc::new(listener));
        self
    }

    /// Registers a [`RecordReaderListener`].
    pub fn reader_listener(mut self, listener: impl RecordReaderListener<T> + 'static) -> Self {
        self.reader_listeners.push(Arc::new(listener));
        self
    }

    /// Registers a [`PipelineListener`].
    pub fn pipeline_listener(mut self, listener: impl PipelineListener<T> + 'static) -> Self {
        self.pipeline_listeners.push(Arc::new(listener));
        self
    }

    /// Registers a [`RecordWriterListener`].
    pub fn writer_listener(mut self, listener: impl RecordWriterListener<T> + 'static) -> Self {
        self.writer_listeners.push(Arc::new(listener));
        self
    }

    /// Overrides the default in-memory [`ManagementRegistry`].
    pub fn registry(mut self, registry: impl ManagementRegistry + 'static) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Attaches a caller-defined key/value pair carried through to the
    /// report unchanged.
    pub fn system_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.system_properties.insert(key.into(), value.into());
        self
    }

    /// Finalizes the builder into a runnable [`Job`].
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameters`] if the assembled parameters fail
    /// validation (a batch size or error threshold of zero).
    pub fn build(self) -> Result<Job<T>, Error> {
        let parameters = JobParameters {
            name: self.name.unwrap_or_else(|| "job".to_string()),
            batch_size: self.batch_size.unwrap_or(100),
            error_threshold: self.error_threshold.unwrap_or(u64::MAX),
            timeout: self.timeout,
            jmx_enabled: self.jmx_enabled,
        };

        Job::new(
            parameters,
            self.reader.unwrap_or_else(|| Arc::new(NoopReader)),
            self.writer.unwrap_or_else(|| Arc::new(NoopWriter)),
            Pipeline::new(self.stages),
            JobListenerChain::new(self.job_listeners),
            BatchListenerChain::new(self.batch_listeners),
            RecordReaderListenerChain::new(self.reader_listeners),
            PipelineListenerChain::new(self.pipeline_listeners),
            RecordWriterListenerChain::new(self.writer_listeners),
            self.registry.unwrap_or_else(|| Arc::new(InMemoryRegistry::default())),
            self.system_properties,
        )
    }
}
