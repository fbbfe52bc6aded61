//! The job runner: open, read-process-write loop, close, finalize.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::batch::BatchAccumulator;
use crate::error::{panic_message, Error};
use crate::listener::{
    BatchListenerChain, JobListenerChain, PipelineListenerChain, RecordReaderListenerChain,
    RecordWriterListenerChain,
};
use crate::metrics::JobMetrics;
use crate::monitor::{ManagementRegistry, Monitor};
use crate::parameters::JobParameters;
use crate::pipeline::{Pipeline, PipelineOutcome};
use crate::reader::RecordReader;
use crate::record::Record;
use crate::report::{JobReport, JobStatus, ReportedError, StatusCell};
use crate::writer::RecordWriter;

/// Runs a listener hook, catching and logging any panic rather than letting
/// it unwind into the job runner's own control flow. This is the only layer
/// that catches panics from third-party components.
fn catch<F>(hook: &'static str, f: F)
where
    F: FnOnce() + std::panic::UnwindSafe,
{
    if let Err(payload) = std::panic::catch_unwind(f) {
        warn!(hook, error = %panic_message(payload.as_ref()), "listener hook panicked; ignoring");
    }
}

/// A single, single-use batch processing run: a reader, a pipeline, a
/// writer, and the listeners watching all three.
///
/// Built exclusively through [`crate::builder::JobBuilder`]. Components are
/// shared references (`Arc`); the job never mutates them, only calls their
/// trait methods, so a reader or writer may safely be reused across several
/// job instances.
pub struct Job<T> {
    used: AtomicBool,
    execution_id: Uuid,
    parameters: JobParameters,
    reader: Arc<dyn RecordReader<T>>,
    writer: Arc<dyn RecordWriter<T>>,
    pipeline: Pipeline<T>,
    job_listeners: JobListenerChain,
    batch_listeners: BatchListenerChain<T>,
    reader_listeners: RecordReaderListenerChain<T>,
    pipeline_listeners: PipelineListenerChain<T>,
    writer_listeners: RecordWriterListenerChain<T>,
    registry: Arc<dyn ManagementRegistry>,
    metrics: Arc<JobMetrics>,
    status: Arc<StatusCell>,
    last_error: Arc<Mutex<Option<ReportedError>>>,
    system_properties: HashMap<String, String>,
    stop_requested: Arc<AtomicBool>,
    write_failed: AtomicBool,
}

impl<T> Job<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        parameters: JobParameters,
        reader: Arc<dyn RecordReader<T>>,
        writer: Arc<dyn RecordWriter<T>>,
        pipeline: Pipeline<T>,
        job_listeners: JobListenerChain,
        batch_listeners: BatchListenerChain<T>,
        reader_listeners: RecordReaderListenerChain<T>,
        pipeline_listeners: PipelineListenerChain<T>,
        writer_listeners: RecordWriterListenerChain<T>,
        registry: Arc<dyn ManagementRegistry>,
        system_properties: HashMap<String, String>,
    ) -> Result<Self, Error> {
        parameters.validate()?;
        Ok(Self {
            used: AtomicBool::new(false),
            execution_id: Uuid::new_v4(),
            parameters,
            reader,
            writer,
            pipeline,
            job_listeners,
            batch_listeners,
            reader_listeners,
            pipeline_listeners,
            writer_listeners,
            registry,
            metrics: Arc::new(JobMetrics::new()),
            status: Arc::new(StatusCell::new()),
            last_error: Arc::new(Mutex::new(None)),
            system_properties,
            stop_requested: Arc::new(AtomicBool::new(false)),
            write_failed: AtomicBool::new(false),
        })
    }

    /// The execution id assigned to this job instance at construction time.
    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// The job's configured parameters.
    pub fn parameters(&self) -> &JobParameters {
        &self.parameters
    }

    /// Requests cooperative cancellation. Honored between records and
    /// between batches, never mid-record; the currently accumulating batch
    /// is discarded rather than partially written.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    fn set_last_error(&self, error: &Error) {
        *self.last_error.lock().unwrap() = Some(ReportedError::from(error));
    }

    fn snapshot(&self) -> JobReport {
        JobReport {
            execution_id: self.execution_id,
            parameters: self.parameters.clone(),
            metrics: self.metrics.snapshot(),
            status: self.status.get(),
            last_error: self.last_error.lock().unwrap().clone(),
            system_properties: self.system_properties.clone(),
        }
    }

    fn monitor(&self) -> Monitor {
        Monitor::new(
            self.parameters.name.clone(),
            self.execution_id,
            Arc::clone(&self.metrics),
            Arc::clone(&self.status),
            Arc::clone(&self.last_error),
        )
    }

    fn threshold_exceeded(&self) -> bool {
        self.metrics.error_count() > self.parameters.error_threshold
    }

    /// Advances the status cell to `to`, passing through every intermediate
    /// state the status graph requires along the way. Does not stamp
    /// `start_time`: a job that never reaches the STARTED transition (e.g.
    /// reader/writer open failure) records no start time, per the report's
    /// startTime-at-STARTED contract.
    fn transition_to_terminal(&self, to: JobStatus) {
        if self.status.get() == JobStatus::Starting {
            self.status.transition(JobStatus::Started);
        }
        if self.status.get() == JobStatus::Started {
            self.status.transition(JobStatus::Stopping);
        }
        self.status.transition(to);
        self.metrics.mark_ended();
    }

    fn spawn_timeout(&self, timeout: Duration) {
        let stop = Arc::clone(&self.stop_requested);
        std::thread::spawn(move || {
            std::thread::sleep(timeout);
            stop.store(true, Ordering::Release);
        });
    }

    /// Runs the job to completion: opens reader and writer, drives the
    /// read-process-write loop, closes both, and returns the terminal
    /// report.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyUsed`] if this job instance has already been
    /// run once. Every other failure is captured inside the returned
    /// report's `status` and `last_error` rather than propagated -- a
    /// failed run is still a successful call to `run`.
    pub fn run(&self) -> Result<JobReport, Error> {
        if self.used.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyUsed);
        }

        let name = self.parameters.name.clone();
        info!(job = %name, execution_id = %self.execution_id, "job starting");

        catch("job_listener.before_job_start", || {
            self.job_listeners.before_job_start(&self.parameters)
        });

        if self.parameters.jmx_enabled {
            self.registry.register(self.monitor());
        }

        if let Some(timeout) = self.parameters.timeout {
            self.spawn_timeout(timeout);
        }

        if let Err(e) = self.reader.open() {
            error!(job = %name, error = %e, "reader open failed");
            self.set_last_error(&e);
            self.transition_to_terminal(JobStatus::Failed);
            return Ok(self.finish());
        }

        if let Err(e) = self.writer.open() {
            error!(job = %name, error = %e, "writer open failed");
            self.set_last_error(&e);
            if let Err(close_err) = self.reader.close() {
                warn!(job = %name, error = %close_err, "reader close failed during unwind");
            }
            self.transition_to_terminal(JobStatus::Failed);
            return Ok(self.finish());
        }

        self.status.transition(JobStatus::Started);
        self.metrics.mark_started();
        debug!(job = %name, batch_size = self.parameters.batch_size, "job started");

        let mut batch = BatchAccumulator::new(self.parameters.batch_size);
        let mut fatal: Option<Error> = None;
        let mut threshold_hit = false;
        let mut stopped = false;

        'main: loop {
            catch("batch_listener.before_batch_reading", || {
                self.batch_listeners.before_batch_reading()
            });
            catch("reader_listener.before_record_reading", || {
                self.reader_listeners.before_record_reading()
            });

            let read_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                self.reader.read_record()
            }))
            .unwrap_or_else(|payload| Err(Error::Read(panic_message(payload.as_ref()))));

            let record = match read_result {
                Ok(Some(record)) => record,
                Ok(None) => {
                    trace!(job = %name, "reader signalled end of stream");
                    break 'main;
                }
                Err(e) => {
                    error!(job = %name, error = %e, "read failed");
                    catch("reader_listener.on_record_reading_exception", || {
                        self.reader_listeners.on_record_reading_exception(&e)
                    });
                    self.set_last_error(&e);
                    fatal = Some(e);
                    break 'main;
                }
            };

            self.metrics.incr_read();
            catch("reader_listener.after_record_reading", || {
                self.reader_listeners.after_record_reading(&record)
            });

            self.process_one(&mut batch, record);

            if self.threshold_exceeded() {
                warn!(
                    job = %name,
                    error_count = self.metrics.error_count(),
                    threshold = self.parameters.error_threshold,
                    "error threshold exceeded"
                );
                threshold_hit = true;
                break 'main;
            }

            if self.stop_requested.load(Ordering::Acquire) {
                info!(job = %name, "cooperative stop requested");
                stopped = true;
                break 'main;
            }
        }

        if fatal.is_none() && !threshold_hit && !stopped {
            self.flush(&mut batch);
            if self.threshold_exceeded() {
                threshold_hit = true;
            }
        } else if !batch.is_empty() {
            debug!(job = %name, dropped = batch.len(), "discarding partial batch without writing");
            batch.clear();
        }

        if let Err(e) = self.writer.close() {
            warn!(job = %name, error = %e, "writer close failed");
        }
        if let Err(e) = self.reader.close() {
            warn!(job = %name, error = %e, "reader close failed");
        }

        let final_status = if fatal.is_some() || threshold_hit || self.write_failed.load(Ordering::Acquire) {
            JobStatus::Failed
        } else if stopped {
            JobStatus::Aborted
        } else {
            JobStatus::Completed
        };
        self.transition_to_terminal(final_status);

        let report = self.finish();
        info!(
            job = %name,
            status = ?report.status,
            read = report.metrics.read_count,
            written = report.metrics.write_count,
            filtered = report.metrics.filtered_count,
            errors = report.metrics.error_count,
            "job finished"
        );
        Ok(report)
    }

    fn finish(&self) -> JobReport {
        let report = self.snapshot();
        catch("job_listener.after_job_end", || {
            self.job_listeners.after_job_end(&report)
        });
        if self.parameters.jmx_enabled {
            self.registry.deregister(&self.monitor().management_name());
        }
        report
    }

    fn process_one(&self, batch: &mut BatchAccumulator<T>, record: Record<T>) {
        let input = record.clone();

        let before = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.pipeline_listeners.before_record_processing(record)
        }))
        .unwrap_or_else(|payload| Err(Error::Listener(panic_message(payload.as_ref()))));

        let staged = match before {
            Ok(Some(r)) => r,
            Ok(None) => {
                self.metrics.incr_filtered();
                return;
            }
            Err(e) => {
                self.record_processing_error(&input, e);
                return;
            }
        };

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.pipeline.apply(staged)
        }))
        .unwrap_or_else(|payload| PipelineOutcome::Error(Error::Processing(panic_message(payload.as_ref()))));

        match outcome {
            PipelineOutcome::Output(output) => {
                catch("pipeline_listener.after_record_processing", || {
                    self.pipeline_listeners.after_record_processing(&input, &output)
                });
                if batch.push(output) {
                    self.flush(batch);
                }
            }
            PipelineOutcome::Filtered => {
                self.metrics.incr_filtered();
            }
            PipelineOutcome::Error(e) => {
                self.record_processing_error(&input, e);
            }
        }
    }

    fn record_processing_error(&self, input: &Record<T>, error: Error) {
        warn!(error = %error, sequence_number = input.header.sequence_number, "record processing failed");
        self.metrics.incr_error(1);
        self.set_last_error(&error);
        catch("pipeline_listener.on_record_processing_exception", || {
            self.pipeline_listeners.on_record_processing_exception(input, &error)
        });
    }

    fn flush(&self, batch: &mut BatchAccumulator<T>) {
        if batch.is_empty() {
            return;
        }
        let records = batch.take();

        catch("batch_listener.after_batch_processing", || {
            self.batch_listeners.after_batch_processing(&records)
        });
        catch("writer_listener.before_record_writing", || {
            self.writer_listeners.before_record_writing(&records)
        });

        let write_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.writer.write_records(&records)
        }))
        .unwrap_or_else(|payload| Err(Error::Write(panic_message(payload.as_ref()))));

        match write_result {
            Ok(()) => {
                self.metrics.incr_written(records.len() as u64);
                catch("writer_listener.after_record_writing", || {
                    self.writer_listeners.after_record_writing(&records)
                });
                catch("batch_listener.after_batch_writing", || {
                    self.batch_listeners.after_batch_writing(&records)
                });
            }
            Err(e) => {
                warn!(error = %e, batch_len = records.len(), "batch write failed");
                self.metrics.incr_error(records.len() as u64);
                self.set_last_error(&e);
                self.write_failed.store(true, Ordering::Release);
                catch("writer_listener.on_record_writing_exception", || {
                    self.writer_listeners.on_record_writing_exception(&records, &e)
                });
                catch("batch_listener.on_batch_writing_exception", || {
                    self.batch_listeners.on_batch_writing_exception(&records, &e)
                });
            }
        }
    }
}
