//! A generic batch record-processing engine.
//!
//! Drives records from a [`RecordReader`] through an ordered [`Pipeline`] of
//! filters, validators and processors, accumulates survivors into batches,
//! and hands each batch to a [`RecordWriter`]. A [`Job`] is single-use; build
//! one with [`JobBuilder`] and run it once, either directly or through an
//! [`Executor`].
//!
//! ```
//! use batch_engine::{Error, JobBuilder, JobStatus, Record, RecordReader, RecordWriter};
//! use std::sync::Mutex;
//!
//! struct Numbers(Mutex<std::vec::IntoIter<i32>>);
//! impl RecordReader<i32> for Numbers {
//!     fn read_record(&self) -> Result<Option<Record<i32>>, Error> {
//!         Ok(self.0.lock().unwrap().next().map(|n| Record::new(n as u64, "numbers", n)))
//!     }
//! }
//!
//! struct StdoutWriter;
//! impl RecordWriter<i32> for StdoutWriter {
//!     fn write_records(&self, batch: &[Record<i32>]) -> Result<(), Error> {
//!         for record in batch {
//!             println!("{}", record.payload);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let job = JobBuilder::new()
//!     .name("print-numbers")
//!     .batch_size(2)
//!     .reader(Numbers(Mutex::new(vec![1, 2, 3].into_iter())))
//!     .writer(StdoutWriter)
//!     .build()
//!     .unwrap();
//!
//! let report = job.run().unwrap();
//! assert_eq!(report.status, JobStatus::Completed);
//! ```

mod batch;
mod builder;
mod error;
mod executor;
mod job;
mod listener;
mod metrics;
mod monitor;
mod parameters;
mod pipeline;
mod reader;
mod record;
mod report;
mod writer;

pub use batch::BatchAccumulator;
pub use builder::JobBuilder;
pub use error::{Error, ErrorKind};
pub use executor::Executor;
pub use job::Job;
pub use listener::{
    BatchListener, JobListener, PipelineListener, RecordReaderListener, RecordWriterListener,
};
pub use metrics::{JobMetrics, MetricsSnapshot};
pub use monitor::{InMemoryRegistry, ManagementRegistry, Monitor, MonitorSnapshot};
pub use parameters::JobParameters;
pub use pipeline::{Pipeline, PipelineOutcome, RecordFilter, RecordProcessor, RecordValidator};
pub use reader::{NoopReader, RecordReader};
pub use record::{Record, RecordHeader};
pub use report::{JobReport, JobStatus, ReportedError, ReportedErrorKind};
pub use writer::{NoopWriter, RecordWriter};
