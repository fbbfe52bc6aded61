//! Integration-level scenarios driven entirely through the public API:
//! `JobBuilder` -> `Job::run` -> `JobReport`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use batch_engine::{
    Error, InMemoryRegistry, JobBuilder, JobStatus, ManagementRegistry, Record, RecordFilter,
    RecordProcessor, RecordReader, RecordWriter,
};

struct VecReader(Mutex<std::vec::IntoIter<i32>>);

impl VecReader {
    fn new(items: Vec<i32>) -> Self {
        Self(Mutex::new(items.into_iter()))
    }
}

impl RecordReader<i32> for VecReader {
    fn read_record(&self) -> Result<Option<Record<i32>>, Error> {
        Ok(self.0.lock().unwrap().next().map(|n| Record::new(n as u64, "ints", n)))
    }
}

#[derive(Default)]
struct CollectingWriter(Mutex<Vec<i32>>);

impl RecordWriter<i32> for CollectingWriter {
    fn write_records(&self, batch: &[Record<i32>]) -> Result<(), Error> {
        self.0.lock().unwrap().extend(batch.iter().map(|r| r.payload));
        Ok(())
    }
}

struct FailingOpenReader;
impl RecordReader<i32> for FailingOpenReader {
    fn open(&self) -> Result<(), Error> {
        Err(Error::OpenReader("mount not available".into()))
    }
    fn read_record(&self) -> Result<Option<Record<i32>>, Error> {
        Ok(None)
    }
}

struct FailingWriter;
impl RecordWriter<i32> for FailingWriter {
    fn write_records(&self, _batch: &[Record<i32>]) -> Result<(), Error> {
        Err(Error::Write("remote endpoint unreachable".into()))
    }
}

struct EvenOnly;
impl RecordFilter<i32> for EvenOnly {
    fn filter(&self, record: &Record<i32>) -> bool {
        record.payload % 2 == 0
    }
}

struct FailEveryThird(AtomicUsize);
impl RecordProcessor<i32> for FailEveryThird {
    fn process(&self, record: Record<i32>) -> Result<Option<Record<i32>>, Error> {
        let n = self.0.fetch_add(1, Ordering::SeqCst);
        if n % 3 == 2 {
            Err(Error::Processing("simulated transient failure".into()))
        } else {
            Ok(Some(record))
        }
    }
}

#[test]
fn happy_path_with_batch_size_two_writes_every_record() {
    let writer = std::sync::Arc::new(CollectingWriter::default());
    let job = JobBuilder::new()
        .name("happy-path")
        .batch_size(2)
        .reader(VecReader::new(vec![1, 2, 3, 4, 5, 6]))
        .writer(ArcWriter(writer.clone()))
        .build()
        .unwrap();

    let report = job.run().unwrap();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.metrics.read_count, 6);
    assert_eq!(report.metrics.write_count, 6);
    assert_eq!(report.metrics.error_count, 0);
    assert_eq!(*writer.0.lock().unwrap(), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn a_filter_drops_records_before_any_batch_is_written() {
    let writer = std::sync::Arc::new(CollectingWriter::default());
    let job = JobBuilder::new()
        .name("filtered")
        .batch_size(3)
        .reader(VecReader::new(vec![1, 2, 3, 4, 5, 6, 7]))
        .writer(ArcWriter(writer.clone()))
        .filter(EvenOnly)
        .build()
        .unwrap();

    let report = job.run().unwrap();

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.metrics.read_count, 7);
    assert_eq!(report.metrics.filtered_count, 4);
    assert_eq!(*writer.0.lock().unwrap(), vec![2, 4, 6]);
}

#[test]
fn reader_open_failure_produces_a_failed_report_with_zero_reads() {
    let job = JobBuilder::new()
        .name("bad-reader")
        .reader(FailingOpenReader)
        .writer(CollectingWriter::default())
        .build()
        .unwrap();

    let report = job.run().unwrap();

    assert_eq!(report.status, JobStatus::Failed);
    assert_eq!(report.metrics.read_count, 0);
    assert!(report.last_error.is_some());
}

#[test]
fn writer_failure_fails_the_batch_and_the_job() {
    let job = JobBuilder::new()
        .name("bad-writer")
        .batch_size(10)
        .reader(VecReader::new(vec![1, 2, 3]))
        .writer(FailingWriter)
        .build()
        .unwrap();

    let report = job.run().unwrap();

    assert_eq!(report.status, JobStatus::Failed);
    assert_eq!(report.metrics.write_count, 0);
    assert_eq!(report.metrics.error_count, 3);
}

#[test]
fn processor_errors_accumulate_until_the_threshold_aborts_the_run() {
    let job = JobBuilder::new()
        .name("flaky-processor")
        .batch_size(100)
        .error_threshold(1)
        .reader(VecReader::new(vec![1, 2, 3, 4, 5, 6, 7, 8, 9]))
        .writer(CollectingWriter::default())
        .processor(FailEveryThird(AtomicUsize::new(0)))
        .build()
        .unwrap();

    let report = job.run().unwrap();

    assert_eq!(report.status, JobStatus::Failed);
    assert!(report.metrics.error_count > 1);
    assert!(report.metrics.read_count < 9);
}

#[test]
fn jmx_enabled_makes_the_run_visible_through_the_registry_while_it_executes() {
    let registry = std::sync::Arc::new(InMemoryRegistry::default());
    let job = JobBuilder::new()
        .name("observed")
        .jmx(true)
        .registry(ArcRegistry(registry.clone()))
        .reader(VecReader::new(vec![1, 2, 3]))
        .writer(CollectingWriter::default())
        .build()
        .unwrap();

    // Before the run starts, nothing is registered.
    assert!(registry.names().is_empty());

    let report = job.run().unwrap();

    assert_eq!(report.status, JobStatus::Completed);
    // Deregistered by the time run() returns.
    assert!(registry.names().is_empty());
}

/// Adapter so the test fixtures above can share writer/registry instances
/// across the job (which needs ownership) and the assertions (which need a
/// handle to inspect the result).
struct ArcWriter<W>(std::sync::Arc<W>);
impl<T, W: RecordWriter<T>> RecordWriter<T> for ArcWriter<W> {
    fn open(&self) -> Result<(), Error> {
        self.0.open()
    }
    fn write_records(&self, batch: &[Record<T>]) -> Result<(), Error> {
        self.0.write_records(batch)
    }
    fn close(&self) -> Result<(), Error> {
        self.0.close()
    }
}

struct ArcRegistry<R>(std::sync::Arc<R>);
impl<R: ManagementRegistry> ManagementRegistry for ArcRegistry<R> {
    fn register(&self, monitor: batch_engine::Monitor) {
        self.0.register(monitor)
    }
    fn deregister(&self, name: &str) {
        self.0.deregister(name)
    }
    fn snapshot(&self, name: &str) -> Option<batch_engine::MonitorSnapshot> {
        self.0.snapshot(name)
    }
    fn names(&self) -> Vec<String> {
        self.0.names()
    }
}
