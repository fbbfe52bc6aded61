//! Runs jobs. Enforces single use, offers a blocking and a non-blocking entry point.

use crate::error::Error;
use crate::job::Job;
use crate::report::JobReport;

/// Entry point for running [`Job`]s.
///
/// Does not parallelize the stages within a single job -- a job's own loop
/// is always a single blocking sequence -- but multiple jobs may run
/// concurrently, each dispatched onto its own worker via
/// [`tokio::task::spawn_blocking`], since the engine's core traits are
/// synchronous.
#[derive(Debug, Default, Clone, Copy)]
pub struct Executor;

impl Executor {
    /// A new executor. Stateless: holding on to one is only a convenience,
    /// not a requirement (a bare call to [`Job::run`] works just as well).
    pub fn new() -> Self {
        Self
    }

    /// Runs `job` to completion on the calling thread and returns its
    /// terminal report.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyUsed`] if `job` has already been run.
    pub fn execute<T>(&self, job: Job<T>) -> Result<JobReport, Error>
    where
        T: Clone + Send + Sync + 'static,
    {
        job.run()
    }

    /// Dispatches `job` onto a blocking worker thread and returns a handle
    /// to its eventual report. Requires an active Tokio runtime.
    pub fn execute_async<T>(&self, job: Job<T>) -> tokio::task::JoinHandle<Result<JobReport, Error>>
    where
        T: Clone + Send + Sync + 'static,
    {
        tokio::task::spawn_blocking(move || job.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::JobBuilder;
    use crate::report::JobStatus;

    #[test]
    fn execute_runs_a_job_to_completion() {
        let job = JobBuilder::<i32>::new().name("sync").build().unwrap();
        let executor = Executor::new();
        let report = executor.execute(job).unwrap();
        assert_eq!(report.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn execute_async_runs_a_job_on_a_blocking_worker() {
        let job = JobBuilder::<i32>::new().name("async").build().unwrap();
        let executor = Executor::new();
        let report = executor.execute_async(job).await.unwrap().unwrap();
        assert_eq!(report.status, JobStatus::Completed);
    }

    #[test]
    fn execute_surfaces_a_failed_run_as_a_failed_report_not_an_err() {
        struct FailingReader;
        impl crate::reader::RecordReader<i32> for FailingReader {
            fn open(&self) -> Result<(), Error> {
                Err(Error::OpenReader("no such file".into()))
            }
            fn read_record(&self) -> Result<Option<crate::record::Record<i32>>, Error> {
                Ok(None)
            }
        }

        let job = JobBuilder::<i32>::new().reader(FailingReader).build().unwrap();
        let executor = Executor::new();
        let report = executor.execute(job).unwrap();
        assert_eq!(report.status, JobStatus::Failed);
    }
}
