//! Lock-free counters behind the live [`crate::monitor::Monitor`] view.
//!
//! Counters use `Release` stores from the single job-runner thread and
//! `Acquire` loads from monitor readers, so a monitor never needs to take a
//! lock to observe a consistent (if possibly stale) count.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// Point-in-time, cloneable readout of a [`JobMetrics`].
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    /// Records successfully read from the reader.
    pub read_count: u64,
    /// Records successfully handed to the writer.
    pub write_count: u64,
    /// Records dropped by a filter or a processor returning no output.
    pub filtered_count: u64,
    /// Records or batches that failed validation, processing, or writing.
    pub error_count: u64,
    /// When the job transitioned to STARTED, if it has.
    pub start_time: Option<SystemTime>,
    /// When the job reached a terminal status, if it has.
    pub end_time: Option<SystemTime>,
}

impl MetricsSnapshot {
    /// Wall-clock duration of the run, if both endpoints are known.
    pub fn duration(&self) -> Option<Duration> {
        let start = self.start_time?;
        let end = self.end_time?;
        end.duration_since(start).ok()
    }
}

/// The live, shared counters for a single job execution.
///
/// Cheaply clonable accessors are exposed to [`crate::monitor::Monitor`] via
/// an `Arc`, so a job and its registered monitor observe the same counters
/// without synchronizing through the job itself.
#[derive(Debug, Default)]
pub struct JobMetrics {
    read_count: AtomicU64,
    write_count: AtomicU64,
    filtered_count: AtomicU64,
    error_count: AtomicU64,
    start_time: Mutex<Option<SystemTime>>,
    end_time: Mutex<Option<SystemTime>>,
}

impl JobMetrics {
    /// A fresh, zeroed set of counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records successfully read so far.
    pub fn read_count(&self) -> u64 {
        self.read_count.load(Ordering::Acquire)
    }

    /// Records successfully written so far.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Acquire)
    }

    /// Records filtered out so far.
    pub fn filtered_count(&self) -> u64 {
        self.filtered_count.load(Ordering::Acquire)
    }

    /// Records or batches that have failed so far.
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Acquire)
    }

    pub(crate) fn incr_read(&self) {
        self.read_count.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn incr_written(&self, n: u64) {
        self.write_count.fetch_add(n, Ordering::Release);
    }

    pub(crate) fn incr_filtered(&self) {
        self.filtered_count.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn incr_error(&self, n: u64) {
        self.error_count.fetch_add(n, Ordering::Release);
    }

    /// Stamps the start time once, the first time it is called.
    pub(crate) fn mark_started(&self) {
        let mut guard = self.start_time.lock().unwrap();
        if guard.is_none() {
            *guard = Some(SystemTime::now());
        }
    }

    /// Stamps the end time once, the first time it is called.
    pub(crate) fn mark_ended(&self) {
        let mut guard = self.end_time.lock().unwrap();
        if guard.is_none() {
            *guard = Some(SystemTime::now());
        }
    }

    /// Takes a consistent readout of every counter and timestamp.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            read_count: self.read_count(),
            write_count: self.write_count(),
            filtered_count: self.filtered_count(),
            error_count: self.error_count(),
            start_time: *self.start_time.lock().unwrap(),
            end_time: *self.end_time.lock().unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let m = JobMetrics::new();
        assert_eq!(m.read_count(), 0);
        assert_eq!(m.write_count(), 0);
        assert_eq!(m.filtered_count(), 0);
        assert_eq!(m.error_count(), 0);
    }

    #[test]
    fn increments_accumulate() {
        let m = JobMetrics::new();
        m.incr_read();
        m.incr_read();
        m.incr_written(5);
        m.incr_filtered();
        m.incr_error(2);
        assert_eq!(m.read_count(), 2);
        assert_eq!(m.write_count(), 5);
        assert_eq!(m.filtered_count(), 1);
        assert_eq!(m.error_count(), 2);
    }

    #[test]
    fn mark_started_and_ended_are_idempotent() {
        let m = JobMetrics::new();
        m.mark_started();
        let first = m.snapshot().start_time;
        m.mark_started();
        assert_eq!(m.snapshot().start_time, first);

        m.mark_ended();
        let end = m.snapshot().end_time;
        m.mark_ended();
        assert_eq!(m.snapshot().end_time, end);

        assert!(m.snapshot().duration().is_some());
    }
}
