//! A read-only, JMX-like projection of a running job.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::metrics::{JobMetrics, MetricsSnapshot};
use crate::report::{JobStatus, ReportedError, StatusCell};

const MANAGEMENT_DOMAIN: &str = "batch_engine";

/// A point-in-time readout of a [`Monitor`].
#[derive(Debug, Clone)]
pub struct MonitorSnapshot {
    /// The job's configured name.
    pub job_name: String,
    /// The execution id of the run this monitor observes.
    pub execution_id: Uuid,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Counters and timestamps as of this snapshot.
    pub metrics: MetricsSnapshot,
    /// `Display` message of the most recent error, if any.
    pub last_error_message: Option<String>,
}

/// A cheap, cloneable handle onto a running job's live state.
///
/// Reads never lock: counters and status are lock-free atomics, so a
/// monitor never blocks the job-runner thread it observes. Only the rarely
/// touched last-error slot takes a lock.
#[derive(Clone)]
pub struct Monitor {
    job_name: String,
    execution_id: Uuid,
    metrics: Arc<JobMetrics>,
    status: Arc<StatusCell>,
    last_error: Arc<Mutex<Option<ReportedError>>>,
}

impl Monitor {
    pub(crate) fn new(
        job_name: String,
        execution_id: Uuid,
        metrics: Arc<JobMetrics>,
        status: Arc<StatusCell>,
        last_error: Arc<Mutex<Option<ReportedError>>>,
    ) -> Self {
        Self { job_name, execution_id, metrics, status, last_error }
    }

    /// The JMX-style object name this monitor registers under:
    /// `batch_engine:name=<job>,id=<execution_id>`.
    pub fn management_name(&self) -> String {
        format!("{MANAGEMENT_DOMAIN}:name={},id={}", self.job_name, self.execution_id)
    }

    /// Takes a consistent readout of the job's current state.
    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            job_name: self.job_name.clone(),
            execution_id: self.execution_id,
            status: self.status.get(),
            metrics: self.metrics.snapshot(),
            last_error_message: self.last_error.lock().unwrap().as_ref().map(|e| e.message.clone()),
        }
    }

    /// The job's configured name, without taking a snapshot.
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// The execution id, without taking a snapshot.
    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }
}

/// Where running jobs register their [`Monitor`] when `jmx_enabled` is set.
///
/// Grounded on the teacher's plugin registry: a process-wide, name-keyed
/// table behind a lock, but read-only from the caller's perspective -- a
/// `Monitor` is registered once at job start and deregistered once at job
/// end, never mutated in place.
pub trait ManagementRegistry: Send + Sync {
    /// Registers a monitor under its [`Monitor::management_name`].
    fn register(&self, monitor: Monitor);
    /// Removes a previously registered monitor by name. A no-op if absent.
    fn deregister(&self, name: &str);
    /// Looks up a registered monitor's current snapshot by name.
    fn snapshot(&self, name: &str) -> Option<MonitorSnapshot>;
    /// Lists the management names of every currently registered monitor.
    fn names(&self) -> Vec<String>;
}

/// The default [`ManagementRegistry`]: an in-memory table behind a mutex,
/// scoped to the current process.
#[derive(Default)]
pub struct InMemoryRegistry {
    entries: Mutex<HashMap<String, Monitor>>,
}

impl ManagementRegistry for InMemoryRegistry {
    fn register(&self, monitor: Monitor) {
        let name = monitor.management_name();
        self.entries.lock().unwrap().insert(name, monitor);
    }

    fn deregister(&self, name: &str) {
        self.entries.lock().unwrap().remove(name);
    }

    fn snapshot(&self, name: &str) -> Option<MonitorSnapshot> {
        self.entries.lock().unwrap().get(name).map(Monitor::snapshot)
    }

    fn names(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::JobStatus;
    use std::sync::Mutex as StdMutex;

    fn make_monitor(name: &str) -> Monitor {
        Monitor::new(
            name.to_string(),
            Uuid::new_v4(),
            Arc::new(JobMetrics::new()),
            Arc::new(StatusCell::new()),
            Arc::new(StdMutex::new(None)),
        )
    }

    #[test]
    fn management_name_includes_job_name_and_execution_id() {
        let monitor = make_monitor("nightly");
        let name = monitor.management_name();
        assert!(name.starts_with("batch_engine:name=nightly,id="));
    }

    #[test]
    fn registry_register_snapshot_deregister_round_trip() {
        let registry = InMemoryRegistry::default();
        let monitor = make_monitor("nightly");
        let name = monitor.management_name();

        registry.register(monitor);
        let snapshot = registry.snapshot(&name).expect("registered monitor should be found");
        assert_eq!(snapshot.job_name, "nightly");
        assert_eq!(snapshot.status, JobStatus::Starting);

        registry.deregister(&name);
        assert!(registry.snapshot(&name).is_none());
    }
}
