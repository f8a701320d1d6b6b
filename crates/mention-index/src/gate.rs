use crate::report::RebuildReport;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Per-project write gate.
///
/// The async mutex serializes every mutating operation for one project
/// in-process (writes for different projects proceed independently). The
/// rebuild counter and last-report slot implement rebuild coalescing: a
/// rebuild that finds the counter advanced while it waited yields the
/// completed rebuild's report instead of running its own.
pub(crate) struct ProjectGate {
    pub(crate) write: tokio::sync::Mutex<()>,
    rebuilds_completed: AtomicU64,
    last_report: Mutex<Option<RebuildReport>>,
}

impl ProjectGate {
    fn new() -> Self {
        Self {
            write: tokio::sync::Mutex::new(()),
            rebuilds_completed: AtomicU64::new(0),
            last_report: Mutex::new(None),
        }
    }

    pub(crate) fn completed_rebuilds(&self) -> u64 {
        self.rebuilds_completed.load(Ordering::Acquire)
    }

    /// Must be called while holding `write`.
    pub(crate) fn record_rebuild(&self, report: &RebuildReport) {
        if let Ok(mut slot) = self.last_report.lock() {
            *slot = Some(report.clone());
        }
        self.rebuilds_completed.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn last_report(&self) -> Option<RebuildReport> {
        self.last_report.lock().ok().and_then(|slot| slot.clone())
    }
}

#[derive(Default)]
pub(crate) struct GateRegistry {
    gates: Mutex<HashMap<String, Arc<ProjectGate>>>,
}

impl GateRegistry {
    pub(crate) fn gate(&self, project_id: &str) -> Arc<ProjectGate> {
        let mut gates = self
            .gates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        gates
            .entry(project_id.to_string())
            .or_insert_with(|| Arc::new(ProjectGate::new()))
            .clone()
    }
}
