//! Patient detail view model and its stale-response guard

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregator, flatten};
use crate::patient::PatientRef;
use crate::record::{HistoryTimeline, ObservationRecord};
use crate::resource::{MedicationStatement, Observation, Patient};

/// Everything the patient detail screen shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientDetail {
    pub patient: PatientRef,
    pub timeline: HistoryTimeline,
    /// Every flattened observation, including codes outside the biomarker table
    pub observations: Vec<ObservationRecord>,
}

impl PatientDetail {
    pub fn assemble(
        id: &str,
        patient: &Patient,
        observations: &[Observation],
        medications: &[MedicationStatement],
    ) -> Self {
        let records = flatten(observations);
        let timeline = Aggregator::new().build_from_records(&records, medications);
        Self {
            patient: PatientRef::from_resource(patient, id),
            timeline,
            observations: records,
        }
    }
}

/// Proof that a load was started; only the latest ticket may commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Holds the detail of one view. Results of loads that were superseded or
/// outlived a teardown are dropped without touching the held state.
#[derive(Debug, Default)]
pub struct DetailView {
    generation: AtomicU64,
    state: Mutex<Option<PatientDetail>>,
}

impl DetailView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load, invalidating any load still in flight
    pub fn begin_load(&self) -> LoadTicket {
        LoadTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Store `detail` if `ticket` is still current. Returns whether it was stored.
    pub fn complete(&self, ticket: LoadTicket, detail: PatientDetail) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !self.is_current(ticket) {
            tracing::debug!(ticket = ticket.0, "Discarding stale patient detail");
            return false;
        }
        *state = Some(detail);
        true
    }

    /// Tear the view down: pending loads become stale and held state is dropped
    pub fn teardown(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.generation.fetch_add(1, Ordering::SeqCst);
        *state = None;
    }

    pub fn current(&self) -> Option<PatientDetail> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn into_current(self) -> Option<PatientDetail> {
        self.state.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}
