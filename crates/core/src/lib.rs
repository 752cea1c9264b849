//! supplement-core: FHIR aggregation and view models for the supplement history viewer
//!
//! Turns loosely-structured Patient, Observation and MedicationStatement
//! resources into a display-ready supplement history, and caregiver form
//! input back into a FHIR transaction bundle. Everything here is pure; the
//! backend is reached through the traits in [`fetch`].

pub mod aggregate;
pub mod biomarker;
pub mod bundle;
pub mod error;
pub mod fetch;
pub mod outcome;
pub mod patient;
pub mod record;
pub mod resource;
pub mod view;
pub mod write;

pub use aggregate::{Aggregator, CalendarDay, DateMatch, ExactDate};
pub use biomarker::BiomarkerCode;
pub use bundle::{Bundle, BundleEntry, BundleLink, BundleRequest, BundleType, HttpVerb};
pub use error::FhirError;
pub use fetch::{BundleSubmitter, ResourceFetcher, ResourceSet};
pub use outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};
pub use patient::{PatientCard, PatientRef};
pub use record::{HistoryTimeline, ObservationRecord, SupplementRecord};
pub use resource::{FhirResource, MedicationStatement, Observation, Patient};
pub use view::{DetailView, LoadTicket, PatientDetail};
pub use write::{SupplementForm, WriteBundleBuilder};
