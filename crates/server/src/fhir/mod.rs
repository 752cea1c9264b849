pub mod client;

pub use client::{FhirClient, RawPatientRecord};
