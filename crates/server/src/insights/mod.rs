//! Remote insight features, consumed as opaque request/response services

pub mod client;

pub use client::InsightsClient;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Insight service not configured (set INSIGHTS_BASE_URL)")]
    NotConfigured,

    #[error("Insight service unreachable: {0}")]
    Transport(String),

    #[error("Insight service error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Failed to parse insight response: {0}")]
    Decode(String),
}
