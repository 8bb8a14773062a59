//! Submission and status-query engines behind the HTTP handlers.

pub mod gateway;
pub mod tracker;

pub use gateway::{GatewayError, JobGateway, SubmissionError};
pub use tracker::{JobTracker, TrackerError};
