//! Vendor evaluation tracker.
//!
//! Projects group vendors and requirements; enrolled members score how well
//! each vendor meets each requirement. The [`evaluations`] module carries the
//! domain model, the generation routine that materializes missing evaluation
//! records, and the CSV export used for reporting.

pub mod config;
pub mod error;
pub mod evaluations;
pub mod telemetry;
