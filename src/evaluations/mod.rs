//! Evaluation tracking: domain model, storage, generation, and export.
//!
//! `generate` walks {eligible members} x {applicable requirements} x
//! {active vendors} and inserts any evaluation record that does not exist
//! yet. Requirement applicability is resolved per member from their team
//! roles (see [`eligibility`]).

pub mod dataset;
pub mod domain;
pub mod eligibility;
pub mod export;
pub mod repository;
pub mod router;
pub mod service;

pub use dataset::{Dataset, DatasetError};
pub use domain::{
    Evaluation, EvaluationId, Label, Membership, Project, ProjectCode, ProjectRole, Requirement,
    RequirementId, TeamName, Username, Vendor, VendorId, MAX_SCORE,
};
pub use export::{write_csv, ExportError, EXPORT_COLUMNS, EXPORT_FILENAME};
pub use repository::{EvaluationStore, InMemoryEvaluationStore, StoreError};
pub use router::evaluation_router;
pub use service::{CreatedEvaluation, EvaluationService, GenerationError, GenerationReport};
