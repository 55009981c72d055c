use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::domain::{EvaluationId, ProjectRole, Username};
use super::eligibility::{applicable_requirements, member_teams};
use super::export::{write_csv, ExportError};
use super::repository::{EvaluationStore, StoreError};

/// Service facade over the store: generation, export, and the mutation paths
/// members use after records exist.
pub struct EvaluationService<S> {
    store: Arc<S>,
}

impl<S> EvaluationService<S>
where
    S: EvaluationStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Materialize every missing evaluation for the project: one record per
    /// eligible member x applicable requirement x active vendor. Existing
    /// records are never touched, so the operation is idempotent.
    pub fn generate(&self, project_code: &str) -> Result<GenerationReport, GenerationError> {
        let project = self
            .store
            .project_by_code(project_code)?
            .ok_or_else(|| GenerationError::ProjectNotFound(project_code.to_string()))?;
        if !project.is_active {
            return Err(GenerationError::InactiveProject(project.code.0.clone()));
        }

        let roster = self
            .store
            .roster(project_code)?
            .ok_or_else(|| GenerationError::MissingRoster(project.code.0.clone()))?;
        // BTreeSet keeps the report order stable; the final record set does
        // not depend on member order either way.
        let members: BTreeSet<Username> = roster
            .iter()
            .filter(|membership| membership.role == ProjectRole::Member)
            .map(|membership| membership.username.clone())
            .collect();
        if members.is_empty() {
            return Err(GenerationError::NoMembers(project.code.0.clone()));
        }

        let vendors = self.store.active_vendors(project_code)?;
        if vendors.is_empty() {
            return Err(GenerationError::NoActiveVendors(project.code.0.clone()));
        }
        // Zero active requirements is not an error; the loop just produces
        // nothing.
        let requirements = self.store.active_requirements(project_code)?;

        let mut report = GenerationReport::new(project.code.0.clone());
        for member in &members {
            let teams = member_teams(&roster, member, project_code);
            for requirement in applicable_requirements(&requirements, &teams) {
                for vendor in &vendors {
                    let created =
                        self.store
                            .insert_if_absent(member, vendor.id, requirement.id)?;
                    if created.is_some() {
                        report.created.push(CreatedEvaluation {
                            username: member.0.clone(),
                            vendor: vendor.name.clone(),
                            requirement: requirement.display_label(),
                        });
                    }
                }
            }
        }

        info!(
            project = %report.project_code,
            created = report.created.len(),
            "generated missing evaluations"
        );
        Ok(report)
    }

    /// Render every evaluation record as CSV for download.
    pub fn export_csv(&self) -> Result<Vec<u8>, ExportError> {
        write_csv(self.store.as_ref())
    }

    pub fn record_score(&self, id: EvaluationId, score: u8) -> Result<(), StoreError> {
        self.store.record_score(id, score)
    }

    pub fn confirm(&self, id: EvaluationId) -> Result<(), StoreError> {
        self.store.confirm(id)
    }

    pub fn annotate(&self, id: EvaluationId, notes: String) -> Result<(), StoreError> {
        self.store.annotate(id, notes)
    }
}

/// One line of the generation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedEvaluation {
    pub username: String,
    pub vendor: String,
    pub requirement: String,
}

/// Outcome of a generation run: the records created, in report order.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub project_code: String,
    pub created: Vec<CreatedEvaluation>,
}

impl GenerationReport {
    fn new(project_code: String) -> Self {
        Self {
            project_code,
            created: Vec::new(),
        }
    }

    /// Human-readable report body returned by the API and the CLI: one line
    /// per created record plus a trailing done marker.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for entry in &self.created {
            out.push_str(&format!(
                "created evaluation [{}], {}, {}\n",
                entry.username, entry.vendor, entry.requirement
            ));
        }
        out.push_str("done!\n");
        out
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Error raised by a generation run. Every variant fails the run before any
/// record is written except `Store`, which surfaces mid-run store faults.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("project was not found for project code [{0}]; pass a valid project code")]
    ProjectNotFound(String),
    #[error("project [{0}] is inactive; activate it to generate evaluations")]
    InactiveProject(String),
    #[error("no membership roster is provisioned for project [{0}]; provision one and enroll members")]
    MissingRoster(String),
    #[error("no members enrolled for project [{0}]; enroll some to generate evaluations")]
    NoMembers(String),
    #[error("no active vendors defined for project [{0}]; set up a vendor to generate evaluations")]
    NoActiveVendors(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
