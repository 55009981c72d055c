//! JSON seed files for the CLI and demos.
//!
//! A dataset describes projects (with their vendors and requirements) and
//! membership records. Loading one hydrates a fresh in-memory store, after
//! which generation and export run against it exactly as they would in the
//! service.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::domain::{
    Label, Membership, Project, ProjectCode, Requirement, RequirementId, TeamName, Vendor, VendorId,
};
use super::repository::InMemoryEvaluationStore;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse dataset: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub projects: Vec<ProjectSeed>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
    /// Codes whose roster should exist even with nobody enrolled. Enrollment
    /// provisions implicitly, so this is only needed for empty rosters.
    #[serde(default)]
    pub rosters: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectSeed {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub vendors: Vec<VendorSeed>,
    #[serde(default)]
    pub requirements: Vec<RequirementSeed>,
}

#[derive(Debug, Deserialize)]
pub struct VendorSeed {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct RequirementSeed {
    pub description: String,
    #[serde(default)]
    pub applies_to: BTreeSet<TeamName>,
    #[serde(default)]
    pub priorities: BTreeSet<Label>,
    #[serde(default)]
    pub categories: BTreeSet<Label>,
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Dataset {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn active_project_codes(&self) -> Vec<String> {
        self.projects
            .iter()
            .filter(|project| project.is_active)
            .map(|project| project.code.clone())
            .collect()
    }

    /// Hydrate an in-memory store with every record in the dataset.
    pub fn into_store(self) -> InMemoryEvaluationStore {
        let store = InMemoryEvaluationStore::new();

        for seed in self.projects {
            let code = ProjectCode(seed.code);
            store.add_project(Project {
                code: code.clone(),
                name: seed.name,
                notes: seed.notes,
                is_active: seed.is_active,
            });

            for vendor in seed.vendors {
                store.add_vendor(Vendor {
                    id: VendorId(0),
                    project: code.clone(),
                    name: vendor.name,
                    notes: vendor.notes,
                    is_active: vendor.is_active,
                });
            }

            for requirement in seed.requirements {
                store.add_requirement(Requirement {
                    id: RequirementId(0),
                    project: code.clone(),
                    description: requirement.description,
                    applies_to: requirement.applies_to,
                    priorities: requirement.priorities,
                    categories: requirement.categories,
                    order: requirement.order,
                    notes: requirement.notes,
                    is_active: requirement.is_active,
                });
            }
        }

        for code in self.rosters {
            store.provision_roster(&code);
        }
        for membership in self.memberships {
            store.enroll(membership);
        }

        store
    }
}
