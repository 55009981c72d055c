use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Highest score a member can award on the 0-10 scale.
pub const MAX_SCORE: u8 = 10;

/// Short project identifier. Codes are matched case-insensitively and treated
/// as unique for lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectCode(pub String);

impl ProjectCode {
    /// Normalized form used as a map key.
    pub fn key(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for ProjectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for enrolled members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Username(pub String);

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a project team used to restrict requirement visibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamName(pub String);

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VendorId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequirementId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvaluationId(pub u64);

impl fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lowercase path-like label used for requirement priorities and categories,
/// e.g. `large/must-have` or `user/basic`. Hierarchy is encoded by the path
/// segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(String);

impl Label {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|segment| !segment.is_empty())
    }

    /// Parent label in the hierarchy, if any (`large/must-have` -> `large`).
    pub fn parent(&self) -> Option<Label> {
        self.0.rsplit_once('/').map(|(head, _)| Label::new(head))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Label {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Label::new(&raw))
    }
}

/// Top-level grouping of vendors and requirements under evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub code: ProjectCode,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub is_active: bool,
}

/// A candidate product or provider being scored within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub project: ProjectCode,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub is_active: bool,
}

/// A capability a vendor is scored against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: RequirementId,
    pub project: ProjectCode,
    pub description: String,
    /// Teams this requirement is restricted to. Empty means it applies to
    /// everyone.
    #[serde(default)]
    pub applies_to: BTreeSet<TeamName>,
    #[serde(default)]
    pub priorities: BTreeSet<Label>,
    #[serde(default)]
    pub categories: BTreeSet<Label>,
    /// Display ordering only; has no effect on generation.
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    pub is_active: bool,
}

impl Requirement {
    /// Display form shown in reports: `"3. Supports SSO"` when ordered.
    pub fn display_label(&self) -> String {
        match self.order {
            Some(order) => format!("{order}. {}", self.description),
            None => self.description.clone(),
        }
    }
}

/// Role a member holds within a project. `Member` is the eligibility role:
/// holding it is what makes a user receive generated evaluations. Any `Team`
/// role additionally restricts which requirements that member sees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    Member,
    Team(TeamName),
}

/// First-class membership record keyed by (username, project, role).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub username: Username,
    pub project: ProjectCode,
    pub role: ProjectRole,
}

/// One member's score and notes for one (vendor, requirement) pair.
///
/// At most one record exists per (username, vendor, requirement) triple; the
/// store enforces this on insert. The generator only ever creates records,
/// the owning member mutates score, confirmation, and notes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub username: Username,
    pub vendor: VendorId,
    pub requirement: RequirementId,
    pub score: Option<u8>,
    pub confirmed: bool,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
