use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::domain::{
    Evaluation, EvaluationId, Membership, Project, Requirement, RequirementId, Username, Vendor,
    VendorId, MAX_SCORE,
};

/// Storage abstraction so the service and export layers can be exercised in
/// isolation. Implementations must enforce uniqueness of the
/// (username, vendor, requirement) triple in [`EvaluationStore::insert_if_absent`].
pub trait EvaluationStore: Send + Sync {
    fn project_by_code(&self, code: &str) -> Result<Option<Project>, StoreError>;
    fn active_vendors(&self, code: &str) -> Result<Vec<Vendor>, StoreError>;
    fn active_requirements(&self, code: &str) -> Result<Vec<Requirement>, StoreError>;

    /// Membership roster for a project, or `None` when no roster was ever
    /// provisioned (a configuration error distinct from an empty roster).
    fn roster(&self, code: &str) -> Result<Option<Vec<Membership>>, StoreError>;

    /// Insert a fresh evaluation for the triple unless one already exists.
    /// Returns the created record, or `None` when the triple was present.
    fn insert_if_absent(
        &self,
        username: &Username,
        vendor: VendorId,
        requirement: RequirementId,
    ) -> Result<Option<Evaluation>, StoreError>;

    fn evaluations(&self) -> Result<Vec<Evaluation>, StoreError>;
    fn vendor(&self, id: VendorId) -> Result<Option<Vendor>, StoreError>;
    fn requirement(&self, id: RequirementId) -> Result<Option<Requirement>, StoreError>;

    fn record_score(&self, id: EvaluationId, score: u8) -> Result<(), StoreError>;
    fn confirm(&self, id: EvaluationId) -> Result<(), StoreError>;
    fn annotate(&self, id: EvaluationId, notes: String) -> Result<(), StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("evaluation [{0}] was not found")]
    EvaluationNotFound(EvaluationId),
    #[error("score {0} is outside the 0-10 scale")]
    ScoreOutOfRange(u8),
    /// Backend failure (lost connection, timeout). Part of the trait
    /// contract for database-backed implementations; the in-memory store
    /// never raises it. The router maps it to 500.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct EvaluationKey {
    username: Username,
    vendor: VendorId,
    requirement: RequirementId,
}

#[derive(Debug, Default)]
struct StoreInner {
    projects: Vec<Project>,
    vendors: BTreeMap<VendorId, Vendor>,
    requirements: BTreeMap<RequirementId, Requirement>,
    // Keyed by normalized project code; presence of the key means the roster
    // was provisioned, even when empty.
    rosters: HashMap<String, Vec<Membership>>,
    evaluations: BTreeMap<EvaluationKey, Evaluation>,
    next_vendor: u64,
    next_requirement: u64,
    next_evaluation: u64,
}

/// In-memory store backing the service. All access funnels through one mutex,
/// so a generation run's check-then-insert sequence cannot interleave with a
/// concurrent run on the same triple.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEvaluationStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl InMemoryEvaluationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_project(&self, project: Project) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.projects.retain(|existing| !existing.code.matches(&project.code.0));
        inner.projects.push(project);
    }

    pub fn add_vendor(&self, mut vendor: Vendor) -> VendorId {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.next_vendor += 1;
        let id = VendorId(inner.next_vendor);
        vendor.id = id;
        inner.vendors.insert(id, vendor);
        id
    }

    pub fn add_requirement(&self, mut requirement: Requirement) -> RequirementId {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.next_requirement += 1;
        let id = RequirementId(inner.next_requirement);
        requirement.id = id;
        inner.requirements.insert(id, requirement);
        id
    }

    /// Register an empty roster for a project. Enrollment also provisions
    /// implicitly; this exists so a project can have a roster with nobody in
    /// it, which generation treats differently from a missing roster.
    pub fn provision_roster(&self, code: &str) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.rosters.entry(code.to_ascii_lowercase()).or_default();
    }

    pub fn enroll(&self, membership: Membership) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let key = membership.project.key();
        inner.rosters.entry(key).or_default().push(membership);
    }

    /// Delete a project and everything it owns (vendors, requirements,
    /// roster). Evaluations referencing the removed rows are deliberately
    /// left behind; this subsystem never deletes them.
    pub fn remove_project(&self, code: &str) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.projects.retain(|project| !project.code.matches(code));
        inner.vendors.retain(|_, vendor| !vendor.project.matches(code));
        inner
            .requirements
            .retain(|_, requirement| !requirement.project.matches(code));
        inner.rosters.remove(&code.to_ascii_lowercase());
    }
}

impl EvaluationStore for InMemoryEvaluationStore {
    fn project_by_code(&self, code: &str) -> Result<Option<Project>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .projects
            .iter()
            .find(|project| project.code.matches(code))
            .cloned())
    }

    fn active_vendors(&self, code: &str) -> Result<Vec<Vendor>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .vendors
            .values()
            .filter(|vendor| vendor.is_active && vendor.project.matches(code))
            .cloned()
            .collect())
    }

    fn active_requirements(&self, code: &str) -> Result<Vec<Requirement>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner
            .requirements
            .values()
            .filter(|requirement| requirement.is_active && requirement.project.matches(code))
            .cloned()
            .collect())
    }

    fn roster(&self, code: &str) -> Result<Option<Vec<Membership>>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.rosters.get(&code.to_ascii_lowercase()).cloned())
    }

    fn insert_if_absent(
        &self,
        username: &Username,
        vendor: VendorId,
        requirement: RequirementId,
    ) -> Result<Option<Evaluation>, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let key = EvaluationKey {
            username: username.clone(),
            vendor,
            requirement,
        };
        if inner.evaluations.contains_key(&key) {
            return Ok(None);
        }

        inner.next_evaluation += 1;
        let evaluation = Evaluation {
            id: EvaluationId(inner.next_evaluation),
            username: username.clone(),
            vendor,
            requirement,
            score: None,
            confirmed: false,
            notes: None,
            created_at: Utc::now(),
        };
        inner.evaluations.insert(key, evaluation.clone());
        Ok(Some(evaluation))
    }

    fn evaluations(&self) -> Result<Vec<Evaluation>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut records: Vec<Evaluation> = inner.evaluations.values().cloned().collect();
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    fn vendor(&self, id: VendorId) -> Result<Option<Vendor>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.vendors.get(&id).cloned())
    }

    fn requirement(&self, id: RequirementId) -> Result<Option<Requirement>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.requirements.get(&id).cloned())
    }

    fn record_score(&self, id: EvaluationId, score: u8) -> Result<(), StoreError> {
        if score > MAX_SCORE {
            return Err(StoreError::ScoreOutOfRange(score));
        }
        self.update(id, |evaluation| evaluation.score = Some(score))
    }

    fn confirm(&self, id: EvaluationId) -> Result<(), StoreError> {
        self.update(id, |evaluation| evaluation.confirmed = true)
    }

    fn annotate(&self, id: EvaluationId, notes: String) -> Result<(), StoreError> {
        self.update(id, |evaluation| evaluation.notes = Some(notes))
    }
}

impl InMemoryEvaluationStore {
    fn update(
        &self,
        id: EvaluationId,
        apply: impl FnOnce(&mut Evaluation),
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let evaluation = inner
            .evaluations
            .values_mut()
            .find(|evaluation| evaluation.id == id)
            .ok_or(StoreError::EvaluationNotFound(id))?;
        apply(evaluation);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluations::domain::ProjectCode;
    use std::collections::BTreeSet;

    fn store_with_project(code: &str) -> InMemoryEvaluationStore {
        let store = InMemoryEvaluationStore::new();
        store.add_project(Project {
            code: ProjectCode(code.to_string()),
            name: format!("{code} evaluation"),
            notes: None,
            is_active: true,
        });
        store
    }

    fn vendor(code: &str, name: &str) -> Vendor {
        Vendor {
            id: VendorId(0),
            project: ProjectCode(code.to_string()),
            name: name.to_string(),
            notes: None,
            is_active: true,
        }
    }

    fn requirement(code: &str, description: &str) -> Requirement {
        Requirement {
            id: RequirementId(0),
            project: ProjectCode(code.to_string()),
            description: description.to_string(),
            applies_to: BTreeSet::new(),
            priorities: BTreeSet::new(),
            categories: BTreeSet::new(),
            order: None,
            notes: None,
            is_active: true,
        }
    }

    #[test]
    fn insert_if_absent_creates_once_per_triple() {
        let store = store_with_project("proja");
        let vendor_id = store.add_vendor(vendor("proja", "Acme"));
        let requirement_id = store.add_requirement(requirement("proja", "Supports SSO"));
        let user = Username("sam".to_string());

        let created = store
            .insert_if_absent(&user, vendor_id, requirement_id)
            .expect("insert succeeds");
        assert!(created.is_some());

        let duplicate = store
            .insert_if_absent(&user, vendor_id, requirement_id)
            .expect("second insert succeeds");
        assert!(duplicate.is_none());
        assert_eq!(store.evaluations().expect("list").len(), 1);
    }

    #[test]
    fn record_score_rejects_values_above_ten() {
        let store = store_with_project("proja");
        let vendor_id = store.add_vendor(vendor("proja", "Acme"));
        let requirement_id = store.add_requirement(requirement("proja", "Supports SSO"));
        let user = Username("sam".to_string());
        let evaluation = store
            .insert_if_absent(&user, vendor_id, requirement_id)
            .expect("insert succeeds")
            .expect("created");

        let err = store
            .record_score(evaluation.id, 11)
            .expect_err("11 is out of range");
        assert!(matches!(err, StoreError::ScoreOutOfRange(11)));

        store.record_score(evaluation.id, 10).expect("10 is valid");
        store
            .annotate(evaluation.id, "strong demo".to_string())
            .expect("notes record");
        let records = store.evaluations().expect("list");
        assert_eq!(records[0].score, Some(10));
        assert_eq!(records[0].notes.as_deref(), Some("strong demo"));
    }

    #[test]
    fn mutations_on_unknown_ids_are_rejected() {
        let store = store_with_project("proja");
        let missing = EvaluationId(99);
        assert!(matches!(
            store.confirm(missing),
            Err(StoreError::EvaluationNotFound(_))
        ));
    }

    #[test]
    fn removing_a_project_cascades_but_keeps_evaluations() {
        let store = store_with_project("proja");
        let vendor_id = store.add_vendor(vendor("proja", "Acme"));
        let requirement_id = store.add_requirement(requirement("proja", "Supports SSO"));
        let user = Username("sam".to_string());
        store
            .insert_if_absent(&user, vendor_id, requirement_id)
            .expect("insert succeeds");

        store.remove_project("PROJA");

        assert!(store.project_by_code("proja").expect("lookup").is_none());
        assert!(store.active_vendors("proja").expect("vendors").is_empty());
        assert!(store
            .active_requirements("proja")
            .expect("requirements")
            .is_empty());
        // Orphaned evaluations persist; cleanup is out of scope here.
        assert_eq!(store.evaluations().expect("list").len(), 1);
    }

    #[test]
    fn roster_distinguishes_missing_from_empty() {
        let store = store_with_project("proja");
        assert!(store.roster("proja").expect("lookup").is_none());

        store.provision_roster("ProjA");
        let roster = store.roster("proja").expect("lookup").expect("provisioned");
        assert!(roster.is_empty());
    }
}
