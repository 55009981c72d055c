//! Team resolution and requirement filtering.
//!
//! Both functions are pure over the membership records handed to them. The
//! filtering policy is asymmetric on purpose: a requirement with an empty
//! `applies_to` set is visible to a member who holds no team roles, but a
//! member who does hold team roles only sees requirements whose `applies_to`
//! intersects those teams. An empty set intersects nothing, so such a member
//! loses visibility of unrestricted requirements. This mirrors the visibility
//! rules the product owners signed off on; do not "fix" it locally.

use std::collections::BTreeSet;

use super::domain::{Membership, ProjectRole, Requirement, TeamName, Username};

/// Every team role the user holds for the project, excluding the eligibility
/// role itself. Project codes match case-insensitively. Empty when the user
/// holds no team roles.
pub fn member_teams(
    memberships: &[Membership],
    username: &Username,
    project_code: &str,
) -> BTreeSet<TeamName> {
    memberships
        .iter()
        .filter(|membership| {
            membership.username == *username && membership.project.matches(project_code)
        })
        .filter_map(|membership| match &membership.role {
            ProjectRole::Team(team) => Some(team.clone()),
            ProjectRole::Member => None,
        })
        .collect()
}

/// Narrow `requirements` to those visible to a member holding `teams`.
pub fn applicable_requirements<'a>(
    requirements: &'a [Requirement],
    teams: &BTreeSet<TeamName>,
) -> Vec<&'a Requirement> {
    if teams.is_empty() {
        return requirements.iter().collect();
    }

    requirements
        .iter()
        .filter(|requirement| !requirement.applies_to.is_disjoint(teams))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluations::domain::{ProjectCode, RequirementId};

    fn membership(username: &str, project: &str, role: ProjectRole) -> Membership {
        Membership {
            username: Username(username.to_string()),
            project: ProjectCode(project.to_string()),
            role,
        }
    }

    fn requirement(id: u64, applies_to: &[&str]) -> Requirement {
        Requirement {
            id: RequirementId(id),
            project: ProjectCode("proja".to_string()),
            description: format!("requirement {id}"),
            applies_to: applies_to
                .iter()
                .map(|team| TeamName(team.to_string()))
                .collect(),
            priorities: BTreeSet::new(),
            categories: BTreeSet::new(),
            order: None,
            notes: None,
            is_active: true,
        }
    }

    #[test]
    fn member_teams_excludes_the_eligibility_role() {
        let memberships = vec![
            membership("sam", "ProjA", ProjectRole::Member),
            membership("sam", "ProjA", ProjectRole::Team(TeamName("TeamX".to_string()))),
            membership("sam", "ProjB", ProjectRole::Team(TeamName("TeamY".to_string()))),
            membership("alex", "ProjA", ProjectRole::Team(TeamName("TeamZ".to_string()))),
        ];

        let teams = member_teams(&memberships, &Username("sam".to_string()), "proja");
        assert_eq!(teams.len(), 1);
        assert!(teams.contains(&TeamName("TeamX".to_string())));
    }

    #[test]
    fn member_teams_matches_project_codes_case_insensitively() {
        let memberships = vec![membership(
            "sam",
            "PROJA",
            ProjectRole::Team(TeamName("TeamX".to_string())),
        )];

        let teams = member_teams(&memberships, &Username("sam".to_string()), "proja");
        assert_eq!(teams.len(), 1);
    }

    #[test]
    fn no_teams_means_every_requirement_applies() {
        let requirements = vec![
            requirement(1, &["TeamX"]),
            requirement(2, &["TeamY"]),
            requirement(3, &[]),
        ];

        let applicable = applicable_requirements(&requirements, &BTreeSet::new());
        assert_eq!(applicable.len(), 3);
    }

    #[test]
    fn teams_narrow_to_intersecting_requirements_only() {
        let requirements = vec![
            requirement(1, &["TeamX"]),
            requirement(2, &["TeamY"]),
            requirement(3, &[]),
        ];
        let teams: BTreeSet<TeamName> = [TeamName("TeamX".to_string())].into_iter().collect();

        let applicable = applicable_requirements(&requirements, &teams);
        let ids: Vec<u64> = applicable.iter().map(|req| req.id.0).collect();
        // Requirement 3 has an empty applies_to set, which intersects nothing,
        // so a member holding teams does not see it.
        assert_eq!(ids, vec![1]);
    }
}
