//! # Authorization Gate
//!
//! The project-access oracle consulted once per project subscribe.
//!
//! The answer is not re-checked while a subscription lives: a member
//! removed from a project keeps receiving that project's events until the
//! connection ends.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::scope::{Principal, ProjectId, UserId};

/// Answers project existence and access questions at subscribe time
#[async_trait]
pub trait AuthorizationGate: Send + Sync {
    /// Whether `project` exists
    async fn project_exists(&self, project: ProjectId) -> bool;

    /// Whether `principal` may subscribe to `project`'s stream
    async fn can_subscribe(&self, principal: &Principal, project: ProjectId) -> bool;
}

/// Ownership and membership of one project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMembership {
    pub owner: UserId,
    pub members: HashSet<UserId>,
}

impl ProjectMembership {
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            members: HashSet::new(),
        }
    }

    /// Owners always have access; members have access
    pub fn grants(&self, user: UserId) -> bool {
        self.owner == user || self.members.contains(&user)
    }
}

/// In-memory gate: owner or member may subscribe
#[derive(Debug, Default)]
pub struct MembershipGate {
    projects: RwLock<HashMap<ProjectId, ProjectMembership>>,
}

impl MembershipGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project with its owner
    pub fn add_project(&self, project: ProjectId, owner: UserId) {
        self.projects
            .write()
            .insert(project, ProjectMembership::new(owner));
    }

    /// Forget a project
    pub fn remove_project(&self, project: ProjectId) -> bool {
        self.projects.write().remove(&project).is_some()
    }

    /// Grant membership; false if the project is unknown
    pub fn add_member(&self, project: ProjectId, user: UserId) -> bool {
        match self.projects.write().get_mut(&project) {
            Some(membership) => {
                membership.members.insert(user);
                true
            }
            None => false,
        }
    }

    /// Revoke membership; false if the user was not a member
    pub fn remove_member(&self, project: ProjectId, user: UserId) -> bool {
        self.projects
            .write()
            .get_mut(&project)
            .map(|m| m.members.remove(&user))
            .unwrap_or(false)
    }

    /// Members of a project, owner excluded
    pub fn members(&self, project: ProjectId) -> Vec<UserId> {
        self.projects
            .read()
            .get(&project)
            .map(|m| m.members.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuthorizationGate for MembershipGate {
    async fn project_exists(&self, project: ProjectId) -> bool {
        self.projects.read().contains_key(&project)
    }

    async fn can_subscribe(&self, principal: &Principal, project: ProjectId) -> bool {
        self.projects
            .read()
            .get(&project)
            .map(|m| m.grants(principal.user_id))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_owner_and_member_can_subscribe() {
        let gate = MembershipGate::new();
        let project = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        gate.add_project(project, owner);
        assert!(gate.add_member(project, member));

        assert!(gate.can_subscribe(&Principal::new(owner), project).await);
        assert!(gate.can_subscribe(&Principal::new(member), project).await);
        assert!(!gate.can_subscribe(&Principal::new(stranger), project).await);
    }

    #[tokio::test]
    async fn test_unknown_project() {
        let gate = MembershipGate::new();
        let project = Uuid::new_v4();

        assert!(!gate.project_exists(project).await);
        assert!(!gate.can_subscribe(&Principal::new(Uuid::new_v4()), project).await);
        assert!(!gate.add_member(project, Uuid::new_v4()));
    }

    #[tokio::test]
    async fn test_removed_member_loses_access() {
        let gate = MembershipGate::new();
        let project = Uuid::new_v4();
        let member = Uuid::new_v4();
        gate.add_project(project, Uuid::new_v4());
        gate.add_member(project, member);

        assert!(gate.remove_member(project, member));
        assert!(!gate.remove_member(project, member));
        assert!(!gate.can_subscribe(&Principal::new(member), project).await);
        assert!(gate.members(project).is_empty());
    }
}
