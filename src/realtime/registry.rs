//! # Connection Registry
//!
//! Active subscriptions partitioned by scope.
//!
//! Project and user partitions live in sharded maps so that work on one
//! project never waits on another. A keyed partition exists only while it
//! holds at least one subscription. All operations are synchronous and
//! in-memory; none of them suspend.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::warn;
use uuid::Uuid;

use super::scope::{ProjectId, Scope, SubscriptionId, Targeting, UserId};
use super::subscription::Subscription;

type Partition = HashMap<SubscriptionId, Arc<Subscription>>;

/// Registry of active subscriptions
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Scope of every registered id; enforces registry-wide uniqueness
    index: DashMap<SubscriptionId, Scope>,

    /// Global partition (always present)
    global: RwLock<Partition>,

    /// Partitions by project
    projects: DashMap<ProjectId, Partition>,

    /// Partitions by user
    users: DashMap<UserId, Partition>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription to its scope's partition.
    ///
    /// Inserting an id that is already registered is a caller bug; it is
    /// refused and reported rather than overwriting the live entry.
    pub fn insert(&self, subscription: Arc<Subscription>) -> bool {
        let id = subscription.id();
        let scope = subscription.scope();

        match self.index.entry(id) {
            Entry::Occupied(_) => {
                debug_assert!(false, "subscription {} registered twice", id);
                warn!(subscription_id = %id, scope = %scope, "duplicate subscription insert ignored");
                return false;
            }
            Entry::Vacant(slot) => {
                slot.insert(scope);
            }
        }

        match scope {
            Scope::Global => {
                self.global.write().insert(id, subscription);
            }
            Scope::Project(project) => {
                self.projects
                    .entry(project)
                    .or_default()
                    .insert(id, subscription);
            }
            Scope::User(user) => {
                self.users.entry(user).or_default().insert(id, subscription);
            }
        }

        true
    }

    /// Remove a subscription. Removing an absent id is a no-op.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&self, subscription: &Subscription) -> bool {
        let id = subscription.id();
        let Some((_, scope)) = self.index.remove(&id) else {
            return false;
        };

        match scope {
            Scope::Global => {
                self.global.write().remove(&id);
            }
            Scope::Project(project) => remove_keyed(&self.projects, project, id),
            Scope::User(user) => remove_keyed(&self.users, user, id),
        }

        true
    }

    /// Look up an active subscription by id
    pub fn get(&self, id: SubscriptionId) -> Option<Arc<Subscription>> {
        let scope = *self.index.get(&id)?;

        match scope {
            Scope::Global => self.global.read().get(&id).cloned(),
            Scope::Project(project) => self.projects.get(&project)?.get(&id).cloned(),
            Scope::User(user) => self.users.get(&user)?.get(&id).cloned(),
        }
    }

    /// Point-in-time snapshot of the subscriptions an event must reach
    pub fn subscribers_for(&self, targeting: &Targeting) -> Vec<Arc<Subscription>> {
        let mut result = Vec::new();

        match targeting {
            Targeting::ProjectAndGlobal(project) => {
                if let Some(partition) = self.projects.get(project) {
                    result.extend(partition.values().cloned());
                }
                result.extend(self.global.read().values().cloned());
            }
            Targeting::Users(users) => {
                for user in users {
                    if let Some(partition) = self.users.get(user) {
                        result.extend(partition.values().cloned());
                    }
                }
            }
        }

        result
    }

    /// Total active subscriptions across every partition
    pub fn count(&self) -> usize {
        let projects: usize = self.projects.iter().map(|p| p.len()).sum();
        let users: usize = self.users.iter().map(|p| p.len()).sum();
        self.count_global() + projects + users
    }

    /// Subscriptions in the global partition
    pub fn count_global(&self) -> usize {
        self.global.read().len()
    }

    /// Subscriptions scoped to one project
    pub fn count_for_project(&self, project: ProjectId) -> usize {
        self.projects.get(&project).map(|p| p.len()).unwrap_or(0)
    }

    /// Subscriptions scoped to one user
    pub fn count_for_user(&self, user: UserId) -> usize {
        self.users.get(&user).map(|p| p.len()).unwrap_or(0)
    }

    /// Number of keyed (project and user) partitions currently held
    pub fn partition_count(&self) -> usize {
        self.projects.len() + self.users.len()
    }

    /// Whether a partition exists for `project`
    pub fn has_project_partition(&self, project: ProjectId) -> bool {
        self.projects.contains_key(&project)
    }

    /// Whether a partition exists for `user`
    pub fn has_user_partition(&self, user: UserId) -> bool {
        self.users.contains_key(&user)
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Remove `id` from a keyed partition, dropping the partition once empty.
///
/// Both steps happen under the partition's shard lock.
fn remove_keyed(map: &DashMap<Uuid, Partition>, key: Uuid, id: SubscriptionId) {
    if let Entry::Occupied(mut partition) = map.entry(key) {
        partition.get_mut().remove(&id);
        if partition.get().is_empty() {
            partition.remove();
        }
    }
}
