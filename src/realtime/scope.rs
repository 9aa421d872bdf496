//! # Scopes and Identities
//!
//! Identifiers, subscription scopes and event targeting.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Project identifier
pub type ProjectId = Uuid;

/// User identifier
pub type UserId = Uuid;

/// Opaque subscription identifier.
///
/// Assigned once at creation from a fresh v4 UUID and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Allocate a new identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier received from a client
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The partition a subscription lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Scope {
    /// Every project-targeted event
    Global,
    /// Events targeted at one project
    Project(ProjectId),
    /// Events targeted at one user
    User(UserId),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Project(id) => write!(f, "project:{}", id),
            Scope::User(id) => write!(f, "user:{}", id),
        }
    }
}

/// Who an event is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Targeting {
    /// `Project(p)` subscribers plus every `Global` subscriber
    ProjectAndGlobal(ProjectId),
    /// `User(u)` subscribers for each listed user
    Users(BTreeSet<UserId>),
}

impl Targeting {
    /// Target one user
    pub fn user(user_id: UserId) -> Self {
        Targeting::Users(BTreeSet::from([user_id]))
    }

    /// Target a set of users; duplicates collapse
    pub fn users<I: IntoIterator<Item = UserId>>(users: I) -> Self {
        Targeting::Users(users.into_iter().collect())
    }

    /// Whether a subscription in `scope` is addressed by this targeting
    pub fn covers(&self, scope: &Scope) -> bool {
        match (self, scope) {
            (Targeting::ProjectAndGlobal(_), Scope::Global) => true,
            (Targeting::ProjectAndGlobal(p), Scope::Project(q)) => p == q,
            (Targeting::Users(users), Scope::User(u)) => users.contains(u),
            _ => false,
        }
    }
}

impl fmt::Display for Targeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Targeting::ProjectAndGlobal(p) => write!(f, "project:{}+global", p),
            Targeting::Users(users) => write!(f, "users[{}]", users.len()),
        }
    }
}

/// The authenticated caller, as supplied by the authentication layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal {
    pub user_id: UserId,
}

impl Principal {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}
