//! # Real-Time Events
//!
//! Domain events handed to the broadcaster and the message shape pushed
//! to each subscriber's sink.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::scope::{ProjectId, Targeting, UserId};

/// Well-known event kinds emitted by the issue tracker services.
///
/// The broadcaster does not restrict kinds to this list.
pub mod kinds {
    pub const CONNECTED: &str = "connected";

    pub const ISSUE_CREATED: &str = "issue-created";
    pub const ISSUE_UPDATED: &str = "issue-updated";
    pub const ISSUE_COMMENTED: &str = "issue-commented";
    pub const COMMENT_UPDATED: &str = "comment-updated";
    pub const COMMENT_DELETED: &str = "comment-deleted";

    pub const PROJECT_UPDATED: &str = "project.updated";
    pub const PROJECT_DELETED: &str = "project.deleted";
    pub const PROJECT_MEMBER_ADDED: &str = "project.member.added";
    pub const PROJECT_MEMBER_REMOVED: &str = "project.member.removed";
}

/// A committed domain change to fan out.
///
/// Created by a producer after its write is durable, dispatched once,
/// then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type tag
    pub kind: String,

    /// Opaque body, carried verbatim
    pub payload: Value,

    /// Who receives it
    pub targeting: Targeting,

    /// When the producer handed it over
    pub emitted_at: DateTime<Utc>,
}

impl Event {
    /// Create an event with explicit targeting
    pub fn new(kind: impl Into<String>, payload: Value, targeting: Targeting) -> Self {
        Self {
            kind: kind.into(),
            payload,
            targeting,
            emitted_at: Utc::now(),
        }
    }

    /// Event for `Project(project)` subscribers and all global subscribers
    pub fn for_project(kind: impl Into<String>, project: ProjectId, payload: Value) -> Self {
        Self::new(kind, payload, Targeting::ProjectAndGlobal(project))
    }

    /// Event for the `User(u)` subscribers of each listed user
    pub fn for_users<I>(kind: impl Into<String>, users: I, payload: Value) -> Self
    where
        I: IntoIterator<Item = UserId>,
    {
        let users: BTreeSet<UserId> = users.into_iter().collect();
        Self::new(kind, payload, Targeting::Users(users))
    }

    /// The message each recipient's sink receives
    pub fn to_message(&self) -> OutboundMessage {
        OutboundMessage {
            event: self.kind.clone(),
            data: self.payload.clone(),
        }
    }
}

/// One message on a subscriber's stream: a kind tag and an opaque body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Event name
    pub event: String,

    /// Event body
    pub data: Value,
}

impl OutboundMessage {
    /// The acknowledgement sent first on every new stream
    pub fn connected(text: impl Into<String>) -> Self {
        Self {
            event: kinds::CONNECTED.to_string(),
            data: Value::String(text.into()),
        }
    }

    /// Whether this is the connection acknowledgement
    pub fn is_connected_ack(&self) -> bool {
        self.event == kinds::CONNECTED
    }
}
