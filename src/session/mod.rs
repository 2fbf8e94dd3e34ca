//! Session transcript types and state management
//!
//! A [`Session`] owns the ordered transcript of one conversation and is the
//! single source of truth the presentation layer renders from. Mutations go
//! through [`Session::append`] and [`Session::clear`]; every mutation bumps a
//! revision counter that subscribers can watch to know when to re-render.

pub mod manager;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

/// Speaker of a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One utterance in a transcript. Immutable once appended; display order is
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The ordered transcript of one interactive conversation.
///
/// Turns are not required to strictly alternate: a failed generation leaves a
/// trailing user turn with no assistant reply, which is valid state the user
/// can resubmit from.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    turns: Vec<Turn>,
    revision: watch::Sender<u64>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        let (revision, _) = watch::channel(0);
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            turns: Vec::new(),
            revision,
        }
    }

    /// Append a turn at the end of the transcript. Always succeeds.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.touch();
    }

    pub fn add_user(&mut self, content: &str) {
        self.append(Turn::user(content));
    }

    pub fn add_assistant(&mut self, content: &str) {
        self.append(Turn::assistant(content));
    }

    /// Remove all turns. Idempotent: clearing an empty session is a no-op
    /// apart from the revision bump.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.touch();
    }

    /// The current transcript in insertion order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// An owned snapshot of the transcript. Iterating the snapshot never
    /// observes mutations made after it was taken.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Subscribe to change notifications. The receiver yields a new revision
    /// after every `append` or `clear`, replacing any implicit re-render
    /// coupling between storage and presentation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
