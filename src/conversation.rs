//! Bounded conversation history
//!
//! A [`ConversationLog`] keeps the most recent turns, evicting from the head
//! once the bound is exceeded. [`ConversationStore`] owns one log per history
//! key and serializes every mutation behind a single mutex. The mutex is only
//! held for in-memory copies, never across a model or store call.

use crate::auth::CallerIdentity;
use crate::llm::LlmMessage;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

/// Default number of turns retained per log
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One role-tagged message. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    content: String,
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

    #[cfg(test)]
    pub fn role(&self) -> Role {
        self.role
    }

    #[cfg(test)]
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn to_llm_message(&self) -> LlmMessage {
        match self.role {
            Role::User => LlmMessage::user(&self.content),
            Role::Assistant => LlmMessage::assistant(&self.content),
        }
    }
}

/// Ordered, capacity-bounded sequence of turns (FIFO eviction)
#[derive(Debug, Clone)]
pub struct ConversationLog {
    turns: VecDeque<Turn>,
    limit: usize,
}

impl ConversationLog {
    pub fn new(limit: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(limit.min(64)),
            limit,
        }
    }

    /// Add to the tail, evicting from the head until within the bound
    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.limit {
            self.turns.pop_front();
        }
    }

    /// Ordered copy of the retained turns
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// How history is partitioned between callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryScope {
    /// One log per (org, store) identity
    #[default]
    PerCaller,
    /// A single process-wide log shared by every caller
    Shared,
}

impl FromStr for HistoryScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_caller" | "per-caller" | "caller" => Ok(Self::PerCaller),
            "shared" | "global" => Ok(Self::Shared),
            other => Err(format!("unknown history scope '{other}' (expected per_caller or shared)")),
        }
    }
}

/// Key selecting one log inside a [`ConversationStore`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HistoryKey {
    Shared,
    Caller { org_id: String, store_id: String },
}

impl fmt::Display for HistoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryKey::Shared => write!(f, "shared"),
            HistoryKey::Caller { org_id, store_id } => write!(f, "{org_id}/{store_id}"),
        }
    }
}

/// Process-lifetime owner of every conversation log
#[derive(Debug)]
pub struct ConversationStore {
    scope: HistoryScope,
    limit: usize,
    logs: Mutex<HashMap<HistoryKey, ConversationLog>>,
}

impl ConversationStore {
    pub fn new(scope: HistoryScope, limit: usize) -> Self {
        Self {
            scope,
            limit,
            logs: Mutex::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> HistoryScope {
        self.scope
    }

    /// Resolve which log a caller reads and writes
    pub fn key_for(&self, identity: &CallerIdentity) -> HistoryKey {
        match self.scope {
            HistoryScope::Shared => HistoryKey::Shared,
            HistoryScope::PerCaller => HistoryKey::Caller {
                org_id: identity.org_id.clone(),
                store_id: identity.store_id.clone(),
            },
        }
    }

    /// Ordered turns for prompt assembly. Empty for an unknown key.
    pub fn snapshot(&self, key: &HistoryKey) -> Vec<Turn> {
        self.lock()
            .get(key)
            .map(ConversationLog::snapshot)
            .unwrap_or_default()
    }

    /// Append a single turn
    #[cfg(test)]
    pub fn append(&self, key: &HistoryKey, turn: Turn) {
        let limit = self.limit;
        self.lock()
            .entry(key.clone())
            .or_insert_with(|| ConversationLog::new(limit))
            .append(turn);
    }

    /// Append the user turn then the assistant turn under one lock acquisition,
    /// so a concurrent commit can never land between them.
    pub fn commit(&self, key: &HistoryKey, user: Turn, assistant: Turn) {
        let limit = self.limit;
        let mut logs = self.lock();
        let log = logs
            .entry(key.clone())
            .or_insert_with(|| ConversationLog::new(limit));
        log.append(user);
        log.append(assistant);
        tracing::debug!(key = %key, retained = log.len(), "Conversation history updated");
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<HistoryKey, ConversationLog>> {
        // Poisoning can only interrupt a VecDeque push or pop; the logs stay valid
        self.logs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
