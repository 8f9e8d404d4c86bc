//! Per-identity session store.
//!
//! Each identity (channel + user) owns at most one in-flight order. Sessions
//! are created on `/start` and removed on delivery, cancellation or idle
//! timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::OrderError;

use super::model::Order;
use super::state::OrderPhase;

/// Identity of the party driving one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub channel: String,
    pub user_id: String,
}

impl SessionKey {
    pub fn new(channel: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            user_id: user_id.into(),
        }
    }

    /// File-name-safe form of the user id.
    pub fn file_stem(&self) -> String {
        let stem: String = self
            .user_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if stem.is_empty() { "user".to_string() } else { stem }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.channel, self.user_id)
    }
}

/// One identity's conversation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
    pub phase: OrderPhase,
    pub order: Order,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    fn new(key: SessionKey) -> Self {
        let now = Utc::now();
        Self {
            key,
            phase: OrderPhase::AwaitingCount,
            order: Order::default(),
            started_at: now,
            last_activity: now,
        }
    }

    /// Advance to the next phase. Fails at the terminal phase.
    pub fn advance(&mut self) -> Result<OrderPhase, OrderError> {
        let next = self.phase.next().ok_or_else(|| OrderError::InvalidTransition {
            from: self.phase.to_string(),
            to: "next".to_string(),
        })?;
        self.transition_to(next)
    }

    /// Move to `target` if the state machine allows it.
    pub fn transition_to(&mut self, target: OrderPhase) -> Result<OrderPhase, OrderError> {
        if !self.phase.can_transition_to(target) {
            return Err(OrderError::InvalidTransition {
                from: self.phase.to_string(),
                to: target.to_string(),
            });
        }
        self.phase = target;
        Ok(target)
    }

    /// Whether the session has been idle for longer than `timeout`.
    pub fn is_stale(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        let timeout = chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX);
        now.signed_duration_since(self.last_activity) > timeout
    }
}

/// In-memory map from identity to session.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionKey, Session>>,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a fresh session for `key`, replacing any existing one.
    pub async fn begin(&self, key: &SessionKey) -> Session {
        let session = Session::new(key.clone());
        let replaced = self
            .sessions
            .write()
            .await
            .insert(key.clone(), session.clone());
        if replaced.is_some() {
            debug!(session = %key, "Replaced in-flight order with a new one");
        }
        session
    }

    /// Snapshot of the session for `key`, if any.
    pub async fn get(&self, key: &SessionKey) -> Option<Session> {
        self.sessions.read().await.get(key).cloned()
    }

    /// Run `f` against the session for `key` and bump its activity time.
    /// Returns `None` when no session exists.
    pub async fn update<R>(&self, key: &SessionKey, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(key)?;
        session.last_activity = Utc::now();
        Some(f(session))
    }

    /// Remove and return the session for `key`.
    pub async fn remove(&self, key: &SessionKey) -> Option<Session> {
        self.sessions.write().await.remove(key)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for longer than `timeout`. Returns how many were removed.
    pub async fn prune_stale(&self, timeout: Duration) -> usize {
        self.prune_stale_at(timeout, Utc::now()).await
    }

    async fn prune_stale_at(&self, timeout: Duration, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|key, session| {
            let stale = session.is_stale(timeout, now);
            if stale {
                debug!(session = %key, phase = %session.phase, "Session expired");
            }
            !stale
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(count = pruned, "Pruned idle sessions");
        }
        pruned
    }
}

/// Spawn a background task that periodically prunes idle sessions.
pub fn spawn_pruning_task(
    store: Arc<SessionStore>,
    idle_timeout: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // Skip immediate first tick
        loop {
            ticker.tick().await;
            store.prune_stale(idle_timeout).await;
        }
    })
}
