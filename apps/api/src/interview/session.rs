//! In-memory session registry. One session per chat, discarded when the
//! candidate closes it, when it sits idle past the configured limit, or when
//! the process exits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::interview::engine::InterviewEngine;
use crate::interview::state::{CandidateProfile, ChatMessage, ConversationState, Step};

pub struct Session {
    pub id: Uuid,
    pub model_id: String,
    pub engine: InterviewEngine,
    pub conversation: ConversationState,
    pub created_at: DateTime<Utc>,
    /// Monotonic time of the last candidate message.
    pub last_active: Instant,
}

impl Session {
    pub fn new(model_id: String, engine: InterviewEngine) -> Self {
        Self {
            id: Uuid::new_v4(),
            model_id,
            engine,
            conversation: ConversationState::new(),
            created_at: Utc::now(),
            last_active: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_active)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            model: self.model_id.clone(),
            step: self.conversation.step,
            question_count: self.conversation.question_count,
            questions_remaining: self.conversation.questions_remaining(),
            complete: self.conversation.is_complete(),
            profile: self.conversation.profile.clone(),
            history: self.conversation.history.clone(),
            created_at: self.created_at,
        }
    }
}

/// Serializable view of a session returned by every session endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub model: String,
    pub step: Step,
    pub question_count: u32,
    pub questions_remaining: u32,
    pub complete: bool,
    pub profile: CandidateProfile,
    pub history: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

/// Turns on one session are serialized by its own mutex; the map lock is
/// only held to look sessions up.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) -> Arc<Mutex<Session>> {
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        info!("Session {id} opened");
        handle
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("Session {id} closed");
        }
        removed
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session idle for at least `max_idle`. A session whose lock
    /// is held is mid-turn and always survives. Returns how many were dropped.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, handle| match handle.try_lock() {
            Ok(session) if session.idle_for(now) >= max_idle => {
                info!(
                    "Session {id} expired after {}s idle",
                    session.idle_for(now).as_secs()
                );
                false
            }
            _ => true,
        });
        before - sessions.len()
    }

    /// Runs `sweep_idle` every `every` until the returned task is aborted.
    pub fn spawn_idle_sweeper(&self, max_idle: Duration, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let expired = store.sweep_idle(max_idle).await;
                if expired > 0 {
                    debug!("Idle sweep removed {expired} session(s)");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;

    fn session() -> Session {
        let engine = InterviewEngine::new(Arc::new(ScriptedModel::always("Q")), 3);
        Session::new("ollama".to_string(), engine)
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let store = SessionStore::new();
        let handle = store.insert(session()).await;
        let id = handle.lock().await.id;

        assert_eq!(store.count().await, 1);
        assert!(store.get(id).await.is_some());
        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert!(store.get(id).await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = store.insert(session()).await;
        let b = store.insert(session()).await;

        {
            let mut a = a.lock().await;
            let Session {
                engine,
                conversation,
                ..
            } = &mut *a;
            engine.process_turn(conversation, "Jane Doe").await;
        }

        let b = b.lock().await;
        assert_eq!(b.conversation.step, Step::Greeting);
        assert!(b.conversation.history.is_empty());
        assert_eq!(a.lock().await.snapshot().step, Step::Email);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_drops_only_idle_sessions() {
        let store = SessionStore::new();
        let stale = store.insert(session()).await;
        let stale_id = stale.lock().await.id;

        tokio::time::advance(Duration::from_secs(20)).await;
        let fresh = store.insert(session()).await;
        let fresh_id = fresh.lock().await.id;

        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(store.sweep_idle(Duration::from_secs(30)).await, 1);
        assert!(store.get(stale_id).await.is_none());
        assert!(store.get(fresh_id).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_skips_session_mid_turn() {
        let store = SessionStore::new();
        let handle = store.insert(session()).await;
        let guard = handle.lock().await;

        tokio::time::advance(Duration::from_secs(120)).await;
        assert_eq!(store.sweep_idle(Duration::from_secs(30)).await, 0);
        assert_eq!(store.count().await, 1);
        drop(guard);

        assert_eq!(store.sweep_idle(Duration::from_secs(30)).await, 1);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_expires_untouched_sessions() {
        let store = SessionStore::new();
        let active = store.insert(session()).await;
        let idle = store.insert(session()).await;
        let active_id = active.lock().await.id;
        let idle_id = idle.lock().await.id;

        let sweeper = store.spawn_idle_sweeper(Duration::from_secs(30), Duration::from_secs(10));

        // Sweeps run at 10s and 20s: nothing is idle long enough yet.
        tokio::time::sleep(Duration::from_secs(25)).await;
        active.lock().await.touch();
        assert_eq!(store.count().await, 2);

        // Sweep at 30s drops the untouched session; the touched one is 5s idle.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(store.get(idle_id).await.is_none());
        assert!(store.get(active_id).await.is_some());

        // Sweep at 60s is the first to see the touched session 35s idle.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.count().await, 0);

        sweeper.abort();
    }
}
