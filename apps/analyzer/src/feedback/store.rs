//! Session-scoped storage for `RateLimitState`.
//!
//! A session exists once the upload endpoint has issued its id and lives for
//! `SESSION_TTL_SECS`. Admission is a single atomic step per store, so two
//! concurrent submissions for one session can never both be accepted inside
//! the cooldown. `MemoryGateStore` is the default; `RedisGateStore` shares
//! state across instances when `REDIS_URL` is set.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use redis::aio::MultiplexedConnection;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::feedback::gate::{try_accept, GateDecision, RateLimitState};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown or expired session {0}")]
    UnknownSession(Uuid),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait GateStore: Send + Sync {
    /// Registers a freshly issued session id.
    async fn open_session(&self, session_id: Uuid, ttl: Duration) -> Result<(), StoreError>;

    /// Checks the cooldown and, when accepted, records `now`, atomically.
    async fn try_accept(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Result<GateDecision, StoreError>;

    /// Gives back a window accepted at `accepted_at` whose submission was never
    /// stored. A no-op if the session has since recorded another acceptance.
    async fn release(&self, session_id: Uuid, accepted_at: DateTime<Utc>)
        -> Result<(), StoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-process store
// ────────────────────────────────────────────────────────────────────────────

struct SessionEntry {
    gate: RateLimitState,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryGateStore {
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
}

impl MemoryGateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GateStore for MemoryGateStore {
    async fn open_session(&self, session_id: Uuid, ttl: Duration) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(
            session_id,
            SessionEntry {
                gate: RateLimitState::default(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn try_accept(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Result<GateDecision, StoreError> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions
            .get_mut(&session_id)
            .filter(|entry| entry.expires_at > Instant::now())
            .ok_or(StoreError::UnknownSession(session_id))?;

        let (next, decision) = try_accept(entry.gate, now, cooldown);
        entry.gate = next;
        Ok(decision)
    }

    async fn release(
        &self,
        session_id: Uuid,
        accepted_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(entry) = sessions.get_mut(&session_id) {
            // Any earlier acceptance was already outside the cooldown, so
            // clearing the state admits exactly what it would have admitted.
            if entry.gate.last_accepted == Some(accepted_at) {
                entry.gate = RateLimitState::default();
            }
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis store
// ────────────────────────────────────────────────────────────────────────────

/// Deletes the gate key only if it still holds the caller's acceptance.
const RELEASE_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

#[derive(Clone)]
pub struct RedisGateStore {
    conn: MultiplexedConnection,
}

impl RedisGateStore {
    pub async fn connect(client: &redis::Client) -> Result<Self, StoreError> {
        let conn = client.get_multiplexed_tokio_connection().await?;
        Ok(Self { conn })
    }
}

fn session_key(session_id: Uuid) -> String {
    format!("feedback:session:{session_id}")
}

fn gate_key(session_id: Uuid) -> String {
    format!("feedback:gate:{session_id}")
}

fn gate_value(accepted_at: DateTime<Utc>) -> String {
    accepted_at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Redis expiry in whole milliseconds, never zero.
fn ttl_millis(ttl: Duration) -> u64 {
    let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    millis.max(1)
}

#[async_trait]
impl GateStore for RedisGateStore {
    async fn open_session(&self, session_id: Uuid, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(session_key(session_id))
            .arg(1)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    /// The gate key exists exactly while the session is inside its cooldown,
    /// so `SET NX PX` is the check-and-record step.
    async fn try_accept(
        &self,
        session_id: Uuid,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Result<GateDecision, StoreError> {
        let mut conn = self.conn.clone();
        let known: bool = redis::cmd("EXISTS")
            .arg(session_key(session_id))
            .query_async(&mut conn)
            .await?;
        if !known {
            return Err(StoreError::UnknownSession(session_id));
        }

        // Two rounds cover the key expiring between SET NX and PTTL.
        for _ in 0..2 {
            let set: Option<String> = redis::cmd("SET")
                .arg(gate_key(session_id))
                .arg(gate_value(now))
                .arg("NX")
                .arg("PX")
                .arg(ttl_millis(cooldown))
                .query_async(&mut conn)
                .await?;
            if set.is_some() {
                return Ok(GateDecision::Accepted);
            }

            let remaining_ms: i64 = redis::cmd("PTTL")
                .arg(gate_key(session_id))
                .query_async(&mut conn)
                .await?;
            if remaining_ms > 0 {
                return Ok(GateDecision::Rejected {
                    retry_after: Duration::from_millis(remaining_ms as u64),
                });
            }
            debug!(%session_id, remaining_ms, "Gate key vanished between SET NX and PTTL");
        }

        Ok(GateDecision::Rejected {
            retry_after: cooldown,
        })
    }

    async fn release(
        &self,
        session_id: Uuid,
        accepted_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        redis::Script::new(RELEASE_SCRIPT)
            .key(gate_key(session_id))
            .arg(gate_value(accepted_at))
            .invoke_async::<_, i64>(&mut conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;

    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(300);
    const SESSION_TTL: Duration = Duration::from_secs(3600);

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    async fn store_with(session: Uuid) -> MemoryGateStore {
        let store = MemoryGateStore::new();
        store.open_session(session, SESSION_TTL).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_unknown_session_is_rejected() {
        let store = MemoryGateStore::new();
        let session = Uuid::new_v4();
        assert!(matches!(
            store.try_accept(session, at(0), COOLDOWN).await,
            Err(StoreError::UnknownSession(id)) if id == session
        ));
    }

    #[tokio::test]
    async fn test_expired_session_is_unknown() {
        let store = MemoryGateStore::new();
        let session = Uuid::new_v4();
        store.open_session(session, Duration::ZERO).await.unwrap();
        assert!(matches!(
            store.try_accept(session, at(0), COOLDOWN).await,
            Err(StoreError::UnknownSession(_))
        ));
    }

    #[tokio::test]
    async fn test_cooldown_scenario_through_store() {
        let session = Uuid::new_v4();
        let store = store_with(session).await;

        assert_eq!(
            store.try_accept(session, at(0), COOLDOWN).await.unwrap(),
            GateDecision::Accepted
        );
        assert_eq!(
            store.try_accept(session, at(100), COOLDOWN).await.unwrap(),
            GateDecision::Rejected {
                retry_after: Duration::from_secs(200)
            }
        );
        assert_eq!(
            store.try_accept(session, at(301), COOLDOWN).await.unwrap(),
            GateDecision::Accepted
        );
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let store = store_with(a).await;
        store.open_session(b, SESSION_TTL).await.unwrap();

        assert_eq!(store.try_accept(a, at(0), COOLDOWN).await.unwrap(), GateDecision::Accepted);
        assert_eq!(store.try_accept(b, at(1), COOLDOWN).await.unwrap(), GateDecision::Accepted);
    }

    #[tokio::test]
    async fn test_concurrent_admissions_accept_exactly_one() {
        let session = Uuid::new_v4();
        let store = Arc::new(store_with(session).await);

        let attempts = (0..8).map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.try_accept(session, at(i), COOLDOWN).await.unwrap() })
        });
        let mut accepted = 0;
        for attempt in attempts.collect::<Vec<_>>() {
            if attempt.await.unwrap() == GateDecision::Accepted {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
    }

    #[tokio::test]
    async fn test_release_reopens_the_window() {
        let session = Uuid::new_v4();
        let store = store_with(session).await;

        store.try_accept(session, at(0), COOLDOWN).await.unwrap();
        store.release(session, at(0)).await.unwrap();

        assert_eq!(
            store.try_accept(session, at(10), COOLDOWN).await.unwrap(),
            GateDecision::Accepted
        );
    }

    #[tokio::test]
    async fn test_stale_release_keeps_newer_acceptance() {
        let session = Uuid::new_v4();
        let store = store_with(session).await;

        store.try_accept(session, at(0), COOLDOWN).await.unwrap();
        store.try_accept(session, at(400), COOLDOWN).await.unwrap();
        store.release(session, at(0)).await.unwrap();

        assert!(matches!(
            store.try_accept(session, at(450), COOLDOWN).await.unwrap(),
            GateDecision::Rejected { .. }
        ));
    }

    #[test]
    fn test_ttl_millis_is_never_zero() {
        assert_eq!(ttl_millis(Duration::from_secs(300)), 300_000);
        assert_eq!(ttl_millis(Duration::ZERO), 1);
    }

    #[test]
    fn test_redis_key_layout() {
        let id = Uuid::nil();
        assert_eq!(
            gate_key(id),
            "feedback:gate:00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            session_key(id),
            "feedback:session:00000000-0000-0000-0000-000000000000"
        );
    }
}
