//! PostgreSQL Store Implementation

use crate::domain::repository::{ReplayStore, SessionStore};
use crate::domain::value_objects::SessionId;
use crate::error::{GateError, GateResult};
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use std::time::Duration;

/// PostgreSQL-backed session and replay store
#[derive(Clone)]
pub struct PgGateStore {
    pool: PgPool,
}

impl PgGateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> GateResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| GateError::Store(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// Delete lapsed session values and replay records
    pub async fn cleanup_expired(&self) -> GateResult<u64> {
        let now_ms = Utc::now().timestamp_millis();

        let session_values =
            sqlx::query("DELETE FROM gate_session_values WHERE expires_at_ms <= $1")
                .bind(now_ms)
                .execute(&self.pool)
                .await?
                .rows_affected();

        let replay_records =
            sqlx::query("DELETE FROM gate_redeemed_challenges WHERE expires_at_ms <= $1")
                .bind(now_ms)
                .execute(&self.pool)
                .await?
                .rows_affected();

        tracing::info!(
            session_values,
            replay_records,
            "Cleaned up expired gate data"
        );

        Ok(session_values + replay_records)
    }
}

fn expires_at_ms(now_ms: i64, ttl: Duration) -> i64 {
    now_ms.saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX))
}

impl SessionStore for PgGateStore {
    async fn get(&self, session: &SessionId, key: &str) -> GateResult<Option<Value>> {
        let now_ms = Utc::now().timestamp_millis();

        let value = sqlx::query_scalar::<_, Json<Value>>(
            r#"
            SELECT value FROM gate_session_values
            WHERE session_id = $1 AND key = $2 AND expires_at_ms > $3
            "#,
        )
        .bind(session.as_uuid())
        .bind(key)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value.map(|Json(value)| value))
    }

    async fn set(&self, session: &SessionId, key: &str, value: Value, ttl: Duration) -> GateResult<()> {
        let expires_at_ms = expires_at_ms(Utc::now().timestamp_millis(), ttl);

        sqlx::query(
            r#"
            INSERT INTO gate_session_values (session_id, key, value, expires_at_ms)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (session_id, key)
            DO UPDATE SET
                value = EXCLUDED.value,
                expires_at_ms = EXCLUDED.expires_at_ms,
                updated_at = now()
            "#,
        )
        .bind(session.as_uuid())
        .bind(key)
        .bind(Json(value))
        .bind(expires_at_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, session: &SessionId, key: &str) -> GateResult<()> {
        sqlx::query("DELETE FROM gate_session_values WHERE session_id = $1 AND key = $2")
            .bind(session.as_uuid())
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

impl ReplayStore for PgGateStore {
    async fn get(&self, key: &str) -> GateResult<Option<String>> {
        let now_ms = Utc::now().timestamp_millis();

        let marker = sqlx::query_scalar::<_, String>(
            r#"
            SELECT marker FROM gate_redeemed_challenges
            WHERE challenge_id = $1 AND expires_at_ms > $2
            "#,
        )
        .bind(key)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        Ok(marker)
    }

    async fn insert_if_absent(&self, key: &str, value: &str, ttl: Duration) -> GateResult<bool> {
        let now_ms = Utc::now().timestamp_millis();
        let expires_at_ms = expires_at_ms(now_ms, ttl);

        // A lapsed row may be taken over; a live one wins the conflict.
        let inserted = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO gate_redeemed_challenges (challenge_id, marker, expires_at_ms)
            VALUES ($1, $2, $3)
            ON CONFLICT (challenge_id) DO UPDATE
                SET marker = EXCLUDED.marker, expires_at_ms = EXCLUDED.expires_at_ms
                WHERE gate_redeemed_challenges.expires_at_ms <= $4
            RETURNING challenge_id
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at_ms)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        if inserted.is_some() {
            tracing::debug!(challenge_id = %key, "Challenge redeemed");
        }

        Ok(inserted.is_some())
    }

    async fn remove(&self, key: &str) -> GateResult<()> {
        sqlx::query("DELETE FROM gate_redeemed_challenges WHERE challenge_id = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
