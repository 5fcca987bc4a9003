//! Active session storage for token revocation.
//!
//! Every issued session token's JTI is recorded here; logout deletes the
//! row, which invalidates the token even before its expiry.

use sqlx::sqlite::SqlitePool;

/// An active session record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActiveSession {
    pub id: i64,
    pub jti: String,
    pub user_id: i64,
    pub issued_at: String,
    pub expires_at: String,
    pub created_at: String,
}

/// Store for managing active session tokens.
pub struct SessionTokenStore {
    pool: SqlitePool,
}

impl SessionTokenStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a newly issued session token.
    pub async fn create(
        &self,
        jti: &str,
        user_id: i64,
        issued_at: u64,
        expires_at: u64,
    ) -> Result<i64, sqlx::Error> {
        let issued_at_str = timestamp_to_datetime(issued_at);
        let expires_at_str = timestamp_to_datetime(expires_at);

        let result = sqlx::query(
            "INSERT INTO sessions (jti, user_id, issued_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(jti)
        .bind(user_id)
        .bind(&issued_at_str)
        .bind(&expires_at_str)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Get an active session by its JWT ID.
    pub async fn get_by_jti(&self, jti: &str) -> Result<Option<ActiveSession>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, jti, user_id, issued_at, expires_at, created_at FROM sessions WHERE jti = ?",
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete a session by its JWT ID (revoke). Returns whether a row existed.
    pub async fn delete_by_jti(&self, jti: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE jti = ?")
            .bind(jti)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete all expired sessions.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < datetime('now')")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete all sessions for a user (logout everywhere, account deletion).
    pub async fn delete_all_by_user(&self, user_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Convert a Unix timestamp to an ISO 8601 datetime string for SQLite.
fn timestamp_to_datetime(timestamp: u64) -> String {
    let secs = timestamp;
    let days_since_epoch = secs / 86400;
    let time_of_day = secs % 86400;
    let hours = time_of_day / 3600;
    let minutes = (time_of_day % 3600) / 60;
    let seconds = time_of_day % 60;

    let (year, month, day) = days_to_ymd(days_since_epoch as i64);

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year, month, day, hours, minutes, seconds
    )
}

/// Convert days since Unix epoch to year, month, day.
fn days_to_ymd(days: i64) -> (i32, u32, u32) {
    // Algorithm from http://howardhinnant.github.io/date_algorithms.html
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y as i32, m, d)
}
