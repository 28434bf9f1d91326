use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;

use crate::error::Result;
use crate::models::session::{is_stale, SessionData};

/// Loads the user's pending session.
///
/// Returns a fresh idle session when no row exists, or when the row has
/// outlived the session TTL — in which case the stale row is deleted as a
/// side effect (lazy expiry, no background sweeper needed).
pub async fn get(pool: &Pool, user_id: i64) -> Result<SessionData> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT data, updated_at FROM sessions WHERE user_id = $1",
            &[&user_id],
        )
        .await?;

    let Some(row) = row else {
        return Ok(SessionData::idle());
    };

    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
    if is_stale(updated_at, Utc::now()) {
        clear(pool, user_id).await?;
        return Ok(SessionData::idle());
    }

    let data: String = row.try_get("data")?;
    Ok(sonic_rs::from_str(&data)?)
}

/// Upserts the user's session, stamping `updated_at = now()`.
/// One session per user — the primary key enforces the replace.
pub async fn set(pool: &Pool, user_id: i64, data: &SessionData) -> Result<()> {
    let json = sonic_rs::to_string(data)?;
    let client = pool.get().await?;
    client
        .execute(
            r#"
            INSERT INTO sessions (user_id, step, data, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (user_id) DO UPDATE
            SET step = EXCLUDED.step, data = EXCLUDED.data, updated_at = now()
            "#,
            &[&user_id, &data.step.as_str(), &json],
        )
        .await?;
    Ok(())
}

/// Drops the user's session, pending flow included.
pub async fn clear(pool: &Pool, user_id: i64) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute("DELETE FROM sessions WHERE user_id = $1", &[&user_id])
        .await?;
    Ok(())
}
