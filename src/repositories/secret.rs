use chrono::NaiveDate;
use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::error::Result;
use crate::models::secret::{SecretRecord, SecretSummary};

/// Maps a full `secrets` row to a `SecretRecord`.
fn row_to_record(row: &Row) -> Result<SecretRecord> {
    Ok(SecretRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        site: row.try_get("site")?,
        account: row.try_get("account")?,
        password: row.try_get("password")?,
        extra: row.try_get("extra")?,
        expires_at: row.try_get("expires_at")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Maps a plaintext-columns-only row to a `SecretSummary`.
fn row_to_summary(row: &Row) -> Result<SecretSummary> {
    Ok(SecretSummary {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        site: row.try_get("site")?,
        expires_at: row.try_get("expires_at")?,
    })
}

/// Inserts a fully-assembled record. Ciphertext fields must already be
/// crypto-codec tokens (or empty for raw records).
pub async fn insert(
    pool: &Pool,
    name: &str,
    site: &str,
    account: &str,
    password: &str,
    extra: Option<&str>,
    expires_at: Option<NaiveDate>,
) -> Result<SecretRecord> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            INSERT INTO secrets (name, site, account, password, extra, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, site, account, password, extra, expires_at, created_at
            "#,
            &[&name, &site, &account, &password, &extra, &expires_at],
        )
        .await?;
    row_to_record(&row)
}

/// Fetches a full record, ciphertext included, by id.
pub async fn find_by_id(pool: &Pool, id: i64) -> Result<Option<SecretRecord>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, name, site, account, password, extra, expires_at, created_at
            FROM secrets
            WHERE id = $1
            "#,
            &[&id],
        )
        .await?;
    row.map(|r| row_to_record(&r)).transpose()
}

/// Deletes a record by id. Returns whether a row was removed.
pub async fn delete_by_id(pool: &Pool, id: i64) -> Result<bool> {
    let client = pool.get().await?;
    let affected = client
        .execute("DELETE FROM secrets WHERE id = $1", &[&id])
        .await?;
    Ok(affected > 0)
}

/// Sets or clears a record's expiry date. Returns whether the id existed.
pub async fn update_expiry(pool: &Pool, id: i64, expires_at: Option<NaiveDate>) -> Result<bool> {
    let client = pool.get().await?;
    let affected = client
        .execute(
            "UPDATE secrets SET expires_at = $1 WHERE id = $2",
            &[&expires_at, &id],
        )
        .await?;
    Ok(affected > 0)
}

/// Case-insensitive substring search over name and site, most recent first.
pub async fn search_by_name_or_site(
    pool: &Pool,
    needle: &str,
    limit: i64,
) -> Result<Vec<SecretSummary>> {
    let client = pool.get().await?;
    let like = format!("%{}%", needle);
    let rows = client
        .query(
            r#"
            SELECT id, name, site, expires_at
            FROM secrets
            WHERE name ILIKE $1 OR site ILIKE $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
            &[&like, &limit],
        )
        .await?;
    rows.iter().map(row_to_summary).collect()
}

/// All records, most recent first.
pub async fn list_all(pool: &Pool) -> Result<Vec<SecretSummary>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT id, name, site, expires_at
            FROM secrets
            ORDER BY created_at DESC
            "#,
            &[],
        )
        .await?;
    rows.iter().map(row_to_summary).collect()
}

/// Records whose expiry falls within the next `days` days, soonest first.
/// Already-expired records are included; records without an expiry are not.
pub async fn list_expiring_within(pool: &Pool, days: i32) -> Result<Vec<SecretSummary>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT id, name, site, expires_at
            FROM secrets
            WHERE expires_at IS NOT NULL
              AND expires_at <= CURRENT_DATE + $1::int4
            ORDER BY expires_at ASC
            "#,
            &[&days],
        )
        .await?;
    rows.iter().map(row_to_summary).collect()
}
