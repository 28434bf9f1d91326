use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Reserved `site` value marking a freeform record (SSH key, note) whose
/// encrypted body is stored in the `password` column.
pub const RAW_SITE: &str = "raw";

/// A stored credential or freeform note entry.
///
/// `account`, `password` and `extra` hold crypto-codec tokens (or are
/// empty/NULL); they are never persisted as plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretRecord {
    pub id: i64,
    pub name: String,
    pub site: String,
    pub account: String,
    pub password: String,
    pub extra: Option<String>,
    pub expires_at: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl SecretRecord {
    /// True when this is a freeform record rather than account/password.
    pub fn is_raw(&self) -> bool {
        self.site == RAW_SITE
    }
}

/// Plaintext-only projection returned by list and search queries.
/// Ciphertext columns leave the store only via a single-record fetch.
#[derive(Debug, Clone, Serialize)]
pub struct SecretSummary {
    pub id: i64,
    pub name: String,
    pub site: String,
    pub expires_at: Option<NaiveDate>,
}
