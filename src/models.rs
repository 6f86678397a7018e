use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A row of the `pastebin` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct PasteRecord {
    pub id: String,
    /// Fingerprint of the unescaped content.
    pub hash: Option<String>,
    /// HTML-escaped content.
    pub data: String,
    pub delkey: Option<String>,
    pub expiry: DateTime<Utc>,
    pub language: String,
}

impl PasteRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }
}
