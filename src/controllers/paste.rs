use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::escape::{escape_html, unescape_html};
use crate::fingerprint::fingerprint;
use crate::ids::{is_valid_paste_id, random_string, IdGenerator, DELETE_KEY_LEN};
use crate::models::PasteRecord;
use crate::types::api::{PasteContent, SavedPaste};

/// Language tag of pastes that are links to be redirected to.
pub const URL_LANGUAGE: &str = "url";

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?-u)^(http|ftp|https)://([\w_-]+(?:(?:\.[\w_-]+)+))([\w.,@?^=%&:/~+#-]*[\w@?^=%&/~+#-])?$",
    )
    .expect("url pattern is valid")
});

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Create, read and delete pastes.
#[derive(Clone)]
pub struct PasteStore {
    database: Database,
    ids: IdGenerator,
    base_url: String,
    clock: Clock,
}

impl PasteStore {
    pub fn new(database: Database, ids: IdGenerator, base_url: impl Into<String>) -> Self {
        PasteStore {
            database,
            ids,
            base_url: base_url.into(),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn url_for(&self, id: &str) -> String {
        format!("{}/{id}", self.base_url)
    }

    /// Store `raw`, or return the existing paste with the same content.
    pub async fn save(&self, raw: &str, expiry: &str, language: &str) -> AppResult<SavedPaste> {
        if language == URL_LANGUAGE && !URL_RE.is_match(raw) {
            return Err(AppError::InvalidUrl);
        }

        let hash = fingerprint(raw);
        let now = self.now();
        if let Some(existing) = self.database.find_by_hash(&hash).await? {
            if existing.is_expired(now) {
                info!("paste '{}' expired at {}, deleting", existing.id, existing.expiry);
                self.database.delete_paste(&existing.id).await?;
            } else {
                debug!("paste '{}' already holds this content", existing.id);
                return Ok(SavedPaste {
                    success: true,
                    url: self.url_for(&existing.id),
                    size: existing.data.len(),
                    sha1: existing.hash.unwrap_or(hash),
                    delkey: existing.delkey.unwrap_or_default(),
                    id: existing.id,
                });
            }
        }

        let mut paste = PasteRecord {
            id: String::new(),
            hash: Some(hash.clone()),
            data: escape_html(raw),
            delkey: Some(random_string(DELETE_KEY_LEN)),
            expiry: crate::expiry::resolve(expiry, now),
            language: language.to_owned(),
        };

        // an id that was free when drawn can still be taken by a concurrent save
        loop {
            paste.id = self.ids.generate(&self.database).await?;
            match self.database.insert_paste(&paste).await {
                Ok(()) => break,
                Err(AppError::IdConflict) => {
                    debug!("lost the race for paste id '{}', retrying", paste.id);
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "new paste: id='{}', language='{language}', size={}, expiry={}",
            paste.id,
            paste.data.len(),
            paste.expiry
        );

        Ok(SavedPaste {
            success: true,
            url: self.url_for(&paste.id),
            size: paste.data.len(),
            sha1: hash,
            delkey: paste.delkey.unwrap_or_default(),
            id: paste.id,
        })
    }

    /// Fetch a live paste, reaping it if it has expired.
    pub async fn get(&self, id: &str) -> AppResult<PasteContent> {
        let paste = self.live_paste(id).await?;
        Ok(PasteContent {
            content: unescape_html(&paste.data),
            language: paste.language,
        })
    }

    /// Remove a paste if `delete_key` matches the one it was created with.
    pub async fn delete(&self, id: &str, delete_key: &str) -> AppResult<()> {
        let paste = self.live_paste(id).await?;
        match paste.delkey {
            Some(real_delete_key) if real_delete_key == delete_key => {
                self.database.delete_paste(id).await?;
                info!("deleted paste '{id}'");
                Ok(())
            }
            _ => Err(AppError::Unauthorized),
        }
    }

    /// Delete every expired paste at once.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.database.delete_expired(self.now()).await
    }

    async fn live_paste(&self, id: &str) -> AppResult<PasteRecord> {
        if !is_valid_paste_id(id) {
            return Err(AppError::InvalidPaste);
        }

        let paste = self
            .database
            .get_paste(id)
            .await?
            .ok_or(AppError::InvalidPaste)?;

        if paste.is_expired(self.now()) {
            info!("paste '{id}' expired at {}, deleting", paste.expiry);
            self.database.delete_paste(id).await?;
            return Err(AppError::InvalidPaste);
        }

        Ok(paste)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_shape_check() {
        assert!(URL_RE.is_match("https://example.org"));
        assert!(URL_RE.is_match("ftp://files.example.org/pub/file.txt"));
        assert!(URL_RE.is_match("http://a.b/c?d=e#f"));
        assert!(!URL_RE.is_match("see http://a.b/c"));
        assert!(!URL_RE.is_match("https://example.org\nsecond line"));
        assert!(!URL_RE.is_match("https://exämple.org"));
        assert!(!URL_RE.is_match("example.org"));
        assert!(!URL_RE.is_match("https://localhost"));
        assert!(!URL_RE.is_match("mailto:someone@example.org"));
    }

    async fn store() -> PasteStore {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        PasteStore::new(db, IdGenerator::new(8).unwrap(), "http://paste.test")
    }

    #[tokio::test]
    async fn url_pastes_must_look_like_urls() {
        let store = store().await;
        assert!(matches!(
            store.save("not a link", "", URL_LANGUAGE).await,
            Err(AppError::InvalidUrl)
        ));
        assert!(matches!(
            store
                .save("https://example.org\nsecond line", "", URL_LANGUAGE)
                .await,
            Err(AppError::InvalidUrl)
        ));
        let saved = store
            .save("https://www.rust-lang.org/", "", URL_LANGUAGE)
            .await
            .unwrap();
        let paste = store.get(&saved.id).await.unwrap();
        assert_eq!(paste.language, URL_LANGUAGE);
        assert_eq!(paste.content, "https://www.rust-lang.org/");
    }

    #[tokio::test]
    async fn content_is_stored_escaped() {
        let store = store().await;
        let raw = "<script>alert('hi')</script>";
        let saved = store.save(raw, "", "").await.unwrap();

        let record = store.database().get_paste(&saved.id).await.unwrap().unwrap();
        assert_eq!(record.data, escape_html(raw));
        assert_eq!(saved.size, record.data.len());
        assert_eq!(store.get(&saved.id).await.unwrap().content, raw);
    }

    #[tokio::test]
    async fn links_use_the_base_url() {
        let store = store().await;
        let saved = store.save("hello", "", "").await.unwrap();
        assert_eq!(saved.url, format!("http://paste.test/{}", saved.id));
        assert_eq!(saved.delkey.len(), DELETE_KEY_LEN);
    }
}
