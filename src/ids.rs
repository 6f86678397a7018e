use std::sync::Arc;

use rand::{thread_rng, Rng};
use tracing::debug;

use crate::db::Database;
use crate::error::{AppError, AppResult};

/// Characters paste ids and delete keys are drawn from.
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Maximum paste id length.
pub const MAX_ID_LEN: usize = 30;

/// Delete key length.
pub const DELETE_KEY_LEN: usize = 40;

/// Draws a candidate id of the given length.
pub type IdSource = Arc<dyn Fn(usize) -> String + Send + Sync>;

/// Produces paste ids that are not yet present in the database.
#[derive(Clone)]
pub struct IdGenerator {
    length: usize,
    source: IdSource,
}

impl IdGenerator {
    /// `length` must already be clamped to [`MAX_ID_LEN`].
    pub fn new(length: usize) -> AppResult<Self> {
        if length == 0 {
            return Err(AppError::Configuration("paste id is too short".into()));
        }
        if length > MAX_ID_LEN {
            return Err(AppError::Configuration(format!(
                "paste id length {length} exceeds {MAX_ID_LEN}"
            )));
        }
        Ok(IdGenerator {
            length,
            source: Arc::new(random_string),
        })
    }

    /// Replace the random candidate source.
    pub fn with_source(mut self, source: IdSource) -> Self {
        self.source = source;
        self
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Draw candidates until one is unused.
    pub async fn generate(&self, db: &Database) -> AppResult<String> {
        loop {
            let id = (self.source)(self.length);
            if !db.paste_exists(&id).await? {
                return Ok(id);
            }
            debug!("paste id '{id}' already taken, drawing another");
        }
    }
}

/// A random string of `len` characters from [`ALPHABET`].
pub fn random_string(len: usize) -> String {
    let mut rng = thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Whether `id` has the shape of a paste id. Says nothing about existence.
pub fn is_valid_paste_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_ID_LEN && id.bytes().all(|b| ALPHABET.contains(&b))
}
