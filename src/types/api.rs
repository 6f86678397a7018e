use serde::{Deserialize, Serialize};

/// Result of a save, also the JSON body returned by `POST /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedPaste {
    pub success: bool,
    pub id: String,
    pub sha1: String,
    pub url: String,
    pub size: usize,
    pub delkey: String,
}

/// Content of a live paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteContent {
    pub content: String,
    pub language: String,
}

/// Form fields accepted by `POST /`.
#[derive(Debug, Deserialize)]
pub struct SaveForm {
    #[serde(default)]
    pub p: String,
    #[serde(default)]
    pub expiry: String,
    #[serde(default)]
    pub lang: String,
}
