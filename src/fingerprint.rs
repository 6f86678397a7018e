use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use sha1::{Digest, Sha1};

/// Deduplication key of a paste: SHA-1 of the raw content, URL-safe base64 with padding.
pub fn fingerprint(content: &str) -> String {
    let digest = Sha1::digest(content.as_bytes());
    URL_SAFE.encode(digest)
}
