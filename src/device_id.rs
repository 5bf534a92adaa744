//! Stable per-installation identifier
//!
//! Eleven characters drawn from a fixed 8-symbol alphabet, generated once
//! and persisted beside the settings file. Every sample carries it as
//! `yureId`.

use std::path::Path;

use rand::Rng;
use tracing::warn;

const ID_ALPHABET: &[u8] = b"YUREyure";
const ID_LEN: usize = 11;

/// Generate a fresh identifier.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

/// Whether a stored value is a well-formed identifier.
pub fn is_valid(id: &str) -> bool {
    id.len() == ID_LEN && id.bytes().all(|b| ID_ALPHABET.contains(&b))
}

/// Load the persisted identifier, generating and saving a new one on first
/// run or when the stored value is malformed.
pub fn load_or_create(path: &Path) -> anyhow::Result<String> {
    if let Ok(stored) = std::fs::read_to_string(path) {
        let stored = stored.trim();
        if is_valid(stored) {
            return Ok(stored.to_string());
        }
        warn!("stored device id is malformed, generating a new one");
    }

    let id = generate();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &id)?;
    Ok(id)
}
