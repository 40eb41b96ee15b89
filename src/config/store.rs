use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;

// Argon2id cost, following the OWASP minimum recommendation.
const DEFAULT_MEMORY_KIB: u32 = 19 * 1024;
const DEFAULT_ITERATIONS: u32 = 2;
const DEFAULT_PARALLELISM: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PasswordParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl PasswordParams {
    /// Lowest cost argon2 accepts. Only for tests and throwaway instances.
    #[must_use]
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_MEMORY_KIB,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// `None` keeps everything in memory; nothing is read or written.
    pub snapshot_path: Option<PathBuf>,
    /// `None` means sessions never expire.
    pub session_ttl: Option<Duration>,
    pub password: PasswordParams,
}

impl StoreConfig {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_snapshot<P: AsRef<Path>>(path: P) -> Self {
        Self {
            snapshot_path: Self::normalize_path(path.as_ref()),
            ..Self::default()
        }
    }

    /// Treats an empty or whitespace-only path as "no persistence".
    pub(crate) fn normalize_path(path: &Path) -> Option<PathBuf> {
        let raw = path.to_string_lossy();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    }
}
