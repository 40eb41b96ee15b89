#![allow(dead_code)]

use std::path::Path;

use novella::config::{PasswordParams, StoreConfig};
use novella::store::{MemoryStore, Store};
use novella::types::{NewChapter, NewNovel, NovelStatus, UserId};

/// Store config with the cheapest password hashing argon2 allows.
pub fn fast_config(snapshot_path: Option<&Path>) -> StoreConfig {
    StoreConfig {
        snapshot_path: snapshot_path.map(Path::to_path_buf),
        password: PasswordParams::insecure_fast(),
        ..StoreConfig::default()
    }
}

pub fn memory_store() -> MemoryStore {
    MemoryStore::open(fast_config(None)).expect("open in-memory store")
}

pub fn register(store: &impl Store, name: &str) -> (UserId, String) {
    let (user, token) = store
        .register(name, &format!("{name}@example.com"), "secret")
        .expect("register user");
    (user.id, token)
}

pub fn novel(title: &str, status: NovelStatus) -> NewNovel {
    NewNovel {
        title: title.to_string(),
        status: Some(status),
        ..NewNovel::default()
    }
}

pub fn chapter(title: &str, position: Option<i64>) -> NewChapter {
    NewChapter {
        title: title.to_string(),
        content: format!("{title} content"),
        position,
    }
}
