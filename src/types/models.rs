use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub type UserId = i64;
pub type NovelId = i64;
pub type ChapterId = i64;
pub type CommentId = i64;

/// A registered account. Salt and hash are persisted with the snapshot but
/// never leave the server; the HTTP layer renders users through a DTO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_salt: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NovelStatus {
    #[default]
    Draft,
    Published,
}

impl NovelStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            NovelStatus::Draft => "draft",
            NovelStatus::Published => "published",
        }
    }
}

impl fmt::Display for NovelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NovelStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(NovelStatus::Draft),
            "published" => Ok(NovelStatus::Published),
            other => Err(Error::Validation(format!("invalid status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Novel {
    pub id: NovelId,
    pub author_id: UserId,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub status: NovelStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Novel {
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == NovelStatus::Published
    }
}

/// A chapter of a novel. `position` is a sort key, not an index: it need
/// not be unique or contiguous within a novel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub novel_id: NovelId,
    pub title: String,
    pub content: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub novel_id: NovelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<ChapterId>,
    pub user_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A reader's position in a novel. `chapter_position` is copied from the
/// chapter when the bookmark is written and is not kept in sync afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub user_id: UserId,
    pub novel_id: NovelId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<ChapterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_position: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

impl Bookmark {
    /// Composite key used by the bookmark table: `"<user_id>:<novel_id>"`.
    #[must_use]
    pub fn key(user_id: UserId, novel_id: NovelId) -> String {
        format!("{user_id}:{novel_id}")
    }

    pub(crate) fn clear_chapter(&mut self) {
        self.chapter_id = None;
        self.chapter_position = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
}
