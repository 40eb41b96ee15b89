use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};

use super::Store;
use super::snapshot;
use super::tables::{Tables, normalize};
use crate::auth::policy::{self, Access};
use crate::auth::{CredentialHasher, generate_session_token, is_well_formed_token};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::types::*;

/// In-memory tables behind a single reader/writer lock, mirrored to a
/// snapshot file after every mutation.
///
/// Mutations hold the write lock across the snapshot write, so once one
/// returns `Ok` its effect is on disk. Reads share the lock and never see a
/// half-applied cascade.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    hasher: CredentialHasher,
    config: StoreConfig,
}

impl MemoryStore {
    /// Opens the store, restoring the snapshot when one exists at the
    /// configured path. A malformed snapshot is an error, never a partial load.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let tables = match &config.snapshot_path {
            Some(path) => match snapshot::load(path)? {
                Some(tables) => {
                    let counts = tables.counts();
                    tracing::info!(
                        "Loaded snapshot {}: {} users, {} novels, {} chapters, {} comments, {} bookmarks",
                        path.display(),
                        counts.users,
                        counts.novels,
                        counts.chapters,
                        counts.comments,
                        counts.bookmarks
                    );
                    tables
                }
                None => {
                    tracing::info!("No snapshot at {}, starting empty", path.display());
                    Tables::default()
                }
            },
            None => Tables::default(),
        };

        Ok(Self {
            tables: RwLock::new(tables),
            hasher: CredentialHasher::new(&config.password)?,
            config,
        })
    }

    /// Store with no snapshot file.
    pub fn in_memory() -> Result<Self> {
        Self::open(StoreConfig::in_memory())
    }

    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.config.snapshot_path.as_deref()
    }

    /// A consistent copy of the whole table set.
    #[must_use]
    pub fn tables(&self) -> Tables {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }

    fn session_ttl(&self) -> Option<Duration> {
        self.config.session_ttl
    }

    /// Writes the snapshot. Must be called with the write guard still held.
    fn persist(&self, tables: &Tables) -> Result<()> {
        let Some(path) = self.config.snapshot_path.as_deref() else {
            return Ok(());
        };

        match snapshot::save(path, tables) {
            Ok(bytes) => {
                tracing::debug!("Wrote snapshot {} ({bytes} bytes)", path.display());
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    "Snapshot write failed; mutation applied but durability unconfirmed: {e}"
                );
                Err(e.into())
            }
        }
    }

    fn issue_session(tables: &mut Tables, user_id: UserId, now: DateTime<Utc>) -> String {
        let mut token = generate_session_token();
        while tables.sessions.contains_key(&token) {
            token = generate_session_token();
        }
        tables.sessions.insert(
            token.clone(),
            Session {
                user_id,
                issued_at: now,
            },
        );
        token
    }
}

fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn valid_position(position: i64) -> Result<i64> {
    if position <= 0 {
        return Err(Error::Validation(
            "position must be a positive integer".to_string(),
        ));
    }
    Ok(position)
}

impl Store for MemoryStore {
    // Identity operations

    fn register(&self, username: &str, email: &str, password: &str) -> Result<(User, String)> {
        let username = required(username, "username")?;
        let email = required(email, "email")?;
        if password.trim().is_empty() {
            return Err(Error::Validation("password is required".to_string()));
        }

        let salt = CredentialHasher::generate_salt();
        let password_hash = self.hasher.hash(&salt, password)?;

        let mut tables = self.write();
        if tables.username_taken(&username) {
            return Err(Error::Conflict("username already exists".to_string()));
        }
        if tables.email_taken(&email) {
            return Err(Error::Conflict("email already exists".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: tables.allocate_user_id(),
            username,
            email,
            password_salt: salt,
            password_hash,
            created_at: now,
        };
        tables.insert_user(user.clone());
        tables.prune_expired_sessions(self.session_ttl(), now);
        let token = Self::issue_session(&mut tables, user.id, now);

        self.persist(&tables)?;
        tracing::info!("Registered user {}", user.id);
        Ok((user, token))
    }

    fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        let user = self
            .read()
            .user_by_email(email)
            .cloned()
            .ok_or(Error::Unauthorized)?;

        if !self.hasher.verify(password, &user.password_hash)? {
            return Err(Error::Unauthorized);
        }

        let mut tables = self.write();
        let now = Utc::now();
        tables.prune_expired_sessions(self.session_ttl(), now);
        let token = Self::issue_session(&mut tables, user.id, now);

        self.persist(&tables)?;
        tracing::info!("User {} logged in", user.id);
        Ok((user, token))
    }

    fn logout(&self, token: &str) -> Result<()> {
        let mut tables = self.write();
        let session = tables.sessions.remove(token).ok_or(Error::Unauthorized)?;

        self.persist(&tables)?;
        tracing::info!("User {} logged out", session.user_id);
        Ok(())
    }

    fn resolve_session(&self, token: &str) -> Result<User> {
        if !is_well_formed_token(token) {
            return Err(Error::Unauthorized);
        }
        self.read()
            .session_user(token, self.session_ttl(), Utc::now())
            .cloned()
    }

    // Novel operations

    fn create_novel(&self, requester: Option<UserId>, novel: NewNovel) -> Result<Novel> {
        let title = required(&novel.title, "title")?;

        let mut tables = self.write();
        let author_id = tables.require_user(requester)?.id;

        let now = Utc::now();
        let novel = Novel {
            id: tables.allocate_novel_id(),
            author_id,
            title,
            description: novel.description.trim().to_string(),
            genre: novel.genre.trim().to_string(),
            status: novel.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        tables.novels_by_id.insert(novel.id, novel.clone());

        self.persist(&tables)?;
        Ok(novel)
    }

    fn get_novel(&self, id: NovelId, requester: Option<UserId>) -> Result<Novel> {
        self.read()
            .resolve_novel(id, requester, Access::View)
            .cloned()
    }

    fn list_novels(&self, query: &NovelQuery, requester: Option<UserId>) -> Vec<Novel> {
        let needle = query
            .query
            .as_deref()
            .map(normalize)
            .filter(|q| !q.is_empty());

        let tables = self.read();
        let mut novels: Vec<Novel> = tables
            .novels_by_id
            .values()
            .filter(|n| query.author_id.is_none_or(|author| n.author_id == author))
            .filter(|n| {
                n.is_published() || (query.include_drafts && policy::can_modify(n, requester))
            })
            .filter(|n| {
                needle.as_deref().is_none_or(|q| {
                    normalize(&format!("{} {} {}", n.title, n.description, n.genre)).contains(q)
                })
            })
            .cloned()
            .collect();
        drop(tables);

        novels.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let limit = if query.limit == 0 {
            usize::MAX
        } else {
            query.limit
        };
        novels.into_iter().skip(query.offset).take(limit).collect()
    }

    fn update_novel(
        &self,
        id: NovelId,
        requester: Option<UserId>,
        patch: NovelPatch,
    ) -> Result<Novel> {
        let title = patch
            .title
            .as_deref()
            .map(|t| required(t, "title"))
            .transpose()?;

        let mut tables = self.write();
        tables.require_user(requester)?;
        tables.resolve_novel(id, requester, Access::Modify)?;

        let novel = tables.novels_by_id.get_mut(&id).ok_or(Error::NotFound)?;
        if let Some(title) = title {
            novel.title = title;
        }
        if let Some(description) = patch.description {
            novel.description = description.trim().to_string();
        }
        if let Some(genre) = patch.genre {
            novel.genre = genre.trim().to_string();
        }
        if let Some(status) = patch.status {
            novel.status = status;
        }
        novel.updated_at = Utc::now();
        let novel = novel.clone();

        self.persist(&tables)?;
        Ok(novel)
    }

    fn delete_novel(&self, id: NovelId, requester: Option<UserId>) -> Result<()> {
        let mut tables = self.write();
        tables.require_user(requester)?;
        tables.resolve_novel(id, requester, Access::Modify)?;

        let summary = tables.remove_novel(id);
        tracing::info!(
            "Deleted novel {id} with {} chapters, {} comments, {} bookmarks",
            summary.chapters,
            summary.comments,
            summary.bookmarks
        );

        self.persist(&tables)
    }

    // Chapter operations

    fn create_chapter(
        &self,
        novel_id: NovelId,
        requester: Option<UserId>,
        chapter: NewChapter,
    ) -> Result<Chapter> {
        let title = required(&chapter.title, "title")?;

        let mut tables = self.write();
        tables.require_user(requester)?;
        tables.resolve_novel(novel_id, requester, Access::Modify)?;

        let position = match chapter.position {
            Some(p) if p > 0 => p,
            _ => i64::try_from(tables.chapter_count(novel_id)).unwrap_or(i64::MAX - 1) + 1,
        };

        let now = Utc::now();
        let chapter = Chapter {
            id: tables.allocate_chapter_id(),
            novel_id,
            title,
            content: chapter.content,
            position,
            created_at: now,
            updated_at: now,
        };
        tables.insert_chapter(chapter.clone());
        tables.touch_novel(novel_id, now);

        self.persist(&tables)?;
        Ok(chapter)
    }

    fn get_chapter(
        &self,
        novel_id: NovelId,
        chapter_id: ChapterId,
        requester: Option<UserId>,
    ) -> Result<Chapter> {
        self.read()
            .resolve_chapter(novel_id, chapter_id, requester, Access::View)
            .cloned()
    }

    fn list_chapters(&self, novel_id: NovelId, requester: Option<UserId>) -> Result<Vec<Chapter>> {
        let tables = self.read();
        tables.resolve_novel(novel_id, requester, Access::View)?;

        let mut chapters: Vec<Chapter> = tables.chapters_of(novel_id).cloned().collect();
        // Stable: equal positions keep insertion order.
        chapters.sort_by_key(|ch| ch.position);
        Ok(chapters)
    }

    fn update_chapter(
        &self,
        novel_id: NovelId,
        chapter_id: ChapterId,
        requester: Option<UserId>,
        patch: ChapterPatch,
    ) -> Result<Chapter> {
        let title = patch
            .title
            .as_deref()
            .map(|t| required(t, "title"))
            .transpose()?;
        let position = patch.position.map(valid_position).transpose()?;

        let mut tables = self.write();
        tables.require_user(requester)?;
        tables.resolve_chapter(novel_id, chapter_id, requester, Access::Modify)?;

        let now = Utc::now();
        let chapter = tables
            .chapters_by_id
            .get_mut(&chapter_id)
            .ok_or(Error::NotFound)?;
        if let Some(title) = title {
            chapter.title = title;
        }
        if let Some(content) = patch.content {
            chapter.content = content;
        }
        if let Some(position) = position {
            chapter.position = position;
        }
        chapter.updated_at = now;
        let chapter = chapter.clone();
        tables.touch_novel(novel_id, now);

        self.persist(&tables)?;
        Ok(chapter)
    }

    fn delete_chapter(
        &self,
        novel_id: NovelId,
        chapter_id: ChapterId,
        requester: Option<UserId>,
    ) -> Result<()> {
        let mut tables = self.write();
        tables.require_user(requester)?;
        tables.resolve_chapter(novel_id, chapter_id, requester, Access::Modify)?;

        let cleared = tables.remove_chapter(novel_id, chapter_id);
        tables.touch_novel(novel_id, Utc::now());
        tracing::debug!("Deleted chapter {chapter_id}, cleared {cleared} bookmarks");

        self.persist(&tables)
    }

    // Comment operations

    fn create_comment(
        &self,
        novel_id: NovelId,
        chapter_id: Option<ChapterId>,
        requester: Option<UserId>,
        body: &str,
    ) -> Result<Comment> {
        let body = required(body, "body")?;

        let mut tables = self.write();
        let user_id = tables.require_user(requester)?.id;
        tables.resolve_novel(novel_id, requester, Access::View)?;
        if let Some(chapter_id) = chapter_id {
            tables.chapter_in_novel(novel_id, chapter_id)?;
        }

        let comment = Comment {
            id: tables.allocate_comment_id(),
            novel_id,
            chapter_id,
            user_id,
            body,
            created_at: Utc::now(),
        };
        tables.insert_comment(comment.clone());

        self.persist(&tables)?;
        Ok(comment)
    }

    fn list_comments(
        &self,
        novel_id: NovelId,
        chapter_id: Option<ChapterId>,
        requester: Option<UserId>,
    ) -> Result<Vec<Comment>> {
        let tables = self.read();
        tables.resolve_novel(novel_id, requester, Access::View)?;
        if let Some(chapter_id) = chapter_id {
            tables.chapter_in_novel(novel_id, chapter_id)?;
        }

        let mut comments: Vec<Comment> = tables
            .comments_of(novel_id)
            .filter(|c| chapter_id.is_none() || c.chapter_id == chapter_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    fn delete_comment(
        &self,
        novel_id: NovelId,
        comment_id: CommentId,
        requester: Option<UserId>,
    ) -> Result<()> {
        let mut tables = self.write();
        tables.require_user(requester)?;
        let novel = tables.resolve_novel(novel_id, requester, Access::View)?;
        let comment = tables.comment_in_novel(novel_id, comment_id)?;
        if !policy::can_delete_comment(novel, comment, requester) {
            return Err(Error::Forbidden);
        }

        tables.remove_comment(novel_id, comment_id);
        self.persist(&tables)
    }

    // Bookmark operations

    fn upsert_bookmark(
        &self,
        novel_id: NovelId,
        chapter_id: Option<ChapterId>,
        requester: Option<UserId>,
    ) -> Result<Bookmark> {
        let mut tables = self.write();
        let user_id = tables.require_user(requester)?.id;
        tables.resolve_novel(novel_id, requester, Access::View)?;
        let chapter_position = match chapter_id {
            Some(chapter_id) => Some(tables.chapter_in_novel(novel_id, chapter_id)?.position),
            None => None,
        };

        let bookmark = Bookmark {
            user_id,
            novel_id,
            chapter_id,
            chapter_position,
            updated_at: Utc::now(),
        };
        tables
            .bookmarks
            .insert(Bookmark::key(user_id, novel_id), bookmark.clone());

        self.persist(&tables)?;
        Ok(bookmark)
    }

    fn delete_bookmark(&self, novel_id: NovelId, requester: Option<UserId>) -> Result<()> {
        let mut tables = self.write();
        let user_id = tables.require_user(requester)?.id;
        tables
            .bookmarks
            .remove(&Bookmark::key(user_id, novel_id))
            .ok_or(Error::NotFound)?;

        self.persist(&tables)
    }

    fn list_bookmarks(&self, requester: Option<UserId>) -> Result<Vec<Bookmark>> {
        let tables = self.read();
        let user_id = tables.require_user(requester)?.id;

        let mut bookmarks: Vec<Bookmark> = tables
            .bookmarks
            .values()
            .filter(|b| b.user_id == user_id)
            .filter(|b| {
                tables
                    .novels_by_id
                    .get(&b.novel_id)
                    .is_some_and(|n| policy::can_view(n, requester))
            })
            .cloned()
            .collect();
        bookmarks.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.novel_id.cmp(&b.novel_id))
        });
        Ok(bookmarks)
    }
}
