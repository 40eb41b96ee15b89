use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::policy::{self, Access};
use crate::error::{Error, Result};
use crate::types::{
    Bookmark, Chapter, ChapterId, Comment, CommentId, Novel, NovelId, Session, User, UserId,
};

/// Lower-cases and trims. Used for uniqueness and search only; stored values
/// keep their original casing.
#[must_use]
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

/// The complete table set. This struct is also the snapshot document, so
/// field names are part of the on-disk format.
///
/// Counters hold the last identifier handed out; the next one is `counter + 1`.
/// Ordered maps keep serialization deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    pub(crate) users_by_id: BTreeMap<UserId, User>,
    pub(crate) users_by_email: BTreeMap<String, UserId>,
    pub(crate) users_by_username: BTreeMap<String, UserId>,
    pub(crate) novels_by_id: BTreeMap<NovelId, Novel>,
    pub(crate) chapters_by_id: BTreeMap<ChapterId, Chapter>,
    pub(crate) chapter_ids_by_novel: BTreeMap<NovelId, Vec<ChapterId>>,
    pub(crate) comments_by_id: BTreeMap<CommentId, Comment>,
    pub(crate) comment_ids_by_novel: BTreeMap<NovelId, Vec<CommentId>>,
    pub(crate) bookmarks: BTreeMap<String, Bookmark>,
    pub(crate) sessions: BTreeMap<String, Session>,
    pub(crate) next_user_id: i64,
    pub(crate) next_novel_id: i64,
    pub(crate) next_chapter_id: i64,
    pub(crate) next_comment_id: i64,
}

/// Row counts, used for logging and `snapshot check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableCounts {
    pub users: usize,
    pub novels: usize,
    pub chapters: usize,
    pub comments: usize,
    pub bookmarks: usize,
    pub sessions: usize,
}

impl Tables {
    #[must_use]
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            users: self.users_by_id.len(),
            novels: self.novels_by_id.len(),
            chapters: self.chapters_by_id.len(),
            comments: self.comments_by_id.len(),
            bookmarks: self.bookmarks.len(),
            sessions: self.sessions.len(),
        }
    }

    // Identifier allocation

    pub(crate) fn allocate_user_id(&mut self) -> UserId {
        self.next_user_id += 1;
        self.next_user_id
    }

    pub(crate) fn allocate_novel_id(&mut self) -> NovelId {
        self.next_novel_id += 1;
        self.next_novel_id
    }

    pub(crate) fn allocate_chapter_id(&mut self) -> ChapterId {
        self.next_chapter_id += 1;
        self.next_chapter_id
    }

    pub(crate) fn allocate_comment_id(&mut self) -> CommentId {
        self.next_comment_id += 1;
        self.next_comment_id
    }

    // Identity

    pub(crate) fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users_by_email
            .get(&normalize(email))
            .and_then(|id| self.users_by_id.get(id))
    }

    pub(crate) fn username_taken(&self, username: &str) -> bool {
        self.users_by_username.contains_key(&normalize(username))
    }

    pub(crate) fn email_taken(&self, email: &str) -> bool {
        self.users_by_email.contains_key(&normalize(email))
    }

    pub(crate) fn insert_user(&mut self, user: User) {
        self.users_by_email.insert(normalize(&user.email), user.id);
        self.users_by_username
            .insert(normalize(&user.username), user.id);
        self.users_by_id.insert(user.id, user);
    }

    /// Resolves the acting user. Absent or unknown ids are `Unauthorized`.
    pub(crate) fn require_user(&self, requester: Option<UserId>) -> Result<&User> {
        requester
            .and_then(|id| self.users_by_id.get(&id))
            .ok_or(Error::Unauthorized)
    }

    pub(crate) fn session_user(
        &self,
        token: &str,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<&User> {
        let session = self.sessions.get(token).ok_or(Error::Unauthorized)?;
        if is_expired(session, ttl, now) {
            return Err(Error::Unauthorized);
        }
        self.users_by_id
            .get(&session.user_id)
            .ok_or(Error::Unauthorized)
    }

    pub(crate) fn prune_expired_sessions(&mut self, ttl: Option<Duration>, now: DateTime<Utc>) -> usize {
        if ttl.is_none() {
            return 0;
        }
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !is_expired(s, ttl, now));
        before - self.sessions.len()
    }

    // Resolve and authorize

    /// Looks up a novel and applies the access rule. `NotFound` wins over
    /// `Forbidden`.
    pub(crate) fn resolve_novel(
        &self,
        novel_id: NovelId,
        requester: Option<UserId>,
        access: Access,
    ) -> Result<&Novel> {
        let novel = self.novels_by_id.get(&novel_id).ok_or(Error::NotFound)?;
        policy::authorize(novel, requester, access)?;
        Ok(novel)
    }

    /// Resolves a chapter through its parent novel. A chapter that exists but
    /// belongs to another novel is `NotFound`.
    pub(crate) fn resolve_chapter(
        &self,
        novel_id: NovelId,
        chapter_id: ChapterId,
        requester: Option<UserId>,
        access: Access,
    ) -> Result<&Chapter> {
        self.resolve_novel(novel_id, requester, access)?;
        self.chapter_in_novel(novel_id, chapter_id)
    }

    pub(crate) fn chapter_in_novel(&self, novel_id: NovelId, chapter_id: ChapterId) -> Result<&Chapter> {
        self.chapters_by_id
            .get(&chapter_id)
            .filter(|ch| ch.novel_id == novel_id)
            .ok_or(Error::NotFound)
    }

    pub(crate) fn touch_novel(&mut self, novel_id: NovelId, now: DateTime<Utc>) {
        if let Some(novel) = self.novels_by_id.get_mut(&novel_id) {
            novel.updated_at = now;
        }
    }

    // Chapters

    pub(crate) fn chapter_count(&self, novel_id: NovelId) -> usize {
        self.chapter_ids_by_novel
            .get(&novel_id)
            .map_or(0, Vec::len)
    }

    pub(crate) fn insert_chapter(&mut self, chapter: Chapter) {
        self.chapter_ids_by_novel
            .entry(chapter.novel_id)
            .or_default()
            .push(chapter.id);
        self.chapters_by_id.insert(chapter.id, chapter);
    }

    /// Chapters of a novel in insertion order.
    pub(crate) fn chapters_of(&self, novel_id: NovelId) -> impl Iterator<Item = &Chapter> {
        self.chapter_ids_by_novel
            .get(&novel_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.chapters_by_id.get(id))
    }

    /// Removes a chapter and narrows bookmarks that pointed at it to the
    /// novel level. Comments on the chapter are kept.
    pub(crate) fn remove_chapter(&mut self, novel_id: NovelId, chapter_id: ChapterId) -> usize {
        self.chapters_by_id.remove(&chapter_id);
        if let Some(ids) = self.chapter_ids_by_novel.get_mut(&novel_id) {
            ids.retain(|id| *id != chapter_id);
        }

        let mut cleared = 0;
        for bookmark in self.bookmarks.values_mut() {
            if bookmark.novel_id == novel_id && bookmark.chapter_id == Some(chapter_id) {
                bookmark.clear_chapter();
                cleared += 1;
            }
        }
        cleared
    }

    // Comments

    pub(crate) fn insert_comment(&mut self, comment: Comment) {
        self.comment_ids_by_novel
            .entry(comment.novel_id)
            .or_default()
            .push(comment.id);
        self.comments_by_id.insert(comment.id, comment);
    }

    /// Comments of a novel in insertion order.
    pub(crate) fn comments_of(&self, novel_id: NovelId) -> impl Iterator<Item = &Comment> {
        self.comment_ids_by_novel
            .get(&novel_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.comments_by_id.get(id))
    }

    pub(crate) fn comment_in_novel(&self, novel_id: NovelId, comment_id: CommentId) -> Result<&Comment> {
        self.comments_by_id
            .get(&comment_id)
            .filter(|c| c.novel_id == novel_id)
            .ok_or(Error::NotFound)
    }

    pub(crate) fn remove_comment(&mut self, novel_id: NovelId, comment_id: CommentId) {
        self.comments_by_id.remove(&comment_id);
        if let Some(ids) = self.comment_ids_by_novel.get_mut(&novel_id) {
            ids.retain(|id| *id != comment_id);
        }
    }

    // Novels

    /// Removes a novel with all its chapters, comments and bookmarks.
    pub(crate) fn remove_novel(&mut self, novel_id: NovelId) -> CascadeSummary {
        self.novels_by_id.remove(&novel_id);

        let chapter_ids = self.chapter_ids_by_novel.remove(&novel_id).unwrap_or_default();
        for id in &chapter_ids {
            self.chapters_by_id.remove(id);
        }

        let comment_ids = self.comment_ids_by_novel.remove(&novel_id).unwrap_or_default();
        for id in &comment_ids {
            self.comments_by_id.remove(id);
        }

        let before = self.bookmarks.len();
        self.bookmarks.retain(|_, b| b.novel_id != novel_id);

        CascadeSummary {
            chapters: chapter_ids.len(),
            comments: comment_ids.len(),
            bookmarks: before - self.bookmarks.len(),
        }
    }

    /// Structural checks run after loading a snapshot.
    pub(crate) fn check_integrity(&self) -> std::result::Result<(), String> {
        for (id, user) in &self.users_by_id {
            if *id != user.id {
                return Err(format!("user keyed {id} has id {}", user.id));
            }
        }
        for (index, name) in [
            (&self.users_by_email, "users_by_email"),
            (&self.users_by_username, "users_by_username"),
        ] {
            if let Some((key, id)) = index.iter().find(|(_, id)| !self.users_by_id.contains_key(id)) {
                return Err(format!("{name} entry '{key}' points at missing user {id}"));
            }
        }
        for (id, novel) in &self.novels_by_id {
            if *id != novel.id {
                return Err(format!("novel keyed {id} has id {}", novel.id));
            }
        }
        for chapter in self.chapters_by_id.values() {
            if !self.novels_by_id.contains_key(&chapter.novel_id) {
                return Err(format!(
                    "chapter {} belongs to missing novel {}",
                    chapter.id, chapter.novel_id
                ));
            }
        }
        for (novel_id, ids) in &self.chapter_ids_by_novel {
            if let Some(id) = ids.iter().find(|id| {
                self.chapters_by_id
                    .get(id)
                    .is_none_or(|ch| ch.novel_id != *novel_id)
            }) {
                return Err(format!("chapter index for novel {novel_id} lists stray chapter {id}"));
            }
        }
        for (novel_id, ids) in &self.comment_ids_by_novel {
            if let Some(id) = ids.iter().find(|id| {
                self.comments_by_id
                    .get(id)
                    .is_none_or(|c| c.novel_id != *novel_id)
            }) {
                return Err(format!("comment index for novel {novel_id} lists stray comment {id}"));
            }
        }
        for (key, bookmark) in &self.bookmarks {
            if *key != Bookmark::key(bookmark.user_id, bookmark.novel_id) {
                return Err(format!("bookmark keyed '{key}' does not match its contents"));
            }
        }

        let max_key = |keys: Option<&i64>| keys.copied().unwrap_or(0);
        let counters = [
            ("user", self.next_user_id, max_key(self.users_by_id.keys().next_back())),
            ("novel", self.next_novel_id, max_key(self.novels_by_id.keys().next_back())),
            ("chapter", self.next_chapter_id, max_key(self.chapters_by_id.keys().next_back())),
            ("comment", self.next_comment_id, max_key(self.comments_by_id.keys().next_back())),
        ];
        for (name, counter, max_id) in counters {
            if counter < max_id {
                return Err(format!("{name} counter {counter} is behind highest id {max_id}"));
            }
        }
        Ok(())
    }
}

/// What a novel deletion took with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CascadeSummary {
    pub chapters: usize,
    pub comments: usize,
    pub bookmarks: usize,
}

/// An expiry past the representable date range never arrives.
fn is_expired(session: &Session, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
    ttl.is_some_and(|ttl| {
        session
            .issued_at
            .checked_add_signed(ttl)
            .is_some_and(|expires_at| expires_at < now)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NovelStatus;

    fn user(id: UserId, name: &str) -> User {
        User {
            id,
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_salt: String::new(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    fn novel(id: NovelId, author_id: UserId, status: NovelStatus) -> Novel {
        let now = Utc::now();
        Novel {
            id,
            author_id,
            title: format!("Novel {id}"),
            description: String::new(),
            genre: String::new(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn chapter(id: ChapterId, novel_id: NovelId, position: i64) -> Chapter {
        let now = Utc::now();
        Chapter {
            id,
            novel_id,
            title: format!("Chapter {id}"),
            content: String::new(),
            position,
            created_at: now,
            updated_at: now,
        }
    }

    fn populated() -> Tables {
        let mut tables = Tables::default();
        let alice = tables.allocate_user_id();
        tables.insert_user(user(alice, "Alice"));
        let nid = tables.allocate_novel_id();
        tables.novels_by_id.insert(nid, novel(nid, alice, NovelStatus::Published));
        for pos in [1, 2] {
            let cid = tables.allocate_chapter_id();
            tables.insert_chapter(chapter(cid, nid, pos));
        }
        let comment_id = tables.allocate_comment_id();
        tables.insert_comment(Comment {
            id: comment_id,
            novel_id: nid,
            chapter_id: Some(1),
            user_id: alice,
            body: "first".to_string(),
            created_at: Utc::now(),
        });
        tables.bookmarks.insert(
            Bookmark::key(alice, nid),
            Bookmark {
                user_id: alice,
                novel_id: nid,
                chapter_id: Some(2),
                chapter_position: Some(2),
                updated_at: Utc::now(),
            },
        );
        tables
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_user_indexes_are_normalized() {
        let tables = populated();
        assert!(tables.username_taken(" alice "));
        assert!(tables.email_taken("ALICE@example.com"));
        assert_eq!(tables.user_by_email("Alice@Example.com").unwrap().username, "Alice");
    }

    #[test]
    fn test_resolve_novel_not_found_before_forbidden() {
        let mut tables = populated();
        tables.novels_by_id.insert(2, novel(2, 1, NovelStatus::Draft));
        tables.next_novel_id = 2;

        assert!(matches!(tables.resolve_novel(99, Some(5), Access::View), Err(Error::NotFound)));
        assert!(matches!(tables.resolve_novel(2, Some(5), Access::View), Err(Error::Forbidden)));
        assert!(tables.resolve_novel(2, Some(1), Access::Modify).is_ok());
    }

    #[test]
    fn test_resolve_chapter_wrong_novel() {
        let mut tables = populated();
        tables.novels_by_id.insert(2, novel(2, 1, NovelStatus::Published));
        tables.next_novel_id = 2;
        assert!(matches!(
            tables.resolve_chapter(2, 1, None, Access::View),
            Err(Error::NotFound)
        ));
        assert!(tables.resolve_chapter(1, 1, None, Access::View).is_ok());
    }

    #[test]
    fn test_remove_chapter_clears_bookmark() {
        let mut tables = populated();
        let cleared = tables.remove_chapter(1, 2);
        assert_eq!(cleared, 1);

        let bookmark = &tables.bookmarks[&Bookmark::key(1, 1)];
        assert_eq!(bookmark.chapter_id, None);
        assert_eq!(bookmark.chapter_position, None);
        assert_eq!(tables.chapter_ids_by_novel[&1], vec![1]);
        assert_eq!(tables.comments_by_id.len(), 1);
    }

    #[test]
    fn test_remove_novel_cascades() {
        let mut tables = populated();
        let summary = tables.remove_novel(1);
        assert_eq!(
            summary,
            CascadeSummary {
                chapters: 2,
                comments: 1,
                bookmarks: 1
            }
        );
        assert!(tables.chapters_by_id.is_empty());
        assert!(tables.comments_by_id.is_empty());
        assert!(tables.bookmarks.is_empty());
        assert!(!tables.chapter_ids_by_novel.contains_key(&1));
        assert!(tables.check_integrity().is_ok());
    }

    #[test]
    fn test_session_expiry() {
        let mut tables = populated();
        let issued_at = Utc::now() - Duration::hours(2);
        tables.sessions.insert("tok".to_string(), Session { user_id: 1, issued_at });

        let now = Utc::now();
        assert!(tables.session_user("tok", None, now).is_ok());
        assert!(tables.session_user("tok", Some(Duration::hours(3)), now).is_ok());
        assert!(matches!(
            tables.session_user("tok", Some(Duration::hours(1)), now),
            Err(Error::Unauthorized)
        ));

        assert_eq!(tables.prune_expired_sessions(Some(Duration::hours(1)), now), 1);
        assert!(tables.sessions.is_empty());
    }

    #[test]
    fn test_session_with_unreachable_expiry_stays_valid() {
        let mut tables = populated();
        let issued_at = Utc::now();
        tables.sessions.insert("tok".to_string(), Session { user_id: 1, issued_at });

        let ttl = Some(Duration::seconds(10_000_000_000_000));
        assert!(tables.session_user("tok", ttl, issued_at).is_ok());
        assert_eq!(tables.prune_expired_sessions(ttl, issued_at), 0);
        assert_eq!(tables.sessions.len(), 1);
    }

    #[test]
    fn test_integrity_detects_lagging_counter() {
        let mut tables = populated();
        assert!(tables.check_integrity().is_ok());
        tables.next_chapter_id = 1;
        let err = tables.check_integrity().unwrap_err();
        assert!(err.contains("chapter counter"));
    }

    #[test]
    fn test_integrity_detects_stray_index_entry() {
        let mut tables = populated();
        tables.chapter_ids_by_novel.get_mut(&1).unwrap().push(42);
        assert!(tables.check_integrity().is_err());
    }
}
