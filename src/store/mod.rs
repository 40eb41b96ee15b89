mod memory;
pub mod snapshot;
mod tables;

pub use memory::MemoryStore;
pub use snapshot::SnapshotError;
pub use tables::{CascadeSummary, TableCounts, Tables, normalize};

use crate::error::Result;
use crate::types::*;

/// Store defines the data-store interface used by the HTTP layer.
///
/// Every operation takes the requester explicitly; `None` is an anonymous
/// caller. Mutations need an authenticated requester and fail with
/// `Unauthorized` otherwise. A mutation that returns `Error::Snapshot` has
/// been applied in memory but is not confirmed durable.
pub trait Store: Send + Sync {
    // Identity operations
    fn register(&self, username: &str, email: &str, password: &str) -> Result<(User, String)>;
    fn login(&self, email: &str, password: &str) -> Result<(User, String)>;
    fn logout(&self, token: &str) -> Result<()>;
    fn resolve_session(&self, token: &str) -> Result<User>;

    // Novel operations
    fn create_novel(&self, requester: Option<UserId>, novel: NewNovel) -> Result<Novel>;
    fn get_novel(&self, id: NovelId, requester: Option<UserId>) -> Result<Novel>;
    fn list_novels(&self, query: &NovelQuery, requester: Option<UserId>) -> Vec<Novel>;
    fn update_novel(&self, id: NovelId, requester: Option<UserId>, patch: NovelPatch)
    -> Result<Novel>;
    fn delete_novel(&self, id: NovelId, requester: Option<UserId>) -> Result<()>;

    // Chapter operations
    fn create_chapter(
        &self,
        novel_id: NovelId,
        requester: Option<UserId>,
        chapter: NewChapter,
    ) -> Result<Chapter>;
    fn get_chapter(
        &self,
        novel_id: NovelId,
        chapter_id: ChapterId,
        requester: Option<UserId>,
    ) -> Result<Chapter>;
    fn list_chapters(&self, novel_id: NovelId, requester: Option<UserId>) -> Result<Vec<Chapter>>;
    fn update_chapter(
        &self,
        novel_id: NovelId,
        chapter_id: ChapterId,
        requester: Option<UserId>,
        patch: ChapterPatch,
    ) -> Result<Chapter>;
    fn delete_chapter(
        &self,
        novel_id: NovelId,
        chapter_id: ChapterId,
        requester: Option<UserId>,
    ) -> Result<()>;

    // Comment operations
    fn create_comment(
        &self,
        novel_id: NovelId,
        chapter_id: Option<ChapterId>,
        requester: Option<UserId>,
        body: &str,
    ) -> Result<Comment>;
    fn list_comments(
        &self,
        novel_id: NovelId,
        chapter_id: Option<ChapterId>,
        requester: Option<UserId>,
    ) -> Result<Vec<Comment>>;
    fn delete_comment(
        &self,
        novel_id: NovelId,
        comment_id: CommentId,
        requester: Option<UserId>,
    ) -> Result<()>;

    // Bookmark operations (one per user and novel)
    fn upsert_bookmark(
        &self,
        novel_id: NovelId,
        chapter_id: Option<ChapterId>,
        requester: Option<UserId>,
    ) -> Result<Bookmark>;
    fn delete_bookmark(&self, novel_id: NovelId, requester: Option<UserId>) -> Result<()>;
    fn list_bookmarks(&self, requester: Option<UserId>) -> Result<Vec<Bookmark>>;
}
