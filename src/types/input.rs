use super::{NovelStatus, UserId};

/// Fields for a new novel. `status` defaults to draft.
#[derive(Debug, Clone, Default)]
pub struct NewNovel {
    pub title: String,
    pub description: String,
    pub genre: String,
    pub status: Option<NovelStatus>,
}

/// Partial novel update. `None` leaves a field untouched; `Some("")`
/// clears description or genre. An empty title is rejected.
#[derive(Debug, Clone, Default)]
pub struct NovelPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub status: Option<NovelStatus>,
}

/// Fields for a new chapter. A missing or non-positive position places the
/// chapter after the novel's current chapter count.
#[derive(Debug, Clone, Default)]
pub struct NewChapter {
    pub title: String,
    pub content: String,
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ChapterPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub position: Option<i64>,
}

/// Filters for novel listing.
///
/// `include_drafts` only ever surfaces drafts written by the requester.
/// `limit == 0` means unbounded.
#[derive(Debug, Clone, Default)]
pub struct NovelQuery {
    pub query: Option<String>,
    pub author_id: Option<UserId>,
    pub include_drafts: bool,
    pub limit: usize,
    pub offset: usize,
}
