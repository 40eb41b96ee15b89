use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{
    ChapterId, ChapterPatch, NewChapter, NewNovel, NovelPatch, NovelQuery, NovelStatus, User,
    UserId,
};

fn parse_status(raw: Option<&str>) -> Result<Option<NovelStatus>> {
    raw.map(str::parse::<NovelStatus>).transpose()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user. Credentials never leave the store.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateNovelRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl CreateNovelRequest {
    pub fn into_new_novel(self) -> Result<NewNovel> {
        Ok(NewNovel {
            status: parse_status(self.status.as_deref())?,
            title: self.title,
            description: self.description,
            genre: self.genre,
        })
    }
}

/// Absent fields are left unchanged; an empty description or genre clears it.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateNovelRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl UpdateNovelRequest {
    pub fn into_patch(self) -> Result<NovelPatch> {
        Ok(NovelPatch {
            status: parse_status(self.status.as_deref())?,
            title: self.title,
            description: self.description,
            genre: self.genre,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListNovelsParams {
    pub q: Option<String>,
    pub author_id: Option<UserId>,
    #[serde(default)]
    pub include_drafts: bool,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl From<ListNovelsParams> for NovelQuery {
    fn from(params: ListNovelsParams) -> Self {
        Self {
            query: params.q,
            author_id: params.author_id.filter(|id| *id > 0),
            include_drafts: params.include_drafts,
            limit: params.limit,
            offset: params.offset,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChapterRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub position: Option<i64>,
}

impl From<CreateChapterRequest> for NewChapter {
    fn from(req: CreateChapterRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            position: req.position,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateChapterRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
}

impl From<UpdateChapterRequest> for ChapterPatch {
    fn from(req: UpdateChapterRequest) -> Self {
        Self {
            title: req.title,
            content: req.content,
            position: req.position,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub body: String,
    #[serde(default)]
    pub chapter_id: Option<ChapterId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListCommentsParams {
    pub chapter_id: Option<ChapterId>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookmarkRequest {
    #[serde(default)]
    pub chapter_id: Option<ChapterId>,
}
