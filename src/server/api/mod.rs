mod account;
mod bookmarks;
mod chapters;
mod comments;
mod novels;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Accounts and sessions
        .route("/auth/register", post(account::register))
        .route("/auth/login", post(account::login))
        .route("/auth/logout", post(account::logout))
        .route("/me", get(account::me))
        .route("/me/bookmarks", get(bookmarks::list_bookmarks))
        // Novels
        .route("/novels", get(novels::list_novels).post(novels::create_novel))
        .route(
            "/novels/{id}",
            get(novels::get_novel)
                .patch(novels::update_novel)
                .delete(novels::delete_novel),
        )
        // Chapters
        .route(
            "/novels/{id}/chapters",
            get(chapters::list_chapters).post(chapters::create_chapter),
        )
        .route(
            "/novels/{id}/chapters/{chapter_id}",
            get(chapters::get_chapter)
                .patch(chapters::update_chapter)
                .delete(chapters::delete_chapter),
        )
        // Comments
        .route(
            "/novels/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/novels/{id}/comments/{comment_id}",
            delete(comments::delete_comment),
        )
        // Bookmark (one per user and novel)
        .route(
            "/novels/{id}/bookmark",
            post(bookmarks::upsert_bookmark).delete(bookmarks::delete_bookmark),
        )
}
