//! Authorization rules shared by every store operation.
//!
//! Two rules decide everything:
//!
//! - **Draft visibility**: a draft novel and everything under it (chapters,
//!   comments, bookmarks) is visible only to its author. Published novels
//!   are visible to anyone, signed in or not.
//! - **Ownership**: creating, updating or deleting a novel or its chapters is
//!   reserved to the novel's author.
//!
//! These functions are pure; existence checks (`NotFound`) happen before
//! they are consulted.

use crate::error::{Error, Result};
use crate::types::{Comment, Novel, UserId};

/// What the requester wants to do with a novel or its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read the novel, its chapters or comments; comment; bookmark.
    View,
    /// Structural changes to the novel or its chapters.
    Modify,
}

fn is_author(novel: &Novel, requester: Option<UserId>) -> bool {
    requester == Some(novel.author_id)
}

#[must_use]
pub fn can_view(novel: &Novel, requester: Option<UserId>) -> bool {
    novel.is_published() || is_author(novel, requester)
}

#[must_use]
pub fn can_modify(novel: &Novel, requester: Option<UserId>) -> bool {
    is_author(novel, requester)
}

#[must_use]
pub fn permits(novel: &Novel, requester: Option<UserId>, access: Access) -> bool {
    match access {
        Access::View => can_view(novel, requester),
        Access::Modify => can_modify(novel, requester),
    }
}

/// Like [`permits`], returning `Forbidden` when the rule fails.
pub fn authorize(novel: &Novel, requester: Option<UserId>, access: Access) -> Result<()> {
    if permits(novel, requester, access) {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

/// A comment may be removed by whoever wrote it or by the novel's author.
#[must_use]
pub fn can_delete_comment(novel: &Novel, comment: &Comment, requester: Option<UserId>) -> bool {
    requester == Some(comment.user_id) || is_author(novel, requester)
}
