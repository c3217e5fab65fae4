//! Post document model.
//!
//! Posts are owned by the community board; this core only maintains the
//! ordered `comment_ids` reference list.

use crate::model::comment::CommentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a community post.
pub type PostId = Uuid;

/// Community post with its ordered comment references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: PostId,
    pub author_id: String,
    pub title: String,
    /// Insertion-ordered references to child comments.
    pub comment_ids: Vec<CommentId>,
    /// Epoch milliseconds, assigned by the store.
    pub created_at: i64,
    /// Epoch milliseconds, assigned by the store.
    pub updated_at: i64,
}

impl Post {
    /// Creates a post with a generated id and no comments.
    pub fn new(author_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id: author_id.into(),
            title: title.into(),
            comment_ids: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Returns whether `comment_id` is referenced by this post.
    pub fn references(&self, comment_id: CommentId) -> bool {
        self.comment_ids.contains(&comment_id)
    }

    /// Appends a comment reference.
    pub fn push_comment_ref(&mut self, comment_id: CommentId) {
        self.comment_ids.push(comment_id);
    }

    /// Drops every reference equal to `comment_id` by string comparison.
    ///
    /// Returns whether anything was removed.
    pub fn remove_comment_ref(&mut self, comment_id: CommentId) -> bool {
        let target = comment_id.to_string();
        let before = self.comment_ids.len();
        self.comment_ids.retain(|id| id.to_string() != target);
        self.comment_ids.len() != before
    }
}
