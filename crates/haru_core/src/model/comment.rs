//! Comment document model.
//!
//! # Invariants
//! - `post_id` references an existing post for the comment lifetime.
//! - `likes` holds at most one entry per liker id; order is like order.

use crate::model::post::PostId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a comment.
pub type CommentId = Uuid;

/// One entry of a comment like-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentLike {
    /// Liker identity; membership is decided by this field only.
    #[serde(rename = "_id")]
    pub id: String,
    /// Display name captured at like time.
    pub name: String,
}

/// Outcome of [`Comment::toggle_like`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    Liked,
    Unliked,
}

/// User-authored reply to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: CommentId,
    pub post_id: PostId,
    /// Author identifier, serialized as `id` to match the document shape.
    #[serde(rename = "id")]
    pub author_id: String,
    pub name: String,
    pub profile_image: String,
    pub checked_badge: String,
    /// Body text, serialized as `comment`.
    #[serde(rename = "comment")]
    pub body: String,
    #[serde(rename = "likeIds")]
    pub likes: Vec<CommentLike>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Author-provided fields of a new comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: String,
    pub name: String,
    pub profile_image: String,
    pub checked_badge: String,
    pub body: String,
}

impl Comment {
    /// Creates a comment with a generated id and an empty like-list.
    pub fn new(fields: NewComment) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id: fields.post_id,
            author_id: fields.author_id,
            name: fields.name,
            profile_image: fields.profile_image,
            checked_badge: fields.checked_badge,
            body: fields.body,
            likes: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn is_authored_by(&self, requester_id: &str) -> bool {
        self.author_id == requester_id
    }

    /// Adds `liker_id` to the like-list, or removes it if already present.
    pub fn toggle_like(&mut self, liker_id: &str, liker_name: &str) -> LikeToggle {
        match self.likes.iter().position(|like| like.id == liker_id) {
            Some(index) => {
                self.likes.remove(index);
                LikeToggle::Unliked
            }
            None => {
                self.likes.push(CommentLike {
                    id: liker_id.to_string(),
                    name: liker_name.to_string(),
                });
                LikeToggle::Liked
            }
        }
    }
}

/// Comment read model with the like count computed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub num_likes: usize,
}

#[cfg(test)]
mod tests {
    use super::{Comment, LikeToggle, NewComment};
    use uuid::Uuid;

    fn sample() -> Comment {
        Comment::new(NewComment {
            post_id: Uuid::new_v4(),
            author_id: "author".to_string(),
            name: "Author".to_string(),
            profile_image: String::new(),
            checked_badge: String::new(),
            body: "hello".to_string(),
        })
    }

    #[test]
    fn toggle_like_appends_then_removes_by_id() {
        let mut comment = sample();
        assert_eq!(comment.toggle_like("u1", "One"), LikeToggle::Liked);
        assert_eq!(comment.toggle_like("u2", "Two"), LikeToggle::Liked);
        assert_eq!(comment.likes.len(), 2);

        // Name is ignored for membership.
        assert_eq!(comment.toggle_like("u1", "renamed"), LikeToggle::Unliked);
        assert_eq!(comment.likes.len(), 1);
        assert_eq!(comment.likes[0].id, "u2");
    }

    #[test]
    fn serializes_with_document_field_names() {
        let mut comment = sample();
        comment.toggle_like("u1", "One");
        let value = serde_json::to_value(&comment).unwrap();

        assert_eq!(value["id"], "author");
        assert_eq!(value["comment"], "hello");
        assert_eq!(value["_id"], comment.id.to_string());
        assert_eq!(value["postId"], comment.post_id.to_string());
        assert_eq!(value["likeIds"][0]["_id"], "u1");
    }
}
