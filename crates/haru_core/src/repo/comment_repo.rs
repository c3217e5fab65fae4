//! Comment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist comment documents and their like-lists.
//! - Keep `posts.comment_ids` in step with the `comments` table.
//!
//! # Invariants
//! - Creating or deleting a comment and rewriting the parent post reference
//!   list happen in one transaction; either both land or neither does.
//! - Comment listings follow insertion order (`rowid ASC`).
//! - `num_likes` is computed by the store from the live `like_ids` array.

use crate::model::comment::{Comment, CommentId, CommentView, LikeToggle};
use crate::model::post::{Post, PostId};
use crate::repo::post_repo::{load_post, store_comment_ids};
use crate::repo::{
    ensure_connection_ready, from_json_column, parse_uuid, to_json_column, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;

const COMMENT_SELECT_SQL: &str = "SELECT
    uuid,
    post_uuid,
    author_id,
    author_name,
    profile_image,
    checked_badge,
    body,
    like_ids,
    created_at,
    updated_at,
    json_array_length(like_ids) AS num_likes
FROM comments";

/// Result of repairing one post's comment reference list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostRefRepair {
    /// References dropped because the comment is gone or belongs elsewhere.
    pub removed: Vec<CommentId>,
    /// Comments of the post that were missing from the reference list.
    pub appended: Vec<CommentId>,
}

impl PostRefRepair {
    /// Returns whether the post was already consistent.
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.appended.is_empty()
    }
}

/// Repository interface for comment documents and post back-references.
pub trait CommentRepository {
    /// Gets the parent post of a comment flow.
    fn get_post(&self, post_id: PostId) -> RepoResult<Option<Post>>;
    /// Gets one comment by id.
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>>;
    /// Inserts a comment and appends its id to the parent post.
    ///
    /// Fails with `PostNotFound` without writing when the post is missing.
    fn create_comment_for_post(&self, comment: &Comment) -> RepoResult<CommentId>;
    /// Replaces the body text of one comment.
    fn update_comment_body(&self, id: CommentId, body: &str) -> RepoResult<()>;
    /// Adds or removes the like of `liker_id` and stores the new like-list.
    ///
    /// Read and write share one transaction so concurrent toggles serialize.
    fn toggle_comment_like(
        &self,
        id: CommentId,
        liker_id: &str,
        liker_name: &str,
    ) -> RepoResult<LikeToggle>;
    /// Removes the id from the parent post, then deletes the comment row.
    fn delete_comment_from_post(&self, id: CommentId) -> RepoResult<()>;
    /// Gets one comment with its computed like count.
    fn get_comment_view(&self, id: CommentId) -> RepoResult<Option<CommentView>>;
    /// Lists every comment of a post in insertion order.
    fn list_comment_views_by_post(&self, post_id: PostId) -> RepoResult<Vec<CommentView>>;
    /// Rebuilds `comment_ids` of a post from the comments that point at it.
    fn reconcile_post_refs(&self, post_id: PostId) -> RepoResult<PostRefRepair>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["posts", "comments"])?;
        Ok(Self { conn })
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn get_post(&self, post_id: PostId) -> RepoResult<Option<Post>> {
        load_post(self.conn, post_id)
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<Comment>> {
        load_comment(self.conn, id)
    }

    fn create_comment_for_post(&self, comment: &Comment) -> RepoResult<CommentId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut post =
            load_post(&tx, comment.post_id)?.ok_or(RepoError::PostNotFound(comment.post_id))?;

        tx.execute(
            "INSERT INTO comments (
                uuid,
                post_uuid,
                author_id,
                author_name,
                profile_image,
                checked_badge,
                body,
                like_ids
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                comment.id.to_string(),
                comment.post_id.to_string(),
                comment.author_id.as_str(),
                comment.name.as_str(),
                comment.profile_image.as_str(),
                comment.checked_badge.as_str(),
                comment.body.as_str(),
                to_json_column(&comment.likes, "comments.like_ids")?,
            ],
        )?;

        post.push_comment_ref(comment.id);
        store_comment_ids(&tx, post.id, &post.comment_ids)?;

        tx.commit()?;
        Ok(comment.id)
    }

    fn update_comment_body(&self, id: CommentId, body: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE comments
             SET
                body = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), body],
        )?;

        if changed == 0 {
            return Err(RepoError::CommentNotFound(id));
        }

        Ok(())
    }

    fn toggle_comment_like(
        &self,
        id: CommentId,
        liker_id: &str,
        liker_name: &str,
    ) -> RepoResult<LikeToggle> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut comment = load_comment(&tx, id)?.ok_or(RepoError::CommentNotFound(id))?;
        let outcome = comment.toggle_like(liker_id, liker_name);

        tx.execute(
            "UPDATE comments
             SET
                like_ids = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                to_json_column(&comment.likes, "comments.like_ids")?
            ],
        )?;

        tx.commit()?;
        Ok(outcome)
    }

    fn delete_comment_from_post(&self, id: CommentId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let comment = load_comment(&tx, id)?.ok_or(RepoError::CommentNotFound(id))?;
        let mut post =
            load_post(&tx, comment.post_id)?.ok_or(RepoError::PostNotFound(comment.post_id))?;

        post.remove_comment_ref(id);
        store_comment_ids(&tx, post.id, &post.comment_ids)?;
        tx.execute("DELETE FROM comments WHERE uuid = ?1;", [id.to_string()])?;

        tx.commit()?;
        Ok(())
    }

    fn get_comment_view(&self, id: CommentId) -> RepoResult<Option<CommentView>> {
        self.conn
            .query_row(
                &format!("{COMMENT_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(read_comment_view(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_comment_views_by_post(&self, post_id: PostId) -> RepoResult<Vec<CommentView>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL}
             WHERE post_uuid = ?1
             ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([post_id.to_string()])?;
        let mut views = Vec::new();
        while let Some(row) = rows.next()? {
            views.push(read_comment_view(row)?);
        }
        Ok(views)
    }

    fn reconcile_post_refs(&self, post_id: PostId) -> RepoResult<PostRefRepair> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let post = load_post(&tx, post_id)?.ok_or(RepoError::PostNotFound(post_id))?;
        let owned = list_comment_ids_by_post(&tx, post_id)?;
        let owned_set: HashSet<CommentId> = owned.iter().copied().collect();

        let mut repair = PostRefRepair::default();
        let mut kept = Vec::with_capacity(post.comment_ids.len());
        for id in post.comment_ids {
            if owned_set.contains(&id) && !kept.contains(&id) {
                kept.push(id);
            } else {
                repair.removed.push(id);
            }
        }
        for id in owned {
            if !kept.contains(&id) {
                kept.push(id);
                repair.appended.push(id);
            }
        }

        if !repair.is_clean() {
            store_comment_ids(&tx, post_id, &kept)?;
        }

        tx.commit()?;
        Ok(repair)
    }
}

fn load_comment(conn: &Connection, id: CommentId) -> RepoResult<Option<Comment>> {
    conn.query_row(
        &format!("{COMMENT_SELECT_SQL} WHERE uuid = ?1;"),
        [id.to_string()],
        |row| Ok(read_comment_columns(row)),
    )
    .optional()?
    .transpose()
}

fn list_comment_ids_by_post(conn: &Connection, post_id: PostId) -> RepoResult<Vec<CommentId>> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM comments
         WHERE post_uuid = ?1
         ORDER BY rowid ASC;",
    )?;
    let mut rows = stmt.query([post_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let uuid_text: String = row.get(0)?;
        ids.push(parse_uuid(&uuid_text, "comments.uuid")?);
    }
    Ok(ids)
}

fn read_comment_columns(row: &Row<'_>) -> RepoResult<Comment> {
    let uuid_text: String = row.get("uuid")?;
    let post_uuid_text: String = row.get("post_uuid")?;
    let like_ids_text: String = row.get("like_ids")?;
    Ok(Comment {
        id: parse_uuid(&uuid_text, "comments.uuid")?,
        post_id: parse_uuid(&post_uuid_text, "comments.post_uuid")?,
        author_id: row.get("author_id")?,
        name: row.get("author_name")?,
        profile_image: row.get("profile_image")?,
        checked_badge: row.get("checked_badge")?,
        body: row.get("body")?,
        likes: from_json_column(&like_ids_text, "comments.like_ids")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn read_comment_view(row: &Row<'_>) -> RepoResult<CommentView> {
    let comment = read_comment_columns(row)?;
    let num_likes: i64 = row.get("num_likes")?;
    let num_likes = usize::try_from(num_likes).map_err(|_| {
        RepoError::InvalidData(format!("invalid like count `{num_likes}` for {}", comment.id))
    })?;
    Ok(CommentView { comment, num_likes })
}
