//! Post repository contracts and SQLite implementation.
//!
//! Posts are seeded by the community board; comment flows only read them and
//! rewrite `comment_ids` through [`crate::repo::comment_repo`].

use crate::model::comment::CommentId;
use crate::model::post::{Post, PostId};
use crate::repo::{
    ensure_connection_ready, from_json_column, parse_uuid, to_json_column, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const POST_SELECT_SQL: &str = "SELECT
    uuid,
    author_id,
    title,
    comment_ids,
    created_at,
    updated_at
FROM posts";

/// Repository interface for post documents.
pub trait PostRepository {
    /// Inserts a post and returns its id.
    fn create_post(&self, post: &Post) -> RepoResult<PostId>;
    /// Gets one post by id.
    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["posts"])?;
        Ok(Self { conn })
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn create_post(&self, post: &Post) -> RepoResult<PostId> {
        self.conn.execute(
            "INSERT INTO posts (uuid, author_id, title, comment_ids)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                post.id.to_string(),
                post.author_id.as_str(),
                post.title.as_str(),
                to_json_column(&post.comment_ids, "posts.comment_ids")?,
            ],
        )?;
        Ok(post.id)
    }

    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>> {
        load_post(self.conn, id)
    }
}

/// Loads one post on any connection or open transaction.
pub(crate) fn load_post(conn: &Connection, id: PostId) -> RepoResult<Option<Post>> {
    conn.query_row(
        &format!("{POST_SELECT_SQL} WHERE uuid = ?1;"),
        [id.to_string()],
        |row| Ok(read_post_columns(row)),
    )
    .optional()?
    .transpose()
}

/// Overwrites the comment reference list of a post.
pub(crate) fn store_comment_ids(
    conn: &Connection,
    post_id: PostId,
    comment_ids: &[CommentId],
) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE posts
         SET
            comment_ids = ?2,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?1;",
        params![
            post_id.to_string(),
            to_json_column(comment_ids, "posts.comment_ids")?,
        ],
    )?;

    if changed == 0 {
        return Err(RepoError::PostNotFound(post_id));
    }

    Ok(())
}

fn read_post_columns(row: &Row<'_>) -> RepoResult<Post> {
    let uuid_text: String = row.get("uuid")?;
    let comment_ids_text: String = row.get("comment_ids")?;
    Ok(Post {
        id: parse_uuid(&uuid_text, "posts.uuid")?,
        author_id: row.get("author_id")?,
        title: row.get("title")?,
        comment_ids: from_json_column(&comment_ids_text, "posts.comment_ids")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
