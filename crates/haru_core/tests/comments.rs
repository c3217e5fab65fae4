use haru_core::db::{open_db, open_db_in_memory};
use haru_core::{
    CommentFailure, CommentOperation, CommentService, CreateCommentRequest, ErrorKind, Post,
    PostId, PostRepository, SqliteCommentRepository, SqlitePostRepository,
    COMMENT_DELETED_MESSAGE,
};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn insert_post(conn: &Connection) -> PostId {
    let repo = SqlitePostRepository::try_new(conn).unwrap();
    repo.create_post(&Post::new("board-owner", "question")).unwrap()
}

fn load_post(conn: &Connection, post_id: PostId) -> Post {
    let repo = SqlitePostRepository::try_new(conn).unwrap();
    repo.get_post(post_id).unwrap().unwrap()
}

fn request(post_id: PostId, author_id: &str, body: &str) -> CreateCommentRequest {
    CreateCommentRequest {
        post_id,
        author_id: author_id.to_string(),
        name: format!("{author_id}-name"),
        profile_image: "profile.png".to_string(),
        checked_badge: "gold".to_string(),
        body: body.to_string(),
    }
}

fn comment_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM comments;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn create_comment_appends_exactly_one_reference_to_post() {
    let conn = setup();
    let post_id = insert_post(&conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());

    let first = service
        .create_comment(request(post_id, "alice", "first"))
        .unwrap();
    assert_eq!(load_post(&conn, post_id).comment_ids, vec![first.id]);

    let second = service
        .create_comment(request(post_id, "bob", "second"))
        .unwrap();
    let post = load_post(&conn, post_id);
    assert_eq!(post.comment_ids.len(), 2);
    assert!(post.references(second.id));

    assert_eq!(second.post_id, post_id);
    assert_eq!(second.author_id, "bob");
    assert_eq!(second.name, "bob-name");
    assert_eq!(second.profile_image, "profile.png");
    assert_eq!(second.checked_badge, "gold");
    assert_eq!(second.body, "second");
    assert!(second.likes.is_empty());
}

#[test]
fn create_comment_on_missing_post_fails_without_writing() {
    let conn = setup();
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());

    let err = service
        .create_comment(request(Uuid::new_v4(), "alice", "orphan"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.operation, CommentOperation::Create);
    assert_eq!(err.to_string(), "커뮤니티 댓글 생성에 실패하였습니다.");
    assert_eq!(err.detail_message(), "게시글을 찾을 수 없습니다.");
    assert_eq!(comment_rows(&conn), 0);
}

#[test]
fn update_comment_replaces_body_only_for_author() {
    let conn = setup();
    let post_id = insert_post(&conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let created = service
        .create_comment(request(post_id, "alice", "draft"))
        .unwrap();

    let updated = service
        .update_comment(created.id, "final", "alice")
        .unwrap();
    assert_eq!(updated.body, "final");
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.post_id, created.post_id);
    assert_eq!(updated.likes, created.likes);
}

#[test]
fn update_comment_by_non_author_is_forbidden_and_keeps_body() {
    let conn = setup();
    let post_id = insert_post(&conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let created = service
        .create_comment(request(post_id, "alice", "original"))
        .unwrap();

    let err = service
        .update_comment(created.id, "hijacked", "mallory")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(matches!(err.failure, CommentFailure::NotAuthor { .. }));
    assert_eq!(err.detail_message(), "작성자만 댓글을 수정할 수 있습니다.");

    let stored = service.read_comment(created.id).unwrap();
    assert_eq!(stored.comment.body, "original");
}

#[test]
fn update_missing_comment_is_not_found() {
    let conn = setup();
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());

    let err = service
        .update_comment(Uuid::new_v4(), "body", "alice")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "커뮤니티 댓글 수정에 실패하였습니다.");
}

#[test]
fn delete_comment_removes_row_and_post_reference() {
    let conn = setup();
    let post_id = insert_post(&conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let kept = service
        .create_comment(request(post_id, "bob", "stays"))
        .unwrap();
    let doomed = service
        .create_comment(request(post_id, "alice", "goes"))
        .unwrap();

    let message = service.delete_comment(doomed.id, "alice").unwrap();
    assert_eq!(message, COMMENT_DELETED_MESSAGE);

    assert_eq!(load_post(&conn, post_id).comment_ids, vec![kept.id]);
    assert_eq!(comment_rows(&conn), 1);
    let err = service.read_comment(doomed.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn delete_comment_rejects_missing_and_foreign_comments() {
    let conn = setup();
    let post_id = insert_post(&conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let created = service
        .create_comment(request(post_id, "alice", "mine"))
        .unwrap();

    let missing = service.delete_comment(Uuid::new_v4(), "alice").unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);
    assert_eq!(missing.to_string(), "커뮤니티 댓글 삭제에 실패하였습니다.");

    let foreign = service.delete_comment(created.id, "bob").unwrap_err();
    assert_eq!(foreign.kind(), ErrorKind::Forbidden);
    assert_eq!(foreign.detail_message(), "작성자만 댓글을 삭제할 수 있습니다.");

    assert_eq!(load_post(&conn, post_id).comment_ids, vec![created.id]);
    assert_eq!(comment_rows(&conn), 1);
}

#[test]
fn delete_comment_whose_post_is_gone_is_not_found_and_keeps_row() {
    let conn = setup();
    let post_id = insert_post(&conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let created = service
        .create_comment(request(post_id, "alice", "orphan"))
        .unwrap();

    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    conn.execute("DELETE FROM posts WHERE uuid = ?1;", [post_id.to_string()])
        .unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();

    let err = service.delete_comment(created.id, "alice").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err.failure, CommentFailure::PostNotFound(id) if id == post_id));
    assert_eq!(err.detail_message(), "게시글을 찾을 수 없습니다.");
    assert_eq!(err.to_string(), "커뮤니티 댓글 삭제에 실패하였습니다.");
    assert_eq!(comment_rows(&conn), 1);
}

#[test]
fn toggle_like_twice_restores_original_like_set() {
    let conn = setup();
    let post_id = insert_post(&conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let created = service
        .create_comment(request(post_id, "alice", "likeable"))
        .unwrap();
    service
        .toggle_like(post_id, created.id, "carol", "Carol")
        .unwrap();
    let before: HashSet<String> = service
        .read_comment(created.id)
        .unwrap()
        .comment
        .likes
        .into_iter()
        .map(|like| like.id)
        .collect();

    let liked = service
        .toggle_like(post_id, created.id, "dave", "Dave")
        .unwrap();
    assert_eq!(liked.likes.len(), 2);
    assert_eq!(liked.likes[1].id, "dave");
    assert_eq!(liked.likes[1].name, "Dave");

    let unliked = service
        .toggle_like(post_id, created.id, "dave", "Dave")
        .unwrap();
    let after: HashSet<String> = unliked.likes.into_iter().map(|like| like.id).collect();
    assert_eq!(before, after);
}

#[test]
fn toggle_like_requires_existing_post_and_comment() {
    let conn = setup();
    let post_id = insert_post(&conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let created = service
        .create_comment(request(post_id, "alice", "body"))
        .unwrap();

    let no_post = service
        .toggle_like(Uuid::new_v4(), created.id, "carol", "Carol")
        .unwrap_err();
    assert!(matches!(no_post.failure, CommentFailure::PostNotFound(_)));
    assert_eq!(no_post.to_string(), "댓글 좋아요 기능 처리에 실패하였습니다.");

    let no_comment = service
        .toggle_like(post_id, Uuid::new_v4(), "carol", "Carol")
        .unwrap_err();
    assert!(matches!(no_comment.failure, CommentFailure::CommentNotFound(_)));
    assert_eq!(no_comment.detail_message(), "댓글을 찾을 수 없습니다.");
}

#[test]
fn read_all_comments_of_post_reports_live_like_counts_in_insertion_order() {
    let conn = setup();
    let post_id = insert_post(&conn);
    let other_post_id = insert_post(&conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());

    let first = service
        .create_comment(request(post_id, "alice", "one"))
        .unwrap();
    let second = service
        .create_comment(request(post_id, "bob", "two"))
        .unwrap();
    service
        .create_comment(request(other_post_id, "carol", "elsewhere"))
        .unwrap();
    service.toggle_like(post_id, first.id, "u1", "U1").unwrap();
    service.toggle_like(post_id, first.id, "u2", "U2").unwrap();
    service.toggle_like(post_id, second.id, "u1", "U1").unwrap();
    service.toggle_like(post_id, first.id, "u2", "U2").unwrap();

    let views = service.read_all_comments_of_post(post_id).unwrap();
    let ids: Vec<_> = views.iter().map(|view| view.comment.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    for view in &views {
        assert_eq!(view.num_likes, view.comment.likes.len());
    }
    assert_eq!(views[0].num_likes, 1);
    assert_eq!(views[1].num_likes, 1);

    assert!(service
        .read_all_comments_of_post(Uuid::new_v4())
        .unwrap()
        .is_empty());
}

#[test]
fn read_comment_view_serializes_num_likes() {
    let conn = setup();
    let post_id = insert_post(&conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let created = service
        .create_comment(request(post_id, "alice", "hello"))
        .unwrap();
    service.toggle_like(post_id, created.id, "u1", "U1").unwrap();

    let view = service.read_comment(created.id).unwrap();
    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["numLikes"], 1);
    assert_eq!(value["comment"], "hello");
    assert_eq!(value["id"], "alice");
}

#[test]
fn reconcile_post_comments_repairs_dangling_and_missing_references() {
    let conn = setup();
    let post_id = insert_post(&conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let kept = service
        .create_comment(request(post_id, "alice", "kept"))
        .unwrap();
    let dangling = service
        .create_comment(request(post_id, "bob", "vanishes"))
        .unwrap();

    // Simulate a writer that skipped the post-side bookkeeping.
    conn.execute(
        "DELETE FROM comments WHERE uuid = ?1;",
        params![dangling.id.to_string()],
    )
    .unwrap();
    let unlisted = Uuid::new_v4();
    conn.execute(
        "INSERT INTO comments (uuid, post_uuid, author_id, author_name, body)
         VALUES (?1, ?2, 'carol', 'Carol', 'unlisted');",
        params![unlisted.to_string(), post_id.to_string()],
    )
    .unwrap();

    let repair = service.reconcile_post_comments(post_id).unwrap();
    assert_eq!(repair.removed, vec![dangling.id]);
    assert_eq!(repair.appended, vec![unlisted]);
    assert_eq!(load_post(&conn, post_id).comment_ids, vec![kept.id, unlisted]);

    assert!(service.reconcile_post_comments(post_id).unwrap().is_clean());

    let err = service.reconcile_post_comments(Uuid::new_v4()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn toggle_like_waits_for_write_lock_before_reading_likes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("likes.db");
    let conn = open_db(&path).unwrap();
    conn.busy_timeout(Duration::ZERO).unwrap();
    let post_id = insert_post(&conn);
    let service = CommentService::new(SqliteCommentRepository::try_new(&conn).unwrap());
    let created = service
        .create_comment(request(post_id, "alice", "contended"))
        .unwrap();

    let writer = open_db(&path).unwrap();
    writer.execute_batch("BEGIN IMMEDIATE;").unwrap();
    let err = service
        .toggle_like(post_id, created.id, "carol", "Carol")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreFailure);
    writer.execute_batch("ROLLBACK;").unwrap();

    let liked = service
        .toggle_like(post_id, created.id, "carol", "Carol")
        .unwrap();
    assert_eq!(liked.likes.len(), 1);
}

#[test]
fn toggle_like_from_two_connections_keeps_both_likes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let first_conn = open_db(&path).unwrap();
    let second_conn = open_db(&path).unwrap();
    let post_id = insert_post(&first_conn);
    let first = CommentService::new(SqliteCommentRepository::try_new(&first_conn).unwrap());
    let second = CommentService::new(SqliteCommentRepository::try_new(&second_conn).unwrap());
    let created = first
        .create_comment(request(post_id, "alice", "shared"))
        .unwrap();

    first
        .toggle_like(post_id, created.id, "carol", "Carol")
        .unwrap();
    second
        .toggle_like(post_id, created.id, "dave", "Dave")
        .unwrap();

    let view = first.read_comment(created.id).unwrap();
    assert_eq!(view.num_likes, 2);
    let likers: HashSet<String> = view.comment.likes.into_iter().map(|like| like.id).collect();
    assert_eq!(
        likers,
        HashSet::from(["carol".to_string(), "dave".to_string()])
    );
}
