//! Community comment use-case service.
//!
//! # Responsibility
//! - Create, edit, delete, like and read comments of a post.
//! - Keep post `comment_ids` consistent with the comment documents.
//!
//! # Invariants
//! - Only the stored author may edit or delete a comment.
//! - Absent posts/comments are errors (`ErrorKind::NotFound`), unlike diary
//!   lookups which return `None`.
//! - Every failure is logged once with its kind before being returned.

use crate::error::ErrorKind;
use crate::model::comment::{Comment, CommentId, CommentView, LikeToggle, NewComment};
use crate::model::post::PostId;
use crate::repo::comment_repo::{CommentRepository, PostRefRepair};
use crate::repo::RepoError;
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Confirmation returned by a successful delete.
pub const COMMENT_DELETED_MESSAGE: &str = "댓글이 정상적으로 삭제되었습니다.";

/// Public comment operations, used to name failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOperation {
    Create,
    Update,
    Delete,
    ToggleLike,
    Read,
    ReadAllOfPost,
    ReconcilePost,
}

impl CommentOperation {
    /// Localized message shown to end users when the operation fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Create => "커뮤니티 댓글 생성에 실패하였습니다.",
            Self::Update => "커뮤니티 댓글 수정에 실패하였습니다.",
            Self::Delete => "커뮤니티 댓글 삭제에 실패하였습니다.",
            Self::ToggleLike => "댓글 좋아요 기능 처리에 실패하였습니다.",
            Self::Read => "커뮤니티 댓글 조회에 실패하였습니다.",
            Self::ReadAllOfPost => "해당 게시글의 모든 댓글을 불러오는데 실패하였습니다.",
            Self::ReconcilePost => "게시글 댓글 목록 정리에 실패하였습니다.",
        }
    }

    fn event_name(self) -> &'static str {
        match self {
            Self::Create => "comment_create",
            Self::Update => "comment_update",
            Self::Delete => "comment_delete",
            Self::ToggleLike => "comment_toggle_like",
            Self::Read => "comment_read",
            Self::ReadAllOfPost => "comment_list_by_post",
            Self::ReconcilePost => "comment_reconcile_post",
        }
    }
}

/// Underlying cause of a comment operation failure.
#[derive(Debug)]
pub enum CommentFailure {
    PostNotFound(PostId),
    CommentNotFound(CommentId),
    /// Requester is not the stored author.
    NotAuthor {
        comment_id: CommentId,
        requester_id: String,
    },
    /// Write succeeded but read-back did not see the document.
    InconsistentState(&'static str),
    Repo(RepoError),
}

impl CommentFailure {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PostNotFound(_) | Self::CommentNotFound(_) => ErrorKind::NotFound,
            Self::NotAuthor { .. } => ErrorKind::Forbidden,
            Self::InconsistentState(_) | Self::Repo(_) => ErrorKind::StoreFailure,
        }
    }
}

impl Display for CommentFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PostNotFound(id) => write!(f, "post not found: {id}"),
            Self::CommentNotFound(id) => write!(f, "comment not found: {id}"),
            Self::NotAuthor {
                comment_id,
                requester_id,
            } => write!(
                f,
                "requester `{requester_id}` is not the author of comment {comment_id}"
            ),
            Self::InconsistentState(details) => write!(f, "inconsistent comment state: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CommentFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CommentFailure {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::PostNotFound(id) => Self::PostNotFound(id),
            RepoError::CommentNotFound(id) => Self::CommentNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Failure of one comment operation.
///
/// `Display` renders the operation's localized message; the cause stays
/// reachable through [`CommentServiceError::failure`] and `source()`.
#[derive(Debug)]
pub struct CommentServiceError {
    pub operation: CommentOperation,
    pub failure: CommentFailure,
}

impl CommentServiceError {
    pub fn kind(&self) -> ErrorKind {
        self.failure.kind()
    }

    /// Operation-level localized message.
    pub fn message(&self) -> &'static str {
        self.operation.failure_message()
    }

    /// Kind-specific localized message.
    pub fn detail_message(&self) -> &'static str {
        match (&self.failure, self.operation) {
            (CommentFailure::PostNotFound(_), _) => "게시글을 찾을 수 없습니다.",
            (CommentFailure::CommentNotFound(_), CommentOperation::ToggleLike) => {
                "댓글을 찾을 수 없습니다."
            }
            (CommentFailure::CommentNotFound(_), _) => "커뮤니티 댓글을 찾을 수 없습니다.",
            (CommentFailure::NotAuthor { .. }, CommentOperation::Delete) => {
                "작성자만 댓글을 삭제할 수 있습니다."
            }
            (CommentFailure::NotAuthor { .. }, _) => "작성자만 댓글을 수정할 수 있습니다.",
            (CommentFailure::InconsistentState(_), _) | (CommentFailure::Repo(_), _) => {
                self.message()
            }
        }
    }
}

impl Display for CommentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Error for CommentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.failure)
    }
}

pub type CommentResult<T> = Result<T, CommentServiceError>;

/// Request model for [`CommentService::create_comment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentRequest {
    pub post_id: PostId,
    pub author_id: String,
    pub name: String,
    pub profile_image: String,
    pub checked_badge: String,
    pub body: String,
}

/// Comment service facade over repository implementations.
pub struct CommentService<R: CommentRepository> {
    repo: R,
}

impl<R: CommentRepository> CommentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a comment and appends it to the post's comment list.
    ///
    /// Fails with `NotFound` when the post is missing; nothing is written.
    pub fn create_comment(&self, request: CreateCommentRequest) -> CommentResult<Comment> {
        run(CommentOperation::Create, || {
            let comment = Comment::new(NewComment {
                post_id: request.post_id,
                author_id: request.author_id,
                name: request.name,
                profile_image: request.profile_image,
                checked_badge: request.checked_badge,
                body: request.body,
            });
            let comment_id = self.repo.create_comment_for_post(&comment)?;
            info!(
                "event=comment_create module=comment_service status=ok comment_id={} post_id={}",
                comment_id, comment.post_id
            );
            self.read_back(comment_id, "created comment not found in read-back")
        })
    }

    /// Replaces the body of a comment owned by `requester_id`.
    pub fn update_comment(
        &self,
        comment_id: CommentId,
        body: impl Into<String>,
        requester_id: &str,
    ) -> CommentResult<Comment> {
        run(CommentOperation::Update, || {
            self.require_author(comment_id, requester_id)?;
            self.repo.update_comment_body(comment_id, body.into().as_str())?;
            self.read_back(comment_id, "updated comment not found in read-back")
        })
    }

    /// Deletes a comment owned by `requester_id` and unlinks it from its post.
    pub fn delete_comment(
        &self,
        comment_id: CommentId,
        requester_id: &str,
    ) -> CommentResult<&'static str> {
        run(CommentOperation::Delete, || {
            let comment = self.require_author(comment_id, requester_id)?;
            if self.repo.get_post(comment.post_id)?.is_none() {
                return Err(CommentFailure::PostNotFound(comment.post_id));
            }
            self.repo.delete_comment_from_post(comment_id)?;
            info!(
                "event=comment_delete module=comment_service status=ok comment_id={} post_id={}",
                comment_id, comment.post_id
            );
            Ok(COMMENT_DELETED_MESSAGE)
        })
    }

    /// Likes the comment for `liker_id`, or removes an existing like.
    pub fn toggle_like(
        &self,
        post_id: PostId,
        comment_id: CommentId,
        liker_id: &str,
        liker_name: &str,
    ) -> CommentResult<Comment> {
        run(CommentOperation::ToggleLike, || {
            if self.repo.get_post(post_id)?.is_none() {
                return Err(CommentFailure::PostNotFound(post_id));
            }
            let outcome = self
                .repo
                .toggle_comment_like(comment_id, liker_id, liker_name)?;
            debug!(
                "event=comment_toggle_like module=comment_service status=ok comment_id={} liked={}",
                comment_id,
                outcome == LikeToggle::Liked
            );
            self.read_back(comment_id, "liked comment not found in read-back")
        })
    }

    /// Reads one comment with its like count.
    pub fn read_comment(&self, comment_id: CommentId) -> CommentResult<CommentView> {
        run(CommentOperation::Read, || {
            self.repo
                .get_comment_view(comment_id)?
                .ok_or(CommentFailure::CommentNotFound(comment_id))
        })
    }

    /// Reads every comment of a post in insertion order.
    pub fn read_all_comments_of_post(&self, post_id: PostId) -> CommentResult<Vec<CommentView>> {
        run(CommentOperation::ReadAllOfPost, || {
            Ok(self.repo.list_comment_views_by_post(post_id)?)
        })
    }

    /// Repairs dangling or missing entries in a post's comment list.
    pub fn reconcile_post_comments(&self, post_id: PostId) -> CommentResult<PostRefRepair> {
        run(CommentOperation::ReconcilePost, || {
            let repair = self.repo.reconcile_post_refs(post_id)?;
            if !repair.is_clean() {
                info!(
                    "event=comment_reconcile_post module=comment_service status=repaired post_id={} removed={} appended={}",
                    post_id,
                    repair.removed.len(),
                    repair.appended.len()
                );
            }
            Ok(repair)
        })
    }

    fn require_author(
        &self,
        comment_id: CommentId,
        requester_id: &str,
    ) -> Result<Comment, CommentFailure> {
        let comment = self
            .repo
            .get_comment(comment_id)?
            .ok_or(CommentFailure::CommentNotFound(comment_id))?;
        if !comment.is_authored_by(requester_id) {
            return Err(CommentFailure::NotAuthor {
                comment_id,
                requester_id: requester_id.to_string(),
            });
        }
        Ok(comment)
    }

    fn read_back(
        &self,
        comment_id: CommentId,
        details: &'static str,
    ) -> Result<Comment, CommentFailure> {
        self.repo
            .get_comment(comment_id)?
            .ok_or(CommentFailure::InconsistentState(details))
    }
}

fn run<T>(
    operation: CommentOperation,
    body: impl FnOnce() -> Result<T, CommentFailure>,
) -> CommentResult<T> {
    body().map_err(|failure| {
        error!(
            "event={} module=comment_service status=error error_kind={} error={}",
            operation.event_name(),
            failure.kind(),
            failure
        );
        CommentServiceError { operation, failure }
    })
}
