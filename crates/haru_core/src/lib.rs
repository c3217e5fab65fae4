//! Core domain logic for community comments and personal diaries.
//! This crate is the single source of truth for post/comment reference
//! consistency and diary tag aggregation.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig, DiaryConfig, DiaryDatePolicy};
pub use error::ErrorKind;
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::comment::{Comment, CommentId, CommentLike, CommentView, LikeToggle, NewComment};
pub use model::diary::{count_tag_tokens, tag_tokens, Diary, DiaryDraft, DiaryId, TagCounts};
pub use model::post::{Post, PostId};
pub use repo::comment_repo::{CommentRepository, PostRefRepair, SqliteCommentRepository};
pub use repo::diary_repo::{DiaryRepository, SqliteDiaryRepository};
pub use repo::post_repo::{PostRepository, SqlitePostRepository};
pub use repo::{RepoError, RepoResult};
pub use service::comment_service::{
    CommentFailure, CommentOperation, CommentResult, CommentService, CommentServiceError,
    CreateCommentRequest, COMMENT_DELETED_MESSAGE,
};
pub use service::diary_service::{
    DiaryFailure, DiaryOperation, DiaryResult, DiaryService, DiaryServiceError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
