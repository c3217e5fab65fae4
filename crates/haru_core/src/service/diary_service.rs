//! Diary use-case service.
//!
//! # Responsibility
//! - Create, update, delete and read diaries addressed by date.
//! - Aggregate tag tokens over a date range.
//!
//! # Invariants
//! - Lookup misses on update/photo/delete/get are `Ok(None)`, not errors.
//! - Duplicate dates are accepted unless `DiaryDatePolicy::EnforceUnique`.

use crate::config::{DiaryConfig, DiaryDatePolicy};
use crate::error::ErrorKind;
use crate::model::diary::{count_tag_tokens, Diary, DiaryDraft, TagCounts};
use crate::repo::diary_repo::DiaryRepository;
use crate::repo::RepoError;
use chrono::NaiveDate;
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Public diary operations, used to name failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiaryOperation {
    Create,
    Update,
    PhotoRegister,
    Delete,
    Get,
    TagSummary,
}

impl DiaryOperation {
    /// Localized message shown to end users when the operation fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Create => "다이어리 생성에 실패했습니다.",
            Self::Update | Self::PhotoRegister => "다이어리 수정에 실패했습니다.",
            Self::Delete => "다이어리 삭제에 실패했습니다.",
            Self::Get | Self::TagSummary => "다이어리를 불러오는 데에 실패했습니다.",
        }
    }

    fn event_name(self) -> &'static str {
        match self {
            Self::Create => "diary_create",
            Self::Update => "diary_update",
            Self::PhotoRegister => "diary_photo_register",
            Self::Delete => "diary_delete",
            Self::Get => "diary_get",
            Self::TagSummary => "diary_tag_summary",
        }
    }
}

/// Underlying cause of a diary operation failure.
#[derive(Debug)]
pub enum DiaryFailure {
    /// A diary already exists on the date under `EnforceUnique`.
    DuplicateDate(NaiveDate),
    /// Write succeeded but read-back did not see the document.
    InconsistentState(&'static str),
    Repo(RepoError),
}

impl DiaryFailure {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateDate(_) => ErrorKind::Conflict,
            Self::InconsistentState(_) | Self::Repo(_) => ErrorKind::StoreFailure,
        }
    }
}

impl Display for DiaryFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateDate(date) => write!(f, "diary already exists on {date}"),
            Self::InconsistentState(details) => write!(f, "inconsistent diary state: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DiaryFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for DiaryFailure {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateDiaryDate(date) => Self::DuplicateDate(date),
            other => Self::Repo(other),
        }
    }
}

/// Failure of one diary operation; `Display` is the localized message.
#[derive(Debug)]
pub struct DiaryServiceError {
    pub operation: DiaryOperation,
    pub failure: DiaryFailure,
}

impl DiaryServiceError {
    pub fn kind(&self) -> ErrorKind {
        self.failure.kind()
    }

    pub fn message(&self) -> &'static str {
        self.operation.failure_message()
    }

    pub fn detail_message(&self) -> &'static str {
        match self.failure {
            DiaryFailure::DuplicateDate(_) => "해당 날짜의 다이어리가 이미 존재합니다.",
            DiaryFailure::InconsistentState(_) | DiaryFailure::Repo(_) => self.message(),
        }
    }
}

impl Display for DiaryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Error for DiaryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.failure)
    }
}

pub type DiaryResult<T> = Result<T, DiaryServiceError>;

/// Diary service facade over repository implementations.
pub struct DiaryService<R: DiaryRepository> {
    repo: R,
    config: DiaryConfig,
}

impl<R: DiaryRepository> DiaryService<R> {
    /// Creates a service with the permissive default config.
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, DiaryConfig::default())
    }

    pub fn with_config(repo: R, config: DiaryConfig) -> Self {
        Self { repo, config }
    }

    pub fn date_policy(&self) -> DiaryDatePolicy {
        self.config.date_policy
    }

    /// Creates a diary on `draft.date`.
    ///
    /// Fails with `Conflict` only when uniqueness is enforced and the date is
    /// already taken.
    pub fn create_diary(&self, draft: &DiaryDraft) -> DiaryResult<Diary> {
        run(DiaryOperation::Create, || {
            let diary = Diary::from_draft(draft);
            let diary_id = self.repo.insert_diary(&diary, self.config.date_policy)?;
            info!(
                "event=diary_create module=diary_service status=ok diary_id={} date={}",
                diary_id, diary.date
            );
            self.repo
                .get_diary_by_id(diary_id)?
                .ok_or(DiaryFailure::InconsistentState(
                    "created diary not found in read-back",
                ))
        })
    }

    /// Replaces tags, title, content and share status of the diary on
    /// `draft.date`. Returns `None` when no diary exists on that date.
    pub fn update_diary(&self, draft: &DiaryDraft) -> DiaryResult<Option<Diary>> {
        run(DiaryOperation::Update, || {
            let updated = self.repo.update_diary_by_date(draft)?;
            log_miss(DiaryOperation::Update, draft.date, updated.is_none());
            Ok(updated)
        })
    }

    /// Sets the image of the diary on `date`.
    ///
    /// `None` keeps the stored image and still returns the matched diary.
    pub fn photo_register_in_diary(
        &self,
        date: NaiveDate,
        image: Option<&str>,
    ) -> DiaryResult<Option<Diary>> {
        run(DiaryOperation::PhotoRegister, || {
            let updated = self.repo.set_image_by_date(date, image)?;
            log_miss(DiaryOperation::PhotoRegister, date, updated.is_none());
            Ok(updated)
        })
    }

    /// Deletes the diary on `date`, returning the removed document.
    pub fn delete_diary(&self, date: NaiveDate) -> DiaryResult<Option<Diary>> {
        run(DiaryOperation::Delete, || {
            let removed = self.repo.delete_diary_by_date(date)?;
            log_miss(DiaryOperation::Delete, date, removed.is_none());
            Ok(removed)
        })
    }

    pub fn get_diary(&self, date: NaiveDate) -> DiaryResult<Option<Diary>> {
        run(DiaryOperation::Get, || Ok(self.repo.get_diary_by_date(date)?))
    }

    /// Counts tag tokens of every diary with `start_date <= date <= end_date`.
    ///
    /// An inverted range yields an empty map.
    pub fn get_all_diaries_by_month(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> DiaryResult<TagCounts> {
        run(DiaryOperation::TagSummary, || {
            let tag_lists = self.repo.list_tags_between(start_date, end_date)?;
            let counts = count_tag_tokens(&tag_lists);
            debug!(
                "event=diary_tag_summary module=diary_service status=ok start={} end={} diaries={} distinct_tags={}",
                start_date,
                end_date,
                tag_lists.len(),
                counts.len()
            );
            Ok(counts)
        })
    }
}

fn log_miss(operation: DiaryOperation, date: NaiveDate, missed: bool) {
    if missed {
        debug!(
            "event={} module=diary_service status=miss date={}",
            operation.event_name(),
            date
        );
    }
}

fn run<T>(
    operation: DiaryOperation,
    body: impl FnOnce() -> Result<T, DiaryFailure>,
) -> DiaryResult<T> {
    body().map_err(|failure| {
        error!(
            "event={} module=diary_service status=error error_kind={} error={}",
            operation.event_name(),
            failure.kind(),
            failure
        );
        DiaryServiceError { operation, failure }
    })
}
