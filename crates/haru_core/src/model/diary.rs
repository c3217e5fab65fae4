//! Diary document model and tag token helpers.
//!
//! # Invariants
//! - `date` is the natural key for every read/update/delete.
//! - Each `tags` element may hold several comma-joined tag tokens.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Document id of a diary. Not used for lookups.
pub type DiaryId = Uuid;

/// Tag token -> occurrence count.
pub type TagCounts = BTreeMap<String, usize>;

/// Personal journal entry keyed by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diary {
    #[serde(rename = "_id")]
    pub id: DiaryId,
    pub date: NaiveDate,
    #[serde(rename = "tag")]
    pub tags: Vec<String>,
    pub title: String,
    pub content: String,
    pub share_status: bool,
    pub image: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Caller-supplied diary fields used by create and full update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiaryDraft {
    pub date: NaiveDate,
    pub tags: Vec<String>,
    pub title: String,
    pub content: String,
    pub share_status: bool,
}

impl Diary {
    /// Builds a new diary from a draft with a generated id and no image.
    pub fn from_draft(draft: &DiaryDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: draft.date,
            tags: draft.tags.clone(),
            title: draft.title.clone(),
            content: draft.content.clone(),
            share_status: draft.share_status,
            image: None,
            created_at: 0,
            updated_at: 0,
        }
    }
}

/// Splits one tag field on commas and yields trimmed tokens.
///
/// Blank tokens are kept: `"a,"` yields `"a"` and `""`.
pub fn tag_tokens(tag: &str) -> impl Iterator<Item = &str> {
    tag.split(',').map(str::trim)
}

/// Counts tag tokens across the tag fields of many diaries.
pub fn count_tag_tokens<I, T>(tag_lists: I) -> TagCounts
where
    I: IntoIterator<Item = T>,
    T: AsRef<[String]>,
{
    let mut counts = TagCounts::new();
    for tags in tag_lists {
        for tag in tags.as_ref() {
            for token in tag_tokens(tag) {
                *counts.entry(token.to_string()).or_insert(0) += 1;
            }
        }
    }
    counts
}
