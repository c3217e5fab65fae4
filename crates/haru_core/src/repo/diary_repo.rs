//! Diary repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Dates are stored as `YYYY-MM-DD` text, so range filters compare
//!   lexically in date order.
//! - When several diaries share a date, point operations act on the earliest
//!   inserted one (`rowid ASC`).
//! - Lookup misses are `Ok(None)`, never errors.

use crate::config::DiaryDatePolicy;
use crate::model::diary::{Diary, DiaryDraft, DiaryId};
use crate::repo::{
    date_to_db, ensure_connection_ready, from_json_column, parse_date, parse_uuid,
    to_json_column, RepoError, RepoResult,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const DIARY_SELECT_SQL: &str = "SELECT
    uuid,
    diary_date,
    tags,
    title,
    content,
    share_status,
    image,
    created_at,
    updated_at
FROM diaries";

/// Repository interface for diary documents.
pub trait DiaryRepository {
    /// Inserts a diary, rejecting an occupied date under `EnforceUnique`.
    fn insert_diary(&self, diary: &Diary, policy: DiaryDatePolicy) -> RepoResult<DiaryId>;
    /// Replaces tags/title/content/share status of the diary on `draft.date`.
    fn update_diary_by_date(&self, draft: &DiaryDraft) -> RepoResult<Option<Diary>>;
    /// Sets the image of the diary on `date`; `None` leaves it unchanged.
    fn set_image_by_date(&self, date: NaiveDate, image: Option<&str>)
        -> RepoResult<Option<Diary>>;
    /// Deletes the diary on `date` and returns it.
    fn delete_diary_by_date(&self, date: NaiveDate) -> RepoResult<Option<Diary>>;
    /// Gets one diary by document id; used for read-back after writes.
    fn get_diary_by_id(&self, id: DiaryId) -> RepoResult<Option<Diary>>;
    /// Gets the diary on `date`.
    fn get_diary_by_date(&self, date: NaiveDate) -> RepoResult<Option<Diary>>;
    /// Returns the tag field of every diary with `start <= date <= end`.
    fn list_tags_between(&self, start: NaiveDate, end: NaiveDate) -> RepoResult<Vec<Vec<String>>>;
}

/// SQLite-backed diary repository.
pub struct SqliteDiaryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDiaryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["diaries"])?;
        Ok(Self { conn })
    }
}

impl DiaryRepository for SqliteDiaryRepository<'_> {
    fn insert_diary(&self, diary: &Diary, policy: DiaryDatePolicy) -> RepoResult<DiaryId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if policy == DiaryDatePolicy::EnforceUnique && first_id_on_date(&tx, diary.date)?.is_some()
        {
            return Err(RepoError::DuplicateDiaryDate(diary.date));
        }

        tx.execute(
            "INSERT INTO diaries (
                uuid,
                diary_date,
                tags,
                title,
                content,
                share_status,
                image
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                diary.id.to_string(),
                date_to_db(diary.date),
                to_json_column(&diary.tags, "diaries.tags")?,
                diary.title.as_str(),
                diary.content.as_str(),
                diary.share_status,
                diary.image.as_deref(),
            ],
        )?;

        tx.commit()?;
        Ok(diary.id)
    }

    fn update_diary_by_date(&self, draft: &DiaryDraft) -> RepoResult<Option<Diary>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(id) = first_id_on_date(&tx, draft.date)? else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE diaries
             SET
                tags = ?2,
                title = ?3,
                content = ?4,
                share_status = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                to_json_column(&draft.tags, "diaries.tags")?,
                draft.title.as_str(),
                draft.content.as_str(),
                draft.share_status,
            ],
        )?;
        let updated = load_diary(&tx, id)?;

        tx.commit()?;
        Ok(updated)
    }

    fn set_image_by_date(
        &self,
        date: NaiveDate,
        image: Option<&str>,
    ) -> RepoResult<Option<Diary>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(id) = first_id_on_date(&tx, date)? else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE diaries
             SET
                image = COALESCE(?2, image),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), image],
        )?;
        let updated = load_diary(&tx, id)?;

        tx.commit()?;
        Ok(updated)
    }

    fn delete_diary_by_date(&self, date: NaiveDate) -> RepoResult<Option<Diary>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(id) = first_id_on_date(&tx, date)? else {
            return Ok(None);
        };

        let removed = load_diary(&tx, id)?;
        tx.execute("DELETE FROM diaries WHERE uuid = ?1;", [id.to_string()])?;

        tx.commit()?;
        Ok(removed)
    }

    fn get_diary_by_id(&self, id: DiaryId) -> RepoResult<Option<Diary>> {
        load_diary(self.conn, id)
    }

    fn get_diary_by_date(&self, date: NaiveDate) -> RepoResult<Option<Diary>> {
        self.conn
            .query_row(
                &format!(
                    "{DIARY_SELECT_SQL}
                     WHERE diary_date = ?1
                     ORDER BY rowid ASC
                     LIMIT 1;"
                ),
                [date_to_db(date)],
                |row| Ok(read_diary_columns(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_tags_between(&self, start: NaiveDate, end: NaiveDate) -> RepoResult<Vec<Vec<String>>> {
        let mut stmt = self.conn.prepare(
            "SELECT tags
             FROM diaries
             WHERE diary_date >= ?1
               AND diary_date <= ?2
             ORDER BY diary_date ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([date_to_db(start), date_to_db(end)])?;
        let mut tag_lists = Vec::new();
        while let Some(row) = rows.next()? {
            let tags_text: String = row.get(0)?;
            tag_lists.push(from_json_column(&tags_text, "diaries.tags")?);
        }
        Ok(tag_lists)
    }
}

fn first_id_on_date(conn: &Connection, date: NaiveDate) -> RepoResult<Option<DiaryId>> {
    let uuid_text: Option<String> = conn
        .query_row(
            "SELECT uuid
             FROM diaries
             WHERE diary_date = ?1
             ORDER BY rowid ASC
             LIMIT 1;",
            [date_to_db(date)],
            |row| row.get(0),
        )
        .optional()?;

    uuid_text
        .map(|value| parse_uuid(&value, "diaries.uuid"))
        .transpose()
}

fn load_diary(conn: &Connection, id: DiaryId) -> RepoResult<Option<Diary>> {
    conn.query_row(
        &format!("{DIARY_SELECT_SQL} WHERE uuid = ?1;"),
        [id.to_string()],
        |row| Ok(read_diary_columns(row)),
    )
    .optional()?
    .transpose()
}

fn read_diary_columns(row: &Row<'_>) -> RepoResult<Diary> {
    let uuid_text: String = row.get("uuid")?;
    let date_text: String = row.get("diary_date")?;
    let tags_text: String = row.get("tags")?;
    let share_status = match row.get::<_, i64>("share_status")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid share_status value `{other}` in diaries.share_status"
            )));
        }
    };

    Ok(Diary {
        id: parse_uuid(&uuid_text, "diaries.uuid")?,
        date: parse_date(&date_text, "diaries.diary_date")?,
        tags: from_json_column(&tags_text, "diaries.tags")?,
        title: row.get("title")?,
        content: row.get("content")?,
        share_status,
        image: row.get("image")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
