use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};

use crate::{
    domain::{
        Announcement, AnnouncementStats, NewAnnouncement, SearchQuery, SearchScope, SortOrder, StatusFilter,
    },
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

const SELECT_COLUMNS: &str =
    "SELECT id, title, content, created_at, updated_at, deleted_at, expires_at FROM announcements";

#[derive(FromRow)]
struct AnnouncementRow {
    id: i64,
    title: String,
    content: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    deleted_at: Option<NaiveDateTime>,
    expires_at: Option<NaiveDateTime>,
}

pub struct SqliteAnnouncementRepository {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_announcement(row: AnnouncementRow) -> Announcement {
        Announcement {
            id: row.id,
            title: row.title,
            content: row.content,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
            deleted_at: row.deleted_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            expires_at: row.expires_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
        }
    }

    fn order_clause(order: SortOrder) -> &'static str {
        // id breaks ties between rows created within the same instant
        match order {
            SortOrder::NewestFirst => "ORDER BY created_at DESC, id DESC",
            SortOrder::OldestFirst => "ORDER BY created_at ASC, id ASC",
        }
    }

    /// Predicate for a single column. Case-insensitive matching goes through
    /// LIKE (ASCII folding only); case-sensitive matching uses instr.
    fn match_clause(column: &str, case_sensitive: bool) -> String {
        if case_sensitive {
            format!("instr({}, ?) > 0", column)
        } else {
            format!("{} LIKE ? ESCAPE '\\'", column)
        }
    }
}

/// Escape LIKE wildcards so the keyword is matched literally.
pub(crate) fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepository {
    async fn create(&self, announcement: NewAnnouncement) -> Result<Announcement> {
        let created_at = announcement.created_at.naive_utc();
        let expires_at = announcement.expires_at.map(|dt| dt.naive_utc());

        let result = sqlx::query(
            r#"
            INSERT INTO announcements (title, content, created_at, updated_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            "#
        )
        .bind(&announcement.title)
        .bind(&announcement.content)
        .bind(created_at)
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Internal("Failed to retrieve created announcement".to_string())
        })
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Announcement>> {
        let row = sqlx::query_as::<_, AnnouncementRow>(
            &format!("{} WHERE id = ?", SELECT_COLUMNS)
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map(Self::row_to_announcement))
    }

    async fn list(&self, status: StatusFilter, order: SortOrder) -> Result<Vec<Announcement>> {
        let filter = match status {
            StatusFilter::All => "",
            StatusFilter::Active => "WHERE deleted_at IS NULL",
            StatusFilter::Deleted => "WHERE deleted_at IS NOT NULL",
        };
        let sql = format!("{} {} {}", SELECT_COLUMNS, filter, Self::order_clause(order));

        let rows = sqlx::query_as::<_, AnnouncementRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Self::row_to_announcement).collect())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Announcement>> {
        if query.keyword.is_empty() {
            return self.list(StatusFilter::Active, SortOrder::NewestFirst).await;
        }

        let title = Self::match_clause("title", query.case_sensitive);
        let content = Self::match_clause("content", query.case_sensitive);
        let (predicate, binds) = match query.scope {
            SearchScope::Title => (title, 1),
            SearchScope::Content => (content, 1),
            SearchScope::Both => (format!("({} OR {})", title, content), 2),
        };

        let sql = format!(
            "{} WHERE deleted_at IS NULL AND {} {}",
            SELECT_COLUMNS,
            predicate,
            Self::order_clause(SortOrder::NewestFirst)
        );

        let needle = if query.case_sensitive {
            query.keyword.clone()
        } else {
            format!("%{}%", escape_like(&query.keyword))
        };

        let mut q = sqlx::query_as::<_, AnnouncementRow>(&sql);
        for _ in 0..binds {
            q = q.bind(needle.clone());
        }

        let rows = q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Self::row_to_announcement).collect())
    }

    async fn update_content(&self, id: i64, title: &str, content: &str, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE announcements
            SET title = ?, content = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(title)
        .bind(content)
        .bind(now.naive_utc())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, id: i64, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE announcements SET deleted_at = ? WHERE id = ?")
            .bind(now.naive_utc())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn restore(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE announcements SET deleted_at = NULL WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn hard_delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let now = now.naive_utc();

        // The deleted_at predicate is evaluated by the same statement that
        // writes, so overlapping sweeps never touch a row twice.
        let result = sqlx::query(
            r#"
            UPDATE announcements
            SET deleted_at = ?
            WHERE deleted_at IS NULL
              AND expires_at IS NOT NULL
              AND expires_at <= ?
            "#
        )
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn purge_deleted(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM announcements WHERE deleted_at IS NOT NULL")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn stats(&self, now: DateTime<Utc>) -> Result<AnnouncementStats> {
        let (total, active, deleted, pending_expiry) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COUNT(CASE WHEN deleted_at IS NULL THEN 1 END),
                   COUNT(CASE WHEN deleted_at IS NOT NULL THEN 1 END),
                   COUNT(CASE WHEN deleted_at IS NULL
                               AND expires_at IS NOT NULL
                               AND expires_at <= ? THEN 1 END)
            FROM announcements
            "#
        )
        .bind(now.naive_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(AnnouncementStats { total, active, deleted, pending_expiry })
    }
}
