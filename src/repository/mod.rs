use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::domain::*;
use crate::error::Result;

pub mod announcement_repository;

pub use announcement_repository::SqliteAnnouncementRepository;

/// Storage for announcements. Every method is a single statement, so each
/// call commits or fails as a unit.
#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, announcement: NewAnnouncement) -> Result<Announcement>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Announcement>>;
    async fn list(&self, status: StatusFilter, order: SortOrder) -> Result<Vec<Announcement>>;
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Announcement>>;
    async fn update_content(&self, id: i64, title: &str, content: &str, now: DateTime<Utc>) -> Result<bool>;
    async fn soft_delete(&self, id: i64, now: DateTime<Utc>) -> Result<bool>;
    async fn restore(&self, id: i64) -> Result<bool>;
    async fn hard_delete(&self, id: i64) -> Result<bool>;
    /// Soft-delete every active announcement whose expiry is at or before `now`.
    async fn soft_delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
    /// Hard-delete every soft-deleted announcement.
    async fn purge_deleted(&self) -> Result<u64>;
    async fn stats(&self, now: DateTime<Utc>) -> Result<AnnouncementStats>;
}
