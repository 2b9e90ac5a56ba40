use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    config::{SearchConfig, SweeperConfig},
    domain::{
        validate_text, Announcement, AnnouncementStats, CreateAnnouncementRequest, NewAnnouncement,
        SearchQuery, SearchScope, SortOrder, StatusFilter,
    },
    error::{AppError, Result},
    repository::AnnouncementRepository,
    service::expiry_sweeper::{self, ExpirySweeper, SweeperState},
};

/// Front door for announcement lifecycle operations. Owns input validation,
/// TTL arithmetic and the background expiry sweeper.
pub struct AnnouncementManager {
    repo: Arc<dyn AnnouncementRepository>,
    search: SearchConfig,
    sweeper_config: SweeperConfig,
    sweeper: Mutex<SweeperState>,
}

impl AnnouncementManager {
    pub fn new(repo: Arc<dyn AnnouncementRepository>) -> Self {
        Self {
            repo,
            search: SearchConfig::default(),
            sweeper_config: SweeperConfig::default(),
            sweeper: Mutex::new(SweeperState::Stopped),
        }
    }

    pub fn with_search_config(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_sweeper_config(mut self, sweeper_config: SweeperConfig) -> Self {
        self.sweeper_config = sweeper_config;
        self
    }

    /// Create an announcement and return its id
    pub async fn create(&self, title: &str, content: &str, ttl: Option<chrono::Duration>) -> Result<i64> {
        let mut request = CreateAnnouncementRequest::new(title, content);
        request.ttl = ttl;
        Ok(self.create_announcement(request).await?.id)
    }

    /// Create an announcement that expires after a whole number of hours
    pub async fn create_with_ttl_hours(&self, title: &str, content: &str, hours: i64) -> Result<i64> {
        self.create(title, content, Some(chrono::Duration::hours(hours))).await
    }

    /// Create an announcement and return the stored record
    pub async fn create_announcement(&self, request: CreateAnnouncementRequest) -> Result<Announcement> {
        request.validate()?;

        let created_at = Utc::now();
        let announcement = self
            .repo
            .create(NewAnnouncement {
                expires_at: request.expires_at(created_at),
                title: request.title,
                content: request.content,
                created_at,
            })
            .await?;

        tracing::debug!(id = announcement.id, expires_at = ?announcement.expires_at, "announcement created");
        Ok(announcement)
    }

    /// Get an announcement by id, including soft-deleted ones
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Announcement>> {
        self.repo.find_by_id(id).await
    }

    /// List announcements, newest first
    pub async fn list_all(&self, include_deleted: bool) -> Result<Vec<Announcement>> {
        self.list_sorted(include_deleted, SortOrder::NewestFirst).await
    }

    pub async fn list_sorted(&self, include_deleted: bool, order: SortOrder) -> Result<Vec<Announcement>> {
        self.list_by_status(StatusFilter::from_include_deleted(include_deleted), order).await
    }

    /// List by deletion state; `StatusFilter::Deleted` returns only the trash.
    pub async fn list_by_status(&self, status: StatusFilter, order: SortOrder) -> Result<Vec<Announcement>> {
        self.repo.list(status, order).await
    }

    /// Substring search over active announcements. An empty keyword matches
    /// everything.
    pub async fn search(&self, keyword: &str, scope: SearchScope) -> Result<Vec<Announcement>> {
        let query = SearchQuery {
            keyword: keyword.to_string(),
            scope,
            case_sensitive: self.search.case_sensitive,
        };
        self.repo.search(&query).await
    }

    /// Replace title and content. Returns false when the id does not exist.
    pub async fn update(&self, id: i64, title: &str, content: &str) -> Result<bool> {
        validate_text("title", title)?;
        validate_text("content", content)?;

        self.repo.update_content(id, title, content, Utc::now()).await
    }

    pub async fn soft_delete(&self, id: i64) -> Result<bool> {
        self.repo.soft_delete(id, Utc::now()).await
    }

    /// Clear `deleted_at`. Expiry is not consulted here; an expired record
    /// stays active until the next sweep.
    pub async fn restore(&self, id: i64) -> Result<bool> {
        self.repo.restore(id).await
    }

    pub async fn hard_delete(&self, id: i64) -> Result<bool> {
        let deleted = self.repo.hard_delete(id).await?;
        if deleted {
            tracing::info!(id, "announcement permanently deleted");
        }
        Ok(deleted)
    }

    /// Soft-delete every active announcement past its expiry
    pub async fn sweep_expired(&self) -> Result<u64> {
        expiry_sweeper::sweep_expired(self.repo.as_ref()).await
    }

    /// Permanently delete every soft-deleted announcement
    pub async fn purge_deleted(&self) -> Result<u64> {
        let count = self.repo.purge_deleted().await?;
        tracing::info!(count, "purged deleted announcements");
        Ok(count)
    }

    pub async fn stats(&self) -> Result<AnnouncementStats> {
        self.repo.stats(Utc::now()).await
    }

    /// Start the background sweeper. Returns false if it is already running.
    /// A zero interval is rejected.
    pub async fn start_sweeper(&self, interval: Duration) -> Result<bool> {
        if interval.is_zero() {
            return Err(AppError::Config("sweeper interval must be greater than zero".to_string()));
        }

        let mut state = self.sweeper.lock().await;
        if state.is_running() {
            tracing::debug!("expiry sweeper already running");
            return Ok(false);
        }

        *state = SweeperState::Running(ExpirySweeper::spawn(self.repo.clone(), interval));
        Ok(true)
    }

    pub async fn start_sweeper_with_defaults(&self) -> Result<bool> {
        self.start_sweeper(self.sweeper_config.interval()).await
    }

    /// Stop the background sweeper, waiting briefly for an in-flight pass.
    /// Returns false if it was not running.
    pub async fn stop_sweeper(&self) -> bool {
        let mut state = self.sweeper.lock().await;
        match std::mem::take(&mut *state) {
            SweeperState::Running(sweeper) => {
                sweeper.shutdown(self.sweeper_config.stop_timeout()).await;
                true
            }
            SweeperState::Stopped => false,
        }
    }

    pub async fn is_sweeper_running(&self) -> bool {
        self.sweeper.lock().await.is_running()
    }
}
