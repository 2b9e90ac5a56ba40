use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Announcement {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// True once `now` has reached the expiry timestamp. Records without an
    /// expiry never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expires_at| expires_at <= now)
    }
}

#[derive(Debug, Clone)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub content: String,
    pub ttl: Option<Duration>,
}

impl CreateAnnouncementRequest {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ttl: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_text("title", &self.title)?;
        validate_text("content", &self.content)
    }

    /// Expiry relative to `created_at`. A negative TTL yields an announcement
    /// that is already expired, never one that expired before it existed.
    pub fn expires_at(&self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.ttl.map(|ttl| created_at + ttl.max(Duration::zero()))
    }
}

/// Row data handed to the store on insert.
#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Title,
    Content,
    #[default]
    Both,
}

impl SearchScope {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "title" => Some(Self::Title),
            "content" => Some(Self::Content),
            "both" | "all" => Some(Self::Both),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Which announcements a listing returns, by deletion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    All,
    #[default]
    Active,
    Deleted,
}

impl StatusFilter {
    pub fn from_include_deleted(include_deleted: bool) -> Self {
        if include_deleted {
            Self::All
        } else {
            Self::Active
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub keyword: String,
    pub scope: SearchScope,
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnnouncementStats {
    pub total: i64,
    pub active: i64,
    pub deleted: i64,
    /// Active announcements already past `expires_at`, waiting for a sweep.
    pub pending_expiry: i64,
}

pub fn validate_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
