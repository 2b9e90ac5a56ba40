pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod repository;
pub mod service;

pub use domain::{Announcement, AnnouncementStats, SearchScope, SortOrder, StatusFilter};
pub use error::{AppError, Result};
pub use service::AnnouncementManager;
