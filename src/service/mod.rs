pub mod announcement_manager;
pub mod expiry_sweeper;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::config::Settings;
use crate::repository::SqliteAnnouncementRepository;

pub use announcement_manager::AnnouncementManager;
pub use expiry_sweeper::{ExpirySweeper, SweeperState};

impl AnnouncementManager {
    /// Build a manager over the SQLite store using the loaded settings.
    pub fn from_settings(pool: SqlitePool, settings: &Settings) -> Self {
        let repo = Arc::new(SqliteAnnouncementRepository::new(pool));

        AnnouncementManager::new(repo)
            .with_search_config(settings.search.clone())
            .with_sweeper_config(settings.sweeper.clone())
    }
}
