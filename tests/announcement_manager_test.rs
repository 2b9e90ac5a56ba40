use std::sync::Arc;

use chrono::Duration;
use herald::{
    config::SearchConfig,
    db,
    error::AppError,
    repository::SqliteAnnouncementRepository,
    AnnouncementManager, SearchScope, SortOrder, StatusFilter,
};
use sqlx::sqlite::SqlitePoolOptions;

async fn setup_manager(search: SearchConfig) -> anyhow::Result<AnnouncementManager> {
    // One long-lived connection keeps the in-memory database alive
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(":memory:")
        .await?;

    db::migrate(&pool).await?;

    let repo = Arc::new(SqliteAnnouncementRepository::new(pool));
    Ok(AnnouncementManager::new(repo).with_search_config(search))
}

async fn setup() -> anyhow::Result<AnnouncementManager> {
    setup_manager(SearchConfig::default()).await
}

fn ids(announcements: &[herald::Announcement]) -> Vec<i64> {
    announcements.iter().map(|a| a.id).collect()
}

#[tokio::test]
async fn test_announcement_crud() -> anyhow::Result<()> {
    let manager = setup().await?;

    // Create
    let id = manager.create("System notice", "Maintenance on Saturday", None).await?;
    let created = manager.get_by_id(id).await?.expect("created announcement");
    assert_eq!(created.title, "System notice");
    assert_eq!(created.content, "Maintenance on Saturday");
    assert!(created.deleted_at.is_none());
    assert!(created.expires_at.is_none());
    assert_eq!(created.created_at, created.updated_at);

    // Update
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert!(manager.update(id, "System notice", "Maintenance moved to Sunday").await?);
    let updated = manager.get_by_id(id).await?.expect("updated announcement");
    assert_eq!(updated.content, "Maintenance moved to Sunday");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);

    // Soft delete and restore
    assert!(manager.soft_delete(id).await?);
    assert!(manager.list_all(false).await?.is_empty());
    assert!(manager.restore(id).await?);
    assert_eq!(ids(&manager.list_all(false).await?), vec![id]);

    // Hard delete
    assert!(manager.hard_delete(id).await?);
    assert!(manager.get_by_id(id).await?.is_none());
    assert!(manager.list_all(true).await?.is_empty());
    assert!(!manager.hard_delete(id).await?);

    Ok(())
}

#[tokio::test]
async fn test_create_rejects_empty_fields() -> anyhow::Result<()> {
    let manager = setup().await?;

    let err = manager.create("", "content", None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = manager.create("title", "   ", None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(manager.list_all(true).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_ids_report_false() -> anyhow::Result<()> {
    let manager = setup().await?;

    assert!(!manager.update(42, "title", "content").await?);
    assert!(!manager.soft_delete(42).await?);
    assert!(!manager.restore(42).await?);
    assert!(!manager.hard_delete(42).await?);
    assert!(manager.get_by_id(42).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_update_validates_before_lookup() -> anyhow::Result<()> {
    let manager = setup().await?;
    let id = manager.create("title", "content", None).await?;

    let err = manager.update(id, "", "content").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(manager.get_by_id(id).await?.unwrap().title, "title");

    Ok(())
}

#[tokio::test]
async fn test_soft_delete_is_repeatable_and_restore_ignores_state() -> anyhow::Result<()> {
    let manager = setup().await?;
    let id = manager.create("title", "content", None).await?;

    // Restoring an active record still reports success
    assert!(manager.restore(id).await?);

    assert!(manager.soft_delete(id).await?);
    assert!(manager.soft_delete(id).await?);
    let deleted = manager.get_by_id(id).await?.unwrap();
    assert!(deleted.is_deleted());
    assert!(deleted.deleted_at.unwrap() >= deleted.created_at);

    let listed = manager.list_all(true).await?;
    assert_eq!(ids(&listed), vec![id]);
    assert!(listed[0].deleted_at.is_some());

    Ok(())
}

#[tokio::test]
async fn test_update_keeps_soft_deleted_record_deleted() -> anyhow::Result<()> {
    let manager = setup().await?;
    let id = manager.create("title", "content", None).await?;
    assert!(manager.soft_delete(id).await?);
    let deleted = manager.get_by_id(id).await?.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert!(manager.update(id, "new title", "new content").await?);

    let updated = manager.get_by_id(id).await?.unwrap();
    assert_eq!(updated.title, "new title");
    assert_eq!(updated.deleted_at, deleted.deleted_at);
    assert!(updated.updated_at > deleted.updated_at);
    assert!(manager.list_all(false).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_list_by_status() -> anyhow::Result<()> {
    let manager = setup().await?;

    let first = manager.create("first", "content", None).await?;
    let second = manager.create("second", "content", None).await?;
    let third = manager.create("third", "content", None).await?;
    manager.soft_delete(first).await?;
    manager.soft_delete(third).await?;

    let deleted = manager.list_by_status(StatusFilter::Deleted, SortOrder::NewestFirst).await?;
    assert_eq!(ids(&deleted), vec![third, first]);
    assert!(deleted.iter().all(|a| a.is_deleted()));

    let active = manager.list_by_status(StatusFilter::Active, SortOrder::NewestFirst).await?;
    assert_eq!(ids(&active), vec![second]);

    let all = manager.list_by_status(StatusFilter::All, SortOrder::OldestFirst).await?;
    assert_eq!(ids(&all), vec![first, second, third]);

    Ok(())
}

#[tokio::test]
async fn test_listing_order() -> anyhow::Result<()> {
    let manager = setup().await?;

    let first = manager.create("first", "content", None).await?;
    let second = manager.create("second", "content", None).await?;
    let third = manager.create("third", "content", None).await?;
    manager.soft_delete(second).await?;

    assert_eq!(ids(&manager.list_all(false).await?), vec![third, first]);
    assert_eq!(ids(&manager.list_all(true).await?), vec![third, second, first]);
    assert_eq!(
        ids(&manager.list_sorted(true, SortOrder::OldestFirst).await?),
        vec![first, second, third]
    );

    Ok(())
}

#[tokio::test]
async fn test_record_without_ttl_never_expires() -> anyhow::Result<()> {
    let manager = setup().await?;
    let id = manager.create("Permanent", "Stays forever", None).await?;

    assert_eq!(manager.sweep_expired().await?, 0);
    let announcement = manager.get_by_id(id).await?.unwrap();
    assert!(announcement.expires_at.is_none());
    assert!(announcement.deleted_at.is_none());

    Ok(())
}

#[tokio::test]
async fn test_zero_ttl_expires_on_next_sweep() -> anyhow::Result<()> {
    let manager = setup().await?;
    let id = manager.create("Flash", "Gone soon", Some(Duration::zero())).await?;
    let keep = manager.create("Later", "Not yet", Some(Duration::hours(24))).await?;

    assert_eq!(manager.sweep_expired().await?, 1);
    assert!(manager.get_by_id(id).await?.unwrap().is_deleted());
    assert!(!manager.get_by_id(keep).await?.unwrap().is_deleted());

    // Nothing new expired in between
    assert_eq!(manager.sweep_expired().await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_expired_record_lifecycle() -> anyhow::Result<()> {
    let manager = setup().await?;
    let id = manager.create("A", "B", Some(Duration::hours(-1))).await?;

    let created = manager.get_by_id(id).await?.unwrap();
    assert!(created.expires_at.unwrap() >= created.created_at);

    assert_eq!(manager.sweep_expired().await?, 1);
    assert!(!ids(&manager.list_all(false).await?).contains(&id));

    let all = manager.list_all(true).await?;
    let swept = all.iter().find(|a| a.id == id).expect("still present with include_deleted");
    assert!(swept.deleted_at.is_some());

    Ok(())
}

#[tokio::test]
async fn test_restored_expired_record_waits_for_next_sweep() -> anyhow::Result<()> {
    let manager = setup().await?;
    let id = manager.create_with_ttl_hours("A", "B", -1).await?;

    assert_eq!(manager.sweep_expired().await?, 1);
    assert!(manager.restore(id).await?);
    assert!(!manager.get_by_id(id).await?.unwrap().is_deleted());

    assert_eq!(manager.sweep_expired().await?, 1);
    assert!(manager.get_by_id(id).await?.unwrap().is_deleted());

    Ok(())
}

#[tokio::test]
async fn test_search_scopes() -> anyhow::Result<()> {
    let manager = setup().await?;

    let in_title = manager.create("foo fighters", "concert tonight", None).await?;
    let in_content = manager.create("weekly digest", "more foo inside", None).await?;
    let neither = manager.create("bar", "baz", None).await?;

    assert_eq!(ids(&manager.search("foo", SearchScope::Title).await?), vec![in_title]);
    assert_eq!(ids(&manager.search("foo", SearchScope::Content).await?), vec![in_content]);
    assert_eq!(
        ids(&manager.search("foo", SearchScope::Both).await?),
        vec![in_content, in_title]
    );

    // Empty keyword returns every active record
    assert_eq!(
        ids(&manager.search("", SearchScope::Title).await?),
        vec![neither, in_content, in_title]
    );

    // Soft-deleted records are hidden from search
    manager.soft_delete(in_title).await?;
    assert!(manager.search("foo", SearchScope::Title).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_search_case_and_wildcards() -> anyhow::Result<()> {
    let insensitive = setup().await?;
    let id = insensitive.create("Server Upgrade", "100% done_now", None).await?;
    insensitive.create("Other", "1000 done, one night", None).await?;

    assert_eq!(ids(&insensitive.search("server", SearchScope::Title).await?), vec![id]);
    assert_eq!(ids(&insensitive.search("100%", SearchScope::Content).await?), vec![id]);
    assert_eq!(ids(&insensitive.search("e_n", SearchScope::Content).await?), vec![id]);

    let sensitive = setup_manager(SearchConfig { case_sensitive: true }).await?;
    let id = sensitive.create("Server Upgrade", "details", None).await?;
    assert!(sensitive.search("server", SearchScope::Title).await?.is_empty());
    assert_eq!(ids(&sensitive.search("Server", SearchScope::Title).await?), vec![id]);

    Ok(())
}

#[tokio::test]
async fn test_purge_and_stats() -> anyhow::Result<()> {
    let manager = setup().await?;

    let active = manager.create("active", "content", None).await?;
    let deleted = manager.create("deleted", "content", None).await?;
    manager.create("overdue", "content", Some(Duration::hours(-2))).await?;
    manager.soft_delete(deleted).await?;

    let stats = manager.stats().await?;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.active, 2);
    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.pending_expiry, 1);

    assert_eq!(manager.sweep_expired().await?, 1);
    assert_eq!(manager.purge_deleted().await?, 2);

    assert_eq!(ids(&manager.list_all(true).await?), vec![active]);
    let stats = manager.stats().await?;
    assert_eq!((stats.total, stats.active, stats.deleted, stats.pending_expiry), (1, 1, 0, 0));

    Ok(())
}
