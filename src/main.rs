use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use herald::{
    config::Settings,
    db,
    domain::StatusFilter,
    error::AppError,
    AnnouncementManager, SearchScope, SortOrder,
};

#[derive(Parser)]
#[command(name = "herald", about = "Manage time-bound announcements")]
struct Cli {
    /// Override the configured database URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an announcement
    Create {
        title: String,
        content: String,
        /// Expire after this many hours
        #[arg(long, allow_hyphen_values = true)]
        ttl_hours: Option<i64>,
    },
    /// List announcements, newest first
    List {
        #[arg(long)]
        include_deleted: bool,
        /// Only soft-deleted announcements
        #[arg(long, conflicts_with = "include_deleted")]
        deleted_only: bool,
        #[arg(long)]
        oldest_first: bool,
    },
    /// Show one announcement, deleted or not
    Show { id: i64 },
    /// Search active announcements
    Search {
        #[arg(default_value = "")]
        keyword: String,
        /// title, content or both
        #[arg(long, default_value = "both")]
        scope: String,
    },
    /// Replace the title and content of an announcement
    Update { id: i64, title: String, content: String },
    /// Soft-delete an announcement, or remove it for good with --hard
    Delete {
        id: i64,
        #[arg(long)]
        hard: bool,
    },
    /// Restore a soft-deleted announcement
    Restore { id: i64 },
    /// Soft-delete expired announcements now
    Sweep,
    /// Permanently delete every soft-deleted announcement
    Purge,
    /// Print announcement counts
    Stats,
    /// Run the expiry sweeper until interrupted
    Run {
        /// Override the configured sweep interval
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });
    if let Some(url) = cli.database_url {
        settings.database.url = url;
    }

    let pool = db::connect(&settings.database).await?;
    let manager = AnnouncementManager::from_settings(pool.clone(), &settings);

    match cli.command {
        Command::Create { title, content, ttl_hours } => {
            let id = match ttl_hours {
                Some(hours) => manager.create_with_ttl_hours(&title, &content, hours).await?,
                None => manager.create(&title, &content, None).await?,
            };
            println!("{}", id);
        }
        Command::List { include_deleted, deleted_only, oldest_first } => {
            let order = if oldest_first { SortOrder::OldestFirst } else { SortOrder::NewestFirst };
            let status = if deleted_only {
                StatusFilter::Deleted
            } else {
                StatusFilter::from_include_deleted(include_deleted)
            };
            let announcements = manager.list_by_status(status, order).await?;
            println!("{}", serde_json::to_string_pretty(&announcements)?);
        }
        Command::Show { id } => {
            let announcement = manager
                .get_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("announcement {}", id)))?;
            println!("{}", serde_json::to_string_pretty(&announcement)?);
        }
        Command::Search { keyword, scope } => {
            let scope = SearchScope::from_str(&scope)
                .ok_or_else(|| AppError::Validation(format!("unknown search scope: {}", scope)))?;
            let results = manager.search(&keyword, scope).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Update { id, title, content } => {
            report(manager.update(id, &title, &content).await?, "updated", id);
        }
        Command::Delete { id, hard } => {
            if hard {
                report(manager.hard_delete(id).await?, "permanently deleted", id);
            } else {
                report(manager.soft_delete(id).await?, "deleted", id);
            }
        }
        Command::Restore { id } => {
            report(manager.restore(id).await?, "restored", id);
        }
        Command::Sweep => {
            println!("{}", manager.sweep_expired().await?);
        }
        Command::Purge => {
            println!("{}", manager.purge_deleted().await?);
        }
        Command::Stats => {
            println!("{}", serde_json::to_string_pretty(&manager.stats().await?)?);
        }
        Command::Run { interval_secs } => {
            if !settings.sweeper.enabled {
                tracing::warn!("Expiry sweeper disabled in configuration");
                return Ok(());
            }

            let interval = interval_secs
                .map(std::time::Duration::from_secs)
                .unwrap_or_else(|| settings.sweeper.interval());
            manager.start_sweeper(interval).await?;

            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutdown signal received");
            manager.stop_sweeper().await;
        }
    }

    pool.close().await;
    Ok(())
}

fn report(success: bool, action: &str, id: i64) {
    if success {
        println!("announcement {} {}", id, action);
    } else {
        eprintln!("announcement {} not found", id);
    }
}
