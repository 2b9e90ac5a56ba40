use chrono::Duration;
use clap::Parser;
use fake::{faker::lorem::en::{Paragraph, Sentence}, Fake};
use rand::Rng;

use herald::{config::Settings, db, domain::CreateAnnouncementRequest, AnnouncementManager};

#[derive(Parser)]
#[command(name = "seed", about = "Fill the announcement database with sample data")]
struct Args {
    /// Number of announcements to create
    #[arg(long, default_value_t = 20)]
    count: usize,

    /// Database URL (defaults to DATABASE_URL, then the configured URL)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let mut settings = Settings::new().unwrap_or_default();
    if let Some(url) = args.database_url.or_else(|| std::env::var("DATABASE_URL").ok()) {
        settings.database.url = url;
    }

    let pool = db::connect(&settings.database).await?;
    let manager = AnnouncementManager::from_settings(pool.clone(), &settings);
    let mut rng = rand::thread_rng();

    println!("📢 Creating announcements...");
    let mut expiring = 0;
    let mut expired = 0;
    for _ in 0..args.count {
        let title: String = Sentence(2..6).fake();
        let content: String = Paragraph(1..4).fake();
        let mut request = CreateAnnouncementRequest::new(title.trim_end_matches('.'), content);

        // Roughly a third never expire; some are already past their expiry
        match rng.gen_range(0..3) {
            0 => {}
            _ => {
                let hours = rng.gen_range(-12..=72);
                if hours <= 0 {
                    expired += 1;
                } else {
                    expiring += 1;
                }
                request = request.with_ttl(Duration::hours(hours));
            }
        }

        manager.create_announcement(request).await?;
    }

    println!(
        "  ✅ Created {} announcements ({} expiring, {} already expired)",
        args.count, expiring, expired
    );

    let stats = manager.stats().await?;
    println!("📊 {} total, {} pending expiry", stats.total, stats.pending_expiry);

    pool.close().await;
    println!("🎉 Seeding complete!");
    Ok(())
}
