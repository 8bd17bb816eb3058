use std::sync::Arc;

use clap::Parser;
use migration::{Migrator, MigratorTrait};
use sea_orm::ConnectOptions;
use settings::Database;

mod settings;

#[derive(Debug, Parser)]
#[command(name = "duetto", version, about = "Shared expenses for couples")]
struct Cli {
    /// Settings file, with or without the `.toml` extension.
    #[arg(short, long, env = "DUETTO_CONFIG", default_value = "settings")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "duetto={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;
    let avatars = engine::LocalAvatarStore::new(
        &settings.avatars.dir,
        &settings.avatars.public_base_url,
    );
    let engine = engine::Engine::builder()
        .database(db)
        .avatar_store(Arc::new(avatars))
        .settlement_mode(settings.engine.settlement_mode)
        .invitation_ttl_days(settings.engine.invitation_ttl_days)
        .allowed_emails(settings.engine.allowed_emails)
        .build()
        .await?;
    tracing::info!(
        "engine ready (settlement mode {:?})",
        engine.settlement_mode()
    );

    let bind = settings.server.bind.as_deref().unwrap_or("127.0.0.1");
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(engine, &settings.avatars.dir, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let options = match config {
        // Every pooled connection would open its own empty in-memory database.
        Database::Memory => {
            let mut options = ConnectOptions::new("sqlite::memory:");
            options.max_connections(1).min_connections(1);
            options
        }
        Database::Sqlite(path) => ConnectOptions::new(format!("sqlite:{}?mode=rwc", path)),
    };

    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
