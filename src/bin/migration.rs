use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::{error, info};
use video_store_api::{db, migrator::Migrator};

#[derive(Parser)]
#[command(
    name = "migration",
    about = "Apply or roll back the video store schema",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Database URL; defaults to $DATABASE_URL, then a local SQLite file"
    )]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations
    Up {
        #[arg(long, help = "Apply at most this many migrations")]
        steps: Option<u32>,
    },
    /// Roll back applied migrations
    Down {
        #[arg(long, default_value_t = 1, help = "Number of migrations to roll back")]
        steps: u32,
    },
    /// Drop every table and re-apply all migrations
    Fresh,
    /// List applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let database_url = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://video_store.db?mode=rwc".to_string());

    let pool = db::establish_connection(&database_url).await?;

    let result = match cli.command {
        Commands::Up { steps } => {
            info!(?steps, "Applying migrations");
            Migrator::up(&pool, steps).await
        }
        Commands::Down { steps } => {
            info!(steps, "Rolling back migrations");
            Migrator::down(&pool, Some(steps)).await
        }
        Commands::Fresh => {
            info!("Rebuilding schema from scratch");
            Migrator::fresh(&pool).await
        }
        Commands::Status => print_status(&pool).await,
    };

    if let Err(e) = &result {
        error!("Migration command failed: {}", e);
    }
    result?;

    db::close_pool(pool).await?;
    info!("Migration command completed");
    Ok(())
}

async fn print_status(pool: &db::DbPool) -> Result<(), sea_orm::DbErr> {
    let applied = Migrator::get_applied_migrations(pool).await?;
    let pending = Migrator::get_pending_migrations(pool).await?;

    for migration in &applied {
        println!("applied  {}", migration.name());
    }
    for migration in &pending {
        println!("pending  {}", migration.name());
    }
    println!("{} applied, {} pending", applied.len(), pending.len());
    Ok(())
}
