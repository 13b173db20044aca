use eduquest_auth::migrations::Migrator;
use eduquest_auth::{logging, App, Config};
use sea_orm_migration::MigratorTrait;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    logging::init_for(&config);

    let app = App::with_config(config).await?;

    // `--rollback [steps]` undoes migrations and exits instead of serving.
    let args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--rollback") {
        let steps = args
            .get(pos + 1)
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(1);
        tracing::info!("Rolling back {} migration(s)...", steps);
        Migrator::down(&app.db, Some(steps)).await?;
        tracing::info!("Rollback complete.");
        return Ok(());
    }
    if args.iter().any(|arg| arg == "--migrate") {
        // Migrations already ran while building the app.
        return Ok(());
    }

    app.run().await
}
