use comanda_server::{Config, Server, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    config.ensure_work_dir_structure()?;
    init_logger_with_file(&config.log_level, config.log_json, Some(&config.logs_dir()))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), work_dir = %config.work_dir, "Starting comanda");

    if let Err(e) = Server::new(config).run().await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }
    Ok(())
}
