use std::sync::Arc;

use viewgate::config::Config;
use viewgate::db::pool::ConnectionPool;
use viewgate::db::postgres::PgConnectionFactory;
use viewgate::gateway::Gateway;
use viewgate::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "viewgate.yaml".to_string());
    let cfg = Config::load(&config_path)?;

    let registry = cfg.build_registry()?;
    tracing::info!(views = registry.len(), "view registry built");

    let factory = PgConnectionFactory::new(&cfg.database.url);
    let pool = ConnectionPool::new(Box::new(factory));
    let gateway = Arc::new(Gateway::new(registry, pool));

    tokio::select! {
        res = server::listener::run(&cfg.listen, gateway) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}
