use store_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (dotenv, logging)
    setup_environment()?;

    tracing::info!("Store Server starting...");

    // 2. Configuration
    let config = Config::from_env();

    // 3. `store-server seed` populates the database and exits
    if std::env::args().nth(1).as_deref() == Some("seed") {
        let pool = store_server::db::init_pool(&config).await?;
        store_server::db::seed::seed_database(&pool).await?;
        return Ok(());
    }

    // 4. State + HTTP server
    let state = ServerState::initialize(&config).await?;
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
