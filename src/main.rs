use actix_web::{middleware, App, HttpServer};
use clap::Parser;
use navigator::api::cors::cors_layer;
use navigator::api::middleware::RequireSession;
use navigator::api::AppState;
use navigator::cli::{commands::{Cli, Commands}, run_cli};
use navigator::config::AppConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve) {
        if let Err(e) = run_cli(cli.command, cli.config).await {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    info!("Starting Compliance Navigator API...");

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let state = match AppState::from_config(config).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize application state: {:#}", e);
            std::process::exit(1);
        }
    };

    let host = state.config.server.host.clone();
    let port = state.config.server.port;
    let pool = state.pool.clone();

    info!(
        "Server listening on {}:{} ({} backend)",
        host,
        port,
        pool.backend()
    );

    let server_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(RequireSession)
            .wrap(cors_layer(&server_state.config.cors))
            .wrap(middleware::Logger::default())
            .configure(|cfg| server_state.configure(cfg))
    })
    .bind((host, port))?
    .run()
    .await?;

    info!("Shutting down, closing database pool");
    pool.close().await;
    Ok(())
}
