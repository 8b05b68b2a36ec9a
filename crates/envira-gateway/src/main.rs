//! Envira Gateway entry point.

use clap::Parser;
use envira_gateway::{
    cli::{Cli, Commands},
    db::Repositories,
    metrics, seed, server, GatewayConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "envira_gateway=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = GatewayConfig::from_env()?;

    match cli.command() {
        Commands::Token { user_id } => {
            let token = config.jwt_config().generate_token(&user_id)?;
            println!("{token}");
        }
        Commands::Seed => {
            let repositories = Repositories::connect(config.database_url.as_deref()).await?;
            seed::run(&repositories).await?;
        }
        Commands::Serve { seed: seed_first } => {
            tracing::info!("Starting Envira Gateway v{}", env!("CARGO_PKG_VERSION"));
            metrics::init_metrics();

            let repositories = Repositories::connect(config.database_url.as_deref()).await?;
            if seed_first {
                seed::run(&repositories).await?;
            }
            let state = server::build_state(&config, repositories);
            tracing::info!(
                "chat context budget {} chars over the last {} exchanges",
                state.chat.window.max_chars,
                state.chat.history_limit
            );

            server::serve(config.bind_addr, server::build_app(state)).await?;
        }
    }

    Ok(())
}
