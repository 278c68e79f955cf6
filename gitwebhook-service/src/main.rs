use envconfig::Envconfig;
use eyre::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use gitwebhook_service::config::Config;
use gitwebhook_service::server::serve;

async fn shutdown() {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");

    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("failed to register SIGINT handler");

    tokio::select! {
        _ = term.recv() => {},
        _ = interrupt.recv() => {},
    };

    tracing::info!("Shutting down gracefully...");
}

async fn listen(config: Config) -> Result<()> {
    let routing = config.routing()?;
    let listener = TcpListener::bind(config.bind()).await?;

    serve(config, routing, listener, shutdown()).await
}

#[tokio::main]
async fn main() {
    let config = Config::init_from_env().expect("Invalid configuration:");

    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .parse_lossy(&config.log_level),
        )
        .init();

    tracing::info!("starting {} {}", config.name, config.version);

    if let Err(e) = listen(config).await {
        tracing::error!("failed to start gitwebhook-service http server, {}", e);
        std::process::exit(1);
    }
}
