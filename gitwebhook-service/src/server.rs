use std::future::Future;
use std::sync::Arc;

use eyre::{Result, WrapErr};
use tokio::net::TcpListener;

use gitwebhook_common::forwarder::HttpForwarder;
use gitwebhook_common::routing::RoutingConfig;

use crate::config::Config;
use crate::handlers::AppState;
use crate::router;

pub async fn serve<F>(
    config: Config,
    routing: RoutingConfig,
    listener: TcpListener,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if config.tls_insecure_skip_verify {
        tracing::warn!("TLS certificate verification is disabled for event listeners");
    }

    let forwarder = HttpForwarder::new(config.request_timeout.0, config.tls_insecure_skip_verify)
        .wrap_err("failed to build http client")?;

    let state = AppState {
        routing: Arc::new(routing),
        forwarder: Arc::new(forwarder),
        name: config.name,
        version: config.version,
        max_body_size: config.max_body_size,
    };

    let app = router::router(state, config.concurrency_limit, config.export_prometheus);

    tracing::info!("listening on {:?}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
