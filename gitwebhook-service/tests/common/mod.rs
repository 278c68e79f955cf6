use std::net::SocketAddr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use reqwest::header::CONTENT_TYPE;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use gitwebhook_service::config::Config;
use gitwebhook_service::server::serve;
use gitwebhook_service::test_utils::test_config;

pub static DEFAULT_CONFIG: Lazy<Config> = Lazy::new(test_config);

pub struct ServerHandle {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
}

impl ServerHandle {
    pub async fn for_config(config: Config) -> ServerHandle {
        let routing = config.routing().expect("invalid test configuration");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let notify = Arc::new(Notify::new());
        let shutdown = notify.clone();
        let shutdown_signal = async move { notify.notified().await };

        tokio::spawn(async move {
            serve(config, routing, listener, shutdown_signal)
                .await
                .expect("server failed")
        });
        ServerHandle { addr, shutdown }
    }

    pub async fn post_service<T: Into<reqwest::Body>>(
        &self,
        version: &str,
        content_type: &str,
        body: T,
    ) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("http://{:?}/api/{}/service", self.addr, version))
            .body(body)
            .header(CONTENT_TYPE, content_type)
            .send()
            .await
            .expect("failed to send request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("http://{:?}{}", self.addr, path))
            .send()
            .await
            .expect("failed to send request")
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown.notify_one()
    }
}

pub fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {}: {}", path, e))
}
