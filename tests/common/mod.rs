//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use route_tree::config::AppConfig;
use route_tree::http::HttpServer;
use route_tree::lifecycle::{self, Shutdown};
use route_tree::movies::MemMovieStore;

/// A movie service running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the movie service with an empty in-memory store.
pub async fn start_movie_service() -> TestServer {
    let config = AppConfig::default();
    let app = lifecycle::build_application(&config, Arc::new(MemMovieStore::new())).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, app);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestServer { addr, shutdown }
}
