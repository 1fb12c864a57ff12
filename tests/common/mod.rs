//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::Method;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use waypoint::{HttpServer, Router, ServerConfig, Shutdown};

/// A server running on an ephemeral localhost port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for `run` to return.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Serve `router` with `config`, overriding the bind address.
pub async fn spawn_with_config(mut config: ServerConfig, router: Router) -> TestServer {
    config.listener.bind_address = "127.0.0.1:0".into();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, router);
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        server.run(listener, server_shutdown).await.unwrap();
    });

    TestServer { addr, shutdown, handle }
}

/// Serve `router` with default configuration.
pub async fn spawn_app(router: Router) -> TestServer {
    spawn_with_config(ServerConfig::default(), router).await
}

/// What came back from a request.
#[derive(Debug)]
pub struct UrlResponse {
    pub status: u16,
    pub body: String,
    pub headers: HeaderMap,
}

/// Perform `method` on `path`, optionally with a body and an `Accept` header.
pub async fn do_method(
    server: &TestServer,
    method: &str,
    path: &str,
    body: Option<&str>,
    accept: Option<&str>,
) -> UrlResponse {
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let method = Method::from_bytes(method.as_bytes()).unwrap();
    let mut request = client.request(method, server.url(path));
    if let Some(accept) = accept {
        request = request.header(ACCEPT, accept);
    }
    if let Some(body) = body {
        request = request.body(body.to_string());
    }

    let response = request.send().await.expect("Server unreachable");
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let body = response.text().await.unwrap();

    UrlResponse { status, body, headers }
}
