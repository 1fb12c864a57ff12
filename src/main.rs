//! Waypoint demo server.
//!
//! Serves a small sample application on top of the routing framework:
//!
//! ```text
//! GET  /                 → "root"
//! GET  /hello            → "Hello World!"
//! POST /hello            → echoes the request body
//! GET  /private          → 401, halted by the handler
//! GET  /users/:name      → greets the captured name
//! GET  /protected/*      → 403, halted by a before filter
//! GET  /news/:section    → redirect to /news/:section/latest
//! ```
//!
//! Every request is logged by a before filter and tagged by an after filter.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use waypoint::config::{load_config, ServerConfig};
use waypoint::observability::logging;
use waypoint::{halt, HttpServer, Router, Shutdown};

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "Micro web-routing framework demo server", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

fn sample_app() -> Router {
    let mut router = Router::new();

    router
        .before_all(|req, _| {
            tracing::info!(request_id = %req.id(), method = %req.method(), path = %req.path(), "Incoming");
            Ok(())
        })
        .before("/protected/*", |_, _| Err(halt(403, "I don't think so!!!")))
        .get("/", |_, _| Ok("root".into()))
        .get("/hello", |_, _| Ok("Hello World!".into()))
        .post("/hello", |req, _| Ok(format!("Hello World: {}", req.body()).into()))
        .get("/private", |_, _| Err(halt(401, "Go Away!")))
        .get("/users/:name", |req, _| {
            let name = req.params("name").unwrap_or_default();
            Ok(format!("Selected user: {name}").into())
        })
        .get("/news/:section", |req, res| {
            let section = req.params("section").unwrap_or_default();
            res.redirect(&format!("/news/{section}/latest"));
            Ok(().into())
        })
        .after_all(|_, res| {
            res.header("x-served-by", "waypoint");
            Ok(())
        });

    router
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level)?;
    tracing::info!("waypoint v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_concurrent_requests = config.listener.max_concurrent_requests,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, sample_app());
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
