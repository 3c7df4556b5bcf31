// src/server/mod.rs

//! Development server: static files from the output directory plus
//! live-reload over a WebSocket.
//!
//! Routes:
//! - `/__assetflow/livereload.js`: client script
//! - `/__assetflow/ws`: reload signal stream
//! - everything else: files under the output directory, `index.html` for
//!   directories. HTML responses get the client script injected.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Router, middleware};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::config::model::ServerSection;

pub mod handlers;
pub mod livereload;

pub use livereload::{ReloadHub, ReloadSignal};

/// Build the dev server router for `output`.
pub fn router(output: &Path, hub: ReloadHub) -> Router {
    let static_files = ServeDir::new(output).append_index_html_on_directories(true);

    Router::new()
        .route(livereload::CLIENT_SCRIPT_PATH, get(handlers::client_script))
        .route(livereload::WS_PATH, get(handlers::ws_handler))
        .fallback_service(static_files)
        .layer(middleware::from_fn(handlers::inject_livereload))
        .with_state(hub)
}

/// Handle to a running dev server.
#[derive(Debug)]
pub struct DevServerHandle {
    pub addr: SocketAddr,
    pub task: JoinHandle<()>,
}

impl DevServerHandle {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Bind and start serving in the background.
pub async fn spawn_dev_server(
    server: &ServerSection,
    output: &Path,
    hub: ReloadHub,
) -> Result<DevServerHandle> {
    let bind = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding dev server to {bind}"))?;
    let addr = listener.local_addr()?;

    let app = router(output, hub);
    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "dev server stopped");
        }
    });

    let handle = DevServerHandle { addr, task };
    info!(url = %handle.url(), output = %output.display(), "dev server listening");

    if server.open {
        if let Err(e) = webbrowser::open(&handle.url()) {
            warn!(error = %e, "could not open browser");
        }
    }

    Ok(handle)
}
