// src/server/handlers.rs

use std::sync::LazyLock;

use axum::body::Body;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use regex::Regex;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::server::livereload::{CLIENT_SCRIPT, CLIENT_SCRIPT_PATH, ReloadHub, ReloadSignal};

static BODY_CLOSE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)</body\s*>").ok());

/// `GET /__assetflow/livereload.js`
pub async fn client_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        CLIENT_SCRIPT,
    )
}

/// `GET /__assetflow/ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<ReloadHub>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| client_session(socket, hub))
}

async fn client_session(socket: WebSocket, hub: ReloadHub) {
    let mut signals = hub.subscribe();
    let (mut sender, mut receiver) = socket.split();
    info!(clients = hub.client_count(), "live-reload client connected");

    loop {
        tokio::select! {
            received = signals.recv() => {
                let Some(signal) = signal_to_send(received) else { break };
                if sender.send(Message::Text(signal.to_json().into())).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    drop(signals);
    info!(clients = hub.client_count(), "live-reload client disconnected");
}

/// What to push for a broadcast receive; `None` once the hub is gone.
/// Missed signals collapse into one full reload.
fn signal_to_send(received: Result<ReloadSignal, RecvError>) -> Option<ReloadSignal> {
    match received {
        Ok(signal) => Some(signal),
        Err(RecvError::Lagged(skipped)) => {
            debug!(skipped, "live-reload client lagged");
            Some(ReloadSignal::Reload)
        }
        Err(RecvError::Closed) => None,
    }
}

/// Insert the client `<script>` before the last `</body>`, or append it
/// when the document has none.
pub fn inject_script(html: &str) -> String {
    let tag = format!(r#"<script src="{CLIENT_SCRIPT_PATH}"></script>"#);
    let close = BODY_CLOSE
        .as_ref()
        .and_then(|re| re.find_iter(html).last());
    match close {
        Some(m) => {
            let mut out = String::with_capacity(html.len() + tag.len());
            out.push_str(&html[..m.start()]);
            out.push_str(&tag);
            out.push_str(&html[m.start()..]);
            out
        }
        None => format!("{html}{tag}"),
    }
}

/// Middleware adding the live-reload script to full HTML responses.
pub async fn inject_livereload(req: Request, next: Next) -> Response {
    let res = next.run(req).await;

    let is_html = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));
    if res.status() != StatusCode::OK || !is_html {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            warn!(error = %e, "failed to buffer html response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let html = inject_script(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(html))
}
