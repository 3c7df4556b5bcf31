// src/server/livereload.rs

//! Live-reload broadcast hub and the browser-side client script.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::types::ReloadKind;

/// Path the injected `<script>` tag loads.
pub const CLIENT_SCRIPT_PATH: &str = "/__assetflow/livereload.js";

/// WebSocket endpoint the client connects to.
pub const WS_PATH: &str = "/__assetflow/ws";

const CHANNEL_CAPACITY: usize = 64;

/// Message pushed to every connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadSignal {
    /// Full page reload.
    Reload,
    /// Re-fetch stylesheets without reloading the page. An empty list means
    /// every stylesheet.
    Css { paths: Vec<String> },
}

impl ReloadSignal {
    /// Signal for a finished task, `None` when the task does not reload.
    ///
    /// `outputs` are paths relative to the output directory.
    pub fn for_outputs(kind: ReloadKind, outputs: &[String]) -> Option<Self> {
        match kind {
            ReloadKind::None => None,
            ReloadKind::Page => Some(ReloadSignal::Reload),
            ReloadKind::Css => Some(ReloadSignal::Css {
                paths: outputs
                    .iter()
                    .filter(|p| p.ends_with(".css"))
                    .map(|p| format!("/{}", p.trim_start_matches('/')))
                    .collect(),
            }),
        }
    }

    pub fn to_json(&self) -> String {
        // Plain enum of strings; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload"}"#.to_string())
    }
}

/// Fan-out of reload signals to live-reload clients.
///
/// Each WebSocket connection holds one receiver, so the receiver count is
/// the number of connected clients.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadSignal>,
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadSignal> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Push `signal` to every client; returns how many received it.
    pub fn send(&self, signal: ReloadSignal) -> usize {
        match self.tx.send(signal.clone()) {
            Ok(n) => {
                info!(?signal, clients = n, "reload broadcast");
                n
            }
            Err(_) => {
                debug!(?signal, "no live-reload clients connected");
                0
            }
        }
    }

    /// Notify clients after a task of the given reload kind produced `outputs`.
    pub fn notify(&self, kind: ReloadKind, outputs: &[String]) -> usize {
        match ReloadSignal::for_outputs(kind, outputs) {
            Some(signal) => self.send(signal),
            None => 0,
        }
    }
}

/// Browser client: connects to [`WS_PATH`], reloads the page or swaps
/// stylesheet hrefs, and reconnects after the server restarts.
pub const CLIENT_SCRIPT: &str = r#"(function () {
  var url = (location.protocol === "https:" ? "wss://" : "ws://") + location.host + "/__assetflow/ws";
  function refreshCss(paths) {
    var links = document.querySelectorAll('link[rel="stylesheet"]');
    links.forEach(function (link) {
      var href = link.getAttribute("href");
      if (!href) return;
      var bare = href.split("?")[0];
      var match = paths.length === 0 || paths.some(function (p) {
        return bare === p || bare.endsWith(p) || ("/" + bare) === p;
      });
      if (!match) return;
      var next = link.cloneNode();
      next.href = bare + "?livereload=" + Date.now();
      next.onload = function () { link.remove(); };
      link.parentNode.insertBefore(next, link.nextSibling);
    });
  }
  function connect() {
    var ws = new WebSocket(url);
    ws.onmessage = function (ev) {
      var msg;
      try { msg = JSON.parse(ev.data); } catch (e) { return; }
      if (msg.type === "reload") location.reload();
      else if (msg.type === "css") refreshCss(msg.paths || []);
    };
    ws.onclose = function () { setTimeout(connect, 1000); };
  }
  connect();
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format() {
        assert_eq!(ReloadSignal::Reload.to_json(), r#"{"type":"reload"}"#);
        let css = ReloadSignal::Css {
            paths: vec!["/main.min.css".into()],
        };
        assert_eq!(css.to_json(), r#"{"type":"css","paths":["/main.min.css"]}"#);
    }

    #[test]
    fn css_signal_keeps_only_stylesheets() {
        let outputs = vec!["main.min.css".to_string(), "main.min.css.map".to_string()];
        let signal = ReloadSignal::for_outputs(ReloadKind::Css, &outputs);
        assert_eq!(
            signal,
            Some(ReloadSignal::Css {
                paths: vec!["/main.min.css".into()]
            })
        );
        assert_eq!(ReloadSignal::for_outputs(ReloadKind::None, &outputs), None);
    }

    #[tokio::test]
    async fn subscribers_receive_signals() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();
        assert_eq!(hub.client_count(), 1);

        assert_eq!(hub.notify(ReloadKind::Page, &[]), 1);
        assert_eq!(rx.recv().await.unwrap(), ReloadSignal::Reload);
    }

    #[test]
    fn notify_without_clients_is_harmless() {
        let hub = ReloadHub::new();
        assert_eq!(hub.notify(ReloadKind::Page, &[]), 0);
    }
}
