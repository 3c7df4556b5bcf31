use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assetflow::transform::{
    BuildSettings, TransformError, TransformFuture, TransformReport, Transformer,
};
use tokio::sync::Barrier;

/// What a fake transformer did, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Finished(String),
    Failed(String),
}

/// Shared, ordered log written by every fake in a test.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn snapshot(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.snapshot().iter().position(|e| e == event)
    }

    pub fn count(&self, event: &Event) -> usize {
        self.snapshot().iter().filter(|e| *e == event).count()
    }

    pub fn started(&self, label: &str) -> bool {
        self.position(&Event::Started(label.to_string())).is_some()
    }

    pub fn finished(&self, label: &str) -> bool {
        self.position(&Event::Finished(label.to_string())).is_some()
    }
}

/// Fake transformer that logs its start and end, optionally sleeps, writes
/// files into the output directory, or fails.
#[derive(Debug, Clone)]
pub struct RecordingTransformer {
    label: String,
    log: EventLog,
    delay: Duration,
    fail: Option<String>,
    writes: Vec<(String, String)>,
}

impl RecordingTransformer {
    pub fn new(label: &str, log: &EventLog) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
            delay: Duration::ZERO,
            fail: None,
            writes: Vec::new(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail = Some(message.to_string());
        self
    }

    /// Write `contents` to `<output>/<rel>` on success.
    pub fn writing(mut self, rel: &str, contents: &str) -> Self {
        self.writes.push((rel.to_string(), contents.to_string()));
        self
    }

    pub fn arc(self) -> Arc<dyn Transformer> {
        Arc::new(self)
    }
}

impl Transformer for RecordingTransformer {
    fn describe(&self) -> String {
        format!("fake {}", self.label)
    }

    fn transform<'a>(&'a self, settings: &'a BuildSettings) -> TransformFuture<'a> {
        Box::pin(async move {
            self.log.push(Event::Started(self.label.clone()));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            if let Some(message) = &self.fail {
                self.log.push(Event::Failed(self.label.clone()));
                return Err(TransformError::at(
                    settings.root.join(format!("{}.src", self.label)),
                    message.clone(),
                ));
            }

            let mut outputs: Vec<PathBuf> = Vec::new();
            for (rel, contents) in &self.writes {
                let target = settings.output.join(rel);
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| TransformError::io(parent, e))?;
                }
                tokio::fs::write(&target, contents)
                    .await
                    .map_err(|e| TransformError::io(&target, e))?;
                outputs.push(target);
            }

            self.log.push(Event::Finished(self.label.clone()));
            Ok(TransformReport::with_outputs(outputs))
        })
    }
}

/// Fake transformer that waits on a shared barrier. A group of these only
/// completes when all of them run at the same time.
#[derive(Debug, Clone)]
pub struct BarrierTransformer {
    label: String,
    log: EventLog,
    barrier: Arc<Barrier>,
}

impl BarrierTransformer {
    pub fn new(label: &str, log: &EventLog, barrier: &Arc<Barrier>) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
            barrier: Arc::clone(barrier),
        }
    }

    pub fn arc(self) -> Arc<dyn Transformer> {
        Arc::new(self)
    }
}

impl Transformer for BarrierTransformer {
    fn describe(&self) -> String {
        format!("barrier {}", self.label)
    }

    fn transform<'a>(&'a self, _settings: &'a BuildSettings) -> TransformFuture<'a> {
        Box::pin(async move {
            self.log.push(Event::Started(self.label.clone()));
            self.barrier.wait().await;
            self.log.push(Event::Finished(self.label.clone()));
            Ok(TransformReport::default())
        })
    }
}

/// Fake transformer whose first run panics mid-flight. Later runs succeed.
#[derive(Debug)]
pub struct PanicOnceTransformer {
    label: String,
    log: EventLog,
    panicked: AtomicBool,
}

impl PanicOnceTransformer {
    pub fn new(label: &str, log: &EventLog) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
            panicked: AtomicBool::new(false),
        }
    }

    pub fn arc(self) -> Arc<dyn Transformer> {
        Arc::new(self)
    }
}

impl Transformer for PanicOnceTransformer {
    fn describe(&self) -> String {
        format!("panic-once {}", self.label)
    }

    fn transform<'a>(&'a self, _settings: &'a BuildSettings) -> TransformFuture<'a> {
        Box::pin(async move {
            self.log.push(Event::Started(self.label.clone()));
            if !self.panicked.swap(true, Ordering::SeqCst) {
                panic!("{} blew up", self.label);
            }
            self.log.push(Event::Finished(self.label.clone()));
            Ok(TransformReport::default())
        })
    }
}
