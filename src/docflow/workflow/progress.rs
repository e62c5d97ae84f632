// SPDX-License-Identifier: MIT

//! Elapsed-time reporting around a running step
//!
//! A `ProgressOverlay` is created for one step invocation and torn down
//! when that invocation finishes. It owns its start time and a stop
//! channel; the reporter task never touches workflow state.
//!
//! Ticks pass through a gate that is closed before `Stopped` is emitted,
//! so a sink never sees a `Tick` after the matching `Stopped`, even when
//! the overlay is dropped mid-run and the reporter is aborted rather than
//! joined.

use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Default reporter tick interval
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(50);

/// Observation emitted by an overlay
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started { node: String },
    Tick { node: String, elapsed: Duration },
    Stopped { node: String, elapsed: Duration },
}

impl ProgressEvent {
    pub fn node(&self) -> &str {
        match self {
            ProgressEvent::Started { node }
            | ProgressEvent::Tick { node, .. }
            | ProgressEvent::Stopped { node, .. } => node,
        }
    }
}

/// Destination for progress observations
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Live reporter attached to one step invocation
pub struct ProgressOverlay {
    node: String,
    started: Instant,
    sink: Arc<dyn ProgressSink>,
    stop_tx: Option<oneshot::Sender<()>>,
    reporter: Option<JoinHandle<()>>,
    /// `true` once no further ticks may be emitted
    closed: Arc<Mutex<bool>>,
}

impl ProgressOverlay {
    /// Emit `Started` and spawn the reporter task
    pub fn start(node: impl Into<String>, sink: Arc<dyn ProgressSink>, interval: Duration) -> Self {
        let node = node.into();
        let started = Instant::now();
        sink.emit(ProgressEvent::Started { node: node.clone() });

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let reporter_sink = sink.clone();
        let reporter_node = node.clone();
        let closed = Arc::new(Mutex::new(false));
        let gate = closed.clone();

        let reporter = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let tick = ProgressEvent::Tick {
                            node: reporter_node.clone(),
                            elapsed: started.elapsed(),
                        };
                        if !emit_while_open(&gate, reporter_sink.as_ref(), tick) {
                            break;
                        }
                    }
                }
            }
        });

        Self {
            node,
            started,
            sink,
            stop_tx: Some(stop_tx),
            reporter: Some(reporter),
            closed,
        }
    }

    /// Stop the reporter, wait for it to exit, then emit `Stopped`
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.reporter.take() {
            if let Err(e) = handle.await {
                log::warn!("Progress reporter for {} ended abnormally: {}", self.node, e);
            }
        }
        self.emit_stopped();
    }

    fn emit_stopped(&self) {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.sink.emit(ProgressEvent::Stopped {
            node: self.node.clone(),
            elapsed: self.started.elapsed(),
        });
    }
}

impl Drop for ProgressOverlay {
    // Reached without `stop()` only when the wrapped future was cancelled or panicked
    fn drop(&mut self) {
        if let Some(handle) = self.reporter.take() {
            handle.abort();
            self.stop_tx.take();
            self.emit_stopped();
        }
    }
}

// The lock is held across the emit so closing the gate waits for it
fn emit_while_open(gate: &Mutex<bool>, sink: &dyn ProgressSink, event: ProgressEvent) -> bool {
    let closed = gate.lock().unwrap_or_else(PoisonError::into_inner);
    if *closed {
        return false;
    }
    sink.emit(event);
    true
}

/// Run `fut` with an overlay; the overlay is stopped before this returns,
/// whatever `fut` produced
pub async fn with_progress<F, T>(
    node: &str,
    sink: Arc<dyn ProgressSink>,
    interval: Duration,
    fut: F,
) -> T
where
    F: Future<Output = T>,
{
    let overlay = ProgressOverlay::start(node, sink, interval);
    let output = fut.await;
    overlay.stop().await;
    output
}

/// Sends observations to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { node } => log::debug!("{} started", node),
            ProgressEvent::Tick { node, elapsed } => {
                log::trace!("{} running: {}ms", node, elapsed.as_millis())
            }
            ProgressEvent::Stopped { node, elapsed } => {
                log::debug!("{} finished in {}ms", node, elapsed.as_millis())
            }
        }
    }
}

/// Terminal spinner showing elapsed milliseconds for the running step
#[derive(Default)]
pub struct SpinnerSink {
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for SpinnerSink {
    fn emit(&self, event: ProgressEvent) {
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };
        match event {
            ProgressEvent::Started { node } => {
                let bar = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
                    bar.set_style(style);
                }
                bar.set_message(format!("{}: running time 0ms", node));
                *slot = Some(bar);
            }
            ProgressEvent::Tick { node, elapsed } => {
                if let Some(bar) = slot.as_ref() {
                    bar.set_message(format!("{}: running time {}ms", node, elapsed.as_millis()));
                    bar.tick();
                }
            }
            ProgressEvent::Stopped { node, elapsed } => {
                if let Some(bar) = slot.take() {
                    bar.finish_and_clear();
                }
                println!("✅ {} completed in {}ms", node, elapsed.as_millis());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl ProgressSink for RecordingSink {
        fn emit(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[tokio::test]
    async fn test_overlay_ticks_and_stops() {
        let sink = Arc::new(RecordingSink::default());
        let result = with_progress("classify", sink.clone(), Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_millis(40)).await;
            42
        })
        .await;

        assert_eq!(result, 42);
        let events = sink.events.lock().unwrap();
        assert!(matches!(events.first(), Some(ProgressEvent::Started { .. })));
        assert!(matches!(events.last(), Some(ProgressEvent::Stopped { .. })));
        assert!(events.iter().any(|e| matches!(e, ProgressEvent::Tick { .. })));
        assert!(events.iter().all(|e| e.node() == "classify"));
    }

    #[tokio::test]
    async fn test_overlay_passes_error_through() {
        let sink = Arc::new(RecordingSink::default());
        let result: Result<(), String> =
            with_progress("persist", sink.clone(), Duration::from_millis(5), async {
                Err("disk full".to_string())
            })
            .await;

        assert_eq!(result, Err("disk full".to_string()));
        let events = sink.events.lock().unwrap();
        assert!(matches!(events.last(), Some(ProgressEvent::Stopped { .. })));
    }

    #[tokio::test]
    async fn test_no_tick_after_stop() {
        let sink = Arc::new(RecordingSink::default());
        let overlay = ProgressOverlay::start("notify", sink.clone(), Duration::from_millis(1));
        tokio::time::sleep(Duration::from_millis(10)).await;
        overlay.stop().await;

        let count = sink.events.lock().unwrap().len();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sink.events.lock().unwrap().len(), count);
    }

    #[tokio::test]
    async fn test_dropped_overlay_stops_reporter() {
        let sink = Arc::new(RecordingSink::default());
        {
            let _overlay = ProgressOverlay::start("transform-draft", sink.clone(), Duration::from_millis(1));
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let count = sink.events.lock().unwrap().len();
        assert!(matches!(
            sink.events.lock().unwrap().last(),
            Some(ProgressEvent::Stopped { .. })
        ));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(sink.events.lock().unwrap().len(), count);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_no_tick_after_stopped_when_dropped() {
        let sink = Arc::new(RecordingSink::default());
        for i in 0..50 {
            let overlay =
                ProgressOverlay::start(format!("step-{}", i), sink.clone(), Duration::from_millis(1));
            tokio::time::sleep(Duration::from_millis(2)).await;
            drop(overlay);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        let events = sink.events.lock().unwrap();
        for i in 0..50 {
            let node = format!("step-{}", i);
            let mine: Vec<&ProgressEvent> = events.iter().filter(|e| e.node() == node).collect();
            assert!(
                matches!(mine.last(), Some(ProgressEvent::Stopped { .. })),
                "{} did not end with Stopped",
                node
            );
        }
    }

    #[tokio::test]
    async fn test_cancelled_future_stops_reporter() {
        let sink = Arc::new(RecordingSink::default());
        let slow = with_progress("review", sink.clone(), Duration::from_millis(1), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let timed_out = tokio::time::timeout(Duration::from_millis(10), slow).await;
        assert!(timed_out.is_err());

        assert!(matches!(
            sink.events.lock().unwrap().last(),
            Some(ProgressEvent::Stopped { .. })
        ));
    }
}
