use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::OperationEvent;
use crate::store::Sink;

#[allow(dead_code)]
const CHANNEL_CAPACITY: usize = 256;

pub const STREAM_RESERVATIONS: &str = "reservations";
pub const STREAM_PROFILES: &str = "profiles";

/// Event sink: every state-changing operation emits one structured entry
/// (`event` name + `payload`). Entries are broadcast to in-process
/// subscribers per stream and mirrored to a durable journal. Both paths are
/// best-effort — a failure here never affects the operation that emitted.
pub struct NotifyHub {
    channels: DashMap<String, broadcast::Sender<OperationEvent>>,
    journal: Option<Box<dyn Sink<OperationEvent>>>,
}

impl NotifyHub {
    pub fn new(journal: Option<Box<dyn Sink<OperationEvent>>>) -> Self {
        Self {
            channels: DashMap::new(),
            journal,
        }
    }

    /// Subscribe to a stream's events. Creates the channel if needed.
    pub fn subscribe(&self, stream: &str) -> broadcast::Receiver<OperationEvent> {
        let sender = self
            .channels
            .entry(stream.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Emit an event. No-op if nobody is listening; journal failures are
    /// logged, counted, and dropped.
    pub fn emit(&self, stream: &str, event: OperationEvent) {
        if let Some(journal) = &self.journal
            && let Err(e) = journal.append(event.clone()) {
                metrics::counter!(crate::observability::SINK_WRITE_FAILURES_TOTAL).increment(1);
                tracing::warn!("event journal write failed: {e}");
            }
        if let Some(sender) = self.channels.get(stream) {
            let _ = sender.send(event);
        }
    }
}
