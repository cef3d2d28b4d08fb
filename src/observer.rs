use tracing::{debug, info};

use crate::state::EventRecord;

/// Receives the simulator's narrative messages and per-event records.
///
/// Injected into [`crate::engine::Simulator`] at construction; the engine
/// never formats output for a particular destination.
pub trait EventSink {
    fn message(&mut self, message: &str);

    fn event(&mut self, _record: &EventRecord) {}
}

/// Forwards everything to `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn message(&mut self, message: &str) {
        info!(target: "queue_sim::events", "{}", message);
    }

    fn event(&mut self, record: &EventRecord) {
        debug!(
            target: "queue_sim::events",
            time = record.time,
            kind = %record.kind,
            customer_id = ?record.customer_id,
            queue_size = record.queue_size_after,
            server_busy = record.server_busy_after,
            action = record.action.label(),
            "event applied"
        );
    }
}

#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn message(&mut self, _message: &str) {}
}
