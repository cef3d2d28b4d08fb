use tracing::trace;

use crate::events::{Event, EventQueue, ScheduledEvent};
use crate::models::{Distribution, SimConfig};
use crate::variates::VariateGenerator;

/// Pending events plus the random source that times them.
pub struct EventScheduler {
    queue: EventQueue,
    variates: VariateGenerator,
    distribution: Distribution,
    arrival_rate: f64,
    service_rate: f64,
}

impl EventScheduler {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            queue: EventQueue::new(),
            variates: VariateGenerator::new(config.random.seed),
            distribution: config.random.distribution,
            arrival_rate: config.arrival_rate,
            service_rate: config.service_rate,
        }
    }

    pub fn schedule(&mut self, time: f64, event: Event) {
        let kind = event.kind();
        let seq = self.queue.push(time, event);
        trace!(time, seq, %kind, pending = self.queue.len(), "event scheduled");
    }

    pub fn next_event(&mut self) -> Option<ScheduledEvent> {
        self.queue.pop()
    }

    pub fn peek(&self) -> Option<&ScheduledEvent> {
        self.queue.peek()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn interarrival_time(&mut self) -> f64 {
        self.variates.sample(self.distribution, self.arrival_rate)
    }

    pub fn service_time(&mut self) -> f64 {
        self.variates.sample(self.distribution, self.service_rate)
    }

    pub fn seed(&self) -> u64 {
        self.variates.seed()
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }
}
