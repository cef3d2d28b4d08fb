use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use crate::events::EventKind;
use crate::models::Distribution;
use crate::stats::ComprehensiveMetrics;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CustomerStatus {
    Waiting,
    InService,
    Completed,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Customer {
    pub id: u64,
    pub arrival_time: f64,
    pub service_time: f64,
    pub service_start: Option<f64>,
    pub exit_time: Option<f64>,
    pub status: CustomerStatus,
}

impl Customer {
    pub fn new(id: u64, arrival_time: f64, service_time: f64) -> Self {
        Self {
            id,
            arrival_time,
            service_time,
            service_start: None,
            exit_time: None,
            status: CustomerStatus::Waiting,
        }
    }

    pub fn start_service(&mut self, at: f64) {
        assert_eq!(
            self.status,
            CustomerStatus::Waiting,
            "customer {} cannot enter service from {:?}",
            self.id,
            self.status
        );
        self.service_start = Some(at);
        self.status = CustomerStatus::InService;
    }

    pub fn complete(&mut self, at: f64) {
        assert_eq!(
            self.status,
            CustomerStatus::InService,
            "customer {} cannot complete from {:?}",
            self.id,
            self.status
        );
        self.exit_time = Some(at);
        self.status = CustomerStatus::Completed;
    }

    pub fn reject(&mut self) {
        assert_eq!(
            self.status,
            CustomerStatus::Waiting,
            "customer {} cannot be rejected from {:?}",
            self.id,
            self.status
        );
        self.status = CustomerStatus::Rejected;
    }

    /// Time spent queueing before service, clamped at zero.
    pub fn wait_time(&self) -> f64 {
        self.service_start
            .map(|start| (start - self.arrival_time).max(0.0))
            .unwrap_or(0.0)
    }

    /// Time from arrival to exit, clamped at zero.
    pub fn system_time(&self) -> f64 {
        self.exit_time
            .map(|exit| (exit - self.arrival_time).max(0.0))
            .unwrap_or(0.0)
    }
}

/// Snapshot of the simulated system between events.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SystemState {
    pub clock: f64,
    pub in_service: Option<u64>,
    pub queue: VecDeque<Customer>,
    pub total_arrivals: u64,
    pub served: u64,
    pub rejected: u64,
    pub events_processed: u64,
    pub total_delay: f64,
    pub area_under_q: f64,
    pub area_under_b: f64,
    pub last_event_time: f64,
}

impl SystemState {
    pub fn server_busy(&self) -> bool {
        self.in_service.is_some()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Customers currently queued or in service.
    pub fn in_system(&self) -> u64 {
        self.queue.len() as u64 + u64::from(self.server_busy())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    StartedService,
    Queued,
    Rejected,
    NextInService,
    ServerIdle,
    Halted,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::StartedService => "arrived and entered service",
            Action::Queued => "arrived and joined the queue",
            Action::Rejected => "arrived and was rejected (queue full)",
            Action::NextInService => "departed; next customer entered service",
            Action::ServerIdle => "departed; server idle",
            Action::Halted => "simulation halted",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One line of the structured event log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventRecord {
    pub time: f64,
    pub kind: EventKind,
    pub customer_id: Option<u64>,
    pub queue_size_after: usize,
    pub server_busy_after: bool,
    pub action: Action,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunMetadata {
    pub distribution: Distribution,
    pub seed: u64,
    pub arrival_rate: f64,
    pub service_rate: f64,
    pub max_queue_size: usize,
    pub simulation_time: f64,
    pub halted_at: f64,
    pub halted_early: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimulationResult {
    pub metadata: RunMetadata,
    pub metrics: ComprehensiveMetrics,
    pub state: SystemState,
    pub events: Vec<EventRecord>,
    #[serde(skip)]
    pub elapsed: Duration,
}
