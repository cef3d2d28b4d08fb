use std::time::Instant;
use tracing::{debug, info};

use crate::driver;
use crate::error::{Error, Result};
use crate::events::{Event, EventKind, ScheduledEvent};
use crate::models::SimConfig;
use crate::observer::{EventSink, TracingSink};
use crate::scheduler::EventScheduler;
use crate::state::{Action, Customer, EventRecord, RunMetadata, SimulationResult, SystemState};
use crate::stats::StatisticsCollector;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Idle,
    Running,
    Stopped,
}

/// Single-server queue driven one event at a time.
///
/// Every driver advances the simulation through [`Simulator::step`] and
/// closes it with [`Simulator::finish`] or [`Simulator::halt`], so automatic
/// and interactive runs share the same transition semantics.
pub struct Simulator {
    config: SimConfig,
    state: SystemState,
    scheduler: EventScheduler,
    stats: StatisticsCollector,
    sink: Box<dyn EventSink>,
    phase: Phase,
    next_customer_id: u64,
    store_events: bool,
    events: Vec<EventRecord>,
    started_at: Option<Instant>,
    result: Option<SimulationResult>,
}

impl Simulator {
    pub fn new(config: SimConfig, sink: Box<dyn EventSink>) -> Result<Self> {
        validate_config(&config)?;
        let scheduler = EventScheduler::new(&config);

        Ok(Self {
            config,
            state: SystemState::default(),
            scheduler,
            stats: StatisticsCollector::new(),
            sink,
            phase: Phase::Idle,
            next_customer_id: 1,
            store_events: true,
            events: Vec::new(),
            started_at: None,
            result: None,
        })
    }

    pub fn with_event_log(mut self, store_events: bool) -> Self {
        self.store_events = store_events;
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seed(&self) -> u64 {
        self.scheduler.seed()
    }

    pub fn pending_events(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn peek_next(&self) -> Option<&ScheduledEvent> {
        self.scheduler.peek()
    }

    /// Next pending event, if it fires within the horizon.
    pub fn peek_due(&self) -> Option<&ScheduledEvent> {
        self.scheduler
            .peek()
            .filter(|next| next.time <= self.config.simulation_time)
    }

    /// Schedule the first arrival. No-op unless the simulator is idle.
    pub fn initialize(&mut self) {
        if self.phase != Phase::Idle {
            return;
        }
        let first_arrival = self.scheduler.interarrival_time();
        self.scheduler.schedule(first_arrival, Event::Arrival);
        self.phase = Phase::Running;
        self.started_at = Some(Instant::now());

        info!(
            seed = self.scheduler.seed(),
            distribution = %self.scheduler.distribution(),
            horizon = self.config.simulation_time,
            first_arrival,
            "simulation initialized"
        );
        self.sink.message(&format!(
            "Simulation initialized: horizon={:.2}, arrival_rate={:.3}, service_rate={:.3}, max_queue_size={}, seed={}",
            self.config.simulation_time,
            self.config.arrival_rate,
            self.config.service_rate,
            self.config.max_queue_size,
            self.scheduler.seed()
        ));
    }

    /// Apply the next event within the horizon.
    ///
    /// Returns `None` when the simulator is not running or no pending event
    /// fires at or before the horizon.
    pub fn step(&mut self) -> Option<EventRecord> {
        if self.phase != Phase::Running || self.peek_due().is_none() {
            return None;
        }
        let scheduled = self.scheduler.next_event()?;
        debug_assert!(
            scheduled.time >= self.state.clock,
            "event at {} popped after clock {}",
            scheduled.time,
            self.state.clock
        );

        self.advance_to(scheduled.time);
        self.state.clock = scheduled.time;

        let record = match scheduled.event {
            Event::Arrival => self.handle_arrival(),
            Event::Departure(customer) => self.handle_departure(customer),
        };
        self.state.events_processed += 1;
        debug!(
            time = record.time,
            kind = %record.kind,
            seq = scheduled.seq,
            queue = record.queue_size_after,
            busy = record.server_busy_after,
            "event applied"
        );
        self.emit(&record);

        Some(record)
    }

    /// Close the run at the horizon.
    pub fn finish(&mut self) -> SimulationResult {
        let horizon = self.config.simulation_time;
        self.close(horizon, false)
    }

    /// Close the run at the current clock, on external request.
    pub fn halt(&mut self) -> SimulationResult {
        let now = self.state.clock;
        self.close(now, true)
    }

    fn handle_arrival(&mut self) -> EventRecord {
        let clock = self.state.clock;
        let service_time = self.scheduler.service_time();
        let mut customer = Customer::new(self.next_customer_id, clock, service_time);
        self.next_customer_id += 1;
        self.state.total_arrivals += 1;
        let customer_id = customer.id;

        self.sink.message(&format!(
            "Customer {} arrived at time {:.2}, service time={:.2}",
            customer_id, clock, service_time
        ));

        let action = if !self.state.server_busy() {
            self.begin_service(customer);
            Action::StartedService
        } else if self.state.queue.len() < self.config.max_queue_size {
            self.state.queue.push_back(customer);
            Action::Queued
        } else {
            customer.reject();
            self.state.rejected += 1;
            self.sink.message(&format!(
                "Customer {} rejected at time {:.2}: queue full",
                customer_id, clock
            ));
            Action::Rejected
        };

        let next_arrival = clock + self.scheduler.interarrival_time();
        if next_arrival <= self.config.simulation_time {
            self.scheduler.schedule(next_arrival, Event::Arrival);
        }

        self.record(EventKind::Arrival, Some(customer_id), action)
    }

    fn handle_departure(&mut self, mut customer: Customer) -> EventRecord {
        assert_eq!(
            self.state.in_service,
            Some(customer.id),
            "departure applied for customer {} while it was not in service",
            customer.id
        );
        let clock = self.state.clock;
        customer.complete(clock);
        self.stats.record_completion(&customer);
        self.state.in_service = None;

        self.sink.message(&format!(
            "Customer {} departed at time {:.2}",
            customer.id, clock
        ));

        let action = match self.state.queue.pop_front() {
            Some(next) => {
                self.state.total_delay += (clock - next.arrival_time).max(0.0);
                self.begin_service(next);
                Action::NextInService
            }
            None => Action::ServerIdle,
        };

        self.record(EventKind::Departure, Some(customer.id), action)
    }

    fn begin_service(&mut self, mut customer: Customer) {
        let clock = self.state.clock;
        customer.start_service(clock);
        self.state.in_service = Some(customer.id);
        self.state.served += 1;
        let departure_time = clock + customer.service_time;
        self.scheduler.schedule(departure_time, Event::Departure(customer));
    }

    /// Integrate the interval since the last event with the current state.
    fn advance_to(&mut self, time: f64) {
        let dt = time - self.state.last_event_time;
        self.stats.accumulate(&mut self.state, dt);
        if time > self.state.last_event_time {
            self.state.last_event_time = time;
        }
    }

    fn record(&self, kind: EventKind, customer_id: Option<u64>, action: Action) -> EventRecord {
        EventRecord {
            time: self.state.clock,
            kind,
            customer_id,
            queue_size_after: self.state.queue_len(),
            server_busy_after: self.state.server_busy(),
            action,
        }
    }

    fn emit(&mut self, record: &EventRecord) {
        self.sink.event(record);
        if self.store_events {
            self.events.push(record.clone());
        }
    }

    fn close(&mut self, until: f64, halted_early: bool) -> SimulationResult {
        if let Some(result) = &self.result {
            return result.clone();
        }

        let until = until.max(self.state.last_event_time);
        self.advance_to(until);
        self.state.clock = until;

        let record = self.record(EventKind::Termination, None, Action::Halted);
        self.emit(&record);
        self.phase = Phase::Stopped;

        let metrics = self.stats.finalize(&self.state, self.config.max_queue_size);
        let elapsed = self
            .started_at
            .map(|started| started.elapsed())
            .unwrap_or_default();

        info!(
            clock = self.state.clock,
            events = self.state.events_processed,
            arrivals = self.state.total_arrivals,
            served = self.state.served,
            rejected = self.state.rejected,
            utilization = metrics.server_utilization,
            halted_early,
            "simulation finished"
        );
        self.sink.message(&format!(
            "Simulation {} at time {:.2} after {} events",
            if halted_early { "halted" } else { "finished" },
            self.state.clock,
            self.state.events_processed
        ));

        let result = SimulationResult {
            metadata: RunMetadata {
                distribution: self.config.random.distribution,
                seed: self.scheduler.seed(),
                arrival_rate: self.config.arrival_rate,
                service_rate: self.config.service_rate,
                max_queue_size: self.config.max_queue_size,
                simulation_time: self.config.simulation_time,
                halted_at: self.state.clock,
                halted_early,
            },
            metrics,
            state: self.state.clone(),
            events: std::mem::take(&mut self.events),
            elapsed,
        };
        self.result = Some(result.clone());
        result
    }
}

pub fn run_simulation(config: &SimConfig) -> Result<SimulationResult> {
    run_simulation_with_options(config, true)
}

pub fn run_simulation_summary(config: &SimConfig) -> Result<SimulationResult> {
    run_simulation_with_options(config, false)
}

pub fn run_simulation_with_options(
    config: &SimConfig,
    store_events: bool,
) -> Result<SimulationResult> {
    let mut simulator =
        Simulator::new(config.clone(), Box::new(TracingSink))?.with_event_log(store_events);
    Ok(driver::run_to_horizon(&mut simulator))
}

pub fn validate_config(config: &SimConfig) -> Result<()> {
    if !is_positive(config.simulation_time) {
        return Err(Error::InvalidSimulationTime(config.simulation_time));
    }
    if !is_positive(config.arrival_rate) {
        return Err(Error::InvalidArrivalRate(config.arrival_rate));
    }
    if !is_positive(config.service_rate) {
        return Err(Error::InvalidServiceRate(config.service_rate));
    }
    Ok(())
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
