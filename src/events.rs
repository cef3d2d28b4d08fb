use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;

use crate::state::Customer;

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Arrival,
    Departure(Customer),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Arrival,
    Departure,
    Termination,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Arrival => EventKind::Arrival,
            Event::Departure(_) => EventKind::Departure,
        }
    }

    pub fn customer(&self) -> Option<&Customer> {
        match self {
            Event::Departure(customer) => Some(customer),
            Event::Arrival => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventKind::Arrival => "ARRIVAL",
            EventKind::Departure => "DEPARTURE",
            EventKind::Termination => "TERMINATION",
        };
        write!(f, "{}", label)
    }
}

/// An event bound to its firing time.
///
/// `seq` is the insertion sequence assigned by [`EventQueue::push`]; events
/// with equal timestamps fire in the order they were scheduled.
#[derive(Clone, Debug)]
pub struct ScheduledEvent {
    pub time: f64,
    pub seq: u64,
    pub event: Event,
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<ScheduledEvent>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: f64, event: Event) -> u64 {
        debug_assert!(time.is_finite(), "event time must be finite");
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(ScheduledEvent { time, seq, event }));
        seq
    }

    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        self.heap.pop().map(|Reverse(scheduled)| scheduled)
    }

    pub fn peek(&self) -> Option<&ScheduledEvent> {
        self.heap.peek().map(|Reverse(scheduled)| scheduled)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
