use crate::events::ScheduledEvent;
use crate::models::SimConfig;
use crate::state::{EventRecord, SimulationResult, SystemState};
use crate::stats::{ConfidenceInterval, Percentiles};

/// Customers shown in the queue line of a snapshot before eliding the rest.
const SNAPSHOT_QUEUE_PREVIEW: usize = 8;

pub trait Formatter {
    fn write(&self, result: &SimulationResult) -> String;
}

pub struct HumanFormatter {
    pub show_events: bool,
}

pub struct SummaryFormatter;

pub struct JsonFormatter;

impl Formatter for HumanFormatter {
    fn write(&self, result: &SimulationResult) -> String {
        let mut lines = metadata_lines(result, true);

        if self.show_events {
            lines.push("Events:".to_string());
            lines.extend(result.events.iter().map(event_line));
        }

        let m = &result.metrics;
        lines.push("Metrics:".to_string());
        lines.push(format!("average wait time: {:.4}", m.avg_wait_time));
        lines.push(format!("average queue length: {:.4}", m.avg_queue_length));
        lines.push(format!("server utilization: {:.4}", m.server_utilization));
        lines.push(format!("average system time: {:.4}", m.avg_system_time));
        lines.push(format!("average number in system: {:.4}", m.avg_in_system));
        lines.push(format!("throughput: {:.4}", m.throughput));
        lines.push(format!("queue probability: {:.4}", m.queue_probability));
        lines.push(format!("blocking probability: {:.4}", m.blocking_probability));
        lines.push(format!(
            "customers: {} arrived, {} served, {} completed, {} rejected",
            m.total_customers, m.served_customers, m.completed_customers, m.rejected_customers
        ));
        lines.push(format!("max queue length: {}", m.max_queue_length));
        lines.push(format!("max wait time: {:.4}", m.max_wait_time));
        lines.push(format!(
            "server busy/idle time: {:.4} / {:.4}",
            m.server_busy_time, m.server_idle_time
        ));
        lines.push(format!("wait time variance: {:.4}", m.wait_time_variance));
        lines.push(format!("system time variance: {:.4}", m.system_time_variance));
        lines.push(format!("wait time 95% CI: {}", interval(&m.wait_time_confidence)));
        lines.push(format!(
            "system time 95% CI: {}",
            interval(&m.system_time_confidence)
        ));
        lines.push(format!(
            "wait time percentiles: {}",
            percentile_line(&m.wait_time_percentiles)
        ));
        lines.push(format!(
            "system time percentiles: {}",
            percentile_line(&m.system_time_percentiles)
        ));

        let events = result.state.events_processed;
        let seconds = result.elapsed.as_secs_f64();
        lines.push("Execution:".to_string());
        lines.push(format!("events processed: {}", events));
        lines.push(format!("wall time: {:.3}ms", seconds * 1000.0));
        if seconds > 0.0 {
            lines.push(format!("events per second: {:.2}", events as f64 / seconds));
        }
        join_lines(lines)
    }
}

impl Formatter for SummaryFormatter {
    fn write(&self, result: &SimulationResult) -> String {
        let m = &result.metrics;
        let mut lines = metadata_lines(result, false);
        lines.push("Summary:".to_string());
        lines.push(format!(
            "customers: {} arrived, {} served, {} rejected",
            m.total_customers, m.served_customers, m.rejected_customers
        ));
        lines.push(format!("utilization: {:.4}", m.server_utilization));
        lines.push(format!("avg_wait: {:.4}", m.avg_wait_time));
        lines.push(format!("avg_queue_length: {:.4}", m.avg_queue_length));
        lines.push(format!("throughput: {:.4}", m.throughput));
        join_lines(lines)
    }
}

impl Formatter for JsonFormatter {
    fn write(&self, result: &SimulationResult) -> String {
        match serde_json::to_string_pretty(result) {
            Ok(json) => format!("{}\n", json),
            Err(err) => format!("{{\"error\": \"{}\"}}\n", err),
        }
    }
}

fn metadata_lines(result: &SimulationResult, detailed: bool) -> Vec<String> {
    let meta = &result.metadata;
    let mut lines = vec![
        "Metadata:".to_string(),
        format!("distribution: {}", meta.distribution),
        format!("seed: {}", meta.seed),
    ];
    if detailed {
        lines.push(format!("arrival_rate: {:.3}", meta.arrival_rate));
        lines.push(format!("service_rate: {:.3}", meta.service_rate));
        lines.push(format!("max_queue_size: {}", meta.max_queue_size));
    }
    lines.push(format!("simulation_time: {:.2}", meta.simulation_time));
    if meta.halted_early {
        lines.push(format!("halted_at: {:.2} (halted early)", meta.halted_at));
    } else {
        lines.push(format!("halted_at: {:.2}", meta.halted_at));
    }
    lines
}

fn event_line(record: &EventRecord) -> String {
    let customer = record
        .customer_id
        .map(|id| format!("customer {}", id))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "[{:>10.4}] {:<11} {:<13} queue={} busy={} {}",
        record.time,
        record.kind.to_string(),
        customer,
        record.queue_size_after,
        yes_no(record.server_busy_after),
        record.action
    )
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn interval(ci: &ConfidenceInterval) -> String {
    format!("[{:.4}, {:.4}]", ci.lower, ci.upper)
}

fn percentile_line(p: &Percentiles) -> String {
    format!(
        "p50={:.4} p75={:.4} p90={:.4} p95={:.4}",
        p.p50, p.p75, p.p90, p.p95
    )
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// What a between-events snapshot shows, resolved from the config once.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotView {
    pub horizon: f64,
    pub capacity: usize,
    pub progress_bar_width: usize,
    pub show_realtime_metrics: bool,
}

impl SnapshotView {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            horizon: config.simulation_time,
            capacity: config.max_queue_size,
            progress_bar_width: config.visualization.progress_bar_width,
            show_realtime_metrics: config.visualization.show_realtime_metrics,
        }
    }
}

/// Text view of the system between events.
pub fn render_snapshot(
    state: &SystemState,
    next: Option<&ScheduledEvent>,
    view: &SnapshotView,
) -> String {
    let mut lines = vec![
        "==================== Simulation state ====================".to_string(),
        format!("Clock: {:.4} / {:.2}", state.clock, view.horizon),
    ];

    let server = match state.in_service {
        Some(id) => format!("BUSY (customer {})", id),
        None => "IDLE".to_string(),
    };
    lines.push(format!("Server: {}", server));

    let mut queued: Vec<String> = state
        .queue
        .iter()
        .take(SNAPSHOT_QUEUE_PREVIEW)
        .map(|customer| format!("#{}", customer.id))
        .collect();
    if state.queue.len() > SNAPSHOT_QUEUE_PREVIEW {
        queued.push(format!("+{} more", state.queue.len() - SNAPSHOT_QUEUE_PREVIEW));
    }
    lines.push(format!(
        "Queue: {}/{} [{}]",
        state.queue.len(),
        view.capacity,
        queued.join(" ")
    ));
    lines.push(format!(
        "Arrivals: {}  Served: {}  Rejected: {}  Events: {}",
        state.total_arrivals, state.served, state.rejected, state.events_processed
    ));
    lines.push(format!(
        "Area under Q(t): {:.4}  Area under B(t): {:.4}",
        state.area_under_q, state.area_under_b
    ));
    lines.push(progress_line(state.clock, view.horizon, view.progress_bar_width));

    if view.show_realtime_metrics {
        let (utilization, throughput) = if state.clock > 0.0 {
            (
                (state.area_under_b / state.clock * 100.0).clamp(0.0, 100.0),
                state.served as f64 / state.clock,
            )
        } else {
            (0.0, 0.0)
        };
        let avg_wait = if state.served > 0 {
            state.total_delay / state.served as f64
        } else {
            0.0
        };
        lines.push(format!(
            "Avg wait: {:.4}  Utilization: {:.2}%  Throughput: {:.4}",
            avg_wait, utilization, throughput
        ));
    }

    let next = match next {
        Some(scheduled) => match scheduled.event.customer() {
            Some(customer) => format!(
                "{} of customer {} at {:.4}",
                scheduled.event.kind(),
                customer.id,
                scheduled.time
            ),
            None => format!("{} at {:.4}", scheduled.event.kind(), scheduled.time),
        },
        None => "none".to_string(),
    };
    lines.push(format!("Next event: {}", next));
    join_lines(lines)
}

/// `clock / horizon` as a bar of `width` cells, clamped to 0..=100%.
fn progress_line(clock: f64, horizon: f64, width: usize) -> String {
    let fraction = if horizon > 0.0 {
        (clock / horizon).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = ((fraction * width as f64) as usize).min(width);
    format!(
        "Progress: [{}{}] {:.1}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        fraction * 100.0
    )
}

/// Listing used by `show-config`.
pub fn describe_config(config: &SimConfig) -> String {
    let log_file = match &config.logging.file {
        Some(path) => path.display().to_string(),
        None => "none".to_string(),
    };
    let visualization = if config.visualization.enabled {
        format!("on ({}ms)", config.visualization.update_interval_ms)
    } else {
        "off".to_string()
    };
    join_lines(vec![
        format!("Simulation time: {:.2}", config.simulation_time),
        format!("Arrival rate: {:.3}", config.arrival_rate),
        format!("Service rate: {:.3}", config.service_rate),
        format!("Max queue size: {}", config.max_queue_size),
        format!("Distribution: {}", config.random.distribution),
        format!("Seed: {}", config.random.seed),
        format!("Log level: {}", config.logging.level),
        format!("Log file: {}", log_file),
        format!("Visualization: {}", visualization),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_simulation;
    use crate::events::{Event, EventQueue};
    use crate::models::{Distribution, RandomConfig};
    use crate::state::Customer;
    use std::time::Duration;

    fn constant_result() -> SimulationResult {
        let config = SimConfig {
            simulation_time: 10.0,
            arrival_rate: 1.0,
            service_rate: 2.0,
            max_queue_size: 5,
            random: RandomConfig {
                seed: 0,
                distribution: Distribution::Constant,
            },
            ..SimConfig::default()
        };
        run_simulation(&config).expect("simulation should succeed")
    }

    fn view(progress_bar_width: usize, show_realtime_metrics: bool) -> SnapshotView {
        SnapshotView {
            horizon: 10.0,
            capacity: 5,
            progress_bar_width,
            show_realtime_metrics,
        }
    }

    #[test]
    fn summary_is_stable() {
        let expected = concat!(
            "Metadata:\n",
            "distribution: constant\n",
            "seed: 0\n",
            "simulation_time: 10.00\n",
            "halted_at: 10.00\n",
            "Summary:\n",
            "customers: 10 arrived, 10 served, 0 rejected\n",
            "utilization: 0.4500\n",
            "avg_wait: 0.0000\n",
            "avg_queue_length: 0.0000\n",
            "throughput: 1.0000\n",
        );
        assert_eq!(SummaryFormatter.write(&constant_result()), expected);
    }

    #[test]
    fn human_output_lists_events_on_request() {
        let result = constant_result();
        let without = HumanFormatter { show_events: false }.write(&result);
        let with = HumanFormatter { show_events: true }.write(&result);

        assert!(!without.contains("Events:"));
        assert!(with.contains("Events:"));
        assert!(with.contains("ARRIVAL     customer 1"));
        assert!(with.contains("arrived and entered service"));
        assert!(with.contains("TERMINATION"));
        assert!(with.contains("server utilization: 0.4500"));
        assert!(with.contains("customers: 10 arrived, 10 served, 9 completed, 0 rejected"));
        assert!(with.ends_with('\n'));
    }

    #[test]
    fn human_output_reports_event_rate() {
        let mut result = constant_result();
        result.elapsed = Duration::from_millis(2);
        let text = HumanFormatter { show_events: false }.write(&result);
        assert!(text.contains("events processed: 19"));
        assert!(text.contains("wall time: 2.000ms"));
        assert!(text.contains("events per second: 9500.00"));

        result.elapsed = Duration::ZERO;
        let text = HumanFormatter { show_events: false }.write(&result);
        assert!(!text.contains("events per second"));
    }

    #[test]
    fn json_output_is_parseable() {
        let json = JsonFormatter.write(&constant_result());
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["metadata"]["distribution"], "constant");
        assert_eq!(value["metrics"]["server_utilization"], 0.45);
        assert_eq!(value["metrics"]["wait_time_percentiles"]["p50"], 0.0);
        assert_eq!(value["events"][0]["kind"], "arrival");
        assert_eq!(value["events"][0]["action"], "started-service");
        assert!(value.get("elapsed").is_none());
    }

    #[test]
    fn snapshot_shows_server_queue_and_next_event() {
        let mut state = SystemState {
            clock: 2.5,
            in_service: Some(3),
            ..SystemState::default()
        };
        state.queue.push_back(Customer::new(4, 2.0, 1.0));
        state.queue.push_back(Customer::new(5, 2.25, 1.0));

        let mut queue = EventQueue::new();
        let mut leaving = Customer::new(3, 1.0, 2.0);
        leaving.start_service(1.0);
        queue.push(3.0, Event::Departure(leaving));

        let snapshot = render_snapshot(&state, queue.peek(), &view(10, false));
        assert!(snapshot.contains("Clock: 2.5000 / 10.00"));
        assert!(snapshot.contains("Server: BUSY (customer 3)"));
        assert!(snapshot.contains("Queue: 2/5 [#4 #5]"));
        assert!(snapshot.contains("Next event: DEPARTURE of customer 3 at 3.0000"));
        assert!(!snapshot.contains("Avg wait"));
    }

    #[test]
    fn snapshot_elides_long_queues() {
        let mut state = SystemState::default();
        for id in 0..10 {
            state.queue.push_back(Customer::new(id, 0.0, 1.0));
        }
        let snapshot = render_snapshot(&state, None, &view(10, true));
        assert!(snapshot.contains("+2 more"));
        assert!(snapshot.contains("Server: IDLE"));
        assert!(snapshot.contains("Next event: none"));
    }

    #[test]
    fn progress_bar_tracks_clock_over_horizon() {
        let state = SystemState {
            clock: 2.5,
            ..SystemState::default()
        };
        let snapshot = render_snapshot(&state, None, &view(20, false));
        assert!(snapshot.contains("Progress: [#####---------------] 25.0%"));
    }

    #[test]
    fn progress_bar_is_clamped() {
        assert_eq!(progress_line(0.0, 10.0, 4), "Progress: [----] 0.0%");
        assert_eq!(progress_line(12.0, 10.0, 4), "Progress: [####] 100.0%");
        assert_eq!(progress_line(-1.0, 10.0, 4), "Progress: [----] 0.0%");
        assert_eq!(progress_line(5.0, 10.0, 0), "Progress: [] 50.0%");
    }

    #[test]
    fn snapshot_shows_realtime_metrics_when_enabled() {
        let state = SystemState {
            clock: 4.0,
            in_service: Some(3),
            served: 3,
            total_delay: 1.5,
            area_under_b: 3.0,
            ..SystemState::default()
        };
        let snapshot = render_snapshot(&state, None, &view(10, true));
        assert!(snapshot.contains("Avg wait: 0.5000  Utilization: 75.00%  Throughput: 0.7500"));

        let idle = render_snapshot(&SystemState::default(), None, &view(10, true));
        assert!(idle.contains("Avg wait: 0.0000  Utilization: 0.00%  Throughput: 0.0000"));
    }

    #[test]
    fn snapshot_view_reads_visualization_settings() {
        let mut config = SimConfig::default();
        config.visualization.progress_bar_width = 30;
        config.visualization.show_realtime_metrics = false;
        let view = SnapshotView::from_config(&config);
        assert_eq!(view.horizon, 100.0);
        assert_eq!(view.capacity, 10);
        assert_eq!(view.progress_bar_width, 30);
        assert!(!view.show_realtime_metrics);
    }
}
