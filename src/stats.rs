use serde::Serialize;

use crate::state::{Customer, SystemState};

/// z-score of the two-sided 95% normal interval.
const Z_95: f64 = 1.96;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ComprehensiveMetrics {
    pub avg_wait_time: f64,
    pub avg_queue_length: f64,
    pub server_utilization: f64,
    pub avg_system_time: f64,
    pub avg_in_system: f64,
    pub throughput: f64,
    pub queue_probability: f64,
    pub blocking_probability: f64,
    pub total_customers: u64,
    pub served_customers: u64,
    pub completed_customers: u64,
    pub rejected_customers: u64,
    pub wait_time_variance: f64,
    pub system_time_variance: f64,
    pub max_queue_length: usize,
    pub max_wait_time: f64,
    pub server_busy_time: f64,
    pub server_idle_time: f64,
    pub wait_time_confidence: ConfidenceInterval,
    pub system_time_confidence: ConfidenceInterval,
    pub wait_time_percentiles: Percentiles,
    pub system_time_percentiles: Percentiles,
}

/// Online accumulator for time-weighted integrals and per-customer samples.
#[derive(Debug, Default)]
pub struct StatisticsCollector {
    wait_times: Vec<f64>,
    system_times: Vec<f64>,
    max_queue_length: usize,
    max_wait_time: f64,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integrate queue length and busy time over an elapsed interval.
    ///
    /// Must run with the state as it was during the interval, before the
    /// next event mutates it.
    pub fn accumulate(&mut self, state: &mut SystemState, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let queue_len = state.queue_len();
        state.area_under_q += queue_len as f64 * dt;
        if state.server_busy() {
            state.area_under_b += dt;
        }
        self.max_queue_length = self.max_queue_length.max(queue_len);
    }

    pub fn record_completion(&mut self, customer: &Customer) {
        let wait = customer.wait_time();
        self.wait_times.push(wait);
        self.system_times.push(customer.system_time());
        if wait > self.max_wait_time {
            self.max_wait_time = wait;
        }
    }

    pub fn completions(&self) -> usize {
        self.system_times.len()
    }

    pub fn finalize(&self, state: &SystemState, max_queue_size: usize) -> ComprehensiveMetrics {
        let clock = state.clock;
        let (avg_queue_length, server_utilization, throughput, busy_time, idle_time) =
            if clock > 0.0 {
                (
                    state.area_under_q / clock,
                    state.area_under_b / clock,
                    state.served as f64 / clock,
                    state.area_under_b,
                    clock - state.area_under_b,
                )
            } else {
                (0.0, 0.0, 0.0, 0.0, 0.0)
            };

        let avg_wait_time = if state.served == 0 {
            0.0
        } else {
            state.total_delay / state.served as f64
        };
        let avg_system_time = mean(&self.system_times);
        let queue_probability = if clock > 0.0 && max_queue_size > 0 {
            avg_queue_length / max_queue_size as f64
        } else {
            0.0
        };
        let blocking_probability = if state.total_arrivals == 0 {
            0.0
        } else {
            state.rejected as f64 / state.total_arrivals as f64
        };

        let wait_time_variance = population_variance(&self.wait_times, avg_wait_time);
        let system_time_variance = population_variance(&self.system_times, avg_system_time);

        ComprehensiveMetrics {
            avg_wait_time,
            avg_queue_length,
            server_utilization,
            avg_system_time,
            avg_in_system: avg_queue_length + server_utilization,
            throughput,
            queue_probability,
            blocking_probability,
            total_customers: state.total_arrivals,
            served_customers: state.served,
            completed_customers: self.completions() as u64,
            rejected_customers: state.rejected,
            wait_time_variance,
            system_time_variance,
            max_queue_length: self.max_queue_length,
            max_wait_time: self.max_wait_time,
            server_busy_time: busy_time,
            server_idle_time: idle_time,
            wait_time_confidence: confidence_interval(
                &self.wait_times,
                avg_wait_time,
                wait_time_variance,
            ),
            system_time_confidence: confidence_interval(
                &self.system_times,
                avg_system_time,
                system_time_variance,
            ),
            wait_time_percentiles: percentiles(&self.wait_times),
            system_time_percentiles: percentiles(&self.system_times),
        }
    }
}

pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Variance about `center`, dividing by `n`; zero below two samples.
///
/// `center` is the reported average, which for wait times comes from the
/// delay accumulator rather than from the completion samples.
pub fn population_variance(samples: &[f64], center: f64) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    samples
        .iter()
        .map(|sample| (sample - center) * (sample - center))
        .sum::<f64>()
        / samples.len() as f64
}

/// Linearly interpolated percentile over ascending `sorted`, `fraction` in [0, 1].
pub fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = fraction * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

pub fn percentiles(samples: &[f64]) -> Percentiles {
    let mut sorted = samples.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    Percentiles {
        p50: percentile(&sorted, 0.50),
        p75: percentile(&sorted, 0.75),
        p90: percentile(&sorted, 0.90),
        p95: percentile(&sorted, 0.95),
    }
}

/// Normal-approximation 95% interval around `center`.
pub fn confidence_interval(samples: &[f64], center: f64, variance: f64) -> ConfidenceInterval {
    if samples.len() < 2 {
        return ConfidenceInterval::default();
    }
    let half_width = Z_95 * (variance / samples.len() as f64).sqrt();
    ConfidenceInterval {
        lower: center - half_width,
        upper: center + half_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(id: u64, arrival: f64, start: f64, exit: f64) -> Customer {
        let mut customer = Customer::new(id, arrival, exit - start);
        customer.start_service(start);
        customer.complete(exit);
        customer
    }

    #[test]
    fn percentile_interpolates_between_order_statistics() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.5), 2.5);
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 1.0), 4.0);
    }

    #[test]
    fn percentiles_sort_their_input() {
        let result = percentiles(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(result.p50, 2.5);
        assert_eq!(result.p75, 3.25);
        assert!((result.p90 - 3.7).abs() < 1e-12);
        assert!((result.p95 - 3.85).abs() < 1e-12);
    }

    #[test]
    fn percentiles_of_nothing_are_zero() {
        assert_eq!(percentiles(&[]), Percentiles::default());
        assert_eq!(percentile(&[5.0], 0.9), 5.0);
    }

    #[test]
    fn variance_divides_by_n() {
        assert_eq!(population_variance(&[1.0, 2.0, 3.0, 4.0], 2.5), 1.25);
    }

    #[test]
    fn variance_is_taken_about_the_given_center() {
        assert_eq!(population_variance(&[1.0, 3.0], 1.0), 2.0);
    }

    #[test]
    fn variance_and_interval_collapse_below_two_samples() {
        assert_eq!(population_variance(&[], 0.0), 0.0);
        assert_eq!(population_variance(&[3.0], 1.0), 0.0);
        assert_eq!(confidence_interval(&[3.0], 3.0, 0.0), ConfidenceInterval::default());
        assert_eq!(confidence_interval(&[], 0.0, 0.0), ConfidenceInterval::default());
    }

    #[test]
    fn confidence_interval_is_symmetric_about_center() {
        let samples = [1.0, 2.0, 3.0, 4.0];
        let interval = confidence_interval(&samples, 2.5, population_variance(&samples, 2.5));
        let half = 1.96 * (1.25f64 / 4.0).sqrt();
        assert!((interval.lower - (2.5 - half)).abs() < 1e-12);
        assert!((interval.upper - (2.5 + half)).abs() < 1e-12);
    }

    #[test]
    fn accumulate_integrates_pre_event_state() {
        let mut collector = StatisticsCollector::new();
        let mut state = SystemState::default();
        state.in_service = Some(1);
        state.queue.push_back(Customer::new(2, 0.0, 1.0));
        state.queue.push_back(Customer::new(3, 0.0, 1.0));

        collector.accumulate(&mut state, 1.5);
        assert_eq!(state.area_under_q, 3.0);
        assert_eq!(state.area_under_b, 1.5);

        state.in_service = None;
        state.queue.clear();
        collector.accumulate(&mut state, 2.0);
        assert_eq!(state.area_under_q, 3.0);
        assert_eq!(state.area_under_b, 1.5);

        collector.accumulate(&mut state, 0.0);
        assert_eq!(collector.max_queue_length, 2);
    }

    #[test]
    fn completion_records_wait_and_system_samples() {
        let mut collector = StatisticsCollector::new();
        collector.record_completion(&completed(1, 0.0, 0.0, 1.0));
        collector.record_completion(&completed(2, 0.5, 1.0, 3.0));
        assert_eq!(collector.wait_times, vec![0.0, 0.5]);
        assert_eq!(collector.system_times, vec![1.0, 2.5]);
        assert_eq!(collector.max_wait_time, 0.5);
        assert_eq!(collector.completions(), 2);
    }

    #[test]
    fn finalize_with_zero_clock_reports_zeros() {
        let collector = StatisticsCollector::new();
        let metrics = collector.finalize(&SystemState::default(), 5);
        assert_eq!(metrics, ComprehensiveMetrics::default());
    }

    #[test]
    fn finalize_derives_averages_from_state() {
        let mut collector = StatisticsCollector::new();
        collector.record_completion(&completed(1, 0.0, 0.0, 2.0));
        collector.record_completion(&completed(2, 1.0, 2.0, 4.0));
        let state = SystemState {
            clock: 10.0,
            total_arrivals: 4,
            served: 2,
            rejected: 1,
            total_delay: 1.0,
            area_under_q: 2.0,
            area_under_b: 4.0,
            last_event_time: 10.0,
            ..SystemState::default()
        };

        let metrics = collector.finalize(&state, 4);
        assert_eq!(metrics.avg_wait_time, 0.5);
        assert_eq!(metrics.avg_queue_length, 0.2);
        assert_eq!(metrics.server_utilization, 0.4);
        assert_eq!(metrics.throughput, 0.2);
        assert_eq!(metrics.avg_system_time, 2.5);
        assert!((metrics.avg_in_system - 0.6).abs() < 1e-12);
        assert_eq!(metrics.blocking_probability, 0.25);
        assert_eq!(metrics.queue_probability, 0.05);
        assert_eq!(metrics.server_busy_time, 4.0);
        assert_eq!(metrics.server_idle_time, 6.0);
        assert_eq!(metrics.completed_customers, 2);
        assert_eq!(metrics.wait_time_variance, 0.25);
        assert_eq!(metrics.system_time_variance, 0.25);
    }

    #[test]
    fn wait_interval_is_centred_on_reported_average() {
        let mut collector = StatisticsCollector::new();
        collector.record_completion(&completed(1, 0.0, 0.0, 1.0));
        collector.record_completion(&completed(2, 0.0, 1.0, 2.0));
        // Customer 3 entered service but has not completed, so its delay is
        // in total_delay without a matching wait sample.
        let state = SystemState {
            clock: 4.0,
            total_arrivals: 3,
            served: 3,
            total_delay: 3.0,
            area_under_b: 3.0,
            last_event_time: 4.0,
            ..SystemState::default()
        };

        let metrics = collector.finalize(&state, 2);
        assert_eq!(metrics.avg_wait_time, 1.0);
        assert_eq!(metrics.wait_time_variance, 0.5);
        let ci = metrics.wait_time_confidence;
        assert!(((ci.lower + ci.upper) / 2.0 - metrics.avg_wait_time).abs() < 1e-12);
        let half = 1.96 * (0.5f64 / 2.0).sqrt();
        assert!((ci.upper - (1.0 + half)).abs() < 1e-12);
    }
}
