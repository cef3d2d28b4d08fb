use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Seed value that asks for a wall-clock derived seed.
pub const WALL_CLOCK_SEED: i64 = -1;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SimConfig {
    #[serde(default = "default_simulation_time")]
    pub simulation_time: f64,
    #[serde(default = "default_arrival_rate")]
    pub arrival_rate: f64,
    #[serde(default = "default_service_rate")]
    pub service_rate: f64,
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
    #[serde(default)]
    pub random: RandomConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub visualization: VisualizationConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            simulation_time: default_simulation_time(),
            arrival_rate: default_arrival_rate(),
            service_rate: default_service_rate(),
            max_queue_size: default_max_queue_size(),
            random: RandomConfig::default(),
            logging: LoggingConfig::default(),
            visualization: VisualizationConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RandomConfig {
    #[serde(default)]
    pub seed: i64,
    #[serde(default)]
    pub distribution: Distribution,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Distribution {
    #[default]
    Exponential,
    Uniform,
    Constant,
}

impl Distribution {
    pub const ALL: [Distribution; 3] = [
        Distribution::Exponential,
        Distribution::Uniform,
        Distribution::Constant,
    ];
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Distribution::Exponential => "exponential",
            Distribution::Uniform => "uniform",
            Distribution::Constant => "constant",
        };
        write!(f, "{}", label)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            format: LogFormat::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct VisualizationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub update_interval_ms: u64,
    #[serde(default = "default_show_realtime_metrics")]
    pub show_realtime_metrics: bool,
    #[serde(default = "default_progress_bar_width")]
    pub progress_bar_width: usize,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            update_interval_ms: 0,
            show_realtime_metrics: default_show_realtime_metrics(),
            progress_bar_width: default_progress_bar_width(),
        }
    }
}

fn default_simulation_time() -> f64 {
    100.0
}

fn default_arrival_rate() -> f64 {
    1.0
}

fn default_service_rate() -> f64 {
    2.0
}

fn default_max_queue_size() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_show_realtime_metrics() -> bool {
    true
}

fn default_progress_bar_width() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config: SimConfig = toml::from_str("").expect("empty config should parse");
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.random.distribution, Distribution::Exponential);
        assert_eq!(config.random.seed, 0);
    }

    #[test]
    fn distribution_names_are_kebab_case() {
        let config: SimConfig = toml::from_str(
            r#"
[random]
distribution = "uniform"
seed = -1
"#,
        )
        .expect("config should parse");
        assert_eq!(config.random.distribution, Distribution::Uniform);
        assert_eq!(config.random.seed, WALL_CLOCK_SEED);
    }

    #[test]
    fn visualization_section_defaults_missing_keys() {
        let config: SimConfig = toml::from_str(
            r#"
[visualization]
enabled = true
progress_bar_width = 20
"#,
        )
        .expect("config should parse");
        assert!(config.visualization.enabled);
        assert_eq!(config.visualization.progress_bar_width, 20);
        assert!(config.visualization.show_realtime_metrics);
        assert_eq!(config.visualization.update_interval_ms, 0);
        assert_eq!(VisualizationConfig::default().progress_bar_width, 50);
    }

    #[test]
    fn unknown_distribution_is_rejected() {
        let result: Result<SimConfig, _> = toml::from_str(
            r#"
[random]
distribution = "pareto"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn negative_queue_size_is_rejected() {
        let result: Result<SimConfig, _> = toml::from_str("max_queue_size = -1");
        assert!(result.is_err());
    }
}
