use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use crate::engine;
use crate::error::{Error, Result};
use crate::models::{Distribution, SimConfig};

#[derive(Parser, Debug)]
#[command(name = "queue-sim", version, about = "M/M/1 queue discrete-event simulator")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation and print its report
    Run(RunArgs),
    /// Print the resolved configuration without running
    ShowConfig(ConfigArgs),
    /// List the supported inter-arrival/service distributions
    ListDistributions,
}

#[derive(clap::Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    #[arg(long, help = "TOML or JSON config file; flags below override its values")]
    pub config: Option<PathBuf>,
    #[arg(long, allow_negative_numbers = true)]
    pub simulation_time: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub arrival_rate: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub service_rate: Option<f64>,
    #[arg(long)]
    pub max_queue_size: Option<usize>,
    #[arg(long, value_enum)]
    pub distribution: Option<DistributionArg>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "RNG seed; -1 seeds from the wall clock"
    )]
    pub seed: Option<i64>,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    #[arg(long, value_enum, default_value_t = ModeArg::Automatic)]
    pub mode: ModeArg,
    #[arg(long, value_enum, default_value_t = FormatArg::Human)]
    pub format: FormatArg,
    #[arg(long, help = "Include the per-event log in human output")]
    pub events: bool,
    #[arg(long, help = "Redraw the system state before every event")]
    pub visualize: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    #[value(alias = "a")]
    Automatic,
    #[value(alias = "m")]
    Manual,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Human,
    Summary,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistributionArg {
    Exponential,
    Uniform,
    Constant,
}

impl From<DistributionArg> for Distribution {
    fn from(value: DistributionArg) -> Self {
        match value {
            DistributionArg::Exponential => Distribution::Exponential,
            DistributionArg::Uniform => Distribution::Uniform,
            DistributionArg::Constant => Distribution::Constant,
        }
    }
}

pub fn parse_args() -> Result<Args> {
    Args::try_parse().map_err(|err| {
        if matches!(
            err.kind(),
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
        ) {
            err.exit();
        }
        Error::Cli(err.to_string())
    })
}

pub fn load_config(path: &Path) -> Result<SimConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::ConfigIo(format!(
            "failed to read config '{}': {}",
            path.display(),
            err
        ))
    })?;
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .unwrap_or("");

    match ext {
        "toml" => toml::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse TOML: {}", err))),
        "json" => serde_json::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse JSON: {}", err))),
        "" => Err(Error::UnsupportedConfigFormat("unknown".to_string())),
        _ => Err(Error::UnsupportedConfigFormat(ext.to_string())),
    }
}

/// Resolve the file (or defaults) plus flag overrides into a validated config.
pub fn build_config(args: &ConfigArgs) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };

    if let Some(value) = args.simulation_time {
        config.simulation_time = value;
    }
    if let Some(value) = args.arrival_rate {
        config.arrival_rate = value;
    }
    if let Some(value) = args.service_rate {
        config.service_rate = value;
    }
    if let Some(value) = args.max_queue_size {
        config.max_queue_size = value;
    }
    if let Some(value) = args.distribution {
        config.random.distribution = value.into();
    }
    if let Some(value) = args.seed {
        config.random.seed = value;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(path) = &args.log_file {
        config.logging.file = Some(path.clone());
    }

    engine::validate_config(&config)?;
    Ok(config)
}
