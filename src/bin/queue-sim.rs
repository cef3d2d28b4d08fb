use std::io;

use queue_sim::config::{self, Command, FormatArg, ModeArg, RunArgs};
use queue_sim::driver::{self, PacedDisplay, TerminalGate};
use queue_sim::engine::Simulator;
use queue_sim::error::Result;
use queue_sim::logging;
use queue_sim::models::Distribution;
use queue_sim::observer::TracingSink;
use queue_sim::output::{self, Formatter, HumanFormatter, JsonFormatter, SummaryFormatter};

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = config::parse_args()?;
    match args.command {
        Command::Run(run_args) => run_command(run_args),
        Command::ShowConfig(config_args) => {
            let config = config::build_config(&config_args)?;
            print!("{}", output::describe_config(&config));
            Ok(())
        }
        Command::ListDistributions => {
            for distribution in Distribution::ALL {
                println!("{}", distribution);
            }
            Ok(())
        }
    }
}

fn run_command(args: RunArgs) -> Result<()> {
    let config = config::build_config(&args.config)?;
    logging::init_logging(&config.logging)?;

    let store_events = args.events || args.format == FormatArg::Json;
    let mut simulator =
        Simulator::new(config.clone(), Box::new(TracingSink))?.with_event_log(store_events);

    let result = match args.mode {
        ModeArg::Manual => {
            let stdin = io::stdin();
            let mut gate = TerminalGate::new(stdin.lock(), io::stdout(), &config);
            driver::run_gated(&mut simulator, &mut gate)?
        }
        ModeArg::Automatic if args.visualize || config.visualization.enabled => {
            let mut display = PacedDisplay::new(io::stdout(), &config);
            driver::run_gated(&mut simulator, &mut display)?
        }
        ModeArg::Automatic => driver::run_to_horizon(&mut simulator),
    };

    let formatter = formatter_for(args.format, args.events);
    print!("{}", formatter.write(&result));
    Ok(())
}

fn formatter_for(format: FormatArg, show_events: bool) -> Box<dyn Formatter> {
    match format {
        FormatArg::Human => Box::new(HumanFormatter { show_events }),
        FormatArg::Summary => Box::new(SummaryFormatter),
        FormatArg::Json => Box::new(JsonFormatter),
    }
}
