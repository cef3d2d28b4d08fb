use std::io::{BufRead, Write};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use crate::engine::Simulator;
use crate::error::{Error, Result};
use crate::events::ScheduledEvent;
use crate::models::SimConfig;
use crate::output::{render_snapshot, SnapshotView};
use crate::state::{SimulationResult, SystemState};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Gate {
    Advance,
    Quit,
}

/// Decides, between events, whether the run may apply the next one.
pub trait StepGate {
    fn confirm(&mut self, state: &SystemState, next: &ScheduledEvent) -> Result<Gate>;
}

/// Apply every event up to the horizon, then finalize.
pub fn run_to_horizon(simulator: &mut Simulator) -> SimulationResult {
    simulator.initialize();
    while simulator.step().is_some() {}
    simulator.finish()
}

/// Apply events one at a time as long as `gate` allows it.
///
/// A `Quit` halts the run at the current clock; running out of events
/// within the horizon finishes it normally. A gate error also halts the
/// run before it is returned, so `Simulator::halt` still yields the
/// partial result.
pub fn run_gated(simulator: &mut Simulator, gate: &mut dyn StepGate) -> Result<SimulationResult> {
    simulator.initialize();
    loop {
        let confirmed = match simulator.peek_due() {
            Some(next) => gate.confirm(simulator.state(), next),
            None => return Ok(simulator.finish()),
        };
        let decision = match confirmed {
            Ok(decision) => decision,
            Err(err) => {
                warn!(clock = simulator.state().clock, error = %err, "gate failed; halting run");
                simulator.halt();
                return Err(err);
            }
        };
        match decision {
            Gate::Advance => {
                simulator.step();
            }
            Gate::Quit => {
                info!(clock = simulator.state().clock, "run halted on request");
                return Ok(simulator.halt());
            }
        }
    }
}

/// Interactive gate: shows the state and waits for ENTER; `q` quits.
pub struct TerminalGate<R, W> {
    input: R,
    output: W,
    view: SnapshotView,
}

impl<R: BufRead, W: Write> TerminalGate<R, W> {
    pub fn new(input: R, output: W, config: &SimConfig) -> Self {
        Self {
            input,
            output,
            view: SnapshotView::from_config(config),
        }
    }
}

impl<R: BufRead, W: Write> StepGate for TerminalGate<R, W> {
    fn confirm(&mut self, state: &SystemState, next: &ScheduledEvent) -> Result<Gate> {
        let snapshot = render_snapshot(state, Some(next), &self.view);
        write!(
            self.output,
            "{}\nPress ENTER to advance to the next event (or 'q' to quit): ",
            snapshot
        )
        .and_then(|_| self.output.flush())
        .map_err(|err| Error::Io(format!("failed to write to terminal: {}", err)))?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|err| Error::Io(format!("failed to read terminal input: {}", err)))?;
        if read == 0 || line.trim().eq_ignore_ascii_case("q") {
            return Ok(Gate::Quit);
        }
        Ok(Gate::Advance)
    }
}

/// Automatic-mode visualization: redraws the state before every event.
pub struct PacedDisplay<W> {
    output: W,
    interval: Duration,
    view: SnapshotView,
}

impl<W: Write> PacedDisplay<W> {
    pub fn new(output: W, config: &SimConfig) -> Self {
        Self {
            output,
            interval: Duration::from_millis(config.visualization.update_interval_ms),
            view: SnapshotView::from_config(config),
        }
    }
}

impl<W: Write> StepGate for PacedDisplay<W> {
    fn confirm(&mut self, state: &SystemState, next: &ScheduledEvent) -> Result<Gate> {
        let snapshot = render_snapshot(state, Some(next), &self.view);
        writeln!(self.output, "{}", snapshot)
            .and_then(|_| self.output.flush())
            .map_err(|err| Error::Io(format!("failed to write to terminal: {}", err)))?;
        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
        Ok(Gate::Advance)
    }
}
