use super::context::{Awaiting, PhaseContext, Signal, Step};
use super::definition::ResolvedBehavior;
use super::phases;
use crate::core::errors::Result;
use crate::equipment::StationRuntime;
use crate::simulation::world::World;
use log::warn;

/// Steps a station through its resolved phases, one cycle after another.
///
/// The orchestrator remembers which phase it is in and what it is waiting
/// for. Each resumption finishes the pending wait and then runs phases until
/// the next suspension point.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    behavior: ResolvedBehavior,
    phase_index: usize,
    context: PhaseContext,
    awaiting: Option<Awaiting>,
    cycles_completed: u64,
}

impl Orchestrator {
    pub fn new(behavior: ResolvedBehavior) -> Self {
        Self {
            behavior,
            phase_index: 0,
            context: PhaseContext::default(),
            awaiting: None,
            cycles_completed: 0,
        }
    }

    pub fn behavior(&self) -> &ResolvedBehavior {
        &self.behavior
    }

    pub fn awaiting(&self) -> Option<Awaiting> {
        self.awaiting
    }

    /// Cycles that ran through every phase
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// Units currently held by the station (collected inputs and a parked output)
    pub fn in_process(&self) -> &PhaseContext {
        &self.context
    }

    pub(crate) fn resume(&mut self, signal: Signal, station: &mut StationRuntime, world: &mut World) -> Result<()> {
        match (self.awaiting.take(), signal) {
            (None, Signal::Start) => {}
            (Some(Awaiting::Timer), Signal::TimerElapsed) => self.phase_index += 1,
            (Some(Awaiting::Input), Signal::InputDelivered(unit)) => {
                phases::accept_input(&mut self.context, station, unit);
            }
            (Some(Awaiting::Space), Signal::OutputAccepted) => {
                phases::finish_route(&self.context, station);
                self.phase_index += 1;
            }
            (awaiting, signal) => {
                warn!(
                    "[Station {}] ignoring {:?} while awaiting {:?}",
                    station.name(),
                    signal,
                    awaiting
                );
                self.awaiting = awaiting;
                return Ok(());
            }
        }
        self.advance(station, world)
    }

    /// Run phases until one suspends
    fn advance(&mut self, station: &mut StationRuntime, world: &mut World) -> Result<()> {
        loop {
            if self.phase_index >= self.behavior.phases().len() {
                self.context.clear();
                self.phase_index = 0;
                self.cycles_completed += 1;
            }
            let kind = self.behavior.phases()[self.phase_index];
            match phases::run_phase(kind, &mut self.context, station, world)? {
                Step::Done => self.phase_index += 1,
                Step::Wait(awaiting) => {
                    self.awaiting = Some(awaiting);
                    return Ok(());
                }
            }
        }
    }
}
