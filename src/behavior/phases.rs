use super::context::{Awaiting, PhaseContext, Step};
use super::definition::PhaseKind;
use crate::core::errors::Result;
use crate::core::material::{AttributeValue, MaterialUnit};
use crate::equipment::{StationRuntime, StationState};
use crate::simulation::records::ProductionRecord;
use crate::simulation::world::World;

/// Run `kind` for `station`, either completing it or suspending
pub(crate) fn run_phase(
    kind: PhaseKind,
    context: &mut PhaseContext,
    station: &mut StationRuntime,
    world: &mut World,
) -> Result<Step> {
    match kind {
        PhaseKind::Collect => Ok(collect(context, station, world)),
        PhaseKind::Breakdown => Ok(breakdown(station, world)),
        PhaseKind::MicroStop => Ok(micro_stop(station, world)),
        PhaseKind::Execute => Ok(execute(station, world)),
        PhaseKind::Transform => Ok(transform(context, station, world)),
        PhaseKind::Inspect => inspect(context, station, world),
    }
}

/// Gather `batch_in` inputs from the upstream buffers, waiting STARVED when all are empty
fn collect(context: &mut PhaseContext, station: &mut StationRuntime, world: &mut World) -> Step {
    while context.inputs.len() < station.config.batch_in {
        let ports = &mut station.ports;
        match world.take(&ports.upstream, &mut ports.cursor) {
            Some(unit) => accept_input(context, station, unit),
            None => {
                world.wait_for_input(station.id, &station.ports.upstream);
                station.enter(StationState::Starved, "waiting_for_input", world);
                return Step::Wait(Awaiting::Input);
            }
        }
    }
    Step::Done
}

/// Add a unit handed over by an upstream buffer to the current batch
pub(crate) fn accept_input(context: &mut PhaseContext, station: &mut StationRuntime, unit: MaterialUnit) {
    station.counters.units_consumed += 1;
    context.inputs.push(unit);
}

fn breakdown(station: &mut StationRuntime, world: &mut World) -> Step {
    let Some(mtbf) = station.config.mtbf_sec() else {
        return Step::Done;
    };
    let probability = 1.0 - (-station.config.cycle_time_sec() / mtbf).exp();
    if !world.chance(probability) {
        return Step::Done;
    }
    let repair = world.exponential(station.config.mttr_sec());
    station.enter(StationState::Down, "breakdown", world);
    world.schedule_timer(station.id, repair);
    Step::Wait(Awaiting::Timer)
}

fn micro_stop(station: &mut StationRuntime, world: &mut World) -> Step {
    if !world.chance(station.config.performance.jam_prob) {
        return Step::Done;
    }
    station.enter(StationState::Jammed, "jam", world);
    world.schedule_timer(station.id, station.config.performance.jam_time_sec);
    Step::Wait(Awaiting::Timer)
}

fn execute(station: &mut StationRuntime, world: &mut World) -> Step {
    station.counters.cycles_started += 1;
    station.enter(StationState::Execute, "cycle_start", world);
    world.schedule_timer(station.id, station.config.cycle_time_sec());
    Step::Wait(Awaiting::Timer)
}

/// Build the cycle's output from the collected inputs
fn transform(context: &mut PhaseContext, station: &mut StationRuntime, world: &mut World) -> Step {
    let inherited = context.inputs.iter().any(MaterialUnit::is_defective);
    let now = world.now();

    let (output, new_defect) = match station.config.output_kind {
        Some(kind) => {
            let new_defect = world.chance(station.config.quality.defect_rate);
            let id = world.mint_id();
            let unit = MaterialUnit::new(id, kind, now, station.config.name.clone())
                .with_defect(inherited || new_defect)
                .with_genealogy(context.inputs.iter().map(MaterialUnit::id).collect())
                .with_attribute("input_count", AttributeValue::Int(context.inputs.len() as i64));
            (unit, new_defect)
        }
        None if context.inputs.len() == 1 => match context.inputs.pop() {
            Some(unit) => (unit, false),
            None => return Step::Done,
        },
        None => {
            let Some(kind) = context.inputs.first().map(MaterialUnit::kind) else {
                return Step::Done;
            };
            let id = world.mint_id();
            let unit = MaterialUnit::new(id, kind, now, station.config.name.clone())
                .with_defect(inherited)
                .with_genealogy(context.inputs.iter().map(MaterialUnit::id).collect())
                .with_attribute("input_count", AttributeValue::Int(context.inputs.len() as i64));
            (unit, false)
        }
    };

    let counters = &mut station.counters;
    counters.units_produced += 1;
    *counters.produced_by_kind.entry(output.kind()).or_insert(0) += 1;
    if new_defect {
        counters.defects_created += 1;
    }

    world.record_production(ProductionRecord {
        time: now,
        station: station.config.name.clone(),
        unit: output.clone(),
        new_defect,
    });
    context.new_defect = new_defect;
    context.output = Some(output);
    Step::Done
}

/// Send the output to reject when a defect is caught, otherwise to the routed edge.
/// Waits BLOCKED while the destination is full.
fn inspect(context: &mut PhaseContext, station: &mut StationRuntime, world: &mut World) -> Result<Step> {
    let Some(unit) = context.output.take() else {
        return Ok(Step::Done);
    };

    let destination = if unit.is_defective() {
        if world.chance(station.config.quality.detection_prob) {
            station.counters.defects_detected += 1;
            station.ports.reject
        } else {
            station.counters.defects_escaped += 1;
            station.ports.router.select(&unit)?
        }
    } else {
        station.ports.router.select(&unit)?
    };
    context.destination = Some(destination);

    match world.try_put(destination, unit) {
        Ok(()) => {
            finish_route(context, station);
            Ok(Step::Done)
        }
        Err(unit) => {
            world.wait_for_space(station.id, destination, unit);
            station.enter(StationState::Blocked, "waiting_for_space", world);
            Ok(Step::Wait(Awaiting::Space))
        }
    }
}

/// Count a unit the destination buffer accepted
pub(crate) fn finish_route(context: &PhaseContext, station: &mut StationRuntime) {
    match context.destination {
        Some(buffer) if buffer == station.ports.reject => station.counters.rejected += 1,
        Some(_) => station.counters.forwarded += 1,
        None => {}
    }
}
