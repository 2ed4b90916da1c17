use linesim::config::{ProductConfig, ReplicationConfig, RunConfig, SourceConfig, StationConfig};
use linesim::core::MaterialKind;
use linesim::replication::{run_replications, LineDefinition};
use linesim::telemetry::{OeeBreakdown, ProductionAggregator, StateAggregator};
use linesim::{ConcurrencyMode, SimError};

fn stations() -> Vec<StationConfig> {
    vec![
        StationConfig::new("Filler", 3600)
            .with_output_kind(MaterialKind::Tube)
            .with_buffer_capacity(20)
            .with_reliability(90.0, 6.0)
            .with_jams(0.01, 15.0)
            .with_quality(0.02, 0.0),
        StationConfig::new("Inspector", 3600)
            .with_buffer_capacity(20)
            .with_quality(0.0, 0.9),
        StationConfig::new("Packer", 300)
            .with_batch_in(12)
            .with_output_kind(MaterialKind::Case)
            .with_buffer_capacity(10)
            .with_jams(0.02, 30.0),
        StationConfig::new("Palletizer", 5)
            .with_batch_in(60)
            .with_output_kind(MaterialKind::Pallet)
            .with_buffer_capacity(5)
            .with_reliability(240.0, 20.0),
    ]
}

fn main() -> Result<(), SimError> {
    env_logger::init();

    let run = RunConfig::from_hours(8.0).with_name("packaging_shift");
    let line = LineDefinition::linear(stations())?.with_source(SourceConfig::unlimited());

    let mut simulation = line.build(run.seed)?;
    let summary = simulation.run(run.horizon_sec)?;
    println!(
        "=== {} reached t={:.0}s after {} events ===",
        run.name, summary.until, summary.events_processed
    );

    let changes = simulation.drain_state_changes();
    let production = simulation.drain_production();

    let mut states = StateAggregator::new(run.telemetry_interval_sec)?;
    states.consume(&changes);
    states.finalize(summary.until);

    let mut output = ProductionAggregator::new(run.telemetry_interval_sec)?
        .with_product(ProductConfig::new("Toothpaste"), MaterialKind::Pallet);
    output.consume(&production);

    println!("\n{:<12} {:>9} {:>9} {:>9} {:>9} {:>9} {:>7}", "station", "execute", "starved", "blocked", "down", "jammed", "oee");
    let mut conversion_cost = 0.0;
    for report in simulation.station_reports() {
        let times = report.time_in_state;
        let oee = OeeBreakdown::from_report(&report).map_or(0.0, |breakdown| breakdown.oee);
        println!(
            "{:<12} {:>9.0} {:>9.0} {:>9.0} {:>9.0} {:>9.0} {:>6.1}%",
            report.name,
            times.execute,
            times.starved,
            times.blocked,
            times.down,
            times.jammed,
            oee * 100.0
        );
        conversion_cost += report.conversion_cost;
    }

    println!("\nBuffers:");
    for buffer in simulation.buffer_snapshots() {
        println!(
            "  {:<28} occupancy {:>4} in {:>6} out {:>6}",
            buffer.name, buffer.occupancy, buffer.total_in, buffer.total_out
        );
    }

    let economics = output.economics(conversion_cost);
    println!(
        "\nPallets: {}  revenue {:.2}  material {:.2}  conversion {:.2}  margin {:.2}",
        output.total_produced(MaterialKind::Pallet),
        economics.revenue,
        economics.material_cost,
        economics.conversion_cost,
        economics.gross_margin
    );

    let worst_bucket = states
        .buckets()
        .into_iter()
        .filter_map(|bucket| bucket.availability_pct().map(|pct| (pct, bucket)))
        .min_by(|a, b| a.0.total_cmp(&b.0));
    if let Some((pct, bucket)) = worst_bucket {
        println!(
            "Lowest availability: {} at t={:.0}s ({:.1}%)",
            bucket.station, bucket.bucket_start_sec, pct
        );
    }

    let replications = ReplicationConfig::new()
        .with_seed_range(100, 8)
        .with_concurrency(ConcurrencyMode::Rayon);
    let outcomes = run_replications(&line, &run, &replications)?;
    println!("\nReplications:");
    for outcome in &outcomes {
        let cases = outcome
            .station("Packer")
            .map_or(0, |report| report.counters.units_produced);
        let sink = outcome
            .buffers
            .iter()
            .find(|buffer| buffer.name == "_sink")
            .map_or(0, |buffer| buffer.occupancy);
        println!("  seed {:>4}: {:>4} cases packed, {:>3} pallets shipped", outcome.seed, cases, sink);
    }

    Ok(())
}
