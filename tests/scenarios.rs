use linesim::core::MaterialKind;
use linesim::topology::{BufferEdge, RoutePredicate, StationNode, SINK, SOURCE};
use linesim::{BehaviorDefinition, Simulation, StationConfig, StationState, TopologyGraph};

fn build_linear(configs: &[StationConfig], seed: u64) -> Simulation {
    let topology = TopologyGraph::linear(configs).expect("linear topology");
    Simulation::build(&topology, configs, &BehaviorDefinition::standard(), seed).expect("build simulation")
}

#[test]
fn test_filler_feeding_packer_for_two_minutes() {
    let configs = vec![
        StationConfig::new("Filler", 3600).with_output_kind(MaterialKind::Tube),
        StationConfig::new("Packer", 300)
            .with_batch_in(12)
            .with_output_kind(MaterialKind::Case),
    ];
    let mut simulation = build_linear(&configs, 42);
    simulation.run(120.0).unwrap();

    let filler = simulation.station_report("Filler").unwrap();
    assert_eq!(filler.counters.units_produced, 120, "one tube per second, the one due at t=120 included");
    assert_eq!(filler.counters.cycles_started, 121);
    assert_eq!(filler.time_in_state.down, 0.0);
    assert_eq!(filler.time_in_state.jammed, 0.0);

    let packer = simulation.station_report("Packer").unwrap();
    assert_eq!(packer.counters.cycles_started, 10, "packer cycles start at t=12, 24, ..., 120");
    assert_eq!(packer.counters.units_produced, 9);
    assert_eq!(packer.counters.units_consumed, 120);

    let sink = simulation.buffer(simulation.sink_buffer()).unwrap();
    assert_eq!(sink.occupancy, 9);

    let packer_starts: Vec<f64> = simulation
        .drain_state_changes()
        .into_iter()
        .filter(|change| change.station == "Packer" && change.new_state == StationState::Execute)
        .map(|change| change.time)
        .collect();
    assert_eq!(packer_starts, (1..=10).map(|n| n as f64 * 12.0).collect::<Vec<_>>());
}

#[test]
fn test_certain_defects_all_land_in_reject() {
    let configs = vec![StationConfig::new("Maker", 3600)
        .with_output_kind(MaterialKind::Tube)
        .with_quality(1.0, 1.0)];
    let mut simulation = build_linear(&configs, 7);
    simulation.run(100.0).unwrap();

    let report = simulation.station_report("Maker").unwrap();
    assert_eq!(report.counters.units_produced, 100);
    assert_eq!(report.counters.defects_created, 100);
    assert_eq!(report.counters.defects_detected, 100);
    assert_eq!(report.counters.rejected, 100);
    assert_eq!(report.counters.forwarded, 0);

    let reject = simulation.buffer(simulation.reject_buffer()).unwrap();
    let sink = simulation.buffer(simulation.sink_buffer()).unwrap();
    assert_eq!(reject.occupancy, 100);
    assert_eq!(sink.occupancy, 0, "nothing defective may reach the sink");
}

#[test]
fn test_fast_station_blocks_behind_slow_one() {
    let configs = vec![
        StationConfig::new("Fast", 3600).with_buffer_capacity(1),
        StationConfig::new("Slow", 360).with_buffer_capacity(1),
    ];
    let mut simulation = build_linear(&configs, 3);
    simulation.run(200.0).unwrap();

    let fast = simulation.station_report("Fast").unwrap();
    assert!(fast.time_in_state.blocked > 0.0, "expected BLOCKED time, got {:?}", fast.time_in_state);
    let between = simulation
        .buffer_snapshots()
        .into_iter()
        .find(|buffer| buffer.name == "Buf_Fast_to_Slow")
        .unwrap();
    assert_eq!(between.capacity, Some(1));
    assert!(between.occupancy <= 1);
}

fn faulty_line() -> Vec<StationConfig> {
    vec![
        StationConfig::new("Filler", 3600)
            .with_output_kind(MaterialKind::Tube)
            .with_reliability(2.0, 0.5)
            .with_jams(0.05, 4.0)
            .with_quality(0.05, 0.0)
            .with_buffer_capacity(8),
        StationConfig::new("Inspector", 2400).with_quality(0.0, 0.7),
        StationConfig::new("Packer", 400)
            .with_batch_in(6)
            .with_output_kind(MaterialKind::Case)
            .with_jams(0.1, 6.0),
    ]
}

#[test]
fn test_same_seed_reproduces_streams_exactly() {
    let configs = faulty_line();
    let mut first = build_linear(&configs, 99);
    let mut second = build_linear(&configs, 99);
    first.run(1800.0).unwrap();
    second.run(1800.0).unwrap();

    let changes_a = first.drain_state_changes();
    let changes_b = second.drain_state_changes();
    let production_a = first.drain_production();
    let production_b = second.drain_production();

    assert!(changes_a.iter().any(|change| change.new_state == StationState::Down));
    assert_eq!(changes_a, changes_b);
    assert_eq!(production_a, production_b);
    assert_eq!(format!("{:?}", changes_a), format!("{:?}", changes_b));
    assert_eq!(format!("{:?}", production_a), format!("{:?}", production_b));
}

#[test]
fn test_different_seeds_diverge() {
    let configs = faulty_line();
    let mut first = build_linear(&configs, 1);
    let mut second = build_linear(&configs, 2);
    first.run(600.0).unwrap();
    second.run(600.0).unwrap();
    assert_ne!(first.drain_production(), second.drain_production());
}

#[test]
fn test_defective_units_branch_to_rework() {
    let configs = vec![
        StationConfig::new("QC", 3600)
            .with_output_kind(MaterialKind::Tube)
            .with_quality(0.3, 0.0),
        StationConfig::new("Rework", 3600),
    ];
    let mut topology = TopologyGraph::new();
    for config in &configs {
        topology.add_node(StationNode::from_config(config)).unwrap();
    }
    topology.add_edge(BufferEdge::new(SOURCE, "QC")).unwrap();
    topology
        .add_edge(BufferEdge::new("QC", "Rework").with_condition(RoutePredicate::parse("product.is_defective").unwrap()))
        .unwrap();
    topology.add_edge(BufferEdge::new("QC", SINK)).unwrap();
    topology.add_edge(BufferEdge::new("Rework", SINK)).unwrap();

    let mut simulation = Simulation::build(&topology, &configs, &BehaviorDefinition::standard(), 5).unwrap();
    simulation.run(500.0).unwrap();

    let qc = simulation.station_report("QC").unwrap();
    let rework = simulation.station_report("Rework").unwrap();
    assert!(qc.counters.defects_escaped > 0);
    assert_eq!(qc.counters.forwarded, qc.counters.units_produced);
    assert!(rework.counters.units_consumed <= qc.counters.defects_escaped);
    assert!(qc.counters.defects_escaped - rework.counters.units_consumed <= 1);

    let rework_outputs: Vec<_> = simulation
        .drain_production()
        .into_iter()
        .filter(|record| record.station == "Rework")
        .collect();
    assert!(!rework_outputs.is_empty());
    assert!(rework_outputs.iter().all(|record| record.unit.is_defective()));
}

#[test]
fn test_merge_station_draws_from_both_inputs() {
    let configs = vec![
        StationConfig::new("LineA", 1800).with_output_kind(MaterialKind::Tube),
        StationConfig::new("LineB", 1800).with_output_kind(MaterialKind::Tube),
        StationConfig::new("Packer", 600)
            .with_batch_in(6)
            .with_output_kind(MaterialKind::Case),
    ];
    let mut topology = TopologyGraph::new();
    for config in &configs {
        topology.add_node(StationNode::from_config(config)).unwrap();
    }
    topology.add_edge(BufferEdge::new(SOURCE, "LineA")).unwrap();
    topology.add_edge(BufferEdge::new(SOURCE, "LineB")).unwrap();
    topology.add_edge(BufferEdge::new("LineA", "Packer")).unwrap();
    topology.add_edge(BufferEdge::new("LineB", "Packer")).unwrap();
    topology.add_edge(BufferEdge::new("Packer", SINK)).unwrap();

    let mut simulation = Simulation::build(&topology, &configs, &BehaviorDefinition::standard(), 11).unwrap();
    simulation.run(600.0).unwrap();

    let line_a = simulation.station_report("LineA").unwrap();
    let line_b = simulation.station_report("LineB").unwrap();
    let packer = simulation.station_report("Packer").unwrap();
    assert!(line_a.counters.forwarded > 250);
    assert!(line_b.counters.forwarded > 250);

    let queued: usize = simulation
        .buffer_snapshots()
        .iter()
        .filter(|buffer| buffer.name.ends_with("_to_Packer"))
        .map(|buffer| buffer.occupancy)
        .sum();
    assert_eq!(
        line_a.counters.forwarded + line_b.counters.forwarded,
        packer.counters.units_consumed + queued as u64
    );
    assert!(packer.counters.units_produced >= 50);
}
