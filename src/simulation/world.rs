use super::records::{ProductionRecord, StateChange};
use crate::behavior::Signal;
use crate::config::SourceConfig;
use crate::core::buffer::{Buffer, Handoff};
use crate::core::material::{MaterialId, MaterialKind, MaterialUnit};
use crate::core::scheduler::Scheduler;
use crate::core::types::{BufferId, ProcessId, SimTime};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};
use std::collections::HashMap;

/// Scheduler payload: which station to resume and why
#[derive(Debug)]
pub struct Resumption {
    pub process: ProcessId,
    pub signal: Signal,
}

/// Lazily minted raw material behind the source buffer
#[derive(Debug, Clone)]
pub struct SourceSupply {
    kind: MaterialKind,
    label: String,
    remaining: Option<u64>,
    exhaustion_reported: bool,
}

impl SourceSupply {
    pub fn from_config(config: &SourceConfig) -> Self {
        Self {
            kind: config.material_kind,
            label: config.label.clone(),
            remaining: config.initial_inventory,
            exhaustion_reported: false,
        }
    }

    /// Units left; `None` when unlimited
    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }

    fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    fn consume_one(&mut self) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }
}

/// Everything stations share: time, buffers, the seeded generator and the output streams
pub struct World {
    scheduler: Scheduler<Resumption>,
    buffers: Vec<Buffer>,
    rng: StdRng,
    supply: SourceSupply,
    source: BufferId,
    sink: BufferId,
    reject: BufferId,
    consumer_waits: HashMap<ProcessId, Vec<BufferId>>,
    state_changes: Vec<StateChange>,
    production: Vec<ProductionRecord>,
}

impl World {
    pub(crate) fn new(
        buffers: Vec<Buffer>,
        supply: SourceSupply,
        terminals: (BufferId, BufferId, BufferId),
        seed: u64,
    ) -> Self {
        let (source, sink, reject) = terminals;
        Self {
            scheduler: Scheduler::new(),
            buffers,
            rng: StdRng::seed_from_u64(seed),
            supply,
            source,
            sink,
            reject,
            consumer_waits: HashMap::new(),
            state_changes: Vec::new(),
            production: Vec::new(),
        }
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub(crate) fn scheduler_mut(&mut self) -> &mut Scheduler<Resumption> {
        &mut self.scheduler
    }

    pub fn pending_events(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    pub fn buffer(&self, id: BufferId) -> Option<&Buffer> {
        self.buffers.get(id.index())
    }

    pub fn source_buffer(&self) -> BufferId {
        self.source
    }

    pub fn sink_buffer(&self) -> BufferId {
        self.sink
    }

    pub fn reject_buffer(&self) -> BufferId {
        self.reject
    }

    pub fn supply(&self) -> &SourceSupply {
        &self.supply
    }

    pub(crate) fn schedule_start(&mut self, process: ProcessId) {
        self.scheduler.schedule_now(Resumption {
            process,
            signal: Signal::Start,
        });
    }

    /// Resume `process` once `delay` seconds have elapsed
    pub(crate) fn schedule_timer(&mut self, process: ProcessId, delay: SimTime) {
        self.scheduler.schedule_after(
            delay,
            Resumption {
                process,
                signal: Signal::TimerElapsed,
            },
        );
    }

    /// Bernoulli draw from the run's generator. Probabilities of zero draw nothing.
    pub(crate) fn chance(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        self.rng.gen::<f64>() < probability
    }

    /// Exponentially distributed duration with the given mean
    pub(crate) fn exponential(&mut self, mean: SimTime) -> SimTime {
        if mean <= 0.0 {
            return 0.0;
        }
        match Exp::new(1.0 / mean) {
            Ok(distribution) => distribution.sample(&mut self.rng),
            Err(_) => mean,
        }
    }

    pub(crate) fn mint_id(&mut self) -> MaterialId {
        MaterialId::from_random_bytes(self.rng.gen())
    }

    /// Take one unit from the first non-empty upstream buffer, scanning
    /// round-robin from `cursor`
    pub(crate) fn take(&mut self, upstream: &[BufferId], cursor: &mut usize) -> Option<MaterialUnit> {
        if upstream.is_empty() {
            return None;
        }
        for offset in 0..upstream.len() {
            let position = (*cursor + offset) % upstream.len();
            let buffer = upstream[position];
            if buffer == self.source {
                self.replenish_source();
            }
            if let Some(unit) = self.buffers[buffer.index()].try_get() {
                *cursor = (position + 1) % upstream.len();
                self.settle(buffer);
                return Some(unit);
            }
        }
        None
    }

    fn replenish_source(&mut self) {
        if !self.buffers[self.source.index()].is_empty() {
            return;
        }
        if self.supply.is_exhausted() {
            if !self.supply.exhaustion_reported {
                warn!("Source '{}' exhausted at t={:.3}", self.supply.label, self.now());
                self.supply.exhaustion_reported = true;
            }
            return;
        }
        let id = self.mint_id();
        let unit = MaterialUnit::new(id, self.supply.kind, self.now(), self.supply.label.clone());
        self.supply.consume_one();
        if let Err(unit) = self.buffers[self.source.index()].try_put(unit) {
            debug!("Source buffer refused unit {}", unit.id().short());
        }
    }

    /// Park `process` on every upstream buffer until one of them delivers
    pub(crate) fn wait_for_input(&mut self, process: ProcessId, upstream: &[BufferId]) {
        for buffer in upstream {
            self.buffers[buffer.index()].enqueue_consumer(process);
        }
        self.consumer_waits.insert(process, upstream.to_vec());
    }

    /// Put without waiting; hands the unit back when the buffer is full
    pub(crate) fn try_put(&mut self, buffer: BufferId, unit: MaterialUnit) -> Result<(), MaterialUnit> {
        self.buffers[buffer.index()].try_put(unit)?;
        self.settle(buffer);
        Ok(())
    }

    /// Park `process` with its unit until `buffer` has space
    pub(crate) fn wait_for_space(&mut self, process: ProcessId, buffer: BufferId, unit: MaterialUnit) {
        self.buffers[buffer.index()].enqueue_producer(process, unit);
        self.settle(buffer);
    }

    /// Serve `buffer`'s waiters and schedule their resumption at the current instant
    fn settle(&mut self, buffer: BufferId) {
        for handoff in self.buffers[buffer.index()].settle() {
            match handoff {
                Handoff::Delivered(process, unit) => {
                    if let Some(waited_on) = self.consumer_waits.remove(&process) {
                        for other in waited_on.into_iter().filter(|other| *other != buffer) {
                            self.buffers[other.index()].withdraw_consumer(process);
                        }
                    }
                    self.scheduler.schedule_now(Resumption {
                        process,
                        signal: Signal::InputDelivered(unit),
                    });
                }
                Handoff::Accepted(process) => {
                    self.scheduler.schedule_now(Resumption {
                        process,
                        signal: Signal::OutputAccepted,
                    });
                }
            }
        }
    }

    pub(crate) fn record_state(&mut self, change: StateChange) {
        self.state_changes.push(change);
    }

    pub(crate) fn record_production(&mut self, record: ProductionRecord) {
        self.production.push(record);
    }

    pub(crate) fn drain_state_changes(&mut self) -> Vec<StateChange> {
        std::mem::take(&mut self.state_changes)
    }

    pub(crate) fn drain_production(&mut self) -> Vec<ProductionRecord> {
        std::mem::take(&mut self.production)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(inventory: Option<u64>) -> World {
        let buffers = vec![
            Buffer::unbounded(BufferId::new(0), "_source"),
            Buffer::unbounded(BufferId::new(1), "_sink"),
            Buffer::unbounded(BufferId::new(2), "_reject"),
            Buffer::bounded(BufferId::new(3), "Buf_A_to_B", 1),
            Buffer::bounded(BufferId::new(4), "Buf_C_to_B", 1),
        ];
        let mut source = SourceConfig::default();
        source.initial_inventory = inventory;
        World::new(
            buffers,
            SourceSupply::from_config(&source),
            (BufferId::new(0), BufferId::new(1), BufferId::new(2)),
            7,
        )
    }

    #[test]
    fn test_source_mints_until_inventory_runs_out() {
        let mut world = world_with(Some(2));
        let upstream = [world.source_buffer()];
        let mut cursor = 0;
        let first = world.take(&upstream, &mut cursor).expect("first unit");
        assert_eq!(first.kind(), MaterialKind::Raw);
        assert_eq!(first.created_by(), "Raw");
        assert!(world.take(&upstream, &mut cursor).is_some());
        assert!(world.take(&upstream, &mut cursor).is_none());
        assert_eq!(world.supply().remaining(), Some(0));
    }

    #[test]
    fn test_merge_waiter_is_withdrawn_from_other_inputs() {
        let mut world = world_with(None);
        let process = ProcessId::new(0);
        let upstream = [BufferId::new(3), BufferId::new(4)];
        world.wait_for_input(process, &upstream);

        let id = world.mint_id();
        let unit = MaterialUnit::new(id, MaterialKind::Tube, 0.0, "C");
        assert!(world.try_put(BufferId::new(4), unit).is_ok());

        assert_eq!(world.buffer(BufferId::new(3)).unwrap().waiting_consumers(), 0);
        assert_eq!(world.buffer(BufferId::new(4)).unwrap().occupancy(), 0);
        assert_eq!(world.pending_events(), 1);
    }

    #[test]
    fn test_same_seed_gives_same_draws() {
        let mut a = world_with(None);
        let mut b = world_with(None);
        let draws_a: Vec<bool> = (0..32).map(|_| a.chance(0.5)).collect();
        let draws_b: Vec<bool> = (0..32).map(|_| b.chance(0.5)).collect();
        assert_eq!(draws_a, draws_b);
        assert_eq!(a.mint_id(), b.mint_id());
        assert!(!a.chance(0.0));
        assert!(a.chance(1.0));
    }
}
