use super::material::MaterialUnit;
use super::types::{BufferId, ProcessId};
use serde::Serialize;
use std::collections::VecDeque;

/// Outcome of matching a buffer's waiters against its contents
#[derive(Debug)]
pub enum Handoff {
    /// A waiting consumer was handed the oldest unit
    Delivered(ProcessId, MaterialUnit),
    /// A waiting producer's unit was appended
    Accepted(ProcessId),
}

/// Point-in-time view of a buffer for the monitoring collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BufferSnapshot {
    pub name: String,
    pub occupancy: usize,
    /// `None` for unbounded buffers
    pub capacity: Option<usize>,
    pub total_in: u64,
    pub total_out: u64,
    pub waiting_producers: usize,
    pub waiting_consumers: usize,
}

/// FIFO queue of material units with a fixed capacity.
///
/// Producers that find the buffer full and consumers that find it empty are
/// parked in FIFO waiter queues. `settle` serves them whenever the contents
/// change, so after every operation either nobody waits or the wait is genuine.
#[derive(Debug)]
pub struct Buffer {
    id: BufferId,
    name: String,
    capacity: Option<usize>,
    contents: VecDeque<MaterialUnit>,
    waiting_producers: VecDeque<(ProcessId, MaterialUnit)>,
    waiting_consumers: VecDeque<ProcessId>,
    total_in: u64,
    total_out: u64,
}

impl Buffer {
    /// Create a buffer that holds at most `capacity` units
    pub fn bounded(id: BufferId, name: impl Into<String>, capacity: usize) -> Self {
        Self::with_capacity(id, name.into(), Some(capacity))
    }

    /// Create a buffer that never blocks producers
    pub fn unbounded(id: BufferId, name: impl Into<String>) -> Self {
        Self::with_capacity(id, name.into(), None)
    }

    fn with_capacity(id: BufferId, name: String, capacity: Option<usize>) -> Self {
        Self {
            id,
            name,
            capacity,
            contents: VecDeque::new(),
            waiting_producers: VecDeque::new(),
            waiting_consumers: VecDeque::new(),
            total_in: 0,
            total_out: 0,
        }
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn occupancy(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity.map_or(false, |capacity| self.contents.len() >= capacity)
    }

    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Units currently held, oldest first
    pub fn contents(&self) -> impl Iterator<Item = &MaterialUnit> {
        self.contents.iter()
    }

    /// Append `unit` if there is room, otherwise hand it back
    pub fn try_put(&mut self, unit: MaterialUnit) -> Result<(), MaterialUnit> {
        if self.is_full() {
            return Err(unit);
        }
        self.contents.push_back(unit);
        self.total_in += 1;
        Ok(())
    }

    /// Remove the oldest unit, if any
    pub fn try_get(&mut self) -> Option<MaterialUnit> {
        let unit = self.contents.pop_front()?;
        self.total_out += 1;
        Some(unit)
    }

    /// Park a producer together with the unit it is trying to put
    pub fn enqueue_producer(&mut self, process: ProcessId, unit: MaterialUnit) {
        self.waiting_producers.push_back((process, unit));
    }

    /// Park a consumer until a unit becomes available
    pub fn enqueue_consumer(&mut self, process: ProcessId) {
        self.waiting_consumers.push_back(process);
    }

    /// Drop a consumer that was served elsewhere (merge stations wait on every input)
    pub fn withdraw_consumer(&mut self, process: ProcessId) {
        self.waiting_consumers.retain(|waiting| *waiting != process);
    }

    /// Serve waiters in FIFO order until neither side can make progress
    pub fn settle(&mut self) -> Vec<Handoff> {
        let mut handoffs = Vec::new();
        loop {
            let mut progressed = false;

            while !self.contents.is_empty() {
                let Some(consumer) = self.waiting_consumers.pop_front() else {
                    break;
                };
                if let Some(unit) = self.try_get() {
                    handoffs.push(Handoff::Delivered(consumer, unit));
                    progressed = true;
                }
            }

            while !self.is_full() {
                let Some((producer, unit)) = self.waiting_producers.pop_front() else {
                    break;
                };
                self.contents.push_back(unit);
                self.total_in += 1;
                handoffs.push(Handoff::Accepted(producer));
                progressed = true;
            }

            if !progressed {
                break;
            }
        }
        handoffs
    }

    pub fn waiting_producers(&self) -> usize {
        self.waiting_producers.len()
    }

    pub fn waiting_consumers(&self) -> usize {
        self.waiting_consumers.len()
    }

    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            name: self.name.clone(),
            occupancy: self.contents.len(),
            capacity: self.capacity,
            total_in: self.total_in,
            total_out: self.total_out,
            waiting_producers: self.waiting_producers.len(),
            waiting_consumers: self.waiting_consumers.len(),
        }
    }
}
