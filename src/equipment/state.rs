use crate::core::types::SimTime;
use serde::{Deserialize, Serialize};

/// Operating state of a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationState {
    Starved,
    Execute,
    Down,
    Jammed,
    Blocked,
}

impl StationState {
    pub const ALL: [StationState; 5] = [
        StationState::Starved,
        StationState::Execute,
        StationState::Down,
        StationState::Jammed,
        StationState::Blocked,
    ];

    pub fn index(&self) -> usize {
        match self {
            StationState::Starved => 0,
            StationState::Execute => 1,
            StationState::Down => 2,
            StationState::Jammed => 3,
            StationState::Blocked => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StationState::Starved => "STARVED",
            StationState::Execute => "EXECUTE",
            StationState::Down => "DOWN",
            StationState::Jammed => "JAMMED",
            StationState::Blocked => "BLOCKED",
        }
    }
}

impl std::fmt::Display for StationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Seconds spent in each state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StateTimes {
    pub starved: f64,
    pub execute: f64,
    pub down: f64,
    pub jammed: f64,
    pub blocked: f64,
}

impl StateTimes {
    pub fn get(&self, state: StationState) -> f64 {
        match state {
            StationState::Starved => self.starved,
            StationState::Execute => self.execute,
            StationState::Down => self.down,
            StationState::Jammed => self.jammed,
            StationState::Blocked => self.blocked,
        }
    }

    fn slot(&mut self, state: StationState) -> &mut f64 {
        match state {
            StationState::Starved => &mut self.starved,
            StationState::Execute => &mut self.execute,
            StationState::Down => &mut self.down,
            StationState::Jammed => &mut self.jammed,
            StationState::Blocked => &mut self.blocked,
        }
    }

    pub fn add(&mut self, state: StationState, seconds: f64) {
        *self.slot(state) += seconds;
    }

    pub fn total(&self) -> f64 {
        StationState::ALL.iter().map(|state| self.get(*state)).sum()
    }
}

/// Completed transition: the state left and how long it lasted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub previous: StationState,
    pub duration: SimTime,
}

/// Time-in-state bookkeeping for one station.
///
/// Closed intervals are accumulated on every transition; the open interval of
/// the current state is added on demand, so totals always cover `[start, now]`.
#[derive(Debug, Clone)]
pub struct StateLedger {
    current: StationState,
    since: SimTime,
    accumulated: StateTimes,
    entries: [u64; 5],
}

impl StateLedger {
    pub fn new(initial: StationState, start: SimTime) -> Self {
        let mut entries = [0; 5];
        entries[initial.index()] = 1;
        Self {
            current: initial,
            since: start,
            accumulated: StateTimes::default(),
            entries,
        }
    }

    pub fn current(&self) -> StationState {
        self.current
    }

    pub fn since(&self) -> SimTime {
        self.since
    }

    /// Move to `state` at `now`. Re-entering the current state is not a transition.
    pub fn transition(&mut self, state: StationState, now: SimTime) -> Option<Transition> {
        if state == self.current {
            return None;
        }
        let previous = self.current;
        let duration = (now - self.since).max(0.0);
        *self.accumulated.slot(previous) += duration;
        self.entries[state.index()] += 1;
        self.current = state;
        self.since = now;
        Some(Transition { previous, duration })
    }

    /// Totals including the still-open interval up to `now`
    pub fn time_in_state(&self, now: SimTime) -> StateTimes {
        let mut times = self.accumulated;
        *times.slot(self.current) += (now - self.since).max(0.0);
        times
    }

    /// Number of times `state` was entered, the initial state included
    pub fn entries(&self, state: StationState) -> u64 {
        self.entries[state.index()]
    }
}
