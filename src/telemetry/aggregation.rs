use crate::core::errors::{Result, SimError};
use crate::core::types::SimTime;
use crate::equipment::{StateTimes, StationState};
use crate::simulation::StateChange;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Time-in-state and event counts of one station within one bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketStats {
    pub bucket_index: u64,
    pub bucket_start_sec: SimTime,
    pub station: String,
    pub time: StateTimes,
    pub transition_count: u64,
    pub down_count: u64,
    pub jammed_count: u64,
}

impl BucketStats {
    fn new(bucket_index: u64, bucket_size_sec: SimTime, station: &str) -> Self {
        Self {
            bucket_index,
            bucket_start_sec: bucket_index as f64 * bucket_size_sec,
            station: station.to_string(),
            time: StateTimes::default(),
            transition_count: 0,
            down_count: 0,
            jammed_count: 0,
        }
    }

    pub fn total_sec(&self) -> f64 {
        self.time.total()
    }

    /// execute / (execute + down + jammed), as a percentage
    pub fn availability_pct(&self) -> Option<f64> {
        let productive = self.time.execute;
        let total = productive + self.time.down + self.time.jammed;
        if total == 0.0 {
            return None;
        }
        Some(productive / total * 100.0)
    }
}

/// Folds the state-change stream into fixed-width time buckets per station
#[derive(Debug, Clone)]
pub struct StateAggregator {
    bucket_size_sec: SimTime,
    buckets: BTreeMap<(String, u64), BucketStats>,
    last_state: HashMap<String, (StationState, SimTime)>,
}

impl StateAggregator {
    pub fn new(bucket_size_sec: SimTime) -> Result<Self> {
        if !bucket_size_sec.is_finite() || bucket_size_sec <= 0.0 {
            return Err(SimError::configuration(
                "state aggregator",
                format!("bucket size must be positive, got {}", bucket_size_sec),
            ));
        }
        Ok(Self {
            bucket_size_sec,
            buckets: BTreeMap::new(),
            last_state: HashMap::new(),
        })
    }

    pub fn bucket_size_sec(&self) -> SimTime {
        self.bucket_size_sec
    }

    fn bucket_index(&self, time: SimTime) -> u64 {
        (time.max(0.0) / self.bucket_size_sec).floor() as u64
    }

    fn bucket_mut(&mut self, index: u64, station: &str) -> &mut BucketStats {
        let size = self.bucket_size_sec;
        self.buckets
            .entry((station.to_string(), index))
            .or_insert_with(|| BucketStats::new(index, size, station))
    }

    pub fn on_state_change(&mut self, change: &StateChange) {
        if let Some(previous) = change.previous_state {
            if change.duration_in_previous_state > 0.0 {
                self.accumulate(
                    &change.station,
                    previous,
                    change.time - change.duration_in_previous_state,
                    change.time,
                );
            }
        }

        let index = self.bucket_index(change.time);
        let bucket = self.bucket_mut(index, &change.station);
        bucket.transition_count += 1;
        match change.new_state {
            StationState::Down => bucket.down_count += 1,
            StationState::Jammed => bucket.jammed_count += 1,
            _ => {}
        }

        self.last_state
            .insert(change.station.clone(), (change.new_state, change.time));
    }

    pub fn consume<'a>(&mut self, changes: impl IntoIterator<Item = &'a StateChange>) {
        for change in changes {
            self.on_state_change(change);
        }
    }

    /// Split `[start, end)` across the buckets it covers
    fn accumulate(&mut self, station: &str, state: StationState, start: SimTime, end: SimTime) {
        if end <= start {
            return;
        }
        let first = self.bucket_index(start);
        let last = self.bucket_index(end);
        let mut current = start;
        for index in first..=last {
            let bucket_end = (index + 1) as f64 * self.bucket_size_sec;
            let segment_end = bucket_end.min(end);
            let segment = segment_end - current;
            if segment > 0.0 {
                self.bucket_mut(index, station).time.add(state, segment);
            }
            current = segment_end;
        }
    }

    /// Close every station's open state at `total_time`
    pub fn finalize(&mut self, total_time: SimTime) {
        let open: Vec<(String, StationState, SimTime)> = self
            .last_state
            .iter()
            .map(|(station, (state, since))| (station.clone(), *state, *since))
            .collect();
        for (station, state, since) in open {
            if since < total_time {
                self.accumulate(&station, state, since, total_time);
            }
            self.last_state.insert(station, (state, total_time));
        }
    }

    /// Buckets sorted by station, then bucket index
    pub fn buckets(&self) -> Vec<&BucketStats> {
        self.buckets.values().collect()
    }

    pub fn station_buckets(&self, station: &str) -> Vec<&BucketStats> {
        self.buckets
            .values()
            .filter(|bucket| bucket.station == station)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(time: f64, new_state: StationState, previous: Option<(StationState, f64)>) -> StateChange {
        StateChange {
            time,
            station: "Filler".to_string(),
            new_state,
            previous_state: previous.map(|(state, _)| state),
            label: "test".to_string(),
            duration_in_previous_state: previous.map_or(0.0, |(_, duration)| duration),
        }
    }

    #[test]
    fn test_duration_split_across_buckets() {
        let mut aggregator = StateAggregator::new(10.0).unwrap();
        aggregator.on_state_change(&change(0.0, StationState::Execute, None));
        aggregator.on_state_change(&change(25.0, StationState::Down, Some((StationState::Execute, 25.0))));
        aggregator.finalize(30.0);

        let buckets = aggregator.buckets();
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].time.execute, 10.0);
        assert_eq!(buckets[1].time.execute, 10.0);
        assert_eq!(buckets[2].time.execute, 5.0);
        assert_eq!(buckets[2].time.down, 5.0);
        assert_eq!(buckets[2].down_count, 1);
        assert_eq!(buckets[2].availability_pct(), Some(50.0));
    }

    #[test]
    fn test_availability_undefined_without_productive_or_loss_time() {
        let mut aggregator = StateAggregator::new(60.0).unwrap();
        aggregator.on_state_change(&change(0.0, StationState::Starved, None));
        aggregator.finalize(60.0);
        let buckets = aggregator.buckets();
        assert_eq!(buckets[0].time.starved, 60.0);
        assert_eq!(buckets[0].availability_pct(), None);
    }

    #[test]
    fn test_rejects_non_positive_bucket_size() {
        assert!(StateAggregator::new(0.0).is_err());
        assert!(StateAggregator::new(-5.0).is_err());
    }
}
