use super::types::SimTime;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A pending resumption: due time, scheduling sequence number and the continuation payload
#[derive(Debug)]
pub struct ScheduledEvent<E> {
    pub due_time: SimTime,
    pub sequence_num: u64,
    pub event: E,
}

impl<E> PartialEq for ScheduledEvent<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due_time.total_cmp(&other.due_time) == Ordering::Equal
            && self.sequence_num == other.sequence_num
    }
}

impl<E> Eq for ScheduledEvent<E> {}

impl<E> PartialOrd for ScheduledEvent<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for ScheduledEvent<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .due_time
            .total_cmp(&self.due_time)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Owns simulated time and the time-ordered queue of pending resumptions.
///
/// Time only moves when an event is popped, and never backwards. Events due at
/// the same instant pop in the order they were scheduled.
pub struct Scheduler<E> {
    event_queue: BinaryHeap<ScheduledEvent<E>>,
    sequence_counter: u64,
    now: SimTime,
}

impl<E> Scheduler<E> {
    /// Create a new Scheduler at time zero
    pub fn new() -> Self {
        Self {
            event_queue: BinaryHeap::new(),
            sequence_counter: 0,
            now: 0.0,
        }
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedule `event` to resume once `delay` simulated seconds have elapsed.
    /// Negative or NaN delays are treated as zero.
    pub fn schedule_after(&mut self, delay: SimTime, event: E) {
        let delay = if delay > 0.0 { delay } else { 0.0 };
        let scheduled_event = ScheduledEvent {
            due_time: self.now + delay,
            sequence_num: self.sequence_counter,
            event,
        };

        self.event_queue.push(scheduled_event);
        self.sequence_counter += 1;
    }

    /// Schedule `event` at the current instant, behind everything already due now
    pub fn schedule_now(&mut self, event: E) {
        self.schedule_after(0.0, event);
    }

    /// Pop the earliest event if it is due at or before `horizon`, advancing time to it
    pub fn pop_due(&mut self, horizon: SimTime) -> Option<(SimTime, E)> {
        let due = self.peek_next_time()?;
        if due > horizon {
            return None;
        }
        let scheduled_event = self.event_queue.pop()?;
        if scheduled_event.due_time > self.now {
            self.now = scheduled_event.due_time;
        }
        Some((self.now, scheduled_event.event))
    }

    /// Move the clock forward to `time` without resuming anything
    pub fn advance_to(&mut self, time: SimTime) {
        if time > self.now {
            self.now = time;
        }
    }

    /// Check if there are any events remaining in the queue
    pub fn has_events(&self) -> bool {
        !self.event_queue.is_empty()
    }

    /// Number of pending resumptions
    pub fn pending(&self) -> usize {
        self.event_queue.len()
    }

    /// Get the next due time without removing events
    pub fn peek_next_time(&self) -> Option<SimTime> {
        self.event_queue.peek().map(|event| event.due_time)
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}
