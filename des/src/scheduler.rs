use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::fmt;

use crate::time::check_duration;
use crate::{DesError, ProcessId, SimTime, Wakeup};

/// Handle to a scheduled event. Ids increase with insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Rank among events due at the same instant.
///
/// Grants go first, ordinary timeouts next, and `Late` deadlines only once
/// everything else at that instant has run. A customer whose patience ends at
/// the very moment a server frees up is therefore served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Urgent,
    Normal,
    Late,
}

/// An event popped from the scheduler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scheduled {
    pub id: EventId,
    pub t: SimTime,
    pub priority: Priority,
    pub target: ProcessId,
    pub wakeup: Wakeup,
}

struct Event(Scheduled);

impl Event {
    fn key(&self) -> (SimTime, Priority, EventId) {
        (self.0.t, self.0.priority, self.0.id)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Event {}

// Reversed so that `BinaryHeap` pops the earliest event.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The simulated clock and the set of pending wakeups.
///
/// Events are ordered by `(time, priority, insertion sequence)`, so events
/// due at the same instant with the same priority come out in the order they
/// were scheduled. Cancellation is lazy: a cancelled event stays in the heap
/// and is skipped when it reaches the top.
#[derive(Default)]
pub struct Scheduler {
    queue: BinaryHeap<Event>,
    pending: HashSet<EventId>,
    current_t: SimTime,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Scheduler {
        Scheduler::default()
    }

    pub fn now(&self) -> SimTime {
        self.current_t
    }

    /// Number of events still due (cancelled ones excluded).
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: EventId) -> bool {
        self.pending.contains(&id)
    }

    /// Schedules a timeout for `target` at `now + duration`.
    ///
    /// The wakeup delivered is `Wakeup::Timeout` carrying the returned id.
    pub fn schedule_after(
        &mut self,
        duration: f64,
        priority: Priority,
        target: ProcessId,
    ) -> Result<EventId, DesError> {
        let duration = check_duration(duration)?;
        let id = self.next_event_id();
        self.push(Scheduled {
            id,
            t: self.current_t.after(duration),
            priority,
            target,
            wakeup: Wakeup::Timeout(id),
        });
        Ok(id)
    }

    /// Schedules `wakeup` for `target` at the current instant.
    pub fn notify(&mut self, priority: Priority, target: ProcessId, wakeup: Wakeup) -> EventId {
        let id = self.next_event_id();
        self.push(Scheduled {
            id,
            t: self.current_t,
            priority,
            target,
            wakeup,
        });
        id
    }

    /// Removes a pending event. Returns `false` if it had already fired or
    /// been cancelled.
    pub fn cancel(&mut self, id: EventId) -> bool {
        self.pending.remove(&id)
    }

    /// Time of the next live event.
    pub fn peek_time(&mut self) -> Option<SimTime> {
        self.discard_cancelled();
        self.queue.peek().map(|event| event.0.t)
    }

    /// Pops the next live event due no later than `horizon` and advances the
    /// clock to it. Events past the horizon stay queued.
    pub fn pop_until(&mut self, horizon: SimTime) -> Option<Scheduled> {
        self.discard_cancelled();
        if self.queue.peek()?.0.t > horizon {
            return None;
        }
        let Event(event) = self.queue.pop()?;
        self.pending.remove(&event.id);
        debug_assert!(event.t >= self.current_t);
        self.current_t = event.t;
        Some(event)
    }

    fn next_event_id(&mut self) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push(&mut self, event: Scheduled) {
        self.pending.insert(event.id);
        self.queue.push(Event(event));
    }

    fn discard_cancelled(&mut self) {
        while let Some(top) = self.queue.peek() {
            if self.pending.contains(&top.0.id) {
                break;
            }
            self.queue.pop();
        }
    }
}
