use std::collections::VecDeque;
use std::fmt;

use crate::{DesError, ProcessId, SimTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(pub(crate) usize);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool{}", self.0)
    }
}

/// A request for one slot of a pool. Unique across pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId {
    pool: PoolId,
    index: usize,
}

impl RequestId {
    pub fn pool(&self) -> PoolId {
        self.pool
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/r{}", self.pool, self.index)
    }
}

/// Lifecycle of a request: `Pending -> Granted -> Released`, or
/// `Pending -> Cancelled`. A request is never both granted and cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Granted,
    Released,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The request was waiting and has left the queue.
    Withdrawn,
    /// The slot was already handed over; the caller holds it.
    AlreadyGranted,
    /// Released or cancelled earlier; nothing to do.
    Inactive,
}

/// A slot handed to a request that had been waiting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grant {
    pub request: RequestId,
    pub owner: ProcessId,
    pub queued_t: SimTime,
}

#[derive(Debug)]
struct Request {
    owner: ProcessId,
    queued_t: SimTime,
    state: RequestState,
}

/// `capacity` interchangeable servers with a FIFO wait queue.
///
/// `wait_queue` only ever holds pending requests, and `in_use` never exceeds
/// `capacity`.
#[derive(Debug)]
pub struct ResourcePool {
    pool_id: PoolId,
    capacity: usize,
    in_use: usize,
    wait_queue: VecDeque<RequestId>,
    /// Every request ever made, indexed by `RequestId::index`. Entries are
    /// never removed: a released or cancelled request stays as an inert
    /// record that holds no slot, and its id is never handed out again.
    requests: Vec<Request>,
}

impl ResourcePool {
    pub fn new(pool_id: PoolId, capacity: usize) -> Result<ResourcePool, DesError> {
        if capacity == 0 {
            return Err(DesError::InvalidCapacity(capacity));
        }
        Ok(ResourcePool {
            pool_id,
            capacity,
            in_use: 0,
            wait_queue: VecDeque::new(),
            requests: Vec::new(),
        })
    }

    pub fn id(&self) -> PoolId {
        self.pool_id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn queue_len(&self) -> usize {
        self.wait_queue.len()
    }

    pub fn is_at_capacity(&self) -> bool {
        self.in_use == self.capacity
    }

    /// Total requests ever made against this pool.
    pub fn total_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn state(&self, request: RequestId) -> Option<RequestState> {
        self.get(request).map(|r| r.state)
    }

    pub fn queued_time(&self, request: RequestId) -> Option<SimTime> {
        self.get(request).map(|r| r.queued_t)
    }

    /// Asks for a slot. Granted on the spot when one is free, otherwise
    /// queued behind every earlier request.
    pub fn request(&mut self, owner: ProcessId, now: SimTime) -> (RequestId, bool) {
        let id = RequestId {
            pool: self.pool_id,
            index: self.requests.len(),
        };
        let granted = self.in_use < self.capacity;
        let state = if granted {
            self.in_use += 1;
            RequestState::Granted
        } else {
            self.wait_queue.push_back(id);
            RequestState::Pending
        };
        self.requests.push(Request {
            owner,
            queued_t: now,
            state,
        });
        (id, granted)
    }

    /// Gives back the slot held by `request`. If anyone is waiting, the slot
    /// goes straight to the head of the queue and that grant is returned.
    pub fn release(&mut self, request: RequestId) -> Result<Option<Grant>, DesError> {
        match self.get_mut(request) {
            Some(r) if r.state == RequestState::Granted => r.state = RequestState::Released,
            _ => return Err(DesError::NotGranted(request)),
        }
        self.in_use -= 1;

        let Some(next) = self.wait_queue.pop_front() else {
            return Ok(None);
        };
        self.in_use += 1;
        let r = &mut self.requests[next.index];
        debug_assert_eq!(r.state, RequestState::Pending);
        r.state = RequestState::Granted;
        Ok(Some(Grant {
            request: next,
            owner: r.owner,
            queued_t: r.queued_t,
        }))
    }

    /// Withdraws a pending request. A request that has already been granted
    /// keeps its slot.
    pub fn cancel(&mut self, request: RequestId) -> CancelOutcome {
        let Some(r) = self.get_mut(request) else {
            return CancelOutcome::Inactive;
        };
        match r.state {
            RequestState::Pending => {
                r.state = RequestState::Cancelled;
                self.wait_queue.retain(|queued| *queued != request);
                CancelOutcome::Withdrawn
            }
            RequestState::Granted => CancelOutcome::AlreadyGranted,
            RequestState::Released | RequestState::Cancelled => CancelOutcome::Inactive,
        }
    }

    fn get(&self, request: RequestId) -> Option<&Request> {
        if request.pool != self.pool_id {
            return None;
        }
        self.requests.get(request.index)
    }

    fn get_mut(&mut self, request: RequestId) -> Option<&mut Request> {
        if request.pool != self.pool_id {
            return None;
        }
        self.requests.get_mut(request.index)
    }
}
