use std::collections::HashMap;
use std::fmt;

use tracing::{debug, trace};

pub mod error;
pub mod parallel;
pub mod race;
pub mod resource;
pub mod scheduler;
pub mod time;

pub use error::DesError;
pub use race::{Race, RequestHandle, Resolution, TimeoutHandle, WaitHandle, first_of};
pub use resource::{CancelOutcome, Grant, PoolId, RequestId, RequestState, ResourcePool};
pub use scheduler::{EventId, Priority, Scheduled, Scheduler};
pub use time::SimTime;

/// Identifies a process. Ids are handed out in spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u64);

impl ProcessId {
    pub(crate) fn new(id: u64) -> ProcessId {
        ProcessId(id)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Why a suspended process is being resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// First resumption after being spawned.
    Start,
    /// A timeout scheduled by this process fired.
    Timeout(EventId),
    /// A resource request made by this process was granted.
    Granted(RequestId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Suspended,
    Finished,
}

/// A suspendable unit of logic, written as an explicit state machine.
///
/// `resume` runs until the process has to wait, registers whatever it waits
/// on through the `Context`, and returns `Status::Suspended`. Returning
/// `Status::Finished` drops the process; later wakeups addressed to it are
/// discarded.
pub trait Process<W> {
    fn resume(&mut self, ctx: &mut Context<'_, W>, wakeup: Wakeup) -> Result<Status, DesError>;
}

type Processes<W> = HashMap<ProcessId, Box<dyn Process<W>>>;

/// What a resuming process may do during its turn.
pub struct Context<'a, W> {
    me: ProcessId,
    scheduler: &'a mut Scheduler,
    pools: &'a mut Vec<ResourcePool>,
    processes: &'a mut Processes<W>,
    next_process: &'a mut u64,
    world: &'a mut W,
}

impl<W> Context<'_, W> {
    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    /// The process being resumed.
    pub fn id(&self) -> ProcessId {
        self.me
    }

    pub fn world(&self) -> &W {
        &*self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut *self.world
    }

    /// Wakes this process `duration` minutes from now.
    pub fn timeout(&mut self, duration: f64) -> Result<TimeoutHandle, DesError> {
        self.schedule_timeout(duration, Priority::Normal)
    }

    /// Like `timeout`, but fires after everything else due at the same
    /// instant. Used for deadlines that should lose ties.
    pub fn deadline(&mut self, duration: f64) -> Result<TimeoutHandle, DesError> {
        self.schedule_timeout(duration, Priority::Late)
    }

    pub fn cancel(&mut self, event: EventId) -> bool {
        self.scheduler.cancel(event)
    }

    pub fn is_pending(&self, event: EventId) -> bool {
        self.scheduler.is_pending(event)
    }

    /// Starts another process at the current instant, after the events
    /// already due now. The caller does not wait for it.
    pub fn spawn<P>(&mut self, process: P) -> ProcessId
    where
        P: Process<W> + 'static,
    {
        spawn_into(
            self.scheduler,
            self.processes,
            self.next_process,
            Box::new(process),
        )
    }

    pub fn pool(&self, pool: PoolId) -> Result<&ResourcePool, DesError> {
        self.pools.get(pool.0).ok_or(DesError::UnknownPool(pool))
    }

    /// Asks `pool` for a slot. The grant, immediate or not, arrives as a
    /// `Wakeup::Granted` event.
    pub fn request(&mut self, pool: PoolId) -> Result<RequestHandle, DesError> {
        let now = self.now();
        let (request, granted) = pool_mut(self.pools, pool)?.request(self.me, now);
        if granted {
            self.scheduler
                .notify(Priority::Urgent, self.me, Wakeup::Granted(request));
        }
        trace!(t = %now, process = %self.me, %request, granted, "requested slot");
        Ok(RequestHandle::new(request))
    }

    /// Returns a slot, waking the next waiting process if there is one.
    pub fn release(&mut self, request: RequestId) -> Result<(), DesError> {
        let grant = pool_mut(self.pools, request.pool())?.release(request)?;
        if let Some(grant) = grant {
            trace!(
                t = %self.now(),
                from = %self.me,
                to = %grant.owner,
                request = %grant.request,
                "slot handed over"
            );
            self.scheduler
                .notify(Priority::Urgent, grant.owner, Wakeup::Granted(grant.request));
        }
        Ok(())
    }

    pub fn cancel_request(&mut self, request: RequestId) -> Result<CancelOutcome, DesError> {
        Ok(pool_mut(self.pools, request.pool())?.cancel(request))
    }

    pub fn is_granted(&self, request: RequestId) -> bool {
        self.pools
            .get(request.pool().0)
            .and_then(|pool| pool.state(request))
            == Some(RequestState::Granted)
    }

    fn schedule_timeout(
        &mut self,
        duration: f64,
        priority: Priority,
    ) -> Result<TimeoutHandle, DesError> {
        let event = self.scheduler.schedule_after(duration, priority, self.me)?;
        Ok(TimeoutHandle::new(event, self.now().after(duration)))
    }
}

fn pool_mut(pools: &mut [ResourcePool], pool: PoolId) -> Result<&mut ResourcePool, DesError> {
    pools.get_mut(pool.0).ok_or(DesError::UnknownPool(pool))
}

fn spawn_into<W>(
    scheduler: &mut Scheduler,
    processes: &mut Processes<W>,
    next_process: &mut u64,
    process: Box<dyn Process<W>>,
) -> ProcessId {
    let id = ProcessId(*next_process);
    *next_process += 1;
    processes.insert(id, process);
    scheduler.notify(Priority::Normal, id, Wakeup::Start);
    id
}

/// Runs processes against one shared world `W` in simulated time order.
///
/// Single threaded: exactly one process runs at a time and only yields by
/// returning from `resume`.
pub struct EventLoop<W> {
    scheduler: Scheduler,
    pools: Vec<ResourcePool>,
    processes: Processes<W>,
    next_process: u64,
    world: W,
}

impl<W> EventLoop<W> {
    pub fn new(world: W) -> EventLoop<W> {
        EventLoop {
            scheduler: Scheduler::new(),
            pools: Vec::new(),
            processes: HashMap::new(),
            next_process: 0,
            world,
        }
    }

    pub fn add_pool(&mut self, capacity: usize) -> Result<PoolId, DesError> {
        let id = PoolId(self.pools.len());
        self.pools.push(ResourcePool::new(id, capacity)?);
        Ok(id)
    }

    pub fn pool(&self, pool: PoolId) -> Result<&ResourcePool, DesError> {
        self.pools.get(pool.0).ok_or(DesError::UnknownPool(pool))
    }

    pub fn spawn<P>(&mut self, process: P) -> ProcessId
    where
        P: Process<W> + 'static,
    {
        spawn_into(
            &mut self.scheduler,
            &mut self.processes,
            &mut self.next_process,
            Box::new(process),
        )
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    /// Processes that have not finished.
    pub fn live_processes(&self) -> usize {
        self.processes.len()
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn into_world(self) -> W {
        self.world
    }

    /// Resumes processes in `(time, priority, insertion)` order until nothing
    /// is due at or before `horizon`.
    ///
    /// Processes still waiting at the horizon are left where they are.
    pub fn run_until(&mut self, horizon: f64) -> Result<(), DesError> {
        let horizon = SimTime::new(horizon);
        let mut resumptions = 0usize;
        while let Some(event) = self.scheduler.pop_until(horizon) {
            let Some(mut process) = self.processes.remove(&event.target) else {
                trace!(
                    t = %event.t,
                    process = %event.target,
                    "wakeup for finished process dropped"
                );
                continue;
            };
            trace!(t = %event.t, process = %event.target, wakeup = ?event.wakeup, "resume");
            resumptions += 1;

            let mut ctx = Context {
                me: event.target,
                scheduler: &mut self.scheduler,
                pools: &mut self.pools,
                processes: &mut self.processes,
                next_process: &mut self.next_process,
                world: &mut self.world,
            };
            match process.resume(&mut ctx, event.wakeup)? {
                Status::Suspended => {
                    self.processes.insert(event.target, process);
                }
                Status::Finished => {
                    trace!(t = %event.t, process = %event.target, "finished");
                }
            }
        }
        debug!(
            horizon = %horizon,
            clock = %self.scheduler.now(),
            resumptions,
            live = self.processes.len(),
            "run stopped"
        );
        Ok(())
    }
}
