//! Waiting on the first of two events.
//!
//! A `Race` holds two wait handles. The process keeps it across
//! suspensions and feeds it every wakeup; once one side resolves, the other is
//! cancelled and the winner is handed back.
//!
//! Ties go to the first handle: if the second handle's wakeup arrives while
//! the first is already ready, the first still wins. Racing a resource
//! request (first) against a `Context::deadline` (second) therefore never
//! abandons a customer whose slot frees up at the instant patience runs out.

use crate::{CancelOutcome, Context, DesError, EventId, RequestId, SimTime, Wakeup};

/// Something a process can wait on and later give up on.
pub trait WaitHandle {
    /// Whether `wakeup` is the event this handle waits for.
    fn matches(&self, wakeup: &Wakeup) -> bool;

    /// Whether the condition already holds, even if its wakeup has not been
    /// delivered yet.
    fn is_ready<W>(&self, ctx: &Context<'_, W>) -> bool;

    /// Gives up on the condition after losing a race.
    fn cancel<W>(&self, ctx: &mut Context<'_, W>) -> Result<(), DesError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeoutHandle {
    event: EventId,
    at: SimTime,
}

impl TimeoutHandle {
    pub(crate) fn new(event: EventId, at: SimTime) -> TimeoutHandle {
        TimeoutHandle { event, at }
    }

    pub fn event(&self) -> EventId {
        self.event
    }

    /// When the timeout fires.
    pub fn at(&self) -> SimTime {
        self.at
    }
}

impl WaitHandle for TimeoutHandle {
    fn matches(&self, wakeup: &Wakeup) -> bool {
        *wakeup == Wakeup::Timeout(self.event)
    }

    fn is_ready<W>(&self, ctx: &Context<'_, W>) -> bool {
        ctx.now() >= self.at
    }

    fn cancel<W>(&self, ctx: &mut Context<'_, W>) -> Result<(), DesError> {
        ctx.cancel(self.event);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHandle {
    request: RequestId,
}

impl RequestHandle {
    pub(crate) fn new(request: RequestId) -> RequestHandle {
        RequestHandle { request }
    }

    pub fn request(&self) -> RequestId {
        self.request
    }
}

impl WaitHandle for RequestHandle {
    fn matches(&self, wakeup: &Wakeup) -> bool {
        *wakeup == Wakeup::Granted(self.request)
    }

    fn is_ready<W>(&self, ctx: &Context<'_, W>) -> bool {
        ctx.is_granted(self.request)
    }

    /// Withdraws the request. A slot that was granted in the meantime is
    /// handed straight back.
    fn cancel<W>(&self, ctx: &mut Context<'_, W>) -> Result<(), DesError> {
        match ctx.cancel_request(self.request)? {
            CancelOutcome::AlreadyGranted => ctx.release(self.request),
            CancelOutcome::Withdrawn | CancelOutcome::Inactive => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Race<A, B> {
    first: A,
    second: B,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<A, B> {
    First(A),
    Second(B),
    /// The wakeup belonged to neither handle; keep waiting.
    Pending(Race<A, B>),
}

/// Races `first` against `second`; `first` wins ties.
pub fn first_of<A, B>(first: A, second: B) -> Race<A, B>
where
    A: WaitHandle,
    B: WaitHandle,
{
    Race::new(first, second)
}

impl<A, B> Race<A, B>
where
    A: WaitHandle,
    B: WaitHandle,
{
    pub fn new(first: A, second: B) -> Race<A, B> {
        Race { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }

    /// Feeds one wakeup to the race, cancelling the loser if it settles.
    pub fn resolve<W>(
        self,
        wakeup: &Wakeup,
        ctx: &mut Context<'_, W>,
    ) -> Result<Resolution<A, B>, DesError> {
        if self.first.matches(wakeup) {
            self.second.cancel(ctx)?;
            return Ok(Resolution::First(self.first));
        }
        if self.second.matches(wakeup) {
            if self.first.is_ready(ctx) {
                self.second.cancel(ctx)?;
                return Ok(Resolution::First(self.first));
            }
            self.first.cancel(ctx)?;
            return Ok(Resolution::Second(self.second));
        }
        Ok(Resolution::Pending(self))
    }
}
