//! The customer's path through the shop.

use des::{
    Context, DesError, PoolId, Process, Race, RequestHandle, RequestId, Resolution, SimTime,
    Status, TimeoutHandle, WaitHandle, Wakeup, first_of,
};
use tracing::trace;

use crate::{Shop, Variates};

#[derive(Debug)]
enum Phase {
    Arrived,
    /// Waiting for a worker or for patience to run out.
    Racing(Race<RequestHandle, TimeoutHandle>),
    Served {
        worker: RequestId,
        done: TimeoutHandle,
        wait_time: f64,
        service_time: f64,
    },
}

/// One customer: `Arrived -> Racing -> Served -> departed`, or
/// `Racing -> abandoned`.
///
/// A customer still racing or being served when the shop closes is recorded
/// as neither served nor lost.
#[derive(Debug)]
pub struct Customer {
    number: usize,
    counter: PoolId,
    arrival_t: SimTime,
    patience: f64,
    phase: Option<Phase>,
}

impl Customer {
    pub fn new(number: usize, counter: PoolId) -> Customer {
        Customer {
            number,
            counter,
            arrival_t: SimTime::ZERO,
            patience: 0.0,
            phase: Some(Phase::Arrived),
        }
    }

    fn arrive<V: Variates>(&mut self, ctx: &mut Context<'_, Shop<V>>) -> Result<Phase, DesError> {
        self.arrival_t = ctx.now();
        let patience_max = ctx.world().params.patience_max;
        self.patience = ctx.world_mut().variates.uniform(1.0, patience_max);

        let worker = ctx.request(self.counter)?;
        let deadline = ctx.deadline(self.patience)?;
        Ok(Phase::Racing(first_of(worker, deadline)))
    }

    fn start_service<V: Variates>(
        &mut self,
        ctx: &mut Context<'_, Shop<V>>,
        worker: RequestHandle,
    ) -> Result<Phase, DesError> {
        let wait_time = ctx.now().since(self.arrival_t);
        let service_rate = ctx.world().params.service_rate;
        let service_time = ctx.world_mut().variates.exponential(service_rate);
        let done = ctx.timeout(service_time)?;
        trace!(customer = self.number, t = %ctx.now(), wait_time, "served");
        Ok(Phase::Served {
            worker: worker.request(),
            done,
            wait_time,
            service_time,
        })
    }
}

impl<V: Variates> Process<Shop<V>> for Customer {
    fn resume(
        &mut self,
        ctx: &mut Context<'_, Shop<V>>,
        wakeup: Wakeup,
    ) -> Result<Status, DesError> {
        let Some(phase) = self.phase.take() else {
            return Ok(Status::Finished);
        };

        let next = match phase {
            Phase::Arrived => self.arrive(ctx)?,
            Phase::Racing(race) => match race.resolve(&wakeup, ctx)? {
                Resolution::First(worker) => self.start_service(ctx, worker)?,
                Resolution::Second(_) => {
                    ctx.world_mut().stats.record_lost();
                    trace!(
                        customer = self.number,
                        t = %ctx.now(),
                        patience = self.patience,
                        "abandoned"
                    );
                    return Ok(Status::Finished);
                }
                Resolution::Pending(race) => Phase::Racing(race),
            },
            Phase::Served {
                worker,
                done,
                wait_time,
                service_time,
            } if done.matches(&wakeup) => {
                ctx.world_mut().stats.record_served(wait_time, service_time);
                ctx.release(worker)?;
                trace!(customer = self.number, t = %ctx.now(), "departed");
                return Ok(Status::Finished);
            }
            phase => phase,
        };

        self.phase = Some(next);
        Ok(Status::Suspended)
    }
}
