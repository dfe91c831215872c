use des::{Context, DesError, PoolId, Process, Status, TimeoutHandle, WaitHandle, Wakeup};
use tracing::trace;

use crate::{Customer, Shop, Variates};

/// Spawns customers at exponential gaps until the shop closes.
///
/// Never waits on the customers it spawns.
#[derive(Debug)]
pub struct ArrivalGenerator {
    counter: PoolId,
    spawned: usize,
    next: Option<TimeoutHandle>,
}

impl ArrivalGenerator {
    pub fn new(counter: PoolId) -> ArrivalGenerator {
        ArrivalGenerator {
            counter,
            spawned: 0,
            next: None,
        }
    }
}

impl<V: Variates> Process<Shop<V>> for ArrivalGenerator {
    fn resume(
        &mut self,
        ctx: &mut Context<'_, Shop<V>>,
        wakeup: Wakeup,
    ) -> Result<Status, DesError> {
        match self.next {
            None => {}
            Some(gap) if gap.matches(&wakeup) => {
                self.spawned += 1;
                ctx.world_mut().stats.record_arrival();
                let process = ctx.spawn(Customer::new(self.spawned, self.counter));
                trace!(customer = self.spawned, %process, t = %ctx.now(), "arrived");
            }
            Some(_) => return Ok(Status::Suspended),
        }

        let arrival_rate = ctx.world().params.arrival_rate;
        let gap = ctx.world_mut().variates.exponential(arrival_rate);
        self.next = Some(ctx.timeout(gap)?);
        Ok(Status::Suspended)
    }
}
