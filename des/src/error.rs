//! Engine errors.
//!
//! Every variant is a programming or configuration defect. The engine never
//! recovers from one; it hands it back out of `EventLoop::run_until`.

use thiserror::Error;

use crate::{PoolId, RequestId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DesError {
    /// A timeout was asked for with a negative or non-finite duration.
    #[error("invalid duration: {0} (must be finite and non-negative)")]
    InvalidDuration(f64),

    /// A resource pool was created without any servers.
    #[error("invalid capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    /// `release` was called for a request that does not hold a slot.
    #[error("request {0} does not hold a slot")]
    NotGranted(RequestId),

    #[error("unknown resource pool {0}")]
    UnknownPool(PoolId),
}
