use std::cmp::Ordering;
use std::fmt;

use crate::DesError;

/// A point on the simulated clock, in minutes.
///
/// Wraps `f64` so that it can key the pending event set; ordering uses
/// `f64::total_cmp`, which makes it a total order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimTime(f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    pub fn new(minutes: f64) -> SimTime {
        SimTime(minutes)
    }

    pub fn as_minutes(self) -> f64 {
        self.0
    }

    /// The instant `duration` minutes after this one.
    pub fn after(self, duration: f64) -> SimTime {
        SimTime(self.0 + duration)
    }

    /// Minutes elapsed since `earlier`.
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Rejects negative, NaN and infinite durations.
pub(crate) fn check_duration(duration: f64) -> Result<f64, DesError> {
    if duration.is_finite() && duration >= 0.0 {
        Ok(duration)
    } else {
        Err(DesError::InvalidDuration(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_minutes() {
        assert!(SimTime::new(1.0) < SimTime::new(1.5));
        assert_eq!(SimTime::new(2.0).after(0.5), SimTime::new(2.5));
        assert_eq!(SimTime::new(7.0).since(SimTime::new(2.0)), 5.0);
    }

    #[test]
    fn rejects_bad_durations() {
        assert_eq!(check_duration(0.0), Ok(0.0));
        assert_eq!(check_duration(-1.0), Err(DesError::InvalidDuration(-1.0)));
        assert!(check_duration(f64::NAN).is_err());
        assert!(check_duration(f64::INFINITY).is_err());
    }
}
