//! Time budgets reported by the host for one scheduling slice.

use std::time::{Duration, Instant};

/// Remaining time in the current slice.
///
/// Queried once after every completed unit of work; the engine yields when
/// the answer drops below `EngineConfig::yield_threshold`.
pub trait TimeBudget {
    fn time_remaining(&mut self) -> Duration;
}

impl<F> TimeBudget for F
where
    F: FnMut() -> Duration,
{
    fn time_remaining(&mut self) -> Duration {
        self()
    }
}

/// Wall-clock deadline.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    end: Instant,
}

impl Deadline {
    pub fn at(end: Instant) -> Self {
        Self { end }
    }

    /// Deadline `slice` from now. Slices too large to represent saturate to
    /// one day.
    pub fn after(slice: Duration) -> Self {
        let now = Instant::now();
        let end = now
            .checked_add(slice)
            .unwrap_or(now + Duration::from_secs(24 * 60 * 60));
        Self { end }
    }
}

impl TimeBudget for Deadline {
    fn time_remaining(&mut self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }
}

/// Never runs out; a tick under this budget runs the render to completion.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl TimeBudget for Unbounded {
    fn time_remaining(&mut self) -> Duration {
        Duration::MAX
    }
}

/// Deterministic budget that lasts for a fixed number of units.
///
/// Each query consumes one unit; once the count reaches zero the budget
/// reports no time left.
#[derive(Clone, Copy, Debug)]
pub struct UnitBudget {
    units: usize,
}

impl UnitBudget {
    pub fn new(units: usize) -> Self {
        Self { units }
    }
}

impl TimeBudget for UnitBudget {
    fn time_remaining(&mut self) -> Duration {
        self.units = self.units.saturating_sub(1);
        if self.units == 0 {
            Duration::ZERO
        } else {
            Duration::MAX
        }
    }
}
