//! Timer abstraction driving the movement controller.

use std::time::Duration;

/// Shortest period a [`VirtualClock`] timer may repeat at.
pub const MIN_TIMER_PERIOD: Duration = Duration::from_millis(1);

/// Handle identifying a repeating timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Creates a timer handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Source of repeating tick signals.
///
/// Implementations deliver each firing back to the owner of the timer, who
/// forwards it to [`crate::MovementController::tick`]. Once `cancel` returns,
/// the timer must not fire again.
pub trait Scheduler {
    /// Starts a timer firing every `period`, first firing one period from now.
    fn schedule_repeating(&mut self, period: Duration) -> TimerId;

    /// Stops the timer. Cancelling an unknown or already cancelled timer is a no-op.
    fn cancel(&mut self, timer: TimerId);
}

/// Deterministic scheduler whose time only moves when [`VirtualClock::advance`] is called.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Duration,
    next_id: u64,
    timers: Vec<VirtualTimer>,
}

#[derive(Clone, Copy, Debug)]
struct VirtualTimer {
    id: TimerId,
    period: Duration,
    /// `None` once the next firing would lie beyond `Duration::MAX`.
    next_due: Option<Duration>,
}

impl VirtualClock {
    /// Creates a clock at time zero with no timers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the clock was created.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of timers that have not been cancelled.
    #[must_use]
    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    /// Fires the earliest timer due at or before `until`.
    ///
    /// The clock moves to the firing's due time, so a timer cancelled by the
    /// caller in response never fires again within the same stretch of time.
    /// Returns `None` once nothing is due by `until`; the clock is then left
    /// where it stands.
    pub fn pop_due(&mut self, until: Duration) -> Option<TimerId> {
        let timer = self
            .timers
            .iter_mut()
            .filter_map(|timer| timer.next_due.map(|due| (due, timer)))
            .filter(|(due, _)| *due <= until)
            .min_by_key(|(due, timer)| (*due, timer.id))
            .map(|(_, timer)| timer)?;

        let id = timer.id;
        let due = timer.next_due?;
        timer.next_due = due.checked_add(timer.period);
        self.now = self.now.max(due);
        Some(id)
    }

    /// Moves time forward to `until` and returns every firing that became due.
    ///
    /// Firings are ordered by due time, then by timer id. A timer that fires
    /// several times before `until` appears once per firing.
    pub fn advance_to(&mut self, until: Duration) -> Vec<TimerId> {
        let mut fired = Vec::new();
        while let Some(timer) = self.pop_due(until) {
            fired.push(timer);
        }

        self.now = self.now.max(until);
        fired
    }

    /// Moves time forward by `dt` and returns every firing that became due.
    pub fn advance(&mut self, dt: Duration) -> Vec<TimerId> {
        self.advance_to(self.now.saturating_add(dt))
    }

    /// Moves time forward to the next firing and returns the timers due at that instant.
    ///
    /// Returns an empty list when no timer will fire again.
    pub fn advance_to_next(&mut self) -> Vec<TimerId> {
        let Some(next_due) = self.timers.iter().filter_map(|timer| timer.next_due).min() else {
            return Vec::new();
        };

        self.advance_to(next_due)
    }
}

impl Scheduler for VirtualClock {
    fn schedule_repeating(&mut self, period: Duration) -> TimerId {
        let period = period.max(MIN_TIMER_PERIOD);
        let id = TimerId::new(self.next_id);
        self.next_id += 1;
        self.timers.push(VirtualTimer {
            id,
            period,
            next_due: self.now.checked_add(period),
        });
        id
    }

    fn cancel(&mut self, timer: TimerId) {
        self.timers.retain(|candidate| candidate.id != timer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timers_fire_once_per_elapsed_period() {
        let mut clock = VirtualClock::new();
        let timer = clock.schedule_repeating(Duration::from_millis(120));

        assert!(clock.advance(Duration::from_millis(119)).is_empty());
        assert_eq!(clock.advance(Duration::from_millis(1)), vec![timer]);
        assert_eq!(
            clock.advance(Duration::from_millis(240)),
            vec![timer, timer]
        );
        assert_eq!(clock.now(), Duration::from_millis(360));
    }

    #[test]
    fn firings_interleave_by_due_time() {
        let mut clock = VirtualClock::new();
        let slow = clock.schedule_repeating(Duration::from_millis(100));
        let fast = clock.schedule_repeating(Duration::from_millis(40));

        let fired = clock.advance(Duration::from_millis(200));

        assert_eq!(fired, vec![fast, fast, slow, fast, fast, slow, fast]);
    }

    #[test]
    fn equal_due_times_order_by_id() {
        let mut clock = VirtualClock::new();
        let first = clock.schedule_repeating(Duration::from_millis(50));
        let second = clock.schedule_repeating(Duration::from_millis(50));

        assert_eq!(
            clock.advance(Duration::from_millis(50)),
            vec![first, second]
        );
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut clock = VirtualClock::new();
        let timer = clock.schedule_repeating(Duration::from_millis(10));
        clock.cancel(timer);
        clock.cancel(timer);

        assert!(clock.advance(Duration::from_secs(1)).is_empty());
        assert_eq!(clock.active_timers(), 0);
    }

    #[test]
    fn zero_period_is_clamped() {
        let mut clock = VirtualClock::new();
        let timer = clock.schedule_repeating(Duration::ZERO);

        assert_eq!(clock.advance(Duration::from_millis(3)).len(), 3);
        clock.cancel(timer);
    }

    #[test]
    fn advance_to_next_jumps_to_the_earliest_timer() {
        let mut clock = VirtualClock::new();
        assert!(clock.advance_to_next().is_empty());

        let timer = clock.schedule_repeating(Duration::from_millis(120));
        assert_eq!(clock.advance_to_next(), vec![timer]);
        assert_eq!(clock.now(), Duration::from_millis(120));
    }

    #[test]
    fn timers_stop_firing_once_due_times_overflow() {
        let mut clock = VirtualClock::new();
        let timer = clock.schedule_repeating(Duration::from_millis(u64::MAX));

        let fired = clock.advance(Duration::MAX);

        assert_eq!(fired.len(), 1000);
        assert!(fired.iter().all(|fired| *fired == timer));
        assert_eq!(clock.now(), Duration::MAX);
        assert!(clock.advance(Duration::MAX).is_empty());
        assert!(clock.advance_to_next().is_empty());
    }

    #[test]
    fn period_beyond_the_horizon_never_fires() {
        let mut clock = VirtualClock::new();
        let _ = clock.advance(Duration::from_secs(1));
        let _ = clock.schedule_repeating(Duration::MAX);

        assert!(clock.advance(Duration::MAX).is_empty());
        assert_eq!(clock.active_timers(), 1);
    }

    #[test]
    fn pop_due_lets_cancellation_cut_a_batch_short() {
        let mut clock = VirtualClock::new();
        let timer = clock.schedule_repeating(Duration::from_millis(10));
        let until = Duration::from_secs(3600);

        assert_eq!(clock.pop_due(until), Some(timer));
        assert_eq!(clock.now(), Duration::from_millis(10));
        assert_eq!(clock.pop_due(until), Some(timer));
        clock.cancel(timer);

        assert_eq!(clock.pop_due(until), None);
        assert_eq!(clock.now(), Duration::from_millis(20));
    }
}
