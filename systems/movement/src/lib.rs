#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Script-driven movement: plans a route once, then replays it one cell per tick.
//!
//! The controller never touches the world. Each tick it emits a
//! [`Command::AdvanceMover`] for the host to apply, and once the route is
//! exhausted it emits [`Command::SettleMover`]. Time is supplied through the
//! [`Scheduler`] trait so hosts and tests decide how ticks are delivered.

mod scheduler;

use std::time::Duration;

use log::{debug, info, warn};
use tilewalk_core::{CellCoord, Command, Direction, GridSize};
use tilewalk_system_pathfinding::{NoPath, Path, PathFinder};

pub use scheduler::{Scheduler, TimerId, VirtualClock, MIN_TIMER_PERIOD};

/// Cadence at which a planned route is replayed.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(120);

/// Behaviour of a move request issued while another move is in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConcurrentMovePolicy {
    /// Drop the new request and keep walking the current route.
    #[default]
    Ignore,
    /// Plan the new request and, if it yields a route, abandon the current one.
    Supersede,
}

/// Tunables for the movement controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovementConfig {
    /// Interval between successive steps.
    pub tick_interval: Duration,
    /// Handling of requests that arrive while moving.
    pub concurrent_moves: ConcurrentMovePolicy,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            concurrent_moves: ConcurrentMovePolicy::default(),
        }
    }
}

/// Observable result of [`MovementController::move_to`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveRequest {
    /// A route was found and the step timer started.
    Started {
        /// Number of ticks that will advance the mover.
        steps: usize,
    },
    /// The mover already stands on the target; nothing was scheduled.
    AlreadyThere,
    /// Another move is in flight and the request was dropped.
    Ignored,
    /// No route exists; controller state is unchanged.
    Unreachable(NoPath),
}

/// Observable result of [`MovementController::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The mover was sent one cell further along the route.
    Advanced {
        /// Facing for the step.
        direction: Direction,
        /// Cell entered by the step.
        to: CellCoord,
    },
    /// The route was exhausted; the timer is cancelled and the mover settles.
    Finished,
    /// The tick belongs to a timer that is no longer active and was discarded.
    Stale,
}

#[derive(Debug)]
struct ActiveMove {
    path: Path,
    timer: TimerId,
}

/// Replays pathfinder routes one cell per scheduler tick.
///
/// The controller is either idle or walking exactly one route. A route is
/// computed once per request and never re-validated, so obstacles appearing
/// after planning are walked through.
#[derive(Debug, Default)]
pub struct MovementController {
    config: MovementConfig,
    finder: PathFinder,
    active: Option<ActiveMove>,
}

impl MovementController {
    /// Creates an idle controller.
    #[must_use]
    pub fn new(config: MovementConfig, finder: PathFinder) -> Self {
        Self {
            config,
            finder,
            active: None,
        }
    }

    /// Reports whether a route is currently being replayed.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.active.is_some()
    }

    /// Number of cells left on the active route.
    #[must_use]
    pub fn remaining_steps(&self) -> usize {
        self.active.as_ref().map_or(0, |active| active.path.len())
    }

    /// Timer driving the active route, if any.
    #[must_use]
    pub fn active_timer(&self) -> Option<TimerId> {
        self.active.as_ref().map(|active| active.timer)
    }

    /// Plans a route from `mover` to `target` and starts replaying it.
    pub fn move_to<S, F>(
        &mut self,
        scheduler: &mut S,
        mover: CellCoord,
        target: CellCoord,
        grid: GridSize,
        is_blocked: F,
    ) -> MoveRequest
    where
        S: Scheduler + ?Sized,
        F: FnMut(CellCoord) -> bool,
    {
        if self.is_moving() && self.config.concurrent_moves == ConcurrentMovePolicy::Ignore {
            warn!("move to {target:?} ignored: a move is already in progress");
            return MoveRequest::Ignored;
        }

        let path = match self.finder.find_path(mover, target, grid, is_blocked) {
            Ok(path) => path,
            Err(reason) => {
                info!("move to {target:?} dropped: {reason}");
                return MoveRequest::Unreachable(reason);
            }
        };

        if self.stop(scheduler) {
            debug!("superseded active move with a move to {target:?}");
        }

        if path.is_empty() {
            return MoveRequest::AlreadyThere;
        }

        let steps = path.len();
        let timer = scheduler.schedule_repeating(self.config.tick_interval);
        self.active = Some(ActiveMove { path, timer });
        debug!("moving to {target:?} in {steps} steps on timer {}", timer.get());

        MoveRequest::Started { steps }
    }

    /// Handles one firing of `timer`, the mover standing on `mover`.
    ///
    /// Commands for the world are appended to `out`.
    pub fn tick<S>(
        &mut self,
        scheduler: &mut S,
        timer: TimerId,
        mover: CellCoord,
        out: &mut Vec<Command>,
    ) -> TickOutcome
    where
        S: Scheduler + ?Sized,
    {
        let Some(active) = self.active.as_mut().filter(|active| active.timer == timer) else {
            return TickOutcome::Stale;
        };

        let Some(next) = active.path.pop_next() else {
            let _ = self.stop(scheduler);
            out.push(Command::SettleMover);
            info!("arrived at {mover:?}");
            return TickOutcome::Finished;
        };

        // Consecutive route cells are distinct, so a direction always exists
        // unless the mover was teleported onto the next cell.
        let direction = Direction::between(mover, next).unwrap_or(Direction::South);
        out.push(Command::AdvanceMover {
            direction,
            to: next,
        });

        TickOutcome::Advanced {
            direction,
            to: next,
        }
    }

    /// Cancels the active route, leaving the mover where it stands.
    ///
    /// Returns whether a route was cancelled. Calling it while idle is a no-op.
    pub fn stop<S>(&mut self, scheduler: &mut S) -> bool
    where
        S: Scheduler + ?Sized,
    {
        let Some(active) = self.active.take() else {
            return false;
        };

        scheduler.cancel(active.timer);
        true
    }
}
