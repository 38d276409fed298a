use std::{str::FromStr, time::Duration};

use log::info;
use thiserror::Error;
use tilewalk_core::{CellCoord, Command, Direction, Event, MoverSnapshot};
use tilewalk_system_movement::{
    MoveRequest, MovementController, TickOutcome, TimerId, VirtualClock,
};
use tilewalk_system_pathfinding::{NoPath, PathFinder};
use tilewalk_world::{self as world, query, World};

use crate::{map_layout::MapLayout, settings::Settings};

/// Scripted input replayed by the session, in command-line order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    /// Script call asking the mover to walk to a cell.
    MoveTo(CellCoord),
    /// Lets the given number of tick intervals elapse.
    Wait(u32),
    /// Keyboard press stepping the mover one cell.
    Key(Direction),
}

/// Errors produced while parsing an [`Action`].
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ActionParseError {
    /// The action lacked the `kind:argument` shape.
    #[error("expected `to:COLUMN,ROW`, `wait:TICKS` or `key:DIRECTION`, got `{0}`")]
    Malformed(String),
    /// The target cell could not be parsed.
    #[error("invalid cell `{0}`, expected COLUMN,ROW")]
    InvalidCell(String),
    /// The tick count could not be parsed.
    #[error("invalid tick count `{0}`")]
    InvalidTicks(String),
    /// The direction name was not recognised.
    #[error("unknown direction `{0}`")]
    UnknownDirection(String),
}

impl FromStr for Action {
    type Err = ActionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, argument) = value
            .split_once(':')
            .ok_or_else(|| ActionParseError::Malformed(value.to_owned()))?;

        match kind.trim().to_ascii_lowercase().as_str() {
            "to" => parse_cell(argument).map(Action::MoveTo),
            "wait" => argument
                .trim()
                .parse()
                .map(Action::Wait)
                .map_err(|_| ActionParseError::InvalidTicks(argument.to_owned())),
            "key" => parse_direction(argument).map(Action::Key),
            _ => Err(ActionParseError::Malformed(value.to_owned())),
        }
    }
}

fn parse_cell(value: &str) -> Result<CellCoord, ActionParseError> {
    let invalid = || ActionParseError::InvalidCell(value.to_owned());
    let (column, row) = value.split_once(',').ok_or_else(invalid)?;
    let column = column.trim().parse().map_err(|_| invalid())?;
    let row = row.trim().parse().map_err(|_| invalid())?;
    Ok(CellCoord::new(column, row))
}

fn parse_direction(value: &str) -> Result<Direction, ActionParseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "n" | "north" | "up" => Ok(Direction::North),
        "e" | "east" | "right" => Ok(Direction::East),
        "s" | "south" | "down" => Ok(Direction::South),
        "w" | "west" | "left" => Ok(Direction::West),
        _ => Err(ActionParseError::UnknownDirection(value.to_owned())),
    }
}

/// Observable happenings of a session, in the order they occurred.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Record {
    /// A scripted move request and how the controller answered it.
    Request {
        /// Requested destination.
        target: CellCoord,
        /// Controller answer.
        outcome: MoveRequest,
        /// Breadth-first distance to the target when the search ran out of budget.
        shortest: Option<u32>,
    },
    /// A scripted move was cut short by keyboard input.
    Interrupted {
        /// Virtual time of the interruption.
        at: Duration,
    },
    /// A world event.
    Event {
        /// Virtual time at which the event was emitted.
        at: Duration,
        /// Event broadcast by the world.
        event: Event,
    },
}

/// World, virtual clock and movement controller wired together.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    clock: VirtualClock,
    controller: MovementController,
    tick_interval: Duration,
}

impl Session {
    /// Builds a world from the layout and an idle controller from the settings.
    pub(crate) fn new(layout: &MapLayout, settings: &Settings) -> Self {
        let mut world = World::new();
        let mut events = Vec::new();
        for command in layout.commands() {
            world::apply(&mut world, command, &mut events);
        }

        Self {
            world,
            clock: VirtualClock::new(),
            controller: MovementController::new(
                settings.movement,
                PathFinder::new(settings.search),
            ),
            tick_interval: settings.movement.tick_interval,
        }
    }

    /// Current state of the mover.
    pub(crate) fn mover(&self) -> MoverSnapshot {
        query::mover(&self.world)
    }

    /// World-space origin of the mover's tile.
    pub(crate) fn mover_origin(&self) -> (f32, f32) {
        query::tile_geometry(&self.world).origin_of(query::mover(&self.world).cell)
    }

    /// Virtual time elapsed since the session started.
    pub(crate) fn elapsed(&self) -> Duration {
        self.clock.now()
    }

    /// Replays one action, appending what happened to `out`.
    pub(crate) fn perform(&mut self, action: Action, out: &mut Vec<Record>) {
        match action {
            Action::MoveTo(target) => self.request_move(target, out),
            Action::Wait(ticks) => {
                let until = self
                    .clock
                    .now()
                    .saturating_add(self.tick_interval.saturating_mul(ticks));
                while let Some(timer) = self.clock.pop_due(until) {
                    self.deliver(timer, out);
                }
                for timer in self.clock.advance_to(until) {
                    self.deliver(timer, out);
                }
            }
            Action::Key(direction) => {
                if self.controller.stop(&mut self.clock) {
                    info!("keyboard input interrupted the scripted move");
                    out.push(Record::Interrupted {
                        at: self.clock.now(),
                    });
                }
                self.apply(Command::StepMover { direction }, out);
            }
        }
    }

    /// Delivers ticks until the controller is idle.
    pub(crate) fn finish(&mut self, out: &mut Vec<Record>) {
        while self.controller.is_moving() {
            let Some(timer) = self.clock.pop_due(Duration::MAX) else {
                break;
            };
            self.deliver(timer, out);
        }
    }

    fn request_move(&mut self, target: CellCoord, out: &mut Vec<Record>) {
        let grid = query::grid_size(&self.world);
        let mover = query::mover(&self.world).cell;
        let world = &self.world;
        let outcome = self
            .controller
            .move_to(&mut self.clock, mover, target, grid, |cell| {
                query::is_blocked(world, cell)
            });

        let shortest = match outcome {
            MoveRequest::Unreachable(NoPath::IterationCap { .. }) => {
                let field = query::distance_field(&self.world, mover);
                let shortest = field.distance(target);
                info!("breadth-first distance to {target:?} is {shortest:?}");
                shortest
            }
            _ => None,
        };

        out.push(Record::Request {
            target,
            outcome,
            shortest,
        });
    }

    fn deliver(&mut self, timer: TimerId, out: &mut Vec<Record>) {
        let mover = query::mover(&self.world).cell;
        let mut commands = Vec::new();
        if self
            .controller
            .tick(&mut self.clock, timer, mover, &mut commands)
            == TickOutcome::Stale
        {
            return;
        }

        for command in commands {
            self.apply(command, out);
        }
    }

    fn apply(&mut self, command: Command, out: &mut Vec<Record>) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        let at = self.clock.now();
        out.extend(events.into_iter().map(|event| Record::Event { at, event }));
    }
}
