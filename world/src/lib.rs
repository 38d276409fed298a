#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Tilewalk.

mod navigation;

use log::debug;
use tilewalk_core::{
    CellCoord, Command, Direction, Event, GridSize, PlacementError, TileGeometry,
    WALK_FRAME_COUNT,
};

pub use navigation::DistanceField;

/// Represents the authoritative Tilewalk world state.
#[derive(Debug)]
pub struct World {
    grid: GridSize,
    geometry: TileGeometry,
    collision: CollisionLayer,
    mover: Mover,
}

impl World {
    /// Creates a new obstacle-free world with the mover resting at the origin.
    #[must_use]
    pub fn new() -> Self {
        let grid = GridSize::default();
        Self {
            grid,
            geometry: TileGeometry::default(),
            collision: CollisionLayer::new(grid),
            mover: Mover::at(CellCoord::new(0, 0)),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { size, tile_length } => {
            // An empty grid has no cell for the mover to stand on.
            let Some(cell) = size.clamp(world.mover.cell) else {
                debug!("ignoring empty grid {size:?}");
                return;
            };
            world.grid = size;
            world.geometry = TileGeometry::new(tile_length);
            world.collision = CollisionLayer::new(size);
            world.mover.cell = cell;
            world.mover.frame = 0;
            out_events.push(Event::GridConfigured { size });
        }
        Command::SetBlocked { cell, blocked } => {
            if world.collision.set(cell, blocked) {
                out_events.push(Event::CellBlockChanged { cell, blocked });
            }
        }
        Command::PlaceMover { cell } => {
            if !world.grid.contains(cell) {
                out_events.push(Event::MoverPlacementRejected {
                    cell,
                    reason: PlacementError::OutOfBounds,
                });
                return;
            }

            if world.collision.is_blocked(cell) {
                out_events.push(Event::MoverPlacementRejected {
                    cell,
                    reason: PlacementError::Blocked,
                });
                return;
            }

            world.mover.cell = cell;
            world.mover.frame = 0;
            out_events.push(Event::MoverPlaced { cell });
        }
        Command::StepMover { direction } => {
            let from = world.mover.cell;
            world.mover.facing = direction;

            let destination = direction
                .step_from(from, world.grid)
                .filter(|cell| !world.collision.is_blocked(*cell));
            let Some(to) = destination else {
                debug!("step {direction:?} from {from:?} blocked");
                out_events.push(Event::MoverBlocked {
                    direction,
                    cell: from,
                });
                return;
            };

            let frame = world.mover.advance(direction, to);
            out_events.push(Event::MoverAdvanced {
                direction,
                from,
                to,
                frame,
            });
        }
        Command::AdvanceMover { direction, to } => {
            let from = world.mover.cell;
            let frame = world.mover.advance(direction, to);
            out_events.push(Event::MoverAdvanced {
                direction,
                from,
                to,
                frame,
            });
        }
        Command::SettleMover => {
            world.mover.frame = 0;
            out_events.push(Event::MoverSettled {
                cell: world.mover.cell,
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{navigation::DistanceField, World};
    use tilewalk_core::{CellCoord, GridSize, MoverSnapshot, TileGeometry};

    /// Provides the dimensions of the world's grid.
    #[must_use]
    pub fn grid_size(world: &World) -> GridSize {
        world.grid
    }

    /// Provides the conversion between cells and world units.
    #[must_use]
    pub fn tile_geometry(world: &World) -> TileGeometry {
        world.geometry
    }

    /// Reports whether the cell is impassable. Cells outside the grid count as blocked.
    #[must_use]
    pub fn is_blocked(world: &World, cell: CellCoord) -> bool {
        world.collision.is_blocked(cell)
    }

    /// Captures the mover's current state.
    #[must_use]
    pub fn mover(world: &World) -> MoverSnapshot {
        MoverSnapshot {
            cell: world.mover.cell,
            facing: world.mover.facing,
            frame: world.mover.frame,
        }
    }

    /// Exposes a read-only view of the collision layer.
    #[must_use]
    pub fn collision_view(world: &World) -> CollisionView<'_> {
        CollisionView {
            layer: &world.collision,
        }
    }

    /// Breadth-first step distances from `origin` across open cells.
    #[must_use]
    pub fn distance_field(world: &World, origin: CellCoord) -> DistanceField {
        let mut field = DistanceField::default();
        field.rebuild_with(world.grid, origin, |cell| world.collision.is_blocked(cell));
        field
    }

    /// Read-only view into the dense collision layer.
    #[derive(Clone, Copy, Debug)]
    pub struct CollisionView<'a> {
        layer: &'a super::CollisionLayer,
    }

    impl<'a> CollisionView<'a> {
        /// Reports whether the cell is impassable.
        #[must_use]
        pub fn is_blocked(&self, cell: CellCoord) -> bool {
            self.layer.is_blocked(cell)
        }

        /// Iterates over every blocked cell in row-major order.
        pub fn blocked_cells(&self) -> impl Iterator<Item = CellCoord> + 'a {
            let layer = self.layer;
            let columns = layer.size.columns().max(1);
            layer
                .cells
                .iter()
                .enumerate()
                .filter(|(_, blocked)| **blocked)
                .filter_map(move |(index, _)| {
                    let index = u32::try_from(index).ok()?;
                    Some(CellCoord::new(index % columns, index / columns))
                })
        }

        /// Provides the dimensions of the underlying layer.
        #[must_use]
        pub fn dimensions(&self) -> GridSize {
            self.layer.size
        }
    }
}

#[derive(Clone, Debug)]
struct Mover {
    cell: CellCoord,
    facing: Direction,
    frame: u8,
}

impl Mover {
    fn at(cell: CellCoord) -> Self {
        Self {
            cell,
            facing: Direction::South,
            frame: 0,
        }
    }

    fn advance(&mut self, direction: Direction, to: CellCoord) -> u8 {
        self.frame = (self.frame + 1) % WALK_FRAME_COUNT;
        self.facing = direction;
        self.cell = to;
        self.frame
    }
}

#[derive(Clone, Debug)]
struct CollisionLayer {
    size: GridSize,
    cells: Vec<bool>,
}

impl CollisionLayer {
    fn new(size: GridSize) -> Self {
        Self {
            size,
            cells: vec![false; size.cell_count()],
        }
    }

    fn is_blocked(&self, cell: CellCoord) -> bool {
        self.size
            .index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(true)
    }

    fn set(&mut self, cell: CellCoord, blocked: bool) -> bool {
        let Some(slot) = self
            .size
            .index(cell)
            .and_then(|index| self.cells.get_mut(index))
        else {
            return false;
        };

        if *slot == blocked {
            return false;
        }

        *slot = blocked;
        true
    }
}
