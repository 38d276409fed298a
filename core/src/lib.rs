#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tilewalk engine.
//!
//! This crate defines the message surface that connects hosts, the
//! authoritative world, and pure systems. Hosts and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! that the rendering collaborator replays. Systems never mutate the world
//! directly; they read snapshots and respond with new commands.

use serde::{Deserialize, Serialize};

/// Number of tile columns in a freshly created world.
pub const DEFAULT_GRID_COLUMNS: u32 = 60;
/// Number of tile rows in a freshly created world.
pub const DEFAULT_GRID_ROWS: u32 = 60;
/// Edge length of a single square tile expressed in world units.
pub const DEFAULT_TILE_LENGTH: f32 = 24.0;
/// Number of distinct walking animation frames the mover cycles through.
pub const WALK_FRAME_COUNT: u8 = 9;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the world's grid with a fresh, obstacle-free grid. Grids with
    /// zero columns or rows are ignored.
    ConfigureGrid {
        /// Dimensions of the new grid measured in tiles.
        size: GridSize,
        /// Length of each square tile measured in world units.
        tile_length: f32,
    },
    /// Marks a single cell as impassable or clears it again.
    SetBlocked {
        /// Cell whose collision flag changes.
        cell: CellCoord,
        /// Whether the cell should block movement.
        blocked: bool,
    },
    /// Teleports the mover onto the provided cell.
    PlaceMover {
        /// Destination cell of the placement.
        cell: CellCoord,
    },
    /// Requests a single collision-checked step, as issued by keyboard input.
    StepMover {
        /// Direction of travel for the attempted step.
        direction: Direction,
    },
    /// Advances the mover along a previously planned path.
    ///
    /// Path replay is not re-validated against the collision layer.
    AdvanceMover {
        /// Facing derived from the mover's cell and the destination.
        direction: Direction,
        /// Cell the mover occupies after the step.
        to: CellCoord,
    },
    /// Returns the mover to its idle animation frame once a path is exhausted.
    SettleMover,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the grid was replaced.
    GridConfigured {
        /// Dimensions of the new grid.
        size: GridSize,
    },
    /// Reports that a cell's collision flag changed.
    CellBlockChanged {
        /// Cell whose flag changed.
        cell: CellCoord,
        /// New value of the flag.
        blocked: bool,
    },
    /// Confirms that the mover was teleported.
    MoverPlaced {
        /// Cell the mover occupies after the placement.
        cell: CellCoord,
    },
    /// Reports that a placement request was rejected.
    MoverPlacementRejected {
        /// Cell requested by the placement.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that the mover moved between two neighbouring cells.
    MoverAdvanced {
        /// Direction the mover faces after the step.
        direction: Direction,
        /// Cell the mover occupied before moving.
        from: CellCoord,
        /// Cell the mover occupies after moving.
        to: CellCoord,
        /// Walking animation frame shown after the step.
        frame: u8,
    },
    /// Reports that a keyboard step ran into an obstacle or the grid edge.
    MoverBlocked {
        /// Direction of the rejected step. The mover still turns to face it.
        direction: Direction,
        /// Cell the mover remains on.
        cell: CellCoord,
    },
    /// Announces that the mover came to rest on its idle frame.
    MoverSettled {
        /// Cell the mover rests on.
        cell: CellCoord,
    },
}

/// Cardinal movement directions available to the mover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All directions in the order neighbours are expanded during a search.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Derives the facing required to travel from `from` to `to`.
    ///
    /// Columns are compared before rows, so a diagonal displacement resolves
    /// to its horizontal component. Returns `None` when both cells coincide.
    #[must_use]
    pub fn between(from: CellCoord, to: CellCoord) -> Option<Self> {
        if to.column() < from.column() {
            Some(Self::West)
        } else if to.column() > from.column() {
            Some(Self::East)
        } else if to.row() < from.row() {
            Some(Self::North)
        } else if to.row() > from.row() {
            Some(Self::South)
        } else {
            None
        }
    }

    /// Returns the neighbour of `cell` in this direction, if it lies within `grid`.
    #[must_use]
    pub fn step_from(self, cell: CellCoord, grid: GridSize) -> Option<CellCoord> {
        let neighbor = match self {
            Self::North => CellCoord::new(cell.column(), cell.row().checked_sub(1)?),
            Self::East => CellCoord::new(cell.column().checked_add(1)?, cell.row()),
            Self::South => CellCoord::new(cell.column(), cell.row().checked_add(1)?),
            Self::West => CellCoord::new(cell.column().checked_sub(1)?, cell.row()),
        };

        grid.contains(neighbor).then_some(neighbor)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Computes the straight-line distance between two cell coordinates.
    #[must_use]
    pub fn euclidean_distance(self, other: CellCoord) -> f64 {
        let dx = f64::from(self.column().abs_diff(other.column()));
        let dy = f64::from(self.row().abs_diff(other.row()));
        (dx * dx + dy * dy).sqrt()
    }
}

/// Dimensions of a tile grid measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    columns: u32,
    rows: u32,
}

impl GridSize {
    /// Creates a new grid size descriptor.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the cell lies within `[0, columns) x [0, rows)`.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Total number of cells, saturating at zero when the product overflows.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let columns = usize::try_from(self.columns).unwrap_or(0);
        let rows = usize::try_from(self.rows).unwrap_or(0);
        columns.checked_mul(rows).unwrap_or(0)
    }

    /// Row-major offset of the cell, if it lies within the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }

        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Clamps the cell onto the nearest cell inside the grid.
    ///
    /// Returns `None` for an empty grid.
    #[must_use]
    pub fn clamp(&self, cell: CellCoord) -> Option<CellCoord> {
        if self.columns == 0 || self.rows == 0 {
            return None;
        }

        Some(CellCoord::new(
            cell.column().min(self.columns - 1),
            cell.row().min(self.rows - 1),
        ))
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS)
    }
}

/// Converts between cell coordinates and world-unit positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGeometry {
    tile_length: f32,
}

impl TileGeometry {
    /// Creates a new geometry using the provided tile edge length.
    #[must_use]
    pub const fn new(tile_length: f32) -> Self {
        Self { tile_length }
    }

    /// Side length of a single square tile expressed in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Upper-left corner of the cell expressed in world units.
    #[must_use]
    pub fn origin_of(&self, cell: CellCoord) -> (f32, f32) {
        (
            cell.column() as f32 * self.tile_length,
            cell.row() as f32 * self.tile_length,
        )
    }
}

impl Default for TileGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_LENGTH)
    }
}

/// Immutable representation of the mover's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoverSnapshot {
    /// Grid cell currently occupied by the mover.
    pub cell: CellCoord,
    /// Direction the mover currently faces.
    pub facing: Direction,
    /// Walking animation frame; zero is the idle pose.
    pub frame: u8,
}

/// Reasons a mover placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested cell lies outside the configured grid.
    OutOfBounds,
    /// The requested cell is marked impassable.
    Blocked,
}
