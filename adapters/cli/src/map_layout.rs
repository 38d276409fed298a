use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tilewalk_core::{CellCoord, Command, GridSize, DEFAULT_TILE_LENGTH};

const LAYOUT_DOMAIN: &str = "map";
const LAYOUT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded layout payload.
pub(crate) const LAYOUT_HEADER: &str = "map:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

const OPEN_TILE: char = '.';
const BLOCKED_TILE: char = '#';
const START_TILE: char = '@';

/// Obstacle map the command-line host replays moves against.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MapLayout {
    size: GridSize,
    tile_length: f32,
    blocked: Vec<bool>,
    start: Option<CellCoord>,
}

/// On-disk and on-wire representation: one string per grid row.
#[derive(Debug, Serialize, Deserialize)]
struct MapFile {
    #[serde(default = "default_tile_length")]
    tile_length: f32,
    rows: Vec<String>,
}

fn default_tile_length() -> f32 {
    DEFAULT_TILE_LENGTH
}

/// Errors that can occur while reading map layouts.
#[derive(Debug, Error)]
pub(crate) enum MapLayoutError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// The encoded layout lacked one of its colon separated segments.
    #[error("layout string is missing the {0}")]
    MissingSegment(&'static str),
    /// The encoded layout used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded layout used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The header dimensions disagree with the rows in the payload.
    #[error("header declares {declared_columns}x{declared_rows} but the rows describe {columns}x{rows}")]
    DimensionMismatch {
        /// Columns named by the header.
        declared_columns: u32,
        /// Rows named by the header.
        declared_rows: u32,
        /// Columns found in the payload.
        columns: u32,
        /// Rows found in the payload.
        rows: u32,
    },
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The JSON payload could not be parsed or produced.
    #[error("could not process layout json: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    /// The map contained no rows or an empty first row.
    #[error("map must contain at least one row and one column")]
    EmptyGrid,
    /// A row's length differs from the first row's.
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: u32,
        /// Width of the first row.
        expected: u32,
        /// Width of the offending row.
        found: u32,
    },
    /// A tile symbol other than `.`, `#` or `@` was found.
    #[error("unknown tile '{symbol}' at ({column}, {row})")]
    UnknownTile {
        /// Offending character.
        symbol: char,
        /// Column of the offending tile.
        column: u32,
        /// Row of the offending tile.
        row: u32,
    },
    /// More than one `@` start marker was found.
    #[error("map marks more than one start cell")]
    MultipleStarts,
    /// Tile length was not a positive finite number.
    #[error("tile length {0} must be positive and finite")]
    InvalidTileLength(f32),
    /// Obstacle density for a scattered map fell outside `0.0..=1.0`.
    #[error("obstacle density {0} must lie within 0.0 and 1.0")]
    InvalidDensity(f64),
}

impl MapLayout {
    /// Creates an obstacle-free layout.
    pub(crate) fn open(size: GridSize) -> Self {
        Self {
            size,
            tile_length: DEFAULT_TILE_LENGTH,
            blocked: vec![false; size.cell_count()],
            start: None,
        }
    }

    /// Creates a layout with obstacles scattered by a seeded generator.
    ///
    /// The origin cell and, when provided, `keep_clear` are never blocked.
    pub(crate) fn scattered(
        size: GridSize,
        density: f64,
        seed: u64,
        keep_clear: &[CellCoord],
    ) -> Result<Self, MapLayoutError> {
        if !(0.0..=1.0).contains(&density) {
            return Err(MapLayoutError::InvalidDensity(density));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut layout = Self::open(size);
        let origin = CellCoord::new(0, 0);
        for row in 0..size.rows() {
            for column in 0..size.columns() {
                let cell = CellCoord::new(column, row);
                let blocked = rng.gen_bool(density);
                if cell != origin && !keep_clear.contains(&cell) {
                    layout.set_blocked(cell, blocked);
                }
            }
        }
        layout.start = Some(origin);

        Ok(layout)
    }

    /// Parses the JSON map file format.
    pub(crate) fn from_json(contents: &str) -> Result<Self, MapLayoutError> {
        let file: MapFile = serde_json::from_str(contents)?;
        Self::from_file(file)
    }

    /// Encodes the layout into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, MapLayoutError> {
        let json = serde_json::to_vec(&self.to_file())?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{LAYOUT_HEADER}:{}x{}:{encoded}",
            self.size.columns(),
            self.size.rows()
        ))
    }

    /// Decodes a layout from its transfer string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, MapLayoutError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MapLayoutError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(MapLayoutError::MissingSegment("prefix"))?;
        let version = parts
            .next()
            .ok_or(MapLayoutError::MissingSegment("version"))?;
        let dimensions = parts
            .next()
            .ok_or(MapLayoutError::MissingSegment("grid dimensions"))?;
        let payload = parts
            .next()
            .ok_or(MapLayoutError::MissingSegment("payload"))?;

        if domain != LAYOUT_DOMAIN {
            return Err(MapLayoutError::InvalidPrefix(domain.to_owned()));
        }
        if version != LAYOUT_VERSION {
            return Err(MapLayoutError::UnsupportedVersion(version.to_owned()));
        }

        let (declared_columns, declared_rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
        let file: MapFile = serde_json::from_slice(&bytes)?;
        let layout = Self::from_file(file)?;

        if layout.size != GridSize::new(declared_columns, declared_rows) {
            return Err(MapLayoutError::DimensionMismatch {
                declared_columns,
                declared_rows,
                columns: layout.size.columns(),
                rows: layout.size.rows(),
            });
        }

        Ok(layout)
    }

    /// Grid dimensions of the layout.
    pub(crate) fn size(&self) -> GridSize {
        self.size
    }

    /// Reports whether the cell is blocked. Cells outside the grid count as blocked.
    pub(crate) fn is_blocked(&self, cell: CellCoord) -> bool {
        self.size
            .index(cell)
            .map_or(true, |index| self.blocked[index])
    }

    /// Number of blocked cells.
    pub(crate) fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|blocked| **blocked).count()
    }

    /// World commands that reproduce the layout on a fresh world.
    pub(crate) fn commands(&self) -> Vec<Command> {
        let mut commands = vec![Command::ConfigureGrid {
            size: self.size,
            tile_length: self.tile_length,
        }];

        commands.extend(self.cells().filter(|cell| self.is_blocked(*cell)).map(
            |cell| Command::SetBlocked {
                cell,
                blocked: true,
            },
        ));

        if let Some(cell) = self.start {
            commands.push(Command::PlaceMover { cell });
        }

        commands
    }

    fn set_blocked(&mut self, cell: CellCoord, blocked: bool) {
        if let Some(index) = self.size.index(cell) {
            self.blocked[index] = blocked;
        }
    }

    fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.size.columns();
        (0..self.size.rows())
            .flat_map(move |row| (0..columns).map(move |column| CellCoord::new(column, row)))
    }

    fn from_file(file: MapFile) -> Result<Self, MapLayoutError> {
        if !file.tile_length.is_finite() || file.tile_length <= 0.0 {
            return Err(MapLayoutError::InvalidTileLength(file.tile_length));
        }

        let width = file.rows.first().map_or(0, |row| row.chars().count());
        if width == 0 {
            return Err(MapLayoutError::EmptyGrid);
        }
        let columns = to_u32(width)?;
        let rows = to_u32(file.rows.len())?;

        let mut layout = Self::open(GridSize::new(columns, rows));
        layout.tile_length = file.tile_length;

        for (row, line) in (0..rows).zip(&file.rows) {
            let found = to_u32(line.chars().count())?;
            if found != columns {
                return Err(MapLayoutError::RaggedRow {
                    row,
                    expected: columns,
                    found,
                });
            }

            for (column, symbol) in (0..columns).zip(line.chars()) {
                let cell = CellCoord::new(column, row);
                match symbol {
                    OPEN_TILE => {}
                    BLOCKED_TILE => layout.set_blocked(cell, true),
                    START_TILE => {
                        if layout.start.replace(cell).is_some() {
                            return Err(MapLayoutError::MultipleStarts);
                        }
                    }
                    _ => {
                        return Err(MapLayoutError::UnknownTile {
                            symbol,
                            column,
                            row,
                        })
                    }
                }
            }
        }

        Ok(layout)
    }

    fn to_file(&self) -> MapFile {
        let rows = (0..self.size.rows())
            .map(|row| {
                (0..self.size.columns())
                    .map(|column| {
                        let cell = CellCoord::new(column, row);
                        if self.start == Some(cell) {
                            START_TILE
                        } else if self.is_blocked(cell) {
                            BLOCKED_TILE
                        } else {
                            OPEN_TILE
                        }
                    })
                    .collect()
            })
            .collect();

        MapFile {
            tile_length: self.tile_length,
            rows,
        }
    }
}

fn to_u32(value: usize) -> Result<u32, MapLayoutError> {
    u32::try_from(value).map_err(|_| MapLayoutError::InvalidDimensions(value.to_string()))
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), MapLayoutError> {
    let invalid = || MapLayoutError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }

    Ok((columns, rows))
}
