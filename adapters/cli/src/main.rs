#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line host that replays scripted moves on a virtual clock.

mod map_layout;
mod session;
mod settings;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::debug;
use tilewalk_core::{CellCoord, Event, GridSize, DEFAULT_GRID_COLUMNS, DEFAULT_GRID_ROWS};
use tilewalk_system_movement::MoveRequest;

use crate::{
    map_layout::MapLayout,
    session::{Action, Record, Session},
    settings::Settings,
};

/// Plans and replays tile moves against a map layout.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    source: MapSource,

    /// Grid columns for open or scattered maps
    #[arg(long, default_value_t = DEFAULT_GRID_COLUMNS)]
    columns: u32,

    /// Grid rows for open or scattered maps
    #[arg(long, default_value_t = DEFAULT_GRID_ROWS)]
    rows: u32,

    /// Seed for scattered obstacles
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// TOML settings file with search and movement tunables
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Print the map as a transfer string and exit
    #[arg(long)]
    encode: bool,

    /// Actions replayed in order: `to:COLUMN,ROW`, `wait:TICKS` or `key:DIRECTION`
    actions: Vec<Action>,
}

#[derive(clap::Args, Debug)]
#[group(multiple = false)]
struct MapSource {
    /// JSON map file with `.`, `#` and `@` rows
    #[arg(short, long)]
    map: Option<PathBuf>,

    /// Map transfer string (`map:v1:COLUMNSxROWS:PAYLOAD`)
    #[arg(short, long)]
    layout: Option<String>,

    /// Scatter obstacles with the given density between 0 and 1
    #[arg(long)]
    scatter: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => Settings::from_path(path)?,
        None => Settings::default(),
    };
    debug!("using {settings:?}");

    let layout = load_layout(&cli)?;
    if cli.encode {
        println!("{}", layout.encode().context("failed to encode map layout")?);
        return Ok(());
    }

    let mut session = Session::new(&layout, &settings);
    let size = layout.size();
    println!(
        "map {}x{}, {} blocked cells, mover at {}",
        size.columns(),
        size.rows(),
        layout.blocked_count(),
        cell(session.mover().cell)
    );

    let mut records = Vec::new();
    for action in &cli.actions {
        session.perform(*action, &mut records);
    }
    session.finish(&mut records);

    for record in &records {
        if let Some(line) = describe(record) {
            println!("{line}");
        }
    }

    let mover = session.mover();
    let (x, y) = session.mover_origin();
    println!(
        "mover at {} facing {:?} ({x}, {y}) after {}",
        cell(mover.cell),
        mover.facing,
        timestamp(session.elapsed())
    );

    Ok(())
}

fn load_layout(cli: &Cli) -> Result<MapLayout> {
    if let Some(path) = &cli.source.map {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read map file at {}", path.display()))?;
        return MapLayout::from_json(&contents)
            .with_context(|| format!("invalid map file at {}", path.display()));
    }

    if let Some(value) = &cli.source.layout {
        return MapLayout::decode(value).context("invalid map transfer string");
    }

    ensure!(
        cli.columns > 0 && cli.rows > 0,
        "grid must have at least one column and one row"
    );
    let size = GridSize::new(cli.columns, cli.rows);

    if let Some(density) = cli.source.scatter {
        let targets: Vec<CellCoord> = cli
            .actions
            .iter()
            .filter_map(|action| match action {
                Action::MoveTo(target) => Some(*target),
                _ => None,
            })
            .collect();
        return MapLayout::scattered(size, density, cli.seed, &targets)
            .context("failed to scatter obstacles");
    }

    Ok(MapLayout::open(size))
}

fn describe(record: &Record) -> Option<String> {
    let line = match record {
        Record::Request {
            target,
            outcome,
            shortest,
        } => {
            let verdict = match outcome {
                MoveRequest::Started { steps } => format!("started, {steps} steps"),
                MoveRequest::AlreadyThere => "already there".to_owned(),
                MoveRequest::Ignored => "ignored, a move is in progress".to_owned(),
                MoveRequest::Unreachable(reason) => match shortest {
                    Some(distance) => {
                        format!("unreachable: {reason} (breadth-first distance {distance})")
                    }
                    None => format!("unreachable: {reason}"),
                },
            };
            format!("move to {}: {verdict}", cell(*target))
        }
        Record::Interrupted { at } => {
            format!("[{}] keyboard input stopped the scripted move", timestamp(*at))
        }
        Record::Event { at, event } => {
            let text = match event {
                Event::MoverAdvanced {
                    direction,
                    from,
                    to,
                    frame,
                } => format!(
                    "{direction:?} {} -> {} frame {frame}",
                    cell(*from),
                    cell(*to)
                ),
                Event::MoverBlocked {
                    direction,
                    cell: position,
                } => format!("{direction:?} step from {} blocked", cell(*position)),
                Event::MoverSettled { cell: position } => {
                    format!("settled at {}", cell(*position))
                }
                Event::MoverPlaced { cell: position } => format!("placed at {}", cell(*position)),
                Event::MoverPlacementRejected {
                    cell: position,
                    reason,
                } => format!("placement at {} rejected: {reason:?}", cell(*position)),
                Event::GridConfigured { .. } | Event::CellBlockChanged { .. } => return None,
            };
            format!("[{}] {text}", timestamp(*at))
        }
    };

    Some(line)
}

fn cell(cell: CellCoord) -> String {
    format!("({}, {})", cell.column(), cell.row())
}

fn timestamp(at: Duration) -> String {
    format!("{:>6}ms", at.as_millis())
}
