use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tilewalk_core::{CellCoord, Command, Direction, GridSize};
use tilewalk_system_pathfinding::{NoPath, Path, PathFinder};
use tilewalk_world::{self as world, query, World};

const SEEDS: [u64; 6] = [
    0x5eed_0001,
    0x5eed_0002,
    0x5eed_0003,
    0xdead_beef,
    0x0bad_cafe,
    0x1234_5678,
];

#[test]
fn routes_on_scattered_grids_are_valid_and_repeatable() {
    for seed in SEEDS {
        let (world, start, goal) = scattered_world(seed, GridSize::new(16, 12), 0.3);
        let grid = query::grid_size(&world);
        let finder = PathFinder::default();

        let first = finder.find_path(start, goal, grid, |cell| query::is_blocked(&world, cell));
        let second = finder.find_path(start, goal, grid, |cell| query::is_blocked(&world, cell));
        assert_eq!(first, second, "seed {seed:#x} produced diverging results");

        if let Ok(path) = first {
            assert_valid_route(&world, start, goal, &path);
        }
    }
}

#[test]
fn small_grids_agree_with_breadth_first_reachability() {
    for seed in SEEDS {
        let (world, start, goal) = scattered_world(seed, GridSize::new(20, 20), 0.35);
        let grid = query::grid_size(&world);
        let field = query::distance_field(&world, start);

        let result =
            PathFinder::default().find_path(start, goal, grid, |cell| query::is_blocked(&world, cell));

        match (field.distance(goal), result) {
            (Some(shortest), Ok(path)) => {
                let steps = u32::try_from(path.len()).expect("path length fits u32");
                assert!(
                    steps >= shortest,
                    "seed {seed:#x}: route shorter than breadth-first distance"
                );
            }
            (None, Err(NoPath::Exhausted { expanded })) => {
                let reachable = u32::try_from(field.reachable_count()).expect("count fits u32");
                assert_eq!(expanded, reachable, "seed {seed:#x}");
            }
            (distance, outcome) => {
                panic!("seed {seed:#x}: distance {distance:?} but search returned {outcome:?}")
            }
        }
    }
}

#[test]
fn open_grids_produce_manhattan_length_routes() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x0fe0_0fe0);
    let grid = GridSize::new(30, 30);
    let finder = PathFinder::default();

    for _ in 0..25 {
        let start = random_cell(&mut rng, grid);
        let goal = random_cell(&mut rng, grid);

        let path = finder
            .find_path(start, goal, grid, |_| false)
            .expect("open grid always has a route");

        let steps = u32::try_from(path.len()).expect("path length fits u32");
        assert_eq!(steps, start.manhattan_distance(goal), "{start:?} -> {goal:?}");
    }
}

fn scattered_world(seed: u64, size: GridSize, density: f64) -> (World, CellCoord, CellCoord) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureGrid {
            size,
            tile_length: 24.0,
        },
        &mut events,
    );

    let start = random_cell(&mut rng, size);
    let goal = random_cell(&mut rng, size);
    for row in 0..size.rows() {
        for column in 0..size.columns() {
            let cell = CellCoord::new(column, row);
            if cell != start && cell != goal && rng.gen_bool(density) {
                world::apply(
                    &mut world,
                    Command::SetBlocked {
                        cell,
                        blocked: true,
                    },
                    &mut events,
                );
            }
        }
    }

    (world, start, goal)
}

fn random_cell(rng: &mut ChaCha8Rng, size: GridSize) -> CellCoord {
    CellCoord::new(
        rng.gen_range(0..size.columns()),
        rng.gen_range(0..size.rows()),
    )
}

fn assert_valid_route(world: &World, start: CellCoord, goal: CellCoord, path: &Path) {
    let grid = query::grid_size(world);
    let mut previous = start;

    for cell in path.iter().copied() {
        assert!(grid.contains(cell), "{cell:?} outside grid");
        assert!(!query::is_blocked(world, cell), "{cell:?} is blocked");
        assert_eq!(previous.manhattan_distance(cell), 1, "{previous:?} -> {cell:?}");
        assert!(Direction::between(previous, cell).is_some());
        previous = cell;
    }

    assert_eq!(previous, goal);
}
