use std::collections::HashSet;

use tilewalk_core::{CellCoord, GridSize};
use tilewalk_system_pathfinding::{NoPath, PathFinder, SearchConfig};

fn cells(pairs: &[(u32, u32)]) -> Vec<CellCoord> {
    pairs
        .iter()
        .map(|&(column, row)| CellCoord::new(column, row))
        .collect()
}

fn walls(pairs: &[(u32, u32)]) -> HashSet<CellCoord> {
    cells(pairs).into_iter().collect()
}

#[test]
fn straight_line_on_empty_grid() {
    let finder = PathFinder::default();

    let path = finder
        .find_path(
            CellCoord::new(0, 0),
            CellCoord::new(3, 0),
            GridSize::new(10, 10),
            |_| false,
        )
        .expect("open grid has a route");

    assert_eq!(path.cells(), cells(&[(1, 0), (2, 0), (3, 0)]));
}

#[test]
fn goal_equal_to_start_yields_zero_steps() {
    let finder = PathFinder::default();
    let cell = CellCoord::new(5, 5);

    let result = finder.find_path(cell, cell, GridSize::new(10, 10), |_| false);

    let path = result.expect("standing on the goal is not a failure");
    assert!(path.is_empty());
}

#[test]
fn walled_in_goal_has_no_path() {
    let finder = PathFinder::default();
    let blocked = walls(&[(5, 4), (6, 5), (5, 6), (4, 5)]);

    let result = finder.find_path(
        CellCoord::new(0, 0),
        CellCoord::new(5, 5),
        GridSize::new(10, 10),
        |cell| blocked.contains(&cell),
    );

    assert_eq!(result, Err(NoPath::Exhausted { expanded: 95 }));
}

#[test]
fn equal_cost_routes_follow_expansion_order() {
    let finder = PathFinder::default();

    let path = finder
        .find_path(
            CellCoord::new(0, 0),
            CellCoord::new(2, 2),
            GridSize::new(10, 10),
            |_| false,
        )
        .expect("open grid has a route");

    assert_eq!(path.cells(), cells(&[(0, 1), (1, 1), (1, 2), (2, 2)]));
}

#[test]
fn diagonal_route_toward_origin_zigzags() {
    let finder = PathFinder::default();

    let path = finder
        .find_path(
            CellCoord::new(4, 4),
            CellCoord::new(1, 1),
            GridSize::new(10, 10),
            |_| false,
        )
        .expect("open grid has a route");

    assert_eq!(
        path.cells(),
        cells(&[(3, 4), (3, 3), (2, 3), (2, 2), (1, 2), (1, 1)])
    );
}

#[test]
fn routes_through_the_only_gap_in_a_wall() {
    let finder = PathFinder::default();
    let blocked: HashSet<CellCoord> = (0..9).map(|row| CellCoord::new(3, row)).collect();

    let path = finder
        .find_path(
            CellCoord::new(0, 0),
            CellCoord::new(6, 0),
            GridSize::new(10, 10),
            |cell| blocked.contains(&cell),
        )
        .expect("gap at the bottom of the wall");

    assert_eq!(path.len(), 24);
    assert!(path.iter().any(|cell| *cell == CellCoord::new(3, 9)));
    assert!(path.iter().all(|cell| !blocked.contains(cell)));
    assert_eq!(path.cells().last(), Some(&CellCoord::new(6, 0)));
}

#[test]
fn blocked_goal_is_never_entered() {
    let finder = PathFinder::default();
    let goal = CellCoord::new(2, 0);

    let result = finder.find_path(CellCoord::new(0, 0), goal, GridSize::new(3, 2), |cell| {
        cell == goal
    });

    assert_eq!(result, Err(NoPath::Exhausted { expanded: 5 }));
}

#[test]
fn enclosed_goal_on_large_grid_stops_at_iteration_cap() {
    let finder = PathFinder::default();
    let blocked = walls(&[(30, 29), (31, 30), (30, 31), (29, 30)]);

    let result = finder.find_path(
        CellCoord::new(0, 0),
        CellCoord::new(30, 30),
        GridSize::new(60, 60),
        |cell| blocked.contains(&cell),
    );

    assert_eq!(result, Err(NoPath::IterationCap { cap: 1000 }));
}

#[test]
fn goal_popped_on_the_last_permitted_iteration_counts() {
    let start = CellCoord::new(0, 0);
    let goal = CellCoord::new(9, 0);
    let grid = GridSize::new(10, 10);

    let enough = PathFinder::new(SearchConfig { iteration_cap: 10 });
    let path = enough
        .find_path(start, goal, grid, |_| false)
        .expect("ten expansions reach the goal");
    assert_eq!(path.len(), 9);

    let short = PathFinder::new(SearchConfig { iteration_cap: 9 });
    assert_eq!(
        short.find_path(start, goal, grid, |_| false),
        Err(NoPath::IterationCap { cap: 9 })
    );
}

#[test]
fn out_of_grid_coordinates_are_reported_without_searching() {
    let finder = PathFinder::default();
    let grid = GridSize::new(10, 10);
    let mut queries = 0;

    let goal_outside = finder.find_path(CellCoord::new(0, 0), CellCoord::new(10, 3), grid, |_| {
        queries += 1;
        false
    });
    let start_outside = finder.find_path(CellCoord::new(0, 12), CellCoord::new(1, 1), grid, |_| {
        queries += 1;
        false
    });

    assert_eq!(
        goal_outside,
        Err(NoPath::OutOfBounds {
            cell: CellCoord::new(10, 3)
        })
    );
    assert_eq!(
        start_outside,
        Err(NoPath::OutOfBounds {
            cell: CellCoord::new(0, 12)
        })
    );
    assert_eq!(queries, 0);
}

#[test]
fn collision_predicate_is_queried_once_per_discovered_cell() {
    let finder = PathFinder::default();
    let mut queried = Vec::new();

    let _path = finder
        .find_path(
            CellCoord::new(0, 0),
            CellCoord::new(3, 0),
            GridSize::new(10, 10),
            |cell| {
                queried.push(cell);
                false
            },
        )
        .expect("open grid has a route");

    let unique: HashSet<_> = queried.iter().copied().collect();
    assert_eq!(unique.len(), queried.len());
    assert!(!queried.contains(&CellCoord::new(0, 0)));
}

#[test]
fn blocked_cells_are_queried_only_once() {
    let finder = PathFinder::default();
    let walls = [
        CellCoord::new(5, 4),
        CellCoord::new(6, 5),
        CellCoord::new(5, 6),
        CellCoord::new(4, 5),
    ];
    let mut queried = Vec::new();

    let result = finder.find_path(
        CellCoord::new(0, 0),
        CellCoord::new(5, 5),
        GridSize::new(10, 10),
        |cell| {
            queried.push(cell);
            walls.contains(&cell)
        },
    );

    assert!(matches!(result, Err(NoPath::Exhausted { .. })));
    let unique: HashSet<_> = queried.iter().copied().collect();
    assert_eq!(unique.len(), queried.len());
    for wall in walls {
        assert_eq!(queried.iter().filter(|cell| **cell == wall).count(), 1);
    }
}

#[test]
fn long_diagonal_on_default_grid_exhausts_budget() {
    let finder = PathFinder::default();

    let result = finder.find_path(
        CellCoord::new(54, 51),
        CellCoord::new(14, 28),
        GridSize::new(60, 60),
        |_| false,
    );

    assert_eq!(result, Err(NoPath::IterationCap { cap: 1000 }));
}
