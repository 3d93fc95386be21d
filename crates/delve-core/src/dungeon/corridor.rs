//! Corridor carving
//!
//! Every graph edge becomes an L-shaped tunnel between the facing walls of
//! its two rooms:
//! 1. Pick the facing sides from the axis on which the rooms are separated
//! 2. Pick the wall cell on each side closest to the other room's centroid
//! 3. Walk out one cell, run along the side axis, then the other axis
//! 4. Occasionally split the first run to get a Z-shaped elbow

use tracing::trace;

use crate::config::GeneratorConfig;
use crate::rng::GameRng;

use super::{CellKind, CorridorGraph, Grid, Pos, Room, Side};

/// Check if there's a door next to a position (4 cardinal directions)
pub fn bydoor(grid: &Grid, pos: Pos) -> bool {
    grid.any_neighbor4(pos, |cell| {
        matches!(
            cell.kind,
            CellKind::Door | CellKind::LockedDoor | CellKind::SecretDoor
        )
    })
}

/// Check if a position is valid for placing a new door
///
/// A position is valid for a door if:
/// 1. It's a wall touching exactly one room floor cell
/// 2. There's no door already next to it (bydoor check)
pub fn okdoor(grid: &Grid, pos: Pos) -> bool {
    grid.kind(pos.0, pos.1) == CellKind::Wall
        && grid.count_neighbors4(pos, |c| c.kind == CellKind::Room) == 1
        && !bydoor(grid, pos)
}

/// Empty cells between two spans on one axis, if they do not overlap
fn gap(a_lo: usize, a_hi: usize, b_lo: usize, b_hi: usize) -> Option<usize> {
    if b_lo > a_hi {
        Some(b_lo - a_hi - 1)
    } else if a_lo > b_hi {
        Some(a_lo - b_hi - 1)
    } else {
        None
    }
}

/// Sides of `a` and `b` that face each other
pub fn facing_sides(a: &Room, b: &Room) -> (Side, Side) {
    let (ra, rb) = (a.bounds, b.bounds);
    let gx = gap(ra.lx, ra.hx, rb.lx, rb.hx);
    let gy = gap(ra.ly, ra.hy, rb.ly, rb.hy);

    let horizontal = match (gx, gy) {
        (Some(x), Some(y)) => x >= y,
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => {
            a.centroid.0.abs_diff(b.centroid.0) >= a.centroid.1.abs_diff(b.centroid.1)
        }
    };

    if horizontal {
        if b.centroid.0 >= a.centroid.0 {
            (Side::East, Side::West)
        } else {
            (Side::West, Side::East)
        }
    } else if b.centroid.1 >= a.centroid.1 {
        (Side::South, Side::North)
    } else {
        (Side::North, Side::South)
    }
}

/// Append the straight run `from..=to` (same row or same column)
fn push_line(path: &mut Vec<Pos>, from: Pos, to: Pos) {
    if from.1 == to.1 {
        let y = from.1;
        if from.0 <= to.0 {
            path.extend((from.0..=to.0).map(|x| (x, y)));
        } else {
            path.extend((to.0..=from.0).rev().map(|x| (x, y)));
        }
    } else {
        let x = from.0;
        if from.1 <= to.1 {
            path.extend((from.1..=to.1).map(|y| (x, y)));
        } else {
            path.extend((to.1..=from.1).rev().map(|y| (x, y)));
        }
    }
}

/// Pick where the primary run turns, strictly between `a` and `b` when elbowed
fn turn_point(a: usize, b: usize, elbow: bool, rng: &mut GameRng) -> usize {
    let (lo, hi) = (a.min(b), a.max(b));
    let span = hi - lo;
    if elbow && span >= 2 {
        lo + 1 + rng.rn2((span - 1) as u32) as usize
    } else {
        b
    }
}

/// Cells of the corridor from `a`'s wall to `b`'s wall, in walking order
///
/// The first and last cells are wall-ring cells; door normalization turns
/// them into doors once carved.
pub fn corridor_path(
    grid: &Grid,
    a: &Room,
    b: &Room,
    config: &GeneratorConfig,
    rng: &mut GameRng,
) -> Vec<Pos> {
    let (side_a, side_b) = facing_sides(a, b);
    let door_a = a.door_cell(side_a, b.centroid);
    let door_b = b.door_cell(side_b, a.centroid);
    let elbow = rng.percent(config.elbow_percent);

    let (Some(out_a), Some(out_b)) = (grid.step(door_a, side_a), grid.step(door_b, side_b)) else {
        return Vec::new();
    };

    let mut path = vec![door_a];
    if side_a.is_horizontal() {
        let turn = turn_point(out_a.0, out_b.0, elbow, rng);
        push_line(&mut path, out_a, (turn, out_a.1));
        push_line(&mut path, (turn, out_a.1), (turn, out_b.1));
        push_line(&mut path, (turn, out_b.1), out_b);
    } else {
        let turn = turn_point(out_a.1, out_b.1, elbow, rng);
        push_line(&mut path, out_a, (out_a.0, turn));
        push_line(&mut path, (out_a.0, turn), (out_b.0, turn));
        push_line(&mut path, (out_b.0, turn), out_b);
    }
    path.push(door_b);
    path.dedup();
    path
}

/// Turn the carvable cells of a path into tunnel; room floor is left alone
pub fn carve_path(grid: &mut Grid, path: &[Pos]) -> usize {
    let mut carved = 0;
    for &(x, y) in path {
        if grid.kind(x, y).is_carvable() {
            grid.set_kind(x, y, CellKind::Tunnel);
            carved += 1;
        }
    }
    carved
}

/// Corridor carving totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CarveStats {
    pub corridors: usize,
    pub cells: usize,
}

/// Carve every edge of the graph, tree edges first
pub fn carve_corridors(
    grid: &mut Grid,
    rooms: &[Room],
    graph: &CorridorGraph,
    config: &GeneratorConfig,
    rng: &mut GameRng,
) -> CarveStats {
    let mut stats = CarveStats::default();
    for edge in graph.edges() {
        let (a, b) = (&rooms[edge.a.0], &rooms[edge.b.0]);
        let path = corridor_path(grid, a, b, config, rng);
        let cells = carve_path(grid, &path);
        trace!(a = edge.a.0, b = edge.b.0, len = path.len(), cells, "carved corridor");
        stats.corridors += 1;
        stats.cells += cells;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::{Cell, Rect, RoomId};

    fn carve_room(grid: &mut Grid, id: usize, rect: Rect) -> Room {
        for (x, y) in rect.positions() {
            *grid.cell_mut(x, y) = Cell::floor(RoomId(id));
        }
        Room::new(RoomId(id), rect)
    }

    fn is_contiguous(path: &[Pos]) -> bool {
        path.windows(2)
            .all(|w| w[0].0.abs_diff(w[1].0) + w[0].1.abs_diff(w[1].1) == 1)
    }

    #[test]
    fn test_facing_sides() {
        let a = Room::new(RoomId(0), Rect::new(2, 2, 5, 5));
        let b = Room::new(RoomId(1), Rect::new(12, 3, 15, 6));
        let c = Room::new(RoomId(2), Rect::new(3, 14, 6, 17));
        assert_eq!(facing_sides(&a, &b), (Side::East, Side::West));
        assert_eq!(facing_sides(&b, &a), (Side::West, Side::East));
        assert_eq!(facing_sides(&a, &c), (Side::South, Side::North));
        assert_eq!(facing_sides(&c, &a), (Side::North, Side::South));
    }

    #[test]
    fn test_path_links_both_walls() {
        let mut grid = Grid::new(30, 24);
        let a = carve_room(&mut grid, 0, Rect::new(2, 2, 5, 5));
        let b = carve_room(&mut grid, 1, Rect::new(14, 12, 18, 15));
        let config = GeneratorConfig::default();

        for seed in 0..20 {
            let path = corridor_path(&grid, &a, &b, &config, &mut GameRng::new(seed));
            assert!(is_contiguous(&path), "{:?}", path);
            let first = path[0];
            let last = path[path.len() - 1];
            assert_eq!(grid.count_neighbors4(first, |c| c.room == Some(a.id)), 1);
            assert_eq!(grid.count_neighbors4(last, |c| c.room == Some(b.id)), 1);
            // Only the end cells touch a room interior
            for &p in &path[1..path.len() - 1] {
                assert!(!grid.any_neighbor4(p, |c| c.is_room_interior()), "{:?}", p);
            }
        }
    }

    #[test]
    fn test_elbow_path_is_contiguous() {
        let mut grid = Grid::new(40, 30);
        let a = carve_room(&mut grid, 0, Rect::new(2, 2, 4, 4));
        let b = carve_room(&mut grid, 1, Rect::new(20, 18, 24, 22));
        let config = GeneratorConfig {
            elbow_percent: 100,
            ..Default::default()
        };
        let path = corridor_path(&grid, &a, &b, &config, &mut GameRng::new(11));
        assert!(is_contiguous(&path));
    }

    #[test]
    fn test_carve_keeps_room_floor() {
        let mut grid = Grid::new(10, 5);
        carve_room(&mut grid, 0, Rect::new(4, 1, 5, 3));
        let path: Vec<Pos> = (0..10).map(|x| (x, 2)).collect();
        let carved = carve_path(&mut grid, &path);
        assert_eq!(carved, 8);
        assert_eq!(grid.kind(4, 2), CellKind::Room);
        assert_eq!(grid.kind(3, 2), CellKind::Tunnel);
    }

    #[test]
    fn test_bydoor() {
        let mut grid = Grid::new(5, 5);
        assert!(!bydoor(&grid, (2, 2)));
        grid.set_kind(3, 2, CellKind::Door);
        assert!(bydoor(&grid, (2, 2)));
        assert!(!bydoor(&grid, (1, 1)));
    }

    #[test]
    fn test_okdoor() {
        let mut grid = Grid::new(8, 8);
        carve_room(&mut grid, 0, Rect::new(3, 3, 4, 4));
        assert!(okdoor(&grid, (3, 2)));
        assert!(!okdoor(&grid, (2, 2)));
        grid.set_kind(4, 2, CellKind::Door);
        assert!(!okdoor(&grid, (3, 2)));
        assert!(!okdoor(&grid, (4, 2)));
    }
}
