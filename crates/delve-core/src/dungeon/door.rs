//! Door normalization
//!
//! Tunnels that reach a room wall become doors. The raw result is then
//! tidied in passes that each only ever turn doors back into walls, except
//! orphan repair which may dig a single tunnel cell:
//!
//! 1. Promote tunnel cells bordering exactly one room cell
//! 2. Collapse straight runs of doors along one wall to a single door
//! 3. Reduce 2x2 door clusters, keeping one door per approaching corridor
//! 4. Repair or wall off orphan doors until nothing changes

use hashbrown::HashSet;

use crate::config::GeneratorConfig;
use crate::rng::GameRng;

use super::{CellKind, Grid, Pos, Rect, RoomId, Side};

/// What the normalizer changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoorStats {
    pub promoted: usize,
    /// Tunnels walled for touching more than one room cell
    pub blocked: usize,
    pub chain_removed: usize,
    pub cluster_removed: usize,
    pub orphans_carved: usize,
    pub orphans_walled: usize,
}

impl DoorStats {
    /// Doors turned back into walls
    pub fn removed(&self) -> usize {
        self.chain_removed + self.cluster_removed + self.orphans_walled
    }
}

/// The room a cell borders and the side it lies on, when there is exactly one
/// room floor neighbour
pub fn facing_room(grid: &Grid, pos: Pos) -> Option<(RoomId, Side)> {
    let mut found = None;
    for side in Side::ALL {
        let Some((nx, ny)) = grid.step(pos, side) else {
            continue;
        };
        let cell = grid.cell(nx, ny);
        if cell.kind == CellKind::Room {
            if found.is_some() {
                return None;
            }
            found = Some((cell.room?, side));
        }
    }
    found
}

/// Number of orthogonal room floor cells
pub fn room_neighbor_count(grid: &Grid, pos: Pos) -> usize {
    grid.count_neighbors4(pos, |c| c.kind == CellKind::Room)
}

/// Whether any orthogonal neighbour is a passage (tunnel, door or pad)
pub fn has_passage(grid: &Grid, pos: Pos) -> bool {
    grid.any_neighbor4(pos, |c| c.kind.is_passage())
}

fn is_door_at(grid: &Grid, (x, y): Pos) -> bool {
    grid.kind(x, y).is_door()
}

/// Run every normalization pass over `region`
pub fn normalize_doors(
    grid: &mut Grid,
    region: Rect,
    config: &GeneratorConfig,
    rng: &mut GameRng,
) -> DoorStats {
    let mut stats = DoorStats::default();
    promote(grid, region, &mut stats);
    collapse_chains(grid, region, &mut stats);
    reduce_clusters(grid, region, config.cluster_threshold, &mut stats);
    repair_orphans(grid, region, config, rng, &mut stats);
    stats
}

fn promote(grid: &mut Grid, region: Rect, stats: &mut DoorStats) {
    for (x, y) in region.positions() {
        if grid.kind(x, y) != CellKind::Tunnel {
            continue;
        }
        match room_neighbor_count(grid, (x, y)) {
            0 => {}
            1 => {
                grid.set_kind(x, y, CellKind::Door);
                stats.promoted += 1;
            }
            _ => {
                grid.set_kind(x, y, CellKind::Wall);
                stats.blocked += 1;
            }
        }
    }
}

/// Keep one door of a run: the first with a passage outside the run, else the middle
fn collapse_run(grid: &mut Grid, run: &[Pos]) -> usize {
    let keep = run
        .iter()
        .position(|&pos| {
            grid.neighbors4(pos)
                .into_iter()
                .flatten()
                .any(|n| !run.contains(&n) && grid.kind(n.0, n.1).is_passage())
        })
        .unwrap_or(run.len() / 2);

    for (i, &(x, y)) in run.iter().enumerate() {
        if i != keep {
            grid.set_kind(x, y, CellKind::Wall);
        }
    }
    run.len() - 1
}

fn collapse_chains(grid: &mut Grid, region: Rect, stats: &mut DoorStats) {
    // Doors facing a room north/south line up along a row, east/west along a column
    let lines: Vec<Vec<Pos>> = (region.ly..=region.hy)
        .map(|y| (region.lx..=region.hx).map(|x| (x, y)).collect())
        .chain(
            (region.lx..=region.hx).map(|x| (region.ly..=region.hy).map(|y| (x, y)).collect()),
        )
        .collect();
    let rows = region.height();

    for (i, line) in lines.iter().enumerate() {
        let along_row = i < rows;
        let mut run: Vec<Pos> = Vec::new();
        let mut run_key = None;

        // A trailing None flushes the last run
        for pos in line.iter().copied().map(Some).chain(std::iter::once(None)) {
            let key = pos
                .filter(|&p| is_door_at(grid, p))
                .and_then(|p| facing_room(grid, p))
                .filter(|(_, side)| side.is_horizontal() != along_row);
            if let Some(p) = pos
                && key.is_some()
                && key == run_key
            {
                run.push(p);
                continue;
            }
            if run.len() >= 2 {
                stats.chain_removed += collapse_run(grid, &run);
            }
            run.clear();
            run_key = key;
            if let (Some(p), Some(_)) = (pos, key) {
                run.push(p);
            }
        }
    }
}

/// First tunnel cell next to a door, the corridor it is approached from
fn approach(grid: &Grid, pos: Pos) -> Option<Pos> {
    grid.neighbors4(pos)
        .into_iter()
        .flatten()
        .find(|&(x, y)| grid.kind(x, y) == CellKind::Tunnel)
}

fn reduce_clusters(grid: &mut Grid, region: Rect, threshold: usize, stats: &mut DoorStats) {
    for (x, y) in region.positions() {
        if x + 1 >= grid.width() || y + 1 >= grid.height() {
            continue;
        }
        let window = [(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)];
        let doors: Vec<(Pos, RoomId)> = window
            .into_iter()
            .filter(|&pos| is_door_at(grid, pos))
            .filter_map(|pos| facing_room(grid, pos).map(|(room, _)| (pos, room)))
            .collect();
        if doors.len() < threshold {
            continue;
        }

        let mut rooms: Vec<RoomId> = doors.iter().map(|&(_, room)| room).collect();
        rooms.sort_unstable();
        rooms.dedup();
        for room in rooms {
            let group: Vec<Pos> = doors
                .iter()
                .filter(|&&(_, r)| r == room)
                .map(|&(pos, _)| pos)
                .collect();
            if group.len() < threshold {
                continue;
            }
            let mut seen: HashSet<Option<Pos>> = HashSet::new();
            for pos in group {
                if !seen.insert(approach(grid, pos)) {
                    grid.set_kind(pos.0, pos.1, CellKind::Wall);
                    stats.cluster_removed += 1;
                }
            }
        }
    }
}

fn repair_orphans(
    grid: &mut Grid,
    region: Rect,
    config: &GeneratorConfig,
    rng: &mut GameRng,
    stats: &mut DoorStats,
) {
    let doors = region.positions().filter(|&p| is_door_at(grid, p)).count();

    // Each pass resolves at least one door for good, so this terminates
    for _ in 0..=doors {
        let mut changed = false;
        for pos in region.positions() {
            if !is_door_at(grid, pos) {
                continue;
            }
            let Some((_, side)) = facing_room(grid, pos) else {
                grid.set_kind(pos.0, pos.1, CellKind::Wall);
                stats.orphans_walled += 1;
                changed = true;
                continue;
            };
            if has_passage(grid, pos) {
                continue;
            }

            let outward = grid
                .step(pos, side.opposite())
                .filter(|&(ox, oy)| grid.kind(ox, oy).is_carvable())
                .filter(|&o| !grid.any_neighbor4(o, |c| c.is_room_interior()));
            match outward {
                Some((ox, oy)) if rng.percent(config.orphan_carve_percent) => {
                    grid.set_kind(ox, oy, CellKind::Tunnel);
                    stats.orphans_carved += 1;
                }
                _ => {
                    grid.set_kind(pos.0, pos.1, CellKind::Wall);
                    stats.orphans_walled += 1;
                }
            }
            changed = true;
        }
        if !changed {
            break;
        }
    }
}
