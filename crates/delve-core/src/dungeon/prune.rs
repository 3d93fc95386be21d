//! Cosmetic pruning
//!
//! Removes tunnel cells nobody can use: pockets cut off from the entrance
//! that touch nothing, and single-cell nubs poking at a room corner. Neither
//! can hold up a door or a path, so connectivity is unaffected.

use std::collections::VecDeque;

use tracing::trace;

use crate::config::{GeneratorConfig, RepairMode};

use super::connectivity::analyze_logical;
use super::{CellFeatures, CellKind, DungeonLayout, Grid, Pos};

/// What pruning removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneStats {
    pub pockets: usize,
    pub pocket_cells: usize,
    pub nubs: usize,
}

/// Run both pruning passes; pockets are kept in hidden-area mode
pub fn prune(layout: &mut DungeonLayout, config: &GeneratorConfig) -> PruneStats {
    let mut stats = PruneStats::default();
    if config.repair_mode != RepairMode::HiddenArea {
        prune_pockets(layout, &mut stats);
    }
    prune_nubs(&mut layout.grid, &mut stats);
    stats
}

/// Only walls, caves and other tunnels around it
fn touches_structure(grid: &Grid, pos: Pos) -> bool {
    grid.any_neighbor4(pos, |c| {
        !matches!(c.kind, CellKind::Wall | CellKind::Cave | CellKind::Tunnel)
    })
}

fn prune_pockets(layout: &mut DungeonLayout, stats: &mut PruneStats) {
    let analysis = analyze_logical(layout);
    let grid = &mut layout.grid;
    let mut seen = vec![false; grid.area()];

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let start = (x, y);
            if seen[grid.index(start)]
                || grid.kind(x, y) != CellKind::Tunnel
                || analysis.is_reachable(start)
            {
                continue;
            }

            let mut pocket = vec![start];
            let mut queue = VecDeque::from([start]);
            seen[grid.index(start)] = true;
            while let Some(pos) = queue.pop_front() {
                for next in grid.neighbors4(pos).into_iter().flatten() {
                    let idx = grid.index(next);
                    if !seen[idx] && grid.kind(next.0, next.1) == CellKind::Tunnel {
                        seen[idx] = true;
                        pocket.push(next);
                        queue.push_back(next);
                    }
                }
            }

            let keep = pocket.iter().any(|&(px, py)| {
                grid.cell(px, py).features.contains(CellFeatures::ABSORBED)
                    || touches_structure(grid, (px, py))
            });
            if keep {
                continue;
            }
            for &(px, py) in &pocket {
                grid.set_kind(px, py, CellKind::Wall);
            }
            trace!(cells = pocket.len(), at = ?start, "pruned tunnel pocket");
            stats.pockets += 1;
            stats.pocket_cells += pocket.len();
        }
    }
}

fn prune_nubs(grid: &mut Grid, stats: &mut PruneStats) {
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if grid.kind(x, y) != CellKind::Tunnel
                || grid.any_neighbor4((x, y), |c| c.is_walkable())
            {
                continue;
            }
            let corner = grid
                .diagonals((x, y))
                .into_iter()
                .flatten()
                .any(|(dx, dy)| grid.cell(dx, dy).is_room_interior());
            if corner {
                grid.set_kind(x, y, CellKind::Wall);
                stats.nubs += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::{Cell, Rect, Room, RoomId};

    fn one_room() -> DungeonLayout {
        let mut grid = Grid::new(20, 12);
        let room = Room::new(RoomId(0), Rect::new(3, 3, 6, 6));
        for (x, y) in room.bounds.positions() {
            *grid.cell_mut(x, y) = Cell::floor(RoomId(0));
        }
        DungeonLayout::new(grid, vec![room])
    }

    #[test]
    fn test_isolated_pocket_is_walled() {
        let mut layout = one_room();
        for x in 12..=15 {
            layout.grid.set_kind(x, 8, CellKind::Tunnel);
        }
        let stats = prune(&mut layout, &GeneratorConfig::default());
        assert_eq!(stats.pockets, 1);
        assert_eq!(stats.pocket_cells, 4);
        assert_eq!(layout.grid.count_kind(CellKind::Tunnel), 0);
    }

    #[test]
    fn test_pocket_next_to_door_is_kept() {
        let mut layout = one_room();
        layout.grid.set_kind(7, 4, CellKind::Door);
        layout.grid.set_kind(8, 4, CellKind::Tunnel);
        layout.grid.set_kind(9, 4, CellKind::Tunnel);
        let stats = prune(&mut layout, &GeneratorConfig::default());
        assert_eq!(stats.pockets, 0);
        assert_eq!(layout.grid.count_kind(CellKind::Tunnel), 2);
    }

    #[test]
    fn test_absorbed_pocket_is_kept() {
        let mut layout = one_room();
        layout.grid.set_kind(14, 8, CellKind::Tunnel);
        layout.grid.cell_mut(14, 8).features |= CellFeatures::ABSORBED;
        assert_eq!(prune(&mut layout, &GeneratorConfig::default()).pockets, 0);
    }

    #[test]
    fn test_hidden_mode_keeps_pockets_but_drops_nubs() {
        let mut layout = one_room();
        layout.grid.set_kind(14, 8, CellKind::Tunnel);
        layout.grid.set_kind(2, 2, CellKind::Tunnel);
        let config = GeneratorConfig {
            repair_mode: RepairMode::HiddenArea,
            ..Default::default()
        };
        let stats = prune(&mut layout, &config);
        assert_eq!(stats.pockets, 0);
        assert_eq!(stats.nubs, 1);
        assert_eq!(layout.grid.kind(2, 2), CellKind::Wall);
        assert_eq!(layout.grid.kind(14, 8), CellKind::Tunnel);
    }
}
