//! Reachability analysis
//!
//! Breadth-first flood fill from the entrance over walkable cells, using
//! 4-connectivity. The logical variant also hops across teleport pairs.

use std::collections::VecDeque;

use super::{DungeonLayout, Grid, Pos, Room, RoomId, TeleportTable};

/// Result of one flood fill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    width: usize,
    reachable: Vec<bool>,
    /// Live rooms with no reachable cell, ascending by id
    pub unreachable_rooms: Vec<RoomId>,
    pub reached_cells: usize,
}

impl Analysis {
    pub fn is_reachable(&self, (x, y): Pos) -> bool {
        x < self.width && self.reachable.get(y * self.width + x).copied().unwrap_or(false)
    }

    /// A room counts as reachable as soon as one of its cells is
    pub fn is_room_reachable(&self, room: &Room) -> bool {
        room.bounds.positions().any(|pos| self.is_reachable(pos))
    }

    pub fn all_rooms_reachable(&self) -> bool {
        self.unreachable_rooms.is_empty()
    }
}

/// Mark every cell reachable from `start`, optionally following teleport pads
pub fn flood_fill(grid: &Grid, start: Pos, teleports: Option<&TeleportTable>) -> Vec<bool> {
    let mut seen = vec![false; grid.area()];
    if !grid.is_walkable(start.0, start.1) {
        return seen;
    }

    let mut queue = VecDeque::from([start]);
    seen[grid.index(start)] = true;

    while let Some(pos) = queue.pop_front() {
        let hop = teleports.and_then(|table| table.destination(pos));
        for next in grid.neighbors4(pos).into_iter().flatten().chain(hop) {
            let idx = grid.index(next);
            if !seen[idx] && grid.is_walkable(next.0, next.1) {
                seen[idx] = true;
                queue.push_back(next);
            }
        }
    }
    seen
}

fn analysis_from(layout: &DungeonLayout, reachable: Vec<bool>) -> Analysis {
    let mut analysis = Analysis {
        width: layout.grid.width(),
        reached_cells: reachable.iter().filter(|&&r| r).count(),
        reachable,
        unreachable_rooms: Vec::new(),
    };
    analysis.unreachable_rooms = layout
        .live_rooms()
        .filter(|room| !analysis.is_room_reachable(room))
        .map(|room| room.id)
        .collect();
    analysis
}

/// Walking-only reachability from the entrance
pub fn analyze(layout: &DungeonLayout) -> Analysis {
    analysis_from(layout, flood_fill(&layout.grid, layout.entrance, None))
}

/// Reachability from the entrance including teleport hops
pub fn analyze_logical(layout: &DungeonLayout) -> Analysis {
    analysis_from(
        layout,
        flood_fill(&layout.grid, layout.entrance, Some(&layout.teleports)),
    )
}

/// Label walkable components in row-major discovery order and record each
/// live room's component. Returns the number of components.
pub fn label_components(grid: &Grid, rooms: &mut [Room]) -> usize {
    let mut labels: Vec<Option<usize>> = vec![None; grid.area()];
    let mut count = 0;

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let idx = grid.index((x, y));
            if labels[idx].is_some() || !grid.is_walkable(x, y) {
                continue;
            }
            let mut queue = VecDeque::from([(x, y)]);
            labels[idx] = Some(count);
            while let Some(pos) = queue.pop_front() {
                for next in grid.neighbors4(pos).into_iter().flatten() {
                    let n = grid.index(next);
                    if labels[n].is_none() && grid.is_walkable(next.0, next.1) {
                        labels[n] = Some(count);
                        queue.push_back(next);
                    }
                }
            }
            count += 1;
        }
    }

    for room in rooms.iter_mut() {
        room.component = if room.is_absorbed() {
            None
        } else {
            room.bounds.positions().find_map(|pos| labels[grid.index(pos)])
        };
    }
    count
}
