//! Connectivity repair
//!
//! Runs as a small bounded state machine:
//!
//! ```text
//! Carve{attempt} --(progress and retries left)--> Carve{attempt + 1}
//!       |
//!       v
//!   Fallback --> DoorGuarantee --> Confirm --> Done
//! ```
//!
//! Carving joins an unreachable room to the reachable network with the
//! shortest free lane. Rooms that still cannot be reached get a teleport pair
//! or are absorbed into the corridor network. Every state is entered at most
//! a fixed number of times, so repair always terminates.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::config::{GeneratorConfig, RepairMode};
use crate::rng::GameRng;

use super::connectivity::{analyze, analyze_logical, Analysis};
use super::corridor::okdoor;
use super::door::{facing_room, normalize_doors, DoorStats};
use super::teleport::place_teleport;
use super::{CellFeatures, CellKind, DungeonLayout, Grid, Pos, Rect, RoomId, RoomState};

/// What the repairer did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Carve passes run
    pub attempts: u32,
    /// Rooms joined by a carved corridor
    pub carved: usize,
    pub carved_cells: usize,
    pub teleports: usize,
    pub absorbed: usize,
    pub stubs: usize,
    /// Local door normalization after carving
    pub doors: DoorStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepairState {
    Carve { attempt: u32 },
    Fallback,
    DoorGuarantee,
    Confirm,
    Done,
}

/// Make every room reachable, teleport-serviced or absorbed
pub fn repair(layout: &mut DungeonLayout, config: &GeneratorConfig, rng: &mut GameRng) -> RepairReport {
    let mut report = RepairReport::default();
    let mut state = match config.repair_mode {
        RepairMode::Carve => RepairState::Carve { attempt: 0 },
        RepairMode::HiddenArea => RepairState::Fallback,
    };

    loop {
        trace!(?state, "repair step");
        state = match state {
            RepairState::Carve { attempt } => {
                report.attempts += 1;
                let progressed = carve_pass(layout, config, rng, &mut report);
                let pending = !analyze(layout).all_rooms_reachable();
                if pending && progressed && attempt < config.max_repair_retries {
                    RepairState::Carve { attempt: attempt + 1 }
                } else {
                    RepairState::Fallback
                }
            }
            RepairState::Fallback => {
                fallback_pass(layout, config, &mut report);
                RepairState::DoorGuarantee
            }
            RepairState::DoorGuarantee => {
                door_guarantee_pass(layout, rng, &mut report);
                RepairState::Confirm
            }
            RepairState::Confirm => {
                confirm_pass(layout, &mut report);
                RepairState::Done
            }
            RepairState::Done => break,
        };
    }

    debug!(
        carved = report.carved,
        teleports = report.teleports,
        absorbed = report.absorbed,
        stubs = report.stubs,
        "repair finished"
    );
    report
}

/// One carve attempt over every unreachable room, ascending by id
fn carve_pass(
    layout: &mut DungeonLayout,
    config: &GeneratorConfig,
    rng: &mut GameRng,
    report: &mut RepairReport,
) -> bool {
    let mut analysis = analyze(layout);
    let pending = analysis.unreachable_rooms.clone();
    let mut progressed = false;

    for id in pending {
        if analysis.is_room_reachable(layout.room(id)) {
            continue;
        }
        let Some(path) = find_repair_path(layout, id, &analysis) else {
            trace!(room = id.0, "no carve path");
            continue;
        };
        report.carved_cells += apply_path(&mut layout.grid, &path);
        if let Some(bounds) = Rect::bounding(&path) {
            let region = bounds.expand(1, layout.grid.width(), layout.grid.height());
            let stats = normalize_doors(&mut layout.grid, region, config, rng);
            accumulate(&mut report.doors, stats);
        }
        report.carved += 1;
        progressed = true;
        analysis = analyze(layout);
        debug!(room = id.0, len = path.len(), "carved repair corridor");
    }
    progressed
}

fn accumulate(total: &mut DoorStats, stats: DoorStats) {
    total.promoted += stats.promoted;
    total.blocked += stats.blocked;
    total.chain_removed += stats.chain_removed;
    total.cluster_removed += stats.cluster_removed;
    total.orphans_carved += stats.orphans_carved;
    total.orphans_walled += stats.orphans_walled;
}

/// Cell a repair corridor may run through
fn is_lane(grid: &Grid, analysis: &Analysis, pos: Pos) -> bool {
    let kind = grid.kind(pos.0, pos.1);
    (kind.is_carvable() && !grid.any_neighbor4(pos, |c| c.is_room_interior()))
        || (kind == CellKind::Tunnel && !analysis.is_reachable(pos))
}

/// Cell that joins a repair corridor to the reachable network
fn is_goal(grid: &Grid, analysis: &Analysis, pos: Pos) -> bool {
    let kind = grid.kind(pos.0, pos.1);
    if kind.is_passage() && kind != CellKind::TeleportPad {
        return analysis.is_reachable(pos);
    }
    // A free wall cell of a reachable room becomes a new door
    okdoor(grid, pos)
        && facing_room(grid, pos)
            .and_then(|(_, side)| grid.step(pos, side))
            .is_some_and(|floor| analysis.is_reachable(floor))
}

/// Shortest lane from a free wall cell of `room` to the reachable network
///
/// The returned path starts with the new door of `room`, continues through
/// lane cells and ends with the goal cell when that cell is a wall to open.
pub fn find_repair_path(layout: &DungeonLayout, room: RoomId, analysis: &Analysis) -> Option<Vec<Pos>> {
    let grid = &layout.grid;
    let mut prev: Vec<Option<Pos>> = vec![None; grid.area()];
    let mut seen = vec![false; grid.area()];
    let mut queue = VecDeque::new();

    let finish = |prev: &[Option<Pos>], last: Pos, goal: Pos| {
        let mut path = vec![last];
        let mut cur = last;
        while let Some(p) = prev[grid.index(cur)] {
            path.push(p);
            cur = p;
        }
        path.reverse();
        if grid.kind(goal.0, goal.1) == CellKind::Wall {
            path.push(goal);
        }
        path
    };

    for (door, side) in layout.room(room).ring_sides() {
        if !okdoor(grid, door) {
            continue;
        }
        let Some(out) = grid.step(door, side) else {
            continue;
        };
        if seen[grid.index(out)] {
            continue;
        }
        if is_goal(grid, analysis, out) {
            return Some(vec![door]);
        }
        if is_lane(grid, analysis, out) {
            seen[grid.index(door)] = true;
            seen[grid.index(out)] = true;
            prev[grid.index(out)] = Some(door);
            queue.push_back(out);
        }
    }

    while let Some(pos) = queue.pop_front() {
        for next in grid.neighbors4(pos).into_iter().flatten() {
            let idx = grid.index(next);
            if seen[idx] {
                continue;
            }
            seen[idx] = true;
            if is_goal(grid, analysis, next) {
                return Some(finish(&prev, pos, next));
            }
            if is_lane(grid, analysis, next) {
                prev[idx] = Some(pos);
                queue.push_back(next);
            }
        }
    }
    None
}

/// Open the doors and dig the lanes of a repair path; returns cells dug
fn apply_path(grid: &mut Grid, path: &[Pos]) -> usize {
    let mut dug = 0;
    for &(x, y) in path {
        let kind = grid.kind(x, y);
        if kind == CellKind::Wall && grid.count_neighbors4((x, y), |c| c.kind == CellKind::Room) == 1 {
            grid.set_kind(x, y, CellKind::Door);
        } else if kind.is_carvable() {
            grid.set_kind(x, y, CellKind::Tunnel);
            dug += 1;
        } else {
            continue;
        }
        grid.cell_mut(x, y).features |= CellFeatures::REPAIRED;
    }
    dug
}

/// Teleport or absorb every room still unreachable after carving
fn fallback_pass(layout: &mut DungeonLayout, config: &GeneratorConfig, report: &mut RepairReport) {
    let mut analysis = analyze_logical(layout);
    let pending = analysis.unreachable_rooms.clone();

    for id in pending {
        if analysis.is_room_reachable(layout.room(id)) || Some(id) == layout.entrance_room() {
            continue;
        }
        let teleported = config.teleport_fallback && {
            let walking = analyze(layout);
            place_teleport(layout, id, &walking).is_some()
        };
        if teleported {
            report.teleports += 1;
        } else {
            absorb_room(layout, id);
            report.absorbed += 1;
        }
        analysis = analyze_logical(layout);
    }
}

fn door_guarantee_pass(layout: &mut DungeonLayout, rng: &mut GameRng, report: &mut RepairReport) {
    let doorless: Vec<RoomId> = layout
        .live_rooms()
        .map(|room| room.id)
        .filter(|&id| !layout.has_door(id))
        .collect();

    for id in doorless {
        if add_stub_door(layout, id, rng) {
            report.stubs += 1;
        } else if Some(id) != layout.entrance_room() {
            absorb_room(layout, id);
            report.absorbed += 1;
        }
    }
}

/// Absorb whatever is still not logically reachable
fn confirm_pass(layout: &mut DungeonLayout, report: &mut RepairReport) {
    let entrance_room = layout.entrance_room();
    for _ in 0..=layout.rooms.len() {
        let pending: Vec<RoomId> = analyze_logical(layout)
            .unreachable_rooms
            .into_iter()
            .filter(|&id| Some(id) != entrance_room)
            .collect();
        if pending.is_empty() {
            break;
        }
        for id in pending {
            absorb_room(layout, id);
            report.absorbed += 1;
        }
    }
}

/// Give a doorless room one door and a single outward tunnel cell
///
/// Returns false when the room has no wall cell that can take a door.
pub fn add_stub_door(layout: &mut DungeonLayout, room: RoomId, rng: &mut GameRng) -> bool {
    let grid = &layout.grid;
    let candidates: Vec<(Pos, Pos)> = layout
        .room(room)
        .ring_sides()
        .into_iter()
        .filter(|&(pos, _)| okdoor(grid, pos))
        .filter_map(|(pos, side)| {
            let out = grid.step(pos, side)?;
            let kind = grid.kind(out.0, out.1);
            let usable = kind == CellKind::Tunnel
                || (kind.is_carvable() && !grid.any_neighbor4(out, |c| c.is_room_interior()));
            usable.then_some((pos, out))
        })
        .collect();

    let Some(&(door, out)) = rng.choose(&candidates) else {
        return false;
    };
    let grid = &mut layout.grid;
    grid.set_kind(door.0, door.1, CellKind::Door);
    grid.cell_mut(door.0, door.1).features |= CellFeatures::STUB;
    if grid.kind(out.0, out.1).is_carvable() {
        grid.set_kind(out.0, out.1, CellKind::Tunnel);
        grid.cell_mut(out.0, out.1).features |= CellFeatures::STUB;
    }
    trace!(room = room.0, ?door, "added stub door");
    true
}

/// Merge a room into the corridor network
///
/// Floor, pads and doors of the room become tunnel. Teleport pairs touching
/// the room are dropped and their other pad reverts to floor.
pub fn absorb_room(layout: &mut DungeonLayout, room: RoomId) {
    let removed = {
        let grid = &layout.grid;
        layout.teleports.remove_where(|pair| {
            [pair.a, pair.b]
                .iter()
                .any(|&(x, y)| grid.cell(x, y).room == Some(room))
        })
    };
    for pair in removed {
        for (x, y) in [pair.a, pair.b] {
            let owner = layout.grid.cell(x, y).room;
            if owner != Some(room) && layout.grid.kind(x, y) == CellKind::TeleportPad {
                layout.grid.set_kind(x, y, CellKind::Room);
                if let Some(other) = owner
                    && layout.room(other).state == RoomState::Teleported
                {
                    layout.room_mut(other).state = RoomState::Reachable;
                }
            }
        }
    }

    let target = *layout.room(room);
    let grid = &mut layout.grid;
    for (pos, _) in target.ring_sides() {
        if grid.kind(pos.0, pos.1).is_door() {
            grid.set_kind(pos.0, pos.1, CellKind::Tunnel);
            grid.cell_mut(pos.0, pos.1).features |= CellFeatures::ABSORBED;
        }
    }
    for (x, y) in target.bounds.positions() {
        if grid.cell(x, y).room == Some(room) {
            grid.set_kind(x, y, CellKind::Tunnel);
            grid.cell_mut(x, y).features |= CellFeatures::ABSORBED;
        }
    }

    let target = layout.room_mut(room);
    target.state = RoomState::Absorbed;
    target.component = None;
    debug!(room = room.0, "absorbed room into corridors");
}
