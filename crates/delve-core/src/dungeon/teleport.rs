//! Teleport pad pairs
//!
//! A room that cannot be joined to the corridor network may instead get a
//! pad that sends the occupant to a partner pad in a reachable room, and
//! back. Pads are ordinary walkable cells set into room floors.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::connectivity::Analysis;
use super::{CellKind, DungeonLayout, Grid, Pos, Room, RoomId, RoomState};

/// Two pad coordinates, each the other's destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeleportPair {
    /// Pad inside the room being serviced
    pub a: Pos,
    /// Pad inside the reachable room
    pub b: Pos,
}

impl TeleportPair {
    /// Partner of `pos`, if `pos` is one end of the pair
    pub fn other(&self, pos: Pos) -> Option<Pos> {
        if pos == self.a {
            Some(self.b)
        } else if pos == self.b {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Ordered pair list with bidirectional lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TeleportPair>", into = "Vec<TeleportPair>")]
pub struct TeleportTable {
    pairs: Vec<TeleportPair>,
    lookup: HashMap<Pos, Pos>,
}

impl From<Vec<TeleportPair>> for TeleportTable {
    fn from(pairs: Vec<TeleportPair>) -> Self {
        let mut table = TeleportTable::default();
        for pair in pairs {
            table.register(pair);
        }
        table
    }
}

impl From<TeleportTable> for Vec<TeleportPair> {
    fn from(table: TeleportTable) -> Self {
        table.pairs
    }
}

impl TeleportTable {
    /// Add a pair; rejected when either end is already a pad or both ends coincide
    pub fn register(&mut self, pair: TeleportPair) -> bool {
        if pair.a == pair.b || self.lookup.contains_key(&pair.a) || self.lookup.contains_key(&pair.b)
        {
            return false;
        }
        self.lookup.insert(pair.a, pair.b);
        self.lookup.insert(pair.b, pair.a);
        self.pairs.push(pair);
        true
    }

    /// Where stepping onto `pos` sends the occupant
    pub fn destination(&self, pos: Pos) -> Option<Pos> {
        self.lookup.get(&pos).copied()
    }

    pub fn pairs(&self) -> &[TeleportPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Drop every pair matching `pred`, returning them in order
    pub fn remove_where(&mut self, pred: impl Fn(&TeleportPair) -> bool) -> Vec<TeleportPair> {
        let (removed, kept): (Vec<_>, Vec<_>) = self.pairs.drain(..).partition(|p| pred(p));
        self.pairs = kept;
        for pair in &removed {
            self.lookup.remove(&pair.a);
            self.lookup.remove(&pair.b);
        }
        removed
    }
}

/// Floor cells of a room that can hold a pad, nearest the centroid first
///
/// A pad never sits next to a door, so every door keeps its one room floor
/// neighbour.
pub fn pad_candidates(grid: &Grid, room: &Room, exclude: Option<Pos>) -> Vec<Pos> {
    let (cx, cy) = room.centroid;
    let mut cells: Vec<Pos> = room
        .bounds
        .positions()
        .filter(|&p| Some(p) != exclude)
        .filter(|&(x, y)| {
            let cell = grid.cell(x, y);
            cell.kind == CellKind::Room && cell.room == Some(room.id)
        })
        .filter(|&p| !grid.any_neighbor4(p, |c| c.kind.is_door()))
        .collect();
    cells.sort_by_key(|&(x, y)| {
        let (dx, dy) = (x.abs_diff(cx), y.abs_diff(cy));
        (dx * dx + dy * dy, y, x)
    });
    cells
}

/// Service `room` with a pad pair leading to the nearest reachable room
///
/// `reachable` must be a walking-only analysis, so destinations never chain
/// through other pads.
pub fn place_teleport(
    layout: &mut DungeonLayout,
    room: RoomId,
    reachable: &Analysis,
) -> Option<TeleportPair> {
    let source = layout.room(room);
    let from = *pad_candidates(&layout.grid, source, None).first()?;

    let mut targets: Vec<&Room> = layout
        .live_rooms()
        .filter(|r| r.id != room && reachable.is_room_reachable(r))
        .collect();
    targets.sort_by_key(|r| (source.distance2(r), r.id));

    let to = targets.iter().find_map(|target| {
        pad_candidates(&layout.grid, target, Some(layout.entrance))
            .first()
            .copied()
    })?;

    let pair = TeleportPair { a: from, b: to };
    if !layout.teleports.register(pair) {
        return None;
    }
    for (x, y) in [from, to] {
        layout.grid.set_kind(x, y, CellKind::TeleportPad);
    }
    layout.room_mut(room).state = RoomState::Teleported;
    debug!(room = room.0, ?from, ?to, "placed teleport pair");
    Some(pair)
}
