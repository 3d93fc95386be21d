//! Rooms and room placement

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::config::GeneratorConfig;
use crate::consts::ROOM_MARGIN;
use crate::rng::GameRng;

use super::{Cell, Grid, Pos, Rect, RoomId, Side};

/// How a room ended up connected to the entrance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
pub enum RoomState {
    /// Reachable by walking from the entrance
    #[default]
    Reachable,
    /// Reachable only through a teleport pad pair
    Teleported,
    /// Merged into the corridor network; no longer a distinct room
    Absorbed,
}

/// A rectangular room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// Interior floor cells (walls excluded)
    pub bounds: Rect,
    pub centroid: Pos,
    /// Walkable component id assigned by the final analysis
    pub component: Option<usize>,
    pub state: RoomState,
}

impl Room {
    pub fn new(id: RoomId, bounds: Rect) -> Self {
        Self {
            id,
            bounds,
            centroid: bounds.center(),
            component: None,
            state: RoomState::Reachable,
        }
    }

    pub fn is_absorbed(&self) -> bool {
        self.state == RoomState::Absorbed
    }

    pub fn area(&self) -> usize {
        self.bounds.area()
    }

    /// Squared centroid distance to another room
    pub fn distance2(&self, other: &Room) -> u64 {
        let dx = self.centroid.0.abs_diff(other.centroid.0) as u64;
        let dy = self.centroid.1.abs_diff(other.centroid.1) as u64;
        dx * dx + dy * dy
    }

    /// Wall-ring cells orthogonally adjacent to the interior, with the side
    /// they sit on. Order: north, east, south, west, each scanned ascending.
    ///
    /// Corners are excluded since they touch the interior only diagonally.
    pub fn ring_sides(&self) -> Vec<(Pos, Side)> {
        let r = self.bounds;
        let mut out = Vec::with_capacity(2 * (r.width() + r.height()));
        if r.ly > 0 {
            out.extend((r.lx..=r.hx).map(|x| ((x, r.ly - 1), Side::North)));
        }
        out.extend((r.ly..=r.hy).map(|y| ((r.hx + 1, y), Side::East)));
        out.extend((r.lx..=r.hx).map(|x| ((x, r.hy + 1), Side::South)));
        if r.lx > 0 {
            out.extend((r.ly..=r.hy).map(|y| ((r.lx - 1, y), Side::West)));
        }
        out
    }

    /// The ring cell on `side` closest to `toward`
    pub fn door_cell(&self, side: Side, toward: Pos) -> Pos {
        let r = self.bounds;
        let x = toward.0.clamp(r.lx, r.hx);
        let y = toward.1.clamp(r.ly, r.hy);
        match side {
            Side::North => (x, r.ly - 1),
            Side::East => (r.hx + 1, y),
            Side::South => (x, r.hy + 1),
            Side::West => (r.lx - 1, y),
        }
    }
}

/// Pick a size for one axis of a room inside a span of `avail` cells
fn room_extent(avail: usize, config: &GeneratorConfig, rng: &mut GameRng) -> usize {
    let max = avail.min(config.max_room_size).max(config.min_room_size.min(avail));
    let min = config
        .min_room_size
        .max(max * config.room_fill_min_percent / 100)
        .min(max);
    rng.between(min, max)
}

/// Place one jittered room per accepted leaf and carve it into the grid
///
/// Draw order per leaf: width, height, x, y.
pub fn place_rooms(
    grid: &mut Grid,
    leaves: &[Rect],
    config: &GeneratorConfig,
    rng: &mut GameRng,
) -> Vec<Room> {
    let mut rooms = Vec::with_capacity(leaves.len());

    for leaf in leaves {
        let avail_w = leaf.width().saturating_sub(2 * ROOM_MARGIN);
        let avail_h = leaf.height().saturating_sub(2 * ROOM_MARGIN);
        if avail_w == 0 || avail_h == 0 {
            continue;
        }

        let w = room_extent(avail_w, config, rng);
        let h = room_extent(avail_h, config, rng);
        let x = leaf.lx + ROOM_MARGIN + rng.between(0, avail_w - w);
        let y = leaf.ly + ROOM_MARGIN + rng.between(0, avail_h - h);

        let id = RoomId(rooms.len());
        let room = Room::new(id, Rect::new(x, y, x + w - 1, y + h - 1));
        for (cx, cy) in room.bounds.positions() {
            *grid.cell_mut(cx, cy) = Cell::floor(id);
        }
        rooms.push(room);
    }

    rooms
}
