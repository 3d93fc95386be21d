//! Working state of one generation run

use serde::{Deserialize, Serialize};

use super::{Grid, Pos, Rect, Room, RoomId, TeleportTable};

/// Grid plus the arena-indexed rooms and teleport pairs carved into it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonLayout {
    pub grid: Grid,
    /// Rooms indexed by `RoomId`
    pub rooms: Vec<Room>,
    pub entrance: Pos,
    pub teleports: TeleportTable,
}

impl DungeonLayout {
    /// Wrap a grid and its rooms; the entrance is the first room's centroid
    pub fn new(grid: Grid, rooms: Vec<Room>) -> Self {
        let entrance = rooms.first().map_or((0, 0), |room| room.centroid);
        Self {
            grid,
            rooms,
            entrance,
            teleports: TeleportTable::default(),
        }
    }

    /// Rectangle covering the whole grid
    pub fn full_region(&self) -> Rect {
        Rect::new(0, 0, self.grid.width() - 1, self.grid.height() - 1)
    }

    pub fn room(&self, id: RoomId) -> &Room {
        &self.rooms[id.0]
    }

    pub fn room_mut(&mut self, id: RoomId) -> &mut Room {
        &mut self.rooms[id.0]
    }

    /// Room owning the entrance cell
    pub fn entrance_room(&self) -> Option<RoomId> {
        self.grid.cell(self.entrance.0, self.entrance.1).room
    }

    /// Rooms that still exist as rooms
    pub fn live_rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter().filter(|room| !room.is_absorbed())
    }

    /// Door cells in a room's wall ring
    pub fn room_doors(&self, id: RoomId) -> Vec<Pos> {
        self.room(id)
            .ring_sides()
            .into_iter()
            .map(|(pos, _)| pos)
            .filter(|&(x, y)| self.grid.kind(x, y).is_door())
            .collect()
    }

    pub fn has_door(&self, id: RoomId) -> bool {
        !self.room_doors(id).is_empty()
    }
}
