//! Layout invariant checks

use serde::Serialize;
use thiserror::Error;

use super::connectivity::analyze_logical;
use super::door::{has_passage, room_neighbor_count};
use super::{CellKind, DungeonLayout, Pos, RoomId, Side};

/// A broken layout invariant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
pub enum Violation {
    #[error("door at {pos:?} borders {rooms} room cells")]
    DoorRoomCount { pos: Pos, rooms: usize },

    #[error("door at {pos:?} opens onto nothing")]
    DoorWithoutPassage { pos: Pos },

    #[error("tunnel at {pos:?} touches room floor")]
    TunnelTouchesRoom { pos: Pos },

    #[error("room floor at {pos:?} touches another room at {other:?}")]
    RoomFusion { pos: Pos, other: Pos },

    #[error("room {} has no door", room.0)]
    RoomWithoutDoor { room: RoomId },

    #[error("entrance {pos:?} is not on room floor")]
    EntranceNotInRoom { pos: Pos },

    #[error("room {} is unreachable", room.0)]
    RoomUnreachable { room: RoomId },
}

/// Check every invariant, cells first in row-major order, then rooms
pub fn check_layout(layout: &DungeonLayout) -> Vec<Violation> {
    let grid = &layout.grid;
    let mut out = Vec::new();

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let pos = (x, y);
            let cell = grid.cell(x, y);
            match cell.kind {
                CellKind::Door | CellKind::LockedDoor => {
                    let rooms = room_neighbor_count(grid, pos);
                    if rooms != 1 {
                        out.push(Violation::DoorRoomCount { pos, rooms });
                    }
                    if !has_passage(grid, pos) {
                        out.push(Violation::DoorWithoutPassage { pos });
                    }
                }
                CellKind::Tunnel => {
                    if grid.any_neighbor4(pos, |c| c.is_room_interior()) {
                        out.push(Violation::TunnelTouchesRoom { pos });
                    }
                }
                CellKind::Room | CellKind::TeleportPad if cell.room.is_some() => {
                    // East and south only, so each touching pair is reported once
                    for side in [Side::East, Side::South] {
                        if let Some(other) = grid.step(pos, side) {
                            let neighbor = grid.cell(other.0, other.1);
                            if neighbor.is_room_interior() && neighbor.room != cell.room {
                                out.push(Violation::RoomFusion { pos, other });
                            }
                        }
                    }
                }
                CellKind::Room
                | CellKind::TeleportPad
                | CellKind::Wall
                | CellKind::SecretDoor
                | CellKind::Cave => {}
            }
        }
    }

    for room in layout.live_rooms() {
        if !layout.has_door(room.id) {
            out.push(Violation::RoomWithoutDoor { room: room.id });
        }
    }

    let entrance = layout.entrance;
    let entrance_ok = grid.is_walkable(entrance.0, entrance.1)
        && layout
            .entrance_room()
            .is_some_and(|id| !layout.room(id).is_absorbed());
    if !entrance_ok {
        out.push(Violation::EntranceNotInRoom { pos: entrance });
    }

    for room in analyze_logical(layout).unreachable_rooms {
        out.push(Violation::RoomUnreachable { room });
    }
    out
}
