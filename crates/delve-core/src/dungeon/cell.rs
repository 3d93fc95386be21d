//! Map cell types

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::consts::{
    S_CAVE, S_DOOR, S_LOCKED_DOOR, S_ROOM, S_SECRET_DOOR, S_TELEPORT, S_TUNNEL, S_WALL,
};

/// Arena index of a room inside a generation result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(pub usize);

/// Cell/terrain kind
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum CellKind {
    Room = 0,
    #[default]
    Wall = 1,
    Tunnel = 2,
    Door = 3,
    LockedDoor = 4,
    SecretDoor = 5,
    Cave = 6,
    TeleportPad = 7,
}

impl CellKind {
    /// Check if an occupant can enter this cell
    pub const fn is_walkable(&self) -> bool {
        match self {
            CellKind::Room
            | CellKind::Tunnel
            | CellKind::Door
            | CellKind::LockedDoor
            | CellKind::TeleportPad => true,
            CellKind::Wall | CellKind::SecretDoor | CellKind::Cave => false,
        }
    }

    /// Door kinds that take part in the door invariant
    pub const fn is_door(&self) -> bool {
        matches!(self, CellKind::Door | CellKind::LockedDoor)
    }

    /// Walkable cells that are not room floor: what a door must open onto
    pub const fn is_passage(&self) -> bool {
        matches!(
            self,
            CellKind::Tunnel | CellKind::Door | CellKind::LockedDoor | CellKind::TeleportPad
        )
    }

    /// Can a corridor be dug through this cell
    pub const fn is_carvable(&self) -> bool {
        matches!(self, CellKind::Wall | CellKind::Cave)
    }

    /// Get the display character for this cell kind
    pub const fn symbol(&self) -> char {
        match self {
            CellKind::Room => S_ROOM,
            CellKind::Wall => S_WALL,
            CellKind::Tunnel => S_TUNNEL,
            CellKind::Door => S_DOOR,
            CellKind::LockedDoor => S_LOCKED_DOOR,
            CellKind::SecretDoor => S_SECRET_DOOR,
            CellKind::Cave => S_CAVE,
            CellKind::TeleportPad => S_TELEPORT,
        }
    }
}

bitflags! {
    /// Optional per-cell feature tags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct CellFeatures: u8 {
        const ENTRANCE = 0x01;
        /// Carved by the connectivity repairer
        const REPAIRED = 0x02;
        /// Door or tunnel added so a room has at least one door
        const STUB = 0x04;
        /// Former room cell merged into the corridor network
        const ABSORBED = 0x08;
    }
}

impl CellFeatures {
    /// Lower-case feature names, for the serialization boundary
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names()
            .map(|(name, _)| match name {
                "ENTRANCE" => "entrance",
                "REPAIRED" => "repaired",
                "STUB" => "stub",
                "ABSORBED" => "absorbed",
                _ => "unknown",
            })
            .collect()
    }
}

// Manual serde impl for CellFeatures
impl Serialize for CellFeatures {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CellFeatures {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(CellFeatures::from_bits_truncate(bits))
    }
}

/// A single map cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Terrain kind
    pub kind: CellKind,

    /// Feature tags
    pub features: CellFeatures,

    /// Owning room (room floor and teleport pads inside rooms)
    pub room: Option<RoomId>,
}

impl Cell {
    /// Create a wall cell
    pub const fn wall() -> Self {
        Self {
            kind: CellKind::Wall,
            features: CellFeatures::empty(),
            room: None,
        }
    }

    /// Create a floor cell owned by a room
    pub const fn floor(room: RoomId) -> Self {
        Self {
            kind: CellKind::Room,
            features: CellFeatures::empty(),
            room: Some(room),
        }
    }

    /// Check if walkable
    pub const fn is_walkable(&self) -> bool {
        self.kind.is_walkable()
    }

    /// Room floor or a pad set into a room floor
    pub const fn is_room_interior(&self) -> bool {
        match self.kind {
            CellKind::Room => true,
            CellKind::TeleportPad => self.room.is_some(),
            _ => false,
        }
    }
}
