//! Dungeon layout system
//!
//! Contains the cell grid, rooms, and every pipeline phase that turns an
//! empty grid into a connected layout.

mod cell;
mod connectivity;
mod corridor;
mod door;
mod graph;
mod grid;
mod layout;
mod prune;
mod rect;
mod repair;
mod room;
mod teleport;
mod validate;

pub use cell::{Cell, CellFeatures, CellKind, RoomId};
pub use connectivity::{analyze, analyze_logical, flood_fill, label_components, Analysis};
pub use corridor::{bydoor, carve_corridors, carve_path, corridor_path, facing_sides, okdoor, CarveStats};
pub use door::{facing_room, has_passage, normalize_doors, room_neighbor_count, DoorStats};
pub use graph::{build_graph, ConnectivityTracker, CorridorGraph, GraphEdge};
pub use grid::{row_major, Grid, Pos, Side};
pub use layout::DungeonLayout;
pub use prune::{prune, PruneStats};
pub use rect::{is_usable_leaf, partition, Partition, Rect};
pub use repair::{absorb_room, add_stub_door, find_repair_path, repair, RepairReport};
pub use room::{place_rooms, Room, RoomState};
pub use teleport::{pad_candidates, place_teleport, TeleportPair, TeleportTable};
pub use validate::{check_layout, Violation};
