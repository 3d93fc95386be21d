//! Layout constants
//!
//! Values here are structural: the invariants of a generated layout depend on
//! them, so they are not exposed through `GeneratorConfig`.

/// Smallest accepted grid side
pub const MIN_DIMENSION: usize = 8;

/// Largest accepted grid side
pub const MAX_DIMENSION: usize = 200;

/// Wall cells kept between a room interior and the edge of its leaf.
///
/// Two adjacent leaves therefore keep at least four cells between their rooms:
/// a wall ring and a corridor lane on each side.
pub const ROOM_MARGIN: usize = 2;

/// Upper bound on finalize guard passes
pub const MAX_FINALIZE_PASSES: usize = 3;

/// Map symbols
pub const S_ROOM: char = '.';
pub const S_WALL: char = '#';
pub const S_TUNNEL: char = ',';
pub const S_DOOR: char = '+';
pub const S_LOCKED_DOOR: char = '=';
pub const S_SECRET_DOOR: char = 'S';
pub const S_CAVE: char = '~';
pub const S_TELEPORT: char = '^';
pub const S_ENTRANCE: char = '@';
