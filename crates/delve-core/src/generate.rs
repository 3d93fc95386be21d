//! Generation pipeline
//!
//! `generate` runs every phase in a fixed order over one RNG:
//! partition, place, graph, carve, normalize, analyze, repair, prune and
//! finalize. Inputs are validated up front; after that a run always succeeds.

use tracing::{debug, info_span, warn};

use crate::config::GeneratorConfig;
use crate::consts::MAX_FINALIZE_PASSES;
use crate::dungeon::{
    absorb_room, add_stub_door, analyze, build_graph, carve_corridors, check_layout,
    label_components, normalize_doors, partition, place_rooms, prune, repair, CellFeatures,
    CellKind, DungeonLayout, Grid, Pos, Room, RoomId, TeleportPair, TeleportTable, Violation,
};
use crate::error::GenerateError;
use crate::metrics::{Metrics, Phase};
use crate::rng::GameRng;

/// A finished layout plus the diagnostics of the run that built it
#[derive(Debug, Clone)]
pub struct GenerationResult {
    layout: DungeonLayout,
    metrics: Metrics,
    seed: u64,
}

impl GenerationResult {
    pub fn grid(&self) -> &Grid {
        &self.layout.grid
    }

    pub fn layout(&self) -> &DungeonLayout {
        &self.layout
    }

    pub fn entrance(&self) -> Pos {
        self.layout.entrance
    }

    /// All rooms, absorbed ones included, indexed by `RoomId`
    pub fn rooms(&self) -> &[Room] {
        &self.layout.rooms
    }

    pub fn teleports(&self) -> &[TeleportPair] {
        self.layout.teleports.pairs()
    }

    pub fn teleport_table(&self) -> &TeleportTable {
        &self.layout.teleports
    }

    /// Where stepping onto `pos` sends the player, if it is a teleport pad
    pub fn teleport_destination(&self, pos: Pos) -> Option<Pos> {
        self.layout.teleports.destination(pos)
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn width(&self) -> usize {
        self.layout.grid.width()
    }

    pub fn height(&self) -> usize {
        self.layout.grid.height()
    }
}

// Metrics are diagnostics only
impl PartialEq for GenerationResult {
    fn eq(&self, other: &Self) -> bool {
        self.seed == other.seed && self.layout == other.layout
    }
}

impl Eq for GenerationResult {}

/// Generate a layout with the default configuration
pub fn generate(seed: u64, width: usize, height: usize) -> Result<GenerationResult, GenerateError> {
    generate_with_config(seed, width, height, &GeneratorConfig::default())
}

/// Generate a layout with explicit options
pub fn generate_with_config(
    seed: u64,
    width: usize,
    height: usize,
    config: &GeneratorConfig,
) -> Result<GenerationResult, GenerateError> {
    config.validate()?;
    config.check_dimensions(width, height)?;

    let _span = info_span!("generate", seed, width, height).entered();
    let mut rng = GameRng::new(seed);
    let mut metrics = Metrics::new(config.collect_metrics);

    let part = metrics.time(Phase::Partition, || partition(width, height, config, &mut rng));
    metrics.add("partition.leaves", part.leaves.len());
    metrics.add("partition.rejected", part.rejected);
    metrics.add("partition.depth", part.depth as usize);

    let mut grid = Grid::new(width, height);
    let rooms = metrics.time(Phase::Place, || place_rooms(&mut grid, &part.leaves, config, &mut rng));
    metrics.add("rooms.placed", rooms.len());

    let graph = metrics.time(Phase::Graph, || build_graph(&rooms, config, &mut rng));
    metrics.add("graph.candidates", graph.candidates);
    metrics.add("graph.tree_edges", graph.tree.len());
    metrics.add("graph.loop_edges", graph.loops.len());

    let carved = metrics.time(Phase::Carve, || {
        carve_corridors(&mut grid, &rooms, &graph, config, &mut rng)
    });
    metrics.add("carve.corridors", carved.corridors);
    metrics.add("carve.cells", carved.cells);

    let mut layout = DungeonLayout::new(grid, rooms);
    let region = layout.full_region();
    let doors = metrics.time(Phase::Normalize, || {
        normalize_doors(&mut layout.grid, region, config, &mut rng)
    });
    metrics.add("doors.promoted", doors.promoted);
    metrics.add("doors.blocked", doors.blocked);
    metrics.add("doors.chain_removed", doors.chain_removed);
    metrics.add("doors.cluster_removed", doors.cluster_removed);
    metrics.add("doors.orphans_walled", doors.orphans_walled);
    metrics.add("doors.orphans_carved", doors.orphans_carved);

    let initial = metrics.time(Phase::Analyze, || analyze(&layout));
    metrics.add("analyze.unreachable_rooms", initial.unreachable_rooms.len());
    metrics.add("analyze.reached_cells", initial.reached_cells);

    let report = metrics.time(Phase::Repair, || repair(&mut layout, config, &mut rng));
    metrics.add("repair.attempts", report.attempts as usize);
    metrics.add("repair.carved", report.carved);
    metrics.add("repair.carved_cells", report.carved_cells);
    metrics.add("repair.teleports", report.teleports);
    metrics.add("repair.absorbed", report.absorbed);
    metrics.add("repair.stub_doors", report.stubs);
    metrics.add("repair.doors_removed", report.doors.removed());

    let pruned = metrics.time(Phase::Prune, || prune(&mut layout, config));
    metrics.add("prune.pockets", pruned.pockets);
    metrics.add("prune.cells", pruned.pocket_cells + pruned.nubs);

    let fixes = metrics.time(Phase::Finalize, || finalize(&mut layout, config, &mut rng));
    metrics.add("finalize.fixes", fixes);
    metrics.add("doors.locked", layout.grid.count_kind(CellKind::LockedDoor));
    metrics.add(
        "doors.total",
        layout.grid.count_kind(CellKind::Door) + layout.grid.count_kind(CellKind::LockedDoor),
    );
    metrics.add("rooms.final", layout.live_rooms().count());

    debug!(
        rooms = layout.live_rooms().count(),
        teleports = layout.teleports.len(),
        "generation finished"
    );
    Ok(GenerationResult { layout, metrics, seed })
}

/// Check a result against every layout invariant
pub fn validate(result: &GenerationResult) -> Vec<Violation> {
    check_layout(&result.layout)
}

/// Lock doors, run the invariant guard and stamp the entrance.
/// Returns the number of fixes the guard applied.
fn finalize(layout: &mut DungeonLayout, config: &GeneratorConfig, rng: &mut GameRng) -> usize {
    lock_doors(&mut layout.grid, config.locked_door_percent, rng);

    let mut fixes = 0;
    for pass in 0..MAX_FINALIZE_PASSES {
        let violations = check_layout(layout);
        if violations.is_empty() {
            break;
        }
        warn!(pass, count = violations.len(), "layout invariants broken, applying fallbacks");
        for violation in violations {
            fixes += usize::from(fix_violation(layout, violation, rng));
        }
    }

    let (x, y) = layout.entrance;
    layout.grid.cell_mut(x, y).features |= CellFeatures::ENTRANCE;
    let components = label_components(&layout.grid, &mut layout.rooms);
    debug!(components, fixes, "finalized layout");
    fixes
}

fn lock_doors(grid: &mut Grid, percent: u32, rng: &mut GameRng) {
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if grid.kind(x, y) == CellKind::Door && rng.percent(percent) {
                grid.set_kind(x, y, CellKind::LockedDoor);
            }
        }
    }
}

/// Apply the closed fallback for one violation; false when nothing changed
fn fix_violation(layout: &mut DungeonLayout, violation: Violation, rng: &mut GameRng) -> bool {
    warn!(%violation, "finalize fallback");
    match violation {
        Violation::DoorRoomCount { pos: (x, y), .. }
        | Violation::DoorWithoutPassage { pos: (x, y) }
        | Violation::TunnelTouchesRoom { pos: (x, y) }
        | Violation::RoomFusion { pos: (x, y), .. } => {
            if layout.grid.kind(x, y) == CellKind::Wall {
                return false;
            }
            layout.grid.set_kind(x, y, CellKind::Wall);
            true
        }
        Violation::RoomWithoutDoor { room } => {
            if layout.room(room).is_absorbed() {
                return false;
            }
            add_stub_door(layout, room, rng) || absorb_unless_entrance(layout, room)
        }
        Violation::RoomUnreachable { room } => absorb_unless_entrance(layout, room),
        Violation::EntranceNotInRoom { .. } => false,
    }
}

fn absorb_unless_entrance(layout: &mut DungeonLayout, room: RoomId) -> bool {
    if Some(room) == layout.entrance_room() || layout.room(room).is_absorbed() {
        return false;
    }
    absorb_room(layout, room);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepairMode;
    use crate::dungeon::{Cell, Rect};

    #[test]
    fn test_rejects_bad_dimensions() {
        assert!(matches!(
            generate(1, 7, 40),
            Err(GenerateError::InvalidDimensions { width: 7, .. })
        ));
        assert!(generate(1, 40, 500).is_err());
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = GeneratorConfig {
            knn_k: 0,
            ..Default::default()
        };
        assert!(matches!(
            generate_with_config(1, 40, 40, &config),
            Err(GenerateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_result_accessors() {
        let result = generate(99, 48, 32).unwrap();
        assert_eq!(result.seed(), 99);
        assert_eq!((result.width(), result.height()), (48, 32));
        assert!(!result.rooms().is_empty());
        let (x, y) = result.entrance();
        assert!(result.grid().cell(x, y).features.contains(CellFeatures::ENTRANCE));
        assert!(validate(&result).is_empty());
    }

    #[test]
    fn test_metrics_do_not_affect_equality() {
        let with = generate(5, 40, 40).unwrap();
        let config = GeneratorConfig {
            collect_metrics: false,
            ..Default::default()
        };
        let without = generate_with_config(5, 40, 40, &config).unwrap();
        assert_eq!(with, without);
        assert!(with.metrics().counter("rooms.placed") > 0);
        assert!(without.metrics().counters().is_empty());
    }

    #[test]
    fn test_door_passes_counted_separately() {
        let config = GeneratorConfig {
            cluster_threshold: 2,
            ..Default::default()
        };
        for seed in 0..10 {
            let result = generate_with_config(seed, 64, 48, &config).unwrap();
            let metrics = result.metrics();
            for key in [
                "doors.chain_removed",
                "doors.cluster_removed",
                "doors.orphans_walled",
                "doors.orphans_carved",
                "repair.doors_removed",
            ] {
                assert!(metrics.counters().contains_key(key), "missing {key}");
            }
            assert!(!metrics.counters().contains_key("doors.removed"));
            assert!(validate(&result).is_empty(), "seed {seed}");
        }
    }

    #[test]
    fn test_teleport_destination_round_trip() {
        for seed in 0..40 {
            let result = generate(seed, 60, 40).unwrap();
            for pair in result.teleports() {
                assert_eq!(result.teleport_destination(pair.a), Some(pair.b));
                assert_eq!(result.teleport_destination(pair.b), Some(pair.a));
            }
        }
    }

    #[test]
    fn test_hidden_mode_stays_valid() {
        let config = GeneratorConfig {
            repair_mode: RepairMode::HiddenArea,
            ..Default::default()
        };
        for seed in 0..20 {
            let result = generate_with_config(seed, 50, 36, &config).unwrap();
            assert!(validate(&result).is_empty(), "seed {seed}");
        }
    }

    #[test]
    fn test_finalize_walls_orphan_door() {
        let mut grid = Grid::new(16, 10);
        let room = Room::new(RoomId(0), Rect::new(3, 3, 6, 6));
        for (x, y) in room.bounds.positions() {
            *grid.cell_mut(x, y) = Cell::floor(RoomId(0));
        }
        grid.set_kind(7, 4, CellKind::Door);
        grid.set_kind(8, 4, CellKind::Tunnel);
        grid.set_kind(4, 2, CellKind::Door);
        let mut layout = DungeonLayout::new(grid, vec![room]);
        let config = GeneratorConfig {
            locked_door_percent: 0,
            ..Default::default()
        };

        let fixes = finalize(&mut layout, &config, &mut GameRng::new(1));
        assert_eq!(fixes, 1);
        assert_eq!(layout.grid.kind(4, 2), CellKind::Wall);
        assert!(check_layout(&layout).is_empty());
        assert_eq!(layout.rooms[0].component, Some(0));
    }

    #[test]
    fn test_lock_doors_all_or_nothing() {
        let mut grid = Grid::new(10, 10);
        grid.set_kind(2, 2, CellKind::Door);
        grid.set_kind(5, 5, CellKind::Door);
        let mut locked = grid.clone();
        lock_doors(&mut grid, 0, &mut GameRng::new(3));
        lock_doors(&mut locked, 100, &mut GameRng::new(3));
        assert_eq!(grid.count_kind(CellKind::LockedDoor), 0);
        assert_eq!(locked.count_kind(CellKind::LockedDoor), 2);
    }
}
