use delve_core::dungeon::{analyze_logical, room_neighbor_count, CellKind, RoomState};
use delve_core::{
    generate, generate_with_config, hash_seed, parse_seed, validate, GenerateError,
    GeneratorConfig, LayoutExport, RepairMode,
};

fn door_count(result: &delve_core::GenerationResult) -> usize {
    let grid = result.grid();
    grid.count_kind(CellKind::Door) + grid.count_kind(CellKind::LockedDoor)
}

#[test]
fn test_seed_12345_at_40x40() {
    let result = generate(12345, 40, 40).unwrap();
    let grid = result.grid();
    let (ex, ey) = result.entrance();

    assert!(grid.is_walkable(ex, ey));
    let owner = grid.cell(ex, ey).room.expect("entrance has an owning room");
    assert_ne!(result.rooms()[owner.0].state, RoomState::Absorbed);

    assert!(!result.rooms().is_empty());
    assert!(door_count(&result) > 0);

    // Full-grid orphan scan
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if grid.kind(x, y).is_door() {
                assert_eq!(room_neighbor_count(grid, (x, y)), 1, "door at {:?}", (x, y));
                assert!(
                    grid.any_neighbor4((x, y), |c| c.kind.is_passage()),
                    "orphan door at {:?}",
                    (x, y)
                );
            }
        }
    }
    assert!(validate(&result).is_empty());
}

#[test]
fn test_text_seed_matches_hashed_integer() {
    let seed = parse_seed("alpha").unwrap();
    assert_eq!(seed, hash_seed("alpha"));

    let from_text = generate(seed, 40, 40).unwrap();
    let from_int = generate(hash_seed("alpha"), 40, 40).unwrap();
    assert!(from_text.grid().diff(from_int.grid()).is_empty());
    assert_eq!(from_text, from_int);
}

#[test]
fn test_degenerate_8x8() {
    let result = generate(1, 8, 8).unwrap();
    assert!(result.rooms().iter().any(|room| room.state != RoomState::Absorbed));
    assert!(validate(&result).is_empty(), "{:?}", validate(&result));

    for seed in 0..50 {
        let result = generate(seed, 8, 8).unwrap();
        assert!(validate(&result).is_empty(), "seed {seed}");
    }
}

#[test]
fn test_rerun_has_no_differences() {
    for (seed, w, h) in [(0, 40, 40), (77, 120, 60), (u64::MAX, 33, 9), (9001, 200, 200)] {
        let a = generate(seed, w, h).unwrap();
        let b = generate(seed, w, h).unwrap();
        assert!(a.grid().diff(b.grid()).is_empty(), "seed {seed}");
        assert_eq!(a.rooms(), b.rooms());
        assert_eq!(a.teleports(), b.teleports());
        assert_eq!(a.entrance(), b.entrance());
    }
}

#[test]
fn test_different_seeds_differ() {
    let a = generate(1, 60, 40).unwrap();
    let b = generate(2, 60, 40).unwrap();
    assert!(!a.grid().diff(b.grid()).is_empty());
}

#[test]
fn test_many_sizes_are_valid() {
    for seed in 0..25u64 {
        for (w, h) in [(8, 40), (40, 8), (16, 16), (64, 48), (100, 30)] {
            let result = generate(seed, w, h).unwrap();
            let violations = validate(&result);
            assert!(violations.is_empty(), "seed {seed} {w}x{h}: {violations:?}");
            assert_eq!(result.metrics().counter("finalize.fixes"), 0, "seed {seed} {w}x{h}");
        }
    }
}

#[test]
fn test_absorb_fallback_without_teleports() {
    let config = GeneratorConfig {
        teleport_fallback: false,
        ..Default::default()
    };
    for seed in 0..30 {
        let result = generate_with_config(seed, 70, 50, &config).unwrap();
        assert!(result.teleports().is_empty());
        assert!(validate(&result).is_empty(), "seed {seed}");
    }
}

#[test]
fn test_hidden_areas_rely_on_teleports_or_absorption() {
    let config = GeneratorConfig {
        repair_mode: RepairMode::HiddenArea,
        ..Default::default()
    };
    for seed in 0..30 {
        let result = generate_with_config(seed, 70, 50, &config).unwrap();
        let logical = analyze_logical(result.layout());
        assert!(logical.all_rooms_reachable(), "seed {seed}");
        for room in result.rooms() {
            if room.state == RoomState::Teleported {
                assert!(result
                    .teleports()
                    .iter()
                    .any(|pair| room.bounds.contains_pos(pair.a)));
            }
        }
    }
}

#[test]
fn test_invalid_sizes_rejected() {
    for (w, h) in [(0, 0), (7, 8), (8, 7), (201, 40)] {
        assert!(matches!(
            generate(1, w, h),
            Err(GenerateError::InvalidDimensions { .. })
        ));
    }
}

#[test]
fn test_export_is_row_major() {
    let result = generate(12345, 40, 24).unwrap();
    let export = LayoutExport::from(&result);
    for (y, row) in export.cells.iter().enumerate() {
        for (x, kind) in row.iter().enumerate() {
            assert_eq!(*kind, result.grid().kind(x, y));
        }
    }
    assert_eq!(export.teleports, result.teleports());
}
