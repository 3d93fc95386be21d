//! Plain export of a generated layout for remote clients
//!
//! The grid goes out row-major as cell-kind tags, with the few cells that
//! carry features listed separately.

use serde::Serialize;

use crate::dungeon::{CellKind, Pos, RoomState, TeleportPair};
use crate::generate::GenerationResult;

/// Features of one cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellFeatureExport {
    pub x: usize,
    pub y: usize,
    pub features: Vec<&'static str>,
}

/// One room's interior and status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomExport {
    pub id: usize,
    pub lx: usize,
    pub ly: usize,
    pub hx: usize,
    pub hy: usize,
    pub state: RoomState,
}

/// Serializable snapshot of a `GenerationResult`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutExport {
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub entrance: Pos,
    /// `cells[y][x]`
    pub cells: Vec<Vec<CellKind>>,
    pub features: Vec<CellFeatureExport>,
    pub teleports: Vec<TeleportPair>,
    pub rooms: Vec<RoomExport>,
}

impl LayoutExport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&GenerationResult> for LayoutExport {
    fn from(result: &GenerationResult) -> Self {
        let grid = result.grid();
        let mut features = Vec::new();
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                let cell = grid.cell(x, y);
                if !cell.features.is_empty() {
                    features.push(CellFeatureExport {
                        x,
                        y,
                        features: cell.features.names(),
                    });
                }
            }
        }

        Self {
            seed: result.seed(),
            width: result.width(),
            height: result.height(),
            entrance: result.entrance(),
            cells: grid.rows(),
            features,
            teleports: result.teleports().to_vec(),
            rooms: result
                .rooms()
                .iter()
                .map(|room| RoomExport {
                    id: room.id.0,
                    lx: room.bounds.lx,
                    ly: room.bounds.ly,
                    hx: room.bounds.hx,
                    hy: room.bounds.hy,
                    state: room.state,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::generate;

    #[test]
    fn test_export_shape() {
        let result = generate(12345, 40, 30).unwrap();
        let export = LayoutExport::from(&result);
        assert_eq!(export.cells.len(), 30);
        assert!(export.cells.iter().all(|row| row.len() == 40));
        let (x, y) = export.entrance;
        assert_eq!(export.cells[y][x], result.grid().kind(x, y));
        assert!(export
            .features
            .iter()
            .any(|f| (f.x, f.y) == export.entrance && f.features.contains(&"entrance")));
        assert_eq!(export.rooms.len(), result.rooms().len());
    }

    #[test]
    fn test_json_fields() {
        let result = generate(7, 24, 24).unwrap();
        let json = LayoutExport::from(&result).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["seed"], 7);
        assert_eq!(value["width"], 24);
        assert!(value["cells"][0][0].is_string());
        assert!(value["teleports"].is_array());
    }
}
