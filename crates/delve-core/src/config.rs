//! Generator configuration
//!
//! Heuristic constants used by the pipeline. Only the layout invariants are a
//! hard contract; every value here can be tuned without breaking them.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::consts::{MAX_DIMENSION, MIN_DIMENSION, ROOM_MARGIN};
use crate::error::GenerateError;

/// How unreachable rooms are handled by the repairer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
pub enum RepairMode {
    /// Carve a corridor from the room to the reachable network
    #[default]
    Carve,
    /// Leave the room structurally cut off (experimental)
    HiddenArea,
}

/// User-configurable generation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    // Size bounds
    pub min_dimension: usize,
    pub max_dimension: usize,

    // Partitioning
    pub max_depth: u32,
    pub min_leaf_side: usize,
    pub min_leaf_area: usize,
    pub split_min_percent: usize,
    pub split_max_percent: usize,

    // Rooms
    pub min_room_size: usize,
    pub max_room_size: usize,
    pub room_fill_min_percent: usize,

    // Corridors
    pub knn_k: usize,
    pub loop_edge_percent: u32,
    pub elbow_percent: u32,

    // Doors
    pub orphan_carve_percent: u32,
    /// Doors of one room in a 2x2 window that trigger cluster reduction.
    /// A window holds at most two wall-ring doors of a rectangular room, so
    /// only 2 reduces anything; 3 and 4 leave the pass as a no-op guard.
    pub cluster_threshold: usize,
    pub locked_door_percent: u32,

    // Repair
    pub repair_mode: RepairMode,
    pub max_repair_retries: u32,
    pub teleport_fallback: bool,

    // Diagnostics
    pub collect_metrics: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_dimension: MIN_DIMENSION,
            max_dimension: MAX_DIMENSION,

            max_depth: 6,
            min_leaf_side: 8,
            min_leaf_area: 36,
            split_min_percent: 35,
            split_max_percent: 65,

            min_room_size: 2,
            max_room_size: 16,
            room_fill_min_percent: 50,

            knn_k: 3,
            loop_edge_percent: 12,
            elbow_percent: 10,

            orphan_carve_percent: 60,
            cluster_threshold: 3,
            locked_door_percent: 8,

            repair_mode: RepairMode::Carve,
            max_repair_retries: 1,
            teleport_fallback: true,

            collect_metrics: true,
        }
    }
}

impl GeneratorConfig {
    /// Parse a (possibly partial) JSON document; missing fields keep defaults
    pub fn from_json(text: &str) -> Result<Self, GenerateError> {
        let config: GeneratorConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Smallest leaf side that still fits a room plus its margins
    pub fn min_usable_side(&self) -> usize {
        self.min_room_size + 2 * ROOM_MARGIN
    }

    /// Check that the options are mutually consistent
    pub fn validate(&self) -> Result<(), GenerateError> {
        let fail = |msg: String| Err(GenerateError::InvalidConfig(msg));

        if self.min_room_size < 2 {
            return fail(format!("min_room_size must be at least 2, got {}", self.min_room_size));
        }
        if self.max_room_size < self.min_room_size {
            return fail(format!(
                "max_room_size ({}) is smaller than min_room_size ({})",
                self.max_room_size, self.min_room_size
            ));
        }
        if self.min_dimension < self.min_usable_side() {
            return fail(format!(
                "min_dimension ({}) cannot fit a room of side {} with its margins",
                self.min_dimension, self.min_room_size
            ));
        }
        if self.max_dimension < self.min_dimension || self.max_dimension > u16::MAX as usize {
            return fail(format!(
                "max_dimension ({}) must lie within {}..={}",
                self.max_dimension,
                self.min_dimension,
                u16::MAX
            ));
        }
        if self.min_leaf_side == 0 {
            return fail("min_leaf_side must be positive".to_string());
        }
        if self.split_min_percent == 0
            || self.split_min_percent > self.split_max_percent
            || self.split_max_percent >= 100
        {
            return fail(format!(
                "split band {}..={} must satisfy 0 < min <= max < 100",
                self.split_min_percent, self.split_max_percent
            ));
        }
        if self.room_fill_min_percent > 100 {
            return fail(format!("room_fill_min_percent {} exceeds 100", self.room_fill_min_percent));
        }
        if self.knn_k == 0 {
            return fail("knn_k must be at least 1".to_string());
        }
        for (name, value) in [
            ("loop_edge_percent", self.loop_edge_percent),
            ("elbow_percent", self.elbow_percent),
            ("orphan_carve_percent", self.orphan_carve_percent),
            ("locked_door_percent", self.locked_door_percent),
        ] {
            if value > 100 {
                return fail(format!("{} {} exceeds 100", name, value));
            }
        }
        if self.cluster_threshold < 2 || self.cluster_threshold > 4 {
            return fail(format!(
                "cluster_threshold must be within 2..=4, got {}",
                self.cluster_threshold
            ));
        }
        Ok(())
    }

    /// Check requested grid dimensions against the configured bounds
    pub fn check_dimensions(&self, width: usize, height: usize) -> Result<(), GenerateError> {
        let range = self.min_dimension..=self.max_dimension;
        if range.contains(&width) && range.contains(&height) {
            Ok(())
        } else {
            Err(GenerateError::InvalidDimensions {
                width,
                height,
                min: self.min_dimension,
                max: self.max_dimension,
            })
        }
    }
}
