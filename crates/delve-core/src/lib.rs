//! delve-core: Deterministic dungeon layout generation
//!
//! Given a seed and a size, produces a grid of rooms, walls, corridors and
//! doors that satisfies a fixed set of structural invariants, with every room
//! reachable from the entrance by walking or through a teleport pad pair.
//!
//! This crate has no I/O; the `delve` binary wraps it for the command line.

pub mod config;
mod consts;
pub mod dungeon;
mod error;
pub mod export;
mod generate;
pub mod metrics;
mod rng;
mod seed;

pub use config::{GeneratorConfig, RepairMode};
pub use consts::*;
pub use error::GenerateError;
pub use export::LayoutExport;
pub use generate::{generate, generate_with_config, validate, GenerationResult};
pub use metrics::{Metrics, Phase};
pub use rng::GameRng;
pub use seed::{hash_seed, parse_seed};
