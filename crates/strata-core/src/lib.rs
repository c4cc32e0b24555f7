//! # Strata - deterministic 2D world generation
//!
//! Generates a chunked column world from a seed: biomes, layered terrain,
//! cellular-automata caves, ore veins and surface vegetation.

pub mod error;
pub mod world;

pub use error::{StageError, WorldGenError};

/// Common imports for callers
pub mod prelude {
    pub use crate::world::{
        BiomeType, ChunkData, GenerationParams, World, WorldConfig, WorldGenerator, WorldStats,
    };
    pub use strata_blocks::{BlockId, BlockRegistry};
}
