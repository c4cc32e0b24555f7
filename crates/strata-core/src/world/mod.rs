//! World generation - noise, biomes, generation stages and the chunk cache

pub mod biome;
pub mod boundary;
pub mod caves;
mod chunk;
mod chunk_manager;
#[allow(clippy::module_inception)]
mod world;
pub mod generation;
pub mod noise;
pub mod ores;
pub mod pipeline;
pub mod rng;
pub mod stats;
pub mod terrain;
pub mod vegetation;
pub mod worldgen_config;

pub use biome::{BiomeClassifier, BiomeDefinition, BiomeRegistry, BiomeType, ClimateSample};
pub use caves::{CaveCarver, CaveMask, CavePhase, CaveReport};
pub use chunk::{ChunkData, ChunkMetadata, StageOutcome, StageTiming};
pub use chunk_manager::ChunkManager;
pub use generation::WorldGenerator;
pub use noise::{NoiseLayer, SeededNoiseField};
pub use ores::{OreDistributor, OreReport};
pub use pipeline::{GenerationStage, StageContext, StageDetail, StageReport};
pub use rng::{CellRandom, RollPurpose};
pub use stats::{GenerationStats, NoopStats, StageTimings, WorldStats};
pub use terrain::HeightFieldGenerator;
pub use vegetation::{TreeSpecies, VegetationPlacer, VegetationReport};
pub use world::World;
pub use worldgen_config::{
    BiomeParams, BiomeThresholds, CaveParams, DepthCurve, GenerationParams, HeightBand,
    NoiseLayerConfig, OreConfig, OreParams, SmoothingParams, TerrainParams, VegetationParams,
    WorldConfig,
};
