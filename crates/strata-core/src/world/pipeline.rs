//! Generation stage pipeline
//!
//! A chunk is produced by running an ordered list of stages over a freshly
//! allocated `ChunkData`. Each stage reads the context, mutates the grid and
//! reports what it did; a failing stage is recorded and the next one runs.

use std::sync::Arc;
use strata_blocks::BlockRegistry;

use super::biome::BiomeRegistry;
use super::caves::CaveReport;
use super::chunk::ChunkData;
use super::ores::OreReport;
use super::rng::CellRandom;
use super::vegetation::VegetationReport;
use super::worldgen_config::WorldConfig;
use crate::error::StageError;

/// Read-only inputs shared by every stage of one chunk
pub struct StageContext<'a> {
    pub seed: u64,
    pub chunk_x: i32,
    pub world: &'a WorldConfig,
    pub sea_level: i32,
    pub registry: &'a BlockRegistry,
    pub biomes: &'a BiomeRegistry,
    pub random: CellRandom,
}

impl StageContext<'_> {
    /// World X of a local column
    pub fn world_x(&self, local_x: usize) -> i32 {
        self.chunk_x * self.world.chunk_width + local_x as i32
    }

    /// Fail with `MissingBlock` unless every id is registered
    pub fn require_blocks(&self, blocks: &[u16]) -> Result<(), StageError> {
        match blocks.iter().find(|&&id| !self.registry.contains(id)) {
            Some(&id) => Err(StageError::MissingBlock(id)),
            None => Ok(()),
        }
    }

    /// Fail with `GridMismatch` if the chunk doesn't match the world shape
    pub fn check_grid(&self, chunk: &ChunkData) -> Result<(), StageError> {
        let expected = self.world.width() * self.world.height();
        let actual = chunk.blocks().len();
        if expected != actual || chunk.biome_map.len() != self.world.width() {
            return Err(StageError::GridMismatch { expected, actual });
        }
        Ok(())
    }
}

/// Stage-specific detail in a report
#[derive(Debug, Clone, PartialEq)]
pub enum StageDetail {
    Terrain { min_height: i32, max_height: i32 },
    Caves(CaveReport),
    Ores(OreReport),
    Vegetation(VegetationReport),
    Other,
}

/// What a stage did to a chunk
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    /// Cells written by the stage
    pub changed_blocks: usize,
    pub detail: StageDetail,
}

/// One step of the chunk pipeline
pub trait GenerationStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, chunk: &mut ChunkData, ctx: &StageContext) -> Result<StageReport, StageError>;
}

impl<T: GenerationStage + ?Sized> GenerationStage for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn run(&self, chunk: &mut ChunkData, ctx: &StageContext) -> Result<StageReport, StageError> {
        (**self).run(chunk, ctx)
    }
}
