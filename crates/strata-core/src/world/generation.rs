//! World generator - biome map plus the ordered stage pipeline
//!
//! Generation is a pure function of (seed, params, chunk coordinate), so a
//! `WorldGenerator` can be shared across threads and fan out over chunks.

use std::sync::Arc;
use strata_blocks::BlockRegistry;
use web_time::Instant;

use super::biome::{BiomeClassifier, BiomeRegistry, BiomeType, ClimateSample};
use super::caves::CaveCarver;
use super::chunk::{ChunkData, StageOutcome, StageTiming};
use super::ores::OreDistributor;
use super::pipeline::{GenerationStage, StageContext, StageDetail};
use super::rng::CellRandom;
use super::terrain::HeightFieldGenerator;
use super::vegetation::VegetationPlacer;
use super::worldgen_config::{GenerationParams, WorldConfig};
use crate::error::WorldGenError;

/// Milliseconds elapsed since `start`
pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Noise fields and stages derived from one (seed, params) pair
struct Pipeline {
    classifier: BiomeClassifier,
    terrain: Arc<HeightFieldGenerator>,
    stages: Vec<Box<dyn GenerationStage>>,
}

impl Pipeline {
    fn build(seed: u64, world: &WorldConfig, params: &GenerationParams) -> Self {
        let terrain = Arc::new(HeightFieldGenerator::new(seed, &params.terrain, world));
        let stages: Vec<Box<dyn GenerationStage>> = vec![
            Box::new(Arc::clone(&terrain)),
            Box::new(CaveCarver::new(seed, &params.caves)),
            Box::new(OreDistributor::new(seed, &params.ores)),
            Box::new(VegetationPlacer::new(seed, &params.vegetation)),
        ];
        Self {
            classifier: BiomeClassifier::new(seed, &params.biomes),
            terrain,
            stages,
        }
    }
}

/// Chunk generator for one seed and parameter set
///
/// Stages run in a fixed order: terrain, caves, ores, vegetation, then any
/// stages added with [`WorldGenerator::push_stage`].
pub struct WorldGenerator {
    pub seed: u64,
    world: WorldConfig,
    params: GenerationParams,
    registry: Arc<BlockRegistry>,
    biomes: BiomeRegistry,
    pipeline: Pipeline,
    extra_stages: Vec<Arc<dyn GenerationStage>>,
}

impl WorldGenerator {
    pub fn new(
        seed: u64,
        world: WorldConfig,
        params: GenerationParams,
        registry: Arc<BlockRegistry>,
    ) -> Result<Self, WorldGenError> {
        world.validate()?;
        params.validate()?;
        let biomes = BiomeRegistry::from_definitions(&params.biomes.definitions)?;
        let pipeline = Pipeline::build(seed, &world, &params);

        log::info!(
            "[GEN] Generator ready: seed {}, params '{}', {}x{} chunks",
            seed,
            params.name,
            world.chunk_width,
            world.world_height
        );

        Ok(Self {
            seed,
            world,
            params,
            registry,
            biomes,
            pipeline,
            extra_stages: Vec::new(),
        })
    }

    /// Generator with default world shape, params and blocks
    pub fn with_defaults(seed: u64) -> Result<Self, WorldGenError> {
        Self::new(
            seed,
            WorldConfig::default(),
            GenerationParams::default(),
            Arc::new(BlockRegistry::new()),
        )
    }

    /// Rebuild every noise field for a new seed
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.pipeline = Pipeline::build(seed, &self.world, &self.params);
    }

    /// Swap in new parameters; only chunks generated afterwards see them
    pub fn update_params(&mut self, params: GenerationParams) -> Result<(), WorldGenError> {
        params.validate()?;
        self.biomes = BiomeRegistry::from_definitions(&params.biomes.definitions)?;
        self.pipeline = Pipeline::build(self.seed, &self.world, &params);
        log::info!("[GEN] Params updated to '{}'", params.name);
        self.params = params;
        Ok(())
    }

    /// Append a stage that runs after vegetation
    pub fn push_stage(&mut self, stage: Arc<dyn GenerationStage>) {
        log::debug!("[GEN] Added stage '{}'", stage.name());
        self.extra_stages.push(stage);
    }

    fn stages(&self) -> impl Iterator<Item = &(dyn GenerationStage + 'static)> {
        self.pipeline
            .stages
            .iter()
            .map(|s| s.as_ref())
            .chain(self.extra_stages.iter().map(|s| s.as_ref()))
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages().map(|s| s.name()).collect()
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn world(&self) -> &WorldConfig {
        &self.world
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn biomes(&self) -> &BiomeRegistry {
        &self.biomes
    }

    pub fn sea_level(&self) -> i32 {
        self.pipeline.terrain.sea_level()
    }

    /// Height field and column stack shared with the terrain stage
    pub fn terrain(&self) -> &HeightFieldGenerator {
        &self.pipeline.terrain
    }

    pub fn biome_at(&self, world_x: i32) -> BiomeType {
        self.pipeline.classifier.classify(world_x)
    }

    pub fn climate_at(&self, world_x: i32) -> ClimateSample {
        self.pipeline.classifier.climate_at(world_x)
    }

    /// Unsmoothed surface height of a world column
    pub fn terrain_height(&self, world_x: i32) -> i32 {
        let biome = self.biomes.get(self.biome_at(world_x));
        self.pipeline.terrain.column_height(world_x, biome)
    }

    /// Generate one chunk from scratch; no cache, no boundary smoothing
    pub fn generate_chunk(&self, chunk_x: i32) -> ChunkData {
        let start = Instant::now();
        let mut chunk = ChunkData::new(chunk_x, self.world.width(), self.world.height());
        chunk.biome_map = self
            .pipeline
            .classifier
            .biome_map(chunk_x, self.world.width());

        let ctx = StageContext {
            seed: self.seed,
            chunk_x,
            world: &self.world,
            sea_level: self.sea_level(),
            registry: &self.registry,
            biomes: &self.biomes,
            random: CellRandom::new(self.seed, chunk_x),
        };

        for stage in self.stages() {
            let stage_start = Instant::now();
            let outcome = match stage.run(&mut chunk, &ctx) {
                Ok(report) => {
                    if let StageDetail::Caves(caves) = &report.detail {
                        if caves.band.is_some() {
                            chunk.metadata.cave_coverage = Some(caves.final_coverage);
                        }
                    }
                    log::trace!(
                        "[GEN] Chunk {} stage '{}' changed {} blocks",
                        chunk_x,
                        stage.name(),
                        report.changed_blocks
                    );
                    StageOutcome::Completed
                }
                Err(e) => {
                    log::warn!(
                        "[GEN] Stage '{}' failed for chunk {}: {}",
                        stage.name(),
                        chunk_x,
                        e
                    );
                    StageOutcome::Failed(e.to_string())
                }
            };
            chunk.metadata.stage_timings.push(StageTiming {
                stage: stage.name(),
                elapsed_ms: elapsed_ms(stage_start),
                outcome,
            });
        }

        chunk.metadata.generation_time_ms = elapsed_ms(start);
        log::debug!(
            "[GEN] Generated chunk {} in {:.2}ms",
            chunk_x,
            chunk.metadata.generation_time_ms
        );
        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageError;
    use crate::world::pipeline::StageReport;
    use strata_blocks::BlockId;

    fn registry_without(missing: u16) -> Arc<BlockRegistry> {
        let mut registry = BlockRegistry::empty();
        for def in BlockRegistry::new().iter().filter(|d| d.id != missing) {
            registry.register(def.clone()).unwrap();
        }
        Arc::new(registry)
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = WorldGenerator::with_defaults(42).unwrap();
        let b = WorldGenerator::with_defaults(42).unwrap();
        let ca = a.generate_chunk(0);
        let cb = b.generate_chunk(0);
        assert_eq!(ca.blocks(), cb.blocks());
        assert_eq!(ca.biome_map, cb.biome_map);
        assert_eq!(ca.heights, cb.heights);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = WorldGenerator::with_defaults(1).unwrap().generate_chunk(0);
        let b = WorldGenerator::with_defaults(2).unwrap().generate_chunk(0);
        assert_ne!(a.blocks(), b.blocks());
    }

    #[test]
    fn test_stage_order_and_timings() {
        let gen = WorldGenerator::with_defaults(42).unwrap();
        assert_eq!(gen.stage_names(), vec!["terrain", "caves", "ores", "vegetation"]);
        let chunk = gen.generate_chunk(3);
        let stages: Vec<_> = chunk.metadata.stage_timings.iter().map(|t| t.stage).collect();
        assert_eq!(stages, gen.stage_names());
        assert!(chunk
            .metadata
            .stage_timings
            .iter()
            .all(|t| t.outcome == StageOutcome::Completed));
        assert!(chunk.metadata.cave_coverage.is_some());
    }

    #[test]
    fn test_failed_stage_recorded_and_pipeline_continues() {
        let gen = WorldGenerator::new(
            42,
            WorldConfig::default(),
            GenerationParams::default(),
            registry_without(BlockId::GRAVEL),
        )
        .unwrap();
        let chunk = gen.generate_chunk(0);

        let errors: Vec<_> = chunk.metadata.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "caves");
        assert_eq!(errors[0].1, StageError::MissingBlock(BlockId::GRAVEL).to_string());
        assert!(chunk.metadata.cave_coverage.is_none());
        // Terrain ran before the failure, vegetation after it
        assert_eq!(chunk.heights.len(), 64);
        assert_eq!(chunk.metadata.stage_timings.len(), 4);
    }

    #[test]
    fn test_terrain_height_matches_chunk_heights() {
        let gen = WorldGenerator::with_defaults(42).unwrap();
        let chunk = gen.generate_chunk(1);
        for x in 0..64 {
            assert_eq!(chunk.heights[x], gen.terrain_height(64 + x as i32));
        }
    }

    #[test]
    fn test_update_params_rebuilds_pipeline() {
        let mut gen = WorldGenerator::with_defaults(42).unwrap();
        let before = gen.generate_chunk(0);
        gen.update_params(GenerationParams::preset_flat()).unwrap();
        assert_eq!(gen.params().name, "Flat");
        let after = gen.generate_chunk(0);
        let spread = |c: &ChunkData| {
            let (lo, hi) = c.height_range().unwrap();
            hi - lo
        };
        assert!(spread(&after) <= spread(&before));
    }

    #[test]
    fn test_reseed_changes_output() {
        let mut gen = WorldGenerator::with_defaults(1).unwrap();
        let before = gen.generate_chunk(0);
        gen.reseed(2);
        assert_eq!(gen.seed, 2);
        let fresh = WorldGenerator::with_defaults(2).unwrap().generate_chunk(0);
        let after = gen.generate_chunk(0);
        assert_ne!(before.blocks(), after.blocks());
        assert_eq!(fresh.blocks(), after.blocks());
    }

    #[test]
    fn test_invalid_world_config_rejected() {
        let result = WorldGenerator::new(
            1,
            WorldConfig {
                world_height: 0,
                ..WorldConfig::default()
            },
            GenerationParams::default(),
            Arc::new(BlockRegistry::new()),
        );
        assert!(matches!(result, Err(WorldGenError::InvalidWorldConfig(_))));
    }

    struct MarkerStage;

    impl GenerationStage for MarkerStage {
        fn name(&self) -> &'static str {
            "marker"
        }

        fn run(
            &self,
            chunk: &mut ChunkData,
            _ctx: &StageContext,
        ) -> Result<StageReport, StageError> {
            let top = chunk.height() - 1;
            chunk.set(0, top, BlockId::STONE);
            Ok(StageReport {
                changed_blocks: 1,
                detail: StageDetail::Other,
            })
        }
    }

    #[test]
    fn test_custom_stage_runs_last() {
        let mut gen = WorldGenerator::with_defaults(42).unwrap();
        gen.push_stage(Arc::new(MarkerStage));
        assert_eq!(gen.stage_names().last(), Some(&"marker"));
        let chunk = gen.generate_chunk(0);
        assert_eq!(chunk.get(0, 399), BlockId::STONE);
    }
}
