//! World - chunk cache, block access and statistics over a `WorldGenerator`

use rayon::prelude::*;
use std::ops::Range;
use std::sync::Arc;
use strata_blocks::{BlockId, BlockRegistry};
use web_time::Instant;

use super::biome::BiomeType;
use super::boundary::smooth_boundary;
use super::chunk::ChunkData;
use super::chunk_manager::ChunkManager;
use super::generation::{elapsed_ms, WorldGenerator};
use super::stats::{GenerationStats, NoopStats, StageTimings, WorldStats};
use super::worldgen_config::{GenerationParams, WorldConfig};
use crate::error::WorldGenError;

/// The generated world, composed of cached chunks
pub struct World {
    generator: WorldGenerator,

    /// Generated chunks, LRU-bounded
    chunks: ChunkManager,

    timings: StageTimings,
    cache_hits: u64,
    cache_misses: u64,

    /// Host-supplied event sink
    stats_sink: Box<dyn GenerationStats>,
}

impl World {
    pub fn new(
        seed: u64,
        config: WorldConfig,
        params: GenerationParams,
        registry: Arc<BlockRegistry>,
    ) -> Result<Self, WorldGenError> {
        let generator = WorldGenerator::new(seed, config, params, registry)?;
        Ok(Self {
            generator,
            chunks: ChunkManager::new(),
            timings: StageTimings::new(),
            cache_hits: 0,
            cache_misses: 0,
            stats_sink: Box::new(NoopStats),
        })
    }

    /// World with default shape, params and blocks
    pub fn with_defaults(seed: u64) -> Result<Self, WorldGenError> {
        Self::new(
            seed,
            WorldConfig::default(),
            GenerationParams::default(),
            Arc::new(BlockRegistry::new()),
        )
    }

    pub fn set_stats_sink(&mut self, sink: Box<dyn GenerationStats>) {
        self.stats_sink = sink;
    }

    pub fn seed(&self) -> u64 {
        self.generator.seed
    }

    pub fn config(&self) -> &WorldConfig {
        self.generator.world()
    }

    pub fn params(&self) -> &GenerationParams {
        self.generator.params()
    }

    pub fn registry(&self) -> &BlockRegistry {
        self.generator.registry()
    }

    pub fn generator(&self) -> &WorldGenerator {
        &self.generator
    }

    /// Cached chunk or a freshly generated one
    ///
    /// A new chunk is smoothed against whichever immediate neighbours are
    /// already cached, then inserted.
    pub fn generate_chunk(&mut self, chunk_x: i32) -> &ChunkData {
        let chunk = match self.chunks.take(chunk_x) {
            Some(cached) => {
                self.cache_hits += 1;
                self.stats_sink.record_cache_hit();
                cached
            }
            None => {
                self.cache_misses += 1;
                self.stats_sink.record_cache_miss();
                let fresh = self.generator.generate_chunk(chunk_x);
                self.finish_chunk(fresh)
            }
        };
        // Reinserting a hit marks it most recently used
        self.chunks.insert(chunk_x, chunk)
    }

    /// Smooth a generated chunk against the cache and record it
    fn finish_chunk(&mut self, mut chunk: ChunkData) -> ChunkData {
        let start = Instant::now();
        let x = chunk.x;
        smooth_boundary(
            &mut chunk,
            self.chunks.peek(x - 1),
            self.chunks.peek(x + 1),
            &self.generator.params().smoothing,
            self.generator.terrain(),
            self.generator.biomes(),
        );
        chunk.metadata.generation_time_ms += elapsed_ms(start);

        self.timings.record(&chunk);
        self.stats_sink.record_chunk(&chunk);
        chunk
    }

    /// Generate every missing chunk in `range`
    ///
    /// Generation fans out over the rayon pool; smoothing and insertion
    /// happen afterwards in ascending order, which gives the same chunks as
    /// calling `generate_chunk` over the range in order. Returns the number
    /// of chunks generated.
    pub fn pregenerate(&mut self, range: Range<i32>) -> usize {
        let missing: Vec<i32> = range.filter(|&x| !self.chunks.contains(x)).collect();
        if missing.is_empty() {
            return 0;
        }

        let start = Instant::now();
        let generator = &self.generator;
        let fresh: Vec<ChunkData> = missing
            .par_iter()
            .map(|&x| generator.generate_chunk(x))
            .collect();

        for chunk in fresh {
            let x = chunk.x;
            self.cache_misses += 1;
            self.stats_sink.record_cache_miss();
            let chunk = self.finish_chunk(chunk);
            self.chunks.insert(x, chunk);
        }

        log::debug!(
            "[GEN] Pregenerated {} chunks in {:.2}ms",
            missing.len(),
            elapsed_ms(start)
        );
        missing.len()
    }

    /// Block at a world position, generating its chunk if needed
    ///
    /// Rows outside the world read as air.
    pub fn get_block(&mut self, world_x: i32, world_y: i32) -> u16 {
        if world_y < 0 || world_y >= self.config().world_height {
            return BlockId::AIR;
        }
        let (chunk_x, local_x) = self.config().chunk_of(world_x);
        self.generate_chunk(chunk_x).get(local_x, world_y as usize)
    }

    /// Overwrite a block in place
    ///
    /// Returns false for rows outside the world or an unregistered block id.
    pub fn set_block(&mut self, world_x: i32, world_y: i32, block: u16) -> bool {
        if world_y < 0 || world_y >= self.config().world_height {
            return false;
        }
        if !self.registry().contains(block) {
            log::debug!("[GEN] Refusing to place unregistered block {}", block);
            return false;
        }
        let (chunk_x, local_x) = self.config().chunk_of(world_x);
        self.generate_chunk(chunk_x);
        match self.chunks.get_mut(chunk_x) {
            Some(chunk) => {
                chunk.set(local_x, world_y as usize, block);
                true
            }
            None => false,
        }
    }

    /// Drop every cached chunk, optionally switching to a new seed
    pub fn regenerate(&mut self, new_seed: Option<u64>) {
        let dropped = self.chunks.len();
        self.chunks.clear();
        if let Some(seed) = new_seed {
            self.generator.reseed(seed);
        }
        log::info!(
            "[CACHE] Regenerating world with seed {} ({} chunks dropped)",
            self.generator.seed,
            dropped
        );
    }

    /// Swap generation parameters; cached chunks keep their content
    pub fn update_params(&mut self, params: GenerationParams) -> Result<(), WorldGenError> {
        self.generator.update_params(params)
    }

    /// Evict least recently used chunks until at most `max_size` remain
    pub fn clean_cache(&mut self, max_size: usize) -> usize {
        self.chunks.clean_cache(max_size)
    }

    pub fn cache_limit(&self) -> usize {
        self.chunks.loaded_chunk_limit
    }

    pub fn set_cache_limit(&mut self, limit: usize) {
        self.chunks.set_limit(limit);
        log::info!("[CACHE] Cache limit set to {} chunks", self.chunks.loaded_chunk_limit);
    }

    /// Cached chunk without generating or touching recency
    pub fn chunk(&self, chunk_x: i32) -> Option<&ChunkData> {
        self.chunks.peek(chunk_x)
    }

    pub fn loaded_chunks(&self) -> impl Iterator<Item = (i32, &ChunkData)> {
        self.chunks.iter()
    }

    /// Surface height of a column; smoothed height when its chunk is cached
    pub fn terrain_height(&self, world_x: i32) -> i32 {
        let (chunk_x, local_x) = self.config().chunk_of(world_x);
        self.chunks
            .peek(chunk_x)
            .and_then(|chunk| chunk.heights.get(local_x).copied())
            .unwrap_or_else(|| self.generator.terrain_height(world_x))
    }

    pub fn biome_at(&self, world_x: i32) -> BiomeType {
        let (chunk_x, local_x) = self.config().chunk_of(world_x);
        self.chunks
            .peek(chunk_x)
            .and_then(|chunk| chunk.biome_map.get(local_x).copied())
            .unwrap_or_else(|| self.generator.biome_at(world_x))
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            loaded_chunk_count: self.chunks.len(),
            seed: self.generator.seed,
            cache_size: self.chunks.memory_bytes(),
            cache_limit: self.chunks.loaded_chunk_limit,
            chunks_generated: self.timings.chunks(),
            cache_hits: self.cache_hits,
            cache_misses: self.cache_misses,
            average_generation_ms: self.timings.average_ms(),
            per_stage_average_ms: self.timings.per_stage_average_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::with_defaults(42).unwrap()
    }

    #[test]
    fn test_out_of_range_rows() {
        let mut world = world();
        assert_eq!(world.get_block(0, -1), BlockId::AIR);
        assert_eq!(world.get_block(0, 400), BlockId::AIR);
        assert!(!world.set_block(0, -1, BlockId::STONE));
        assert!(!world.set_block(0, 400, BlockId::STONE));
        // Nothing was generated for the rejected lookups
        assert_eq!(world.stats().loaded_chunk_count, 0);
    }

    #[test]
    fn test_bedrock_floor() {
        let mut world = world();
        for x in [-100, -1, 0, 63, 64, 1000] {
            assert_eq!(world.get_block(x, 0), BlockId::BEDROCK);
        }
    }

    #[test]
    fn test_set_block_rejects_unregistered() {
        let mut world = world();
        assert!(!world.set_block(5, 200, 9999));
        assert!(world.set_block(5, 200, BlockId::CLAY));
        assert_eq!(world.get_block(5, 200), BlockId::CLAY);
    }

    #[test]
    fn test_negative_coordinates_map_to_chunks() {
        let mut world = world();
        world.set_block(-1, 100, BlockId::SNOW);
        assert!(world.chunk(-1).is_some());
        assert_eq!(world.chunk(-1).unwrap().get(63, 100), BlockId::SNOW);
    }

    #[test]
    fn test_regenerate_with_seed() {
        let mut world = world();
        world.generate_chunk(0);
        world.regenerate(Some(7));
        assert_eq!(world.seed(), 7);
        assert!(world.chunk(0).is_none());

        let fresh = World::with_defaults(7).unwrap().generate_chunk(0).clone();
        assert_eq!(world.generate_chunk(0).blocks(), fresh.blocks());
    }

    #[test]
    fn test_cache_limit_bounds_chunks() {
        let mut world = world();
        world.set_cache_limit(3);
        for x in 0..6 {
            world.generate_chunk(x);
        }
        let stats = world.stats();
        assert_eq!(stats.loaded_chunk_count, 3);
        assert_eq!(stats.cache_limit, 3);
        assert_eq!(stats.chunks_generated, 6);
        assert!(world.chunk(5).is_some());
        assert!(world.chunk(0).is_none());
    }

    #[test]
    fn test_hit_promotes_without_regenerating() {
        let mut world = world();
        world.set_cache_limit(2);
        world.generate_chunk(0);
        world.generate_chunk(1);
        let first = world.generate_chunk(0).clone();
        world.generate_chunk(2);

        let stats = world.stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 3);
        assert_eq!(stats.chunks_generated, 3);
        // 0 was used after 1, so 1 is the one evicted
        assert!(world.chunk(1).is_none());
        let cached = world.chunk(0).unwrap();
        assert_eq!(cached.blocks(), first.blocks());
        assert_eq!(cached.metadata, first.metadata);
    }

    #[test]
    fn test_stats_per_stage() {
        let mut world = world();
        world.generate_chunk(0);
        world.generate_chunk(1);
        let stats = world.stats();
        let names: Vec<_> = stats.per_stage_average_ms.iter().map(|s| s.0.as_str()).collect();
        assert_eq!(names, vec!["terrain", "caves", "ores", "vegetation"]);
        assert!(stats.average_generation_ms > 0.0);
        assert_eq!(stats.cache_size, 2 * world.chunk(0).unwrap().memory_bytes());
    }

    #[test]
    fn test_terrain_height_prefers_cached_chunk() {
        let mut world = world();
        world.generate_chunk(1);
        let chunk = world.generate_chunk(0).clone();
        for x in 0..64 {
            assert_eq!(world.terrain_height(x), chunk.heights[x as usize]);
            assert_eq!(world.biome_at(x), chunk.biome_map[x as usize]);
        }
    }
}
