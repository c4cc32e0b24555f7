//! World-level generation properties

use std::sync::Arc;
use strata_core::prelude::*;
use strata_core::world::worldgen_config::PRESET_NAMES;
use strata_core::world::StageOutcome;

fn default_world(seed: u64) -> World {
    World::with_defaults(seed).unwrap()
}

#[test]
fn same_seed_same_chunks() {
    let mut a = default_world(1234);
    let mut b = default_world(1234);
    for x in -3..3 {
        let ca = a.generate_chunk(x).clone();
        let cb = b.generate_chunk(x);
        assert_eq!(ca.blocks(), cb.blocks(), "chunk {x} differs");
        assert_eq!(ca.biome_map, cb.biome_map);
        assert_eq!(ca.heights, cb.heights);
    }
}

#[test]
fn cave_coverage_converges() {
    let mut world = default_world(42);
    let caves = world.params().caves.clone();
    let chunks = -10..10;
    let total = chunks.len();
    let mut within = 0;
    for x in chunks {
        let coverage = world
            .generate_chunk(x)
            .metadata
            .cave_coverage
            .expect("cave stage ran");
        if (coverage - caves.coverage_target).abs() <= caves.coverage_tolerance {
            within += 1;
        }
    }
    assert!(
        within * 10 >= total * 9,
        "only {within}/{total} chunks within tolerance"
    );
}

#[test]
fn boundary_heights_continuous() {
    let mut world = default_world(42);
    let chunks: Vec<ChunkData> = (0..12).map(|x| world.generate_chunk(x).clone()).collect();

    for pair in chunks.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        let mountains = left.biome_map.last() == Some(&BiomeType::Mountains)
            || right.biome_map.first() == Some(&BiomeType::Mountains);
        if mountains {
            continue;
        }
        let diff = (left.heights[63] - right.heights[0]).abs();
        assert!(
            diff <= 10,
            "edge between chunks {} and {} jumps {} blocks",
            left.x,
            right.x,
            diff
        );
    }
}

#[test]
fn every_cell_is_registered() {
    let mut world = default_world(99);
    world.pregenerate(-4..4);
    let registry = BlockRegistry::new();
    for (x, chunk) in world.loaded_chunks() {
        for &block in chunk.blocks() {
            assert!(registry.contains(block), "chunk {x} holds unknown block {block}");
        }
    }
}

#[test]
fn ores_stay_in_depth_band() {
    let mut world = default_world(7);
    world.pregenerate(0..4);
    let config = *world.config();
    let ores = world.params().ores.ores.clone();
    let registry = BlockRegistry::new();
    let h = config.world_height as f32;

    for ore in &ores {
        let block = registry.id_by_name(&ore.block).unwrap();
        let min = (h * ore.min_depth_ratio) as i32;
        let max = (h * ore.max_depth_ratio) as i32;
        for x in 0..4 {
            let chunk = world.chunk(x).unwrap();
            for y in 0..chunk.height() {
                for cx in 0..chunk.width() {
                    if chunk.get(cx, y) == block {
                        let depth = config.depth_of(y as i32);
                        assert!(
                            (min..max).contains(&depth),
                            "{} at depth {} outside [{}, {})",
                            ore.name,
                            depth,
                            min,
                            max
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn regeneration_is_idempotent() {
    let mut world = default_world(42);
    let before: Vec<ChunkData> = (0..3).map(|x| world.generate_chunk(x).clone()).collect();
    world.regenerate(None);
    assert_eq!(world.stats().loaded_chunk_count, 0);
    for chunk in &before {
        let after = world.generate_chunk(chunk.x);
        assert_eq!(after.blocks(), chunk.blocks());
        assert_eq!(after.heights, chunk.heights);
    }
}

#[test]
fn seed_42_first_chunk() {
    let registry = Arc::new(BlockRegistry::new());
    let config = WorldConfig {
        world_height: 400,
        chunk_width: 64,
        block_size: 32,
    };
    let mut world = World::new(42, config, GenerationParams::default(), registry).unwrap();
    let chunk = world.generate_chunk(0);

    assert_eq!(chunk.biome_map.len(), 64);
    let (lo, hi) = chunk.height_range().unwrap();
    assert!(hi - lo >= 20, "height range only {} blocks", hi - lo);

    let features = [
        BlockId::COAL_ORE,
        BlockId::COPPER_ORE,
        BlockId::IRON_ORE,
        BlockId::GOLD_ORE,
        BlockId::DIAMOND_ORE,
        BlockId::TALL_GRASS,
        BlockId::RED_FLOWER,
        BlockId::YELLOW_FLOWER,
        BlockId::SHRUB,
        BlockId::OAK_LOG,
        BlockId::BIRCH_LOG,
        BlockId::SPRUCE_LOG,
        BlockId::CACTUS,
    ];
    assert!(features.iter().any(|&id| chunk.count(id) > 0));
    assert!(chunk.metadata.generation_time_ms > 0.0);
    assert_eq!(chunk.metadata.errors().count(), 0);
}

#[test]
fn second_lookup_is_cache_hit() {
    let mut world = default_world(42);
    let first_time = world.generate_chunk(0).metadata.generation_time_ms;
    let stats = world.stats();
    assert_eq!(stats.chunks_generated, 1);
    assert_eq!(stats.cache_misses, 1);

    let second_time = world.generate_chunk(0).metadata.generation_time_ms;
    let stats = world.stats();
    assert_eq!(second_time, first_time);
    assert_eq!(stats.chunks_generated, 1);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.loaded_chunk_count, 1);
}

#[test]
fn set_block_round_trips_through_cache() {
    let mut world = default_world(42);
    assert!(world.set_block(-70, 150, BlockId::GRAVEL));
    assert_eq!(world.get_block(-70, 150), BlockId::GRAVEL);
    // Edit survives until the cache is cleared
    world.generate_chunk(5);
    assert_eq!(world.get_block(-70, 150), BlockId::GRAVEL);
}

#[test]
fn pregenerate_matches_sequential() {
    let mut batch = default_world(5);
    let mut sequential = default_world(5);
    assert_eq!(batch.pregenerate(-3..5), 8);
    assert_eq!(batch.pregenerate(-3..5), 0);
    for x in -3..5 {
        let expected = sequential.generate_chunk(x).clone();
        let chunk = batch.chunk(x).unwrap();
        assert_eq!(chunk.blocks(), expected.blocks(), "chunk {x} differs");
        assert_eq!(chunk.heights, expected.heights);
    }
}

#[test]
fn presets_generate_cleanly() {
    for name in PRESET_NAMES {
        let params = GenerationParams::preset(name).unwrap();
        let generator = WorldGenerator::new(
            11,
            WorldConfig::default(),
            params,
            Arc::new(BlockRegistry::new()),
        )
        .unwrap();
        let chunk = generator.generate_chunk(2);
        assert!(
            chunk
                .metadata
                .stage_timings
                .iter()
                .all(|t| t.outcome == StageOutcome::Completed),
            "preset {name} had stage failures"
        );
    }
}

#[test]
fn params_survive_ron_round_trip() {
    let params = GenerationParams::preset_cave_heavy();
    let text = params.to_ron().unwrap();
    let parsed = GenerationParams::from_ron(&text).unwrap();
    assert_eq!(parsed.name, params.name);
    assert_eq!(parsed.caves.coverage_target, params.caves.coverage_target);
    assert_eq!(parsed.ores.ores.len(), params.ores.ores.len());

    let a = WorldGenerator::new(3, WorldConfig::default(), params, Arc::new(BlockRegistry::new()))
        .unwrap()
        .generate_chunk(0);
    let b = WorldGenerator::new(3, WorldConfig::default(), parsed, Arc::new(BlockRegistry::new()))
        .unwrap()
        .generate_chunk(0);
    assert_eq!(a.blocks(), b.blocks());
}

#[test]
fn stage_names_in_pipeline_order() {
    let generator = WorldGenerator::with_defaults(1).unwrap();
    assert_eq!(
        generator.stage_names(),
        ["terrain", "caves", "ores", "vegetation"]
    );
}

#[test]
fn smoothed_columns_have_no_buried_hollows() {
    for seed in [1, 42, 1234] {
        let mut world = default_world(seed);
        let sea = world.generator().sea_level();
        let cave_top = {
            let config = *world.config();
            let min_depth = (config.world_height as f32 * world.params().caves.min_depth_ratio) as i32;
            config.world_height - 1 - min_depth
        };
        for x in -12..12 {
            let chunk = world.generate_chunk(x);
            if chunk.metadata.smoothed_columns == 0 {
                continue;
            }
            for (cx, &surface) in chunk.heights.iter().enumerate() {
                for y in (cave_top + 2).max(0)..surface {
                    let block = chunk.get(cx, y as usize);
                    assert!(
                        block != BlockId::AIR && block != BlockId::WATER,
                        "seed {seed} chunk {x} column {cx}: hollow at y {y} under surface {surface} (sea {sea})"
                    );
                }
            }
        }
    }
}
