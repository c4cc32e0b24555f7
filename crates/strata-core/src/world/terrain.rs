//! Height field - surface elevation per column and the vertical block stack

use strata_blocks::BlockId;

use super::biome::{BiomeDefinition, BiomeType};
use super::chunk::ChunkData;
use super::noise::NoiseLayer;
use super::pipeline::{GenerationStage, StageContext, StageDetail, StageReport};
use super::worldgen_config::{TerrainParams, WorldConfig};
use crate::error::StageError;

/// Rows of bedrock at the bottom of every column
pub const BEDROCK_HEIGHT: i32 = 5;

/// Surface heights stay this far from the top and bottom of the world
const HEIGHT_MARGIN: i32 = 10;

/// Terrain stage: sums four noise bands into a surface height and fills
/// each column bottom-up
pub struct HeightFieldGenerator {
    continental: NoiseLayer,
    regional: NoiseLayer,
    local: NoiseLayer,
    roughness: NoiseLayer,
    peak: NoiseLayer,
    params: TerrainParams,
    world_height: i32,
}

impl HeightFieldGenerator {
    pub fn new(seed: u64, params: &TerrainParams, world: &WorldConfig) -> Self {
        Self {
            continental: params.continental.noise.build(seed),
            regional: params.regional.noise.build(seed),
            local: params.local.noise.build(seed),
            roughness: params.roughness.noise.build(seed),
            peak: params.peak_noise.build(seed),
            params: params.clone(),
            world_height: world.world_height,
        }
    }

    /// Sea level, which is also the base height of the field
    pub fn sea_level(&self) -> i32 {
        sea_level(&self.params, self.world_height)
    }

    /// Surface y for a world column in the given biome
    pub fn column_height(&self, world_x: i32, biome: &BiomeDefinition) -> i32 {
        let p = &self.params;
        let x = world_x as f32;
        let base = self.sea_level() as f32;
        let w = &biome.height_weights;

        let mut h = base
            + self.continental.sample(x, 0.0) * p.continental.amplitude * w.continental
            + self.regional.sample(x, 0.0) * p.regional.amplitude * w.regional
            + self.local.sample(x, 0.0) * p.local.amplitude * w.local
            + self.roughness.sample(x, 0.0) * p.roughness.amplitude * w.roughness;

        match biome.biome_type {
            BiomeType::Ocean => {
                let floor = base - p.ocean_floor_depth as f32;
                h = (h - p.ocean_depth).min(floor);
            }
            BiomeType::Mountains => {
                h += p.mountain_lift;
                let n = self.peak.sample(x, 0.0);
                if n > p.peak_threshold && p.peak_threshold < 1.0 {
                    h += p.peak_bonus * (n - p.peak_threshold) / (1.0 - p.peak_threshold);
                }
            }
            BiomeType::Desert => {
                h += (x * p.dune_frequency).sin() * p.dune_amplitude;
            }
            BiomeType::Swamp => {
                h = h.clamp(base - 2.0, base + 3.0);
            }
            BiomeType::Plains => {
                h = base + (h - base) * p.plains_compression;
                h += (x * p.plains_hill_frequency).sin() * p.plains_hill_amplitude;
            }
            BiomeType::Forest | BiomeType::Tundra => {}
        }

        let max = (self.world_height - HEIGHT_MARGIN).max(HEIGHT_MARGIN) as f32;
        h.clamp(HEIGHT_MARGIN as f32, max).floor() as i32
    }

    /// Block at `y` in a column whose surface is at `height`
    pub fn block_at(&self, y: i32, height: i32, biome: &BiomeDefinition) -> u16 {
        let sea = self.sea_level();
        if y < BEDROCK_HEIGHT {
            return BlockId::BEDROCK;
        }
        if y > height {
            return if y <= sea { BlockId::WATER } else { BlockId::AIR };
        }
        if y == height {
            return if biome.biome_type == BiomeType::Ocean && height < sea {
                BlockId::SAND
            } else {
                biome.surface_block
            };
        }
        if y > height - 1 - biome.subsurface_depth {
            return biome.subsurface_block;
        }
        let deep_level = (height as f32 * self.params.deep_stratum_ratio) as i32;
        if y < deep_level {
            BlockId::DEEPSLATE
        } else {
            BlockId::STONE
        }
    }

    fn fill_column(&self, chunk: &mut ChunkData, x: usize, height: i32, biome: &BiomeDefinition) {
        for y in 0..self.world_height {
            chunk.set(x, y as usize, self.block_at(y, height, biome));
        }
    }
}

pub fn sea_level(params: &TerrainParams, world_height: i32) -> i32 {
    (world_height as f32 * params.sea_level_ratio) as i32
}

impl GenerationStage for HeightFieldGenerator {
    fn name(&self) -> &'static str {
        "terrain"
    }

    fn run(&self, chunk: &mut ChunkData, ctx: &StageContext) -> Result<StageReport, StageError> {
        ctx.check_grid(chunk)?;
        ctx.require_blocks(&[
            BlockId::AIR,
            BlockId::BEDROCK,
            BlockId::WATER,
            BlockId::SAND,
            BlockId::STONE,
            BlockId::DEEPSLATE,
        ])?;

        let width = chunk.width();
        let mut heights = Vec::with_capacity(width);
        for x in 0..width {
            let biome = ctx.biomes.get(chunk.biome_map[x]);
            ctx.require_blocks(&[biome.surface_block, biome.subsurface_block])?;
            let height = self.column_height(ctx.world_x(x), biome);
            self.fill_column(chunk, x, height, biome);
            heights.push(height);
        }

        chunk.heights = heights;
        let (min_height, max_height) = chunk.height_range().unwrap_or((0, 0));
        Ok(StageReport {
            changed_blocks: chunk.blocks().len(),
            detail: StageDetail::Terrain {
                min_height,
                max_height,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::worldgen_config::TerrainParams;

    fn generator(seed: u64) -> HeightFieldGenerator {
        HeightFieldGenerator::new(seed, &TerrainParams::default(), &WorldConfig::default())
    }

    #[test]
    fn test_sea_level_is_half_height() {
        assert_eq!(generator(1).sea_level(), 200);
    }

    #[test]
    fn test_heights_clamped() {
        let gen = generator(42);
        let biome = BiomeDefinition::mountains();
        for x in (-5000..5000).step_by(7) {
            let h = gen.column_height(x, &biome);
            assert!((10..=390).contains(&h), "height {h} out of range");
        }
    }

    #[test]
    fn test_ocean_below_sea_level() {
        let gen = generator(3);
        let ocean = BiomeDefinition::ocean();
        let limit = gen.sea_level() - TerrainParams::default().ocean_floor_depth;
        for x in -300..300 {
            assert!(gen.column_height(x, &ocean) <= limit);
        }
    }

    #[test]
    fn test_swamp_near_sea_level() {
        let gen = generator(5);
        let swamp = BiomeDefinition::swamp();
        let sea = gen.sea_level();
        for x in -300..300 {
            let h = gen.column_height(x, &swamp);
            assert!((sea - 2..=sea + 3).contains(&h));
        }
    }

    #[test]
    fn test_adjacent_columns_continuous() {
        let gen = generator(11);
        let forest = BiomeDefinition::forest();
        for x in -500..500 {
            let a = gen.column_height(x, &forest);
            let b = gen.column_height(x + 1, &forest);
            assert!((a - b).abs() <= 12, "jump {a} -> {b} at {x}");
        }
    }

    #[test]
    fn test_column_stack_order() {
        let gen = generator(1);
        let plains = BiomeDefinition::plains();
        let height = 220;
        assert_eq!(gen.block_at(0, height, &plains), BlockId::BEDROCK);
        assert_eq!(gen.block_at(4, height, &plains), BlockId::BEDROCK);
        assert_eq!(gen.block_at(5, height, &plains), BlockId::DEEPSLATE);
        assert_eq!(gen.block_at(150, height, &plains), BlockId::STONE);
        assert_eq!(gen.block_at(height - 1, height, &plains), BlockId::DIRT);
        assert_eq!(gen.block_at(height - 4, height, &plains), BlockId::DIRT);
        assert_eq!(gen.block_at(height - 5, height, &plains), BlockId::STONE);
        assert_eq!(gen.block_at(height, height, &plains), BlockId::GRASS);
        assert_eq!(gen.block_at(height + 1, height, &plains), BlockId::AIR);
    }

    #[test]
    fn test_ocean_column_has_water_and_sand() {
        let gen = generator(1);
        let ocean = BiomeDefinition::ocean();
        let height = 180;
        assert_eq!(gen.block_at(height, height, &ocean), BlockId::SAND);
        assert_eq!(gen.block_at(height + 1, height, &ocean), BlockId::WATER);
        assert_eq!(gen.block_at(200, height, &ocean), BlockId::WATER);
        assert_eq!(gen.block_at(201, height, &ocean), BlockId::AIR);
    }
}
