//! Surface vegetation - trees, ground cover, cacti and tundra ice

use serde::{Deserialize, Serialize};
use strata_blocks::BlockId;

use super::biome::{BiomeDefinition, BiomeType, TreeWeight};
use super::chunk::ChunkData;
use super::noise::NoiseLayer;
use super::pipeline::{GenerationStage, StageContext, StageDetail, StageReport};
use super::rng::RollPurpose;
use super::worldgen_config::VegetationParams;
use crate::error::StageError;

/// Tree species with their blocks and trunk height ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeSpecies {
    Oak,
    Birch,
    Spruce,
    SwampOak,
}

impl TreeSpecies {
    pub fn log_block(self) -> u16 {
        match self {
            TreeSpecies::Oak | TreeSpecies::SwampOak => BlockId::OAK_LOG,
            TreeSpecies::Birch => BlockId::BIRCH_LOG,
            TreeSpecies::Spruce => BlockId::SPRUCE_LOG,
        }
    }

    pub fn leaves_block(self) -> u16 {
        match self {
            TreeSpecies::Oak | TreeSpecies::SwampOak => BlockId::OAK_LEAVES,
            TreeSpecies::Birch => BlockId::BIRCH_LEAVES,
            TreeSpecies::Spruce => BlockId::SPRUCE_LEAVES,
        }
    }

    /// Inclusive trunk height range
    pub fn height_range(self) -> (u32, u32) {
        match self {
            TreeSpecies::Oak => (5, 7),
            TreeSpecies::Birch => (6, 9),
            TreeSpecies::Spruce => (7, 11),
            TreeSpecies::SwampOak => (8, 11),
        }
    }

    /// Canopy layers as (row offset from trunk top, half-width)
    fn canopy_layers(self, trunk_height: u32) -> Vec<(i32, i32)> {
        match self {
            TreeSpecies::Oak => vec![(-1, 2), (0, 2), (1, 1), (2, 1)],
            TreeSpecies::Birch => vec![(-2, 1), (-1, 1), (0, 1), (1, 1), (2, 0)],
            TreeSpecies::Spruce => {
                let rows = trunk_height.saturating_sub(2).min(7) as i32;
                (0..rows).map(|i| (1 - i, ((i + 1) / 2).min(3))).collect()
            }
            TreeSpecies::SwampOak => vec![(-1, 4), (0, 3), (1, 3), (2, 2)],
        }
    }

    /// Rows of canopy above the trunk top
    fn crown_clearance(self) -> u32 {
        match self {
            TreeSpecies::Spruce => 1,
            _ => 2,
        }
    }

    fn jittered_edges(self) -> bool {
        matches!(self, TreeSpecies::Oak | TreeSpecies::SwampOak)
    }

    /// Whether a trunk of this species can stand on `block`
    ///
    /// Spruce also roots in bare rock, which is what mountain surfaces are.
    pub fn takes_root_on(self, block: u16) -> bool {
        match block {
            BlockId::GRASS | BlockId::DIRT | BlockId::SNOW | BlockId::CLAY => true,
            BlockId::STONE | BlockId::GRAVEL => self == TreeSpecies::Spruce,
            _ => false,
        }
    }
}

/// Widest canopy half-width of any species
pub const MAX_CANOPY_HALF_WIDTH: i32 = 4;

/// Blocks that can hold a trunk of at least one species
fn is_tree_soil(block: u16) -> bool {
    [TreeSpecies::Oak, TreeSpecies::Spruce]
        .into_iter()
        .any(|species| species.takes_root_on(block))
}

/// Weighted species pick; `value` in [0, 1)
fn pick_species(table: &[TreeWeight], value: f32) -> Option<TreeSpecies> {
    let total: f32 = table.iter().map(|t| t.weight.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut target = value.clamp(0.0, 0.999_999) * total;
    for entry in table {
        let w = entry.weight.max(0.0);
        if target < w {
            return Some(entry.species);
        }
        target -= w;
    }
    table.last().map(|t| t.species)
}

/// What the vegetation stage placed in one chunk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VegetationReport {
    pub trees: usize,
    pub leaves: usize,
    pub vines: usize,
    pub cacti: usize,
    pub ground_cover: usize,
    pub ice: usize,
}

impl VegetationReport {
    pub fn blocks_placed(&self) -> usize {
        self.leaves + self.vines + self.ground_cover + self.ice
    }
}

/// Vegetation stage
pub struct VegetationPlacer {
    tree: NoiseLayer,
    grass: NoiseLayer,
    flower: NoiseLayer,
    shrub: NoiseLayer,
    mushroom: NoiseLayer,
    cactus: NoiseLayer,
    params: VegetationParams,
}

impl VegetationPlacer {
    pub fn new(seed: u64, params: &VegetationParams) -> Self {
        Self {
            tree: params.tree_noise.build(seed),
            grass: params.grass_noise.build(seed),
            flower: params.flower_noise.build(seed),
            shrub: params.shrub_noise.build(seed),
            mushroom: params.mushroom_noise.build(seed),
            cactus: params.cactus_noise.build(seed),
            params: params.clone(),
        }
    }

    /// Topmost block of a column if it can carry vegetation and has air above
    fn ground_of(chunk: &ChunkData, ctx: &StageContext, x: usize) -> Option<usize> {
        let top = chunk.column_top(x)?;
        let block = chunk.get(x, top);
        (ctx.registry.supports_vegetation(block) && top + 1 < chunk.height()).then_some(top)
    }

    fn freeze_tundra_water(chunk: &mut ChunkData, ctx: &StageContext, report: &mut VegetationReport) {
        for x in 0..chunk.width() {
            if chunk.biome_map[x] != BiomeType::Tundra {
                continue;
            }
            let Some(top) = chunk.column_top(x) else {
                continue;
            };
            if chunk.get(x, top) == BlockId::WATER && top as i32 >= ctx.sea_level - 1 {
                chunk.set(x, top, BlockId::ICE);
                report.ice += 1;
            }
        }
    }

    fn try_tree(
        &self,
        chunk: &mut ChunkData,
        ctx: &StageContext,
        x: usize,
        ground: usize,
        biome: &BiomeDefinition,
        report: &mut VegetationReport,
    ) -> bool {
        let soil = chunk.get(x, ground);
        if !is_tree_soil(soil) {
            return false;
        }
        let (xi, gy) = (x as i32, ground as i32);
        let n = self.tree.sample01(ctx.world_x(x) as f32, 0.0);
        let chance = biome.tree_rate * self.params.base_tree_chance * (0.5 + n);
        if ctx.random.roll(xi, gy, RollPurpose::TreeSpawn) >= chance {
            return false;
        }

        let pick = 0.5 * n + 0.5 * ctx.random.roll(xi, gy, RollPurpose::TreeSpecies);
        let Some(species) = pick_species(&biome.trees, pick) else {
            return false;
        };
        if !species.takes_root_on(soil) {
            return false;
        }
        let (lo, hi) = species.height_range();
        let span = (hi - lo + 1) as f32;
        let height = (lo + (ctx.random.roll(xi, gy, RollPurpose::TreeHeight) * span) as u32).min(hi);

        let top = ground + height as usize;
        if top + species.crown_clearance() as usize >= chunk.height() {
            return false;
        }
        if (ground + 1..=top).any(|y| chunk.get(x, y) != BlockId::AIR) {
            return false;
        }

        for y in ground + 1..=top {
            chunk.set(x, y, species.log_block());
        }
        self.grow_canopy(chunk, ctx, x, top, species, height, report);
        report.trees += 1;
        true
    }

    #[allow(clippy::too_many_arguments)]
    fn grow_canopy(
        &self,
        chunk: &mut ChunkData,
        ctx: &StageContext,
        x: usize,
        top: usize,
        species: TreeSpecies,
        trunk_height: u32,
        report: &mut VegetationReport,
    ) {
        let leaves = species.leaves_block();
        let mut lowest_leaves = Vec::new();
        let layers = species.canopy_layers(trunk_height);
        let lowest_dy = layers.iter().map(|l| l.0).min().unwrap_or(0);

        for (dy, radius) in layers {
            let ly = top as i32 + dy;
            for dx in -radius..=radius {
                let lx = x as i32 + dx;
                if species.jittered_edges()
                    && radius >= 2
                    && dx.abs() == radius
                    && ctx.random.roll(lx, ly, RollPurpose::Canopy) < 0.35
                {
                    continue;
                }
                if chunk.get_checked(lx, ly) == Some(BlockId::AIR) {
                    chunk.set_checked(lx, ly, leaves);
                    report.leaves += 1;
                    if dy == lowest_dy && dx != 0 {
                        lowest_leaves.push((lx, ly));
                    }
                }
            }
        }

        if species == TreeSpecies::SwampOak {
            for (lx, ly) in lowest_leaves {
                self.hang_vine(chunk, ctx, lx, ly, report);
            }
        }
    }

    fn hang_vine(
        &self,
        chunk: &mut ChunkData,
        ctx: &StageContext,
        lx: i32,
        ly: i32,
        report: &mut VegetationReport,
    ) {
        if self.params.max_vine_length == 0
            || ctx.random.roll(lx, ly, RollPurpose::Vine) >= self.params.vine_chance
        {
            return;
        }
        let length_roll = ctx.random.roll_salted(lx, ly, RollPurpose::Vine, 1);
        let length = (1 + (length_roll * self.params.max_vine_length as f32) as u32)
            .min(self.params.max_vine_length) as i32;
        for k in 1..=length {
            if chunk.get_checked(lx, ly - k) != Some(BlockId::AIR) {
                break;
            }
            chunk.set_checked(lx, ly - k, BlockId::VINE);
            report.vines += 1;
        }
    }

    fn try_cactus(&self, chunk: &mut ChunkData, ctx: &StageContext, x: usize, ground: usize) -> usize {
        if chunk.get(x, ground) != BlockId::SAND {
            return 0;
        }
        let threshold = self.params.cactus_threshold;
        let n = self.cactus.sample(ctx.world_x(x) as f32, 0.0);
        if n <= threshold || ctx.random.roll(x as i32, ground as i32, RollPurpose::Cactus) >= 0.5 {
            return 0;
        }
        let strength = (n - threshold) / (1.0 - threshold).max(f32::EPSILON);
        let height = 2 + ((strength * 3.0) as usize).min(2);
        if ground + height >= chunk.height()
            || (ground + 1..=ground + height).any(|y| chunk.get(x, y) != BlockId::AIR)
        {
            return 0;
        }
        for y in ground + 1..=ground + height {
            chunk.set(x, y, BlockId::CACTUS);
        }
        height
    }

    fn is_shaded(&self, chunk: &ChunkData, ctx: &StageContext, x: usize, ground: usize) -> bool {
        let radius = self.params.mushroom_shade_radius as i32;
        let rows = self.params.mushroom_shade_height as i32;
        (1..=rows).any(|dy| {
            (-radius..=radius).any(|dx| {
                chunk
                    .get_checked(x as i32 + dx, ground as i32 + dy)
                    .is_some_and(|b| ctx.registry.is_foliage(b))
            })
        })
    }

    /// At most one small plant per column
    fn ground_cover(
        &self,
        chunk: &ChunkData,
        ctx: &StageContext,
        x: usize,
        ground: usize,
        biome: &BiomeDefinition,
    ) -> Option<u16> {
        let p = &self.params;
        let (xi, gy) = (x as i32, ground as i32);
        let wx = ctx.world_x(x) as f32;
        let block = chunk.get(x, ground);
        let roll = |salt: u32| ctx.random.roll_salted(xi, gy, RollPurpose::GroundCover, salt);

        let mushroom_soil = matches!(
            block,
            BlockId::GRASS | BlockId::DIRT | BlockId::STONE | BlockId::GRAVEL | BlockId::CLAY
        );
        if mushroom_soil
            && self.is_shaded(chunk, ctx, x, ground)
            && roll(0) < p.base_mushroom_chance * (0.5 + self.mushroom.sample01(wx, 0.0))
        {
            return Some(BlockId::MUSHROOM);
        }

        if block == BlockId::GRASS
            && roll(1) < p.base_flower_chance * biome.flower_rate * (0.5 + self.flower.sample01(wx, 0.0))
        {
            let red = ctx.random.roll(xi, gy, RollPurpose::FlowerColor) < 0.5;
            return Some(if red {
                BlockId::RED_FLOWER
            } else {
                BlockId::YELLOW_FLOWER
            });
        }

        let shrub_soil = matches!(
            block,
            BlockId::GRASS | BlockId::DIRT | BlockId::SAND | BlockId::SNOW
        );
        if shrub_soil
            && roll(2) < p.base_shrub_chance * biome.grass_rate * (0.5 + self.shrub.sample01(wx, 0.0))
        {
            return Some(BlockId::SHRUB);
        }

        if block == BlockId::GRASS
            && roll(3) < p.base_grass_chance * biome.grass_rate * (0.5 + self.grass.sample01(wx, 0.0))
        {
            return Some(BlockId::TALL_GRASS);
        }

        None
    }
}

impl GenerationStage for VegetationPlacer {
    fn name(&self) -> &'static str {
        "vegetation"
    }

    fn run(&self, chunk: &mut ChunkData, ctx: &StageContext) -> Result<StageReport, StageError> {
        ctx.check_grid(chunk)?;
        ctx.require_blocks(&[
            BlockId::ICE,
            BlockId::OAK_LOG,
            BlockId::BIRCH_LOG,
            BlockId::SPRUCE_LOG,
            BlockId::OAK_LEAVES,
            BlockId::BIRCH_LEAVES,
            BlockId::SPRUCE_LEAVES,
            BlockId::TALL_GRASS,
            BlockId::RED_FLOWER,
            BlockId::YELLOW_FLOWER,
            BlockId::SHRUB,
            BlockId::MUSHROOM,
            BlockId::CACTUS,
            BlockId::VINE,
        ])?;

        let mut report = VegetationReport::default();
        Self::freeze_tundra_water(chunk, ctx, &mut report);

        let ground: Vec<Option<usize>> = (0..chunk.width())
            .map(|x| Self::ground_of(chunk, ctx, x))
            .collect();

        let min_spacing = self.params.min_tree_spacing as usize;
        let mut last_tree: Option<usize> = None;
        for x in 0..chunk.width() {
            let Some(gy) = ground[x] else { continue };
            if last_tree.is_some_and(|last| x - last < min_spacing) {
                continue;
            }
            let biome = ctx.biomes.get(chunk.biome_map[x]);
            if biome.trees.is_empty() {
                continue;
            }
            if self.try_tree(chunk, ctx, x, gy, biome, &mut report) {
                last_tree = Some(x);
            }
        }

        let cactus_spacing = self.params.cactus_spacing as usize;
        let mut last_cactus: Option<usize> = None;
        for x in 0..chunk.width() {
            if chunk.biome_map[x] != BiomeType::Desert {
                continue;
            }
            let Some(gy) = ground[x] else { continue };
            if last_cactus.is_some_and(|last| x - last < cactus_spacing) {
                continue;
            }
            let placed = self.try_cactus(chunk, ctx, x, gy);
            if placed > 0 {
                report.cacti += 1;
                report.ground_cover += placed;
                last_cactus = Some(x);
            }
        }

        for x in 0..chunk.width() {
            let Some(gy) = ground[x] else { continue };
            if chunk.get(x, gy + 1) != BlockId::AIR {
                continue;
            }
            let biome = ctx.biomes.get(chunk.biome_map[x]);
            if let Some(plant) = self.ground_cover(chunk, ctx, x, gy, biome) {
                chunk.set(x, gy + 1, plant);
                report.ground_cover += 1;
            }
        }

        Ok(StageReport {
            changed_blocks: report.blocks_placed(),
            detail: StageDetail::Vegetation(report),
        })
    }
}
