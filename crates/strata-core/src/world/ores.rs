//! Ore distribution - noise veins, clusters, blobs and random-walk veins
//!
//! Every placement is confined to the ore's depth band and replaces only host
//! rock (stone or deepslate).

use glam::Vec2;
use rand::Rng;
use smallvec::SmallVec;
use strata_blocks::BlockId;

use super::chunk::ChunkData;
use super::noise::{NoiseLayer, SeededNoiseField};
use super::pipeline::{GenerationStage, StageContext, StageDetail, StageReport};
use super::rng::RollPurpose;
use super::worldgen_config::{OreConfig, OreParams, WorldConfig};
use crate::error::StageError;

/// Per-chunk ore placement counts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OreReport {
    /// Cells placed per ore name (noise, clusters, blobs and veins)
    pub placed: Vec<(String, usize)>,
    pub blob_cells: usize,
    pub vein_cells: usize,
    /// Ores skipped for an unknown block or an empty band
    pub skipped: Vec<String>,
}

impl OreReport {
    pub fn total(&self) -> usize {
        self.placed.iter().map(|(_, n)| n).sum()
    }
}

/// An ore whose block and band are known for this world
struct ResolvedOre<'a> {
    index: usize,
    config: &'a OreConfig,
    noise: &'a NoiseLayer,
    block: u16,
    min_depth: i32,
    max_depth: i32,
}

impl ResolvedOre<'_> {
    fn contains_depth(&self, depth: i32) -> bool {
        depth >= self.min_depth && depth < self.max_depth
    }

    /// Position within the band in [0, 1]
    fn band_t(&self, depth: i32) -> f32 {
        let span = (self.max_depth - self.min_depth).max(1) as f32;
        (depth - self.min_depth) as f32 / span
    }
}

fn is_host_rock(block: u16) -> bool {
    block == BlockId::STONE || block == BlockId::DEEPSLATE
}

/// Ore stage
pub struct OreDistributor {
    ores: Vec<(OreConfig, NoiseLayer)>,
    vein: SeededNoiseField,
    params: OreParams,
}

impl OreDistributor {
    pub fn new(seed: u64, params: &OreParams) -> Self {
        Self {
            ores: params
                .ores
                .iter()
                .map(|ore| (ore.clone(), ore.noise.build(seed)))
                .collect(),
            vein: SeededNoiseField::from_world_seed(seed, params.vein_seed_offset),
            params: params.clone(),
        }
    }

    fn resolve<'a>(&'a self, ctx: &StageContext, report: &mut OreReport) -> Vec<ResolvedOre<'a>> {
        let h = ctx.world.world_height as f32;
        let mut resolved = Vec::with_capacity(self.ores.len());
        for (index, (config, noise)) in self.ores.iter().enumerate() {
            let Some(block) = ctx.registry.id_by_name(&config.block) else {
                log::warn!(
                    "[ORES] Unknown block {:?} for ore {}, skipping",
                    config.block,
                    config.name
                );
                report.skipped.push(config.name.clone());
                continue;
            };
            let min_depth = (h * config.min_depth_ratio) as i32;
            let max_depth = ((h * config.max_depth_ratio) as i32).min(ctx.world.world_height);
            if max_depth <= min_depth {
                log::debug!("[ORES] Empty depth band for ore {}, skipping", config.name);
                report.skipped.push(config.name.clone());
                continue;
            }
            resolved.push(ResolvedOre {
                index,
                config,
                noise,
                block,
                min_depth,
                max_depth,
            });
        }
        resolved
    }

    /// Replace host rock with the ore if the cell lies in its band
    fn place(chunk: &mut ChunkData, world: &WorldConfig, ore: &ResolvedOre, x: i32, depth: i32) -> bool {
        if !ore.contains_depth(depth) {
            return false;
        }
        let y = world.y_at_depth(depth);
        match chunk.get_checked(x, y) {
            Some(block) if is_host_rock(block) => chunk.set_checked(x, y, ore.block),
            _ => false,
        }
    }

    fn noise_pass(&self, chunk: &mut ChunkData, ctx: &StageContext, ore: &ResolvedOre) -> usize {
        let config = ore.config;
        let radius = (config.cluster_size / 2) as i32;
        let mut placed = 0;

        for depth in ore.min_depth..ore.max_depth {
            let y = ctx.world.y_at_depth(depth);
            let curve = config.depth_curve.evaluate(ore.band_t(depth));
            let base_threshold = (config.threshold - curve * config.depth_bonus) / config.rarity;

            for x in 0..chunk.width() {
                if !is_host_rock(chunk.get(x, y as usize)) {
                    continue;
                }
                let multiplier = ctx.biomes.get(chunk.biome_map[x]).ore_multiplier(ore.block);
                if multiplier <= 0.0 {
                    continue;
                }
                let wx = ctx.world_x(x) as f32;
                if ore.noise.sample(wx, y as f32) <= base_threshold / multiplier {
                    continue;
                }
                let vf = config.vein_frequency;
                if self.vein.sample(wx * vf, y as f32 * vf) <= config.vein_threshold {
                    continue;
                }

                chunk.set(x, y as usize, ore.block);
                placed += 1;

                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let dist = ((dx * dx + dy * dy) as f32).sqrt();
                        if dist > radius as f32 {
                            continue;
                        }
                        let chance = self.params.cluster_chance * (1.0 - dist / (radius + 1) as f32);
                        let cx = x as i32 + dx;
                        let roll = ctx.random.roll_salted(
                            cx,
                            y + dy,
                            RollPurpose::OreCluster,
                            ore.index as u32,
                        );
                        // dy is in world rows; depth grows the other way
                        if roll < chance && Self::place(chunk, ctx.world, ore, cx, depth - dy) {
                            placed += 1;
                        }
                    }
                }
            }
        }
        placed
    }

    /// Depth- and rarity-weighted choice among ores present at `depth`
    fn pick_ore(resolved: &[ResolvedOre], depth: i32, roll: f32) -> Option<usize> {
        let weights: SmallVec<[(usize, f32); 8]> = resolved
            .iter()
            .enumerate()
            .filter(|(_, ore)| ore.contains_depth(depth))
            .map(|(i, ore)| {
                let curve = ore.config.depth_curve.evaluate(ore.band_t(depth));
                (i, ore.config.rarity * (0.25 + curve))
            })
            .collect();
        let total: f32 = weights.iter().map(|w| w.1).sum();
        if total <= 0.0 {
            return None;
        }
        let mut target = roll * total;
        for &(i, w) in &weights {
            if target < w {
                return Some(i);
            }
            target -= w;
        }
        weights.last().map(|w| w.0)
    }

    fn stamp_blobs(
        &self,
        chunk: &mut ChunkData,
        ctx: &StageContext,
        resolved: &[ResolvedOre],
        counts: &mut [usize],
    ) -> usize {
        let (lo, hi) = band_union(resolved);
        if hi <= lo || self.params.blob_count == 0 {
            return 0;
        }
        let mut rng = ctx.random.rng(RollPurpose::OreBlob);
        let max_radius = self.params.blob_max_radius.max(1) as i32;
        let mut cells = 0;

        for _ in 0..self.params.blob_count {
            let cx = rng.gen_range(0..chunk.width() as i32);
            let cd = rng.gen_range(lo..hi);
            let rx = rng.gen_range(1..=max_radius);
            let ry = rng.gen_range(1..=max_radius);
            let Some(pick) = Self::pick_ore(resolved, cd, rng.gen::<f32>()) else {
                continue;
            };
            let ore = &resolved[pick];
            for dd in -ry..=ry {
                for dx in -rx..=rx {
                    let fx = dx as f32 / rx as f32;
                    let fy = dd as f32 / ry as f32;
                    if fx * fx + fy * fy <= 1.0 && Self::place(chunk, ctx.world, ore, cx + dx, cd + dd) {
                        cells += 1;
                        counts[ore.index] += 1;
                    }
                }
            }
        }
        cells
    }

    fn walk_veins(
        &self,
        chunk: &mut ChunkData,
        ctx: &StageContext,
        resolved: &[ResolvedOre],
        counts: &mut [usize],
    ) -> usize {
        let (lo, hi) = band_union(resolved);
        if hi <= lo || self.params.vein_count == 0 {
            return 0;
        }
        let mut rng = ctx.random.rng(RollPurpose::OreVein);
        let max_turn = self.params.vein_max_turn.abs();
        let smoothing = self.params.vein_smoothing.clamp(0.0, 1.0);
        let mut cells = 0;

        for _ in 0..self.params.vein_count {
            let start_x = rng.gen_range(0..chunk.width() as i32);
            let start_depth = rng.gen_range(lo..hi);
            let mut heading = rng.gen_range(0.0..std::f32::consts::TAU);
            let Some(pick) = Self::pick_ore(resolved, start_depth, rng.gen::<f32>()) else {
                continue;
            };
            let ore = &resolved[pick];
            let length = ore.config.vein_length + rng.gen_range(0..=ore.config.vein_length / 2);

            // Position in (x, depth) space
            let mut pos = Vec2::new(start_x as f32, start_depth as f32);
            let mut dir = Vec2::from_angle(heading);
            for _ in 0..length {
                let (x, depth) = (pos.x.round() as i32, pos.y.round() as i32);
                if Self::place(chunk, ctx.world, ore, x, depth) {
                    cells += 1;
                    counts[ore.index] += 1;
                }

                heading += rng.gen_range(-1.0f32..=1.0) * max_turn;
                let desired = Vec2::from_angle(heading);
                dir = dir.lerp(desired, smoothing).normalize_or_zero();
                if dir == Vec2::ZERO {
                    dir = desired;
                }
                pos += dir;
            }
        }
        cells
    }
}

/// Shallowest start and deepest end across all resolved bands
fn band_union(resolved: &[ResolvedOre]) -> (i32, i32) {
    let lo = resolved.iter().map(|o| o.min_depth).min().unwrap_or(0);
    let hi = resolved.iter().map(|o| o.max_depth).max().unwrap_or(0);
    (lo, hi)
}

impl GenerationStage for OreDistributor {
    fn name(&self) -> &'static str {
        "ores"
    }

    fn run(&self, chunk: &mut ChunkData, ctx: &StageContext) -> Result<StageReport, StageError> {
        ctx.check_grid(chunk)?;
        ctx.require_blocks(&[BlockId::STONE, BlockId::DEEPSLATE])?;
        // One bad name is skipped; a table with no usable block is a failure
        if let Some((first, _)) = self.ores.first() {
            let none_known = self
                .ores
                .iter()
                .all(|(config, _)| ctx.registry.id_by_name(&config.block).is_none());
            if none_known {
                return Err(StageError::UnknownBlockName(first.block.clone()));
            }
        }

        let mut report = OreReport::default();
        let resolved = self.resolve(ctx, &mut report);
        let mut counts = vec![0usize; self.ores.len()];

        for ore in &resolved {
            counts[ore.index] += self.noise_pass(chunk, ctx, ore);
        }
        report.blob_cells = self.stamp_blobs(chunk, ctx, &resolved, &mut counts);
        report.vein_cells = self.walk_veins(chunk, ctx, &resolved, &mut counts);

        report.placed = resolved
            .iter()
            .map(|ore| (ore.config.name.clone(), counts[ore.index]))
            .collect();

        Ok(StageReport {
            changed_blocks: report.total(),
            detail: StageDetail::Ores(report),
        })
    }
}
