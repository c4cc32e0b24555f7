//! Cave carving - cellular automaton with a coverage feedback loop
//!
//! Caves live in a depth band of every chunk. A boolean mask over the band is
//! seeded from noise, relaxed by a Moore-neighbourhood automaton, nudged
//! toward a target air coverage, cut with tunnels and chambers, checked once
//! more, and finally applied to the chunk grid.

use strata_blocks::BlockId;

use super::chunk::ChunkData;
use super::noise::NoiseLayer;
use super::pipeline::{GenerationStage, StageContext, StageDetail, StageReport};
use super::rng::{CellRandom, RollPurpose};
use super::terrain::BEDROCK_HEIGHT;
use super::worldgen_config::{CaveParams, WorldConfig};
use crate::error::StageError;

/// Progress of the cave stage through its phases, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CavePhase {
    Seeded,
    AutomatonRelaxed,
    CoverageAdjusted,
    Tunneled,
    Chambered,
    CoverageFinalized,
    Deposited,
}

/// Boolean is-air grid over the cave band; row 0 is the shallowest row
#[derive(Debug, Clone, PartialEq)]
pub struct CaveMask {
    width: usize,
    rows: usize,
    cells: Vec<bool>,
}

impl CaveMask {
    pub fn new(width: usize, rows: usize) -> Self {
        Self {
            width,
            rows,
            cells: vec![false; width * rows],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn get(&self, x: usize, r: usize) -> bool {
        self.cells[r * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, r: usize, air: bool) {
        self.cells[r * self.width + x] = air;
    }

    /// Air cells among the eight neighbours; outside the mask counts as solid
    pub fn air_neighbors(&self, x: usize, r: usize) -> u8 {
        let mut count = 0;
        for dr in -1i32..=1 {
            for dx in -1i32..=1 {
                if dr == 0 && dx == 0 {
                    continue;
                }
                let nx = x as i32 + dx;
                let nr = r as i32 + dr;
                if nx < 0 || nr < 0 || nx >= self.width as i32 || nr >= self.rows as i32 {
                    continue;
                }
                if self.get(nx as usize, nr as usize) {
                    count += 1;
                }
            }
        }
        count
    }

    pub fn air_count(&self) -> usize {
        self.cells.iter().filter(|&&air| air).count()
    }

    /// Air fraction of the mask
    pub fn coverage(&self) -> f32 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.air_count() as f32 / self.cells.len() as f32
    }
}

/// Outcome of the cave stage for one chunk
#[derive(Debug, Clone, PartialEq)]
pub struct CaveReport {
    /// Phases reached, in order
    pub phases: Vec<CavePhase>,
    /// Depth band `[min, max)`, `None` when the band is empty
    pub band: Option<(i32, i32)>,
    pub relaxed_coverage: f32,
    pub final_coverage: f32,
    /// Fill/grow rounds spent across both coverage checks
    pub adjustment_rounds: u32,
    pub carved: usize,
    pub fragments_removed: usize,
    pub sediment: usize,
}

impl CaveReport {
    fn empty() -> Self {
        Self {
            phases: Vec::new(),
            band: None,
            relaxed_coverage: 0.0,
            final_coverage: 0.0,
            adjustment_rounds: 0,
            carved: 0,
            fragments_removed: 0,
            sediment: 0,
        }
    }

    pub fn phase(&self) -> Option<CavePhase> {
        self.phases.last().copied()
    }

    fn enter(&mut self, phase: CavePhase) {
        log::trace!("[CAVES] -> {:?}", phase);
        self.phases.push(phase);
    }
}

/// Cave stage
pub struct CaveCarver {
    noise: NoiseLayer,
    tunnel: NoiseLayer,
    chamber: NoiseLayer,
    params: CaveParams,
}

impl CaveCarver {
    pub fn new(seed: u64, params: &CaveParams) -> Self {
        Self {
            noise: params.noise.build(seed),
            tunnel: params.tunnel_noise.build(seed),
            chamber: params.chamber_noise.build(seed),
            params: params.clone(),
        }
    }

    /// Depth band `[min, max)` for a world height, kept clear of bedrock
    pub fn depth_band(&self, world_height: i32) -> Option<(i32, i32)> {
        let h = world_height as f32;
        let min = (h * self.params.min_depth_ratio) as i32;
        let max = ((h * self.params.max_depth_ratio) as i32).min(world_height - BEDROCK_HEIGHT);
        (max > min).then_some((min, max))
    }

    /// Run every mask phase; `None` for an empty band
    pub fn build_mask(
        &self,
        origin_x: i32,
        width: usize,
        world: &WorldConfig,
        random: &CellRandom,
    ) -> Option<(CaveMask, CaveReport)> {
        let (min_depth, max_depth) = self.depth_band(world.world_height)?;
        let rows = (max_depth - min_depth) as usize;
        let mut report = CaveReport::empty();
        report.band = Some((min_depth, max_depth));

        let mut mask = self.seed_mask(origin_x, width, rows, min_depth, world);
        report.enter(CavePhase::Seeded);

        for _ in 0..self.params.iterations {
            mask = self.relax(&mask);
        }
        report.relaxed_coverage = mask.coverage();
        report.enter(CavePhase::AutomatonRelaxed);

        report.adjustment_rounds += self.adjust_coverage(&mut mask, random, 0);
        report.enter(CavePhase::CoverageAdjusted);

        self.open_tunnels(&mut mask, origin_x, min_depth, world);
        report.enter(CavePhase::Tunneled);

        self.stamp_chambers(&mut mask, origin_x, min_depth, world);
        report.enter(CavePhase::Chambered);

        report.adjustment_rounds += self.adjust_coverage(&mut mask, random, 1 << 16);
        report.final_coverage = mask.coverage();
        report.enter(CavePhase::CoverageFinalized);

        Some((mask, report))
    }

    fn seed_mask(
        &self,
        origin_x: i32,
        width: usize,
        rows: usize,
        min_depth: i32,
        world: &WorldConfig,
    ) -> CaveMask {
        let mut mask = CaveMask::new(width, rows);
        let span = rows.saturating_sub(1).max(1) as f32;
        for r in 0..rows {
            let rel = r as f32 / span;
            let weight = (std::f32::consts::PI * rel).sin();
            let adjusted = self.params.initial_chance * (0.5 + 0.5 * weight);
            let y = world.y_at_depth(min_depth + r as i32) as f32;
            for x in 0..width {
                let n = self.noise.sample01((origin_x + x as i32) as f32, y);
                if n > 1.0 - adjusted {
                    mask.set(x, r, true);
                }
            }
        }
        mask
    }

    /// One double-buffered automaton pass
    fn relax(&self, mask: &CaveMask) -> CaveMask {
        let mut next = mask.clone();
        for r in 0..mask.rows() {
            for x in 0..mask.width() {
                let air = mask.air_neighbors(x, r);
                let open = if mask.get(x, r) {
                    air >= self.params.death_limit
                } else {
                    air > self.params.birth_limit
                };
                next.set(x, r, open);
            }
        }
        next
    }

    /// Fill or grow until coverage is within tolerance; returns rounds used
    fn adjust_coverage(&self, mask: &mut CaveMask, random: &CellRandom, salt_base: u32) -> u32 {
        if mask.is_empty() {
            return 0;
        }
        let target = self.params.coverage_target;
        let tolerance = self.params.coverage_tolerance;
        let total = mask.len() as f32;
        let mut rounds = 0;

        for pass in 0..self.params.adjustment_passes {
            let coverage = mask.coverage();
            let salt = salt_base + pass;
            if coverage > target + tolerance {
                self.fill_excess(mask, (coverage - target) * total, random, salt);
            } else if coverage < target - tolerance {
                self.grow_deficit(mask, (target - coverage) * total, random, salt);
            } else {
                break;
            }
            rounds += 1;
        }

        log::trace!(
            "[CAVES] Coverage {:.3} after {} adjustment rounds",
            mask.coverage(),
            rounds
        );
        rounds
    }

    /// Close air cells, favouring cells at cave edges
    fn fill_excess(&self, mask: &mut CaveMask, excess: f32, random: &CellRandom, salt: u32) {
        let mut candidates = Vec::new();
        for r in 0..mask.rows() {
            for x in 0..mask.width() {
                if mask.get(x, r) {
                    let score = (8 - mask.air_neighbors(x, r)) as f32;
                    candidates.push((x, r, score));
                }
            }
        }
        let total: f32 = candidates.iter().map(|c| c.2).sum();
        if total <= 0.0 {
            // Every air cell is fully enclosed by air; thin them uniformly
            let p = (excess / candidates.len().max(1) as f32).min(1.0);
            for (x, r, _) in candidates {
                if random.roll_salted(x as i32, r as i32, RollPurpose::CaveFill, salt) < p {
                    mask.set(x, r, false);
                }
            }
            return;
        }
        for (x, r, score) in candidates {
            let p = (excess * score / total).min(1.0);
            if random.roll_salted(x as i32, r as i32, RollPurpose::CaveFill, salt) < p {
                mask.set(x, r, false);
            }
        }
    }

    /// Open solid cells next to existing air, or scatter new air if there is none
    fn grow_deficit(&self, mask: &mut CaveMask, deficit: f32, random: &CellRandom, salt: u32) {
        let mut frontier = Vec::new();
        let mut solid = Vec::new();
        for r in 0..mask.rows() {
            for x in 0..mask.width() {
                if !mask.get(x, r) {
                    let air = mask.air_neighbors(x, r);
                    if air > 0 {
                        frontier.push((x, r, air as f32));
                    }
                    solid.push((x, r));
                }
            }
        }

        if frontier.is_empty() {
            let p = (deficit / solid.len().max(1) as f32).min(1.0);
            for (x, r) in solid {
                if random.roll_salted(x as i32, r as i32, RollPurpose::CaveScatter, salt) < p {
                    mask.set(x, r, true);
                }
            }
            return;
        }

        let total: f32 = frontier.iter().map(|c| c.2).sum();
        for (x, r, weight) in frontier {
            let p = (deficit * weight / total).min(1.0);
            if random.roll_salted(x as i32, r as i32, RollPurpose::CaveGrow, salt) < p {
                mask.set(x, r, true);
            }
        }
    }

    fn open_tunnels(&self, mask: &mut CaveMask, origin_x: i32, min_depth: i32, world: &WorldConfig) {
        let stretch = self.params.tunnel_stretch.max(1.0);
        let horizontal = self.params.tunnel_threshold;
        let vertical = self.params.tunnel_threshold + self.params.vertical_tunnel_bias;

        for r in 0..mask.rows() {
            let y = world.y_at_depth(min_depth + r as i32) as f32;
            for x in 0..mask.width() {
                let wx = (origin_x + x as i32) as f32;

                if self.tunnel.sample(wx / stretch, y * stretch) > horizontal {
                    mask.set(x, r, true);
                    if r > 0 {
                        mask.set(x, r - 1, true);
                    }
                }

                // Offset keeps shafts uncorrelated with the horizontal tunnels
                if self.tunnel.sample(wx * stretch + 10_000.0, y / stretch) > vertical {
                    mask.set(x, r, true);
                    if x + 1 < mask.width() {
                        mask.set(x + 1, r, true);
                    }
                }
            }
        }
    }

    fn stamp_chambers(&self, mask: &mut CaveMask, origin_x: i32, min_depth: i32, world: &WorldConfig) {
        let spacing = self.params.chamber_spacing.max(1) as i32;
        let rx = self.params.chamber_radius_x as i32;
        let ry = self.params.chamber_radius_y as i32;
        if rx == 0 || ry == 0 {
            return;
        }

        for r in 0..mask.rows() as i32 {
            // Lattice is aligned to world coordinates so chambers don't shift per chunk
            if (min_depth + r).rem_euclid(spacing) != 0 {
                continue;
            }
            let y = world.y_at_depth(min_depth + r) as f32;
            for x in 0..mask.width() as i32 {
                let wx = origin_x + x;
                if wx.rem_euclid(spacing) != 0 {
                    continue;
                }
                if self.chamber.sample(wx as f32, y) <= self.params.chamber_threshold {
                    continue;
                }
                for dy in -ry..=ry {
                    for dx in -rx..=rx {
                        let fx = dx as f32 / rx as f32;
                        let fy = dy as f32 / ry as f32;
                        if fx * fx + fy * fy > 1.0 {
                            continue;
                        }
                        let (cx, cr) = (x + dx, r + dy);
                        if cx >= 0
                            && cr >= 0
                            && (cx as usize) < mask.width()
                            && (cr as usize) < mask.rows()
                        {
                            mask.set(cx as usize, cr as usize, true);
                        }
                    }
                }
            }
        }
    }

    /// Write the mask into the chunk, then tidy fragments and drop sediment
    fn apply(
        &self,
        chunk: &mut ChunkData,
        mask: &CaveMask,
        min_depth: i32,
        ctx: &StageContext,
        report: &mut CaveReport,
    ) {
        let registry = ctx.registry;
        let mut carved_cells = Vec::new();

        for r in 0..mask.rows() {
            let y = ctx.world.y_at_depth(min_depth + r as i32) as usize;
            for x in 0..mask.width() {
                if !mask.get(x, r) {
                    continue;
                }
                let block = chunk.get(x, y);
                if registry.is_solid(block) && registry.is_carvable(block) {
                    chunk.set(x, y, BlockId::AIR);
                    carved_cells.push((x, y));
                }
            }
        }
        report.carved = carved_cells.len();

        // Floating single blocks left between carved cells
        for r in 0..mask.rows() {
            let y = ctx.world.y_at_depth(min_depth + r as i32);
            for x in 0..chunk.width() as i32 {
                let block = chunk.get(x as usize, y as usize);
                if !registry.is_solid(block) || !registry.is_carvable(block) {
                    continue;
                }
                let isolated = [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
                    .iter()
                    .all(|&(nx, ny)| chunk.get_checked(nx, ny) == Some(BlockId::AIR));
                if isolated {
                    chunk.set(x as usize, y as usize, BlockId::AIR);
                    report.fragments_removed += 1;
                }
            }
        }

        for (x, y) in carved_cells {
            if y == 0 || chunk.get(x, y) != BlockId::AIR {
                continue;
            }
            if !registry.is_solid(chunk.get(x, y - 1)) {
                continue;
            }
            let roll = ctx
                .random
                .roll(x as i32, y as i32, RollPurpose::CaveSediment);
            if roll < self.params.sediment_chance {
                chunk.set(x, y, BlockId::GRAVEL);
                report.sediment += 1;
            }
        }
        report.enter(CavePhase::Deposited);
    }
}

impl GenerationStage for CaveCarver {
    fn name(&self) -> &'static str {
        "caves"
    }

    fn run(&self, chunk: &mut ChunkData, ctx: &StageContext) -> Result<StageReport, StageError> {
        ctx.check_grid(chunk)?;
        ctx.require_blocks(&[BlockId::AIR, BlockId::GRAVEL])?;

        let Some((mask, mut report)) =
            self.build_mask(ctx.world_x(0), chunk.width(), ctx.world, &ctx.random)
        else {
            log::debug!("[CAVES] Empty cave band, chunk {} left uncarved", ctx.chunk_x);
            return Ok(StageReport {
                changed_blocks: 0,
                detail: StageDetail::Caves(CaveReport::empty()),
            });
        };

        let min_depth = report.band.map(|(min, _)| min).unwrap_or(0);
        self.apply(chunk, &mask, min_depth, ctx, &mut report);

        log::trace!(
            "[CAVES] Chunk {}: coverage {:.3}, carved {}, fragments {}, sediment {}",
            ctx.chunk_x,
            report.final_coverage,
            report.carved,
            report.fragments_removed,
            report.sediment
        );

        Ok(StageReport {
            changed_blocks: report.carved + report.fragments_removed + report.sediment,
            detail: StageDetail::Caves(report),
        })
    }
}
