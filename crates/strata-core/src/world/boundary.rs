//! Boundary smoothing - pulls a fresh chunk's edge heights toward its
//! already-cached neighbours
//!
//! Only the new chunk is reshaped. Its neighbours are finished and may have
//! been edited, so they are read but never written.
//!
//! Smoothing runs after vegetation. A reshaped column loses whatever grew on
//! it, and leaves or vines left without a path to any trunk are cleared from
//! the columns around it.

use strata_blocks::BlockId;

use super::biome::{BiomeDefinition, BiomeRegistry};
use super::chunk::ChunkData;
use super::terrain::{HeightFieldGenerator, BEDROCK_HEIGHT};
use super::vegetation::MAX_CANOPY_HALF_WIDTH;
use super::worldgen_config::SmoothingParams;

/// Height of a column `distance` columns in from the edge after blending
/// toward the neighbour's edge height `target`
pub fn blend_height(height: i32, target: i32, distance: u32, params: &SmoothingParams) -> i32 {
    if params.radius == 0 || distance >= params.radius {
        return height;
    }
    let falloff = 1.0 - distance as f32 / params.radius as f32;
    let weight = params.strength.clamp(0.0, 1.0) * falloff;
    (height as f32 + (target - height) as f32 * weight).round() as i32
}

/// Smooth `chunk` against whichever neighbours are present
///
/// Returns the number of columns whose height changed.
pub fn smooth_boundary(
    chunk: &mut ChunkData,
    left: Option<&ChunkData>,
    right: Option<&ChunkData>,
    params: &SmoothingParams,
    terrain: &HeightFieldGenerator,
    biomes: &BiomeRegistry,
) -> usize {
    if !params.enabled || chunk.heights.len() != chunk.width() || chunk.width() == 0 {
        return 0;
    }
    let width = chunk.width();
    let mut changed = Vec::new();

    if let Some(target) = left.and_then(|n| n.heights.last().copied()) {
        smooth_edge(chunk, target, |d| d, params, terrain, biomes, &mut changed);
    }
    if let Some(target) = right.and_then(|n| n.heights.first().copied()) {
        smooth_edge(chunk, target, |d| width - 1 - d, params, terrain, biomes, &mut changed);
    }

    if let (Some(&lo), Some(&hi)) = (changed.iter().min(), changed.iter().max()) {
        let reach = MAX_CANOPY_HALF_WIDTH as usize;
        let window = lo.saturating_sub(reach)..(hi + reach + 1).min(width);
        let pruned = prune_orphaned_foliage(chunk, window);
        log::trace!(
            "[GEN] Smoothed {} columns of chunk {} ({} foliage cells pruned)",
            changed.len(),
            chunk.x,
            pruned
        );
    }
    chunk.metadata.smoothed_columns += changed.len();
    changed.len()
}

/// Blend columns inward from one edge; `column(d)` maps distance to local x
fn smooth_edge(
    chunk: &mut ChunkData,
    target: i32,
    column: impl Fn(usize) -> usize,
    params: &SmoothingParams,
    terrain: &HeightFieldGenerator,
    biomes: &BiomeRegistry,
    changed: &mut Vec<usize>,
) {
    let edge = chunk.heights[column(0)];
    if (target - edge).abs() <= params.threshold {
        return;
    }

    let reach = (params.radius as usize).min(chunk.width());
    for d in 0..reach {
        let x = column(d);
        let old = chunk.heights[x];
        let new = blend_height(old, target, d as u32, params).clamp(BEDROCK_HEIGHT, chunk.height() as i32 - 1);
        if new == old {
            continue;
        }
        let biome = biomes.get(chunk.biome_map[x]);
        restack_column(chunk, x, old, new, terrain, biome);
        chunk.heights[x] = new;
        changed.push(x);
    }
}

/// Rebuild a column for a new surface height
///
/// Every row from the lower of the old surface and the new subsurface band
/// upward takes the terrain stack for `new`. Cave air under both surfaces
/// stays open.
fn restack_column(
    chunk: &mut ChunkData,
    x: usize,
    old: i32,
    new: i32,
    terrain: &HeightFieldGenerator,
    biome: &BiomeDefinition,
) {
    let start = (new - biome.subsurface_depth).min(old).max(BEDROCK_HEIGHT);
    for y in start..chunk.height() as i32 {
        let cave = y < new && y <= old && chunk.get(x, y as usize) == BlockId::AIR;
        if !cave {
            chunk.set(x, y as usize, terrain.block_at(y, new, biome));
        }
    }
}

fn is_log(block: u16) -> bool {
    matches!(block, BlockId::OAK_LOG | BlockId::BIRCH_LOG | BlockId::SPRUCE_LOG)
}

fn is_canopy(block: u16) -> bool {
    matches!(
        block,
        BlockId::OAK_LEAVES | BlockId::BIRCH_LEAVES | BlockId::SPRUCE_LEAVES | BlockId::VINE
    )
}

/// Clear leaves and vines in `columns` that no longer connect to a trunk
///
/// Connectivity is 8-way through canopy cells, starting from every log in
/// the chunk. Returns the number of cells cleared.
fn prune_orphaned_foliage(chunk: &mut ChunkData, columns: std::ops::Range<usize>) -> usize {
    let (width, height) = (chunk.width(), chunk.height());
    let mut reached = vec![false; width * height];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if is_log(chunk.get(x, y)) {
                reached[y * width + x] = true;
                stack.push((x, y));
            }
        }
    }

    while let Some((x, y)) = stack.pop() {
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                let index = ny * width + nx;
                if !reached[index] && is_canopy(chunk.get(nx, ny)) {
                    reached[index] = true;
                    stack.push((nx, ny));
                }
            }
        }
    }

    let mut pruned = 0;
    for y in 0..height {
        for x in columns.clone() {
            if is_canopy(chunk.get(x, y)) && !reached[y * width + x] {
                chunk.set(x, y, BlockId::AIR);
                pruned += 1;
            }
        }
    }
    pruned
}
