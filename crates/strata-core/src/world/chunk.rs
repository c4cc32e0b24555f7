//! Chunk data - one full-height vertical slice of the world

use strata_blocks::BlockId;

use super::biome::BiomeType;

/// How a stage ended for one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    Failed(String),
}

/// Wall time and outcome of one stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageTiming {
    pub stage: &'static str,
    pub elapsed_ms: f64,
    pub outcome: StageOutcome,
}

/// Generation bookkeeping attached to each chunk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMetadata {
    /// Total wall time including smoothing
    pub generation_time_ms: f64,
    pub stage_timings: Vec<StageTiming>,
    /// Final cave mask air fraction, when the cave stage ran
    pub cave_coverage: Option<f32>,
    /// Columns reshaped by boundary smoothing
    pub smoothed_columns: usize,
}

impl ChunkMetadata {
    /// Error messages of failed stages
    pub fn errors(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.stage_timings.iter().filter_map(|t| match &t.outcome {
            StageOutcome::Failed(msg) => Some((t.stage, msg.as_str())),
            StageOutcome::Completed => None,
        })
    }

    pub fn stage_failed(&self, stage: &str) -> bool {
        self.errors().any(|(name, _)| name == stage)
    }
}

/// A `world_height x chunk_width` grid of block ids, stored row-major
#[derive(Debug, Clone)]
pub struct ChunkData {
    /// Chunk coordinate
    pub x: i32,
    width: usize,
    height: usize,
    blocks: Vec<u16>,
    pub biome_map: Vec<BiomeType>,
    /// Surface y per column; empty until the terrain stage has run
    pub heights: Vec<i32>,
    pub metadata: ChunkMetadata,
}

impl ChunkData {
    /// All-air chunk
    pub fn new(x: i32, width: usize, height: usize) -> Self {
        Self {
            x,
            width,
            height,
            blocks: vec![BlockId::AIR; width * height],
            biome_map: Vec::with_capacity(width),
            heights: Vec::new(),
            metadata: ChunkMetadata::default(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// World X of local column 0
    pub fn world_x_origin(&self) -> i32 {
        self.x * self.width as i32
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Block at local (x, y); caller guarantees bounds
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u16 {
        debug_assert!(x < self.width && y < self.height);
        self.blocks[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, block: u16) {
        debug_assert!(x < self.width && y < self.height);
        let idx = self.index(x, y);
        self.blocks[idx] = block;
    }

    /// Block at signed local coordinates, `None` outside the chunk
    pub fn get_checked(&self, x: i32, y: i32) -> Option<u16> {
        self.in_bounds(x, y)
            .then(|| self.blocks[self.index(x as usize, y as usize)])
    }

    /// Set a block if the signed coordinates are inside the chunk
    pub fn set_checked(&mut self, x: i32, y: i32, block: u16) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x as usize, y as usize);
        self.blocks[idx] = block;
        true
    }

    pub fn blocks(&self) -> &[u16] {
        &self.blocks
    }

    /// y of the topmost non-air block in a column
    pub fn column_top(&self, x: usize) -> Option<usize> {
        (0..self.height).rev().find(|&y| self.get(x, y) != BlockId::AIR)
    }

    pub fn count(&self, block: u16) -> usize {
        self.blocks.iter().filter(|&&b| b == block).count()
    }

    /// Lowest and highest surface height
    pub fn height_range(&self) -> Option<(i32, i32)> {
        let min = self.heights.iter().copied().min()?;
        let max = self.heights.iter().copied().max()?;
        Some((min, max))
    }

    /// Bytes held by the block grid and per-column arrays
    pub fn memory_bytes(&self) -> usize {
        self.blocks.len() * std::mem::size_of::<u16>()
            + self.biome_map.len() * std::mem::size_of::<BiomeType>()
            + self.heights.len() * std::mem::size_of::<i32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chunk_is_air() {
        let chunk = ChunkData::new(3, 8, 16);
        assert_eq!(chunk.blocks().len(), 128);
        assert_eq!(chunk.count(BlockId::AIR), 128);
        assert_eq!(chunk.column_top(0), None);
        assert_eq!(chunk.world_x_origin(), 24);
        assert_eq!(chunk.height_range(), None);
    }

    #[test]
    fn test_row_major_layout() {
        let mut chunk = ChunkData::new(0, 4, 4);
        chunk.set(1, 2, BlockId::STONE);
        assert_eq!(chunk.blocks()[2 * 4 + 1], BlockId::STONE);
        assert_eq!(chunk.get(1, 2), BlockId::STONE);
        assert_eq!(chunk.column_top(1), Some(2));
    }

    #[test]
    fn test_checked_access() {
        let mut chunk = ChunkData::new(0, 4, 4);
        assert_eq!(chunk.get_checked(-1, 0), None);
        assert_eq!(chunk.get_checked(0, 4), None);
        assert!(!chunk.set_checked(4, 0, BlockId::DIRT));
        assert!(chunk.set_checked(3, 3, BlockId::DIRT));
        assert_eq!(chunk.get_checked(3, 3), Some(BlockId::DIRT));
    }

    #[test]
    fn test_metadata_errors() {
        let mut metadata = ChunkMetadata::default();
        metadata.stage_timings.push(StageTiming {
            stage: "terrain",
            elapsed_ms: 1.0,
            outcome: StageOutcome::Completed,
        });
        metadata.stage_timings.push(StageTiming {
            stage: "ores",
            elapsed_ms: 0.5,
            outcome: StageOutcome::Failed("block id 99 is not registered".to_string()),
        });
        assert!(metadata.stage_failed("ores"));
        assert!(!metadata.stage_failed("terrain"));
        assert_eq!(metadata.errors().count(), 1);
    }
}
