//! Seeded randomness for generation stages
//!
//! Two flavours, both derived purely from the world seed:
//! - `CellRandom::roll` hashes (seed, chunk, x, y, purpose) into a float, for
//!   per-cell decisions that must not depend on iteration order
//! - `CellRandom::rng` seeds a Xoshiro256** stream for sequential decisions
//!   (blob and vein walks) within one chunk

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

/// What a random roll is used for; keeps unrelated decisions uncorrelated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RollPurpose {
    CaveFill,
    CaveGrow,
    CaveScatter,
    CaveSediment,
    OreCluster,
    OreBlob,
    OreVein,
    TreeSpawn,
    TreeSpecies,
    TreeHeight,
    Canopy,
    Vine,
    GroundCover,
    FlowerColor,
    Cactus,
}

impl RollPurpose {
    fn salt(self) -> u64 {
        // Stable per-variant constants; reordering the enum must not change worlds
        match self {
            RollPurpose::CaveFill => 0x01,
            RollPurpose::CaveGrow => 0x02,
            RollPurpose::CaveScatter => 0x03,
            RollPurpose::CaveSediment => 0x04,
            RollPurpose::OreCluster => 0x10,
            RollPurpose::OreBlob => 0x11,
            RollPurpose::OreVein => 0x12,
            RollPurpose::TreeSpawn => 0x20,
            RollPurpose::TreeSpecies => 0x21,
            RollPurpose::TreeHeight => 0x22,
            RollPurpose::Canopy => 0x23,
            RollPurpose::Vine => 0x24,
            RollPurpose::GroundCover => 0x30,
            RollPurpose::FlowerColor => 0x31,
            RollPurpose::Cactus => 0x32,
        }
    }
}

/// SplitMix64 finaliser
fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seeded randomness scoped to one chunk
#[derive(Debug, Clone, Copy)]
pub struct CellRandom {
    seed: u64,
    chunk_x: i32,
}

impl CellRandom {
    pub fn new(seed: u64, chunk_x: i32) -> Self {
        Self { seed, chunk_x }
    }

    fn hash(&self, x: i32, y: i32, purpose: RollPurpose, salt: u32) -> u64 {
        let mut h = mix64(self.seed);
        h = mix64(h ^ self.chunk_x as u32 as u64);
        h = mix64(h ^ ((x as u32 as u64) << 32 | y as u32 as u64));
        mix64(h ^ (purpose.salt() << 32 | salt as u64))
    }

    /// Uniform float in [0, 1) for a cell and purpose
    pub fn roll(&self, x: i32, y: i32, purpose: RollPurpose) -> f32 {
        self.roll_salted(x, y, purpose, 0)
    }

    /// Like `roll`, with an extra salt for repeated passes over the same cell
    pub fn roll_salted(&self, x: i32, y: i32, purpose: RollPurpose, salt: u32) -> f32 {
        // Top 24 bits give an exact f32 in [0, 1)
        (self.hash(x, y, purpose, salt) >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Sequential stream for this chunk and purpose
    pub fn rng(&self, purpose: RollPurpose) -> Xoshiro256StarStar {
        Xoshiro256StarStar::seed_from_u64(self.hash(0, 0, purpose, u32::MAX))
    }
}
