//! World generation configuration - serializable parameters for world generation
//!
//! `WorldConfig` fixes the shape of the world (column height, chunk width).
//! `GenerationParams` carries every tunable of the pipeline and round-trips
//! through RON, so presets are data rather than code paths. The seed is NOT
//! part of the params - same params + different seed = different world.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::biome::{default_biome_definitions, BiomeRegistry, BiomeType};
use super::noise::NoiseLayer;
use crate::error::WorldGenError;

/// Current `GenerationParams` format version
pub const PARAMS_VERSION: u32 = 1;

/// Names accepted by [`GenerationParams::preset`]
pub const PRESET_NAMES: &[&str] = &["default", "cave_heavy", "flat", "mountainous", "lush"];

/// Shape of the world grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Blocks per column (default: 400)
    pub world_height: i32,
    /// Columns per chunk (default: 64)
    pub chunk_width: i32,
    /// Pixel size of one block for renderers (default: 32)
    pub block_size: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_height: 400,
            chunk_width: 64,
            block_size: 32,
        }
    }
}

impl WorldConfig {
    /// Smallest column that still fits bedrock, a surface band and sky
    pub const MIN_WORLD_HEIGHT: i32 = 32;

    pub fn validate(&self) -> Result<(), WorldGenError> {
        if self.world_height < Self::MIN_WORLD_HEIGHT {
            return Err(WorldGenError::InvalidWorldConfig(format!(
                "world_height must be at least {}, got {}",
                Self::MIN_WORLD_HEIGHT,
                self.world_height
            )));
        }
        if self.chunk_width <= 0 {
            return Err(WorldGenError::InvalidWorldConfig(format!(
                "chunk_width must be positive, got {}",
                self.chunk_width
            )));
        }
        if self.block_size <= 0 {
            return Err(WorldGenError::InvalidWorldConfig(format!(
                "block_size must be positive, got {}",
                self.block_size
            )));
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.chunk_width as usize
    }

    pub fn height(&self) -> usize {
        self.world_height as usize
    }

    /// Chunk coordinate and local column for a world X
    pub fn chunk_of(&self, world_x: i32) -> (i32, usize) {
        (
            world_x.div_euclid(self.chunk_width),
            world_x.rem_euclid(self.chunk_width) as usize,
        )
    }

    /// Depth of row `y`, measured down from the top of the world
    pub fn depth_of(&self, y: i32) -> i32 {
        self.world_height - 1 - y
    }

    /// Row at `depth`
    pub fn y_at_depth(&self, depth: i32) -> i32 {
        self.world_height - 1 - depth
    }
}

/// Configuration for a single noise layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseLayerConfig {
    /// Offset added to world seed for this layer
    pub seed_offset: i32,
    /// Base frequency (lower = larger features)
    pub frequency: f32,
    /// Number of fractal octaves (0 disables the layer)
    pub octaves: u8,
    /// Amplitude multiplier per octave (default: 0.5)
    pub persistence: f32,
    /// Frequency multiplier per octave (default: 2.0)
    pub lacunarity: f32,
}

impl Default for NoiseLayerConfig {
    fn default() -> Self {
        Self::new(0, 0.01, 3)
    }
}

impl NoiseLayerConfig {
    pub const fn new(seed_offset: i32, frequency: f32, octaves: u8) -> Self {
        Self {
            seed_offset,
            frequency,
            octaves,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }

    /// Build the sampling layer for a world seed
    pub fn build(&self, world_seed: u64) -> NoiseLayer {
        NoiseLayer::new(world_seed, self)
    }
}

/// One additive band of the height field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightBand {
    pub noise: NoiseLayerConfig,
    /// Blocks of elevation at full noise and biome weight 1
    pub amplitude: f32,
}

/// Terrain height generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Sea level as a fraction of world height; also the base height (default: 0.5)
    pub sea_level_ratio: f32,
    /// Very low frequency landmass shape
    pub continental: HeightBand,
    /// Hills and valleys
    pub regional: HeightBand,
    /// Short-range bumps
    pub local: HeightBand,
    /// Block-scale roughness
    pub roughness: HeightBand,
    /// Ocean floors sit at least this far below sea level
    pub ocean_floor_depth: i32,
    /// Extra depth subtracted from ocean columns
    pub ocean_depth: f32,
    /// Noise that raises mountain peaks
    pub peak_noise: NoiseLayerConfig,
    /// Peak noise above this adds height (default: 0.3)
    pub peak_threshold: f32,
    /// Height added at full peak noise (default: 40)
    pub peak_bonus: f32,
    /// Flat lift applied to every mountain column
    pub mountain_lift: f32,
    /// Desert dune ripple frequency (radians per column)
    pub dune_frequency: f32,
    /// Desert dune ripple amplitude
    pub dune_amplitude: f32,
    /// Plains keep this fraction of their deviation from base height
    pub plains_compression: f32,
    /// Plains hill bump amplitude
    pub plains_hill_amplitude: f32,
    /// Plains hill bump frequency (radians per column)
    pub plains_hill_frequency: f32,
    /// Deepslate replaces stone below this fraction of the surface height
    pub deep_stratum_ratio: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            sea_level_ratio: 0.5,
            continental: HeightBand {
                noise: NoiseLayerConfig::new(100, 0.0015, 3),
                amplitude: 50.0,
            },
            regional: HeightBand {
                noise: NoiseLayerConfig::new(200, 0.006, 3),
                amplitude: 28.0,
            },
            local: HeightBand {
                noise: NoiseLayerConfig::new(300, 0.03, 2),
                amplitude: 26.0,
            },
            roughness: HeightBand {
                noise: NoiseLayerConfig::new(400, 0.15, 1),
                amplitude: 6.0,
            },
            ocean_floor_depth: 6,
            ocean_depth: 14.0,
            peak_noise: NoiseLayerConfig::new(500, 0.02, 2),
            peak_threshold: 0.3,
            peak_bonus: 40.0,
            mountain_lift: 12.0,
            dune_frequency: 0.15,
            dune_amplitude: 3.0,
            plains_compression: 0.75,
            plains_hill_amplitude: 5.0,
            plains_hill_frequency: 0.08,
            deep_stratum_ratio: 0.45,
        }
    }
}

/// Ordered biome rule thresholds (first match wins)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeThresholds {
    /// Ocean below this elevation
    pub ocean_elevation: f32,
    /// Tundra below this temperature
    pub tundra_temperature: f32,
    /// Desert above this temperature...
    pub desert_temperature: f32,
    /// ...and below this humidity
    pub desert_humidity: f32,
    /// Mountains above this elevation
    pub mountain_elevation: f32,
    /// Forest above this humidity (at or above `swamp_elevation`)
    pub forest_humidity: f32,
    /// Swamp above this humidity (below `swamp_elevation`)
    pub swamp_humidity: f32,
    /// Elevation splitting forest from swamp
    pub swamp_elevation: f32,
}

impl Default for BiomeThresholds {
    fn default() -> Self {
        Self {
            ocean_elevation: -0.30,
            tundra_temperature: -0.35,
            desert_temperature: 0.30,
            desert_humidity: -0.10,
            mountain_elevation: 0.35,
            forest_humidity: 0.15,
            swamp_humidity: 0.25,
            swamp_elevation: -0.05,
        }
    }
}

/// Biome selection and definitions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeParams {
    pub temperature_noise: NoiseLayerConfig,
    pub humidity_noise: NoiseLayerConfig,
    pub elevation_noise: NoiseLayerConfig,
    pub thresholds: BiomeThresholds,
    /// One definition per biome type
    pub definitions: Vec<super::biome::BiomeDefinition>,
}

impl Default for BiomeParams {
    fn default() -> Self {
        Self {
            temperature_noise: NoiseLayerConfig::new(1000, 0.0012, 3),
            humidity_noise: NoiseLayerConfig::new(2000, 0.0015, 3),
            elevation_noise: NoiseLayerConfig::new(3000, 0.001, 3),
            thresholds: BiomeThresholds::default(),
            definitions: default_biome_definitions(),
        }
    }
}

/// Cave system generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveParams {
    /// Seeds the initial automaton state
    pub noise: NoiseLayerConfig,
    /// Sampled with stretched coordinates for tunnels and shafts
    pub tunnel_noise: NoiseLayerConfig,
    /// Sampled on the chamber lattice
    pub chamber_noise: NoiseLayerConfig,
    /// Top of the cave band as a fraction of world height, measured as depth
    pub min_depth_ratio: f32,
    /// Bottom of the cave band as a fraction of world height
    pub max_depth_ratio: f32,
    /// Peak seeding probability at the middle of the band (default: 0.45)
    pub initial_chance: f32,
    /// Automaton relaxation passes (default: 4)
    pub iterations: u32,
    /// Solid becomes air with more than this many air neighbours
    pub birth_limit: u8,
    /// Air survives with at least this many air neighbours
    pub death_limit: u8,
    /// Target air fraction of the band (default: 0.12)
    pub coverage_target: f32,
    /// Accepted deviation from the target (default: 0.03)
    pub coverage_tolerance: f32,
    /// Fill/grow rounds per coverage adjustment
    pub adjustment_passes: u32,
    /// Tunnel noise above this opens a horizontal tunnel
    pub tunnel_threshold: f32,
    /// Added to the tunnel threshold for vertical shafts
    pub vertical_tunnel_bias: f32,
    /// Coordinate stretch factor for tunnel sampling
    pub tunnel_stretch: f32,
    /// Chamber noise above this stamps a chamber
    pub chamber_threshold: f32,
    /// Lattice step between chamber candidates
    pub chamber_spacing: u32,
    pub chamber_radius_x: u32,
    pub chamber_radius_y: u32,
    /// Chance a carved floor cell gets gravel
    pub sediment_chance: f32,
}

impl Default for CaveParams {
    fn default() -> Self {
        Self {
            noise: NoiseLayerConfig::new(5000, 0.06, 3),
            tunnel_noise: NoiseLayerConfig::new(6000, 0.03, 2),
            chamber_noise: NoiseLayerConfig::new(7000, 0.05, 2),
            min_depth_ratio: 0.55,
            max_depth_ratio: 0.97,
            initial_chance: 0.45,
            iterations: 4,
            birth_limit: 4,
            death_limit: 3,
            coverage_target: 0.12,
            coverage_tolerance: 0.03,
            adjustment_passes: 8,
            tunnel_threshold: 0.45,
            vertical_tunnel_bias: 0.05,
            tunnel_stretch: 3.0,
            chamber_threshold: 0.55,
            chamber_spacing: 8,
            chamber_radius_x: 5,
            chamber_radius_y: 3,
            sediment_chance: 0.04,
        }
    }
}

/// Ore abundance profile across the ore's depth band, `t` in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthCurve {
    /// `sin(pi t)`, peaks mid-band
    MidPeak,
    /// `sin(pi t)^0.5`, broad mid-band plateau
    BroadMidPeak,
    /// `(1 - t)^0.6`, richest near the top
    Shallow,
    /// `t^2`
    Deep,
    /// `t^3`
    VeryDeep,
}

impl DepthCurve {
    pub fn evaluate(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            DepthCurve::MidPeak => (std::f32::consts::PI * t).sin(),
            DepthCurve::BroadMidPeak => (std::f32::consts::PI * t).sin().max(0.0).sqrt(),
            DepthCurve::Shallow => (1.0 - t).powf(0.6),
            DepthCurve::Deep => t * t,
            DepthCurve::VeryDeep => t * t * t,
        }
    }
}

/// Individual ore generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OreConfig {
    /// Display name
    pub name: String,
    /// Registry name of the placed block
    pub block: String,
    /// Shallowest depth as a fraction of world height
    pub min_depth_ratio: f32,
    /// Deepest depth as a fraction of world height (exclusive)
    pub max_depth_ratio: f32,
    /// Noise layer for ore placement
    pub noise: NoiseLayerConfig,
    /// Frequency at which the shared vein field is sampled
    pub vein_frequency: f32,
    /// Threshold for ore generation (higher = rarer)
    pub threshold: f32,
    /// Vein connectivity noise must exceed this
    pub vein_threshold: f32,
    /// Cluster diameter around each noise hit
    pub cluster_size: u32,
    /// Steps per random-walk vein
    pub vein_length: u32,
    /// How much the depth curve lowers the threshold
    pub depth_bonus: f32,
    pub depth_curve: DepthCurve,
    /// Abundance divisor; below 1 is rarer
    pub rarity: f32,
}

/// Ore generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OreParams {
    /// Seed offset of the shared vein-connectivity field
    pub vein_seed_offset: i32,
    pub ores: Vec<OreConfig>,
    /// Elliptical blobs stamped per chunk
    pub blob_count: u32,
    /// Random-walk veins stamped per chunk
    pub vein_count: u32,
    /// Chance a neighbour joins a cluster at distance 0
    pub cluster_chance: f32,
    /// Largest blob half-width
    pub blob_max_radius: u32,
    /// Largest heading change per vein step (radians)
    pub vein_max_turn: f32,
    /// Blend factor toward the new heading per step (0 = never turn)
    pub vein_smoothing: f32,
}

impl Default for OreParams {
    fn default() -> Self {
        Self {
            vein_seed_offset: 9000,
            ores: default_ore_configs(),
            blob_count: 3,
            vein_count: 4,
            cluster_chance: 0.5,
            blob_max_radius: 3,
            vein_max_turn: 0.6,
            vein_smoothing: 0.35,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn ore(
    name: &str,
    block: &str,
    seed_offset: i32,
    depth: (f32, f32),
    threshold: f32,
    vein_threshold: f32,
    depth_curve: DepthCurve,
    rarity: f32,
) -> OreConfig {
    OreConfig {
        name: name.to_string(),
        block: block.to_string(),
        min_depth_ratio: depth.0,
        max_depth_ratio: depth.1,
        noise: NoiseLayerConfig::new(seed_offset, 0.08, 2),
        vein_frequency: 0.03,
        threshold,
        vein_threshold,
        cluster_size: 3,
        vein_length: 14,
        depth_bonus: 0.12,
        depth_curve,
        rarity,
    }
}

fn default_ore_configs() -> Vec<OreConfig> {
    vec![
        ore("Coal", "coal_ore", 8000, (0.55, 0.83), 0.50, -0.1, DepthCurve::MidPeak, 1.1),
        ore("Copper", "copper_ore", 8100, (0.57, 0.85), 0.55, 0.0, DepthCurve::BroadMidPeak, 1.0),
        ore("Iron", "iron_ore", 8200, (0.60, 0.93), 0.55, 0.0, DepthCurve::Shallow, 1.0),
        ore("Gold", "gold_ore", 8300, (0.75, 0.98), 0.62, 0.05, DepthCurve::Deep, 0.9),
        ore("Diamond", "diamond_ore", 8400, (0.85, 0.985), 0.66, 0.1, DepthCurve::VeryDeep, 0.85),
    ]
}

/// Vegetation placement parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationParams {
    pub tree_noise: NoiseLayerConfig,
    pub grass_noise: NoiseLayerConfig,
    pub flower_noise: NoiseLayerConfig,
    pub shrub_noise: NoiseLayerConfig,
    pub mushroom_noise: NoiseLayerConfig,
    pub cactus_noise: NoiseLayerConfig,
    pub base_tree_chance: f32,
    pub base_grass_chance: f32,
    pub base_flower_chance: f32,
    pub base_shrub_chance: f32,
    pub base_mushroom_chance: f32,
    /// Minimum columns between trunks in one chunk
    pub min_tree_spacing: u32,
    /// Minimum columns between cacti
    pub cactus_spacing: u32,
    /// Cactus noise must exceed this
    pub cactus_threshold: f32,
    /// Rows above a mushroom searched for leaf shade
    pub mushroom_shade_height: u32,
    /// Columns to either side searched for leaf shade
    pub mushroom_shade_radius: u32,
    /// Chance a swamp canopy leaf grows a vine
    pub vine_chance: f32,
    pub max_vine_length: u32,
}

impl Default for VegetationParams {
    fn default() -> Self {
        Self {
            tree_noise: NoiseLayerConfig::new(11000, 0.08, 2),
            grass_noise: NoiseLayerConfig::new(12000, 0.15, 1),
            flower_noise: NoiseLayerConfig::new(13000, 0.12, 1),
            shrub_noise: NoiseLayerConfig::new(14000, 0.1, 1),
            mushroom_noise: NoiseLayerConfig::new(15000, 0.1, 1),
            cactus_noise: NoiseLayerConfig::new(16000, 0.2, 1),
            base_tree_chance: 0.3,
            base_grass_chance: 0.7,
            base_flower_chance: 0.25,
            base_shrub_chance: 0.15,
            base_mushroom_chance: 0.5,
            min_tree_spacing: 5,
            cactus_spacing: 3,
            cactus_threshold: 0.1,
            mushroom_shade_height: 6,
            mushroom_shade_radius: 2,
            vine_chance: 0.4,
            max_vine_length: 4,
        }
    }
}

/// Cross-chunk height reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    pub enabled: bool,
    /// Edge height differences at or below this are left alone
    pub threshold: i32,
    /// Columns affected from the edge inward
    pub radius: u32,
    /// Blend weight at the edge column, in [0, 1]
    pub strength: f32,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 3,
            radius: 8,
            strength: 0.9,
        }
    }
}

/// Complete generation parameter set
///
/// All parameters needed to generate a world. Serializable to RON for presets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Format version, checked on load
    pub version: u32,
    /// Display name for this parameter set
    pub name: String,
    pub biomes: BiomeParams,
    pub terrain: TerrainParams,
    pub caves: CaveParams,
    pub ores: OreParams,
    pub vegetation: VegetationParams,
    pub smoothing: SmoothingParams,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            version: PARAMS_VERSION,
            name: "Default".to_string(),
            biomes: BiomeParams::default(),
            terrain: TerrainParams::default(),
            caves: CaveParams::default(),
            ores: OreParams::default(),
            vegetation: VegetationParams::default(),
            smoothing: SmoothingParams::default(),
        }
    }
}

impl GenerationParams {
    /// Parse a RON parameter file body
    pub fn from_ron(source: &str) -> Result<Self, WorldGenError> {
        let params: Self = ron::from_str(source)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_ron(&self) -> Result<String, WorldGenError> {
        let pretty = ron::ser::PrettyConfig::new().depth_limit(4);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load and validate a RON parameter file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorldGenError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        log::info!("[PARAMS] Loading generation params from {}", path.as_ref().display());
        Self::from_ron(&source)
    }

    /// Reject parameter sets the pipeline cannot run with
    ///
    /// Degenerate but well-formed values (empty bands, zero counts) pass and
    /// turn the affected stage into a no-op.
    pub fn validate(&self) -> Result<(), WorldGenError> {
        if self.version > PARAMS_VERSION {
            return Err(WorldGenError::InvalidParams(format!(
                "params version {} is newer than supported version {}",
                self.version, PARAMS_VERSION
            )));
        }

        BiomeRegistry::from_definitions(&self.biomes.definitions)?;

        if !(0.0..=1.0).contains(&self.terrain.sea_level_ratio) {
            return Err(WorldGenError::InvalidParams(format!(
                "terrain.sea_level_ratio {} outside [0, 1]",
                self.terrain.sea_level_ratio
            )));
        }

        let caves = &self.caves;
        if !(0.0..=1.0).contains(&caves.coverage_target) || caves.coverage_tolerance < 0.0 {
            return Err(WorldGenError::InvalidParams(format!(
                "cave coverage target {} / tolerance {} out of range",
                caves.coverage_target, caves.coverage_tolerance
            )));
        }
        check_ratio("caves.min_depth_ratio", caves.min_depth_ratio)?;
        check_ratio("caves.max_depth_ratio", caves.max_depth_ratio)?;

        for ore in &self.ores.ores {
            check_ratio(&format!("ore {} min_depth_ratio", ore.name), ore.min_depth_ratio)?;
            check_ratio(&format!("ore {} max_depth_ratio", ore.name), ore.max_depth_ratio)?;
            if ore.rarity <= 0.0 || !ore.rarity.is_finite() {
                return Err(WorldGenError::InvalidParams(format!(
                    "ore {} rarity must be positive, got {}",
                    ore.name, ore.rarity
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.smoothing.strength) {
            return Err(WorldGenError::InvalidParams(format!(
                "smoothing.strength {} outside [0, 1]",
                self.smoothing.strength
            )));
        }

        Ok(())
    }

    /// Look up a named preset
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "cave_heavy" => Some(Self::preset_cave_heavy()),
            "flat" => Some(Self::preset_flat()),
            "mountainous" => Some(Self::preset_mountainous()),
            "lush" => Some(Self::preset_lush()),
            _ => None,
        }
    }

    /// Create a preset with more caves
    pub fn preset_cave_heavy() -> Self {
        Self {
            name: "Cave Heavy".to_string(),
            caves: CaveParams {
                min_depth_ratio: 0.5,
                coverage_target: 0.22,
                coverage_tolerance: 0.04,
                tunnel_threshold: 0.35,
                chamber_threshold: 0.45,
                ..CaveParams::default()
            },
            ..Self::default()
        }
    }

    /// Create a preset with flat terrain (good for building)
    pub fn preset_flat() -> Self {
        let mut definitions = default_biome_definitions();
        for biome in &mut definitions {
            biome.height_weights = biome.height_weights.scaled(0.15);
        }
        Self {
            name: "Flat".to_string(),
            biomes: BiomeParams {
                definitions,
                ..BiomeParams::default()
            },
            terrain: TerrainParams {
                peak_bonus: 5.0,
                mountain_lift: 2.0,
                dune_amplitude: 1.0,
                plains_hill_amplitude: 1.0,
                ..TerrainParams::default()
            },
            ..Self::default()
        }
    }

    /// Create a preset with mountain-dominated world
    pub fn preset_mountainous() -> Self {
        Self {
            name: "Mountainous".to_string(),
            biomes: BiomeParams {
                thresholds: BiomeThresholds {
                    mountain_elevation: 0.05,
                    ..BiomeThresholds::default()
                },
                ..BiomeParams::default()
            },
            terrain: TerrainParams {
                peak_bonus: 70.0,
                peak_threshold: 0.2,
                ..TerrainParams::default()
            },
            ..Self::default()
        }
    }

    /// Create a preset with dense vegetation and wetter biomes
    pub fn preset_lush() -> Self {
        let mut definitions = default_biome_definitions();
        for biome in &mut definitions {
            biome.tree_rate = (biome.tree_rate * 1.6).min(1.0);
            biome.grass_rate = (biome.grass_rate * 1.3).min(1.0);
            biome.flower_rate = (biome.flower_rate * 1.5).min(1.0);
        }
        Self {
            name: "Lush".to_string(),
            biomes: BiomeParams {
                thresholds: BiomeThresholds {
                    forest_humidity: -0.05,
                    desert_humidity: -0.4,
                    ..BiomeThresholds::default()
                },
                definitions,
                ..BiomeParams::default()
            },
            vegetation: VegetationParams {
                min_tree_spacing: 4,
                ..VegetationParams::default()
            },
            ..Self::default()
        }
    }

    /// Definition for one biome, if present
    pub fn biome(&self, biome_type: BiomeType) -> Option<&super::biome::BiomeDefinition> {
        self.biomes
            .definitions
            .iter()
            .find(|def| def.biome_type == biome_type)
    }
}

fn check_ratio(field: &str, value: f32) -> Result<(), WorldGenError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(WorldGenError::InvalidParams(format!(
            "{field} {value} outside [0, 1]"
        )))
    }
}
