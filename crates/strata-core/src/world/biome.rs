//! Biome system - climate noise classification and per-biome parameters

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strata_blocks::BlockId;

use super::noise::NoiseLayer;
use super::vegetation::TreeSpecies;
use super::worldgen_config::{BiomeParams, BiomeThresholds};
use crate::error::WorldGenError;

/// Types of biomes in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiomeType {
    Ocean,
    Plains,
    Forest,
    Desert,
    Mountains,
    Swamp,
    Tundra,
}

impl BiomeType {
    pub const ALL: [BiomeType; 7] = [
        BiomeType::Ocean,
        BiomeType::Plains,
        BiomeType::Forest,
        BiomeType::Desert,
        BiomeType::Mountains,
        BiomeType::Swamp,
        BiomeType::Tundra,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            BiomeType::Ocean => "ocean",
            BiomeType::Plains => "plains",
            BiomeType::Forest => "forest",
            BiomeType::Desert => "desert",
            BiomeType::Mountains => "mountains",
            BiomeType::Swamp => "swamp",
            BiomeType::Tundra => "tundra",
        }
    }
}

/// Per-band multipliers applied to the height field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightWeights {
    pub continental: f32,
    pub regional: f32,
    pub local: f32,
    pub roughness: f32,
}

impl HeightWeights {
    pub const fn new(continental: f32, regional: f32, local: f32, roughness: f32) -> Self {
        Self {
            continental,
            regional,
            local,
            roughness,
        }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(
            self.continental * factor,
            self.regional * factor,
            self.local * factor,
            self.roughness * factor,
        )
    }
}

/// Weighted entry of a biome's tree table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeWeight {
    pub species: TreeSpecies,
    pub weight: f32,
}

/// Defines the characteristics of a biome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiomeDefinition {
    pub name: String,
    pub biome_type: BiomeType,

    // Climate centre, for diagnostics
    pub temperature: f32,
    pub humidity: f32,
    pub elevation: f32,

    // Surface generation
    pub surface_block: u16,
    pub subsurface_block: u16,
    /// Rows of subsurface below the surface block
    pub subsurface_depth: i32,

    // Terrain shape
    pub height_weights: HeightWeights,

    // Vegetation rates, 0.0-1.0
    pub tree_rate: f32,
    pub grass_rate: f32,
    pub flower_rate: f32,
    pub trees: Vec<TreeWeight>,

    /// Ore abundance multipliers by block id (1.0 = normal)
    pub ore_multipliers: HashMap<u16, f32>,
}

impl BiomeDefinition {
    #[allow(clippy::too_many_arguments)]
    fn base(
        biome_type: BiomeType,
        climate: (f32, f32, f32),
        surface_block: u16,
        subsurface_block: u16,
        subsurface_depth: i32,
        height_weights: HeightWeights,
        rates: (f32, f32, f32),
        trees: &[(TreeSpecies, f32)],
    ) -> Self {
        Self {
            name: biome_type.name().to_string(),
            biome_type,
            temperature: climate.0,
            humidity: climate.1,
            elevation: climate.2,
            surface_block,
            subsurface_block,
            subsurface_depth,
            height_weights,
            tree_rate: rates.0,
            grass_rate: rates.1,
            flower_rate: rates.2,
            trees: trees
                .iter()
                .map(|&(species, weight)| TreeWeight { species, weight })
                .collect(),
            ore_multipliers: HashMap::new(),
        }
    }

    fn with_ore(mut self, block: u16, multiplier: f32) -> Self {
        self.ore_multipliers.insert(block, multiplier);
        self
    }

    pub fn ocean() -> Self {
        Self::base(
            BiomeType::Ocean,
            (0.0, 0.0, -0.6),
            BlockId::SAND,
            BlockId::SAND,
            5,
            HeightWeights::new(0.8, 0.5, 0.4, 0.3),
            (0.0, 0.0, 0.0),
            &[],
        )
    }

    pub fn plains() -> Self {
        Self::base(
            BiomeType::Plains,
            (0.0, 0.0, 0.0),
            BlockId::GRASS,
            BlockId::DIRT,
            4,
            HeightWeights::new(0.5, 0.6, 0.9, 0.5),
            (0.12, 0.8, 0.5),
            &[(TreeSpecies::Oak, 1.0)],
        )
        .with_ore(BlockId::COAL_ORE, 1.2) // Slightly more coal
    }

    pub fn forest() -> Self {
        Self::base(
            BiomeType::Forest,
            (0.0, 0.4, 0.1),
            BlockId::GRASS,
            BlockId::DIRT,
            5,
            HeightWeights::new(0.7, 0.8, 1.0, 0.7),
            (0.9, 0.6, 0.3),
            &[(TreeSpecies::Oak, 0.6), (TreeSpecies::Birch, 0.4)],
        )
    }

    pub fn desert() -> Self {
        Self::base(
            BiomeType::Desert,
            (0.6, -0.5, 0.0),
            BlockId::SAND,
            BlockId::SANDSTONE,
            6,
            HeightWeights::new(0.5, 0.5, 0.8, 0.4),
            (0.0, 0.1, 0.0),
            &[],
        )
        .with_ore(BlockId::GOLD_ORE, 1.5) // More gold in deserts
        .with_ore(BlockId::COAL_ORE, 0.5)
    }

    pub fn mountains() -> Self {
        Self::base(
            BiomeType::Mountains,
            (0.0, 0.0, 0.6),
            BlockId::STONE,
            BlockId::STONE,
            3,
            HeightWeights::new(1.2, 1.4, 1.3, 1.2),
            (0.1, 0.2, 0.1),
            &[(TreeSpecies::Spruce, 1.0)],
        )
        .with_ore(BlockId::IRON_ORE, 1.5)
        .with_ore(BlockId::COPPER_ORE, 1.3)
        .with_ore(BlockId::DIAMOND_ORE, 1.2)
    }

    pub fn swamp() -> Self {
        Self::base(
            BiomeType::Swamp,
            (0.2, 0.6, -0.2),
            BlockId::GRASS,
            BlockId::CLAY,
            4,
            HeightWeights::new(0.3, 0.3, 0.5, 0.3),
            (0.5, 0.9, 0.1),
            &[(TreeSpecies::SwampOak, 1.0)],
        )
        .with_ore(BlockId::COPPER_ORE, 0.8)
    }

    pub fn tundra() -> Self {
        Self::base(
            BiomeType::Tundra,
            (-0.6, 0.0, 0.0),
            BlockId::SNOW,
            BlockId::DIRT,
            4,
            HeightWeights::new(0.7, 0.8, 0.9, 0.6),
            (0.35, 0.2, 0.05),
            &[(TreeSpecies::Spruce, 1.0)],
        )
        .with_ore(BlockId::IRON_ORE, 1.2)
    }

    /// Get ore multiplier for a specific ore block (1.0 if not specified)
    pub fn ore_multiplier(&self, ore_block: u16) -> f32 {
        *self.ore_multipliers.get(&ore_block).unwrap_or(&1.0)
    }

    /// Euclidean distance between a climate sample and this biome's centre
    pub fn climate_distance(&self, sample: &ClimateSample) -> f32 {
        let dt = sample.temperature - self.temperature;
        let dh = sample.humidity - self.humidity;
        let de = sample.elevation - self.elevation;
        (dt * dt + dh * dh + de * de).sqrt()
    }
}

/// Built-in definitions for every biome type
pub fn default_biome_definitions() -> Vec<BiomeDefinition> {
    vec![
        BiomeDefinition::ocean(),
        BiomeDefinition::plains(),
        BiomeDefinition::forest(),
        BiomeDefinition::desert(),
        BiomeDefinition::mountains(),
        BiomeDefinition::swamp(),
        BiomeDefinition::tundra(),
    ]
}

/// Registry of all biome definitions, one per `BiomeType`
#[derive(Debug, Clone)]
pub struct BiomeRegistry {
    definitions: Vec<BiomeDefinition>,
}

impl BiomeRegistry {
    /// Index definitions by type; every type must appear exactly once
    pub fn from_definitions(definitions: &[BiomeDefinition]) -> Result<Self, WorldGenError> {
        let mut ordered = Vec::with_capacity(BiomeType::ALL.len());
        for biome_type in BiomeType::ALL {
            let mut matching = definitions.iter().filter(|def| def.biome_type == biome_type);
            let def = matching.next().ok_or_else(|| {
                WorldGenError::InvalidParams(format!("missing definition for biome {biome_type:?}"))
            })?;
            if matching.next().is_some() {
                return Err(WorldGenError::InvalidParams(format!(
                    "duplicate definition for biome {biome_type:?}"
                )));
            }
            ordered.push(def.clone());
        }
        Ok(Self {
            definitions: ordered,
        })
    }

    pub fn get(&self, biome_type: BiomeType) -> &BiomeDefinition {
        &self.definitions[biome_type.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &BiomeDefinition> {
        self.definitions.iter()
    }
}

impl Default for BiomeRegistry {
    fn default() -> Self {
        Self {
            definitions: default_biome_definitions(),
        }
    }
}

/// Raw climate values at a column, each in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    pub temperature: f32,
    pub humidity: f32,
    pub elevation: f32,
}

/// Select biome from a climate sample; rules are checked in order
pub fn select_biome(sample: &ClimateSample, thresholds: &BiomeThresholds) -> BiomeType {
    let ClimateSample {
        temperature,
        humidity,
        elevation,
    } = *sample;

    if elevation < thresholds.ocean_elevation {
        return BiomeType::Ocean;
    }
    if temperature < thresholds.tundra_temperature {
        return BiomeType::Tundra;
    }
    if temperature > thresholds.desert_temperature && humidity < thresholds.desert_humidity {
        return BiomeType::Desert;
    }
    if elevation > thresholds.mountain_elevation {
        return BiomeType::Mountains;
    }
    if humidity > thresholds.forest_humidity && elevation >= thresholds.swamp_elevation {
        return BiomeType::Forest;
    }
    if humidity > thresholds.swamp_humidity && elevation < thresholds.swamp_elevation {
        return BiomeType::Swamp;
    }
    BiomeType::Plains
}

/// Maps world columns to biomes from three independent climate fields
pub struct BiomeClassifier {
    temperature: NoiseLayer,
    humidity: NoiseLayer,
    elevation: NoiseLayer,
    thresholds: BiomeThresholds,
}

impl BiomeClassifier {
    pub fn new(seed: u64, params: &BiomeParams) -> Self {
        Self {
            temperature: params.temperature_noise.build(seed),
            humidity: params.humidity_noise.build(seed),
            elevation: params.elevation_noise.build(seed),
            thresholds: params.thresholds.clone(),
        }
    }

    pub fn climate_at(&self, world_x: i32) -> ClimateSample {
        let x = world_x as f32;
        ClimateSample {
            temperature: self.temperature.sample(x, 0.0),
            humidity: self.humidity.sample(x, 0.0),
            elevation: self.elevation.sample(x, 0.0),
        }
    }

    pub fn classify(&self, world_x: i32) -> BiomeType {
        select_biome(&self.climate_at(world_x), &self.thresholds)
    }

    /// Biome of every column in a chunk
    pub fn biome_map(&self, chunk_x: i32, width: usize) -> Vec<BiomeType> {
        let start = chunk_x * width as i32;
        (0..width as i32).map(|i| self.classify(start + i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::worldgen_config::BiomeParams;

    fn sample(temperature: f32, humidity: f32, elevation: f32) -> ClimateSample {
        ClimateSample {
            temperature,
            humidity,
            elevation,
        }
    }

    #[test]
    fn test_biome_rules() {
        let t = BiomeThresholds::default();
        assert_eq!(select_biome(&sample(0.0, 0.0, -0.5), &t), BiomeType::Ocean);
        assert_eq!(select_biome(&sample(-0.5, 0.0, 0.0), &t), BiomeType::Tundra);
        assert_eq!(select_biome(&sample(0.5, -0.5, 0.0), &t), BiomeType::Desert);
        assert_eq!(select_biome(&sample(0.0, 0.0, 0.5), &t), BiomeType::Mountains);
        assert_eq!(select_biome(&sample(0.0, 0.3, 0.0), &t), BiomeType::Forest);
        assert_eq!(select_biome(&sample(0.0, 0.3, -0.2), &t), BiomeType::Swamp);
        assert_eq!(select_biome(&sample(0.0, 0.0, 0.0), &t), BiomeType::Plains);
    }

    #[test]
    fn test_rule_order_first_match_wins() {
        let t = BiomeThresholds::default();
        // Low elevation beats cold
        assert_eq!(select_biome(&sample(-0.9, 0.0, -0.9), &t), BiomeType::Ocean);
        // Hot and dry beats high
        assert_eq!(select_biome(&sample(0.9, -0.9, 0.9), &t), BiomeType::Desert);
        // Humid but low and not humid enough for swamp falls through to plains
        assert_eq!(select_biome(&sample(0.0, 0.2, -0.2), &t), BiomeType::Plains);
    }

    #[test]
    fn test_registry_complete() {
        let registry = BiomeRegistry::from_definitions(&default_biome_definitions()).unwrap();
        for biome_type in BiomeType::ALL {
            assert_eq!(registry.get(biome_type).biome_type, biome_type);
        }
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut defs = default_biome_definitions();
        defs.push(BiomeDefinition::forest());
        assert!(BiomeRegistry::from_definitions(&defs).is_err());
    }

    #[test]
    fn test_ore_multiplier() {
        let desert = BiomeDefinition::desert();
        assert_eq!(desert.ore_multiplier(BlockId::GOLD_ORE), 1.5);
        assert_eq!(desert.ore_multiplier(BlockId::IRON_ORE), 1.0);
    }

    #[test]
    fn test_climate_distance() {
        let tundra = BiomeDefinition::tundra();
        let near = sample(-0.6, 0.0, 0.0);
        let far = sample(0.8, 0.5, 0.5);
        assert_eq!(tundra.climate_distance(&near), 0.0);
        assert!(tundra.climate_distance(&far) > 1.0);
    }

    #[test]
    fn test_classifier_deterministic() {
        let params = BiomeParams::default();
        let a = BiomeClassifier::new(42, &params);
        let b = BiomeClassifier::new(42, &params);
        assert_eq!(a.biome_map(0, 64), b.biome_map(0, 64));
        assert_eq!(a.biome_map(-3, 64).len(), 64);
    }

    #[test]
    fn test_biome_map_matches_classify() {
        let classifier = BiomeClassifier::new(7, &BiomeParams::default());
        let map = classifier.biome_map(2, 16);
        for (i, biome) in map.iter().enumerate() {
            assert_eq!(*biome, classifier.classify(32 + i as i32));
        }
    }

    #[test]
    fn test_world_produces_several_biomes() {
        let classifier = BiomeClassifier::new(42, &BiomeParams::default());
        let mut seen = std::collections::HashSet::new();
        for x in (-200_000..200_000).step_by(250) {
            seen.insert(classifier.classify(x));
        }
        assert!(seen.len() >= 4, "only saw {:?}", seen);
    }
}
