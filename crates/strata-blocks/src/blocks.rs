//! Block definitions and registry

use ahash::AHashMap;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Built-in block IDs
pub struct BlockId;

impl BlockId {
    // Terrain (0-12)
    pub const AIR: u16 = 0;
    pub const STONE: u16 = 1;
    pub const DIRT: u16 = 2;
    pub const GRASS: u16 = 3;
    pub const SAND: u16 = 4;
    pub const WATER: u16 = 5;
    pub const BEDROCK: u16 = 6;
    pub const DEEPSLATE: u16 = 7;
    pub const GRAVEL: u16 = 8;
    pub const CLAY: u16 = 9;
    pub const SANDSTONE: u16 = 10;
    pub const SNOW: u16 = 11;
    pub const ICE: u16 = 12;

    // Ores (13-17)
    pub const COAL_ORE: u16 = 13;
    pub const COPPER_ORE: u16 = 14;
    pub const IRON_ORE: u16 = 15;
    pub const GOLD_ORE: u16 = 16;
    pub const DIAMOND_ORE: u16 = 17;

    // Trees (18-23)
    pub const OAK_LOG: u16 = 18;
    pub const BIRCH_LOG: u16 = 19;
    pub const SPRUCE_LOG: u16 = 20;
    pub const OAK_LEAVES: u16 = 21;
    pub const BIRCH_LEAVES: u16 = 22;
    pub const SPRUCE_LEAVES: u16 = 23;

    // Ground cover (24-30)
    pub const TALL_GRASS: u16 = 24;
    pub const RED_FLOWER: u16 = 25;
    pub const YELLOW_FLOWER: u16 = 26;
    pub const SHRUB: u16 = 27;
    pub const MUSHROOM: u16 = 28;
    pub const CACTUS: u16 = 29;
    pub const VINE: u16 = 30;
}

/// Broad physical category of a block
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Empty space
    Air,
    /// Rock, soil and minerals
    Terrain,
    /// Water and other fluids
    Liquid,
    /// Mineable ore embedded in rock
    Ore,
    /// Trunks and leaves
    Tree,
    /// Small surface plants
    Plant,
}

bitflags! {
    /// Static block attributes
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BlockFlags: u16 {
        /// Collides with entities
        const SOLID = 1 << 0;
        /// Light passes through
        const TRANSPARENT = 1 << 1;
        /// Plants and trees may grow on top
        const SUPPORTS_VEGETATION = 1 << 2;
        /// Cave carving may replace it with air
        const CARVABLE = 1 << 3;
        /// Casts shade for undergrowth (mushrooms)
        const FOLIAGE = 1 << 4;
    }
}

/// Definition of a block's static properties
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockDef {
    pub id: u16,
    pub name: String,
    pub kind: BlockKind,
    pub flags: BlockFlags,

    /// Mining resistance (None = unbreakable)
    pub hardness: Option<u8>,
    /// Block dropped when broken (None = drops nothing)
    pub drops: Option<u16>,

    /// Character used by text previews
    pub glyph: char,
    /// Base color (RGBA)
    pub color: [u8; 4],
}

impl Default for BlockDef {
    fn default() -> Self {
        Self {
            id: 0,
            name: "unknown".to_string(),
            kind: BlockKind::Terrain,
            flags: BlockFlags::SOLID,
            hardness: Some(1),
            drops: None,
            glyph: '?',
            color: [255, 0, 255, 255], // Magenta for missing blocks
        }
    }
}

impl BlockDef {
    pub fn is_solid(&self) -> bool {
        self.flags.contains(BlockFlags::SOLID)
    }

    pub fn is_transparent(&self) -> bool {
        self.flags.contains(BlockFlags::TRANSPARENT)
    }

    pub fn supports_vegetation(&self) -> bool {
        self.flags.contains(BlockFlags::SUPPORTS_VEGETATION)
    }

    pub fn is_carvable(&self) -> bool {
        self.flags.contains(BlockFlags::CARVABLE)
    }

    pub fn is_foliage(&self) -> bool {
        self.flags.contains(BlockFlags::FOLIAGE)
    }
}

/// Errors raised while building a registry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("block id {0} is already registered")]
    DuplicateId(u16),

    #[error("duplicate block name: {0}")]
    DuplicateName(String),
}

/// Registry of all blocks
///
/// Built once, then shared read-only by every generation stage.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    blocks: Vec<Option<BlockDef>>,
    by_name: AHashMap<String, u16>,
}

impl BlockRegistry {
    /// Registry with every built-in block
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_defaults();
        registry
    }

    /// Registry without any blocks, for custom block sets
    pub fn empty() -> Self {
        Self {
            blocks: Vec::new(),
            by_name: AHashMap::new(),
        }
    }

    /// Add a block definition
    pub fn register(&mut self, block: BlockDef) -> Result<(), RegistryError> {
        let id = block.id as usize;
        if self.blocks.get(id).is_some_and(Option::is_some) {
            return Err(RegistryError::DuplicateId(block.id));
        }
        if self.by_name.contains_key(&block.name) {
            return Err(RegistryError::DuplicateName(block.name));
        }

        if self.blocks.len() <= id {
            self.blocks.resize(id + 1, None);
        }

        log::trace!("Registered block {} ({})", block.name, block.id);
        self.by_name.insert(block.name.clone(), block.id);
        self.blocks[id] = Some(block);
        Ok(())
    }

    /// Get block definition by ID
    pub fn get(&self, id: u16) -> Option<&BlockDef> {
        self.blocks.get(id as usize).and_then(Option::as_ref)
    }

    /// Get block definition by name
    pub fn get_by_name(&self, name: &str) -> Option<&BlockDef> {
        self.id_by_name(name).and_then(|id| self.get(id))
    }

    /// Resolve a block name to its ID
    pub fn id_by_name(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    /// Whether an ID has a definition
    pub fn contains(&self, id: u16) -> bool {
        self.get(id).is_some()
    }

    pub fn is_solid(&self, id: u16) -> bool {
        self.get(id).is_some_and(BlockDef::is_solid)
    }

    pub fn supports_vegetation(&self, id: u16) -> bool {
        self.get(id).is_some_and(BlockDef::supports_vegetation)
    }

    pub fn is_carvable(&self, id: u16) -> bool {
        self.get(id).is_some_and(BlockDef::is_carvable)
    }

    pub fn is_foliage(&self, id: u16) -> bool {
        self.get(id).is_some_and(BlockDef::is_foliage)
    }

    /// Text preview glyph ('?' for unregistered IDs)
    pub fn glyph(&self, id: u16) -> char {
        self.get(id).map_or('?', |b| b.glyph)
    }

    /// Number of registered blocks
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterate over registered definitions in ID order
    pub fn iter(&self) -> impl Iterator<Item = &BlockDef> {
        self.blocks.iter().filter_map(Option::as_ref)
    }

    fn register_defaults(&mut self) {
        use BlockFlags as F;

        let terrain = F::SOLID | F::CARVABLE;
        let defaults = [
            // Air (empty space)
            BlockDef {
                id: BlockId::AIR,
                name: "air".to_string(),
                kind: BlockKind::Air,
                flags: F::TRANSPARENT,
                hardness: None,
                glyph: ' ',
                color: [0, 0, 0, 0],
                ..Default::default()
            },
            BlockDef {
                id: BlockId::STONE,
                name: "stone".to_string(),
                flags: terrain | F::SUPPORTS_VEGETATION,
                hardness: Some(5),
                drops: Some(BlockId::GRAVEL),
                glyph: '#',
                color: [128, 128, 128, 255],
                ..Default::default()
            },
            BlockDef {
                id: BlockId::DIRT,
                name: "dirt".to_string(),
                flags: terrain | F::SUPPORTS_VEGETATION,
                hardness: Some(1),
                drops: Some(BlockId::DIRT),
                glyph: '%',
                color: [134, 96, 67, 255],
                ..Default::default()
            },
            BlockDef {
                id: BlockId::GRASS,
                name: "grass".to_string(),
                flags: terrain | F::SUPPORTS_VEGETATION,
                hardness: Some(1),
                drops: Some(BlockId::DIRT),
                glyph: '"',
                color: [95, 159, 53, 255],
                ..Default::default()
            },
            BlockDef {
                id: BlockId::SAND,
                name: "sand".to_string(),
                flags: terrain | F::SUPPORTS_VEGETATION,
                hardness: Some(1),
                drops: Some(BlockId::SAND),
                glyph: ':',
                color: [194, 178, 128, 255],
                ..Default::default()
            },
            BlockDef {
                id: BlockId::WATER,
                name: "water".to_string(),
                kind: BlockKind::Liquid,
                flags: F::TRANSPARENT,
                hardness: None,
                glyph: '~',
                color: [64, 164, 223, 200],
                ..Default::default()
            },
            // Bedrock - indestructible floor, never carved
            BlockDef {
                id: BlockId::BEDROCK,
                name: "bedrock".to_string(),
                flags: F::SOLID,
                hardness: None,
                glyph: '=',
                color: [40, 40, 40, 255],
                ..Default::default()
            },
            BlockDef {
                id: BlockId::DEEPSLATE,
                name: "deepslate".to_string(),
                flags: terrain,
                hardness: Some(7),
                drops: Some(BlockId::DEEPSLATE),
                glyph: '&',
                color: [77, 77, 84, 255],
                ..Default::default()
            },
            BlockDef {
                id: BlockId::GRAVEL,
                name: "gravel".to_string(),
                flags: terrain | F::SUPPORTS_VEGETATION,
                hardness: Some(1),
                drops: Some(BlockId::GRAVEL),
                glyph: ',',
                color: [136, 126, 126, 255],
                ..Default::default()
            },
            BlockDef {
                id: BlockId::CLAY,
                name: "clay".to_string(),
                flags: terrain | F::SUPPORTS_VEGETATION,
                hardness: Some(1),
                drops: Some(BlockId::CLAY),
                glyph: 'c',
                color: [160, 166, 179, 255],
                ..Default::default()
            },
            BlockDef {
                id: BlockId::SANDSTONE,
                name: "sandstone".to_string(),
                flags: terrain,
                hardness: Some(3),
                drops: Some(BlockId::SANDSTONE),
                glyph: 's',
                color: [216, 203, 155, 255],
                ..Default::default()
            },
            BlockDef {
                id: BlockId::SNOW,
                name: "snow".to_string(),
                flags: terrain | F::SUPPORTS_VEGETATION,
                hardness: Some(1),
                drops: Some(BlockId::SNOW),
                glyph: '*',
                color: [240, 251, 251, 255],
                ..Default::default()
            },
            BlockDef {
                id: BlockId::ICE,
                name: "ice".to_string(),
                flags: F::SOLID | F::TRANSPARENT,
                hardness: Some(2),
                drops: None,
                glyph: '_',
                color: [200, 230, 255, 200],
                ..Default::default()
            },
        ];

        let ores = [
            (BlockId::COAL_ORE, "coal_ore", 'C', [45, 45, 45, 255], 4),
            (BlockId::COPPER_ORE, "copper_ore", 'U', [184, 115, 51, 255], 5),
            (BlockId::IRON_ORE, "iron_ore", 'I', [216, 175, 147, 255], 6),
            (BlockId::GOLD_ORE, "gold_ore", 'G', [252, 238, 75, 255], 6),
            (BlockId::DIAMOND_ORE, "diamond_ore", 'D', [92, 219, 213, 255], 9),
        ];

        let logs = [
            (BlockId::OAK_LOG, "oak_log", [102, 81, 51, 255]),
            (BlockId::BIRCH_LOG, "birch_log", [216, 215, 210, 255]),
            (BlockId::SPRUCE_LOG, "spruce_log", [58, 37, 16, 255]),
        ];

        let leaves = [
            (BlockId::OAK_LEAVES, "oak_leaves", [60, 135, 40, 220]),
            (BlockId::BIRCH_LEAVES, "birch_leaves", [128, 167, 85, 220]),
            (BlockId::SPRUCE_LEAVES, "spruce_leaves", [52, 89, 52, 220]),
        ];

        let plants = [
            (BlockId::TALL_GRASS, "tall_grass", '\'', [120, 180, 70, 255]),
            (BlockId::RED_FLOWER, "red_flower", 'r', [200, 30, 30, 255]),
            (BlockId::YELLOW_FLOWER, "yellow_flower", 'y', [240, 220, 40, 255]),
            (BlockId::SHRUB, "shrub", 'b', [80, 120, 40, 255]),
            (BlockId::MUSHROOM, "mushroom", 'm', [190, 90, 70, 255]),
            (BlockId::VINE, "vine", '(', [50, 110, 30, 255]),
        ];

        let mut all: Vec<BlockDef> = defaults.into_iter().collect();

        all.extend(ores.into_iter().map(|(id, name, glyph, color, hardness)| BlockDef {
            id,
            name: name.to_string(),
            kind: BlockKind::Ore,
            flags: F::SOLID | F::CARVABLE,
            hardness: Some(hardness),
            drops: Some(id),
            glyph,
            color,
        }));

        all.extend(logs.into_iter().map(|(id, name, color)| BlockDef {
            id,
            name: name.to_string(),
            kind: BlockKind::Tree,
            flags: F::SOLID,
            hardness: Some(2),
            drops: Some(id),
            glyph: '|',
            color,
        }));

        all.extend(leaves.into_iter().map(|(id, name, color)| BlockDef {
            id,
            name: name.to_string(),
            kind: BlockKind::Tree,
            flags: F::TRANSPARENT | F::FOLIAGE,
            hardness: Some(1),
            drops: None,
            glyph: '@',
            color,
        }));

        all.extend(plants.into_iter().map(|(id, name, glyph, color)| BlockDef {
            id,
            name: name.to_string(),
            kind: BlockKind::Plant,
            flags: F::TRANSPARENT,
            hardness: Some(0),
            drops: Some(id),
            glyph,
            color,
        }));

        // Cactus is the one solid plant
        all.push(BlockDef {
            id: BlockId::CACTUS,
            name: "cactus".to_string(),
            kind: BlockKind::Plant,
            flags: F::SOLID,
            hardness: Some(1),
            drops: Some(BlockId::CACTUS),
            glyph: 'T',
            color: [80, 140, 50, 255],
        });

        for block in all {
            if let Err(e) = self.register(block) {
                log::error!("Built-in block table is inconsistent: {}", e);
            }
        }
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_builtin_id() {
        let registry = BlockRegistry::new();
        for id in BlockId::AIR..=BlockId::VINE {
            assert!(registry.contains(id), "Block {} not registered", id);
        }
        assert_eq!(registry.len(), (BlockId::VINE + 1) as usize);
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = BlockRegistry::new();
        assert_eq!(registry.id_by_name("diamond_ore"), Some(BlockId::DIAMOND_ORE));
        assert_eq!(registry.get_by_name("grass").map(|b| b.id), Some(BlockId::GRASS));
        assert_eq!(registry.id_by_name("obsidian"), None);
    }

    #[test]
    fn test_attributes() {
        let registry = BlockRegistry::new();
        assert!(registry.is_solid(BlockId::STONE));
        assert!(!registry.is_solid(BlockId::AIR));
        assert!(!registry.is_solid(BlockId::WATER));
        assert!(registry.is_carvable(BlockId::COAL_ORE));
        assert!(!registry.is_carvable(BlockId::BEDROCK));
        assert!(registry.supports_vegetation(BlockId::GRASS));
        assert!(!registry.supports_vegetation(BlockId::WATER));
        assert!(registry.is_foliage(BlockId::SPRUCE_LEAVES));
        assert_eq!(registry.get(BlockId::BEDROCK).unwrap().hardness, None);
        assert_eq!(registry.get(BlockId::GRASS).unwrap().drops, Some(BlockId::DIRT));
    }

    #[test]
    fn test_unknown_id() {
        let registry = BlockRegistry::new();
        assert!(registry.get(999).is_none());
        assert!(!registry.is_solid(999));
        assert_eq!(registry.glyph(999), '?');
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = BlockRegistry::empty();
        let stone = BlockDef {
            id: 1,
            name: "stone".to_string(),
            ..Default::default()
        };
        assert!(registry.register(stone.clone()).is_ok());
        assert_eq!(
            registry.register(stone.clone()),
            Err(RegistryError::DuplicateId(1))
        );
        assert_eq!(
            registry.register(BlockDef { id: 2, ..stone }),
            Err(RegistryError::DuplicateName("stone".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }
}
