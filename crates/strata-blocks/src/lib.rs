//! Block data for Strata
//!
//! This crate provides the foundational block types used by world generation:
//! - Block identifiers (BlockId)
//! - Static block definitions (BlockDef, BlockKind, BlockFlags)
//! - The immutable lookup table (BlockRegistry)

mod blocks;

pub use blocks::{BlockDef, BlockFlags, BlockId, BlockKind, BlockRegistry, RegistryError};
