//! ASCII rendering of cached chunks

use std::fmt::Write;
use std::ops::Range;
use strata_core::world::{ChunkData, World};

/// Highest surface among the cached chunks in `chunks`
pub fn highest_surface(world: &World, chunks: Range<i32>) -> Option<i32> {
    chunks
        .filter_map(|x| world.chunk(x))
        .filter_map(|chunk| chunk.height_range().map(|(_, hi)| hi))
        .max()
}

/// Render `rows` rows downward from `top_y`, one glyph per block
///
/// Chunks missing from the cache render as blanks.
pub fn render(world: &World, chunks: Range<i32>, top_y: i32, rows: usize) -> String {
    let registry = world.registry();
    let width = world.config().width();
    let loaded: Vec<Option<&ChunkData>> = chunks.clone().map(|x| world.chunk(x)).collect();

    let mut out = String::with_capacity((loaded.len() * width + 8) * rows);
    for row in 0..rows as i32 {
        let y = top_y - row;
        if y < 0 {
            break;
        }
        let _ = write!(out, "{y:>4} ");
        for chunk in &loaded {
            match chunk {
                Some(chunk) if (y as usize) < chunk.height() => {
                    out.extend((0..width).map(|x| registry.glyph(chunk.get(x, y as usize))));
                }
                _ => out.extend(std::iter::repeat(' ').take(width)),
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_blocks::BlockRegistry;

    #[test]
    fn test_render_dimensions() {
        let mut world = World::with_defaults(42).unwrap();
        world.generate_chunk(0);
        let text = render(&world, 0..2, 220, 10);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 10);
        // Row label, then one glyph per column of both chunks
        assert!(lines.iter().all(|l| l.chars().count() == 5 + 128));
        assert!(lines[0].starts_with(" 220 "));
    }

    #[test]
    fn test_render_bottom_row_is_bedrock() {
        let mut world = World::with_defaults(1).unwrap();
        world.generate_chunk(0);
        let text = render(&world, 0..1, 0, 5);
        let bedrock = BlockRegistry::new().glyph(strata_blocks::BlockId::BEDROCK);
        let line = text.lines().next().unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(line[5..].chars().all(|c| c == bedrock));
    }

    #[test]
    fn test_highest_surface() {
        let mut world = World::with_defaults(3).unwrap();
        assert_eq!(highest_surface(&world, 0..1), None);
        let (_, hi) = world.generate_chunk(0).height_range().unwrap();
        assert_eq!(highest_surface(&world, 0..4), Some(hi));
    }
}
