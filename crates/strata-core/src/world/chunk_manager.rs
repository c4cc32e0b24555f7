//! Chunk cache - generated chunks keyed by chunk X with LRU eviction

use lru::LruCache;

use super::chunk::ChunkData;

/// Holds generated chunks, evicting the least recently used past a limit
pub struct ChunkManager {
    chunks: LruCache<i32, ChunkData, ahash::RandomState>,

    /// Maximum number of chunks to keep loaded in memory
    pub loaded_chunk_limit: usize,
}

impl ChunkManager {
    /// Default chunk limit, about 50MB of 400x64 grids
    pub const DEFAULT_LIMIT: usize = 1000;

    pub fn new() -> Self {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }

    pub fn with_limit(loaded_chunk_limit: usize) -> Self {
        Self {
            chunks: LruCache::unbounded_with_hasher(ahash::RandomState::new()),
            loaded_chunk_limit: loaded_chunk_limit.max(1),
        }
    }

    /// Store `chunk` at `x` as the most recently used entry
    ///
    /// Replaces any chunk already at `x`. Otherwise evicts down to make room
    /// first, so the new chunk itself is never evicted.
    pub fn insert(&mut self, x: i32, chunk: ChunkData) -> &ChunkData {
        if self.chunks.pop(&x).is_none() {
            self.evict_to(self.loaded_chunk_limit.saturating_sub(1));
        }
        self.chunks.get_or_insert(x, move || chunk)
    }

    /// Remove and return the chunk at `x`
    pub fn take(&mut self, x: i32) -> Option<ChunkData> {
        self.chunks.pop(&x)
    }

    /// Mutable access, marking the chunk most recently used
    pub fn get_mut(&mut self, x: i32) -> Option<&mut ChunkData> {
        self.chunks.get_mut(&x)
    }

    /// Read without touching recency
    pub fn peek(&self, x: i32) -> Option<&ChunkData> {
        self.chunks.peek(&x)
    }

    pub fn contains(&self, x: i32) -> bool {
        self.chunks.contains(&x)
    }

    /// Evict least recently used chunks until at most `max_size` remain
    ///
    /// Returns the number evicted.
    pub fn clean_cache(&mut self, max_size: usize) -> usize {
        let evicted = self.evict_to(max_size);
        if evicted > 0 {
            log::debug!(
                "[CACHE] Cleaned {} chunks, {} remain",
                evicted,
                self.chunks.len()
            );
        }
        evicted
    }

    /// Change the limit, evicting immediately if over it
    pub fn set_limit(&mut self, limit: usize) {
        self.loaded_chunk_limit = limit.max(1);
        self.evict_to(self.loaded_chunk_limit);
    }

    fn evict_to(&mut self, max_size: usize) -> usize {
        let mut evicted = 0;
        while self.chunks.len() > max_size {
            match self.chunks.pop_lru() {
                Some((x, _)) => {
                    log::trace!("[CACHE] Evicted chunk {}", x);
                    evicted += 1;
                }
                None => break,
            }
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Bytes held by all cached grids
    pub fn memory_bytes(&self) -> usize {
        self.chunks.iter().map(|(_, chunk)| chunk.memory_bytes()).sum()
    }

    /// Cached chunks, most recently used first
    pub fn iter(&self) -> impl Iterator<Item = (i32, &ChunkData)> {
        self.chunks.iter().map(|(&x, chunk)| (x, chunk))
    }
}

impl Default for ChunkManager {
    fn default() -> Self {
        Self::new()
    }
}
