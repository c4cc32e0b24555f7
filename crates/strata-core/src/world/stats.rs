//! Generation statistics

use super::chunk::ChunkData;

/// Sink for generation events
///
/// Lets a host plug its own metrics into `World` without the core crate
/// depending on them.
pub trait GenerationStats: Send {
    /// A chunk finished generating, smoothing included
    fn record_chunk(&mut self, chunk: &ChunkData);

    fn record_cache_hit(&mut self);

    fn record_cache_miss(&mut self);
}

/// A no-op implementation for when stats collection is not needed
#[derive(Default)]
pub struct NoopStats;

impl GenerationStats for NoopStats {
    fn record_chunk(&mut self, _chunk: &ChunkData) {}
    fn record_cache_hit(&mut self) {}
    fn record_cache_miss(&mut self) {}
}

/// Running totals of chunk and per-stage generation time
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    chunks: u64,
    total_ms: f64,
    /// Stage name to (runs, total ms), in first-seen order
    stages: Vec<(&'static str, u64, f64)>,
    index: ahash::HashMap<&'static str, usize>,
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, chunk: &ChunkData) {
        self.chunks += 1;
        self.total_ms += chunk.metadata.generation_time_ms;
        for timing in &chunk.metadata.stage_timings {
            let slot = match self.index.get(timing.stage) {
                Some(&i) => i,
                None => {
                    self.stages.push((timing.stage, 0, 0.0));
                    self.index.insert(timing.stage, self.stages.len() - 1);
                    self.stages.len() - 1
                }
            };
            let entry = &mut self.stages[slot];
            entry.1 += 1;
            entry.2 += timing.elapsed_ms;
        }
    }

    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    pub fn average_ms(&self) -> f64 {
        if self.chunks == 0 {
            0.0
        } else {
            self.total_ms / self.chunks as f64
        }
    }

    /// Mean time per stage, in pipeline order
    pub fn per_stage_average_ms(&self) -> Vec<(String, f64)> {
        self.stages
            .iter()
            .map(|&(name, runs, total)| (name.to_string(), total / runs.max(1) as f64))
            .collect()
    }
}

impl GenerationStats for StageTimings {
    fn record_chunk(&mut self, chunk: &ChunkData) {
        self.record(chunk);
    }

    fn record_cache_hit(&mut self) {}
    fn record_cache_miss(&mut self) {}
}

/// Snapshot returned by `World::stats`
#[derive(Debug, Clone, PartialEq)]
pub struct WorldStats {
    pub loaded_chunk_count: usize,
    pub seed: u64,
    /// Bytes held by cached chunk grids
    pub cache_size: usize,
    pub cache_limit: usize,
    pub chunks_generated: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub average_generation_ms: f64,
    pub per_stage_average_ms: Vec<(String, f64)>,
}

impl WorldStats {
    /// Fraction of chunk lookups served from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::chunk::{StageOutcome, StageTiming};

    fn timed_chunk(total: f64, stages: &[(&'static str, f64)]) -> ChunkData {
        let mut chunk = ChunkData::new(0, 2, 2);
        chunk.metadata.generation_time_ms = total;
        chunk.metadata.stage_timings = stages
            .iter()
            .map(|&(stage, elapsed_ms)| StageTiming {
                stage,
                elapsed_ms,
                outcome: StageOutcome::Completed,
            })
            .collect();
        chunk
    }

    #[test]
    fn test_noop_stats_all_methods() {
        let mut stats = NoopStats;
        let chunk = ChunkData::new(0, 1, 1);
        for _ in 0..10 {
            stats.record_chunk(&chunk);
            stats.record_cache_hit();
            stats.record_cache_miss();
        }
    }

    #[test]
    fn test_stage_timings_average() {
        let mut timings = StageTimings::new();
        assert_eq!(timings.average_ms(), 0.0);
        timings.record(&timed_chunk(10.0, &[("terrain", 2.0), ("caves", 6.0)]));
        timings.record(&timed_chunk(20.0, &[("terrain", 4.0), ("caves", 10.0)]));

        assert_eq!(timings.chunks(), 2);
        assert_eq!(timings.average_ms(), 15.0);
        assert_eq!(
            timings.per_stage_average_ms(),
            vec![("terrain".to_string(), 3.0), ("caves".to_string(), 8.0)]
        );
    }

    #[test]
    fn test_hit_rate() {
        let stats = WorldStats {
            loaded_chunk_count: 1,
            seed: 0,
            cache_size: 0,
            cache_limit: 1,
            chunks_generated: 1,
            cache_hits: 3,
            cache_misses: 1,
            average_generation_ms: 0.0,
            per_stage_average_ms: Vec::new(),
        };
        assert_eq!(stats.hit_rate(), 0.75);
    }

    /// Counting sink to exercise the trait through a trait object
    #[derive(Default)]
    struct CountingStats {
        chunks: u32,
        hits: u32,
        misses: u32,
    }

    impl GenerationStats for CountingStats {
        fn record_chunk(&mut self, _chunk: &ChunkData) {
            self.chunks += 1;
        }
        fn record_cache_hit(&mut self) {
            self.hits += 1;
        }
        fn record_cache_miss(&mut self) {
            self.misses += 1;
        }
    }

    #[test]
    fn test_custom_stats_through_trait_object() {
        let mut counting = CountingStats::default();
        {
            let sink: &mut dyn GenerationStats = &mut counting;
            sink.record_cache_miss();
            sink.record_chunk(&ChunkData::new(0, 1, 1));
            sink.record_cache_hit();
        }
        assert_eq!((counting.chunks, counting.hits, counting.misses), (1, 1, 1));
    }
}
