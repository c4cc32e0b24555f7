mod config;
mod preview;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use strata_blocks::BlockRegistry;
use strata_core::world::worldgen_config::PRESET_NAMES;
use strata_core::world::{BiomeType, ChunkData, GenerationParams, World};

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// World seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// First chunk to generate
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    from: i32,

    /// One past the last chunk to generate
    #[arg(long, default_value = "4", allow_hyphen_values = true)]
    to: i32,

    /// Configuration file (default: ./strata.ron if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Generation parameter file in RON
    #[arg(long)]
    params: Option<PathBuf>,

    /// Parameter preset: default, cave_heavy, flat, mountainous, lush
    #[arg(long)]
    preset: Option<String>,

    /// Print an ASCII preview of the generated chunks
    #[arg(long)]
    preview: bool,

    /// Print cache and timing statistics
    #[arg(long)]
    stats: bool,

    /// Print the effective generation parameters as RON and exit
    #[arg(long)]
    dump_params: bool,

    /// List available presets
    #[arg(long)]
    list_presets: bool,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if args.list_presets {
        for name in PRESET_NAMES {
            println!("{name}");
        }
        return Ok(());
    }

    let app = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let params = resolve_params(&args, &app)?;

    if args.dump_params {
        println!("{}", params.to_ron().context("Failed to serialize params")?);
        return Ok(());
    }

    if args.to <= args.from {
        bail!("empty chunk range {}..{}", args.from, args.to);
    }

    let seed = args.seed.unwrap_or(app.seed);
    let mut world = World::new(seed, app.world, params, Arc::new(BlockRegistry::new()))
        .context("Failed to create world")?;
    world.set_cache_limit(app.cache_limit);

    log::info!(
        "Generating chunks {}..{} with seed {} ({})",
        args.from,
        args.to,
        seed,
        world.params().name
    );
    world.pregenerate(args.from..args.to);

    for x in args.from..args.to {
        match world.chunk(x) {
            Some(chunk) => println!("{}", summarize(chunk)),
            None => log::warn!("Chunk {} was evicted before it could be shown", x),
        }
    }

    if args.preview {
        let top = preview::highest_surface(&world, args.from..args.to)
            .map(|hi| hi + app.preview.headroom)
            .unwrap_or(app.world.world_height - 1)
            .min(app.world.world_height - 1);
        print!(
            "\n{}",
            preview::render(&world, args.from..args.to, top, app.preview.rows)
        );
    }

    if args.stats {
        print_stats(&world);
    }

    Ok(())
}

/// Parameter file beats preset, command line beats config
fn resolve_params(args: &Args, app: &AppConfig) -> Result<GenerationParams> {
    if let Some(path) = args.params.as_ref().or(app.params_file.as_ref()) {
        return GenerationParams::load(path)
            .with_context(|| format!("Failed to load params from {}", path.display()));
    }
    let name = args.preset.as_deref().unwrap_or(&app.preset);
    GenerationParams::preset(name).with_context(|| {
        format!(
            "unknown preset '{}' (available: {})",
            name,
            PRESET_NAMES.join(", ")
        )
    })
}

/// Most common biome in a chunk
fn dominant_biome(chunk: &ChunkData) -> Option<BiomeType> {
    let mut counts = [0usize; BiomeType::ALL.len()];
    for biome in &chunk.biome_map {
        counts[biome.index()] += 1;
    }
    let (index, &count) = counts.iter().enumerate().max_by_key(|&(_, &n)| n)?;
    (count > 0).then(|| BiomeType::ALL[index])
}

fn summarize(chunk: &ChunkData) -> String {
    let (lo, hi) = chunk.height_range().unwrap_or((0, 0));
    let biome = dominant_biome(chunk).map_or("-", BiomeType::name);
    let caves = chunk
        .metadata
        .cave_coverage
        .map_or_else(|| "-".to_string(), |c| format!("{:.1}%", c * 100.0));
    let mut line = format!(
        "chunk {:>5}  {:<9} height {:>3}..{:<3}  caves {:>6}  {:>7.2}ms",
        chunk.x, biome, lo, hi, caves, chunk.metadata.generation_time_ms
    );
    for (stage, error) in chunk.metadata.errors() {
        line.push_str(&format!("  [{stage} failed: {error}]"));
    }
    line
}

fn print_stats(world: &World) {
    let stats = world.stats();
    println!();
    println!("seed                {}", stats.seed);
    println!(
        "chunks loaded       {} / {}",
        stats.loaded_chunk_count, stats.cache_limit
    );
    println!("cache size          {:.1} KiB", stats.cache_size as f64 / 1024.0);
    println!("chunks generated    {}", stats.chunks_generated);
    println!(
        "cache hits/misses   {} / {} ({:.0}% hit rate)",
        stats.cache_hits,
        stats.cache_misses,
        stats.hit_rate() * 100.0
    );
    println!("avg generation      {:.2}ms", stats.average_generation_ms);
    for (stage, ms) in &stats.per_stage_average_ms {
        println!("  {stage:<16}  {ms:.2}ms");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_negative_range() {
        let args = Args::try_parse_from(["strata", "--from", "-3", "--to", "2", "--preview"]).unwrap();
        assert_eq!(args.from, -3);
        assert_eq!(args.to, 2);
        assert!(args.preview);
    }

    #[test]
    fn test_resolve_preset() {
        let args = Args::try_parse_from(["strata", "--preset", "flat"]).unwrap();
        let params = resolve_params(&args, &AppConfig::default()).unwrap();
        assert_eq!(params.name, "Flat");
    }

    #[test]
    fn test_unknown_preset_is_error() {
        let args = Args::try_parse_from(["strata", "--preset", "volcanic"]).unwrap();
        let err = resolve_params(&args, &AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("volcanic"));
    }

    #[test]
    fn test_summarize_mentions_biome() {
        let mut world = World::with_defaults(42).unwrap();
        let chunk = world.generate_chunk(0);
        let biome = dominant_biome(chunk).unwrap();
        let line = summarize(chunk);
        assert!(line.starts_with("chunk     0"));
        assert!(line.contains(biome.name()));
    }
}
