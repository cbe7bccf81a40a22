use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use step_finder::cache::CatalogCache;
use step_finder::catalog::{load_catalog, parse_catalog};
use step_finder::cli::{Cli, Commands, rewrite_args_for_implicit_search};
use step_finder::config::{clean_source_path, resolve_cache, resolve_output_dir};
use step_finder::emit::emit_matches;
use step_finder::progress::LogProgress;
use step_finder::search::{Query, SearchScope, search};
use step_finder::CatalogStats;
use tracing::info;

fn main() -> Result<()> {
    init_tracing();
    let cli = parse_cli();

    match cli.command.clone() {
        Commands::Search {
            field,
            value,
            source,
            all_entries,
        } => {
            let source = clean_source_path(&source);
            let cache = resolve_cache(&cli, &source)?;
            let output_dir = resolve_output_dir(&cli)?;
            let scope = if all_entries {
                SearchScope::All
            } else {
                SearchScope::TopLevel
            };
            let result = run_search(
                &source,
                &cache,
                &output_dir,
                cli.refresh,
                Query::new(&field, &value),
                scope,
            )?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Index { source } => {
            let source = clean_source_path(&source);
            let cache = resolve_cache(&cli, &source)?;
            let catalog = parse_catalog(&source, &mut LogProgress::new())
                .with_context(|| format!("Failed to parse catalog: {}", source.display()))?;
            cache.store(&catalog)?;
            let output = StatsOutput::new(&cache, false, catalog.stats());
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Stats { source } => {
            let source = clean_source_path(&source);
            let cache = resolve_cache(&cli, &source)?;
            let loaded = load_catalog(&source, &cache, cli.refresh, &mut LogProgress::new())
                .with_context(|| format!("Failed to load catalog: {}", source.display()))?;
            let output = StatsOutput::new(&cache, loaded.cache_hit, loaded.catalog.stats());
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Clear { source } => {
            let source = clean_source_path(&source);
            let cache = resolve_cache(&cli, &source)?;
            let removed = cache.clear()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&ClearOutput {
                    snapshot: cache.path().to_string_lossy().to_string(),
                    removed,
                })?
            );
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn parse_cli() -> Cli {
    let args: Vec<String> = std::env::args().collect();
    Cli::parse_from(rewrite_args_for_implicit_search(args))
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    query: Query,
    scope: SearchScope,
    cache_hit: bool,
    products: usize,
    matched: Vec<MatchedProduct>,
    written: Vec<PathBuf>,
    skipped: Vec<PathBuf>,
    duration_ms: u64,
}

#[derive(Debug, Serialize)]
struct MatchedProduct {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    snapshot: String,
    cache_hit: bool,
    #[serde(flatten)]
    stats: CatalogStats,
}

impl StatsOutput {
    fn new(cache: &CatalogCache, cache_hit: bool, stats: CatalogStats) -> Self {
        Self {
            snapshot: cache.path().to_string_lossy().to_string(),
            cache_hit,
            stats,
        }
    }
}

#[derive(Debug, Serialize)]
struct ClearOutput {
    snapshot: String,
    removed: bool,
}

fn run_search(
    source: &Path,
    cache: &CatalogCache,
    output_dir: &Path,
    refresh: bool,
    query: Query,
    scope: SearchScope,
) -> Result<SearchOutput> {
    let start = Instant::now();
    let loaded = load_catalog(source, cache, refresh, &mut LogProgress::new())
        .with_context(|| format!("Failed to load catalog: {}", source.display()))?;

    info!(
        field = %query.field,
        value = %query.value,
        "going to search for products that match"
    );
    let matches = search(&loaded.catalog, &query, scope);
    for p in &matches {
        info!(id = %p.id, name = %p.name, "found a match");
    }

    info!("going to output {} files..", matches.len());
    let summary = emit_matches(output_dir, &matches)
        .with_context(|| format!("Failed to write matches to {}", output_dir.display()))?;

    Ok(SearchOutput {
        matched: matches
            .iter()
            .map(|p| MatchedProduct {
                id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect(),
        query,
        scope,
        cache_hit: loaded.cache_hit,
        products: loaded.catalog.len(),
        written: summary.written,
        skipped: summary.skipped,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}
