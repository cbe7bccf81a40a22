use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use crate::cache::CatalogCache;
use crate::cli::Cli;

pub const CACHE_DIR_ENV: &str = "STEP_FINDER_CACHE_DIR";

pub fn resolve_cache_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.cache_dir.clone() {
        return Ok(p);
    }

    if let Ok(p) = env::var(CACHE_DIR_ENV)
        && !p.is_empty()
    {
        return Ok(PathBuf::from(p));
    }

    working_dir()
}

pub fn resolve_output_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.output_dir.clone() {
        return Ok(p);
    }
    working_dir()
}

pub fn resolve_cache(cli: &Cli, source: &Path) -> Result<CatalogCache> {
    let cache_dir = resolve_cache_dir(cli)?;
    Ok(CatalogCache::for_source(&cache_dir, &clean_source_path(source)))
}

pub fn clean_source_path(source: &Path) -> PathBuf {
    source.components().collect()
}

fn working_dir() -> Result<PathBuf> {
    env::current_dir().context("Unable to determine current working directory")
}
