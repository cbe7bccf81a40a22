use std::path::Path;
use tracing::{info, warn};

use crate::cache::CatalogCache;
use crate::decode::decode_catalog_file;
use crate::error::Result;
use crate::flatten::flatten_catalog;
use crate::model::Catalog;
use crate::progress::ProgressObserver;

#[derive(Debug)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub cache_hit: bool,
}

pub fn load_catalog(
    source: &Path,
    cache: &CatalogCache,
    refresh: bool,
    observer: &mut impl ProgressObserver,
) -> Result<LoadedCatalog> {
    if !refresh && let Some(catalog) = cache.load()? {
        info!(products = catalog.len(), "read cache");
        return Ok(LoadedCatalog {
            catalog,
            cache_hit: true,
        });
    }

    let catalog = parse_catalog(source, observer)?;

    info!("saving cache..");
    if let Err(e) = cache.store(&catalog) {
        warn!(error = %e, "failed to save catalog snapshot");
    }

    Ok(LoadedCatalog {
        catalog,
        cache_hit: false,
    })
}

pub fn parse_catalog(source: &Path, observer: &mut impl ProgressObserver) -> Result<Catalog> {
    info!(path = %source.display(), "parsing products..");
    let top_level = decode_catalog_file(source, observer)?;
    let catalog = flatten_catalog(top_level);
    info!(products = catalog.len(), "parsed products");
    Ok(catalog)
}
