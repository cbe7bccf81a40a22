//! Snapshot cache for parsed catalogs.
//!
//! Decoding a large catalog takes minutes; the flattened result is stored
//! as a JSON snapshot next to the working directory so later searches can
//! skip the XML entirely. The snapshot is identified by file name only and
//! is never invalidated automatically.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use crate::model::Catalog;

pub const SNAPSHOT_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct CatalogCache {
    path: PathBuf,
}

impl CatalogCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn for_source(cache_dir: &Path, source: &Path) -> Self {
        Self::new(snapshot_path(cache_dir, source))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    // An unreadable snapshot is an error, not a miss.
    pub fn load(&self) -> Result<Option<Catalog>> {
        if !self.exists() {
            return Ok(None);
        }

        info!(path = %self.path.display(), "reading cached catalog");
        let file = File::open(&self.path).map_err(|e| CatalogError::cache(&self.path, e))?;
        let catalog: Catalog = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| CatalogError::cache(&self.path, e))?;
        debug!(products = catalog.len(), "read cached catalog");
        Ok(Some(catalog))
    }

    pub fn store(&self, catalog: &Catalog) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::write(parent, e))?;
        }

        let mut tmp_os = self.path.as_os_str().to_os_string();
        tmp_os.push(".tmp");
        let tmp = PathBuf::from(tmp_os);

        let written = write_json(&tmp, catalog);
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }

        std::fs::rename(&tmp, &self.path).map_err(|e| CatalogError::write(&self.path, e))?;
        info!(path = %self.path.display(), products = catalog.len(), "saved catalog snapshot");
        Ok(())
    }

    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path).map_err(|e| CatalogError::write(&self.path, e))?;
        Ok(true)
    }
}

pub fn snapshot_path(cache_dir: &Path, source: &Path) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "catalog".to_string());
    cache_dir.join(format!("{name}.{SNAPSHOT_EXTENSION}"))
}

fn write_json(path: &Path, catalog: &Catalog) -> Result<()> {
    let file = File::create(path).map_err(|e| CatalogError::write(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, catalog).map_err(|e| CatalogError::write(path, e))?;
    writer.flush().map_err(|e| CatalogError::write(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten_catalog;
    use crate::model::Product;
    use crate::test_support::temp_dir;

    #[test]
    fn snapshot_is_named_after_the_source_file() {
        let path = snapshot_path(Path::new("/work"), Path::new("/data/export/catalog.xml"));
        assert_eq!(path, PathBuf::from("/work/catalog.xml.json"));
    }

    #[test]
    fn store_then_load_round_trips() -> anyhow::Result<()> {
        let dir = temp_dir("cache_round_trip");
        let cache = CatalogCache::for_source(&dir, Path::new("catalog.xml"));
        assert!(cache.load()?.is_none());

        let catalog = flatten_catalog(vec![
            Product::new("1")
                .with_name("Drill")
                .with_value("Color", "Red")
                .with_child(Product::new("2").with_group("Fits", &["A"])),
        ]);
        cache.store(&catalog)?;
        assert!(cache.exists());

        let loaded = cache.load()?.expect("snapshot should exist");
        assert_eq!(loaded, catalog);
        assert_eq!(loaded.get("2").map(|p| p.parent_id.as_str()), Some("1"));

        assert!(cache.clear()?);
        assert!(!cache.clear()?);
        let _ = std::fs::remove_dir_all(dir);
        Ok(())
    }

    #[test]
    fn corrupt_snapshot_is_an_error() -> anyhow::Result<()> {
        let dir = temp_dir("cache_corrupt");
        std::fs::create_dir_all(&dir)?;
        let cache = CatalogCache::for_source(&dir, Path::new("catalog.xml"));
        std::fs::write(cache.path(), "{ not json")?;

        let err = cache.load().unwrap_err();
        assert!(matches!(err, CatalogError::Cache { .. }));
        let _ = std::fs::remove_dir_all(dir);
        Ok(())
    }
}
