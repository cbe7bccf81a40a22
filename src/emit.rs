//! One read-only JSON artifact per matched product.

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{CatalogError, Result};
use crate::model::Product;

#[derive(Debug, Default, Clone, Serialize)]
pub struct EmitSummary {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

pub fn artifact_file_name(product: &Product) -> String {
    format!("step-{}-{}.json", product.id, product.name)
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect()
}

pub fn emit_matches(output_dir: &Path, matches: &[&Product]) -> Result<EmitSummary> {
    std::fs::create_dir_all(output_dir).map_err(|e| CatalogError::write(output_dir, e))?;

    let mut summary = EmitSummary::default();
    for product in matches {
        let path = output_dir.join(artifact_file_name(product));
        if write_artifact(&path, product)? {
            summary.written.push(path);
        } else {
            warn!(path = %path.display(), "artifact already exists, leaving it untouched");
            summary.skipped.push(path);
        }
    }

    info!(
        written = summary.written.len(),
        skipped = summary.skipped.len(),
        "emitted match artifacts"
    );
    Ok(summary)
}

fn write_artifact(path: &Path, product: &Product) -> Result<bool> {
    let contents =
        serde_json::to_vec_pretty(product).map_err(|e| CatalogError::write(path, e))?;

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(CatalogError::write(path, e)),
    };
    file.write_all(&contents)
        .map_err(|e| CatalogError::write(path, e))?;

    let mut perms = file
        .metadata()
        .map_err(|e| CatalogError::write(path, e))?
        .permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(path, perms).map_err(|e| CatalogError::write(path, e))?;
    Ok(true)
}
