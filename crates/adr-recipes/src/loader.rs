//! Loading descriptor files from recipe directories.

use crate::descriptor::RecipeDescriptor;
use crate::template::TemplateRecipe;
use adr_core::{Error, Result};
use std::path::{Path, PathBuf};

/// Loads one descriptor file.
pub fn load_file(path: &Path) -> Result<TemplateRecipe> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("failed to read recipe {}: {e}", path.display()))
    })?;
    let descriptor = RecipeDescriptor::from_toml_str(&text, &path.display().to_string())?;
    TemplateRecipe::from_descriptor(descriptor)
}

/// Loads every `*.toml` descriptor directly inside `dir`, in path order.
pub fn load_dir(dir: &Path) -> Result<Vec<TemplateRecipe>> {
    if !dir.is_dir() {
        return Err(Error::config(format!(
            "recipe directory not found: {}",
            dir.display()
        )));
    }

    let files = descriptor_paths(dir)?;
    tracing::debug!(dir = %dir.display(), count = files.len(), "Loading recipe descriptors");
    files.iter().map(|path| load_file(path)).collect()
}

fn descriptor_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let escaped = glob::Pattern::escape(&dir.display().to_string());
    let pattern = format!("{escaped}/*.toml");
    let entries = glob::glob(&pattern)
        .map_err(|e| Error::config(format!("invalid recipe path {}: {e}", dir.display())))?;

    let mut paths = entries
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| {
            Error::config(format!("failed to read {}: {}", e.path().display(), e.error()))
        })?;
    paths.retain(|p| p.is_file());
    paths.sort();
    Ok(paths)
}
