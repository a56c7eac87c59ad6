//! Input discovery and decoding.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use image::ImageReader;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SpritePackerError};
use crate::model::SourceImage;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Sprite name for `path`: the file name up to its first `.`.
pub fn sprite_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let name = file_name.split('.').next().unwrap_or(file_name);
    Some(name.to_string())
}

fn is_sprite_file(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// PNG files directly inside `dir` (no recursion), sorted by file name.
pub fn collect_sprite_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SpritePackerError::InputDirNotFound(dir.to_path_buf()));
    }
    let mut list = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let p = entry.path();
        if entry.file_type().is_file() && is_sprite_file(p) {
            list.push(p.to_path_buf());
        }
    }
    debug!(count = list.len(), ?dir, "collected sprite files");
    Ok(list)
}

/// Decodes one file into an RGBA source.
pub fn load_source(path: &Path) -> Result<SourceImage> {
    let name = sprite_name(path).ok_or_else(|| {
        SpritePackerError::InvalidConfig(format!("cannot derive a sprite name from {path:?}"))
    })?;
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(SourceImage::new(name, img.to_rgba8()).with_path(path))
}

/// Decodes every path, keeping input order, and rejects duplicate names.
pub fn load_sources(paths: &[PathBuf]) -> Result<Vec<SourceImage>> {
    #[cfg(feature = "parallel")]
    let sources = paths
        .par_iter()
        .map(|p| load_source(p))
        .collect::<Result<Vec<_>>>()?;
    #[cfg(not(feature = "parallel"))]
    let sources = paths
        .iter()
        .map(|p| load_source(p))
        .collect::<Result<Vec<_>>>()?;
    ensure_unique_names(&sources)?;
    Ok(sources)
}

/// Manifest keys must be unique; two files with the same name are rejected.
pub fn ensure_unique_names(sources: &[SourceImage]) -> Result<()> {
    let mut seen = HashSet::with_capacity(sources.len());
    for s in sources {
        if !seen.insert(s.name.as_str()) {
            return Err(SpritePackerError::DuplicateSpriteName(s.name.clone()));
        }
    }
    Ok(())
}
