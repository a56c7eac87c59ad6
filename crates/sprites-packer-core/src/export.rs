//! Writes assembled atlases to disk: one texture and one JSON manifest per bin.
//!
//! Each bin is committed on its own; a failure on bin N leaves bins 0..N on disk.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use tracing::info;

use crate::atlas::AtlasPage;
use crate::compression::BasisCompressor;
use crate::config::{PackerConfig, TextureFormat};
use crate::error::{Result, SpritePackerError};

/// File stem shared by a bin's texture and manifest.
pub fn atlas_file_stem(atlas_name: &str, index: usize) -> String {
    format!("{atlas_name}_atlas-{index}")
}

/// Files written for one bin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedAtlas {
    pub index: usize,
    pub texture_path: PathBuf,
    pub manifest_path: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    atlas_name: String,
    format: TextureFormat,
    compressor: Option<BasisCompressor>,
}

impl Exporter {
    /// For `basis` output the compressor binary is resolved here, so an
    /// unsupported host fails before anything is packed.
    pub fn new(
        output_dir: impl Into<PathBuf>,
        atlas_name: impl Into<String>,
        cfg: &PackerConfig,
    ) -> Result<Self> {
        let compressor = match cfg.texture_format {
            TextureFormat::Basis => Some(BasisCompressor::resolve(&cfg.basis)?),
            TextureFormat::Png | TextureFormat::Webp => None,
        };
        Ok(Self {
            output_dir: output_dir.into(),
            atlas_name: atlas_name.into(),
            format: cfg.texture_format,
            compressor,
        })
    }

    /// Replaces the resolved compressor (e.g. with an explicit binary).
    pub fn with_compressor(mut self, compressor: BasisCompressor) -> Self {
        self.compressor = Some(compressor);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn texture_file_name(&self, index: usize) -> String {
        format!(
            "{}.{}",
            atlas_file_stem(&self.atlas_name, index),
            self.format.extension()
        )
    }

    pub fn manifest_file_name(&self, index: usize) -> String {
        format!("{}.json", atlas_file_stem(&self.atlas_name, index))
    }

    /// Writes the texture, then the manifest, for one page.
    pub fn export(&self, page: &AtlasPage) -> Result<ExportedAtlas> {
        fs::create_dir_all(&self.output_dir)?;
        let texture_path = self.output_dir.join(self.texture_file_name(page.index));
        let manifest_path = self.output_dir.join(self.manifest_file_name(page.index));

        self.write_texture(&page.canvas, &texture_path)?;
        fs::write(&manifest_path, page.manifest.to_json_string()?)?;

        info!(
            texture = %texture_path.display(),
            width = page.width(),
            height = page.height(),
            frames = page.manifest.frames.len(),
            "new atlas"
        );
        Ok(ExportedAtlas {
            index: page.index,
            texture_path,
            manifest_path,
            width: page.width(),
            height: page.height(),
        })
    }

    fn write_texture(&self, canvas: &RgbaImage, path: &Path) -> Result<()> {
        match self.format {
            TextureFormat::Png => canvas.save_with_format(path, ImageFormat::Png)?,
            TextureFormat::Webp => canvas.save_with_format(path, ImageFormat::WebP)?,
            TextureFormat::Basis => {
                let compressor = self.compressor.as_ref().ok_or_else(|| {
                    SpritePackerError::InvalidConfig("basis output without a compressor".into())
                })?;
                // removed on drop, whether or not compression succeeds
                let tmp = tempfile::Builder::new()
                    .prefix("sprite-packer-")
                    .tempdir_in(&self.output_dir)?;
                let intermediate = tmp.path().join("sprite-packer-tmp.png");
                canvas.save_with_format(&intermediate, ImageFormat::Png)?;
                compressor.compress(&intermediate, path)?;
            }
        }
        Ok(())
    }
}
