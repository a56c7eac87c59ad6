use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{info, instrument};

use crate::atlas::{AtlasPage, assemble_bin};
use crate::config::PackerConfig;
use crate::error::{Result, SpritePackerError};
use crate::export::{ExportedAtlas, Exporter, atlas_file_stem};
use crate::model::{PackStats, SourceImage};
use crate::packer::{PackingResult, RectanglePacker};
use crate::source::{collect_sprite_paths, ensure_unique_names, load_sources};
use crate::trim::{placeable_rects, trim_sources};

/// In-memory image to pack (key + decoded image).
pub struct InputImage {
    pub key: String,
    pub image: DynamicImage,
}

/// Output of an in-memory packing run.
pub struct PackOutput {
    /// Sources after preprocessing, indexed by `PlaceableRect::source`.
    pub sources: Vec<SourceImage>,
    pub packing: PackingResult,
    pub pages: Vec<AtlasPage>,
}

impl PackOutput {
    pub fn stats(&self) -> PackStats {
        self.packing.stats()
    }
}

/// Directory-to-directory run description.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config: PackerConfig,
}

impl PipelineOptions {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            config: PackerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PackerConfig) -> Self {
        self.config = config;
        self
    }
}

/// Atlas base name: the last component of the input directory.
pub fn atlas_name_for(input_dir: &Path) -> String {
    let resolved = input_dir
        .canonicalize()
        .unwrap_or_else(|_| input_dir.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "atlas".to_string())
}

/// Trims (when enabled) and packs `sources`. Sources are modified in place.
#[instrument(skip_all, fields(count = sources.len()))]
pub fn prepare_and_pack(sources: &mut [SourceImage], cfg: &PackerConfig) -> Result<PackingResult> {
    cfg.validate()?;
    let cfg = cfg.clamped();
    if sources.is_empty() {
        return Err(SpritePackerError::Empty);
    }
    ensure_unique_names(sources)?;
    if cfg.trim {
        trim_sources(sources, cfg.trim_threshold);
    }
    let rects = placeable_rects(sources, cfg.trim);
    let packing = RectanglePacker::new(&cfg).pack(rects)?;
    info!(summary = %packing.stats().summary(), "packed");
    Ok(packing)
}

/// Packs and composites in memory; texture names in manifests use `atlas_name`.
pub fn pack_sources(
    mut sources: Vec<SourceImage>,
    atlas_name: &str,
    cfg: &PackerConfig,
) -> Result<PackOutput> {
    let packing = prepare_and_pack(&mut sources, cfg)?;
    let ext = cfg.texture_format.extension();
    let pages = packing
        .iter()
        .enumerate()
        .map(|(i, bin)| {
            let image_name = format!("{}.{ext}", atlas_file_stem(atlas_name, i));
            assemble_bin(i, bin, &sources, &image_name)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(PackOutput {
        sources,
        packing,
        pages,
    })
}

/// In-memory entry point: `key` becomes the sprite name.
pub fn pack_images(inputs: Vec<InputImage>, cfg: PackerConfig) -> Result<PackOutput> {
    let sources = inputs
        .into_iter()
        .map(|inp| SourceImage::new(inp.key, inp.image.to_rgba8()))
        .collect();
    pack_sources(sources, "atlas", &cfg)
}

/// Packs `sources` and exports each bin as soon as it is assembled.
pub fn pack_and_export(
    mut sources: Vec<SourceImage>,
    exporter: &Exporter,
    cfg: &PackerConfig,
) -> Result<Vec<ExportedAtlas>> {
    let packing = prepare_and_pack(&mut sources, cfg)?;
    let mut written = Vec::with_capacity(packing.len());
    for (i, bin) in packing.iter().enumerate() {
        let page = assemble_bin(i, bin, &sources, &exporter.texture_file_name(i))?;
        written.push(exporter.export(&page)?);
    }
    Ok(written)
}

/// Full run: validate, scan `input_dir`, load, trim, pack, assemble, export.
///
/// Configuration problems are reported before anything is written.
#[instrument(skip_all, fields(input = %options.input_dir.display()))]
pub fn run(options: &PipelineOptions) -> Result<Vec<ExportedAtlas>> {
    options.config.validate()?;
    let cfg = options.config.clamped();
    if !options.input_dir.is_dir() {
        return Err(SpritePackerError::InputDirNotFound(options.input_dir.clone()));
    }
    let exporter = Exporter::new(
        &options.output_dir,
        atlas_name_for(&options.input_dir),
        &cfg,
    )?;
    let paths = collect_sprite_paths(&options.input_dir)?;
    if paths.is_empty() {
        return Err(SpritePackerError::NoImages(options.input_dir.clone()));
    }
    let sources = load_sources(&paths)?;
    info!(count = sources.len(), "loaded input images");
    pack_and_export(sources, &exporter, &cfg)
}
