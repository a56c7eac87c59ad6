//! Core library for packing sprite images into texture atlases.
//!
//! - Packer: multi-bin, best-short-side-fit with guillotine splits, power-of-two bins
//! - Pipeline: `run` packs a directory into `<dir>_atlas-N.{png,webp,basis}` + `.json`;
//!   `pack_images` works fully in memory
//! - Manifests use the common `{ frames, meta }` JSON-hash layout
//!
//! Quick example:
//! ```ignore
//! use sprites_packer_core::{PackerConfig, PipelineOptions, run};
//! # fn main() -> anyhow::Result<()> {
//! let cfg = PackerConfig::builder().with_max_dimensions(1024, 1024).padding(2).build();
//! let written = run(&PipelineOptions::new("assets/ui", "out").with_config(cfg))?;
//! println!("atlases: {}", written.len());
//! # Ok(()) }
//! ```

pub mod atlas;
pub mod compositing;
pub mod compression;
pub mod config;
pub mod error;
pub mod export;
pub mod manifest;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod source;
pub mod trim;

pub use atlas::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use manifest::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
pub mod prelude {
    pub use crate::atlas::AtlasPage;
    pub use crate::config::{BasisOptions, PackerConfig, PackerConfigBuilder, TextureFormat};
    pub use crate::error::{ErrorKind, SpritePackerError};
    pub use crate::export::{ExportedAtlas, Exporter};
    pub use crate::manifest::{AtlasManifest, ManifestFrame};
    pub use crate::model::{Orientation, PackStats, PlaceableRect, Rect, SourceImage};
    pub use crate::packer::{Bin, PackingResult, RectanglePacker};
    pub use crate::{InputImage, PackOutput, PipelineOptions, pack_images, run};
}
