use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, SpritePackerError};

/// Smallest accepted value for `max_width` / `max_height`.
pub const MIN_ATLAS_DIMENSION: u32 = 128;
/// Larger `max_width` / `max_height` values are clamped to this.
pub const MAX_ATLAS_DIMENSION: u32 = 4096;

/// Output texture container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextureFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// WebP (written with the image crate's lossless encoder).
    Webp,
    /// Basis Universal, produced by the external `basisu` tool from a PNG intermediate.
    Basis,
}

impl TextureFormat {
    pub const ALL: [TextureFormat; 3] = [Self::Png, Self::Webp, Self::Basis];

    /// File extension used for the atlas texture.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Basis => "basis",
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TextureFormat {
    type Err = SpritePackerError;
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(s))
            .ok_or_else(|| SpritePackerError::UnsupportedTextureFormat(s.to_string()))
    }
}

/// Options forwarded to the `basisu` compressor when `texture_format` is `basis`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BasisOptions {
    /// Quality level, 1..=255. Higher is better quality and larger output.
    #[serde(default = "default_basis_quality")]
    pub quality: u8,
    /// Compression effort, 0..=6.
    #[serde(default = "default_basis_level")]
    pub compression_level: u8,
    /// Encode in linear colorspace instead of sRGB.
    #[serde(default)]
    pub linear: bool,
    /// Upper bound for a single compressor run.
    #[serde(default = "default_basis_timeout")]
    pub timeout_secs: u64,
    /// Directory holding the per-platform `basisu` binaries.
    /// `None` falls back to `SPRITES_PACKER_TOOLS_DIR`, then `<exe dir>/bin`.
    #[serde(default)]
    pub tools_dir: Option<PathBuf>,
}

impl Default for BasisOptions {
    fn default() -> Self {
        Self {
            quality: default_basis_quality(),
            compression_level: default_basis_level(),
            linear: false,
            timeout_secs: default_basis_timeout(),
            tools_dir: None,
        }
    }
}

fn default_basis_quality() -> u8 {
    255
}
fn default_basis_level() -> u8 {
    1
}
fn default_basis_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackerConfig {
    /// Maximum atlas width in pixels.
    pub max_width: u32,
    /// Maximum atlas height in pixels.
    pub max_height: u32,
    /// Pixels reserved to the right of and below every sprite.
    pub padding: u32,

    /// Trim transparent borders (alpha <= trim_threshold).
    pub trim: bool,
    #[serde(default)]
    pub trim_threshold: u8,

    #[serde(default)]
    pub texture_format: TextureFormat,
    #[serde(default)]
    pub basis: BasisOptions,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            max_width: 1024,
            max_height: 1024,
            padding: 4,
            trim: true,
            trim_threshold: 0,
            texture_format: TextureFormat::Png,
            basis: BasisOptions::default(),
        }
    }
}

impl PackerConfig {
    /// Validates the configuration parameters.
    ///
    /// Dimensions below [`MIN_ATLAS_DIMENSION`] are rejected. Dimensions above
    /// [`MAX_ATLAS_DIMENSION`] are accepted here and clamped by [`PackerConfig::clamped`].
    pub fn validate(&self) -> Result<()> {
        if self.max_width < MIN_ATLAS_DIMENSION || self.max_height < MIN_ATLAS_DIMENSION {
            return Err(SpritePackerError::InvalidDimensions {
                width: self.max_width,
                height: self.max_height,
                min: MIN_ATLAS_DIMENSION,
            });
        }
        if self.padding > MAX_ATLAS_DIMENSION {
            return Err(SpritePackerError::InvalidConfig(format!(
                "padding must be at most {MAX_ATLAS_DIMENSION}, got {}",
                self.padding
            )));
        }
        if self.basis.quality == 0 {
            return Err(SpritePackerError::InvalidConfig(
                "basis quality must be in 1..=255".into(),
            ));
        }
        if self.basis.compression_level > 6 {
            return Err(SpritePackerError::InvalidConfig(format!(
                "basis compression level must be in 0..=6, got {}",
                self.basis.compression_level
            )));
        }
        Ok(())
    }

    /// Returns a copy with the maxima clamped to [`MAX_ATLAS_DIMENSION`].
    pub fn clamped(&self) -> Self {
        let mut cfg = self.clone();
        cfg.max_width = cfg.max_width.min(MAX_ATLAS_DIMENSION);
        cfg.max_height = cfg.max_height.min(MAX_ATLAS_DIMENSION);
        cfg
    }

    /// Create a fluent builder for `PackerConfig`.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::new()
    }
}

/// Builder for `PackerConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackerConfigBuilder {
    cfg: PackerConfig,
}

impl PackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackerConfig::default(),
        }
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_width = w;
        self.cfg.max_height = h;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn trim(mut self, v: bool) -> Self {
        self.cfg.trim = v;
        self
    }
    pub fn trim_threshold(mut self, v: u8) -> Self {
        self.cfg.trim_threshold = v;
        self
    }
    pub fn texture_format(mut self, v: TextureFormat) -> Self {
        self.cfg.texture_format = v;
        self
    }
    pub fn basis(mut self, v: BasisOptions) -> Self {
        self.cfg.basis = v;
        self
    }
    pub fn build(self) -> PackerConfig {
        self.cfg
    }
}
