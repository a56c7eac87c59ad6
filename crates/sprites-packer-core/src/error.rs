use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of a failure.
///
/// Configuration errors are raised before any atlas is written; collaborator
/// errors come from the image codec, the filesystem or the compression tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Collaborator,
}

#[derive(Debug, Error)]
pub enum SpritePackerError {
    #[error("Invalid atlas dimensions: {width}x{height} (minimum is {min}x{min})")]
    InvalidDimensions { width: u32, height: u32, min: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Texture format not supported: {0:?} (supported: png, webp, basis)")]
    UnsupportedTextureFormat(String),
    #[error("The input directory {0:?} does not exist")]
    InputDirNotFound(PathBuf),
    #[error("No images found in the input directory: {0:?}")]
    NoImages(PathBuf),
    #[error("Nothing to pack")]
    Empty,
    #[error("Duplicate sprite name {0:?}")]
    DuplicateSpriteName(String),
    #[error(
        "Rectangle too large: {width}x{height} does not fit an atlas of at most {max_width}x{max_height}"
    )]
    RectTooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
    #[error("No compression tool available for platform {os}-{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("Failed to start compression tool {path:?}: {source}")]
    CompressorSpawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Compression tool exited with status {exit_code}: {stderr}")]
    CompressorFailed { exit_code: i32, stderr: String },
    #[error("Compression tool timed out after {timeout_secs} seconds")]
    CompressorTimeout { timeout_secs: u64 },
}

impl SpritePackerError {
    pub fn kind(&self) -> ErrorKind {
        use SpritePackerError::*;
        match self {
            InvalidDimensions { .. }
            | InvalidConfig(_)
            | UnsupportedTextureFormat(_)
            | InputDirNotFound(_)
            | NoImages(_)
            | Empty
            | DuplicateSpriteName(_)
            | RectTooLarge { .. }
            | UnsupportedPlatform { .. } => ErrorKind::Configuration,
            Io(_)
            | Image(_)
            | Manifest(_)
            | CompressorSpawn { .. }
            | CompressorFailed { .. }
            | CompressorTimeout { .. } => ErrorKind::Collaborator,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

pub type Result<T> = std::result::Result<T, SpritePackerError>;
