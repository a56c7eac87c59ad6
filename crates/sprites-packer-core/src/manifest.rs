//! Frame manifest written next to every atlas texture.
//!
//! Shape (compact JSON, keys in this order):
//! `{ frames: { name: { frame, rotated, trimmed, spriteSourceSize, sourceSize } }, meta }`.
//! Frames are emitted in placement order.

use std::collections::HashMap;

use crate::error::{Result, SpritePackerError};
use crate::model::Rect;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

pub const MANIFEST_APP: &str = "sprites-packer";
pub const MANIFEST_FORMAT: &str = "RGBA8888";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

/// One sprite entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFrame {
    /// Placed rectangle in atlas pixels.
    pub frame: Rect,
    pub rotated: bool,
    pub trimmed: bool,
    /// Offset and extent of the trimmed pixels within the original sprite.
    pub sprite_source_size: Rect,
    /// Original (untrimmed) sprite size.
    pub source_size: Size,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ManifestMeta {
    pub app: String,
    pub image: String,
    pub scale: u32,
    pub format: String,
    pub size: Size,
}

/// Frames keyed by sprite name, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frames {
    entries: Vec<(String, ManifestFrame)>,
    index: HashMap<String, usize>,
}

impl Frames {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ManifestFrame> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestFrame)> {
        self.entries.iter().map(|(n, f)| (n.as_str(), f))
    }

    fn push(&mut self, name: String, frame: ManifestFrame) -> Result<()> {
        if self.index.contains_key(&name) {
            return Err(SpritePackerError::DuplicateSpriteName(name));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, frame));
        Ok(())
    }
}

impl Serialize for Frames {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, frame) in &self.entries {
            map.serialize_entry(name, frame)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AtlasManifest {
    pub frames: Frames,
    pub meta: ManifestMeta,
}

impl AtlasManifest {
    pub fn new(image: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            frames: Frames::default(),
            meta: ManifestMeta {
                app: MANIFEST_APP.into(),
                image: image.into(),
                scale: 1,
                format: MANIFEST_FORMAT.into(),
                size: Size {
                    w: width,
                    h: height,
                },
            },
        }
    }

    /// Adds a frame. A name already present is rejected instead of overwritten.
    pub fn insert(&mut self, name: impl Into<String>, frame: ManifestFrame) -> Result<()> {
        self.frames.push(name.into(), frame)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
