//! Description of one tile-rendering job.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::tile::Tile;

/// The job carries an invalid text scale or an empty map-file path.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid renderer job: {0}")]
pub struct InvalidJob(String);

/// Identifies one rendering of one tile. Two jobs are equal when tile, map
/// file and text scale agree; the text scale is compared by bit pattern so
/// the job can serve as a cache key.
#[derive(Debug, Clone)]
pub struct RendererJob {
    pub tile: Tile,
    pub map_file: PathBuf,
    pub text_scale: f32,
}

impl RendererJob {
    pub fn new(
        tile: Tile,
        map_file: impl AsRef<Path>,
        text_scale: f32,
    ) -> Result<Self, InvalidJob> {
        let map_file = map_file.as_ref();
        if map_file.as_os_str().is_empty() {
            return Err(InvalidJob("map file path is empty".into()));
        }
        if text_scale <= 0.0 || text_scale.is_nan() {
            return Err(InvalidJob(format!("invalid text scale: {text_scale}")));
        }

        Ok(Self {
            tile,
            map_file: map_file.to_owned(),
            text_scale,
        })
    }
}

impl PartialEq for RendererJob {
    fn eq(&self, other: &Self) -> bool {
        self.tile == other.tile
            && self.map_file == other.map_file
            && self.text_scale.to_bits() == other.text_scale.to_bits()
    }
}

impl Eq for RendererJob {}

impl Hash for RendererJob {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tile.hash(state);
        self.map_file.hash(state);
        self.text_scale.to_bits().hash(state);
    }
}
