//! Access to offline, binary, zoom-banded map files.

mod header;
mod read_buffer;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use header::{
    MapFileHeader, MapFileInfo, SubFileParameter, HEADER_SIZE_MIN, MAGIC_BYTES,
    SUPPORTED_FILE_VERSIONS,
};
pub use read_buffer::ReadBuffer;

use crate::geometry::{LatLong, Tag};
use crate::tile::Tile;

#[derive(Debug, thiserror::Error)]
pub enum MapFileError {
    /// The file does not start with the map-file signature.
    #[error("not a map file: {0}")]
    NotAMapFile(String),

    /// The file declares a format version this reader does not know.
    #[error("unsupported file version: {0}")]
    UnsupportedVersion(u32),

    /// A size or range check on the file contents failed.
    #[error("malformed map file: {0}")]
    MalformedInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A point of interest read from the map file.
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    pub layer: i8,
    pub tags: Vec<Tag>,
    pub position: LatLong,
}

/// A way read from the map file; the outer coordinate block is the outline,
/// further blocks are holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub layer: i8,
    pub tags: Vec<Tag>,
    pub lat_longs: Vec<Vec<LatLong>>,
}

/// Everything the reader found for one tile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapReadResult {
    pub point_of_interests: Vec<PointOfInterest>,
    pub ways: Vec<Way>,
    /// The tile is covered completely by water.
    pub is_water: bool,
}

/// Source of the per-tile geometry the renderer draws. The map-file header
/// is decoded by this crate; decoding POIs and ways from the sub-file
/// blocks is left to implementations.
pub trait MapDataSource: Send {
    fn read_map_data(&mut self, tile: Tile) -> Result<MapReadResult, MapFileError>;

    /// Header data of the underlying file, when there is one.
    fn map_file_info(&self) -> Option<&MapFileInfo> {
        None
    }
}

/// An open map file with its validated header.
#[derive(Debug)]
pub struct MapFile {
    path: PathBuf,
    header: MapFileHeader,
}

impl MapFile {
    /// Open the file and read its header. Fails when the file is not a map
    /// file, has an unsupported version, or the header violates the format.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MapFileError> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        // The magic bytes plus the size of the remaining header.
        let prelude_size = MAGIC_BYTES.len() + 4;
        if file_size < prelude_size as u64 {
            return Err(MapFileError::NotAMapFile(format!(
                "file of {file_size} bytes is too short"
            )));
        }

        let mut prelude = ReadBuffer::from_reader(&mut file, prelude_size)?;
        let magic = prelude.read_bytes(MAGIC_BYTES.len())?;
        if magic != MAGIC_BYTES {
            return Err(MapFileError::NotAMapFile(format!(
                "invalid magic bytes: {}",
                String::from_utf8_lossy(magic)
            )));
        }
        let remaining_header_size = prelude.read_int()?;
        if remaining_header_size <= 0
            || prelude_size as u64 + remaining_header_size as u64 > file_size
        {
            return Err(MapFileError::MalformedInput(format!(
                "invalid remaining header size: {remaining_header_size}"
            )));
        }

        // Re-assemble the whole header into one window and parse it.
        let mut header_bytes = Vec::with_capacity(prelude_size + remaining_header_size as usize);
        let mut rest = vec![0u8; remaining_header_size as usize];
        file.read_exact(&mut rest)?;
        header_bytes.extend_from_slice(MAGIC_BYTES);
        header_bytes.extend_from_slice(&remaining_header_size.to_be_bytes());
        header_bytes.extend_from_slice(&rest);

        let header = MapFileHeader::read(&mut ReadBuffer::new(header_bytes), file_size)?;

        Ok(Self {
            path: path.to_owned(),
            header,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn map_file_info(&self) -> &MapFileInfo {
        self.header.map_file_info()
    }

    /// The closest zoom level covered by a sub-file.
    pub fn query_zoom_level(&self, zoom_level: u8) -> u8 {
        self.header.query_zoom_level(zoom_level)
    }

    /// The sub-file covering the given query zoom level.
    pub fn sub_file_parameter(&self, query_zoom_level: u8) -> Option<&Arc<SubFileParameter>> {
        self.header.sub_file_parameter(query_zoom_level)
    }
}
