#![doc = include_str!("../README.md")]
#![deny(clippy::unwrap_used, rustdoc::broken_intra_doc_links)]

mod cache;
mod geometry;
mod graphics;
mod mapfile;
pub mod mercator;
mod queue;
mod renderer;
mod theme;
mod tile;
mod worker;

pub use cache::FileSystemTileCache;
pub use geometry::{lat_lon, BoundingBox, LatLong, LatLongExt, Point, Rectangle, Tag};
pub use graphics::{Bitmap, Canvas, Color, NoopCanvas, Paint, PaintStyle};
pub use mapfile::{
    MapDataSource, MapFile, MapFileError, MapFileHeader, MapFileInfo, MapReadResult,
    PointOfInterest, ReadBuffer, SubFileParameter, Way,
};
pub use queue::JobQueue;
pub use renderer::{
    InvalidJob, LabelPlacement, RendererJob, SpillRouting, TileRenderer, LAYERS,
};
pub use theme::{RenderCallback, RenderContext, RenderTheme};
pub use tile::{max_tile_number, total_tiles, Tile, TILE_SIZE};
pub use worker::MapWorker;
