/// Size of a single tile in pixels. Cartile renders 256px tiles, the size
/// virtually all raster map stacks agree on.
pub const TILE_SIZE: u32 = 256;

pub fn total_tiles(zoom: u8) -> u32 {
    2u32.pow(zoom as u32)
}

/// The highest valid tile number on either axis for the zoom level.
pub fn max_tile_number(zoom: u8) -> u32 {
    total_tiles(zoom) - 1
}

/// Identifies the tile in the tile grid.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Tile {
    /// X number of the tile.
    pub x: u32,

    /// Y number of the tile.
    pub y: u32,

    /// Zoom level, where 0 means no zoom.
    /// See: <https://wiki.openstreetmap.org/wiki/Zoom_levels>
    pub zoom: u8,
}

impl Tile {
    /// Tile position (in pixels) on the "world bitmap".
    pub fn origin(&self) -> crate::geometry::Point {
        crate::geometry::Point::new(
            self.x as f64 * TILE_SIZE as f64,
            self.y as f64 * TILE_SIZE as f64,
        )
    }

    pub fn east(&self) -> Option<Tile> {
        (self.x < max_tile_number(self.zoom)).then_some(Tile {
            x: self.x + 1,
            y: self.y,
            zoom: self.zoom,
        })
    }

    pub fn west(&self) -> Option<Tile> {
        Some(Tile {
            x: self.x.checked_sub(1)?,
            y: self.y,
            zoom: self.zoom,
        })
    }

    pub fn north(&self) -> Option<Tile> {
        Some(Tile {
            x: self.x,
            y: self.y.checked_sub(1)?,
            zoom: self.zoom,
        })
    }

    pub fn south(&self) -> Option<Tile> {
        (self.y < max_tile_number(self.zoom)).then_some(Tile {
            x: self.x,
            y: self.y + 1,
            zoom: self.zoom,
        })
    }

    pub fn north_east(&self) -> Option<Tile> {
        self.north().and_then(|tile| tile.east())
    }

    pub fn north_west(&self) -> Option<Tile> {
        self.north().and_then(|tile| tile.west())
    }

    pub fn south_east(&self) -> Option<Tile> {
        self.south().and_then(|tile| tile.east())
    }

    pub fn south_west(&self) -> Option<Tile> {
        self.south().and_then(|tile| tile.west())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_cannot_go_beyond_limits() {
        // There is only one tile at zoom 0.
        let tile = Tile {
            x: 0,
            y: 0,
            zoom: 0,
        };

        assert_eq!(tile.west(), None);
        assert_eq!(tile.north(), None);
        assert_eq!(tile.south(), None);
        assert_eq!(tile.east(), None);

        // There are 2x2 tiles at zoom 1.
        let tile = Tile {
            x: 0,
            y: 0,
            zoom: 1,
        };

        assert_eq!(tile.west(), None);
        assert_eq!(tile.north(), None);
        assert_eq!(tile.north_east(), None);
        assert_eq!(tile.south_west(), None);

        assert_eq!(
            tile.south(),
            Some(Tile {
                x: 0,
                y: 1,
                zoom: 1
            })
        );

        assert_eq!(
            tile.south_east(),
            Some(Tile {
                x: 1,
                y: 1,
                zoom: 1
            })
        );
    }

    #[test]
    fn tile_origin_is_a_multiple_of_the_tile_size() {
        let tile = Tile {
            x: 3,
            y: 2,
            zoom: 5,
        };

        assert_eq!(crate::geometry::Point::new(768.0, 512.0), tile.origin());
    }
}
