//! Project lat/lon coordinates into 2D x/y using the Web Mercator.
//! <https://en.wikipedia.org/wiki/Web_Mercator_projection>
//! <https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames>

use std::f64::consts::PI;

use crate::geometry::{LatLong, LatLongExt, Point};
use crate::tile::{max_tile_number, Tile, TILE_SIZE};

/// Zoom specifies how many pixels are in the whole map. For example, zoom 0 means that the whole
/// map is just one 256x256 tile, zoom 1 means that it is 2x2 tiles, and so on.
pub(crate) fn total_pixels(zoom: u8) -> f64 {
    2f64.powi(zoom as i32) * (TILE_SIZE as f64)
}

/// Horizontal pixel coordinate of the longitude on the "world bitmap".
pub fn longitude_to_pixel_x(longitude: f64, zoom: u8) -> f64 {
    (longitude + 180.0) / 360.0 * total_pixels(zoom)
}

/// Vertical pixel coordinate of the latitude on the "world bitmap".
pub fn latitude_to_pixel_y(latitude: f64, zoom: u8) -> f64 {
    let sin_latitude = latitude.to_radians().sin();
    (0.5 - ((1.0 + sin_latitude) / (1.0 - sin_latitude)).ln() / (4.0 * PI)) * total_pixels(zoom)
}

/// Longitude of the horizontal pixel coordinate on the "world bitmap".
pub fn pixel_x_to_longitude(pixel_x: f64, zoom: u8) -> f64 {
    (pixel_x / total_pixels(zoom) * 2.0 - 1.0) * 180.0
}

/// Latitude of the vertical pixel coordinate on the "world bitmap".
pub fn pixel_y_to_latitude(pixel_y: f64, zoom: u8) -> f64 {
    ((1.0 - 2.0 * pixel_y / total_pixels(zoom)) * PI)
        .sinh()
        .atan()
        .to_degrees()
}

/// X number of the tile covering the longitude, clamped to the tile grid.
pub fn longitude_to_tile_x(longitude: f64, zoom: u8) -> u32 {
    let tile_x = (longitude_to_pixel_x(longitude, zoom) / TILE_SIZE as f64) as i64;
    tile_x.clamp(0, max_tile_number(zoom) as i64) as u32
}

/// Y number of the tile covering the latitude, clamped to the tile grid.
pub fn latitude_to_tile_y(latitude: f64, zoom: u8) -> u32 {
    let tile_y = (latitude_to_pixel_y(latitude, zoom) / TILE_SIZE as f64) as i64;
    tile_y.clamp(0, max_tile_number(zoom) as i64) as u32
}

/// Project a geographical position into the local pixel frame of the tile.
/// Coordinates can be negative or beyond [`TILE_SIZE`] when the position
/// lies outside the tile.
pub fn project_to_tile(position: LatLong, tile: Tile) -> Point {
    let origin = tile.origin();
    Point::new(
        longitude_to_pixel_x(position.longitude(), tile.zoom) - origin.x(),
        latitude_to_pixel_y(position.latitude(), tile.zoom) - origin.y(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::lat_lon;

    #[test]
    fn projecting_the_poles_and_the_equator() {
        approx::assert_relative_eq!(longitude_to_pixel_x(-180.0, 0), 0.0);
        approx::assert_relative_eq!(longitude_to_pixel_x(0.0, 0), 128.0);
        approx::assert_relative_eq!(longitude_to_pixel_x(180.0, 0), 256.0);
        approx::assert_relative_eq!(latitude_to_pixel_y(0.0, 0), 128.0);

        // The Mercator cut-off latitude maps to the edges of the world bitmap.
        approx::assert_relative_eq!(latitude_to_pixel_y(85.05112878, 0), 0.0, epsilon = 1e-6);
        approx::assert_relative_eq!(latitude_to_pixel_y(-85.05112878, 0), 256.0, epsilon = 1e-6);
    }

    #[test]
    fn projecting_position_into_a_tile() {
        let citadel = lat_lon(52.26470, 21.00027);
        let tile = Tile {
            x: 571,
            y: 337,
            zoom: 10,
        };

        let projected = project_to_tile(citadel, tile);
        assert!(projected.x() >= 0.0 && projected.x() <= TILE_SIZE as f64);
        assert!(projected.y() >= 0.0 && projected.y() <= TILE_SIZE as f64);

        // One tile further, the same position is one tile size away.
        let projected_east = project_to_tile(
            citadel,
            Tile {
                x: 572,
                y: 337,
                zoom: 10,
            },
        );
        approx::assert_relative_eq!(projected_east.x(), projected.x() - TILE_SIZE as f64);
    }

    #[test]
    fn project_there_and_back() {
        let citadel = lat_lon(52.26470, 21.00027);
        let zoom = 16;

        let x = longitude_to_pixel_x(citadel.x(), zoom);
        let y = latitude_to_pixel_y(citadel.y(), zoom);

        approx::assert_relative_eq!(pixel_x_to_longitude(x, zoom), citadel.x(), epsilon = 1e-9);
        approx::assert_relative_eq!(pixel_y_to_latitude(y, zoom), citadel.y(), epsilon = 1e-9);
    }

    #[test]
    fn tile_numbers_are_clamped_to_the_grid() {
        assert_eq!(0, longitude_to_tile_x(-180.0, 3));
        assert_eq!(7, longitude_to_tile_x(180.0, 3));
        assert_eq!(0, latitude_to_tile_y(90.0, 3));
        assert_eq!(7, latitude_to_tile_y(-90.0, 3));
    }
}
