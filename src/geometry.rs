//! Types and functions for working with positions and rectangles.

/// Geographical position with latitude and longitude.
pub type LatLong = geo_types::Point;

/// Construct a `LatLong` from latitude and longitude.
pub fn lat_lon(lat: f64, lon: f64) -> LatLong {
    LatLong::new(lon, lat)
}

/// Location projected on a tile or an abstract bitmap, in pixels.
pub type Point = geo_types::Point;

pub trait LatLongExt {
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;
}

impl LatLongExt for LatLong {
    fn latitude(&self) -> f64 {
        self.y()
    }

    fn longitude(&self) -> f64 {
        self.x()
    }
}

/// Convert a coordinate stored in microdegrees to degrees.
pub fn microdegrees_to_degrees(microdegrees: i32) -> f64 {
    microdegrees as f64 / 1_000_000.0
}

/// An axis-aligned rectangle with the origin in the upper-left corner, so
/// `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rectangle {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// The same rectangle grown by `distance` pixels on every side.
    pub fn inflate(&self, distance: f64) -> Self {
        Self {
            left: self.left - distance,
            top: self.top - distance,
            right: self.right + distance,
            bottom: self.bottom + distance,
        }
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }
}

/// A tag is a key-value pair as stored in the map file tag tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Split a `key=value` string as found in the tag tables. Everything
    /// after the first `=` belongs to the value.
    pub fn parse(tag: &str) -> Self {
        match tag.split_once('=') {
            Some((key, value)) => Self::new(key, value),
            None => Self::new(tag, ""),
        }
    }
}

/// Geographical area delimited by two latitudes and two longitudes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub const LATITUDE_MAX: f64 = 90.0;
    pub const LONGITUDE_MAX: f64 = 180.0;

    /// `None` when the coordinates are out of range or the minimum exceeds
    /// the maximum on either axis.
    pub fn new(
        min_latitude: f64,
        min_longitude: f64,
        max_latitude: f64,
        max_longitude: f64,
    ) -> Option<Self> {
        let latitude_valid = (-Self::LATITUDE_MAX..=Self::LATITUDE_MAX).contains(&min_latitude)
            && (-Self::LATITUDE_MAX..=Self::LATITUDE_MAX).contains(&max_latitude)
            && min_latitude <= max_latitude;
        let longitude_valid = (-Self::LONGITUDE_MAX..=Self::LONGITUDE_MAX).contains(&min_longitude)
            && (-Self::LONGITUDE_MAX..=Self::LONGITUDE_MAX).contains(&max_longitude)
            && min_longitude <= max_longitude;

        (latitude_valid && longitude_valid).then_some(Self {
            min_latitude,
            min_longitude,
            max_latitude,
            max_longitude,
        })
    }

    pub fn center(&self) -> LatLong {
        lat_lon(
            (self.min_latitude + self.max_latitude) / 2.0,
            (self.min_longitude + self.max_longitude) / 2.0,
        )
    }

    pub fn contains(&self, position: LatLong) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&position.latitude())
            && (self.min_longitude..=self.max_longitude).contains(&position.longitude())
    }
}
