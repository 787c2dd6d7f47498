//! Containers for the drawable items a tile collects before rasterization.

use std::sync::Arc;

use crate::geometry::{Point, Rectangle};
use crate::graphics::{Bitmap, Paint};

/// A symbol bitmap anchored at a point in the tile's pixel frame. The point
/// is the upper-left corner unless `align_center` is set.
#[derive(Debug, Clone)]
pub struct SymbolContainer {
    pub symbol: Arc<Bitmap>,
    pub point: Point,
    pub align_center: bool,
    /// Rotation in radians, in the direction of travel along the way.
    pub theta: f32,
}

impl SymbolContainer {
    pub fn new(symbol: Arc<Bitmap>, point: Point) -> Self {
        Self {
            symbol,
            point,
            align_center: false,
            theta: 0.0,
        }
    }

    pub fn rotated(symbol: Arc<Bitmap>, point: Point, align_center: bool, theta: f32) -> Self {
        Self {
            symbol,
            point,
            align_center,
            theta,
        }
    }

    pub fn width(&self) -> f64 {
        self.symbol.width() as f64
    }

    pub fn height(&self) -> f64 {
        self.symbol.height() as f64
    }

    /// Bounding rectangle, ignoring rotation.
    pub fn rectangle(&self) -> Rectangle {
        Rectangle::new(
            self.point.x(),
            self.point.y(),
            self.point.x() + self.width(),
            self.point.y() + self.height(),
        )
    }
}

/// A caption anchored at a point. `y` is the text baseline; the boundary
/// keeps the text's width and height, so the occupied rectangle spans from
/// `y - height` to `y`.
#[derive(Debug, Clone)]
pub struct PointTextContainer {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub paint_front: Paint,
    pub paint_back: Option<Paint>,
    pub boundary: Rectangle,
    pub symbol: Option<Arc<SymbolContainer>>,
}

impl PointTextContainer {
    pub fn new(
        text: impl Into<String>,
        x: f64,
        y: f64,
        paint_front: Paint,
        paint_back: Option<Paint>,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            paint_front,
            paint_back,
            boundary: Rectangle::new(0.0, 0.0, width, height),
            symbol: None,
        }
    }

    pub fn with_symbol(mut self, symbol: Arc<SymbolContainer>) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn width(&self) -> f64 {
        self.boundary.width()
    }

    pub fn height(&self) -> f64 {
        self.boundary.height()
    }

    /// The rectangle the text occupies at its current anchor.
    pub fn rectangle(&self) -> Rectangle {
        Rectangle::new(self.x, self.y - self.height(), self.x + self.width(), self.y)
    }
}

/// A way name drawn along a straight segment, oriented so that `x1 <= x2`
/// to keep the text upright.
#[derive(Debug, Clone)]
pub struct WayTextContainer {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub text: String,
    pub paint: Paint,
}

impl WayTextContainer {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, text: impl Into<String>, paint: Paint) -> Self {
        debug_assert!(x1 <= x2);
        Self {
            x1,
            y1,
            x2,
            y2,
            text: text.into(),
            paint,
        }
    }
}

/// The geometry a paint applies to.
#[derive(Debug, Clone)]
pub enum ShapeContainer {
    /// Coordinate blocks shared with the render context.
    Polyline(Arc<Vec<Vec<Point>>>),
    Circle { center: Point, radius: f32 },
}

/// One paint applied to one shape, bucketed by layer and level.
#[derive(Debug, Clone)]
pub struct ShapePaintContainer {
    pub shape: ShapeContainer,
    pub paint: Paint,
}

impl ShapePaintContainer {
    pub fn new(shape: ShapeContainer, paint: Paint) -> Self {
        Self { shape, paint }
    }
}
