//! The seam towards the rasterization back end. Cartile decides *what* to
//! draw; a [`Canvas`] implementation decides how pixels, strokes and glyphs
//! actually come to be.

use std::io::Cursor;

use image::{ImageError, ImageFormat, RgbaImage};

use crate::geometry::Point;

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Whether a paint fills the interior of a shape or strokes its outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaintStyle {
    #[default]
    Fill,
    Stroke,
}

/// Describes how a shape or a text is drawn. The render theme produces
/// paints, the [`Canvas`] interprets them.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub style: PaintStyle,
    pub stroke_width: f32,
    pub text_size: f32,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            style: PaintStyle::Fill,
            stroke_width: 1.0,
            text_size: 12.0,
        }
    }
}

/// An owned raster image, used both for the rendered tiles and for the
/// symbols a theme hands out.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    image: RgbaImage,
}

impl Bitmap {
    /// A transparent bitmap of the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        Ok(Self {
            image: image::load_from_memory(bytes)?.to_rgba8(),
        })
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, ImageError> {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(self.image.clone())
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }
}

/// Rasterization primitives the tile renderer draws with.
///
/// Implementations own path stroking, glyph shaping and anti-aliasing;
/// cartile only sequences the calls and guarantees that everything it asks
/// for lies in the tile's local pixel frame.
pub trait Canvas: Send {
    /// Flood the whole bitmap with one color.
    fn fill(&mut self, target: &mut Bitmap, color: Color);

    /// Stroke or fill a polyline made of one or more coordinate blocks.
    fn draw_polyline(&mut self, target: &mut Bitmap, coordinates: &[Vec<Point>], paint: &Paint);

    fn draw_circle(&mut self, target: &mut Bitmap, center: Point, radius: f32, paint: &Paint);

    /// Blit a symbol bitmap. `theta` is the rotation in radians;
    /// `align_center` centers the symbol on `point` instead of using it as
    /// the upper-left corner.
    fn draw_symbol(
        &mut self,
        target: &mut Bitmap,
        symbol: &Bitmap,
        point: Point,
        theta: f32,
        align_center: bool,
    );

    /// Draw text with its baseline starting at `anchor`.
    fn draw_text(&mut self, target: &mut Bitmap, text: &str, anchor: Point, paint: &Paint);

    /// Draw text along the straight segment from `start` to `end`.
    fn draw_text_along(
        &mut self,
        target: &mut Bitmap,
        text: &str,
        start: Point,
        end: Point,
        paint: &Paint,
    );

    /// Advance width of the text under the paint, in pixels.
    fn text_width(&self, text: &str, paint: &Paint) -> f64;

    /// Line height of the paint's font, in pixels.
    fn text_height(&self, paint: &Paint) -> f64;
}

/// A canvas implementation that draws nothing. Use this when only the
/// placement results are of interest, for instance in tests or benchmarks.
#[derive(Debug, Clone, Default)]
pub struct NoopCanvas {}

impl Canvas for NoopCanvas {
    fn fill(&mut self, _target: &mut Bitmap, _color: Color) {}

    fn draw_polyline(&mut self, _target: &mut Bitmap, _coordinates: &[Vec<Point>], _paint: &Paint) {
    }

    fn draw_circle(&mut self, _target: &mut Bitmap, _center: Point, _radius: f32, _paint: &Paint) {}

    fn draw_symbol(
        &mut self,
        _target: &mut Bitmap,
        _symbol: &Bitmap,
        _point: Point,
        _theta: f32,
        _align_center: bool,
    ) {
    }

    fn draw_text(&mut self, _target: &mut Bitmap, _text: &str, _anchor: Point, _paint: &Paint) {}

    fn draw_text_along(
        &mut self,
        _target: &mut Bitmap,
        _text: &str,
        _start: Point,
        _end: Point,
        _paint: &Paint,
    ) {
    }

    fn text_width(&self, text: &str, paint: &Paint) -> f64 {
        // A crude monospace estimate keeps way-name repetition deterministic.
        text.chars().count() as f64 * paint.text_size as f64 * 0.6
    }

    fn text_height(&self, paint: &Paint) -> f64 {
        paint.text_size as f64
    }
}
