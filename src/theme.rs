//! The seam towards the render theme: the rule tree that decides which
//! paints, captions and symbols a map feature gets.

use std::sync::Arc;

use crate::geometry::{Point, Tag};
use crate::graphics::{Bitmap, Color, Paint};

/// Per-feature state the renderer exposes to the theme while matching. The
/// theme hands it back through the [`RenderCallback`] methods it decides to
/// invoke.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// The drawing layer of the feature, already clamped to the valid range.
    pub layer: usize,

    /// Position of the matched point of interest in the tile's pixel frame.
    /// `None` while a way is being matched.
    pub poi_position: Option<Point>,

    /// Coordinate blocks of the matched way in the tile's pixel frame.
    /// Empty while a point of interest is being matched.
    pub coordinates: Arc<Vec<Vec<Point>>>,
}

/// What the theme calls back into while it matches a feature against its
/// rule tree. Implemented by the tile renderer.
pub trait RenderCallback {
    fn render_area(&mut self, context: &RenderContext, fill: &Paint, stroke: &Paint, level: usize);

    fn render_area_caption(
        &mut self,
        context: &RenderContext,
        caption: &str,
        vertical_offset: f32,
        fill: &Paint,
        stroke: Option<&Paint>,
    );

    fn render_area_symbol(&mut self, context: &RenderContext, symbol: &Arc<Bitmap>);

    fn render_point_of_interest_caption(
        &mut self,
        context: &RenderContext,
        caption: &str,
        vertical_offset: f32,
        fill: &Paint,
        stroke: Option<&Paint>,
    );

    fn render_point_of_interest_circle(
        &mut self,
        context: &RenderContext,
        radius: f32,
        fill: &Paint,
        stroke: &Paint,
        level: usize,
    );

    fn render_point_of_interest_symbol(&mut self, context: &RenderContext, symbol: &Arc<Bitmap>);

    fn render_way(&mut self, context: &RenderContext, stroke: &Paint, level: usize);

    fn render_way_symbol(
        &mut self,
        context: &RenderContext,
        symbol: &Arc<Bitmap>,
        align_center: bool,
        repeat: bool,
    );

    fn render_way_text(
        &mut self,
        context: &RenderContext,
        text: &str,
        fill: &Paint,
        stroke: Option<&Paint>,
    );
}

/// A loaded styling theme. Matching walks the rule tree and emits paint
/// calls through the [`RenderCallback`].
///
/// Scaling methods take `&self`; themes that cache derived paints handle
/// their own interior mutability, since one theme instance is shared
/// between jobs.
pub trait RenderTheme: Send + Sync {
    /// Number of drawing levels the theme declares per layer.
    fn levels(&self) -> usize;

    fn map_background(&self) -> Color;

    /// Multiply all stroke widths with the factor, relative to their
    /// unscaled values.
    fn scale_stroke_width(&self, factor: f32);

    /// Multiply all text sizes with the factor, relative to their unscaled
    /// values.
    fn scale_text_size(&self, factor: f32);

    fn match_node(
        &self,
        callback: &mut dyn RenderCallback,
        context: &RenderContext,
        tags: &[Tag],
        zoom_level: u8,
    );

    fn match_linear_way(
        &self,
        callback: &mut dyn RenderCallback,
        context: &RenderContext,
        tags: &[Tag],
        zoom_level: u8,
    );

    fn match_closed_way(
        &self,
        callback: &mut dyn RenderCallback,
        context: &RenderContext,
        tags: &[Tag],
        zoom_level: u8,
    );
}
