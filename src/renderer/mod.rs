//! The per-tile rendering pipeline: read geometry, match it against the
//! theme, place labels, rasterize.

pub mod containers;
mod dependency_cache;
mod job;
mod label_placement;

use std::mem;
use std::sync::Arc;

pub use dependency_cache::SpillRouting;
pub use job::{InvalidJob, RendererJob};
pub use label_placement::LabelPlacement;

use containers::{
    PointTextContainer, ShapeContainer, ShapePaintContainer, SymbolContainer, WayTextContainer,
};

use crate::geometry::{LatLong, Point, Tag};
use crate::graphics::{Bitmap, Canvas, Paint};
use crate::mapfile::{MapDataSource, MapFileError};
use crate::mercator::project_to_tile;
use crate::theme::{RenderCallback, RenderContext, RenderTheme};
use crate::tile::TILE_SIZE;

/// Number of drawing layers a tile distinguishes; shape layers outside the
/// range are clamped.
pub const LAYERS: usize = 11;

const DEFAULT_START_ZOOM_LEVEL: u8 = 12;

/// Stroke widths grow by this factor per zoom level beyond
/// [`STROKE_MIN_ZOOM_LEVEL`].
const STROKE_INCREASE: f64 = 1.5;
const STROKE_MIN_ZOOM_LEVEL: u8 = 12;

/// Pixels along a way before the first symbol and behind any segment end.
const SEGMENT_SAFETY_DISTANCE: f64 = 30.0;

/// Minimum distance in pixels before a way symbol is repeated.
const DISTANCE_BETWEEN_SYMBOLS: f64 = 200.0;

/// Minimum distance in pixels before a way name is repeated.
const DISTANCE_BETWEEN_WAY_NAMES: f64 = 500.0;

fn valid_layer(layer: i8) -> usize {
    layer.clamp(0, LAYERS as i8 - 1) as usize
}

fn is_closed_way(coordinates: &[Point]) -> bool {
    coordinates.first() == coordinates.last()
}

/// The closed ring covering the whole tile, used for water tiles.
fn water_tile_coordinates() -> Vec<Point> {
    let tile_size = TILE_SIZE as f64;
    vec![
        Point::new(0.0, 0.0),
        Point::new(tile_size, 0.0),
        Point::new(tile_size, tile_size),
        Point::new(0.0, tile_size),
        Point::new(0.0, 0.0),
    ]
}

/// Renders map tiles from the geometry of a [`MapDataSource`].
///
/// The renderer keeps its shape buckets between jobs and clears them in
/// place, so one instance should serve one rendering worker for its whole
/// lifetime.
pub struct TileRenderer {
    data_source: Box<dyn MapDataSource>,
    canvas: Box<dyn Canvas>,
    label_placement: LabelPlacement,

    /// Shape buckets, indexed by layer, then by theme level.
    ways: Vec<Vec<Vec<ShapePaintContainer>>>,
    way_names: Vec<WayTextContainer>,
    nodes: Vec<PointTextContainer>,
    area_labels: Vec<PointTextContainer>,
    way_symbols: Vec<Arc<SymbolContainer>>,
    point_symbols: Vec<Arc<SymbolContainer>>,

    previous_theme: Option<Arc<dyn RenderTheme>>,
    previous_zoom_level: Option<u8>,
    previous_text_scale: Option<f32>,
}

impl TileRenderer {
    pub fn new(data_source: Box<dyn MapDataSource>, canvas: Box<dyn Canvas>) -> Self {
        Self::with_spill_routing(data_source, canvas, SpillRouting::default())
    }

    pub fn with_spill_routing(
        data_source: Box<dyn MapDataSource>,
        canvas: Box<dyn Canvas>,
        spill_routing: SpillRouting,
    ) -> Self {
        Self {
            data_source,
            canvas,
            label_placement: LabelPlacement::with_spill_routing(spill_routing),
            ways: Vec::new(),
            way_names: Vec::new(),
            nodes: Vec::new(),
            area_labels: Vec::new(),
            way_symbols: Vec::new(),
            point_symbols: Vec::new(),
            previous_theme: None,
            previous_zoom_level: None,
            previous_text_scale: None,
        }
    }

    /// Render one tile. An empty read result produces a background-only
    /// bitmap; a failing read discards the job.
    pub fn execute_job(
        &mut self,
        job: &RendererJob,
        theme: &Arc<dyn RenderTheme>,
    ) -> Result<Bitmap, MapFileError> {
        let theme_changed = !self
            .previous_theme
            .as_ref()
            .is_some_and(|previous| Arc::ptr_eq(previous, theme));
        if theme_changed {
            let levels = theme.levels();
            self.ways = (0..LAYERS)
                .map(|_| (0..levels).map(|_| Vec::new()).collect())
                .collect();
            self.previous_theme = Some(Arc::clone(theme));
            self.previous_zoom_level = None;
        }

        let zoom_level = job.tile.zoom;
        if self.previous_zoom_level != Some(zoom_level) {
            let zoom_level_diff = (zoom_level as i32 - STROKE_MIN_ZOOM_LEVEL as i32).max(0);
            theme.scale_stroke_width(STROKE_INCREASE.powi(zoom_level_diff) as f32);
            self.previous_zoom_level = Some(zoom_level);
        }

        if self.previous_text_scale.map(f32::to_bits) != Some(job.text_scale.to_bits()) {
            theme.scale_text_size(job.text_scale);
            self.previous_text_scale = Some(job.text_scale);
        }

        let read_result = self.data_source.read_map_data(job.tile)?;

        for point_of_interest in &read_result.point_of_interests {
            let context = RenderContext {
                layer: valid_layer(point_of_interest.layer),
                poi_position: Some(project_to_tile(point_of_interest.position, job.tile)),
                coordinates: Arc::new(Vec::new()),
            };
            theme.match_node(self, &context, &point_of_interest.tags, zoom_level);
        }

        for way in &read_result.ways {
            let coordinates: Arc<Vec<Vec<Point>>> = Arc::new(
                way.lat_longs
                    .iter()
                    .map(|block| {
                        block
                            .iter()
                            .map(|position| project_to_tile(*position, job.tile))
                            .collect()
                    })
                    .collect(),
            );
            let Some(outline) = coordinates.first() else {
                continue;
            };
            if outline.is_empty() {
                continue;
            }
            let closed = is_closed_way(outline);

            let context = RenderContext {
                layer: valid_layer(way.layer),
                poi_position: None,
                coordinates: Arc::clone(&coordinates),
            };
            if closed {
                theme.match_closed_way(self, &context, &way.tags, zoom_level);
            } else {
                theme.match_linear_way(self, &context, &way.tags, zoom_level);
            }
        }

        if read_result.is_water {
            let context = RenderContext {
                layer: 0,
                poi_position: None,
                coordinates: Arc::new(vec![water_tile_coordinates()]),
            };
            theme.match_closed_way(
                self,
                &context,
                &[Tag::new("natural", "water")],
                zoom_level,
            );
        }

        self.nodes = self.label_placement.place_labels(
            mem::take(&mut self.nodes),
            &mut self.point_symbols,
            &mut self.area_labels,
            job.tile,
        );

        let mut bitmap = Bitmap::new(TILE_SIZE, TILE_SIZE);
        self.draw(&mut bitmap, theme);
        self.clear_lists();

        Ok(bitmap)
    }

    /// The start position declared by the map file, or the center of its
    /// bounding box.
    pub fn start_position(&self) -> Option<LatLong> {
        let info = self.data_source.map_file_info()?;
        Some(
            info.start_position
                .unwrap_or_else(|| info.bounding_box.center()),
        )
    }

    pub fn start_zoom_level(&self) -> u8 {
        self.data_source
            .map_file_info()
            .and_then(|info| info.start_zoom_level)
            .unwrap_or(DEFAULT_START_ZOOM_LEVEL)
    }

    /// Fixed z-order: background, ways by layer and level, way symbols,
    /// point symbols, way names, captions, area captions.
    fn draw(&mut self, bitmap: &mut Bitmap, theme: &Arc<dyn RenderTheme>) {
        let Self {
            canvas,
            ways,
            way_names,
            nodes,
            area_labels,
            way_symbols,
            point_symbols,
            ..
        } = self;

        canvas.fill(bitmap, theme.map_background());

        for layer in ways.iter() {
            for level in layer.iter() {
                for shape_paint in level {
                    match &shape_paint.shape {
                        ShapeContainer::Polyline(coordinates) => {
                            canvas.draw_polyline(bitmap, coordinates.as_slice(), &shape_paint.paint)
                        }
                        ShapeContainer::Circle { center, radius } => {
                            canvas.draw_circle(bitmap, *center, *radius, &shape_paint.paint)
                        }
                    }
                }
            }
        }

        for symbol in way_symbols.iter().chain(point_symbols.iter()) {
            canvas.draw_symbol(
                bitmap,
                &symbol.symbol,
                symbol.point,
                symbol.theta,
                symbol.align_center,
            );
        }

        for way_name in way_names.iter() {
            canvas.draw_text_along(
                bitmap,
                &way_name.text,
                Point::new(way_name.x1, way_name.y1),
                Point::new(way_name.x2, way_name.y2),
                &way_name.paint,
            );
        }

        for label in nodes.iter().chain(area_labels.iter()) {
            let anchor = Point::new(label.x, label.y);
            if let Some(paint_back) = &label.paint_back {
                canvas.draw_text(bitmap, &label.text, anchor, paint_back);
            }
            canvas.draw_text(bitmap, &label.text, anchor, &label.paint_front);
        }
    }

    /// Buckets and lists are reused across jobs by clearing in place.
    fn clear_lists(&mut self) {
        for layer in &mut self.ways {
            for level in layer {
                level.clear();
            }
        }
        self.way_names.clear();
        self.nodes.clear();
        self.area_labels.clear();
        self.way_symbols.clear();
        self.point_symbols.clear();
    }

    fn push_shape(&mut self, context: &RenderContext, level: usize, paint: &Paint) {
        let shape = ShapeContainer::Polyline(Arc::clone(&context.coordinates));
        if let Some(bucket) = self
            .ways
            .get_mut(context.layer)
            .and_then(|layer| layer.get_mut(level))
        {
            bucket.push(ShapePaintContainer::new(shape, paint.clone()));
        } else {
            log::warn!("no drawing bucket for layer {} level {}", context.layer, level);
        }
    }

    /// Center of the minimum bounding rectangle of the outline.
    fn outline_center(context: &RenderContext) -> Option<Point> {
        let outline = context.coordinates.first()?;
        let first = outline.first()?;

        let mut x_min = first.x();
        let mut x_max = first.x();
        let mut y_min = first.y();
        let mut y_max = first.y();
        for point in &outline[1..] {
            x_min = x_min.min(point.x());
            x_max = x_max.max(point.x());
            y_min = y_min.min(point.y());
            y_max = y_max.max(point.y());
        }

        Some(Point::new((x_min + x_max) / 2.0, (y_min + y_max) / 2.0))
    }

    fn caption(&self, text: &str, x: f64, y: f64, fill: &Paint, stroke: Option<&Paint>) -> PointTextContainer {
        PointTextContainer::new(
            text,
            x,
            y,
            fill.clone(),
            stroke.cloned(),
            self.canvas.text_width(text, fill),
            self.canvas.text_height(fill),
        )
    }
}

impl RenderCallback for TileRenderer {
    fn render_area(&mut self, context: &RenderContext, fill: &Paint, stroke: &Paint, level: usize) {
        self.push_shape(context, level, fill);
        self.push_shape(context, level, stroke);
    }

    fn render_area_caption(
        &mut self,
        context: &RenderContext,
        caption: &str,
        vertical_offset: f32,
        fill: &Paint,
        stroke: Option<&Paint>,
    ) {
        let Some(center) = Self::outline_center(context) else {
            return;
        };
        let label = self.caption(
            caption,
            center.x(),
            center.y() + vertical_offset as f64,
            fill,
            stroke,
        );
        self.area_labels.push(label);
    }

    fn render_area_symbol(&mut self, context: &RenderContext, symbol: &Arc<Bitmap>) {
        let Some(center) = Self::outline_center(context) else {
            return;
        };
        let shifted = Point::new(
            center.x() - symbol.width() as f64 / 2.0,
            center.y() - symbol.height() as f64 / 2.0,
        );
        self.point_symbols
            .push(Arc::new(SymbolContainer::new(Arc::clone(symbol), shifted)));
    }

    fn render_point_of_interest_caption(
        &mut self,
        context: &RenderContext,
        caption: &str,
        vertical_offset: f32,
        fill: &Paint,
        stroke: Option<&Paint>,
    ) {
        let Some(position) = context.poi_position else {
            return;
        };
        let mut label = self.caption(
            caption,
            position.x(),
            position.y() + vertical_offset as f64,
            fill,
            stroke,
        );
        // Tie the caption to the symbol placed for the same POI, if any, so
        // the label placement can position it around the symbol.
        if let Some(symbol) = self.point_symbols.last() {
            let expected = Point::new(
                position.x() - symbol.width() / 2.0,
                position.y() - symbol.height() / 2.0,
            );
            if symbol.point == expected {
                label = label.with_symbol(Arc::clone(symbol));
            }
        }
        self.nodes.push(label);
    }

    fn render_point_of_interest_circle(
        &mut self,
        context: &RenderContext,
        radius: f32,
        fill: &Paint,
        stroke: &Paint,
        level: usize,
    ) {
        let Some(position) = context.poi_position else {
            return;
        };
        for paint in [fill, stroke] {
            if let Some(bucket) = self
                .ways
                .get_mut(context.layer)
                .and_then(|layer| layer.get_mut(level))
            {
                bucket.push(ShapePaintContainer::new(
                    ShapeContainer::Circle {
                        center: position,
                        radius,
                    },
                    paint.clone(),
                ));
            }
        }
    }

    fn render_point_of_interest_symbol(&mut self, context: &RenderContext, symbol: &Arc<Bitmap>) {
        let Some(position) = context.poi_position else {
            return;
        };
        let shifted = Point::new(
            position.x() - symbol.width() as f64 / 2.0,
            position.y() - symbol.height() as f64 / 2.0,
        );
        self.point_symbols
            .push(Arc::new(SymbolContainer::new(Arc::clone(symbol), shifted)));
    }

    fn render_way(&mut self, context: &RenderContext, stroke: &Paint, level: usize) {
        self.push_shape(context, level, stroke);
    }

    fn render_way_symbol(
        &mut self,
        context: &RenderContext,
        symbol: &Arc<Bitmap>,
        align_center: bool,
        repeat: bool,
    ) {
        let Some(coordinates) = context.coordinates.first() else {
            return;
        };
        let Some(first) = coordinates.first() else {
            return;
        };

        let mut skip_pixels = SEGMENT_SAFETY_DISTANCE;
        let mut previous_x = first.x();
        let mut previous_y = first.y();

        for current in &coordinates[1..] {
            let current_x = current.x();
            let current_y = current.y();

            let mut diff_x = current_x - previous_x;
            let mut diff_y = current_y - previous_y;
            let mut segment_length_remaining = (diff_x * diff_x + diff_y * diff_y).sqrt();

            while segment_length_remaining - skip_pixels > SEGMENT_SAFETY_DISTANCE {
                let segment_skip_percentage = skip_pixels / segment_length_remaining;

                previous_x += diff_x * segment_skip_percentage;
                previous_y += diff_y * segment_skip_percentage;
                let theta = (current_y - previous_y).atan2(current_x - previous_x) as f32;

                self.way_symbols.push(Arc::new(SymbolContainer::rotated(
                    Arc::clone(symbol),
                    Point::new(previous_x, previous_y),
                    align_center,
                    theta,
                )));

                if !repeat {
                    return;
                }

                diff_x = current_x - previous_x;
                diff_y = current_y - previous_y;
                segment_length_remaining -= skip_pixels;
                skip_pixels = DISTANCE_BETWEEN_SYMBOLS;
            }

            skip_pixels = (skip_pixels - segment_length_remaining).max(SEGMENT_SAFETY_DISTANCE);

            previous_x = current_x;
            previous_y = current_y;
        }
    }

    fn render_way_text(
        &mut self,
        context: &RenderContext,
        text: &str,
        fill: &Paint,
        stroke: Option<&Paint>,
    ) {
        let Some(coordinates) = context.coordinates.first() else {
            return;
        };
        let Some(first) = coordinates.first() else {
            return;
        };

        // The name length plus some margin of safety.
        let way_name_width = self.canvas.text_width(text, fill) + 10.0;

        let mut skip_pixels = 0.0;
        let mut previous_x = first.x();
        let mut previous_y = first.y();

        for current in &coordinates[1..] {
            let current_x = current.x();
            let current_y = current.y();

            let diff_x = current_x - previous_x;
            let diff_y = current_y - previous_y;
            let segment_length = (diff_x * diff_x + diff_y * diff_y).sqrt();

            if skip_pixels > 0.0 {
                skip_pixels -= segment_length;
            } else if segment_length > way_name_width {
                // Order the segment left to right to keep the name upright.
                let (x1, y1, x2, y2) = if previous_x <= current_x {
                    (previous_x, previous_y, current_x, current_y)
                } else {
                    (current_x, current_y, previous_x, previous_y)
                };

                self.way_names
                    .push(WayTextContainer::new(x1, y1, x2, y2, text, fill.clone()));
                if let Some(stroke) = stroke {
                    self.way_names
                        .push(WayTextContainer::new(x1, y1, x2, y2, text, stroke.clone()));
                }

                skip_pixels = DISTANCE_BETWEEN_WAY_NAMES;
            }

            previous_x = current_x;
            previous_y = current_y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::geometry::{lat_lon, BoundingBox};
    use crate::graphics::{Color, NoopCanvas};
    use crate::mapfile::{MapFileInfo, MapReadResult, PointOfInterest, Way};
    use crate::tile::Tile;

    fn tile() -> Tile {
        Tile {
            x: 550,
            y: 335,
            zoom: 10,
        }
    }

    fn job() -> RendererJob {
        RendererJob::new(tile(), "test.map", 1.0).unwrap()
    }

    /// Data source with canned results.
    struct FixedData {
        result: MapReadResult,
        info: Option<MapFileInfo>,
    }

    impl FixedData {
        fn empty() -> Self {
            Self {
                result: MapReadResult::default(),
                info: None,
            }
        }
    }

    impl MapDataSource for FixedData {
        fn read_map_data(&mut self, _tile: Tile) -> Result<MapReadResult, MapFileError> {
            Ok(self.result.clone())
        }

        fn map_file_info(&self) -> Option<&MapFileInfo> {
            self.info.as_ref()
        }
    }

    /// Theme that paints every way and captions every named POI, and keeps
    /// a record of the scale calls it received.
    #[derive(Default)]
    struct TestTheme {
        stroke_scales: Mutex<Vec<f32>>,
        text_scales: Mutex<Vec<f32>>,
    }

    impl RenderTheme for TestTheme {
        fn levels(&self) -> usize {
            2
        }

        fn map_background(&self) -> Color {
            Color::WHITE
        }

        fn scale_stroke_width(&self, factor: f32) {
            self.stroke_scales.lock().unwrap().push(factor);
        }

        fn scale_text_size(&self, factor: f32) {
            self.text_scales.lock().unwrap().push(factor);
        }

        fn match_node(
            &self,
            callback: &mut dyn RenderCallback,
            context: &RenderContext,
            tags: &[Tag],
            _zoom_level: u8,
        ) {
            if let Some(name) = tags.iter().find(|tag| tag.key == "name") {
                callback.render_point_of_interest_caption(
                    context,
                    &name.value,
                    0.0,
                    &Paint::default(),
                    None,
                );
            }
        }

        fn match_linear_way(
            &self,
            callback: &mut dyn RenderCallback,
            context: &RenderContext,
            _tags: &[Tag],
            _zoom_level: u8,
        ) {
            callback.render_way(context, &Paint::default(), 0);
        }

        fn match_closed_way(
            &self,
            callback: &mut dyn RenderCallback,
            context: &RenderContext,
            tags: &[Tag],
            _zoom_level: u8,
        ) {
            callback.render_area(context, &Paint::default(), &Paint::default(), 1);
            if tags.iter().any(|tag| tag.key == "name") {
                callback.render_area_caption(context, "area", 0.0, &Paint::default(), None);
            }
        }
    }

    /// Canvas that counts what it is asked to draw.
    #[derive(Default)]
    struct CountingCanvas {
        fills: Mutex<Vec<Color>>,
        polylines: Mutex<usize>,
        texts: Mutex<Vec<String>>,
    }

    struct SharedCanvas(Arc<CountingCanvas>);

    impl Canvas for SharedCanvas {
        fn fill(&mut self, _target: &mut Bitmap, color: Color) {
            self.0.fills.lock().unwrap().push(color);
        }

        fn draw_polyline(
            &mut self,
            _target: &mut Bitmap,
            _coordinates: &[Vec<Point>],
            _paint: &Paint,
        ) {
            *self.0.polylines.lock().unwrap() += 1;
        }

        fn draw_circle(&mut self, _target: &mut Bitmap, _center: Point, _radius: f32, _paint: &Paint) {
        }

        fn draw_symbol(
            &mut self,
            _target: &mut Bitmap,
            _symbol: &Bitmap,
            _point: Point,
            _theta: f32,
            _align_center: bool,
        ) {
        }

        fn draw_text(&mut self, _target: &mut Bitmap, text: &str, _anchor: Point, _paint: &Paint) {
            self.0.texts.lock().unwrap().push(text.to_owned());
        }

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
            text.chars().count() as f64 * paint.text_size as f64 * 0.6
        }

        fn text_height(&self, paint: &Paint) -> f64 {
            paint.text_size as f64
        }
    }

    fn theme() -> Arc<dyn RenderTheme> {
        Arc::new(TestTheme::default())
    }

    #[test]
    fn empty_result_renders_the_background_only() {
        let counting = Arc::new(CountingCanvas::default());
        let mut renderer = TileRenderer::new(
            Box::new(FixedData::empty()),
            Box::new(SharedCanvas(Arc::clone(&counting))),
        );

        let bitmap = renderer.execute_job(&job(), &theme()).unwrap();

        assert_eq!(TILE_SIZE, bitmap.width());
        assert_eq!(TILE_SIZE, bitmap.height());
        assert_eq!(vec![Color::WHITE], *counting.fills.lock().unwrap());
        assert_eq!(0, *counting.polylines.lock().unwrap());
    }

    #[test]
    fn water_tiles_are_filled_as_one_big_area() {
        let mut data = FixedData::empty();
        data.result.is_water = true;

        let counting = Arc::new(CountingCanvas::default());
        let mut renderer = TileRenderer::new(
            Box::new(data),
            Box::new(SharedCanvas(Arc::clone(&counting))),
        );
        renderer.execute_job(&job(), &theme()).unwrap();

        // One fill and one stroke polyline for the water area.
        assert_eq!(2, *counting.polylines.lock().unwrap());
    }

    #[test]
    fn stroke_widths_rescale_with_the_zoom_level() {
        let mut renderer =
            TileRenderer::new(Box::new(FixedData::empty()), Box::new(NoopCanvas::default()));
        let theme: Arc<TestTheme> = Arc::new(TestTheme::default());
        let theme_handle: Arc<dyn RenderTheme> = Arc::clone(&theme) as Arc<dyn RenderTheme>;

        for zoom in [10u8, 14, 14] {
            let tile = Tile {
                x: 0,
                y: 0,
                zoom,
            };
            let job = RendererJob::new(tile, "test.map", 1.0).unwrap();
            renderer.execute_job(&job, &theme_handle).unwrap();
        }

        // Zoom 10 is below the scaling threshold, zoom 14 is two levels
        // above it; the repeated zoom does not rescale again.
        let scales = theme.stroke_scales.lock().unwrap();
        assert_eq!(2, scales.len());
        approx::assert_relative_eq!(scales[0], 1.0);
        approx::assert_relative_eq!(scales[1], 2.25);
    }

    #[test]
    fn text_scale_propagates_once_per_change() {
        let mut renderer =
            TileRenderer::new(Box::new(FixedData::empty()), Box::new(NoopCanvas::default()));
        let theme: Arc<TestTheme> = Arc::new(TestTheme::default());
        let theme_handle: Arc<dyn RenderTheme> = Arc::clone(&theme) as Arc<dyn RenderTheme>;

        for text_scale in [1.0f32, 1.0, 2.0] {
            let job = RendererJob::new(tile(), "test.map", text_scale).unwrap();
            renderer.execute_job(&job, &theme_handle).unwrap();
        }

        assert_eq!(vec![1.0, 2.0], *theme.text_scales.lock().unwrap());
    }

    #[test]
    fn poi_captions_end_up_on_the_tile() {
        let mut data = FixedData::empty();
        // A POI in the middle of the rendered tile.
        let tile = tile();
        data.result.point_of_interests.push(PointOfInterest {
            layer: 0,
            tags: vec![Tag::new("name", "Cafe")],
            position: center_of(tile),
        });

        let counting = Arc::new(CountingCanvas::default());
        let mut renderer = TileRenderer::new(
            Box::new(data),
            Box::new(SharedCanvas(Arc::clone(&counting))),
        );
        renderer.execute_job(&job(), &theme()).unwrap();

        assert!(counting
            .texts
            .lock()
            .unwrap()
            .iter()
            .any(|text| text == "Cafe"));
    }

    #[test]
    fn ways_are_bucketed_and_drawn() {
        let tile = tile();
        let mut data = FixedData::empty();
        data.result.ways.push(Way {
            layer: 5,
            tags: Vec::new(),
            lat_longs: vec![vec![center_of(tile), nudged(center_of(tile), 0.01)]],
        });
        // An absurd layer index clamps instead of panicking.
        data.result.ways.push(Way {
            layer: i8::MAX,
            tags: Vec::new(),
            lat_longs: vec![vec![center_of(tile), nudged(center_of(tile), 0.02)]],
        });

        let counting = Arc::new(CountingCanvas::default());
        let mut renderer = TileRenderer::new(
            Box::new(data),
            Box::new(SharedCanvas(Arc::clone(&counting))),
        );
        renderer.execute_job(&job(), &theme()).unwrap();

        assert_eq!(2, *counting.polylines.lock().unwrap());
    }

    #[test]
    fn way_symbols_repeat_along_the_way() {
        let mut renderer =
            TileRenderer::new(Box::new(FixedData::empty()), Box::new(NoopCanvas::default()));

        let context = RenderContext {
            layer: 0,
            poi_position: None,
            coordinates: Arc::new(vec![vec![
                Point::new(0.0, 128.0),
                Point::new(500.0, 128.0),
            ]]),
        };
        let symbol = Arc::new(Bitmap::new(8, 8));
        renderer.render_way_symbol(&context, &symbol, true, true);

        let positions: Vec<f64> = renderer
            .way_symbols
            .iter()
            .map(|symbol| symbol.point.x())
            .collect();
        assert_eq!(vec![30.0, 230.0, 430.0], positions);

        // Without repetition only the first emission happens.
        renderer.way_symbols.clear();
        renderer.render_way_symbol(&context, &symbol, true, false);
        assert_eq!(1, renderer.way_symbols.len());
    }

    #[test]
    fn way_names_keep_left_to_right_orientation() {
        let mut renderer =
            TileRenderer::new(Box::new(FixedData::empty()), Box::new(NoopCanvas::default()));

        // The way runs right to left; the stored segment must not.
        let context = RenderContext {
            layer: 0,
            poi_position: None,
            coordinates: Arc::new(vec![vec![
                Point::new(200.0, 10.0),
                Point::new(0.0, 12.0),
            ]]),
        };
        renderer.render_way_text(&context, "Main Street", &Paint::default(), None);

        assert_eq!(1, renderer.way_names.len());
        let way_name = &renderer.way_names[0];
        assert!(way_name.x1 <= way_name.x2);
        approx::assert_relative_eq!(way_name.x1, 0.0);
        approx::assert_relative_eq!(way_name.x2, 200.0);
    }

    #[test]
    fn short_segments_get_no_way_name() {
        let mut renderer =
            TileRenderer::new(Box::new(FixedData::empty()), Box::new(NoopCanvas::default()));

        let context = RenderContext {
            layer: 0,
            poi_position: None,
            coordinates: Arc::new(vec![vec![Point::new(0.0, 10.0), Point::new(40.0, 10.0)]]),
        };
        renderer.render_way_text(&context, "Main Street", &Paint::default(), None);

        assert!(renderer.way_names.is_empty());
    }

    #[test]
    fn start_position_falls_back_to_the_bounding_box_center() {
        let mut data = FixedData::empty();
        data.info = Some(MapFileInfo {
            bounding_box: BoundingBox::new(50.0, 10.0, 54.0, 14.0).unwrap(),
            comment: None,
            created_by: None,
            debug_file: false,
            file_size: 100,
            file_version: 3,
            flags: 0,
            language_preference: None,
            map_date: 0,
            number_of_sub_files: 1,
            poi_tags: Vec::new(),
            projection_name: "Mercator".into(),
            start_position: None,
            start_zoom_level: None,
            tile_pixel_size: 256,
            way_tags: Vec::new(),
        });

        let renderer = TileRenderer::new(Box::new(data), Box::new(NoopCanvas::default()));
        assert_eq!(Some(lat_lon(52.0, 12.0)), renderer.start_position());
        assert_eq!(12, renderer.start_zoom_level());
    }

    /// The geographical center of the tile.
    fn center_of(tile: Tile) -> LatLong {
        use crate::mercator::{pixel_x_to_longitude, pixel_y_to_latitude};

        let origin = tile.origin();
        let half = TILE_SIZE as f64 / 2.0;
        lat_lon(
            pixel_y_to_latitude(origin.y() + half, tile.zoom),
            pixel_x_to_longitude(origin.x() + half, tile.zoom),
        )
    }

    fn nudged(position: LatLong, degrees: f64) -> LatLong {
        lat_lon(position.y(), position.x() + degrees)
    }
}
