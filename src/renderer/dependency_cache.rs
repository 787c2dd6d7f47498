//! Cross-tile label and symbol state.
//!
//! Tiles are rendered one at a time, but captions and symbols regularly
//! hang over a tile's edges. The dependency cache remembers, per tile, what
//! has already been committed near its seams: a tile that is rendered later
//! must neither paint over a neighbor that is already on screen nor repeat
//! a caption the neighbor already carries. One cache instance serves one
//! render session and is discarded with it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::geometry::{Point, Rectangle};
use crate::graphics::{Bitmap, Paint};
use crate::renderer::containers::{PointTextContainer, SymbolContainer};
use crate::renderer::label_placement::ReferencePosition;
use crate::tile::{Tile, TILE_SIZE};

/// Inflation of recorded rectangles when testing against new candidates.
const RECORDED_ITEM_DISTANCE: f64 = 2.0;

/// How a caption whose symbol (not the caption itself) crosses the lower or
/// horizontal tile edges is anchored in the receiving neighbor.
///
/// The historic behavior translated those anchors in the wrong direction,
/// duplicating the caption visibly offset by a whole tile. [`Corrected`]
/// mirrors the anchor properly; [`Legacy`] reproduces the old routing for
/// comparison against renderings made with it.
///
/// [`Corrected`]: SpillRouting::Corrected
/// [`Legacy`]: SpillRouting::Legacy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpillRouting {
    #[default]
    Corrected,
    Legacy,
}

/// A caption shared between the records of every tile it touches.
/// Duplicate suppression compares text and paints, not identity.
#[derive(Debug)]
pub(crate) struct DependencyLabel {
    pub text: String,
    pub paint_front: Paint,
    pub paint_back: Option<Paint>,
    pub boundary: Rectangle,
}

/// One item anchored at a tile-local point.
#[derive(Debug)]
struct Dependency<T> {
    point: Point,
    value: T,
}

/// Everything recorded for one tile so far.
#[derive(Debug, Default)]
struct DependencyOnTile {
    /// Set once placement for the tile has finished.
    drawn: bool,
    labels: Vec<Dependency<Arc<DependencyLabel>>>,
    symbols: Vec<Dependency<Arc<Bitmap>>>,
}

#[derive(Debug, Clone, Copy, Default)]
struct DrawnEdges {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

/// See the module documentation. Not thread-safe; owned by the rendering
/// worker it serves.
#[derive(Debug, Default)]
pub(crate) struct DependencyCache {
    dependency_table: HashMap<Tile, DependencyOnTile>,
    current_tile: Option<Tile>,
    spill_routing: SpillRouting,
}

impl DependencyCache {
    pub fn new(spill_routing: SpillRouting) -> Self {
        Self {
            spill_routing,
            ..Default::default()
        }
    }

    /// Scope all following operations to `tile`, creating empty records for
    /// it and its eight neighbors. Neighbors beyond the world bounds get no
    /// record and count as not drawn.
    pub fn set_current_tile(&mut self, tile: Tile) {
        self.current_tile = Some(tile);

        self.dependency_table.entry(tile).or_default();
        for neighbor in [
            tile.north(),
            tile.south(),
            tile.west(),
            tile.east(),
            tile.north_west(),
            tile.north_east(),
            tile.south_west(),
            tile.south_east(),
        ]
        .into_iter()
        .flatten()
        {
            self.dependency_table.entry(neighbor).or_default();
        }
    }

    pub fn is_drawn(&self, tile: Tile) -> bool {
        self.dependency_table
            .get(&tile)
            .is_some_and(|entry| entry.drawn)
    }

    /// Drop labels whose rectangle crosses an edge towards a neighbor that
    /// is already drawn.
    pub fn remove_labels_crossing_drawn_edges(&self, labels: &mut Vec<PointTextContainer>) {
        let tile_size = TILE_SIZE as f64;
        let edges = self.drawn_edges();

        labels.retain(|label| {
            !(edges.up && label.y - label.height() < 0.0
                || edges.down && label.y > tile_size
                || edges.left && label.x < 0.0
                || edges.right && label.x + label.width() > tile_size)
        });
    }

    /// Drop symbols whose rectangle crosses an edge towards a neighbor that
    /// is already drawn.
    pub fn remove_symbols_crossing_drawn_edges(&self, symbols: &mut Vec<Arc<SymbolContainer>>) {
        let tile_size = TILE_SIZE as f64;
        let edges = self.drawn_edges();

        symbols.retain(|symbol| {
            !(edges.up && symbol.point.y() < 0.0
                || edges.down && symbol.point.y() + symbol.height() > tile_size
                || edges.left && symbol.point.x() < 0.0
                || edges.right && symbol.point.x() + symbol.width() > tile_size)
        });
    }

    /// Drop everything that collides with what is already recorded for the
    /// current tile. Labels are also dropped when a recorded label carries
    /// the same text and paints, so a caption does not repeat across a seam.
    pub fn remove_overlapping_with_recorded(
        &self,
        labels: &mut Vec<PointTextContainer>,
        area_labels: &mut Vec<PointTextContainer>,
        symbols: &mut Vec<Arc<SymbolContainer>>,
    ) {
        let Some(entry) = self.current_entry() else {
            return;
        };

        if !entry.labels.is_empty() {
            labels.retain(|label| {
                !entry.labels.iter().any(|recorded| {
                    recorded.value.text == label.text
                        && recorded.value.paint_front == label.paint_front
                        && recorded.value.paint_back == label.paint_back
                        || recorded_label_rectangle(recorded).intersects(&label.rectangle())
                })
            });
            symbols.retain(|symbol| {
                !entry
                    .labels
                    .iter()
                    .any(|recorded| recorded_label_rectangle(recorded).intersects(&symbol.rectangle()))
            });
            area_labels.retain(|label| {
                !entry
                    .labels
                    .iter()
                    .any(|recorded| recorded_label_rectangle(recorded).intersects(&label.rectangle()))
            });
        }

        if !entry.symbols.is_empty() {
            symbols.retain(|symbol| {
                !entry.symbols.iter().any(|recorded| {
                    recorded_symbol_rectangle(recorded)
                        .inflate(RECORDED_ITEM_DISTANCE)
                        .intersects(&symbol.rectangle())
                })
            });
            area_labels.retain(|label| {
                !entry
                    .symbols
                    .iter()
                    .any(|recorded| recorded_symbol_rectangle(recorded).intersects(&label.rectangle()))
            });
        }
    }

    /// Nullify candidate positions that would reach into an already drawn
    /// neighbor.
    pub fn clear_reference_points_crossing_drawn_edges(
        &self,
        reference_positions: &mut [Option<ReferencePosition>],
    ) {
        let tile_size = TILE_SIZE as f64;
        let edges = self.drawn_edges();

        for slot in reference_positions.iter_mut() {
            let Some(reference) = slot else { continue };
            if edges.up && reference.y - reference.height < 0.0
                || edges.down && reference.y >= tile_size
                || edges.left && reference.x < 0.0
                || edges.right && reference.x + reference.width > tile_size
            {
                *slot = None;
            }
        }
    }

    /// Nullify candidate positions that collide with recorded labels or
    /// symbols.
    pub fn clear_reference_points_overlapping_recorded(
        &self,
        reference_positions: &mut [Option<ReferencePosition>],
    ) {
        let Some(entry) = self.current_entry() else {
            return;
        };

        for recorded in &entry.labels {
            let rectangle = recorded_label_rectangle(recorded).inflate(RECORDED_ITEM_DISTANCE);
            for slot in reference_positions.iter_mut() {
                if let Some(reference) = slot {
                    if reference.rectangle().intersects(&rectangle) {
                        *slot = None;
                    }
                }
            }
        }

        for recorded in &entry.symbols {
            let rectangle = recorded_symbol_rectangle(recorded);
            for slot in reference_positions.iter_mut() {
                if let Some(reference) = slot {
                    if reference.rectangle().intersects(&rectangle) {
                        *slot = None;
                    }
                }
            }
        }
    }

    /// Commit the accepted items: mark the current tile drawn, record every
    /// item that spills over a seam in the neighbor it spills into, and
    /// hand back what neighbors spilled into this tile earlier so it gets
    /// rasterized here as well.
    pub fn record(
        &mut self,
        labels: &mut Vec<PointTextContainer>,
        symbols: &mut Vec<Arc<SymbolContainer>>,
        area_labels: &mut [PointTextContainer],
    ) {
        let Some(current) = self.current_tile else {
            return;
        };

        let (existing_labels, existing_symbols) = {
            let entry = self.dependency_table.entry(current).or_default();
            entry.drawn = true;
            (entry.labels.len(), entry.symbols.len())
        };

        if !labels.is_empty() || !symbols.is_empty() || !area_labels.is_empty() {
            self.fill_label_spills(current, labels);
            self.fill_label_spills(current, area_labels);
            self.fill_symbol_spills(current, symbols);
        }

        let entry = &self.dependency_table[&current];
        for dependency in &entry.labels[..existing_labels] {
            labels.push(PointTextContainer::new(
                dependency.value.text.clone(),
                dependency.point.x(),
                dependency.point.y(),
                dependency.value.paint_front.clone(),
                dependency.value.paint_back.clone(),
                dependency.value.boundary.width(),
                dependency.value.boundary.height(),
            ));
        }
        for dependency in &entry.symbols[..existing_symbols] {
            symbols.push(Arc::new(SymbolContainer::new(
                Arc::clone(&dependency.value),
                dependency.point,
            )));
        }
    }

    fn current_entry(&self) -> Option<&DependencyOnTile> {
        self.dependency_table.get(&self.current_tile?)
    }

    /// Which of the four axial neighbors of the current tile are already
    /// drawn. Neighbors beyond the world bounds count as not drawn.
    fn drawn_edges(&self) -> DrawnEdges {
        let Some(current) = self.current_tile else {
            return DrawnEdges::default();
        };

        DrawnEdges {
            up: self.neighbor_drawn(current.north()),
            down: self.neighbor_drawn(current.south()),
            left: self.neighbor_drawn(current.west()),
            right: self.neighbor_drawn(current.east()),
        }
    }

    fn neighbor_drawn(&self, tile: Option<Tile>) -> bool {
        tile.is_some_and(|tile| self.is_drawn(tile))
    }

    /// An in-world neighbor that still accepts spilled entries.
    fn spill_target(&self, tile: Option<Tile>) -> Option<Tile> {
        tile.filter(|tile| !self.is_drawn(*tile))
    }

    /// Lazily share one [`DependencyLabel`] per source label, adding it to
    /// the current tile's record exactly once no matter how many neighbors
    /// it spills into.
    fn shared_label(
        &mut self,
        shared: &mut Option<Arc<DependencyLabel>>,
        label: &PointTextContainer,
        current: Tile,
    ) -> Arc<DependencyLabel> {
        if let Some(value) = shared {
            return Arc::clone(value);
        }

        let value = Arc::new(DependencyLabel {
            text: label.text.clone(),
            paint_front: label.paint_front.clone(),
            paint_back: label.paint_back.clone(),
            boundary: label.boundary,
        });
        self.push_label(current, &value, Point::new(label.x, label.y));
        *shared = Some(Arc::clone(&value));
        value
    }

    fn push_label(&mut self, tile: Tile, value: &Arc<DependencyLabel>, point: Point) {
        self.dependency_table
            .entry(tile)
            .or_default()
            .labels
            .push(Dependency {
                point,
                value: Arc::clone(value),
            });
    }

    fn push_symbol(&mut self, tile: Tile, value: &Arc<Bitmap>, point: Point) {
        self.dependency_table
            .entry(tile)
            .or_default()
            .symbols
            .push(Dependency {
                point,
                value: Arc::clone(value),
            });
    }

    fn fill_label_spills(&mut self, current: Tile, labels: &[PointTextContainer]) {
        let tile_size = TILE_SIZE as f64;

        for label in labels {
            let mut shared = None;

            let spills_up = label.y - label.height() < 0.0;
            let spills_down = label.y > tile_size;
            let spills_left = label.x < 0.0;
            let spills_right = label.x + label.width() > tile_size;

            if spills_up {
                if let Some(up) = self.spill_target(current.north()) {
                    let value = self.shared_label(&mut shared, label, current);
                    self.push_label(up, &value, Point::new(label.x, label.y + tile_size));

                    if spills_left {
                        if let Some(corner) = self.spill_target(current.north_west()) {
                            self.push_label(
                                corner,
                                &value,
                                Point::new(label.x + tile_size, label.y + tile_size),
                            );
                        }
                    }
                    if spills_right {
                        if let Some(corner) = self.spill_target(current.north_east()) {
                            self.push_label(
                                corner,
                                &value,
                                Point::new(label.x - tile_size, label.y + tile_size),
                            );
                        }
                    }
                }
            }

            if spills_down {
                if let Some(down) = self.spill_target(current.south()) {
                    let value = self.shared_label(&mut shared, label, current);
                    self.push_label(down, &value, Point::new(label.x, label.y - tile_size));

                    if spills_left {
                        if let Some(corner) = self.spill_target(current.south_west()) {
                            self.push_label(
                                corner,
                                &value,
                                Point::new(label.x + tile_size, label.y - tile_size),
                            );
                        }
                    }
                    if spills_right {
                        if let Some(corner) = self.spill_target(current.south_east()) {
                            self.push_label(
                                corner,
                                &value,
                                Point::new(label.x - tile_size, label.y - tile_size),
                            );
                        }
                    }
                }
            }

            if spills_left {
                if let Some(left) = self.spill_target(current.west()) {
                    let value = self.shared_label(&mut shared, label, current);
                    self.push_label(left, &value, Point::new(label.x + tile_size, label.y));
                }
            }

            if spills_right {
                if let Some(right) = self.spill_target(current.east()) {
                    let value = self.shared_label(&mut shared, label, current);
                    self.push_label(right, &value, Point::new(label.x - tile_size, label.y));
                }
            }

            // A caption that stays inside the tile still crosses a seam when
            // the symbol it belongs to does.
            if shared.is_none() {
                if let Some(symbol) = label.symbol.clone() {
                    self.fill_symbol_carried_label_spills(current, label, symbol.as_ref(), &mut shared);
                }
            }
        }
    }

    fn fill_symbol_carried_label_spills(
        &mut self,
        current: Tile,
        label: &PointTextContainer,
        symbol: &SymbolContainer,
        shared: &mut Option<Arc<DependencyLabel>>,
    ) {
        let tile_size = TILE_SIZE as f64;
        let symbol_spills_left = symbol.point.x() < 0.0;
        let symbol_spills_right = symbol.point.x() + symbol.width() > tile_size;

        if symbol.point.y() <= 0.0 {
            if let Some(up) = self.spill_target(current.north()) {
                let value = self.shared_label(shared, label, current);
                self.push_label(up, &value, Point::new(label.x, label.y + tile_size));

                if symbol_spills_left {
                    if let Some(corner) = self.spill_target(current.north_west()) {
                        self.push_label(
                            corner,
                            &value,
                            Point::new(label.x + tile_size, label.y + tile_size),
                        );
                    }
                }
                if symbol_spills_right {
                    if let Some(corner) = self.spill_target(current.north_east()) {
                        self.push_label(
                            corner,
                            &value,
                            Point::new(label.x - tile_size, label.y + tile_size),
                        );
                    }
                }
            }
        }

        if symbol.point.y() + symbol.height() >= tile_size {
            if let Some(down) = self.spill_target(current.south()) {
                let value = self.shared_label(shared, label, current);
                let anchor = match self.spill_routing {
                    SpillRouting::Corrected => Point::new(label.x, label.y - tile_size),
                    SpillRouting::Legacy => Point::new(label.x, label.y + tile_size),
                };
                self.push_label(down, &value, anchor);

                if symbol_spills_left {
                    if let Some(corner) = self.spill_target(current.south_west()) {
                        self.push_label(
                            corner,
                            &value,
                            Point::new(label.x + tile_size, label.y - tile_size),
                        );
                    }
                }
                if symbol_spills_right {
                    if let Some(corner) = self.spill_target(current.south_east()) {
                        self.push_label(
                            corner,
                            &value,
                            Point::new(label.x - tile_size, label.y - tile_size),
                        );
                    }
                }
            }
        }

        if symbol.point.x() <= 0.0 {
            if let Some(left) = self.spill_target(current.west()) {
                let value = self.shared_label(shared, label, current);
                let anchor = match self.spill_routing {
                    SpillRouting::Corrected => Point::new(label.x + tile_size, label.y),
                    SpillRouting::Legacy => Point::new(label.x - tile_size, label.y),
                };
                self.push_label(left, &value, anchor);
            }
        }

        if symbol.point.x() + symbol.width() >= tile_size {
            if let Some(right) = self.spill_target(current.east()) {
                let value = self.shared_label(shared, label, current);
                let anchor = match self.spill_routing {
                    SpillRouting::Corrected => Point::new(label.x - tile_size, label.y),
                    SpillRouting::Legacy => Point::new(label.x + tile_size, label.y),
                };
                self.push_label(right, &value, anchor);
            }
        }
    }

    fn fill_symbol_spills(&mut self, current: Tile, symbols: &[Arc<SymbolContainer>]) {
        let tile_size = TILE_SIZE as f64;

        for symbol in symbols {
            let mut shared: Option<Arc<Bitmap>> = None;
            let point = symbol.point;

            let spills_up = point.y() < 0.0;
            let spills_down = point.y() + symbol.height() > tile_size;
            let spills_left = point.x() < 0.0;
            let spills_right = point.x() + symbol.width() > tile_size;

            let shared_symbol = |cache: &mut Self, shared: &mut Option<Arc<Bitmap>>| {
                if let Some(value) = shared {
                    return Arc::clone(value);
                }
                let value = Arc::clone(&symbol.symbol);
                cache.push_symbol(current, &value, point);
                *shared = Some(Arc::clone(&value));
                value
            };

            if spills_up {
                if let Some(up) = self.spill_target(current.north()) {
                    let value = shared_symbol(self, &mut shared);
                    self.push_symbol(up, &value, Point::new(point.x(), point.y() + tile_size));

                    if spills_left {
                        if let Some(corner) = self.spill_target(current.north_west()) {
                            self.push_symbol(
                                corner,
                                &value,
                                Point::new(point.x() + tile_size, point.y() + tile_size),
                            );
                        }
                    }
                    if spills_right {
                        if let Some(corner) = self.spill_target(current.north_east()) {
                            self.push_symbol(
                                corner,
                                &value,
                                Point::new(point.x() - tile_size, point.y() + tile_size),
                            );
                        }
                    }
                }
            }

            if spills_down {
                if let Some(down) = self.spill_target(current.south()) {
                    let value = shared_symbol(self, &mut shared);
                    self.push_symbol(down, &value, Point::new(point.x(), point.y() - tile_size));

                    if spills_left {
                        if let Some(corner) = self.spill_target(current.south_west()) {
                            self.push_symbol(
                                corner,
                                &value,
                                Point::new(point.x() + tile_size, point.y() - tile_size),
                            );
                        }
                    }
                    if spills_right {
                        if let Some(corner) = self.spill_target(current.south_east()) {
                            self.push_symbol(
                                corner,
                                &value,
                                Point::new(point.x() - tile_size, point.y() - tile_size),
                            );
                        }
                    }
                }
            }

            if spills_left {
                if let Some(left) = self.spill_target(current.west()) {
                    let value = shared_symbol(self, &mut shared);
                    self.push_symbol(left, &value, Point::new(point.x() + tile_size, point.y()));
                }
            }

            if spills_right {
                if let Some(right) = self.spill_target(current.east()) {
                    let value = shared_symbol(self, &mut shared);
                    self.push_symbol(right, &value, Point::new(point.x() - tile_size, point.y()));
                }
            }
        }
    }
}

/// The rectangle a recorded label occupies; its anchor is the baseline.
fn recorded_label_rectangle(recorded: &Dependency<Arc<DependencyLabel>>) -> Rectangle {
    Rectangle::new(
        recorded.point.x(),
        recorded.point.y() - recorded.value.boundary.height(),
        recorded.point.x() + recorded.value.boundary.width(),
        recorded.point.y(),
    )
}

fn recorded_symbol_rectangle(recorded: &Dependency<Arc<Bitmap>>) -> Rectangle {
    Rectangle::new(
        recorded.point.x(),
        recorded.point.y(),
        recorded.point.x() + recorded.value.width() as f64,
        recorded.point.y() + recorded.value.height() as f64,
    )
}
