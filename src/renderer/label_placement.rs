//! Collision-free placement of captions and symbols on a tile.
//!
//! Candidates around each point of interest are tried above, below, left
//! and right of its symbol and selected greedily with two priority queues
//! sweeping along the y axis. The [`DependencyCache`] keeps the result
//! consistent with what neighboring tiles already show.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use crate::geometry::Rectangle;
use crate::renderer::containers::{PointTextContainer, SymbolContainer};
use crate::renderer::dependency_cache::{DependencyCache, SpillRouting};
use crate::tile::{Tile, TILE_SIZE};

/// Minimum distance between two captions.
const LABEL_DISTANCE_TO_LABEL: f64 = 2.0;

/// Minimum distance between a caption and a symbol.
const LABEL_DISTANCE_TO_SYMBOL: f64 = 2.0;

/// Gap between a symbol and the caption placed next to it.
const START_DISTANCE_TO_SYMBOLS: f64 = 4.0;

/// Minimum distance between two symbols.
const SYMBOL_DISTANCE_TO_SYMBOL: f64 = 2.0;

/// One candidate anchor for a caption. `x`/`y` follow the caption
/// convention: `y` is the baseline, the rectangle extends `height` upwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ReferencePosition {
    pub x: f64,
    pub y: f64,
    /// Which caption the candidate belongs to.
    pub node_index: usize,
    pub width: f64,
    pub height: f64,
}

impl ReferencePosition {
    pub fn rectangle(&self) -> Rectangle {
        Rectangle::new(self.x, self.y - self.height, self.x + self.width, self.y)
    }
}

/// Places the captions of POIs, areas and the point symbols of one tile so
/// that nothing collides, neither within the tile nor across its seams.
pub struct LabelPlacement {
    dependency_cache: DependencyCache,
}

impl Default for LabelPlacement {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelPlacement {
    pub fn new() -> Self {
        Self::with_spill_routing(SpillRouting::default())
    }

    pub fn with_spill_routing(spill_routing: SpillRouting) -> Self {
        Self {
            dependency_cache: DependencyCache::new(spill_routing),
        }
    }

    /// Resolve all collisions between the tile's candidate labels, area
    /// labels and symbols, drop whatever cannot be shown, and commit the
    /// survivors to the cross-tile state. Returns the placed captions;
    /// `symbols` and `area_labels` are filtered in place.
    pub fn place_labels(
        &mut self,
        labels: Vec<PointTextContainer>,
        symbols: &mut Vec<Arc<SymbolContainer>>,
        area_labels: &mut Vec<PointTextContainer>,
        tile: Tile,
    ) -> Vec<PointTextContainer> {
        let mut labels = labels;

        self.dependency_cache.set_current_tile(tile);

        center_labels(area_labels);
        remove_out_of_tile_area_labels(area_labels);
        remove_overlapping_area_labels(area_labels);
        if !area_labels.is_empty() {
            self.dependency_cache
                .remove_labels_crossing_drawn_edges(area_labels);
        }

        remove_out_of_tile_labels(&mut labels);

        remove_out_of_tile_symbols(symbols);
        remove_overlapping_symbols(symbols);
        self.dependency_cache
            .remove_symbols_crossing_drawn_edges(symbols);

        remove_empty_symbol_references(&mut labels, symbols);

        remove_symbols_overlapping_area_labels(symbols, area_labels);

        self.dependency_cache
            .remove_overlapping_with_recorded(&mut labels, area_labels, symbols);

        if !labels.is_empty() {
            labels = self.process_four_point_greedy(&labels, symbols, area_labels);
        }

        self.dependency_cache
            .record(&mut labels, symbols, area_labels);

        labels
    }

    /// Greedy selection over the four-position model: candidates above,
    /// below, left and right of the symbol, or a single centered candidate
    /// for captions without one. Two min-heaps sweep along y; the up-heap
    /// yields the top-most candidate to accept, the down-heap serves the
    /// collision pruning below it.
    fn process_four_point_greedy(
        &self,
        labels: &[PointTextContainer],
        symbols: &[Arc<SymbolContainer>],
        area_labels: &[PointTextContainer],
    ) -> Vec<PointTextContainer> {
        let mut reference_positions: Vec<Option<ReferencePosition>> = vec![None; labels.len() * 4];
        let distance = START_DISTANCE_TO_SYMBOLS;

        for (node_index, label) in labels.iter().enumerate() {
            let (width, height) = (label.width(), label.height());
            if let Some(symbol) = &label.symbol {
                reference_positions[node_index * 4] = Some(ReferencePosition {
                    x: label.x - width / 2.0,
                    y: label.y - symbol.height() / 2.0 - distance,
                    node_index,
                    width,
                    height,
                });
                reference_positions[node_index * 4 + 1] = Some(ReferencePosition {
                    x: label.x - width / 2.0,
                    y: label.y + symbol.height() / 2.0 + height + distance,
                    node_index,
                    width,
                    height,
                });
                reference_positions[node_index * 4 + 2] = Some(ReferencePosition {
                    x: label.x - symbol.width() / 2.0 - width - distance,
                    y: label.y + height / 2.0,
                    node_index,
                    width,
                    height,
                });
                // Nudged slightly upwards so a lone right candidate wins
                // against the left one of the same caption.
                reference_positions[node_index * 4 + 3] = Some(ReferencePosition {
                    x: label.x + symbol.width() / 2.0 + distance,
                    y: label.y + height / 2.0 - 0.1,
                    node_index,
                    width,
                    height,
                });
            } else {
                reference_positions[node_index * 4] = Some(ReferencePosition {
                    x: label.x - width / 2.0,
                    y: label.y,
                    node_index,
                    width,
                    height,
                });
            }
        }

        remove_reference_positions_overlapping_symbols(&mut reference_positions, symbols);
        remove_reference_positions_overlapping_area_labels(&mut reference_positions, area_labels);
        self.dependency_cache
            .clear_reference_points_crossing_drawn_edges(&mut reference_positions);
        self.dependency_cache
            .clear_reference_points_overlapping_recorded(&mut reference_positions);

        // Ascending by top edge; ties resolved by candidate slot, so the
        // selection is deterministic.
        let mut queue_up: BinaryHeap<Reverse<QueueEntry>> = BinaryHeap::new();
        // Ascending by bottom edge.
        let mut queue_down: BinaryHeap<Reverse<QueueEntry>> = BinaryHeap::new();
        let mut removed = vec![false; reference_positions.len()];

        for (slot, reference) in reference_positions.iter().enumerate() {
            if let Some(reference) = reference {
                queue_up.push(Reverse(QueueEntry {
                    key: reference.y - reference.height,
                    slot,
                }));
                queue_down.push(Reverse(QueueEntry {
                    key: reference.y,
                    slot,
                }));
            }
        }

        let mut accepted = Vec::new();

        while let Some(entry) = pop_live(&mut queue_up, &removed) {
            let Some(reference) = reference_positions[entry.slot] else {
                continue;
            };
            let label = &labels[reference.node_index];

            let mut placed = PointTextContainer::new(
                label.text.clone(),
                reference.x,
                reference.y,
                label.paint_front.clone(),
                label.paint_back.clone(),
                reference.width,
                reference.height,
            );
            if let Some(symbol) = &label.symbol {
                placed = placed.with_symbol(Arc::clone(symbol));
            }
            accepted.push(placed);

            // All four candidates of the accepted caption are spent.
            for slot in reference.node_index * 4..reference.node_index * 4 + 4 {
                removed[slot] = true;
            }

            // Everything left of the accepted rectangle's right edge is a
            // collision suspect; check those, keep the rest queued.
            let mut drained = Vec::new();
            while let Some(next) = pop_live(&mut queue_down, &removed) {
                let Some(candidate) = reference_positions[next.slot] else {
                    continue;
                };
                if candidate.x < reference.x + reference.width {
                    drained.push((next, candidate));
                } else {
                    queue_down.push(Reverse(next));
                    break;
                }
            }

            for (next, candidate) in drained {
                let collides = candidate.x <= reference.x + reference.width
                    && candidate.y >= reference.y - candidate.height
                    && candidate.y <= reference.y + candidate.height;
                if collides {
                    removed[next.slot] = true;
                } else {
                    queue_down.push(Reverse(next));
                }
            }
        }

        accepted
    }
}

/// Heap entry ordered by a float key with the slot as deterministic
/// tie-break.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    key: f64,
    slot: usize,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key
            .total_cmp(&other.key)
            .then(self.slot.cmp(&other.slot))
    }
}

/// Pop entries until one is still alive.
fn pop_live(
    queue: &mut BinaryHeap<Reverse<QueueEntry>>,
    removed: &[bool],
) -> Option<QueueEntry> {
    while let Some(Reverse(entry)) = queue.pop() {
        if !removed[entry.slot] {
            return Some(entry);
        }
    }
    None
}

/// Center the captions horizontally around their anchor.
fn center_labels(labels: &mut [PointTextContainer]) {
    for label in labels {
        label.x -= label.width() / 2.0;
    }
}

fn remove_out_of_tile_area_labels(area_labels: &mut Vec<PointTextContainer>) {
    let tile_size = TILE_SIZE as f64;
    area_labels.retain(|label| {
        !(label.x > tile_size
            || label.y - label.height() > tile_size
            || label.x + label.width() < 0.0
            || label.y + label.height() < 0.0)
    });
}

fn remove_out_of_tile_labels(labels: &mut Vec<PointTextContainer>) {
    let tile_size = TILE_SIZE as f64;
    labels.retain(|label| {
        !(label.x - label.width() / 2.0 > tile_size
            || label.y - label.height() > tile_size
            || label.x + label.width() / 2.0 < 0.0
            || label.y < 0.0)
    });
}

fn remove_out_of_tile_symbols(symbols: &mut Vec<Arc<SymbolContainer>>) {
    let tile_size = TILE_SIZE as f64;
    symbols.retain(|symbol| {
        !(symbol.point.x() > tile_size
            || symbol.point.y() > tile_size
            || symbol.point.x() + symbol.width() < 0.0
            || symbol.point.y() + symbol.height() < 0.0)
    });
}

/// Pairwise overlap removal keeping the earlier item. Area label
/// rectangles are compared with a safety margin.
fn remove_overlapping_area_labels(area_labels: &mut Vec<PointTextContainer>) {
    let mut index = 0;
    while index < area_labels.len() {
        let rectangle = area_labels[index]
            .rectangle()
            .inflate(LABEL_DISTANCE_TO_LABEL);
        let mut other = index + 1;
        while other < area_labels.len() {
            if area_labels[other].rectangle().intersects(&rectangle) {
                area_labels.remove(other);
            } else {
                other += 1;
            }
        }
        index += 1;
    }
}

/// Pairwise overlap removal keeping the earlier symbol.
fn remove_overlapping_symbols(symbols: &mut Vec<Arc<SymbolContainer>>) {
    let mut index = 0;
    while index < symbols.len() {
        let rectangle = symbols[index]
            .rectangle()
            .inflate(SYMBOL_DISTANCE_TO_SYMBOL);
        let mut other = index + 1;
        while other < symbols.len() {
            if symbols[other].rectangle().intersects(&rectangle) {
                symbols.remove(other);
            } else {
                other += 1;
            }
        }
        index += 1;
    }
}

/// A caption whose symbol did not survive must not be placed relative to
/// it anymore.
fn remove_empty_symbol_references(
    labels: &mut [PointTextContainer],
    symbols: &[Arc<SymbolContainer>],
) {
    for label in labels {
        let gone = label
            .symbol
            .as_ref()
            .is_some_and(|symbol| !symbols.iter().any(|other| Arc::ptr_eq(other, symbol)));
        if gone {
            label.symbol = None;
        }
    }
}

fn remove_symbols_overlapping_area_labels(
    symbols: &mut Vec<Arc<SymbolContainer>>,
    area_labels: &[PointTextContainer],
) {
    for area_label in area_labels {
        let rectangle = area_label.rectangle().inflate(LABEL_DISTANCE_TO_SYMBOL);
        symbols.retain(|symbol| !symbol.rectangle().intersects(&rectangle));
    }
}

fn remove_reference_positions_overlapping_symbols(
    reference_positions: &mut [Option<ReferencePosition>],
    symbols: &[Arc<SymbolContainer>],
) {
    for symbol in symbols {
        let rectangle = symbol.rectangle().inflate(LABEL_DISTANCE_TO_SYMBOL);
        for slot in reference_positions.iter_mut() {
            if let Some(reference) = slot {
                if reference.rectangle().intersects(&rectangle) {
                    *slot = None;
                }
            }
        }
    }
}

fn remove_reference_positions_overlapping_area_labels(
    reference_positions: &mut [Option<ReferencePosition>],
    area_labels: &[PointTextContainer],
) {
    for area_label in area_labels {
        let rectangle = area_label.rectangle().inflate(LABEL_DISTANCE_TO_LABEL);
        for slot in reference_positions.iter_mut() {
            if let Some(reference) = slot {
                if reference.rectangle().intersects(&rectangle) {
                    *slot = None;
                }
            }
        }
    }
}
