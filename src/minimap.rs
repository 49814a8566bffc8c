//! Minimap projection.
//!
//! The minimap is a fixed-size thumbnail showing every node plus the current
//! viewport rectangle. Its geometry is a pure function of the nodes, the canvas
//! size and the viewport; [`MinimapCache`] memoizes it against those inputs.

use crate::constants::{
    EMPTY_WORLD_FALLBACK, MINIMAP_HEIGHT, MINIMAP_PADDING, MINIMAP_WIDTH,
};
use crate::types::{ColorToken, Node, NodeId};
use crate::viewport::{BoundingBox, CanvasDimensions, ViewportState};

/// World region shown by the minimap and the world → minimap scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapGeometry {
    /// Padded union of node extent and visible viewport, in world units
    pub bounding_box: BoundingBox,
    /// Minimap pixels per world unit, never above 1
    pub scale: f64,
}

impl MinimapGeometry {
    /// Projects a world-space box into minimap-local pixels.
    pub fn project(&self, world: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: (world.min_x - self.bounding_box.min_x) * self.scale,
            min_y: (world.min_y - self.bounding_box.min_y) * self.scale,
            width: world.width * self.scale,
            height: world.height * self.scale,
        }
    }
}

/// Box covering all nodes, or a canvas-sized region at the origin for an empty graph.
pub fn node_extent(nodes: &[Node], dimensions: CanvasDimensions, zoom: f64) -> BoundingBox {
    let mut boxes = nodes.iter().map(Node::bounds);
    match boxes.next() {
        Some(first) => boxes.fold(first, |acc, b| acc.union(&b)),
        None => {
            let zoom = if zoom > 0.0 { zoom } else { 1.0 };
            let width = if dimensions.width > 0.0 {
                dimensions.width / zoom
            } else {
                EMPTY_WORLD_FALLBACK.0
            };
            let height = if dimensions.height > 0.0 {
                dimensions.height / zoom
            } else {
                EMPTY_WORLD_FALLBACK.1
            };
            BoundingBox {
                min_x: 0.0,
                min_y: 0.0,
                width,
                height,
            }
        }
    }
}

fn fit_scale(extent: f64, available: f64) -> f64 {
    if extent > 0.0 && extent.is_finite() {
        available / extent
    } else {
        1.0
    }
}

/// Computes the minimap's world region and scale.
pub fn compute_geometry(
    nodes: &[Node],
    dimensions: CanvasDimensions,
    viewport: &ViewportState,
) -> MinimapGeometry {
    let extent = node_extent(nodes, dimensions, viewport.zoom());
    let visible = viewport.visible_world_box(dimensions);
    let bounding_box = extent.union(&visible).expand(MINIMAP_PADDING);

    let scale_x = fit_scale(bounding_box.width, MINIMAP_WIDTH);
    let scale_y = fit_scale(bounding_box.height, MINIMAP_HEIGHT);

    MinimapGeometry {
        bounding_box,
        scale: scale_x.min(scale_y).min(1.0),
    }
}

/// A node as drawn on the minimap.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimapNode {
    /// Node id
    pub id: NodeId,
    /// Minimap-local rectangle
    pub rect: BoundingBox,
    /// Fill color
    pub color: ColorToken,
}

/// Everything needed to paint the minimap.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimapProjection {
    /// Region and scale the rest is derived from
    pub geometry: MinimapGeometry,
    /// Nodes in paint order
    pub nodes: Vec<MinimapNode>,
    /// Current viewport, minimap-local
    pub viewport: BoundingBox,
}

/// Projects nodes and the viewport into minimap-local pixel coordinates.
pub fn project(
    nodes: &[Node],
    dimensions: CanvasDimensions,
    viewport: &ViewportState,
) -> MinimapProjection {
    let geometry = compute_geometry(nodes, dimensions, viewport);
    MinimapProjection {
        nodes: nodes
            .iter()
            .map(|node| MinimapNode {
                id: node.id.clone(),
                rect: geometry.project(&node.bounds()),
                color: node.color_token,
            })
            .collect(),
        viewport: geometry.project(&viewport.visible_world_box(dimensions)),
        geometry,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CacheKey {
    revision: u64,
    dimensions: CanvasDimensions,
    viewport: ViewportState,
}

/// Memoized [`project`] keyed on store revision, canvas size and viewport.
#[derive(Debug, Clone, Default)]
pub struct MinimapCache {
    entry: Option<(CacheKey, MinimapProjection)>,
}

impl MinimapCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached projection, recomputing it if any input changed.
    ///
    /// `revision` must change whenever `nodes` changes.
    pub fn get_or_compute(
        &mut self,
        revision: u64,
        nodes: &[Node],
        dimensions: CanvasDimensions,
        viewport: &ViewportState,
    ) -> &MinimapProjection {
        let key = CacheKey {
            revision,
            dimensions,
            viewport: *viewport,
        };
        if !matches!(&self.entry, Some((cached, _)) if *cached == key) {
            self.entry = None;
        }
        let (_, projection) = self
            .entry
            .get_or_insert_with(|| (key, project(nodes, dimensions, viewport)));
        projection
    }

    /// Drops the cached projection.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeGraphStore;
    use crate::types::NodeSpec;
    use crate::viewport::Point;

    fn nodes_at(points: &[(f64, f64)]) -> Vec<Node> {
        let mut store = NodeGraphStore::new();
        for (i, (x, y)) in points.iter().enumerate() {
            store
                .add_node(NodeSpec::new(format!("n{i}"), "openai", *x, *y))
                .unwrap();
        }
        store.nodes().to_vec()
    }

    #[test]
    fn empty_graph_falls_back_to_canvas_region() {
        let extent = node_extent(&[], CanvasDimensions::new(1000.0, 800.0), 1.0);
        assert_eq!(
            extent,
            BoundingBox { min_x: 0.0, min_y: 0.0, width: 1000.0, height: 800.0 }
        );
    }

    #[test]
    fn empty_graph_scales_fallback_by_zoom() {
        let extent = node_extent(&[], CanvasDimensions::new(1000.0, 800.0), 2.0);
        assert_eq!((extent.width, extent.height), (500.0, 400.0));
    }

    #[test]
    fn unmeasured_canvas_uses_default_world() {
        let extent = node_extent(&[], CanvasDimensions::default(), 1.0);
        assert_eq!((extent.width, extent.height), EMPTY_WORLD_FALLBACK);
    }

    #[test]
    fn node_extent_covers_full_node_boxes() {
        let nodes = nodes_at(&[(0.0, 0.0), (1000.0, 800.0)]);
        let extent = node_extent(&nodes, CanvasDimensions::new(10.0, 10.0), 1.0);
        assert_eq!(extent.min(), Point::new(0.0, 0.0));
        assert_eq!(extent.max(), Point::new(1192.0, 888.0));
    }

    #[test]
    fn union_with_small_viewport_matches_expected_scale() {
        let nodes = nodes_at(&[(0.0, 0.0), (1000.0, 800.0)]);
        let geometry = compute_geometry(
            &nodes,
            CanvasDimensions::new(220.0, 160.0),
            &ViewportState::default(),
        );
        let bb = geometry.bounding_box;
        assert_eq!(bb.min(), Point::new(-20.0, -20.0));
        assert_eq!(bb.max(), Point::new(1212.0, 908.0));
        assert_eq!((bb.width, bb.height), (1232.0, 928.0));
        // Height is the tighter fit: 160 / 928 < 220 / 1232.
        let expected = (220.0 / 1232.0_f64).min(160.0 / 928.0).min(1.0);
        assert!((geometry.scale - expected).abs() < 1e-12);
        assert!((geometry.scale - 0.1724).abs() < 1e-4);
    }

    #[test]
    fn viewport_far_from_nodes_is_included() {
        let nodes = nodes_at(&[(0.0, 0.0)]);
        let viewport = ViewportState::new(Point::new(-5000.0, -3000.0), 1.0);
        let dims = CanvasDimensions::new(800.0, 600.0);
        let projection = project(&nodes, dims, &viewport);
        let bb = projection.geometry.bounding_box;
        assert!(bb.contains(Point::new(5000.0, 3000.0)));
        assert!(bb.contains(Point::new(5800.0, 3600.0)));
        assert!(projection.viewport.max_x() <= MINIMAP_WIDTH + 1e-9);
        assert!(projection.viewport.max_y() <= MINIMAP_HEIGHT + 1e-9);
    }

    #[test]
    fn scale_never_magnifies() {
        // A 2x2 world region padded to 42x42 would fit at 3.8x; it is capped at 1.
        let geometry = compute_geometry(
            &[],
            CanvasDimensions::new(10.0, 10.0),
            &ViewportState::new(Point::ZERO, 5.0),
        );
        assert_eq!(geometry.scale, 1.0);

        let nodes = nodes_at(&[(0.0, 0.0)]);

        for (w, h, zoom) in [(1.0, 1.0, 0.25), (4000.0, 3000.0, 1.0), (0.0, 0.0, 2.0)] {
            let g = compute_geometry(&nodes, CanvasDimensions::new(w, h), &ViewportState::new(Point::ZERO, zoom));
            assert!(g.scale <= 1.0 && g.scale > 0.0);
        }
    }

    #[test]
    fn projection_maps_nodes_relative_to_box() {
        let nodes = nodes_at(&[(100.0, 50.0)]);
        let projection = project(&nodes, CanvasDimensions::new(0.0, 0.0), &ViewportState::default());
        let g = projection.geometry;
        let rect = projection.nodes[0].rect;
        assert!((rect.min_x - (100.0 - g.bounding_box.min_x) * g.scale).abs() < 1e-9);
        assert!((rect.width - Node::WIDTH * g.scale).abs() < 1e-9);
        assert!((rect.height - Node::HEIGHT * g.scale).abs() < 1e-9);
        assert_eq!(projection.nodes[0].color, ColorToken::Green);
    }

    #[test]
    fn cache_recomputes_only_when_inputs_change() {
        let nodes = nodes_at(&[(0.0, 0.0)]);
        let dims = CanvasDimensions::new(800.0, 600.0);
        let mut viewport = ViewportState::default();
        let mut cache = MinimapCache::new();

        let first = cache.get_or_compute(1, &nodes, dims, &viewport).clone();
        // Different node list under the same revision: the cached value stands.
        let moved = nodes_at(&[(5000.0, 5000.0)]);
        assert_eq!(cache.get_or_compute(1, &moved, dims, &viewport), &first);

        assert_ne!(cache.get_or_compute(2, &moved, dims, &viewport), &first);

        viewport.pan_by(10.0, 0.0);
        let panned = cache.get_or_compute(2, &moved, dims, &viewport).clone();
        assert_eq!(panned, project(&moved, dims, &viewport));

        // Invalidation forces a recompute even under an unchanged revision.
        cache.invalidate();
        assert_eq!(
            cache.get_or_compute(2, &nodes, dims, &viewport),
            &project(&nodes, dims, &viewport)
        );
    }
}
