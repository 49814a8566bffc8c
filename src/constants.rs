//! Shared application-wide constants.
//! Centralizes tweakable values used by the canvas math, the minimap and the egui shell.

// Node dimensions
/// Node width in world units. Fixed for every node.
pub const NODE_WIDTH: f64 = 192.0;
/// Node height in world units. Fixed for every node.
pub const NODE_HEIGHT: f64 = 88.0;
/// Corner radius of a node card (in screen pixels at zoom 1).
pub const NODE_CORNER_RADIUS: f32 = 12.0;

// Zoom
/// Smallest zoom factor the viewport accepts.
pub const ZOOM_MIN: f64 = 0.25;
/// Largest zoom factor the viewport accepts.
pub const ZOOM_MAX: f64 = 5.0;
/// Multiplicative zoom change applied per scroll event.
pub const WHEEL_ZOOM_FACTOR: f64 = 1.1;

// Minimap
/// Minimap width in logical pixels.
pub const MINIMAP_WIDTH: f64 = 220.0;
/// Minimap height in logical pixels.
pub const MINIMAP_HEIGHT: f64 = 160.0;
/// Padding (in world units) added around the union of nodes and viewport.
pub const MINIMAP_PADDING: f64 = 20.0;
/// Distance between the minimap and the bottom-right canvas corner (screen pixels).
pub const MINIMAP_MARGIN: f32 = 20.0;
/// World extent shown by an empty minimap when the canvas has not been measured yet.
pub const EMPTY_WORLD_FALLBACK: (f64, f64) = (1000.0, 800.0);

// Grid/drawing
/// Grid cell size in world units.
pub const GRID_SIZE: f64 = 20.0;

// Execution feedback
/// Duration of the running-status progress bar, in seconds.
pub const RUNNING_PROGRESS_SECONDS: f64 = 2.0;
/// Number of config entries shown on a node card before the overflow counter.
pub const CONFIG_PREVIEW_ENTRIES: usize = 2;

// Canvas interactions
/// Screen distance a primary press must travel before it becomes a drag.
pub const DRAG_THRESHOLD: f32 = 4.0;
/// Seconds between scripted status transitions in the demo run.
pub const DEMO_STEP_SECONDS: f64 = 1.2;
