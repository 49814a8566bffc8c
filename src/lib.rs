//! # Workflow Canvas
//!
//! An infinite, pannable and zoomable canvas for workflow graphs, with a live
//! minimap and per-node execution status feedback.
//!
//! ## Layers
//! - **Viewport**: world ↔ screen transform with anchor-preserving zoom
//! - **Graph store**: nodes, connections and the single selection
//! - **Execution overlay**: externally reported per-node run status and progress
//! - **Node rendering**: per-node render props and the hover/select state machine
//! - **Minimap**: fixed-size overview of all nodes and the visible viewport
//!
//! The [`Workflow`] facade ties them together; the egui shell in `ui` hosts it.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod animation;
pub mod catalog;
pub mod constants;
pub mod graph;
pub mod minimap;
pub mod render;
pub mod status;
pub mod types;
pub mod viewport;
pub mod workflow;
mod ui;

pub use graph::{GraphError, NodeGraphStore};
pub use status::{status_channel, ExecutionOverlay, ExecutionStatus, StatusEvent};
pub use types::*;
pub use ui::{CanvasSettings, WorkflowApp};
pub use viewport::{BoundingBox, CanvasDimensions, Point, ViewportState};
pub use workflow::Workflow;

/// Runs the workflow canvas application.
///
/// This function opens the native window and starts the event loop. File
/// dialogs are spawned onto the ambient tokio runtime, so call it from inside one.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an `eframe::Error` if
/// initialization fails.
///
/// # Example
///
/// ```no_run
/// #[tokio::main]
/// async fn main() -> Result<(), eframe::Error> {
///     workflow_canvas::run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Workflow Canvas",
        options,
        Box::new(|cc| Ok(Box::new(WorkflowApp::new(cc)))),
    )
}
