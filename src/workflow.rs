//! The `Workflow` facade the host shell talks to.
//!
//! It owns the viewport, the graph store, the execution overlay, node hover
//! state and the minimap cache, and keeps them consistent with each other:
//! deleting a node prunes its status and hover state, loading a graph resets
//! the run session, and status events for unknown nodes never reach the overlay.

use crate::catalog::{self, TemplateKind};
use crate::graph::{GraphError, NodeGraphStore};
use crate::minimap::{MinimapCache, MinimapProjection};
use crate::render::{node_render_props, HostRequest, NodeInteractions, NodePointerEvent, NodeRenderProps};
use crate::status::{ExecutionOverlay, ExecutionStatus, StatusEvent};
use crate::types::{GraphDocument, Node, NodeId, NodeSpec};
use crate::viewport::{CanvasDimensions, Point, ViewportState};
use std::sync::mpsc::Receiver;

/// Canvas state shared by the renderer, the minimap and the host.
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    viewport: ViewportState,
    dimensions: CanvasDimensions,
    store: NodeGraphStore,
    overlay: ExecutionOverlay,
    interactions: NodeInteractions,
    minimap: MinimapCache,
}

impl Workflow {
    /// Creates an empty workflow with the default viewport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a workflow from a node list. Fails on the first invalid spec.
    pub fn from_specs(specs: impl IntoIterator<Item = NodeSpec>) -> Result<Self, GraphError> {
        let mut workflow = Self::new();
        for spec in specs {
            workflow.store.add_node(spec)?;
        }
        Ok(workflow)
    }

    /// Seeds a workflow from a document with connections.
    pub fn from_document(doc: &GraphDocument) -> Result<Self, GraphError> {
        Ok(Self {
            store: NodeGraphStore::from_document(doc)?,
            ..Self::default()
        })
    }

    /// Replaces the graph with `doc`, keeping the viewport.
    ///
    /// Selection, hover and every execution status are reset. On error the
    /// current graph is left untouched.
    pub fn load_document(&mut self, doc: &GraphDocument) -> Result<(), GraphError> {
        let store = NodeGraphStore::from_document(doc)?;
        log::info!(
            "loaded graph with {} nodes and {} connections",
            store.len(),
            store.connections().len()
        );
        self.store = store;
        self.overlay.clear();
        self.interactions = NodeInteractions::new();
        self.minimap.invalidate();
        Ok(())
    }

    /// Replaces the graph with a fresh copy of a built-in template.
    pub fn load_template(&mut self, kind: TemplateKind) -> Result<(), GraphError> {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let doc = catalog::build_template(kind, &suffix[..8]);
        self.load_document(&doc)
    }

    /// Exports nodes and connections.
    pub fn to_document(&self) -> GraphDocument {
        self.store.to_document()
    }

    /// Read access to the graph.
    pub fn store(&self) -> &NodeGraphStore {
        &self.store
    }

    /// Read access to the execution overlay.
    pub fn overlay(&self) -> &ExecutionOverlay {
        &self.overlay
    }

    /// Current viewport.
    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    /// Replaces the viewport, e.g. when restoring saved settings.
    pub fn set_viewport(&mut self, viewport: ViewportState) {
        self.viewport = viewport;
    }

    /// Current canvas size in screen pixels.
    pub fn dimensions(&self) -> CanvasDimensions {
        self.dimensions
    }

    /// Updates the canvas size reported by the host layout.
    pub fn set_dimensions(&mut self, dimensions: CanvasDimensions) {
        self.dimensions = dimensions;
    }

    /// Node hover state.
    pub fn interactions(&self) -> &NodeInteractions {
        &self.interactions
    }

    // Viewport

    /// Pans by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.viewport.pan_by(dx, dy);
    }

    /// Zooms by `factor` keeping the world point under `anchor` in place.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        self.viewport.zoom_at(anchor, factor);
    }

    // Graph

    /// Adds a node.
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<&Node, GraphError> {
        self.store.add_node(spec)
    }

    /// Moves a node.
    pub fn move_node(&mut self, id: &str, x: f64, y: f64) -> Result<(), GraphError> {
        self.store.move_node(id, x, y)
    }

    /// Upserts one config entry of a node.
    pub fn update_config(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), GraphError> {
        self.store.update_config(id, key, value)
    }

    /// Removes one config entry of a node.
    pub fn remove_config(&mut self, id: &str, key: &str) -> Result<Option<serde_json::Value>, GraphError> {
        self.store.remove_config(id, key)
    }

    /// Renames a node.
    pub fn set_label(&mut self, id: &str, label: impl Into<String>) -> Result<(), GraphError> {
        self.store.set_label(id, label)
    }

    /// Connects two nodes.
    pub fn connect(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        self.store.connect(from, to)
    }

    /// Deletes a node and everything keyed by its id.
    ///
    /// A second delete of the same id is a no-op and returns `None`.
    pub fn delete_node(&mut self, id: &str) -> Option<Node> {
        let removed = self.store.delete_node(id);
        self.overlay.remove(id);
        self.interactions.forget(id);
        removed
    }

    /// Selects a node.
    pub fn select(&mut self, id: &str) -> Result<(), GraphError> {
        self.store.select(id)
    }

    /// Clears the selection.
    pub fn deselect(&mut self) {
        self.store.deselect();
    }

    // Execution status

    /// Applies one status event at time `now` (seconds).
    ///
    /// Returns false if the node does not exist; such events are dropped.
    pub fn apply_status(&mut self, event: &StatusEvent, now: f64) -> bool {
        if !self.store.contains(&event.node_id) {
            log::debug!(
                "ignoring {:?} status for unknown node `{}`",
                event.status,
                event.node_id
            );
            return false;
        }
        self.overlay.set_status(&event.node_id, event.status, now);
        true
    }

    /// Applies every pending event from `rx` in arrival order. Returns how many were applied.
    pub fn drain_status_events(&mut self, rx: &Receiver<StatusEvent>, now: f64) -> usize {
        rx.try_iter()
            .filter(|event| self.apply_status(event, now))
            .count()
    }

    /// Current status of a node.
    pub fn status_of(&self, id: &str) -> ExecutionStatus {
        self.overlay.get_status(id)
    }

    /// Ends the run session: every node goes back to idle.
    pub fn end_run(&mut self) {
        log::debug!("ending run session ({} statuses)", self.overlay.len());
        self.overlay.clear();
    }

    /// Returns true while a running-progress animation is moving.
    pub fn is_animating(&self, now: f64) -> bool {
        self.overlay.is_animating(now)
    }

    // Rendering

    /// Render props for `id`, or `None` if the node does not exist.
    pub fn node_props(&self, id: &str, now: f64) -> Option<NodeRenderProps> {
        self.store.get(id).map(|node| self.props_for(node, now))
    }

    /// Render props for every node in paint order.
    pub fn render_props(&self, now: f64) -> Vec<NodeRenderProps> {
        self.store
            .nodes()
            .iter()
            .map(|node| self.props_for(node, now))
            .collect()
    }

    fn props_for(&self, node: &Node, now: f64) -> NodeRenderProps {
        node_render_props(
            node,
            self.store.is_selected(&node.id),
            self.interactions.is_hovered(&node.id),
            self.overlay.get_status(&node.id),
            self.overlay.progress(&node.id, now),
            &self.viewport,
        )
    }

    /// Minimap projection for the current state, recomputed only when an input changed.
    pub fn minimap(&mut self) -> &MinimapProjection {
        self.minimap.get_or_compute(
            self.store.revision(),
            self.store.nodes(),
            self.dimensions,
            &self.viewport,
        )
    }

    /// Topmost node under a screen-space point.
    pub fn node_at_screen(&self, screen: Point) -> Option<&Node> {
        self.store.node_at(self.viewport.screen_to_world(screen))
    }

    /// Feeds one pointer event to a node.
    ///
    /// Delete requests are carried out here; configure requests are returned
    /// for the host to open its configuration UI. A repeated delete click on a
    /// node that is already gone returns `Ok(None)`.
    pub fn handle_node_pointer(
        &mut self,
        id: &str,
        event: NodePointerEvent,
    ) -> Result<Option<NodeId>, GraphError> {
        match self.interactions.handle(&mut self.store, id, event)? {
            Some(HostRequest::Delete(id)) => {
                self.delete_node(&id);
                Ok(None)
            }
            Some(HostRequest::Configure(id)) => Ok(Some(id)),
            None => Ok(None),
        }
    }

    /// Moves hover to the node under `screen`, or clears it over empty canvas.
    pub fn hover_at_screen(&mut self, screen: Point) {
        let target = self.node_at_screen(screen).map(|n| n.id.clone());
        if target.as_deref() == self.interactions.hovered() {
            return;
        }
        let previous = self.interactions.hovered().map(str::to_string);
        let transitions = previous
            .map(|id| (id, NodePointerEvent::Leave))
            .into_iter()
            .chain(target.map(|id| (id, NodePointerEvent::Enter)));
        for (id, event) in transitions {
            if let Err(err) = self.interactions.handle(&mut self.store, &id, event) {
                log::warn!("hover {event:?} failed: {err}");
            }
        }
    }

    /// Clears hover, e.g. when the pointer leaves the canvas.
    pub fn clear_hover(&mut self) {
        if let Some(previous) = self.interactions.hovered().map(str::to_string) {
            self.interactions.forget(&previous);
        }
    }

    /// Click on empty canvas.
    pub fn click_background(&mut self) {
        self.interactions.click_background(&mut self.store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::status_channel;
    use serde_json::json;

    fn two_nodes() -> Workflow {
        Workflow::from_specs([
            NodeSpec::new("n1", "openai", 100.0, 100.0),
            NodeSpec::new("n2", "pinecone", 400.0, 100.0),
        ])
        .unwrap()
    }

    #[test]
    fn deleted_node_id_does_not_inherit_status() {
        let mut workflow = two_nodes();
        assert!(workflow.apply_status(&StatusEvent::new("n1", ExecutionStatus::Running), 0.0));
        assert_eq!(workflow.status_of("n1"), ExecutionStatus::Running);

        workflow.delete_node("n1");
        workflow
            .add_node(NodeSpec::new("n1", "openai", 0.0, 0.0))
            .unwrap();
        assert_eq!(workflow.status_of("n1"), ExecutionStatus::Idle);
        assert_eq!(workflow.overlay().progress("n1", 0.5), None);
    }

    #[test]
    fn delete_twice_is_a_no_op() {
        let mut workflow = two_nodes();
        assert!(workflow.delete_node("n1").is_some());
        assert_eq!(workflow.store().len(), 1);
        assert!(workflow.delete_node("n1").is_none());
        assert_eq!(workflow.store().len(), 1);
    }

    #[test]
    fn seeding_surfaces_duplicate_ids() {
        let result = Workflow::from_specs([
            NodeSpec::new("a", "openai", 0.0, 0.0),
            NodeSpec::new("a", "openai", 10.0, 0.0),
        ]);
        assert_eq!(result.err(), Some(GraphError::DuplicateId("a".into())));
    }

    #[test]
    fn status_events_drain_in_order_and_skip_unknown_nodes() {
        let mut workflow = two_nodes();
        let (tx, rx) = status_channel();
        tx.send(StatusEvent::new("n1", ExecutionStatus::Running)).unwrap();
        tx.send(StatusEvent::new("ghost", ExecutionStatus::Error)).unwrap();
        tx.send(StatusEvent::new("n2", ExecutionStatus::Waiting)).unwrap();
        tx.send(StatusEvent::new("n1", ExecutionStatus::Success)).unwrap();

        assert_eq!(workflow.drain_status_events(&rx, 1.0), 3);
        assert_eq!(workflow.status_of("n1"), ExecutionStatus::Success);
        assert_eq!(workflow.status_of("n2"), ExecutionStatus::Waiting);
        assert_eq!(workflow.status_of("ghost"), ExecutionStatus::Idle);
        assert_eq!(workflow.overlay().len(), 2);

        workflow.end_run();
        assert!(workflow.overlay().is_empty());
    }

    #[test]
    fn render_props_reflect_selection_status_and_viewport() {
        let mut workflow = two_nodes();
        workflow.pan_by(50.0, 50.0);
        workflow.zoom_at(Point::new(50.0, 50.0), 2.0);
        workflow.select("n1").unwrap();
        workflow.apply_status(&StatusEvent::new("n2", ExecutionStatus::Running), 0.0);

        let props = workflow.render_props(1.0);
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].screen_rect.min(), Point::new(250.0, 250.0));
        assert!(props[0].shows_affordances());
        assert_eq!(props[1].badge, Some("Executing..."));
        assert_eq!(props[1].progress, Some(0.5));
    }

    #[test]
    fn delete_affordance_deletes_and_prunes() {
        let mut workflow = two_nodes();
        workflow.apply_status(&StatusEvent::new("n1", ExecutionStatus::Error), 0.0);
        workflow.handle_node_pointer("n1", NodePointerEvent::Enter).unwrap();
        assert_eq!(
            workflow
                .handle_node_pointer("n1", NodePointerEvent::DeleteClicked)
                .unwrap(),
            None
        );
        assert!(!workflow.store().contains("n1"));
        assert_eq!(workflow.interactions().hovered(), None);
        assert!(workflow.overlay().is_empty());
    }

    #[test]
    fn second_delete_click_is_a_no_op() {
        let mut workflow = two_nodes();
        workflow.handle_node_pointer("n1", NodePointerEvent::Enter).unwrap();
        assert_eq!(
            workflow.handle_node_pointer("n1", NodePointerEvent::DeleteClicked),
            Ok(None)
        );
        assert_eq!(
            workflow.handle_node_pointer("n1", NodePointerEvent::DeleteClicked),
            Ok(None)
        );
        assert_eq!(
            workflow.handle_node_pointer("n1", NodePointerEvent::Leave),
            Ok(None)
        );
        assert_eq!(workflow.store().len(), 1);
        assert!(workflow.store().contains("n2"));
        assert_eq!(
            workflow.handle_node_pointer("n1", NodePointerEvent::Click),
            Err(GraphError::NotFound("n1".into()))
        );
    }

    #[test]
    fn configure_affordance_is_returned_to_host() {
        let mut workflow = two_nodes();
        workflow.select("n2").unwrap();
        assert_eq!(
            workflow
                .handle_node_pointer("n2", NodePointerEvent::ConfigureClicked)
                .unwrap(),
            Some("n2".to_string())
        );
        assert!(workflow.store().contains("n2"));
    }

    #[test]
    fn hover_follows_pointer() {
        let mut workflow = two_nodes();
        workflow.hover_at_screen(Point::new(150.0, 150.0));
        assert_eq!(workflow.interactions().hovered(), Some("n1"));
        workflow.hover_at_screen(Point::new(450.0, 150.0));
        assert_eq!(workflow.interactions().hovered(), Some("n2"));
        workflow.hover_at_screen(Point::new(-50.0, -50.0));
        assert_eq!(workflow.interactions().hovered(), None);
    }

    #[test]
    fn loading_a_template_resets_the_session() {
        let mut workflow = two_nodes();
        workflow.select("n1").unwrap();
        workflow.apply_status(&StatusEvent::new("n1", ExecutionStatus::Running), 0.0);
        workflow.load_template(TemplateKind::RagPipeline).unwrap();

        assert!(!workflow.store().contains("n1"));
        assert_eq!(workflow.store().selected(), None);
        assert!(workflow.overlay().is_empty());
        assert!(!workflow.store().connections().is_empty());

        // A second load yields fresh ids.
        let first: Vec<_> = workflow.store().nodes().iter().map(|n| n.id.clone()).collect();
        workflow.load_template(TemplateKind::RagPipeline).unwrap();
        assert!(workflow.store().nodes().iter().all(|n| !first.contains(&n.id)));
    }

    #[test]
    fn failed_load_keeps_current_graph() {
        let mut workflow = two_nodes();
        let bad = GraphDocument {
            nodes: vec![NodeSpec::new("x", "openai", 0.0, 0.0)],
            connections: vec![crate::types::Connection::new("x", "missing")],
        };
        assert!(workflow.load_document(&bad).is_err());
        assert_eq!(workflow.store().len(), 2);
    }

    #[test]
    fn minimap_tracks_mutations() {
        let mut workflow = two_nodes();
        workflow.set_dimensions(CanvasDimensions::new(800.0, 600.0));
        let before = workflow.minimap().clone();
        workflow.move_node("n2", 3000.0, 2000.0).unwrap();
        let after = workflow.minimap().clone();
        assert!(after.geometry.scale < before.geometry.scale);
        workflow.update_config("n1", "model", json!("gpt-4")).unwrap();
        assert_eq!(workflow.minimap().nodes.len(), 2);
    }
}
