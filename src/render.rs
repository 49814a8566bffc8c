//! Per-node render state and the pointer interaction state machine.
//!
//! [`node_render_props`] turns a node plus its selection, hover and execution
//! status into plain data the painter consumes. [`NodeInteractions`] tracks
//! hover and turns pointer events into store mutations or host requests.

use crate::constants::CONFIG_PREVIEW_ENTRIES;
use crate::graph::{GraphError, NodeGraphStore};
use crate::status::{ExecutionStatus, StatusIcon};
use crate::types::{ColorToken, IconRef, Node, NodeConfig, NodeId};
use crate::viewport::{BoundingBox, ViewportState};

/// Interaction state of a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeVisualState {
    /// Neither hovered nor selected
    Idle,
    /// Pointer is over the node
    Hovered,
    /// Node is the store's selection (takes precedence over hover)
    Selected,
}

impl NodeVisualState {
    /// Derives the state from selection and hover flags.
    pub fn from_flags(is_selected: bool, is_hovered: bool) -> Self {
        match (is_selected, is_hovered) {
            (true, _) => NodeVisualState::Selected,
            (false, true) => NodeVisualState::Hovered,
            (false, false) => NodeVisualState::Idle,
        }
    }

    /// Returns true if the configure and delete affordances are shown.
    pub fn shows_affordances(self) -> bool {
        !matches!(self, NodeVisualState::Idle)
    }
}

/// How a node's border is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderStyle {
    /// Execution status color
    Status(ColorToken),
    /// Selection highlight
    Primary,
    /// Hovered, not selected
    Muted,
    /// Plain border
    Neutral,
}

impl BorderStyle {
    /// Picks the border: a non-idle status wins, otherwise selection then hover.
    pub fn resolve(status: ExecutionStatus, state: NodeVisualState) -> Self {
        match (status.visual().border, state) {
            (Some(color), _) => BorderStyle::Status(color),
            (None, NodeVisualState::Selected) => BorderStyle::Primary,
            (None, NodeVisualState::Hovered) => BorderStyle::Muted,
            (None, NodeVisualState::Idle) => BorderStyle::Neutral,
        }
    }
}

/// The first few config entries of a node, rendered as strings, plus how many
/// were left out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigPreview {
    /// `(key, value)` pairs in insertion order
    pub entries: Vec<(String, String)>,
    /// Entries not shown
    pub overflow: usize,
}

impl ConfigPreview {
    /// Returns true if the node has no config at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.overflow == 0
    }

    /// Text of the overflow indicator, e.g. `+3 more...`.
    pub fn overflow_label(&self) -> Option<String> {
        (self.overflow > 0).then(|| format!("+{} more...", self.overflow))
    }
}

/// Renders a config value for display. Strings are shown without quotes.
pub fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builds the preview of a node's configuration. The config itself is untouched.
pub fn config_preview(config: &NodeConfig) -> ConfigPreview {
    ConfigPreview {
        entries: config
            .iter()
            .take(CONFIG_PREVIEW_ENTRIES)
            .map(|(k, v)| (k.clone(), display_value(v)))
            .collect(),
        overflow: config.len().saturating_sub(CONFIG_PREVIEW_ENTRIES),
    }
}

/// Everything the painter needs to draw one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRenderProps {
    /// Node id
    pub id: NodeId,
    /// Screen-space box of the node
    pub screen_rect: BoundingBox,
    /// Scale applied to text and decorations (the zoom factor)
    pub scale: f64,
    /// Display label
    pub label: String,
    /// Type tag shown under the label
    pub type_label: String,
    /// Header icon
    pub icon: IconRef,
    /// Header icon background
    pub color: ColorToken,
    /// Interaction state
    pub state: NodeVisualState,
    /// Border treatment
    pub border: BorderStyle,
    /// Current execution status
    pub status: ExecutionStatus,
    /// Status icon, if any
    pub status_icon: Option<StatusIcon>,
    /// Status badge text, if any
    pub badge: Option<&'static str>,
    /// Config preview
    pub preview: ConfigPreview,
    /// Running progress in `[0, 1]`, only while running
    pub progress: Option<f64>,
}

impl NodeRenderProps {
    /// Returns true if configure/delete buttons are visible.
    pub fn shows_affordances(&self) -> bool {
        self.state.shows_affordances()
    }
}

/// Derives render props for `node` under `viewport`.
pub fn node_render_props(
    node: &Node,
    is_selected: bool,
    is_hovered: bool,
    status: ExecutionStatus,
    progress: Option<f64>,
    viewport: &ViewportState,
) -> NodeRenderProps {
    let top_left = viewport.world_to_screen(node.position());
    let zoom = viewport.zoom();
    let state = NodeVisualState::from_flags(is_selected, is_hovered);
    let visual = status.visual();
    NodeRenderProps {
        id: node.id.clone(),
        screen_rect: BoundingBox {
            min_x: top_left.x,
            min_y: top_left.y,
            width: Node::WIDTH * zoom,
            height: Node::HEIGHT * zoom,
        },
        scale: zoom,
        label: node.label.clone(),
        type_label: node.node_type.clone(),
        icon: node.icon,
        color: node.color_token,
        state,
        border: BorderStyle::resolve(status, state),
        status,
        status_icon: visual.icon,
        badge: visual.badge,
        preview: config_preview(&node.config),
        progress: if status == ExecutionStatus::Running {
            progress
        } else {
            None
        },
    }
}

/// Pointer input delivered to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePointerEvent {
    /// Pointer entered the node
    Enter,
    /// Pointer left the node
    Leave,
    /// Primary click on the node body
    Click,
    /// Click on the configure affordance
    ConfigureClicked,
    /// Click on the delete affordance
    DeleteClicked,
}

/// What the host must do after a pointer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostRequest {
    /// Open the configuration UI for the node
    Configure(NodeId),
    /// Delete the node (and prune everything keyed by it)
    Delete(NodeId),
}

/// Hover tracking and pointer → action translation for all nodes.
#[derive(Debug, Clone, Default)]
pub struct NodeInteractions {
    hovered: Option<NodeId>,
}

impl NodeInteractions {
    /// Creates an interaction tracker with nothing hovered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Node under the pointer, if any.
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Returns true if `id` is hovered.
    pub fn is_hovered(&self, id: &str) -> bool {
        self.hovered.as_deref() == Some(id)
    }

    /// Current state of `id`.
    pub fn state_of(&self, store: &NodeGraphStore, id: &str) -> NodeVisualState {
        NodeVisualState::from_flags(store.is_selected(id), self.is_hovered(id))
    }

    /// Applies one pointer event.
    ///
    /// Clicks change the store's selection directly; configure and delete are
    /// returned to the caller. Affordance clicks on a node that shows no
    /// affordances are ignored.
    ///
    /// `Leave` and `DeleteClicked` for a node that is already gone are no-ops,
    /// since a second delete click can race the node's teardown. Other events
    /// for a missing node fail with [`GraphError::NotFound`].
    pub fn handle(
        &mut self,
        store: &mut NodeGraphStore,
        id: &str,
        event: NodePointerEvent,
    ) -> Result<Option<HostRequest>, GraphError> {
        if !store.contains(id) {
            return match event {
                NodePointerEvent::Leave | NodePointerEvent::DeleteClicked => {
                    log::debug!("{event:?} on node `{id}` that is already gone");
                    self.forget(id);
                    Ok(None)
                }
                _ => Err(GraphError::NotFound(id.to_string())),
            };
        }
        match event {
            NodePointerEvent::Enter => {
                self.hovered = Some(id.to_string());
                Ok(None)
            }
            NodePointerEvent::Leave => {
                if self.is_hovered(id) {
                    self.hovered = None;
                }
                Ok(None)
            }
            NodePointerEvent::Click => {
                store.select(id)?;
                Ok(None)
            }
            NodePointerEvent::ConfigureClicked | NodePointerEvent::DeleteClicked
                if !self.state_of(store, id).shows_affordances() =>
            {
                log::debug!("ignoring {event:?} on node `{id}` without affordances");
                Ok(None)
            }
            NodePointerEvent::ConfigureClicked => Ok(Some(HostRequest::Configure(id.to_string()))),
            NodePointerEvent::DeleteClicked => Ok(Some(HostRequest::Delete(id.to_string()))),
        }
    }

    /// Click on empty canvas: clears the selection.
    pub fn click_background(&mut self, store: &mut NodeGraphStore) {
        store.deselect();
    }

    /// Forgets hover state for a deleted node.
    pub fn forget(&mut self, id: &str) {
        if self.is_hovered(id) {
            self.hovered = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeSpec;
    use crate::viewport::Point;
    use serde_json::json;

    fn sample_node() -> Node {
        let mut store = NodeGraphStore::new();
        let node = store
            .add_node(
                NodeSpec::new("n1", "openai", 100.0, 100.0)
                    .with_config("model", json!("gpt-4"))
                    .with_config("temperature", json!(0.7))
                    .with_config("max_tokens", json!(1000))
                    .with_config("top_p", json!(1)),
            )
            .unwrap()
            .clone();
        node
    }

    #[test]
    fn preview_shows_first_two_and_overflow() {
        let node = sample_node();
        let preview = config_preview(&node.config);
        assert_eq!(
            preview.entries,
            vec![
                ("model".to_string(), "gpt-4".to_string()),
                ("temperature".to_string(), "0.7".to_string())
            ]
        );
        assert_eq!(preview.overflow, 2);
        assert_eq!(preview.overflow_label().as_deref(), Some("+2 more..."));
        assert_eq!(node.config.len(), 4);
    }

    #[test]
    fn preview_without_overflow() {
        let mut config = NodeConfig::new();
        config.insert("a".into(), json!(true));
        let preview = config_preview(&config);
        assert_eq!(preview.entries.len(), 1);
        assert_eq!(preview.overflow_label(), None);
        assert!(config_preview(&NodeConfig::new()).is_empty());
    }

    #[test]
    fn props_place_node_in_screen_space() {
        let node = sample_node();
        let viewport = ViewportState::new(Point::new(50.0, 50.0), 2.0);
        let props = node_render_props(&node, false, false, ExecutionStatus::Idle, None, &viewport);
        assert_eq!(props.screen_rect.min(), Point::new(250.0, 250.0));
        assert_eq!(props.screen_rect.width, Node::WIDTH * 2.0);
        assert_eq!(props.screen_rect.height, Node::HEIGHT * 2.0);
        assert_eq!(props.border, BorderStyle::Neutral);
        assert!(!props.shows_affordances());
    }

    #[test]
    fn status_border_beats_selection() {
        let node = sample_node();
        let viewport = ViewportState::default();
        let selected = node_render_props(&node, true, false, ExecutionStatus::Idle, None, &viewport);
        assert_eq!(selected.border, BorderStyle::Primary);
        assert!(selected.shows_affordances());

        let failed = node_render_props(&node, true, false, ExecutionStatus::Error, None, &viewport);
        assert_eq!(failed.border, BorderStyle::Status(ColorToken::Red));
        assert_eq!(failed.badge, Some("Failed"));

        let hovered = node_render_props(&node, false, true, ExecutionStatus::Idle, None, &viewport);
        assert_eq!(hovered.border, BorderStyle::Muted);
    }

    #[test]
    fn progress_only_while_running() {
        let node = sample_node();
        let viewport = ViewportState::default();
        let running =
            node_render_props(&node, false, false, ExecutionStatus::Running, Some(0.4), &viewport);
        assert_eq!(running.progress, Some(0.4));
        let done =
            node_render_props(&node, false, false, ExecutionStatus::Success, Some(0.4), &viewport);
        assert_eq!(done.progress, None);
    }

    #[test]
    fn hover_and_click_drive_state_machine() {
        let mut store = NodeGraphStore::new();
        store.add_node(NodeSpec::new("a", "openai", 0.0, 0.0)).unwrap();
        store.add_node(NodeSpec::new("b", "openai", 300.0, 0.0)).unwrap();
        let mut ui = NodeInteractions::new();

        assert_eq!(ui.state_of(&store, "a"), NodeVisualState::Idle);
        ui.handle(&mut store, "a", NodePointerEvent::Enter).unwrap();
        assert_eq!(ui.state_of(&store, "a"), NodeVisualState::Hovered);
        ui.handle(&mut store, "a", NodePointerEvent::Leave).unwrap();
        assert_eq!(ui.state_of(&store, "a"), NodeVisualState::Idle);

        ui.handle(&mut store, "a", NodePointerEvent::Click).unwrap();
        assert_eq!(ui.state_of(&store, "a"), NodeVisualState::Selected);

        ui.handle(&mut store, "b", NodePointerEvent::Enter).unwrap();
        ui.handle(&mut store, "b", NodePointerEvent::Click).unwrap();
        assert_eq!(ui.state_of(&store, "a"), NodeVisualState::Idle);
        assert_eq!(ui.state_of(&store, "b"), NodeVisualState::Selected);

        ui.click_background(&mut store);
        assert_eq!(store.selected(), None);
        assert_eq!(ui.state_of(&store, "b"), NodeVisualState::Hovered);
    }

    #[test]
    fn affordances_emit_requests_only_when_visible() {
        let mut store = NodeGraphStore::new();
        store.add_node(NodeSpec::new("a", "openai", 0.0, 0.0)).unwrap();
        let mut ui = NodeInteractions::new();

        assert_eq!(
            ui.handle(&mut store, "a", NodePointerEvent::DeleteClicked).unwrap(),
            None
        );

        ui.handle(&mut store, "a", NodePointerEvent::Enter).unwrap();
        assert_eq!(
            ui.handle(&mut store, "a", NodePointerEvent::ConfigureClicked).unwrap(),
            Some(HostRequest::Configure("a".into()))
        );
        // Configure does not touch selection.
        assert_eq!(store.selected(), None);
        assert_eq!(
            ui.handle(&mut store, "a", NodePointerEvent::DeleteClicked).unwrap(),
            Some(HostRequest::Delete("a".into()))
        );
    }

    #[test]
    fn leave_from_stale_node_keeps_current_hover() {
        let mut store = NodeGraphStore::new();
        store.add_node(NodeSpec::new("a", "openai", 0.0, 0.0)).unwrap();
        store.add_node(NodeSpec::new("b", "openai", 300.0, 0.0)).unwrap();
        let mut ui = NodeInteractions::new();
        ui.handle(&mut store, "a", NodePointerEvent::Enter).unwrap();
        ui.handle(&mut store, "b", NodePointerEvent::Enter).unwrap();
        ui.handle(&mut store, "a", NodePointerEvent::Leave).unwrap();
        assert_eq!(ui.hovered(), Some("b"));
    }

    #[test]
    fn events_for_unknown_nodes_are_rejected() {
        let mut store = NodeGraphStore::new();
        let mut ui = NodeInteractions::new();
        assert_eq!(
            ui.handle(&mut store, "ghost", NodePointerEvent::Click),
            Err(GraphError::NotFound("ghost".into()))
        );
        assert_eq!(
            ui.handle(&mut store, "ghost", NodePointerEvent::ConfigureClicked),
            Err(GraphError::NotFound("ghost".into()))
        );
    }

    #[test]
    fn leave_and_delete_on_removed_node_are_no_ops() {
        let mut store = NodeGraphStore::new();
        store.add_node(NodeSpec::new("a", "openai", 0.0, 0.0)).unwrap();
        let mut ui = NodeInteractions::new();
        ui.handle(&mut store, "a", NodePointerEvent::Enter).unwrap();
        store.delete_node("a");

        assert_eq!(ui.handle(&mut store, "a", NodePointerEvent::DeleteClicked), Ok(None));
        assert_eq!(ui.handle(&mut store, "a", NodePointerEvent::Leave), Ok(None));
        assert_eq!(ui.hovered(), None);
    }
}
