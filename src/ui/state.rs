//! Application state management structures.
//!
//! This module contains the state structures that track the shell's UI state:
//! persisted canvas settings, in-progress pointer interactions, the scripted demo
//! run and async file operations.

use crate::status::{status_channel, ExecutionStatus, StatusEvent};
use crate::types::NodeId;
use crate::viewport::{Point, ViewportState};
use crate::workflow::Workflow;
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::{channel, Receiver, Sender};

/// User-facing canvas settings persisted between sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    /// Whether the grid should be displayed on the canvas
    pub show_grid: bool,
    /// Whether the minimap overlay is displayed
    pub show_minimap: bool,
    /// Whether dark mode visuals are enabled
    pub dark_mode: bool,
    /// Last viewport; zoom is re-clamped when this is read back
    pub viewport: ViewportState,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_minimap: true,
            dark_mode: true,
            viewport: ViewportState::default(),
        }
    }
}

/// State related to user interactions with nodes and canvas.
///
/// Tracks panning, dragging and the properties panel's edit buffers.
#[derive(Debug, Default)]
pub struct InteractionState {
    /// Window-space top-left corner of the canvas in the last frame
    pub canvas_origin: egui::Pos2,
    /// Whether the user is currently panning the canvas
    pub is_panning: bool,
    /// Last mouse position during panning operation
    pub last_pan_pos: Option<egui::Pos2>,
    /// Node under the primary press, before it turns into a drag
    pub pressed_node: Option<NodeId>,
    /// Window position where the primary press started
    pub press_pos: Option<egui::Pos2>,
    /// Node currently being dragged by the user
    pub dragging_node: Option<NodeId>,
    /// World-space distance from the dragged node's corner to the pointer
    pub drag_grab_offset: Point,
    /// Node whose configuration was requested from its configure affordance
    pub configuring: Option<NodeId>,
    /// Node whose config is loaded into `temp_config_values`
    pub temp_config_node: Option<NodeId>,
    /// Per-key edit buffers for the selected node's config values
    pub temp_config_values: HashMap<String, String>,
    /// Key field of the "add entry" row
    pub temp_new_key: String,
    /// Value field of the "add entry" row
    pub temp_new_value: String,
    /// Edit buffer for the selected node's label
    pub temp_label: String,
}

impl InteractionState {
    /// Clears edit buffers so they reload from the newly selected node.
    pub fn reset_edit_buffers(&mut self) {
        self.temp_config_node = None;
        self.temp_config_values.clear();
        self.temp_new_key.clear();
        self.temp_new_value.clear();
        self.temp_label.clear();
    }

    /// Returns true while the primary button holds a node (pressed or dragging).
    pub fn holds_node(&self) -> bool {
        self.pressed_node.is_some() || self.dragging_node.is_some()
    }
}

/// A scripted sequence of status events replayed through the status channel.
///
/// Each node in paint order goes `running` for one step, then `success`.
#[derive(Debug, Default)]
pub struct DemoRun {
    script: VecDeque<(f64, StatusEvent)>,
}

impl DemoRun {
    /// Builds the script for `nodes` starting at `now`.
    pub fn new(nodes: &[NodeId], now: f64, step: f64) -> Self {
        let mut script = VecDeque::with_capacity(nodes.len() * 2);
        for (i, id) in nodes.iter().enumerate() {
            let start = now + i as f64 * step;
            script.push_back((start, StatusEvent::new(id.clone(), ExecutionStatus::Running)));
            script.push_back((
                start + step,
                StatusEvent::new(id.clone(), ExecutionStatus::Success),
            ));
        }
        Self { script }
    }

    /// Removes and returns every event due at `now`.
    pub fn due(&mut self, now: f64) -> Vec<StatusEvent> {
        let mut due = Vec::new();
        while let Some((at, _)) = self.script.front() {
            if *at > now {
                break;
            }
            if let Some((_, event)) = self.script.pop_front() {
                due.push(event);
            }
        }
        due
    }

    /// Returns true when every scripted event has been delivered.
    pub fn is_finished(&self) -> bool {
        self.script.is_empty()
    }
}

/// Status events from the execution engine (or the demo run) to the canvas.
#[derive(Debug)]
pub struct StatusLink {
    /// Handed to whatever produces status events
    pub sender: Sender<StatusEvent>,
    /// Drained once per frame
    pub receiver: Receiver<StatusEvent>,
}

impl Default for StatusLink {
    fn default() -> Self {
        let (sender, receiver) = status_channel();
        Self { sender, receiver }
    }
}

/// State related to file operations.
///
/// Manages the current path and async file operations.
#[derive(Debug)]
pub struct FileState {
    /// Current file path for save operations
    pub current_path: Option<String>,
    /// Flag indicating if the graph has unsaved changes
    pub has_unsaved_changes: bool,
    /// Save requested this frame
    pub pending_save_operation: Option<PendingSaveOperation>,
    /// Open requested this frame
    pub pending_load_operation: Option<PendingLoadOperation>,
    /// Channel for receiving file operation results from async contexts
    pub file_operation_sender: Sender<FileOperationResult>,
    /// Receiving end of `file_operation_sender`
    pub file_operation_receiver: Receiver<FileOperationResult>,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            current_path: None,
            has_unsaved_changes: false,
            pending_save_operation: None,
            pending_load_operation: None,
            file_operation_sender: sender,
            file_operation_receiver: receiver,
        }
    }
}

/// Represents a pending save operation type.
#[derive(Debug)]
pub enum PendingSaveOperation {
    /// Save with a new file path (show file picker)
    SaveAs,
    /// Save to the existing file path
    Save,
}

/// Represents a pending load operation type.
#[derive(Debug)]
pub enum PendingLoadOperation {
    /// Load from a file (show file picker)
    Load,
}

/// Messages sent from async file operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// Save operation completed successfully with the given path
    SaveCompleted(String),
    /// Load operation completed successfully with path and content
    LoadCompleted(String, String),
    /// Operation failed with an error message
    OperationFailed(String),
}

/// The main application structure: the workflow canvas plus its UI state.
///
/// This struct implements the `eframe::App` trait and handles all user interface
/// rendering and interaction logic. Only [`CanvasSettings`] are persisted.
#[derive(Default)]
pub struct WorkflowApp {
    /// Graph, viewport, execution overlay and minimap
    pub workflow: Workflow,
    /// Persisted display settings
    pub settings: CanvasSettings,
    /// Pointer and editing state
    pub interaction: InteractionState,
    /// File operations state
    pub file: FileState,
    /// Status event channel drained every frame
    pub status: StatusLink,
    /// Scripted run driving `status`, if one is active
    pub demo: Option<DemoRun>,
}

impl WorkflowApp {
    /// Builds the app, restoring settings saved by a previous session.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = cc
            .storage
            .and_then(|storage| storage.get_string(super::STORAGE_KEY))
            .and_then(|json| match serde_json::from_str::<CanvasSettings>(&json) {
                Ok(settings) => Some(settings),
                Err(err) => {
                    log::warn!("ignoring unreadable saved settings: {err}");
                    None
                }
            })
            .unwrap_or_default();
        Self::with_settings(settings)
    }

    /// Builds the app from explicit settings with an empty graph.
    pub fn with_settings(settings: CanvasSettings) -> Self {
        let mut app = Self {
            settings,
            ..Self::default()
        };
        app.workflow.set_viewport(app.settings.viewport);
        app
    }

    /// Serializes the persisted settings, capturing the current viewport.
    pub fn settings_json(&mut self) -> Result<String, serde_json::Error> {
        self.settings.viewport = *self.workflow.viewport();
        serde_json::to_string(&self.settings)
    }
}
