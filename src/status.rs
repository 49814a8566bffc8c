//! Execution status overlay.
//!
//! The execution engine pushes `{nodeId, status}` events; the overlay keeps the
//! latest status per node and the progress animation of running nodes. Visual
//! treatment comes from a fixed table ([`ExecutionStatus::visual`]).

use crate::animation::Tween;
use crate::constants::RUNNING_PROGRESS_SECONDS;
use crate::types::{ColorToken, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Run-state label of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Not part of an active run
    #[default]
    Idle,
    /// Currently executing
    Running,
    /// Finished successfully
    Success,
    /// Finished with an error
    Error,
    /// Queued behind another node
    Waiting,
}

/// Small icon drawn in the node header for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIcon {
    /// Rotating clock
    Spinner,
    /// Check mark
    Check,
    /// Alert triangle
    Alert,
    /// Pause bars
    Pause,
}

impl StatusIcon {
    /// Glyph used to draw the icon.
    pub const fn glyph(self) -> &'static str {
        match self {
            StatusIcon::Spinner => "⟳",
            StatusIcon::Check => "✔",
            StatusIcon::Alert => "⚠",
            StatusIcon::Pause => "⏸",
        }
    }

    /// Returns true if the icon should rotate while drawn.
    pub const fn spins(self) -> bool {
        matches!(self, StatusIcon::Spinner)
    }
}

/// Visual treatment of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusVisual {
    /// Border color; `None` leaves the border to the selection/hover styling
    pub border: Option<ColorToken>,
    /// Header icon
    pub icon: Option<StatusIcon>,
    /// Badge text under the config preview
    pub badge: Option<&'static str>,
}

impl ExecutionStatus {
    /// Looks up the fixed visual mapping for this status.
    pub const fn visual(self) -> StatusVisual {
        match self {
            ExecutionStatus::Running => StatusVisual {
                border: Some(ColorToken::Blue),
                icon: Some(StatusIcon::Spinner),
                badge: Some("Executing..."),
            },
            ExecutionStatus::Success => StatusVisual {
                border: Some(ColorToken::Green),
                icon: Some(StatusIcon::Check),
                badge: Some("Completed"),
            },
            ExecutionStatus::Error => StatusVisual {
                border: Some(ColorToken::Red),
                icon: Some(StatusIcon::Alert),
                badge: Some("Failed"),
            },
            ExecutionStatus::Waiting => StatusVisual {
                border: Some(ColorToken::Yellow),
                icon: Some(StatusIcon::Pause),
                badge: Some("Waiting"),
            },
            ExecutionStatus::Idle => StatusVisual {
                border: None,
                icon: None,
                badge: None,
            },
        }
    }
}

/// One status transition reported by the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    /// Node the status applies to
    pub node_id: NodeId,
    /// New status
    pub status: ExecutionStatus,
}

impl StatusEvent {
    /// Creates an event.
    pub fn new(node_id: impl Into<NodeId>, status: ExecutionStatus) -> Self {
        Self {
            node_id: node_id.into(),
            status,
        }
    }
}

/// Creates the channel the host wires between the execution engine and the canvas.
pub fn status_channel() -> (Sender<StatusEvent>, Receiver<StatusEvent>) {
    channel()
}

/// Latest status per node plus running-progress animations.
///
/// Entries are last-write-wins per node id. Absent entries read as `Idle`.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOverlay {
    statuses: HashMap<NodeId, ExecutionStatus>,
    progress: HashMap<NodeId, Tween>,
}

impl ExecutionOverlay {
    /// Creates an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the status of `node_id` at time `now` (seconds).
    ///
    /// Any progress animation for the node is cancelled; a new one starts if the
    /// status is `Running`. Setting `Idle` removes the entry.
    pub fn set_status(&mut self, node_id: &str, status: ExecutionStatus, now: f64) {
        self.cancel_progress(node_id);
        match status {
            ExecutionStatus::Idle => {
                self.statuses.remove(node_id);
            }
            _ => {
                self.statuses.insert(node_id.to_string(), status);
            }
        }
        if status == ExecutionStatus::Running {
            self.progress.insert(
                node_id.to_string(),
                Tween::start(now, RUNNING_PROGRESS_SECONDS),
            );
        }
        log::debug!("node `{node_id}` status -> {status:?}");
    }

    /// Current status of `node_id`; `Idle` when never set or pruned.
    pub fn get_status(&self, node_id: &str) -> ExecutionStatus {
        self.statuses.get(node_id).copied().unwrap_or_default()
    }

    /// Eased running-progress of `node_id` at `now`, if it is running.
    pub fn progress(&self, node_id: &str, now: f64) -> Option<f64> {
        self.progress.get(node_id).map(|t| t.progress(now))
    }

    /// Returns true while any progress animation is still moving at `now`.
    pub fn is_animating(&self, now: f64) -> bool {
        self.progress.values().any(|t| !t.is_finished(now))
    }

    fn cancel_progress(&mut self, node_id: &str) {
        if self.progress.remove(node_id).is_some() {
            log::trace!("cancelled progress animation of `{node_id}`");
        }
    }

    /// Drops everything known about `node_id`. Called when the node is deleted.
    pub fn remove(&mut self, node_id: &str) {
        self.cancel_progress(node_id);
        if self.statuses.remove(node_id).is_some() {
            log::debug!("pruned status of deleted node `{node_id}`");
        }
    }

    /// Ends the run session: every node reads `Idle` afterwards.
    pub fn clear(&mut self) {
        self.progress.clear();
        self.statuses.clear();
    }

    /// Number of nodes with a non-idle status.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Returns true if every node is idle.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}
