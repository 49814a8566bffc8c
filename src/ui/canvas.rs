//! Canvas interaction and navigation functionality.
//!
//! This module handles canvas panning, zooming, hover tracking, node dragging and
//! clicks, and conversion between egui window coordinates and the viewport's
//! canvas-local screen coordinates.

use super::rendering::affordance_rects;
use super::state::WorkflowApp;
use crate::constants::{DRAG_THRESHOLD, WHEEL_ZOOM_FACTOR};
use crate::render::NodePointerEvent;
use crate::viewport::{CanvasDimensions, Point};
use eframe::egui;

impl WorkflowApp {
    /// Converts a window position to canvas-local screen coordinates.
    pub fn to_canvas(&self, pos: egui::Pos2) -> Point {
        let origin = self.interaction.canvas_origin;
        Point::new((pos.x - origin.x) as f64, (pos.y - origin.y) as f64)
    }

    /// Converts canvas-local screen coordinates to a window position.
    pub fn to_window(&self, screen: Point) -> egui::Pos2 {
        self.interaction.canvas_origin + egui::vec2(screen.x as f32, screen.y as f32)
    }

    /// Converts a window position to world coordinates accounting for zoom and pan.
    pub fn window_to_world(&self, pos: egui::Pos2) -> Point {
        self.workflow.viewport().screen_to_world(self.to_canvas(pos))
    }

    /// Converts world coordinates to a window position accounting for zoom and pan.
    pub fn world_to_window(&self, world: Point) -> egui::Pos2 {
        self.to_window(self.workflow.viewport().world_to_screen(world))
    }

    /// Allocates the canvas, handles its input and paints it.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let canvas_rect = response.rect;
        self.interaction.canvas_origin = canvas_rect.min;
        self.workflow.set_dimensions(CanvasDimensions::new(
            canvas_rect.width() as f64,
            canvas_rect.height() as f64,
        ));
        let now = ui.input(|i| i.time);

        self.handle_canvas_panning(ui, &response);
        self.handle_canvas_zoom(ui, &response);
        self.handle_canvas_hover(ui, &response);
        self.handle_node_pointer(ui, &response);
        self.handle_canvas_click(ui, &response);

        self.render_canvas(&painter, canvas_rect, now);
    }

    /// Handles middle-click or Cmd/Ctrl+left-click canvas panning functionality.
    ///
    /// Uses Cmd on macOS and Ctrl on other platforms for modifier-based panning.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `response` - The response from the canvas widget
    pub fn handle_canvas_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let should_pan = ui.input(|i| {
            i.pointer.middle_down() || (i.pointer.primary_down() && i.modifiers.command)
        }) && !self.interaction.holds_node();

        if should_pan {
            if let Some(current_pos) = response.interact_pointer_pos() {
                if !self.interaction.is_panning {
                    self.interaction.is_panning = true;
                    self.interaction.last_pan_pos = Some(current_pos);
                } else if let Some(last_pos) = self.interaction.last_pan_pos {
                    let delta = current_pos - last_pos;
                    self.workflow.pan_by(delta.x as f64, delta.y as f64);
                    self.interaction.last_pan_pos = Some(current_pos);
                }
            }
        } else {
            self.interaction.is_panning = false;
            self.interaction.last_pan_pos = None;
        }
    }

    /// Handles scroll wheel zooming, one fixed zoom step per wheel event.
    ///
    /// Only zooms if the cursor is over the canvas.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `response` - The response from the canvas widget
    pub fn handle_canvas_zoom(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let Some(pointer) = ui.input(|i| i.pointer.hover_pos()) else {
            return;
        };
        if !response.rect.contains(pointer) {
            return;
        }
        let deltas: Vec<f32> = ui.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::MouseWheel { delta, .. } => Some(delta.y),
                    _ => None,
                })
                .collect()
        });
        for delta in deltas {
            self.apply_wheel_zoom(pointer, delta);
        }
    }

    /// Applies one wheel step at `pointer`: scrolling up zooms in, down zooms out.
    ///
    /// The world point under the pointer stays under the pointer.
    pub fn apply_wheel_zoom(&mut self, pointer: egui::Pos2, delta_y: f32) {
        let factor = if delta_y > 0.0 {
            WHEEL_ZOOM_FACTOR
        } else if delta_y < 0.0 {
            1.0 / WHEEL_ZOOM_FACTOR
        } else {
            return;
        };
        let anchor = self.to_canvas(pointer);
        self.workflow.zoom_at(anchor, factor);
    }

    /// Moves node hover to whatever is under the pointer.
    fn handle_canvas_hover(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        if self.interaction.is_panning || self.interaction.dragging_node.is_some() {
            return;
        }
        match ui.input(|i| i.pointer.hover_pos()) {
            Some(pos) if response.rect.contains(pos) => {
                let screen = self.to_canvas(pos);
                self.workflow.hover_at_screen(screen);
            }
            _ => self.workflow.clear_hover(),
        }
    }

    /// Finds a visible affordance under a window position.
    ///
    /// Nodes are checked top-most first, so an affordance on a covering node wins.
    fn affordance_at(&self, pos: egui::Pos2, now: f64) -> Option<(String, NodePointerEvent)> {
        self.workflow
            .render_props(now)
            .iter()
            .rev()
            .filter(|props| props.shows_affordances())
            .find_map(|props| {
                let card = self.window_rect(&props.screen_rect);
                let (configure, delete) = affordance_rects(card, props.scale as f32);
                if configure.contains(pos) {
                    Some((props.id.clone(), NodePointerEvent::ConfigureClicked))
                } else if delete.contains(pos) {
                    Some((props.id.clone(), NodePointerEvent::DeleteClicked))
                } else {
                    None
                }
            })
    }

    /// Sends one pointer event to a node and carries out what it asks for.
    pub fn dispatch_node_event(&mut self, id: &str, event: NodePointerEvent) {
        let existed = self.workflow.store().contains(id);
        match self.workflow.handle_node_pointer(id, event) {
            Ok(Some(configure)) => {
                log::debug!("configure requested for `{configure}`");
                self.interaction.configuring = Some(configure);
            }
            Ok(None) => {}
            Err(err) => log::warn!("pointer event {event:?} failed: {err}"),
        }
        match event {
            NodePointerEvent::DeleteClicked if existed && !self.workflow.store().contains(id) => {
                self.forget_node(id);
                self.file.has_unsaved_changes = true;
            }
            NodePointerEvent::Click => {
                if self.interaction.temp_config_node.as_deref() != Some(id) {
                    self.interaction.reset_edit_buffers();
                }
            }
            _ => {}
        }
    }

    /// Clears UI state that referred to a deleted node.
    pub fn forget_node(&mut self, id: &str) {
        if self.interaction.configuring.as_deref() == Some(id) {
            self.interaction.configuring = None;
        }
        if self.interaction.temp_config_node.as_deref() == Some(id) {
            self.interaction.reset_edit_buffers();
        }
        if self.interaction.pressed_node.as_deref() == Some(id) {
            self.interaction.pressed_node = None;
        }
        if self.interaction.dragging_node.as_deref() == Some(id) {
            self.interaction.dragging_node = None;
        }
    }

    /// Handles primary presses on nodes, affordance clicks and node dragging.
    ///
    /// A press on a node selects it; moving further than [`DRAG_THRESHOLD`]
    /// while held turns the press into a drag.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `response` - The response from the canvas widget
    pub fn handle_node_pointer(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let (pressed, down, released, command, pointer, now) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.modifiers.command,
                i.pointer.interact_pos(),
                i.time,
            )
        });

        if pressed && !command && !self.interaction.is_panning {
            if let Some(pos) = pointer.filter(|p| response.rect.contains(*p)) {
                if let Some((id, event)) = self.affordance_at(pos, now) {
                    self.dispatch_node_event(&id, event);
                } else if let Some(node) = self.workflow.node_at_screen(self.to_canvas(pos)) {
                    let id = node.id.clone();
                    let grab = self.window_to_world(pos) - node.position();
                    self.interaction.pressed_node = Some(id.clone());
                    self.interaction.press_pos = Some(pos);
                    self.interaction.drag_grab_offset = grab;
                    self.dispatch_node_event(&id, NodePointerEvent::Click);
                }
            }
        }

        if down {
            if let Some(pos) = pointer {
                if let Some(id) = self.interaction.dragging_node.clone() {
                    let target = self.window_to_world(pos) - self.interaction.drag_grab_offset;
                    if let Err(err) = self.workflow.move_node(&id, target.x, target.y) {
                        log::warn!("drag lost its node: {err}");
                        self.interaction.dragging_node = None;
                    }
                } else if let Some(start) = self.interaction.press_pos {
                    if self.interaction.pressed_node.is_some() && pos.distance(start) > DRAG_THRESHOLD {
                        self.interaction.dragging_node = self.interaction.pressed_node.take();
                    }
                }
            }
        }

        if released || !down {
            if let Some(id) = self.interaction.dragging_node.take() {
                log::debug!("finished dragging `{id}`");
                self.file.has_unsaved_changes = true;
            }
            self.interaction.pressed_node = None;
            self.interaction.press_pos = None;
        }
    }

    /// Clears the selection when empty canvas is clicked.
    fn handle_canvas_click(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        if !response.clicked() || self.interaction.is_panning {
            return;
        }
        if ui.input(|i| i.modifiers.command) {
            return;
        }
        let Some(pos) = response.interact_pointer_pos() else {
            return;
        };
        if self.workflow.node_at_screen(self.to_canvas(pos)).is_none() {
            self.workflow.click_background();
            self.interaction.configuring = None;
            self.interaction.reset_edit_buffers();
        }
    }

    /// World position at the center of the visible canvas, for placing new nodes.
    pub fn visible_center_world(&self) -> Point {
        let dims = self.workflow.dimensions();
        self.workflow
            .viewport()
            .screen_to_world(Point::new(dims.width / 2.0, dims.height / 2.0))
    }
}
