//! User interface components for the workflow canvas.
//!
//! This module contains the egui host shell: the main application struct, the
//! node palette, the properties panel, canvas input handling and painting.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main WorkflowApp
//! - `file_ops` - Opening and saving graphs through native file dialogs
//! - `canvas` - Canvas navigation, zooming, panning and node interaction
//! - `rendering` - Drawing the grid, connections, node cards and the minimap

mod canvas;
mod file_ops;
mod rendering;
mod state;


pub use state::{CanvasSettings, WorkflowApp};

use self::state::DemoRun;
use crate::catalog::{self, NodeKind};
use crate::constants::DEMO_STEP_SECONDS;
use crate::types::{NodeId, NodeSpec};
use crate::viewport::ViewportState;
use eframe::egui;

/// eframe storage key the canvas settings are persisted under.
pub const STORAGE_KEY: &str = "app_state";

impl eframe::App for WorkflowApp {
    /// Persist canvas settings between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.settings_json() {
            Ok(json) => storage.set_string(STORAGE_KEY, json),
            Err(err) => log::error!("failed to serialize settings: {err}"),
        }
    }

    /// Main update function called by egui for each frame.
    ///
    /// Applies file results and status events, then lays out the toolbar,
    /// palette, properties panel and canvas.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context
    /// * `_frame` - The eframe frame
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(if self.settings.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        let now = ctx.input(|i| i.time);
        self.handle_pending_operations(ctx);
        self.pump_status_events(now);
        self.handle_delete_key(ctx);
        self.handle_file_shortcuts(ctx);

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui, now);
        });
        egui::SidePanel::left("palette_panel")
            .resizable(true)
            .default_width(200.0)
            .show(ctx, |ui| {
                self.draw_palette(ui);
            });
        egui::SidePanel::right("properties_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                self.draw_properties_panel(ui);
            });
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.draw_canvas(ui);
            });

        if self.demo.is_some() || self.workflow.is_animating(now) {
            ctx.request_repaint();
        }
    }
}

/// Parses a config value typed by the user: JSON if it parses, a string otherwise.
pub fn parse_config_value(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
}

/// Parses an edit to an existing config value, keeping its JSON type.
///
/// String values stay strings whatever is typed. Other values only accept text
/// that parses to the same kind; `None` means the edit is not committed yet.
/// A `null` value accepts anything [`parse_config_value`] produces.
pub fn parse_config_edit(current: &serde_json::Value, text: &str) -> Option<serde_json::Value> {
    use serde_json::Value;

    match current {
        Value::String(_) => Some(Value::String(text.to_string())),
        Value::Null => Some(parse_config_value(text)),
        _ => serde_json::from_str::<Value>(text)
            .ok()
            .filter(|parsed| std::mem::discriminant(parsed) == std::mem::discriminant(current)),
    }
}

impl WorkflowApp {
    /// Releases due demo events into the status channel and applies everything pending.
    pub fn pump_status_events(&mut self, now: f64) {
        if let Some(demo) = &mut self.demo {
            for event in demo.due(now) {
                if self.status.sender.send(event).is_err() {
                    log::warn!("status channel closed");
                }
            }
            if demo.is_finished() {
                log::info!("demo run finished");
                self.demo = None;
            }
        }
        let applied = self.workflow.drain_status_events(&self.status.receiver, now);
        if applied > 0 {
            log::trace!("applied {applied} status events");
        }
    }

    /// Starts a scripted run over every node in paint order.
    pub fn start_demo_run(&mut self, now: f64) {
        let ids: Vec<NodeId> = self
            .workflow
            .store()
            .nodes()
            .iter()
            .map(|n| n.id.clone())
            .collect();
        self.workflow.end_run();
        log::info!("starting demo run over {} nodes", ids.len());
        self.demo = Some(DemoRun::new(&ids, now, DEMO_STEP_SECONDS));
    }

    /// Stops the demo and resets every status to idle.
    pub fn stop_run(&mut self) {
        self.demo = None;
        // Events already queued belong to the cancelled run.
        while self.status.receiver.try_recv().is_ok() {}
        self.workflow.end_run();
    }

    /// Adds a node of a catalog kind at the center of the visible canvas.
    pub fn add_catalog_node(&mut self, kind: &NodeKind) -> Option<NodeId> {
        let center = self.visible_center_world();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let id = format!("{}-{}", kind.type_tag, &suffix[..8]);
        let spec = NodeSpec::new(
            id,
            kind.type_tag,
            center.x - crate::types::Node::WIDTH / 2.0,
            center.y - crate::types::Node::HEIGHT / 2.0,
        );
        match self.workflow.add_node(spec) {
            Ok(node) => {
                let id = node.id.clone();
                self.file.has_unsaved_changes = true;
                Some(id)
            }
            Err(err) => {
                log::warn!("could not add {}: {err}", kind.type_tag);
                None
            }
        }
    }

    /// Deletes the selected node on Delete/Backspace unless a text field has focus.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context for checking input
    fn handle_delete_key(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let pressed =
            ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace));
        if !pressed {
            return;
        }
        if let Some(id) = self.workflow.store().selected().map(str::to_string) {
            self.workflow.delete_node(&id);
            self.forget_node(&id);
            self.file.has_unsaved_changes = true;
        }
    }

    /// Handles Cmd/Ctrl+O, Cmd/Ctrl+S and Cmd/Ctrl+Shift+S.
    fn handle_file_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (open, save, save_as) = ctx.input(|i| {
            let cmd = i.modifiers.command;
            let s = i.key_pressed(egui::Key::S) && cmd;
            (
                i.key_pressed(egui::Key::O) && cmd,
                s && !i.modifiers.shift,
                s && i.modifiers.shift,
            )
        });
        if open {
            self.open_workflow();
        }
        if save {
            self.save_workflow();
        }
        if save_as {
            self.save_as_workflow();
        }
    }

    /// Renders the toolbar with file operations, run controls and view options.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `now` - Current time in seconds
    fn draw_toolbar(&mut self, ui: &mut egui::Ui, now: f64) {
        ui.horizontal(|ui| {
            if ui.button("Open…").clicked() {
                self.open_workflow();
            }
            if ui.button("Save").clicked() {
                self.save_workflow();
            }
            if ui.button("Save As…").clicked() {
                self.save_as_workflow();
            }
            ui.separator();

            if self.demo.is_some() {
                if ui.button("⏹ Stop").clicked() {
                    self.stop_run();
                }
            } else if ui
                .add_enabled(!self.workflow.store().is_empty(), egui::Button::new("▶ Run demo"))
                .clicked()
            {
                self.start_demo_run(now);
            }
            if ui
                .add_enabled(!self.workflow.overlay().is_empty(), egui::Button::new("Clear status"))
                .clicked()
            {
                self.stop_run();
            }
            ui.separator();

            ui.checkbox(&mut self.settings.show_grid, "Grid");
            ui.checkbox(&mut self.settings.show_minimap, "Minimap");
            ui.checkbox(&mut self.settings.dark_mode, "Dark");
            ui.separator();

            ui.label(format!("{:.0}%", self.workflow.viewport().zoom() * 100.0));
            if ui.button("Reset view").clicked() {
                self.workflow.set_viewport(ViewportState::default());
            }

            if self.file.has_unsaved_changes {
                ui.separator();
                ui.label("●").on_hover_text("Unsaved changes");
            }
        });
    }

    /// Renders the template list and the node catalog.
    fn draw_palette(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.heading("Templates");
            for template in catalog::all_templates() {
                let button = ui
                    .button(template.name)
                    .on_hover_text(template.complexity);
                if button.clicked() {
                    match self.workflow.load_template(template.kind) {
                        Ok(()) => {
                            self.demo = None;
                            self.interaction.configuring = None;
                            self.interaction.reset_edit_buffers();
                            self.file.has_unsaved_changes = true;
                        }
                        Err(err) => log::error!("template {} is invalid: {err}", template.name),
                    }
                }
            }
            ui.separator();

            ui.heading("Nodes");
            for category in catalog::categories() {
                ui.collapsing(category.name, |ui| {
                    for kind in category.kinds {
                        let text = format!("{} {}", kind.icon.glyph(), kind.label);
                        let button = egui::Button::new(
                            egui::RichText::new(text).color(rendering::color32(kind.color)),
                        );
                        if ui.add(button).clicked() {
                            if let Some(id) = self.add_catalog_node(kind) {
                                if let Err(err) = self.workflow.select(&id) {
                                    log::warn!("{err}");
                                }
                                self.interaction.reset_edit_buffers();
                            }
                        }
                    }
                });
            }
        });
    }

    /// Renders the properties panel for the selected (or configured) node.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    fn draw_properties_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Properties");
        ui.separator();

        let target = self
            .workflow
            .store()
            .selected()
            .map(str::to_string)
            .or_else(|| self.interaction.configuring.clone());
        let Some(node) = target.and_then(|id| self.workflow.store().get(&id).cloned()) else {
            ui.label("Select a node to see its properties.");
            ui.label(format!(
                "{} nodes, {} connections",
                self.workflow.store().len(),
                self.workflow.store().connections().len()
            ));
            return;
        };

        if self.interaction.temp_config_node.as_deref() != Some(node.id.as_str()) {
            self.interaction.reset_edit_buffers();
            self.interaction.temp_config_node = Some(node.id.clone());
            self.interaction.temp_label = node.label.clone();
            self.interaction.temp_config_values = node
                .config
                .iter()
                .map(|(k, v)| (k.clone(), crate::render::display_value(v)))
                .collect();
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("node_info").num_columns(2).show(ui, |ui| {
                ui.label("Label");
                if ui
                    .text_edit_singleline(&mut self.interaction.temp_label)
                    .changed()
                {
                    if let Err(err) = self
                        .workflow
                        .set_label(&node.id, self.interaction.temp_label.clone())
                    {
                        log::warn!("{err}");
                    }
                    self.file.has_unsaved_changes = true;
                }
                ui.end_row();
                ui.label("Type");
                ui.label(node.node_type.as_str());
                ui.end_row();
                ui.label("Id");
                ui.monospace(node.id.as_str());
                ui.end_row();
                ui.label("Position");
                ui.label(format!("({:.0}, {:.0})", node.x, node.y));
                ui.end_row();
                ui.label("Status");
                ui.label(format!("{:?}", self.workflow.status_of(&node.id)));
                ui.end_row();
            });

            ui.separator();
            ui.strong("Configuration");
            let mut removed = None;
            for (key, value) in &node.config {
                ui.horizontal(|ui| {
                    ui.label(key.as_str());
                    let buffer = self
                        .interaction
                        .temp_config_values
                        .entry(key.clone())
                        .or_insert_with(|| crate::render::display_value(value));
                    if ui.text_edit_singleline(buffer).changed() {
                        match parse_config_edit(value, buffer) {
                            Some(parsed) => {
                                if let Err(err) =
                                    self.workflow.update_config(&node.id, key.clone(), parsed)
                                {
                                    log::warn!("{err}");
                                }
                                self.file.has_unsaved_changes = true;
                            }
                            None => log::debug!("`{key}` keeps its value until `{buffer}` parses"),
                        }
                    }
                    if ui.small_button("✕").clicked() {
                        removed = Some(key.clone());
                    }
                });
            }
            if let Some(key) = removed {
                if let Err(err) = self.workflow.remove_config(&node.id, &key) {
                    log::warn!("{err}");
                }
                self.interaction.temp_config_values.remove(&key);
                self.file.has_unsaved_changes = true;
            }

            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.interaction.temp_new_key)
                        .hint_text("key")
                        .desired_width(70.0),
                );
                ui.add(
                    egui::TextEdit::singleline(&mut self.interaction.temp_new_value)
                        .hint_text("value")
                        .desired_width(90.0),
                );
                let key = self.interaction.temp_new_key.trim().to_string();
                if ui
                    .add_enabled(!key.is_empty(), egui::Button::new("Add"))
                    .clicked()
                {
                    let value = parse_config_value(&self.interaction.temp_new_value);
                    match self.workflow.update_config(&node.id, key.clone(), value) {
                        Ok(()) => {
                            self.interaction.temp_config_values.insert(
                                key,
                                self.interaction.temp_new_value.clone(),
                            );
                            self.interaction.temp_new_key.clear();
                            self.interaction.temp_new_value.clear();
                            self.file.has_unsaved_changes = true;
                        }
                        Err(err) => log::warn!("{err}"),
                    }
                }
            });

            ui.separator();
            ui.collapsing("Connect to…", |ui| {
                let others: Vec<(NodeId, String)> = self
                    .workflow
                    .store()
                    .nodes()
                    .iter()
                    .filter(|n| n.id != node.id)
                    .map(|n| (n.id.clone(), n.label.clone()))
                    .collect();
                for (id, label) in others {
                    if ui.button(label.as_str()).on_hover_text(id.as_str()).clicked() {
                        match self.workflow.connect(&node.id, &id) {
                            Ok(()) => self.file.has_unsaved_changes = true,
                            Err(err) => log::warn!("{err}"),
                        }
                    }
                }
            });

            ui.separator();
            if ui.button("Delete node").clicked() {
                self.workflow.delete_node(&node.id);
                self.forget_node(&node.id);
                self.file.has_unsaved_changes = true;
            }
        });
    }
}
