//! File operations for opening and saving workflow graphs.
//!
//! Dialogs and disk I/O run on a tokio task; results come back to the UI thread
//! over the [`FileOperationResult`] channel and are applied at the start of a frame.

use super::state::{FileOperationResult, PendingLoadOperation, PendingSaveOperation, WorkflowApp};
use crate::types::GraphDocument;
use eframe::egui;

impl WorkflowApp {
    /// Handles pending file operations.
    ///
    /// This method applies completed async file operations and starts newly
    /// requested ones.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context for requesting repaints
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.file.file_operation_receiver.try_recv() {
            self.apply_file_result(result);
        }

        if let Some(save_op) = self.file.pending_save_operation.take() {
            let json = match self.workflow.to_document().to_json() {
                Ok(json) => json,
                Err(err) => {
                    log::error!("failed to serialize graph: {err}");
                    return;
                }
            };
            match (save_op, self.file.current_path.clone()) {
                (PendingSaveOperation::Save, Some(path)) => self.spawn_write(ctx, Some(path), json),
                _ => self.spawn_write(ctx, None, json),
            }
        }

        if let Some(PendingLoadOperation::Load) = self.file.pending_load_operation.take() {
            self.spawn_read(ctx);
        }
    }

    /// Applies one result received from a file task.
    pub fn apply_file_result(&mut self, result: FileOperationResult) {
        match result {
            FileOperationResult::SaveCompleted(path) => {
                log::info!("saved graph to {path}");
                self.file.current_path = Some(path);
                self.file.has_unsaved_changes = false;
            }
            FileOperationResult::LoadCompleted(path, content) => {
                match GraphDocument::from_json(&content) {
                    Ok(doc) => match self.workflow.load_document(&doc) {
                        Ok(()) => {
                            log::info!("opened {path}");
                            self.file.current_path = Some(path);
                            self.file.has_unsaved_changes = false;
                            self.interaction.configuring = None;
                            self.interaction.reset_edit_buffers();
                            self.demo = None;
                        }
                        Err(err) => log::error!("{path} is not a valid graph: {err}"),
                    },
                    Err(err) => log::error!("failed to parse {path}: {err}"),
                }
            }
            FileOperationResult::OperationFailed(error) => {
                log::error!("file operation failed: {error}");
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_write(&self, ctx: &egui::Context, path: Option<String>, json: String) {
        let ctx = ctx.clone();
        let sender = self.file.file_operation_sender.clone();
        tokio::spawn(async move {
            let path = match path {
                Some(path) => std::path::PathBuf::from(path),
                None => {
                    let Some(handle) = rfd::AsyncFileDialog::new()
                        .add_filter("JSON", &["json"])
                        .set_file_name("workflow.json")
                        .save_file()
                        .await
                    else {
                        log::debug!("save dialog cancelled");
                        return;
                    };
                    handle.path().to_path_buf()
                }
            };
            let result = match std::fs::write(&path, json) {
                Ok(()) => FileOperationResult::SaveCompleted(path.display().to_string()),
                Err(e) => FileOperationResult::OperationFailed(format!("Failed to save file: {e}")),
            };
            let _ = sender.send(result);
            ctx.request_repaint();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn_read(&self, ctx: &egui::Context) {
        let ctx = ctx.clone();
        let sender = self.file.file_operation_sender.clone();
        tokio::spawn(async move {
            let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter("JSON", &["json"])
                .pick_file()
                .await
            else {
                log::debug!("open dialog cancelled");
                return;
            };
            let path = handle.path();
            let result = match std::fs::read_to_string(path) {
                Ok(json) => FileOperationResult::LoadCompleted(path.display().to_string(), json),
                Err(e) => FileOperationResult::OperationFailed(format!("Failed to read file: {e}")),
            };
            let _ = sender.send(result);
            ctx.request_repaint();
        });
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn_write(&self, _ctx: &egui::Context, _path: Option<String>, _json: String) {
        log::warn!("saving files is only available in the native build");
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn_read(&self, _ctx: &egui::Context) {
        log::warn!("opening files is only available in the native build");
    }

    /// Opens a file dialog to save the graph to a new path.
    pub fn save_as_workflow(&mut self) {
        self.file.pending_save_operation = Some(PendingSaveOperation::SaveAs);
    }

    /// Saves to the current file path, or triggers "Save As" if no path is set.
    pub fn save_workflow(&mut self) {
        self.file.pending_save_operation = Some(PendingSaveOperation::Save);
    }

    /// Opens a file dialog to load a graph from disk.
    pub fn open_workflow(&mut self) {
        self.file.pending_load_operation = Some(PendingLoadOperation::Load);
    }
}
