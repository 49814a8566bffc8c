//! Canvas rendering for the grid, connections, node cards and the minimap.
//!
//! All geometry comes from [`NodeRenderProps`] and [`MinimapProjection`]; this
//! module only turns it into egui shapes.

use super::state::WorkflowApp;
use crate::constants::{
    GRID_SIZE, MINIMAP_HEIGHT, MINIMAP_MARGIN, MINIMAP_WIDTH, NODE_CORNER_RADIUS,
};
use crate::minimap::MinimapProjection;
use crate::render::{BorderStyle, NodeRenderProps};
use crate::types::{ColorToken, Node};
use crate::viewport::{BoundingBox, Point};
use eframe::egui;
use eframe::epaint::StrokeKind;

/// Converts a theme token to its egui color.
pub fn color32(token: ColorToken) -> egui::Color32 {
    let [r, g, b] = token.rgb();
    egui::Color32::from_rgb(r, g, b)
}

/// Selection highlight used for the primary border and the minimap viewport.
const PRIMARY: egui::Color32 = egui::Color32::from_rgb(100, 150, 255);

/// Screen rectangles of the configure and delete affordances of a node card.
///
/// # Arguments
///
/// * `card` - The node card in window space
/// * `scale` - Current zoom factor
///
/// # Returns
///
/// `(configure, delete)` button rectangles
pub fn affordance_rects(card: egui::Rect, scale: f32) -> (egui::Rect, egui::Rect) {
    let size = 16.0 * scale;
    let pad = 6.0 * scale;
    let delete = egui::Rect::from_min_size(
        egui::pos2(card.right() - pad - size, card.top() + pad),
        egui::vec2(size, size),
    );
    let configure = delete.translate(egui::vec2(-(size + 4.0 * scale), 0.0));
    (configure, delete)
}

impl WorkflowApp {
    /// Converts a screen-space box from the core into a window rectangle.
    pub fn window_rect(&self, rect: &BoundingBox) -> egui::Rect {
        egui::Rect::from_min_size(
            self.to_window(rect.min()),
            egui::vec2(rect.width as f32, rect.height as f32),
        )
    }

    /// Renders grid, connections, nodes and the minimap, back to front.
    ///
    /// # Arguments
    ///
    /// * `painter` - The egui painter for drawing operations
    /// * `canvas_rect` - The window-space rectangle of the canvas area
    /// * `now` - Current time in seconds, for progress animations
    pub fn render_canvas(&mut self, painter: &egui::Painter, canvas_rect: egui::Rect, now: f64) {
        if self.settings.show_grid {
            self.draw_grid(painter, canvas_rect);
        }

        for conn in self.workflow.store().connections() {
            let from = self.workflow.store().get(&conn.from);
            let to = self.workflow.store().get(&conn.to);
            if let (Some(from), Some(to)) = (from, to) {
                self.draw_connection(painter, from, to);
            }
        }

        for props in self.workflow.render_props(now) {
            self.draw_node(painter, &props, now);
        }

        if self.settings.show_minimap {
            let origin = egui::pos2(
                canvas_rect.right() - MINIMAP_MARGIN - MINIMAP_WIDTH as f32,
                canvas_rect.bottom() - MINIMAP_MARGIN - MINIMAP_HEIGHT as f32,
            );
            let dark_mode = self.settings.dark_mode;
            let projection = self.workflow.minimap();
            draw_minimap(painter, origin, projection, dark_mode);
        }
    }

    /// Draws grid lines every [`GRID_SIZE`] world units.
    ///
    /// The grid is skipped when zoomed out so far that lines would be under 4 px apart.
    pub fn draw_grid(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let zoom = self.workflow.viewport().zoom();
        let screen_grid = GRID_SIZE * zoom;
        if screen_grid < 4.0 {
            return;
        }
        let stroke = egui::Stroke::new(
            1.0,
            egui::Color32::from_rgba_unmultiplied(128, 128, 128, 32),
        );

        let top_left = self.window_to_world(canvas_rect.min);
        let bottom_right = self.window_to_world(canvas_rect.max);

        let mut x = (top_left.x / GRID_SIZE).floor() * GRID_SIZE;
        while x <= bottom_right.x {
            let sx = self.world_to_window(Point::new(x, 0.0)).x;
            painter.line_segment(
                [
                    egui::pos2(sx, canvas_rect.top()),
                    egui::pos2(sx, canvas_rect.bottom()),
                ],
                stroke,
            );
            x += GRID_SIZE;
        }

        let mut y = (top_left.y / GRID_SIZE).floor() * GRID_SIZE;
        while y <= bottom_right.y {
            let sy = self.world_to_window(Point::new(0.0, y)).y;
            painter.line_segment(
                [
                    egui::pos2(canvas_rect.left(), sy),
                    egui::pos2(canvas_rect.right(), sy),
                ],
                stroke,
            );
            y += GRID_SIZE;
        }
    }

    /// Draws a connection from the right-middle of `from` to the left-middle of `to`.
    pub fn draw_connection(&self, painter: &egui::Painter, from: &Node, to: &Node) {
        let start = self.world_to_window(Point::new(
            from.x + Node::WIDTH,
            from.y + Node::HEIGHT / 2.0,
        ));
        let end = self.world_to_window(Point::new(to.x, to.y + Node::HEIGHT / 2.0));
        let zoom = self.workflow.viewport().zoom() as f32;
        let color = egui::Color32::from_rgb(140, 140, 150);

        painter.line_segment([start, end], egui::Stroke::new(2.0 * zoom.max(0.5), color));

        // Arrow head at the midpoint, pointing towards the target.
        let direction = (end - start).normalized();
        if direction.is_finite() {
            let center = start + (end - start) * 0.5;
            let perpendicular = egui::vec2(-direction.y, direction.x);
            let size = 7.0 * zoom;
            painter.add(egui::Shape::convex_polygon(
                vec![
                    center + direction * size,
                    center - direction * size + perpendicular * size * 0.8,
                    center - direction * size - perpendicular * size * 0.8,
                ],
                color,
                egui::Stroke::NONE,
            ));
        }
    }

    /// Draws one node card.
    ///
    /// # Arguments
    ///
    /// * `painter` - The egui painter for drawing operations
    /// * `props` - Render props derived from the workflow
    /// * `now` - Current time in seconds, used to spin the running icon
    pub fn draw_node(&self, painter: &egui::Painter, props: &NodeRenderProps, now: f64) {
        let rect = self.window_rect(&props.screen_rect);
        if !painter.clip_rect().intersects(rect) {
            return;
        }
        let s = props.scale as f32;
        let dark = self.settings.dark_mode;
        let radius = NODE_CORNER_RADIUS * s;

        let (fill, text_color, muted_text) = if dark {
            (
                egui::Color32::from_gray(32),
                egui::Color32::from_gray(230),
                egui::Color32::from_gray(150),
            )
        } else {
            (
                egui::Color32::WHITE,
                egui::Color32::from_gray(20),
                egui::Color32::from_gray(110),
            )
        };

        let (stroke_color, stroke_width) = match props.border {
            BorderStyle::Status(token) => (color32(token), 2.5),
            BorderStyle::Primary => (PRIMARY, 2.5),
            BorderStyle::Muted => (egui::Color32::from_gray(140), 2.0),
            BorderStyle::Neutral => (egui::Color32::from_gray(if dark { 70 } else { 200 }), 2.0),
        };

        painter.rect_filled(rect, radius, fill);
        if let BorderStyle::Status(token) = props.border {
            painter.rect_filled(rect, radius, color32(token).gamma_multiply(0.08));
        }
        painter.rect_stroke(
            rect,
            radius,
            egui::Stroke::new(stroke_width * s.max(0.5), stroke_color),
            StrokeKind::Inside,
        );

        // Header: colored icon tile, label and type tag.
        let tile = egui::Rect::from_min_size(
            rect.min + egui::vec2(8.0, 6.0) * s,
            egui::vec2(24.0, 24.0) * s,
        );
        painter.rect_filled(tile, 6.0 * s, color32(props.color));
        painter.text(
            tile.center(),
            egui::Align2::CENTER_CENTER,
            props.icon.glyph(),
            egui::FontId::proportional(13.0 * s),
            egui::Color32::WHITE,
        );
        painter.text(
            egui::pos2(tile.right() + 6.0 * s, tile.top()),
            egui::Align2::LEFT_TOP,
            &props.label,
            egui::FontId::proportional(12.0 * s),
            text_color,
        );
        painter.text(
            egui::pos2(tile.right() + 6.0 * s, tile.bottom()),
            egui::Align2::LEFT_BOTTOM,
            &props.type_label,
            egui::FontId::proportional(9.0 * s),
            muted_text,
        );

        // Status icon and affordances, right-aligned in the header.
        let (configure, delete) = affordance_rects(rect, s);
        if props.shows_affordances() {
            painter.text(
                configure.center(),
                egui::Align2::CENTER_CENTER,
                "⚙",
                egui::FontId::proportional(12.0 * s),
                muted_text,
            );
            painter.text(
                delete.center(),
                egui::Align2::CENTER_CENTER,
                "✕",
                egui::FontId::proportional(12.0 * s),
                color32(ColorToken::Red),
            );
        }
        if let (Some(icon), BorderStyle::Status(token)) = (props.status_icon, props.border) {
            let slot = if props.shows_affordances() {
                configure.translate(egui::vec2(-configure.width() - 4.0 * s, 0.0))
            } else {
                delete
            };
            // The running icon blinks between two weights instead of rotating text.
            let color = if icon.spins() && (now * 2.0).fract() > 0.5 {
                color32(token).gamma_multiply(0.5)
            } else {
                color32(token)
            };
            painter.text(
                slot.center(),
                egui::Align2::CENTER_CENTER,
                icon.glyph(),
                egui::FontId::proportional(12.0 * s),
                color,
            );
        }

        // Config preview.
        let mut y = rect.top() + 36.0 * s;
        let line = 12.0 * s;
        let small = egui::FontId::monospace(9.0 * s);
        for (key, value) in &props.preview.entries {
            painter.text(
                egui::pos2(rect.left() + 10.0 * s, y),
                egui::Align2::LEFT_TOP,
                format!("{key}:"),
                small.clone(),
                muted_text,
            );
            painter.text(
                egui::pos2(rect.right() - 10.0 * s, y),
                egui::Align2::RIGHT_TOP,
                truncate(value, 14),
                small.clone(),
                text_color,
            );
            y += line;
        }
        if let Some(more) = props.preview.overflow_label() {
            painter.text(
                egui::pos2(rect.left() + 10.0 * s, y),
                egui::Align2::LEFT_TOP,
                more,
                small.clone(),
                muted_text,
            );
        }

        // Status badge, bottom-right.
        if let (Some(badge), BorderStyle::Status(token)) = (props.badge, props.border) {
            painter.text(
                egui::pos2(rect.right() - 10.0 * s, rect.bottom() - 8.0 * s),
                egui::Align2::RIGHT_BOTTOM,
                badge,
                egui::FontId::proportional(9.0 * s),
                color32(token),
            );
        }

        // Connection ports.
        let port_radius = 5.0 * s;
        painter.circle_filled(
            egui::pos2(rect.left(), rect.center().y),
            port_radius,
            color32(ColorToken::Blue),
        );
        painter.circle_filled(
            egui::pos2(rect.right(), rect.center().y),
            port_radius,
            color32(ColorToken::Green),
        );

        // Running progress bar along the bottom edge.
        if let Some(progress) = props.progress {
            let track = egui::Rect::from_min_max(
                egui::pos2(rect.left() + radius * 0.5, rect.bottom() - 4.0 * s),
                egui::pos2(rect.right() - radius * 0.5, rect.bottom() - 1.0 * s),
            );
            painter.rect_filled(track, 0.0, egui::Color32::from_gray(90));
            let mut bar = track;
            bar.set_width(track.width() * progress as f32);
            painter.rect_filled(bar, 0.0, color32(ColorToken::Blue));
        }
    }
}

/// Paints the minimap with its top-left corner at `origin`.
///
/// # Arguments
///
/// * `painter` - The egui painter for drawing operations
/// * `origin` - Window-space top-left of the minimap
/// * `projection` - Minimap-local node and viewport rectangles
/// * `dark_mode` - Whether dark visuals are active
pub fn draw_minimap(
    painter: &egui::Painter,
    origin: egui::Pos2,
    projection: &MinimapProjection,
    dark_mode: bool,
) {
    let frame = egui::Rect::from_min_size(
        origin,
        egui::vec2(MINIMAP_WIDTH as f32, MINIMAP_HEIGHT as f32),
    );
    let background = if dark_mode {
        egui::Color32::from_rgba_unmultiplied(24, 24, 28, 210)
    } else {
        egui::Color32::from_rgba_unmultiplied(250, 250, 250, 210)
    };
    painter.rect_filled(frame, 8.0, background);
    painter.rect_stroke(
        frame,
        8.0,
        egui::Stroke::new(1.0, egui::Color32::from_gray(120)),
        StrokeKind::Inside,
    );

    let clipped = painter.with_clip_rect(frame.intersect(painter.clip_rect()));
    let to_rect = |b: &BoundingBox| {
        egui::Rect::from_min_size(
            origin + egui::vec2(b.min_x as f32, b.min_y as f32),
            egui::vec2(b.width as f32, b.height as f32),
        )
    };

    for node in &projection.nodes {
        clipped.rect_filled(to_rect(&node.rect), 2.0, color32(node.color).gamma_multiply(0.8));
    }

    let viewport = to_rect(&projection.viewport);
    clipped.rect_filled(viewport, 3.0, PRIMARY.gamma_multiply(0.2));
    clipped.rect_stroke(viewport, 3.0, egui::Stroke::new(2.0, PRIMARY), StrokeKind::Inside);
}

/// Shortens `text` to at most `max` characters, adding an ellipsis when cut.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
