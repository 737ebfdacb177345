use egui::{Pos2, Vec2};

/// Where the canvas looks and how far it is zoomed.
///
/// `screen = (world - offset) * zoom`
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub offset: Vec2,
    pub zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.25, 4.0)
    }
}

impl Viewport {
    pub fn new(min_zoom: f32, max_zoom: f32) -> Self {
        let (min_zoom, max_zoom) = if min_zoom <= max_zoom {
            (min_zoom, max_zoom)
        } else {
            (max_zoom, min_zoom)
        };
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0_f32.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
        }
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        (screen.to_vec2() / self.zoom + self.offset).to_pos2()
    }

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        ((world.to_vec2() - self.offset) * self.zoom).to_pos2()
    }

    /// Move the view by a screen-space drag delta.
    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.offset -= screen_delta / self.zoom;
    }

    /// Multiply the zoom by `factor`, keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, factor: f32, anchor: Pos2) {
        if !factor.is_finite() || factor <= 0.0 {
            log::warn!("ignoring zoom factor {factor}");
            return;
        }
        let world_anchor = self.screen_to_world(anchor);
        self.zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        self.offset = world_anchor.to_vec2() - anchor.to_vec2() / self.zoom;
    }
}
