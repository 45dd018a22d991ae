use eframe::egui::{Pos2, Rect, Vec2};

pub(super) const MIN_ZOOM: f32 = 0.05;
pub(super) const MAX_ZOOM: f32 = 6.0;

/// Request from the layout engine once a placement is final.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum CameraCommand {
    Focus { center: Vec2, zoom: f32 },
    Fit { min: Vec2, max: Vec2, padding: f32 },
}

/// Pan/zoom over world space. `pan` is the screen offset of the world origin from the
/// viewport center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Camera {
    pub(super) pan: Vec2,
    pub(super) zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub(super) fn world_to_screen(&self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.pan + world * self.zoom
    }

    pub(super) fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.pan) / self.zoom
    }

    pub(super) fn center_on(&mut self, point: Vec2) {
        self.pan = -point * self.zoom;
    }

    /// Zooms around the viewport center, keeping the world point under it fixed.
    pub(super) fn zoom_to(&mut self, level: f32) {
        let center = -self.pan / self.zoom;
        self.zoom = level.clamp(MIN_ZOOM, MAX_ZOOM);
        self.center_on(center);
    }

    /// Zooms around `pointer`, keeping the world point under it fixed.
    pub(super) fn zoom_at(&mut self, rect: Rect, pointer: Pos2, factor: f32) {
        let world_before = self.screen_to_world(rect, pointer);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(super) fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    pub(super) fn fit_to_view(&mut self, min: Vec2, max: Vec2, viewport: Vec2, padding: f32) {
        let span = (max - min).max(Vec2::splat(1.0));
        let usable = (viewport - Vec2::splat(padding * 2.0)).max(Vec2::splat(1.0));
        self.zoom = (usable.x / span.x).min(usable.y / span.y).clamp(MIN_ZOOM, MAX_ZOOM);
        self.center_on((min + max) * 0.5);
    }

    pub(super) fn apply(&mut self, command: CameraCommand, viewport: Vec2) {
        match command {
            CameraCommand::Focus { center, zoom } => {
                self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
                self.center_on(center);
            }
            CameraCommand::Fit { min, max, padding } => {
                self.fit_to_view(min, max, viewport, padding);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    fn viewport() -> Rect {
        Rect::from_min_size(pos2(100.0, 50.0), vec2(800.0, 600.0))
    }

    #[test]
    fn center_on_places_point_at_viewport_center() {
        let mut camera = Camera {
            pan: Vec2::ZERO,
            zoom: 1.5,
        };
        camera.center_on(vec2(40.0, -20.0));
        let screen = camera.world_to_screen(viewport(), vec2(40.0, -20.0));
        assert!((screen - viewport().center()).length() < 1e-3);
    }

    #[test]
    fn zoom_at_keeps_pointer_anchored() {
        let mut camera = Camera::default();
        let pointer = pos2(300.0, 200.0);
        let before = camera.screen_to_world(viewport(), pointer);
        camera.zoom_at(viewport(), pointer, 1.15);
        let after = camera.screen_to_world(viewport(), pointer);
        assert!((before - after).length() < 1e-3);
        assert!((camera.zoom - 1.15).abs() < 1e-6);
    }

    #[test]
    fn fit_to_view_contains_bounds_with_padding() {
        let mut camera = Camera::default();
        let rect = viewport();
        camera.apply(
            CameraCommand::Fit {
                min: vec2(-400.0, -100.0),
                max: vec2(400.0, 100.0),
                padding: 40.0,
            },
            rect.size(),
        );

        assert!((camera.zoom - (720.0 / 800.0)).abs() < 1e-5);
        let corner = camera.world_to_screen(rect, vec2(400.0, 100.0));
        assert!(corner.x <= rect.right() - 40.0 + 1e-3);
        assert!(corner.y <= rect.bottom() - 40.0 + 1e-3);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::default();
        camera.zoom_to(100.0);
        assert_eq!(camera.zoom, MAX_ZOOM);
        camera.apply(
            CameraCommand::Focus {
                center: Vec2::ZERO,
                zoom: 0.0,
            },
            vec2(800.0, 600.0),
        );
        assert_eq!(camera.zoom, MIN_ZOOM);
    }
}
