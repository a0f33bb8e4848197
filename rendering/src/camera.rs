use crate::geometry::Rectangle;
use glam::{Mat4, Vec2};

/// Visible part of the display plane.
#[derive(Debug, Clone)]
pub struct Camera {
    screen_width: i32,
    screen_height: i32,
    zoom: f32,
    viewport: Rectangle,
}

impl Camera {
    pub fn new(screen_width: i32, screen_height: i32, zoom: f32) -> Self {
        let mut camera = Self {
            screen_width,
            screen_height,
            zoom: zoom.max(0.1),
            viewport: Rectangle::EMPTY,
        };
        camera.fit_viewport(Vec2::ZERO);
        camera.viewport.x = 0;
        camera.viewport.y = 0;
        camera
    }

    pub fn viewport(&self) -> Rectangle {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Rectangle) {
        self.viewport = viewport;
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.max(0.1);
        self.fit_viewport(self.center());
    }

    pub fn resize(&mut self, screen_width: i32, screen_height: i32) {
        self.screen_width = screen_width;
        self.screen_height = screen_height;
        self.fit_viewport(self.center());
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.viewport.x as f32 + self.viewport.width as f32 / 2.0,
            self.viewport.y as f32 + self.viewport.height as f32 / 2.0,
        )
    }

    pub fn center_on(&mut self, x: i32, y: i32) {
        self.viewport.x = x - self.viewport.width / 2;
        self.viewport.y = y - self.viewport.height / 2;
    }

    fn fit_viewport(&mut self, center: Vec2) {
        let width = (self.screen_width as f32 / self.zoom).round() as i32;
        let height = (self.screen_height as f32 / self.zoom).round() as i32;
        self.viewport = Rectangle::new(
            (center.x - width as f32 / 2.0).round() as i32,
            (center.y - height as f32 / 2.0).round() as i32,
            width,
            height,
        );
    }

    /// Whether something covering `rect` is at least partly visible.
    pub fn requires_update(&self, rect: &Rectangle) -> bool {
        !rect.is_empty() && self.viewport.intersects(rect)
    }

    /// Converts a screen pixel position to display coordinates.
    pub fn screen_to_display(&self, x: i32, y: i32) -> (i32, i32) {
        (
            self.viewport.x + (x as f32 / self.zoom).round() as i32,
            self.viewport.y + (y as f32 / self.zoom).round() as i32,
        )
    }

    pub fn build_view_projection_matrix(&self) -> [[f32; 4]; 4] {
        // Lower layers are nearer, they map to higher depth values.
        let v = self.viewport;
        Mat4::orthographic_rh(
            v.x as f32,
            v.right() as f32,
            v.bottom() as f32,
            v.y as f32,
            1.0,
            -1.0,
        )
        .to_cols_array_2d()
    }
}

/// Fog color used for the tint of the post effects.
const FOG_COLOR: [f32; 3] = [0.55, 0.6, 0.65];

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 2],
    pub grayscale: f32,
    pub _padding: f32,
    /// Fog color in rgb, fog strength in alpha.
    pub tint: [f32; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::default().to_cols_array_2d(),
            position: [0.0; 2],
            grayscale: 0.0,
            _padding: 0.0,
            tint: [0.0, 0.0, 0.0, 0.0],
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_proj = camera.build_view_projection_matrix();
        self.position = camera.center().to_array();
    }

    pub fn set_post_effects(&mut self, fog: f32, grayscale: f32) {
        let [r, g, b] = FOG_COLOR;
        self.tint = [r, g, b, fog.clamp(0.0, 1.0)];
        self.grayscale = grayscale.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_camera_starts_at_origin() {
        let camera = Camera::new(800, 600, 1.0);
        assert_eq!(camera.viewport(), Rectangle::new(0, 0, 800, 600));
    }

    #[test]
    fn requires_update_needs_overlap() {
        let camera = Camera::new(800, 600, 1.0);
        assert!(camera.requires_update(&Rectangle::new(790, 590, 20, 20)));
        assert!(!camera.requires_update(&Rectangle::new(800, 0, 20, 20)));
        assert!(!camera.requires_update(&Rectangle::new(10, 10, 0, 0)));
    }

    #[test]
    fn centering_keeps_size() {
        let mut camera = Camera::new(800, 600, 1.0);
        camera.center_on(1000, -200);
        assert_eq!(camera.viewport(), Rectangle::new(600, -500, 800, 600));
        assert_eq!(camera.center(), Vec2::new(1000.0, -200.0));
    }

    #[test]
    fn zoom_shrinks_the_visible_area() {
        let mut camera = Camera::new(800, 600, 1.0);
        camera.center_on(0, 0);
        camera.set_zoom(2.0);
        assert_eq!(camera.viewport(), Rectangle::new(-200, -150, 400, 300));
        assert_eq!(camera.screen_to_display(400, 300), (0, 0));
    }

    #[test]
    fn post_effects_are_clamped() {
        let mut uniform = CameraUniform::new();
        uniform.set_post_effects(1.5, -1.0);
        assert_eq!(uniform.tint[3], 1.0);
        assert_eq!(uniform.grayscale, 0.0);
    }
}
