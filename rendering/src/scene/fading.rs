use super::constants::{CORRIDOR_DEPTH_TOLERANCE, CORRIDOR_TOLERANCE};
use crate::geometry::Rectangle;
use game_types::XRaySize;

/// Screen area between the player and the viewer. Objects inside it and in
/// front of the player are faded out so the player stays visible.
#[derive(Debug, Clone, Default)]
pub struct FadingCorridor {
    enabled: bool,
    size: XRaySize,
    corridor: Rectangle,
    depth: f32,
}

impl FadingCorridor {
    pub fn new(size: XRaySize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn size(&self) -> XRaySize {
        self.size
    }

    pub fn set_size(&mut self, size: XRaySize) {
        self.size = size;
        if size == XRaySize::Off {
            self.enabled = false;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn corridor(&self) -> Rectangle {
        self.corridor
    }

    /// Places the corridor over the avatar at `avatar_rect` on `avatar_layer`.
    pub fn set_corridor(&mut self, avatar_rect: Rectangle, avatar_layer: i32) {
        let multiplier = self.size.corridor_multiplier();
        if multiplier <= 0.0 {
            self.enabled = false;
            return;
        }
        let tolerance = (CORRIDOR_TOLERANCE as f32 * multiplier).round() as i32;
        self.corridor = avatar_rect.shrink(tolerance);
        self.depth = avatar_layer as f32 - CORRIDOR_DEPTH_TOLERANCE;
        self.enabled = !self.corridor.is_empty();
    }

    pub fn clear(&mut self) {
        self.enabled = false;
        self.corridor = Rectangle::EMPTY;
    }

    pub fn is_in_corridor(&self, x: i32, y: i32, layer: i32, width: i32, height: i32) -> bool {
        self.is_rect_in_corridor(&Rectangle::new(x, y, width, height), layer)
    }

    pub fn is_rect_in_corridor(&self, rect: &Rectangle, layer: i32) -> bool {
        self.enabled && (layer as f32) < self.depth && self.corridor.intersects(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> FadingCorridor {
        let mut corridor = FadingCorridor::new(XRaySize::Small);
        corridor.set_corridor(Rectangle::new(100, 100, 40, 80), 500);
        corridor
    }

    #[test]
    fn objects_in_front_fade() {
        assert!(corridor().is_in_corridor(110, 120, 499, 30, 30));
    }

    #[test]
    fn objects_on_the_avatar_layer_do_not_fade() {
        assert!(!corridor().is_in_corridor(110, 120, 500, 30, 30));
        assert!(!corridor().is_in_corridor(110, 120, 510, 30, 30));
    }

    #[test]
    fn tolerance_trims_the_edges() {
        let corridor = corridor();
        assert_eq!(corridor.corridor(), Rectangle::new(105, 105, 30, 70));
        assert!(!corridor.is_in_corridor(100, 100, 0, 5, 5));
    }

    #[test]
    fn off_disables_everything() {
        let mut corridor = corridor();
        corridor.set_size(XRaySize::Off);
        assert!(!corridor.is_in_corridor(110, 120, 0, 30, 30));
        corridor.set_corridor(Rectangle::new(100, 100, 40, 80), 500);
        assert!(!corridor.is_enabled());
    }
}
