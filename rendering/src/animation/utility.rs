//! Frame-rate independent helpers used to move values toward a target.
//!
//! All functions take the elapsed time in milliseconds. A `delta` of zero
//! never changes the value.

use crate::color::Color;

/// Below this remaining distance [`approach_f32`] snaps onto the target.
pub const APPROACH_EPSILON: f32 = 0.001;

/// Exponential approach of `value` toward `target`.
///
/// The remaining distance shrinks by `(1 - factor)^delta`. Every call with a
/// positive `delta` moves at least one unit, so the target is reached after
/// at most `|target - value|` calls. The result is clamped into `[min, max]`
/// and never overshoots.
pub fn approach(value: i32, target: i32, factor: f32, min: i32, max: i32, delta: u32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    let target = target.clamp(min, max);
    let value = value.clamp(min, max);
    if value == target || delta == 0 {
        return value;
    }

    let remaining = (1.0 - factor.clamp(0.0, 1.0)).powf(delta as f32);
    let distance = target - value;
    let mut step = (distance as f32 * (1.0 - remaining)).round() as i32;
    if step == 0 {
        step = distance.signum();
    }
    if step.abs() >= distance.abs() {
        target
    } else {
        value + step
    }
}

pub fn approach_f32(value: f32, target: f32, factor: f32, delta: u32) -> f32 {
    if delta == 0 {
        return value;
    }
    let remaining = (1.0 - factor.clamp(0.0, 1.0)).powf(delta as f32);
    let next = target + (value - target) * remaining;
    if (target - next).abs() < APPROACH_EPSILON {
        target
    } else {
        next
    }
}

/// Linear move of `value` toward `target` by `speed` units per millisecond,
/// at least one unit per call.
pub fn translate(value: i32, target: i32, speed: f32, min: i32, max: i32, delta: u32) -> i32 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    let target = target.clamp(min, max);
    let value = value.clamp(min, max);
    if value == target || delta == 0 {
        return value;
    }

    let step = ((speed * delta as f32).round() as i32).max(1);
    let distance = target - value;
    if step >= distance.abs() {
        target
    } else {
        value + step * distance.signum()
    }
}

fn translate_f32(value: f32, target: f32, step: f32) -> f32 {
    let distance = target - value;
    if distance.abs() <= step {
        target
    } else {
        value + step * distance.signum()
    }
}

/// Per-component [`approach_f32`].
pub fn approach_color(current: Color, target: Color, factor: f32, delta: u32) -> Color {
    Color::new(
        approach_f32(current.r, target.r, factor, delta),
        approach_f32(current.g, target.g, factor, delta),
        approach_f32(current.b, target.b, factor, delta),
        approach_f32(current.a, target.a, factor, delta),
    )
}

/// Per-component linear move, `speed` in color units per millisecond.
pub fn translate_color(current: Color, target: Color, speed: f32, delta: u32) -> Color {
    if delta == 0 {
        return current;
    }
    let step = speed.abs() * delta as f32;
    Color::new(
        translate_f32(current.r, target.r, step),
        translate_f32(current.g, target.g, step),
        translate_f32(current.b, target.b, step),
        translate_f32(current.a, target.a, step),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_delta_keeps_value() {
        assert_eq!(approach(10, 200, 0.5, 0, 255, 0), 10);
        assert_eq!(translate(10, 200, 0.5, 0, 255, 0), 10);
        assert_eq!(approach_f32(0.25, 1.0, 0.5, 0), 0.25);
    }

    #[test]
    fn approach_reaches_target_within_distance_calls() {
        for (start, target) in [(0i32, 255i32), (255, 102), (17, 18), (200, 0)] {
            let mut value = start;
            let distance = (target - start).abs();
            for call in 0..distance {
                let next = approach(value, target, 0.0001, 0, 255, 1);
                let lo = value.min(target);
                let hi = value.max(target);
                assert!((lo..=hi).contains(&next), "call {call} left the range");
                assert!(next != value || value == target, "call {call} did not move");
                value = next;
                if value == target {
                    break;
                }
            }
            assert_eq!(value, target);
        }
    }

    #[test]
    fn approach_never_overshoots() {
        assert_eq!(approach(0, 10, 1.0, 0, 255, 100), 10);
        assert_eq!(approach(10, 0, 0.9, 0, 255, 1000), 0);
    }

    #[test]
    fn approach_clamps_target() {
        assert_eq!(approach(250, 400, 1.0, 0, 255, 16), 255);
        assert_eq!(approach(5, -50, 1.0, 0, 255, 16), 0);
    }

    #[test]
    fn approach_is_exponential() {
        let value = approach(0, 1000, 0.5, 0, 1000, 1);
        assert_eq!(value, 500);
    }

    #[test]
    fn translate_moves_linearly() {
        assert_eq!(translate(0, 100, 0.1, 0, 255, 100), 10);
        assert_eq!(translate(95, 100, 0.1, 0, 255, 100), 100);
        assert_eq!(translate(50, 0, 0.001, 0, 255, 1), 49);
    }

    #[test]
    fn approach_f32_snaps_near_target() {
        let mut fog = 0.0;
        for _ in 0..10_000 {
            fog = approach_f32(fog, 0.8, 0.01, 16);
        }
        assert_eq!(fog, 0.8);
    }

    #[test]
    fn translate_color_caps_each_component() {
        let from = Color::new(0.0, 0.5, 1.0, 1.0);
        let to = Color::new(1.0, 0.5, 0.0, 1.0);
        let next = translate_color(from, to, 0.001, 100);
        assert!((next.r - 0.1).abs() < 1e-6);
        assert_eq!(next.g, 0.5);
        assert!((next.b - 0.9).abs() < 1e-6);
    }

    #[test]
    fn approach_color_moves_toward_target() {
        let next = approach_color(Color::BLACK, Color::WHITE, 0.5, 1);
        assert!((next.r - 0.5).abs() < 1e-6);
        assert_eq!(next.a, 1.0);
    }
}
