use super::{Animation, AnimationError, AnimationState, AnimationStep, TargetUpdate};
use crate::geometry::DisplayCoordinate;
use std::any::Any;

/// Moves targets on a straight line between two display coordinates.
#[derive(Debug, Clone, Default)]
pub struct MoveAnimation {
    state: AnimationState,
    start: Option<DisplayCoordinate>,
    end: DisplayCoordinate,
    current: Option<DisplayCoordinate>,
}

fn lerp(from: i32, to: i32, progress: f32) -> i32 {
    (from as f32 + (to - from) as f32 * progress).round() as i32
}

impl MoveAnimation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_move(&mut self, start: DisplayCoordinate, end: DisplayCoordinate, duration: u32) {
        self.start = Some(start);
        self.end = end;
        self.state.set_duration(duration);
    }

    pub fn start_position(&self) -> Option<DisplayCoordinate> {
        self.start
    }

    pub fn end_position(&self) -> DisplayCoordinate {
        self.end
    }

    pub fn current_position(&self) -> Option<DisplayCoordinate> {
        self.current
    }
}

impl Animation for MoveAnimation {
    fn state(&self) -> &AnimationState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AnimationState {
        &mut self.state
    }

    fn animate(&mut self, delta: u32) -> AnimationStep {
        let Some(start) = self.start else {
            return AnimationStep::finished(None);
        };

        let done = self.state.advance(delta);
        let position = if done {
            self.end
        } else {
            let progress = self.state.storyboard_progress().clamp(0.0, 1.0);
            DisplayCoordinate {
                x: lerp(start.x, self.end.x, progress),
                y: lerp(start.y, self.end.y, progress),
                layer: lerp(start.layer, self.end.layer, progress),
            }
        };

        let update = if self.current != Some(position) {
            self.current = Some(position);
            Some(TargetUpdate::Position(position))
        } else {
            None
        };
        AnimationStep {
            running: !done,
            update,
        }
    }

    fn on_start(&mut self) -> Option<TargetUpdate> {
        self.current = self.start;
        self.start.map(TargetUpdate::Position)
    }

    fn restart(&mut self) -> Result<Option<TargetUpdate>, AnimationError> {
        let start = self.start.ok_or(AnimationError::StartNotSet)?;
        self.state.reset();
        self.state.skip_next_update();
        self.current = Some(start);
        Ok(Some(TargetUpdate::Position(start)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{
        AnimationEvent, AnimationHandle, AnimationManager, Scheduler, TargetId,
    };

    #[test]
    fn moves_linearly_and_snaps_to_end() {
        let mut manager = AnimationManager::new();
        let mut walk = MoveAnimation::new();
        walk.set_move(
            DisplayCoordinate::new(0, 0, 0),
            DisplayCoordinate::new(100, 0, 0),
            1000,
        );
        let handle = manager.insert(walk);
        manager.add_target(handle, TargetId(1)).unwrap();

        let mut events = Vec::new();
        let mut sink = |_: AnimationHandle,
                        _: TargetId,
                        event: AnimationEvent,
                        _: &mut Scheduler<'_>| events.push(event);
        manager.start(handle, &mut sink).unwrap();
        manager.animate(500, &mut sink);
        manager.animate(600, &mut sink);

        assert_eq!(
            events,
            vec![
                AnimationEvent::Started,
                AnimationEvent::Position(DisplayCoordinate::new(0, 0, 0)),
                AnimationEvent::Position(DisplayCoordinate::new(50, 0, 0)),
                AnimationEvent::Position(DisplayCoordinate::new(100, 0, 0)),
                AnimationEvent::Finished { completed: true },
            ]
        );
        assert!(!manager.is_running(handle));
    }

    #[test]
    fn interpolates_layer_with_rounding() {
        let mut walk = MoveAnimation::new();
        walk.set_move(
            DisplayCoordinate::new(0, 0, 10),
            DisplayCoordinate::new(-38, 18, 0),
            300,
        );
        walk.state_mut().set_running(true);
        let step = walk.animate(100);
        assert_eq!(
            step.update,
            Some(TargetUpdate::Position(DisplayCoordinate::new(-13, 6, 7)))
        );
    }

    #[test]
    fn restart_requires_start() {
        let mut walk = MoveAnimation::new();
        assert_eq!(walk.restart(), Err(AnimationError::StartNotSet));
    }

    #[test]
    fn restart_skips_the_following_update() {
        let mut walk = MoveAnimation::new();
        walk.set_move(
            DisplayCoordinate::new(0, 0, 0),
            DisplayCoordinate::new(100, 0, 0),
            100,
        );
        walk.state_mut().set_running(true);
        walk.animate(50);

        let update = walk.restart().unwrap();
        assert_eq!(
            update,
            Some(TargetUpdate::Position(DisplayCoordinate::new(0, 0, 0)))
        );
        let step = walk.animate(50);
        assert_eq!(step.update, None);
        assert!(step.running);
        let step = walk.animate(50);
        assert_eq!(
            step.update,
            Some(TargetUpdate::Position(DisplayCoordinate::new(50, 0, 0)))
        );
    }
}
