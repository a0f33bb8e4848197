use super::{Animation, AnimationState, AnimationStep, TargetUpdate};
use std::any::Any;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameMode {
    /// Count frames down from the still frame.
    pub backwards: bool,
    /// Return to the still frame once the animation ends.
    pub cyclic: bool,
    /// Never end, wrap around instead.
    pub looped: bool,
}

impl FrameMode {
    pub const ONCE: FrameMode = FrameMode {
        backwards: false,
        cyclic: false,
        looped: false,
    };
    pub const CYCLIC: FrameMode = FrameMode {
        backwards: false,
        cyclic: true,
        looped: false,
    };
    pub const LOOPED: FrameMode = FrameMode {
        backwards: false,
        cyclic: false,
        looped: true,
    };

    pub const fn backwards(self) -> Self {
        Self {
            backwards: true,
            ..self
        }
    }
}

/// Walks through the frames of a sprite over the duration of the animation.
#[derive(Debug, Clone)]
pub struct FrameAnimation {
    state: AnimationState,
    frames: usize,
    still_frame: usize,
    mode: FrameMode,
    current_frame: Option<usize>,
}

impl FrameAnimation {
    pub fn new(frames: usize, still_frame: usize, duration: u32, mode: FrameMode) -> Self {
        let frames = frames.max(1);
        Self {
            state: AnimationState::new(duration),
            frames,
            still_frame: still_frame % frames,
            mode,
            current_frame: None,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn still_frame(&self) -> usize {
        self.still_frame
    }

    pub fn mode(&self) -> FrameMode {
        self.mode
    }

    pub fn current_frame(&self) -> Option<usize> {
        self.current_frame
    }

    pub fn set_mode(&mut self, mode: FrameMode) {
        self.mode = mode;
    }

    pub fn set_duration(&mut self, duration: u32) {
        self.state.set_duration(duration);
    }

    /// Changes the sprite this animation runs over.
    pub fn set_frames(&mut self, frames: usize, still_frame: usize) {
        self.frames = frames.max(1);
        self.still_frame = still_frame % self.frames;
    }

    fn frame_at_step(&self, step: i64) -> usize {
        let frames = self.frames as i64;
        let offset = if self.mode.backwards { -step } else { step };
        (self.still_frame as i64 + frames + offset).rem_euclid(frames) as usize
    }

    fn frame_at(&self, progress: f32) -> usize {
        let step = (self.frames as f32 * progress).floor() as i64;
        self.frame_at_step(step.min(self.frames as i64 - 1))
    }
}

impl Animation for FrameAnimation {
    fn state(&self) -> &AnimationState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AnimationState {
        &mut self.state
    }

    fn animate(&mut self, delta: u32) -> AnimationStep {
        let mut running = true;
        let frame = if self.state.advance(delta) {
            if self.mode.looped {
                self.state.wrap();
                self.frame_at(self.state.storyboard_progress())
            } else {
                running = false;
                if self.mode.cyclic {
                    self.still_frame
                } else {
                    self.frame_at_step(self.frames as i64 - 1)
                }
            }
        } else {
            self.frame_at(self.state.storyboard_progress())
        };

        let update = if self.current_frame != Some(frame) {
            self.current_frame = Some(frame);
            Some(TargetUpdate::Frame(frame))
        } else {
            None
        };
        AnimationStep { running, update }
    }

    fn on_start(&mut self) -> Option<TargetUpdate> {
        self.current_frame = None;
        None
    }

    fn restart(&mut self) -> Result<Option<TargetUpdate>, super::AnimationError> {
        self.state.reset();
        self.current_frame = None;
        Ok(None)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
