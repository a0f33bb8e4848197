//! Time driven animations and the manager that ticks them.
//!
//! Animations never hold references to the things they animate. Each one keeps
//! a list of [`TargetId`]s and the [`AnimationManager`] hands every update to an
//! [`AnimationSink`] which resolves the ids.

mod frame;
mod manager;
mod movement;
pub mod utility;

pub use frame::{FrameAnimation, FrameMode};
pub use manager::{AnimationManager, AnimationSink, Scheduler};
pub use movement::MoveAnimation;

use crate::geometry::DisplayCoordinate;
use std::any::Any;
use std::fmt;

/// Generational handle into the [`AnimationManager`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationHandle {
    index: u32,
    generation: u32,
}

/// Identifies something that receives animation updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationEvent {
    Started,
    Frame(usize),
    Position(DisplayCoordinate),
    Finished { completed: bool },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetUpdate {
    Frame(usize),
    Position(DisplayCoordinate),
}

impl From<TargetUpdate> for AnimationEvent {
    fn from(update: TargetUpdate) -> Self {
        match update {
            TargetUpdate::Frame(frame) => AnimationEvent::Frame(frame),
            TargetUpdate::Position(position) => AnimationEvent::Position(position),
        }
    }
}

/// Result of a single [`Animation::animate`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationStep {
    pub running: bool,
    pub update: Option<TargetUpdate>,
}

impl AnimationStep {
    pub const fn running(update: Option<TargetUpdate>) -> Self {
        Self {
            running: true,
            update,
        }
    }

    pub const fn finished(update: Option<TargetUpdate>) -> Self {
        Self {
            running: false,
            update,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationError {
    DurationNotSet,
    StartNotSet,
    UnknownHandle(AnimationHandle),
}

impl fmt::Display for AnimationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimationError::DurationNotSet => write!(f, "animation duration was not set"),
            AnimationError::StartNotSet => write!(f, "animation start position was not set"),
            AnimationError::UnknownHandle(handle) => {
                write!(f, "no animation for handle {}:{}", handle.index, handle.generation)
            }
        }
    }
}

impl std::error::Error for AnimationError {}

/// Targets of an animation. Changes are queued and only become visible after
/// [`TargetList::apply`], so callbacks may add or remove targets while the
/// list is being walked.
#[derive(Debug, Default, Clone)]
pub struct TargetList {
    targets: Vec<TargetId>,
    added: Vec<TargetId>,
    removed: Vec<TargetId>,
}

impl TargetList {
    pub fn add(&mut self, target: TargetId) {
        self.removed.retain(|t| *t != target);
        if !self.added.contains(&target) {
            self.added.push(target);
        }
    }

    pub fn remove(&mut self, target: TargetId) {
        self.added.retain(|t| *t != target);
        if !self.removed.contains(&target) {
            self.removed.push(target);
        }
    }

    pub fn apply(&mut self) {
        for target in self.removed.drain(..) {
            self.targets.retain(|t| *t != target);
        }
        for target in self.added.drain(..) {
            if !self.targets.contains(&target) {
                self.targets.push(target);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = TargetId> + '_ {
        self.targets.iter().copied()
    }

    pub fn contains(&self, target: TargetId) -> bool {
        self.targets.contains(&target)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// State shared by every animation.
#[derive(Debug, Clone)]
pub struct AnimationState {
    duration: u32,
    current_time: u32,
    running: bool,
    storyboard_start: f32,
    storyboard_end: f32,
    skip_next_update: bool,
    targets: TargetList,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl AnimationState {
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            current_time: 0,
            running: false,
            storyboard_start: 0.0,
            storyboard_end: 1.0,
            skip_next_update: false,
            targets: TargetList::default(),
        }
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: u32) {
        self.duration = duration;
    }

    pub fn current_time(&self) -> u32 {
        self.current_time
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Restricts the visible part of the animation to `[start, end)`.
    pub fn set_storyboard(&mut self, start: f32, end: f32) {
        let start = start.clamp(0.0, 1.0);
        self.storyboard_start = start;
        self.storyboard_end = end.clamp(start, 1.0);
    }

    pub fn animation_progress(&self) -> f32 {
        if self.duration == 0 {
            return 1.0;
        }
        (self.current_time as f32 / self.duration as f32).min(1.0)
    }

    pub fn storyboard_progress(&self) -> f32 {
        self.storyboard_start
            + (self.storyboard_end - self.storyboard_start) * self.animation_progress()
    }

    pub fn skip_next_update(&mut self) {
        self.skip_next_update = true;
    }

    pub fn reset(&mut self) {
        self.current_time = 0;
    }

    pub fn is_time_up(&self) -> bool {
        self.current_time >= self.duration
    }

    /// Advances the clock by `delta` unless the update is to be skipped.
    /// Returns whether the end of the duration was reached.
    pub fn advance(&mut self, delta: u32) -> bool {
        if std::mem::take(&mut self.skip_next_update) {
            return self.is_time_up();
        }
        self.current_time = self.current_time.saturating_add(delta);
        self.is_time_up()
    }

    pub(crate) fn wrap(&mut self) {
        if self.duration > 0 {
            self.current_time %= self.duration;
        }
    }

    pub fn targets(&self) -> &TargetList {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> &mut TargetList {
        &mut self.targets
    }
}

pub trait Animation: Any {
    fn state(&self) -> &AnimationState;
    fn state_mut(&mut self) -> &mut AnimationState;

    /// Performs one step. Called by the manager while the animation runs.
    fn animate(&mut self, delta: u32) -> AnimationStep;

    /// Hook run when the manager (re)starts the animation. The returned
    /// update is delivered to the targets right after `Started`.
    fn on_start(&mut self) -> Option<TargetUpdate> {
        None
    }

    /// Rewinds a possibly running animation without re-registering it.
    fn restart(&mut self) -> Result<Option<TargetUpdate>, AnimationError> {
        self.state_mut().reset();
        Ok(None)
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
