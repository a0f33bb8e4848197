use super::{
    Animation, AnimationError, AnimationEvent, AnimationHandle, AnimationState, TargetId,
    TargetUpdate,
};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Receives the updates produced by the [`AnimationManager`].
pub trait AnimationSink {
    fn deliver(
        &mut self,
        animation: AnimationHandle,
        target: TargetId,
        event: AnimationEvent,
        scheduler: &mut Scheduler<'_>,
    );
}

impl<F> AnimationSink for F
where
    F: FnMut(AnimationHandle, TargetId, AnimationEvent, &mut Scheduler<'_>),
{
    fn deliver(
        &mut self,
        animation: AnimationHandle,
        target: TargetId,
        event: AnimationEvent,
        scheduler: &mut Scheduler<'_>,
    ) {
        self(animation, target, event, scheduler)
    }
}

struct Entry {
    animation: Box<dyn Animation>,
    registered: bool,
}

#[derive(Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

struct Notice {
    animation: AnimationHandle,
    target: TargetId,
    event: AnimationEvent,
}

/// Owns all animations and drives the running ones once per tick.
///
/// Starting an animation only queues it. The queue is moved into the live set
/// at the beginning of [`AnimationManager::animate`], so an animation started
/// from inside a callback is first stepped on the following tick.
#[derive(Default)]
pub struct AnimationManager {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: Vec<AnimationHandle>,
    queue: Vec<AnimationHandle>,
    notices: VecDeque<Notice>,
}

/// Restricted view on the manager handed to callbacks.
pub struct Scheduler<'a> {
    slots: &'a mut [Slot],
    queue: &'a mut Vec<AnimationHandle>,
    notices: &'a mut VecDeque<Notice>,
}

impl Scheduler<'_> {
    pub fn start(&mut self, handle: AnimationHandle) -> Result<(), AnimationError> {
        start_entry(self.slots, self.queue, self.notices, handle)
    }

    pub fn restart(&mut self, handle: AnimationHandle) -> Result<(), AnimationError> {
        restart_entry(self.slots, self.queue, self.notices, handle)
    }

    pub fn stop(&mut self, handle: AnimationHandle) -> Result<(), AnimationError> {
        entry_mut(self.slots, handle)?
            .animation
            .state_mut()
            .set_running(false);
        Ok(())
    }

    pub fn add_target(
        &mut self,
        handle: AnimationHandle,
        target: TargetId,
    ) -> Result<(), AnimationError> {
        entry_mut(self.slots, handle)?
            .animation
            .state_mut()
            .targets_mut()
            .add(target);
        Ok(())
    }

    pub fn remove_target(
        &mut self,
        handle: AnimationHandle,
        target: TargetId,
    ) -> Result<(), AnimationError> {
        entry_mut(self.slots, handle)?
            .animation
            .state_mut()
            .targets_mut()
            .remove(target);
        Ok(())
    }

    pub fn is_running(&self, handle: AnimationHandle) -> bool {
        entry(self.slots, handle).is_ok_and(|e| e.animation.state().is_running())
    }
}

fn entry(slots: &[Slot], handle: AnimationHandle) -> Result<&Entry, AnimationError> {
    slots
        .get(handle.index as usize)
        .filter(|slot| slot.generation == handle.generation)
        .and_then(|slot| slot.entry.as_ref())
        .ok_or(AnimationError::UnknownHandle(handle))
}

fn entry_mut(slots: &mut [Slot], handle: AnimationHandle) -> Result<&mut Entry, AnimationError> {
    slots
        .get_mut(handle.index as usize)
        .filter(|slot| slot.generation == handle.generation)
        .and_then(|slot| slot.entry.as_mut())
        .ok_or(AnimationError::UnknownHandle(handle))
}

fn notify(
    notices: &mut VecDeque<Notice>,
    animation: AnimationHandle,
    state: &AnimationState,
    event: AnimationEvent,
) {
    for target in state.targets().iter() {
        notices.push_back(Notice {
            animation,
            target,
            event,
        });
    }
}

fn register(entry: &mut Entry, queue: &mut Vec<AnimationHandle>, handle: AnimationHandle) {
    if !entry.registered {
        entry.registered = true;
        queue.push(handle);
        trace!(?handle, "animation queued");
    }
}

fn start_entry(
    slots: &mut [Slot],
    queue: &mut Vec<AnimationHandle>,
    notices: &mut VecDeque<Notice>,
    handle: AnimationHandle,
) -> Result<(), AnimationError> {
    let entry = entry_mut(slots, handle)?;
    if entry.animation.state().duration() == 0 {
        return Err(AnimationError::DurationNotSet);
    }

    let state = entry.animation.state_mut();
    state.reset();
    state.set_running(true);
    state.targets_mut().apply();
    let initial = entry.animation.on_start();

    notify(
        notices,
        handle,
        entry.animation.state(),
        AnimationEvent::Started,
    );
    if let Some(update) = initial {
        notify(notices, handle, entry.animation.state(), update.into());
    }
    register(entry, queue, handle);
    Ok(())
}

fn restart_entry(
    slots: &mut [Slot],
    queue: &mut Vec<AnimationHandle>,
    notices: &mut VecDeque<Notice>,
    handle: AnimationHandle,
) -> Result<(), AnimationError> {
    let entry = entry_mut(slots, handle)?;
    if entry.animation.state().duration() == 0 {
        return Err(AnimationError::DurationNotSet);
    }

    let was_running = entry.animation.state().is_running();
    let update = entry.animation.restart()?;
    let state = entry.animation.state_mut();
    state.set_running(true);
    state.targets_mut().apply();

    if !was_running {
        notify(
            notices,
            handle,
            entry.animation.state(),
            AnimationEvent::Started,
        );
    }
    if let Some(update) = update {
        notify(notices, handle, entry.animation.state(), update.into());
    }
    register(entry, queue, handle);
    Ok(())
}

impl AnimationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, animation: impl Animation) -> AnimationHandle {
        let entry = Entry {
            animation: Box::new(animation),
            registered: false,
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            AnimationHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            AnimationHandle {
                index,
                generation: 0,
            }
        }
    }

    /// Drops the animation without notifying its targets.
    pub fn remove(&mut self, handle: AnimationHandle) -> Option<Box<dyn Animation>> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?;
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Some(entry.animation)
    }

    pub fn contains(&self, handle: AnimationHandle) -> bool {
        entry(&self.slots, handle).is_ok()
    }

    pub fn get<A: Animation>(&self, handle: AnimationHandle) -> Option<&A> {
        entry(&self.slots, handle)
            .ok()?
            .animation
            .as_any()
            .downcast_ref::<A>()
    }

    pub fn get_mut<A: Animation>(&mut self, handle: AnimationHandle) -> Option<&mut A> {
        entry_mut(&mut self.slots, handle)
            .ok()?
            .animation
            .as_any_mut()
            .downcast_mut::<A>()
    }

    pub fn is_running(&self, handle: AnimationHandle) -> bool {
        entry(&self.slots, handle).is_ok_and(|e| e.animation.state().is_running())
    }

    /// Number of animations stepped by the last tick or queued for the next.
    pub fn active_count(&self) -> usize {
        self.live.len() + self.queue.len()
    }

    pub fn add_target(
        &mut self,
        handle: AnimationHandle,
        target: TargetId,
    ) -> Result<(), AnimationError> {
        self.scheduler().add_target(handle, target)
    }

    pub fn remove_target(
        &mut self,
        handle: AnimationHandle,
        target: TargetId,
    ) -> Result<(), AnimationError> {
        self.scheduler().remove_target(handle, target)
    }

    /// Starts the animation from the beginning and notifies every target.
    pub fn start(
        &mut self,
        handle: AnimationHandle,
        sink: &mut dyn AnimationSink,
    ) -> Result<(), AnimationError> {
        start_entry(&mut self.slots, &mut self.queue, &mut self.notices, handle)?;
        self.flush(sink);
        Ok(())
    }

    /// Rewinds the animation in place, starting it if it was not running.
    pub fn restart(
        &mut self,
        handle: AnimationHandle,
        sink: &mut dyn AnimationSink,
    ) -> Result<(), AnimationError> {
        restart_entry(&mut self.slots, &mut self.queue, &mut self.notices, handle)?;
        self.flush(sink);
        Ok(())
    }

    /// Marks the animation as stopped. Its targets receive
    /// `Finished { completed: false }` on the next tick.
    pub fn stop(&mut self, handle: AnimationHandle) -> Result<(), AnimationError> {
        self.scheduler().stop(handle)
    }

    pub fn animate(&mut self, delta: u32, sink: &mut dyn AnimationSink) {
        let mut live = std::mem::take(&mut self.live);
        live.append(&mut self.queue);
        let mut kept = Vec::with_capacity(live.len());

        for handle in live {
            let Ok(entry) = entry_mut(&mut self.slots, handle) else {
                continue;
            };

            let state = entry.animation.state_mut();
            state.targets_mut().apply();
            if state.is_running() && state.targets().is_empty() {
                debug!(?handle, "animation without targets stopped");
                state.set_running(false);
            }

            if !entry.animation.state().is_running() {
                notify(
                    &mut self.notices,
                    handle,
                    entry.animation.state(),
                    AnimationEvent::Finished { completed: false },
                );
                entry.registered = false;
            } else {
                let step = entry.animation.animate(delta);
                if let Some(update) = step.update {
                    notify(
                        &mut self.notices,
                        handle,
                        entry.animation.state(),
                        update.into(),
                    );
                }
                if step.running {
                    kept.push(handle);
                } else {
                    entry.animation.state_mut().set_running(false);
                    notify(
                        &mut self.notices,
                        handle,
                        entry.animation.state(),
                        AnimationEvent::Finished { completed: true },
                    );
                    entry.registered = false;
                }
            }

            self.flush(sink);
        }

        self.live = kept;
    }

    fn scheduler(&mut self) -> Scheduler<'_> {
        Scheduler {
            slots: &mut self.slots,
            queue: &mut self.queue,
            notices: &mut self.notices,
        }
    }

    fn flush(&mut self, sink: &mut dyn AnimationSink) {
        while let Some(notice) = self.notices.pop_front() {
            let mut scheduler = Scheduler {
                slots: &mut self.slots,
                queue: &mut self.queue,
                notices: &mut self.notices,
            };
            sink.deliver(notice.animation, notice.target, notice.event, &mut scheduler);
        }
    }
}
