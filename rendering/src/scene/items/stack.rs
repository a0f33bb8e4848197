use super::Item;
use crate::color::Color;
use crate::geometry::{MapLocation, Rectangle};
use crate::instance::RenderBatch;
use crate::scene::constants::ITEM_LAYER_OFFSET;
use crate::scene::entity::{
    EntityError, EntityId, FrameContext, Highlight, InputContext, Interactive, Lifecycle,
    Renderable,
};
use crate::scene::graph::SceneGraph;
use crate::scene::input::{HoverTarget, MapEvent, MouseButton};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{trace, warn};

#[derive(Debug)]
struct StackState {
    items: Vec<Item>,
    lifecycle: Lifecycle,
    interactive_rect: Rectangle,
    rect_dirty: bool,
}

/// All items on one map location, bottom item first.
///
/// The stack may be changed through `&self` from any thread. It is listed in
/// the scene graph exactly while it holds at least one item.
#[derive(Debug)]
pub struct ItemStack {
    id: EntityId,
    location: MapLocation,
    state: RwLock<StackState>,
}

impl ItemStack {
    pub fn new(location: MapLocation) -> Self {
        Self {
            id: EntityId::next(),
            location,
            state: RwLock::new(StackState {
                items: Vec::new(),
                lifecycle: Lifecycle::Created,
                interactive_rect: Rectangle::EMPTY,
                rect_dirty: false,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StackState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StackState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn location(&self) -> MapLocation {
        self.location
    }

    pub fn len(&self) -> usize {
        self.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().items.is_empty()
    }

    pub fn is_shown(&self) -> bool {
        self.read().lifecycle == Lifecycle::Shown
    }

    pub fn is_removed(&self) -> bool {
        self.read().lifecycle == Lifecycle::Removed
    }

    /// Template id of the item on top.
    pub fn top_item(&self) -> Option<u32> {
        self.read().items.last().map(Item::item_id)
    }

    pub fn elevation(&self, index: usize) -> Option<i32> {
        self.read().items.get(index).map(Item::elevation)
    }

    pub fn with_item<R>(&self, index: usize, f: impl FnOnce(&Item) -> R) -> Option<R> {
        self.read().items.get(index).map(f)
    }

    pub fn interactive_rect(&self) -> Rectangle {
        self.read().interactive_rect
    }

    pub fn push(&self, item: Item, graph: &mut dyn SceneGraph) -> Result<usize, EntityError> {
        let mut state = self.write();
        self.ensure_alive(&state)?;
        item.core.ensure_alive()?;
        state.items.push(item);
        self.relayout(&mut state, graph)?;
        Ok(state.items.len() - 1)
    }

    pub fn insert(
        &self,
        index: usize,
        item: Item,
        graph: &mut dyn SceneGraph,
    ) -> Result<(), EntityError> {
        let mut state = self.write();
        self.ensure_alive(&state)?;
        item.core.ensure_alive()?;
        let len = state.items.len();
        if index > len {
            return Err(EntityError::IndexOutOfBounds { index, len });
        }
        state.items.insert(index, item);
        self.relayout(&mut state, graph)
    }

    pub fn remove(&self, index: usize, graph: &mut dyn SceneGraph) -> Result<Item, EntityError> {
        let mut state = self.write();
        self.ensure_alive(&state)?;
        let len = state.items.len();
        if index >= len {
            return Err(EntityError::IndexOutOfBounds { index, len });
        }
        let item = state.items.remove(index);
        self.relayout(&mut state, graph)?;
        Ok(item)
    }

    pub fn clear(&self, graph: &mut dyn SceneGraph) -> Result<Vec<Item>, EntityError> {
        let mut state = self.write();
        self.ensure_alive(&state)?;
        let items = std::mem::take(&mut state.items);
        self.relayout(&mut state, graph)?;
        Ok(items)
    }

    /// Terminal. Removes the stack and all of its items.
    pub fn mark_removed(&self, graph: &mut dyn SceneGraph) {
        let mut state = self.write();
        if state.lifecycle == Lifecycle::Shown {
            graph.remove_element(self.id);
        }
        for item in &mut state.items {
            item.core.mark_removed(graph);
        }
        state.lifecycle = Lifecycle::Removed;
    }

    pub fn clear_highlight(&self) {
        for item in &mut self.write().items {
            if let Err(err) = item.core.set_highlight(Highlight::None) {
                warn!(location = ?self.location, %err, "clearing item highlight failed");
            }
        }
    }

    fn ensure_alive(&self, state: &StackState) -> Result<(), EntityError> {
        if state.lifecycle == Lifecycle::Removed {
            Err(EntityError::Removed(self.id))
        } else {
            Ok(())
        }
    }

    fn stack_layer(&self) -> i32 {
        self.location.layer() + ITEM_LAYER_OFFSET
    }

    /// Recomputes elevations and scene graph presence after a change.
    fn relayout(
        &self,
        state: &mut StackState,
        graph: &mut dyn SceneGraph,
    ) -> Result<(), EntityError> {
        let mut elevation = 0;
        for item in &mut state.items {
            item.set_elevation(elevation)?;
            elevation += item.level();
        }
        state.rect_dirty = true;

        let shown = state.lifecycle == Lifecycle::Shown;
        if state.items.is_empty() && shown {
            graph.remove_element(self.id);
            state.lifecycle = Lifecycle::Hidden;
            state.interactive_rect = Rectangle::EMPTY;
            trace!(location = ?self.location, "item stack hidden");
        } else if !state.items.is_empty() && !shown {
            graph.add_element(self.id, self.stack_layer());
            state.lifecycle = Lifecycle::Shown;
            trace!(location = ?self.location, "item stack shown");
        }
        Ok(())
    }

    /// Updates every item and refreshes the interactive area if needed.
    pub fn update_items(
        &self,
        ctx: &FrameContext<'_>,
        parent_light: Color,
        delta: u32,
    ) -> Result<(), EntityError> {
        let mut state = self.write();
        self.ensure_alive(&state)?;
        for item in &mut state.items {
            if let Err(err) = item.update(ctx, parent_light, delta) {
                warn!(location = ?self.location, %err, "item update failed");
            }
        }
        if state.rect_dirty {
            state.interactive_rect = state
                .items
                .iter()
                .fold(Rectangle::EMPTY, |rect, item| {
                    rect.union(&item.core.display_rect())
                });
            state.rect_dirty = false;
        }
        Ok(())
    }

    pub fn render_items(
        &self,
        ctx: &FrameContext<'_>,
        out: &mut RenderBatch,
    ) -> Result<bool, EntityError> {
        let state = self.read();
        self.ensure_alive(&state)?;
        let mut drawn = false;
        for item in &state.items {
            drawn |= item.render(ctx, out)?;
        }
        Ok(drawn)
    }

    /// Index of the topmost item under the pointer. Pointing at an item
    /// highlights it.
    fn hit_item(&self, event: &MapEvent) -> Option<usize> {
        let mut state = self.write();
        if state.lifecycle != Lifecycle::Shown {
            return None;
        }
        let (x, y) = event.position();
        if !state.interactive_rect.contains(x, y) {
            return None;
        }
        let (index, item) = state
            .items
            .iter_mut()
            .enumerate()
            .rev()
            .find(|(_, item)| item.accepts(x, y))?;
        if matches!(event, MapEvent::PointAt { .. }) {
            if let Err(err) = item.core.set_highlight(Highlight::Weak) {
                warn!(location = ?self.location, index, %err, "highlighting item failed");
            }
        }
        Some(index)
    }

    /// Offers the event to the items, topmost first. The handler runs after
    /// the stack is unlocked and may read it.
    pub fn process_event(&self, ctx: &mut InputContext<'_>, event: &MapEvent) -> bool {
        let Some(index) = self.hit_item(event) else {
            return false;
        };
        let location = self.location;
        match *event {
            MapEvent::Click {
                button: MouseButton::Left | MouseButton::Right,
                ..
            } => ctx.handler.look_at_item(location, index),
            MapEvent::DoubleClick { .. } => ctx.handler.use_item(location, index),
            MapEvent::DragStart { .. } => ctx.handler.drag_item(location, index),
            MapEvent::PointAt { .. } => ctx.handler.point_at(HoverTarget::Item { location, index }),
            _ => return false,
        }
        true
    }
}

impl Renderable for ItemStack {
    fn id(&self) -> EntityId {
        self.id
    }

    fn layer(&self) -> Option<i32> {
        Some(self.stack_layer())
    }

    fn display_rect(&self) -> Rectangle {
        self.interactive_rect()
    }

    fn show(&mut self, graph: &mut dyn SceneGraph) -> Result<(), EntityError> {
        let mut state = self.write();
        self.ensure_alive(&state)?;
        if !state.items.is_empty() && state.lifecycle != Lifecycle::Shown {
            graph.add_element(self.id, self.stack_layer());
            state.lifecycle = Lifecycle::Shown;
        }
        Ok(())
    }

    fn hide(&mut self, graph: &mut dyn SceneGraph) -> Result<(), EntityError> {
        let mut state = self.write();
        self.ensure_alive(&state)?;
        if state.lifecycle == Lifecycle::Shown {
            graph.remove_element(self.id);
            state.lifecycle = Lifecycle::Hidden;
        }
        Ok(())
    }

    fn remove(&mut self, graph: &mut dyn SceneGraph) {
        self.mark_removed(graph)
    }

    fn update(
        &mut self,
        ctx: &FrameContext<'_>,
        parent_light: Color,
        delta: u32,
    ) -> Result<(), EntityError> {
        self.update_items(ctx, parent_light, delta)
    }

    fn render(&self, ctx: &FrameContext<'_>, out: &mut RenderBatch) -> Result<bool, EntityError> {
        self.render_items(ctx, out)
    }
}

impl Interactive for ItemStack {
    fn is_event_processed(
        &mut self,
        ctx: &mut InputContext<'_>,
        _delta: u32,
        event: &MapEvent,
    ) -> bool {
        self.process_event(ctx, event)
    }
}
