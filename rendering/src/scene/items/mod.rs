mod stack;

pub use stack::ItemStack;

use crate::color::Color;
use crate::geometry::{MapLocation, Rectangle};
use crate::instance::{RenderBatch, TextLabel};
use crate::scene::constants::ITEM_LAYER_OFFSET;
use crate::scene::entity::{
    EntityCore, EntityError, EntityId, FrameContext, Renderable, capabilities_via_core,
};
use crate::scene::graph::SceneGraph;
use crate::scene::template::{ItemTemplate, TemplateProvider};
use std::sync::Arc;
use tracing::error;

/// An item lying on the map. Items are only drawn as part of an [`ItemStack`].
#[derive(Debug)]
pub struct Item {
    core: EntityCore,
    template: Arc<ItemTemplate>,
    location: MapLocation,
    count: u32,
    elevation: i32,
}

impl Item {
    pub fn create(
        item_id: u32,
        count: u32,
        location: MapLocation,
        provider: &dyn TemplateProvider,
    ) -> Option<Item> {
        let Some(template) = provider.item(item_id) else {
            error!(?location, item = item_id, "unknown item template");
            return None;
        };
        let core = EntityCore::new(template.default_color)
            .with_coordinate(location.display_coordinate_on_layer(ITEM_LAYER_OFFSET));
        Some(Item {
            core,
            template,
            location,
            count: count.max(1),
            elevation: 0,
        })
    }

    pub fn item_id(&self) -> u32 {
        self.template.id
    }

    pub fn template(&self) -> &Arc<ItemTemplate> {
        &self.template
    }

    pub fn location(&self) -> MapLocation {
        self.location
    }

    pub fn level(&self) -> i32 {
        self.template.level
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn set_count(&mut self, count: u32) -> Result<(), EntityError> {
        self.core.ensure_alive()?;
        self.count = count.max(1);
        Ok(())
    }

    pub fn elevation(&self) -> i32 {
        self.elevation
    }

    pub(crate) fn set_elevation(&mut self, elevation: i32) -> Result<(), EntityError> {
        let base = self
            .location
            .display_coordinate_on_layer(ITEM_LAYER_OFFSET);
        self.core.place(base.translated(0, -elevation))?;
        self.elevation = elevation;
        Ok(())
    }

    /// Whether a pointer at the display position hits this item.
    pub(crate) fn accepts(&self, x: i32, y: i32) -> bool {
        !self.core.is_removed()
            && !self.core.in_corridor()
            && self.core.alpha() > 0
            && self.template.sprite.is_opaque_at(
                self.core.frame(),
                &self.core.display_rect(),
                x,
                y,
            )
    }

    fn count_label(&self, rect: &Rectangle) -> Option<TextLabel> {
        (self.count > 1).then(|| TextLabel {
            entity: self.core.id(),
            text: self.count.to_string(),
            x: rect.x + rect.width / 2,
            y: rect.bottom(),
            color: Color::WHITE.with_alpha_u8(self.core.alpha()),
        })
    }
}

capabilities_via_core!(Item);

impl Renderable for Item {
    fn id(&self) -> EntityId {
        self.core.id()
    }

    fn layer(&self) -> Option<i32> {
        self.core.layer()
    }

    fn display_rect(&self) -> Rectangle {
        self.core.display_rect()
    }

    fn show(&mut self, _graph: &mut dyn SceneGraph) -> Result<(), EntityError> {
        self.core.ensure_alive()?;
        Err(EntityError::ShownOutsideStack(self.core.id()))
    }

    fn hide(&mut self, _graph: &mut dyn SceneGraph) -> Result<(), EntityError> {
        self.core.ensure_alive()
    }

    fn remove(&mut self, graph: &mut dyn SceneGraph) {
        self.core.mark_removed(graph)
    }

    /// `parent_light` is the local light of the tile the stack lies on.
    fn update(
        &mut self,
        ctx: &FrameContext<'_>,
        parent_light: Color,
        delta: u32,
    ) -> Result<(), EntityError> {
        let bounds = self.core.sprite_rect(&self.template.sprite);
        self.core.update(ctx, bounds, parent_light, delta)
    }

    fn render(&self, ctx: &FrameContext<'_>, out: &mut RenderBatch) -> Result<bool, EntityError> {
        let Some(instance) = self.core.sprite_instance(&self.template.sprite, ctx)? else {
            return Ok(false);
        };
        let rect = self.core.sprite_rect(&self.template.sprite);
        out.push(instance);
        if let Some(label) = self.count_label(&rect) {
            out.push_label(label);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::graph::DisplayList;
    use crate::scene::template::{Anchor, TemplateStore};

    fn store() -> TemplateStore {
        let mut store = TemplateStore::new(512, 512);
        let sprite = store
            .create_sprite("coin", 20, 20, Anchor::Bottom, 1)
            .unwrap();
        store.add_item(ItemTemplate {
            id: 61,
            name: "gold coins".to_owned(),
            sprite,
            level: 1,
            paperdoll_id: None,
            paperdoll_color: None,
            default_color: None,
        });
        store
    }

    #[test]
    fn items_cannot_be_shown_alone() {
        let mut item = Item::create(61, 5, MapLocation::default(), &store()).unwrap();
        let mut graph = DisplayList::new();
        let id = item.id();
        assert_eq!(
            item.show(&mut graph),
            Err(EntityError::ShownOutsideStack(id))
        );
        assert!(graph.is_empty());
    }

    #[test]
    fn elevation_lifts_the_item() {
        let location = MapLocation::new(1, 1, 0);
        let mut item = Item::create(61, 1, location, &store()).unwrap();
        item.set_elevation(12).unwrap();
        let coordinate = item.core().coordinate().unwrap();
        assert_eq!(coordinate.y, location.display_coordinate().y - 12);
    }

    #[test]
    fn count_of_zero_is_one() {
        let item = Item::create(61, 0, MapLocation::default(), &store()).unwrap();
        assert_eq!(item.count(), 1);
    }
}
