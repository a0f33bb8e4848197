use super::types::AvatarClothGroup;
use crate::color::Color;
use crate::geometry::DisplayCoordinate;
use crate::instance::RenderBatch;
use crate::scene::entity::{EntityCore, EntityError, FrameContext, capabilities_via_core};
use crate::scene::template::{ClothTemplate, TemplateProvider};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// One piece of clothing drawn over an avatar body.
#[derive(Debug)]
pub struct AvatarCloth {
    core: EntityCore,
    template: Arc<ClothTemplate>,
}

impl AvatarCloth {
    pub fn new(template: Arc<ClothTemplate>, color: Option<Color>) -> Self {
        let core =
            EntityCore::new(color.map(|c| c.with_alpha_u8(255))).without_corridor_fading();
        Self { core, template }
    }

    pub fn group(&self) -> AvatarClothGroup {
        self.template.group
    }

    pub fn cloth_id(&self) -> u32 {
        self.template.id
    }

    pub fn frame_count(&self) -> usize {
        self.template.sprite.frame_count()
    }

    pub(crate) fn place(&mut self, coordinate: DisplayCoordinate) -> Result<(), EntityError> {
        self.core.place(coordinate)
    }

    pub(crate) fn update(
        &mut self,
        ctx: &FrameContext<'_>,
        parent_light: Color,
        delta: u32,
    ) -> Result<(), EntityError> {
        let bounds = self.core.sprite_rect(&self.template.sprite);
        self.core.update(ctx, bounds, parent_light, delta)
    }

    pub(crate) fn render(
        &self,
        ctx: &FrameContext<'_>,
        out: &mut RenderBatch,
    ) -> Result<bool, EntityError> {
        match self.core.sprite_instance(&self.template.sprite, ctx)? {
            Some(instance) => {
                out.push(instance);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

capabilities_via_core!(AvatarCloth);

/// Cloth templates available to one avatar appearance, per slot.
#[derive(Debug, Default)]
pub struct AvatarClothManager {
    groups: [FxHashMap<u32, Arc<ClothTemplate>>; AvatarClothGroup::COUNT],
}

impl AvatarClothManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cloth(&mut self, template: Arc<ClothTemplate>) {
        self.groups[template.group.index()].insert(template.id, template);
    }

    pub fn template(&self, group: AvatarClothGroup, id: u32) -> Option<&Arc<ClothTemplate>> {
        self.groups[group.index()].get(&id)
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cloth for `item_id` in `group`, `None` when this appearance has no
    /// matching graphic.
    pub fn get_cloth(
        &self,
        group: AvatarClothGroup,
        item_id: u32,
        provider: &dyn TemplateProvider,
    ) -> Option<AvatarCloth> {
        let (cloth_id, color) = if group.is_body_part() {
            (item_id, None)
        } else {
            let item = provider.item(item_id)?;
            (item.paperdoll_id?, item.paperdoll_color)
        };
        let template = self.template(group, cloth_id)?;
        Some(AvatarCloth::new(template.clone(), color))
    }
}
