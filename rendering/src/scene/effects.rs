use crate::animation::{FrameAnimation, FrameMode};
use crate::color::Color;
use crate::geometry::MapLocation;
use crate::instance::RenderBatch;
use crate::scene::constants::EFFECT_LAYER_OFFSET;
use crate::scene::entity::{
    EntityCore, EntityError, FrameContext, Renderable, capabilities_via_core,
    renderable_via_core,
};
use crate::scene::template::{EffectTemplate, TemplateProvider};
use std::sync::Arc;
use tracing::error;

/// A one-shot animated sprite, such as a spell hit, played on a map location.
#[derive(Debug)]
pub struct Effect {
    core: EntityCore,
    template: Arc<EffectTemplate>,
    location: MapLocation,
}

impl Effect {
    pub fn create(
        location: MapLocation,
        effect_id: u32,
        provider: &dyn TemplateProvider,
    ) -> Option<Effect> {
        let Some(template) = provider.effect(effect_id) else {
            error!(?location, effect = effect_id, "unknown effect template");
            return None;
        };
        let core = EntityCore::new(None)
            .with_coordinate(location.display_coordinate_on_layer(EFFECT_LAYER_OFFSET))
            .without_corridor_fading();
        Some(Effect {
            core,
            template,
            location,
        })
    }

    pub fn effect_id(&self) -> u32 {
        self.template.id
    }

    pub fn location(&self) -> MapLocation {
        self.location
    }

    pub fn frame_count(&self) -> usize {
        self.template.sprite.frame_count()
    }

    pub fn duration(&self) -> u32 {
        let frames = u32::try_from(self.frame_count()).unwrap_or(u32::MAX);
        self.template.frame_duration.max(1).saturating_mul(frames)
    }

    /// Plays every frame once.
    pub fn animation(&self) -> FrameAnimation {
        FrameAnimation::new(self.frame_count(), 0, self.duration(), FrameMode::ONCE)
    }
}

capabilities_via_core!(Effect);

impl Renderable for Effect {
    renderable_via_core!();

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
        match self.core.sprite_instance(&self.template.sprite, ctx)? {
            Some(instance) => {
                out.push(instance);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
