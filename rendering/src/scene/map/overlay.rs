use crate::color::Color;
use crate::geometry::MapLocation;
use crate::instance::RenderBatch;
use crate::scene::constants::OVERLAY_LAYER_OFFSET;
use crate::scene::entity::{
    EntityCore, EntityError, FrameContext, Renderable, capabilities_via_core, renderable_via_core,
};
use crate::scene::template::{OverlayTemplate, TemplateProvider};
use std::sync::Arc;
use tracing::error;

/// Transition drawn on top of a tile, e.g. a shore line.
#[derive(Debug)]
pub struct Overlay {
    core: EntityCore,
    template: Arc<OverlayTemplate>,
    location: MapLocation,
    shape: u32,
}

impl Overlay {
    pub fn create(
        location: MapLocation,
        overlay_id: u32,
        shape: u32,
        provider: &dyn TemplateProvider,
    ) -> Option<Overlay> {
        let Some(template) = provider.overlay(overlay_id) else {
            error!(?location, overlay = overlay_id, "unknown overlay template");
            return None;
        };
        if shape == 0 || shape as usize > template.sprite.frame_count() {
            error!(?location, overlay = overlay_id, shape, "overlay shape out of range");
            return None;
        }
        let mut core = EntityCore::new(None)
            .with_coordinate(location.display_coordinate_on_layer(OVERLAY_LAYER_OFFSET))
            .without_corridor_fading();
        core.set_frame(shape as usize - 1).ok()?;
        Some(Overlay {
            core,
            template,
            location,
            shape,
        })
    }

    pub fn location(&self) -> MapLocation {
        self.location
    }

    pub fn shape(&self) -> u32 {
        self.shape
    }

    pub fn overlay_id(&self) -> u32 {
        self.template.id
    }
}

capabilities_via_core!(Overlay);

impl Renderable for Overlay {
    renderable_via_core!();

    /// `parent_light` is the local light of the tile below.
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
