use super::TileId;
use crate::color::Color;
use crate::geometry::{MapLocation, Rectangle};
use crate::instance::RenderBatch;
use crate::scene::constants::TILE_LAYER_OFFSET;
use crate::scene::entity::{
    EntityCore, EntityError, FrameContext, Highlight, InputContext, Interactive, Renderable,
    capabilities_via_core, renderable_via_core,
};
use crate::scene::input::{HoverTarget, MapEvent, MouseButton};
use crate::scene::template::{TemplateProvider, TileTemplate};
use std::sync::Arc;
use tracing::error;

/// Ground tile of one map location.
#[derive(Debug)]
pub struct Tile {
    core: EntityCore,
    template: Arc<TileTemplate>,
    tile_id: TileId,
    location: MapLocation,
    corner_light: [Color; 4],
}

impl Tile {
    pub fn create(
        location: MapLocation,
        tile_id: TileId,
        provider: &dyn TemplateProvider,
    ) -> Option<Tile> {
        let Some(template) = provider.tile(tile_id.base()) else {
            error!(?location, tile = tile_id.base(), "unknown tile template");
            return None;
        };
        let core = EntityCore::new(template.default_color)
            .with_coordinate(location.display_coordinate_on_layer(TILE_LAYER_OFFSET))
            .without_corridor_fading();
        Some(Tile {
            core,
            template,
            tile_id,
            location,
            corner_light: [Color::WHITE; 4],
        })
    }

    pub fn location(&self) -> MapLocation {
        self.location
    }

    pub fn tile_id(&self) -> TileId {
        self.tile_id
    }

    pub fn template(&self) -> &Arc<TileTemplate> {
        &self.template
    }

    /// Animated tiles share one frame animation per template.
    pub fn is_animated(&self) -> bool {
        self.template.animation_speed > 0 && self.template.sprite.frame_count() > 1
    }

    pub fn corner_light(&self) -> [Color; 4] {
        self.corner_light
    }

    pub fn set_corner_light(&mut self, corners: [Color; 4]) -> Result<(), EntityError> {
        self.core.ensure_alive()?;
        self.corner_light = corners;
        Ok(())
    }

    /// Whether the point lies on the tile diamond.
    fn covers(&self, x: i32, y: i32) -> bool {
        let rect = self.core.display_rect();
        if !rect.contains(x, y) {
            return false;
        }
        let half_w = rect.width as f32 / 2.0;
        let half_h = rect.height as f32 / 2.0;
        let dx = (x as f32 - (rect.x as f32 + half_w)).abs() / half_w;
        let dy = (y as f32 - (rect.y as f32 + half_h)).abs() / half_h;
        dx + dy <= 1.0
    }
}

capabilities_via_core!(Tile);

impl Renderable for Tile {
    renderable_via_core!();

    fn update(
        &mut self,
        ctx: &FrameContext<'_>,
        parent_light: Color,
        delta: u32,
    ) -> Result<(), EntityError> {
        let bounds: Rectangle = self.core.sprite_rect(&self.template.sprite);
        self.core.update(ctx, bounds, parent_light, delta)
    }

    fn render(&self, ctx: &FrameContext<'_>, out: &mut RenderBatch) -> Result<bool, EntityError> {
        let Some(mut instance) = self.core.sprite_instance(&self.template.sprite, ctx)? else {
            return Ok(false);
        };
        instance.color = self.core.unlit_color().to_vec4();
        let own = self.core.light();
        out.push(instance.with_corner_light(self.corner_light.map(|c| c * own)));
        Ok(true)
    }
}

impl Interactive for Tile {
    fn is_event_processed(
        &mut self,
        ctx: &mut InputContext<'_>,
        _delta: u32,
        event: &MapEvent,
    ) -> bool {
        let (x, y) = event.position();
        if !self.covers(x, y) {
            return false;
        }
        match *event {
            MapEvent::Click {
                button: MouseButton::Left,
                ..
            } => ctx.handler.walk_to(self.location),
            MapEvent::Click {
                button: MouseButton::Right,
                ..
            } => ctx.handler.look_at_tile(self.location),
            MapEvent::DoubleClick { .. } => ctx.handler.use_tile(self.location),
            MapEvent::PointAt { .. } => {
                if self.core.set_highlight(Highlight::Weak).is_err() {
                    return false;
                }
                ctx.handler.point_at(HoverTarget::Tile(self.location));
            }
            _ => return false,
        }
        true
    }
}
