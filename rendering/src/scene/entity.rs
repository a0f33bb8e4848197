//! State and capabilities shared by everything drawn on the map.

use super::constants::{ALPHA_CHANGE_FACTOR, FADING_CORRIDOR_ALPHA};
use super::fading::FadingCorridor;
use super::graph::SceneGraph;
use super::input::{InteractionHandler, MapEvent};
use super::template::Sprite;
use crate::animation::TargetId;
use crate::animation::utility::approach;
use crate::camera::Camera;
use crate::color::Color;
use crate::geometry::{DisplayCoordinate, Rectangle};
use crate::instance::{Instance, InstanceFlag, RenderBatch};
use glam::{Vec2, Vec3};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl EntityId {
    pub fn next() -> Self {
        EntityId(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl From<EntityId> for TargetId {
    fn from(id: EntityId) -> Self {
        TargetId(id.0)
    }
}

impl From<TargetId> for EntityId {
    fn from(id: TargetId) -> Self {
        EntityId(id.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Shown,
    Hidden,
    Removed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    #[default]
    None,
    Weak,
    Strong,
}

impl From<Highlight> for InstanceFlag {
    fn from(highlight: Highlight) -> Self {
        match highlight {
            Highlight::None => InstanceFlag::None,
            Highlight::Weak => InstanceFlag::HighlightWeak,
            Highlight::Strong => InstanceFlag::HighlightStrong,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityError {
    Removed(EntityId),
    NoDisplayCoordinate(EntityId),
    ShownOutsideStack(EntityId),
    IndexOutOfBounds { index: usize, len: usize },
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityError::Removed(id) => write!(f, "entity {} was already removed", id.0),
            EntityError::NoDisplayCoordinate(id) => {
                write!(f, "entity {} has no display coordinate", id.0)
            }
            EntityError::ShownOutsideStack(id) => {
                write!(f, "item {} can only be shown through its stack", id.0)
            }
            EntityError::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for stack of {len}")
            }
        }
    }
}

impl std::error::Error for EntityError {}

/// Per frame view on the map shared by every entity update and render.
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    pub camera: &'a Camera,
    pub corridor: &'a FadingCorridor,
}

/// Common state of every map entity.
#[derive(Debug, Clone)]
pub struct EntityCore {
    id: EntityId,
    coordinate: Option<DisplayCoordinate>,
    alpha: u8,
    alpha_target: u8,
    default_alpha: u8,
    base_color: Option<Color>,
    light: Color,
    local_light: Color,
    scale: f32,
    frame: usize,
    lifecycle: Lifecycle,
    fades_in_corridor: bool,
    in_corridor: bool,
    highlight: Highlight,
    display_rect: Rectangle,
}

impl EntityCore {
    pub fn new(default_color: Option<Color>) -> Self {
        let alpha = default_color.map_or(255, |c| c.alpha_u8());
        Self {
            id: EntityId::next(),
            coordinate: None,
            alpha,
            alpha_target: alpha,
            default_alpha: alpha,
            base_color: default_color,
            light: Color::WHITE,
            local_light: Color::WHITE,
            scale: 1.0,
            frame: 0,
            lifecycle: Lifecycle::Created,
            fades_in_corridor: true,
            in_corridor: false,
            highlight: Highlight::None,
            display_rect: Rectangle::EMPTY,
        }
    }

    pub fn with_coordinate(mut self, coordinate: DisplayCoordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    /// Keeps the entity opaque inside the fading corridor.
    pub fn without_corridor_fading(mut self) -> Self {
        self.fades_in_corridor = false;
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_shown(&self) -> bool {
        self.lifecycle == Lifecycle::Shown
    }

    pub fn is_removed(&self) -> bool {
        self.lifecycle == Lifecycle::Removed
    }

    pub fn ensure_alive(&self) -> Result<(), EntityError> {
        if self.is_removed() {
            Err(EntityError::Removed(self.id))
        } else {
            Ok(())
        }
    }

    pub fn coordinate(&self) -> Option<DisplayCoordinate> {
        self.coordinate
    }

    pub fn layer(&self) -> Option<i32> {
        self.coordinate.map(|c| c.layer)
    }

    /// Moves the entity, resorting it in the scene graph if it is shown.
    pub fn set_coordinate(
        &mut self,
        coordinate: DisplayCoordinate,
        graph: &mut dyn SceneGraph,
    ) -> Result<(), EntityError> {
        self.ensure_alive()?;
        let previous = self.coordinate.replace(coordinate);
        if self.is_shown() && previous.map(|p| p.layer) != Some(coordinate.layer) {
            graph.update_element_location(self.id, coordinate.layer);
        }
        Ok(())
    }

    /// Moves an entity that is never listed in the scene graph itself, such as
    /// the clothes of an avatar or the items of a stack.
    pub(crate) fn place(&mut self, coordinate: DisplayCoordinate) -> Result<(), EntityError> {
        self.ensure_alive()?;
        self.coordinate = Some(coordinate);
        Ok(())
    }

    pub fn show(&mut self, graph: &mut dyn SceneGraph) -> Result<(), EntityError> {
        self.ensure_alive()?;
        let coordinate = self
            .coordinate
            .ok_or(EntityError::NoDisplayCoordinate(self.id))?;
        if !self.is_shown() {
            graph.add_element(self.id, coordinate.layer);
            self.lifecycle = Lifecycle::Shown;
        }
        Ok(())
    }

    pub fn hide(&mut self, graph: &mut dyn SceneGraph) -> Result<(), EntityError> {
        self.ensure_alive()?;
        if self.is_shown() {
            graph.remove_element(self.id);
            self.lifecycle = Lifecycle::Hidden;
        }
        Ok(())
    }

    /// Terminal. Takes the entity out of the scene graph.
    pub fn mark_removed(&mut self, graph: &mut dyn SceneGraph) {
        if self.is_shown() {
            graph.remove_element(self.id);
        }
        self.lifecycle = Lifecycle::Removed;
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn alpha_target(&self) -> u8 {
        self.alpha_target
    }

    pub fn default_alpha(&self) -> u8 {
        self.default_alpha
    }

    pub fn set_alpha_target(&mut self, alpha: u8) -> Result<(), EntityError> {
        self.ensure_alive()?;
        self.alpha_target = alpha;
        Ok(())
    }

    /// Sets the alpha value right away, without fading.
    pub fn set_alpha(&mut self, alpha: u8) -> Result<(), EntityError> {
        self.ensure_alive()?;
        self.alpha = alpha;
        self.alpha_target = alpha;
        Ok(())
    }

    pub fn base_color(&self) -> Option<Color> {
        self.base_color
    }

    pub fn set_base_color(&mut self, color: Option<Color>) -> Result<(), EntityError> {
        self.ensure_alive()?;
        self.base_color = color;
        Ok(())
    }

    pub fn light(&self) -> Color {
        self.light
    }

    pub fn set_light(&mut self, light: Color) -> Result<(), EntityError> {
        self.ensure_alive()?;
        self.light = light;
        Ok(())
    }

    pub fn local_light(&self) -> Color {
        self.local_light
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) -> Result<(), EntityError> {
        self.ensure_alive()?;
        self.scale = scale.max(0.0);
        Ok(())
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn set_frame(&mut self, frame: usize) -> Result<(), EntityError> {
        self.ensure_alive()?;
        self.frame = frame;
        Ok(())
    }

    pub fn highlight(&self) -> Highlight {
        self.highlight
    }

    pub fn set_highlight(&mut self, highlight: Highlight) -> Result<(), EntityError> {
        self.ensure_alive()?;
        self.highlight = highlight;
        Ok(())
    }

    pub fn fades_in_corridor(&self) -> bool {
        self.fades_in_corridor
    }

    pub fn set_fades_in_corridor(&mut self, fades: bool) -> Result<(), EntityError> {
        self.ensure_alive()?;
        self.fades_in_corridor = fades;
        Ok(())
    }

    pub fn in_corridor(&self) -> bool {
        self.in_corridor
    }

    pub fn display_rect(&self) -> Rectangle {
        self.display_rect
    }

    /// Area covered by `sprite` at the current coordinate and scale.
    pub fn sprite_rect(&self, sprite: &Sprite) -> Rectangle {
        self.coordinate
            .map_or(Rectangle::EMPTY, |c| sprite.display_rect(c, self.scale))
    }

    /// Per frame bookkeeping shared by all entities.
    pub fn update(
        &mut self,
        ctx: &FrameContext<'_>,
        bounds: Rectangle,
        parent_light: Color,
        delta: u32,
    ) -> Result<(), EntityError> {
        self.ensure_alive()?;
        self.display_rect = bounds;
        self.local_light = parent_light * self.light;
        self.in_corridor = self.fades_in_corridor
            && self
                .coordinate
                .is_some_and(|c| ctx.corridor.is_rect_in_corridor(&bounds, c.layer));

        let target = if self.in_corridor {
            self.alpha_target.min(FADING_CORRIDOR_ALPHA)
        } else {
            self.alpha_target
        };
        self.alpha = approach(
            self.alpha as i32,
            target as i32,
            ALPHA_CHANGE_FACTOR,
            0,
            255,
            delta,
        ) as u8;
        Ok(())
    }

    /// Final color of the entity: base color lit by the local light.
    pub fn render_color(&self) -> Color {
        let base = self.base_color.unwrap_or(Color::WHITE);
        let lit = base * self.local_light;
        Color::new(lit.r, lit.g, lit.b, self.alpha as f32 / 255.0)
    }

    /// Base color with the current alpha, for entities lit per corner.
    pub fn unlit_color(&self) -> Color {
        self.base_color
            .unwrap_or(Color::WHITE)
            .with_alpha_u8(self.alpha)
    }

    /// Instance for `sprite` at the current state, `None` when nothing is
    /// visible.
    pub fn sprite_instance(
        &self,
        sprite: &Sprite,
        ctx: &FrameContext<'_>,
    ) -> Result<Option<Instance>, EntityError> {
        self.ensure_alive()?;
        let coordinate = self
            .coordinate
            .ok_or(EntityError::NoDisplayCoordinate(self.id))?;
        if self.alpha == 0 {
            return Ok(None);
        }
        let rect = sprite.display_rect(coordinate, self.scale);
        if !ctx.camera.requires_update(&rect) {
            return Ok(None);
        }
        let Some(frame) = sprite.frame(self.frame) else {
            return Ok(None);
        };
        Ok(Some(
            Instance::new(
                self.id,
                Vec3::new(rect.x as f32, rect.y as f32, coordinate.layer as f32),
                frame.tex_min,
                frame.tex_max,
                Vec2::new(rect.width as f32, rect.height as f32),
                self.render_color(),
            )
            .with_flags(self.highlight.into()),
        ))
    }
}

/// Something that is part of the drawn scene.
pub trait Renderable {
    fn id(&self) -> EntityId;
    fn layer(&self) -> Option<i32>;
    fn display_rect(&self) -> Rectangle;
    fn show(&mut self, graph: &mut dyn SceneGraph) -> Result<(), EntityError>;
    fn hide(&mut self, graph: &mut dyn SceneGraph) -> Result<(), EntityError>;
    fn remove(&mut self, graph: &mut dyn SceneGraph);
    fn update(
        &mut self,
        ctx: &FrameContext<'_>,
        parent_light: Color,
        delta: u32,
    ) -> Result<(), EntityError>;
    /// Appends the instances of this entity. Returns whether anything was drawn.
    fn render(&self, ctx: &FrameContext<'_>, out: &mut RenderBatch) -> Result<bool, EntityError>;
}

pub trait Fadeable {
    fn set_alpha_target(&mut self, alpha: u8) -> Result<(), EntityError>;
    fn alpha(&self) -> u8;
}

/// Entities lit by their own light times the light of their container.
pub trait LightBlended {
    fn set_light(&mut self, light: Color) -> Result<(), EntityError>;
    fn local_light(&self) -> Color;
}

pub struct InputContext<'a> {
    pub handler: &'a mut dyn InteractionHandler,
}

pub trait Interactive {
    /// Offers `event` (in display coordinates) to the entity. Returns `true`
    /// when the entity consumed it.
    fn is_event_processed(
        &mut self,
        ctx: &mut InputContext<'_>,
        delta: u32,
        event: &MapEvent,
    ) -> bool;
}

/// `Renderable` methods that only forward to the `core` field.
macro_rules! renderable_via_core {
    () => {
        fn id(&self) -> $crate::scene::entity::EntityId {
            self.core.id()
        }

        fn layer(&self) -> Option<i32> {
            self.core.layer()
        }

        fn display_rect(&self) -> $crate::geometry::Rectangle {
            self.core.display_rect()
        }

        fn show(
            &mut self,
            graph: &mut dyn $crate::scene::graph::SceneGraph,
        ) -> Result<(), $crate::scene::entity::EntityError> {
            self.core.show(graph)
        }

        fn hide(
            &mut self,
            graph: &mut dyn $crate::scene::graph::SceneGraph,
        ) -> Result<(), $crate::scene::entity::EntityError> {
            self.core.hide(graph)
        }

        fn remove(&mut self, graph: &mut dyn $crate::scene::graph::SceneGraph) {
            self.core.mark_removed(graph)
        }
    };
}

/// Core accessors plus `Fadeable` and `LightBlended` for entities with a
/// `core` field.
macro_rules! capabilities_via_core {
    ($($ty:ty),* $(,)?) => {$(
        impl $ty {
            pub fn core(&self) -> &$crate::scene::entity::EntityCore {
                &self.core
            }

            pub fn core_mut(&mut self) -> &mut $crate::scene::entity::EntityCore {
                &mut self.core
            }
        }

        impl $crate::scene::entity::Fadeable for $ty {
            fn set_alpha_target(
                &mut self,
                alpha: u8,
            ) -> Result<(), $crate::scene::entity::EntityError> {
                self.core.set_alpha_target(alpha)
            }

            fn alpha(&self) -> u8 {
                self.core.alpha()
            }
        }

        impl $crate::scene::entity::LightBlended for $ty {
            fn set_light(
                &mut self,
                light: $crate::color::Color,
            ) -> Result<(), $crate::scene::entity::EntityError> {
                self.core.set_light(light)
            }

            fn local_light(&self) -> $crate::color::Color {
                self.core.local_light()
            }
        }
    )*};
}

pub(crate) use capabilities_via_core;
pub(crate) use renderable_via_core;
