use crate::color::Color;
use crate::geometry::{DisplayCoordinate, MapLocation, Rectangle};
use crate::instance::RenderBatch;
use crate::scene::constants::QUEST_MARKER_LAYER_OFFSET;
use crate::scene::entity::{
    EntityCore, EntityError, FrameContext, Renderable, capabilities_via_core,
    renderable_via_core,
};
use crate::scene::template::{MarkerTemplate, TemplateProvider};
use std::f32::consts::TAU;
use std::sync::Arc;
use tracing::error;

/// Time of one full up and down movement of a quest marker.
const BOBBING_PERIOD: u32 = 1200;
/// Maximum vertical displacement of a quest marker in pixels.
const BOBBING_AMPLITUDE: f32 = 4.0;
/// Distance between the tile and the resting position of a quest marker.
const QUEST_MARKER_HEIGHT: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestMarkerKind {
    Available,
    InProgress,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Attack,
    Quest(QuestMarkerKind),
}

/// Combat relation between the player and a character.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum AttackState {
    #[default]
    None,
    /// The player attacks this character.
    Attacking,
    /// This character attacks the player.
    Attacked,
}

impl AttackState {
    pub fn color(self) -> Option<Color> {
        match self {
            AttackState::None => None,
            AttackState::Attacking => Some(Color::new(1.0, 0.0, 0.0, 1.0)),
            AttackState::Attacked => Some(Color::new(1.0, 0.65, 0.0, 1.0)),
        }
    }
}

/// Ring drawn under an avatar that is part of a fight.
#[derive(Debug)]
pub struct AvatarMarker {
    core: EntityCore,
    template: Option<Arc<MarkerTemplate>>,
    state: AttackState,
}

impl AvatarMarker {
    pub fn new(provider: &dyn TemplateProvider) -> Self {
        let core = EntityCore::new(None).without_corridor_fading();
        Self {
            core,
            template: provider.marker(MarkerKind::Attack),
            state: AttackState::None,
        }
    }

    pub fn state(&self) -> AttackState {
        self.state
    }

    pub fn set_state(&mut self, state: AttackState) -> Result<(), EntityError> {
        self.core.set_base_color(state.color())?;
        self.state = state;
        Ok(())
    }

    pub(crate) fn place(&mut self, coordinate: DisplayCoordinate) -> Result<(), EntityError> {
        self.core.place(coordinate)
    }

    pub(crate) fn update(
        &mut self,
        ctx: &FrameContext<'_>,
        avatar_alpha: u8,
        parent_light: Color,
        delta: u32,
    ) -> Result<(), EntityError> {
        let bounds = match &self.template {
            Some(template) => self.core.sprite_rect(&template.sprite),
            None => Rectangle::EMPTY,
        };
        self.core.set_alpha(avatar_alpha)?;
        self.core.update(ctx, bounds, parent_light, delta)
    }

    pub(crate) fn render(
        &self,
        ctx: &FrameContext<'_>,
        out: &mut RenderBatch,
    ) -> Result<bool, EntityError> {
        if self.state == AttackState::None {
            return Ok(false);
        }
        let Some(template) = &self.template else {
            return Ok(false);
        };
        match self.core.sprite_instance(&template.sprite, ctx)? {
            Some(instance) => {
                out.push(instance);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

capabilities_via_core!(AvatarMarker);

/// Vertical offset of a bobbing marker after `elapsed` milliseconds.
pub fn bobbing_offset(elapsed: u32) -> i32 {
    let phase = (elapsed % BOBBING_PERIOD) as f32 / BOBBING_PERIOD as f32;
    (BOBBING_AMPLITUDE * (phase * TAU).sin()).round() as i32
}

/// Quest indicator floating above a map location.
#[derive(Debug)]
pub struct QuestMarker {
    core: EntityCore,
    template: Arc<MarkerTemplate>,
    kind: QuestMarkerKind,
    location: MapLocation,
    anchor: DisplayCoordinate,
    elapsed: u32,
}

impl QuestMarker {
    pub fn create(
        location: MapLocation,
        kind: QuestMarkerKind,
        provider: &dyn TemplateProvider,
    ) -> Option<QuestMarker> {
        let Some(template) = provider.marker(MarkerKind::Quest(kind)) else {
            error!(?location, ?kind, "unknown quest marker template");
            return None;
        };
        let anchor = location
            .display_coordinate_on_layer(QUEST_MARKER_LAYER_OFFSET)
            .translated(0, -QUEST_MARKER_HEIGHT);
        let core = EntityCore::new(None)
            .with_coordinate(anchor)
            .without_corridor_fading();
        Some(QuestMarker {
            core,
            template,
            kind,
            location,
            anchor,
            elapsed: 0,
        })
    }

    pub fn kind(&self) -> QuestMarkerKind {
        self.kind
    }

    pub fn location(&self) -> MapLocation {
        self.location
    }
}

capabilities_via_core!(QuestMarker);

impl Renderable for QuestMarker {
    renderable_via_core!();

    fn update(
        &mut self,
        ctx: &FrameContext<'_>,
        parent_light: Color,
        delta: u32,
    ) -> Result<(), EntityError> {
        self.core.ensure_alive()?;
        self.elapsed = (self.elapsed + delta) % BOBBING_PERIOD;
        // same layer, so the scene graph keeps its order
        self.core
            .place(self.anchor.translated(0, bobbing_offset(self.elapsed)))?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::scene::fading::FadingCorridor;
    use crate::scene::graph::DisplayList;
    use crate::scene::template::{Anchor, TemplateStore};

    fn store() -> TemplateStore {
        let mut store = TemplateStore::new(256, 256);
        for kind in [
            MarkerKind::Attack,
            MarkerKind::Quest(QuestMarkerKind::Available),
        ] {
            let sprite = store
                .create_sprite("marker", 30, 20, Anchor::Bottom, 1)
                .unwrap();
            store.add_marker(MarkerTemplate { kind, sprite });
        }
        store
    }

    #[test]
    fn bobbing_stays_within_amplitude() {
        assert_eq!(bobbing_offset(0), 0);
        assert_eq!(bobbing_offset(BOBBING_PERIOD / 4), 4);
        assert_eq!(bobbing_offset(BOBBING_PERIOD * 3 / 4), -4);
        for t in (0..BOBBING_PERIOD).step_by(37) {
            assert!(bobbing_offset(t).abs() <= 4);
        }
    }

    #[test]
    fn quest_marker_bobs_without_changing_layer() {
        let camera = Camera::new(800, 600, 1.0);
        let corridor = FadingCorridor::default();
        let ctx = FrameContext {
            camera: &camera,
            corridor: &corridor,
        };
        let mut graph = DisplayList::new();
        let location = MapLocation::new(5, 5, 0);
        let mut marker =
            QuestMarker::create(location, QuestMarkerKind::Available, &store()).unwrap();
        marker.show(&mut graph).unwrap();
        let layer = marker.layer();

        marker.update(&ctx, Color::WHITE, BOBBING_PERIOD / 4).unwrap();
        let resting = location.display_coordinate().y - QUEST_MARKER_HEIGHT;
        assert_eq!(marker.core().coordinate().map(|c| c.y), Some(resting + 4));
        assert_eq!(marker.layer(), layer);
        assert_eq!(graph.layer_of(marker.id()), layer);
    }

    #[test]
    fn missing_quest_template_creates_nothing() {
        let marker = QuestMarker::create(
            MapLocation::default(),
            QuestMarkerKind::Finished,
            &store(),
        );
        assert!(marker.is_none());
    }

    #[test]
    fn attack_marker_only_drawn_in_fights() {
        let camera = Camera::new(800, 600, 1.0);
        let corridor = FadingCorridor::default();
        let ctx = FrameContext {
            camera: &camera,
            corridor: &corridor,
        };
        let mut marker = AvatarMarker::new(&store());
        marker.place(DisplayCoordinate::new(100, 100, 0)).unwrap();
        marker.update(&ctx, 255, Color::WHITE, 16).unwrap();

        let mut batch = RenderBatch::default();
        assert!(!marker.render(&ctx, &mut batch).unwrap());
        marker.set_state(AttackState::Attacking).unwrap();
        assert!(marker.render(&ctx, &mut batch).unwrap());
        assert_eq!(batch.instances[0].color.x, 1.0);
        assert_eq!(batch.instances[0].color.y, 0.0);
    }
}
