pub mod cloth;
mod renderer;
pub mod types;

pub use cloth::{AvatarCloth, AvatarClothManager};
pub use renderer::{AvatarClothRenderer, cloth_frame, draw_order};
pub use types::*;

use crate::color::Color;
use crate::geometry::{DisplayCoordinate, MapLocation};
use crate::instance::{RenderBatch, TextLabel};
use crate::scene::constants::AVATAR_LAYER_OFFSET;
use crate::scene::entity::{
    EntityCore, EntityError, FrameContext, Highlight, InputContext, Interactive, Renderable,
    capabilities_via_core, renderable_via_core,
};
use crate::scene::graph::SceneGraph;
use crate::scene::input::{HoverTarget, MapEvent, MouseButton};
use crate::scene::markers::{AttackState, AvatarMarker};
use crate::scene::template::{AvatarTemplate, TemplateProvider};
use std::sync::Arc;
use tracing::{debug, error};

/// A character on the map: body sprite, worn clothes, attack marker and name
/// tag.
#[derive(Debug)]
pub struct Avatar {
    core: EntityCore,
    character: CharacterId,
    template: Arc<AvatarTemplate>,
    clothes: AvatarClothRenderer,
    /// Item (or body part) id per cloth slot, kept across direction changes.
    worn: [Option<u32>; AvatarClothGroup::COUNT],
    cloth_colors: [Option<Color>; AvatarClothGroup::COUNT],
    marker: AvatarMarker,
    location: MapLocation,
    name: Option<String>,
    name_color: Color,
    show_name: bool,
    hovered: bool,
}

impl Avatar {
    pub fn create(
        character: CharacterId,
        appearance: u32,
        direction: Direction,
        location: MapLocation,
        provider: &dyn TemplateProvider,
    ) -> Option<Avatar> {
        let Some(template) = provider.avatar(appearance, direction) else {
            error!(?character, appearance, ?direction, "unknown avatar template");
            return None;
        };
        let coordinate = Self::coordinate_of(location);
        let core = EntityCore::new(template.default_color).with_coordinate(coordinate);
        let clothes = AvatarClothRenderer::new(direction, template.sprite.frame_count());
        let mut marker = AvatarMarker::new(provider);
        clothes.set_coordinate(coordinate).ok()?;
        marker.place(coordinate).ok()?;
        let mut avatar = Avatar {
            core,
            character,
            template,
            clothes,
            worn: [None; AvatarClothGroup::COUNT],
            cloth_colors: [None; AvatarClothGroup::COUNT],
            marker,
            location,
            name: None,
            name_color: Color::WHITE,
            show_name: false,
            hovered: false,
        };
        avatar.set_frame(avatar.template.still_frame).ok()?;
        Some(avatar)
    }

    /// Display coordinate of an avatar standing on `location`.
    pub fn coordinate_of(location: MapLocation) -> DisplayCoordinate {
        location.display_coordinate_on_layer(AVATAR_LAYER_OFFSET)
    }

    pub fn character(&self) -> CharacterId {
        self.character
    }

    pub fn appearance(&self) -> u32 {
        self.template.appearance
    }

    pub fn direction(&self) -> Direction {
        self.template.direction
    }

    pub fn location(&self) -> MapLocation {
        self.location
    }

    pub fn clothes(&self) -> &AvatarClothRenderer {
        &self.clothes
    }

    pub fn frame_count(&self) -> usize {
        self.template.sprite.frame_count()
    }

    pub fn still_frame(&self) -> usize {
        self.template.still_frame
    }

    /// Turns the avatar. Returns `false` when the appearance has no graphic
    /// for the direction, in which case nothing changes.
    pub fn set_direction(
        &mut self,
        direction: Direction,
        provider: &dyn TemplateProvider,
    ) -> Result<bool, EntityError> {
        self.core.ensure_alive()?;
        if direction == self.direction() {
            return Ok(true);
        }
        let Some(template) = provider.avatar(self.appearance(), direction) else {
            error!(
                character = ?self.character,
                appearance = self.appearance(),
                ?direction,
                "no avatar template for direction"
            );
            return Ok(false);
        };
        self.template = template;
        self.clothes.clear();
        self.clothes
            .set_direction(direction, self.template.sprite.frame_count())?;
        for group in AvatarClothGroup::ALL {
            if let Some(item) = self.worn[group.index()] {
                self.dress(group, item, provider)?;
            }
        }
        let frame = self.core.frame().min(self.frame_count() - 1);
        self.set_frame(frame)?;
        Ok(true)
    }

    /// Puts on `item` in `group`, or takes the slot off for `None`. Returns
    /// whether a cloth graphic is shown for the slot.
    pub fn set_cloth(
        &mut self,
        group: AvatarClothGroup,
        item: Option<u32>,
        provider: &dyn TemplateProvider,
    ) -> Result<bool, EntityError> {
        self.core.ensure_alive()?;
        self.worn[group.index()] = item;
        self.cloth_colors[group.index()] = None;
        match item {
            Some(item) => self.dress(group, item, provider),
            None => {
                self.clothes.remove_cloth(group);
                Ok(false)
            }
        }
    }

    fn dress(
        &mut self,
        group: AvatarClothGroup,
        item: u32,
        provider: &dyn TemplateProvider,
    ) -> Result<bool, EntityError> {
        let Some(cloth) = self.template.clothes.get_cloth(group, item, provider) else {
            debug!(character = ?self.character, ?group, item, "no cloth graphic");
            self.clothes.remove_cloth(group);
            return Ok(false);
        };
        self.clothes.set_cloth(cloth)?;
        if let Some(color) = self.cloth_colors[group.index()] {
            self.clothes.set_cloth_color(group, Some(color))?;
        }
        Ok(true)
    }

    pub fn worn(&self, group: AvatarClothGroup) -> Option<u32> {
        self.worn[group.index()]
    }

    /// Colors hair and beard, which carry no color of their own.
    pub fn set_cloth_color(
        &mut self,
        group: AvatarClothGroup,
        color: Option<Color>,
    ) -> Result<(), EntityError> {
        self.core.ensure_alive()?;
        self.cloth_colors[group.index()] = color;
        self.clothes.set_cloth_color(group, color)
    }

    pub fn set_frame(&mut self, frame: usize) -> Result<(), EntityError> {
        self.core.set_frame(frame)?;
        self.clothes.set_frame(frame)
    }

    pub fn set_scale(&mut self, scale: f32) -> Result<(), EntityError> {
        self.core.set_scale(scale)?;
        self.clothes.set_scale(scale)?;
        self.marker.core_mut().set_scale(scale)
    }

    pub fn attack_state(&self) -> AttackState {
        self.marker.state()
    }

    pub fn set_attack_state(&mut self, state: AttackState) -> Result<(), EntityError> {
        self.core.ensure_alive()?;
        self.marker.set_state(state)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<String>, color: Color) -> Result<(), EntityError> {
        self.core.ensure_alive()?;
        self.name = name;
        self.name_color = color;
        Ok(())
    }

    /// Shows the name tag permanently instead of only while hovered.
    pub fn set_name_visible(&mut self, visible: bool) {
        self.show_name = visible;
    }

    pub fn is_name_shown(&self) -> bool {
        self.name.is_some() && (self.show_name || self.hovered)
    }

    /// Changes the map location without moving the sprite.
    pub fn set_location(&mut self, location: MapLocation) -> Result<(), EntityError> {
        self.core.ensure_alive()?;
        self.location = location;
        Ok(())
    }

    /// Moves the sprite, its clothes and marker.
    pub fn set_display_coordinate(
        &mut self,
        coordinate: DisplayCoordinate,
        graph: &mut dyn SceneGraph,
    ) -> Result<(), EntityError> {
        self.core.set_coordinate(coordinate, graph)?;
        self.clothes.set_coordinate(coordinate)?;
        self.marker.place(coordinate)
    }

    /// Moves the avatar to `location` without any walking animation.
    pub fn warp_to(
        &mut self,
        location: MapLocation,
        graph: &mut dyn SceneGraph,
    ) -> Result<(), EntityError> {
        self.set_location(location)?;
        self.set_display_coordinate(Self::coordinate_of(location), graph)
    }

    pub fn clear_highlight(&mut self) -> Result<(), EntityError> {
        self.hovered = false;
        self.core.set_highlight(Highlight::None)?;
        self.clothes.set_highlight(Highlight::None)
    }

    fn hit(&self, x: i32, y: i32) -> bool {
        self.core.alpha() > 0
            && !self.core.is_removed()
            && self.template.sprite.is_opaque_at(
                self.core.frame(),
                &self.core.display_rect(),
                x,
                y,
            )
    }

    fn name_label(&self) -> Option<TextLabel> {
        if !self.is_name_shown() {
            return None;
        }
        let coordinate = self.core.coordinate()?;
        let offset = (self.template.name_offset as f32 * self.core.scale()).round() as i32;
        Some(TextLabel {
            entity: self.core.id(),
            text: self.name.clone()?,
            x: coordinate.x,
            y: coordinate.y - offset,
            color: self.name_color.with_alpha_u8(self.core.alpha()),
        })
    }
}

capabilities_via_core!(Avatar);

impl Renderable for Avatar {
    renderable_via_core!();

    fn update(
        &mut self,
        ctx: &FrameContext<'_>,
        parent_light: Color,
        delta: u32,
    ) -> Result<(), EntityError> {
        let bounds = self.core.sprite_rect(&self.template.sprite);
        self.core.update(ctx, bounds, parent_light, delta)?;
        let alpha = self.core.alpha();
        self.clothes.set_alpha(alpha)?;
        self.clothes.update(ctx, self.core.local_light(), delta)?;
        self.marker.update(ctx, alpha, parent_light, delta)
    }

    fn render(&self, ctx: &FrameContext<'_>, out: &mut RenderBatch) -> Result<bool, EntityError> {
        let Some(body) = self.core.sprite_instance(&self.template.sprite, ctx)? else {
            return Ok(false);
        };
        self.marker.render(ctx, out)?;
        out.push(body);
        self.clothes.render(ctx, out)?;
        if let Some(label) = self.name_label() {
            out.push_label(label);
        }
        Ok(true)
    }
}

impl Interactive for Avatar {
    fn is_event_processed(
        &mut self,
        ctx: &mut InputContext<'_>,
        _delta: u32,
        event: &MapEvent,
    ) -> bool {
        let (x, y) = event.position();
        if !self.hit(x, y) {
            return false;
        }
        match *event {
            MapEvent::Click {
                button: MouseButton::Left | MouseButton::Right,
                ..
            } => ctx.handler.look_at_character(self.character),
            MapEvent::DoubleClick { .. } => ctx.handler.attack_character(self.character),
            MapEvent::PointAt { .. } => {
                if self.core.set_highlight(Highlight::Weak).is_err()
                    || self.clothes.set_highlight(Highlight::Weak).is_err()
                {
                    return false;
                }
                self.hovered = true;
                ctx.handler.point_at(HoverTarget::Character(self.character));
            }
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::scene::fading::FadingCorridor;
    use crate::scene::graph::DisplayList;
    use crate::scene::input::InteractionHandler;
    use crate::scene::markers::MarkerKind;
    use crate::scene::template::{
        Anchor, ClothTemplate, ItemTemplate, MarkerTemplate, TemplateStore,
    };

    const HUMAN: u32 = 1;

    fn store() -> TemplateStore {
        let mut store = TemplateStore::new(2048, 2048);
        let mut clothes = AvatarClothManager::new();
        let hair = store
            .create_sprite("hair", 40, 80, Anchor::Bottom, 4)
            .unwrap();
        clothes.add_cloth(Arc::new(ClothTemplate {
            id: 2,
            group: AvatarClothGroup::Hair,
            sprite: hair,
        }));
        let shirt = store
            .create_sprite("shirt", 40, 80, Anchor::Bottom, 8)
            .unwrap();
        clothes.add_cloth(Arc::new(ClothTemplate {
            id: 11,
            group: AvatarClothGroup::Chest,
            sprite: shirt,
        }));
        let clothes = Arc::new(clothes);
        for direction in [Direction::South, Direction::West] {
            let sprite = store
                .create_sprite("human", 40, 80, Anchor::Bottom, 8)
                .unwrap();
            store.add_avatar(AvatarTemplate {
                appearance: HUMAN,
                direction,
                sprite,
                still_frame: 0,
                default_color: None,
                clothes: clothes.clone(),
                name_offset: 90,
            });
        }
        let item = store
            .create_sprite("shirt item", 20, 20, Anchor::Bottom, 1)
            .unwrap();
        let ring = store
            .create_sprite("attack ring", 50, 20, Anchor::Center, 1)
            .unwrap();
        store.add_marker(MarkerTemplate {
            kind: MarkerKind::Attack,
            sprite: ring,
        });
        store.add_item(ItemTemplate {
            id: 181,
            name: "shirt".to_owned(),
            sprite: item,
            level: 1,
            paperdoll_id: Some(11),
            paperdoll_color: Some(Color::new(0.0, 0.0, 1.0, 1.0)),
            default_color: None,
        });
        store
    }

    fn frame_context<'a>(camera: &'a Camera, corridor: &'a FadingCorridor) -> FrameContext<'a> {
        FrameContext { camera, corridor }
    }

    #[derive(Default)]
    struct Recorder {
        looked: Vec<CharacterId>,
        attacked: Vec<CharacterId>,
        hovered: Vec<HoverTarget>,
    }

    impl InteractionHandler for Recorder {
        fn look_at_character(&mut self, character: CharacterId) {
            self.looked.push(character);
        }

        fn attack_character(&mut self, character: CharacterId) {
            self.attacked.push(character);
        }

        fn point_at(&mut self, target: HoverTarget) {
            self.hovered.push(target);
        }
    }

    fn avatar(store: &TemplateStore) -> Avatar {
        Avatar::create(
            CharacterId(7),
            HUMAN,
            Direction::South,
            MapLocation::new(3, 3, 0),
            store,
        )
        .unwrap()
    }

    #[test]
    fn unknown_appearance_creates_nothing() {
        let store = store();
        let avatar = Avatar::create(
            CharacterId(1),
            99,
            Direction::South,
            MapLocation::default(),
            &store,
        );
        assert!(avatar.is_none());
    }

    #[test]
    fn clothes_survive_turning() {
        let store = store();
        let mut avatar = avatar(&store);
        assert!(avatar.set_cloth(AvatarClothGroup::Hair, Some(2), &store).unwrap());
        assert!(avatar.set_cloth(AvatarClothGroup::Chest, Some(181), &store).unwrap());
        assert!(!avatar.set_cloth(AvatarClothGroup::Hat, Some(181), &store).unwrap());

        assert!(avatar.set_direction(Direction::West, &store).unwrap());
        assert_eq!(avatar.direction(), Direction::West);
        assert_eq!(avatar.clothes().direction(), Direction::West);
        assert_eq!(avatar.clothes().cloth_id(AvatarClothGroup::Chest), Some(11));
        assert!(avatar.clothes().has_cloth(AvatarClothGroup::Hair));
        assert!(!avatar.clothes().has_cloth(AvatarClothGroup::Hat));

        // no graphic for north
        assert!(!avatar.set_direction(Direction::North, &store).unwrap());
        assert_eq!(avatar.direction(), Direction::West);
    }

    #[test]
    fn frames_fan_out_to_clothes() {
        let store = store();
        let mut avatar = avatar(&store);
        avatar.set_cloth(AvatarClothGroup::Hair, Some(2), &store).unwrap();
        avatar.set_frame(6).unwrap();
        assert_eq!(avatar.core().frame(), 6);
        assert_eq!(avatar.clothes().cloth_frame_of(AvatarClothGroup::Hair), Some(3));
    }

    #[test]
    fn renders_marker_body_clothes_and_name() {
        let store = store();
        let camera = Camera::new(800, 600, 1.0);
        let corridor = FadingCorridor::default();
        let ctx = frame_context(&camera, &corridor);
        let mut avatar = avatar(&store);
        avatar.set_cloth(AvatarClothGroup::Chest, Some(181), &store).unwrap();
        avatar.set_attack_state(AttackState::Attacked).unwrap();
        avatar
            .set_name(Some("Mira".to_owned()), Color::WHITE)
            .unwrap();
        avatar.set_name_visible(true);
        avatar.update(&ctx, Color::WHITE, 16).unwrap();

        let mut batch = RenderBatch::default();
        assert!(avatar.render(&ctx, &mut batch).unwrap());
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.instances[1].entity, avatar.id());
        assert_eq!(batch.labels[0].text, "Mira");
        let coordinate = avatar.core().coordinate().unwrap();
        assert_eq!(batch.labels[0].y, coordinate.y - 90);
    }

    #[test]
    fn interaction_targets_the_character() {
        let store = store();
        let camera = Camera::new(800, 600, 1.0);
        let corridor = FadingCorridor::default();
        let ctx = frame_context(&camera, &corridor);
        let mut graph = DisplayList::new();
        let mut avatar = avatar(&store);
        avatar.set_name(Some("Mira".to_owned()), Color::WHITE).unwrap();
        avatar.show(&mut graph).unwrap();
        avatar.update(&ctx, Color::WHITE, 0).unwrap();

        let coordinate = avatar.core().coordinate().unwrap();
        let (x, y) = (coordinate.x, coordinate.y - 20);
        let mut recorder = Recorder::default();
        let mut input = InputContext {
            handler: &mut recorder,
        };
        let miss = MapEvent::Click {
            x: x + 100,
            y,
            button: MouseButton::Left,
        };
        assert!(!avatar.is_event_processed(&mut input, 0, &miss));
        assert!(avatar.is_event_processed(&mut input, 0, &MapEvent::DoubleClick {
            x,
            y,
            button: MouseButton::Left,
        }));
        assert!(!avatar.is_name_shown());
        assert!(avatar.is_event_processed(&mut input, 0, &MapEvent::PointAt { x, y }));
        assert!(avatar.is_name_shown());
        assert_eq!(avatar.core().highlight(), Highlight::Weak);

        assert_eq!(recorder.attacked, vec![CharacterId(7)]);
        assert_eq!(recorder.hovered, vec![HoverTarget::Character(CharacterId(7))]);
        assert!(recorder.looked.is_empty());

        avatar.clear_highlight().unwrap();
        assert!(!avatar.is_name_shown());
    }

    #[test]
    fn walking_moves_clothes_along() {
        let store = store();
        let mut graph = DisplayList::new();
        let mut avatar = avatar(&store);
        avatar.set_cloth(AvatarClothGroup::Hair, Some(2), &store).unwrap();
        avatar.show(&mut graph).unwrap();

        let target = MapLocation::new(4, 3, 0);
        avatar.warp_to(target, &mut graph).unwrap();
        assert_eq!(avatar.location(), target);
        assert_eq!(graph.layer_of(avatar.id()), Some(Avatar::coordinate_of(target).layer));

        avatar.remove(&mut graph);
        assert!(!graph.contains(avatar.id()));
        assert_eq!(
            avatar.warp_to(MapLocation::default(), &mut graph),
            Err(EntityError::Removed(avatar.id()))
        );
    }
}
