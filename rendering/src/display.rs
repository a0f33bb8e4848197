use crate::animation::{
    AnimationEvent, AnimationHandle, AnimationManager, AnimationSink, FrameAnimation, FrameMode,
    MoveAnimation, Scheduler, TargetId, utility::approach_f32,
};
use crate::camera::{Camera, CameraUniform};
use crate::color::Color;
use crate::geometry::{DisplayCoordinate, MapLocation, Rectangle};
use crate::instance::RenderBatch;
use crate::scene::constants::{FOG_CHANGE_FACTOR, GRAYSCALE_CHANGE_FACTOR};
use crate::scene::entity::{
    EntityError, EntityId, FrameContext, InputContext, Interactive, LightBlended, Renderable,
};
use crate::scene::fading::FadingCorridor;
use crate::scene::graph::DisplayList;
use crate::scene::input::{InteractionHandler, MapEvent};
use crate::scene::items::{Item, ItemStack};
use crate::scene::map::{Overlay, Tile, TileId, corner_lights};
use crate::scene::markers::{AttackState, QuestMarker, QuestMarkerKind};
use crate::scene::players::{Avatar, AvatarClothGroup, CharacterId, Direction};
use crate::scene::effects::Effect;
use crate::scene::template::TemplateProvider;
use crate::world::WorldView;
use game_types::{GraphicsSettings, XRaySize};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Display related options, taken from the graphics settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub xray_size: XRaySize,
    pub zoom: f32,
    pub show_names: bool,
    pub name_color: Color,
    pub fog: bool,
    pub viewport_width: i32,
    pub viewport_height: i32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self::from(&GraphicsSettings::default())
    }
}

impl From<&GraphicsSettings> for DisplaySettings {
    fn from(settings: &GraphicsSettings) -> Self {
        let [r, g, b, a] = settings.name_color.rgba();
        Self {
            xray_size: settings.xray_size,
            zoom: settings.scale,
            show_names: settings.show_names,
            name_color: Color::from_rgba8(r, g, b, a),
            fog: settings.fog,
            viewport_width: settings.viewport_width as i32,
            viewport_height: settings.viewport_height as i32,
        }
    }
}

/// Every kind of entity placed on the map.
#[derive(Debug)]
pub enum MapEntity {
    Tile(Tile),
    Overlay(Overlay),
    Items(ItemStack),
    Avatar(Avatar),
    Effect(Effect),
    QuestMarker(QuestMarker),
}

impl MapEntity {
    pub fn kind(&self) -> &'static str {
        match self {
            MapEntity::Tile(_) => "tile",
            MapEntity::Overlay(_) => "overlay",
            MapEntity::Items(_) => "items",
            MapEntity::Avatar(_) => "avatar",
            MapEntity::Effect(_) => "effect",
            MapEntity::QuestMarker(_) => "quest marker",
        }
    }

    /// Map location the entity belongs to. Walking avatars report their
    /// destination.
    pub fn location(&self) -> MapLocation {
        match self {
            MapEntity::Tile(tile) => tile.location(),
            MapEntity::Overlay(overlay) => overlay.location(),
            MapEntity::Items(stack) => stack.location(),
            MapEntity::Avatar(avatar) => avatar.location(),
            MapEntity::Effect(effect) => effect.location(),
            MapEntity::QuestMarker(marker) => marker.location(),
        }
    }

    pub fn renderable(&self) -> &dyn Renderable {
        match self {
            MapEntity::Tile(tile) => tile,
            MapEntity::Overlay(overlay) => overlay,
            MapEntity::Items(stack) => stack,
            MapEntity::Avatar(avatar) => avatar,
            MapEntity::Effect(effect) => effect,
            MapEntity::QuestMarker(marker) => marker,
        }
    }

    pub fn renderable_mut(&mut self) -> &mut dyn Renderable {
        match self {
            MapEntity::Tile(tile) => tile,
            MapEntity::Overlay(overlay) => overlay,
            MapEntity::Items(stack) => stack,
            MapEntity::Avatar(avatar) => avatar,
            MapEntity::Effect(effect) => effect,
            MapEntity::QuestMarker(marker) => marker,
        }
    }

    pub fn interactive_mut(&mut self) -> Option<&mut dyn Interactive> {
        match self {
            MapEntity::Tile(tile) => Some(tile),
            MapEntity::Items(stack) => Some(stack),
            MapEntity::Avatar(avatar) => Some(avatar),
            _ => None,
        }
    }

    fn clear_highlight(&mut self) -> Result<(), EntityError> {
        match self {
            MapEntity::Tile(tile) => tile.core_mut().set_highlight(Default::default()),
            MapEntity::Items(stack) => {
                stack.clear_highlight();
                Ok(())
            }
            MapEntity::Avatar(avatar) => avatar.clear_highlight(),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TileEntry {
    tile: EntityId,
    overlay: Option<EntityId>,
    template: u32,
}

#[derive(Debug, Clone, Copy)]
struct AvatarEntry {
    entity: EntityId,
    movement: AnimationHandle,
    frames: AnimationHandle,
}

/// Applies animation output to the entities it targets.
struct EntitySink<'a> {
    entities: &'a mut FxHashMap<EntityId, MapEntity>,
    graph: &'a mut DisplayList,
    finished_effects: &'a mut Vec<EntityId>,
}

impl AnimationSink for EntitySink<'_> {
    fn deliver(
        &mut self,
        animation: AnimationHandle,
        target: TargetId,
        event: AnimationEvent,
        _scheduler: &mut Scheduler<'_>,
    ) {
        let id = EntityId::from(target);
        let Some(entity) = self.entities.get_mut(&id) else {
            trace!(?id, ?event, "animation target is gone");
            return;
        };
        let result = match (entity, event) {
            (MapEntity::Tile(tile), AnimationEvent::Frame(frame)) => {
                tile.core_mut().set_frame(frame)
            }
            (MapEntity::Avatar(avatar), AnimationEvent::Frame(frame)) => avatar.set_frame(frame),
            (MapEntity::Avatar(avatar), AnimationEvent::Position(coordinate)) => {
                avatar.set_display_coordinate(coordinate, &mut *self.graph)
            }
            (MapEntity::Effect(effect), AnimationEvent::Frame(frame)) => {
                effect.core_mut().set_frame(frame)
            }
            (MapEntity::Effect(_), AnimationEvent::Finished { .. }) => {
                self.finished_effects.push(id);
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(err) = result {
            warn!(?animation, %err, "animation update rejected");
        }
    }
}

fn report<T>(result: Result<T, EntityError>, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(%err, "{what} failed");
            None
        }
    }
}

/// Owns everything drawn on the map and keeps it in sync with the world.
pub struct MapDisplayManager {
    settings: DisplaySettings,
    templates: Arc<dyn TemplateProvider + Send + Sync>,
    camera: Camera,
    corridor: FadingCorridor,
    graph: DisplayList,
    animations: AnimationManager,
    entities: FxHashMap<EntityId, MapEntity>,
    tiles: FxHashMap<MapLocation, TileEntry>,
    stacks: FxHashMap<MapLocation, EntityId>,
    avatars: FxHashMap<CharacterId, AvatarEntry>,
    effects: FxHashMap<EntityId, AnimationHandle>,
    quest_markers: FxHashMap<MapLocation, EntityId>,
    tile_animations: FxHashMap<u32, AnimationHandle>,
    finished_effects: Vec<EntityId>,
    player: Option<CharacterId>,
    hovered: Option<EntityId>,
    fog: f32,
    grayscale: f32,
}

impl MapDisplayManager {
    pub fn new(
        settings: DisplaySettings,
        templates: Arc<dyn TemplateProvider + Send + Sync>,
    ) -> Self {
        let camera = Camera::new(
            settings.viewport_width,
            settings.viewport_height,
            settings.zoom,
        );
        let corridor = FadingCorridor::new(settings.xray_size);
        Self {
            settings,
            templates,
            camera,
            corridor,
            graph: DisplayList::new(),
            animations: AnimationManager::new(),
            entities: FxHashMap::default(),
            tiles: FxHashMap::default(),
            stacks: FxHashMap::default(),
            avatars: FxHashMap::default(),
            effects: FxHashMap::default(),
            quest_markers: FxHashMap::default(),
            tile_animations: FxHashMap::default(),
            finished_effects: Vec::new(),
            player: None,
            hovered: None,
            fog: 0.0,
            grayscale: 0.0,
        }
    }

    pub fn settings(&self) -> &DisplaySettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: DisplaySettings) {
        self.corridor.set_size(settings.xray_size);
        self.camera.set_zoom(settings.zoom);
        self.camera
            .resize(settings.viewport_width, settings.viewport_height);
        for entry in self.avatars.values() {
            if let Some(MapEntity::Avatar(avatar)) = self.entities.get_mut(&entry.entity) {
                avatar.set_name_visible(settings.show_names);
            }
        }
        self.settings = settings;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn corridor(&self) -> &FadingCorridor {
        &self.corridor
    }

    pub fn display_list(&self) -> &DisplayList {
        &self.graph
    }

    pub fn animations(&self) -> &AnimationManager {
        &self.animations
    }

    pub fn entity(&self, id: EntityId) -> Option<&MapEntity> {
        self.entities.get(&id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn tile_at(&self, location: MapLocation) -> Option<&Tile> {
        let entry = self.tiles.get(&location)?;
        match self.entities.get(&entry.tile)? {
            MapEntity::Tile(tile) => Some(tile),
            _ => None,
        }
    }

    pub fn overlay_at(&self, location: MapLocation) -> Option<&Overlay> {
        let id = self.tiles.get(&location)?.overlay?;
        match self.entities.get(&id)? {
            MapEntity::Overlay(overlay) => Some(overlay),
            _ => None,
        }
    }

    pub fn stack_at(&self, location: MapLocation) -> Option<&ItemStack> {
        match self.entities.get(self.stacks.get(&location)?)? {
            MapEntity::Items(stack) => Some(stack),
            _ => None,
        }
    }

    pub fn avatar(&self, character: CharacterId) -> Option<&Avatar> {
        match self.entities.get(&self.avatars.get(&character)?.entity)? {
            MapEntity::Avatar(avatar) => Some(avatar),
            _ => None,
        }
    }

    fn avatar_mut(&mut self, character: CharacterId) -> Option<&mut Avatar> {
        let entry = self.avatars.get(&character)?;
        match self.entities.get_mut(&entry.entity)? {
            MapEntity::Avatar(avatar) => Some(avatar),
            _ => None,
        }
    }

    pub fn quest_marker_at(&self, location: MapLocation) -> Option<&QuestMarker> {
        match self.entities.get(self.quest_markers.get(&location)?)? {
            MapEntity::QuestMarker(marker) => Some(marker),
            _ => None,
        }
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn player(&self) -> Option<CharacterId> {
        self.player
    }

    pub fn hovered(&self) -> Option<EntityId> {
        self.hovered
    }

    pub fn fog(&self) -> f32 {
        self.fog
    }

    pub fn grayscale(&self) -> f32 {
        self.grayscale
    }

    fn insert_entity(&mut self, mut entity: MapEntity) -> Option<EntityId> {
        let id = entity.renderable().id();
        report(entity.renderable_mut().show(&mut self.graph), "showing entity")?;
        self.entities.insert(id, entity);
        Some(id)
    }

    fn remove_entity(&mut self, id: EntityId) -> Option<MapEntity> {
        let mut entity = self.entities.remove(&id)?;
        entity.renderable_mut().remove(&mut self.graph);
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        Some(entity)
    }

    fn start_animation(&mut self, handle: AnimationHandle) -> bool {
        let mut sink = EntitySink {
            entities: &mut self.entities,
            graph: &mut self.graph,
            finished_effects: &mut self.finished_effects,
        };
        match self.animations.start(handle, &mut sink) {
            Ok(()) => true,
            Err(err) => {
                warn!(?handle, %err, "animation not started");
                false
            }
        }
    }

    /// Places a tile, replacing the one on `location`. Returns `false` when
    /// the tile could not be created; the location is empty afterwards.
    pub fn set_tile(&mut self, location: MapLocation, tile_id: TileId) -> bool {
        self.remove_tile(location);
        let Some(mut tile) = Tile::create(location, tile_id, &*self.templates) else {
            return false;
        };
        let template = tile.template().clone();
        let animated = tile.is_animated();
        let handle = animated.then(|| {
            self.tile_animation(
                template.id,
                template.sprite.frame_count(),
                template.animation_speed,
            )
        });
        if let Some(frame) = handle
            .and_then(|h| self.animations.get::<FrameAnimation>(h))
            .and_then(FrameAnimation::current_frame)
        {
            report(tile.core_mut().set_frame(frame), "syncing tile frame");
        }
        let Some(tile) = self.insert_entity(MapEntity::Tile(tile)) else {
            return false;
        };

        let overlay = if tile_id.has_overlay() {
            Overlay::create(location, tile_id.overlay(), tile_id.shape(), &*self.templates)
                .and_then(|overlay| self.insert_entity(MapEntity::Overlay(overlay)))
        } else {
            None
        };
        self.tiles.insert(
            location,
            TileEntry {
                tile,
                overlay,
                template: template.id,
            },
        );

        if let Some(handle) = handle {
            report_animation(self.animations.add_target(handle, tile.into()));
            if !self.animations.is_running(handle) {
                self.start_animation(handle);
            }
        }
        true
    }

    /// Shared looping animation of all tiles made from one template.
    fn tile_animation(&mut self, template: u32, frames: usize, duration: u32) -> AnimationHandle {
        *self.tile_animations.entry(template).or_insert_with(|| {
            debug!(template, frames, "tile animation created");
            self.animations
                .insert(FrameAnimation::new(frames, 0, duration, FrameMode::LOOPED))
        })
    }

    pub fn remove_tile(&mut self, location: MapLocation) -> bool {
        let Some(entry) = self.tiles.remove(&location) else {
            return false;
        };
        if let Some(handle) = self.tile_animations.get(&entry.template) {
            if self.animations.contains(*handle) {
                report_animation(self.animations.remove_target(*handle, entry.tile.into()));
            }
        }
        self.remove_entity(entry.tile);
        if let Some(overlay) = entry.overlay {
            self.remove_entity(overlay);
        }
        true
    }

    fn stack_or_create(&mut self, location: MapLocation) -> EntityId {
        if let Some(id) = self.stacks.get(&location) {
            return *id;
        }
        let stack = ItemStack::new(location);
        let id = stack.id();
        self.entities.insert(id, MapEntity::Items(stack));
        self.stacks.insert(location, id);
        id
    }

    /// Puts an item on top of the stack at `location`. Returns its index.
    pub fn push_item(&mut self, location: MapLocation, item_id: u32, count: u32) -> Option<usize> {
        let item = Item::create(item_id, count, location, &*self.templates)?;
        let id = self.stack_or_create(location);
        let Some(MapEntity::Items(stack)) = self.entities.get(&id) else {
            return None;
        };
        let pushed = report(stack.push(item, &mut self.graph), "pushing item");
        self.drop_empty_stack(location);
        pushed
    }

    pub fn insert_item(
        &mut self,
        location: MapLocation,
        index: usize,
        item_id: u32,
        count: u32,
    ) -> bool {
        let Some(item) = Item::create(item_id, count, location, &*self.templates) else {
            return false;
        };
        let id = self.stack_or_create(location);
        let Some(MapEntity::Items(stack)) = self.entities.get(&id) else {
            return false;
        };
        let inserted = report(stack.insert(index, item, &mut self.graph), "inserting item");
        self.drop_empty_stack(location);
        inserted.is_some()
    }

    /// Takes the item at `index` off the stack. Returns its template id.
    pub fn remove_item(&mut self, location: MapLocation, index: usize) -> Option<u32> {
        let id = *self.stacks.get(&location)?;
        let Some(MapEntity::Items(stack)) = self.entities.get(&id) else {
            return None;
        };
        let removed = report(stack.remove(index, &mut self.graph), "removing item");
        self.drop_empty_stack(location);
        removed.map(|item| item.item_id())
    }

    pub fn clear_items(&mut self, location: MapLocation) -> usize {
        let Some(id) = self.stacks.remove(&location) else {
            return 0;
        };
        let count = match self.entities.get(&id) {
            Some(MapEntity::Items(stack)) => stack.len(),
            _ => 0,
        };
        self.remove_entity(id);
        count
    }

    fn drop_empty_stack(&mut self, location: MapLocation) {
        if self.stack_at(location).is_some_and(ItemStack::is_empty) {
            self.clear_items(location);
        }
    }

    /// Places a character, replacing an avatar it already has.
    pub fn add_avatar(
        &mut self,
        character: CharacterId,
        appearance: u32,
        direction: Direction,
        location: MapLocation,
    ) -> bool {
        self.remove_avatar(character);
        let Some(mut avatar) =
            Avatar::create(character, appearance, direction, location, &*self.templates)
        else {
            return false;
        };
        avatar.set_name_visible(self.settings.show_names);
        let frames = FrameAnimation::new(
            avatar.frame_count(),
            avatar.still_frame(),
            1,
            FrameMode::CYCLIC,
        );
        let Some(entity) = self.insert_entity(MapEntity::Avatar(avatar)) else {
            return false;
        };
        let movement = self.animations.insert(MoveAnimation::new());
        let frames = self.animations.insert(frames);
        report_animation(self.animations.add_target(movement, entity.into()));
        report_animation(self.animations.add_target(frames, entity.into()));
        self.avatars.insert(
            character,
            AvatarEntry {
                entity,
                movement,
                frames,
            },
        );
        true
    }

    pub fn remove_avatar(&mut self, character: CharacterId) -> bool {
        let Some(entry) = self.avatars.remove(&character) else {
            return false;
        };
        self.animations.remove(entry.movement);
        self.animations.remove(entry.frames);
        self.remove_entity(entry.entity);
        true
    }

    pub fn turn_avatar(&mut self, character: CharacterId, direction: Direction) -> bool {
        let Some(entry) = self.avatars.get(&character).copied() else {
            return false;
        };
        let Some(MapEntity::Avatar(avatar)) = self.entities.get_mut(&entry.entity) else {
            return false;
        };
        let Some(true) = report(avatar.set_direction(direction, &*self.templates), "turning avatar")
        else {
            return false;
        };
        let (frames, still) = (avatar.frame_count(), avatar.still_frame());
        if let Some(animation) = self.animations.get_mut::<FrameAnimation>(entry.frames) {
            animation.set_frames(frames, still);
        }
        true
    }

    /// Walks a character to `location` over `duration` milliseconds, turning
    /// it toward the step. A zero duration places it right away.
    pub fn move_avatar(
        &mut self,
        character: CharacterId,
        location: MapLocation,
        duration: u32,
    ) -> bool {
        let Some(entry) = self.avatars.get(&character).copied() else {
            return false;
        };
        let Some(avatar) = self.avatar(character) else {
            return false;
        };
        let from = avatar.location();
        let Some(start) = avatar.core().coordinate() else {
            return false;
        };
        if let Some(direction) = Direction::from_delta(location.x - from.x, location.y - from.y) {
            if direction != avatar.direction() {
                self.turn_avatar(character, direction);
            }
        }

        let Some(MapEntity::Avatar(avatar)) = self.entities.get_mut(&entry.entity) else {
            return false;
        };
        if duration == 0 {
            self.animations.stop(entry.movement).ok();
            return report(avatar.warp_to(location, &mut self.graph), "placing avatar").is_some();
        }
        if report(avatar.set_location(location), "moving avatar").is_none() {
            return false;
        }
        if let Some(movement) = self.animations.get_mut::<MoveAnimation>(entry.movement) {
            movement.set_move(start, Avatar::coordinate_of(location), duration);
        }
        if let Some(frames) = self.animations.get_mut::<FrameAnimation>(entry.frames) {
            frames.set_mode(FrameMode::CYCLIC);
            frames.set_duration(duration);
        }
        self.start_animation(entry.movement) && self.start_animation(entry.frames)
    }

    /// Plays the body frames of a character once, e.g. for an attack.
    pub fn animate_avatar(
        &mut self,
        character: CharacterId,
        duration: u32,
        mode: FrameMode,
    ) -> bool {
        let Some(entry) = self.avatars.get(&character).copied() else {
            return false;
        };
        let Some(frames) = self.animations.get_mut::<FrameAnimation>(entry.frames) else {
            return false;
        };
        frames.set_mode(mode);
        frames.set_duration(duration);
        self.start_animation(entry.frames)
    }

    pub fn set_avatar_cloth(
        &mut self,
        character: CharacterId,
        group: AvatarClothGroup,
        item: Option<u32>,
    ) -> bool {
        let Some(entry) = self.avatars.get(&character) else {
            return false;
        };
        let Some(MapEntity::Avatar(avatar)) = self.entities.get_mut(&entry.entity) else {
            return false;
        };
        report(avatar.set_cloth(group, item, &*self.templates), "dressing avatar").unwrap_or(false)
    }

    pub fn set_avatar_cloth_color(
        &mut self,
        character: CharacterId,
        group: AvatarClothGroup,
        color: Option<Color>,
    ) -> bool {
        self.avatar_mut(character)
            .and_then(|avatar| report(avatar.set_cloth_color(group, color), "coloring cloth"))
            .is_some()
    }

    pub fn set_avatar_name(&mut self, character: CharacterId, name: Option<String>) -> bool {
        let color = self.settings.name_color;
        self.avatar_mut(character)
            .and_then(|avatar| report(avatar.set_name(name, color), "naming avatar"))
            .is_some()
    }

    pub fn set_attack_marker(&mut self, character: CharacterId, state: AttackState) -> bool {
        self.avatar_mut(character)
            .and_then(|avatar| report(avatar.set_attack_state(state), "marking avatar"))
            .is_some()
    }

    /// The character the camera follows and the fading corridor is built
    /// around.
    pub fn set_player(&mut self, character: Option<CharacterId>) {
        self.player = character;
    }

    /// Plays an effect on `location`. It is removed once its animation ends.
    pub fn show_effect(&mut self, location: MapLocation, effect_id: u32) -> Option<EntityId> {
        let effect = Effect::create(location, effect_id, &*self.templates)?;
        let animation = effect.animation();
        let id = self.insert_entity(MapEntity::Effect(effect))?;
        let handle = self.animations.insert(animation);
        report_animation(self.animations.add_target(handle, id.into()));
        self.effects.insert(id, handle);
        self.start_animation(handle);
        Some(id)
    }

    /// Shows a quest marker on `location`, or removes it for `None`.
    pub fn set_quest_marker(
        &mut self,
        location: MapLocation,
        kind: Option<QuestMarkerKind>,
    ) -> bool {
        if let Some(id) = self.quest_markers.remove(&location) {
            self.remove_entity(id);
        }
        let Some(kind) = kind else {
            return true;
        };
        let Some(marker) = QuestMarker::create(location, kind, &*self.templates) else {
            return false;
        };
        match self.insert_entity(MapEntity::QuestMarker(marker)) {
            Some(id) => {
                self.quest_markers.insert(location, id);
                true
            }
            None => false,
        }
    }

    /// Removes everything from the map, e.g. when the player changes maps.
    pub fn clear(&mut self) {
        for (_, mut entity) in self.entities.drain() {
            entity.renderable_mut().remove(&mut self.graph);
        }
        self.graph.clear();
        self.animations = AnimationManager::new();
        self.tiles.clear();
        self.stacks.clear();
        self.avatars.clear();
        self.effects.clear();
        self.quest_markers.clear();
        self.tile_animations.clear();
        self.finished_effects.clear();
        self.corridor.clear();
        self.hovered = None;
        debug!("map display cleared");
    }

    fn remove_finished_effects(&mut self) {
        for id in std::mem::take(&mut self.finished_effects) {
            if let Some(handle) = self.effects.remove(&id) {
                self.animations.remove(handle);
            }
            self.remove_entity(id);
        }
    }

    /// Display rect and coordinate of the player avatar.
    fn player_bounds(&self) -> Option<(Rectangle, DisplayCoordinate)> {
        let avatar = self.avatar(self.player?)?;
        Some((avatar.display_rect(), avatar.core().coordinate()?))
    }

    /// Advances the map by `delta` milliseconds.
    pub fn update(&mut self, delta: u32, world: &dyn WorldView) {
        let mut sink = EntitySink {
            entities: &mut self.entities,
            graph: &mut self.graph,
            finished_effects: &mut self.finished_effects,
        };
        self.animations.animate(delta, &mut sink);
        self.remove_finished_effects();

        match self.player_bounds() {
            Some((rect, coordinate)) => {
                self.corridor.set_corridor(rect, coordinate.layer);
                self.camera.center_on(coordinate.x, coordinate.y);
            }
            None => {
                self.corridor.clear();
                if let Some(location) = world.player_location() {
                    let coordinate = location.display_coordinate();
                    self.camera.center_on(coordinate.x, coordinate.y);
                }
            }
        }

        let ctx = FrameContext {
            camera: &self.camera,
            corridor: &self.corridor,
        };
        let mut tile_lights = FxHashMap::default();
        for (location, entry) in &self.tiles {
            let Some(MapEntity::Tile(tile)) = self.entities.get_mut(&entry.tile) else {
                continue;
            };
            let corners = corner_lights(*location, |l| world.light_at(l));
            let result = tile
                .set_corner_light(corners)
                .and_then(|()| tile.update(&ctx, world.light_at(*location), delta));
            if report(result, "updating tile").is_some() {
                tile_lights.insert(*location, tile.local_light());
            }
        }

        let light_on = |location: MapLocation| {
            tile_lights
                .get(&location)
                .copied()
                .unwrap_or_else(|| world.light_at(location))
        };
        for entity in self.entities.values_mut() {
            let result = match entity {
                MapEntity::Tile(_) => continue,
                MapEntity::Overlay(overlay) => {
                    overlay.update(&ctx, light_on(overlay.location()), delta)
                }
                MapEntity::Items(stack) => {
                    stack.update_items(&ctx, light_on(stack.location()), delta)
                }
                MapEntity::Avatar(avatar) => {
                    avatar.update(&ctx, world.light_at(avatar.location()), delta)
                }
                MapEntity::Effect(effect) => {
                    effect.update(&ctx, world.light_at(effect.location()), delta)
                }
                MapEntity::QuestMarker(marker) => {
                    marker.update(&ctx, world.light_at(marker.location()), delta)
                }
            };
            report(result, "updating entity");
        }

        let fog = if self.settings.fog {
            world.fog().clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.fog = approach_f32(self.fog, fog, FOG_CHANGE_FACTOR, delta);
        let grayscale = if world.is_player_dead() { 1.0 } else { 0.0 };
        self.grayscale = approach_f32(self.grayscale, grayscale, GRAYSCALE_CHANGE_FACTOR, delta);
    }

    /// Draws the scene back to front.
    pub fn render(&self) -> RenderBatch {
        let ctx = FrameContext {
            camera: &self.camera,
            corridor: &self.corridor,
        };
        let mut batch = RenderBatch::default();
        for id in self.graph.iter() {
            let Some(entity) = self.entities.get(&id) else {
                trace!(?id, "listed entity without state");
                continue;
            };
            if let Err(err) = entity.renderable().render(&ctx, &mut batch) {
                warn!(?id, kind = entity.kind(), %err, "entity not rendered");
            }
        }
        batch
    }

    pub fn camera_uniform(&self) -> CameraUniform {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&self.camera);
        uniform.set_post_effects(self.fog, self.grayscale);
        uniform
    }

    fn clear_hover(&mut self) {
        let Some(id) = self.hovered.take() else {
            return;
        };
        if let Some(entity) = self.entities.get_mut(&id) {
            report(entity.clear_highlight(), "clearing highlight");
        }
    }

    /// Offers a pointer event in screen pixels to the entities, front to back.
    /// Returns whether one of them took it.
    pub fn handle_event(
        &mut self,
        event: MapEvent,
        delta: u32,
        handler: &mut dyn InteractionHandler,
    ) -> bool {
        let (x, y) = event.position();
        let (x, y) = self.camera.screen_to_display(x, y);
        let event = event.with_position(x, y);
        let pointing = matches!(event, MapEvent::PointAt { .. });
        if pointing {
            self.clear_hover();
        }

        let front_to_back: Vec<EntityId> = self.graph.iter().rev().collect();
        let mut ctx = InputContext { handler };
        for id in front_to_back {
            let Some(entity) = self
                .entities
                .get_mut(&id)
                .and_then(MapEntity::interactive_mut)
            else {
                continue;
            };
            if entity.is_event_processed(&mut ctx, delta, &event) {
                trace!(?id, ?event, "event processed");
                if pointing {
                    self.hovered = Some(id);
                }
                return true;
            }
        }
        false
    }
}

fn report_animation(result: Result<(), crate::animation::AnimationError>) {
    if let Err(err) = result {
        warn!(%err, "animation target not changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::players::{AvatarClothManager, CharacterId};
    use crate::scene::template::{
        Anchor, AvatarTemplate, EffectTemplate, ItemTemplate, TemplateStore, TileTemplate,
    };

    struct FlatWorld {
        light: Color,
        fog: f32,
        hit_points: u32,
    }

    impl WorldView for FlatWorld {
        fn player_location(&self) -> Option<MapLocation> {
            None
        }

        fn light_at(&self, _location: MapLocation) -> Color {
            self.light
        }

        fn is_obstructed(&self, _location: MapLocation) -> bool {
            false
        }

        fn fog(&self) -> f32 {
            self.fog
        }

        fn player_hit_points(&self) -> u32 {
            self.hit_points
        }
    }

    fn world() -> FlatWorld {
        FlatWorld {
            light: Color::WHITE,
            fog: 0.0,
            hit_points: 100,
        }
    }

    fn templates() -> Arc<TemplateStore> {
        let mut store = TemplateStore::new(2048, 2048);
        let grass = store
            .create_sprite("grass", 76, 37, Anchor::Center, 1)
            .unwrap();
        store.add_tile(TileTemplate {
            id: 1,
            sprite: grass,
            animation_speed: 0,
            default_color: None,
        });
        let water = store
            .create_sprite("water", 76, 37, Anchor::Center, 4)
            .unwrap();
        store.add_tile(TileTemplate {
            id: 2,
            sprite: water,
            animation_speed: 400,
            default_color: None,
        });
        let barrel = store
            .create_sprite("barrel", 30, 40, Anchor::Bottom, 1)
            .unwrap();
        store.add_item(ItemTemplate {
            id: 10,
            name: "barrel".to_owned(),
            sprite: barrel,
            level: 12,
            paperdoll_id: None,
            paperdoll_color: None,
            default_color: None,
        });
        let body = store
            .create_sprite("human", 40, 80, Anchor::Bottom, 8)
            .unwrap();
        store.add_avatar(AvatarTemplate {
            appearance: 1,
            direction: Direction::South,
            sprite: body,
            still_frame: 0,
            default_color: None,
            clothes: Arc::new(AvatarClothManager::new()),
            name_offset: 90,
        });
        let sparks = store
            .create_sprite("sparks", 40, 40, Anchor::Bottom, 4)
            .unwrap();
        store.add_effect(EffectTemplate {
            id: 5,
            sprite: sparks,
            frame_duration: 50,
        });
        Arc::new(store)
    }

    fn manager() -> MapDisplayManager {
        MapDisplayManager::new(DisplaySettings::default(), templates())
    }

    #[test]
    fn settings_convert() {
        let settings = DisplaySettings::from(&GraphicsSettings {
            show_names: true,
            ..Default::default()
        });
        assert!(settings.show_names);
        assert_eq!(settings.viewport_width, 800);
        assert_eq!(settings.name_color, Color::WHITE);
    }

    #[test]
    fn tiles_replace_each_other() {
        let mut display = manager();
        let location = MapLocation::new(3, 4, 0);
        assert!(display.set_tile(location, TileId(1)));
        let first = display.tile_at(location).unwrap().id();
        assert!(display.set_tile(location, TileId(1)));
        assert_ne!(display.tile_at(location).unwrap().id(), first);
        assert_eq!(display.display_list().len(), 1);

        assert!(!display.set_tile(location, TileId(99)));
        assert!(display.tile_at(location).is_none());
        assert!(display.display_list().is_empty());
    }

    #[test]
    fn animated_tiles_share_one_animation() {
        let mut display = manager();
        let a = MapLocation::new(1, 1, 0);
        let b = MapLocation::new(2, 1, 0);
        display.set_tile(a, TileId(2));
        display.set_tile(b, TileId(2));
        display.set_tile(MapLocation::new(3, 1, 0), TileId(1));
        assert_eq!(display.tile_animations.len(), 1);

        let world = world();
        display.update(0, &world);
        display.update(150, &world);
        assert_eq!(display.tile_at(a).unwrap().core().frame(), 1);
        assert_eq!(display.tile_at(b).unwrap().core().frame(), 1);

        // the animation keeps looping
        display.update(300, &world);
        assert_eq!(display.tile_at(a).unwrap().core().frame(), 0);
    }

    #[test]
    fn stacks_vanish_when_emptied() {
        let mut display = manager();
        let location = MapLocation::new(5, 5, 0);
        assert_eq!(display.push_item(location, 10, 1), Some(0));
        assert_eq!(display.push_item(location, 10, 3), Some(1));
        assert_eq!(display.push_item(location, 77, 1), None);
        assert_eq!(display.stack_at(location).unwrap().elevation(1), Some(12));
        assert_eq!(display.display_list().len(), 1);

        assert_eq!(display.remove_item(location, 0), Some(10));
        assert_eq!(display.stack_at(location).unwrap().elevation(0), Some(0));
        assert_eq!(display.remove_item(location, 0), Some(10));
        assert!(display.stack_at(location).is_none());
        assert!(display.display_list().is_empty());
        assert_eq!(display.entity_count(), 0);
    }

    #[test]
    fn effects_are_removed_after_playing() {
        let mut display = manager();
        let world = world();
        let id = display.show_effect(MapLocation::new(1, 1, 0), 5).unwrap();
        assert!(display.display_list().contains(id));
        assert_eq!(display.effect_count(), 1);

        display.update(100, &world);
        assert!(display.entity(id).is_some());
        display.update(150, &world);
        assert!(display.entity(id).is_none());
        assert!(!display.display_list().contains(id));
        assert_eq!(display.effect_count(), 0);
        assert!(display.show_effect(MapLocation::default(), 6).is_none());
    }

    #[test]
    fn walking_ends_on_target() {
        let mut display = manager();
        let world = world();
        let character = CharacterId(3);
        let start = MapLocation::new(10, 10, 0);
        let target = MapLocation::new(10, 11, 0);
        assert!(display.add_avatar(character, 1, Direction::South, start));
        assert!(display.move_avatar(character, target, 400));

        display.update(200, &world);
        let halfway = display.avatar(character).unwrap().core().coordinate().unwrap();
        let (from, to) = (Avatar::coordinate_of(start), Avatar::coordinate_of(target));
        assert_eq!(halfway.y, (from.y + to.y) / 2);

        display.update(250, &world);
        let avatar = display.avatar(character).unwrap();
        assert_eq!(avatar.core().coordinate(), Some(to));
        assert_eq!(avatar.location(), target);
        assert_eq!(avatar.core().frame(), avatar.still_frame());
        assert_eq!(display.display_list().layer_of(avatar.id()), Some(to.layer));
    }

    #[test]
    fn removed_avatars_reject_changes() {
        let mut display = manager();
        let character = CharacterId(8);
        display.add_avatar(character, 1, Direction::South, MapLocation::new(1, 1, 0));
        assert!(display.set_attack_marker(character, AttackState::Attacking));
        assert!(display.remove_avatar(character));
        assert!(!display.set_attack_marker(character, AttackState::None));
        assert!(!display.move_avatar(character, MapLocation::new(2, 2, 0), 100));
        assert!(display.display_list().is_empty());
        assert!(!display.add_avatar(CharacterId(9), 42, Direction::South, MapLocation::default()));
    }

    #[test]
    fn fog_and_death_tint_the_camera() {
        let mut display = manager();
        let mut world = world();
        world.fog = 0.8;
        world.hit_points = 0;
        for _ in 0..200 {
            display.update(16, &world);
        }
        assert!(display.fog() > 0.7);
        assert!(display.grayscale() > 0.9);
        let uniform = display.camera_uniform();
        assert_eq!(uniform.tint[3], display.fog());
        assert_eq!(uniform.grayscale, display.grayscale());
    }

    #[test]
    fn quest_markers_toggle() {
        let mut display = manager();
        let location = MapLocation::new(2, 2, 0);
        assert!(!display.set_quest_marker(location, Some(QuestMarkerKind::Available)));
        assert!(display.set_quest_marker(location, None));
        assert!(display.quest_marker_at(location).is_none());
    }
}
