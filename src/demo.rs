//! Built-in content for running the client without a server: a small set of
//! templates and a simulated server thread that populates a map and keeps its
//! characters moving.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel::Sender;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rendering::scene::{
    Anchor, AttackState, AvatarClothGroup, AvatarClothManager, AvatarTemplate, CharacterId,
    ClothTemplate, Direction, EffectTemplate, ItemTemplate, MarkerKind, MarkerTemplate,
    OverlayTemplate, QuestMarkerKind, TILE_HEIGHT, TILE_WIDTH, TemplateStore, TileId,
    TileTemplate,
};
use rendering::{Color, MapLocation};
use tracing::{debug, info};

use crate::events::WorldUpdate;

pub const GRASS: u32 = 1;
pub const WATER: u32 = 2;
pub const ROCKS: u32 = 1;

pub const APPLE: u32 = 10;
pub const SWORD: u32 = 20;
pub const TUNIC: u32 = 30;
pub const BOOTS: u32 = 40;

pub const HUMAN: u32 = 1;
pub const SPARKS: u32 = 1;

const HAIR_CLOTH: u32 = 2;
const SWORD_CLOTH: u32 = 5;
const TUNIC_CLOTH: u32 = 11;
const BOOTS_CLOTH: u32 = 3;

pub const PLAYER: CharacterId = CharacterId(1);
const VILLAGERS: [(u32, &str); 3] = [(2, "Mira"), (3, "Oswin"), (4, "Tamsin")];

/// Templates for everything the simulated server sends.
pub fn demo_templates() -> anyhow::Result<TemplateStore> {
    let mut store = TemplateStore::new(2048, 2048);

    let grass = store.create_sprite("grass", TILE_WIDTH, TILE_HEIGHT, Anchor::Center, 1)?;
    store.add_tile(TileTemplate {
        id: GRASS,
        sprite: grass,
        animation_speed: 0,
        default_color: None,
    });
    let water = store.create_sprite("water", TILE_WIDTH, TILE_HEIGHT, Anchor::Center, 4)?;
    store.add_tile(TileTemplate {
        id: WATER,
        sprite: water,
        animation_speed: 800,
        default_color: Some(Color::new(0.8, 0.9, 1.0, 1.0)),
    });
    let rocks = store.create_sprite("rocks", TILE_WIDTH, 60, Anchor::Bottom, 2)?;
    store.add_overlay(OverlayTemplate {
        id: ROCKS,
        sprite: rocks,
    });

    let mut clothes = AvatarClothManager::new();
    for (id, group, name, frames) in [
        (HAIR_CLOTH, AvatarClothGroup::Hair, "hair", 8),
        (SWORD_CLOTH, AvatarClothGroup::FirstHand, "sword worn", 8),
        (TUNIC_CLOTH, AvatarClothGroup::Chest, "tunic worn", 8),
        (BOOTS_CLOTH, AvatarClothGroup::Shoes, "boots", 4),
    ] {
        let sprite = store.create_sprite(name, 40, 80, Anchor::Bottom, frames)?;
        clothes.add_cloth(Arc::new(ClothTemplate { id, group, sprite }));
    }
    let clothes = Arc::new(clothes);
    for direction in Direction::ALL {
        let sprite = store
            .create_sprite("human", 40, 80, Anchor::Bottom, 8)
            .with_context(|| format!("human facing {direction:?}"))?;
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

    for (id, name, level, paperdoll_id) in [
        (APPLE, "apple", 1, None),
        (SWORD, "sword", 2, Some(SWORD_CLOTH)),
        (TUNIC, "tunic", 1, Some(TUNIC_CLOTH)),
        (BOOTS, "boots", 1, Some(BOOTS_CLOTH)),
    ] {
        let sprite = store.create_sprite(name, 24, 24, Anchor::Bottom, 1)?;
        store.add_item(ItemTemplate {
            id,
            name: name.to_owned(),
            sprite,
            level,
            paperdoll_id,
            paperdoll_color: None,
            default_color: None,
        });
    }

    let sparks = store.create_sprite("sparks", 48, 48, Anchor::Bottom, 6)?;
    store.add_effect(EffectTemplate {
        id: SPARKS,
        sprite: sparks,
        frame_duration: 80,
    });

    let ring = store.create_sprite("attack ring", 50, 20, Anchor::Center, 1)?;
    store.add_marker(MarkerTemplate {
        kind: MarkerKind::Attack,
        sprite: ring,
    });
    for kind in [
        QuestMarkerKind::Available,
        QuestMarkerKind::InProgress,
        QuestMarkerKind::Finished,
    ] {
        let sprite = store.create_sprite("quest marker", 16, 32, Anchor::Bottom, 1)?;
        store.add_marker(MarkerTemplate {
            kind: MarkerKind::Quest(kind),
            sprite,
        });
    }

    Ok(store)
}

/// A square map with a pond, a few rocks, some loot and wandering villagers.
pub struct DemoWorld {
    size: i32,
    rng: StdRng,
    obstacles: HashSet<MapLocation>,
    characters: Vec<(CharacterId, MapLocation)>,
    attacked: Option<CharacterId>,
    ticks: u32,
}

impl DemoWorld {
    pub fn new(size: i32, seed: u64) -> Self {
        Self {
            size: size.max(4),
            rng: StdRng::seed_from_u64(seed),
            obstacles: HashSet::new(),
            characters: Vec::new(),
            attacked: None,
            ticks: 0,
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    fn center(&self) -> MapLocation {
        MapLocation::new(self.size / 2, self.size / 2, 0)
    }

    fn contains(&self, location: MapLocation) -> bool {
        (0..self.size).contains(&location.x) && (0..self.size).contains(&location.y)
    }

    fn is_free(&self, location: MapLocation) -> bool {
        self.contains(location)
            && !self.obstacles.contains(&location)
            && self.characters.iter().all(|(_, at)| *at != location)
    }

    fn random_location(&mut self) -> MapLocation {
        MapLocation::new(
            self.rng.random_range(0..self.size),
            self.rng.random_range(0..self.size),
            0,
        )
    }

    /// Everything a client needs when entering the map.
    pub fn enter(&mut self) -> Vec<WorldUpdate> {
        let mut updates = vec![
            WorldUpdate::ClearMap,
            WorldUpdate::AmbientLight(Color::new(0.7, 0.7, 0.8, 1.0)),
        ];
        let center = self.center();
        let pond = MapLocation::new(1, 1, 0);
        for y in 0..self.size {
            for x in 0..self.size {
                let location = MapLocation::new(x, y, 0);
                let in_pond =
                    (pond.x..pond.x + 2).contains(&x) && (pond.y..pond.y + 2).contains(&y);
                let rocky = !in_pond && location != center && self.rng.random_bool(0.08);
                let tile = match (in_pond, rocky) {
                    (true, _) => TileId::compose(WATER, 0, 0),
                    (false, true) => TileId::compose(GRASS, ROCKS, self.rng.random_range(1..=2)),
                    (false, false) => TileId::compose(GRASS, 0, 0),
                };
                updates.push(WorldUpdate::Tile { location, tile });
                if in_pond || rocky {
                    self.obstacles.insert(location);
                    updates.push(WorldUpdate::Obstruction {
                        location,
                        obstructed: true,
                    });
                }
            }
        }
        for location in [center, center.offset(1, 0), center.offset(0, 1)] {
            updates.push(WorldUpdate::Light {
                location,
                color: Color::new(1.0, 0.9, 0.7, 1.0),
            });
        }

        for (item, count) in [(APPLE, 3), (SWORD, 1), (TUNIC, 1)] {
            let location = self.random_location();
            if self.obstacles.contains(&location) {
                continue;
            }
            for _ in 0..count {
                updates.push(WorldUpdate::PushItem {
                    location,
                    item,
                    count: 1,
                });
            }
        }

        self.characters.push((PLAYER, center));
        updates.extend(character_updates(PLAYER, Some("You"), center));
        updates.push(WorldUpdate::Player(PLAYER));
        for (id, name) in VILLAGERS {
            let mut spot = None;
            for _ in 0..16 {
                let location = self.random_location();
                if self.is_free(location) {
                    spot = Some(location);
                    break;
                }
            }
            let Some(location) = spot else {
                continue;
            };
            let character = CharacterId(id);
            self.characters.push((character, location));
            updates.extend(character_updates(character, Some(name), location));
        }
        if let Some((_, location)) = self.characters.get(1) {
            updates.push(WorldUpdate::QuestMarker {
                location: *location,
                kind: Some(QuestMarkerKind::Available),
            });
        }
        updates
    }

    /// Changes during one server tick.
    pub fn tick(&mut self) -> Vec<WorldUpdate> {
        self.ticks += 1;
        let mut updates = Vec::new();

        if !self.characters.is_empty() {
            let index = self.rng.random_range(0..self.characters.len());
            let direction = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
            let (character, from) = self.characters[index];
            let (dx, dy) = direction.delta();
            let to = from.offset(dx, dy);
            if self.is_free(to) {
                self.characters[index].1 = to;
                updates.push(WorldUpdate::Walk {
                    character,
                    location: to,
                });
            } else {
                updates.push(WorldUpdate::Turn {
                    character,
                    direction,
                });
            }
        }

        if self.ticks % 5 == 0 {
            let location = self.random_location();
            updates.push(WorldUpdate::Effect {
                location,
                effect: SPARKS,
            });
        }

        if self.ticks % 7 == 0 {
            let villagers: Vec<CharacterId> = self
                .characters
                .iter()
                .map(|(id, _)| *id)
                .filter(|id| *id != PLAYER)
                .collect();
            if let Some(previous) = self.attacked.take() {
                updates.push(WorldUpdate::Attack {
                    character: previous,
                    state: AttackState::None,
                });
            } else if !villagers.is_empty() {
                let target = villagers[self.rng.random_range(0..villagers.len())];
                self.attacked = Some(target);
                updates.push(WorldUpdate::Attack {
                    character: target,
                    state: AttackState::Attacking,
                });
                updates.push(WorldUpdate::Animate {
                    character: PLAYER,
                    duration: 600,
                });
            }
        }

        if self.ticks % 13 == 0 {
            let fog = self.rng.random_range(0.0..0.5);
            updates.push(WorldUpdate::Fog(fog));
        }
        updates
    }
}

fn character_updates(
    character: CharacterId,
    name: Option<&str>,
    location: MapLocation,
) -> Vec<WorldUpdate> {
    let mut updates = vec![WorldUpdate::ShowCharacter {
        character,
        appearance: HUMAN,
        direction: Direction::South,
        location,
        name: name.map(str::to_owned),
    }];
    for (group, item) in [
        (AvatarClothGroup::Hair, HAIR_CLOTH),
        (AvatarClothGroup::Shoes, BOOTS),
        (AvatarClothGroup::Chest, TUNIC),
    ] {
        updates.push(WorldUpdate::Cloth {
            character,
            group,
            item: Some(item),
        });
    }
    if character == PLAYER {
        updates.push(WorldUpdate::Cloth {
            character,
            group: AvatarClothGroup::FirstHand,
            item: Some(SWORD),
        });
    }
    updates
}

/// Runs a [`DemoWorld`] on its own thread, sending one batch of updates per
/// tick. The thread ends after `ticks` ticks or when the receiver is gone and
/// returns the number of updates sent.
pub fn spawn_world_feed(
    tx: Sender<WorldUpdate>,
    mut world: DemoWorld,
    ticks: u32,
    interval: Duration,
) -> anyhow::Result<JoinHandle<usize>> {
    thread::Builder::new()
        .name("world-feed".into())
        .spawn(move || {
            let mut sent = 0;
            for update in world.enter() {
                if tx.send(update).is_err() {
                    return sent;
                }
                sent += 1;
            }
            info!(size = world.size(), "Demo map sent");
            while world.ticks() < ticks {
                thread::sleep(interval);
                for update in world.tick() {
                    if tx.send(update).is_err() {
                        debug!("Client gone, stopping world feed");
                        return sent;
                    }
                    sent += 1;
                }
            }
            sent
        })
        .context("failed to spawn world feed thread")
}
