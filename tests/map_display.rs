mod common;

use common::{StaticWorld, TestScene, grass, rocks};
use isoclient::demo::{self, DemoWorld};
use isoclient::{ClientAction, Session, Settings, WorldUpdate};
use rendering::scene::{
    Avatar, CharacterId, Direction, FADING_CORRIDOR_ALPHA, HoverTarget, MapEvent, MouseButton,
    QuestMarkerKind,
};
use rendering::{DisplaySettings, MapDisplayManager, MapLocation, Rectangle};
use std::sync::Arc;
use std::time::Duration;

const HERO: CharacterId = CharacterId(7);

fn at(x: i32, y: i32) -> MapLocation {
    MapLocation::new(x, y, 0)
}

fn show(character: CharacterId, location: MapLocation) -> WorldUpdate {
    WorldUpdate::ShowCharacter {
        character,
        appearance: demo::HUMAN,
        direction: Direction::South,
        location,
        name: None,
    }
}

/// Four tiles in a row, the last one rocky, loot and a quest giver's marker
/// next to the hero.
fn village() -> TestScene {
    let scene = TestScene::new();
    scene.send_all([
        WorldUpdate::Tile {
            location: at(4, 5),
            tile: grass(),
        },
        WorldUpdate::Tile {
            location: at(5, 5),
            tile: grass(),
        },
        WorldUpdate::Tile {
            location: at(6, 5),
            tile: grass(),
        },
        WorldUpdate::Tile {
            location: at(7, 5),
            tile: rocks(1),
        },
        WorldUpdate::Obstruction {
            location: at(7, 5),
            obstructed: true,
        },
        WorldUpdate::PushItem {
            location: at(6, 5),
            item: demo::APPLE,
            count: 1,
        },
        WorldUpdate::QuestMarker {
            location: at(6, 5),
            kind: Some(QuestMarkerKind::Available),
        },
        show(HERO, at(5, 5)),
        WorldUpdate::Player(HERO),
    ]);
    scene
}

/// Screen position of a display coordinate at zoom 1.
fn on_screen(scene: &TestScene, x: i32, y: i32) -> (i32, i32) {
    let viewport = scene.display().camera().viewport();
    (x - viewport.x, y - viewport.y)
}

#[test]
fn distant_tile_is_listed_once_and_drawn_in_view() {
    let templates = Arc::new(demo::demo_templates().unwrap());
    let mut display = MapDisplayManager::new(DisplaySettings::default(), templates);
    let location = MapLocation::new(100, 100, 5);
    assert!(display.set_tile(location, grass()));

    display.update(16, &StaticWorld::default());
    assert_eq!(display.display_list().len(), 1);
    assert_eq!(display.camera().viewport(), Rectangle::new(0, 0, 800, 600));
    assert!(display.render().is_empty());

    let world = StaticWorld {
        player: Some(location),
        ..Default::default()
    };
    display.update(16, &world);
    let batch = display.render();
    assert_eq!(batch.len(), 1);
    assert_eq!(
        Some(batch.instances[0].entity),
        display.tile_at(location).map(|tile| tile.core().id())
    );
    assert_eq!(display.display_list().len(), 1);
}

#[test]
fn village_is_drawn_back_to_front() {
    let mut scene = village();
    assert_eq!(scene.frame(16), 9);

    insta::assert_snapshot!(scene.scene_summary(), @r"
    tile (4,5,0) @499910
    tile (5,5,0) @499900
    tile (6,5,0) @499890
    tile (7,5,0) @499880
    overlay (7,5,0) @499879
    avatar (5,5,0) @-105
    items (6,5,0) @-110
    quest marker (6,5,0) @-118
    ");
}

#[test]
fn camera_follows_the_player() {
    let mut scene = village();
    scene.frame(16);

    let hero = Avatar::coordinate_of(at(5, 5));
    assert_eq!(
        scene.display().camera().viewport(),
        Rectangle::new(hero.x - 400, hero.y - 300, 800, 600)
    );
    let batch = scene.session().render();
    assert_eq!(batch.len(), 8);
    assert!(batch.labels.is_empty());
    let hero_id = scene
        .display()
        .avatar(HERO)
        .map(|avatar| avatar.core().id())
        .unwrap();
    assert_eq!(batch.instances[5].entity, hero_id);
}

#[test]
fn walking_interpolates_then_snaps() {
    let mut scene = TestScene::new();
    let walker = CharacterId(9);
    scene.send(show(walker, at(2, 2)));
    scene.frame(16);

    scene.send(WorldUpdate::Walk {
        character: walker,
        location: at(3, 2),
    });
    scene.frame(200);
    let start = Avatar::coordinate_of(at(2, 2));
    let end = Avatar::coordinate_of(at(3, 2));
    let avatar = scene.display().avatar(walker).unwrap();
    let halfway = avatar.core().coordinate().unwrap();
    assert!(start.x < halfway.x && halfway.x < end.x);
    assert!(start.y < halfway.y && halfway.y < end.y);
    assert_eq!(avatar.direction(), Direction::East);
    assert_eq!(avatar.location(), at(3, 2));

    scene.frame(250);
    let arrived = scene
        .display()
        .avatar(walker)
        .and_then(|avatar| avatar.core().coordinate())
        .unwrap();
    assert_eq!((arrived.x, arrived.y), (end.x, end.y));
}

#[test]
fn characters_in_front_of_the_player_fade() {
    let mut scene = village();
    let front = CharacterId(8);
    let behind = CharacterId(9);
    scene.send_all([show(front, at(6, 6)), show(behind, at(4, 4))]);
    scene.advance(1600, 16);

    let display = scene.display();
    let front = display.avatar(front).unwrap();
    assert!(front.core().in_corridor());
    assert_eq!(front.core().alpha(), FADING_CORRIDOR_ALPHA);
    let behind = display.avatar(behind).unwrap();
    assert!(!behind.core().in_corridor());
    assert_eq!(behind.core().alpha(), 255);
    assert_eq!(display.avatar(HERO).unwrap().core().alpha(), 255);
}

#[test]
fn stacks_follow_item_updates() {
    let mut scene = village();
    let loot = at(6, 5);
    scene.send_all([
        WorldUpdate::PushItem {
            location: loot,
            item: demo::SWORD,
            count: 1,
        },
        WorldUpdate::InsertItem {
            location: loot,
            index: 0,
            item: demo::TUNIC,
            count: 1,
        },
    ]);
    scene.frame(16);
    let stack = scene.display().stack_at(loot).unwrap();
    assert_eq!(stack.len(), 3);
    assert_eq!(stack.top_item(), Some(demo::SWORD));

    scene.send(WorldUpdate::RemoveItem {
        location: loot,
        index: 2,
    });
    scene.frame(16);
    assert_eq!(scene.display().stack_at(loot).unwrap().top_item(), Some(demo::APPLE));

    scene.send(WorldUpdate::InsertItem {
        location: at(5, 5),
        index: 3,
        item: demo::APPLE,
        count: 1,
    });
    scene.send(WorldUpdate::ClearItems(loot));
    scene.frame(16);
    assert!(scene.display().stack_at(loot).is_none());
    assert!(scene.display().stack_at(at(5, 5)).is_none());
    assert!(!scene.scene_summary().contains("items"));
}

#[test]
fn effects_vanish_after_playing() {
    let mut scene = village();
    scene.send(WorldUpdate::Effect {
        location: at(5, 5),
        effect: demo::SPARKS,
    });
    scene.frame(16);
    assert_eq!(scene.display().effect_count(), 1);
    scene.advance(600, 16);
    assert_eq!(scene.display().effect_count(), 0);
    assert!(!scene.scene_summary().contains("effect"));
}

#[test]
fn pointer_input_becomes_client_actions() {
    let mut scene = village();
    scene.frame(16);

    let hero = Avatar::coordinate_of(at(5, 5));
    let (x, y) = on_screen(&scene, hero.x, hero.y - 30);
    assert!(scene.session_mut().handle_input(MapEvent::PointAt { x, y }, 16));
    assert_eq!(scene.display().hovered(), scene.display().avatar(HERO).map(|a| a.core().id()));

    let rock = at(7, 5).display_coordinate();
    let (x, y) = on_screen(&scene, rock.x, rock.y);
    let click = MapEvent::Click {
        x,
        y,
        button: MouseButton::Left,
    };
    assert!(scene.session_mut().handle_input(click, 16));

    let grass = at(6, 5).display_coordinate();
    let (x, y) = on_screen(&scene, grass.x, grass.y + 7);
    let click = MapEvent::Click {
        x,
        y,
        button: MouseButton::Left,
    };
    assert!(scene.session_mut().handle_input(click, 16));

    assert_eq!(
        scene.session_mut().take_actions(),
        vec![
            ClientAction::Hover(HoverTarget::Character(HERO)),
            ClientAction::Walk(at(6, 5)),
        ]
    );
}

#[test]
fn death_fades_the_view_to_gray() {
    let mut scene = village();
    scene.send(WorldUpdate::HitPoints(0));
    scene.advance(3000, 16);
    assert!(scene.display().grayscale() > 0.99);

    scene.send(WorldUpdate::HitPoints(40));
    scene.advance(3000, 16);
    assert!(scene.display().grayscale() < 0.01);
}

#[test]
fn demo_feed_populates_the_session() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let templates = Arc::new(demo::demo_templates().unwrap());
    let mut session = Session::new(&Settings::default(), templates, rx);
    let feed = demo::spawn_world_feed(tx, DemoWorld::new(8, 11), 10, Duration::ZERO).unwrap();
    let sent = feed.join().unwrap();

    let applied = session.frame(16);
    assert!(applied > 64);
    assert!(applied <= sent);
    assert_eq!(session.player(), Some(demo::PLAYER));
    assert!(session.display().avatar(demo::PLAYER).is_some());
    for y in 0..8 {
        for x in 0..8 {
            assert!(session.display().tile_at(at(x, y)).is_some());
        }
    }

    session.frame(16);
    assert!(!session.is_connected());
    assert!(!session.render().is_empty());
}
