use std::sync::Arc;
use std::time::{Duration, Instant};

use isoclient::demo::{self, DemoWorld};
use isoclient::{Session, Settings};
use rendering::scene::MapEvent;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEMO_MAP_SIZE: i32 = 12;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();

    let settings = Settings::load();
    let frame_time = settings.session.frame_time_ms.max(1);
    let seed = settings.session.seed.unwrap_or_else(rand::random);
    info!(seed, frames = settings.session.frames, "Starting headless client");

    let templates = Arc::new(demo::demo_templates()?);
    let (tx, rx) = crossbeam_channel::unbounded();
    let ticks = settings.session.frames * frame_time / settings.session.walk_duration_ms.max(1);
    let feed = demo::spawn_world_feed(
        tx,
        DemoWorld::new(DEMO_MAP_SIZE, seed),
        ticks,
        Duration::from_millis(settings.session.walk_duration_ms as u64),
    )?;

    let mut session = Session::new(&settings, templates, rx);
    let (width, height) = (
        settings.graphics.viewport_width as i32,
        settings.graphics.viewport_height as i32,
    );
    let started = Instant::now();
    let mut instances = 0;
    let mut labels = 0;
    for frame in 0..settings.session.frames {
        let frame_start = Instant::now();
        session.frame(frame_time);
        let batch = session.render();
        instances += batch.instances.len();
        labels += batch.labels.len();

        // Sweep the pointer across the screen to exercise hover handling.
        let x = (frame as i32 * 7) % width.max(1);
        session.handle_input(MapEvent::PointAt { x, y: height / 2 }, frame_time);

        let budget = Duration::from_millis(frame_time as u64);
        if let Some(rest) = budget.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    let actions = session.take_actions();
    let applied = session.applied_updates();
    drop(session);
    match feed.join() {
        Ok(sent) => info!(sent, "World feed finished"),
        Err(_) => warn!("World feed thread panicked"),
    }

    let frames = settings.session.frames.max(1) as usize;
    info!(
        frames,
        elapsed_ms = started.elapsed().as_millis() as u64,
        avg_instances = instances / frames,
        avg_labels = labels / frames,
        applied,
        actions = actions.len(),
        "Headless run complete"
    );
    Ok(())
}
