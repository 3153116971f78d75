//! Headless demo driver for `spatial_notes_core`.
//!
//! # Responsibility
//! - Run a scripted session against `MemoryScene` with real physics and storage.
//! - Keep output deterministic enough for quick local sanity checks.

use clap::Parser;
use rapier3d::prelude::*;
use spatial_notes_core::{
    default_log_level, init_logging, AssetError, AssetLoader, AssetRequest, Button, ButtonStates,
    ControllerFrame, DetectedPlane, FrameInput, MemoryScene, ModelAsset, ModelLoad, NoteId,
    NoteStore, Pending, PhysicsWorld, PlaneOrientation, Session, SessionConfig,
    SqliteKeyValueStore, TargetRay, TextEntryAction, TextEntrySurface,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

const FRAME_DT: f32 = 1.0 / 72.0;
const CATALOG: [(&str, [f32; 3]); 3] = [
    ("chair", [0.25, 0.45, 0.25]),
    ("table", [0.6, 0.38, 0.4]),
    ("lamp", [0.15, 0.8, 0.15]),
];

#[derive(Parser, Debug)]
#[command(name = "spatial_notes_cli", version, about = "Scripted headless spatial-notes session")]
struct Args {
    /// JSON file with session config overrides.
    config: Option<PathBuf>,
    /// SQLite database holding the notes (defaults to the temp dir).
    #[arg(long)]
    db: Option<PathBuf>,
    /// Directory for rolling log files (defaults to the temp dir).
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("spatial_notes_demo.db"))
    }

    fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("spatial_notes_logs"))
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SessionConfig, String> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read {}: {err}", path.display()))?;
    SessionConfig::from_json_str(&raw).map_err(|err| err.to_string())
}

/// Prints what the overlay would show instead of drawing it.
struct ConsoleEditor;

impl TextEntrySurface for ConsoleEditor {
    fn open(&mut self, note: &NoteId, initial_text: &str) {
        println!("editor open note={note} text={initial_text:?}");
    }

    fn close(&mut self) {
        println!("editor closed");
    }
}

/// Resolves catalog models on a worker thread.
struct ThreadedCatalog;

impl AssetLoader for ThreadedCatalog {
    fn load(&mut self, request: &AssetRequest) -> ModelLoad {
        let (sender, pending) = Pending::channel("model");
        let name = request.name.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            let result = CATALOG
                .iter()
                .find(|(candidate, _)| *candidate == name)
                .map(|(_, half_extents)| ModelAsset {
                    name: name.clone(),
                    half_extents: *half_extents,
                })
                .ok_or(AssetError::Unknown(name));
            let _ = sender.send(result);
        });
        pending
    }
}

fn frame_towards(target: Point<Real>, buttons: ButtonStates) -> FrameInput {
    let origin = Point::new(0.0, 1.6, 0.5);
    FrameInput::new(FRAME_DT)
        .with_viewer(origin)
        .with_controller(ControllerFrame {
            target_ray: TargetRay::new(origin, target - origin),
            buttons,
            thumbstick: [0.0, 0.0],
        })
}

fn run(args: Args) -> Result<(), String> {
    let config = load_config(args.config.as_ref())?;
    config.validate().map_err(|err| err.to_string())?;

    let conn = spatial_notes_core::db::open_db(&args.db_path()).map_err(|err| err.to_string())?;
    let store = NoteStore::new(Box::new(SqliteKeyValueStore::new(conn)), config.notes_key.clone());

    let (physics_sender, physics) = Pending::channel("physics");
    let gravity = config.gravity();
    thread::spawn(move || {
        let _ = physics_sender.send(PhysicsWorld::new(gravity));
    });

    let mut session = Session::new(
        config,
        MemoryScene::new(),
        physics,
        store,
        Box::new(ConsoleEditor),
        Box::new(ThreadedCatalog),
    );
    println!("restored notes={}", session.notes().len());

    session.on_plane_detected(DetectedPlane {
        orientation: PlaneOrientation::Horizontal,
        label: Some("floor".to_string()),
        extent: [8.0, 8.0],
        pose: Isometry::translation(0.0, 0.0, 0.0),
    });
    session.request_placement(AssetRequest::new("chair"));

    let idle = FrameInput::new(FRAME_DT);
    while session.tick(&idle).is_none() {
        thread::sleep(Duration::from_millis(1));
    }

    let drop_at = Point::new(1.0, 0.0, -2.0);
    let mut frames = 0;
    while session.stage().is_some_and(|stage| stage.transport.model().is_none()) && frames < 500 {
        session.tick(&frame_towards(drop_at, ButtonStates::default()));
        thread::sleep(Duration::from_millis(1));
        frames += 1;
    }
    for _ in 0..240 {
        session.tick(&frame_towards(drop_at, ButtonStates::default()));
    }
    let report = session.tick(&frame_towards(drop_at, ButtonStates::default().press(Button::Place)));
    println!("placed={}", report.is_some_and(|r| r.placed));

    session.tick(&frame_towards(
        Point::new(-0.5, 0.0, -1.0),
        ButtonStates::default().press(Button::Primary),
    ));
    session.on_text_entry(TextEntryAction::Save("  check lamp height  ".to_string()));

    let notes = session.notes();
    println!("notes={}", notes.len());
    for note in notes.notes() {
        println!(
            "note id={} content={:?} position=[{:.2}, {:.2}, {:.2}]",
            note.id, note.content, note.position.x, note.position.y, note.position.z
        );
    }
    if let Some(stage) = session.stage() {
        println!("placed_items={}", stage.placed.len());
        println!("bodies={} colliders={}", stage.world.body_count(), stage.world.collider_count());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = init_logging(default_log_level(), &args.log_dir().to_string_lossy()) {
        eprintln!("logging disabled: {err}");
    }
    log::info!("event=cli_start module=cli status=ok db={}", args.db_path().display());

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
