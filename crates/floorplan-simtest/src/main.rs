//! Floorplan Headless Simulation Harness
//!
//! Validates floor-plan generation, perception, persistence and the episode
//! loop without any rendering. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p floorplan-simtest
//!   cargo run -p floorplan-simtest -- --verbose
//!   RUST_LOG=debug cargo run -p floorplan-simtest

use std::io::Cursor;

use floorplan_core::config::{validate_config as validate_driver_config, validate_engine_config};
use floorplan_core::persistence::{
    load_checkpoint, save_checkpoint, scene_from_json, scene_to_json, RunCheckpoint,
};
use floorplan_core::prelude::*;
use floorplan_logic::config::{validate_config, LayoutConfig};
use floorplan_logic::geometry::Rect;
use floorplan_logic::layout::generate_seeded;
use floorplan_logic::perception::{project_segments, SceneSnapshot, RAY_COUNT};
use floorplan_logic::scene::Scene;
use floorplan_logic::validation::{errors_only, validate_scene};

const SEEDS: u64 = 20;
const EPISODES: u32 = 3;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    env_logger::init();
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Floorplan Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Default configuration
    results.extend(validate_configuration(verbose));

    // 2. Generation sweep
    let scenes = generate_scenes(&mut results, verbose);

    // 3. Scene invariants
    results.extend(validate_layouts(&scenes, verbose));

    // 4. Perception
    results.extend(validate_perception(&scenes, verbose));

    // 5. Persistence
    results.extend(validate_persistence(&scenes, verbose));

    // 6. Episodes
    results.extend(validate_episodes(&scenes, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn validate_configuration(_verbose: bool) -> Vec<TestResult> {
    println!("--- Configuration ---");
    let layout = validate_config(&LayoutConfig::default());
    let driver = validate_driver_config(&DriverConfig::default());
    let engine = validate_engine_config(&EngineConfig::default());

    vec![
        TestResult {
            name: "layout_defaults_valid".into(),
            passed: layout.is_empty(),
            detail: format!("{:?}", layout),
        },
        TestResult {
            name: "driver_defaults_valid".into(),
            passed: driver.is_empty(),
            detail: format!("{:?}", driver),
        },
        TestResult {
            name: "engine_defaults_valid".into(),
            passed: engine.is_empty(),
            detail: format!("{:?}", engine),
        },
    ]
}

// ── 2. Generation ───────────────────────────────────────────────────────

fn generate_scenes(results: &mut Vec<TestResult>, verbose: bool) -> Vec<(u64, Scene)> {
    println!("--- Generation ---");
    let config = LayoutConfig::default();
    let mut scenes = Vec::new();
    let mut failures = Vec::new();

    for seed in 0..SEEDS {
        let seeded = LayoutConfig {
            seed: Some(seed),
            ..config.clone()
        };
        match generate_seeded(&seeded) {
            Ok(scene) => {
                if verbose {
                    println!(
                        "  seed {:>2}: {} rooms, {} objects, env {}x{}",
                        seed,
                        scene.rooms.len(),
                        scene.objects.len(),
                        scene.env_width,
                        scene.env_height
                    );
                }
                scenes.push((seed, scene));
            }
            Err(e) => failures.push(format!("seed {}: {}", seed, e)),
        }
    }

    results.push(TestResult {
        name: "generation_sweep".into(),
        passed: failures.is_empty(),
        detail: if failures.is_empty() {
            format!("{} scenes generated", scenes.len())
        } else {
            failures.join("; ")
        },
    });

    let wrong_rooms: Vec<u64> = scenes
        .iter()
        .filter(|(_, s)| s.rooms.len() != config.room_count() as usize)
        .map(|(seed, _)| *seed)
        .collect();
    results.push(TestResult {
        name: "generation_room_count".into(),
        passed: wrong_rooms.is_empty(),
        detail: format!("seeds with wrong room count: {:?}", wrong_rooms),
    });

    scenes
}

// ── 3. Layout invariants ────────────────────────────────────────────────

fn validate_layouts(scenes: &[(u64, Scene)], verbose: bool) -> Vec<TestResult> {
    println!("--- Layout Invariants ---");
    let config = LayoutConfig::default();
    let mut errors = 0;
    let mut warnings = 0;
    let mut first = None;

    for (seed, scene) in scenes {
        let found = validate_scene(scene, &config);
        warnings += found.len();
        let hard = errors_only(found);
        warnings -= hard.len();
        errors += hard.len();
        if first.is_none() {
            if let Some(e) = hard.first() {
                first = Some(format!("seed {}: [{}] {}", seed, e.category, e.message));
            }
        }
    }
    if verbose {
        println!("  {} warnings across {} scenes", warnings, scenes.len());
    }

    vec![TestResult {
        name: "layout_invariants".into(),
        passed: errors == 0,
        detail: match first {
            Some(first) => format!("{} errors, first {}", errors, first),
            None => format!("{} scenes clean, {} warnings", scenes.len(), warnings),
        },
    }]
}

// ── 4. Perception ───────────────────────────────────────────────────────

fn validate_perception(scenes: &[(u64, Scene)], _verbose: bool) -> Vec<TestResult> {
    println!("--- Perception ---");
    let mut bad = Vec::new();

    for (seed, scene) in scenes {
        for room in &scene.rooms {
            let c = room.rect.center();
            let snapshot = SceneSnapshot {
                scene,
                agent: Rect::new(c.x - 4.0, c.y - 4.0, 8.0, 8.0),
                facing: 90.0,
                objective: Rect::new(-1000.0, -1000.0, 15.0, 15.0),
            };
            let obs = project_segments(&snapshot);
            let in_range = obs
                .rays
                .iter()
                .all(|r| (0.0..=1.0).contains(&r.distance) && (0.0..=1.0).contains(&r.angle));
            if obs.len() != RAY_COUNT || !in_range || obs.sees_objective {
                bad.push(format!("seed {} room {}", seed, room.index));
            }
            if obs != project_segments(&snapshot) {
                bad.push(format!("seed {} room {} not deterministic", seed, room.index));
            }
        }
    }

    vec![TestResult {
        name: "perception_fan".into(),
        passed: bad.is_empty(),
        detail: if bad.is_empty() {
            format!("{} rays per fan, all in range", RAY_COUNT)
        } else {
            bad.join(", ")
        },
    }]
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(scenes: &[(u64, Scene)], _verbose: bool) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let config = LayoutConfig::default();
    let mut mismatched = Vec::new();

    for (seed, scene) in scenes {
        let same = scene_to_json(scene)
            .and_then(|json| {
                let raw: serde_json::Value = serde_json::from_str(&json)?;
                if raw["roomNumber"] != scene.rooms.len() {
                    return Err(SimError::MalformedScene("roomNumber mismatch".into()));
                }
                scene_from_json(&json, &config)
            })
            .map(|back| {
                back.rooms == scene.rooms && back.objects == scene.objects && back.floor == scene.floor
            });
        match same {
            Ok(true) => {}
            Ok(false) => mismatched.push(format!("seed {} differs", seed)),
            Err(e) => mismatched.push(format!("seed {}: {}", seed, e)),
        }
    }

    let checkpoint = checkpoint_round_trip();

    vec![
        TestResult {
            name: "scene_json_round_trip".into(),
            passed: mismatched.is_empty(),
            detail: if mismatched.is_empty() {
                format!("{} scenes reproduced exactly", scenes.len())
            } else {
                mismatched.join(", ")
            },
        },
        TestResult {
            name: "checkpoint_round_trip".into(),
            passed: checkpoint.is_ok(),
            detail: match checkpoint {
                Ok(()) => "checkpoint reloaded".into(),
                Err(e) => e,
            },
        },
    ]
}

fn checkpoint_round_trip() -> Result<(), String> {
    let checkpoint = RunCheckpoint::new(12, 0.4, 3, 17);
    let mut buffer = Vec::new();
    save_checkpoint(&mut buffer, &checkpoint).map_err(|e| e.to_string())?;
    let back = load_checkpoint(Cursor::new(buffer)).map_err(|e| e.to_string())?;
    if back == checkpoint {
        Ok(())
    } else {
        Err(format!("{:?} != {:?}", back, checkpoint))
    }
}

// ── 6. Episodes ─────────────────────────────────────────────────────────

fn run_training(
    scene: Scene,
    logic_driver: bool,
    seed: u64,
) -> Result<(RunSummary, Vec<EpisodeRecord>), SimError> {
    let driver = EpisodeDriver::new(
        scene,
        DriverConfig {
            logic_driver,
            seed: Some(seed),
            ..Default::default()
        },
    )?;
    let mut engine = SimulationEngine::new(
        driver,
        HeuristicPolicy::new(seed),
        RecordingMetrics::default(),
        EngineConfig {
            episodes: EPISODES,
            replay_batch: 32,
            policy_name: "simtest".into(),
        },
    )?;
    let summary = engine.run()?;
    Ok((summary, engine.metrics.records))
}

fn validate_episodes(scenes: &[(u64, Scene)], verbose: bool) -> Vec<TestResult> {
    println!("--- Episodes ---");
    let mut results = Vec::new();

    for logic_driver in [false, true] {
        let name = if logic_driver {
            "episodes_logic_driver"
        } else {
            "episodes_policy_only"
        };
        let Some((seed, scene)) = scenes.first() else {
            results.push(TestResult {
                name: name.into(),
                passed: false,
                detail: "no scene to run".into(),
            });
            continue;
        };

        match run_training(scene.clone(), logic_driver, *seed) {
            Ok((summary, records)) => {
                if verbose {
                    for r in &records {
                        println!("  {} {}", r.frames, r);
                    }
                }
                let within_budget = records.iter().all(|r| r.frames <= r.frame_budget + 1);
                results.push(TestResult {
                    name: name.into(),
                    passed: records.len() == EPISODES as usize && within_budget,
                    detail: format!(
                        "{} episodes, best score {}, epsilon {:.3}",
                        records.len(),
                        summary.best_score,
                        summary.exploration
                    ),
                });
            }
            Err(e) => results.push(TestResult {
                name: name.into(),
                passed: false,
                detail: e.to_string(),
            }),
        }
    }

    results
}
