use serde_json::json;
use shoal_app::{ControlError, KnobUpdate, Session, apply_patch, apply_updates, config_snapshot};
use shoal_core::{Arena, LifecycleMode, ShoalConfig, Tick, UpdateOrder};

fn session() -> Session {
    let mut config = ShoalConfig {
        rng_seed: Some(0x5EED),
        ..ShoalConfig::default()
    };
    config.population.initial_count = 12;
    config.food.spawn_probability = 0.5;
    Session::new(config, Arena::new(500.0, 400.0)).expect("session")
}

#[test]
fn new_session_runs_populated_world() {
    let mut session = session();
    assert!(session.is_running());
    assert_eq!(session.status().agent_count, 12);
    let events = session.frame().expect("running session ticks");
    assert_eq!(events.tick, Tick(1));
    assert_eq!(session.status().tick, 1);
}

#[test]
fn paused_frames_leave_world_untouched() {
    let mut session = session();
    session.frame();
    session.pause();
    let before = session.render_frame();
    for _ in 0..10 {
        assert!(session.frame().is_none());
    }
    assert_eq!(session.render_frame(), before);
    assert!(!session.status().running);

    session.start();
    assert!(session.frame().is_some());
    assert_eq!(session.world().tick_count(), Tick(2));
}

#[test]
fn reset_rebuilds_and_pauses() {
    let mut session = session();
    for _ in 0..30 {
        session.frame();
    }
    session.reset().expect("reset");
    let status = session.status();
    assert_eq!(status.tick, 0);
    assert_eq!(status.agent_count, 12);
    assert_eq!(status.food_count, 0);
    assert!(!status.running);
    // The seed is part of the config, so a reset replays the opening frame.
    let fresh = Session::new(session.world().config().clone(), Arena::new(500.0, 400.0))
        .expect("session");
    assert_eq!(session.render_frame(), fresh.render_frame());
}

#[test]
fn resize_validates_extent() {
    let mut session = session();
    session.resize(Arena::new(300.0, 300.0)).expect("resize");
    assert_eq!(session.render_frame().arena, Arena::new(300.0, 300.0));
    assert!(session.resize(Arena::new(20.0, 20.0)).is_err());
    assert_eq!(session.world().arena(), Arena::new(300.0, 300.0));
}

#[test]
fn patches_update_live_config() {
    let mut session = session();
    session.frame();
    let snapshot = apply_patch(
        &mut session,
        json!({
            "food": { "max_food": 4 },
            "update_order": "synchronous",
            "lifecycle": { "kind": "energy_gated", "max_population": 40 },
        }),
    )
    .expect("patch applies");
    assert_eq!(snapshot.tick, 1);
    assert_eq!(snapshot.config["food"]["max_food"], json!(4));

    let config = session.world().config();
    assert_eq!(config.food.max_food, 4);
    assert_eq!(config.update_order, UpdateOrder::Synchronous);
    assert_eq!(config.lifecycle, LifecycleMode::EnergyGated { max_population: 40 });
    assert_eq!(session.world().population_policy().name(), "energy_gated");
    assert_eq!(config_snapshot(&session).expect("snapshot"), snapshot);

    for _ in 0..20 {
        session.frame();
    }
    assert!(session.status().food_count <= 4);
}

#[test]
fn rejected_patches_leave_config_alone() {
    let mut session = session();
    let before = session.world().config().clone();

    let err = apply_patch(&mut session, json!({ "food": { "capacity": 3 } })).expect_err("unknown");
    assert!(matches!(err, ControlError::UnknownPath(_)));

    let err = apply_patch(&mut session, json!({ "food": { "max_food": 0 } })).expect_err("invalid");
    assert!(matches!(err, ControlError::Rejected(_)));

    let err = apply_patch(&mut session, json!({ "update_order": "sideways" })).expect_err("decode");
    assert!(matches!(err, ControlError::InvalidPatch(msg) if msg.contains("update_order")));

    let err = apply_patch(&mut session, json!([1, 2])).expect_err("not an object");
    assert!(matches!(err, ControlError::InvalidPatch(_)));

    assert_eq!(session.world().config(), &before);
}

#[test]
fn knob_updates_use_dotted_paths() {
    let mut session = session();
    let snapshot = apply_updates(
        &mut session,
        &[
            KnobUpdate::new("traits.separation_weight", json!(2.5)),
            KnobUpdate::new("food.spawn_probability", json!(0.25)),
        ],
    )
    .expect("updates apply");
    assert_eq!(snapshot.config["traits"]["separation_weight"], json!(2.5));
    assert_eq!(session.world().config().food.spawn_probability, 0.25);

    let before = session.world().config().clone();
    let err = apply_updates(
        &mut session,
        &[
            KnobUpdate::new("food.max_food", json!(8)),
            KnobUpdate::new("food.spawn_probability", json!("often")),
        ],
    )
    .expect_err("second knob has the wrong type");
    assert!(matches!(err, ControlError::InvalidPatch(_)));
    assert_eq!(session.world().config(), &before);
}
