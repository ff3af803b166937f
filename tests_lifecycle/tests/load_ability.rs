//! Load Ability Tests
//!
//! Validates the entry point that turns an ability request into a record
//! and, when needed, a spawned process.

use app_spawn::{SpawnError, FIRST_SIMULATED_PID};
use core_types::{
    AbilityInfo, AbilityToken, ApplicationInfo, ApplicationState, BundleIdentity, LaunchMode,
    ProcessId,
};
use services_app_manager::AppMgrConfig;
use std::sync::Arc;
use std::thread;
use tests_lifecycle::{demo_ability, demo_app, test_bootstrap, test_bootstrap_with};

/// Test: A first request spawns the process and registers the ability
#[test]
fn test_load_spawns_process() {
    let harness = test_bootstrap();
    let (token, id) = harness.load(&demo_app(), &demo_ability("Main"));
    let id = id.expect("record created");

    assert_eq!(harness.spawner.call_count(), 1);
    let request = &harness.spawner.requests()[0];
    assert_eq!(request.proc_name, "com.example.demo");
    assert_eq!(request.so_path, AppMgrConfig::default().so_path);
    assert_eq!(request.uid, 0);

    let record = harness.service.app_running_record(id).expect("record exists");
    assert_eq!(record.pid(), Some(ProcessId::new(FIRST_SIMULATED_PID)));
    assert_eq!(record.state(), ApplicationState::Create);
    assert!(record.ability(token).is_some());

    // Spawn success is reported to observers as Create
    assert_eq!(harness.observer.app_states(id), vec![ApplicationState::Create]);

    let recent = harness.service.recent_app_list();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].record_id, id);
}

/// Test: Invalid requests leave the registry untouched
#[test]
fn test_load_rejects_invalid_requests() {
    let harness = test_bootstrap();
    let app = demo_app();
    let ability = demo_ability("Main");

    // Empty ability name
    harness
        .service
        .load_ability(Some(AbilityToken::new()), None, Some(&demo_ability("")), Some(&app));

    // Empty application name
    let mut nameless = app.clone();
    nameless.name.clear();
    harness
        .service
        .load_ability(Some(AbilityToken::new()), None, Some(&ability), Some(&nameless));

    // Empty bundle name
    let mut bundleless = app.clone();
    bundleless.bundle_name.clear();
    harness
        .service
        .load_ability(Some(AbilityToken::new()), None, Some(&ability), Some(&bundleless));

    // Ability belongs to another application
    let foreign = AbilityInfo::new("Main", "other", BundleIdentity::new("com.example.demo"));
    harness
        .service
        .load_ability(Some(AbilityToken::new()), None, Some(&foreign), Some(&app));

    // Missing pieces
    harness.service.load_ability(None, None, Some(&ability), Some(&app));
    harness
        .service
        .load_ability(Some(AbilityToken::new()), None, None, Some(&app));
    harness
        .service
        .load_ability(Some(AbilityToken::new()), None, Some(&ability), None);

    assert_eq!(harness.service.record_count(), 0);
    assert_eq!(harness.spawner.call_count(), 0);
}

/// Test: Uid out of range never reaches the spawner
#[test]
fn test_load_rejects_invalid_uid() {
    let harness = test_bootstrap();
    let app = demo_app().with_uid(-1);
    harness.load(&app, &demo_ability("Main"));

    assert_eq!(harness.service.record_count(), 0);
    assert_eq!(harness.spawner.call_count(), 0);
}

/// Test: The configured default uid applies when the app carries none
#[test]
fn test_default_uid_from_config() {
    let config = AppMgrConfig {
        default_uid: 20010001,
        ..AppMgrConfig::default()
    };
    let harness = test_bootstrap_with(config);
    harness.load(&demo_app(), &demo_ability("Main"));
    let other_app = ApplicationInfo::new("demo", "com.example.other").with_uid(7);
    let other_ability = AbilityInfo::new("Main", "demo", BundleIdentity::new("com.example.other"));
    harness.load(&other_app, &other_ability);

    let requests = harness.spawner.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].uid, 20010001);
    assert_eq!(requests[1].uid, 7);
    assert_eq!(requests[1].proc_name, "com.example.other");
}

/// Test: A second ability for a running process reuses it
#[test]
fn test_load_reuses_existing_process() {
    let harness = test_bootstrap();
    let (_, first) = harness.load(&demo_app(), &demo_ability("Main"));
    let (second_token, second) = harness.load(&demo_app(), &demo_ability("Detail"));

    assert_eq!(first, second);
    assert_eq!(harness.spawner.call_count(), 1);
    let record = harness
        .service
        .app_running_record(first.expect("record created"))
        .expect("record exists");
    assert_eq!(record.ability_count(), 2);
    assert!(record.ability(second_token).is_some());
}

/// Test: The descriptor's process name overrides the bundle name
#[test]
fn test_load_honors_process_name() {
    let harness = test_bootstrap();
    let (_, main) = harness.load(&demo_app(), &demo_ability("Main"));
    let (_, remote) = harness.load(
        &demo_app(),
        &demo_ability("Sync").with_process("com.example.demo:sync"),
    );

    assert_ne!(main, remote);
    assert_eq!(harness.spawner.call_count(), 2);
    let remote = harness
        .service
        .app_running_record(remote.expect("record created"))
        .expect("record exists");
    assert_eq!(remote.process_name(), "com.example.demo:sync");
}

/// Test: Singleton descriptor loaded twice yields one ability and one spawn
#[test]
fn test_singleton_loaded_twice() {
    let harness = test_bootstrap();
    let ability = demo_ability("Main").with_launch_mode(LaunchMode::Singleton);

    let (first_token, id) = harness.load(&demo_app(), &ability);
    let second_token = AbilityToken::new();
    harness
        .service
        .load_ability(Some(second_token), None, Some(&ability), Some(&demo_app()));

    assert_eq!(harness.spawner.call_count(), 1);
    let record = harness
        .service
        .app_running_record(id.expect("record created"))
        .expect("record exists");
    assert_eq!(record.ability_count(), 1);
    assert!(record.ability(first_token).is_some());
    assert!(record.ability(second_token).is_none());

    // Same through start_ability
    harness
        .service
        .start_ability(AbilityToken::new(), None, &ability, id);
    let record = harness
        .service
        .app_running_record(id.expect("record created"))
        .expect("record exists");
    assert_eq!(record.ability_count(), 1);
}

/// Test: A failed spawn leaves no record behind
#[test]
fn test_spawn_failure_rolls_back() {
    let harness = test_bootstrap();
    harness.spawner.push_failure(-1);

    let token = AbilityToken::new();
    harness
        .service
        .load_ability(Some(token), None, Some(&demo_ability("Main")), Some(&demo_app()));

    assert_eq!(harness.spawner.call_count(), 1);
    assert_eq!(harness.service.record_count(), 0);
    assert!(harness.service.app_running_record_by_token(token).is_none());
    assert!(harness.service.recent_app_list().is_empty());
    assert!(harness.observer.app_events().is_empty());

    // The next request starts fresh
    let (_, id) = harness.load(&demo_app(), &demo_ability("Main"));
    assert!(id.is_some());
    assert_eq!(harness.spawner.call_count(), 2);
}

/// Test: start_process reports why it did nothing
#[test]
fn test_start_process_errors() {
    let harness = test_bootstrap();
    let result = harness
        .service
        .get_or_create_app_running_record(
            Some(AbilityToken::new()),
            Some(&demo_app()),
            Some(&demo_ability("Main")),
            "com.example.demo",
            0,
        )
        .expect("record created");
    let id = result.app_record_id;

    assert!(harness
        .service
        .start_process("demo", "com.example.demo", None)
        .is_err());

    harness
        .spawner
        .push_result(Err(SpawnError::ConnectFailed("down".to_string())));
    let err = harness
        .service
        .start_process("demo", "com.example.demo", Some(id))
        .expect_err("scripted failure");
    assert_eq!(
        err,
        services_app_manager::AppMgrError::SpawnFailed(SpawnError::ConnectFailed("down".to_string()))
    );
    assert!(harness.service.app_running_record(id).is_none());

    // Record is gone now
    assert!(harness
        .service
        .start_process("demo", "com.example.demo", Some(id))
        .is_err());
}

/// Test: Without a spawner nothing is spawned and the record stays pending
#[test]
fn test_no_spawner_is_noop() {
    let harness = test_bootstrap();
    harness.service.set_spawn_client(None);

    let (token, id) = harness.load(&demo_app(), &demo_ability("Main"));
    let record = harness
        .service
        .app_running_record(id.expect("record created"))
        .expect("pending record kept");
    assert!(record.pid().is_none());
    assert!(record.ability(token).is_some());
    assert_eq!(harness.spawner.call_count(), 0);
}

/// Test: Concurrent loads for one process spawn it once
#[test]
fn test_concurrent_loads_spawn_once() {
    let harness = Arc::new(test_bootstrap());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let harness = Arc::clone(&harness);
            thread::spawn(move || {
                harness.load(&demo_app(), &demo_ability(&format!("Ability{}", i)));
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("loader thread");
    }

    assert_eq!(harness.spawner.call_count(), 1);
    assert_eq!(harness.service.record_count(), 1);
    let record = harness
        .service
        .app_running_record_by_app_name("demo")
        .expect("record exists");
    assert_eq!(record.ability_count(), 8);
}

/// Test: Loading a known token under another process changes nothing
#[test]
fn test_load_same_token_other_process_rejected() {
    let harness = test_bootstrap();
    let (token, id) = harness.load(&demo_app(), &demo_ability("Main"));
    let id = id.expect("record created");

    // No record for the second process yet
    let remote = demo_ability("Main").with_process("com.example.demo:remote");
    harness
        .service
        .load_ability(Some(token), None, Some(&remote), Some(&demo_app()));
    assert_eq!(harness.service.record_count(), 1);
    assert_eq!(harness.spawner.call_count(), 1);

    // Second process running, token still refused there
    let (_, other) = harness.load(
        &demo_app(),
        &demo_ability("Sync").with_process("com.example.demo:remote"),
    );
    let other = other.expect("second record created");
    harness
        .service
        .load_ability(Some(token), None, Some(&remote), Some(&demo_app()));
    harness
        .service
        .start_ability(token, None, &remote, Some(other));

    let owner = harness
        .service
        .app_running_record_by_token(token)
        .expect("token registered");
    assert_eq!(owner.record_id(), id);
    let other = harness
        .service
        .app_running_record(other)
        .expect("record exists");
    assert_eq!(other.ability_count(), 1);
    assert!(other.ability(token).is_none());
}
