//! End-to-end tests for the build scheduler
//!
//! Drives real builds against temp directory projects: skip/invoke/stamp
//! semantics, dependency ordering, contract enforcement, and describe.

use cinder_build::{
    BuildError, BuildMode, BuildSystem, Environment, Source, Target, TargetPlatform,
};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn scratch_env(temp: &TempDir) -> Environment {
    Environment::new(temp.path())
        .with_cache_dir(temp.path().join("cache"))
        .with_target_platform(TargetPlatform::AndroidArm64)
        .with_build_mode(BuildMode::Debug)
}

/// Target that reads `{PROJECT_DIR}/main.src`, writes
/// `{BUILD_DIR}/out/app.txt`, and counts its invocations
fn counting_app_target(calls: &Arc<AtomicUsize>) -> Target {
    let calls = calls.clone();
    Target::new("app")
        .with_inputs(vec![Source::pattern("{PROJECT_DIR}/main.src")])
        .with_outputs(vec![Source::pattern("{BUILD_DIR}/out/app.txt")])
        .with_invocation(move |_inputs, env| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let out = env.build_dir().join("out/app.txt");
                fs::create_dir_all(out.parent().unwrap())?;
                fs::write(out, "compiled")?;
                Ok(())
            }
        })
}

/// Phony target that appends its name to a shared log when invoked
fn recording_target(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Target {
    let log = log.clone();
    Target::new(name)
        .with_phony(true)
        .with_invocation(move |_inputs, _env| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(name.to_string());
                Ok(())
            }
        })
}

#[tokio::test]
async fn test_build_then_skip_then_rebuild_on_touch() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp);
    fs::write(temp.path().join("main.src"), "v1").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let mut build_system = BuildSystem::new();
    build_system.add_target(counting_app_target(&calls));

    // First build: invocation runs and the stamp is recorded
    let report = build_system.build("app", &env).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.invoked, vec!["app".to_string()]);
    assert!(temp
        .path()
        .join("build/app.debug.android_arm64")
        .exists());

    // Second build with nothing changed: zero invocations
    let report = build_system.build("app", &env).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.skipped, vec!["app".to_string()]);
    assert!(report.invoked.is_empty());

    // Touch the input: invocation runs again and the stamp is rewritten
    thread::sleep(Duration::from_millis(15));
    fs::write(temp.path().join("main.src"), "v2").unwrap();
    let report = build_system.build("app", &env).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(report.invoked, vec!["app".to_string()]);
}

#[tokio::test]
async fn test_deleted_output_forces_reinvocation() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp);
    fs::write(temp.path().join("main.src"), "v1").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let mut build_system = BuildSystem::new();
    build_system.add_target(counting_app_target(&calls));

    build_system.build("app", &env).await.unwrap();
    fs::remove_file(temp.path().join("build/out/app.txt")).unwrap();

    build_system.build("app", &env).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_externally_modified_output_forces_reinvocation() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp);
    fs::write(temp.path().join("main.src"), "v1").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let mut build_system = BuildSystem::new();
    build_system.add_target(counting_app_target(&calls));

    build_system.build("app", &env).await.unwrap();

    thread::sleep(Duration::from_millis(15));
    fs::write(temp.path().join("build/out/app.txt"), "tampered").unwrap();

    build_system.build("app", &env).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_diamond_runs_in_dependency_order_exactly_once() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp);

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut build_system = BuildSystem::new();
    build_system.add_target(
        recording_target("a", &log)
            .with_dependencies(vec!["b".to_string(), "c".to_string()]),
    );
    build_system.add_target(recording_target("b", &log).with_dependencies(vec!["d".to_string()]));
    build_system.add_target(recording_target("c", &log).with_dependencies(vec!["d".to_string()]));
    build_system.add_target(recording_target("d", &log));

    build_system.build("a", &env).await.unwrap();

    let ran = log.lock().unwrap().clone();
    assert_eq!(ran.len(), 4);
    assert_eq!(ran[0], "d");
    assert_eq!(ran[3], "a");
    assert!(ran[1..3].contains(&"b".to_string()));
    assert!(ran[1..3].contains(&"c".to_string()));
}

#[tokio::test]
async fn test_missing_output_fails_naming_target_and_path() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp);
    fs::write(temp.path().join("main.src"), "v1").unwrap();

    let mut build_system = BuildSystem::new();
    build_system.add_target(
        Target::new("broken")
            .with_inputs(vec![Source::pattern("{PROJECT_DIR}/main.src")])
            .with_outputs(vec![Source::pattern("{BUILD_DIR}/never-written.txt")]),
    );

    match build_system.build("broken", &env).await {
        Err(BuildError::MissingOutput { target, path }) => {
            assert_eq!(target, "broken");
            assert_eq!(path, temp.path().join("build/never-written.txt"));
        }
        other => panic!("Expected MissingOutput, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_target_name() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp);

    let build_system = BuildSystem::new();
    match build_system.build("nope", &env).await {
        Err(BuildError::TargetNotFound { target }) => assert_eq!(target, "nope"),
        other => panic!("Expected TargetNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cyclic_dependency_fails_before_any_invocation() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp);

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut build_system = BuildSystem::new();
    build_system.add_target(recording_target("a", &log).with_dependencies(vec!["b".to_string()]));
    build_system.add_target(recording_target("b", &log).with_dependencies(vec!["a".to_string()]));

    match build_system.build("a", &env).await {
        Err(BuildError::CyclicDependency(cycle)) => assert_eq!(cycle, "a -> b -> a"),
        other => panic!("Expected CyclicDependency, got {:?}", other),
    }
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_phony_target_always_runs() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp);

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut build_system = BuildSystem::new();
    build_system.add_target(recording_target("refresh", &log));

    build_system.build("refresh", &env).await.unwrap();
    build_system.build("refresh", &env).await.unwrap();
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_failure_aborts_remaining_targets_and_keeps_earlier_stamps() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp);
    fs::write(temp.path().join("main.src"), "v1").unwrap();

    let good_calls = Arc::new(AtomicUsize::new(0));
    let later_calls = Arc::new(AtomicUsize::new(0));

    let mut build_system = BuildSystem::new();
    build_system.add_target(counting_app_target(&good_calls));
    build_system.add_target(
        Target::new("bad")
            .with_dependencies(vec!["app".to_string()])
            .with_phony(true)
            .with_invocation(|_inputs, _env| async {
                Err(BuildError::BuildFailed("packager exited 1".to_string()))
            }),
    );
    build_system.add_target({
        let later_calls = later_calls.clone();
        Target::new("final")
            .with_dependencies(vec!["bad".to_string()])
            .with_phony(true)
            .with_invocation(move |_inputs, _env| {
                let later_calls = later_calls.clone();
                async move {
                    later_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
    });

    match build_system.build("final", &env).await {
        Err(BuildError::BuildFailed(message)) => assert_eq!(message, "packager exited 1"),
        other => panic!("Expected BuildFailed, got {:?}", other),
    }
    assert_eq!(good_calls.load(Ordering::SeqCst), 1);
    assert_eq!(later_calls.load(Ordering::SeqCst), 0);

    // Retry: the completed dependency keeps its stamp and is skipped
    let result = build_system.build("final", &env).await;
    assert!(result.is_err());
    assert_eq!(good_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_dynamic_inputs_pick_up_added_files() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp);
    fs::create_dir_all(temp.path().join("lib")).unwrap();
    fs::write(temp.path().join("lib/a.src"), "a").unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let mut build_system = BuildSystem::new();
    build_system.add_target(
        Target::new("bundle")
            .with_inputs(vec![Source::tree_with_extension("{PROJECT_DIR}/lib", "src")])
            .with_outputs(vec![Source::pattern("{BUILD_DIR}/bundle.txt")])
            .with_invocation({
                let calls = calls.clone();
                move |inputs, env| {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        fs::create_dir_all(env.build_dir())?;
                        fs::write(env.build_dir().join("bundle.txt"), format!("{}", inputs.len()))?;
                        Ok(())
                    }
                }
            }),
    );

    build_system.build("bundle", &env).await.unwrap();
    build_system.build("bundle", &env).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A new file in the tree changes the resolved input set
    fs::write(temp.path().join("lib/b.src"), "b").unwrap();
    build_system.build("bundle", &env).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_inapplicable_target_is_passed_over() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp); // android_arm64 / debug

    let log = Arc::new(Mutex::new(Vec::new()));
    let mut build_system = BuildSystem::new();
    build_system.add_target(recording_target("common", &log));
    build_system.add_target(
        recording_target("ios_embed", &log)
            .with_dependencies(vec!["common".to_string()])
            .with_platforms(vec![TargetPlatform::Ios]),
    );

    let report = build_system.build("ios_embed", &env).await.unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["common".to_string()]);
    assert_eq!(report.skipped, vec!["ios_embed".to_string()]);
}

#[tokio::test]
async fn test_build_creates_cache_and_copy_dirs() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp);

    let mut build_system = BuildSystem::new();
    build_system.add_target(Target::new("noop").with_phony(true));
    build_system.build("noop", &env).await.unwrap();

    assert!(env.cache_dir().exists());
    assert!(env.copy_dir().exists());
}

#[tokio::test]
async fn test_describe_emits_resolved_graph_without_executing() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp);

    let calls = Arc::new(AtomicUsize::new(0));
    let mut build_system = BuildSystem::new();
    build_system.add_target(counting_app_target(&calls).with_dependencies(vec!["gen".to_string()]));
    build_system.add_target(
        Target::new("gen")
            .with_phony(true)
            .with_outputs(vec![Source::pattern("{BUILD_DIR}/gen.src")]),
    );

    let descriptions = build_system.describe("app", &env).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let names: Vec<_> = descriptions.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["gen", "app"]);

    let value = serde_json::to_value(&descriptions).unwrap();
    assert_eq!(value[0]["phony"], true);
    assert_eq!(value[1]["name"], "app");
    assert_eq!(value[1]["dependencies"], serde_json::json!(["gen"]));
    assert_eq!(
        value[1]["inputs"],
        serde_json::json!([temp.path().join("main.src").to_string_lossy()])
    );
    assert_eq!(
        value[1]["outputs"],
        serde_json::json!([temp.path().join("build/out/app.txt").to_string_lossy()])
    );
}

#[tokio::test]
async fn test_describe_unknown_target() {
    let temp = TempDir::new().unwrap();
    let env = scratch_env(&temp);

    let build_system = BuildSystem::new();
    assert!(matches!(
        build_system.describe("nope", &env),
        Err(BuildError::TargetNotFound { .. })
    ));
}
