//! Harness construction, lifecycle and teardown ordering.

use liftoff::prelude::*;
use liftoff_core::test_utils::{
    FakeClientManager, FakeDatabaseManager, FakeProcessManager, FakeStack,
};
use liftoff_core::{DatabaseError, ProcessError, ProtocolError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn local(fakes: &FakeStack) -> HarnessBuilder {
    HarnessBuilder::new("/app")
        .with_build(fakes.build.clone())
        .with_runtime(fakes.runtime.clone())
        .with_database(fakes.database.clone())
        .with_processes(fakes.processes.clone())
        .with_clients(fakes.clients.clone())
}

// ━━━ Construction ━━━

#[test]
fn missing_client_manager_is_a_construction_error() {
    let err = HarnessBuilder::new("/app").build().unwrap_err();
    assert!(matches!(err, HarnessError::Construction(_)));
}

#[test]
fn local_mode_requires_every_collaborator() {
    let fakes = FakeStack::new();
    let err = HarnessBuilder::new("/app")
        .with_build(fakes.build.clone())
        .with_clients(fakes.clients.clone())
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        HarnessError::Construction("a runtime locator is required".into())
    );
}

#[test]
fn remote_mode_needs_only_clients() {
    let fakes = FakeStack::new();
    let harness = HarnessBuilder::new(HarnessOptions::new().with_remote_server("https://example.com"))
        .with_clients(fakes.clients.clone())
        .build()
        .unwrap();
    assert!(harness.is_remote());
    assert_eq!(harness.state(), LifecycleState::Uninitialized);
}

#[test]
fn unparsable_remote_server_is_rejected() {
    let fakes = FakeStack::new();
    let err = HarnessBuilder::new(HarnessOptions::new().with_remote_server("not a url"))
        .with_clients(fakes.clients.clone())
        .build()
        .unwrap_err();
    assert!(matches!(err, HarnessError::Construction(_)));
}

#[test]
fn non_mongodb_url_is_rejected() {
    let fakes = FakeStack::new();
    let err = HarnessBuilder::new(HarnessOptions::from("/app").with_mongo_url("postgres://db"))
        .with_build(fakes.build.clone())
        .with_runtime(fakes.runtime.clone())
        .with_database(fakes.database.clone())
        .with_processes(fakes.processes.clone())
        .with_clients(fakes.clients.clone())
        .build()
        .unwrap_err();
    assert!(matches!(err, HarnessError::Construction(_)));
}

#[test]
fn helpers_are_reachable() {
    #[derive(Debug, PartialEq)]
    struct Login {
        user: &'static str,
    }

    let fakes = FakeStack::new();
    let harness = local(&fakes)
        .with_helpers(Login { user: "admin" })
        .build()
        .unwrap();
    assert_eq!(harness.helpers(), &Login { user: "admin" });
}

// ━━━ Config ━━━

#[tokio::test]
async fn init_keeps_the_first_config() {
    let fakes = FakeStack::new();
    let harness = local(&fakes).build().unwrap();
    assert!(!harness.is_initialized());

    harness.init(json!({ "port": 1 })).init(json!({ "port": 2 }));
    assert_eq!(harness.config().unwrap(), &json!({ "port": 1 }));
}

#[tokio::test]
async fn startup_without_config_fails_before_building() {
    let fakes = FakeStack::new();
    let harness = local(&fakes).build().unwrap();

    let err = harness.startup().await.unwrap_err();
    assert_eq!(err, HarnessError::NotInitialized);
    assert_eq!(fakes.log.count("build.start"), 0);
    assert_eq!(harness.state(), LifecycleState::Starting);
}

// ━━━ Lifecycle ━━━

#[tokio::test]
async fn startup_resolves_and_waits_for_ready() {
    init_tracing();
    let fakes = FakeStack::new();
    let harness = local(&fakes).build().unwrap();
    harness.init(json!({}));

    assert!(fakes.log.entries().is_empty());
    harness.startup().await.unwrap();

    assert_eq!(harness.state(), LifecycleState::Running);
    assert!(fakes.log.position("protocol.connect") < fakes.log.position("client.ready"));
}

#[tokio::test]
async fn startup_callback_runs_after_ready() {
    let fakes = FakeStack::new();
    let harness = local(&fakes).build().unwrap();
    harness.init(json!({}));

    let log = fakes.log.clone();
    let pid = harness
        .startup_with(move |operand| async move {
            log.record("callback");
            operand.process().map(|p| p.pid())
        })
        .await
        .unwrap();

    assert_eq!(pid, 4242);
    assert!(fakes.log.position("client.ready") < fakes.log.position("callback"));
    assert_eq!(harness.state(), LifecycleState::Running);
}

#[tokio::test]
#[allow(deprecated)]
async fn start_still_starts() {
    init_tracing();
    let fakes = FakeStack::new();
    let harness = local(&fakes).build().unwrap();
    harness.init(json!({}));

    harness.start().await.unwrap();
    assert_eq!(harness.state(), LifecycleState::Running);
}

#[tokio::test]
async fn stop_tears_down_in_order() {
    let fakes = FakeStack::new();
    let harness = local(&fakes).build().unwrap();
    harness.init(json!({}));
    harness.startup().await.unwrap();

    harness.stop().await.unwrap();

    let log = &fakes.log;
    assert!(log.position("client.close") < log.position("process.kill"));
    assert!(log.position("process.kill") < log.position("database.clean_up"));
    assert_eq!(harness.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn commands_after_stop_fail() {
    let fakes = FakeStack::new();
    let harness = local(&fakes).build().unwrap();
    harness.init(json!({}));
    harness.startup().await.unwrap();
    harness.stop().await.unwrap();

    assert_eq!(harness.restart(None).await, Err(HarnessError::Stopped));
    assert_eq!(harness.stop().await, Err(HarnessError::Stopped));
    assert_eq!(
        harness.execute_remote("return 1", vec![]).await,
        Err(HarnessError::Stopped)
    );
    assert_eq!(fakes.log.count("process.kill"), 1);
}

#[tokio::test]
async fn close_failure_does_not_block_kill() {
    let fakes = FakeStack::new();
    let fakes = FakeStack {
        clients: Arc::new(FakeClientManager::new(fakes.log.clone()).failing_close("socket gone")),
        ..fakes
    };
    let harness = local(&fakes).build().unwrap();
    harness.init(json!({}));

    let err = harness.stop().await.unwrap_err();
    assert_eq!(
        err,
        HarnessError::Protocol(ProtocolError::Close("socket gone".into()))
    );
    assert_eq!(fakes.log.count("process.kill"), 1);
    assert_eq!(fakes.log.count("database.clean_up"), 1);
    assert_eq!(harness.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn kill_failure_skips_cleanup() {
    let fakes = FakeStack::new();
    let fakes = FakeStack {
        processes: Arc::new(FakeProcessManager::new(fakes.log.clone()).failing_kill("zombie")),
        ..fakes
    };
    let harness = local(&fakes).build().unwrap();
    harness.init(json!({}));

    let err = harness.stop().await.unwrap_err();
    assert_eq!(err, HarnessError::Process(ProcessError::Kill("zombie".into())));
    assert_eq!(fakes.log.count("database.clean_up"), 0);
    assert_eq!(harness.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn cleanup_failure_is_reported() {
    let fakes = FakeStack::new();
    let fakes = FakeStack {
        database: Arc::new(FakeDatabaseManager::new(fakes.log.clone()).failing_clean_up("locked")),
        ..fakes
    };
    let harness = local(&fakes).build().unwrap();
    harness.init(json!({}));

    let err = harness.stop().await.unwrap_err();
    assert_eq!(err, HarnessError::Database(DatabaseError::CleanUp("locked".into())));
}

#[tokio::test]
async fn external_database_is_not_cleaned_up() {
    let fakes = FakeStack::new();
    let harness = HarnessBuilder::new(
        HarnessOptions::from("/app").with_mongo_url("mongodb://shared:27017/app"),
    )
    .with_build(fakes.build.clone())
    .with_runtime(fakes.runtime.clone())
    .with_database(fakes.database.clone())
    .with_processes(fakes.processes.clone())
    .with_clients(fakes.clients.clone())
    .build()
    .unwrap();
    harness.init(json!({}));

    harness.stop().await.unwrap();
    assert_eq!(fakes.log.count("database.open"), 0);
    assert_eq!(fakes.log.count("database.clean_up"), 0);
    assert_eq!(fakes.processes.requests()[0].database_url, "mongodb://shared:27017/app");
}

#[tokio::test]
async fn stop_after_version_mismatch_cleans_up_the_started_database() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".meteor")).unwrap();
    std::fs::write(dir.path().join(".meteor/versions"), "liftoff:harness@0.0.1\n").unwrap();
    let fakes = FakeStack::new();
    let harness = HarnessBuilder::new(HarnessOptions::from(dir.path().to_path_buf()))
        .with_build(fakes.build.clone())
        .with_runtime(fakes.runtime.clone())
        .with_database(fakes.database.clone())
        .with_processes(fakes.processes.clone())
        .with_clients(fakes.clients.clone())
        .build()
        .unwrap();
    harness.init(json!({}));

    let err = harness.stop().await.unwrap_err();
    assert!(matches!(err, HarnessError::VersionMismatch { .. }));
    assert_eq!(fakes.log.count("process.spawn"), 0);
    assert_eq!(fakes.log.count("process.kill"), 0);
    assert_eq!(fakes.log.count("database.clean_up"), 1);
    assert_eq!(harness.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn stop_after_connect_failure_kills_spawned_process() {
    let fakes = FakeStack::new();
    let fakes = FakeStack {
        clients: Arc::new(FakeClientManager::new(fakes.log.clone()).failing("refused")),
        ..fakes
    };
    let harness = local(&fakes).build().unwrap();
    harness.init(json!({}));

    let err = harness.stop().await.unwrap_err();
    assert_eq!(err, HarnessError::Protocol(ProtocolError::Connect("refused".into())));
    assert!(fakes.log.position("process.kill") < fakes.log.position("database.clean_up"));
    assert_eq!(fakes.log.count("client.close"), 0);

    // A second stop neither reports the old error nor releases again.
    assert_eq!(harness.stop().await, Err(HarnessError::Stopped));
    assert_eq!(fakes.log.count("process.kill"), 1);
}

// ━━━ Restart ━━━

#[tokio::test]
async fn restart_recycles_process_and_keeps_client() {
    let fakes = FakeStack::new();
    let harness = local(&fakes).build().unwrap();
    harness.init(json!({}));
    harness.startup().await.unwrap();

    harness.restart(Some(Duration::from_millis(5))).await.unwrap();

    assert_eq!(fakes.log.count("process.restart"), 1);
    assert_eq!(fakes.log.count("process.spawn"), 1);
    assert_eq!(fakes.log.count("protocol.connect"), 1);
    assert_eq!(fakes.log.count("client.close"), 0);
}

#[tokio::test]
async fn restart_against_remote_server_has_no_process() {
    let fakes = FakeStack::new();
    let harness = HarnessBuilder::new(HarnessOptions::new().with_remote_server("https://example.com"))
        .with_clients(fakes.clients.clone())
        .build()
        .unwrap();
    harness.init(json!({}));

    assert_eq!(harness.restart(None).await, Err(HarnessError::NoProcess));
}

// ━━━ Closures ━━━

#[tokio::test]
async fn closure_scope_travels_with_every_execution() {
    let fakes = FakeStack::new();
    let fakes = FakeStack {
        clients: Arc::new(FakeClientManager::new(fakes.log.clone()).with_handler(|_, params| {
            let counter = params[2]["counter"].as_i64().unwrap_or(0);
            Ok(json!({ "value": counter, "closure": { "counter": counter + 1 } }))
        })),
        ..fakes
    };
    let harness = local(&fakes).build().unwrap();
    harness.init(json!({}));
    harness.closure_scope().set("counter", json!(10));

    assert_eq!(harness.execute_remote("count()", vec![]).await.unwrap(), json!(10));
    assert_eq!(harness.execute_remote("count()", vec![]).await.unwrap(), json!(11));
    assert_eq!(harness.closure_scope().get("counter"), Some(json!(12)));
}
