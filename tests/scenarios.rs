//! End-to-end scenarios: a harness over recording collaborators, driven the
//! way a test suite would drive it.

use liftoff::prelude::*;
use liftoff_core::test_utils::{FakeBuild, FakeStack};
use liftoff_core::{BuildError, ProtocolSetup};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn local_harness(fakes: &FakeStack, options: HarnessOptions) -> Harness {
    HarnessBuilder::new(options)
        .with_build(fakes.build.clone())
        .with_runtime(fakes.runtime.clone())
        .with_database(fakes.database.clone())
        .with_processes(fakes.processes.clone())
        .with_clients(fakes.clients.clone())
        .build()
        .unwrap()
}

// ━━━ Local app ━━━

#[tokio::test]
async fn local_app_is_built_spawned_and_connected_in_order() {
    let fakes = FakeStack::new();
    let harness = local_harness(&fakes, HarnessOptions::from("/app"));
    harness.init(json!({ "settings": {} }));

    let first = harness.commands().queue(|operand| async move { Ok(operand) });
    let second = harness.commands().queue(|operand| async move { Ok(operand) });
    let (first, second) = (first.await.unwrap(), second.await.unwrap());

    let log = &fakes.log;
    let build = log.position("build.start").unwrap();
    let runtime = log.position("runtime.path").unwrap();
    let database = log.position("database.url").unwrap();
    let spawn = log.position("process.spawn").unwrap();
    let connect = log.position("protocol.connect").unwrap();
    assert!(build < runtime && build < database);
    assert!(runtime < spawn && database < spawn);
    assert!(spawn < connect);

    assert_eq!(fakes.build.requests()[0].app_root, PathBuf::from("/app"));
    assert_eq!(first.process().unwrap().pid(), 4242);
    assert!(Arc::ptr_eq(&first.client, &second.client));
    assert_eq!(log.count("process.spawn"), 1);

    assert_eq!(
        harness.protocol_setup().await.unwrap(),
        ProtocolSetup::Local {
            port: 3000,
            process_id: 4242
        }
    );
    assert_eq!(
        fakes.clients.setups(),
        vec![ProtocolSetup::Local {
            port: 3000,
            process_id: 4242
        }]
    );
}

#[tokio::test]
async fn spawn_receives_build_runtime_and_database() {
    let fakes = FakeStack::new();
    let harness = local_harness(&fakes, HarnessOptions::from("/app").with_skip_build(true));
    harness.init(json!({}));
    harness.startup().await.unwrap();

    let request = &fakes.processes.requests()[0];
    assert_eq!(request.path_to_entry, PathBuf::from("/app/.build/main.js"));
    assert_eq!(request.runtime_path, PathBuf::from("/usr/bin/node"));
    assert_eq!(request.database_url, "mongodb://localhost:27017/app");
    assert!(fakes.build.requests()[0].skip_build);
}

#[tokio::test]
async fn full_session() {
    init_tracing();
    let fakes = FakeStack::new();
    let harness = local_harness(&fakes, HarnessOptions::from("/app"));
    harness.init(json!({}));

    harness
        .startup_with(|operand| async move {
            operand.closure.scope().set("user", json!("admin"));
            Ok(())
        })
        .await
        .unwrap();
    let args = harness
        .execute_remote("return [...arguments]", vec![json!(1), json!(2)])
        .await
        .unwrap();
    assert_eq!(args, json!([1, 2]));
    assert_eq!(harness.closure_scope().get("user"), Some(json!("admin")));

    harness.restart(None).await.unwrap();
    harness.stop().await.unwrap();

    assert_eq!(
        fakes.log.entries(),
        vec![
            "build.start",
            "runtime.path",
            "database.open",
            "database.url",
            "process.spawn",
            "protocol.connect",
            "client.ready",
            "client.call:/liftoff/execute",
            "process.restart",
            "client.close",
            "process.kill",
            "database.clean_up",
        ]
    );
    assert_eq!(harness.state(), LifecycleState::Stopped);
}

// ━━━ Remote server ━━━

#[tokio::test]
async fn remote_server_skips_local_resources() {
    init_tracing();
    let fakes = FakeStack::new();
    let harness = HarnessBuilder::new(HarnessOptions::new().with_remote_server("https://host:443"))
        .with_clients(fakes.clients.clone())
        .build()
        .unwrap();
    harness.init(json!({}));

    harness.startup().await.unwrap();
    let process = harness
        .commands()
        .queue(|operand| async move { Ok(operand.process.is_some()) })
        .await
        .unwrap();

    assert!(!process);
    assert_eq!(
        fakes.clients.setups(),
        vec![ProtocolSetup::Remote {
            hostname: "host".into(),
            port: 443
        }]
    );
    for collaborator in ["build.start", "runtime.path", "database.open", "process.spawn"] {
        assert_eq!(fakes.log.count(collaborator), 0, "{collaborator} was called");
    }

    harness.stop().await.unwrap();
    assert_eq!(fakes.log.count("client.close"), 1);
    assert_eq!(fakes.log.count("process.kill"), 0);
}

#[tokio::test]
async fn remote_port_defaults_to_443() {
    let fakes = FakeStack::new();
    let harness = HarnessBuilder::new(HarnessOptions::new().with_remote_server("http://staging.example.com"))
        .with_clients(fakes.clients.clone())
        .build()
        .unwrap();

    assert_eq!(
        harness.protocol_setup().await.unwrap(),
        ProtocolSetup::Remote {
            hostname: "staging.example.com".into(),
            port: 443
        }
    );
}

// ━━━ Failure fan-out ━━━

#[tokio::test]
async fn build_failure_reaches_every_queued_command() {
    let fakes = FakeStack::new();
    let fakes = FakeStack {
        build: Arc::new(
            FakeBuild::new(fakes.log.clone())
                .failing("syntax error")
                .with_delay(Duration::from_millis(10)),
        ),
        ..fakes
    };
    let harness = local_harness(&fakes, HarnessOptions::from("/app"));
    harness.init(json!({}));

    let queued: Vec<_> = (0..4)
        .map(|i| harness.commands().queue(move |_| async move { Ok(i) }))
        .collect();
    let expected = HarnessError::Build(BuildError::Failed("syntax error".into()));
    for pending in queued {
        assert_eq!(pending.await, Err(expected.clone()));
    }
    assert_eq!(harness.startup().await, Err(expected));

    assert_eq!(fakes.log.count("build.start"), 1);
    assert_eq!(fakes.log.count("runtime.path"), 0);
    assert_eq!(fakes.log.count("process.spawn"), 0);
}

#[tokio::test]
async fn version_mismatch_is_reported_before_spawn() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".meteor")).unwrap();
    std::fs::write(
        dir.path().join(".meteor/versions"),
        "ecmascript@0.16.0\nliftoff:harness@0.0.1\n",
    )
    .unwrap();
    let fakes = FakeStack::new();
    let harness = local_harness(&fakes, HarnessOptions::from(dir.path().to_path_buf()));
    harness.init(json!({}));

    let err = harness.startup().await.unwrap_err();
    assert!(matches!(err, HarnessError::VersionMismatch { .. }));
    assert!(err.to_string().contains("0.0.1"));
    assert_eq!(fakes.log.count("process.spawn"), 0);
}

#[tokio::test]
async fn missing_marker_means_not_installed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("config")).unwrap();
    std::fs::write(dir.path().join("config/versions"), "acme:tester@1.0.0\n").unwrap();
    let fakes = FakeStack::new();
    let harness = local_harness(
        &fakes,
        HarnessOptions::from(dir.path().to_path_buf())
            .with_manifest("config/versions")
            .with_marker_namespace("acme:harness"),
    );
    harness.init(json!({}));

    let err = harness.startup().await.unwrap_err();
    assert!(matches!(err, HarnessError::NotInstalled { .. }));
}
