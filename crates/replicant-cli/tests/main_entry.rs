//! Integration tests for the `replicant-call` binary entry point.
//!
//! Verifies the line loop against a fake cluster and the user-facing error
//! handling for unusable arguments and unreachable clusters.

use std::net::TcpListener;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::{contains, is_empty};
use replicant_client::testing::{FakeCluster, Reply};

fn unused_endpoint() -> String {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind probe");
    let port = listener.local_addr().expect("probe address").port();
    format!("tcp://127.0.0.1:{port}")
}

#[test]
fn echoes_each_line_and_exits_cleanly() {
    let mut cluster = FakeCluster::spawn(Vec::new()).expect("spawn cluster");
    let mut command = cargo_bin_cmd!("replicant-call");
    command
        .env_remove("REPLICANT_CLUSTER")
        .args(["--cluster", &cluster.endpoint().to_string()])
        .write_stdin("hello\nworld\n");

    command.assert().success().stdout("hello\0\nworld\0\n");

    let calls = cluster.take_calls().expect("cluster calls");
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|call| call.object == "echo" && call.function == "func"));
}

#[test]
fn cluster_can_come_from_the_environment() {
    let mut cluster = FakeCluster::spawn(vec![Reply::Output(b"from env".to_vec())])
        .expect("spawn cluster");
    let mut command = cargo_bin_cmd!("replicant-call");
    command
        .env("REPLICANT_CLUSTER", cluster.endpoint().to_string())
        .write_stdin("ping\n");

    command.assert().success().stdout("from env\n");
    assert_eq!(cluster.take_calls().expect("cluster calls").len(), 1);
}

#[test]
fn remote_failure_exits_non_zero_with_a_diagnostic() {
    let cluster = FakeCluster::spawn(vec![Reply::Fail {
        status: replicant_client::StatusCode::ObjectNotFound,
        message: None,
    }])
    .expect("spawn cluster");
    let mut command = cargo_bin_cmd!("replicant-call");
    command
        .args(["--cluster", &cluster.endpoint().to_string(), "--object", "nope"])
        .write_stdin("a\nb\n");

    command
        .assert()
        .failure()
        .stdout(is_empty())
        .stderr(contains("could not process request:").and(contains("(REPLICANT_OBJ_NOT_FOUND)")));
}

#[test]
fn unreachable_cluster_exits_with_failure() {
    let endpoint = unused_endpoint();
    let mut command = cargo_bin_cmd!("replicant-call");
    command.args(["--cluster", &endpoint]).write_stdin("hello\n");

    command
        .assert()
        .failure()
        .stderr(contains(format!("failed to connect to cluster at {endpoint}")));
}

#[test]
fn extra_arguments_exit_with_failure() {
    let mut command = cargo_bin_cmd!("replicant-call");
    command.arg("unexpected").write_stdin("");

    command
        .assert()
        .failure()
        .stderr(contains("unexpected argument"));
}
