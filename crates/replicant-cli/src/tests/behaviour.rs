//! BDD step definitions for `replicant-call` behavioural tests.
//!
//! These steps map the scenarios in `tests/features/replicant_call.feature`
//! to harness operations that run the CLI against a fake cluster.

use super::support::*;

use std::cell::RefCell;

use replicant_client::StatusCode;
use replicant_client::testing::Reply;
use rstest_bdd_macros::{given, scenario, then, when};

#[given("a running fake cluster")]
fn given_running_cluster(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .start_cluster(Vec::new())
        .expect("failed to start fake cluster");
}

#[given("a fake cluster without the requested function")]
fn given_cluster_missing_function(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .start_cluster(vec![Reply::Fail {
            status: StatusCode::FunctionNotFound,
            message: Some(String::from("no function func on object echo")),
        }])
        .expect("failed to start fake cluster");
}

#[given("a fake cluster that answers for request {nonce}")]
fn given_cluster_renumbering(world: &RefCell<TestWorld>, nonce: i64) {
    world
        .borrow_mut()
        .start_cluster(vec![Reply::Renumber(nonce)])
        .expect("failed to start fake cluster");
}

#[given("a fake cluster that hangs up")]
fn given_cluster_hanging_up(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .start_cluster(vec![Reply::HangUp])
        .expect("failed to start fake cluster");
}

#[given("a fake cluster that never answers")]
fn given_silent_cluster(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .start_cluster(vec![Reply::Silent])
        .expect("failed to start fake cluster");
}

#[given("no cluster is listening")]
fn given_no_cluster(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .target_unused_port()
        .expect("failed to pick an unused port");
}

#[given("standard input with lines {lines}")]
fn given_input_lines(world: &RefCell<TestWorld>, lines: String) {
    let lines = lines.trim_matches('"');
    let lines: Vec<&str> = lines.split('|').collect();
    world.borrow_mut().set_input_lines(&lines);
}

#[when("the operator runs the client")]
fn when_operator_runs(world: &RefCell<TestWorld>) {
    world
        .borrow_mut()
        .run("")
        .expect("failed to run CLI");
}

#[when("the operator runs the client with {arguments}")]
fn when_operator_runs_with(world: &RefCell<TestWorld>, arguments: String) {
    world
        .borrow_mut()
        .run(arguments.trim_matches('"'))
        .expect("failed to run CLI");
}

#[then("the CLI succeeds")]
fn then_success(world: &RefCell<TestWorld>) {
    world
        .borrow()
        .assert_success()
        .expect("CLI did not succeed");
}

#[then("the CLI fails")]
fn then_failure(world: &RefCell<TestWorld>) {
    world
        .borrow()
        .assert_failure()
        .expect("CLI did not fail as expected");
}

/// Lines are separated by `|`; a literal `\0` stands for a NUL byte.
#[then("stdout lists {lines}")]
fn then_stdout_lists(world: &RefCell<TestWorld>, lines: String) {
    let world = world.borrow();
    let expected: String = lines
        .trim_matches('"')
        .replace("\\0", "\0")
        .split('|')
        .map(|line| format!("{line}\n"))
        .collect();
    let actual = world.stdout_text().expect("stdout text missing");
    assert_eq!(actual, expected);
}

#[then("stdout is empty")]
fn then_stdout_empty(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let actual = world.stdout_text().expect("stdout text missing");
    assert!(actual.is_empty(), "stdout unexpectedly held {actual:?}");
}

#[then("stderr contains {snippet}")]
fn then_stderr_contains(world: &RefCell<TestWorld>, snippet: String) {
    let world = world.borrow();
    let stderr = world.stderr_text().expect("stderr text missing");
    let snippet = snippet.trim_matches('"');
    assert!(
        stderr.contains(snippet),
        "stderr {stderr:?} did not contain {snippet:?}"
    );
}

#[then("the cluster received {count} calls to {target}")]
fn then_cluster_received(world: &RefCell<TestWorld>, count: usize, target: String) {
    world
        .borrow()
        .assert_calls_to(count, target.trim_matches('"'))
        .expect("cluster calls mismatch");
}

#[scenario(path = "tests/features/replicant_call.feature")]
fn replicant_call_behaviour(world: RefCell<TestWorld>) {
    let _ = world;
}
