use assert_cmd::Command;
use predicates::boolean::PredicateBooleanExt;
use predicates::str::contains;

const BINARY_NAME: &str = "ssa-synth";

#[test]
fn synthesizes_addition() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("Binary should be built");

    drop(
        cmd.args(["--iterations", "3000", "--time", "600000", "--seed", "1"])
            .assert()
            .success()
            .stdout(
                contains("function f(a, b) {")
                    .and(contains("return"))
                    .and(contains("reward 1\n")),
            ),
    );
}

#[test]
fn custom_examples() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("Binary should be built");

    drop(
        cmd.args([
            "--params",
            "x",
            "--examples",
            "1=2;2=4;3=6",
            "--iterations",
            "200",
        ])
        .assert()
        .success()
        .stdout(contains("function f(x) {").and(contains("reward"))),
    );
}

#[test]
fn mismatched_arity() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("Binary should be built");

    drop(
        cmd.args(["--params", "a,b,c"])
            .assert()
            .failure()
            .stderr(contains("examples have 2 inputs but there are 3 parameters")),
    );
}

#[test]
fn invalid_examples() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("Binary should be built");

    drop(
        cmd.args(["--examples", "2,2"])
            .assert()
            .failure()
            .stderr(contains("example should look like '2,3=5', got '2,2'")),
    );
}

#[test]
fn zero_time_budget() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("Binary should be built");

    drop(
        cmd.args(["--time", "0"])
            .assert()
            .failure()
            .stderr(contains("time budget should be positive")),
    );
}
