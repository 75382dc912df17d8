use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

fn tally(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.env("TALLY_DATA_DIR", dir).env_remove("RUST_LOG");
    cmd
}

/// Run a command that must succeed and return the `ID:` it printed
fn run_for_id(dir: &Path, args: &[&str]) -> String {
    let output = tally(dir).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .find_map(|line| line.trim().strip_prefix("ID: ").map(str::to_string))
        .unwrap()
}

/// Checking with $500 opening, two outflows and a January statement
fn seed(dir: &Path) -> (String, String) {
    tally(dir)
        .args(["account", "create", "Checking", "--balance", "500.00"])
        .assert()
        .success();

    let groceries = run_for_id(
        dir,
        &["transaction", "add", "Checking", "-20.00", "--payee", "Grocer", "--date", "2025-01-10"],
    );
    let fuel = run_for_id(
        dir,
        &["transaction", "add", "Checking", "-15.00", "--payee", "Fuel", "--date", "2025-01-12"],
    );

    tally(dir)
        .args([
            "statement", "add", "Checking", "--start", "2025-01-01", "--end", "2025-01-31",
            "--opening", "500.00", "--closing", "465.00",
        ])
        .assert()
        .success();

    (groceries, fuel)
}

#[test]
fn reconcile_balanced_statement_end_to_end() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    let (groceries, fuel) = seed(dir);

    tally(dir)
        .args(["reconcile", "start", "Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Started reconciliation of Checking"))
        .stdout(predicate::str::contains("Grocer"));

    tally(dir)
        .args(["reconcile", "toggle", "Checking", &groceries, &fuel])
        .assert()
        .success()
        .stdout(predicate::str::contains("Difference: $0.00"));

    tally(dir)
        .args(["reconcile", "set-balance", "Checking", "465.00"])
        .assert()
        .success();

    tally(dir)
        .args(["reconcile", "complete", "Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Transactions reconciled: 2"))
        .stdout(predicate::str::contains("Balanced"));

    tally(dir)
        .args(["history", "--account", "Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed"));

    tally(dir)
        .args(["transaction", "list", "--unreconciled"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No transactions found."));
}

#[test]
fn second_session_for_account_is_rejected() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    seed(dir);

    tally(dir)
        .args(["reconcile", "start", "Checking"])
        .assert()
        .success();

    tally(dir)
        .args(["reconcile", "start", "Checking"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Conflict"));
}

#[test]
fn complete_requires_actual_balance() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    seed(dir);

    tally(dir)
        .args(["reconcile", "start", "Checking"])
        .assert()
        .success();

    tally(dir)
        .args(["reconcile", "complete", "Checking"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Precondition failed"));

    tally(dir)
        .args(["reconcile", "abandon", "Checking"])
        .assert()
        .success();

    tally(dir)
        .args(["reconcile", "start", "Checking"])
        .assert()
        .success();
}

#[test]
fn adjustment_forces_a_match() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    let (groceries, _) = seed(dir);

    tally(dir)
        .args(["reconcile", "start", "Checking"])
        .assert()
        .success();
    tally(dir)
        .args(["reconcile", "toggle", "Checking", &groceries])
        .assert()
        .success();
    tally(dir)
        .args(["reconcile", "set-balance", "Checking", "465.00"])
        .assert()
        .success();

    tally(dir)
        .args(["reconcile", "adjust", "Checking", "--date", "2025-01-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Posted adjustment"))
        .stdout(predicate::str::contains("Balanced"));
}

#[test]
fn summary_reports_never_reconciled_accounts() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    seed(dir);

    tally(dir)
        .arg("summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("Checking"))
        .stdout(predicate::str::contains("never"))
        .stdout(predicate::str::contains("critical"));
}

#[test]
fn unknown_account_fails() {
    let temp = TempDir::new().unwrap();

    tally(temp.path())
        .args(["reconcile", "status", "Savings"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Account not found"));
}

#[test]
fn status_without_open_session_is_not_found() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    seed(dir);

    tally(dir)
        .args(["reconcile", "status", "Checking"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Session not found"));
}

#[test]
fn start_without_statement_is_not_found() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    tally(dir)
        .args(["account", "create", "Savings"])
        .assert()
        .success();

    tally(dir)
        .args(["reconcile", "start", "Savings"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Statement not found"));
}

#[test]
fn malformed_balance_is_rejected() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();
    seed(dir);

    tally(dir)
        .args(["reconcile", "start", "Checking"])
        .assert()
        .success();

    for bad in ["1.\u{20ac}5", "465.001", "1.-5"] {
        tally(dir)
            .args(["reconcile", "set-balance", "Checking", bad])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Invalid amount"));
    }
}
