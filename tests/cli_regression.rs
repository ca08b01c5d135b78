// Regression tests for the caseform binary.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn caseform() -> Command {
    Command::cargo_bin("caseform").unwrap()
}

#[test]
fn ids_lists_combined_entries_with_marks() {
    caseform()
        .arg("ids")
        .arg("tests/fixtures/arith.cases.yaml")
        .assert()
        .success()
        .stdout(
            contains("pair_1_2-low [slow]")
                .and(contains("pair_3_4-high"))
                .and(contains("case_zero-high"))
                .and(contains("case_reexported").not()),
        );
}

#[test]
fn ids_json_is_machine_readable() {
    let output = caseform()
        .args(["ids", "--json", "tests/fixtures/arith.cases.yaml"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["provider"], "test_add");
    let entries = json["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 6);
    assert_eq!(entries[0]["id"], "pair_1_2-low");
    assert_eq!(entries[0]["marks"][0], "slow");
}

#[test]
fn config_changes_the_id_separator() {
    caseform()
        .args(["--config", "tests/fixtures/slash.config.yaml"])
        .args(["ids", "tests/fixtures/arith.cases.yaml"])
        .assert()
        .success()
        .stdout(contains("pair_1_2/low"));
}

#[test]
fn discover_walks_manifests_in_order() {
    caseform()
        .args(["discover", "tests/fixtures"])
        .assert()
        .success()
        .stdout(
            contains("arith (3 cases)")
                .and(contains("strings (2 cases)"))
                .and(contains("case_upper")),
        );

    caseform()
        .args(["discover", "tests/fixtures", "--tag", "fast"])
        .assert()
        .success()
        .stdout(contains("arith (1 cases)").and(contains("pair_1_2").not()));
}

#[test]
fn check_reports_configuration_errors_with_diagnostics() {
    caseform()
        .args(["check", "tests/invalid/missing_param.cases.yaml"])
        .assert()
        .failure()
        .stderr(contains("caseform::configuration").and(contains("not a parameter")));
}

#[test]
fn check_reports_malformed_manifests() {
    caseform()
        .args(["check", "tests/invalid/malformed.cases.yaml"])
        .assert()
        .failure()
        .stderr(contains("caseform::manifest").or(contains("unknown field")));
}

#[test]
fn check_summarizes_a_valid_manifest() {
    caseform()
        .args(["check", "tests/fixtures/arith.cases.yaml"])
        .assert()
        .success()
        .stdout(contains("3 cases, 6 combined entries"));
}

#[test]
fn discover_fails_on_a_missing_directory() {
    caseform()
        .args(["discover", "/no/such/dir"])
        .assert()
        .failure()
        .stderr(contains("caseform::manifest").and(contains("/no/such/dir")));
}
