mod common;

use common::TestEnv;
use predicates::prelude::*;
use serde_json::Value;
use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};

#[test]
fn local_run_passes_every_check() {
    let env = TestEnv::new();
    let v = env.run_json(&["run", "--local"]);
    assert_eq!(v["ok"], true);
    assert_eq!(v["data"]["passed"], 18);
    assert_eq!(v["data"]["failed"], 0);
    assert_eq!(v["data"]["total"], 18);
    assert_eq!(v["data"]["pass_rate"], 100.0);
    assert_eq!(v["data"]["checks"].as_array().map(Vec::len), Some(18));
    assert!(v["data"]["user_id"].is_string());
    assert!(v["data"]["tenant_id"].is_string());
}

#[test]
fn local_run_text_output_has_sections_and_summary() {
    let env = TestEnv::new();
    env.cmd()
        .args(["run", "--local"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CLM BACKEND - COMPLETE ENDPOINT TEST"))
        .stdout(predicate::str::contains("✓ Login User: 200"))
        .stdout(predicate::str::contains("  → Contract ID: "))
        .stdout(predicate::str::contains("✓ List Contracts: 200 (1 contracts)"))
        .stdout(predicate::str::contains("DOCUMENTS & REPOSITORY"))
        .stdout(predicate::str::contains("TOTAL: 18 PASSED, 0 FAILED out of 18"))
        .stdout(predicate::str::contains("Pass Rate: 100.0%"));
}

#[test]
fn only_restricts_the_plan_to_named_groups() {
    let env = TestEnv::new();
    let v = env.run_json(&["run", "--local", "--only", "templates", "--only", "metadata"]);
    assert_eq!(v["data"]["total"], 4);
    let names: Vec<&str> = v["data"]["checks"]
        .as_array()
        .expect("checks")
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "Create Template",
            "List Templates",
            "Create Metadata Field",
            "List Metadata Fields"
        ]
    );
}

#[test]
fn unknown_group_is_a_config_error() {
    let env = TestEnv::new();
    let out = env
        .cmd()
        .args(["--json", "run", "--local", "--only", "billing"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let v: Value = serde_json::from_slice(&out).expect("json error");
    assert_eq!(v["ok"], false);
    assert_eq!(v["error"]["code"], "CONFIG_INVALID");
}

#[test]
fn unreachable_backend_fails_login_with_exit_one() {
    let env = TestEnv::new();
    let out = env
        .cmd()
        .args(["--json", "--base-url", "http://127.0.0.1:1", "run"])
        .env("CLM_SMOKE_TIMEOUT_MS", "2000")
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let v: Value = serde_json::from_slice(&out).expect("json error");
    assert_eq!(v["error"]["code"], "LOGIN_FAILED");

    env.cmd()
        .args(["--base-url", "http://127.0.0.1:1", "run"])
        .env("CLM_SMOKE_TIMEOUT_MS", "2000")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Login failed:"));
}

#[test]
fn completed_runs_are_appended_to_history() {
    let env = TestEnv::new();
    env.run_json(&["run", "--local", "--only", "workflows"]);
    env.run_json(&["run", "--local", "--strict"]);

    let raw = std::fs::read_to_string(env.history_path()).expect("history file");
    let lines: Vec<Value> = raw
        .lines()
        .map(|l| serde_json::from_str(l).expect("history line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["total"], 2);
    assert_eq!(lines[1]["total"], 18);
    assert_eq!(lines[1]["failed"], 0);
}

#[test]
fn malformed_config_file_is_rejected() {
    let env = TestEnv::new();
    env.write_config("[smoke]\nretries = 3\n");
    let out = env
        .cmd()
        .args(["--json", "run", "--local"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let v: Value = serde_json::from_slice(&out).expect("json error");
    assert_eq!(v["error"]["code"], "CONFIG_INVALID");
}

#[test]
fn checks_lists_the_plan_without_a_backend() {
    let env = TestEnv::new();
    let v = env.run_json(&["checks"]);
    let plan = v["data"].as_array().expect("plan");
    assert_eq!(plan.len(), 18);
    assert_eq!(plan[0]["name"], "Create Contract");
    assert_eq!(plan[5]["path"], "/api/contracts/{contract_id}/clone/");

    env.cmd()
        .arg("checks")
        .assert()
        .success()
        .stdout(predicate::str::contains("CONTRACTS\tCreate Contract Version\tPOST"));
}

struct ServeGuard(Child);

impl Drop for ServeGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

#[test]
fn reruns_against_a_served_backend_reuse_the_account() {
    let env = TestEnv::new();
    let mut child = Command::new(env!("CARGO_BIN_EXE_clm-smoke"))
        .env("HOME", &env.home)
        .env_remove("CLM_BASE_URL")
        .args(["serve", "--bind", "127.0.0.1:0"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn serve");
    let stdout = child.stdout.take().expect("serve stdout");
    let _guard = ServeGuard(child);

    let mut banner = String::new();
    BufReader::new(stdout)
        .read_line(&mut banner)
        .expect("read serve banner");
    let base_url = banner
        .split_whitespace()
        .last()
        .expect("serve address")
        .to_string();
    assert!(base_url.starts_with("http://127.0.0.1:"));

    let first = env.run_json(&["--base-url", &base_url, "run"]);
    assert_eq!(first["data"]["registration_status"], 201);
    assert_eq!(first["data"]["failed"], 0);

    let second = env.run_json(&["--base-url", &base_url, "run"]);
    assert_eq!(second["data"]["registration_status"], 400);
    assert_eq!(second["data"]["passed"], 18);
}
