#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const ISOLATED_VARS: &[&str] = &[
    "CLM_BASE_URL",
    "CLM_SMOKE_EMAIL",
    "CLM_SMOKE_PASSWORD",
    "CLM_SMOKE_FULL_NAME",
    "CLM_SMOKE_TIMEOUT_MS",
    "CLM_SMOKE_LOG",
    "CLM_SMOKE_LOG_JSON",
    "RUST_LOG",
];

pub struct TestEnv {
    _tmp: TempDir,
    pub home: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        fs::create_dir_all(&home).expect("create isolated home");
        Self { _tmp: tmp, home }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("clm-smoke");
        cmd.env("HOME", &self.home);
        for var in ISOLATED_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    pub fn write_config(&self, body: &str) -> PathBuf {
        let path = self.home.join(".config/clm-smoke/config.toml");
        fs::create_dir_all(path.parent().expect("config dir")).expect("create config dir");
        fs::write(&path, body).expect("write config");
        path
    }

    pub fn history_path(&self) -> PathBuf {
        self.home.join(".local/share/clm-smoke/runs.jsonl")
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let mut cmd = self.cmd();
        let out = cmd
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }
}
