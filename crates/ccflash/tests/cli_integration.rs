#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

const FAKE_NPM: &str = r#"#!/bin/sh
printf 'npm %s (cwd=%s)\n' "$*" "$(pwd -P)" >> "$CCFLASH_TEST_LOG"
exit "${FAKE_NPM_EXIT:-0}"
"#;

const FAKE_PIO: &str = r#"#!/bin/sh
printf '%s %s\n' "${0##*/}" "$*" >> "$CCFLASH_TEST_LOG"
case "$*" in
  *uploadfs*)
    if [ -f data/user_settings.json ]; then
      while IFS= read -r line || [ -n "$line" ]; do
        printf '%s\n' "$line"
      done < data/user_settings.json > "$CCFLASH_TEST_CAPTURE"
    fi
    exit "${FAKE_UPLOADFS_EXIT:-0}"
    ;;
  *)
    exit "${FAKE_UPLOAD_EXIT:-0}"
    ;;
esac
"#;

struct Project {
    _temp: TempDir,
    root: PathBuf,
    bin: PathBuf,
    log: PathBuf,
    capture: PathBuf,
}

impl Project {
    fn new() -> Self {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("sensor");
        let bin = temp.path().join("bin");
        fs::create_dir_all(root.join("webui")).expect("webui dir");
        fs::create_dir_all(root.join("data")).expect("data dir");
        fs::create_dir_all(&bin).expect("bin dir");
        Self {
            log: temp.path().join("invocations.log"),
            capture: temp.path().join("uploadfs-settings.json"),
            root,
            bin,
            _temp: temp,
        }
    }

    fn with_tools(self, names: &[&str]) -> Self {
        for name in names {
            let body = if *name == "npm" { FAKE_NPM } else { FAKE_PIO };
            let path = self.bin.join(name);
            fs::write(&path, body).expect("write fake tool");
            let mut perms = fs::metadata(&path).expect("metadata").permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&path, perms).expect("chmod fake tool");
        }
        self
    }

    fn data(&self, name: &str) -> PathBuf {
        self.root.join("data").join(name)
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ccflash"));
        cmd.arg("--project-root")
            .arg(&self.root)
            .env("PATH", &self.bin)
            .env("CCFLASH_TEST_LOG", &self.log)
            .env("CCFLASH_TEST_CAPTURE", &self.capture)
            .env_remove("RUST_LOG");
        cmd
    }

    fn invocations(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn template_fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join("user_settings.template.json")
}

fn read_json(path: &Path) -> Value {
    let raw = fs::read(path).unwrap_or_else(|error| panic!("read {}: {error}", path.display()));
    serde_json::from_slice(&raw).unwrap_or_else(|error| panic!("parse {}: {error}", path.display()))
}

#[test]
fn help_lists_supported_flags() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ccflash"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--env"))
        .stdout(predicate::str::contains("--skip-npm-install"))
        .stdout(predicate::str::contains("esp32-s3-dev"));
}

#[test]
fn functional_full_run_builds_and_flashes_in_order() {
    let project = Project::new().with_tools(&["npm", "pio"]);
    let webui = fs::canonicalize(project.root.join("webui")).expect("canonical webui");

    project
        .command()
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "All done. Firmware and filesystem have been flashed.",
        ));

    assert_eq!(
        project.invocations(),
        vec![
            format!("npm install (cwd={})", webui.display()),
            format!("npm run build (cwd={})", webui.display()),
            "pio run -e esp32-s3-dev -t uploadfs".to_string(),
            "pio run -e esp32-s3-dev -t upload".to_string(),
        ]
    );
}

#[test]
fn functional_skip_npm_install_and_custom_env() {
    let project = Project::new().with_tools(&["npm", "pio"]);

    project
        .command()
        .args(["--skip-npm-install", "--env", "esp32-c3-supermini"])
        .assert()
        .success();

    let invocations = project.invocations();
    assert!(invocations.iter().all(|line| !line.starts_with("npm install")));
    assert!(invocations.contains(&"pio run -e esp32-c3-supermini -t upload".to_string()));
}

#[test]
fn functional_platformio_is_used_when_pio_is_absent() {
    let project = Project::new().with_tools(&["npm", "platformio"]);

    project.command().assert().success();

    let invocations = project.invocations();
    assert!(invocations.contains(&"platformio run -e esp32-s3-dev -t uploadfs".to_string()));
}

#[test]
fn integration_template_bootstrap_creates_identical_settings() {
    let project = Project::new().with_tools(&["npm", "pio"]);
    fs::copy(
        template_fixture_path(),
        project.data("user_settings.template.json"),
    )
    .expect("copy template");

    project
        .command()
        .assert()
        .success()
        .stdout(predicate::str::contains("from template (no secrets)."));

    assert_eq!(
        fs::read(project.data("user_settings.json")).expect("settings"),
        fs::read(template_fixture_path()).expect("template")
    );
}

#[test]
fn integration_secrets_are_uploaded_but_not_left_on_disk() {
    let project = Project::new().with_tools(&["npm", "pio"]);
    let original = "{\"ssid\": \"old\", \"other\": 1}";
    fs::write(project.data("user_settings.json"), original).expect("settings");
    fs::write(
        project.data("user_settings.secrets.json"),
        r#"{"ssid": "X", "foo": "bar"}"#,
    )
    .expect("secrets");

    project
        .command()
        .assert()
        .success()
        .stdout(predicate::str::contains("Merged secrets into"))
        .stdout(predicate::str::contains("Restored original"));

    assert_eq!(read_json(&project.capture), json!({"ssid": "X", "other": 1}));
    assert_eq!(
        fs::read_to_string(project.data("user_settings.json")).expect("settings"),
        original
    );
}

#[test]
fn integration_malformed_secrets_warn_and_continue() {
    let project = Project::new().with_tools(&["npm", "pio"]);
    fs::write(project.data("user_settings.json"), "{\"ssid\": \"\"}").expect("settings");
    fs::write(project.data("user_settings.secrets.json"), "{ssid: oops").expect("secrets");

    project
        .command()
        .assert()
        .success()
        .stderr(predicate::str::contains("user_settings.secrets.json"));

    assert_eq!(read_json(&project.capture), json!({"ssid": ""}));
}

#[test]
fn regression_missing_npm_exits_one_without_running_anything() {
    let project = Project::new().with_tools(&["pio"]);

    project
        .command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("`npm` is not on PATH."))
        .stderr(predicate::str::contains("Please install Node.js"));

    assert!(project.invocations().is_empty());
}

#[test]
fn regression_missing_toolchain_exits_one_after_build() {
    let project = Project::new().with_tools(&["npm"]);

    project
        .command()
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Neither `pio` nor `platformio` is on PATH.",
        ));

    assert_eq!(project.invocations().len(), 2);
}

#[test]
fn regression_failed_filesystem_upload_propagates_code_and_restores_settings() {
    let project = Project::new().with_tools(&["npm", "pio"]);
    let original = "{\n  \"passwd\": \"\"\n}\n";
    fs::write(project.data("user_settings.json"), original).expect("settings");
    fs::write(
        project.data("user_settings.secrets.json"),
        r#"{"passwd": "hunter2"}"#,
    )
    .expect("secrets");

    project
        .command()
        .env("FAKE_UPLOADFS_EXIT", "4")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Command failed with exit code 4"));

    let invocations = project.invocations();
    assert_eq!(
        invocations.last().map(String::as_str),
        Some("pio run -e esp32-s3-dev -t uploadfs")
    );
    assert_eq!(read_json(&project.capture), json!({"passwd": "hunter2"}));
    assert_eq!(
        fs::read_to_string(project.data("user_settings.json")).expect("settings"),
        original
    );
}

#[test]
fn regression_failed_build_propagates_npm_exit_code() {
    let project = Project::new().with_tools(&["npm", "pio"]);

    project
        .command()
        .env("FAKE_NPM_EXIT", "3")
        .assert()
        .code(3);

    assert_eq!(project.invocations().len(), 1);
}
