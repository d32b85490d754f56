use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn pkgsmith(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pkgsmith"))
        .current_dir(dir)
        .env_remove("PKGSMITH_LOG")
        .args(args)
        .output()
        .expect("failed to execute pkgsmith")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn help_lists_every_subcommand() {
    let tmp = TempDir::new().unwrap();
    let out = pkgsmith(tmp.path(), &["--help"]);
    assert!(out.status.success());
    let help = stdout(&out);
    for command in ["new", "review", "branch-guard"] {
        assert!(help.contains(command), "--help missing {}", command);
    }
}

#[test]
fn new_without_git_creates_the_package() {
    let tmp = TempDir::new().unwrap();
    let out = pkgsmith(
        tmp.path(),
        &["new", "billing-core", "Billing domain services", "--no-git"],
    );
    assert!(out.status.success(), "{}", stderr(&out));
    let root = tmp.path().join("packages/billing-core");
    assert!(root.join("pyproject.toml").is_file());
    assert!(root.join("src/billing_core/services/__init__.py").is_file());
    assert!(!root.join(".git").exists());
    let text = stdout(&out);
    assert!(text.contains("Module name: billing_core"));
    assert!(text.contains("wrote: pyproject.toml"));
}

#[test]
fn missing_description_is_a_usage_error() {
    let tmp = TempDir::new().unwrap();
    let out = pkgsmith(tmp.path(), &["new", "billing-core"]);
    assert!(!out.status.success());
    assert!(fs::read_dir(tmp.path()).unwrap().next().is_none());
}

#[test]
fn invalid_name_fails_without_side_effects() {
    let tmp = TempDir::new().unwrap();
    let out = pkgsmith(tmp.path(), &["new", "9-lives", "Cats", "--no-git"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Invalid package name"));
    assert!(!tmp.path().join("packages").exists());
}

#[test]
fn existing_target_is_refused() {
    let tmp = TempDir::new().unwrap();
    let target = tmp.path().join("out/billing-core");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("keep.txt"), "x").unwrap();

    let out = pkgsmith(
        tmp.path(),
        &["new", "billing-core", "Billing", "--no-git", "--packages-dir", "out"],
    );
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("already exists"));
    assert_eq!(fs::read_dir(&target).unwrap().count(), 1);
}

#[test]
fn dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let out = pkgsmith(tmp.path(), &["new", "ledger", "Ledger", "--no-git", "--dry-run"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).contains("would-write: pyproject.toml"));
    assert!(!tmp.path().join("packages").exists());
}

#[test]
fn on_disk_templates_take_precedence() {
    let tmp = TempDir::new().unwrap();
    let set = tmp.path().join("templates/python-package");
    fs::create_dir_all(&set).unwrap();
    fs::write(
        set.join("manifest.toml"),
        "[[file]]\npath = \"NAME.txt\"\ntemplate = \"name.tmpl\"\n",
    )
    .unwrap();
    fs::write(set.join("name.tmpl"), "{{ module_upper }}\n").unwrap();

    let out = pkgsmith(tmp.path(), &["new", "billing-core", "Billing", "--no-git"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let root = tmp.path().join("packages/billing-core");
    assert_eq!(fs::read_to_string(root.join("NAME.txt")).unwrap(), "BILLING_CORE\n");
    assert!(!root.join("pyproject.toml").exists());
    assert!(root.join("tests/unit").is_dir());
}

#[test]
fn review_exit_code_follows_errors() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("clean.py"), "\"\"\"Constants.\"\"\"\n\nLIMIT = 3\n").unwrap();
    fs::write(tmp.path().join("noisy.py"), "\"\"\"Noisy.\"\"\"\n\nprint(\"debug\")\n").unwrap();

    let ok = pkgsmith(tmp.path(), &["review", "clean.py"]);
    assert!(ok.status.success(), "{}", stdout(&ok));
    assert!(stdout(&ok).contains("review: summary files=1 errors=0 warnings=0"));

    let bad = pkgsmith(tmp.path(), &["review", "clean.py", "noisy.py"]);
    assert_eq!(bad.status.code(), Some(1));
    let text = stdout(&bad);
    assert!(text.contains("noisy.py:3: error [debug/console-output]"));
    assert!(text.contains("review: summary files=2 errors=1 warnings=0"));
}

#[test]
fn review_ignores_other_extensions_and_deleted_files() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("notes.md"), "print(1)\n").unwrap();
    let out = pkgsmith(tmp.path(), &["review", "notes.md", "gone.py"]);
    assert!(out.status.success());
    assert!(stdout(&out).contains("files=0"));
}

#[test]
fn review_json_report() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("settings.py"),
        "\"\"\"Settings.\"\"\"\n\napi_key = \"sk-1234567890abcdefghijklmnop\"\n",
    )
    .unwrap();
    let out = pkgsmith(tmp.path(), &["review", "settings.py", "--format", "json"]);
    assert_eq!(out.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).expect("json report");
    assert_eq!(report["passed"], false);
    assert_eq!(report["errors"], 1);
    assert_eq!(report["violations"][0]["rule"], "hardcoded-secret");
    assert_eq!(report["fingerprint"].as_str().map(str::len), Some(64));
}

#[test]
fn config_file_overrides_limits_and_severity() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("pkgsmith.toml"),
        "[review.severity]\nconsole-output = \"warning\"\n",
    )
    .unwrap();
    fs::write(tmp.path().join("noisy.py"), "\"\"\"Noisy.\"\"\"\n\nprint(\"debug\")\n").unwrap();
    let out = pkgsmith(tmp.path(), &["review", "noisy.py"]);
    assert!(out.status.success(), "{}", stdout(&out));
    assert!(stdout(&out).contains("warning [debug/console-output]"));
}

#[test]
fn broken_config_is_reported() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("custom.toml"), "[review.limits]\nmax_file_lines = \"many\"\n").unwrap();
    let out = pkgsmith(tmp.path(), &["--config", "custom.toml", "review", "x.py"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Configuration error"));
}

#[test]
fn list_roles_in_registry_order() {
    let tmp = TempDir::new().unwrap();
    let out = pkgsmith(tmp.path(), &["review", "--list-roles"]);
    assert!(out.status.success());
    let names: Vec<String> = stdout(&out)
        .lines()
        .filter_map(|l| l.split_whitespace().next().map(str::to_string))
        .collect();
    assert_eq!(
        names,
        vec!["structure", "debug", "tester", "docs", "security", "architecture"]
    );
}

#[test]
fn branch_guard_outside_git_passes() {
    let tmp = TempDir::new().unwrap();
    let out = pkgsmith(tmp.path(), &["branch-guard"]);
    assert!(out.status.success(), "{}", stderr(&out));
}

fn git(dir: &Path, args: &[&str]) -> bool {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[test]
fn branch_guard_refuses_main() {
    let tmp = TempDir::new().unwrap();
    if !git(tmp.path(), &["init", "--initial-branch=main"]) {
        eprintln!("git unavailable; skipping");
        return;
    }
    let out = pkgsmith(tmp.path(), &["branch-guard"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("protected branch 'main'"));

    assert!(git(tmp.path(), &["checkout", "-b", "feature/billing"]));
    let out = pkgsmith(tmp.path(), &["branch-guard"]);
    assert!(out.status.success());
}
