use assert_cmd::cargo::cargo_bin_cmd;

fn stdout_of(args: &[&str]) -> String {
    let assert = cargo_bin_cmd!("elm-dedup").args(args).assert().success();
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

#[test]
fn env_render_emits_devenv_module() {
    let output = stdout_of(&["env", "render"]);
    assert!(output.contains("pkgs.elmPackages.elm-test-rs"), "got {output}");
    assert!(output.contains("languages.rust.enable = true;"), "got {output}");
}

#[test]
fn env_render_json_is_stable() {
    let first = stdout_of(&["env", "render", "--format", "json"]);
    let second = stdout_of(&["env", "render", "--format", "json"]);
    assert_eq!(first, second);
    assert!(first.contains("\"toolchains\""));
}

#[test]
fn sandbox_render_emits_fhs_env() {
    let output = stdout_of(&["sandbox", "render"]);
    assert!(output.contains("buildFHSEnv"), "got {output}");
    assert!(output.contains("extraOutputsToInstall = [ \"dev\" ];"), "got {output}");
    assert!(output.contains("RUST_SRC_PATH"), "got {output}");
}

#[test]
fn sandbox_check_prints_digest() {
    let output = stdout_of(&["sandbox", "check"]);
    let digest = output.lines().find_map(|l| l.strip_prefix("digest "));
    assert!(digest.is_some_and(|d| d.len() == 64), "got {output}");
}

#[test]
fn sandbox_from_spec_file_renders_members() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let spec = dir.path().join("sandbox.json");
    std::fs::write(
        &spec,
        r#"{"name":"demo","target_packages":["a","b","a"],"extra_outputs":["dev"]}"#,
    )
    .unwrap_or_else(|e| panic!("write: {e}"));
    let output = stdout_of(&["sandbox", "render", "--format", "json", "--spec", &spec.display().to_string()]);
    assert_eq!(output.matches("\"package\"").count(), 2, "duplicates collapse: {output}");
}

#[test]
fn malformed_spec_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let spec = dir.path().join("env.json");
    std::fs::write(&spec, r#"{"packages":["not valid!"]}"#).unwrap_or_else(|e| panic!("write: {e}"));
    cargo_bin_cmd!("elm-dedup")
        .args(["env", "render", "--spec", &spec.display().to_string()])
        .assert()
        .code(2);
}

#[test]
fn missing_spec_is_a_usage_error() {
    cargo_bin_cmd!("elm-dedup")
        .args(["sandbox", "render", "--spec", "/nonexistent/sandbox.json"])
        .assert()
        .code(2);
}

#[test]
fn sandbox_enter_dry_run_prints_nix_shell_command() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let output = stdout_of(&[
        "sandbox",
        "enter",
        "--dry-run",
        "--state-dir",
        &dir.path().display().to_string(),
    ]);
    assert!(output.contains("nix-shell"), "got {output}");
    assert!(dir.path().join("elm-dedup-project.nix").is_file());
}

#[test]
fn sandbox_enter_dry_run_with_default_state_dir_uses_absolute_path() {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let assert = cargo_bin_cmd!("elm-dedup")
        .current_dir(dir.path())
        .env_remove("ELM_DEDUP_STATE_DIR")
        .args(["sandbox", "enter", "--dry-run"])
        .assert()
        .success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();

    let state_dir = std::fs::canonicalize(dir.path().join(".elm-dedup"))
        .unwrap_or_else(|e| panic!("state dir: {e}"));
    let expression = state_dir.join("elm-dedup-project.nix");
    assert!(expression.is_file());
    assert!(output.contains(&expression.display().to_string()), "got {output}");
    assert!(!output.contains(".elm-dedup/.elm-dedup"), "got {output}");
}
