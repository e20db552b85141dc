mod common;

use common::assertions::{batch_failed, forbidden_pattern};
use common::fixtures::{approved_patch, scan_report, TEN_LINE_FILE};
use common::workspace::{create_file, setup_workspace, write_payload};
use assert_cmd::prelude::*;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;

#[test]
fn test_validate_accepts_safe_patch() -> anyhow::Result<()> {
    let ws = setup_workspace()?;
    create_file(ws.root(), "app.py", TEN_LINE_FILE)?;
    let payload = write_payload(&ws, &approved_patch("app.py", 3, 4, "x = safe_call()"))?;

    ws.command()?
        .arg("validate")
        .arg(&payload)
        .assert()
        .success()
        .stdout(predicate::str::contains("passes"))
        .stdout(predicate::str::contains("All 1 patch(es) pass"));

    assert_eq!(ws.read("app.py")?, TEN_LINE_FILE);
    Ok(())
}

#[test]
fn test_validate_rejects_forbidden_pattern() -> anyhow::Result<()> {
    let ws = setup_workspace()?;
    create_file(ws.root(), "app.py", TEN_LINE_FILE)?;
    let payload = write_payload(&ws, &approved_patch("app.py", 3, 4, "result = eval(data)"))?;

    ws.command()?
        .arg("validate")
        .arg(&payload)
        .assert()
        .failure()
        .stdout(predicate::str::contains("rejected"))
        .stdout(forbidden_pattern("eval("))
        .stdout(batch_failed(1, 1));
    Ok(())
}

#[test]
fn test_validate_rejects_traversal() -> anyhow::Result<()> {
    let ws = setup_workspace()?;
    create_file(ws.temp_dir.path(), "outside.py", TEN_LINE_FILE)?;
    let payload = write_payload(&ws, &approved_patch("../outside.py", 1, 1, "pass"))?;

    ws.command()?
        .arg("validate")
        .arg(&payload)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Path traversal detected"));
    Ok(())
}

#[test]
fn test_validate_reports_each_patch_of_scan_report() -> anyhow::Result<()> {
    let ws = setup_workspace()?;
    create_file(ws.root(), "app.py", TEN_LINE_FILE)?;
    let mut pending = approved_patch("app.py", 1, 1, "pass");
    pending["status"] = json!("pending");
    let report = scan_report(vec![approved_patch("app.py", 1, 1, "pass"), pending]);
    let payload = write_payload(&ws, &report)?;

    ws.command()?
        .arg("validate")
        .arg(&payload)
        .assert()
        .failure()
        .stdout(predicate::str::contains("[1] PY-SEC-001"))
        .stdout(predicate::str::contains(r#"Patch status is "pending""#))
        .stdout(batch_failed(1, 2));
    Ok(())
}

#[test]
fn test_validate_rejects_malformed_payload_file() -> anyhow::Result<()> {
    let ws = setup_workspace()?;
    let payload = ws.temp_dir.path().join("payload.json");
    std::fs::write(&payload, "{ not json")?;

    ws.command()?
        .arg("validate")
        .arg(&payload)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Malformed patch payload"));
    Ok(())
}

#[test]
fn test_validate_detects_stale_file_after_baseline() -> anyhow::Result<()> {
    let ws = setup_workspace()?;
    create_file(ws.root(), "app.py", TEN_LINE_FILE)?;

    ws.command()?.arg("baseline").arg("app.py").assert().success();
    create_file(ws.root(), "app.py", "changed\n")?;

    let payload = write_payload(&ws, &approved_patch("app.py", 1, 1, "pass"))?;
    ws.command()?
        .arg("validate")
        .arg(&payload)
        .assert()
        .failure()
        .stdout(predicate::str::contains("hash mismatch"));
    Ok(())
}

#[test]
fn test_missing_workspace_fails() -> anyhow::Result<()> {
    let ws = setup_workspace()?;
    let payload = write_payload(&ws, &approved_patch("app.py", 1, 1, "pass"))?;

    Command::cargo_bin("patch-warden")?
        .arg("--workspace")
        .arg(ws.temp_dir.path().join("missing"))
        .arg("validate")
        .arg(&payload)
        .env("XDG_CONFIG_HOME", &ws.config_home)
        .env("XDG_CACHE_HOME", &ws.cache_home)
        .env("NO_COLOR", "1")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Workspace directory does not exist"));
    Ok(())
}
