mod common;
mod utils;

use anyhow::Result;
use common::TestEnvironment;

const MANIFEST: &str = "\
#TAG,NAME IN REPO (or git url),PURPOSE (should be a verb phrase to complete the sentence)
,xorg-server,\"is the graphical server.\"
A,htop-vim,\"is a task manager, with vim keys.\"
G,https://example.com/dwm.git,\"is the window manager.\"
P,ueberzug,enables image previews
X,zsh,is the default shell
";

#[test]
fn test_plan_json_lists_entries_in_order() -> Result<()> {
    let env = TestEnvironment::new()?;
    let manifest = env.write_manifest(MANIFEST)?;

    let output = utils::run_riceup_command(
        &env,
        &["--output", "json", "plan", "--manifest", manifest.to_str().unwrap()],
    )?;
    assert_eq!(output.exit_code, 0, "plan failed: {}", output.stderr);

    let entries = utils::events_with_code(&output.stdout, "plan.entry");
    assert_eq!(entries.len(), 5);

    let tags: Vec<_> = entries.iter().map(|e| e["data"]["tag"].as_str().unwrap()).collect();
    assert_eq!(tags, vec!["repository", "aur", "source", "pip", "repository"]);

    assert_eq!(entries[0]["data"]["note"], "is the graphical server.");
    assert_eq!(entries[1]["data"]["note"], "is a task manager, with vim keys.");
    assert_eq!(entries[1]["data"]["source"], "from the AUR");
    assert_eq!(entries[2]["data"]["identifier"], "https://example.com/dwm.git");
    assert_eq!(entries[3]["data"]["note"], "enables image previews");
    assert_eq!(entries[4]["data"]["index"], 5);
    assert_eq!(entries[4]["data"]["total"], 5);

    Ok(())
}

#[test]
fn test_plan_text_shows_table() -> Result<()> {
    let env = TestEnvironment::new()?;
    let manifest = env.write_manifest(MANIFEST)?;

    let args = ["plan", "--manifest", manifest.to_str().unwrap()];
    let output = utils::run_riceup_command(&env, &args)?;
    assert_eq!(output.exit_code, 0, "plan failed: {}", output.stderr);
    assert!(output.stdout.contains("htop-vim"));
    assert!(output.stdout.contains("5 entries"));

    Ok(())
}

#[test]
fn test_missing_manifest_exits_non_zero() -> Result<()> {
    let env = TestEnvironment::new()?;
    let missing = env.path().join("missing.csv");

    let args = ["plan", "--manifest", missing.to_str().unwrap()];
    let output = utils::run_riceup_command(&env, &args)?;
    assert_eq!(output.exit_code, 1);
    assert!(
        output.stderr.contains("manifest stage failed"),
        "unexpected stderr: {}",
        output.stderr
    );

    Ok(())
}

#[test]
fn test_install_unknown_user_exits_non_zero() -> Result<()> {
    let env = TestEnvironment::new()?;
    let manifest = env.write_manifest(MANIFEST)?;

    let output = utils::run_riceup_command(
        &env,
        &[
            "install",
            "--dry-run",
            "--user",
            "no-such-user-riceup-e2e",
            "--manifest",
            manifest.to_str().unwrap(),
        ],
    )?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("user stage failed"), "unexpected stderr: {}", output.stderr);

    Ok(())
}

#[test]
fn test_dry_run_install_stops_at_missing_manifest() -> Result<()> {
    let env = TestEnvironment::new()?;
    let user = env.current_user()?;
    let missing = env.path().join("missing.csv");

    let output = utils::run_riceup_command(
        &env,
        &[
            "--output",
            "json",
            "install",
            "--dry-run",
            "--user",
            &user,
            "--manifest",
            missing.to_str().unwrap(),
        ],
    )?;
    assert_eq!(output.exit_code, 1);
    assert!(utils::events_with_code(&output.stdout, "provision.entry.start").is_empty());
    assert!(output.stderr.contains("manifest stage failed"));

    Ok(())
}
