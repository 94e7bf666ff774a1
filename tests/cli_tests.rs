//! CLI Integration Tests for juris
//!
//! Runs the built binary for the init, config and research commands. None of
//! these tests reach the network.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Run the juris binary with arguments inside `working_dir`
fn run_juris(args: &[&str], working_dir: &std::path::Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_juris"))
        .args(args)
        .current_dir(working_dir)
        .env_remove("RUST_LOG")
        .env_remove("OPENAI_API_KEY")
        .env_remove("SERPER_API_KEY")
        .output()
        .expect("Failed to execute command")
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_juris(&["--help"], temp_dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("juris"));
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("research"));
    assert!(stdout.contains("init"));
    assert!(stdout.contains("config"));
}

#[test]
fn test_version_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_juris(&["--version"], temp_dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_research_help_lists_options() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_juris(&["research", "--help"], temp_dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--max-rounds", "--max-searches", "--timeout-ms", "--offline", "--json"] {
        assert!(stdout.contains(flag), "missing {}", flag);
    }
}

// =============================================================================
// Init Command Tests
// =============================================================================

#[test]
fn test_init_creates_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_juris(&["--no-color", "init", "."], temp_dir.path());

    assert!(output.status.success(), "Init command failed: {:?}", output);

    let content = fs::read_to_string(temp_dir.path().join("juris.toml")).expect("Failed to read juris.toml");
    assert!(content.contains("[research]"));
    assert!(content.contains("[llm.provider]"));
    assert!(content.contains("type = \"ollama\""));

    let env = fs::read_to_string(temp_dir.path().join(".env.example")).expect("Failed to read .env.example");
    assert!(env.contains("SERPER_API_KEY"));

    let gitignore = fs::read_to_string(temp_dir.path().join(".gitignore")).expect("Failed to read .gitignore");
    assert!(gitignore.contains(".env"));
}

#[test]
fn test_init_with_openai_and_serper() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_juris(
        &["--no-color", "init", ".", "--provider", "openai", "--search", "serper"],
        temp_dir.path(),
    );
    assert!(output.status.success());

    let content = fs::read_to_string(temp_dir.path().join("juris.toml")).expect("Failed to read juris.toml");
    assert!(content.contains("type = \"openai\""));
    assert!(content.contains("backend = \"serper\""));
}

#[test]
fn test_init_does_not_overwrite_without_force() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("juris.toml"), "# mine").expect("Failed to write");

    let output = run_juris(&["--no-color", "init", "."], temp_dir.path());
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("already exists"));
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("juris.toml")).unwrap(),
        "# mine"
    );

    let output = run_juris(&["--no-color", "init", ".", "--force"], temp_dir.path());
    assert!(output.status.success());
    assert_ne!(
        fs::read_to_string(temp_dir.path().join("juris.toml")).unwrap(),
        "# mine"
    );
}

// =============================================================================
// Config Command Tests
// =============================================================================

#[test]
fn test_config_validate_generated_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    assert!(run_juris(&["--no-color", "init", "."], temp_dir.path()).status.success());

    let output = run_juris(&["--no-color", "config", "--validate"], temp_dir.path());

    assert!(output.status.success(), "config --validate failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration is valid"));
    assert!(stdout.contains("ollama"));
}

#[test]
fn test_config_validate_requires_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_juris(&["--no-color", "config", "--validate"], temp_dir.path());

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("juris.toml"));
}

#[test]
fn test_config_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("juris.toml"), "[research]\nmax_rounds = 0\n").expect("Failed to write");

    let output = run_juris(&["--no-color", "config"], temp_dir.path());

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("max_rounds"));
}

#[test]
fn test_config_full_prints_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_juris(&["--no-color", "config", "--full"], temp_dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("no (using defaults)"));
    assert!(stdout.contains("[stopping.minimum_rounds]"));
}

// =============================================================================
// Research Command Tests
// =============================================================================

#[test]
fn test_research_blank_question_reports_failure_as_json() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_juris(&["research", "   ", "--offline", "--json"], temp_dir.path());

    assert!(!output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(result["success"], false);
    assert_eq!(result["stop_reason"], "error");
    assert_eq!(result["error"], "question is empty");
    assert_eq!(result["metadata"]["decision_policy"], "heuristic");
}

#[test]
fn test_research_requires_llm_key_unless_offline() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    assert!(
        run_juris(&["--no-color", "init", ".", "--provider", "openai"], temp_dir.path())
            .status
            .success()
    );

    let output = run_juris(&["research", "usucapion"], temp_dir.path());

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("OPENAI_API_KEY"));
}
