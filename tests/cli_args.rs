//! Integration tests for CLI argument handling
//!
//! Tests mode parsing, API key validation, and a session driven through stdin.

use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Helper to run the CLI with given args and stdin, without API keys in the environment
fn run_cli(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_menufinder"))
        .args(args)
        .env_remove("YELP_API_KEY")
        .env_remove("MAPQUEST_API_KEY")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute menufinder");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");

    child.wait_with_output().expect("Failed to wait for menufinder")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"], "");
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("menufinder"), "Help should mention menufinder");
    assert!(stdout.contains("--mode"), "Help should mention --mode");
    assert!(stdout.contains("YELP_API_KEY"), "Help should mention the key variable");
}

#[test]
fn test_missing_api_key_prints_error_and_exits() {
    let output = run_cli(&[], "");
    assert!(!output.status.success(), "Expected a missing key to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("YELP_API_KEY"),
        "Should explain how to provide the key: {}",
        stderr
    );
}

#[test]
fn test_invalid_mode_prints_error_and_exits() {
    let output = run_cli(&["--mode", "turbo", "--yelp-api-key", "k"], "");
    assert!(!output.status.success(), "Expected invalid mode to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid mode"), "Unexpected stderr: {}", stderr);
}

#[test]
fn test_exit_ends_session_without_network() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let cache_file = temp_dir.path().join("cache.json");
    let output = run_cli(
        &[
            "--yelp-api-key",
            "k",
            "--cache-file",
            cache_file.to_str().unwrap(),
            "--no-browser",
        ],
        "exit\n",
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Please enter a Zip Code"));
    assert!(stdout.contains("Bye!"));
    assert!(!cache_file.exists(), "Nothing should have been cached");
}

#[test]
fn test_piped_logs_have_no_color_codes() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let cache_file = temp_dir.path().join("cache.json");
    let output = run_cli(
        &[
            "--yelp-api-key",
            "k",
            "--cache-file",
            cache_file.to_str().unwrap(),
            "--no-browser",
            "--verbose",
        ],
        "exit\n",
    );

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("starting"), "Expected debug logs: {}", stderr);
    assert!(!stderr.contains('\x1b'), "Unexpected escape codes: {:?}", stderr);
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use menufinder::cli::{parse_mode_arg, Cli, StartupConfig};
    use menufinder::data::SearchMode;

    #[test]
    fn test_cli_mode_defaults_to_basic() {
        let cli = Cli::parse_from(["menufinder", "--yelp-api-key", "k"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.mode, SearchMode::Basic);
    }

    #[test]
    fn test_cli_enhanced_mode() {
        let cli = Cli::parse_from(["menufinder", "--mode", "enhanced", "--yelp-api-key", "k"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.mode, SearchMode::Enhanced);
        assert_eq!(config.mode.display_count(), 10);
    }

    #[test]
    fn test_parse_mode_arg_is_case_insensitive() {
        assert_eq!(parse_mode_arg("BASIC").unwrap(), SearchMode::Basic);
    }
}
