use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::{tempdir, TempDir};

const SAMPLE: &str = "Связаться: 8 900 123 45 67\n\
                      Повтор: +7 (900) 123-45-67\n\
                      Другой: 8-901-0000000\n";

fn write_input(dir: &TempDir, content: &str) -> Result<std::path::PathBuf> {
    let path = dir.path().join("input.txt");
    fs::write(&path, content)?;
    Ok(path)
}

#[test]
fn test_extract_to_stdout() -> Result<()> {
    let dir = tempdir()?;
    let input = write_input(&dir, SAMPLE)?;

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args(["extract", "-i", input.to_str().unwrap()]);

    cmd.assert()
        .success()
        .stdout("+7(900)123-45-67\n+7(901)000-00-00\n");
    Ok(())
}

#[test]
fn test_extract_to_file() -> Result<()> {
    let dir = tempdir()?;
    let input = write_input(&dir, SAMPLE)?;
    let output = dir.path().join("out").join("numbers.txt");

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args([
        "extract",
        "-i",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-w",
        "2",
    ]);

    cmd.assert().success().stdout(predicate::str::is_empty());
    assert_eq!(
        fs::read_to_string(&output)?,
        "+7(900)123-45-67\n+7(901)000-00-00\n"
    );
    Ok(())
}

#[test]
fn test_small_blocks_give_same_result() -> Result<()> {
    let dir = tempdir()?;
    let input = write_input(&dir, SAMPLE)?;

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args([
        "extract",
        "-i",
        input.to_str().unwrap(),
        "--block-size",
        "40",
        "-w",
        "3",
    ]);

    cmd.assert()
        .success()
        .stdout("+7(900)123-45-67\n+7(901)000-00-00\n");
    Ok(())
}

#[test]
fn test_missing_input_fails() -> Result<()> {
    let dir = tempdir()?;
    let missing = dir.path().join("absent.txt");

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args(["extract", "-i", missing.to_str().unwrap()]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
    Ok(())
}

#[test]
fn test_zero_workers_rejected() -> Result<()> {
    let dir = tempdir()?;
    let input = write_input(&dir, SAMPLE)?;

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args(["extract", "-i", input.to_str().unwrap(), "-w", "0"]);

    cmd.assert().failure();
    Ok(())
}

#[test]
fn test_stats_only() -> Result<()> {
    let dir = tempdir()?;
    let input = write_input(&dir, SAMPLE)?;

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args(["extract", "-i", input.to_str().unwrap(), "--stats"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Found 2 unique numbers (3 matches)"))
        .stdout(predicate::str::contains("+7(900)").not());
    Ok(())
}

#[test]
fn test_json_output() -> Result<()> {
    let dir = tempdir()?;
    let input = write_input(&dir, SAMPLE)?;

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args(["extract", "-i", input.to_str().unwrap(), "--format", "json"]);

    let assert = cmd.assert().success();
    let parsed: Vec<String> = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(parsed, vec!["+7(900)123-45-67", "+7(901)000-00-00"]);
    Ok(())
}

#[test]
fn test_json_stats() -> Result<()> {
    let dir = tempdir()?;
    let input = write_input(&dir, SAMPLE)?;

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args([
        "extract",
        "-i",
        input.to_str().unwrap(),
        "--stats",
        "--format",
        "json",
    ]);

    let assert = cmd.assert().success();
    let stats: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(stats["unique_numbers"], 2);
    assert_eq!(stats["raw_matches"], 3);
    assert_eq!(stats["blocks_skipped"], 0);
    Ok(())
}

#[test]
fn test_no_numbers_gives_empty_output() -> Result<()> {
    let dir = tempdir()?;
    let input = write_input(&dir, "nothing to see here\nстрока без цифр\n")?;

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args(["extract", "-i", input.to_str().unwrap()]);

    cmd.assert().success().stdout(predicate::str::is_empty());
    Ok(())
}

#[test]
fn test_config_file_sets_format() -> Result<()> {
    let dir = tempdir()?;
    let input = write_input(&dir, SAMPLE)?;
    let config = dir.path().join("config.yaml");
    fs::write(&config, "output_format: \"json\"\nworker_count: 2\n")?;

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args([
        "extract",
        "-i",
        input.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);

    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("["));
    Ok(())
}

#[test]
fn test_missing_config_file_fails() -> Result<()> {
    let dir = tempdir()?;
    let input = write_input(&dir, SAMPLE)?;
    let config = dir.path().join("nope.yaml");

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args([
        "extract",
        "-i",
        input.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
    Ok(())
}

#[test]
fn test_generate_then_extract() -> Result<()> {
    let dir = tempdir()?;
    let generated = dir.path().join("generated.txt");

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args([
        "generate",
        "-o",
        generated.to_str().unwrap(),
        "-s",
        "1",
        "--seed",
        "11",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Generated file"));
    assert!(fs::metadata(&generated)?.len() >= 1024 * 1024);

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args([
        "extract",
        "-i",
        generated.to_str().unwrap(),
        "--block-size",
        "4096",
    ]);
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(!lines.is_empty());
    assert!(lines.iter().all(|l| l.starts_with("+7(") && l.len() == 16));

    let mut unique = lines.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), lines.len());
    Ok(())
}

#[test]
fn test_verbose_logs_to_stderr() -> Result<()> {
    let dir = tempdir()?;
    let input = write_input(&dir, SAMPLE)?;

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.env_remove("RUST_LOG")
        .args(["extract", "-i", input.to_str().unwrap(), "-v"]);

    cmd.assert()
        .success()
        .stdout("+7(900)123-45-67\n+7(901)000-00-00\n")
        .stderr(predicate::str::contains("configuration resolved"));
    Ok(())
}

#[test]
fn test_huge_block_size_rejected() -> Result<()> {
    let dir = tempdir()?;
    let input = write_input(&dir, SAMPLE)?;

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args([
        "extract",
        "-i",
        input.to_str().unwrap(),
        "--block-size",
        &usize::MAX.to_string(),
    ]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("block_size must not exceed"));
    Ok(())
}

#[test]
fn test_huge_generate_size_rejected() -> Result<()> {
    let dir = tempdir()?;
    let generated = dir.path().join("huge.txt");

    let mut cmd = Command::cargo_bin("phonescout-cli")?;
    cmd.args([
        "generate",
        "-o",
        generated.to_str().unwrap(),
        "-s",
        &u64::MAX.to_string(),
    ]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("too large"));
    assert!(!generated.exists());
    Ok(())
}
