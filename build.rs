use std::env;
use std::fs;
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, TimeZone, Utc};
use vergen_gitcl::{Emitter, GitclBuilder};

const LIBRARY: &str = "mpegbound";
const LIBRARY_MANIFEST: &str = "mpegbound/Cargo.toml";

fn main() -> Result<()> {
    emit_git_describe()?;

    let built = build_time().format("%Y-%m-%d %H:%M:%S UTC");
    println!("cargo:rustc-env=BUILD_TIMESTAMP={built}");

    let version = library_version()
        .or_else(|_| manifest_version())
        .unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=MPEGBOUND_VERSION={version}");

    println!("cargo:rerun-if-changed={LIBRARY_MANIFEST}");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    Ok(())
}

/// Emits `VERGEN_GIT_DESCRIBE`, or the idempotent defaults outside a git checkout.
fn emit_git_describe() -> Result<()> {
    let gitcl = GitclBuilder::default()
        .describe(true, true, Some("[0-9]*"))
        .build()?;

    let emitted = Emitter::default()
        .idempotent()
        .fail_on_error()
        .add_instructions(&gitcl)
        .and_then(|emitter| emitter.emit());

    if let Err(e) = emitted {
        println!("cargo:warning=git describe unavailable: {e}");
        Emitter::default().idempotent().fail_on_error().emit()?;
    }
    Ok(())
}

fn build_time() -> DateTime<Utc> {
    env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|val| val.parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .unwrap_or_else(Utc::now)
}

fn library_version() -> Result<String> {
    let output = Command::new(env::var("CARGO").unwrap_or_else(|_| "cargo".into()))
        .args(["metadata", "--format-version", "1", "--no-deps"])
        .output()
        .context("running cargo metadata")?;
    anyhow::ensure!(output.status.success(), "cargo metadata failed");

    let metadata: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    metadata["packages"]
        .as_array()
        .and_then(|packages| packages.iter().find(|p| p["name"] == LIBRARY))
        .and_then(|package| package["version"].as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{LIBRARY} missing from cargo metadata"))
}

fn manifest_version() -> Result<String> {
    let manifest = fs::read_to_string(LIBRARY_MANIFEST)?;

    manifest
        .lines()
        .filter_map(|line| line.trim().strip_prefix("version"))
        .filter_map(|rest| rest.trim_start().strip_prefix('='))
        .map(|value| value.trim().trim_matches('"').to_string())
        .next()
        .ok_or_else(|| anyhow!("no version in {LIBRARY_MANIFEST}"))
}
