use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::Level;
use serde::Deserialize;

use crate::cli::command::Cli;
use mpegbound::process::OpenOptions;
use mpegbound::structs::policy::TagCreationPolicy;

/// Tag creation switches as stored in a policy file.
///
/// ```yaml
/// create_id3v1: false
/// create_id3v2: true
/// ```
///
/// Missing keys keep the library default.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PolicyFile {
    pub create_id3v1: Option<bool>,
    pub create_id3v2: Option<bool>,
}

impl PolicyFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading policy file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing policy file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(text)?)
    }

    pub fn apply(&self, policy: &mut TagCreationPolicy) {
        if let Some(create) = self.create_id3v1 {
            policy.set_create_id3v1(create);
        }
        if let Some(create) = self.create_id3v2 {
            policy.set_create_id3v2(create);
        }
    }
}

/// Builds the per-open options from the global flags.
///
/// Precedence: library defaults, then the policy file, then `--no-id3v1` /
/// `--no-id3v2`.
pub fn open_options(cli: &Cli) -> Result<OpenOptions> {
    let mut policy = TagCreationPolicy::default();

    if let Some(path) = &cli.policy {
        PolicyFile::load(path)?.apply(&mut policy);
    }
    if cli.no_id3v1 {
        policy.set_create_id3v1(false);
    }
    if cli.no_id3v2 {
        policy.set_create_id3v2(false);
    }

    match policy.create_tags() {
        Ok(create) => log::debug!("Tag creation policy: create = {create}"),
        Err(e) => log::debug!("Tag creation policy: {e}"),
    }

    Ok(OpenOptions {
        read_style: cli.read_style.into(),
        policy,
        fail_level: if cli.strict { Level::Warn } else { Level::Error },
    })
}
