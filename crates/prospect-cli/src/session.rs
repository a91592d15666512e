// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use prospect_app::SessionStore;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::APP_NAME;

/// Key/value session state kept as a JSON object in the user cache directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// One file per launching shell, so a new terminal starts from the
    /// configured mode.
    pub fn default_path() -> Result<PathBuf> {
        let cache_root = dirs::cache_dir()
            .ok_or_else(|| anyhow!("cannot resolve cache directory for session state"))?;
        Ok(cache_root.join(APP_NAME).join(session_file_name(shell_session_id())))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read session file {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("decode session file {}", self.path.display()))
    }
}

fn session_file_name(session_id: Option<u32>) -> String {
    match session_id {
        Some(id) => format!("session-{id}.json"),
        None => "session.json".to_owned(),
    }
}

#[cfg(unix)]
fn shell_session_id() -> Option<u32> {
    Some(std::os::unix::process::parent_id())
}

#[cfg(not(unix))]
fn shell_session_id() -> Option<u32> {
    None
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut values = self.read_all().unwrap_or_default();
        values.insert(key.to_owned(), value.to_owned());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create session directory {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(&values).context("encode session state")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("write session file {}", self.path.display()))
    }
}
