//! Where version scripts come from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::ledger::checksum;
use super::Direction;
use crate::error::{Result, SqlWeaveError};

/// Forward and backward SQL of one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionScript {
    pub id: i64,
    pub name: String,
    pub up: String,
    /// Versions without a down script cannot be reverted.
    pub down: Option<String>,
}

impl VersionScript {
    pub fn new(id: i64, name: impl Into<String>, up: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            up: up.into(),
            down: None,
        }
    }

    pub fn with_down(mut self, down: impl Into<String>) -> Self {
        self.down = Some(down.into());
        self
    }

    /// Script body for `direction`.
    pub fn body(&self, direction: Direction) -> Option<&str> {
        match direction {
            Direction::Up => Some(&self.up),
            Direction::Down => self.down.as_deref(),
        }
    }

    /// Checksum recorded in the ledger.
    pub fn checksum(&self) -> String {
        checksum(&self.up)
    }
}

/// Producer of version scripts.
#[async_trait]
pub trait ScriptSource: Send + Sync {
    /// Every known version, ascending by id.
    async fn scripts(&self) -> Result<Vec<VersionScript>>;

    /// The script of one version.
    async fn script(&self, id: i64) -> Result<Option<VersionScript>> {
        Ok(self.scripts().await?.into_iter().find(|s| s.id == id))
    }

    /// Source type name for logging.
    fn source_type(&self) -> &'static str;
}

/// Scripts held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScriptSource {
    scripts: BTreeMap<i64, VersionScript>,
}

impl InMemoryScriptSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a script, replacing any script with the same id.
    pub fn with_script(mut self, script: VersionScript) -> Self {
        self.scripts.insert(script.id, script);
        self
    }
}

#[async_trait]
impl ScriptSource for InMemoryScriptSource {
    async fn scripts(&self) -> Result<Vec<VersionScript>> {
        Ok(self.scripts.values().cloned().collect())
    }

    async fn script(&self, id: i64) -> Result<Option<VersionScript>> {
        Ok(self.scripts.get(&id).cloned())
    }

    fn source_type(&self) -> &'static str {
        "in-memory"
    }
}

/// Scripts read from `<id>_<name>.up.sql` and `<id>_<name>.down.sql` files
/// in one directory. Other files are ignored.
#[derive(Debug, Clone)]
pub struct DirectoryScriptSource {
    dir: PathBuf,
}

impl DirectoryScriptSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Split `12_add_users.up.sql` into (12, "add_users", Up).
fn parse_file_name(file_name: &str) -> Option<(i64, &str, Direction)> {
    let (stem, direction) = if let Some(stem) = file_name.strip_suffix(".up.sql") {
        (stem, Direction::Up)
    } else if let Some(stem) = file_name.strip_suffix(".down.sql") {
        (stem, Direction::Down)
    } else {
        return None;
    };
    let (id, name) = match stem.split_once('_') {
        Some((id, name)) => (id, name),
        None => (stem, ""),
    };
    let id = id.parse::<i64>().ok()?;
    Some((id, name, direction))
}

#[async_trait]
impl ScriptSource for DirectoryScriptSource {
    async fn scripts(&self) -> Result<Vec<VersionScript>> {
        let mut ups: BTreeMap<i64, (String, String)> = BTreeMap::new();
        let mut downs: BTreeMap<i64, String> = BTreeMap::new();

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some((id, name, direction)) = parse_file_name(file_name) else {
                debug!("Skipping {} in {}", file_name, self.dir.display());
                continue;
            };
            let body = tokio::fs::read_to_string(entry.path()).await?;
            let duplicate = match direction {
                Direction::Up => ups.insert(id, (name.to_string(), body)).is_some(),
                Direction::Down => downs.insert(id, body).is_some(),
            };
            if duplicate {
                return Err(SqlWeaveError::Config(format!(
                    "Version {} has more than one {} script in {}",
                    id,
                    direction,
                    self.dir.display()
                )));
            }
        }

        for id in downs.keys().filter(|id| !ups.contains_key(id)) {
            warn!("Version {} has a down script but no up script, ignored", id);
        }

        let scripts: Vec<VersionScript> = ups
            .into_iter()
            .map(|(id, (name, up))| VersionScript {
                id,
                name,
                up,
                down: downs.remove(&id),
            })
            .collect();
        debug!(
            "Read {} version scripts from {}",
            scripts.len(),
            self.dir.display()
        );
        Ok(scripts)
    }

    fn source_type(&self) -> &'static str {
        "directory"
    }
}
