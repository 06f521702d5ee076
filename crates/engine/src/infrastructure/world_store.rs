//! JSON file storage for world documents.
//!
//! Layout under the save directory:
//! - `<world>.json` - the world runtime document
//! - `<player>/<world>.json` - the player's save slot, written alongside it

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dungeonforge_domain::{WorldRuntime, SCHEMA_VERSION};

use crate::infrastructure::ports::{PersistenceError, WorldRepo};

pub struct JsonWorldStore {
    root: PathBuf,
}

impl JsonWorldStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn world_path(&self, world_name: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_stem(world_name)))
    }

    pub fn player_slot_path(&self, player_name: &str, world_name: &str) -> PathBuf {
        self.root
            .join(file_stem(player_name))
            .join(format!("{}.json", file_stem(world_name)))
    }

    async fn write_document(path: &Path, world: &WorldRuntime) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PersistenceError::io("create_dir", e))?;
        }
        let json = serde_json::to_vec_pretty(world).map_err(PersistenceError::serialization)?;

        // Write then rename so a crash mid-save never leaves a truncated document.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| PersistenceError::io("write", e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| PersistenceError::io("rename", e))?;
        Ok(())
    }
}

/// Names are authored text; keep them filesystem-safe.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl WorldRepo for JsonWorldStore {
    async fn load_world(&self, world_name: &str) -> Result<Option<WorldRuntime>, PersistenceError> {
        let path = self.world_path(world_name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistenceError::io("read", e)),
        };

        // Check the version before the full schema so an old document reports
        // the version mismatch rather than a field error.
        let raw: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(PersistenceError::serialization)?;
        let found = raw
            .get("version")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        if found != SCHEMA_VERSION {
            return Err(PersistenceError::IncompatibleVersion {
                found: found.to_string(),
                expected: SCHEMA_VERSION.to_string(),
            });
        }

        let world: WorldRuntime =
            serde_json::from_value(raw).map_err(PersistenceError::serialization)?;
        tracing::debug!(path = %path.display(), "Loaded world document");
        Ok(Some(world))
    }

    async fn save_world(&self, world: &WorldRuntime) -> Result<(), PersistenceError> {
        let path = self.world_path(&world.boot.name);
        Self::write_document(&path, world).await?;
        tracing::debug!(path = %path.display(), "Saved world document");
        Ok(())
    }

    async fn save_player_slot(
        &self,
        player_name: &str,
        world: &WorldRuntime,
    ) -> Result<(), PersistenceError> {
        let path = self.player_slot_path(player_name, &world.boot.name);
        Self::write_document(&path, world).await
    }
}
