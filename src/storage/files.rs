/// File-per-flow storage
///
/// Each flow lives in `<dir>/<name>.json`. Writes go to a sibling temporary
/// file first and are renamed into place, so readers never see a half-written
/// document.

use crate::storage::{FlowNotFound, FlowStore};
use anyhow::{anyhow, Context, Result};
use std::io::ErrorKind;
use std::path::PathBuf;

const EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        check_name(name)?;
        Ok(self.dir.join(format!("{}.{}", name, EXTENSION)))
    }
}

/// Reject names that would escape the flows directory or hide the file
fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(anyhow!("Invalid flow name '{}'", name));
    }
    Ok(())
}

impl FlowStore for FileStore {
    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read flows directory '{}'", self.dir.display())
                })
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if check_name(stem).is_ok() => names.push(stem.to_string()),
                _ => {}
            }
        }
        names.sort();

        Ok(names)
    }

    async fn read(&self, name: &str) -> Result<String> {
        let path = self.path_for(name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FlowNotFound(name.to_string()).into()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read flow '{}' from {}", name, path.display())),
        }
    }

    async fn write(&self, name: &str, text: &str) -> Result<()> {
        let path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.dir).await.with_context(|| {
            format!("Failed to create flows directory '{}'", self.dir.display())
        })?;

        let tmp = self.dir.join(format!(".{}.{}.tmp", name, EXTENSION));
        tokio::fs::write(&tmp, text)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to move flow '{}' into place", name))?;

        tracing::debug!("Wrote flow '{}' ({} bytes)", name, text.len());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete flow '{}'", name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_directory_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("not-there"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_sorted_and_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.write("zeta", "{}").await.unwrap();
        store.write("alpha", "{}").await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(store.list().await.unwrap(), ["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn write_replaces_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.write("flow", r#"{"process":{"nodes":[1,2,3]}}"#).await.unwrap();
        store.write("flow", "{}").await.unwrap();

        assert_eq!(store.read("flow").await.unwrap(), "{}");
        // no temporary file left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn read_missing_flow_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let err = store.read("ghost").await.unwrap_err();
        assert!(err.is::<FlowNotFound>());
    }

    #[tokio::test]
    async fn delete_absent_flow_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.delete("ghost").await.unwrap();

        store.write("real", "{}").await.unwrap();
        store.delete("real").await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_names_outside_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("flows"));
        for name in ["../escape", "a/b", "a\\b", ".hidden", ""] {
            assert!(store.write(name, "{}").await.is_err(), "{name}");
            assert!(store.read(name).await.is_err(), "{name}");
        }
        assert!(!dir.path().join("escape.json").exists());
    }
}
