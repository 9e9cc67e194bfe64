use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sqlmill_core::{MigrationError, Result, Script};
use tracing::debug;
use walkdir::WalkDir;

use crate::layout::MigrationsFolder;

/// Supplies the scripts of one folder, sorted by name.
pub trait ScriptSource {
    fn scripts(&self, folder: &MigrationsFolder) -> Result<Vec<Script>>;
}

/// `*.sql` files under `<root>/<folder_name>`, recursively. A script's name
/// is its path relative to the folder with `/` separators.
#[derive(Debug, Clone)]
pub struct DiskScripts {
    root: PathBuf,
}

impl DiskScripts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DiskScripts { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_sql(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("sql"))
}

impl ScriptSource for DiskScripts {
    fn scripts(&self, folder: &MigrationsFolder) -> Result<Vec<Script>> {
        let dir = self.root.join(&folder.folder_name);
        if !dir.is_dir() {
            debug!(folder = %folder.kind, path = %dir.display(), "folder not present");
            return Ok(Vec::new());
        }
        let mut scripts = Vec::new();
        for entry in WalkDir::new(&dir).follow_links(true) {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
                MigrationError::Io { path, source: e.into() }
            })?;
            if !entry.file_type().is_file() || !is_sql(entry.path()) {
                continue;
            }
            let path = entry.path().to_path_buf();
            let text = std::fs::read_to_string(&path).map_err(|source| MigrationError::Io { path: path.clone(), source })?;
            let relative = path.strip_prefix(&dir).unwrap_or(&path);
            let name = relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
            scripts.push(Script::new(name, path, text));
        }
        scripts.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(folder = %folder.kind, count = scripts.len(), "scripts read");
        Ok(scripts)
    }
}

/// Scripts held in memory, keyed by folder name.
#[derive(Debug, Clone, Default)]
pub struct MemoryScripts {
    folders: BTreeMap<String, BTreeMap<String, String>>,
}

impl MemoryScripts {
    pub fn new() -> Self {
        MemoryScripts::default()
    }

    pub fn with(mut self, folder_name: &str, script_name: &str, text: &str) -> Self {
        self.insert(folder_name, script_name, text);
        self
    }

    /// Adds or replaces a script.
    pub fn insert(&mut self, folder_name: &str, script_name: &str, text: &str) {
        self.folders.entry(folder_name.to_string()).or_default().insert(script_name.to_string(), text.to_string());
    }
}

impl ScriptSource for MemoryScripts {
    fn scripts(&self, folder: &MigrationsFolder) -> Result<Vec<Script>> {
        let Some(scripts) = self.folders.get(&folder.folder_name) else {
            return Ok(Vec::new());
        };
        Ok(scripts
            .iter()
            .map(|(name, text)| Script::new(name.clone(), Path::new(&folder.folder_name).join(name), text.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use sqlmill_core::FolderKind;

    use super::*;

    #[test]
    fn disk_scripts_are_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let up = dir.path().join("up");
        fs::create_dir_all(up.join("2024")).unwrap();
        fs::write(up.join("0002_b.sql"), "SELECT 2").unwrap();
        fs::write(up.join("0001_a.SQL"), "SELECT 1").unwrap();
        fs::write(up.join("2024").join("0003_c.sql"), "SELECT 3").unwrap();
        fs::write(up.join("notes.txt"), "ignored").unwrap();

        let scripts = DiskScripts::new(dir.path()).scripts(&MigrationsFolder::new(FolderKind::Up)).unwrap();
        let names: Vec<&str> = scripts.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["0001_a.SQL", "0002_b.sql", "2024/0003_c.sql"]);
        assert_eq!(scripts[0].text, "SELECT 1");
    }

    #[test]
    fn missing_folder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let scripts = DiskScripts::new(dir.path()).scripts(&MigrationsFolder::new(FolderKind::Views)).unwrap();
        assert!(scripts.is_empty());
    }

    #[test]
    fn memory_scripts_sort_by_name() {
        let source = MemoryScripts::new().with("up", "b.sql", "SELECT 2").with("up", "a.sql", "SELECT 1");
        let scripts = source.scripts(&MigrationsFolder::new(FolderKind::Up)).unwrap();
        assert_eq!(scripts[0].name, "a.sql");
        assert_eq!(scripts[1].content_hash, sqlmill_core::content_hash("SELECT 2"));
        assert!(source.scripts(&MigrationsFolder::new(FolderKind::Down)).unwrap().is_empty());
    }
}
