use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".dream-diary.yaml";
pub const DEFAULT_ENTRIES_FILE: &str = "dreams.json";

#[derive(Debug, Clone)]
pub struct DiaryPaths {
    pub root: PathBuf,
    pub config: PathBuf,
}

impl DiaryPaths {
    /// Diary rooted at `root`, or the current directory when `None`.
    pub fn resolve(root: Option<&Path>) -> Self {
        let root = match root {
            Some(p) => p.to_path_buf(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        Self::from_root(root)
    }

    pub fn from_root(root: PathBuf) -> Self {
        Self {
            config: root.join(CONFIG_FILE),
            root,
        }
    }

    /// Relative snapshot paths are resolved against the diary root.
    pub fn entries_path(&self, configured: &Path) -> PathBuf {
        if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            self.root.join(configured)
        }
    }
}
