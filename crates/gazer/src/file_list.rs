use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Ordered list of files to browse and the one currently shown.
#[derive(Debug, Default)]
pub struct FileList {
    paths: Vec<PathBuf>,
    index: usize,
}

impl FileList {
    /// Several arguments are browsed as given. A single file expands to the
    /// files of its directory, positioned at that file.
    pub fn from_args(args: &[PathBuf]) -> Result<Self> {
        match args {
            [] => Ok(Self::default()),
            [single] if single.is_file() => Self::from_directory_of(single),
            _ => Ok(Self {
                paths: args.to_vec(),
                index: 0,
            }),
        }
    }

    pub fn from_directory_of(path: &Path) -> Result<Self> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut paths = Vec::new();
        for entry in
            std::fs::read_dir(&dir).with_context(|| format!("Failed to list {}", dir.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let name = path.file_name();
        let index = paths
            .iter()
            .position(|p| p.file_name() == name)
            .unwrap_or(0);
        Ok(Self { paths, index })
    }

    pub fn current(&self) -> Option<&Path> {
        self.paths.get(self.index).map(PathBuf::as_path)
    }

    /// Step `steps` entries, wrapping at both ends.
    pub fn advance(&mut self, steps: i32) -> Option<&Path> {
        if self.paths.is_empty() {
            return None;
        }
        let len = self.paths.len() as i64;
        self.index = (self.index as i64 + steps as i64).rem_euclid(len) as usize;
        self.current()
    }

    /// Make `path` current, replacing the list with its directory.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        *self = Self::from_directory_of(path)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
