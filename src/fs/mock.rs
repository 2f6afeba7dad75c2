// src/fs/mock.rs

use super::{FileSystem, WriteMode};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

type Entries = Arc<Mutex<HashMap<PathBuf, MockEntry>>>;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem for tests.
///
/// Unlike [`MockFileSystem::add_file`], writes through [`FileSystem::open_write`]
/// require the parent directory to exist, like a real filesystem.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Entries,
}

fn parent_of(path: &Path) -> Option<&Path> {
    path.parent().map(|parent| {
        if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        }
    })
}

fn link_child(files: &mut HashMap<PathBuf, MockEntry>, parent: &Path, path: &Path) {
    if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }
}

fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    if files.contains_key(path) {
        return;
    }
    files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
    if let Some(parent) = parent_of(path) {
        if parent != path {
            ensure_dir_entry(files, parent);
            link_child(files, parent, path);
        }
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    /// Seed a file, creating parent directories implicitly.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut files = self.files.lock().unwrap();
        if let Some(parent) = parent_of(path) {
            ensure_dir_entry(&mut files, parent);
            link_child(&mut files, parent, path);
        }
        files.insert(path.to_path_buf(), MockEntry::File(content.into()));
    }

    /// Remove a file or an empty directory entry.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut files = self.files.lock().unwrap();
        files.remove(path);
        if let Some(parent) = parent_of(path) {
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    children.retain(|c| c != name);
                }
            }
        }
    }

    /// Raw bytes of a file, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let files = self.files.lock().unwrap();
        match files.get(path.as_ref()) {
            Some(MockEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }
}

/// Write handle appending into a mock file entry.
struct MockWriter {
    files: Entries,
    path: PathBuf,
}

impl Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| io::Error::other("mock filesystem lock poisoned"))?;
        match files.get_mut(&self.path) {
            Some(MockEntry::File(content)) => {
                content.extend_from_slice(buf);
                Ok(buf.len())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("file vanished: {:?}", self.path),
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::File(content)) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn open_write(&self, path: &Path, mode: WriteMode) -> Result<Box<dyn Write + Send>> {
        let mut files = self.files.lock().unwrap();
        let parent = parent_of(path).unwrap_or(Path::new("."));
        if !matches!(files.get(parent), Some(MockEntry::Dir(_))) {
            return Err(anyhow!("Parent directory missing: {:?}", parent));
        }
        match (files.get_mut(path), mode) {
            (Some(MockEntry::Dir(_)), _) => return Err(anyhow!("Is a directory: {:?}", path)),
            (Some(MockEntry::File(content)), WriteMode::Truncate) => content.clear(),
            (Some(MockEntry::File(_)), WriteMode::Append) => {}
            (None, _) => {
                files.insert(path.to_path_buf(), MockEntry::File(Vec::new()));
                link_child(&mut files, parent, path);
            }
        }
        Ok(Box::new(MockWriter {
            files: Arc::clone(&self.files),
            path: path.to_path_buf(),
        }))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        if matches!(files.get(path), Some(MockEntry::File(_))) {
            return Err(anyhow!("Is a file: {:?}", path));
        }
        ensure_dir_entry(&mut files, path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(path), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
