use crate::errors::RecorderError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> Result<String, RecorderError>;
    fn write_string(&self, path: &Path, contents: &str) -> Result<(), RecorderError>;
    fn create_dir_all(&self, path: &Path) -> Result<(), RecorderError>;
}

pub struct ProductionFileSystem;

impl FileSystem for ProductionFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, RecorderError> {
        std::fs::read_to_string(path).map_err(|e| RecorderError::Io(e.to_string()))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), RecorderError> {
        std::fs::write(path, contents).map_err(|e| RecorderError::Io(e.to_string()))
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), RecorderError> {
        std::fs::create_dir_all(path).map_err(|e| RecorderError::Io(e.to_string()))
    }
}

#[derive(Default, Clone)]
pub struct FakeFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
    dirs: Arc<Mutex<Vec<PathBuf>>>,
    fail_next: Arc<Mutex<Option<RecorderError>>>,
}

impl FakeFileSystem {
    pub fn with_file(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        let fs = Self::default();
        fs.files
            .lock()
            .expect("files lock")
            .insert(path.into(), contents.into());
        fs
    }

    pub fn set_fail_next(&self, error: RecorderError) {
        *self.fail_next.lock().expect("fail lock") = Some(error);
    }

    pub fn created_dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().expect("dirs lock").clone()
    }

    fn maybe_fail(&self) -> Result<(), RecorderError> {
        if let Some(err) = self.fail_next.lock().expect("fail lock").take() {
            return Err(err);
        }
        Ok(())
    }
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, RecorderError> {
        self.maybe_fail()?;
        self.files
            .lock()
            .expect("files lock")
            .get(path)
            .cloned()
            .ok_or_else(|| RecorderError::Io(format!("missing file {}", path.display())))
    }

    fn write_string(&self, path: &Path, contents: &str) -> Result<(), RecorderError> {
        self.maybe_fail()?;
        self.files
            .lock()
            .expect("files lock")
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), RecorderError> {
        self.maybe_fail()?;
        self.dirs
            .lock()
            .expect("dirs lock")
            .push(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FakeFileSystem, FileSystem};
    use crate::errors::RecorderError;
    use std::path::Path;

    #[test]
    fn fake_file_system_fails_once_then_recovers() {
        let fs = FakeFileSystem::with_file("/cfg.toml", "x = 1");
        fs.set_fail_next(RecorderError::Io("boom".to_string()));
        assert!(fs.read_to_string(Path::new("/cfg.toml")).is_err());
        assert_eq!(
            fs.read_to_string(Path::new("/cfg.toml")).expect("second read"),
            "x = 1"
        );
    }
}
