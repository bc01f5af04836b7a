use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Holds the bearer token of the current session.
///
/// With a path the token survives restarts; without one it lives for the
/// lifetime of the store.
#[derive(Debug, Default)]
pub struct TokenStore {
    path: Option<PathBuf>,
    token: RwLock<Option<String>>,
}

impl TokenStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a file backed store, loading a token left by a previous run.
    pub fn persistent(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();

        let token = match fs::read_to_string(&path) {
            Ok(content) => Some(content.trim().to_string()).filter(|token| !token.is_empty()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        Ok(Self {
            path: Some(path),
            token: RwLock::new(token),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self) -> Option<String> {
        self.token.read().ok().and_then(|token| token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }

    pub fn set(&self, token: impl Into<String>) -> io::Result<()> {
        let token = token.into();

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &token)?;
        }

        if let Ok(mut current) = self.token.write() {
            *current = Some(token);
        }

        Ok(())
    }

    pub fn clear(&self) -> io::Result<()> {
        if let Ok(mut current) = self.token.write() {
            *current = None;
        }

        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
                _ => {}
            }
        }

        Ok(())
    }
}
