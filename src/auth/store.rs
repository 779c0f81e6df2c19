//! Persistent token record store.
//!
//! One JSON file per installation, owner read/write only. Every save replaces
//! the whole record.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::AuthError;
use super::types::TokenRecord;

/// File-backed store for a single [`TokenRecord`].
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved record.
    ///
    /// A missing file is `NotLoggedIn`; an unparseable one is `Corrupt`.
    pub fn load(&self) -> Result<TokenRecord, AuthError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::NotLoggedIn(self.path.clone()));
            }
            Err(err) => {
                return Err(AuthError::Corrupt {
                    path: self.path.clone(),
                    detail: err.to_string(),
                });
            }
        };
        serde_json::from_str(&text).map_err(|err| AuthError::Corrupt {
            path: self.path.clone(),
            detail: err.to_string(),
        })
    }

    /// Like [`load`](Self::load) but maps `NotLoggedIn` to `None`.
    pub fn load_optional(&self) -> Result<Option<TokenRecord>, AuthError> {
        match self.load() {
            Ok(record) => Ok(Some(record)),
            Err(AuthError::NotLoggedIn(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Persist `record`, creating the parent directory as needed.
    pub fn save(&self, record: &TokenRecord) -> Result<(), AuthError> {
        let text = serde_json::to_string_pretty(record)
            .map_err(|err| AuthError::Invalid(format!("failed to serialize token record: {err}")))?;
        self.write_private(text.as_bytes())
            .map_err(|source| AuthError::Persist {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(path = %self.path.display(), "saved token record");
        Ok(())
    }

    /// Remove the saved record. Returns `true` when a file was deleted.
    ///
    /// Clearing an absent record succeeds.
    pub fn clear(&self) -> Result<bool, AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(AuthError::Persist {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_private(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let mut builder = std::fs::DirBuilder::new();
            builder.recursive(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::DirBuilderExt;
                builder.mode(0o700);
            }
            builder.create(parent)?;
            #[cfg(unix)]
            restrict_dir(parent)?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.create(true).truncate(true).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        #[cfg(unix)]
        {
            // A pre-existing file keeps its old mode through `open`.
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(bytes)?;
        file.flush()?;
        Ok(())
    }
}

/// Make an existing token directory owner-only.
///
/// Sticky shared directories such as `/tmp` are left alone; the file itself
/// is still written 0600.
#[cfg(unix)]
fn restrict_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(dir)?.permissions().mode();
    if mode & 0o1000 != 0 || mode & 0o077 == 0 {
        return Ok(());
    }
    std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))
}
