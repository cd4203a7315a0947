use anyhow::{Context, Result};
use snapshare_types::TokenClaims;

use crate::api::ApiError;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Manages session token storage in the user's home directory.
/// 
/// The token is stored in `~/.snapshare/session` with 0600 permissions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    file_path: PathBuf,
}

impl SessionStore {
    /// Creates a new SessionStore with the default path `~/.snapshare/session`.
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(Self::at(home_dir.join(".snapshare").join("session")))
    }

    /// Store backed by an explicit file
    pub fn at(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    /// Loads the session token from the file.
    /// 
    /// # Returns
    /// 
    /// - `Ok(Some(token))` if the file exists and contains a valid token
    /// - `Ok(None)` if the file doesn't exist
    /// - `Err(_)` if the file is corrupted or cannot be read
    pub fn load(&self) -> Result<Option<String>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.file_path)
            .context("Failed to read session file")?;
        
        // Validate session file format
        let token = content.trim();
        
        if token.is_empty() {
            log::warn!("Session file is empty, treating as no session");
            return Ok(None);
        }
        
        // Signed tokens run a few hundred characters
        if token.len() < 8 || token.len() > 2048 {
            log::warn!("Session token has invalid length: {}, treating as corrupted", token.len());
            return Ok(None);
        }
        
        // Check for obviously corrupted content (binary data, control characters, etc.)
        if token.chars().any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t') {
            log::warn!("Session file contains control characters, treating as corrupted");
            return Ok(None);
        }
        
        log::debug!("Successfully loaded session token from {}", self.file_path.display());
        Ok(Some(token.to_string()))
    }

    /// Loads the token and decodes its claims, dropping the session when the
    /// token is unreadable or expired at `now_unix`.
    pub fn load_valid(&self, now_unix: i64) -> Result<Option<(String, TokenClaims)>> {
        let Some(token) = self.load()? else {
            return Ok(None);
        };

        match TokenClaims::decode_unverified(&token) {
            Ok(claims) if claims.is_expired_at(now_unix) => {
                log::info!("Stored token for {} has expired", claims.username);
                self.delete()?;
                Ok(None)
            }
            Ok(claims) => Ok(Some((token, claims))),
            Err(e) => {
                log::warn!("Stored token is unreadable ({}), discarding it", e);
                self.delete()?;
                Ok(None)
            }
        }
    }

    /// Saves the session token to the file with 0600 permissions.
    /// 
    /// Stale `session*` siblings are removed first and the write goes through
    /// a temporary file that is renamed into place.
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).context("Failed to create session directory")?;
        }

        // Remove any old/stale session files before saving
        self.cleanup_old_files()?;

        // Use atomic write: write to temporary file, then rename
        let temp_path = self.file_path.with_extension("tmp");
        
        // Write to temporary file
        let mut file = fs::File::create(&temp_path)
            .context("Failed to create temporary session file")?;
        
        file.write_all(token.as_bytes())
            .context("Failed to write session token")?;
        
        file.sync_all()
            .context("Failed to sync session file to disk")?;
        
        drop(file);

        // Set permissions to 0600 (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&temp_path, permissions)
                .context("Failed to set session file permissions")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.file_path)
            .context("Failed to rename temporary session file")?;

        log::info!("Successfully saved session token to {}", self.file_path.display());
        Ok(())
    }

    /// Deletes the session file. Succeeds when there is nothing to delete.
    pub fn delete(&self) -> Result<()> {
        if self.file_path.exists() {
            fs::remove_file(&self.file_path)
                .context("Failed to delete session file")?;
            log::info!("Successfully deleted session file at {}", self.file_path.display());
        } else {
            log::debug!("Session file does not exist, nothing to delete");
        }
        Ok(())
    }

    /// Drops the stored session when the server rejected its token.
    /// Returns whether the session was cleared.
    pub fn clear_on_rejection(&self, err: &ApiError) -> Result<bool> {
        if !err.is_unauthorized() {
            return Ok(false);
        }
        log::info!("Server rejected the stored token: {}", err);
        self.delete()?;
        Ok(true)
    }

    /// Removes `session.*` leftovers so only one session file exists.
    fn cleanup_old_files(&self) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.exists() {
                return Ok(());
            }

            let entries = fs::read_dir(parent)
                .context("Failed to read session directory")?;

            for entry in entries {
                let entry = entry.context("Failed to read directory entry")?;
                let path = entry.path();
                
                // Skip if it's the current session file
                if path == self.file_path {
                    continue;
                }

                // Remove temporary files, backup files, and old session files
                if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
                    if file_name.starts_with("session") {
                        log::debug!("Removing old/stale session file: {}", path.display());
                        if let Err(e) = fs::remove_file(&path) {
                            log::warn!("Failed to remove old session file {}: {}", path.display(), e);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Returns the path to the session file.
    pub fn path(&self) -> &PathBuf {
        &self.file_path
    }
}
