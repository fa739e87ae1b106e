use anyhow::{anyhow, Context, Result};
use keyring::Entry;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::remote::Credentials;

const KEYRING_SERVICE: &str = "clouddrive-fuse";
const KEYRING_USER: &str = "credentials";
const CREDENTIALS_FILE_NAME: &str = "credentials.json";

/// Where the login credentials are read from: the system keyring when it
/// holds an entry, `credentials.json` in the config directory otherwise.
pub struct CredentialStore {
    keyring_entry: Option<Entry>,
    file_path: PathBuf,
}

impl CredentialStore {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            keyring_entry: Self::create_keyring_entry(),
            file_path: config_dir.join(CREDENTIALS_FILE_NAME),
        }
    }

    /// Store backed only by a file, used when the keyring must not be consulted
    pub fn file_only(file_path: PathBuf) -> Self {
        Self {
            keyring_entry: None,
            file_path,
        }
    }

    /// Create keyring entry if available
    fn create_keyring_entry() -> Option<Entry> {
        Entry::new(KEYRING_SERVICE, KEYRING_USER).ok()
    }

    /// Load credentials, keyring first
    pub fn load(&self) -> Result<Credentials> {
        if let Some(ref entry) = self.keyring_entry {
            match entry.get_password() {
                Ok(stored) => {
                    debug!("Loaded credentials from system keyring");
                    return serde_json::from_str(&stored)
                        .context("Failed to parse credentials stored in keyring");
                }
                Err(e) => debug!("No usable keyring entry ({}), trying file", e),
            }
        }

        if self.file_path.exists() {
            let data = fs::read_to_string(&self.file_path).with_context(|| {
                format!("Failed to read credentials file {}", self.file_path.display())
            })?;
            let credentials: Credentials = serde_json::from_str(&data).with_context(|| {
                format!("Failed to parse credentials file {}", self.file_path.display())
            })?;
            debug!("Loaded credentials from {}", self.file_path.display());
            Ok(credentials)
        } else {
            Err(anyhow!(
                "No credentials found in keyring or file {}",
                self.file_path.display()
            ))
        }
    }

    /// Get storage method info for debugging
    pub fn get_storage_info(&self) -> String {
        match self.keyring_entry {
            Some(_) => format!("system keyring, falling back to {:?}", self.file_path),
            None => format!("file: {:?}", self.file_path),
        }
    }
}
