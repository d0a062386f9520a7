// drun-rs: drun Automation Language Runner - Rust Port
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Encrypted file fallback backend.
//!
//! ```text
//! ~/.drun/secrets.json
//!   {salt, nonce, cipher}   all base64
//!        |
//!   PBKDF2-SHA256 (100k iterations)
//!   seed = "home:hostname:drun-secrets"
//!        |
//!   AES-256-GCM --> JSON map { "ns:key": value }
//!
//! Single mutex; every write goes temp-file + rename.
//! File mode 0600, directory 0700.
//! ```

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;
use zeroize::Zeroize;

use crate::error::SecretError;

use super::SecretBackend;

/// PBKDF2 round count for key derivation.
const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt length in bytes.
const SALT_LEN: usize = 32;

/// On-disk envelope.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    salt: String,
    nonce: String,
    cipher: String,
}

/// Store contents plus the salt they were sealed with.
struct LoadedStore {
    map: BTreeMap<String, String>,
    salt: Option<Vec<u8>>,
}

/// Encrypted-file secret backend.
pub struct FileBackend {
    path: PathBuf,
    seed: String,
    lock: Mutex<()>,
}

impl FileBackend {
    /// Opens the default store at `~/.drun/secrets.json` with a seed
    /// combining the home path and hostname.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::BackendUnavailable`] when the home directory
    /// cannot be determined.
    pub fn open_default() -> Result<Self, SecretError> {
        let home = dirs::home_dir()
            .ok_or_else(|| SecretError::BackendUnavailable("no home directory".to_string()))?;
        let host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "localhost".to_string());
        let seed = format!("{}:{host}:drun-secrets", home.display());
        Ok(Self::at_path(home.join(".drun").join("secrets.json"), seed))
    }

    /// Opens a store at an explicit path with an explicit seed.
    #[must_use]
    pub fn at_path(path: PathBuf, seed: String) -> Self {
        Self {
            path,
            seed,
            lock: Mutex::new(()),
        }
    }

    /// Derives the 32-byte AES key from the seed and a salt.
    fn derive_key(&self, salt: &[u8]) -> [u8; 32] {
        let mut key = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(self.seed.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
        key
    }

    /// Loads and decrypts the store. A missing file is an empty store.
    fn load_unlocked(&self) -> Result<LoadedStore, SecretError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadedStore {
                    map: BTreeMap::new(),
                    salt: None,
                });
            }
            Err(e) => return Err(SecretError::Io(e)),
        };

        let envelope: Envelope = serde_json::from_str(&raw)
            .map_err(|e| SecretError::Corrupt(format!("bad envelope: {e}")))?;

        let salt = BASE64
            .decode(&envelope.salt)
            .map_err(|e| SecretError::Corrupt(format!("bad salt: {e}")))?;
        let nonce = BASE64
            .decode(&envelope.nonce)
            .map_err(|e| SecretError::Corrupt(format!("bad nonce: {e}")))?;
        let cipher_bytes = BASE64
            .decode(&envelope.cipher)
            .map_err(|e| SecretError::Corrupt(format!("bad ciphertext: {e}")))?;
        if nonce.len() != 12 {
            return Err(SecretError::Corrupt(format!(
                "nonce must be 12 bytes, got {}",
                nonce.len()
            )));
        }

        let mut key = self.derive_key(&salt);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let mut plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), cipher_bytes.as_ref())
            .map_err(|_| SecretError::Corrupt("decryption failed".to_string()))?;
        key.zeroize();

        let map: BTreeMap<String, String> = serde_json::from_slice(&plaintext)
            .map_err(|e| SecretError::Corrupt(format!("bad store payload: {e}")))?;
        plaintext.zeroize();

        Ok(LoadedStore {
            map,
            salt: Some(salt),
        })
    }

    /// Encrypts and atomically replaces the store file.
    fn store_unlocked(
        &self,
        map: &BTreeMap<String, String>,
        salt: Option<Vec<u8>>,
    ) -> Result<(), SecretError> {
        let salt = salt.unwrap_or_else(|| {
            let mut fresh = vec![0u8; SALT_LEN];
            OsRng.fill_bytes(&mut fresh);
            fresh
        });

        let mut key = self.derive_key(&salt);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let mut plaintext =
            serde_json::to_vec(map).map_err(|e| SecretError::Corrupt(e.to_string()))?;
        let cipher_bytes = cipher
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|_| SecretError::Corrupt("encryption failed".to_string()))?;
        plaintext.zeroize();
        key.zeroize();

        let envelope = Envelope {
            salt: BASE64.encode(&salt),
            nonce: BASE64.encode(nonce),
            cipher: BASE64.encode(&cipher_bytes),
        };
        let payload = serde_json::to_string(&envelope)
            .map_err(|e| SecretError::Corrupt(e.to_string()))?;

        let dir = self
            .path
            .parent()
            .ok_or_else(|| SecretError::BackendUnavailable("store has no parent".to_string()))?;
        std::fs::create_dir_all(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))?;
        }

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(payload.as_bytes())?;
        temp.flush()?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        temp.persist(&self.path)
            .map_err(|e| SecretError::Io(e.error))?;

        Ok(())
    }
}

impl SecretBackend for FileBackend {
    fn get(&self, composite: &str) -> Result<Option<String>, SecretError> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut store = self.load_unlocked()?;
        Ok(store.map.remove(composite))
    }

    fn set(&self, composite: &str, value: &str) -> Result<(), SecretError> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut store = self.load_unlocked()?;
        store.map.insert(composite.to_string(), value.to_string());
        self.store_unlocked(&store.map, store.salt)
    }

    fn delete(&self, composite: &str) -> Result<bool, SecretError> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut store = self.load_unlocked()?;
        let existed = store.map.remove(composite).is_some();
        if existed {
            self.store_unlocked(&store.map, store.salt)?;
        }
        Ok(existed)
    }

    fn keys(&self) -> Result<Vec<String>, SecretError> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(self.load_unlocked()?.map.into_keys().collect())
    }
}
