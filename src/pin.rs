// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! PIN vault for the lock screen. Lives outside the database as two small
//! files in the data dir: `device.key` (random device-bound passphrase
//! material, created on first use) and `pin.vault`
//! (`base64(salt ‖ iv ‖ ciphertext)`, AES-256-GCM under a
//! PBKDF2-SHA-256 key).

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use std::fs;
use std::path::PathBuf;

use crate::db;
use crate::validate;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const PBKDF2_ITERATIONS: u32 = 100_000;

const VAULT_FILE: &str = "pin.vault";
const DEVICE_KEY_FILE: &str = "device.key";

pub struct PinVault {
    dir: PathBuf,
}

impl PinVault {
    pub fn open_default() -> Result<Self> {
        Ok(PinVault::at(db::data_dir()?))
    }

    pub fn at(dir: PathBuf) -> Self {
        PinVault { dir }
    }

    fn vault_path(&self) -> PathBuf {
        self.dir.join(VAULT_FILE)
    }

    /// Passphrase bound to this device: a random key created on first
    /// use, mixed with the local user name.
    fn device_passphrase(&self) -> Result<String> {
        let path = self.dir.join(DEVICE_KEY_FILE);
        let key = if path.exists() {
            fs::read_to_string(&path).context("Failed to read device key")?
        } else {
            let mut material = [0u8; 32];
            OsRng.fill_bytes(&mut material);
            let encoded = BASE64.encode(material);
            fs::write(&path, &encoded).context("Failed to write device key")?;
            encoded
        };
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "digibook".into());
        Ok(format!("digibook:{}:{}", user, key.trim()))
    }

    pub fn is_set(&self) -> bool {
        self.vault_path().exists()
    }

    pub fn set(&self, pin: &str) -> Result<()> {
        let pin = validate::pin(pin).into_result()?;
        let passphrase = self.device_passphrase()?;

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let key = derive_key(&passphrase, &salt);
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| anyhow!("cipher initialisation failed: {}", e))?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), pin.as_bytes())
            .map_err(|e| anyhow!("PIN encryption failed: {}", e))?;

        let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        fs::write(self.vault_path(), BASE64.encode(blob)).context("Failed to write PIN vault")?;
        Ok(())
    }

    pub fn verify(&self, pin: &str) -> Result<bool> {
        let encoded = fs::read_to_string(self.vault_path()).context("No PIN has been set")?;
        let blob = BASE64
            .decode(encoded.trim())
            .context("PIN vault is corrupt")?;
        if blob.len() <= SALT_LEN + NONCE_LEN {
            return Err(anyhow!("PIN vault is corrupt"));
        }
        let (salt, rest) = blob.split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let key = derive_key(&self.device_passphrase()?, salt);
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| anyhow!("cipher initialisation failed: {}", e))?;
        let plaintext = match cipher.decrypt(Nonce::from_slice(nonce), ciphertext) {
            Ok(p) => p,
            // A failed tag check means the vault was written under a
            // different device key; treat as non-matching.
            Err(_) => return Ok(false),
        };
        Ok(plaintext == pin.trim().as_bytes())
    }

    pub fn clear(&self) -> Result<bool> {
        let path = self.vault_path();
        if path.exists() {
            fs::remove_file(&path).context("Failed to remove PIN vault")?;
            return Ok(true);
        }
        Ok(false)
    }
}

fn derive_key(passphrase: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    key
}
