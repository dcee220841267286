// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use digibook::pin::PinVault;
use tempfile::tempdir;

#[test]
fn set_verify_clear_cycle() {
    let dir = tempdir().unwrap();
    let vault = PinVault::at(dir.path().to_path_buf());
    assert!(!vault.is_set());

    vault.set("1234").unwrap();
    assert!(vault.is_set());
    assert!(vault.verify("1234").unwrap());
    assert!(!vault.verify("9999").unwrap());
    assert!(!vault.verify("123456").unwrap());

    assert!(vault.clear().unwrap());
    assert!(!vault.is_set());
    assert!(!vault.clear().unwrap());
}

#[test]
fn rejects_malformed_pins() {
    let dir = tempdir().unwrap();
    let vault = PinVault::at(dir.path().to_path_buf());
    assert!(vault.set("12").is_err());
    assert!(vault.set("1234567").is_err());
    assert!(vault.set("12ab").is_err());
    assert!(!vault.is_set());
}

#[test]
fn verify_without_a_pin_is_an_error() {
    let dir = tempdir().unwrap();
    let vault = PinVault::at(dir.path().to_path_buf());
    assert!(vault.verify("1234").is_err());
}

#[test]
fn resetting_overwrites_the_previous_pin() {
    let dir = tempdir().unwrap();
    let vault = PinVault::at(dir.path().to_path_buf());
    vault.set("1234").unwrap();
    vault.set("567890").unwrap();
    assert!(!vault.verify("1234").unwrap());
    assert!(vault.verify("567890").unwrap());
}

#[test]
fn vault_blob_is_base64_of_salt_iv_ciphertext() {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

    let dir = tempdir().unwrap();
    let vault = PinVault::at(dir.path().to_path_buf());
    vault.set("4321").unwrap();

    let raw = std::fs::read_to_string(dir.path().join("pin.vault")).unwrap();
    let blob = BASE64.decode(raw.trim()).unwrap();
    // 16-byte salt + 12-byte IV + ciphertext (4-byte PIN + 16-byte GCM tag)
    assert_eq!(blob.len(), 16 + 12 + 4 + 16);
    assert!(dir.path().join("device.key").exists());
}
