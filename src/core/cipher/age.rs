//! Age encryption backend implementation.
//!
//! Encrypts to the x25519 recipient of the store key and armors the result
//! so it can live in a TEXT column.

use std::io::{Read, Write};

use ::age::x25519;
use tracing::trace;
use zeroize::Zeroizing;

use super::Cipher;
use crate::core::types::EncryptedValue;
use crate::error::{CipherError, Result};

/// Age-based cryptographic backend using x25519 keys
pub struct Age;

impl Cipher for Age {
    type Key = x25519::Identity;

    fn name(&self) -> &'static str {
        "age"
    }

    fn encrypt(&self, plaintext: &[u8], key: &x25519::Identity) -> Result<EncryptedValue> {
        trace!(plaintext_len = plaintext.len(), "encrypting");

        let recipient = key.to_public();
        let encryptor =
            age::Encryptor::with_recipients(std::iter::once(&recipient as &dyn age::Recipient))
                .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;

        let mut encrypted = Vec::new();
        let armor = age::armor::ArmoredWriter::wrap_output(
            &mut encrypted,
            age::armor::Format::AsciiArmor,
        )
        .map_err(|e| CipherError::ArmorFailed(format!("{}", e)))?;
        let mut writer = encryptor
            .wrap_output(armor)
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;

        writer
            .write_all(plaintext)
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;
        let armored = writer
            .finish()
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;
        armored
            .finish()
            .map_err(|e| CipherError::ArmorFailed(format!("{}", e)))?;

        trace!(ciphertext_len = encrypted.len(), "encrypted");

        String::from_utf8(encrypted)
            .map_err(|e| CipherError::EncryptionFailed(format!("UTF-8 error: {}", e)).into())
    }

    fn decrypt(&self, encrypted: &str, key: &x25519::Identity) -> Result<Zeroizing<Vec<u8>>> {
        trace!(ciphertext_len = encrypted.len(), "decrypting");

        let reader = age::armor::ArmoredReader::new(encrypted.as_bytes());
        let decryptor = age::Decryptor::new(reader).map_err(classify)?;

        let mut reader = decryptor
            .decrypt(std::iter::once(key as &dyn age::Identity))
            .map_err(classify)?;

        let mut decrypted = Zeroizing::new(Vec::new());
        // The payload MAC is checked chunk by chunk while reading.
        reader
            .read_to_end(&mut decrypted)
            .map_err(|e| CipherError::AuthenticationFailed(format!("{}", e)))?;

        trace!(plaintext_len = decrypted.len(), "decrypted");

        Ok(decrypted)
    }
}

/// Map an age decryption error onto the crate's cipher error kinds.
fn classify(e: age::DecryptError) -> CipherError {
    match e {
        age::DecryptError::NoMatchingKeys => {
            CipherError::AuthenticationFailed("value was not encrypted under this key".to_string())
        }
        age::DecryptError::InvalidMac | age::DecryptError::DecryptionFailed => {
            CipherError::AuthenticationFailed(format!("{}", e))
        }
        other => CipherError::DecryptionFailed(format!("{}", other)),
    }
}

/// Parse key material (`AGE-SECRET-KEY-1...`) into an age identity.
///
/// # Errors
///
/// Returns `CipherError::InvalidKey` if the key format is invalid. The key
/// itself is never echoed back in the error.
pub fn parse_identity(material: &str) -> Result<x25519::Identity> {
    material
        .trim()
        .parse::<x25519::Identity>()
        .map_err(|e: &str| CipherError::InvalidKey(e.to_string()).into())
}
