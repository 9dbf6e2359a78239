//! Cryptographic operations.
//!
//! Provides the encryption/decryption abstraction and the age backend.
//!
//! Every stored value is an independent age file encrypted to the store
//! key's recipient. age draws a fresh file key and payload nonce for each
//! message, so nonces are never reused under the same key, and its payload
//! MAC makes tampered or foreign ciphertext fail instead of decrypting to
//! garbage.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Cipher` trait
//! 2. Add the implementation in a new file next to `age.rs`
//! 3. Re-export from this module

use ::age::x25519;
use zeroize::Zeroizing;

use crate::core::types::EncryptedValue;
use crate::error::Result;

mod age;

pub use age::{parse_identity, Age};

/// Cryptographic backend trait.
///
/// A backend encrypts under a single key and decrypts with the same key.
/// Decryption must fail when the ciphertext was produced under another key
/// or has been modified.
pub trait Cipher {
    /// Key material used for both directions.
    type Key;

    /// Encrypt a payload.
    ///
    /// # Errors
    ///
    /// Returns `CipherError` if encryption fails.
    fn encrypt(&self, plaintext: &[u8], key: &Self::Key) -> Result<EncryptedValue>;

    /// Decrypt a payload produced by [`Cipher::encrypt`].
    ///
    /// # Errors
    ///
    /// Returns `CipherError::AuthenticationFailed` if the ciphertext was not
    /// produced under `key` or fails its integrity check.
    fn decrypt(&self, encrypted: &str, key: &Self::Key) -> Result<Zeroizing<Vec<u8>>>;

    /// Re-encrypt a payload from `old` to `new`.
    ///
    /// The intermediate plaintext is wiped before returning.
    fn reencrypt(&self, encrypted: &str, old: &Self::Key, new: &Self::Key) -> Result<EncryptedValue> {
        let plaintext = self.decrypt(encrypted, old)?;
        self.encrypt(&plaintext, new)
    }

    /// Backend name for display.
    fn name(&self) -> &'static str;
}

/// Encrypt a value under an age identity.
///
/// Convenience wrapper around `Age::encrypt`.
pub fn encrypt(plaintext: &[u8], identity: &x25519::Identity) -> Result<EncryptedValue> {
    Age.encrypt(plaintext, identity)
}

/// Decrypt a value with an age identity.
///
/// Convenience wrapper around `Age::decrypt`.
pub fn decrypt(encrypted: &str, identity: &x25519::Identity) -> Result<Zeroizing<Vec<u8>>> {
    Age.decrypt(encrypted, identity)
}

/// Re-encrypt a value from one identity to another.
pub fn reencrypt(
    encrypted: &str,
    old: &x25519::Identity,
    new: &x25519::Identity,
) -> Result<EncryptedValue> {
    Age.reencrypt(encrypted, old, new)
}
