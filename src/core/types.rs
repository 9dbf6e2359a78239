//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A secret key name (e.g., DATABASE_URL, API_KEY).
///
/// Must be a valid environment variable name.
pub type SecretKey = String;

/// An encrypted secret value (age-armored ciphertext).
pub type EncryptedValue = String;

/// Public identifier of the store key (an age recipient, `age1...`).
pub type KeyId = String;

/// Per `(key, scope)` version number.
pub type Version = i64;

/// Store-assigned record identifier.
pub type RecordId = i64;
