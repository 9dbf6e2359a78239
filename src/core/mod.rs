//! Core library components.
//!
//! Everything below the command line: the store, encryption, resolution of
//! effective values and the [`vault::Vault`] that ties them together.

pub mod cipher;
pub mod config;
pub mod constants;
pub mod domain;
pub mod environ;
pub mod keys;
pub mod project;
pub mod resolve;
pub mod store;
pub mod types;
pub mod validation;
pub mod vault;
