//! Kryptos - a versioned, encrypted store for environment secrets.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── secrets       # set, rm, grep, cat, dump, prune, history
//! │   ├── rotate        # Store key rotation
//! │   ├── info          # Store metadata
//! │   ├── run           # Run with injected secrets
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── cipher/       # Cipher trait and age implementation
//!     ├── store/        # SQLite record store
//!     ├── keys          # Store key and key file handling
//!     ├── project       # Project id detection
//!     ├── resolve       # Project-over-global resolution
//!     ├── environ       # Environment injection
//!     ├── config        # Settings layering
//!     └── vault/        # Operations over one store
//! ```
//!
//! # Features
//!
//! - Every value encrypted under one age x25519 key
//! - Full version history per key, with pruning
//! - Project values shadow global ones
//! - Atomic key rotation

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::vault::Vault;
pub use crate::error::{Error, Result};
