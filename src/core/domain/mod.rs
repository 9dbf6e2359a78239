//! Domain types.

mod env;
mod secret;
mod store_info;

pub use env::EnvFile;
pub use secret::{Scope, SecretRecord, Status, VersionInfo};
pub use store_info::StoreInfo;
