//! Persistent credential stores
//!
//! - [`KeychainCredentialStore`]: platform keychain via `keyring`
//! - [`FileCredentialStore`]: JSON file readable only by the owner

mod file;
mod keychain;

pub use file::FileCredentialStore;
pub use keychain::KeychainCredentialStore;
