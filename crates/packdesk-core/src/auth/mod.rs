//! Operator identity and credentials.
//!
//! This module provides:
//! - `Session`: the signed-in portal user (username, avatar), persisted to disk
//! - `CredentialStore`: API token storage in the OS keychain via keyring
//!
//! Tokens are issued by the portal out of band; this crate only stores and
//! presents them.

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData};
