//! basic-auth library crate.
//!
//! Credential store for HTTP Basic-Authentication identities, with an
//! in-memory and an SQLite backend behind one collection trait.

pub mod collection;
pub mod config;
pub mod credentials;
pub mod database;
pub mod error;
pub mod logging;

pub use collection::{CredentialCollection, open_collection};
pub use config::StoreConfig;
pub use error::{Error, Result};
