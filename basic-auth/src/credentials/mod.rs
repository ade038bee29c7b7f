//! Basic-Auth credential primitives.
//!
//! - [`Credentials`]: a username with its password hash, rendered as a token
//! - [`prepare_token`]: hashes the password of a caller-supplied token
//! - [`hash_password`]: the one-way digest used for storage and verification

mod hash;
mod token;

pub use hash::{hash_password, verify_password};
pub use token::{Credentials, TOKEN_SEPARATOR, TokenError, prepare_token, resolve_credentials};
