//! Repository layer for database access.
//!
//! Operations here run against a caller-owned transaction so that several of
//! them can form one atomic unit.

pub mod credential_tx;

pub use credential_tx::*;
