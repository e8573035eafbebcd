//! This crate provides the key-derivation utilities tying a Potato identity
//! to the key material held by the remote signer service.

pub mod derivation_path;
pub mod public_key;

pub use derivation_path::DerivationPath;
pub use public_key::{DeriveError, PublicKeyDeriver, eth_address};
