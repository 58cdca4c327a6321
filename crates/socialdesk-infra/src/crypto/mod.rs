//! Cryptographic helpers.
//!
//! - `hash`: SHA-256 digests (API key hashes, Cloudinary signatures)
//! - `vault`: AES-256-GCM encryption of access tokens at rest

pub mod hash;
pub mod vault;
