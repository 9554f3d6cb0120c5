//! Logical id derivation from construct paths.
//!
//! A construct path such as `["efsml-dev-Vpc", "PublicSubnet1", "RouteTable"]`
//! becomes `efsmldevVpcPublicSubnet1RouteTable` followed by eight hex digits
//! of the SHA-256 of the joined path. The hash keeps ids unique when two
//! paths collapse to the same alphanumeric text.

use sha2::{Digest, Sha256};

/// Path components dropped from the readable part of an id.
const HIDDEN_COMPONENTS: &[&str] = &["Resource", "Default"];

const HASH_LEN: usize = 8;
const MAX_HUMAN_LEN: usize = 255 - HASH_LEN;

/// Derive the logical id for a construct path.
#[must_use]
pub fn logical_id(path: &[&str]) -> String {
    let human: String = path
        .iter()
        .filter(|c| !HIDDEN_COMPONENTS.contains(*c))
        .flat_map(|c| c.chars())
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_HUMAN_LEN)
        .collect();
    format!("{human}{}", path_hash(path))
}

fn path_hash(path: &[&str]) -> String {
    let digest = Sha256::digest(path.join("/").as_bytes());
    hex::encode_upper(&digest[..HASH_LEN / 2])
}
