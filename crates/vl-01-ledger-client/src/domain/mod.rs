//! Domain logic: nonce sequencing and gas price caching.

pub mod gas;
pub mod nonce;
