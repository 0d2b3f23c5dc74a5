//! Data models for Yggdrasil account data.
//!
//! - `GameProfile`: a selectable in-game identity
//! - `Property`: a (possibly signed) user property

pub mod profile;

pub use profile::{GameProfile, Property};
