// SPDX-License-Identifier: MIT

//! Storage layer: local JSON cache and remote persistence service.

pub mod cache;
pub mod remote;

pub use cache::{CacheSnapshot, FileCache};
pub use remote::RemoteStore;

/// Remote table names as constants.
pub mod tables {
    pub const SESSIONS: &str = "sessions";
    pub const SETTINGS: &str = "settings";
}
