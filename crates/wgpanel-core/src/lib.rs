//! wgpanel-core: shared types and storage for the wgpanel gateway admin panel.
//!
//! This crate contains the flat-file user directory shared by the HTTP API and
//! the `wgpanel-users` CLI, the locked file rewrite helpers they both rely on,
//! and the status payloads returned by the API.

#![warn(missing_docs)]

pub mod fsutil;
pub mod status;
pub mod timestamp;
pub mod user;

pub use status::{VpnStatusDetails, WifiStatus};
pub use user::{UserRecord, UserStore, UserStoreError};
