//! WireGuard config file editing and `wg-quick` interface control.

pub mod editor;
pub mod service;

pub use editor::{ConfigEditor, EditorError};
pub use service::{ServiceController, ServiceError, ServiceOutcome};
