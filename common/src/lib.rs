//! Common code shared between `notify_server` and `cam_classifier`.
pub mod protocol;

/// Error type.
pub type Error = Box<dyn std::error::Error>;
