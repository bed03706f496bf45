//! Classify webcam frames and notify the server whenever the detected class changes.
pub mod detector;
pub mod keys;
pub mod labels;
pub mod nn;
pub mod notifier;
pub mod overlay;
pub mod preview;
pub mod sensors;
pub mod state;
