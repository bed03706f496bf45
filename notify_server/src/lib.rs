//! Notification server relaying detection messages to browser clients.
pub mod app;
pub mod endpoints;
pub mod pubsub;
