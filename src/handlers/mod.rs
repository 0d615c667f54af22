//! HTTP handlers

pub mod health;
pub mod client;
pub mod features;
pub mod settings;
