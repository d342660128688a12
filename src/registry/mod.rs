// file: src/registry/mod.rs
// description: registry api module exports
// reference: internal module structure

pub mod client;
pub mod services;

pub use client::{HttpRegistry, Registry};
pub use services::{DetectedService, detect_services};
