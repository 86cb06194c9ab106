//! Uplink Core
//!
//! Core domain types, traits, and error handling for the uplink usage
//! pipeline. This crate has minimal dependencies and defines the shared
//! vocabulary used across all other crates.

pub mod config;
pub mod cycle;
pub mod error;
pub mod events;
pub mod ids;
pub mod ports;
pub mod terminal;
pub mod usage;

pub use error::{Error, Result};
pub use ids::*;
