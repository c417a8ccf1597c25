//! Pixpick - an asynchronous, memory-bounded image loading engine.
//!
//! This crate decodes local images off the caller's thread, downsamples them
//! to the size they will be displayed at, keeps the results in a byte-bounded
//! LRU cache and delivers them to display targets that still want them.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing use cases and DTOs.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing the image engine and configuration.
pub mod infrastructure;
/// Presentation layer containing display targets.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "pixpick";
