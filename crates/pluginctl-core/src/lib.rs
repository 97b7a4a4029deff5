//! # pluginctl-core
//!
//! Core library for pluginctl providing:
//! - Manifest, repository and installed-plugin types
//! - Plugin version parsing and ordering
//! - The shared error taxonomy
//! - Configuration loading and user home layout

pub mod config;
pub mod error;
pub mod types;
pub mod utils;
pub mod version;

pub use config::{ConfigLoader, HomeLayout};
pub use error::{Error, Result};
pub use types::{NetworkConfig, PluginsConfig};
pub use utils::get_home_dir;
pub use version::PluginVersion;
