//! Type definitions for manifests, repositories, installed plugins and configuration

mod config_types;
mod installed_types;
mod manifest_types;
mod repository_types;

pub use config_types::*;
pub use installed_types::*;
pub use manifest_types::*;
pub use repository_types::*;
