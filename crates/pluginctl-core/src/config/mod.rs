//! Configuration loading and on-disk layout of the user config home

mod loader;

pub use loader::{ConfigLoader, HomeLayout, CONFIG_FILE_NAME};
