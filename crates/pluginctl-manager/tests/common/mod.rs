//! Common test infrastructure for pluginctl-manager integration tests
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! - `packages`: zip and tar.gz plugin package builders
//! - `manifests`: manifest document builders
//! - `mock_server`: wiremock helpers serving manifests and packages
//! - `fixtures`: manager construction over a temporary config home

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fixtures;
pub mod manifests;
pub mod mock_server;
pub mod packages;

pub use fixtures::*;
pub use manifests::*;
pub use mock_server::*;
pub use packages::*;
