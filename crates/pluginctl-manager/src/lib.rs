//! Plugin management for pluginctl
//!
//! This crate provides:
//! - Remote manifest fetching and validation ([`manifest`])
//! - The persisted repository registry ([`registry`])
//! - Version aggregation across repositories ([`catalog`])
//! - Archive download and guarded extraction ([`download`], [`archive`])
//! - The installed-plugin index and the install state machine ([`index`], [`engine`])
//! - Confirmation prompts ([`prompt`]) and the command facade ([`manager`])

pub mod archive;
pub mod catalog;
pub mod download;
pub mod engine;
pub mod index;
pub mod manager;
pub mod manifest;
mod persist;
pub mod prompt;
pub mod registry;

pub use catalog::{
    AggregatedPlugin, CatalogEntry, CatalogSnapshot, PluginCandidate, RepositoryFailure,
    ResolvedVersion, SourceSelector, VersionCatalog, VersionRequest,
};
pub use download::{ArchiveDownloader, DownloadedArchive};
pub use engine::{InstallEngine, InstallOutcome};
pub use index::LocalPluginIndex;
pub use manager::{
    ListingRow, ManagerInfo, PluginDetails, PluginListing, PluginManager, UninstallOutcome,
    UpdateOutcome, VersionDetails,
};
pub use manifest::ManifestStore;
pub use prompt::{AssumeYes, ConfirmationGateway, ScriptedGateway};
pub use registry::{RepositoryChange, RepositoryRegistry};
