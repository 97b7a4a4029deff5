//! Failed installs leave the previous state untouched

mod common;

use common::*;
use pluginctl_core::Error;
use std::fs;
use wiremock::MockServer;

const REPOSITORY: &str = "Atomicity Repository";

/// Install 0.0.1, then publish 0.0.2 served by `broken`
async fn installed_then_broken(broken: Vec<u8>) -> (MockServer, tempfile::TempDir) {
    let server = MockServer::start().await;
    publish(&server, REPOSITORY, &[PublishedPlugin::new("repo", &["0.0.1"])]).await;
    let home = temp_home();
    register(home.path(), &manifest_url(&server)).await;

    let mut manager = open_manager(home.path(), &[]);
    manager.install("repo", None, false, None).await.unwrap();

    let plugin = PublishedPlugin::new("repo", &["0.0.1", "0.0.2"]);
    server.reset().await;
    mount_manifest(&server, REPOSITORY, &[plugin.clone()]).await;
    mock_bytes(&server, &plugin.archive_path("0.0.2"), broken).await;

    (server, home)
}

async fn assert_upgrade_fails_cleanly(home: &std::path::Path) -> Error {
    let mut manager = open_manager(home, &[]);
    let err = manager.install("repo", None, false, None).await.unwrap_err();

    let manager = open_manager(home, &[]);
    let installed = manager.installed();
    assert_eq!(installed.len(), 1);
    assert_eq!(installed[0].installed_version.to_string(), "0.0.1");
    assert_eq!(installed_code(&manager, "repo"), plugin_code("0.0.1"));
    assert!(staging_is_empty(home));
    err
}

#[tokio::test]
async fn test_corrupt_archive_keeps_previous_version() {
    let (_server, home) = installed_then_broken(corrupt_package()).await;
    let err = assert_upgrade_fails_cleanly(home.path()).await;
    assert!(matches!(err, Error::InstallationFailed { .. }));
}

#[tokio::test]
async fn test_path_traversal_keeps_previous_version() {
    let archive = zip_package(&[("init.py", "evil"), ("../../outside.py", "boom")]);
    let (_server, home) = installed_then_broken(archive).await;

    let err = assert_upgrade_fails_cleanly(home.path()).await;
    assert!(matches!(err, Error::InstallationFailed { .. }));
    assert!(!home.path().join("outside.py").exists());
    assert!(!plugins_dir(home.path()).join("outside.py").exists());
}

#[tokio::test]
async fn test_missing_entry_module_keeps_previous_version() {
    let archive = zip_package(&[("README.md", "no code here")]);
    let (_server, home) = installed_then_broken(archive).await;

    let err = assert_upgrade_fails_cleanly(home.path()).await;
    assert!(err.to_string().contains("init.py"));
}

#[tokio::test]
async fn test_download_failure_keeps_previous_version() {
    let server = MockServer::start().await;
    publish(&server, REPOSITORY, &[PublishedPlugin::new("repo", &["0.0.1"])]).await;
    let home = temp_home();
    register(home.path(), &manifest_url(&server)).await;
    open_manager(home.path(), &[])
        .install("repo", None, false, None)
        .await
        .unwrap();

    let plugin = PublishedPlugin::new("repo", &["0.0.1", "0.0.2"]);
    server.reset().await;
    mount_manifest(&server, REPOSITORY, &[plugin.clone()]).await;
    mock_status(&server, &plugin.archive_path("0.0.2"), 500).await;

    let err = assert_upgrade_fails_cleanly(home.path()).await;
    assert!(matches!(err, Error::Network { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_failed_first_install_leaves_nothing() {
    let server = MockServer::start().await;
    let plugin = PublishedPlugin::new("repo", &["0.0.1"]);
    mount_manifest(&server, REPOSITORY, &[plugin.clone()]).await;
    mock_bytes(&server, &plugin.archive_path("0.0.1"), corrupt_package()).await;
    let home = temp_home();
    register(home.path(), &manifest_url(&server)).await;

    let mut manager = open_manager(home.path(), &[]);
    let err = manager.install("repo", None, false, None).await.unwrap_err();

    assert!(matches!(err, Error::InstallationFailed { .. }));
    assert!(manager.installed().is_empty());
    assert!(!plugins_dir(home.path()).join("repo").exists());
    assert!(staging_is_empty(home.path()));
}

#[tokio::test]
async fn test_foreign_directory_is_not_overwritten() {
    let server = MockServer::start().await;
    publish(&server, REPOSITORY, &[PublishedPlugin::new("repo", &["0.0.1"])]).await;
    let home = temp_home();
    register(home.path(), &manifest_url(&server)).await;

    let foreign = plugins_dir(home.path()).join("repo");
    fs::create_dir_all(&foreign).unwrap();
    fs::write(foreign.join("notes.txt"), "mine").unwrap();

    let mut manager = open_manager(home.path(), &[]);
    let err = manager.install("repo", None, false, None).await.unwrap_err();

    assert!(matches!(err, Error::InstallationFailed { .. }));
    assert_eq!(fs::read_to_string(foreign.join("notes.txt")).unwrap(), "mine");
    assert!(manager.installed().is_empty());
}
