//! Wiremock helpers serving manifests and packages

use super::manifests::{manifest_json, PublishedPlugin};
use super::packages::{plugin_code, plugin_zip, tar_gz_package};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const MANIFEST_PATH: &str = "/plugins-manifest.json";

pub fn manifest_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), MANIFEST_PATH)
}

/// Serve `body` at `route`
pub async fn mock_bytes(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

/// Serve a status code with an empty body at `route`
pub async fn mock_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serve only the manifest for `plugins`
pub async fn mount_manifest(server: &MockServer, repository_name: &str, plugins: &[PublishedPlugin]) {
    let manifest = manifest_json(&server.uri(), repository_name, plugins);
    mock_bytes(
        server,
        MANIFEST_PATH,
        serde_json::to_vec_pretty(&manifest).unwrap(),
    )
    .await;
}

/// Serve the manifest and a valid package for every version
///
/// Replaces whatever the server served before.
pub async fn publish(server: &MockServer, repository_name: &str, plugins: &[PublishedPlugin]) {
    server.reset().await;
    mount_manifest(server, repository_name, plugins).await;

    for plugin in plugins {
        for version in &plugin.versions {
            let body = if plugin.archive_ext == "tar.gz" {
                let prefix = format!("{}/init.py", plugin.module_name);
                tar_gz_package(&[(prefix.as_str(), plugin_code(version).as_str())])
            } else {
                plugin_zip(version)
            };
            mock_bytes(server, &plugin.archive_path(version), body).await;
        }
    }
}

/// Serve a package that must be downloaded exactly `times` times
pub async fn mock_counted_package(
    server: &MockServer,
    plugin: &PublishedPlugin,
    version: &str,
    times: u64,
) {
    Mock::given(method("GET"))
        .and(path(plugin.archive_path(version)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(plugin_zip(version)))
        .expect(times)
        .mount(server)
        .await;
}
