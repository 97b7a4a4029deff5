//! Manifest document builders

use pluginctl_core::types::MANIFEST_FILE_TYPE;
use serde_json::{json, Value};

/// One plugin offered by a test repository
#[derive(Debug, Clone)]
pub struct PublishedPlugin {
    pub name: String,
    pub module_name: String,
    pub caption: String,
    pub versions: Vec<String>,
    pub archive_ext: &'static str,
}

impl PublishedPlugin {
    pub fn new(name: &str, versions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            module_name: name.to_string(),
            caption: format!("{} Testing Plugin", capitalize(name)),
            versions: versions.iter().map(|v| v.to_string()).collect(),
            archive_ext: "zip",
        }
    }

    pub fn module(mut self, module_name: &str) -> Self {
        self.module_name = module_name.to_string();
        self
    }

    pub fn tar_gz(mut self) -> Self {
        self.archive_ext = "tar.gz";
        self
    }

    /// Archive path served for one version
    pub fn archive_path(&self, version: &str) -> String {
        format!("/{}-{}.{}", self.name, version, self.archive_ext)
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Build a manifest whose package urls point at `base_uri`
pub fn manifest_json(base_uri: &str, repository_name: &str, plugins: &[PublishedPlugin]) -> Value {
    let plugins: Vec<Value> = plugins
        .iter()
        .map(|plugin| {
            let versions: Vec<Value> = plugin
                .versions
                .iter()
                .rev()
                .map(|version| {
                    json!({
                        "version": version,
                        "developmentStage": "preview",
                        "changes": [format!("Version {}", version)],
                        "urls": {
                            "community": format!("{}{}", base_uri, plugin.archive_path(version))
                        }
                    })
                })
                .collect();

            json!({
                "name": plugin.name,
                "caption": plugin.caption,
                "moduleName": plugin.module_name,
                "description": format!("Plugin {} used by the integration tests.", plugin.name),
                "latestVersion": plugin.versions.last().cloned().unwrap_or_default(),
                "editions": [{
                    "name": "community",
                    "packagePrefix": format!("test-{}", plugin.name),
                    "licenseHeader": "./resources/license_header.txt",
                    "licenseFile": "./resources/LICENSE.txt"
                }],
                "versions": versions
            })
        })
        .collect();

    json!({
        "fileType": MANIFEST_FILE_TYPE,
        "version": "0.0.1",
        "releaseVersion": "2020.09.03.04.00",
        "repository": {
            "name": repository_name,
            "description": "A repository used by the integration tests."
        },
        "plugins": plugins
    })
}
