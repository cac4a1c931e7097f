// ABOUTME: Remote layout of an App Service site: root folder and the ROOT.war sentinel pair.
// ABOUTME: Uploading the root archive requires deleting its exploded directory first.

use crate::ftp::path;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SiteLayout {
    /// Absolute site root on the FTP server.
    pub root: String,
    /// Archive path relative to `root` that the server explodes on arrival.
    pub root_archive: String,
    /// Directory relative to `root` the archive is exploded into.
    pub root_dir: String,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            root: "/site/wwwroot/".to_string(),
            root_archive: "webapps/ROOT.war".to_string(),
            root_dir: "webapps/ROOT".to_string(),
        }
    }
}

impl SiteLayout {
    /// Remote directory files are uploaded into.
    pub fn target_directory(&self, target_dir: Option<&str>) -> String {
        let sub = target_dir.unwrap_or("").trim_start_matches(['/', '\\']);
        format!("{}{}", self.root_with_separator(), sub)
    }

    pub fn sentinel_archive(&self) -> String {
        path::join(&self.root, &self.root_archive)
    }

    pub fn sentinel_directory(&self) -> String {
        path::join(&self.root, &self.root_dir)
    }

    fn root_with_separator(&self) -> String {
        if self.root.ends_with('/') {
            self.root.clone()
        } else {
            format!("{}/", self.root)
        }
    }
}
