// ABOUTME: Configuration types and parsing for appdeploy.yml.
// ABOUTME: Handles YAML parsing, env var interpolation, and validation.

mod deserialize;
mod env_value;
mod init;

pub use env_value::EnvValue;
pub use init::{init_config, template_yaml};

use crate::cloud::{ManagementConfig, PublishingProfile, ServicePrincipal};
use crate::deploy::{DEFAULT_MAX_STEPS, DeploySettings, SiteLayout, TransitionTable};
use crate::error::{Error, Result};
use crate::ftp::FtpConfig;
use deserialize::deserialize_patterns;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "appdeploy.yml";
pub const CONFIG_FILENAME_ALT: &str = "appdeploy.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".appdeploy/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resource_group: String,

    #[serde(default)]
    pub app_name: String,

    #[serde(default)]
    pub credential: Option<CredentialConfig>,

    /// Known FTP profile. When set, the management API is not consulted.
    #[serde(default)]
    pub publish_profile: Option<PublishProfileConfig>,

    #[serde(deserialize_with = "deserialize_patterns")]
    pub files: NonEmpty<String>,

    #[serde(default)]
    pub source_dir: Option<String>,

    #[serde(default)]
    pub target_dir: Option<String>,

    #[serde(default)]
    pub site: SiteLayout,

    #[serde(default)]
    pub ftp: FtpConfig,

    #[serde(default)]
    pub management: ManagementConfig,

    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialConfig {
    pub id: String,
    pub subscription_id: String,
    pub token: EnvValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishProfileConfig {
    pub ftp_url: String,
    pub username: String,
    pub password: EnvValue,
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        Self::load(&Self::locate(dir)?)
    }

    /// First existing config file in `dir`.
    pub fn locate(dir: &Path) -> Result<PathBuf> {
        [CONFIG_FILENAME, CONFIG_FILENAME_ALT, CONFIG_FILENAME_DIR]
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
            .ok_or_else(|| Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Check cross-field requirements serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.publish_profile.is_none() {
            if self.resource_group.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "resource_group is required without publish_profile".to_string(),
                ));
            }
            if self.app_name.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "app_name is required without publish_profile".to_string(),
                ));
            }
            if self.credential.is_none() {
                return Err(Error::InvalidConfig(
                    "credential is required without publish_profile".to_string(),
                ));
            }
        }

        if self.max_steps == 0 {
            return Err(Error::InvalidConfig(
                "max_steps must be at least 1".to_string(),
            ));
        }

        if self.site.root.is_empty() || !self.site.root.starts_with('/') {
            return Err(Error::InvalidConfig(format!(
                "site.root must be an absolute path, got {:?}",
                self.site.root
            )));
        }

        Ok(())
    }

    /// Patterns joined into the comma-separated form the file set expects.
    pub fn file_pattern(&self) -> String {
        self.files.iter().map(String::as_str).collect::<Vec<_>>().join(",")
    }

    pub fn resolve_credential(&self) -> Result<Option<ServicePrincipal>> {
        self.credential
            .as_ref()
            .map(|c| {
                Ok(ServicePrincipal::new(
                    &c.id,
                    &c.subscription_id,
                    c.token.resolve_secret()?,
                ))
            })
            .transpose()
    }

    pub fn resolve_publish_profile(&self) -> Result<Option<PublishingProfile>> {
        self.publish_profile
            .as_ref()
            .map(|p| {
                Ok(PublishingProfile::new(
                    &p.ftp_url,
                    &p.username,
                    p.password.resolve_secret()?,
                ))
            })
            .transpose()
    }

    /// Command graph for this configuration.
    pub fn transition_table(&self) -> TransitionTable {
        if self.publish_profile.is_some() {
            TransitionTable::deploy_only()
        } else {
            TransitionTable::publish_and_deploy()
        }
    }

    /// Settings for the run. The credential is only resolved when the lookup command runs.
    pub fn deploy_settings(&self) -> Result<DeploySettings> {
        let credential = if self.publish_profile.is_none() {
            self.resolve_credential()?
        } else {
            None
        };

        Ok(DeploySettings {
            files: self.file_pattern(),
            source_dir: self.source_dir.clone(),
            target_dir: self.target_dir.clone(),
            resource_group: self.resource_group.clone(),
            app_name: self.app_name.clone(),
            credential,
            site: self.site.clone(),
        })
    }
}
