// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates a commented appdeploy.yml template.

use std::path::Path;

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, template_yaml())?;

    Ok(())
}

pub fn template_yaml() -> &'static str {
    r#"resource_group: my-resource-group
app_name: my-app

credential:
  id: my-service-principal
  subscription_id: 00000000-0000-0000-0000-000000000000
  # Bearer token for the management API, e.g. from `az account get-access-token`
  token:
    env: AZURE_ACCESS_TOKEN

# Comma-separated Ant-style patterns, relative to source_dir
files: "**/*.war"
# source_dir: target
# target_dir: webapps

# Skip the management API lookup by supplying the FTP profile directly:
# publish_profile:
#   ftp_url: ftp://waws-prod-xyz.ftp.azurewebsites.windows.net/site/wwwroot
#   username: my-app\$my-app
#   password:
#     env: FTP_PASSWORD

# site:
#   root: /site/wwwroot/
#   root_archive: webapps/ROOT.war
#   root_dir: webapps/ROOT

# ftp:
#   port: 21
#   connect_timeout: 30s
#   read_timeout: 2m

# management:
#   endpoint: https://management.azure.com
#   timeout: 30s
#   cache_ttl: 30m
"#
}
