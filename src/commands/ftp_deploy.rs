// ABOUTME: Uploads the selected workspace files to the site over FTP.
// ABOUTME: Clears the exploded ROOT directory before the root archive is replaced.

use crate::cloud::PublishingProfile;
use crate::deploy::{Command, CommandData, DeploymentState, Outcome, SiteLayout};
use crate::fileset::{self, FileSet};
use crate::ftp::{self, FileTransfer, RemoteEntry, TransferFactory, path};
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use secrecy::ExposeSecret;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// What the FTP deploy command reads from the context.
pub trait FtpDeployData: CommandData {
    /// Comma-separated include patterns.
    fn file_pattern(&self) -> &str;

    /// Sub-directory of the workspace the patterns are relative to.
    fn source_directory(&self) -> Option<&str>;

    /// Sub-directory of the site root to upload into.
    fn target_directory(&self) -> Option<&str>;

    fn site(&self) -> &SiteLayout;

    fn publishing_profile(&self) -> Option<&PublishingProfile>;
}

#[derive(Debug, Error)]
enum DeployError {
    #[error(transparent)]
    Ftp(#[from] ftp::Error),

    #[error(transparent)]
    Files(#[from] fileset::Error),

    #[error("cannot read {}: {source}", path.display())]
    Local {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Pushes files to the site's storage over a fresh FTP session per run.
pub struct FtpDeployCommand {
    transfers: Arc<dyn TransferFactory>,
}

impl FtpDeployCommand {
    pub fn new(transfers: impl TransferFactory + 'static) -> Self {
        Self {
            transfers: Arc::new(transfers),
        }
    }
}

#[async_trait]
impl Command for FtpDeployCommand {
    type Data = dyn FtpDeployData;

    async fn execute(&self, data: &mut Self::Data) -> Outcome {
        let Some(profile) = data.publishing_profile().cloned() else {
            data.log_error("Fail to deploy to FTP: no publishing profile available");
            return Outcome::Failed;
        };

        let host = ftp_host(&profile.ftp_url);
        data.log_status(&format!("Starting to deploy to FTP: {}", host));

        let mut ftp = self.transfers.create();
        let result = upload(&*data, ftp.as_mut(), &host, &profile).await;

        let outcome = match result {
            Ok(count) => {
                data.set_deployment_state(DeploymentState::Success);
                data.log_status(&format!("Deployed {} file(s) to {}", count, host));
                Outcome::Succeeded
            }
            Err(e) => {
                data.log_fault("Fail to deploy to FTP: ", &e);
                Outcome::Failed
            }
        };

        if ftp.is_connected()
            && let Err(e) = ftp.disconnect().await
        {
            data.log_status(&format!("Fail to disconnect from FTP: {}", e));
        }

        outcome
    }
}

/// Host part of a publish URL: scheme stripped, path dropped, port kept.
pub fn ftp_host(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    let rest = ["ftp://", "ftps://"]
        .iter()
        .find(|scheme| lower.starts_with(*scheme))
        .map_or(url, |scheme| &url[scheme.len()..]);

    match rest.find('/') {
        Some(i) if i > 0 => rest[..i].to_string(),
        _ => rest.to_string(),
    }
}

async fn upload(
    data: &dyn FtpDeployData,
    ftp: &mut dyn FileTransfer,
    host: &str,
    profile: &PublishingProfile,
) -> Result<usize, DeployError> {
    ftp.connect(host).await?;
    ftp.authenticate(&profile.ftp_username, profile.ftp_password.expose_secret())
        .await?;

    let site = data.site();
    let target = site.target_directory(data.target_directory());
    ftp.make_directory(&target).await?;
    ftp.change_working_directory(&target).await?;
    let pwd = ftp.print_working_directory().await?;
    data.log_status(&format!("Working directory: {}", pwd));

    let mut base = data.job().workspace().to_path_buf();
    if let Some(source) = data.source_directory()
        && !source.is_empty()
    {
        base.push(source);
    }
    let files = FileSet::new(&base, data.file_pattern())?.included_files()?;

    let root_archive = site.sentinel_archive();
    let root_dir = site.sentinel_directory();
    let mut created = HashSet::new();

    for relative in &files {
        data.log_status(&format!("Uploading {}", relative));

        if path::same_path(&path::join(&pwd, relative), &root_archive) {
            clear_root_directory(ftp, data, &root_dir).await?;
        }

        prepare_directory(ftp, relative, &mut created).await?;
        ftp.set_binary_mode().await?;

        let local = base.join(relative);
        let mut file = tokio::fs::File::open(&local)
            .await
            .map_err(|source| DeployError::Local {
                path: local.clone(),
                source,
            })?;
        let bytes = ftp.store_file(relative, &mut file).await?;
        tracing::debug!("Stored {} ({} bytes)", relative, bytes);
    }

    Ok(files.len())
}

/// Create the remote parent directories of `relative` not yet created this run.
async fn prepare_directory(
    ftp: &mut dyn FileTransfer,
    relative: &str,
    created: &mut HashSet<String>,
) -> ftp::Result<()> {
    let Some((parent, _)) = relative.rsplit_once('/') else {
        return Ok(());
    };

    let mut prefix = String::new();
    for segment in parent.split('/').filter(|s| !s.is_empty()) {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);
        if created.insert(prefix.clone()) {
            ftp.make_directory(&prefix).await?;
        }
    }
    Ok(())
}

/// Delete the exploded root directory so the server re-extracts the new archive.
async fn clear_root_directory(
    ftp: &mut dyn FileTransfer,
    data: &dyn FtpDeployData,
    dir: &str,
) -> ftp::Result<()> {
    let entries = match ftp.list_entries(dir).await {
        Ok(entries) => entries,
        Err(e) if e.is_not_found() => {
            tracing::debug!("{} does not exist, nothing to remove", dir);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if entries.iter().all(RemoteEntry::is_pseudo) {
        // Some servers list a missing directory as empty.
        data.log_status(&format!("Removing remote directory: {}", dir));
        return match ftp.remove_directory(dir).await {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        };
    }

    remove_listed_directory(ftp, data, dir.to_string(), entries).await
}

fn remove_listed_directory<'a>(
    ftp: &'a mut dyn FileTransfer,
    data: &'a dyn FtpDeployData,
    dir: String,
    entries: Vec<RemoteEntry>,
) -> BoxFuture<'a, ftp::Result<()>> {
    async move {
        data.log_status(&format!("Removing remote directory: {}", dir));

        for entry in entries.into_iter().filter(|e| !e.is_pseudo()) {
            let child = path::join(&dir, &entry.name);
            if entry.is_directory {
                let nested = ftp.list_entries(&child).await?;
                remove_listed_directory(&mut *ftp, data, child, nested).await?;
            } else {
                data.log_status(&format!("Removing remote file: {}", child));
                ftp.delete_file(&child).await?;
            }
        }

        ftp.remove_directory(&dir).await
    }
    .boxed()
}
