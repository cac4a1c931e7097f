// ABOUTME: Deployment commands run by the orchestrator.
// ABOUTME: Publish settings lookup and FTP upload, each with its context view.

mod ftp_deploy;
mod publish_settings;

pub use ftp_deploy::{FtpDeployCommand, FtpDeployData, ftp_host};
pub use publish_settings::{GetPublishSettingsCommand, PublishSettingsData};
