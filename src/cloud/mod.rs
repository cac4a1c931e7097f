// ABOUTME: Azure App Service management client and credential-keyed client cache.
// ABOUTME: Resolves web apps and their FTP publishing profiles.

mod arm;
mod cache;
mod client;
mod credentials;
mod error;
mod profile;

pub use arm::{ArmClient, ArmClientFactory, ManagementConfig};
pub use cache::{ClientCache, ClientFactory};
pub use client::{AppServiceClient, WebApp};
pub use credentials::ServicePrincipal;
pub use error::{Error, Result};
pub use profile::PublishingProfile;
