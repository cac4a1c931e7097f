// ABOUTME: FTP transfer module for pushing files to a site's storage.
// ABOUTME: Exposes the FileTransfer capability and a tokio FTP session implementing it.

mod error;
pub mod path;
mod session;
mod transfer;

pub use error::{Error, Reply, Result};
pub use session::{FtpConfig, FtpSession};
pub use transfer::{FileTransfer, RemoteEntry, TransferFactory};
