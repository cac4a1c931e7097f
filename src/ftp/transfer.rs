// ABOUTME: File transfer capability trait used by the FTP deploy command.
// ABOUTME: Abstracts connect, auth, directory operations, and uploads over a session.

use super::error::Result;
use async_trait::async_trait;
use tokio::io::AsyncRead;

/// A directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub is_directory: bool,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }

    /// The `.` and `..` pseudo-entries some servers include in listings.
    pub fn is_pseudo(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}

/// Remote file storage session.
///
/// Paths are remote paths using `/` separators; relative paths resolve
/// against the current working directory.
#[async_trait]
pub trait FileTransfer: Send {
    /// Open the control connection. `host` may carry a `:port` suffix.
    async fn connect(&mut self, host: &str) -> Result<()>;

    /// Log in with user and password.
    async fn authenticate(&mut self, user: &str, password: &str) -> Result<()>;

    /// Whether a control connection is currently open.
    fn is_connected(&self) -> bool;

    /// Create a directory. Succeeds if the directory already exists.
    async fn make_directory(&mut self, path: &str) -> Result<()>;

    async fn change_working_directory(&mut self, path: &str) -> Result<()>;

    async fn print_working_directory(&mut self) -> Result<String>;

    /// List the entries of a directory.
    async fn list_entries(&mut self, path: &str) -> Result<Vec<RemoteEntry>>;

    async fn delete_file(&mut self, path: &str) -> Result<()>;

    /// Remove an empty directory.
    async fn remove_directory(&mut self, path: &str) -> Result<()>;

    /// Switch to binary (image) transfer type.
    async fn set_binary_mode(&mut self) -> Result<()>;

    /// Upload the reader's content to `remote_path`, replacing any existing
    /// file. Returns the number of bytes sent.
    async fn store_file(
        &mut self,
        remote_path: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<u64>;

    /// Close the session.
    async fn disconnect(&mut self) -> Result<()>;
}

/// Creates fresh, unconnected transfer sessions.
pub trait TransferFactory: Send + Sync {
    fn create(&self) -> Box<dyn FileTransfer>;
}

impl<F> TransferFactory for F
where
    F: Fn() -> Box<dyn FileTransfer> + Send + Sync,
{
    fn create(&self) -> Box<dyn FileTransfer> {
        self()
    }
}
