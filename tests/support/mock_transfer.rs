// ABOUTME: In-memory FileTransfer with a call log and fault injection.
// ABOUTME: Behaves like a small FTP server file system rooted at "/".

use appdeploy::ftp::{self, FileTransfer, RemoteEntry, Reply, TransferFactory, path};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};

#[derive(Debug, Default)]
pub struct MockState {
    pub calls: Vec<String>,
    pub dirs: BTreeSet<String>,
    pub files: BTreeMap<String, Vec<u8>>,
    pub cwd: String,
    pub connected: bool,
    pub sessions: usize,
    /// Operation name -> injected failure.
    pub faults: BTreeMap<&'static str, Fault>,
    /// Servers that list a missing directory as empty instead of replying 550.
    pub lenient_listing: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum Fault {
    Reply(u16),
    Connection,
}

/// Handle shared between a test and the transfers it hands out.
#[derive(Debug, Clone, Default)]
pub struct MockServer {
    state: Arc<Mutex<MockState>>,
}

impl MockServer {
    pub fn new() -> Self {
        let server = Self::default();
        server.state.lock().dirs.insert("/".to_string());
        server
    }

    pub fn with_dir(self, dir: &str) -> Self {
        self.state.lock().dirs.insert(path::normalize(dir));
        self
    }

    pub fn with_file(self, file: &str, content: &[u8]) -> Self {
        self.state
            .lock()
            .files
            .insert(path::normalize(file), content.to_vec());
        self
    }

    pub fn fail_on(self, operation: &'static str, fault: Fault) -> Self {
        self.state.lock().faults.insert(operation, fault);
        self
    }

    pub fn lenient_listing(self) -> Self {
        self.state.lock().lenient_listing = true;
        self
    }

    pub fn factory(&self) -> impl TransferFactory + 'static {
        let state = Arc::clone(&self.state);
        move || {
            state.lock().sessions += 1;
            Box::new(MockTransfer {
                state: Arc::clone(&state),
            }) as Box<dyn FileTransfer>
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn has_dir(&self, dir: &str) -> bool {
        self.state.lock().dirs.contains(&path::normalize(dir))
    }

    pub fn file(&self, file: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(&path::normalize(file)).cloned()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.state.lock().files.keys().cloned().collect()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    pub fn sessions(&self) -> usize {
        self.state.lock().sessions
    }
}

pub struct MockTransfer {
    state: Arc<Mutex<MockState>>,
}

impl MockState {
    fn record(&mut self, operation: &'static str, call: String) -> ftp::Result<()> {
        self.calls.push(call);
        match self.faults.get(operation) {
            None => Ok(()),
            Some(Fault::Connection) => {
                self.connected = false;
                Err(ftp::Error::Connection("injected failure".to_string()))
            }
            Some(Fault::Reply(code)) => Err(rejected(operation, *code, "injected failure")),
        }
    }

    fn resolve(&self, p: &str) -> String {
        path::normalize(&path::join(&self.cwd, p))
    }

    fn require_connection(&self) -> ftp::Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(ftp::Error::NotConnected)
        }
    }

    fn children(&self, dir: &str) -> Vec<RemoteEntry> {
        let prefix = if dir == "/" {
            "/".to_string()
        } else {
            format!("{}/", dir)
        };
        let direct = |p: &String| {
            p.strip_prefix(&prefix)
                .filter(|rest| !rest.is_empty() && !rest.contains('/'))
                .map(str::to_string)
        };

        let mut entries = vec![RemoteEntry::directory("."), RemoteEntry::directory("..")];
        entries.extend(self.dirs.iter().filter_map(direct).map(RemoteEntry::directory));
        entries.extend(self.files.keys().filter_map(direct).map(RemoteEntry::file));
        entries
    }
}

fn rejected(command: &str, code: u16, text: &str) -> ftp::Error {
    ftp::Error::Rejected {
        command: command.to_string(),
        reply: Reply::new(code, text),
    }
}

#[async_trait]
impl FileTransfer for MockTransfer {
    async fn connect(&mut self, host: &str) -> ftp::Result<()> {
        let mut state = self.state.lock();
        state.record("connect", format!("connect {}", host))?;
        state.connected = true;
        state.cwd = "/".to_string();
        Ok(())
    }

    async fn authenticate(&mut self, user: &str, _password: &str) -> ftp::Result<()> {
        let mut state = self.state.lock();
        state.require_connection()?;
        state.record("authenticate", format!("authenticate {}", user))
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    async fn make_directory(&mut self, p: &str) -> ftp::Result<()> {
        let mut state = self.state.lock();
        state.require_connection()?;
        let resolved = state.resolve(p);
        state.record("make_directory", format!("mkdir {}", resolved))?;
        state.dirs.insert(resolved);
        Ok(())
    }

    async fn change_working_directory(&mut self, p: &str) -> ftp::Result<()> {
        let mut state = self.state.lock();
        state.require_connection()?;
        let resolved = state.resolve(p);
        state.record("change_working_directory", format!("cwd {}", resolved))?;
        if !state.dirs.contains(&resolved) {
            return Err(rejected("CWD", 550, "No such directory"));
        }
        state.cwd = resolved;
        Ok(())
    }

    async fn print_working_directory(&mut self) -> ftp::Result<String> {
        let mut state = self.state.lock();
        state.require_connection()?;
        state.record("print_working_directory", "pwd".to_string())?;
        Ok(state.cwd.clone())
    }

    async fn list_entries(&mut self, p: &str) -> ftp::Result<Vec<RemoteEntry>> {
        let mut state = self.state.lock();
        state.require_connection()?;
        let resolved = state.resolve(p);
        state.record("list_entries", format!("list {}", resolved))?;
        if !state.dirs.contains(&resolved) {
            if state.lenient_listing {
                return Ok(Vec::new());
            }
            return Err(rejected("MLSD", 550, "No such directory"));
        }
        Ok(state.children(&resolved))
    }

    async fn delete_file(&mut self, p: &str) -> ftp::Result<()> {
        let mut state = self.state.lock();
        state.require_connection()?;
        let resolved = state.resolve(p);
        state.record("delete_file", format!("delete {}", resolved))?;
        match state.files.remove(&resolved) {
            Some(_) => Ok(()),
            None => Err(rejected("DELE", 550, "No such file")),
        }
    }

    async fn remove_directory(&mut self, p: &str) -> ftp::Result<()> {
        let mut state = self.state.lock();
        state.require_connection()?;
        let resolved = state.resolve(p);
        state.record("remove_directory", format!("rmdir {}", resolved))?;
        if !state.dirs.contains(&resolved) {
            return Err(rejected("RMD", 550, "No such directory"));
        }
        if state.children(&resolved).iter().any(|e| !e.is_pseudo()) {
            return Err(rejected("RMD", 550, "Directory not empty"));
        }
        state.dirs.remove(&resolved);
        Ok(())
    }

    async fn set_binary_mode(&mut self) -> ftp::Result<()> {
        let mut state = self.state.lock();
        state.require_connection()?;
        state.record("set_binary_mode", "binary".to_string())
    }

    async fn store_file(
        &mut self,
        remote_path: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> ftp::Result<u64> {
        let resolved = {
            let mut state = self.state.lock();
            state.require_connection()?;
            let resolved = state.resolve(remote_path);
            state.record("store_file", format!("store {}", resolved))?;
            resolved
        };

        let mut content = Vec::new();
        reader.read_to_end(&mut content).await?;
        let len = content.len() as u64;
        self.state.lock().files.insert(resolved, content);
        Ok(len)
    }

    async fn disconnect(&mut self) -> ftp::Result<()> {
        let mut state = self.state.lock();
        let result = state.record("disconnect", "disconnect".to_string());
        state.connected = false;
        result
    }
}
