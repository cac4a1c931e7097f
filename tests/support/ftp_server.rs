// ABOUTME: Minimal scripted FTP server on localhost for exercising FtpSession.
// ABOUTME: Keeps an in-memory file system and a log of received commands.

use appdeploy::ftp::path;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub password: String,
    pub epsv: bool,
    pub mlsd: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            password: "secret".to_string(),
            epsv: true,
            mlsd: true,
        }
    }
}

#[derive(Debug, Default)]
struct ServerState {
    commands: Vec<String>,
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
}

pub struct FakeFtpServer {
    addr: SocketAddr,
    state: Arc<Mutex<ServerState>>,
    handle: JoinHandle<()>,
}

impl Drop for FakeFtpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl FakeFtpServer {
    pub async fn start(options: ServerOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(ServerState::default()));
        state.lock().dirs.insert("/".to_string());

        let shared = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let _ = serve(stream, &options, &shared).await;
            }
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// `host:port` for `FileTransfer::connect`.
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn add_dir(&self, dir: &str) {
        self.state.lock().dirs.insert(path::normalize(dir));
    }

    pub fn add_file(&self, file: &str, content: &[u8]) {
        self.state
            .lock()
            .files
            .insert(path::normalize(file), content.to_vec());
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().commands.clone()
    }

    pub fn file(&self, file: &str) -> Option<Vec<u8>> {
        self.state.lock().files.get(&path::normalize(file)).cloned()
    }

    pub fn has_dir(&self, dir: &str) -> bool {
        self.state.lock().dirs.contains(&path::normalize(dir))
    }
}

async fn reply(writer: &mut OwnedWriteHalf, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await
}

async fn open_passive(
    writer: &mut OwnedWriteHalf,
    extended: bool,
) -> std::io::Result<TcpStream> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    if extended {
        reply(
            writer,
            &format!("229 Entering Extended Passive Mode (|||{}|)", port),
        )
        .await?;
    } else {
        reply(
            writer,
            &format!(
                "227 Entering Passive Mode (127,0,0,1,{},{})",
                port / 256,
                port % 256
            ),
        )
        .await?;
    }
    let (stream, _) = listener.accept().await?;
    Ok(stream)
}

fn listing(state: &ServerState, dir: &str, machine: bool) -> String {
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

    let mut out = String::new();
    if machine {
        out.push_str("type=cdir;perm=el; .\r\n");
        out.push_str("type=pdir;perm=el; ..\r\n");
    }
    for name in state.dirs.iter().filter_map(direct) {
        if machine {
            out.push_str(&format!("type=dir;modify=20240115103000; {}\r\n", name));
        } else {
            out.push_str(&format!(
                "drwxr-xr-x 1 owner group 0 Jan 15 10:30 {}\r\n",
                name
            ));
        }
    }
    for (file, content) in &state.files {
        if let Some(name) = direct(file) {
            if machine {
                out.push_str(&format!("type=file;size={}; {}\r\n", content.len(), name));
            } else {
                out.push_str(&format!(
                    "-rw-r--r-- 1 owner group {} Jan 15 10:30 {}\r\n",
                    content.len(),
                    name
                ));
            }
        }
    }
    out
}

async fn serve(
    stream: TcpStream,
    options: &ServerOptions,
    state: &Mutex<ServerState>,
) -> std::io::Result<()> {
    let (read, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read);
    let mut cwd = "/".to_string();
    let mut data: Option<TcpStream> = None;

    reply(&mut writer, "220-Fake FTP server").await?;
    reply(&mut writer, "220 Ready").await?;

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let command = line.trim_end_matches(['\r', '\n']).to_string();
        let (verb, arg) = command.split_once(' ').unwrap_or((command.as_str(), ""));
        let verb = verb.to_ascii_uppercase();
        let target = path::normalize(&path::join(&cwd, arg));

        state.lock().commands.push(if verb == "PASS" {
            "PASS ****".to_string()
        } else {
            command.clone()
        });

        match verb.as_str() {
            "USER" => reply(&mut writer, "331 Password required").await?,
            "PASS" if arg == options.password => reply(&mut writer, "230 Logged in").await?,
            "PASS" => reply(&mut writer, "530 Login incorrect").await?,
            "TYPE" => reply(&mut writer, "200 Type set to I").await?,
            "PWD" => {
                let quoted = cwd.replace('"', "\"\"");
                reply(&mut writer, &format!("257 \"{}\" is current directory", quoted)).await?
            }
            "CWD" => {
                let exists = state.lock().dirs.contains(&target);
                if exists {
                    cwd = target;
                    reply(&mut writer, "250 Directory changed").await?
                } else {
                    reply(&mut writer, "550 No such directory").await?
                }
            }
            "MKD" => {
                let created = state.lock().dirs.insert(target.clone());
                if created {
                    reply(&mut writer, &format!("257 \"{}\" created", target)).await?
                } else {
                    reply(&mut writer, "550 Directory already exists").await?
                }
            }
            "EPSV" if options.epsv => data = Some(open_passive(&mut writer, true).await?),
            "PASV" => data = Some(open_passive(&mut writer, false).await?),
            "MLSD" if !options.mlsd => {
                data = None;
                reply(&mut writer, "500 Unknown command").await?
            }
            "MLSD" | "LIST" => {
                let text = {
                    let state = state.lock();
                    state
                        .dirs
                        .contains(&target)
                        .then(|| listing(&state, &target, verb == "MLSD"))
                };
                let Some(mut stream) = data.take() else {
                    reply(&mut writer, "425 No data connection").await?;
                    continue;
                };
                match text {
                    Some(text) => {
                        reply(&mut writer, "150 Opening data connection").await?;
                        stream.write_all(text.as_bytes()).await?;
                        stream.shutdown().await?;
                        drop(stream);
                        reply(&mut writer, "226 Transfer complete").await?
                    }
                    None => reply(&mut writer, "550 No such directory").await?,
                }
            }
            "STOR" => {
                let Some(mut stream) = data.take() else {
                    reply(&mut writer, "425 No data connection").await?;
                    continue;
                };
                reply(&mut writer, "150 Ok to send data").await?;
                let mut content = Vec::new();
                stream.read_to_end(&mut content).await?;
                state.lock().files.insert(target, content);
                reply(&mut writer, "226 Transfer complete").await?
            }
            "DELE" => {
                let removed = state.lock().files.remove(&target).is_some();
                if removed {
                    reply(&mut writer, "250 File deleted").await?
                } else {
                    reply(&mut writer, "550 No such file").await?
                }
            }
            "RMD" => {
                let removed = state.lock().dirs.remove(&target);
                if removed {
                    reply(&mut writer, "250 Directory removed").await?
                } else {
                    reply(&mut writer, "550 No such directory").await?
                }
            }
            "QUIT" => {
                reply(&mut writer, "221 Goodbye").await?;
                return Ok(());
            }
            _ => reply(&mut writer, "502 Command not implemented").await?,
        }
    }
}
