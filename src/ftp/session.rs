// ABOUTME: FTP session over tokio TCP streams.
// ABOUTME: Implements the control channel, passive data connections, and listing parsers.

use super::error::{Error, Reply, Result};
use super::transfer::{FileTransfer, RemoteEntry};
use async_trait::async_trait;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

pub const DEFAULT_PORT: u16 = 21;

/// Connection settings for FTP sessions.
#[derive(Debug, Clone, Deserialize)]
pub struct FtpConfig {
    /// Port used when the host carries no explicit `:port`.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Timeout for each server reply and data transfer read.
    #[serde(default = "default_read_timeout", with = "humantime_serde")]
    pub read_timeout: Duration,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(120)
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
        }
    }
}

struct Control {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer: IpAddr,
}

/// A single FTP session using passive mode data connections.
///
/// Only plain FTP is supported; the data connection is always opened to the
/// control connection's peer address, ignoring the address in PASV replies.
pub struct FtpSession {
    config: FtpConfig,
    control: Option<Control>,
    epsv_unsupported: bool,
    mlsd_unsupported: bool,
}

impl std::fmt::Debug for FtpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpSession")
            .field("config", &self.config)
            .field("connected", &self.control.is_some())
            .finish()
    }
}

impl FtpSession {
    pub fn new(config: FtpConfig) -> Self {
        Self {
            config,
            control: None,
            epsv_unsupported: false,
            mlsd_unsupported: false,
        }
    }

    fn control(&mut self) -> Result<&mut Control> {
        self.control.as_mut().ok_or(Error::NotConnected)
    }

    /// Read one reply. A broken or silent control channel ends the session.
    async fn read_reply(&mut self) -> Result<Reply> {
        let timeout = self.config.read_timeout;
        let control = self.control()?;
        let result = match tokio::time::timeout(timeout, read_server_reply(&mut control.reader)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(timeout)),
        };

        match result {
            Ok(reply) => {
                tracing::debug!(code = reply.code, "<- {}", reply.text);
                Ok(reply)
            }
            Err(e) => {
                if matches!(e, Error::Connection(_) | Error::Io(_) | Error::Timeout(_)) {
                    self.control = None;
                }
                Err(e)
            }
        }
    }

    async fn send(&mut self, command: &str) -> Result<Reply> {
        if command.starts_with("PASS ") {
            tracing::debug!("-> PASS ****");
        } else {
            tracing::debug!("-> {}", command);
        }

        let control = self.control()?;
        let written = async {
            control.writer.write_all(command.as_bytes()).await?;
            control.writer.write_all(b"\r\n").await?;
            control.writer.flush().await
        }
        .await;
        if let Err(e) = written {
            self.control = None;
            return Err(e.into());
        }

        self.read_reply().await
    }

    async fn expect_completion(&mut self, command: &str) -> Result<Reply> {
        let reply = self.send(command).await?;
        if reply.is_completion() {
            Ok(reply)
        } else {
            Err(rejected(command, reply))
        }
    }

    async fn passive_address(&mut self) -> Result<SocketAddr> {
        let peer = self.control()?.peer;

        if !self.epsv_unsupported {
            let reply = self.send("EPSV").await?;
            if reply.code == 229 {
                return parse_epsv_port(&reply.text).map(|port| SocketAddr::new(peer, port));
            }
            self.epsv_unsupported = true;
        }

        let reply = self.send("PASV").await?;
        if reply.code != 227 {
            return Err(rejected("PASV", reply));
        }
        parse_pasv_port(&reply.text).map(|port| SocketAddr::new(peer, port))
    }

    async fn open_data_connection(&mut self) -> Result<TcpStream> {
        let addr = self.passive_address().await?;
        let timeout = self.config.connect_timeout;
        match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(Error::Connection(format!(
                "data connection to {}: {}",
                addr, e
            ))),
            Err(_) => Err(Error::Timeout(timeout)),
        }
    }

    /// Run a command whose result arrives over a data connection.
    async fn retrieve_text(&mut self, command: &str) -> Result<String> {
        let mut data = self.open_data_connection().await?;
        let reply = self.send(command).await?;
        if !reply.is_preliminary() && !reply.is_completion() {
            return Err(rejected(command, reply));
        }

        let timeout = self.config.read_timeout;
        let mut buf = Vec::new();
        match tokio::time::timeout(timeout, data.read_to_end(&mut buf)).await {
            Ok(read) => {
                read?;
            }
            Err(_) => return Err(Error::Timeout(timeout)),
        }
        drop(data);

        if reply.is_preliminary() {
            let done = self.read_reply().await?;
            if !done.is_completion() {
                return Err(rejected(command, done));
            }
        }

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Stream `reader` into a data connection. Each read, write and the final
/// shutdown must make progress within `timeout`.
async fn send_data(
    reader: &mut (dyn AsyncRead + Unpin + Send),
    data: &mut TcpStream,
    timeout: Duration,
) -> Result<u64> {
    let mut buf = vec![0u8; 64 * 1024];
    let mut sent = 0u64;
    loop {
        let n = match tokio::time::timeout(timeout, reader.read(&mut buf)).await {
            Ok(read) => read?,
            Err(_) => return Err(Error::Timeout(timeout)),
        };
        if n == 0 {
            break;
        }
        match tokio::time::timeout(timeout, data.write_all(&buf[..n])).await {
            Ok(written) => written?,
            Err(_) => return Err(Error::Timeout(timeout)),
        }
        sent += n as u64;
    }

    match tokio::time::timeout(timeout, data.shutdown()).await {
        Ok(done) => done?,
        Err(_) => return Err(Error::Timeout(timeout)),
    }
    Ok(sent)
}

#[async_trait]
impl FileTransfer for FtpSession {
    async fn connect(&mut self, host: &str) -> Result<()> {
        let (name, port) = split_host_port(host, self.config.port);
        let timeout = self.config.connect_timeout;

        let stream = match tokio::time::timeout(timeout, TcpStream::connect((name, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(Error::Connection(format!("{}:{}: {}", name, port, e))),
            Err(_) => return Err(Error::Timeout(timeout)),
        };
        let peer = stream.peer_addr()?.ip();
        let (read, write) = stream.into_split();
        self.control = Some(Control {
            reader: BufReader::new(read),
            writer: write,
            peer,
        });

        let mut greeting = self.read_reply().await?;
        while greeting.is_preliminary() {
            greeting = self.read_reply().await?;
        }
        if greeting.code != 220 {
            self.control = None;
            return Err(Error::Connection(format!("unexpected greeting: {}", greeting)));
        }

        tracing::debug!("Connected to {}:{}", name, port);
        Ok(())
    }

    async fn authenticate(&mut self, user: &str, password: &str) -> Result<()> {
        let reply = self.send(&format!("USER {}", user)).await?;
        let reply = match reply.code {
            230 => return Ok(()),
            331 | 332 => self.send(&format!("PASS {}", password)).await?,
            _ => {
                return Err(Error::AuthenticationFailed {
                    user: user.to_string(),
                    reply,
                });
            }
        };

        match reply.code {
            230 | 202 => Ok(()),
            _ => Err(Error::AuthenticationFailed {
                user: user.to_string(),
                reply,
            }),
        }
    }

    fn is_connected(&self) -> bool {
        self.control.is_some()
    }

    async fn make_directory(&mut self, path: &str) -> Result<()> {
        let command = format!("MKD {}", path);
        let reply = self.send(&command).await?;
        match reply.code {
            250 | 257 => Ok(()),
            // 521 is the RFC 959 "already exists" reply; IIS answers 550 with a message.
            521 => Ok(()),
            550 if reply.text.to_ascii_lowercase().contains("exist") => Ok(()),
            _ => Err(rejected(&command, reply)),
        }
    }

    async fn change_working_directory(&mut self, path: &str) -> Result<()> {
        self.expect_completion(&format!("CWD {}", path)).await?;
        Ok(())
    }

    async fn print_working_directory(&mut self) -> Result<String> {
        let reply = self.expect_completion("PWD").await?;
        parse_quoted_path(&reply.text)
    }

    async fn list_entries(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        if !self.mlsd_unsupported {
            match self.retrieve_text(&format!("MLSD {}", path)).await {
                Ok(text) => return Ok(parse_mlsd(&text)),
                Err(Error::Rejected { reply, .. }) if matches!(reply.code, 500 | 502 | 504) => {
                    tracing::debug!("MLSD unsupported, falling back to LIST");
                    self.mlsd_unsupported = true;
                }
                Err(e) => return Err(e),
            }
        }

        let text = self.retrieve_text(&format!("LIST {}", path)).await?;
        Ok(parse_list(&text))
    }

    async fn delete_file(&mut self, path: &str) -> Result<()> {
        self.expect_completion(&format!("DELE {}", path)).await?;
        Ok(())
    }

    async fn remove_directory(&mut self, path: &str) -> Result<()> {
        self.expect_completion(&format!("RMD {}", path)).await?;
        Ok(())
    }

    async fn set_binary_mode(&mut self) -> Result<()> {
        self.expect_completion("TYPE I").await?;
        Ok(())
    }

    async fn store_file(
        &mut self,
        remote_path: &str,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<u64> {
        let mut data = self.open_data_connection().await?;
        let command = format!("STOR {}", remote_path);
        let reply = self.send(&command).await?;
        if !reply.is_preliminary() {
            return Err(rejected(&command, reply));
        }

        let sent = match send_data(reader, &mut data, self.config.read_timeout).await {
            Ok(sent) => sent,
            Err(e) => {
                // The server is still mid-transfer, so the control channel is unusable.
                self.control = None;
                return Err(e);
            }
        };
        drop(data);

        let done = self.read_reply().await?;
        if !done.is_completion() {
            return Err(rejected(&command, done));
        }
        Ok(sent)
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.control.is_none() {
            return Ok(());
        }

        let result = self.send("QUIT").await;
        if let Some(mut control) = self.control.take() {
            // The server closes its side after 221; a failed shutdown changes nothing.
            let _ = control.writer.shutdown().await;
        }
        result.map(|_| ())
    }
}

fn rejected(command: &str, reply: Reply) -> Error {
    Error::Rejected {
        command: command.to_string(),
        reply,
    }
}

/// Split `host[:port]`, falling back to `default_port`.
fn split_host_port(host: &str, default_port: u16) -> (&str, u16) {
    if let Some((name, port)) = host.rsplit_once(':')
        && !name.contains(':')
        && let Ok(port) = port.parse::<u16>()
    {
        return (name, port);
    }
    (host, default_port)
}

async fn read_server_reply<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Reply> {
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Err(Error::Connection("connection closed by server".to_string()));
    }

    let (code, first, multiline) = parse_reply_line(&line)?;
    let mut text = first.to_string();
    if !multiline {
        return Ok(Reply::new(code, text));
    }

    let terminator = format!("{:03} ", code);
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Err(Error::Connection("connection closed by server".to_string()));
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        text.push('\n');
        if let Some(last) = trimmed.strip_prefix(terminator.as_str()) {
            text.push_str(last);
            return Ok(Reply::new(code, text));
        }
        text.push_str(trimmed);
    }
}

fn parse_reply_line(line: &str) -> Result<(u16, &str, bool)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let invalid = || Error::Protocol(format!("invalid reply line: {:?}", line));

    if line.len() < 3 || !line.is_char_boundary(3) {
        return Err(invalid());
    }
    let code: u16 = line[..3].parse().map_err(|_| invalid())?;
    match line.as_bytes().get(3) {
        None => Ok((code, "", false)),
        Some(b' ') => Ok((code, &line[4..], false)),
        Some(b'-') => Ok((code, &line[4..], true)),
        Some(_) => Err(invalid()),
    }
}

/// Extract the path from a 257 reply: `"/dir ""quoted"""` -> `/dir "quoted"`.
fn parse_quoted_path(text: &str) -> Result<String> {
    let start = text
        .find('"')
        .ok_or_else(|| Error::Protocol(format!("no quoted path in reply: {}", text)))?;

    let mut path = String::new();
    let mut chars = text[start + 1..].chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                path.push('"');
            } else {
                return Ok(path);
            }
        } else {
            path.push(c);
        }
    }
    Err(Error::Protocol(format!("unterminated quoted path: {}", text)))
}

/// Port from a 229 reply: `Entering Extended Passive Mode (|||6446|)`.
fn parse_epsv_port(text: &str) -> Result<u16> {
    let invalid = || Error::Protocol(format!("invalid EPSV reply: {}", text));
    let open = text.find('(').ok_or_else(invalid)?;
    let close = text[open..].find(')').ok_or_else(invalid)? + open;
    let inner = &text[open + 1..close];
    let delimiter = inner.chars().next().ok_or_else(invalid)?;
    inner
        .split(delimiter)
        .nth(3)
        .and_then(|port| port.parse().ok())
        .ok_or_else(invalid)
}

/// Port from a 227 reply: `Entering Passive Mode (h1,h2,h3,h4,p1,p2)`.
fn parse_pasv_port(text: &str) -> Result<u16> {
    let invalid = || Error::Protocol(format!("invalid PASV reply: {}", text));
    let start = text.find(|c: char| c.is_ascii_digit()).ok_or_else(invalid)?;
    let numbers: Vec<u16> = text[start..]
        .split(',')
        .map(|part| {
            let digits: String = part
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse::<u16>()
        })
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| invalid())?;

    if numbers.len() != 6 || numbers.iter().any(|n| *n > 255) {
        return Err(invalid());
    }
    Ok(numbers[4] * 256 + numbers[5])
}

/// Parse an RFC 3659 machine listing.
fn parse_mlsd(text: &str) -> Vec<RemoteEntry> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            let (facts, name) = line.split_once(' ')?;
            let kind = facts
                .split(';')
                .filter_map(|fact| fact.split_once('='))
                .find(|(key, _)| key.eq_ignore_ascii_case("type"))
                .map(|(_, value)| value.to_ascii_lowercase())
                .unwrap_or_default();

            match kind.as_str() {
                "cdir" | "pdir" => None,
                "dir" => Some(RemoteEntry::directory(name)),
                _ => Some(RemoteEntry::file(name)),
            }
        })
        .collect()
}

/// Parse a LIST reply in either unix `ls -l` or DOS/IIS format.
fn parse_list(text: &str) -> Vec<RemoteEntry> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with("total ") {
                return None;
            }

            if line.starts_with(|c: char| c.is_ascii_digit()) {
                // 01-15-24  10:30AM       <DIR>          webapps
                let is_directory = line.split_whitespace().nth(2) == Some("<DIR>");
                let name = skip_fields(line, 3)?;
                return Some(RemoteEntry {
                    name: name.to_string(),
                    is_directory,
                });
            }

            // drwxr-xr-x 1 owner group 0 Jan 15 10:30 webapps
            let is_directory = line.starts_with('d');
            let mut name = skip_fields(line, 8)?;
            if line.starts_with('l')
                && let Some((link, _)) = name.split_once(" -> ")
            {
                name = link;
            }
            Some(RemoteEntry {
                name: name.to_string(),
                is_directory,
            })
        })
        .collect()
}

/// Skip `n` whitespace-separated fields, returning the remainder.
fn skip_fields(line: &str, n: usize) -> Option<&str> {
    let mut rest = line.trim_start();
    for _ in 0..n {
        let end = rest.find(char::is_whitespace)?;
        rest = rest[end..].trim_start();
    }
    if rest.is_empty() { None } else { Some(rest) }
}
