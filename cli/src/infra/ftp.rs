//! FTP client implementing the transfer ports.
//!
//! Speaks the subset a deployment needs: login, binary mode, CWD/MKD,
//! passive-mode STOR and RETR, SIZE for verification, and QUIT. The data
//! connection always goes to the control connection's peer address, so a
//! target behind NAT that advertises a private address still works.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use rtdeploy_common::TransferEndpoint;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::application::ports::{TransferClient, TransferConnector};
use crate::domain::{SizeCheck, TransferError, UploadReport};

/// One server reply, multi-line text joined with `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub text: String,
}

/// Opens logged-in FTP connections.
pub struct FtpConnector;

impl TransferConnector for FtpConnector {
    type Client = FtpClient;

    async fn connect(&self, endpoint: &TransferEndpoint) -> Result<FtpClient, TransferError> {
        FtpClient::connect(endpoint).await
    }
}

/// A logged-in FTP control connection in binary mode.
#[derive(Debug)]
pub struct FtpClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer: IpAddr,
    timeout: Duration,
}

impl FtpClient {
    /// Connect, log in, and switch to binary mode.
    pub async fn connect(endpoint: &TransferEndpoint) -> Result<Self, TransferError> {
        let address = endpoint.address();
        tracing::info!(%address, "connecting to ftp server");
        let stream = match tokio::time::timeout(endpoint.timeout(), TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(TransferError::ConnectFailed {
                    address,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(TransferError::ConnectFailed {
                    address,
                    reason: format!("timed out after {}s", endpoint.timeout_secs),
                });
            }
        };
        let peer = stream.peer_addr()?.ip();
        let (reader, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(reader),
            writer,
            peer,
            timeout: endpoint.timeout(),
        };

        let greeting = client.read_reply().await?;
        if greeting.code != 220 {
            return Err(rejected("connect", greeting));
        }
        client.login(&endpoint.username, &endpoint.password).await?;
        client.expect_code("TYPE I", &[200]).await?;
        tracing::info!(user = %endpoint.username, "ftp login succeeded");
        Ok(client)
    }

    async fn login(&mut self, user: &str, password: &str) -> Result<(), TransferError> {
        let reply = self.command(&format!("USER {user}")).await?;
        match reply.code {
            230 => return Ok(()),
            331 => {}
            _ => return Err(rejected("USER", reply)),
        }
        let reply = self.send(&format!("PASS {password}"), "PASS ****").await?;
        if matches!(reply.code, 202 | 230) {
            Ok(())
        } else {
            Err(rejected("PASS", reply))
        }
    }

    async fn read_line(&mut self) -> Result<String, TransferError> {
        let mut line = String::new();
        let n = tokio::time::timeout(self.timeout, self.reader.read_line(&mut line))
            .await
            .map_err(|_| TransferError::Timeout(self.timeout))??;
        if n == 0 {
            return Err(TransferError::MalformedReply(
                "connection closed by server".to_string(),
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    async fn read_reply(&mut self) -> Result<Reply, TransferError> {
        let first = self.read_line().await?;
        let (code, more, text) =
            parse_reply_line(&first).ok_or_else(|| TransferError::MalformedReply(first.clone()))?;
        let mut text = text.to_string();
        if more {
            loop {
                let line = self.read_line().await?;
                text.push('\n');
                match parse_reply_line(&line) {
                    Some((c, false, rest)) if c == code => {
                        text.push_str(rest);
                        break;
                    }
                    _ => text.push_str(&line),
                }
            }
        }
        tracing::debug!("<< {code} {text}");
        Ok(Reply { code, text })
    }

    /// Send a command; `shown` is what gets logged.
    async fn send(&mut self, command: &str, shown: &str) -> Result<Reply, TransferError> {
        tracing::debug!(">> {shown}");
        self.writer.write_all(command.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        self.read_reply().await
    }

    async fn command(&mut self, command: &str) -> Result<Reply, TransferError> {
        self.send(command, command).await
    }

    async fn expect_code(&mut self, command: &str, ok: &[u16]) -> Result<Reply, TransferError> {
        let reply = self.command(command).await?;
        if ok.contains(&reply.code) {
            Ok(reply)
        } else {
            Err(rejected(command, reply))
        }
    }

    async fn open_passive(&mut self) -> Result<TcpStream, TransferError> {
        let reply = self.expect_code("PASV", &[227]).await?;
        let port = parse_pasv(&reply.text)?;
        let addr = SocketAddr::new(self.peer, port);
        tracing::debug!(%addr, "opening data connection");
        tokio::time::timeout(self.timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TransferError::Timeout(self.timeout))?
            .map_err(TransferError::from)
    }

    async fn finish_transfer(&mut self, command: &str) -> Result<(), TransferError> {
        let done = self.read_reply().await?;
        if matches!(done.code, 226 | 250) {
            Ok(())
        } else {
            Err(rejected(command, done))
        }
    }

    /// Remote file size, or `None` if the server will not say.
    pub async fn size(&mut self, path: &str) -> Result<Option<u64>, TransferError> {
        let reply = self.command(&format!("SIZE {path}")).await?;
        Ok(if reply.code == 213 {
            parse_size(&reply.text)
        } else {
            None
        })
    }
}

impl TransferClient for FtpClient {
    async fn ensure_remote_directory(&mut self, path: &str) -> Result<(), TransferError> {
        if self.change_directory(path).await.is_ok() {
            return Ok(());
        }
        let unavailable = |reason: String| TransferError::DirectoryUnavailable {
            path: path.to_string(),
            reason,
        };
        let reply = self.command(&format!("MKD {path}")).await?;
        if reply.code != 257 {
            return Err(unavailable(format!("MKD failed: {} {}", reply.code, reply.text)));
        }
        tracing::info!(dir = path, "created remote directory");
        self.change_directory(path)
            .await
            .map_err(|e| unavailable(e.to_string()))
    }

    async fn change_directory(&mut self, path: &str) -> Result<(), TransferError> {
        self.expect_code(&format!("CWD {path}"), &[200, 250])
            .await
            .map(|_| ())
    }

    async fn upload(&mut self, local: &Path, remote: &str) -> Result<UploadReport, TransferError> {
        let local_size = match tokio::fs::metadata(local).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return Err(TransferError::LocalFileMissing(local.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TransferError::LocalFileMissing(local.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        let mut file = tokio::fs::File::open(local).await?;

        let mut data = self.open_passive().await?;
        let command = format!("STOR {remote}");
        self.expect_code(&command, &[125, 150]).await?;
        let bytes_sent = copy_data(&mut file, &mut data, self.timeout).await?;
        within(self.timeout, data.shutdown()).await?;
        drop(data);
        self.finish_transfer(&command).await?;

        let remote_size = self.size(remote).await?;
        tracing::info!(remote, bytes_sent, ?remote_size, "upload finished");
        Ok(UploadReport {
            local: local.to_path_buf(),
            remote: remote.to_string(),
            bytes_sent,
            check: SizeCheck::compare(local_size, remote_size),
        })
    }

    async fn download(&mut self, remote: &str, local: &Path) -> Result<u64, TransferError> {
        if let Some(parent) = local.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut data = self.open_passive().await?;
        let command = format!("RETR {remote}");
        self.expect_code(&command, &[125, 150]).await?;
        let mut file = tokio::fs::File::create(local).await?;
        let bytes = copy_data(&mut data, &mut file, self.timeout).await?;
        file.flush().await?;
        drop(data);
        self.finish_transfer(&command).await?;
        Ok(bytes)
    }

    async fn quit(mut self) -> Result<(), TransferError> {
        self.command("QUIT").await?;
        Ok(())
    }
}

const DATA_CHUNK: usize = 64 * 1024;

async fn within<T>(
    limit: Duration,
    io: impl Future<Output = std::io::Result<T>>,
) -> Result<T, TransferError> {
    Ok(tokio::time::timeout(limit, io)
        .await
        .map_err(|_| TransferError::Timeout(limit))??)
}

/// Copy a data connection to EOF. A read or write that stalls for longer
/// than `idle` fails the transfer with `Timeout`.
async fn copy_data<R, W>(reader: &mut R, writer: &mut W, idle: Duration) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; DATA_CHUNK];
    let mut total = 0u64;
    loop {
        let n = within(idle, reader.read(&mut buf)).await?;
        if n == 0 {
            return Ok(total);
        }
        within(idle, writer.write_all(&buf[..n])).await?;
        total += n as u64;
    }
}

fn rejected(command: &str, reply: Reply) -> TransferError {
    TransferError::Rejected {
        command: command.to_string(),
        code: reply.code,
        text: reply.text,
    }
}

/// Split a reply line into code, continuation flag, and text.
#[must_use]
pub fn parse_reply_line(line: &str) -> Option<(u16, bool, &str)> {
    let code_part = line.get(..3)?;
    if !code_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let code = code_part.parse().ok()?;
    match line.as_bytes().get(3) {
        None => Some((code, false, "")),
        Some(b' ') => Some((code, false, &line[4..])),
        Some(b'-') => Some((code, true, &line[4..])),
        Some(_) => None,
    }
}

/// Data port from a `227` reply, e.g. `Entering Passive Mode (10,0,0,2,195,80)`.
///
/// # Errors
///
/// Returns `MalformedReply` unless the text holds six comma-separated numbers.
pub fn parse_pasv(text: &str) -> Result<u16, TransferError> {
    let malformed = || TransferError::MalformedReply(format!("bad PASV reply: {text}"));
    let start = text
        .find('(')
        .map(|i| i + 1)
        .or_else(|| text.find(|c: char| c.is_ascii_digit()))
        .ok_or_else(malformed)?;
    let numbers: Vec<u8> = text[start..]
        .split(|c: char| !c.is_ascii_digit() && c != ',')
        .next()
        .unwrap_or_default()
        .split(',')
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| malformed())?;
    match numbers.as_slice() {
        [_, _, _, _, hi, lo] => Ok((u16::from(*hi) << 8) | u16::from(*lo)),
        _ => Err(malformed()),
    }
}

/// File size from a `213` reply text.
#[must_use]
pub fn parse_size(text: &str) -> Option<u64> {
    text.trim().parse().ok()
}
