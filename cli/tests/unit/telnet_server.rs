//! In-process remote shell that plays a fixed script over TCP.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use rtdeploy_common::SessionEndpoint;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const IAC: u8 = 255;

/// One move of the remote side.
pub enum Step {
    /// Write these bytes to the client.
    Send(Vec<u8>),
    /// Read one line from the client and record it.
    ReadLine,
    /// Close the connection.
    Close,
}

pub fn send(text: &str) -> Step {
    Step::Send(text.as_bytes().to_vec())
}

/// The standard login exchange, ending at the first shell prompt.
pub fn login_steps() -> Vec<Step> {
    vec![
        send("Welcome\r\nlogin: "),
        Step::ReadLine,
        send("Password: "),
        Step::ReadLine,
        send("\r\n$ "),
    ]
}

#[derive(Default)]
pub struct Received {
    /// Lines from the client, without their line ending.
    pub lines: Vec<String>,
    /// Three-byte telnet commands from the client.
    pub commands: Vec<[u8; 3]>,
    /// Whether the client closed before the script ran out.
    pub client_closed: bool,
}

pub struct FakeRemote {
    pub addr: SocketAddr,
    pub received: Arc<Mutex<Received>>,
}

impl FakeRemote {
    /// Accept one connection and play `steps` on it.
    pub async fn start(steps: Vec<Step>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let received = Arc::new(Mutex::new(Received::default()));
        let shared = Arc::clone(&received);
        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                play(stream, steps, shared).await;
            }
        });
        Self { addr, received }
    }

    pub fn endpoint(&self, prompt_pattern: &str) -> SessionEndpoint {
        SessionEndpoint {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            username: "root".to_string(),
            password: "secret".to_string(),
            prompt_pattern: prompt_pattern.to_string(),
            timeout_secs: 5,
            directory: None,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.received.lock().expect("lock").lines.clone()
    }

    pub fn commands(&self) -> Vec<[u8; 3]> {
        self.received.lock().expect("lock").commands.clone()
    }
}

async fn play(mut stream: TcpStream, steps: Vec<Step>, received: Arc<Mutex<Received>>) {
    for step in steps {
        match step {
            Step::Send(bytes) => {
                if stream.write_all(&bytes).await.is_err() {
                    return;
                }
            }
            Step::ReadLine => match read_line(&mut stream, &received).await {
                Some(line) => received.lock().expect("lock").lines.push(line),
                None => {
                    received.lock().expect("lock").client_closed = true;
                    return;
                }
            },
            Step::Close => {
                let _ = stream.shutdown().await;
                return;
            }
        }
    }
    // Hold the connection open until the client goes away.
    let mut sink = [0u8; 256];
    while let Ok(n) = stream.read(&mut sink).await {
        if n == 0 {
            break;
        }
    }
}

/// Read up to LF, pulling out telnet commands and dropping CR.
async fn read_line(stream: &mut TcpStream, received: &Arc<Mutex<Received>>) -> Option<String> {
    let mut line = Vec::new();
    loop {
        let byte = stream.read_u8().await.ok()?;
        match byte {
            IAC => {
                let command = stream.read_u8().await.ok()?;
                let option = stream.read_u8().await.ok()?;
                received
                    .lock()
                    .expect("lock")
                    .commands
                    .push([IAC, command, option]);
            }
            b'\n' => break,
            b'\r' => {}
            other => line.push(other),
        }
    }
    Some(String::from_utf8_lossy(&line).into_owned())
}
