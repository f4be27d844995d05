//! Telnet transport: option negotiation filter and the session connector.
//!
//! The filter strips IAC sequences from the incoming stream and produces
//! the replies the client owes the server. It keeps its state between
//! chunks, so a command split across two reads is still recognised.

use std::collections::HashSet;

use rtdeploy_common::SessionEndpoint;
use tokio::net::TcpStream;

use crate::application::ports::ShellConnector;
use crate::domain::SessionError;
use crate::infra::session::StreamSession;

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

const OPT_ECHO: u8 = 1;
const OPT_SUPPRESS_GO_AHEAD: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Data,
    /// Saw CR; a following NUL is padding.
    CarriageReturn,
    Iac,
    Negotiate(u8),
    Subnegotiation,
    SubnegotiationIac,
}

/// Data and negotiation replies produced from one incoming chunk.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Filtered {
    pub data: Vec<u8>,
    pub replies: Vec<u8>,
}

/// Incoming-stream telnet decoder.
#[derive(Debug)]
pub struct TelnetFilter {
    state: State,
    answered: HashSet<(u8, u8)>,
}

impl Default for TelnetFilter {
    fn default() -> Self {
        Self {
            state: State::Data,
            answered: HashSet::new(),
        }
    }
}

impl TelnetFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk.
    pub fn feed(&mut self, input: &[u8]) -> Filtered {
        let mut out = Filtered::default();
        for &byte in input {
            self.state = match (self.state, byte) {
                (State::Data | State::CarriageReturn, IAC) => State::Iac,
                (State::CarriageReturn, 0) => State::Data,
                (State::Data | State::CarriageReturn, b'\r') => {
                    out.data.push(byte);
                    State::CarriageReturn
                }
                (State::Data | State::CarriageReturn, _) => {
                    out.data.push(byte);
                    State::Data
                }
                (State::Iac, IAC) => {
                    out.data.push(IAC);
                    State::Data
                }
                (State::Iac, DO | DONT | WILL | WONT) => State::Negotiate(byte),
                (State::Iac, SB) => State::Subnegotiation,
                (State::Iac, _) => State::Data,
                (State::Negotiate(command), option) => {
                    self.answer(command, option, &mut out.replies);
                    State::Data
                }
                (State::Subnegotiation, IAC) => State::SubnegotiationIac,
                (State::Subnegotiation, _) => State::Subnegotiation,
                (State::SubnegotiationIac, SE) => State::Data,
                (State::SubnegotiationIac, _) => State::Subnegotiation,
            };
        }
        out
    }

    /// Accept the server echoing and suppressing go-ahead; refuse the rest.
    /// Each request is answered once so the two sides cannot loop.
    fn answer(&mut self, command: u8, option: u8, replies: &mut Vec<u8>) {
        let reply = match command {
            WILL if matches!(option, OPT_ECHO | OPT_SUPPRESS_GO_AHEAD) => DO,
            WILL => DONT,
            DO => WONT,
            _ => return,
        };
        if self.answered.insert((command, option)) {
            tracing::debug!(command, option, reply, "telnet negotiation");
            replies.extend_from_slice(&[IAC, reply, option]);
        }
    }
}

/// Frame a line for sending. UTF-8 text never contains 0xFF, so no IAC
/// escaping is needed.
#[must_use]
pub fn encode_line(line: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len() + 2);
    out.extend_from_slice(line.as_bytes());
    out.extend_from_slice(b"\r\n");
    out
}

/// Opens telnet sessions over TCP.
pub struct TelnetConnector;

impl ShellConnector for TelnetConnector {
    type Session = StreamSession<TcpStream>;

    async fn connect(&self, endpoint: &SessionEndpoint) -> Result<Self::Session, SessionError> {
        let address = endpoint.address();
        tracing::info!(%address, "connecting to telnet server");
        let stream = match tokio::time::timeout(endpoint.timeout(), TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(SessionError::ConnectFailed {
                    address,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(SessionError::ConnectFailed {
                    address,
                    reason: format!("timed out after {}s", endpoint.timeout_secs),
                });
            }
        };
        stream.set_nodelay(true)?;
        Ok(StreamSession::telnet(stream))
    }
}
