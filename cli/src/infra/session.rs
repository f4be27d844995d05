//! `ShellSession` over any byte stream.
//!
//! Reads land in an `ExpectBuffer`; each wait re-tests the buffer after
//! every read until a pattern matches, the deadline passes, or the remote
//! hangs up. Telnet framing is optional so tests can drive a session over
//! an in-memory duplex pipe.

use std::time::Duration;

use regex::bytes::Regex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use crate::application::ports::ShellSession;
use crate::domain::expect::describe;
use crate::domain::{ExpectBuffer, PatternMatch, SessionError};
use crate::infra::telnet::{TelnetFilter, encode_line};

const READ_CHUNK: usize = 4096;

enum Fill {
    Data,
    Eof,
    TimedOut,
}

/// Expect-style session over a stream.
#[derive(Debug)]
pub struct StreamSession<S> {
    stream: S,
    buffer: ExpectBuffer,
    telnet: Option<TelnetFilter>,
    eof: bool,
}

impl<S: AsyncRead + AsyncWrite + Unpin> StreamSession<S> {
    /// Raw session: bytes pass through untouched and lines end with LF.
    pub fn raw(stream: S) -> Self {
        Self {
            stream,
            buffer: ExpectBuffer::new(),
            telnet: None,
            eof: false,
        }
    }

    /// Telnet session: IAC negotiation is handled and lines end with CR LF.
    pub fn telnet(stream: S) -> Self {
        Self {
            telnet: Some(TelnetFilter::new()),
            ..Self::raw(stream)
        }
    }

    /// Read one chunk into the buffer, or give up at `deadline`.
    async fn fill(&mut self, deadline: Instant) -> Result<Fill, SessionError> {
        if self.eof {
            return Ok(Fill::Eof);
        }
        let mut chunk = [0u8; READ_CHUNK];
        let n = match tokio::time::timeout_at(deadline, self.stream.read(&mut chunk)).await {
            Err(_) => return Ok(Fill::TimedOut),
            Ok(result) => result?,
        };
        if n == 0 {
            self.eof = true;
            return Ok(Fill::Eof);
        }
        let data = match self.telnet.as_mut() {
            None => chunk[..n].to_vec(),
            Some(filter) => {
                let filtered = filter.feed(&chunk[..n]);
                if !filtered.replies.is_empty() {
                    self.stream.write_all(&filtered.replies).await?;
                    self.stream.flush().await?;
                }
                filtered.data
            }
        };
        if !data.is_empty() {
            tracing::debug!("recv: {:?}", String::from_utf8_lossy(&data));
        }
        self.buffer.extend(&data);
        Ok(Fill::Data)
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> ShellSession for StreamSession<S> {
    async fn send_line(&mut self, line: &str) -> Result<(), SessionError> {
        let bytes = if self.telnet.is_some() {
            encode_line(line)
        } else {
            format!("{line}\n").into_bytes()
        };
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn expect(
        &mut self,
        patterns: &[Regex],
        timeout: Duration,
    ) -> Result<PatternMatch, SessionError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(m) = self.buffer.find(patterns) {
                tracing::debug!(index = m.index, matched = %m.matched, "pattern matched");
                return Ok(m);
            }
            match self.fill(deadline).await? {
                Fill::Data => {}
                Fill::Eof => {
                    return Err(SessionError::StreamClosed {
                        expected: describe(patterns),
                        partial: self.buffer.pending(),
                    });
                }
                Fill::TimedOut => {
                    return Err(SessionError::PatternTimeout {
                        expected: describe(patterns),
                        waited: timeout,
                        partial: self.buffer.pending(),
                    });
                }
            }
        }
    }

    async fn expect_eof(&mut self, timeout: Duration) -> Result<String, SessionError> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.fill(deadline).await? {
                Fill::Data => {}
                Fill::Eof => return Ok(self.buffer.take()),
                Fill::TimedOut => {
                    return Err(SessionError::PatternTimeout {
                        expected: "end of stream".to_string(),
                        waited: timeout,
                        partial: self.buffer.pending(),
                    });
                }
            }
        }
    }

    async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!("session shutdown: {e}");
        }
    }
}
