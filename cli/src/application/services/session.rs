//! Application service — the interactive session driver.
//!
//! Walks a `ShellSession` through login, directory change, script execution
//! and logout, tracking `SessionState` and closing the connection on every
//! failure path.

use std::time::{Duration, Instant};

use regex::bytes::Regex;
use rtdeploy_common::SessionEndpoint;

use crate::application::ports::{ShellConnector, ShellSession};
use crate::domain::expect::literals;
use crate::domain::session::{
    CHDIR_TIMEOUT, LOGIN_PROMPTS, LOGIN_STEP_TIMEOUT, LOGOUT_GRACE, PASSWORD_PROMPTS,
    script_command,
};
use crate::domain::{PatternMatch, SessionError, SessionState};

/// Output and timing of a script that returned to the prompt.
#[derive(Debug, Clone)]
pub struct ScriptRun {
    pub output: String,
    pub elapsed: Duration,
}

/// Drives one remote-shell session.
pub struct RemoteShell<S: ShellSession> {
    session: Option<S>,
    state: SessionState,
    prompt: Regex,
}

impl<S: ShellSession> RemoteShell<S> {
    /// Open a session to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `ConnectFailed` if the remote cannot be reached.
    pub async fn connect<C>(
        connector: &C,
        endpoint: &SessionEndpoint,
        prompt: Regex,
    ) -> Result<Self, SessionError>
    where
        C: ShellConnector<Session = S>,
    {
        let mut shell = Self {
            session: None,
            state: SessionState::Connecting,
            prompt,
        };
        let session = connector.connect(endpoint).await?;
        shell.session = Some(session);
        shell.transition(SessionState::AwaitingLogin);
        Ok(shell)
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!(from = %self.state, to = %next, "session state");
        self.state = next;
    }

    /// Drop the connection without a logout exchange.
    ///
    /// A failed session keeps its `TimedOut` or `StreamClosed` state.
    pub fn abort(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!(state = %self.state, "session aborted");
        }
        if !self.state.is_terminal() {
            self.transition(SessionState::Closed);
        }
    }

    fn fail(&mut self, err: &SessionError) {
        let next = match err {
            SessionError::StreamClosed { partial, .. } => SessionState::StreamClosed {
                partial: partial.clone(),
            },
            _ => SessionState::TimedOut {
                partial: err.partial_output().unwrap_or_default().to_string(),
            },
        };
        self.transition(next);
        self.abort();
    }

    async fn send(&mut self, line: &str) -> Result<(), SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::Closed)?;
        if let Err(e) = session.send_line(line).await {
            self.fail(&e);
            return Err(e);
        }
        Ok(())
    }

    async fn wait(
        &mut self,
        patterns: &[Regex],
        timeout: Duration,
    ) -> Result<PatternMatch, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::Closed)?;
        match session.expect(patterns, timeout).await {
            Ok(m) => Ok(m),
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Answer the login and password prompts and wait for the shell prompt.
    ///
    /// # Errors
    ///
    /// Fails if any prompt does not appear within its deadline or the remote
    /// hangs up; the connection is closed in either case.
    pub async fn login(&mut self, endpoint: &SessionEndpoint) -> Result<(), SessionError> {
        self.transition(SessionState::AwaitingLogin);
        self.wait(&literals(&LOGIN_PROMPTS), LOGIN_STEP_TIMEOUT).await?;
        self.send(&endpoint.username).await?;

        self.transition(SessionState::AwaitingPassword);
        self.wait(&literals(&PASSWORD_PROMPTS), LOGIN_STEP_TIMEOUT).await?;
        self.send(&endpoint.password).await?;

        self.transition(SessionState::AwaitingPrompt);
        let prompt = self.prompt.clone();
        self.wait(&[prompt], LOGIN_STEP_TIMEOUT).await?;
        self.transition(SessionState::Ready);
        tracing::info!(host = %endpoint.host, user = %endpoint.username, "logged in");
        Ok(())
    }

    /// `cd` into `dir` and wait for the prompt.
    ///
    /// # Errors
    ///
    /// Fails if the prompt does not come back within the deadline.
    pub async fn change_dir(&mut self, dir: &str) -> Result<(), SessionError> {
        self.send(&format!("cd {dir}")).await?;
        let prompt = self.prompt.clone();
        self.wait(&[prompt], CHDIR_TIMEOUT).await?;
        tracing::info!(dir, "changed remote directory");
        Ok(())
    }

    /// Run `./<script>` and capture everything it prints before the prompt.
    ///
    /// # Errors
    ///
    /// Returns `ExecutionTimeout` with the partial output if the prompt does
    /// not return within `timeout`; the connection is force-closed.
    pub async fn run_script(
        &mut self,
        script: &str,
        timeout: Duration,
    ) -> Result<ScriptRun, SessionError> {
        let command = script_command(script);
        self.transition(SessionState::Executing);
        self.send(&command).await?;
        let started = Instant::now();

        self.transition(SessionState::AwaitingCompletion);
        let prompt = self.prompt.clone();
        match self.wait(&[prompt], timeout).await {
            Ok(m) => {
                let elapsed = started.elapsed();
                self.transition(SessionState::Ready);
                tracing::info!(script = %command, secs = elapsed.as_secs_f64(), "script finished");
                Ok(ScriptRun {
                    output: m.before,
                    elapsed,
                })
            }
            Err(SessionError::PatternTimeout { partial, .. }) => {
                let elapsed = started.elapsed();
                tracing::error!(script = %command, "script timed out after {}s", timeout.as_secs());
                Err(SessionError::ExecutionTimeout {
                    script: script.to_string(),
                    timeout,
                    elapsed,
                    partial,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Send `exit` and give the remote a grace period to hang up.
    ///
    /// Returns a warning when the stream did not end in time; the connection
    /// is closed either way.
    pub async fn logout(&mut self) -> Option<String> {
        let mut session = self.session.take()?;
        self.transition(SessionState::Closing);
        let warning = match session.send_line("exit").await {
            Err(e) => Some(format!("could not send exit: {e}")),
            Ok(()) => match session.expect_eof(LOGOUT_GRACE).await {
                Ok(trailing) => {
                    if !trailing.trim().is_empty() {
                        tracing::debug!("output after exit: {}", trailing.trim_end());
                    }
                    None
                }
                Err(_) => Some(format!(
                    "remote did not close the session within {}s of exit",
                    LOGOUT_GRACE.as_secs()
                )),
            },
        };
        session.close().await;
        self.transition(SessionState::Closed);
        warning
    }
}
