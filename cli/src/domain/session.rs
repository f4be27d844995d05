//! Interactive-session protocol: states, expected prompts, and deadlines.

use std::fmt;
use std::time::Duration;

/// Prompts that ask for the user name.
pub const LOGIN_PROMPTS: [&str; 3] = ["login:", "Login:", "Username:"];
/// Prompts that ask for the password.
pub const PASSWORD_PROMPTS: [&str; 2] = ["password:", "Password:"];

/// Deadline for each login step (user name, password, first prompt).
pub const LOGIN_STEP_TIMEOUT: Duration = Duration::from_secs(10);
/// Deadline for the prompt after `cd`.
pub const CHDIR_TIMEOUT: Duration = Duration::from_secs(5);
/// Grace period for the remote to hang up after `exit`.
pub const LOGOUT_GRACE: Duration = Duration::from_secs(5);

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    AwaitingLogin,
    AwaitingPassword,
    AwaitingPrompt,
    /// Logged in, prompt seen, nothing running.
    Ready,
    Executing,
    AwaitingCompletion,
    Closing,
    Closed,
    /// A wait ran past its deadline.
    TimedOut { partial: String },
    /// The remote hung up mid-wait.
    StreamClosed { partial: String },
}

impl SessionState {
    /// Whether no further interaction is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Closed | Self::TimedOut { .. } | Self::StreamClosed { .. }
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::AwaitingLogin => "awaiting login",
            Self::AwaitingPassword => "awaiting password",
            Self::AwaitingPrompt => "awaiting prompt",
            Self::Ready => "ready",
            Self::Executing => "executing",
            Self::AwaitingCompletion => "awaiting completion",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::TimedOut { .. } => "timed out",
            Self::StreamClosed { .. } => "stream closed",
        };
        f.write_str(name)
    }
}

/// Command line that runs a script from the current directory.
#[must_use]
pub fn script_command(script_name: &str) -> String {
    if script_name.starts_with('/') || script_name.starts_with("./") {
        script_name.to_string()
    } else {
        format!("./{script_name}")
    }
}
