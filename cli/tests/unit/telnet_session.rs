//! Telnet sessions and the remote-shell driver against a scripted remote.

use std::time::Duration;

use regex::bytes::Regex;
use rtdeploy_cli::application::ports::{ShellConnector, ShellSession};
use rtdeploy_cli::application::services::session::RemoteShell;
use rtdeploy_cli::domain::{SessionError, SessionState};
use rtdeploy_cli::infra::telnet::TelnetConnector;

use crate::telnet_server::{FakeRemote, IAC, Step, login_steps, send};

const PROMPT: &str = r"\$\s*$";

fn prompt() -> Regex {
    Regex::new(PROMPT).expect("prompt")
}

#[tokio::test]
async fn runs_script_and_captures_output_before_prompt() {
    let mut steps = login_steps();
    steps.extend([
        Step::ReadLine,
        send("$ "),
        Step::ReadLine,
        send("starting\r\nMessages sent: 5\r\n$ "),
        Step::ReadLine,
        Step::Close,
    ]);
    let remote = FakeRemote::start(steps).await;
    let endpoint = remote.endpoint(PROMPT);

    let mut shell = RemoteShell::connect(&TelnetConnector, &endpoint, prompt())
        .await
        .expect("connect");
    shell.login(&endpoint).await.expect("login");
    shell.change_dir("/tmp").await.expect("cd");
    let run = shell
        .run_script("bench.sh", Duration::from_secs(5))
        .await
        .expect("run");
    let warning = shell.logout().await;

    assert!(run.output.contains("Messages sent: 5"), "{:?}", run.output);
    assert!(!run.output.contains('$'));
    assert!(warning.is_none(), "{warning:?}");
    assert_eq!(shell.state(), &SessionState::Closed);
    assert_eq!(
        remote.lines(),
        vec!["root", "secret", "cd /tmp", "./bench.sh", "exit"]
    );
}

#[tokio::test]
async fn answers_echo_negotiation() {
    let mut steps = vec![Step::Send(vec![IAC, 251, 1])];
    steps.extend(login_steps());
    let remote = FakeRemote::start(steps).await;
    let endpoint = remote.endpoint(PROMPT);

    let mut shell = RemoteShell::connect(&TelnetConnector, &endpoint, prompt())
        .await
        .expect("connect");
    shell.login(&endpoint).await.expect("login");

    // WILL ECHO is accepted with DO ECHO.
    assert_eq!(remote.commands(), vec![[IAC, 253, 1]]);
    assert_eq!(remote.lines(), vec!["root", "secret"]);
}

#[tokio::test]
async fn silent_script_times_out_with_partial_output() {
    let mut steps = login_steps();
    steps.extend([Step::ReadLine, send("working...\r\n")]);
    let remote = FakeRemote::start(steps).await;
    let endpoint = remote.endpoint(PROMPT);

    let mut shell = RemoteShell::connect(&TelnetConnector, &endpoint, prompt())
        .await
        .expect("connect");
    shell.login(&endpoint).await.expect("login");
    let err = shell
        .run_script("./slow.sh", Duration::from_millis(300))
        .await
        .expect_err("timeout");

    match err {
        SessionError::ExecutionTimeout {
            partial, elapsed, ..
        } => {
            assert!(partial.contains("working..."), "{partial:?}");
            assert!(elapsed >= Duration::from_millis(300));
        }
        other => panic!("expected execution timeout, got {other:?}"),
    }
    assert!(matches!(shell.state(), SessionState::TimedOut { .. }));
}

#[tokio::test]
async fn remote_hangup_during_login_is_stream_closed() {
    let remote = FakeRemote::start(vec![send("login: "), Step::ReadLine, Step::Close]).await;
    let endpoint = remote.endpoint(PROMPT);

    let mut shell = RemoteShell::connect(&TelnetConnector, &endpoint, prompt())
        .await
        .expect("connect");
    let err = shell.login(&endpoint).await.expect_err("closed");

    assert!(matches!(err, SessionError::StreamClosed { .. }), "{err:?}");
    assert!(matches!(shell.state(), SessionState::StreamClosed { .. }));
}

#[tokio::test]
async fn expect_returns_text_before_match() {
    let remote = FakeRemote::start(vec![send("banner line\r\nlogin: ")]).await;
    let endpoint = remote.endpoint(PROMPT);
    let mut session = TelnetConnector.connect(&endpoint).await.expect("connect");

    let patterns = [Regex::new("Username:").expect("re"), Regex::new("login:").expect("re")];
    let found = session
        .expect(&patterns, Duration::from_secs(2))
        .await
        .expect("match");

    assert_eq!(found.index, 1);
    assert_eq!(found.before, "banner line\r\n");
    assert_eq!(found.matched, "login:");
    session.close().await;
}
