//! Exit status and stderr of the `bridge-stub` binary.

use std::io::Read;
use std::net::TcpListener;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Runs the stub with stdin closed; panics if it outlives ten seconds.
fn run_stub(args: &[&str]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_bridge-stub"))
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn bridge-stub");

    let deadline = Instant::now() + Duration::from_secs(10);
    while child.try_wait().expect("poll").is_none() {
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("bridge-stub {args:?} did not exit");
        }
        thread::sleep(Duration::from_millis(20));
    }
    child.wait_with_output().expect("collect output")
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A loopback port with nothing listening on it.
fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("addr").port()
}

#[test]
fn bad_port_exits_nonzero_with_error_line() {
    let output = run_stub(&["127.0.0.1", "abc"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("[ERROR]"), "stderr: {stderr}");
    assert!(stderr.contains("invalid port number: abc"), "stderr: {stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn refused_connect_exits_nonzero_with_error_line() {
    let port = free_port().to_string();
    let output = run_stub(&["127.0.0.1", &port]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("[ERROR]"), "stderr: {stderr}");
    assert!(stderr.contains("failed to connect"), "stderr: {stderr}");
}

#[test]
fn missing_arguments_exit_nonzero() {
    let output = run_stub(&["127.0.0.1"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!output.stderr.is_empty());
}

#[test]
fn help_exits_zero() {
    let output = run_stub(&["--help"]);
    assert!(output.status.success());
}

#[test]
fn link_ended_by_stdin_eof_exits_zero() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port().to_string();
    let peer = thread::spawn(move || {
        let (mut socket, _) = listener.accept().expect("accept");
        let mut sink = Vec::new();
        let _ = socket.read_to_end(&mut sink);
        sink
    });

    let output = run_stub(&["127.0.0.1", &port]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert!(peer.join().expect("peer thread").is_empty());
}
