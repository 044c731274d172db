//! Black-box integration tests: spawn the compiled binary with piped
//! stdio, feed it scripted lines, and assert on stdout/stderr
//! substrings. Harness shape taken from the donor's
//! `tests/phase1_regressions.rs`/`tests/signal_handling.rs`.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

fn run_shell(lines: &[&str]) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tsh"))
        .arg("-p")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn tsh");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        for line in lines {
            writeln!(stdin, "{line}").expect("write line");
        }
        writeln!(stdin, "quit").expect("write quit");
    }

    child.wait_with_output().expect("wait output")
}

#[test]
fn echo_prints_its_argument() {
    let output = run_shell(&["echo hello"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hello"), "stdout was: {stdout}");
}

#[test]
fn pipeline_runs_both_stages() {
    let output = run_shell(&["/bin/ls / | wc -l"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let count: i64 = stdout.lines().find_map(|l| l.trim().parse().ok()).unwrap_or(-1);
    assert!(count > 0, "stdout was: {stdout}");
}

#[test]
fn input_redirection_reads_the_named_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("hostname_like.txt");
    std::fs::write(&path, "redirected-content\n").unwrap();

    let cmd = format!("cat < {}", path.display());
    let output = run_shell(&[cmd.as_str()]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("redirected-content"), "stdout was: {stdout}");
}

#[test]
fn output_redirection_writes_the_named_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.txt");

    let cmd = format!("echo written > {}", path.display());
    run_shell(&[cmd.as_str()]);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("written"), "file contents were: {contents}");
}

#[test]
fn background_job_is_announced_and_later_reaped() {
    let output = run_shell(&["sleep 1 &", "jobs"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[1]"), "stdout was: {stdout}");
    assert!(stdout.contains("sleep 1"), "stdout was: {stdout}");
}

#[test]
fn jobs_builtin_lists_a_running_background_job() {
    let output = run_shell(&["sleep 2 &", "jobs"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Running"), "stdout was: {stdout}");
}

#[test]
fn pwd_prints_the_current_directory() {
    let output = run_shell(&["pwd"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected = std::env::current_dir().unwrap();
    assert!(stdout.contains(expected.to_str().unwrap()), "stdout was: {stdout}");
}

#[test]
fn cd_into_missing_directory_reports_a_diagnostic() {
    let output = run_shell(&["cd /no/such/path/at/all"]);
    let stderr_and_out =
        String::from_utf8_lossy(&output.stdout) + String::from_utf8_lossy(&output.stderr).as_ref();
    assert!(stderr_and_out.contains("cd:"), "output was: {stderr_and_out}");
}

#[test]
fn unknown_command_reports_not_found_and_continues() {
    let output = run_shell(&["this-command-does-not-exist-anywhere", "echo still-alive"]);
    let combined =
        String::from_utf8_lossy(&output.stdout) + String::from_utf8_lossy(&output.stderr).as_ref();
    assert!(combined.contains("command this-command-does-not-exist-anywhere not found"));
    assert!(combined.contains("still-alive"));
}

#[test]
fn fg_unknown_job_id_reports_diagnostic() {
    let output = run_shell(&["fg %99"]);
    let combined =
        String::from_utf8_lossy(&output.stdout) + String::from_utf8_lossy(&output.stderr).as_ref();
    assert!(combined.contains("No such job"), "output was: {combined}");
}

#[test]
fn bg_missing_argument_reports_diagnostic() {
    let output = run_shell(&["bg"]);
    let combined =
        String::from_utf8_lossy(&output.stdout) + String::from_utf8_lossy(&output.stderr).as_ref();
    assert!(
        combined.contains("bg command requires PID or %jobid argument"),
        "output was: {combined}"
    );
}

#[cfg(unix)]
#[test]
fn foreground_job_interrupted_by_sigint_reports_termination() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_tsh"))
        .arg("-p")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn tsh");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        writeln!(stdin, "sleep 30").expect("write line");
    }

    std::thread::sleep(Duration::from_millis(300));
    unsafe {
        libc::kill(child.id() as i32, libc::SIGINT);
    }
    std::thread::sleep(Duration::from_millis(300));
    {
        let stdin = child.stdin.as_mut().expect("stdin");
        writeln!(stdin, "jobs").expect("write line");
        writeln!(stdin, "quit").expect("write line");
    }

    let output = child.wait_with_output().expect("wait output");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("terminated by signal"), "stdout was: {stdout}");
}
