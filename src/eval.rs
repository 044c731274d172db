//! The REPL step for a single input line: tokenize, detect background,
//! dispatch builtins, rewrite aliases, fork, and either wait for the
//! foreground job or print the background-start line. Grounded in
//! `tsh.c: eval`.

use std::io;
use std::time::Duration;

use crate::{builtins, executor, jobs, parser, signals, tokenizer};
use crate::jobs::JobState;

/// `clr`/`dir` are the only two aliases in the original source
/// (`tsh.c: alias_cmd`); not a general user-configurable table.
fn apply_alias(tokens: &mut [String]) {
    if let Some(first) = tokens.first_mut() {
        match first.as_str() {
            "clr" => *first = "/usr/bin/clear".to_string(),
            "dir" => *first = "/bin/ls".to_string(),
            _ => {}
        }
    }
}

/// Evaluate one line read from the terminal. `verbose` gates the
/// extra job-creation diagnostics `-v` enables.
pub fn eval(line: &str, verbose: bool) {
    let mut tokens = tokenizer::tokenize(line);
    if tokens.is_empty() {
        return;
    }

    let background = tokenizer::strip_background_marker(&mut tokens);
    if tokens.is_empty() {
        // The line was just "&"; not a command.
        return;
    }

    if builtins::is_builtin(&tokens[0]) {
        builtins::dispatch(&tokens);
        return;
    }

    apply_alias(&mut tokens);

    let cmdline = line.trim_end_matches(['\n', '\r']).to_string();

    let old_mask = signals::block_job_signals();
    let pid = unsafe { libc::fork() };

    if pid < 0 {
        eprintln!("jsh: fork: {}", io::Error::last_os_error());
        signals::restore_mask(old_mask);
        return;
    }

    if pid == 0 {
        // Child: new process group, unblock, parse, execute. Never returns.
        unsafe { libc::setpgid(0, 0) };
        signals::restore_mask(old_mask);
        match parser::parse(&tokens) {
            Ok(cmd) => executor::run(&cmd),
            Err(msg) => {
                eprintln!("{msg}");
                unsafe { libc::_exit(2) }
            }
        }
    }

    // Parent.
    let state = if background { JobState::Bg } else { JobState::Fg };
    match jobs::job_table().add(pid, state, &cmdline) {
        Ok(jid) => {
            if background {
                println!("[{jid}] ({pid}) {cmdline}");
            }
            if verbose {
                eprintln!("Added job [{jid}] {pid} {cmdline}");
            }
        }
        Err(msg) => eprintln!("{msg}"),
    }
    signals::restore_mask(old_mask);

    if !background {
        wait_for_fg(pid);
    }
}

/// Poll until `pid` is no longer the foreground job -- either reaped
/// by the CHLD handler or moved off FG by the INT/TSTP handlers. The
/// polling contract is intentionally coarse (spec.md §4.F): signal
/// delivery wakes `sleep` early in practice.
pub fn wait_for_fg(pid: i32) {
    while jobs::job_table().fgpid() == pid {
        std::thread::sleep(Duration::from_secs(1));
    }
}
