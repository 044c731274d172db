//! Built-in command dispatcher. Grounded in `tsh.c`'s `builtin_cmd`,
//! `do_bgfg`, `do_pwd`, `do_cd`, `do_environ` -- unlike the donor's
//! `builtins.rs`, this crate's builtin set is exactly
//! `{quit, jobs, bg, fg, pwd, cd, environ}`; the donor's `echo`,
//! `export`, `unset`, and `type` have no counterpart in spec.md or in
//! the original source and are not carried over.

use std::io::Write;

use crate::eval::wait_for_fg;
use crate::jobs::{self, JobState};
use crate::signals;

const NAMES: &[&str] = &["quit", "jobs", "bg", "fg", "pwd", "cd", "environ"];

pub fn is_builtin(name: &str) -> bool {
    NAMES.contains(&name)
}

pub fn dispatch(tokens: &[String]) {
    match tokens[0].as_str() {
        "quit" => {
            let _ = std::io::stdout().flush();
            std::process::exit(0);
        }
        "jobs" => {
            for line in jobs::job_table().list() {
                println!("{line}");
            }
        }
        "bg" => do_bgfg(tokens, JobState::Bg),
        "fg" => do_bgfg(tokens, JobState::Fg),
        "pwd" => do_pwd(),
        "cd" => do_cd(tokens),
        "environ" => do_environ(),
        other => unreachable!("dispatch called with non-builtin {other}"),
    }
}

fn do_bgfg(tokens: &[String], target: JobState) {
    let name = &tokens[0];
    let Some(spec) = tokens.get(1) else {
        eprintln!("{name} command requires PID or %jobid argument");
        return;
    };

    let pid = if let Some(jid_str) = spec.strip_prefix('%') {
        let Ok(jid) = jid_str.parse::<u32>() else {
            eprintln!("{name}: argument must be a PID or %jobid");
            return;
        };
        match jobs::job_table().get_by_jid(jid) {
            Some(job) => job.pid,
            None => {
                eprintln!("%{jid}: No such job");
                return;
            }
        }
    } else if !spec.is_empty() && spec.chars().all(|c| c.is_ascii_digit()) {
        let parsed_pid: i32 = match spec.parse() {
            Ok(v) => v,
            Err(_) => {
                eprintln!("{name}: argument must be a PID or %jobid");
                return;
            }
        };
        match jobs::job_table().get_by_pid(parsed_pid) {
            Some(job) => job.pid,
            None => {
                eprintln!("({parsed_pid}): No such process");
                return;
            }
        }
    } else {
        eprintln!("{name}: argument must be a PID or %jobid");
        return;
    };

    // Blocked for the same reason eval.rs blocks around addjob: a
    // SIGCHLD landing between the state write and the print (e.g. the
    // job exits the instant SIGCONT is delivered) would race
    // sigchld_handler's delete(pid) against this mutation (spec.md
    // §4.C, §5).
    let old_mask = signals::block_job_signals();
    if let Some(job) = jobs::job_table().get_by_pid_mut(pid) {
        job.state = target;
    }
    unsafe { libc::kill(-pid, libc::SIGCONT) };

    if target == JobState::Bg {
        if let Some(job) = jobs::job_table().get_by_pid(pid) {
            println!("[{}] ({}) {}", job.jid, job.pid, job.cmdline);
        }
    }
    signals::restore_mask(old_mask);

    if target == JobState::Fg {
        wait_for_fg(pid);
    }
}

fn do_pwd() {
    match std::env::current_dir() {
        Ok(path) => println!("{}", path.display()),
        Err(e) => eprintln!("pwd: {e}"),
    }
}

fn do_cd(tokens: &[String]) {
    let Some(target) = tokens.get(1) else {
        eprintln!("cd: missing argument");
        return;
    };
    if let Err(e) = std::env::set_current_dir(target) {
        eprintln!("cd: {target}: {e}");
        return;
    }
    if let Ok(cwd) = std::env::current_dir() {
        // SAFETY: the shell is single-threaded at this point in the
        // evaluation loop (no other thread reads/writes the
        // environment concurrently).
        unsafe { std::env::set_var("PWD", &cwd) };
        println!("{}", cwd.display());
    }
}

const ENVIRON_SHOW_LEN: usize = 50;

fn do_environ() {
    for (key, value) in std::env::vars() {
        let entry = format!("{key}={value}");
        if entry.len() > ENVIRON_SHOW_LEN {
            // Truncate at a char boundary at or before ENVIRON_SHOW_LEN
            // -- slicing by raw byte index can land inside a multi-byte
            // UTF-8 character and panic, unlike the original's
            // `strncpy`, which truncates raw bytes without caring.
            let cut = entry
                .char_indices()
                .map(|(i, _)| i)
                .take_while(|&i| i <= ENVIRON_SHOW_LEN)
                .last()
                .unwrap_or(0);
            println!("{}...", &entry[..cut]);
        } else {
            println!("{entry}");
        }
    }
}
