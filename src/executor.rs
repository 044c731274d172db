//! Walks a `Cmd` tree in the already-forked, already-its-own-process-
//! group child to realize it via raw `fork`/`execvp`/`dup2`/`pipe`/
//! `open`. Ported directly from `tsh.c: runcmd`, which this function
//! mirrors node-for-node; the `check_err`-style error handling is
//! grounded in `hniksic-rust-subprocess/src/posix.rs`, and wait-status
//! decoding follows the donor's `status.rs`.
//!
//! Every leaf eventually calls `execvp` or `_exit` and never returns;
//! the whole engine runs after the evaluator's fork, so there is no
//! evaluator state to preserve across the walk.

use std::ffi::CString;
use std::io;
use std::os::raw::c_char;
use std::ptr;

use crate::ast::{Cmd, Direction, ExecCmd, PipeCmd, RedirCmd};

/// Realize `cmd` in the current process. Never returns.
pub fn run(cmd: &Cmd) -> ! {
    match cmd {
        Cmd::Exec(e) => run_exec(e),
        Cmd::Redir(r) => run_redir(r),
        Cmd::Pipe(p) => run_pipe(p),
    }
}

fn run_exec(e: &ExecCmd) -> ! {
    if e.argv.is_empty() {
        unsafe { libc::_exit(0) }
    }

    let Ok(prog) = CString::new(e.argv[0].as_str()) else {
        unsafe { libc::_exit(1) }
    };
    let args_c: Vec<CString> = match e.argv.iter().map(|s| CString::new(s.as_str())).collect() {
        Ok(v) => v,
        Err(_) => unsafe { libc::_exit(1) },
    };
    let mut argv_ptr: Vec<*const c_char> = args_c.iter().map(|s| s.as_ptr()).collect();
    argv_ptr.push(ptr::null());

    unsafe {
        libc::execvp(prog.as_ptr(), argv_ptr.as_ptr());
    }
    eprintln!("command {} not found", e.argv[0]);
    unsafe { libc::_exit(0) }
}

fn run_redir(r: &RedirCmd) -> ! {
    unsafe {
        libc::close(r.fd);
    }
    let Ok(path) = CString::new(r.file.as_str()) else {
        eprintln!("jsh: {}: invalid path", r.file);
        unsafe { libc::_exit(1) }
    };
    let (flags, mode) = match r.direction {
        Direction::Input => (libc::O_RDONLY, 0o644),
        Direction::Output => (libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC, 0o644),
    };
    let fd = unsafe { libc::open(path.as_ptr(), flags, mode as libc::c_uint) };
    if fd < 0 {
        eprintln!("jsh: {}: {}", r.file, io::Error::last_os_error());
        unsafe { libc::_exit(1) }
    }
    run(&r.cmd)
}

fn run_pipe(p: &PipeCmd) -> ! {
    let mut fds = [0 as libc::c_int; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
        eprintln!("jsh: pipe: {}", io::Error::last_os_error());
        unsafe { libc::_exit(1) }
    }

    let pid = unsafe { libc::fork() };
    if pid < 0 {
        eprintln!("jsh: fork: {}", io::Error::last_os_error());
        unsafe { libc::_exit(1) }
    }

    if pid == 0 {
        // New child: reads from the pipe, runs the right-hand side.
        unsafe {
            libc::close(0);
            let dup_fd = libc::dup(fds[0]);
            if dup_fd != 0 {
                libc::_exit(1);
            }
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
        run(&p.right)
    } else {
        // Continuing process: writes to the pipe, runs the left-hand side.
        unsafe {
            libc::close(1);
            let dup_fd = libc::dup(fds[1]);
            if dup_fd != 1 {
                libc::_exit(1);
            }
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
        run(&p.left)
    }
}
