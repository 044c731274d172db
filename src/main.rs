//! Entry point: CLI flags, startup wiring, and the read-eval prompt
//! loop. Grounded in `tsh.c: main`, with the donor's `main.rs` as the
//! model for how the loop itself reads and dispatches a line.

mod ast;
mod builtins;
mod eval;
mod executor;
mod jobs;
mod parser;
mod signals;
mod tokenizer;

use std::io::{self, BufRead, Write};

const PROMPT: &str = "tsh> ";

struct Options {
    verbose: bool,
    emit_prompt: bool,
}

fn usage() -> ! {
    println!("Usage: shell [-hvp]");
    println!("   -h   print this message");
    println!("   -v   print additional diagnostic information");
    println!("   -p   do not emit a command prompt");
    std::process::exit(1);
}

fn parse_args() -> Options {
    let mut opts = Options { verbose: false, emit_prompt: true };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-h" => usage(),
            "-v" => opts.verbose = true,
            "-p" => opts.emit_prompt = false,
            other => {
                eprintln!("jsh: unrecognized option: {other}");
                usage();
            }
        }
    }
    opts
}

fn main() {
    let opts = parse_args();

    // Every diagnostic lands on the same pipe a test harness reads.
    unsafe { libc::dup2(1, 2) };

    jobs::init();
    signals::install_handlers();

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        if opts.emit_prompt {
            print!("{PROMPT}");
            let _ = io::stdout().flush();
        }

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                let _ = io::stdout().flush();
                std::process::exit(0);
            }
            Ok(_) => {
                eval::eval(&line, opts.verbose);
                let _ = io::stdout().flush();
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                eprintln!("jsh: error reading command line: {e}");
                std::process::exit(1);
            }
        }
    }
}
