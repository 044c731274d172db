//! The job table: a fixed-capacity record of active jobs keyed by PID,
//! with a secondary JID mapping. Grounded in the donor's `jobs.rs` API
//! shape (add/delete/lookup/list), but reworked from a `HashMap` +
//! `std::process::Child` into a fixed-size array of PID-keyed slots
//! with the original `tsh.c` `addjob`/`deletejob`/`fgpid`/`getjobpid`/
//! `getjobjid`/`pid2jid`/`listjobs` semantics, including the `nextjid`
//! wraparound `tsh.c` performs once the table size is exceeded.
//!
//! Every mutation here is expected to run with `{CHLD, INT, TSTP}`
//! blocked by the caller (see `signals::block_job_signals`); that
//! blocking discipline is this table's only mutual-exclusion
//! mechanism, matching spec.md §5 and §9 "Global mutable state".

use std::cell::UnsafeCell;
use std::sync::OnceLock;

pub const MAX_JOBS: usize = 16;
const MAX_CMDLINE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Undef,
    Fg,
    Bg,
    St,
}

impl JobState {
    fn label(self) -> &'static str {
        match self {
            JobState::Undef => "Undef",
            JobState::Fg => "Foreground",
            JobState::Bg => "Running",
            JobState::St => "Stopped",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub pid: i32,
    pub jid: u32,
    pub state: JobState,
    pub cmdline: String,
}

impl Job {
    fn empty() -> Self {
        Job { pid: 0, jid: 0, state: JobState::Undef, cmdline: String::new() }
    }
}

pub struct JobTable {
    slots: [Job; MAX_JOBS],
    next_jid: u32,
}

impl JobTable {
    pub fn new() -> Self {
        JobTable { slots: std::array::from_fn(|_| Job::empty()), next_jid: 1 }
    }

    /// First-empty-slot insertion; `jid` wraps back to 1 once it would
    /// exceed the table size, matching `tsh.c: addjob` (documented, not
    /// "fixed" -- spec.md §9 notes the behaviour without endorsing it).
    pub fn add(&mut self, pid: i32, state: JobState, cmdline: &str) -> Result<u32, &'static str> {
        if pid < 1 {
            return Err("invalid pid");
        }
        for slot in self.slots.iter_mut() {
            if slot.pid == 0 {
                let jid = self.next_jid;
                *slot = Job { pid, jid, state, cmdline: truncate(cmdline) };
                self.next_jid += 1;
                if self.next_jid as usize > MAX_JOBS {
                    self.next_jid = 1;
                }
                return Ok(jid);
            }
        }
        Err("Tried to create too many jobs")
    }

    /// Clears the slot for `pid`; no-op if absent. Recomputes
    /// `next_jid` from the remaining highest JID, as `tsh.c` does.
    pub fn delete(&mut self, pid: i32) -> bool {
        if pid < 1 {
            return false;
        }
        for slot in self.slots.iter_mut() {
            if slot.pid == pid {
                *slot = Job::empty();
                self.next_jid = self.max_jid() + 1;
                return true;
            }
        }
        false
    }

    fn max_jid(&self) -> u32 {
        self.slots.iter().map(|j| j.jid).max().unwrap_or(0)
    }

    pub fn fgpid(&self) -> i32 {
        self.slots.iter().find(|j| j.state == JobState::Fg).map(|j| j.pid).unwrap_or(0)
    }

    pub fn get_by_pid(&self, pid: i32) -> Option<&Job> {
        if pid < 1 {
            return None;
        }
        self.slots.iter().find(|j| j.pid == pid)
    }

    pub fn get_by_pid_mut(&mut self, pid: i32) -> Option<&mut Job> {
        if pid < 1 {
            return None;
        }
        self.slots.iter_mut().find(|j| j.pid == pid)
    }

    pub fn get_by_jid(&self, jid: u32) -> Option<&Job> {
        if jid < 1 {
            return None;
        }
        self.slots.iter().find(|j| j.jid == jid)
    }

    pub fn pid2jid(&self, pid: i32) -> u32 {
        self.get_by_pid(pid).map(|j| j.jid).unwrap_or(0)
    }

    pub fn list(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|j| j.pid != 0)
            .map(|j| format!("[{}] ({}) {} {}", j.jid, j.pid, j.state.label(), j.cmdline))
            .collect()
    }
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate(s: &str) -> String {
    if s.len() > MAX_CMDLINE { s[..MAX_CMDLINE].to_string() } else { s.to_string() }
}

// The job table is process-wide mutable state shared between the main
// thread and the asynchronous CHLD/INT/TSTP handlers (spec.md §9).
// `UnsafeCell` plus the signal-blocking discipline in `signals.rs`
// stands in for a lock: handlers only ever run with the other two
// signals blocked, and the main thread blocks all three around every
// mutation, so there is never a concurrent access to race against.
struct SharedTable(UnsafeCell<JobTable>);

// SAFETY: access is serialized by blocking {CHLD, INT, TSTP} around
// every mutation (see `signals::block_job_signals`), never by `Sync`
// itself enforcing anything.
unsafe impl Sync for SharedTable {}

static TABLE: OnceLock<SharedTable> = OnceLock::new();

/// Must be called once before `job_table()` is used (from `main`,
/// before installing signal handlers).
pub fn init() {
    TABLE.get_or_init(|| SharedTable(UnsafeCell::new(JobTable::new())));
}

/// The process-wide job table. Callers outside of a signal handler
/// must hold {CHLD, INT, TSTP} blocked before mutating it.
pub fn job_table() -> &'static mut JobTable {
    let shared = TABLE.get().expect("jobs::init() must run before jobs::job_table()");
    unsafe { &mut *shared.0.get() }
}
