//! The command tree: the three node kinds produced by the parser and
//! walked by the executor. The original source models these as a
//! common-prefix C struct with a type tag and downcasts; here they are
//! a tagged enum, so no downcasting or unsafe transmutes are needed.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    fn symbol(self) -> char {
        match self {
            Direction::Input => '<',
            Direction::Output => '>',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCmd {
    pub argv: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirCmd {
    pub cmd: Box<Cmd>,
    pub file: String,
    pub direction: Direction,
    pub fd: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeCmd {
    pub left: Box<Cmd>,
    pub right: Box<Cmd>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    Exec(ExecCmd),
    Redir(RedirCmd),
    Pipe(PipeCmd),
}

impl Cmd {
    /// Serialize the tree the way the original `cmd_dump` does, e.g.
    /// `( ( a ) < in ) | ( ( b ) > out )`. Used by parser unit tests to
    /// check tree shape without hand-rolling a structural comparison.
    pub fn dump(&self) -> String {
        match self {
            Cmd::Exec(e) => e.argv.join(" "),
            Cmd::Redir(r) => format!("( {} ) {} {}", r.cmd.dump(), r.direction.symbol(), r.file),
            Cmd::Pipe(p) => format!("( {} ) | ( {} )", p.left.dump(), p.right.dump()),
        }
    }
}
