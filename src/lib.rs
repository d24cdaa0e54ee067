//! A small job-control shell.
//!
//! The crate reads one command per line, runs `cd`, `status` and `exit` in-process and
//! starts everything else as a child process, either in the foreground (the shell waits)
//! or in the background (the shell keeps prompting and reports the child when it is
//! reaped). Standard input and output of a child can be redirected with `<` and `>`,
//! `$$` expands to the shell's own process id, and `SIGTSTP` toggles a foreground-only
//! mode in which a trailing `&` is ignored.
//!
//! The main entry point is [`Interpreter`]. Line input is abstracted by
//! [`io_adapters::LineSource`], so the same interpreter drives an interactive
//! [`rustyline`] editor, plain standard input, or a scripted buffer in tests.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod external;
mod interpreter;
pub mod io_adapters;
pub mod jobs;
pub mod lexer;
pub mod parser;
pub mod redirect;
pub mod signal;

pub use config::Config;
pub use error::ShellError;
pub use interpreter::Interpreter;
