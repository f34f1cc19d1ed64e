pub mod command;
pub mod runner;
pub mod workfile;

pub use command::{BatchCommand, chunks};
pub use runner::{HostRunner, ProcessRunner};
pub use workfile::WorkingCopy;
