//! Shell command execution and host shell detection.

pub mod command;
pub mod mock;
pub mod platform;
pub mod runner;

pub use command::{
    execute, find_program_in, is_executable, quote_arg, CommandOptions,
    CommandResult,
};
pub use mock::{MockRunner, RecordedCommand};
pub use platform::{is_ci, is_elevated, ShellType};
pub use runner::{CommandRunner, SystemRunner};
