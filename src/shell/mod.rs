//! Shell command execution and run logging.

pub mod command;
pub mod log;
pub mod mock;

pub use command::{
    shell_quote, CommandOptions, CommandResult, CommandRunner, OutputCallback, OutputLine,
    ShellRunner,
};
pub use log::RunLog;
pub use mock::MockRunner;
