mod args;
mod meetings;

pub use args::{Cli, CliCommand, MeetingsCliArgs, MeetingsCommand};
pub use meetings::handle_meetings_command;
