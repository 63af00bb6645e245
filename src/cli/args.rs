use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "meetnotes")]
#[command(about = "Meeting transcript summaries with a background job pipeline", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run the HTTP service (default)
    Serve,
    /// Print version information
    Version,
    /// Inspect and recompute stored meetings
    Meetings(MeetingsCliArgs),
}

#[derive(ClapArgs, Debug)]
pub struct MeetingsCliArgs {
    #[command(subcommand)]
    pub command: MeetingsCommand,
}

#[derive(Subcommand, Debug)]
pub enum MeetingsCommand {
    /// List recent meetings, newest first
    List {
        /// Maximum number of meetings to show (1-100)
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show a single meeting as JSON
    Show {
        id: String,
        /// Summarize now if the meeting has no result yet
        #[arg(long)]
        auto: bool,
    },
    /// Re-run the summary for a meeting, replacing any previous result
    Recompute { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["meetnotes", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_meetings_subcommands() {
        let cli = Cli::try_parse_from(["meetnotes", "meetings", "list", "--limit", "5"]).unwrap();
        match cli.command {
            Some(CliCommand::Meetings(args)) => {
                assert!(matches!(args.command, MeetingsCommand::List { limit: 5 }))
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["meetnotes", "meetings", "show", "abc", "--auto"]).unwrap();
        match cli.command {
            Some(CliCommand::Meetings(args)) => match args.command {
                MeetingsCommand::Show { id, auto } => {
                    assert_eq!(id, "abc");
                    assert!(auto);
                }
                other => panic!("unexpected meetings command: {:?}", other),
            },
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_recompute_requires_id() {
        assert!(Cli::try_parse_from(["meetnotes", "meetings", "recompute"]).is_err());
    }
}
