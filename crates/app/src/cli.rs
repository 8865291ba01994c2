//! Command-line surface of `prep-meter`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use prep_core::model::ChapterId;

#[derive(Debug, Parser)]
#[command(
    name = "prep-meter",
    version,
    about = "Track syllabus progress per chapter, locally or against a remote store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// SQLite database holding the local copy.
    #[arg(
        long,
        env = "PREP_DB_URL",
        default_value = "sqlite://prep-meter.sqlite3",
        global = true
    )]
    pub db: String,

    /// Base URL of the remote record store.
    #[arg(long, env = "PREP_REMOTE_URL", global = true)]
    pub remote_url: Option<String>,

    /// API key for the remote record store.
    #[arg(long, env = "PREP_REMOTE_KEY", hide_env_values = true, global = true)]
    pub remote_key: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Overall and per-subject completion.
    Status {
        /// Subjects to report on (defaults to the full syllabus).
        #[arg(long = "subject", value_name = "SUBJECT")]
        subjects: Vec<String>,
    },

    /// Show one chapter's record.
    Show { chapter: ChapterId },

    /// Update fields of a chapter's record.
    Mark(MarkArgs),

    /// Mark a subtopic done or not done.
    Subtopic {
        chapter: ChapterId,
        index: usize,
        #[arg(value_name = "DONE", action = ArgAction::Set)]
        done: bool,
    },

    /// List chapters flagged important.
    Important,

    /// Write all progress to a JSON file.
    Export {
        /// Target file or directory.
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Replace all progress with a previously exported file.
    Import { path: PathBuf },

    /// Delete all progress.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Sign in and remember the identity.
    SignIn(CredentialArgs),

    /// Create an account and remember the identity.
    SignUp {
        #[command(flatten)]
        credentials: CredentialArgs,
        #[arg(long)]
        name: String,
    },

    /// Forget the remembered identity.
    SignOut,

    /// Print the remembered identity.
    Whoami,

    /// Record a finished study block for today.
    LogSession { subject: String, minutes: u32 },

    /// Recent study sessions and study time.
    Sessions {
        #[arg(long, default_value_t = 20)]
        limit: u32,
        /// Also print the seven-day per-subject breakdown.
        #[arg(long)]
        week: bool,
    },
}

#[derive(Debug, clap::Args)]
pub struct MarkArgs {
    pub chapter: ChapterId,
    #[arg(long, value_name = "BOOL")]
    pub completed: Option<bool>,
    #[arg(long, value_name = "BOOL")]
    pub revised: Option<bool>,
    /// Self-assessed understanding, 0 (unset) to 5.
    #[arg(long, value_name = "LEVEL", value_parser = clap::value_parser!(u8).range(0..=5))]
    pub understanding: Option<u8>,
    #[arg(long, value_name = "BOOL")]
    pub important: Option<bool>,
}

#[derive(Debug, clap::Args)]
pub struct CredentialArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long, env = "PREP_PASSWORD", hide_env_values = true)]
    pub password: String,
}
