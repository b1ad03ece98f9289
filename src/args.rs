//! This module defines the command line arguments lectern accepts.

use std::{io::IsTerminal, path::PathBuf};
use termcolor::ColorChoice;

use crate::model::Week;


#[derive(Debug, clap::Parser)]
#[clap(about = "Browse and upload course lecture videos.")]
pub(crate) struct Args {
    /// Whether to use colors in the output.
    #[clap(long, value_enum, default_value_t = ColorArg::Auto, global = true)]
    pub(crate) color: ColorArg,

    #[clap(subcommand)]
    pub(crate) cmd: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum ColorArg {
    Auto,
    Always,
    Never,
}

#[derive(Debug, clap::Subcommand)]
pub(crate) enum Command {
    /// Lists lectures, optionally filtered by week, course and search text.
    Browse {
        #[clap(flatten)]
        args: BrowseArgs,

        #[clap(flatten)]
        shared: Shared,
    },

    /// Uploads a new lecture. Requires being signed in (see `login`).
    Upload {
        #[clap(flatten)]
        args: UploadArgs,

        #[clap(flatten)]
        shared: Shared,
    },

    /// Lists all courses lectures can belong to.
    Courses {
        /// Only list courses of this level, e.g. `diploma`.
        #[clap(long)]
        level: Option<String>,

        /// Only list courses whose name or code contains this text
        /// (case-insensitive).
        #[clap(long)]
        search: Option<String>,
    },

    /// Signs in with email and password and prints an access token to put
    /// into the configuration. The password is read from the environment
    /// variable `LECTERN_PASSWORD`.
    Login {
        #[clap(long)]
        email: String,

        #[clap(flatten)]
        shared: Shared,
    },

    /// Registers a new user. The password is read from the environment
    /// variable `LECTERN_PASSWORD`.
    Signup {
        #[clap(long)]
        email: String,

        /// Full name, shown as instructor of uploaded lectures.
        #[clap(long)]
        name: String,

        #[clap(flatten)]
        shared: Shared,
    },

    /// Ends the session of the configured access token.
    Logout {
        #[clap(flatten)]
        shared: Shared,
    },

    /// Checks config and connection to the lecture service. Exits with 0 if
    /// everything is Ok, and with 1 otherwise.
    Check {
        #[clap(flatten)]
        shared: Shared,
    },

    /// Outputs a template for the configuration file (which includes
    /// descriptions of all options).
    WriteConfig {
        /// Target file. If not specified, the template is written to stdout.
        target: Option<PathBuf>,
    },
}

#[derive(Debug, clap::Args)]
pub(crate) struct BrowseArgs {
    /// Only show lectures of this week.
    #[clap(long)]
    pub(crate) week: Option<Week>,

    /// Only show lectures of this course (see `courses` for valid IDs).
    #[clap(long)]
    pub(crate) course: Option<String>,

    /// Only show lectures whose title or instructor contains this text
    /// (case-insensitive).
    #[clap(long)]
    pub(crate) search: Option<String>,

    /// How many pages to load at most.
    #[clap(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) pages: u32,

    /// How often to retry a failed page fetch before giving up.
    #[clap(long, default_value_t = 0)]
    pub(crate) retries: u32,
}

#[derive(Debug, clap::Args)]
pub(crate) struct UploadArgs {
    #[clap(long)]
    pub(crate) title: String,

    #[clap(long, default_value = "")]
    pub(crate) description: String,

    #[clap(long)]
    pub(crate) video_url: String,

    #[clap(long)]
    pub(crate) thumbnail_url: String,

    /// Week of the course term, between 1 and 52.
    #[clap(long)]
    pub(crate) week: u32,

    /// Course ID (see `courses`).
    #[clap(long)]
    pub(crate) course: String,
}

#[derive(Debug, clap::Args)]
pub(crate) struct Shared {
    /// Path to the configuration file. If this is not specified, lectern will
    /// check `LECTERN_CONFIG_PATH` and then try opening `config.toml` or
    /// `/etc/lectern/config.toml`.
    #[clap(short, long)]
    pub(crate) config: Option<PathBuf>,
}

impl Args {
    pub(crate) fn stdout_color(&self) -> ColorChoice {
        self.color_choice(std::io::stdout().is_terminal())
    }

    pub(crate) fn stderr_color(&self) -> ColorChoice {
        self.color_choice(std::io::stderr().is_terminal())
    }

    fn color_choice(&self, is_terminal: bool) -> ColorChoice {
        match self.color {
            ColorArg::Always => ColorChoice::Always,
            ColorArg::Never => ColorChoice::Never,
            ColorArg::Auto if is_terminal => ColorChoice::Auto,
            ColorArg::Auto => ColorChoice::Never,
        }
    }
}
