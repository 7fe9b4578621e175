use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use shared::{IssueId, IssueOrdering};

use crate::config::ConfigOverrides;

/// Command-line shell for the CivicTrack admin dashboard.
#[derive(Debug, Parser)]
#[command(name = "civictrack-admin", version, about)]
pub struct Cli {
    /// Base URL of the complaints API (overrides config and environment).
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Extra configuration file, layered above the user and local files.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the view model as JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show issue counters and resolution progress.
    Dashboard,
    /// List issues that are not resolved yet.
    Issues {
        #[arg(long, value_enum)]
        order: Option<OrderArg>,
    },
    /// List resolved issues.
    Resolved,
    /// List resolved issues that carry citizen feedback.
    Feedback,
    /// Show one issue and the action available for it.
    Show { id: u64 },
    /// Assign an employee to an active issue.
    Assign {
        id: u64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        contact: String,
    },
    /// Mark an in-progress issue resolved with a photo of the completed work.
    Resolve {
        id: u64,
        #[arg(long, value_name = "PATH")]
        image: PathBuf,
    },
    /// Move a resolved issue back to in progress.
    Reopen { id: u64 },
}

impl Command {
    #[must_use]
    pub const fn issue_id(&self) -> Option<IssueId> {
        match self {
            Self::Show { id }
            | Self::Assign { id, .. }
            | Self::Resolve { id, .. }
            | Self::Reopen { id } => Some(IssueId(*id)),
            Self::Dashboard | Self::Issues { .. } | Self::Resolved | Self::Feedback => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    Priority,
    Arrival,
}

impl From<OrderArg> for IssueOrdering {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Priority => Self::Priority,
            OrderArg::Arrival => Self::Arrival,
        }
    }
}

impl Cli {
    #[must_use]
    pub fn subcommand(&self) -> Command {
        self.command.clone().unwrap_or(Command::Dashboard)
    }

    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        let issue_order = match &self.command {
            Some(Command::Issues { order: Some(order) }) => Some(IssueOrdering::from(*order)),
            _ => None,
        };
        ConfigOverrides {
            api_url: self.api_url.clone(),
            issue_order,
            log_level: None,
        }
    }
}
