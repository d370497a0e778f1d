use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use recce_state_core::api::{CloudOptions, LoaderOptions, PullRequestId};

#[derive(Parser, Debug)]
#[command(name = "recce-state", version, about = "Inspect and persist Recce state snapshots")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where a snapshot lives. Mirrors the options a Recce server is launched with.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct LoaderArgs {
    /// Local state file.
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Review session: a state file is mandatory.
    #[arg(long)]
    pub review: bool,

    /// Use a remote store instead of a local file.
    #[arg(long)]
    pub cloud: bool,

    /// Remote selector. `s3://bucket` targets the object store, anything else
    /// the Recce Cloud API. Falls back to RECCE_STATE_HOST.
    #[arg(long)]
    pub host: Option<String>,

    /// Recce Cloud token. Falls back to RECCE_CLOUD_TOKEN.
    #[arg(long)]
    pub token: Option<String>,

    /// Repository as `owner/name`.
    #[arg(long)]
    pub repository: Option<String>,

    #[arg(long = "pr")]
    pub pull_request: Option<PullRequestId>,
}

impl LoaderArgs {
    pub fn to_options(&self) -> LoaderOptions {
        LoaderOptions {
            review_mode: self.review,
            cloud_mode: self.cloud,
            state_file: self.state_file.clone(),
            cloud: CloudOptions {
                host: self.host.clone(),
                token: self.token.clone(),
                repository: self.repository.clone(),
                pull_request_id: self.pull_request.clone(),
            },
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct InitArgs {
    #[command(flatten)]
    pub target: LoaderArgs,

    /// Record the branch name in the snapshot's git section.
    #[arg(long)]
    pub branch: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub source: LoaderArgs,

    /// Print the full snapshot instead of a summary.
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ExportArgs {
    /// Snapshot to read.
    #[arg(long)]
    pub input: PathBuf,

    #[command(flatten)]
    pub target: LoaderArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an empty snapshot.
    Init(InitArgs),
    /// Check that the launch options are usable.
    Verify(LoaderArgs),
    /// Load a snapshot and describe it.
    Show(ShowArgs),
    /// Store a local snapshot to the configured target.
    Export(ExportArgs),
}
