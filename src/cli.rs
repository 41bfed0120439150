use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::Rating;

#[derive(Parser, Debug)]
#[command(
    name = "evalbench",
    version,
    about = "Review and rate pre-generated structured model outputs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Review(ReviewArgs),
    Show(ShowArgs),
    Rate(RateArgs),
    Export(ExportArgs),
    Reset(ResetArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    #[arg(long, default_value = "all_features_combined.json")]
    pub corpus: PathBuf,

    #[arg(long, default_value = ".cache/evalbench")]
    pub data_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ReviewArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub user: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub request: String,

    #[arg(long)]
    pub section: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RateArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub user: String,

    #[arg(long)]
    pub request: String,

    #[arg(long)]
    pub section: Option<String>,

    #[arg(long, value_enum)]
    pub rating: Rating,

    #[arg(long, default_value = "")]
    pub comment: String,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(long, default_value = ".cache/evalbench")]
    pub data_dir: PathBuf,

    #[arg(long)]
    pub user: String,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ResetArgs {
    #[arg(long, default_value = ".cache/evalbench")]
    pub data_dir: PathBuf,

    #[arg(long)]
    pub user: String,

    #[arg(long, default_value_t = false)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long)]
    pub user: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
