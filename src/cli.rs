//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// wf-export - workspace job and pipeline exporter
///
/// Export jobs and pipelines into version-controllable bundles.
#[derive(Parser, Debug)]
#[command(
    name = "wf-export",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Export workspace jobs and pipelines into bundles",
    long_about = "wf-export generates a bundle document for every active job and pipeline in \
                  config.yml, downloads the files they reference, and rewrites the documents to \
                  point at the exported copies.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  wf-export check-config --config config.yml\n    \
                  wf-export export --config config.yml --host adb-123.azuredatabricks.net\n    \
                  DATABRICKS_TOKEN=... wf-export export --no-progress --log-level debug"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every active job and pipeline
    Export(ExportArgs),

    /// Validate configuration and list active resources
    CheckConfig(CheckConfigArgs),
}

/// Options shared by every command
#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the export configuration
    #[arg(
        long,
        short = 'c',
        env = "WF_EXPORT_CONFIG",
        default_value = "config.yml",
        value_name = "PATH"
    )]
    pub config: PathBuf,

    /// Log level or filter directive (overrides RUST_LOG and the config)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

/// Arguments for the export command
#[derive(Parser, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub common: ConfigArgs,

    /// Workspace URL
    #[arg(long, env = "DATABRICKS_HOST", value_name = "URL")]
    pub host: Option<String>,

    /// Personal access token
    #[arg(long, env = "DATABRICKS_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Do not show the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the check-config command
#[derive(Parser, Debug)]
pub struct CheckConfigArgs {
    #[command(flatten)]
    pub common: ConfigArgs,
}
