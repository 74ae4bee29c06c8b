//! Export command implementation

use console::Term;
use wfexport::config::ExportConfig;
use wfexport::error::{self, Result};
use wfexport::generator::CliBundleGenerator;
use wfexport::interrupt;
use wfexport::orchestrator::ResourceExportOrchestrator;
use wfexport::progress::ProgressDisplay;
use wfexport::workspace_api::RestWorkspaceClient;

use crate::cli::ExportArgs;
use crate::logging;
use crate::ui::display;

/// Run export command
pub fn run(args: ExportArgs) -> Result<i32> {
    let config = ExportConfig::load(&args.common.config)?;
    logging::init(args.common.log_level.as_deref(), config.log_level());

    let host = args
        .host
        .filter(|h| !h.is_empty())
        .ok_or_else(|| error::config_invalid("workspace host is required (--host or DATABRICKS_HOST)"))?;
    let token = args
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| error::config_invalid("access token is required (--token or DATABRICKS_TOKEN)"))?;

    interrupt::install()?;

    let client = RestWorkspaceClient::new(&host, token)?;
    let generator = CliBundleGenerator::new(config.cli_path(), config.profile().map(str::to_string));

    let total = u64::try_from(config.active_resources().len()).unwrap_or(u64::MAX);
    let progress = if args.no_progress || !Term::stderr().is_term() {
        ProgressDisplay::hidden()
    } else {
        ProgressDisplay::new(total)
    };

    let orchestrator = ResourceExportOrchestrator::new(&config, &client, &generator)?.with_progress(&progress);
    let report = match orchestrator.run() {
        Ok(report) => report,
        Err(e) => {
            progress.abandon();
            return Err(e);
        }
    };
    progress.finish();

    display::display_run_summary(&report);
    Ok(if report.all_succeeded() { 0 } else { 1 })
}
