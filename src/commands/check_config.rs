//! Check-config command implementation

use wfexport::config::ExportConfig;
use wfexport::error::Result;

use crate::cli::CheckConfigArgs;
use crate::logging;
use crate::ui::display;

/// Run check-config command
pub fn run(args: &CheckConfigArgs) -> Result<i32> {
    let config = ExportConfig::load(&args.common.config)?;
    logging::init(args.common.log_level.as_deref(), config.log_level());

    let resources = config.require_active_resources()?;
    display::display_config_summary(&config, &resources)?;
    Ok(0)
}
