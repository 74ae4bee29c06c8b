//! Display functions for configuration summaries and run reports

use console::Style;

use wfexport::config::ExportConfig;
use wfexport::domain::ResourceDescriptor;
use wfexport::error::Result;
use wfexport::orchestrator::{ResourceOutcome, ResourceReport, RunReport};

macro_rules! display_field {
    ($label:expr, $value:expr) => {
        println!("  {} {}", Style::new().bold().apply_to($label), $value);
    };
}

/// Display the resolved configuration and the resources an export would process
pub fn display_config_summary(config: &ExportConfig, resources: &[ResourceDescriptor]) -> Result<()> {
    println!("{}", Style::new().bold().green().apply_to("Configuration OK"));
    display_field!("Export root:", config.start_path().display());
    display_field!("Manifest:", config.manifest_path().display());
    display_field!("Backups:", config.backup_dir().display());
    display_field!("Bindings file:", config.bindings_csv_path().display());
    display_field!("Export libraries:", config.export_libraries());

    println!("  {}", Style::new().bold().apply_to("Path rules:"));
    for (pattern, replacement) in config.path_rules()? {
        println!("    {pattern} -> {replacement}");
    }

    println!("  {}", Style::new().bold().apply_to("Active resources:"));
    let global = config.export_libraries();
    for resource in resources {
        let libraries = if resource.effective_export_libraries(global) {
            Style::new().green().apply_to("libraries: yes")
        } else {
            Style::new().dim().apply_to("libraries: no")
        };
        let existing = if resource.is_existing { " [existing]" } else { "" };
        println!("    {}{existing} ({libraries})", resource.label());
    }
    Ok(())
}

fn display_resource(resource: &ResourceReport) {
    let (marker, style) = match resource.outcome {
        ResourceOutcome::SucceededWithBinding | ResourceOutcome::Succeeded => ("✓", Style::new().green()),
        ResourceOutcome::Failed => ("✗", Style::new().red()),
    };
    println!("  {} {}", style.apply_to(marker), resource.label);

    if let Some(key) = &resource.resource_key {
        println!("      key: {key}");
    }
    let artifacts = &resource.artifacts;
    if artifacts.attempted > 0 {
        println!(
            "      artifacts: {} attempted, {} succeeded, {} failed",
            artifacts.attempted, artifacts.succeeded, artifacts.failed
        );
        for origin in &artifacts.failed_origins {
            println!("        {} {origin}", Style::new().yellow().apply_to("failed:"));
        }
    }
    for path in &resource.unmapped_paths {
        println!("      {} {path}", Style::new().yellow().apply_to("unmapped:"));
    }
    if let Some(error) = &resource.error {
        println!("      {}", Style::new().red().apply_to(error));
    }
}

/// Display the run-level summary
pub fn display_run_summary(report: &RunReport) {
    println!();
    println!("{}", Style::new().bold().apply_to("Export summary"));
    for resource in &report.resources {
        display_resource(resource);
    }

    let successful = report.successful();
    let failed = report.failed();
    println!();
    println!(
        "{} succeeded, {} failed",
        Style::new().green().apply_to(successful.len()),
        Style::new().red().apply_to(failed.len())
    );
    if !report.bindings.is_empty() {
        println!("{} resource binding(s) recorded", report.bindings.len());
    }
    if report.interrupted {
        println!("{}", Style::new().yellow().apply_to("Interrupted before all resources were processed"));
    }
}
