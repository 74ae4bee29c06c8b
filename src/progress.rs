//! Progress bar display for export runs

use indicatif::{ProgressBar, ProgressStyle};

use crate::common::string_utils::truncate_left;

const MESSAGE_WIDTH: usize = 50;

/// One bar over the active resources
pub struct ProgressDisplay {
    resource_pb: ProgressBar,
}

impl ProgressDisplay {
    /// Create a new progress display with total resource count
    pub fn new(total_resources: u64) -> Self {
        let resource_pb = ProgressBar::new(total_resources);
        match ProgressStyle::default_bar().template("[{bar:40.cyan/blue}] {pos}/{len} {msg}") {
            Ok(style) => resource_pb.set_style(style.progress_chars("#>-")),
            Err(e) => tracing::debug!(error = %e, "Using default progress style"),
        }
        Self { resource_pb }
    }

    /// Hidden bar, for `--no-progress` and non-interactive runs
    pub fn hidden() -> Self {
        Self {
            resource_pb: ProgressBar::hidden(),
        }
    }

    /// Show the resource being exported and the current step
    pub fn update_resource(&self, label: &str, step: &str) {
        let msg = truncate_left(&format!("{label}: {step}"), MESSAGE_WIDTH);
        self.resource_pb.set_message(msg);
    }

    /// Increment resource progress
    pub fn inc_resource(&self) {
        self.resource_pb.inc(1);
    }

    pub fn finish(&self) {
        self.resource_pb.finish_and_clear();
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.resource_pb.abandon();
    }
}
