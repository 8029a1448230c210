//! # CLI Module
//!
//! User-facing commands of the planets CLI. Each command reads its
//! configuration from the environment at the point of use, runs one planet
//! workflow and turns the outcome into log output.
//!
//! - [`create`] - create planet instances from the sample data
//! - [`update`] - fill in the remaining properties of existing planets
//! - [`delete`] - delete every planet instance
//! - [`info`] - print the planet instances stored in the CMS
//!
//! Workflows touching several planets return a [`BatchReport`]. A report with
//! failed items makes the command fail, so the process exits with status 1.

mod create;
mod delete;
mod info;
mod update;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use create::create;
pub use delete::delete;
pub use info::info;
pub use update::update;

use crate::{
    Error, Res,
    cms::InstanceClient,
    config::CmsConfig,
    info,
    types::BatchReport,
    warning,
};

fn instance_client() -> Res<InstanceClient> {
    let config = CmsConfig::from_env()?;
    InstanceClient::from_config(&config)
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

/// Logs a summary of `report` and fails when any item failed.
fn conclude(operation: &'static str, report: BatchReport) -> Res<()> {
    info!(
        "{}: {} of {} succeeded",
        operation,
        report.succeeded.len(),
        report.total()
    );
    if report.is_success() {
        return Ok(());
    }

    for failure in &report.failed {
        warning!("{}: {}", failure.item, failure.reason);
    }

    Err(Error::Incomplete {
        operation,
        failed: report.failed.len(),
        total: report.total(),
    })
}
