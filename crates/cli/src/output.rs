// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use clap::ValueEnum;
use dbup_core::format_elapsed_ms;
use dbup_engine::RunReport;
use serde::Serialize;

use crate::table::{Column, Table};

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Pretty-printed JSON followed by a newline.
pub fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Step table plus a one-line summary for a finished (or failed) run.
pub fn write_report(
    out: &mut impl Write,
    report: &RunReport,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return write_json(out, report);
    }

    if report.steps.is_empty() {
        writeln!(out, "Nothing to upgrade")?;
        return Ok(());
    }
    if report.dry_run {
        writeln!(out, "Dry run, no changes made\n")?;
    }

    let mut table = Table::new(vec![
        Column::left("STEP"),
        Column::status("STATE"),
        Column::right("ELAPSED"),
        Column::muted("ERROR"),
    ]);
    for step in &report.steps {
        table.row(vec![
            step.step.to_string(),
            step.state.to_string(),
            format_elapsed_ms(step.elapsed_ms),
            step.error.clone().unwrap_or_default(),
        ]);
    }
    table.render(out)?;

    writeln!(out)?;
    if report.dry_run {
        if let Some(last) = report.steps.last() {
            writeln!(out, "Would upgrade to {}", last.step.target)?;
        }
        return Ok(());
    }
    match (report.failed_step(), report.reached()) {
        (Some(failed), _) => writeln!(out, "Upgrade stopped at step {}", failed.step)?,
        (None, Some(version)) => writeln!(
            out,
            "Upgraded to {version} in {}",
            format_elapsed_ms(report.total_elapsed_ms())
        )?,
        (None, None) => writeln!(out, "No step completed")?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
