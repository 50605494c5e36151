// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbup plan`: the step chain an upgrade would run.

use std::io::Write;

use anyhow::Result;
use dbup_core::Version;

use super::Context;
use crate::output::{write_json, OutputFormat};
use crate::table::{Column, Table};

#[derive(clap::Args)]
pub struct PlanArgs {
    /// Version to plan for (default: config target, then newest in catalog)
    #[arg(long)]
    pub target: Option<Version>,
}

pub fn handle(
    args: PlanArgs,
    ctx: &Context,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let target = args.target.or_else(|| ctx.config.upgrade.target.clone());
    let plan = ctx.upgrader.plan(target.as_ref())?;

    if format == OutputFormat::Json {
        return write_json(out, &plan);
    }

    if plan.steps.is_empty() {
        writeln!(out, "Database is at {}, nothing to plan for {}", plan.from, plan.to)?;
        return Ok(());
    }

    writeln!(
        out,
        "Upgrade {} -> {} ({} step{})\n",
        plan.from,
        plan.to,
        plan.steps.len(),
        if plan.steps.len() == 1 { "" } else { "s" }
    )?;
    let mut table = Table::new(vec![
        Column::left("STEP"),
        Column::left("ROLLING"),
        Column::left("SCRIPTS"),
        Column::muted("DESCRIPTION"),
    ]);
    for step in &plan.steps {
        let mut scripts: Vec<&str> = step
            .prepare
            .iter()
            .chain(&step.data)
            .chain(&step.cleanup)
            .map(String::as_str)
            .collect();
        if step.has_data_migration && step.data.is_empty() {
            scripts.push("(code)");
        }
        table.row(vec![
            step.step.to_string(),
            if step.rolling_upgrade { "yes" } else { "no" }.to_string(),
            if scripts.is_empty() {
                "-".to_string()
            } else {
                scripts.join(", ")
            },
            step.description.clone().unwrap_or_default(),
        ]);
    }
    table.render(out)?;
    Ok(())
}
