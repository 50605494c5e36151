// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbup upgrade`: resolve, plan and run.

use std::io::Write;

use anyhow::Result;
use dbup_core::Version;
use dbup_engine::{RunError, RunOptions, UpgradeError};

use super::Context;
use crate::output::{write_report, OutputFormat};

#[derive(clap::Args)]
pub struct UpgradeArgs {
    /// Version to upgrade to (default: config target, then newest in catalog)
    #[arg(long)]
    pub target: Option<Version>,

    /// Re-run the step left unfinished by an earlier run
    #[arg(long)]
    pub resume_interrupted: bool,

    /// Show the steps without running them
    #[arg(long)]
    pub dry_run: bool,
}

pub fn handle(
    args: UpgradeArgs,
    ctx: &Context,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let target = args.target.or_else(|| ctx.config.upgrade.target.clone());
    let options = RunOptions {
        resume_interrupted: args.resume_interrupted || ctx.config.upgrade.resume_interrupted,
        dry_run: args.dry_run,
    };

    match ctx.upgrader.upgrade(target.as_ref(), options) {
        Ok(report) => write_report(out, &report, format),
        Err(err) => {
            // Partial report first so the operator sees which steps landed
            if let UpgradeError::Run(RunError::Failed(failed)) = &err {
                write_report(out, &failed.report, format)?;
            }
            Err(err.into())
        }
    }
}
