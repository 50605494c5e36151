// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbup status`: current version and ledger health.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use super::Context;
use crate::color;
use crate::output::{write_json, OutputFormat};
use dbup_engine::Status;

#[derive(Serialize)]
struct StatusView<'a> {
    database: String,
    #[serde(flatten)]
    status: &'a Status,
    up_to_date: bool,
}

pub fn handle(ctx: &Context, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    let status = ctx.upgrader.status()?;
    let database = ctx.config.database.path.display().to_string();

    if format == OutputFormat::Json {
        return write_json(
            out,
            &StatusView {
                database,
                up_to_date: status.up_to_date(),
                status: &status,
            },
        );
    }

    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    writeln!(out, "database: {database}")?;
    writeln!(
        out,
        "current:  {}",
        or_dash(status.current.as_ref().map(ToString::to_string))
    )?;
    writeln!(
        out,
        "latest:   {}",
        or_dash(status.latest.as_ref().map(ToString::to_string))
    )?;
    writeln!(out, "ledger:   {}", if status.ledger { "yes" } else { "no" })?;
    if let Some(pending) = &status.pending {
        writeln!(
            out,
            "pending:  {}",
            color::status(&format!(
                "interrupted upgrade to {} (started {})",
                pending.version,
                pending.updated.format("%Y-%m-%d %H:%M:%S")
            ))
        )?;
    }
    let state = if status.pending.is_some() {
        "interrupted"
    } else if status.up_to_date() {
        "ok"
    } else {
        "behind"
    };
    writeln!(out, "state:    {}", color::status(state))?;
    Ok(())
}
