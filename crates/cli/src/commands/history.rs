// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dbup history`: ledger rows, oldest first.

use std::io::Write;

use anyhow::Result;

use super::Context;
use crate::output::{write_json, OutputFormat};
use crate::table::{Column, Table};

pub fn handle(ctx: &Context, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    let entries = ctx.upgrader.history()?;

    if format == OutputFormat::Json {
        return write_json(out, &entries);
    }
    if entries.is_empty() {
        writeln!(out, "No upgrade history recorded")?;
        return Ok(());
    }

    let mut table = Table::new(vec![
        Column::right("ID"),
        Column::left("VERSION"),
        Column::status("PHASE"),
        Column::muted("UPDATED"),
    ]);
    for entry in &entries {
        table.row(vec![
            entry.id.to_string(),
            entry.version.to_string(),
            entry.phase.to_string(),
            entry.updated.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }
    table.render(out)?;
    Ok(())
}
