//! Command execution over a file-backed document.

use anyhow::{Context, Result};
use log::debug;

use crate::cli::{Cli, Command};
use crate::config::Config;
use rangekit_core::{DefineRequest, HostDocument, MemoryHost, NameManager, NamedRangeView};
use rangekit_engine::engine::{FormulaCompiler, RangeAddress, SelectionGrid, parse_range_address};

/// RANGE value naming the document's stored selection.
const SELECTION_KEYWORD: &str = "selection";

pub fn run(cli: &Cli, config: &Config) -> Result<()> {
    let host = MemoryHost::with_file(&cli.file)
        .with_context(|| format!("Failed to open {}", cli.file.display()))?;
    let mut names = NameManager::new(host, FormulaCompiler::new(config.window_buffer))
        .with_default_scope(config.default_scope.clone());

    match &cli.command {
        Command::List => {
            for view in names.list()? {
                println!("{}", format_view(&view));
            }
        }
        Command::Compile { range } => {
            let grid = selection_grid(cli, resolve_range(&names, range)?)?;
            let compiled = names.preview(&grid, &cli.options)?;
            debug!("compiled {} with {:?} strategy", grid.range, compiled.strategy);
            println!("{}", compiled.formula);
        }
        Command::Define { name, range } => {
            let grid = selection_grid(cli, resolve_range(&names, range)?)?;
            let payload = names.define_from_selection(&request(cli, name), &grid)?;
            println!("{}", payload.formula);
            save(&mut names)?;
        }
        Command::Promote { name, reference } => {
            let payload = names.define_from_reference(&request(cli, name), reference)?;
            println!("{}", payload.formula);
            save(&mut names)?;
        }
        Command::Rename { old, new } => {
            names.rename(old, new)?;
            save(&mut names)?;
        }
        Command::Delete { name } => {
            names.remove(name)?;
            save(&mut names)?;
        }
        Command::Prune => {
            let removed = names.remove_broken()?;
            for name in &removed {
                println!("{}", name);
            }
            if !removed.is_empty() {
                save(&mut names)?;
            }
        }
        Command::CheckName { name } => {
            names.check_name(name, None)?;
            println!("{} is available", name);
        }
    }
    Ok(())
}

fn request(cli: &Cli, name: &str) -> DefineRequest {
    DefineRequest {
        name: name.to_string(),
        description: cli.description.clone(),
        options: cli.options.clone(),
        scope: cli.scope.clone(),
    }
}

/// Parse a RANGE argument; an address without a sheet lands on the first sheet.
fn resolve_range(names: &NameManager<MemoryHost>, text: &str) -> Result<RangeAddress> {
    if text.eq_ignore_ascii_case(SELECTION_KEYWORD) {
        let snapshot = names.host().selection()?;
        return Ok(snapshot.range()?);
    }
    let mut range = parse_range_address(text)?;
    if range.sheet.is_empty() {
        if let Some(first) = names.host().sheets()?.into_iter().next() {
            range.sheet = first;
        }
    }
    Ok(range)
}

/// Leading skip counts become leading skip indices on the grid.
fn selection_grid(cli: &Cli, range: RangeAddress) -> Result<SelectionGrid> {
    let leading_rows = cli.options.skip_rows.min(range.row_count() - 1);
    let leading_cols = cli.options.skip_cols.min(range.col_count() - 1);
    let rows: Vec<u32> = (0..leading_rows).chain(cli.skip_row_idx.iter().copied()).collect();
    let cols: Vec<u32> = (0..leading_cols).chain(cli.skip_col_idx.iter().copied()).collect();
    Ok(SelectionGrid::with_skips(range, rows, cols)?)
}

fn save(names: &mut NameManager<MemoryHost>) -> Result<()> {
    let path = names.host_mut().save_file()?;
    debug!("saved {}", path.display());
    Ok(())
}

fn format_view(view: &NamedRangeView) -> String {
    let mut line = format!(
        "{}\t{}\t{}\t{}\t{}",
        view.record.name, view.record.scope, view.range_type, view.health, view.record.formula
    );
    if !view.description.is_empty() {
        line.push('\t');
        line.push_str(&view.description);
    }
    line
}
