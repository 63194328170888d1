//! Hand-rolled command line parsing.

use std::path::PathBuf;

use crate::error::CliError;
use rangekit_core::Scope;
use rangekit_engine::engine::CompilerOptions;

pub fn print_usage() {
    eprintln!("Usage: rangekit [OPTIONS] <FILE> <COMMAND> [ARGS]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <FILE>                    Names document to open (.nrd), created on save");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  list                      List names with type and health");
    eprintln!("  compile <RANGE>           Print the formula for a range without saving");
    eprintln!("  define <NAME> <RANGE>     Save a name over a range");
    eprintln!("  promote <NAME> <REF>      Save a name over a typed reference");
    eprintln!("  rename <OLD> <NEW>        Rename a name");
    eprintln!("  delete <NAME>             Delete a name");
    eprintln!("  prune                     Delete every broken name");
    eprintln!("  check-name <NAME>         Check that a name is valid and unused");
    eprintln!();
    eprintln!("  RANGE may be 'selection' to use the document's current selection.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <FILE>           Load settings from a TOML file");
    eprintln!("  -v, --verbose             Log compiler decisions");
    eprintln!("  -d, --description <TEXT>  Description stored with the name");
    eprintln!("  --skip-rows <N>           Skip the first N rows");
    eprintln!("  --skip-cols <N>           Skip the first N columns");
    eprintln!("  --skip-row-idx <LIST>     Skip rows by zero-based index, e.g. 1,3");
    eprintln!("  --skip-col-idx <LIST>     Skip columns by zero-based index");
    eprintln!("  --fixed-cols <N>          Keep the first N columns fixed");
    eprintln!("  --expand-rows             Grow downward as data is added");
    eprintln!("  --expand-cols             Grow rightward as data is added");
    eprintln!("  --last-row                Keep only the last row");
    eprintln!("  --last-col                Keep only the last column");
    eprintln!("  --scope <SCOPE>           'document' or a sheet name");
    eprintln!("  -h, --help                Print help");
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    List,
    Compile { range: String },
    Define { name: String, range: String },
    Promote { name: String, reference: String },
    Rename { old: String, new: String },
    Delete { name: String },
    Prune,
    CheckName { name: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cli {
    pub file: PathBuf,
    pub command: Command,
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub description: String,
    pub options: CompilerOptions,
    pub skip_row_idx: Vec<u32>,
    pub skip_col_idx: Vec<u32>,
    pub scope: Option<Scope>,
}

/// Parse everything after the program name. `Ok(None)` means help was asked for.
pub fn parse_args(args: &[String]) -> Result<Option<Cli>, CliError> {
    let mut positional: Vec<String> = Vec::new();
    let mut config = None;
    let mut verbose = false;
    let mut description = String::new();
    let mut options = CompilerOptions::default();
    let mut skip_row_idx = Vec::new();
    let mut skip_col_idx = Vec::new();
    let mut scope = None;

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-h" | "--help" => return Ok(None),
            "-v" | "--verbose" => verbose = true,
            "--expand-rows" => options.expand_rows = true,
            "--expand-cols" => options.expand_cols = true,
            "--last-row" => options.last_row_only = true,
            "--last-col" => options.last_column_only = true,
            "--config" | "-d" | "--description" | "--skip-rows" | "--skip-cols"
            | "--skip-row-idx" | "--skip-col-idx" | "--fixed-cols" | "--scope" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    return Err(CliError::MissingValue(arg.to_string()));
                };
                match arg {
                    "--config" => config = Some(PathBuf::from(value)),
                    "-d" | "--description" => description = value.clone(),
                    "--skip-rows" => options.skip_rows = parse_count(arg, value)?,
                    "--skip-cols" => options.skip_cols = parse_count(arg, value)?,
                    "--fixed-cols" => options.fixed_column_count = parse_count(arg, value)?,
                    "--skip-row-idx" => skip_row_idx.extend(parse_index_list(arg, value)?),
                    "--skip-col-idx" => skip_col_idx.extend(parse_index_list(arg, value)?),
                    _ => scope = Some(Scope::parse(value)),
                }
            }
            _ if arg.starts_with('-') && arg.len() > 1 => {
                return Err(CliError::UnknownOption(arg.to_string()));
            }
            _ => positional.push(arg.to_string()),
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    let file = positional
        .next()
        .map(PathBuf::from)
        .ok_or(CliError::MissingArgument("FILE"))?;
    let command_name = positional.next().ok_or(CliError::MissingArgument("COMMAND"))?;
    let mut next = |what: &'static str| positional.next().ok_or(CliError::MissingArgument(what));

    let command = match command_name.as_str() {
        "list" => Command::List,
        "compile" => Command::Compile {
            range: next("RANGE")?,
        },
        "define" => Command::Define {
            name: next("NAME")?,
            range: next("RANGE")?,
        },
        "promote" => Command::Promote {
            name: next("NAME")?,
            reference: next("REFERENCE")?,
        },
        "rename" => Command::Rename {
            old: next("OLD")?,
            new: next("NEW")?,
        },
        "delete" => Command::Delete {
            name: next("NAME")?,
        },
        "prune" => Command::Prune,
        "check-name" => Command::CheckName {
            name: next("NAME")?,
        },
        other => return Err(CliError::UnknownCommand(other.to_string())),
    };
    if let Some(extra) = positional.next() {
        return Err(CliError::UnexpectedArgument(extra));
    }

    Ok(Some(Cli {
        file,
        command,
        config,
        verbose,
        description,
        options,
        skip_row_idx,
        skip_col_idx,
        scope,
    }))
}

fn parse_count(flag: &str, value: &str) -> Result<u32, CliError> {
    value.trim().parse().map_err(|_| CliError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
    })
}

fn parse_index_list(flag: &str, value: &str) -> Result<Vec<u32>, CliError> {
    value
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| parse_count(flag, part))
        .collect()
}
