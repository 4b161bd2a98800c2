//! `oa2 run` / `oa2 validate` / `oa2 config`: past vs current reconciliation.

use std::path::{Path, PathBuf};

use clap::Args;
use oa2_recon::{MatchPolicy, RawTable, ReconConfig, ReconError, ReconResult, Snapshot};
use tracing::{debug, info};

use crate::exit_codes::{recon_exit_code, EXIT_IO, EXIT_USAGE};
use crate::CliError;

pub const DEFAULT_OUTPUT: &str = "Reporte_OA2.xlsx";

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Past snapshot (.xlsx, .xls, .ods or .csv)
    pub past: PathBuf,

    /// Current snapshot (.xlsx, .xls, .ods or .csv)
    pub current: PathBuf,

    /// TOML config file (defaults reproduce the standard OA-2 report)
    #[arg(long, short = 'c', env = "OA2_CONFIG")]
    pub config: Option<PathBuf>,

    /// Compare only accounts starting with this prefix. Repeatable; replaces
    /// the configured policies.
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Vec<String>,

    /// Add a whole-account comparison. Replaces the configured policies.
    #[arg(long)]
    pub full_key: bool,

    /// Report workbook path
    #[arg(long, short = 'o', default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Print the full result as JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Write the full result as JSON to a file
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    /// Worksheet to read from the past workbook (default: first sheet)
    #[arg(long, value_name = "SHEET")]
    pub sheet_past: Option<String>,

    /// Worksheet to read from the current workbook (default: first sheet)
    #[arg(long, value_name = "SHEET")]
    pub sheet_current: Option<String>,

    /// Suppress the summary on stderr
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

impl CliError {
    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("map column names under [columns] in the config file".to_string())
            }
            ReconError::ConfigParse(_) => Some("run `oa2 config` for a valid template".to_string()),
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config = resolve_config(args.config.as_deref(), &args.prefix, args.full_key)?;
    debug!(name = %config.name, policies = config.policies.len(), "config resolved");

    let past = load_snapshot(Snapshot::Past, &args.past, args.sheet_past.as_deref())?;
    let current = load_snapshot(Snapshot::Current, &args.current, args.sheet_current.as_deref())?;

    let result = oa2_recon::run(&config, &past, &current).map_err(CliError::recon)?;

    // Render everything before writing anything
    let (workbook, stats) = oa2_io::xlsx::render_report(&result).map_err(CliError::io)?;
    let json = if args.json || args.json_output.is_some() {
        Some(result.to_json_pretty().map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?)
    } else {
        None
    };

    std::fs::write(&args.output, &workbook)
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", args.output.display())))?;
    info!(path = %args.output.display(), sheets = stats.sheets_written, rows = stats.rows_written, "report written");

    if let (Some(path), Some(json)) = (&args.json_output, &json) {
        std::fs::write(path, json)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
    }

    if args.json {
        if let Some(json) = &json {
            println!("{json}");
        }
    }

    if !args.quiet {
        print_summary(&result, &args.output);
    }

    Ok(())
}

pub fn cmd_validate(path: PathBuf) -> Result<(), CliError> {
    let config = ReconConfig::load(&path).map_err(CliError::recon)?;
    eprintln!(
        "{}: ok ({} {})",
        path.display(),
        config.policies.len(),
        if config.policies.len() == 1 { "policy" } else { "policies" }
    );
    for policy in &config.policies {
        eprintln!("  {:<24} {}", policy.sheet_name(), policy);
    }
    Ok(())
}

pub fn cmd_config() -> Result<(), CliError> {
    let toml = ReconConfig::default().to_toml().map_err(CliError::recon)?;
    print!("{toml}");
    Ok(())
}

/// Config file (or defaults), with command-line policies replacing the configured ones.
fn resolve_config(
    path: Option<&Path>,
    prefixes: &[String],
    full_key: bool,
) -> Result<ReconConfig, CliError> {
    let config = match path {
        Some(path) => ReconConfig::load(path).map_err(CliError::recon)?,
        None => ReconConfig::default(),
    };

    if prefixes.is_empty() && !full_key {
        return Ok(config);
    }

    let mut policies: Vec<MatchPolicy> =
        prefixes.iter().map(|p| MatchPolicy::prefix_group(p.trim())).collect();
    if full_key {
        policies.push(MatchPolicy::full_key());
    }

    config
        .with_policies(policies)
        .map_err(|e| CliError::args(e.to_string()).with_hint("check --prefix values for duplicates"))
}

fn load_snapshot(snapshot: Snapshot, path: &Path, sheet: Option<&str>) -> Result<RawTable, CliError> {
    if !path.exists() {
        return Err(CliError {
            code: EXIT_IO,
            message: format!("{snapshot} snapshot not found: {}", path.display()),
            hint: None,
        });
    }
    oa2_io::InputFormat::from_path(path).map_err(|e| CliError {
        code: EXIT_USAGE,
        message: e,
        hint: Some("inputs must be .xlsx, .xlsm, .xls, .xlsb, .ods, .csv or .tsv".to_string()),
    })?;

    let table = oa2_io::read_table(path, sheet)
        .map_err(|e| CliError::io(format!("{snapshot} snapshot {}: {e}", path.display())))?;
    debug!(%snapshot, rows = table.len(), columns = table.headers.len(), "loaded snapshot");
    Ok(table)
}

fn print_summary(result: &ReconResult, output: &Path) {
    eprintln!(
        "{}: past {} records ({} rows), current {} records ({} rows)",
        result.meta.config_name,
        result.past.len(),
        result.past.raw_rows,
        result.current.len(),
        result.current.raw_rows,
    );

    let coerced = result.past.coerced_amounts + result.current.coerced_amounts;
    if coerced > 0 {
        eprintln!("warning: {coerced} non-numeric amounts counted as zero");
    }

    for table in &result.comparisons {
        let s = &table.summary;
        eprintln!(
            "  {:<24} {:>6} rows: {} same ({} changed), {} different account, {} only past, {} only current, net {}",
            table.name,
            s.total_rows,
            s.same_account,
            s.changed,
            s.different_account,
            s.only_in_past,
            s.only_in_current,
            s.net_difference,
        );
    }

    eprintln!("wrote {}", output.display());
}
