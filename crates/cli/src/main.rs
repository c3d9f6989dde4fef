// stuffcheck CLI - stuffing sheet extraction and reconciliation against sheet IN

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use serde_json::{json, Value};

use stuffcheck_cli::exit_codes::{
    source_exit_code, EXIT_CHECK_DISCREPANCY, EXIT_CONFIG_INVALID, EXIT_INPUT_READ,
    EXIT_SERVE_BIND, EXIT_SUCCESS, EXIT_USAGE,
};
use stuffcheck_cli::render::{parsed_summary, render_report, to_text};
use stuffcheck_cli::{CheckInServer, Handler};
use stuffcheck_config::{open_source, ConfigError, Settings};
use stuffcheck_recon::{
    check_in, extract_with_layout, MatchStatus, ParsedDocument, ReconciliationReport, SourceError,
};

#[derive(Parser)]
#[command(name = "stuffcheck")]
#[command(about = "Check stuffing sheets against the shared inventory sheet (sheet IN)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: ~/.config/stuffcheck/config.toml)
    #[arg(long, global = true, env = "STUFFCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read stuffing sheets and print the invoice, brand, container and items
    #[command(after_help = "\
Examples:
  stuffcheck extract stuffing.xlsx
  stuffcheck extract *.xlsx --json")]
    Extract {
        /// Stuffing sheet files (.xlsx, .xls, .xlsb, .ods, .csv)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print one JSON array to stdout
        #[arg(long)]
        json: bool,
    },

    /// Reconcile stuffing sheets against the reference sheet
    #[command(after_help = "\
Examples:
  stuffcheck check stuffing.xlsx --source stock.xlsx
  stuffcheck check a.xlsx b.xlsx --json
  stuffcheck check stuffing.csv --invoice INV-01 --url https://sheets.example.com/export

Exit codes:
  0   every item ok
  1   mismatch, missing item, or invoice column not found
  3   a stuffing file could not be read
  10+ reference source failure (see exit_codes.rs)")]
    Check {
        /// Stuffing sheet files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Invoice title to look up instead of the one in each sheet
        #[arg(long)]
        invoice: Option<String>,

        /// Reference workbook or CSV (overrides source.path / source.url)
        #[arg(long, conflicts_with = "url")]
        source: Option<PathBuf>,

        /// Reference CSV endpoint (overrides source.path / source.url)
        #[arg(long)]
        url: Option<String>,

        /// Reference sheet name
        #[arg(long)]
        sheet: Option<String>,

        /// Print one JSON array to stdout
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP check-in service
    #[command(after_help = "\
Routes:
  POST /api/check-in   {\"invoice\": \"INV-01\", \"items\": [...]} -> report
  POST /api/extract    raw workbook bytes -> parsed document")]
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Inspect settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print effective settings (file + environment)
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Print the default settings file path
    Path,
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: u8, serving: bool) {
    let default = match (verbose, serving) {
        (0, true) => "info",
        (0, false) => "warn",
        (1, _) => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, matches!(cli.command, Some(Commands::Serve { .. })));
    let config = cli.config.as_deref();

    let result = match cli.command {
        None => {
            eprintln!("Usage: stuffcheck <command> [options]");
            eprintln!("       stuffcheck --help for more information");
            Ok(())
        }
        Some(Commands::Extract { files, json }) => cmd_extract(config, files, json),
        Some(Commands::Check { files, invoice, source, url, sheet, json }) => {
            cmd_check(config, files, invoice, source, url, sheet, json)
        }
        Some(Commands::Serve { bind }) => cmd_serve(config, bind),
        Some(Commands::Config(ConfigCommands::Show { json })) => cmd_config_show(config, json),
        Some(Commands::Config(ConfigCommands::Path)) => {
            println!("{}", Settings::config_path().display());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INPUT_READ, message: msg.into(), hint: None }
    }

    pub fn config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Parse { .. } | ConfigError::Validation(_) => {
                Some("unknown keys are rejected; compare with `stuffcheck config show`".to_string())
            }
            ConfigError::Read { .. } => None,
        };
        Self { code: EXIT_CONFIG_INVALID, message: err.to_string(), hint }
    }

    /// Create error from a source error with its dedicated exit code.
    pub fn source(err: &SourceError) -> Self {
        let hint = match err {
            SourceError::NotConfigured => Some(format!(
                "pass --source FILE, or set source.path / source.url in {}",
                Settings::config_path().display()
            )),
            SourceError::MissingCredentials(var) => Some(format!("export {var}=<token>")),
            SourceError::SheetNotFound(_) => Some("pick the sheet with --sheet NAME".to_string()),
            _ => None,
        };
        Self { code: source_exit_code(err), message: err.to_string(), hint }
    }

    /// Exit code only; the details were already printed.
    pub fn silent(code: u8) -> Self {
        Self { code, message: String::new(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Load settings; `~` in paths expands to the home directory.
fn load_settings(config: Option<&Path>) -> Result<Settings, CliError> {
    let config = config.map(expand_tilde);
    let mut settings = Settings::load(config.as_deref()).map_err(CliError::config)?;
    settings.source.path = settings.source.path.as_deref().map(expand_tilde);
    Ok(settings)
}

fn expand_tilde(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string())
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::input(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn read_document(path: &Path, settings: &Settings) -> Result<ParsedDocument, CliError> {
    let grid = stuffcheck_io::read_stuffing_sheet(path).map_err(CliError::input)?;
    Ok(extract_with_layout(&grid, &settings.recon.layout))
}

// ============================================================================
// extract
// ============================================================================

fn cmd_extract(config: Option<&Path>, files: Vec<PathBuf>, json: bool) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let mut entries = Vec::with_capacity(files.len());
    let mut failed = false;

    for path in &files {
        let name = display_name(path);
        match read_document(path, &settings) {
            Ok(doc) => {
                if !json {
                    eprintln!("{}", to_text(&parsed_summary(&name, &doc)));
                }
                entries.push(json!({ "file": name, "document": doc }));
            }
            Err(e) => {
                failed = true;
                if !json {
                    eprintln!("error: {}", e.message);
                }
                entries.push(json!({ "file": name, "error": e.message }));
            }
        }
    }

    if json {
        print_json(&Value::Array(entries))?;
    }
    if failed {
        return Err(CliError::silent(EXIT_INPUT_READ));
    }
    Ok(())
}

// ============================================================================
// check
// ============================================================================

/// Outcome of checking one stuffing file.
enum FileOutcome {
    Checked { invoice: String, report: ReconciliationReport },
    Failed(CliError),
}

fn check_file(path: &Path, invoice_override: Option<&str>, settings: &Settings) -> FileOutcome {
    let doc = match read_document(path, settings) {
        Ok(doc) => doc,
        Err(e) => return FileOutcome::Failed(e),
    };

    let invoice = invoice_override.unwrap_or(&doc.invoice_title).trim().to_string();
    if invoice.is_empty() {
        return FileOutcome::Failed(
            CliError::input(format!(
                "{}: no invoice title in cell {}",
                display_name(path),
                settings.recon.layout.invoice_cell
            ))
            .with_hint("pass --invoice TITLE"),
        );
    }

    let result = open_source(&settings.source).and_then(|mut source| {
        check_in(&settings.recon, source.as_mut(), &invoice, &doc.items)
    });
    match result {
        Ok(report) => FileOutcome::Checked { invoice, report },
        Err(e) => FileOutcome::Failed(CliError::source(&e)),
    }
}

fn is_clean(report: &ReconciliationReport) -> bool {
    report.invoice_found && report.items.iter().all(|i| i.status == MatchStatus::Ok)
}

/// Source failures outrank unreadable inputs, which outrank discrepancies.
fn exit_rank(code: u8) -> u8 {
    match code {
        EXIT_SUCCESS => 0,
        EXIT_CHECK_DISCREPANCY => 1,
        EXIT_INPUT_READ => 2,
        _ => 3,
    }
}

fn cmd_check(
    config: Option<&Path>,
    files: Vec<PathBuf>,
    invoice: Option<String>,
    source: Option<PathBuf>,
    url: Option<String>,
    sheet: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let mut settings = load_settings(config)?;
    if let Some(path) = source {
        settings.source.path = Some(expand_tilde(&path));
        settings.source.url = None;
    }
    if let Some(url) = url {
        settings.source.url = Some(url);
        settings.source.path = None;
    }
    if let Some(sheet) = sheet {
        if sheet.trim().is_empty() {
            return Err(CliError::usage("--sheet must not be empty"));
        }
        settings.source.sheet = sheet;
    }

    let mut entries = Vec::with_capacity(files.len());
    let mut exit = EXIT_SUCCESS;
    let mut first_error: Option<CliError> = None;

    for path in &files {
        let name = display_name(path);
        match check_file(path, invoice.as_deref(), &settings) {
            FileOutcome::Checked { invoice, report } => {
                if !json {
                    eprintln!("{}", to_text(&render_report(&name, &report)));
                }
                if !is_clean(&report) && exit_rank(EXIT_CHECK_DISCREPANCY) > exit_rank(exit) {
                    exit = EXIT_CHECK_DISCREPANCY;
                }
                entries.push(json!({ "file": name, "invoice": invoice, "report": report }));
            }
            FileOutcome::Failed(err) => {
                log::debug!("{}: check failed with exit code {}", name, err.code);
                if !json {
                    eprintln!("error: {}: {}", name, err.message);
                }
                entries.push(json!({ "file": name, "error": err.message }));
                if exit_rank(err.code) > exit_rank(exit) {
                    exit = err.code;
                }
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }

    if json {
        print_json(&Value::Array(entries))?;
    }

    match exit {
        EXIT_SUCCESS => Ok(()),
        code => {
            // Per-file messages are already out; only carry the hint.
            let hint = first_error.and_then(|e| e.hint);
            Err(CliError { code, message: String::new(), hint })
        }
    }
}

// ============================================================================
// serve
// ============================================================================

fn cmd_serve(config: Option<&Path>, bind: Option<String>) -> Result<(), CliError> {
    let mut settings = load_settings(config)?;
    if let Some(bind) = bind {
        settings.server.bind = bind;
    }
    if settings.source.path.is_none() && settings.source.url.is_none() {
        log::warn!("no reference source configured; check-in requests will fail");
    }

    let bind = settings.server.bind.clone();
    let server = CheckInServer::start(&bind, Handler::new(settings)).map_err(|e| CliError {
        code: EXIT_SERVE_BIND,
        message: format!("cannot listen on {}: {}", bind, e),
        hint: Some("pick another address with --bind HOST:PORT".to_string()),
    })?;
    eprintln!("listening on http://{}", server.addr());
    server.wait();
    Ok(())
}

// ============================================================================
// config
// ============================================================================

fn cmd_config_show(config: Option<&Path>, json: bool) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    if json {
        let value = serde_json::to_value(&settings).map_err(|e| CliError::input(e.to_string()))?;
        return print_json(&value);
    }
    let text = settings.to_toml().map_err(CliError::input)?;
    print!("{}", text);
    Ok(())
}
