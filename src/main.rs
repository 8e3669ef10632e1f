//! Purpose: `vaxreport` CLI entry point.
//! Role: Binary crate root; parses args, layers flags over config, runs commands, emits JSON on stdout.
//! Invariants: Stdout carries only the command's JSON document.
//! Invariants: Errors are emitted as JSON on stderr (plain text on a TTY).
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use vaxreport::api::{Error, ErrorKind, to_exit_code};
use vaxreport::config::Config;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Try `vaxreport --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    let output = OutputMode {
        pretty: cli.pretty,
        color_mode,
    };
    let config = cli
        .overrides
        .apply(Config::load(cli.config.as_deref()).map_err(|err| (err, color_mode))?);

    command_dispatch::dispatch_command(cli.command, config, output)
        .map_err(add_kind_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "vaxreport",
    version,
    about = "California COVID-19 vaccination stats from the public Tableau dashboard",
    long_about = None,
    after_help = r#"EXAMPLES
  $ vaxreport report > report.json
  $ vaxreport report --date 2021-02-14 --output report.json
  $ vaxreport dashboard --pretty
  $ vaxreport groupings --region los_angeles
  $ vaxreport decode bootstrap.txt --chart "County Admin Bar"

Set RUST_LOG=info (or debug) to trace requests on stderr."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "JSON config file (endpoints, regions, limits)",
        value_hint = ValueHint::FilePath
    )]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Pretty-print JSON output")]
    pretty: bool,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,
    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Default)]
struct ConfigOverrides {
    #[arg(long, global = true, help = "Dashboard host URL")]
    dashboard_host: Option<String>,
    #[arg(long, global = true, help = "Base URL of the equity files")]
    equity_base_url: Option<String>,
    #[arg(long, global = true, help = "Maximum concurrent equity region fetches")]
    concurrency: Option<usize>,
    #[arg(long, global = true, help = "Per-request timeout in seconds")]
    timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    fn apply(self, mut config: Config) -> Config {
        if let Some(host) = self.dashboard_host {
            config.dashboard_host = host;
        }
        if let Some(base) = self.equity_base_url {
            config.equity_base_url = base;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }
        config
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct OutputMode {
    pretty: bool,
    color_mode: ColorMode,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Build the full vaccination report",
        long_about = r#"Fetch the dashboard and every region's equity files, then emit the merged report.

The report is stamped with today's date in America/Los_Angeles unless --date is given."#,
        after_help = r#"EXAMPLES
  $ vaxreport report
  $ vaxreport report --date 2021-02-14 --output report.json"#
    )]
    Report {
        #[arg(long, help = "Report date (YYYY-MM-DD)")]
        date: Option<String>,
        #[arg(long, help = "Write the report to a file instead of stdout", value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    #[command(about = "Emit dashboard totals (state and per-county administered doses)")]
    Dashboard,
    #[command(
        about = "Emit equity groupings for the state and configured regions",
        after_help = r#"EXAMPLES
  $ vaxreport groupings
  $ vaxreport groupings --region "San Luis Obispo""#
    )]
    Groupings {
        #[arg(long, help = "Only this region (name or key)")]
        region: Option<String>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Decode a saved bootstrap payload offline",
        long_about = r#"Frame and decode a bootstrap response saved to a file.

Without --chart, lists the chart names and dictionary sizes.
With --chart, emits that chart's decoded rows."#
    )]
    Decode {
        #[arg(help = "Saved bootstrap response body", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        #[arg(long, help = "Chart to decode")]
        chart: Option<String>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ vaxreport completion bash > ~/.local/share/bash-completion/completions/vaxreport
  $ vaxreport completion zsh > ~/.zfunc/_vaxreport"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn render_json(value: &Value, pretty: bool) -> String {
    let encoded = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    encoded.unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
}

fn emit_json(value: &Value, output: OutputMode) {
    let pretty = output.pretty || io::stdout().is_terminal();
    println!("{}", render_json(value, pretty));
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }
    eprintln!("{}", render_json(&error_json(err), false));
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error",
        ErrorKind::Usage => "usage error",
        ErrorKind::Io => "i/o error",
        ErrorKind::Http => "http request failed",
        ErrorKind::MalformedStream => "malformed stream",
        ErrorKind::SchemaMismatch => "unexpected document shape",
        ErrorKind::DictionaryIndexOutOfRange => "dictionary index out of range",
        ErrorKind::RowNotFound => "row not found",
        ErrorKind::FieldNotFound => "field not found",
    }
    .to_string()
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path));
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset".to_string(), json!(offset));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = vec![format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    )];
    let details = [
        ("hint:", err.hint().map(str::to_string)),
        ("path:", err.path().map(str::to_string)),
        ("offset:", err.offset().map(|offset| offset.to_string())),
        ("caused by:", error_causes(err).into_iter().next()),
    ];
    for (label, detail) in details {
        if let Some(detail) = detail {
            lines.push(format!(
                "{} {detail}",
                colorize_label(label, use_color, AnsiColor::Yellow)
            ));
        }
    }
    lines.join("\n")
}

fn add_kind_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Io => err.with_hint("I/O error. Check the path or network connectivity."),
        ErrorKind::MalformedStream | ErrorKind::SchemaMismatch => err.with_hint(
            "The dashboard payload changed shape. Save it and inspect with `vaxreport decode`.",
        ),
        ErrorKind::Internal => err.with_hint(
            "Unexpected internal failure. Retry with RUST_LOG=debug and share the output if it persists.",
        ),
        _ => err,
    }
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

#[cfg(test)]
mod tests {
    use super::{ConfigOverrides, error_json, error_text};
    use serde_json::json;
    use vaxreport::api::{Error, ErrorKind};
    use vaxreport::config::Config;

    #[test]
    fn error_json_carries_structured_fields() {
        let err = Error::new(ErrorKind::MalformedStream)
            .with_message("length prefix is not an integer")
            .with_offset(3)
            .with_source(std::io::Error::other("boom"));
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], json!("MalformedStream"));
        assert_eq!(value["error"]["offset"], json!(3));
        assert_eq!(value["error"]["causes"], json!(["boom"]));
        assert!(value["error"].get("hint").is_none());
    }

    #[test]
    fn error_text_without_color_has_no_escapes() {
        let err = Error::new(ErrorKind::RowNotFound).with_path("County Admin Bar");
        let text = error_text(&err, false);
        assert_eq!(text, "error: row not found\npath: County Admin Bar");
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let overrides = ConfigOverrides {
            concurrency: Some(2),
            ..ConfigOverrides::default()
        };
        let config = overrides.apply(Config::default());
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.timeout_secs, Config::default().timeout_secs);
    }
}
