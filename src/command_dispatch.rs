//! Purpose: Hold top-level CLI command dispatch for `vaxreport`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Network commands validate the config before the first request.

use super::*;

use vaxreport::api::regions::region_key;
use vaxreport::api::{EquityClient, Workbook, report};
use vaxreport::stamp;

pub(super) fn dispatch_command(
    command: Command,
    config: Config,
    output: OutputMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "vaxreport", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Report { date, output: path } => {
            let date = match date {
                Some(text) => stamp::parse_date(&text)?,
                None => stamp::today_pacific(),
            };
            let report = report::generate(&config, date)?;
            let value = to_json(&report)?;
            match path {
                Some(path) => write_report(&path, &value, output.pretty)?,
                None => emit_json(&value, output),
            }
            Ok(RunOutcome::ok())
        }
        Command::Dashboard => {
            config.validate()?;
            let stats = report::fetch_dashboard_stats(&config)?;
            emit_json(&to_json(&stats)?, output);
            Ok(RunOutcome::ok())
        }
        Command::Groupings { region } => {
            config.validate()?;
            let client = EquityClient::from_config(&config)?;
            let value = match region {
                Some(region) => to_json(&client.fetch_region(&region_key(&region))?)?,
                None => to_json(&client.fetch_groupings(
                    &config.state_region,
                    &config.regions,
                    config.concurrency,
                )?)?,
            };
            emit_json(&value, output);
            Ok(RunOutcome::ok())
        }
        Command::Decode { file, chart } => {
            let raw = std::fs::read_to_string(&file).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read bootstrap payload")
                    .with_path(file.display().to_string())
                    .with_source(err)
            })?;
            let workbook = Workbook::parse(&raw)?;
            let value = match chart {
                Some(name) => {
                    let rows = workbook.rows(&name)?;
                    json!({ "chart": name, "rows": rows })
                }
                None => workbook_summary(&workbook)?,
            };
            emit_json(&value, output);
            Ok(RunOutcome::ok())
        }
    }
}

fn workbook_summary(workbook: &Workbook) -> Result<Value, Error> {
    let dictionary = workbook
        .dictionary()
        .tags()
        .map(|tag| {
            let count = workbook.dictionary().values(tag).map_or(0, <[Value]>::len);
            (tag.to_string(), json!(count))
        })
        .collect::<Map<_, _>>();
    Ok(json!({
        "sheet": workbook.sheet_name(),
        "charts": workbook.chart_names()?,
        "dictionary": dictionary,
    }))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output")
            .with_source(err)
    })
}

fn write_report(path: &std::path::Path, value: &Value, pretty: bool) -> Result<(), Error> {
    let mut text = render_json(value, pretty);
    text.push('\n');
    std::fs::write(path, text).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write report")
            .with_path(path.display().to_string())
            .with_source(err)
    })?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}
