// src/main.rs

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion_table::{
    parse_assignments, CommandLineInput, MutationOutcome, NotionTable, TableCommand, TableConfig,
};
use serde::Serialize;
use std::fs;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("notion_table.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    // stdout carries the JSON output, so logs go to stderr
    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the outcomes and fails when any call was rejected.
fn report_outcomes(outcomes: &[MutationOutcome]) -> anyhow::Result<()> {
    print_json(&outcomes)?;
    let rejected = outcomes.iter().filter(|o| !o.is_success()).count();
    if rejected > 0 {
        anyhow::bail!("{} of {} calls were rejected", rejected, outcomes.len());
    }
    Ok(())
}

/// Runs one table command against the configured resource.
async fn execute_command(config: TableConfig, command: TableCommand) -> anyhow::Result<()> {
    let mut table = NotionTable::connect(config)?;

    match command {
        TableCommand::Table => print_json(&table.get_table().await?)?,
        TableCommand::Schema => print_json(&table.column_schema().await?)?,
        TableCommand::Query { select, filter } => {
            let columns: Vec<&str> = select.iter().map(String::as_str).collect();
            let result = table.query(&columns, &filter.to_condition()?).await?;
            print_json(&result)?;
        }
        TableCommand::Insert { values } => {
            let outcome = table.insert(&parse_assignments(&values)?).await?;
            report_outcomes(std::slice::from_ref(&outcome))?;
        }
        TableCommand::Update { set, filter } => {
            let outcomes = table
                .update(&parse_assignments(&set)?, &filter.to_condition()?)
                .await?;
            report_outcomes(&outcomes)?;
        }
        TableCommand::Append { set, filter } => {
            let outcomes = table
                .append(&parse_assignments(&set)?, &filter.to_condition()?)
                .await?;
            report_outcomes(&outcomes)?;
        }
        TableCommand::Delete { filter } => {
            let outcomes = table.delete(&filter.to_condition()?).await?;
            report_outcomes(&outcomes)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = TableConfig::resolve(&cli).context("invalid configuration")?;

    execute_command(config, cli.command).await?;

    Ok(())
}
