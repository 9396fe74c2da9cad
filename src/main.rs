use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;

mod clockify;
mod clockify_command;
mod config;
mod console;
mod datetime;
mod delete_command;
mod edit;
mod edit_command;
mod error;
mod list_command;
mod logger;
mod projects_command;
mod report;
mod report_command;
mod start_command;
mod status_command;
mod stop_command;
mod store;
mod time_entry;
mod tracker;

use clockify::ClockifyClient;
use clockify_command::{ClockifyArgs, ClockifyCommand, ClockifySubCommands, ConfigSubCommands};
use config::AppConfig;
use console::{ConsoleMarkdownList, ConsolePresenter};
use datetime::DateRange;
use delete_command::{DeleteArgs, DeleteCommand};
use edit_command::{EditArgs, EditCommand};
use list_command::{ListArgs, ListCommand};
use projects_command::{ProjectsCommand, TasksArgs};
use report::format_duration;
use report_command::{ReportArgs, ReportCommand};
use start_command::{StartArgs, StartCommand};
use status_command::{StatusArgs, StatusCommand};
use stop_command::{StopArgs, StopCommand};
use store::Store;

/// 作業時間を記録するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ time-tracker start project task
/// $ time-tracker stop
/// $ time-tracker report --last-week
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
pub(crate) struct Args {
    #[clap(
        long = "data-dir",
        global = true,
        help = "Directory of the time tracker database",
        parse(from_os_str)
    )]
    data_dir: Option<PathBuf>,
    #[clap(
        short = 'v',
        long = "verbose",
        global = true,
        help = "Increases the log level. Can be repeated",
        parse(from_occurrences)
    )]
    verbose: u8,
    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Starts a new time entry
    #[clap(alias = "s")]
    Start(StartArgs),
    /// Stops the current time entry
    #[clap(aliases = &["e", "end"])]
    Stop(StopArgs),
    /// Shows the current time entry
    #[clap(alias = "st")]
    Status(StatusArgs),
    /// Lists time entries
    #[clap(alias = "l")]
    List(ListArgs),
    /// Shows a report of a period
    #[clap(alias = "r")]
    Report(ReportArgs),
    /// Edits a time entry in the editor
    Edit(EditArgs),
    /// Deletes a time entry
    Delete(DeleteArgs),
    /// Lists recorded projects
    Projects,
    /// Lists recorded tasks of a project
    Tasks(TasksArgs),
    /// Utilities for Clockify
    Clockify(ClockifyArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::setup(args.verbose)?;

    let config = AppConfig::resolve(args.data_dir.as_deref())?;
    debug!("Database: {}", config.database_path().display());
    let store = Store::open(&config.database_path()).with_context(|| {
        format!(
            "Failed to open database: {}",
            config.database_path().display()
        )
    })?;

    let mut stdout = io::stdout();
    run(&store, args.subcommand, &mut stdout).await?;

    store.close().context("Failed to close database")?;

    Ok(())
}

async fn run<W: Write>(store: &Store, subcommand: SubCommands, writer: &mut W) -> Result<()> {
    match subcommand {
        SubCommands::Start(args) => {
            let current = StartCommand::new(store).run(args)?;
            writeln!(
                writer,
                "Started time entry: {} {}",
                current.project, current.task
            )?;
        }
        SubCommands::Stop(args) => match StopCommand::new(store).run(args)? {
            Some(entry) => writeln!(
                writer,
                "Stopped time entry: {} {} ({})",
                entry.project,
                entry.task,
                format_duration(entry.duration())
            )?,
            None => writeln!(writer, "No time entry to stop")?,
        },
        SubCommands::Status(args) => {
            let current = StatusCommand::new(store).run()?;
            ConsoleMarkdownList::new(writer).show_status(
                current.as_ref(),
                datetime::now(),
                args.raw,
            )?;
        }
        SubCommands::List(args) => {
            let entries = ListCommand::new(store).run(&args)?;
            if args.json {
                serde_json::to_writer_pretty(&mut *writer, &entries)
                    .context("Failed to write time entries as JSON")?;
                writeln!(writer)?;
            } else {
                ConsoleMarkdownList::new(writer).show_time_entries(&entries, args.id)?;
            }
        }
        SubCommands::Report(args) => {
            let report = ReportCommand::new(store).run(args)?;
            ConsoleMarkdownList::new(writer).show_report(
                &report.title,
                &report.range,
                &report.entries,
            )?;
        }
        SubCommands::Edit(args) => match EditCommand::new(store).run(args)? {
            Some(outcome) => ConsoleMarkdownList::new(writer).show_changes(&outcome.changes)?,
            None => writeln!(writer, "No time entry selected")?,
        },
        SubCommands::Delete(args) => {
            let entry = DeleteCommand::new(store).run(args)?;
            writeln!(
                writer,
                "Deleted time entry: {} {} {}",
                entry.id, entry.project, entry.task
            )?;
        }
        SubCommands::Projects => {
            let projects = ProjectsCommand::new(store).projects()?;
            ConsoleMarkdownList::new(writer).show_values(&projects)?;
        }
        SubCommands::Tasks(args) => {
            let tasks = ProjectsCommand::new(store).tasks(args)?;
            ConsoleMarkdownList::new(writer).show_values(&tasks)?;
        }
        SubCommands::Clockify(args) => run_clockify(store, args.subcommand, writer).await?,
    }

    Ok(())
}

async fn run_clockify<W: Write>(
    store: &Store,
    subcommand: ClockifySubCommands,
    writer: &mut W,
) -> Result<()> {
    let command = ClockifyCommand::new(store);
    let range = match subcommand {
        ClockifySubCommands::Config(args) => {
            match args.subcommand.unwrap_or(ConfigSubCommands::Get) {
                ConfigSubCommands::Get => match command.get_config()? {
                    Some(config) => {
                        writeln!(writer, "API Key: {}", config.api_key)?;
                        writeln!(writer, "Workspace ID: {}", config.workspace_id)?;
                        writeln!(
                            writer,
                            "Project ID: {}",
                            config.project_id.as_deref().unwrap_or("(default)")
                        )?;
                    }
                    None => writeln!(writer, "Clockify is not configured")?,
                },
                ConfigSubCommands::Set(args) => {
                    command.set_config(args)?;
                    writeln!(writer, "Clockify API key and workspace ID saved")?;
                }
                ConfigSubCommands::Delete => {
                    command.delete_config()?;
                    writeln!(writer, "Clockify configuration deleted")?;
                }
            }
            return Ok(());
        }
        ClockifySubCommands::UploadToday => DateRange::today()?,
        ClockifySubCommands::UploadLastWeek => DateRange::last_week()?,
    };

    let client = ClockifyClient::from_store(store).context("Failed to create clockify client")?;
    let (report, deletions) = command.upload(&client, &range).await?;
    ConsoleMarkdownList::new(writer).show_sync_report(&report, deletions)
}
