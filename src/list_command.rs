use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;

use crate::datetime::{parse_date, DateRange};
use crate::store::{SortField, SortOrder, Store, TimeEntryQuery};
use crate::time_entry::TimeEntry;

/// time entryの一覧を表示するためのサブコマンド。
///
/// 条件は全て組み合わせて適用する。
#[derive(Debug, Default, clap::Args)]
pub struct ListArgs {
    #[clap(
        long = "from",
        help = "Shows time entries started on or after the date (YYYY-MM-DD)",
        parse(try_from_str = parse_date),
    )]
    from: Option<NaiveDate>,
    #[clap(
        long = "to",
        help = "Shows time entries started on or before the date (YYYY-MM-DD)",
        parse(try_from_str = parse_date),
    )]
    to: Option<NaiveDate>,
    #[clap(
        long = "today",
        help = "Shows time entries started today",
        conflicts_with_all = &["yesterday", "from", "to"],
    )]
    today: bool,
    #[clap(
        long = "yesterday",
        help = "Shows time entries started yesterday",
        conflicts_with_all = &["from", "to"],
    )]
    yesterday: bool,
    #[clap(short = 'p', long = "project", help = "Filters by project")]
    project: Option<String>,
    #[clap(short = 't', long = "task", help = "Filters by task")]
    task: Option<String>,
    #[clap(long = "id", help = "Shows the ID of the time entries")]
    pub id: bool,
    #[clap(long = "json", help = "Prints the time entries as JSON")]
    pub json: bool,
}

pub struct ListCommand<'a> {
    store: &'a Store,
}

impl<'a> ListCommand<'a> {
    /// 新しい`ListCommand`を返す。
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// `list`サブコマンドの処理を行う。
    ///
    /// 開始日時の昇順で返す。
    pub fn run(&self, args: &ListArgs) -> Result<Vec<TimeEntry>> {
        let query = build_query(args)?;
        info!("Query: {:?}", query);

        let entries = self
            .store
            .get_time_entries(&query)
            .context("Failed to retrieve time entries")?;
        info!("{} time entries retrieved", entries.len());

        Ok(entries)
    }
}

fn build_query(args: &ListArgs) -> Result<TimeEntryQuery> {
    let mut query = TimeEntryQuery::new().sort_by(SortField::Start, SortOrder::Ascending);

    let range = if args.today {
        Some(DateRange::today()?)
    } else if args.yesterday {
        Some(DateRange::yesterday()?)
    } else {
        None
    };
    if let Some(range) = range {
        query = query
            .start_from(range.start.to_utc())
            .start_before(range.end.to_utc());
    }
    if let Some(from) = args.from {
        query = query.start_from(DateRange::day(from)?.start.to_utc());
    }
    if let Some(to) = args.to {
        query = query.start_before(DateRange::day(to)?.end.to_utc());
    }
    if let Some(project) = &args.project {
        query = query.project(project);
    }
    if let Some(task) = &args.task {
        query = query.task(task);
    }

    Ok(query)
}
